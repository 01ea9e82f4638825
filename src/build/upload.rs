//! Serial port hand-off around the Upload phase

use crate::errors::{BrewError, Result};
use crate::serial::SerialConnection;

/// Keeps the device connection closed while the upload subprocess owns the
/// port, and hands it back once the phase is over, whatever its outcome.
pub struct UploadCoordinator<S: SerialConnection> {
    connection: S,
    reconnect_after_upload: bool,
    reopen_pending: bool,
    uploading: bool,
}

impl<S: SerialConnection> UploadCoordinator<S> {
    pub fn new(connection: S, reconnect_after_upload: bool) -> Self {
        Self {
            connection,
            reconnect_after_upload,
            reopen_pending: false,
            uploading: false,
        }
    }

    pub fn connection(&self) -> &S {
        &self.connection
    }

    pub fn connection_mut(&mut self) -> &mut S {
        &mut self.connection
    }

    pub fn is_uploading(&self) -> bool {
        self.uploading
    }

    /// Open the device connection unless an upload currently owns the port
    pub fn connect(&mut self) -> Result<()> {
        if self.uploading {
            return Err(BrewError::Serial(format!(
                "{} is in use by the upload",
                self.connection.port_name()
            )));
        }
        self.connection.open()
    }

    /// Release the port before the upload process starts
    pub fn before_upload(&mut self) {
        self.uploading = true;
        if self.connection.is_open() {
            log::info!(
                "Closing connection on {} for upload",
                self.connection.port_name()
            );
            self.connection.close();
            self.reopen_pending = true;
        }
    }

    /// Restore connectivity once the Upload phase is back to Idle
    pub fn after_upload(&mut self) {
        self.uploading = false;
        if !std::mem::take(&mut self.reopen_pending) {
            return;
        }

        if self.reconnect_after_upload {
            match self.connection.open() {
                Ok(()) => log::info!("Reconnected to {}", self.connection.port_name()),
                Err(e) => log::warn!(
                    "Could not reconnect to {} after upload: {}",
                    self.connection.port_name(),
                    e
                ),
            }
        } else {
            log::debug!(
                "{} released and available for reconnect",
                self.connection.port_name()
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default)]
    struct FakeConnection {
        open: bool,
        opens: usize,
        closes: usize,
        fail_open: bool,
    }

    impl SerialConnection for FakeConnection {
        fn port_name(&self) -> &str {
            "ttyACM0"
        }

        fn is_open(&self) -> bool {
            self.open
        }

        fn open(&mut self) -> Result<()> {
            self.opens += 1;
            if self.fail_open {
                return Err(BrewError::Serial("busy".to_string()));
            }
            self.open = true;
            Ok(())
        }

        fn close(&mut self) {
            if self.open {
                self.closes += 1;
            }
            self.open = false;
        }

        fn write(&mut self, data: &[u8]) -> Result<usize> {
            Ok(data.len())
        }
    }

    #[test]
    fn test_open_connection_is_closed_for_upload() {
        let conn = FakeConnection {
            open: true,
            ..Default::default()
        };
        let mut coordinator = UploadCoordinator::new(conn, false);

        coordinator.before_upload();
        assert!(!coordinator.connection().is_open());
        assert!(coordinator.connect().is_err());

        coordinator.after_upload();
        assert!(!coordinator.connection().is_open());
        assert!(coordinator.connect().is_ok());
    }

    #[test]
    fn test_reconnects_only_if_it_was_open() {
        let mut coordinator = UploadCoordinator::new(FakeConnection::default(), true);
        coordinator.before_upload();
        coordinator.after_upload();
        assert_eq!(coordinator.connection().opens, 0);

        coordinator.connection_mut().open = true;
        coordinator.before_upload();
        coordinator.after_upload();
        assert!(coordinator.connection().is_open());
        assert_eq!(coordinator.connection().closes, 1);
    }

    #[test]
    fn test_failed_reconnect_is_not_fatal() {
        let conn = FakeConnection {
            open: true,
            fail_open: true,
            ..Default::default()
        };
        let mut coordinator = UploadCoordinator::new(conn, true);

        coordinator.before_upload();
        coordinator.after_upload();
        assert!(!coordinator.is_uploading());
        assert!(!coordinator.connection().is_open());
    }
}
