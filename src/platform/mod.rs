//! Platform-specific conventions for the toolchain and serial devices
//!
//! The upload step needs a full device path while the UI deals in bare port
//! identifiers, and Windows ships its own make binary.

use std::path::{Path, PathBuf};

/// Bundled GNU tools on Windows, relative to the application directory
#[cfg(target_os = "windows")]
pub const GNUWIN_DIR: &str = "resources/gnuwin";

/// Default make executable for this platform
pub fn make_program(app_dir: &Path) -> PathBuf {
    #[cfg(target_os = "windows")]
    {
        app_dir.join(GNUWIN_DIR).join("bin").join("make.exe")
    }

    #[cfg(not(target_os = "windows"))]
    {
        let _ = app_dir;
        PathBuf::from("make")
    }
}

/// Device path handed to the toolchain for a bare port identifier
pub fn device_path(port: &str) -> String {
    #[cfg(target_os = "windows")]
    {
        port.to_string()
    }

    #[cfg(not(target_os = "windows"))]
    {
        if port.starts_with('/') {
            port.to_string()
        } else {
            format!("/dev/{}", port)
        }
    }
}

/// Strip the device directory from a port name reported by the OS
pub fn bare_port_name(port: &str) -> &str {
    port.strip_prefix("/dev/").unwrap_or(port)
}
