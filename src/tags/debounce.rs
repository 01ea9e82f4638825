//! Single-shot debounce timer driven by an explicit clock

use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

/// Time source for the debouncer
pub trait Clock: Send + Sync {
    fn now(&self) -> Instant;
}

/// Wall clock
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Instant {
        Instant::now()
    }
}

/// Clock that only moves when told to; clones share the same time
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<Instant>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            now: Arc::new(Mutex::new(Instant::now())),
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|e| e.into_inner());
        *now += by;
    }
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        *self.now.lock().unwrap_or_else(|e| e.into_inner())
    }
}

type FireCallback = Box<dyn FnMut() + Send>;

/// Restartable single-shot timer: every `arm` pushes the deadline out, so
/// only the last arm within the window leads to a firing.
pub struct Debouncer<C: Clock = SystemClock> {
    clock: C,
    window: Duration,
    deadline: Option<Instant>,
    callbacks: Vec<FireCallback>,
}

impl<C: Clock> Debouncer<C> {
    pub fn new(window: Duration, clock: C) -> Self {
        Self {
            clock,
            window,
            deadline: None,
            callbacks: Vec::new(),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Restart the timer with the default window
    pub fn arm(&mut self) {
        self.arm_for(self.window);
    }

    /// Restart the timer with an explicit window
    pub fn arm_for(&mut self, window: Duration) {
        self.deadline = Some(self.clock.now() + window);
    }

    pub fn cancel(&mut self) {
        self.deadline = None;
    }

    pub fn is_armed(&self) -> bool {
        self.deadline.is_some()
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left before the timer fires, `None` when disarmed
    pub fn remaining(&self) -> Option<Duration> {
        self.deadline
            .map(|deadline| deadline.saturating_duration_since(self.clock.now()))
    }

    /// Register a callback run on every firing
    pub fn on_fire(&mut self, callback: impl FnMut() + Send + 'static) {
        self.callbacks.push(Box::new(callback));
    }

    /// Fire if the deadline has passed. Returns whether it fired; a fired
    /// timer is disarmed until the next `arm`.
    pub fn poll(&mut self) -> bool {
        match self.deadline {
            Some(deadline) if self.clock.now() >= deadline => {
                self.deadline = None;
                for callback in &mut self.callbacks {
                    callback();
                }
                true
            }
            _ => false,
        }
    }

    /// Sleep until the current deadline; never resolves while disarmed. The
    /// future does not borrow the debouncer, so it can be raced against
    /// other work on the owner.
    pub fn sleep_until_due(&self) -> impl Future<Output = ()> + Send + use<C> {
        let remaining = self.remaining();
        async move {
            match remaining {
                Some(remaining) => tokio::time::sleep(remaining).await,
                None => std::future::pending::<()>().await,
            }
        }
    }
}
