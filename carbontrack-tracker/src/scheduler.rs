//! Background periodic sampling.
//!
//! The tracker injects a [`PeriodicTask`] rather than owning a timer, so
//! tests can fire samples deterministically. The production implementation
//! runs a dedicated thread; `cancel` joins it, so no sample can land after
//! cancellation returns.

use std::sync::mpsc::{self, RecvTimeoutError};
use std::thread::JoinHandle;
use std::time::Duration;

use tracing::{debug, warn};

/// A repeating background job with explicit start and cancel.
pub trait PeriodicTask: Send {
    /// Begin firing `job` every `interval`. At most one job is active per
    /// scheduler at a time.
    fn start(&mut self, interval: Duration, job: Box<dyn FnMut() + Send>);

    /// Stop firing and wait for any in-flight run of the job to finish.
    fn cancel(&mut self);
}

/// Thread-backed scheduler. Dropping the shutdown sender wakes the loop.
#[derive(Default)]
pub struct ThreadScheduler {
    shutdown: Option<mpsc::Sender<()>>,
    handle: Option<JoinHandle<()>>,
}

impl ThreadScheduler {
    pub fn new() -> Self {
        Self::default()
    }
}

impl PeriodicTask for ThreadScheduler {
    fn start(&mut self, interval: Duration, mut job: Box<dyn FnMut() + Send>) {
        if self.handle.is_some() {
            debug!("Sampler already running; ignoring start");
            return;
        }

        let (shutdown, ticks) = mpsc::channel::<()>();
        let handle = std::thread::spawn(move || loop {
            match ticks.recv_timeout(interval) {
                Err(RecvTimeoutError::Timeout) => job(),
                Ok(()) | Err(RecvTimeoutError::Disconnected) => break,
            }
        });

        self.shutdown = Some(shutdown);
        self.handle = Some(handle);
    }

    fn cancel(&mut self) {
        self.shutdown.take();
        if let Some(handle) = self.handle.take() {
            if handle.join().is_err() {
                warn!("Sampler thread panicked during shutdown");
            }
        }
    }
}
