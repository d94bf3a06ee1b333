//! The main-thread executor.
//!
//! The accessibility and event-posting APIs require every call to originate
//! from the same thread. Rather than scattering thread assertions across the
//! adapters, that requirement is modeled once: a dedicated OS thread owns the
//! [`Platform`] implementation, handlers submit closures and await their
//! results. Each submitted closure runs to completion before the next one
//! starts, which is also what gives adapter calls their atomicity relative to
//! one another.

use crate::errors::AutomationError;
use crate::platforms::Platform;
use std::thread;
use tokio::sync::{mpsc, oneshot};

type Job = Box<dyn FnOnce(&dyn Platform) + Send>;

/// Cloneable handle to the executor thread. Dropping every handle shuts the
/// thread down.
#[derive(Clone)]
pub struct PlatformHandle {
    tx: mpsc::UnboundedSender<Job>,
}

impl PlatformHandle {
    /// Spawn the executor thread. The factory runs on the new thread so the
    /// platform object never has to be `Send`; the OS primitives it wraps
    /// are pinned to that thread for the executor's whole life.
    pub fn spawn<F>(factory: F) -> Self
    where
        F: FnOnce() -> Box<dyn Platform> + Send + 'static,
    {
        let (tx, mut rx) = mpsc::unbounded_channel::<Job>();
        thread::Builder::new()
            .name("marionette-platform".into())
            .spawn(move || {
                let platform = factory();
                while let Some(job) = rx.blocking_recv() {
                    job(platform.as_ref());
                }
                tracing::debug!("platform executor thread exiting");
            })
            .expect("failed to spawn platform executor thread");
        Self { tx }
    }

    /// Run a closure against the platform on the executor thread and await
    /// its result. The closure must finish quickly; long sleeps belong in
    /// the async caller between calls, not inside the closure.
    pub async fn call<R, F>(&self, f: F) -> Result<R, AutomationError>
    where
        R: Send + 'static,
        F: FnOnce(&dyn Platform) -> Result<R, AutomationError> + Send + 'static,
    {
        let (reply_tx, reply_rx) = oneshot::channel();
        let job: Job = Box::new(move |platform| {
            let _ = reply_tx.send(f(platform));
        });
        self.tx.send(job).map_err(|_| {
            AutomationError::PlatformError("platform executor thread is gone".into())
        })?;
        reply_rx.await.map_err(|_| {
            AutomationError::PlatformError("platform executor dropped the request".into())
        })?
    }
}
