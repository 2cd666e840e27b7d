//! Graceful shutdown signal
//!
//! The crawl is a single task, so interruption is cooperative: every wait in
//! the coordinator races against [`Shutdown::triggered`], and the loop checks
//! [`Shutdown::is_triggered`] between items. Whatever was committed before the
//! signal is persisted by the caller.

use std::time::Duration;
use tokio::sync::watch;

/// Receiving side of the shutdown signal
#[derive(Debug, Clone)]
pub struct Shutdown {
    rx: watch::Receiver<bool>,
}

/// Sending side of the shutdown signal
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

/// Creates a connected trigger/receiver pair
pub fn shutdown_channel() -> (ShutdownTrigger, Shutdown) {
    let (tx, rx) = watch::channel(false);
    (ShutdownTrigger { tx }, Shutdown { rx })
}

impl ShutdownTrigger {
    /// Signals every receiver; idempotent
    pub fn trigger(&self) {
        // Sending only fails when all receivers are gone, which means no one is left to stop
        let _ = self.tx.send(true);
    }
}

impl Shutdown {
    /// A signal that never fires
    pub fn never() -> Self {
        let (_, shutdown) = shutdown_channel();
        shutdown
    }

    /// Returns true once shutdown was requested
    pub fn is_triggered(&self) -> bool {
        *self.rx.borrow()
    }

    /// Completes when shutdown is requested
    ///
    /// Pends forever if the trigger was dropped without firing.
    pub async fn triggered(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }

    /// Sleeps for `duration` unless interrupted
    ///
    /// Returns false if shutdown was requested before or during the sleep.
    pub async fn sleep(&mut self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => true,
            _ = self.triggered() => false,
        }
    }
}

/// Fires the returned signal on the first Ctrl-C
pub fn listen_for_ctrl_c() -> Shutdown {
    let (trigger, shutdown) = shutdown_channel();

    tokio::spawn(async move {
        match tokio::signal::ctrl_c().await {
            Ok(()) => {
                tracing::info!("Ctrl-C received, finishing the current item and saving progress");
                trigger.trigger();
            }
            Err(e) => {
                tracing::warn!("Unable to listen for Ctrl-C: {}", e);
            }
        }
    });

    shutdown
}
