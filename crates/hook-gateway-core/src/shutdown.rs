//! Shutdown signalling shared by the server and in-flight retry loops.
//!
//! The server owns a [`ShutdownTrigger`]; every request receives a clone of
//! the [`ShutdownSignal`] so that a retry loop sleeping between attempts can
//! abort as soon as the process starts shutting down.

use tokio::sync::watch;

/// Sending half: flips every associated [`ShutdownSignal`] to triggered.
#[derive(Debug)]
pub struct ShutdownTrigger {
    tx: watch::Sender<bool>,
}

impl ShutdownTrigger {
    pub fn trigger(&self) {
        // send_replace never fails, even when no receiver is left
        self.tx.send_replace(true);
    }
}

/// Receiving half, cheap to clone into each request.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    rx: Option<watch::Receiver<bool>>,
}

impl ShutdownSignal {
    /// Create a connected trigger/signal pair
    pub fn channel() -> (ShutdownTrigger, Self) {
        let (tx, rx) = watch::channel(false);
        (ShutdownTrigger { tx }, Self { rx: Some(rx) })
    }

    /// A signal that never fires
    pub fn never() -> Self {
        Self { rx: None }
    }

    pub fn is_triggered(&self) -> bool {
        self.rx.as_ref().map(|rx| *rx.borrow()).unwrap_or(false)
    }

    /// Resolve once shutdown has been triggered.
    ///
    /// Never resolves for [`ShutdownSignal::never`] or when the trigger was
    /// dropped without firing.
    pub async fn triggered(&mut self) {
        let Some(rx) = self.rx.as_mut() else {
            return std::future::pending().await;
        };

        loop {
            if *rx.borrow_and_update() {
                return;
            }
            if rx.changed().await.is_err() {
                return std::future::pending().await;
            }
        }
    }
}

impl Default for ShutdownSignal {
    fn default() -> Self {
        Self::never()
    }
}

#[cfg(test)]
#[path = "shutdown_tests.rs"]
mod tests;
