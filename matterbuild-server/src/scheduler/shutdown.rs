//! Graceful shutdown signal

use std::time::Duration;
use tokio::sync::watch;

/// Receiving side of the process-wide shutdown flag
///
/// Cloned into every component that sleeps. Flipping the sender to `true`
/// wakes all sleepers at once.
#[derive(Debug, Clone)]
pub struct ShutdownSignal {
    receiver: watch::Receiver<bool>,
}

impl ShutdownSignal {
    pub fn new(receiver: watch::Receiver<bool>) -> Self {
        Self { receiver }
    }

    /// A fresh signal together with the sender that triggers it
    pub fn channel() -> (watch::Sender<bool>, Self) {
        let (sender, receiver) = watch::channel(false);
        (sender, Self::new(receiver))
    }

    /// A signal that is never triggered
    #[cfg(test)]
    pub fn never() -> Self {
        let (_, receiver) = watch::channel(false);
        Self::new(receiver)
    }

    pub fn is_triggered(&self) -> bool {
        *self.receiver.borrow()
    }

    /// Resolves once shutdown is requested
    ///
    /// If the sender is gone without ever triggering, this never resolves.
    pub async fn triggered(&self) {
        let mut receiver = self.receiver.clone();
        if receiver.wait_for(|stop| *stop).await.is_err() {
            std::future::pending::<()>().await;
        }
    }

    /// Sleeps for `duration`, returning `false` if shutdown interrupted it
    pub async fn sleep(&self, duration: Duration) -> bool {
        if self.is_triggered() {
            return false;
        }
        if duration.is_zero() {
            return true;
        }

        tokio::select! {
            _ = tokio::time::sleep(duration) => !self.is_triggered(),
            _ = self.triggered() => false,
        }
    }
}
