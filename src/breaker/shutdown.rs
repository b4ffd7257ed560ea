//! Shutdown coordination for the breaker's background tasks.

use tokio::sync::broadcast;

/// Broadcast-based shutdown signal.
///
/// The window advancer and any pending recovery timer each hold a receiver
/// and exit their select loop when the signal fires.
#[derive(Debug)]
pub(crate) struct Shutdown {
    tx: broadcast::Sender<()>,
}

impl Shutdown {
    pub(crate) fn new() -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx }
    }

    /// Subscribe to the shutdown signal.
    pub(crate) fn subscribe(&self) -> broadcast::Receiver<()> {
        self.tx.subscribe()
    }

    /// Trigger the shutdown signal. Safe to call repeatedly and with no
    /// subscribers left.
    pub(crate) fn trigger(&self) {
        let _ = self.tx.send(());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_trigger_reaches_all_subscribers() {
        let shutdown = Shutdown::new();
        let mut first = shutdown.subscribe();
        let mut second = shutdown.subscribe();

        shutdown.trigger();

        assert!(first.recv().await.is_ok());
        assert!(second.recv().await.is_ok());
    }

    #[test]
    fn test_trigger_without_subscribers_is_harmless() {
        let shutdown = Shutdown::new();
        shutdown.trigger();
        shutdown.trigger();
    }
}
