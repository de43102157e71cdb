//! Shutdown coordination for the gateway.

use std::time::Duration;

use tokio::sync::broadcast;

/// Coordinator for graceful shutdown.
///
/// Provides a broadcast channel that every listener subscribes to, plus the
/// grace period listeners get to drain in-flight requests.
#[derive(Debug, Clone)]
pub struct Shutdown {
    tx: broadcast::Sender<()>,
    grace: Duration,
}

impl Shutdown {
    pub fn new(grace: Duration) -> Self {
        let (tx, _) = broadcast::channel(1);
        Self { tx, grace }
    }

    /// Subscribe to the shutdown signal.
    pub fn subscribe(&self) -> ShutdownSignal {
        ShutdownSignal {
            rx: self.tx.subscribe(),
            grace: self.grace,
        }
    }

    /// Trigger the shutdown signal.
    pub fn trigger(&self) {
        let _ = self.tx.send(());
    }

    /// Number of listeners still waiting on the signal.
    pub fn receiver_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }
}

/// One subscriber's end of the shutdown channel.
#[derive(Debug)]
pub struct ShutdownSignal {
    rx: broadcast::Receiver<()>,
    grace: Duration,
}

impl ShutdownSignal {
    /// Resolve once shutdown is triggered (or the coordinator is dropped).
    pub async fn recv(mut self) {
        let _ = self.rx.recv().await;
    }

    pub fn grace(&self) -> Duration {
        self.grace
    }
}
