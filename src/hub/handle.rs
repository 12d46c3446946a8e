use super::*;
use crate::accounts::*;
use crate::*;
use std::sync::Arc;
use tokio::sync::mpsc;

/// Cloneable entry point to a running [`Coordinator`].
/// Connection handlers hold one each; the loop exits when the last is dropped.
#[derive(Clone)]
pub struct HubHandle {
    tx: mpsc::Sender<Event>,
    config: Arc<Config>,
    accounts: Arc<dyn Accounts>,
}

impl HubHandle {
    /// Spawns the coordinating loop on the current runtime.
    pub fn spawn(config: Config, accounts: Arc<dyn Accounts>) -> Self {
        let config = Arc::new(config);
        let (tx, rx) = mpsc::channel(config.event_capacity.max(1));
        let hub = Coordinator::new(config.clone(), accounts.clone(), rx, tx.downgrade());
        tokio::spawn(hub.run());
        log::info!("[hub] spawned with event capacity {}", config.event_capacity);
        Self {
            tx,
            config,
            accounts,
        }
    }
    /// A handle with no loop behind it; events land in the returned receiver.
    #[cfg(test)]
    pub(crate) fn detached(config: Config) -> (Self, mpsc::Receiver<Event>) {
        let (tx, rx) = mpsc::channel(config.event_capacity.max(1));
        let accounts: Arc<dyn Accounts> = Arc::new(MemoryAccounts::default());
        let config = Arc::new(config);
        (
            Self {
                tx,
                config,
                accounts,
            },
            rx,
        )
    }
    /// Hands an event to the loop, waiting if its queue is full.
    /// Returns false once the loop has stopped.
    pub async fn send(&self, event: Event) -> bool {
        self.tx
            .send(event)
            .await
            .inspect_err(|e| log::warn!("[hub] loop unavailable, dropped {}", e.0))
            .is_ok()
    }
    /// A fresh outbound queue sized for one peer.
    pub fn outbox(&self) -> (Outbox, Inbox) {
        Outbox::pair(self.config.outbox_capacity)
    }
    pub fn config(&self) -> &Config {
        &self.config
    }
    pub fn accounts(&self) -> &Arc<dyn Accounts> {
        &self.accounts
    }
}
