//! services/api/src/web/broadcast.rs
//!
//! An owned registry of connected WebSocket listeners.
//!
//! Every connection registers an unbounded channel here; `broadcast` fans a
//! message out to all currently registered listeners, best-effort. A listener
//! whose receiving side has gone away is pruned at broadcast time.

use std::collections::HashMap;
use tokio::sync::{
    mpsc::{self, UnboundedReceiver, UnboundedSender},
    Mutex,
};
use tracing::warn;
use uuid::Uuid;

#[derive(Default)]
pub struct BroadcastHub {
    listeners: Mutex<HashMap<Uuid, UnboundedSender<String>>>,
}

impl BroadcastHub {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a new listener and returns its id plus the receiving end.
    pub async fn connect(&self) -> (Uuid, UnboundedReceiver<String>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let id = Uuid::new_v4();
        self.listeners.lock().await.insert(id, tx);
        (id, rx)
    }

    /// Removes a listener. Safe to call after the listener was already pruned.
    pub async fn disconnect(&self, id: Uuid) {
        self.listeners.lock().await.remove(&id);
    }

    /// Sends `message` to every registered listener. No delivery guarantee
    /// and no ordering guarantee across listeners; dead listeners are pruned.
    pub async fn broadcast(&self, message: String) {
        let mut listeners = self.listeners.lock().await;
        let mut dead = Vec::new();
        for (id, tx) in listeners.iter() {
            if tx.send(message.clone()).is_err() {
                warn!("Dropping dead WebSocket listener {}", id);
                dead.push(*id);
            }
        }
        for id in dead {
            listeners.remove(&id);
        }
    }

    /// Number of currently registered listeners.
    pub async fn listener_count(&self) -> usize {
        self.listeners.lock().await.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn broadcast_reaches_all_listeners() {
        let hub = BroadcastHub::new();
        let (_id_a, mut rx_a) = hub.connect().await;
        let (_id_b, mut rx_b) = hub.connect().await;

        hub.broadcast("update".to_string()).await;

        assert_eq!(rx_a.recv().await.unwrap(), "update");
        assert_eq!(rx_b.recv().await.unwrap(), "update");
    }

    #[tokio::test]
    async fn disconnected_listener_stops_receiving() {
        let hub = BroadcastHub::new();
        let (id_a, mut rx_a) = hub.connect().await;
        let (_id_b, mut rx_b) = hub.connect().await;

        hub.disconnect(id_a).await;
        hub.broadcast("after".to_string()).await;

        assert_eq!(rx_b.recv().await.unwrap(), "after");
        // The disconnected listener's channel is closed with nothing queued.
        assert!(rx_a.recv().await.is_none());
    }

    #[tokio::test]
    async fn dead_listeners_are_pruned_at_broadcast_time() {
        let hub = BroadcastHub::new();
        let (_id, rx) = hub.connect().await;
        drop(rx);

        assert_eq!(hub.listener_count().await, 1);
        hub.broadcast("ping".to_string()).await;
        assert_eq!(hub.listener_count().await, 0);
    }
}
