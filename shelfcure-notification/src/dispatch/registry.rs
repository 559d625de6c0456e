//! Per-store subscriber registry.
//!
//! Every connected realtime client that has joined a store is represented by
//! an unbounded sender; `publish` fans a payload out to all of a store's
//! subscribers without blocking the caller. A channel belongs to at most one
//! store at a time; joining another store moves it.

use std::collections::HashMap;

use dashmap::DashMap;
use tokio::sync::mpsc;
use uuid::Uuid;

pub struct StoreChannels {
    subscribers: DashMap<Uuid, HashMap<String, mpsc::UnboundedSender<serde_json::Value>>>,
    memberships: DashMap<String, Uuid>,
}

impl StoreChannels {
    pub fn new() -> Self {
        Self {
            subscribers: DashMap::new(),
            memberships: DashMap::new(),
        }
    }

    /// Subscribe a channel to a store's notification stream. Idempotent:
    /// re-joining replaces the channel's previous subscription (including one
    /// on a different store) and hands back a fresh receiver.
    pub fn join(&self, channel_id: &str, store_id: Uuid) -> mpsc::UnboundedReceiver<serde_json::Value> {
        self.leave(channel_id);

        let (tx, rx) = mpsc::unbounded_channel();
        self.subscribers
            .entry(store_id)
            .or_default()
            .insert(channel_id.to_string(), tx);
        self.memberships.insert(channel_id.to_string(), store_id);

        tracing::debug!(channel_id = %channel_id, store_id = %store_id, "channel joined store");
        rx
    }

    /// Remove a channel from whatever store it is subscribed to. No-op for
    /// unknown channels, so it is safe to call unconditionally on disconnect.
    pub fn leave(&self, channel_id: &str) {
        if let Some((_, store_id)) = self.memberships.remove(channel_id) {
            if let Some(mut entry) = self.subscribers.get_mut(&store_id) {
                entry.remove(channel_id);
            }
            tracing::debug!(channel_id = %channel_id, store_id = %store_id, "channel left store");
        }
    }

    /// Deliver a payload to every subscriber of `store_id`. Best-effort and
    /// non-blocking: a closed subscriber is pruned and never delays the rest.
    /// Returns the number of subscribers the payload was handed to.
    pub fn publish(&self, store_id: Uuid, payload: &serde_json::Value) -> usize {
        let mut delivered = 0;
        let mut dead: Vec<(String, mpsc::UnboundedSender<serde_json::Value>)> = Vec::new();

        if let Some(entry) = self.subscribers.get(&store_id) {
            for (channel_id, tx) in entry.iter() {
                if tx.send(payload.clone()).is_ok() {
                    delivered += 1;
                } else {
                    dead.push((channel_id.clone(), tx.clone()));
                }
            }
        }

        self.prune_stale(store_id, dead);

        delivered
    }

    /// Evict subscribers whose channel was found closed during a publish.
    /// A channel may re-join between detection and eviction, so only remove
    /// the entry when the registered sender is still the closed one.
    fn prune_stale(
        &self,
        store_id: Uuid,
        dead: Vec<(String, mpsc::UnboundedSender<serde_json::Value>)>,
    ) {
        for (channel_id, stale_tx) in dead {
            let removed = self
                .subscribers
                .get_mut(&store_id)
                .map(|mut entry| match entry.get(&channel_id) {
                    Some(tx) if tx.same_channel(&stale_tx) => {
                        entry.remove(&channel_id);
                        true
                    }
                    _ => false,
                })
                .unwrap_or(false);

            if removed {
                self.memberships
                    .remove_if(&channel_id, |_, joined| *joined == store_id);
                tracing::warn!(channel_id = %channel_id, store_id = %store_id, "pruned dead subscriber");
            }
        }
    }

    pub fn subscriber_count(&self, store_id: Uuid) -> usize {
        self.subscribers.get(&store_id).map(|e| e.len()).unwrap_or(0)
    }
}

impl Default for StoreChannels {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn publish_reaches_only_the_joined_store() {
        let channels = StoreChannels::new();
        let store_a = Uuid::new_v4();
        let store_b = Uuid::new_v4();

        let mut rx_a = channels.join("sock-1", store_a);
        let mut rx_b = channels.join("sock-2", store_b);

        let delivered = channels.publish(store_a, &json!({"id": "n1"}));
        assert_eq!(delivered, 1);

        assert_eq!(rx_a.recv().await.unwrap()["id"], "n1");
        assert!(rx_b.try_recv().is_err());
    }

    #[tokio::test]
    async fn per_store_delivery_preserves_publish_order() {
        let channels = StoreChannels::new();
        let store = Uuid::new_v4();
        let mut rx = channels.join("sock-1", store);

        channels.publish(store, &json!({"seq": 1}));
        channels.publish(store, &json!({"seq": 2}));
        channels.publish(store, &json!({"seq": 3}));

        assert_eq!(rx.recv().await.unwrap()["seq"], 1);
        assert_eq!(rx.recv().await.unwrap()["seq"], 2);
        assert_eq!(rx.recv().await.unwrap()["seq"], 3);
    }

    #[tokio::test]
    async fn rejoin_moves_channel_to_new_store() {
        let channels = StoreChannels::new();
        let store_a = Uuid::new_v4();
        let store_b = Uuid::new_v4();

        let _rx_old = channels.join("sock-1", store_a);
        let mut rx_new = channels.join("sock-1", store_b);

        assert_eq!(channels.subscriber_count(store_a), 0);
        assert_eq!(channels.subscriber_count(store_b), 1);

        channels.publish(store_b, &json!({"id": "n2"}));
        assert_eq!(rx_new.recv().await.unwrap()["id"], "n2");
    }

    #[tokio::test]
    async fn leave_stops_delivery() {
        let channels = StoreChannels::new();
        let store = Uuid::new_v4();

        let _rx = channels.join("sock-1", store);
        channels.leave("sock-1");

        assert_eq!(channels.subscriber_count(store), 0);
        assert_eq!(channels.publish(store, &json!({"id": "n3"})), 0);
    }

    #[tokio::test]
    async fn dead_subscriber_is_pruned_without_affecting_others() {
        let channels = StoreChannels::new();
        let store = Uuid::new_v4();

        let rx_dead = channels.join("sock-dead", store);
        let mut rx_live = channels.join("sock-live", store);
        drop(rx_dead);

        let delivered = channels.publish(store, &json!({"id": "n4"}));
        assert_eq!(delivered, 1);
        assert_eq!(rx_live.recv().await.unwrap()["id"], "n4");
        assert_eq!(channels.subscriber_count(store), 1);
    }

    #[tokio::test]
    async fn prune_spares_a_channel_that_rejoined() {
        let channels = StoreChannels::new();
        let store = Uuid::new_v4();

        let rx_dead = channels.join("sock-1", store);
        let stale_tx = channels
            .subscribers
            .get(&store)
            .unwrap()
            .get("sock-1")
            .unwrap()
            .clone();
        drop(rx_dead);

        // The channel re-joins between dead detection and eviction.
        let mut rx_new = channels.join("sock-1", store);
        channels.prune_stale(store, vec![("sock-1".to_string(), stale_tx)]);

        assert_eq!(channels.subscriber_count(store), 1);
        channels.publish(store, &json!({"id": "n5"}));
        assert_eq!(rx_new.recv().await.unwrap()["id"], "n5");
    }

    #[test]
    fn leave_unknown_channel_is_a_noop() {
        let channels = StoreChannels::new();
        channels.leave("never-joined");
    }
}
