//! Peer Registry
//!
//! Maps discovered remote object identity to the locally cached view used
//! for UI listing. Enumeration order is insertion order, so the peer list
//! renders deterministically. The registry is internally synchronized, but
//! all mutation flows through the coordinator worker; callback paths only
//! read via snapshots.

use std::sync::Arc;

use chrono::Utc;
use indexmap::IndexMap;
use tokio::sync::RwLock;

use peerbus_bus_core::{PropertyMap, PropertyValue, RemoteObjectHandle};

use crate::client::types::PeerRecord;

/// Registry of discovered peers, keyed by object handle.
#[derive(Debug)]
pub struct PeerRegistry {
    peers: Arc<RwLock<IndexMap<RemoteObjectHandle, PeerRecord>>>,
    stats: Arc<RwLock<PeerRegistryStats>>,
}

#[derive(Debug, Default, Clone, Copy)]
struct PeerRegistryStats {
    total_joined: usize,
    total_lost: usize,
}

impl PeerRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self {
            peers: Arc::new(RwLock::new(IndexMap::new())),
            stats: Arc::new(RwLock::new(PeerRegistryStats::default())),
        }
    }

    /// Insert or replace the record for a handle.
    ///
    /// Returns a snapshot of the stored record.
    pub async fn upsert(
        &self,
        handle: RemoteObjectHandle,
        display_label: String,
        initial_state: PropertyMap,
    ) -> PeerRecord {
        let record = PeerRecord {
            handle: handle.clone(),
            display_label,
            cached_state: initial_state,
            joined_at: Utc::now(),
        };
        let mut peers = self.peers.write().await;
        let fresh = peers.insert(handle.clone(), record.clone()).is_none();
        if fresh {
            self.stats.write().await.total_joined += 1;
        }
        tracing::debug!(%handle, fresh, "registry upsert");
        record
    }

    /// Remove a handle, returning the removed record if it was present.
    ///
    /// Uses a shift-removal so the remaining enumeration keeps insertion
    /// order.
    pub async fn remove(&self, handle: &RemoteObjectHandle) -> Option<PeerRecord> {
        let removed = self.peers.write().await.shift_remove(handle);
        if removed.is_some() {
            self.stats.write().await.total_lost += 1;
            tracing::debug!(%handle, "registry remove");
        }
        removed
    }

    /// Snapshot of the record for a handle.
    pub async fn lookup(&self, handle: &RemoteObjectHandle) -> Option<PeerRecord> {
        self.peers.read().await.get(handle).cloned()
    }

    /// Apply a property change to a registered peer.
    ///
    /// Returns the updated record, or `None` if the handle is absent - a
    /// stale signal for a just-removed peer is silently dropped, not an
    /// error.
    pub async fn update_property(
        &self,
        handle: &RemoteObjectHandle,
        name: &str,
        value: PropertyValue,
    ) -> Option<PeerRecord> {
        let mut peers = self.peers.write().await;
        let record = peers.get_mut(handle)?;
        record.cached_state.insert(name.to_string(), value);
        Some(record.clone())
    }

    /// All records, in insertion order.
    pub async fn snapshot(&self) -> Vec<PeerRecord> {
        self.peers.read().await.values().cloned().collect()
    }

    pub async fn contains(&self, handle: &RemoteObjectHandle) -> bool {
        self.peers.read().await.contains_key(handle)
    }

    pub async fn len(&self) -> usize {
        self.peers.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.peers.read().await.is_empty()
    }

    /// Lifetime counters: (total joined, total lost).
    pub async fn counters(&self) -> (usize, usize) {
        let stats = self.stats.read().await;
        (stats.total_joined, stats.total_lost)
    }
}

impl Clone for PeerRegistry {
    fn clone(&self) -> Self {
        Self {
            peers: Arc::clone(&self.peers),
            stats: Arc::clone(&self.stats),
        }
    }
}

impl Default for PeerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn handle(n: u32) -> RemoteObjectHandle {
        RemoteObjectHandle::new(format!(":1.{n}"), "/Door")
    }

    #[tokio::test]
    async fn upsert_and_lookup() {
        let registry = PeerRegistry::new();
        registry
            .upsert(handle(1), "Garage (:1.1/Door)".into(), PropertyMap::new())
            .await;

        let record = registry.lookup(&handle(1)).await.unwrap();
        assert_eq!(record.display_label, "Garage (:1.1/Door)");
        assert!(registry.contains(&handle(1)).await);
        assert_eq!(registry.len().await, 1);
    }

    #[tokio::test]
    async fn remove_unknown_handle_is_noop() {
        let registry = PeerRegistry::new();
        registry
            .upsert(handle(1), "a".into(), PropertyMap::new())
            .await;

        assert!(registry.remove(&handle(2)).await.is_none());
        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.counters().await, (1, 0));
    }

    #[tokio::test]
    async fn update_property_on_absent_handle_returns_none() {
        let registry = PeerRegistry::new();
        let updated = registry
            .update_property(&handle(1), "IsOpen", json!(true))
            .await;
        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn update_property_mutates_cached_state() {
        let registry = PeerRegistry::new();
        let mut initial = PropertyMap::new();
        initial.insert("IsOpen".into(), json!(false));
        registry.upsert(handle(1), "a".into(), initial).await;

        let updated = registry
            .update_property(&handle(1), "IsOpen", json!(true))
            .await
            .unwrap();
        assert_eq!(updated.cached_state["IsOpen"], json!(true));
    }

    #[tokio::test]
    async fn snapshot_preserves_insertion_order_across_removal() {
        let registry = PeerRegistry::new();
        for n in 1..=4 {
            registry
                .upsert(handle(n), format!("peer{n}"), PropertyMap::new())
                .await;
        }
        registry.remove(&handle(2)).await;

        let labels: Vec<String> = registry
            .snapshot()
            .await
            .into_iter()
            .map(|r| r.display_label)
            .collect();
        assert_eq!(labels, vec!["peer1", "peer3", "peer4"]);
    }

    #[tokio::test]
    async fn join_loss_accounting() {
        let registry = PeerRegistry::new();
        registry
            .upsert(handle(1), "a".into(), PropertyMap::new())
            .await;
        registry
            .upsert(handle(2), "b".into(), PropertyMap::new())
            .await;
        // Re-join of a present handle does not inflate the counter.
        registry
            .upsert(handle(1), "a2".into(), PropertyMap::new())
            .await;
        registry.remove(&handle(1)).await;
        registry.remove(&handle(3)).await;

        assert_eq!(registry.len().await, 1);
        assert_eq!(registry.counters().await, (2, 1));
    }
}
