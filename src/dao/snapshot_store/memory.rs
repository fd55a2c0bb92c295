use std::sync::Arc;

use dashmap::DashMap;
use futures::future::BoxFuture;
use tracing::debug;

use crate::{
    dao::{
        models::{SnapshotEntity, SnapshotEnvelope},
        snapshot_store::{SnapshotStore, StoreHealth},
        storage::StorageResult,
    },
    state::now_epoch_ms,
};

const MODE: &str = "memory";

/// In-process fallback backend used when no remote store is configured or
/// reachable at startup. Shares the envelope/TTL semantics of the remote
/// backend; expired entries are evicted eagerly on read.
#[derive(Clone)]
pub struct MemorySnapshotStore {
    entries: Arc<DashMap<String, SnapshotEnvelope>>,
    key_prefix: Arc<str>,
    ttl_ms: i64,
}

impl MemorySnapshotStore {
    /// Create an empty store with the given key namespace and TTL.
    pub fn new(key_prefix: &str, ttl_ms: i64) -> Self {
        Self {
            entries: Arc::new(DashMap::new()),
            key_prefix: Arc::from(key_prefix),
            ttl_ms,
        }
    }

    fn key(&self, pin: &str) -> String {
        format!("{}{}", self.key_prefix, pin)
    }
}

impl SnapshotStore for MemorySnapshotStore {
    fn save(&self, pin: &str, snapshot: SnapshotEntity) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = self.key(pin);
        Box::pin(async move {
            let envelope = SnapshotEnvelope::wrap(snapshot, now_epoch_ms(), store.ttl_ms);
            store.entries.insert(key, envelope);
            Ok(())
        })
    }

    fn load(&self, pin: &str) -> BoxFuture<'static, StorageResult<Option<SnapshotEntity>>> {
        let store = self.clone();
        let key = self.key(pin);
        Box::pin(async move {
            let Some(entry) = store.entries.get(&key) else {
                return Ok(None);
            };

            if entry.is_expired(now_epoch_ms()) {
                drop(entry);
                debug!(%key, "evicting expired snapshot");
                store.entries.remove(&key);
                return Ok(None);
            }

            Ok(Some(entry.snapshot.clone()))
        })
    }

    fn delete(&self, pin: &str) -> BoxFuture<'static, StorageResult<()>> {
        let store = self.clone();
        let key = self.key(pin);
        Box::pin(async move {
            store.entries.remove(&key);
            Ok(())
        })
    }

    fn ping(&self) -> BoxFuture<'static, StoreHealth> {
        Box::pin(async { StoreHealth::ok(MODE) })
    }

    fn mode(&self) -> &'static str {
        MODE
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dao::models::LeaderboardEntryEntity;

    fn snapshot(pin: &str) -> SnapshotEntity {
        SnapshotEntity {
            pin: pin.into(),
            current_index: 0,
            leaderboard: vec![LeaderboardEntryEntity {
                name: "ada".into(),
                score: 800,
            }],
            history: Vec::new(),
            timestamp: now_epoch_ms(),
        }
    }

    #[tokio::test]
    async fn save_then_load_round_trips() {
        let store = MemorySnapshotStore::new("quiz:state:", 60_000);
        store.save("123456", snapshot("123456")).await.unwrap();

        let loaded = store.load("123456").await.unwrap().unwrap();
        assert_eq!(loaded.pin, "123456");
        assert_eq!(loaded.leaderboard[0].score, 800);
    }

    #[tokio::test]
    async fn load_after_expiry_is_absent_and_evicts() {
        let store = MemorySnapshotStore::new("quiz:state:", 0);
        store.save("123456", snapshot("123456")).await.unwrap();

        tokio::time::sleep(std::time::Duration::from_millis(5)).await;

        assert!(store.load("123456").await.unwrap().is_none());
        assert!(store.entries.is_empty());
    }

    #[tokio::test]
    async fn save_overwrites_and_resets_expiry() {
        let store = MemorySnapshotStore::new("quiz:state:", 60_000);
        store.save("123456", snapshot("123456")).await.unwrap();

        let mut updated = snapshot("123456");
        updated.current_index = 3;
        store.save("123456", updated).await.unwrap();

        let loaded = store.load("123456").await.unwrap().unwrap();
        assert_eq!(loaded.current_index, 3);
        assert_eq!(store.entries.len(), 1);
    }

    #[tokio::test]
    async fn delete_is_unconditional() {
        let store = MemorySnapshotStore::new("quiz:state:", 60_000);
        store.delete("999999").await.unwrap();

        store.save("123456", snapshot("123456")).await.unwrap();
        store.delete("123456").await.unwrap();
        assert!(store.load("123456").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn ping_always_reports_ok() {
        let store = MemorySnapshotStore::new("quiz:state:", 60_000);
        let health = store.ping().await;
        assert!(health.ok);
        assert_eq!(health.mode, "memory");
        assert!(health.error.is_none());
    }
}
