#[cfg(feature = "couch-store")]
pub mod couchdb;
pub mod memory;

use futures::future::BoxFuture;
use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::{models::SnapshotEntity, storage::StorageResult};

/// Health status reported by [`SnapshotStore::ping`].
///
/// Pings never fail: backend errors are captured into `error` instead of
/// being raised, so the health endpoint can always answer.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct StoreHealth {
    /// Whether the backend answered the ping.
    pub ok: bool,
    /// Backend identifier (`"couchdb"` or `"memory"`).
    pub mode: &'static str,
    /// Backend failure message, when `ok` is false.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl StoreHealth {
    /// A healthy status for the given backend.
    pub fn ok(mode: &'static str) -> Self {
        Self {
            ok: true,
            mode,
            error: None,
        }
    }

    /// A failed status carrying the backend error message.
    pub fn failed(mode: &'static str, error: String) -> Self {
        Self {
            ok: false,
            mode,
            error: Some(error),
        }
    }
}

/// Abstraction over session snapshot persistence.
///
/// Exactly one implementation is selected at process start; callers never
/// branch on the backend beyond the diagnostic [`SnapshotStore::mode`].
pub trait SnapshotStore: Send + Sync {
    /// Upsert the snapshot for `pin`, overwriting any prior value and
    /// resetting its expiry to the configured TTL.
    fn save(&self, pin: &str, snapshot: SnapshotEntity) -> BoxFuture<'static, StorageResult<()>>;
    /// Last saved snapshot for `pin`, or `None` when missing or expired.
    fn load(&self, pin: &str) -> BoxFuture<'static, StorageResult<Option<SnapshotEntity>>>;
    /// Remove the snapshot for `pin`; an absent key is not an error.
    fn delete(&self, pin: &str) -> BoxFuture<'static, StorageResult<()>>;
    /// Reachability probe that never raises.
    fn ping(&self) -> BoxFuture<'static, StoreHealth>;
    /// Diagnostic backend name.
    fn mode(&self) -> &'static str;
}
