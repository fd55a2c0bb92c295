use tracing::warn;

use crate::{dao::snapshot_store::SnapshotStore, dto::health::HealthResponse, state::SharedState};

/// Ping the snapshot store and fold the result into a health payload.
pub async fn health_status(state: &SharedState) -> HealthResponse {
    let store_health = state.store().ping().await;
    if !store_health.ok {
        warn!(mode = store_health.mode, error = ?store_health.error, "snapshot store ping failed");
    }
    store_health.into()
}
