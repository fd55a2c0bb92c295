use serde::Serialize;
use utoipa::ToSchema;

use crate::dao::snapshot_store::StoreHealth;

/// Health response returned by the `/healthcheck` route.
#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    /// Health status ("ok" or "degraded").
    pub status: String,
    /// Snapshot store ping result.
    pub store: StoreHealth,
}

impl From<StoreHealth> for HealthResponse {
    fn from(store: StoreHealth) -> Self {
        let status = if store.ok { "ok" } else { "degraded" };
        Self {
            status: status.to_string(),
            store,
        }
    }
}
