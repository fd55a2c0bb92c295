//! Shared application state: the room registry, the connection table, and
//! the snapshot store handle.

pub mod registry;
pub mod room;
pub mod scoring;

use std::sync::Arc;

use axum::extract::ws::Message;
use dashmap::DashMap;
use time::OffsetDateTime;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::{config::AppConfig, dao::snapshot_store::SnapshotStore, state::registry::RoomRegistry};

/// Cheaply cloneable handle to the central application state.
pub type SharedState = Arc<AppState>;

/// Handle used to push messages to a connected client.
#[derive(Clone)]
pub struct ClientConnection {
    /// Connection identity, allocated at socket upgrade.
    pub id: Uuid,
    /// Outbound channel drained by the connection's writer task.
    pub tx: mpsc::UnboundedSender<Message>,
}

/// Central application state shared by every handler.
pub struct AppState {
    config: AppConfig,
    store: Arc<dyn SnapshotStore>,
    rooms: RoomRegistry,
    connections: DashMap<Uuid, ClientConnection>,
}

impl AppState {
    /// Construct an [`AppState`] wrapped in an [`Arc`] so it can be cloned
    /// cheaply. The snapshot store backend is fixed for the process
    /// lifetime.
    pub fn new(config: AppConfig, store: Arc<dyn SnapshotStore>) -> SharedState {
        Arc::new(Self {
            config,
            store,
            rooms: RoomRegistry::new(),
            connections: DashMap::new(),
        })
    }

    /// Immutable runtime configuration.
    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    /// Handle to the snapshot store selected at startup.
    pub fn store(&self) -> Arc<dyn SnapshotStore> {
        self.store.clone()
    }

    /// PIN → room registry.
    pub fn rooms(&self) -> &RoomRegistry {
        &self.rooms
    }

    /// Registry of active client sockets keyed by connection identity.
    pub fn connections(&self) -> &DashMap<Uuid, ClientConnection> {
        &self.connections
    }
}

/// Current wall-clock time as epoch milliseconds.
pub fn now_epoch_ms() -> i64 {
    let now = OffsetDateTime::now_utc();
    (now.unix_timestamp_nanos() / 1_000_000) as i64
}
