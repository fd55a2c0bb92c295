use std::sync::Arc;

use dashmap::DashMap;
use rand::Rng;
use tokio::sync::Mutex;
use tracing::info;
use uuid::Uuid;

use crate::state::room::RoomSession;

/// Shared handle to one room, locked for the duration of each operation.
pub type RoomHandle = Arc<Mutex<RoomSession>>;

/// Owned PIN → room mapping.
///
/// Individual insert/lookup/delete operations are each atomic; the registry
/// is the only structure touched across sessions.
#[derive(Default)]
pub struct RoomRegistry {
    rooms: DashMap<String, RoomHandle>,
}

impl RoomRegistry {
    /// Empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Allocate a fresh session with a random PIN and the calling
    /// connection as host. The PIN space is assumed collision-free at
    /// expected load, so an existing entry is simply replaced.
    pub fn create(&self, host: Uuid) -> (String, RoomHandle) {
        let pin = generate_pin();
        let handle: RoomHandle = Arc::new(Mutex::new(RoomSession::new(pin.clone(), host)));
        self.rooms.insert(pin.clone(), handle.clone());
        info!(%pin, "session created");
        (pin, handle)
    }

    /// Register a session reconstructed from a snapshot, replacing any
    /// live entry under the same PIN.
    pub fn insert_resumed(&self, room: RoomSession) -> RoomHandle {
        let pin = room.pin().to_string();
        let handle: RoomHandle = Arc::new(Mutex::new(room));
        self.rooms.insert(pin.clone(), handle.clone());
        info!(%pin, "session resumed into registry");
        handle
    }

    /// Look up a live session.
    pub fn get(&self, pin: &str) -> Option<RoomHandle> {
        self.rooms.get(pin).map(|entry| entry.value().clone())
    }

    /// Remove a session, returning its handle when one was registered.
    pub fn remove(&self, pin: &str) -> Option<RoomHandle> {
        self.rooms.remove(pin).map(|(_, handle)| handle)
    }

    /// Number of live sessions, for logging and diagnostics.
    pub fn len(&self) -> usize {
        self.rooms.len()
    }

    /// Whether no session is registered.
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
    }
}

/// Uniform random six-digit PIN, zero-padded.
fn generate_pin() -> String {
    format!("{:06}", rand::rng().random_range(0..1_000_000))
}
