//! Application-level configuration read from the environment.

use std::env;

use tracing::{info, warn};

/// Snapshot TTL applied when `QUIZ_STATE_TTL` is absent or invalid (6 hours).
const DEFAULT_TTL_SECS: i64 = 21_600;
/// Key namespace applied when `QUIZ_STATE_PREFIX` is absent.
const DEFAULT_KEY_PREFIX: &str = "quiz:state:";
/// Maximum number of leaderboard rows captured into a snapshot.
const SNAPSHOT_LEADERBOARD_LIMIT: usize = 50;

/// Immutable runtime configuration shared across the application.
#[derive(Debug, Clone)]
pub struct AppConfig {
    snapshot_ttl_ms: i64,
    key_prefix: String,
}

impl AppConfig {
    /// Load the configuration from the environment, falling back to the
    /// documented defaults on missing or malformed values.
    pub fn load() -> Self {
        let ttl_secs = match env::var("QUIZ_STATE_TTL") {
            Ok(raw) => match raw.parse::<i64>() {
                Ok(secs) if secs > 0 => secs,
                Ok(_) | Err(_) => {
                    warn!(value = %raw, "invalid QUIZ_STATE_TTL; using default");
                    DEFAULT_TTL_SECS
                }
            },
            Err(_) => DEFAULT_TTL_SECS,
        };

        let key_prefix = env::var("QUIZ_STATE_PREFIX")
            .ok()
            .filter(|prefix| !prefix.is_empty())
            .unwrap_or_else(|| DEFAULT_KEY_PREFIX.into());

        info!(ttl_secs, %key_prefix, "loaded snapshot store configuration");

        Self {
            snapshot_ttl_ms: ttl_secs * 1000,
            key_prefix,
        }
    }

    /// Snapshot TTL in milliseconds.
    pub fn snapshot_ttl_ms(&self) -> i64 {
        self.snapshot_ttl_ms
    }

    /// Key/document-id namespace for the snapshot store.
    pub fn key_prefix(&self) -> &str {
        &self.key_prefix
    }

    /// Leaderboard rows kept when capturing a snapshot.
    pub fn snapshot_leaderboard_limit(&self) -> usize {
        SNAPSHOT_LEADERBOARD_LIMIT
    }
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            snapshot_ttl_ms: DEFAULT_TTL_SECS * 1000,
            key_prefix: DEFAULT_KEY_PREFIX.into(),
        }
    }
}
