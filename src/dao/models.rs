use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Schema version stamped on every persisted snapshot envelope.
pub const SNAPSHOT_SCHEMA_VERSION: u32 = 1;

/// Durable projection of a live session.
///
/// Never contains connection identifiers: participants appear by display
/// name only, so a snapshot is safe to persist and can only be used to
/// reconstruct scores-by-name and the resume position.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotEntity {
    /// Six-digit session PIN the snapshot belongs to.
    pub pin: String,
    /// Index of the last revealed question, `-1` before the first reveal.
    pub current_index: i64,
    /// Leaderboard at capture time, capped to the configured size.
    pub leaderboard: Vec<LeaderboardEntryEntity>,
    /// Every revealed question with its per-participant results.
    pub history: Vec<HistoryEntryEntity>,
    /// Capture timestamp, epoch milliseconds.
    pub timestamp: i64,
}

/// One name/score pair of a persisted leaderboard.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct LeaderboardEntryEntity {
    /// Display name of the participant.
    pub name: String,
    /// Cumulative score at capture time.
    pub score: i64,
}

/// Persisted record of a single revealed question.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntryEntity {
    /// Zero-based question index.
    pub index: usize,
    /// Question text as shown to participants.
    pub question: String,
    /// Zero-based index of the correct option.
    pub correct_index: usize,
    /// Optional explanation revealed with the answer.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub explanation: Option<String>,
    /// Result of every participant present at reveal time.
    pub per_player: Vec<PlayerResultEntity>,
}

/// Per-participant outcome captured at reveal time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct PlayerResultEntity {
    /// Display name of the participant.
    pub name: String,
    /// Whether the chosen option was the correct one.
    pub correct: bool,
    /// Cumulative score after this question's points were applied.
    pub score: i64,
    /// Clamped answer latency in milliseconds (full duration if unanswered).
    pub time_ms: i64,
    /// Points earned on this question.
    pub earned: i64,
}

/// Envelope the store layer wraps around every persisted snapshot.
///
/// The version tag and timestamps are added transparently on save and
/// stripped on load; callers only ever see [`SnapshotEntity`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SnapshotEnvelope {
    /// Schema version of the enclosed snapshot.
    #[serde(rename = "_v")]
    pub version: u32,
    /// Save timestamp, epoch milliseconds.
    #[serde(rename = "_savedAt")]
    pub saved_at: i64,
    /// Expiry timestamp, epoch milliseconds; the value reads as absent past it.
    #[serde(rename = "_expiresAt")]
    pub expires_at: i64,
    /// The snapshot payload itself.
    #[serde(flatten)]
    pub snapshot: SnapshotEntity,
}

impl SnapshotEnvelope {
    /// Wrap a snapshot for persistence, stamping version and expiry.
    pub fn wrap(snapshot: SnapshotEntity, now_ms: i64, ttl_ms: i64) -> Self {
        Self {
            version: SNAPSHOT_SCHEMA_VERSION,
            saved_at: now_ms,
            expires_at: now_ms.saturating_add(ttl_ms),
            snapshot,
        }
    }

    /// Whether the envelope has outlived its TTL. Both backends use this
    /// check so expiry behaves identically regardless of the engine.
    pub fn is_expired(&self, now_ms: i64) -> bool {
        now_ms > self.expires_at
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn snapshot() -> SnapshotEntity {
        SnapshotEntity {
            pin: "123456".into(),
            current_index: 1,
            leaderboard: vec![LeaderboardEntryEntity {
                name: "ada".into(),
                score: 1450,
            }],
            history: Vec::new(),
            timestamp: 1_000,
        }
    }

    #[test]
    fn wrap_stamps_version_and_expiry() {
        let envelope = SnapshotEnvelope::wrap(snapshot(), 10_000, 5_000);
        assert_eq!(envelope.version, SNAPSHOT_SCHEMA_VERSION);
        assert_eq!(envelope.saved_at, 10_000);
        assert_eq!(envelope.expires_at, 15_000);
    }

    #[test]
    fn expiry_is_exclusive_of_the_deadline_instant() {
        let envelope = SnapshotEnvelope::wrap(snapshot(), 10_000, 5_000);
        assert!(!envelope.is_expired(15_000));
        assert!(envelope.is_expired(15_001));
    }

    #[test]
    fn envelope_round_trips_with_flattened_snapshot() {
        let envelope = SnapshotEnvelope::wrap(snapshot(), 10_000, 5_000);
        let json = serde_json::to_value(&envelope).unwrap();
        assert_eq!(json["_v"], 1);
        assert_eq!(json["pin"], "123456");
        assert_eq!(json["currentIndex"], 1);

        let back: SnapshotEnvelope = serde_json::from_value(json).unwrap();
        assert_eq!(back.snapshot, envelope.snapshot);
    }
}
