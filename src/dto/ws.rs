use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{
    dto::game::QuestionInput,
    state::room::{LeaderboardEntry, PlayerResult, StatusReport},
};

/// Messages accepted from WebSocket clients.
#[derive(Debug, Deserialize, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ClientMessage {
    /// Host asks for a fresh session; the server replies with its PIN.
    CreateSession,
    /// Host replaces the question set. Invalid entries are silently filtered.
    LoadQuiz {
        /// Target session.
        pin: String,
        /// Raw question entries to validate and normalize.
        questions: Vec<QuestionInput>,
    },
    /// Host advances to the next question (or ends the game).
    NextQuestion {
        /// Target session.
        pin: String,
    },
    /// Host reveals the current question's answer early.
    Reveal {
        /// Target session.
        pin: String,
    },
    /// Host binds itself to a resumed session.
    Attach {
        /// Target session.
        pin: String,
    },
    /// Participant joins a session under a display name.
    Join {
        /// Target session.
        pin: String,
        /// Requested display name; blank falls back to a placeholder.
        name: String,
    },
    /// Participant answers the live question. Idempotent per question.
    Answer {
        /// Target session.
        pin: String,
        /// Zero-based chosen option, unchecked against the option range.
        option_index: i64,
    },
    /// Anything unrecognized; logged and dropped.
    #[serde(other)]
    Unknown,
}

impl ClientMessage {
    /// Parse an inbound text frame.
    pub fn from_json_str(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }
}

/// Messages pushed to WebSocket clients.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(tag = "type", rename_all = "kebab-case", rename_all_fields = "camelCase")]
pub enum ServerMessage {
    /// Reply to `create-session`, addressed to the creating host.
    SessionCreated {
        /// PIN of the freshly allocated session.
        pin: String,
    },
    /// Join acknowledgement carrying the (possibly carried-over) score.
    Joined {
        /// Session joined.
        pin: String,
        /// Normalized display name.
        name: String,
        /// Starting score.
        score: i64,
    },
    /// A new question went live. The correct index is withheld.
    QuestionStarted {
        /// Zero-based question index.
        index: usize,
        /// Total number of questions.
        total: usize,
        /// Question text.
        question: String,
        /// The four options in display order.
        options: Vec<String>,
        /// Answer window in seconds.
        time_limit_sec: u32,
        /// Advisory deadline, epoch milliseconds.
        deadline_epoch_ms: i64,
        /// Joined/answered counters at start time.
        totals: StatusTotals,
    },
    /// Host-only progress update.
    Status {
        /// Joined/answered counters.
        totals: StatusTotals,
        /// Whether answers are currently accepted.
        accepting: bool,
        /// Advisory deadline, epoch milliseconds.
        deadline_epoch_ms: i64,
    },
    /// Outcome of the current question, sent to the whole session.
    RevealResult {
        /// Zero-based index of the correct option.
        correct_index: usize,
        /// Standings after this question.
        leaderboard: Vec<LeaderboardRow>,
        /// Per-participant outcomes.
        per_participant: Vec<ParticipantResult>,
        /// Optional explanation.
        #[serde(skip_serializing_if = "Option::is_none")]
        explanation: Option<String>,
    },
    /// Host-only raw answer counts, sent alongside `reveal-result`.
    OptionTally {
        /// Answer count per option.
        counts: Vec<u32>,
        /// Zero-based index of the correct option.
        correct_index: usize,
        /// Joined/answered counters.
        totals: StatusTotals,
    },
    /// The question list is exhausted.
    GameOver {
        /// Final standings.
        leaderboard: Vec<LeaderboardRow>,
    },
    /// The host disconnected and the session is gone.
    SessionEnded,
    /// Explicit failure; only emitted for unknown-PIN join/attach.
    Error {
        /// Human-readable reason.
        message: String,
    },
}

/// Joined/answered counter pair.
#[derive(Debug, Clone, Copy, Serialize, ToSchema)]
pub struct StatusTotals {
    /// Currently joined participants.
    pub joined: usize,
    /// Participants who answered the current question.
    pub answered: usize,
}

/// One leaderboard row as sent on the wire.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct LeaderboardRow {
    /// Display name.
    pub name: String,
    /// Cumulative score.
    pub score: i64,
}

/// One participant's outcome as sent on the wire.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ParticipantResult {
    /// Display name.
    pub name: String,
    /// Whether the chosen option was correct.
    pub correct: bool,
    /// Clamped answer latency in milliseconds.
    pub time_ms: i64,
    /// Points earned on this question.
    pub earned: i64,
    /// Cumulative score after the award.
    pub score: i64,
}

impl From<StatusReport> for StatusTotals {
    fn from(status: StatusReport) -> Self {
        Self {
            joined: status.joined,
            answered: status.answered,
        }
    }
}

impl From<StatusReport> for ServerMessage {
    fn from(status: StatusReport) -> Self {
        ServerMessage::Status {
            totals: status.into(),
            accepting: status.accepting,
            deadline_epoch_ms: status.deadline_epoch_ms,
        }
    }
}

impl From<LeaderboardEntry> for LeaderboardRow {
    fn from(entry: LeaderboardEntry) -> Self {
        Self {
            name: entry.name,
            score: entry.score,
        }
    }
}

impl From<PlayerResult> for ParticipantResult {
    fn from(result: PlayerResult) -> Self {
        Self {
            name: result.name,
            correct: result.correct,
            time_ms: result.time_ms,
            earned: result.earned,
            score: result.score,
        }
    }
}
