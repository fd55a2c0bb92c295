use serde::{Deserialize, Serialize};
use tracing::debug;
use utoipa::ToSchema;

use crate::state::room::{OPTION_COUNT, Question};

/// Answer window applied when an entry carries no usable time limit.
pub const DEFAULT_TIME_LIMIT_SEC: u32 = 20;

/// Raw question entry as supplied by the host in a `load-quiz` event.
///
/// Every field is optional on the wire so a malformed entry deserializes
/// instead of poisoning the whole batch; normalization decides its fate.
#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct QuestionInput {
    /// Question text.
    #[serde(default)]
    pub question: Option<String>,
    /// Answer options; exactly four are required.
    #[serde(default)]
    pub options: Vec<String>,
    /// Zero-based index of the correct option.
    #[serde(default)]
    pub correct_index: Option<i64>,
    /// Answer window in seconds.
    #[serde(default)]
    pub time_limit_sec: Option<i64>,
    /// Optional explanation revealed with the answer.
    #[serde(default)]
    pub explanation: Option<String>,
}

/// Per-entry normalization verdict.
///
/// The external contract stays silent-drop, but each rejection carries its
/// reason so the decision is observable and testable.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuestionOutcome {
    /// The entry is usable as-is (after defaulting the time limit).
    Valid(Question),
    /// The entry is dropped.
    Rejected {
        /// Why the entry was dropped.
        reason: &'static str,
    },
}

/// Validate and normalize a single raw entry.
pub fn normalize_question(input: QuestionInput) -> QuestionOutcome {
    let Some(text) = input
        .question
        .as_deref()
        .map(str::trim)
        .filter(|text| !text.is_empty())
    else {
        return QuestionOutcome::Rejected {
            reason: "missing or blank question text",
        };
    };

    let options: Vec<String> = input
        .options
        .iter()
        .map(|option| option.trim().to_string())
        .collect();
    if options.len() != OPTION_COUNT || options.iter().any(String::is_empty) {
        return QuestionOutcome::Rejected {
            reason: "questions need exactly four non-blank options",
        };
    }
    let options: [String; OPTION_COUNT] = match options.try_into() {
        Ok(options) => options,
        Err(_) => unreachable!("length checked above"),
    };

    let Some(correct_index) = input
        .correct_index
        .and_then(|index| usize::try_from(index).ok())
        .filter(|index| *index < OPTION_COUNT)
    else {
        return QuestionOutcome::Rejected {
            reason: "correct index out of range",
        };
    };

    let time_limit_sec = input
        .time_limit_sec
        .and_then(|limit| u32::try_from(limit).ok())
        .filter(|limit| *limit > 0)
        .unwrap_or(DEFAULT_TIME_LIMIT_SEC);

    let explanation = input
        .explanation
        .map(|text| text.trim().to_string())
        .filter(|text| !text.is_empty());

    QuestionOutcome::Valid(Question {
        text: text.to_string(),
        options,
        correct_index,
        time_limit_sec,
        explanation,
    })
}

/// Normalize a whole batch, keeping the valid subset in order.
///
/// Rejections are logged and dropped, never surfaced as a batch error.
pub fn normalize_questions(inputs: Vec<QuestionInput>) -> Vec<Question> {
    inputs
        .into_iter()
        .enumerate()
        .filter_map(|(index, input)| match normalize_question(input) {
            QuestionOutcome::Valid(question) => Some(question),
            QuestionOutcome::Rejected { reason } => {
                debug!(index, reason, "dropping invalid question entry");
                None
            }
        })
        .collect()
}
