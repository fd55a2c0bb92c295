//! Pure scoring rules for answered questions.

use crate::state::room::Question;

/// Points awarded for a correct answer exactly at the deadline.
pub const MIN_POINTS: f64 = 200.0;
/// Points awarded for an instantaneous correct answer.
pub const MAX_POINTS: f64 = 1000.0;
/// Awards are rounded to the nearest multiple of this step.
const POINT_STEP: f64 = 50.0;

/// Compute the points earned for one participant on one question.
///
/// Returns 0 when the participant never answered or chose a wrong option.
/// Otherwise the award scales linearly from [`MAX_POINTS`] (instantaneous)
/// down to [`MIN_POINTS`] (at the deadline), rounded half-up to a multiple
/// of 50. Elapsed time is clamped into the question's duration, so answers
/// recorded past the advisory deadline still earn the minimum.
///
/// Stateless and side-effect free: accumulating the award onto the
/// participant's score is the caller's job.
pub fn score(
    question: &Question,
    answered_at_ms: Option<i64>,
    question_started_at_ms: i64,
    chosen_index: Option<i64>,
) -> i64 {
    let Some(answered_at_ms) = answered_at_ms else {
        return 0;
    };
    let Some(chosen_index) = chosen_index else {
        return 0;
    };
    if chosen_index != question.correct_index as i64 {
        return 0;
    }

    let duration_ms = i64::from(question.time_limit_sec) * 1000;
    let elapsed_ms = (answered_at_ms - question_started_at_ms).clamp(0, duration_ms);

    let speed_factor = 1.0 - elapsed_ms as f64 / duration_ms as f64;
    let raw = MIN_POINTS + (MAX_POINTS - MIN_POINTS) * speed_factor;

    // f64::round is half-away-from-zero, which is half-up for positive raw.
    ((raw / POINT_STEP).round() * POINT_STEP) as i64
}
