//! Session event handlers.
//!
//! Each handler resolves the target room, performs one state-machine
//! operation under the room lock, and relays the resulting broadcasts.
//! Rejected operations are indistinguishable from no-ops on the wire; only
//! unknown-PIN `join`/`attach` surface an explicit error event.

use tracing::{debug, info};
use uuid::Uuid;

use crate::{
    dto::{
        game::{QuestionInput, normalize_questions},
        ws::ServerMessage,
    },
    services::{snapshot_service, ws_events},
    state::{
        SharedState, now_epoch_ms,
        room::{NextOutcome, RevealOutcome, RoomSession, SubmitOutcome},
    },
};

/// What a connection is to its session, recorded by the socket task after
/// the last successful bind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionBinding {
    /// Session the connection is bound to.
    pub pin: String,
    /// Whether the connection hosts or participates.
    pub role: SessionRole,
}

/// Role a bound connection plays in its session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionRole {
    /// The connection controls pacing and owns the session lifetime.
    Host,
    /// The connection answers questions.
    Participant,
}

/// Allocate a fresh session with the calling connection as host and reply
/// with its PIN.
pub fn create_session(state: &SharedState, conn: Uuid) -> String {
    let (pin, _handle) = state.rooms().create(conn);
    ws_events::send_to_connection(state, conn, &ServerMessage::SessionCreated { pin: pin.clone() });
    pin
}

/// Replace the question set of a session. Invalid entries are filtered out;
/// non-host callers and unknown PINs are silently ignored.
pub async fn load_quiz(state: &SharedState, conn: Uuid, pin: &str, questions: Vec<QuestionInput>) {
    let Some(handle) = state.rooms().get(pin) else {
        debug!(%pin, "load-quiz ignored: unknown session");
        return;
    };

    let received = questions.len();
    let questions = normalize_questions(questions);
    let kept = questions.len();

    let mut room = handle.lock().await;
    if room.load_questions(conn, questions) {
        info!(%pin, received, kept, "quiz loaded");
    }
}

/// Advance the session to its next question, or finish the game when the
/// list is exhausted.
pub async fn next_question(state: &SharedState, conn: Uuid, pin: &str) {
    let Some(handle) = state.rooms().get(pin) else {
        debug!(%pin, "next-question ignored: unknown session");
        return;
    };

    let mut room = handle.lock().await;
    match room.next_question(conn, now_epoch_ms()) {
        NextOutcome::Question(start) => {
            let status = room.status_report();
            let message = ServerMessage::QuestionStarted {
                index: start.index,
                total: start.total,
                question: start.question,
                options: start.options.to_vec(),
                time_limit_sec: start.time_limit_sec,
                deadline_epoch_ms: start.deadline_epoch_ms,
                totals: status.into(),
            };
            ws_events::send_to_members(state, &room.member_ids(), &message);
            send_status_to_host(state, &room);
            info!(%pin, index = start.index, "question started");
        }
        NextOutcome::GameOver { leaderboard } => {
            let message = ServerMessage::GameOver {
                leaderboard: leaderboard.into_iter().map(Into::into).collect(),
            };
            ws_events::send_to_members(state, &room.member_ids(), &message);
            snapshot_service::autosave(state, &room);
            info!(%pin, "game over");
        }
        NextOutcome::Ignored => {}
    }
}

/// Host-triggered early reveal of the current question.
pub async fn reveal(state: &SharedState, conn: Uuid, pin: &str) {
    let Some(handle) = state.rooms().get(pin) else {
        debug!(%pin, "reveal ignored: unknown session");
        return;
    };

    let mut room = handle.lock().await;
    if let Some(outcome) = room.reveal_requested(conn) {
        broadcast_reveal(state, &room, outcome);
    }
}

/// Join a session as a participant. Returns whether the join succeeded so
/// the socket task can record its binding.
pub async fn join(state: &SharedState, conn: Uuid, pin: &str, name: &str) -> bool {
    let Some(handle) = state.rooms().get(pin) else {
        ws_events::send_to_connection(
            state,
            conn,
            &ServerMessage::Error {
                message: format!("session `{pin}` not found"),
            },
        );
        return false;
    };

    let mut room = handle.lock().await;
    let joined = room.join(conn, name);
    info!(%pin, name = %joined.name, score = joined.score, "participant joined");

    ws_events::send_to_connection(
        state,
        conn,
        &ServerMessage::Joined {
            pin: pin.to_string(),
            name: joined.name,
            score: joined.score,
        },
    );
    send_status_to_host(state, &room);
    true
}

/// Record a participant's answer, report progress to the host, and relay
/// the reveal when this answer completed the set.
pub async fn submit_answer(state: &SharedState, conn: Uuid, pin: &str, option_index: i64) {
    let Some(handle) = state.rooms().get(pin) else {
        debug!(%pin, "answer ignored: unknown session");
        return;
    };

    let mut room = handle.lock().await;
    match room.submit_answer(conn, option_index, now_epoch_ms()) {
        SubmitOutcome::Recorded {
            status,
            auto_reveal,
        } => {
            if let Some(host) = room.host() {
                ws_events::send_to_connection(state, host, &status.into());
            }
            if let Some(outcome) = auto_reveal {
                info!(%pin, "all participants answered; revealing");
                broadcast_reveal(state, &room, outcome);
            }
        }
        SubmitOutcome::Ignored => {}
    }
}

/// Bind a host connection to a resumed session. Returns whether the bind
/// took effect.
pub async fn attach(state: &SharedState, conn: Uuid, pin: &str) -> bool {
    let Some(handle) = state.rooms().get(pin) else {
        ws_events::send_to_connection(
            state,
            conn,
            &ServerMessage::Error {
                message: format!("session `{pin}` not found"),
            },
        );
        return false;
    };

    let mut room = handle.lock().await;
    if !room.attach_host(conn) {
        return false;
    }
    info!(%pin, %conn, "host attached to resumed session");
    send_status_to_host(state, &room);
    true
}

/// Tear down after a socket closed: a host disconnect ends the whole
/// session, a participant disconnect shrinks the roster. Exactly one of the
/// two actions fires, selected by the connection's last binding.
pub async fn disconnect(state: &SharedState, conn: Uuid, binding: Option<SessionBinding>) {
    let Some(binding) = binding else {
        return;
    };

    match binding.role {
        SessionRole::Host => {
            let Some(handle) = state.rooms().remove(&binding.pin) else {
                return;
            };
            let mut room = handle.lock().await;
            room.mark_ended();
            ws_events::send_to_members(state, &room.member_ids(), &ServerMessage::SessionEnded);
            info!(pin = %binding.pin, "session ended: host disconnected");
        }
        SessionRole::Participant => {
            let Some(handle) = state.rooms().get(&binding.pin) else {
                return;
            };
            let mut room = handle.lock().await;
            if room.remove_player(conn).is_some() {
                info!(pin = %binding.pin, %conn, "participant left");
                send_status_to_host(state, &room);
            }
        }
    }
}

/// Relay a reveal outcome: results to the whole session, the raw tally to
/// the host alone, then the durable snapshot write.
fn broadcast_reveal(state: &SharedState, room: &RoomSession, outcome: RevealOutcome) {
    let message = ServerMessage::RevealResult {
        correct_index: outcome.correct_index,
        leaderboard: outcome.leaderboard.into_iter().map(Into::into).collect(),
        per_participant: outcome.per_player.into_iter().map(Into::into).collect(),
        explanation: outcome.explanation,
    };
    ws_events::send_to_members(state, &room.member_ids(), &message);

    if let Some(host) = room.host() {
        ws_events::send_to_connection(
            state,
            host,
            &ServerMessage::OptionTally {
                counts: outcome.tally.to_vec(),
                correct_index: outcome.correct_index,
                totals: room.status_report().into(),
            },
        );
    }

    // The broadcast above is already out: a failing write never rolls the
    // phase back.
    snapshot_service::autosave(state, room);
}

fn send_status_to_host(state: &SharedState, room: &RoomSession) {
    if let Some(host) = room.host() {
        ws_events::send_to_connection(state, host, &room.status_report().into());
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::snapshot_store::memory::MemorySnapshotStore,
        state::{AppState, room::RoomPhase},
    };

    fn test_state() -> SharedState {
        let store = Arc::new(MemorySnapshotStore::new("quiz:state:", 60_000));
        AppState::new(AppConfig::default(), store)
    }

    fn question_input() -> QuestionInput {
        QuestionInput {
            question: Some("capital of France?".into()),
            options: vec!["Paris".into(), "Lyon".into(), "Marseille".into(), "Lille".into()],
            correct_index: Some(0),
            time_limit_sec: Some(20),
            explanation: None,
        }
    }

    #[tokio::test]
    async fn host_disconnect_removes_the_session_for_later_joins() {
        let state = test_state();
        let host = Uuid::new_v4();
        let pin = create_session(&state, host);
        assert!(join(&state, Uuid::new_v4(), &pin, "ada").await);

        disconnect(
            &state,
            host,
            Some(SessionBinding {
                pin: pin.clone(),
                role: SessionRole::Host,
            }),
        )
        .await;

        assert!(state.rooms().get(&pin).is_none());
        assert!(!join(&state, Uuid::new_v4(), &pin, "too-late").await);
    }

    #[tokio::test]
    async fn participant_disconnect_only_shrinks_the_roster() {
        let state = test_state();
        let host = Uuid::new_v4();
        let pin = create_session(&state, host);
        let player = Uuid::new_v4();
        assert!(join(&state, player, &pin, "ada").await);

        disconnect(
            &state,
            player,
            Some(SessionBinding {
                pin: pin.clone(),
                role: SessionRole::Participant,
            }),
        )
        .await;

        let handle = state.rooms().get(&pin).expect("session still live");
        assert_eq!(handle.lock().await.status_report().joined, 0);
    }

    #[tokio::test]
    async fn a_full_round_reaches_reveal_once_everyone_answered() {
        let state = test_state();
        let host = Uuid::new_v4();
        let pin = create_session(&state, host);
        load_quiz(&state, host, &pin, vec![question_input()]).await;

        let (ada, grace) = (Uuid::new_v4(), Uuid::new_v4());
        assert!(join(&state, ada, &pin, "ada").await);
        assert!(join(&state, grace, &pin, "grace").await);

        next_question(&state, host, &pin).await;
        submit_answer(&state, ada, &pin, 0).await;
        submit_answer(&state, grace, &pin, 1).await;

        let handle = state.rooms().get(&pin).unwrap();
        let room = handle.lock().await;
        assert_eq!(room.phase(), RoomPhase::Reveal);
        assert_eq!(room.history().len(), 1);
        assert!(room.history()[0].per_player.iter().any(|r| r.correct));
    }

    #[tokio::test]
    async fn load_quiz_from_a_non_host_changes_nothing() {
        let state = test_state();
        let host = Uuid::new_v4();
        let pin = create_session(&state, host);

        load_quiz(&state, Uuid::new_v4(), &pin, vec![question_input()]).await;

        let handle = state.rooms().get(&pin).unwrap();
        assert_eq!(handle.lock().await.question_count(), 0);
    }
}
