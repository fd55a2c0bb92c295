//! Snapshot persistence and resume reconstruction.

use tracing::{info, warn};

use crate::{
    dao::{models::SnapshotEntity, snapshot_store::SnapshotStore},
    dto::public::ResumeResponse,
    error::ServiceError,
    state::{SharedState, now_epoch_ms, room::RoomSession},
};

/// Persist the session's current snapshot as a detached task.
///
/// Called at every reveal and at game over. Failures are logged, never
/// retried, and never roll back the in-memory transition that triggered
/// the save.
pub fn autosave(state: &SharedState, room: &RoomSession) {
    let snapshot = room.snapshot(now_epoch_ms(), state.config().snapshot_leaderboard_limit());
    let store = state.store();
    let pin = room.pin().to_string();

    tokio::spawn(async move {
        if let Err(err) = store.save(&pin, snapshot).await {
            warn!(%pin, error = %err, "snapshot autosave failed");
        }
    });
}

/// Reconstruct a session from its most recent durable snapshot and register
/// it, host-less, under its PIN.
///
/// Fails with a not-found condition when no snapshot exists; a store outage
/// degrades to the same condition rather than crashing the caller.
pub async fn resume(state: &SharedState, pin: &str) -> Result<ResumeResponse, ServiceError> {
    let snapshot = match state.store().load(pin).await {
        Ok(Some(snapshot)) => snapshot,
        Ok(None) => {
            return Err(ServiceError::NotFound(format!(
                "no snapshot for session `{pin}`"
            )));
        }
        Err(err) => {
            warn!(%pin, error = %err, "snapshot load failed; treating resume as not found");
            return Err(ServiceError::NotFound(format!(
                "no snapshot for session `{pin}`"
            )));
        }
    };

    let carried_scores: Vec<(String, i64)> = snapshot
        .leaderboard
        .iter()
        .map(|entry| (entry.name.clone(), entry.score))
        .collect();

    let room = RoomSession::resumed(
        pin.to_string(),
        snapshot.history.into_iter().map(Into::into).collect(),
        carried_scores.iter().cloned().collect(),
    );
    let current_index = room.current_index();
    state.rooms().insert_resumed(room);

    info!(%pin, current_index, carried = carried_scores.len(), "session resumed from snapshot");

    Ok(ResumeResponse {
        ok: true,
        pin: pin.to_string(),
        current_index,
        carried_scores,
    })
}

/// Current snapshot projection for a PIN: the live session's state when one
/// is registered, else the last durable snapshot.
pub async fn current_snapshot(
    state: &SharedState,
    pin: &str,
) -> Result<SnapshotEntity, ServiceError> {
    if let Some(handle) = state.rooms().get(pin) {
        let room = handle.lock().await;
        return Ok(room.snapshot(now_epoch_ms(), state.config().snapshot_leaderboard_limit()));
    }

    match state.store().load(pin).await? {
        Some(snapshot) => Ok(snapshot),
        None => Err(ServiceError::NotFound(format!(
            "no snapshot for session `{pin}`"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use uuid::Uuid;

    use super::*;
    use crate::{
        config::AppConfig,
        dao::{
            models::{HistoryEntryEntity, LeaderboardEntryEntity, PlayerResultEntity},
            snapshot_store::memory::MemorySnapshotStore,
        },
        state::AppState,
        state::room::NextOutcome,
    };

    fn test_state() -> SharedState {
        let store = Arc::new(MemorySnapshotStore::new("quiz:state:", 60_000));
        AppState::new(AppConfig::default(), store)
    }

    fn stored_snapshot(pin: &str) -> SnapshotEntity {
        SnapshotEntity {
            pin: pin.into(),
            current_index: 1,
            leaderboard: vec![
                LeaderboardEntryEntity {
                    name: "ada".into(),
                    score: 1450,
                },
                LeaderboardEntryEntity {
                    name: "grace".into(),
                    score: 800,
                },
            ],
            history: vec![
                HistoryEntryEntity {
                    index: 0,
                    question: "q0".into(),
                    correct_index: 2,
                    explanation: None,
                    per_player: vec![PlayerResultEntity {
                        name: "ada".into(),
                        correct: true,
                        score: 650,
                        time_ms: 8_000,
                        earned: 650,
                    }],
                },
                HistoryEntryEntity {
                    index: 1,
                    question: "q1".into(),
                    correct_index: 0,
                    explanation: Some("why".into()),
                    per_player: Vec::new(),
                },
            ],
            timestamp: 123,
        }
    }

    #[tokio::test]
    async fn resume_restores_position_and_carried_scores() {
        let state = test_state();
        state
            .store()
            .save("654321", stored_snapshot("654321"))
            .await
            .unwrap();

        let response = resume(&state, "654321").await.unwrap();
        assert!(response.ok);
        assert_eq!(response.current_index, 1);
        assert!(
            response
                .carried_scores
                .contains(&("ada".to_string(), 1450))
        );

        // The reconstructed session is live and rejoining seeds the score.
        let handle = state.rooms().get("654321").expect("session registered");
        let mut room = handle.lock().await;
        assert!(room.host().is_none());
        let rejoined = room.join(Uuid::new_v4(), "ada");
        assert_eq!(rejoined.score, 1450);

        // The next advance goes past the last revealed question.
        let host = Uuid::new_v4();
        assert!(room.attach_host(host));
        let questions = crate::dto::game::normalize_questions(vec![
            crate::dto::game::QuestionInput {
                question: Some("q".into()),
                options: vec!["a".into(), "b".into(), "c".into(), "d".into()],
                correct_index: Some(0),
                time_limit_sec: None,
                explanation: None,
            };
            3
        ]);
        assert!(room.load_questions(host, questions));
        match room.next_question(host, 0) {
            NextOutcome::Question(start) => assert_eq!(start.index, 2),
            other => panic!("expected question start, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn resume_without_snapshot_is_not_found() {
        let state = test_state();
        assert!(matches!(
            resume(&state, "000000").await,
            Err(ServiceError::NotFound(_))
        ));
        assert!(state.rooms().get("000000").is_none());
    }

    #[tokio::test]
    async fn current_snapshot_prefers_the_live_session() {
        let state = test_state();
        state
            .store()
            .save("654321", stored_snapshot("654321"))
            .await
            .unwrap();
        resume(&state, "654321").await.unwrap();

        // The live (resumed) session has no joined players yet, so its
        // projection differs from the stored leaderboard.
        let live = current_snapshot(&state, "654321").await.unwrap();
        assert!(live.leaderboard.is_empty());
        assert_eq!(live.history.len(), 2);

        state.rooms().remove("654321");
        let durable = current_snapshot(&state, "654321").await.unwrap();
        assert_eq!(durable.leaderboard.len(), 2);

        assert!(matches!(
            current_snapshot(&state, "111111").await,
            Err(ServiceError::NotFound(_))
        ));
    }
}
