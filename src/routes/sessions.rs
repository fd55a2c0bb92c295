use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};

use crate::{
    dao::models::SnapshotEntity,
    dto::{public::ResumeResponse, validation::validate_pin},
    error::AppError,
    services::snapshot_service,
    state::SharedState,
};

/// Routes for session resume and snapshot export.
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/sessions/{pin}/resume", post(resume_session))
        .route("/sessions/{pin}/snapshot", get(session_snapshot))
}

#[utoipa::path(
    post,
    path = "/sessions/{pin}/resume",
    tag = "sessions",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    responses(
        (status = 200, description = "Session reconstructed from its snapshot", body = ResumeResponse),
        (status = 404, description = "No snapshot exists for this PIN")
    )
)]
/// Reconstruct a session from its durable snapshot and register it.
pub async fn resume_session(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
) -> Result<Json<ResumeResponse>, AppError> {
    validate_pin(&pin).map_err(|err| AppError::BadRequest(err.to_string()))?;
    let response = snapshot_service::resume(&state, &pin).await?;
    Ok(Json(response))
}

#[utoipa::path(
    get,
    path = "/sessions/{pin}/snapshot",
    tag = "sessions",
    params(("pin" = String, Path, description = "Six-digit session PIN")),
    responses(
        (status = 200, description = "Current or last durable snapshot", body = SnapshotEntity),
        (status = 404, description = "Neither a live session nor a snapshot exists")
    )
)]
/// Export the current in-memory snapshot, or the last durable one.
pub async fn session_snapshot(
    State(state): State<SharedState>,
    Path(pin): Path<String>,
) -> Result<Json<SnapshotEntity>, AppError> {
    validate_pin(&pin).map_err(|err| AppError::BadRequest(err.to_string()))?;
    let snapshot = snapshot_service::current_snapshot(&state, &pin).await?;
    Ok(Json(snapshot))
}
