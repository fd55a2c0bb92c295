use serde::Serialize;
use utoipa::ToSchema;

/// Response of `POST /sessions/{pin}/resume`.
#[derive(Debug, Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct ResumeResponse {
    /// Always true on success; failures surface as HTTP errors.
    pub ok: bool,
    /// PIN of the reconstructed session.
    pub pin: String,
    /// Restored question index: the last revealed question, `-1` if none.
    pub current_index: i64,
    /// Name/score pairs participants can reclaim by rejoining.
    #[schema(value_type = Vec<Vec<String>>)]
    pub carried_scores: Vec<(String, i64)>,
}
