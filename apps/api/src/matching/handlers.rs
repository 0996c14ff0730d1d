//! Axum route handlers for ranked results.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::models::score::{CandidateScoreRecord, StoredScoreRecord};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct TopScoreResponse {
    pub jd_id: Uuid,
    pub top_score_candidates: Vec<StoredScoreRecord>,
}

#[derive(Debug, Serialize)]
pub struct RescoreResponse {
    pub jd_id: Uuid,
    pub top_score_candidates: Vec<CandidateScoreRecord>,
}

/// GET /api/top-score/:jd_id
///
/// Every scored candidate for the JD, best first. 404 when nothing has been scored.
pub async fn handle_get_top_scores(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(jd_id): Path<Uuid>,
) -> Result<Json<TopScoreResponse>, AppError> {
    let mut candidates = state.store.scores_for_job(&user_id, jd_id).await?;
    if candidates.is_empty() {
        return Err(AppError::NotFound("No top score candidates found.".to_string()));
    }
    candidates.sort_by(|a, b| b.record.total_score.total_cmp(&a.record.total_score));

    Ok(Json(TopScoreResponse {
        jd_id,
        top_score_candidates: candidates,
    }))
}

/// POST /api/top-score/:jd_id/rescore
///
/// Recomputes totals from the stored category scores with the user's current
/// weights. Does not call the scoring model.
pub async fn handle_rescore(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(jd_id): Path<Uuid>,
) -> Result<Json<RescoreResponse>, AppError> {
    if state.store.job_description(&user_id, jd_id).await?.is_none() {
        return Err(AppError::NotFound("Job Description not found".to_string()));
    }

    let top_score_candidates = state
        .orchestrator()
        .rescore_job_description(&user_id, jd_id)
        .await?;

    Ok(Json(RescoreResponse {
        jd_id,
        top_score_candidates,
    }))
}
