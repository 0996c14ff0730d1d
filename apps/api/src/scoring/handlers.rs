//! Axum route handlers for per-user weight profiles.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::Serialize;
use serde_json::Value;

use crate::auth::AuthUser;
use crate::errors::AppError;
use crate::scoring::weight_store::WeightStore;
use crate::scoring::weights::{ProfileType, UserWeightConfig, WeightProfile};
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct WeightsResponse {
    pub weights: UserWeightConfig,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

/// GET /api/user-weights
///
/// Returns whatever tiers are stored. Defaults are seeded on first upload,
/// not here.
pub async fn handle_get_weights(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
) -> Result<Json<WeightsResponse>, AppError> {
    let weights = WeightStore::new(state.store.as_ref()).get_all(&user_id).await?;
    Ok(Json(WeightsResponse { weights }))
}

/// PUT /api/user-weights/:role
///
/// Body: `{"weights": {"skills": 30, "experience": 40, "education": 20, "certifications": 10}}`.
/// The four weights must sum to 100 and the role must already exist.
pub async fn handle_update_weights(
    State(state): State<AppState>,
    AuthUser(user_id): AuthUser,
    Path(role): Path<String>,
    Json(body): Json<Value>,
) -> Result<Json<MessageResponse>, AppError> {
    let profile_type: ProfileType = role
        .parse()
        .map_err(|_| AppError::NotFound(format!("Role '{role}' does not exist for user: {user_id}")))?;
    let weights = parse_weights(body)?;

    WeightStore::new(state.store.as_ref())
        .update(&user_id, profile_type, weights)
        .await?;

    Ok(Json(MessageResponse {
        message: format!("Updated weights for role '{profile_type}'"),
    }))
}

/// Reads `{"weights": {...}}`, reporting shape problems as validation errors.
fn parse_weights(mut body: Value) -> Result<WeightProfile, AppError> {
    let weights = body
        .get_mut("weights")
        .map(Value::take)
        .ok_or_else(|| AppError::Validation("Body must contain a 'weights' object".to_string()))?;
    serde_json::from_value(weights)
        .map_err(|e| AppError::Validation(format!("Invalid weights: {e}")))
}
