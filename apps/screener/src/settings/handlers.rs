use axum::{extract::State, Json};

use crate::errors::AppError;
use crate::models::AppSettings;
use crate::settings::{load_settings, save_settings};
use crate::state::AppState;

/// GET /api/v1/settings
pub async fn handle_get_settings(
    State(state): State<AppState>,
) -> Result<Json<AppSettings>, AppError> {
    Ok(Json(load_settings(&state.repo).await?))
}

/// PUT /api/v1/settings
///
/// Replaces the whole record. The model credential is configured through the
/// environment and is not part of it.
pub async fn handle_put_settings(
    State(state): State<AppState>,
    Json(settings): Json<AppSettings>,
) -> Result<Json<AppSettings>, AppError> {
    save_settings(&state.repo, &settings).await?;
    Ok(Json(settings))
}
