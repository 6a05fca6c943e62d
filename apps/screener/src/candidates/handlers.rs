//! Axum route handlers for the Candidate API and selection sets.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::candidates::selection::{SelectionSet, Workflow, MAX_SELECTION};
use crate::candidates::store::CandidatePatch;
use crate::errors::AppError;
use crate::models::{Candidate, Note, PipelineStatus};
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct MoveRequest {
    pub status: PipelineStatus,
}

#[derive(Debug, Deserialize)]
pub struct NoteRequest {
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SelectionResponse {
    pub workflow: Workflow,
    pub candidate_ids: Vec<Uuid>,
    pub max: usize,
}

impl SelectionResponse {
    fn new(workflow: Workflow, set: SelectionSet) -> Self {
        Self {
            workflow,
            candidate_ids: set.members().to_vec(),
            max: MAX_SELECTION,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// GET /api/v1/candidates/:id
pub async fn handle_get_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.candidates.get(id).await?))
}

/// PATCH /api/v1/candidates/:id
///
/// Corrects contact fields, tags, interview date or individual scores.
pub async fn handle_update_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<CandidatePatch>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.candidates.apply_patch(id, patch).await?))
}

/// DELETE /api/v1/candidates/:id
pub async fn handle_delete_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    let removed = state.candidates.delete(id).await?;
    if let Some(key) = &removed.pdf_key {
        if let Err(e) = state.archive.delete(key).await {
            warn!("Could not delete archived PDF {key}: {e}");
        }
    }
    Ok(StatusCode::NO_CONTENT)
}

/// PUT /api/v1/candidates/:id/status
pub async fn handle_move_candidate(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<MoveRequest>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(
        state.candidates.move_candidate(id, request.status).await?,
    ))
}

/// POST /api/v1/candidates/:id/notes
pub async fn handle_add_note(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<NoteRequest>,
) -> Result<(StatusCode, Json<Note>), AppError> {
    let note = state.candidates.add_note(id, &request.content).await?;
    Ok((StatusCode::CREATED, Json(note)))
}

/// POST /api/v1/candidates/:id/favorite
pub async fn handle_toggle_favorite(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Candidate>, AppError> {
    Ok(Json(state.candidates.toggle_favorite(id).await?))
}

/// GET /api/v1/searches/:id/selections/:workflow
pub async fn handle_get_selection(
    State(state): State<AppState>,
    Path((search_id, workflow)): Path<(Uuid, Workflow)>,
) -> Result<Json<SelectionResponse>, AppError> {
    state.searches.get(search_id).await?;
    let set = state.candidates.selection(search_id, workflow).await;
    Ok(Json(SelectionResponse::new(workflow, set)))
}

/// PUT /api/v1/searches/:id/selections/:workflow/:candidate_id
///
/// Adding to a full selection leaves it unchanged.
pub async fn handle_select(
    State(state): State<AppState>,
    Path((search_id, workflow, candidate_id)): Path<(Uuid, Workflow, Uuid)>,
) -> Result<Json<SelectionResponse>, AppError> {
    let set = state
        .candidates
        .select(search_id, workflow, candidate_id)
        .await?;
    Ok(Json(SelectionResponse::new(workflow, set)))
}

/// DELETE /api/v1/searches/:id/selections/:workflow/:candidate_id
pub async fn handle_deselect(
    State(state): State<AppState>,
    Path((search_id, workflow, candidate_id)): Path<(Uuid, Workflow, Uuid)>,
) -> Result<Json<SelectionResponse>, AppError> {
    let set = state
        .candidates
        .deselect(search_id, workflow, candidate_id)
        .await;
    Ok(Json(SelectionResponse::new(workflow, set)))
}
