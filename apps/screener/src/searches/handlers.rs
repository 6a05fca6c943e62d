//! Axum route handlers for the Search API.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::candidates::SortKey;
use crate::errors::AppError;
use crate::models::{Candidate, Search, SearchStatus};
use crate::searches::service::{NewSearch, SearchPatch};
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct ListSearchesQuery {
    pub status: Option<SearchStatus>,
}

#[derive(Debug, Deserialize)]
pub struct ListCandidatesQuery {
    #[serde(default)]
    pub sort_by: SortKey,
}

/// POST /api/v1/searches
pub async fn handle_create_search(
    State(state): State<AppState>,
    Json(request): Json<NewSearch>,
) -> Result<(StatusCode, Json<Search>), AppError> {
    let search = state.searches.create(request).await?;
    Ok((StatusCode::CREATED, Json(search)))
}

/// GET /api/v1/searches?status=
pub async fn handle_list_searches(
    State(state): State<AppState>,
    Query(query): Query<ListSearchesQuery>,
) -> Result<Json<Vec<Search>>, AppError> {
    Ok(Json(state.searches.list(query.status).await?))
}

/// GET /api/v1/searches/:id
pub async fn handle_get_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<Json<Search>, AppError> {
    Ok(Json(state.searches.get(id).await?))
}

/// PATCH /api/v1/searches/:id
pub async fn handle_update_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(patch): Json<SearchPatch>,
) -> Result<Json<Search>, AppError> {
    Ok(Json(state.searches.update(id, patch).await?))
}

/// DELETE /api/v1/searches/:id
///
/// Cascades to the search's candidates, their PDFs, selections and chat.
pub async fn handle_delete_search(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, AppError> {
    state.searches.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/searches/:id/candidates?sort_by=
pub async fn handle_list_candidates(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Query(query): Query<ListCandidatesQuery>,
) -> Result<Json<Vec<Candidate>>, AppError> {
    state.searches.get(id).await?;
    Ok(Json(state.candidates.list_by_search(id, query.sort_by).await?))
}
