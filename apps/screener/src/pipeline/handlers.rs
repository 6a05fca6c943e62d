//! Axum route handlers for résumé upload and original-PDF download.

use axum::{
    extract::{Multipart, Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::errors::AppError;
use crate::pipeline::ingest::{BatchReport, UploadedFile};
use crate::state::AppState;

/// POST /api/v1/searches/:id/candidates
///
/// Multipart upload: every file part is one résumé. Returns the batch report;
/// per-file failures do not fail the request.
pub async fn handle_upload(
    State(state): State<AppState>,
    Path(search_id): Path<Uuid>,
    mut multipart: Multipart,
) -> Result<(StatusCode, Json<BatchReport>), AppError> {
    let search = state.searches.get(search_id).await?;

    let mut files = Vec::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| AppError::Validation(format!("invalid multipart body: {e}")))?
    {
        let Some(file_name) = field.file_name().map(str::to_string) else {
            // Non-file parts carry nothing we use.
            continue;
        };
        let bytes = field
            .bytes()
            .await
            .map_err(|e| AppError::Validation(format!("failed to read '{file_name}': {e}")))?;
        files.push(UploadedFile { file_name, bytes });
    }

    if files.is_empty() {
        return Err(AppError::Validation(
            "upload must contain at least one file".to_string(),
        ));
    }

    let model = state.model_id().await?;
    let report = state.ingestor.ingest_batch(search, model, files).await;
    Ok((StatusCode::CREATED, Json(report)))
}

/// GET /api/v1/candidates/:id/pdf
pub async fn handle_download_pdf(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, AppError> {
    let candidate = state.candidates.get(id).await?;
    let key = candidate
        .pdf_key
        .ok_or_else(|| AppError::NotFound(format!("No PDF stored for candidate {id}")))?;
    let bytes = state
        .archive
        .get(&key)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("No PDF stored for candidate {id}")))?;

    let disposition = format!(
        "inline; filename=\"{}\"",
        candidate.file_name.replace('"', "")
    );
    Ok((
        [
            (header::CONTENT_TYPE, "application/pdf".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    ))
}
