//! Axum route handlers for interview questions and recruiter chat.

use axum::{
    extract::{Path, State},
    Json,
};
use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

use crate::candidates::Workflow;
use crate::errors::AppError;
use crate::evaluation::chat::{ask, ChatMessage};
use crate::evaluation::questions::{generate_questions, QuestionMode, DEFAULT_QUESTIONS};
use crate::models::InterviewQuestion;
use crate::state::AppState;

// ────────────────────────────────────────────────────────────────────────────
// Request / Response types
// ────────────────────────────────────────────────────────────────────────────

fn default_count() -> u32 {
    DEFAULT_QUESTIONS.into()
}

#[derive(Debug, Deserialize)]
pub struct QuestionsRequest {
    #[serde(default = "default_count")]
    pub count: u32,
    #[serde(default)]
    pub mode: QuestionMode,
}

#[derive(Debug, Serialize)]
pub struct CandidateQuestions {
    pub candidate_id: Uuid,
    pub questions: Vec<InterviewQuestion>,
}

#[derive(Debug, Serialize)]
pub struct QuestionFailure {
    pub candidate_id: Uuid,
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize)]
pub struct BulkQuestionsResponse {
    pub generated: Vec<CandidateQuestions>,
    pub failures: Vec<QuestionFailure>,
}

#[derive(Debug, Deserialize)]
pub struct ChatRequest {
    pub question: String,
}

// ────────────────────────────────────────────────────────────────────────────
// Handlers
// ────────────────────────────────────────────────────────────────────────────

/// POST /api/v1/candidates/:id/interview-questions
///
/// Generates questions for one candidate and caches them on the record.
pub async fn handle_candidate_questions(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(request): Json<QuestionsRequest>,
) -> Result<Json<CandidateQuestions>, AppError> {
    let candidate = state.candidates.get(id).await?;
    let search = state.searches.get(candidate.search_id).await?;
    let model = state.model_id().await?;

    let questions = generate_questions(
        state.llm.as_ref(),
        &model,
        &candidate,
        &search.job_description,
        request.count,
        request.mode,
    )
    .await?;
    let candidate = state.candidates.cache_questions(id, questions).await?;

    Ok(Json(CandidateQuestions {
        candidate_id: id,
        questions: candidate.interview_questions,
    }))
}

/// POST /api/v1/searches/:id/interview-questions
///
/// Runs question generation for every candidate in the search's
/// `interview_questions` selection, one after the other. A failing candidate
/// is reported without stopping the rest.
pub async fn handle_bulk_questions(
    State(state): State<AppState>,
    Path(search_id): Path<Uuid>,
    Json(request): Json<QuestionsRequest>,
) -> Result<Json<BulkQuestionsResponse>, AppError> {
    let search = state.searches.get(search_id).await?;
    let selected = state
        .candidates
        .selected_candidates(search_id, Workflow::InterviewQuestions)
        .await?;
    if selected.is_empty() {
        return Err(AppError::Validation(
            "no candidates selected for interview questions".to_string(),
        ));
    }
    let model = state.model_id().await?;

    let mut response = BulkQuestionsResponse {
        generated: Vec::new(),
        failures: Vec::new(),
    };
    for candidate in selected {
        let outcome = match generate_questions(
            state.llm.as_ref(),
            &model,
            &candidate,
            &search.job_description,
            request.count,
            request.mode,
        )
        .await
        {
            Ok(questions) => state.candidates.cache_questions(candidate.id, questions).await,
            Err(e) => Err(e),
        };

        match outcome {
            Ok(updated) => response.generated.push(CandidateQuestions {
                candidate_id: updated.id,
                questions: updated.interview_questions,
            }),
            // Bad caller input fails the same way for everyone.
            Err(e @ AppError::Validation(_)) => return Err(e),
            Err(e) => {
                warn!("Question generation failed for candidate {}: {e}", candidate.id);
                response.failures.push(QuestionFailure {
                    candidate_id: candidate.id,
                    code: e.code().to_string(),
                    message: e.to_string(),
                });
            }
        }
    }

    Ok(Json(response))
}

/// GET /api/v1/searches/:id/chat
pub async fn handle_get_chat(
    State(state): State<AppState>,
    Path(search_id): Path<Uuid>,
) -> Result<Json<Vec<ChatMessage>>, AppError> {
    state.searches.get(search_id).await?;
    Ok(Json(state.chats.transcript(search_id).await))
}

/// POST /api/v1/searches/:id/chat
///
/// Asks about the candidates in the search's `chat` selection.
pub async fn handle_chat(
    State(state): State<AppState>,
    Path(search_id): Path<Uuid>,
    Json(request): Json<ChatRequest>,
) -> Result<Json<ChatMessage>, AppError> {
    state.searches.get(search_id).await?;
    let selected = state
        .candidates
        .selected_candidates(search_id, Workflow::Chat)
        .await?;
    let model = state.model_id().await?;

    let answer = ask(
        state.llm.as_ref(),
        &model,
        &state.chats,
        search_id,
        &selected,
        &request.question,
    )
    .await?;
    Ok(Json(answer))
}
