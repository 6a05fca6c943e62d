pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post, put},
    Router,
};

use crate::candidates::handlers as candidates;
use crate::evaluation::handlers as evaluation;
use crate::pipeline::handlers as pipeline;
use crate::searches::handlers as searches;
use crate::settings::handlers as settings;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = DefaultBodyLimit::max(state.config.max_upload_bytes());

    Router::new()
        .route("/health", get(health::health_handler))
        // Settings
        .route(
            "/api/v1/settings",
            get(settings::handle_get_settings).put(settings::handle_put_settings),
        )
        // Searches
        .route(
            "/api/v1/searches",
            post(searches::handle_create_search).get(searches::handle_list_searches),
        )
        .route(
            "/api/v1/searches/:id",
            get(searches::handle_get_search)
                .patch(searches::handle_update_search)
                .delete(searches::handle_delete_search),
        )
        .route(
            "/api/v1/searches/:id/candidates",
            post(pipeline::handle_upload)
                .layer(upload_limit)
                .get(searches::handle_list_candidates),
        )
        .route(
            "/api/v1/searches/:id/selections/:workflow",
            get(candidates::handle_get_selection),
        )
        .route(
            "/api/v1/searches/:id/selections/:workflow/:candidate_id",
            put(candidates::handle_select).delete(candidates::handle_deselect),
        )
        .route(
            "/api/v1/searches/:id/interview-questions",
            post(evaluation::handle_bulk_questions),
        )
        .route(
            "/api/v1/searches/:id/chat",
            get(evaluation::handle_get_chat).post(evaluation::handle_chat),
        )
        // Candidates
        .route(
            "/api/v1/candidates/:id",
            get(candidates::handle_get_candidate)
                .patch(candidates::handle_update_candidate)
                .delete(candidates::handle_delete_candidate),
        )
        .route(
            "/api/v1/candidates/:id/status",
            put(candidates::handle_move_candidate),
        )
        .route(
            "/api/v1/candidates/:id/notes",
            post(candidates::handle_add_note),
        )
        .route(
            "/api/v1/candidates/:id/favorite",
            post(candidates::handle_toggle_favorite),
        )
        .route(
            "/api/v1/candidates/:id/pdf",
            get(pipeline::handle_download_pdf),
        )
        .route(
            "/api/v1/candidates/:id/interview-questions",
            post(evaluation::handle_candidate_questions),
        )
        .with_state(state)
}
