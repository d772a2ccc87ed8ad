pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{delete, get, post},
    Router,
};

use crate::ingest::handlers as ingest;
use crate::portfolio::handlers as portfolio;
use crate::review::handlers as review;
use crate::state::AppState;

/// Room for multipart boundaries and part headers on top of the file itself,
/// so oversized files reach the import handler's own size check.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = import_body_limit(state.config.max_upload_bytes);

    Router::new()
        .route("/health", get(health::health_handler))
        // Stored portfolio
        .route(
            "/api/v1/portfolio",
            get(portfolio::handle_get_portfolio).put(portfolio::handle_put_portfolio),
        )
        .route(
            "/api/v1/portfolio/canvas",
            get(portfolio::handle_get_canvas).put(portfolio::handle_put_canvas),
        )
        .route(
            "/api/v1/portfolio/sections/:section",
            delete(portfolio::handle_delete_section),
        )
        .route(
            "/api/v1/portfolio/sections/:section/items/:item_id",
            delete(portfolio::handle_delete_item),
        )
        // Resume import
        .route(
            "/api/v1/resume/import",
            post(ingest::handle_import).layer(DefaultBodyLimit::max(upload_limit)),
        )
        // Review sessions
        .route(
            "/api/v1/review/:session_id",
            get(review::handle_get_session).delete(review::handle_discard),
        )
        .route("/api/v1/review/:session_id/toggle", post(review::handle_toggle))
        .route("/api/v1/review/:session_id/edit", post(review::handle_edit))
        .route("/api/v1/review/:session_id/select", post(review::handle_select))
        .route(
            "/api/v1/review/:session_id/deselect",
            post(review::handle_deselect),
        )
        .route(
            "/api/v1/review/:session_id/merge",
            post(review::handle_begin_merge),
        )
        .route(
            "/api/v1/review/:session_id/resolve",
            post(review::handle_resolve),
        )
        .route(
            "/api/v1/review/:session_id/changes",
            get(review::handle_changes),
        )
        .route(
            "/api/v1/review/:session_id/commit",
            post(review::handle_commit),
        )
        .with_state(state)
}

fn import_body_limit(max_upload_bytes: usize) -> usize {
    max_upload_bytes.saturating_add(MULTIPART_OVERHEAD_BYTES)
}
