pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

use crate::sheets::handlers;
use crate::state::AppState;

/// Headroom over the upload limit for multipart framing, so oversize files
/// are reported by the upload reader rather than cut off mid-stream.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes + MULTIPART_OVERHEAD_BYTES;

    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/page-sizes", get(handlers::handle_page_sizes))
        // Sheet API
        .route("/api/v1/sheets/layout", post(handlers::handle_layout))
        .route("/api/v1/sheets/preview", post(handlers::handle_preview))
        .route("/api/v1/sheets/export", post(handlers::handle_export))
        .route(
            "/api/v1/sheets/upload",
            post(handlers::handle_upload).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .with_state(state)
}

// ────────────────────────────────────────────────────────────────────────────
// Tests
// ────────────────────────────────────────────────────────────────────────────
