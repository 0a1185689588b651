//! Router assembly.
//!
//! Binds the chat dispatch and upload endpoints, serves the uploads
//! directory statically (generated speech files flow back by URL), and
//! applies CORS + request tracing.

pub mod chat;
pub mod upload;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, post};
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::services::conversation::MAX_UPLOAD_BYTES;
use crate::state::AppState;

// Upload cap plus headroom for multipart framing.
const BODY_LIMIT_BYTES: usize = (MAX_UPLOAD_BYTES as usize) + 1024 * 1024;

/// HTTP API: chat dispatch, file upload, static uploads, health.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    Router::new()
        .route("/api/chat", post(chat::chat))
        .route("/api/upload", post(upload::upload))
        .route("/healthz", get(healthz))
        .nest_service("/uploads", ServeDir::new(&state.uploads_dir))
        .layer(DefaultBodyLimit::max(BODY_LIMIT_BYTES))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn healthz() -> StatusCode {
    StatusCode::OK
}
