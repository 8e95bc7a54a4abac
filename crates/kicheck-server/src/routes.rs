use axum::{
    Router,
    routing::{get, post},
};
use tower_http::trace::TraceLayer;

use crate::{AppState, handlers};

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::root))
        .route("/health", get(handlers::health))
        .route("/analyze", post(handlers::analyze))
        .route("/gpt-analyze", post(handlers::gpt_analyze))
        .route("/generate-pdf", post(handlers::generate_pdf))
        .with_state(state)
        .layer(TraceLayer::new_for_http())
}
