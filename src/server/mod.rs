//! HTTP surface: multipart upload endpoints, health check and static UI.

mod error;
mod handlers;
mod state;
mod upload;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    services::{ServeDir, ServeFile},
    trace::TraceLayer,
};

use crate::{CoachService, Config};

pub use error::ApiError;
pub use state::AppState;
pub use upload::read_submission;

/// Builds the application router around `service`.
pub fn router(service: CoachService, config: &Config) -> Router {
    let index = config.static_dir.join("index.html");

    Router::new()
        .route("/analyze-speech", post(handlers::analyze_speech))
        .route("/checkband", post(handlers::check_band))
        .route("/sample-answers", post(handlers::sample_answers))
        .route("/health", get(handlers::health))
        .layer(DefaultBodyLimit::max(config.max_request_bytes))
        // Serve the frontend for everything else
        .fallback_service(ServeDir::new(&config.static_dir).fallback(ServeFile::new(index)))
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(AppState::new(service, config.max_upload_bytes))
}
