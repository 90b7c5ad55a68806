use super::handlers;
use super::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// Create the HTTP router with all routes
pub fn create_router(state: AppState) -> Router {
    Router::new()
        // Health check
        .route("/health", get(handlers::health_check))
        // Session lifecycle
        .route("/sessions/start", post(handlers::start_session))
        .route("/sessions/:session_id/end", post(handlers::end_session))
        // Session queries
        .route(
            "/sessions/:session_id/status",
            get(handlers::get_session_status),
        )
        .route("/sessions/:session_id/turns", get(handlers::get_session_turns))
        .route(
            "/sessions/:session_id/events",
            get(handlers::get_session_events),
        )
        .route(
            "/sessions/:session_id/result",
            get(handlers::get_session_result),
        )
        // Client-side capture and signals
        .route("/sessions/:session_id/frame", post(handlers::upload_frame))
        .route("/sessions/:session_id/audio", post(handlers::upload_audio))
        .route("/sessions/:session_id/signal", post(handlers::relay_signal))
        // Dialogue
        .route("/sessions/:session_id/answer", post(handlers::submit_answer))
        .route(
            "/sessions/:session_id/transcript",
            post(handlers::push_transcript),
        )
        .route(
            "/sessions/:session_id/speech-complete",
            post(handlers::speech_complete),
        )
        .route("/sessions/:session_id/next", post(handlers::next_question))
        // Browser clients call from another origin
        .layer(CorsLayer::permissive())
        // Add tracing middleware for request logging
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
