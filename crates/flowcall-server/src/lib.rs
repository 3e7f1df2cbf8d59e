//! flowcall server library logic.

pub mod api_voice;
pub mod api_ws;
pub mod config;
pub mod twiml;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Extension, Json, Router,
};
use config::VoiceConfig;
use flowcall_core::BackendClient;
use serde_json::{json, Value};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Application state shared across all request handlers.
///
/// Holds nothing mutable: every call session owns its own turn state.
#[derive(Debug, Clone)]
pub struct AppState {
    /// Client for the conversational-workflow backend.
    pub backend: BackendClient,
    /// Telephony-facing prompts.
    pub voice: VoiceConfig,
}

impl AppState {
    pub fn new(backend: BackendClient, voice: VoiceConfig) -> Self {
        Self { backend, voice }
    }
}

/// Maximum request body size (64 KiB). Webhook forms and relay frames are small.
const MAX_REQUEST_BODY_BYTES: usize = 64 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route(
            "/voice",
            post(api_voice::voice_entry_handler).get(api_voice::voice_entry_handler),
        )
        .route("/voice/respond", post(api_voice::voice_respond_handler))
        .route("/voice/relay", post(api_voice::voice_relay_handler))
        .route("/ws/voice", get(api_ws::ws_voice_handler))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(Extension(Arc::new(state)))
}
