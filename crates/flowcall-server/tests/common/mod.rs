//! Shared fixtures: a mock flow backend and a running relay server.

#![allow(dead_code)]

use axum::{extract::State, routing::post, Json, Router};
use flowcall_core::{BackendClient, BackendConfig};
use flowcall_server::{app, config::VoiceConfig, AppState};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;

pub const TOKEN: &str = "test-application-token";

/// Builds the backend's JSON answer from the utterance it received.
pub type Responder = fn(&str) -> Value;

/// Answers with the nested envelope a chat flow produces.
pub fn echo(input: &str) -> Value {
    json!({
        "session_id": "mock",
        "outputs": [{"outputs": {"chat_output": format!("You said: {}", input)}}]
    })
}

#[derive(Clone)]
struct MockState {
    hits: Arc<AtomicUsize>,
    delay: Duration,
    responder: Responder,
}

/// A running mock flow endpoint.
pub struct MockBackend {
    pub url: String,
    hits: Arc<AtomicUsize>,
}

impl MockBackend {
    pub async fn spawn(responder: Responder) -> Self {
        Self::spawn_with_delay(responder, Duration::ZERO).await
    }

    pub async fn spawn_with_delay(responder: Responder, delay: Duration) -> Self {
        let hits = Arc::new(AtomicUsize::new(0));
        let state = MockState {
            hits: hits.clone(),
            delay,
            responder,
        };
        let router = Router::new()
            .route(
                "/api/v1/run/flow",
                post(
                    |State(state): State<MockState>, Json(body): Json<Value>| async move {
                        state.hits.fetch_add(1, Ordering::SeqCst);
                        if !state.delay.is_zero() {
                            tokio::time::sleep(state.delay).await;
                        }
                        let input = body["input_value"].as_str().unwrap_or_default();
                        Json((state.responder)(input))
                    },
                ),
            )
            .with_state(state);

        let addr = serve(router).await;
        Self {
            url: format!("http://{}/api/v1/run/flow", addr),
            hits,
        }
    }

    pub fn hits(&self) -> usize {
        self.hits.load(Ordering::SeqCst)
    }
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    addr
}

/// Relay state pointing at `url`, with or without the application token.
pub fn relay_state(url: &str, with_token: bool) -> AppState {
    let config = if with_token {
        BackendConfig::new(url, TOKEN)
    } else {
        BackendConfig {
            url: url.to_string(),
            ..BackendConfig::default()
        }
    };
    let backend = BackendClient::new(config).expect("failed to build backend client");
    AppState::new(backend, VoiceConfig::default())
}

/// Starts the relay server and returns its address.
pub async fn spawn_relay(state: AppState) -> SocketAddr {
    serve(app(state)).await
}
