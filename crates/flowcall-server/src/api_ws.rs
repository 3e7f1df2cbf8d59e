//! WebSocket voice channel.
//!
//! The telephony side sends one JSON frame per recognized utterance and
//! receives one `{"text_response": ...}` frame per reply. Turns on a socket
//! run one at a time; frames that arrive while a turn is in flight are
//! queued, and a close abandons the in-flight turn.

use crate::AppState;
use axum::{
    extract::{
        ws::{Message as AxumMessage, WebSocket},
        Extension, Query, WebSocketUpgrade,
    },
    response::IntoResponse,
};
use flowcall_core::{CONFIG_ERROR_MESSAGE, GENERIC_ERROR_MESSAGE};
use futures_util::{
    stream::{SplitSink, SplitStream},
    SinkExt, StreamExt,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::{collections::VecDeque, sync::Arc};

/// Call id used when the connection does not name one.
pub const DEFAULT_WS_CALL_SID: &str = "UnknownCallSID_WS";

/// Number of characters of a frame included in log lines.
const LOG_PREVIEW_CHARS: usize = 200;

/// Query parameters for the WebSocket connection.
#[derive(Debug, Deserialize)]
pub struct WsConnectParams {
    pub call_sid: Option<String>,
}

/// One classified inbound frame.
#[derive(Debug, PartialEq, Eq)]
pub enum InboundFrame<'a> {
    /// ConversationRelay session start.
    Setup { call_sid: Option<&'a str> },
    /// Error reported by the telephony platform.
    PlatformError { description: Option<&'a str> },
    /// A caller turn. `utterance` is `None` when no transcript field was
    /// present or it was not a string.
    Turn {
        utterance: Option<&'a str>,
        call_sid: Option<&'a str>,
    },
    /// Valid JSON that is not an object.
    Invalid,
}

/// Classifies a parsed frame.
///
/// The utterance is looked up in `speech.transcript`, then `transcript`,
/// then `input_value`, then (for ConversationRelay `prompt` frames)
/// `voicePrompt`. The first field present decides, even if it turns out
/// to be blank.
pub fn classify_frame(message: &Value) -> InboundFrame<'_> {
    let Some(object) = message.as_object() else {
        return InboundFrame::Invalid;
    };
    let call_sid = object.get("callSid").and_then(Value::as_str);
    let frame_type = object.get("type").and_then(Value::as_str);

    match frame_type {
        Some("setup") => return InboundFrame::Setup { call_sid },
        Some("error") => {
            return InboundFrame::PlatformError {
                description: object.get("description").and_then(Value::as_str),
            }
        }
        _ => {}
    }

    let utterance = if let Some(speech) = object.get("speech") {
        speech.get("transcript").and_then(Value::as_str)
    } else if let Some(transcript) = object.get("transcript") {
        transcript.as_str()
    } else if let Some(input) = object.get("input_value") {
        input.as_str()
    } else if frame_type == Some("prompt") {
        object.get("voicePrompt").and_then(Value::as_str)
    } else {
        None
    };

    InboundFrame::Turn {
        utterance,
        call_sid,
    }
}

/// What the socket loop should do with one inbound text frame.
#[derive(Debug, PartialEq, Eq)]
enum FrameAction {
    /// Nothing to send back.
    Ignore,
    /// Send a plain text fallback frame.
    Fallback(&'static str),
    /// Run a backend turn.
    Turn { utterance: String, call_sid: String },
}

fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

/// Interprets one inbound text frame, updating the session call id on setup.
fn plan_frame(text: &str, session_call_sid: &mut String) -> FrameAction {
    let message: Value = match serde_json::from_str(text) {
        Ok(message) => message,
        Err(_) => {
            tracing::error!(
                call_sid = %session_call_sid,
                frame = %preview(text),
                "received non-JSON websocket frame"
            );
            return FrameAction::Fallback(GENERIC_ERROR_MESSAGE);
        }
    };

    match classify_frame(&message) {
        InboundFrame::Setup { call_sid } => {
            if let Some(sid) = call_sid.filter(|s| !s.trim().is_empty()) {
                *session_call_sid = sid.to_string();
            }
            tracing::info!(call_sid = %session_call_sid, "conversation started");
            FrameAction::Ignore
        }
        InboundFrame::PlatformError { description } => {
            tracing::error!(
                call_sid = %session_call_sid,
                description = description.unwrap_or("<none>"),
                "telephony platform reported an error"
            );
            FrameAction::Ignore
        }
        InboundFrame::Invalid => {
            tracing::error!(
                call_sid = %session_call_sid,
                frame = %preview(text),
                "websocket frame is not a JSON object"
            );
            FrameAction::Fallback(GENERIC_ERROR_MESSAGE)
        }
        InboundFrame::Turn {
            utterance,
            call_sid,
        } => {
            let call_sid = call_sid
                .filter(|s| !s.trim().is_empty())
                .unwrap_or(session_call_sid.as_str())
                .to_string();
            match utterance.map(str::trim).filter(|u| !u.is_empty()) {
                Some(utterance) => FrameAction::Turn {
                    utterance: utterance.to_string(),
                    call_sid,
                },
                None => {
                    tracing::info!(call_sid = %call_sid, "no valid speech in websocket frame");
                    FrameAction::Ignore
                }
            }
        }
    }
}

/// Handler for `GET /ws/voice`.
pub async fn ws_voice_handler(
    Extension(state): Extension<Arc<AppState>>,
    ws: WebSocketUpgrade,
    Query(params): Query<WsConnectParams>,
) -> impl IntoResponse {
    let call_sid = params
        .call_sid
        .filter(|sid| !sid.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_WS_CALL_SID.to_string());
    ws.on_upgrade(move |socket| handle_socket(socket, state, call_sid))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, mut call_sid: String) {
    tracing::info!(call_sid = %call_sid, "websocket connection accepted");
    let (mut sender, mut receiver) = socket.split();

    if !state.backend.is_configured() {
        tracing::error!(
            call_sid = %call_sid,
            "application token is not set, closing websocket"
        );
        let _ = sender
            .send(AxumMessage::Text(CONFIG_ERROR_MESSAGE.to_string().into()))
            .await;
        let _ = sender.send(AxumMessage::Close(None)).await;
        return;
    }

    let mut pending: VecDeque<String> = VecDeque::new();

    loop {
        let text = match pending.pop_front() {
            Some(text) => text,
            None => match next_text(&mut receiver, &call_sid).await {
                Some(text) => text,
                None => break,
            },
        };

        tracing::info!(call_sid = %call_sid, frame = %preview(&text), "received websocket frame");

        let outgoing = match plan_frame(&text, &mut call_sid) {
            FrameAction::Ignore => continue,
            FrameAction::Fallback(message) => message.to_string(),
            FrameAction::Turn {
                utterance,
                call_sid: turn_call_sid,
            } => {
                let Some(reply) =
                    run_turn(&state, &utterance, &turn_call_sid, &mut receiver, &mut pending)
                        .await
                else {
                    tracing::info!(
                        call_sid = %turn_call_sid,
                        "websocket closed during turn, abandoning reply"
                    );
                    break;
                };
                tracing::info!(
                    call_sid = %turn_call_sid,
                    reply = %preview(&reply),
                    "sending reply over websocket"
                );
                json!({ "text_response": reply }).to_string()
            }
        };

        if let Err(e) = send_text(&mut sender, outgoing).await {
            tracing::warn!(call_sid = %call_sid, "websocket send failed: {}", e);
            break;
        }
    }

    tracing::info!(call_sid = %call_sid, "websocket disconnected");
}

/// Waits for the next text frame, skipping control and binary frames.
/// Returns `None` once the peer has gone.
async fn next_text(receiver: &mut SplitStream<WebSocket>, call_sid: &str) -> Option<String> {
    loop {
        match receiver.next().await {
            Some(Ok(AxumMessage::Text(text))) => return Some(text.as_str().to_owned()),
            Some(Ok(AxumMessage::Close(_))) | None => return None,
            Some(Ok(_)) => continue,
            Some(Err(e)) => {
                tracing::warn!(call_sid = %call_sid, "websocket receive failed: {}", e);
                return None;
            }
        }
    }
}

/// Runs one backend turn while watching the socket.
///
/// Text frames arriving meanwhile are queued in `pending`. Returns `None`
/// if the peer disconnects first, dropping the in-flight request.
async fn run_turn(
    state: &AppState,
    utterance: &str,
    call_sid: &str,
    receiver: &mut SplitStream<WebSocket>,
    pending: &mut VecDeque<String>,
) -> Option<String> {
    let turn = state.backend.reply(utterance, call_sid);
    tokio::pin!(turn);

    loop {
        tokio::select! {
            reply = &mut turn => return Some(reply),
            incoming = next_text(receiver, call_sid) => match incoming {
                Some(text) => pending.push_back(text),
                None => return None,
            },
        }
    }
}

async fn send_text(
    sender: &mut SplitSink<WebSocket, AxumMessage>,
    text: String,
) -> Result<(), axum::Error> {
    sender.send(AxumMessage::Text(text.into())).await
}
