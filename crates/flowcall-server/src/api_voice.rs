//! TwiML webhook handlers for the request/response voice path.
//!
//! Each caller turn is one webhook round trip: the platform posts the
//! recognized speech, the handler asks the backend for a reply and answers
//! with a document that speaks it and listens for the next utterance.

use crate::twiml::Twiml;
use crate::AppState;
use axum::{
    extract::{Extension, Form},
    http::StatusCode,
};
use flowcall_core::CONFIG_ERROR_MESSAGE;
use serde::Deserialize;
use std::sync::Arc;

/// Path the speech gather posts its result to.
pub const RESPOND_PATH: &str = "/voice/respond";

/// Path a call is redirected to when a gather times out.
pub const ENTRY_PATH: &str = "/voice";

const DEFAULT_HTTP_CALL_SID: &str = "UnknownCallSID_HTTP";

/// Fields of a speech-gather webhook that the relay reads. The platform
/// sends many more; they are ignored.
#[derive(Debug, Default, Deserialize)]
pub struct GatherForm {
    #[serde(rename = "SpeechResult")]
    pub speech_result: Option<String>,
    #[serde(rename = "CallSid")]
    pub call_sid: Option<String>,
}

/// Handler for `POST /voice` (call answered).
pub async fn voice_entry_handler(Extension(state): Extension<Arc<AppState>>) -> Twiml {
    if !state.backend.is_configured() {
        tracing::error!("application token is not set, refusing call");
        return Twiml::new().say(CONFIG_ERROR_MESSAGE).hangup();
    }
    listen(&state, &state.voice.greeting)
}

/// Handler for `POST /voice/respond` (speech gathered).
pub async fn voice_respond_handler(
    Extension(state): Extension<Arc<AppState>>,
    Form(form): Form<GatherForm>,
) -> Twiml {
    let call_sid = form
        .call_sid
        .filter(|sid| !sid.trim().is_empty())
        .unwrap_or_else(|| DEFAULT_HTTP_CALL_SID.to_string());

    if !state.backend.is_configured() {
        tracing::error!(call_sid = %call_sid, "application token is not set");
        return Twiml::new().say(CONFIG_ERROR_MESSAGE).hangup();
    }

    let speech = form.speech_result.unwrap_or_default();
    let speech = speech.trim();
    if speech.is_empty() {
        tracing::info!(call_sid = %call_sid, "no speech in gather result, re-prompting");
        return listen(&state, &state.voice.reprompt);
    }

    tracing::info!(call_sid = %call_sid, speech = %speech, "caller speech received");
    let reply = state.backend.reply(speech, &call_sid).await;

    Twiml::new()
        .say(&reply)
        .gather_speech(RESPOND_PATH, &state.voice.speech_hints, "")
        .say(&state.voice.reprompt)
        .redirect(ENTRY_PATH)
}

/// Handler for `POST /voice/relay`: hands the call to the WebSocket relay.
///
/// Returns 404 when no public host is configured, since the platform could
/// not reach the socket anyway.
pub async fn voice_relay_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Result<Twiml, StatusCode> {
    let Some(host) = state.voice.public_host.as_deref() else {
        tracing::warn!("conversation relay requested but voice.public_host is not set");
        return Err(StatusCode::NOT_FOUND);
    };
    if !state.backend.is_configured() {
        tracing::error!("application token is not set, refusing call");
        return Ok(Twiml::new().say(CONFIG_ERROR_MESSAGE).hangup());
    }
    let ws_url = format!("wss://{}/ws/voice", host);
    Ok(Twiml::new().conversation_relay(&ws_url, &state.voice.greeting))
}

/// Speaks `prompt` inside a speech gather, falling back to the re-prompt and
/// a redirect to the entry point when the caller stays silent.
fn listen(state: &AppState, prompt: &str) -> Twiml {
    Twiml::new()
        .gather_speech(RESPOND_PATH, &state.voice.speech_hints, prompt)
        .say(&state.voice.reprompt)
        .redirect(ENTRY_PATH)
}
