//! Folding backend responses into one spoken reply.
//!
//! Streamed responses arrive as chunks that are each either a complete JSON
//! object or plain text. A chunk that cannot be used is logged and dropped;
//! it never ends the turn.

use crate::extract::extract_reply;
use serde_json::{Map, Value};
use tracing::{debug, warn};

/// Number of characters of a payload included in log lines.
const LOG_PREVIEW_CHARS: usize = 100;

/// Per-turn accumulator for a streamed backend response.
///
/// One accumulator exists per in-flight turn and is consumed by
/// [`ReplyAccumulator::finish`].
#[derive(Debug)]
pub struct ReplyAccumulator {
    call_sid: String,
    reply: String,
    chunks_seen: usize,
    chunks_dropped: usize,
}

impl ReplyAccumulator {
    pub fn new(call_sid: impl Into<String>) -> Self {
        Self {
            call_sid: call_sid.into(),
            reply: String::new(),
            chunks_seen: 0,
            chunks_dropped: 0,
        }
    }

    /// Feeds one raw chunk into the reply.
    pub fn push_chunk(&mut self, chunk: &[u8]) {
        if chunk.is_empty() {
            return;
        }
        self.chunks_seen += 1;

        let text = match std::str::from_utf8(chunk) {
            Ok(text) => text,
            Err(e) => {
                warn!(
                    call_sid = %self.call_sid,
                    len = chunk.len(),
                    "dropping stream chunk that is not valid UTF-8: {}",
                    e
                );
                self.chunks_dropped += 1;
                return;
            }
        };

        let trimmed = text.trim();
        if !(trimmed.starts_with('{') && trimmed.ends_with('}')) {
            self.reply.push_str(text);
            return;
        }

        match serde_json::from_str::<Map<String, Value>>(trimmed) {
            Ok(object) => self.push_object(&object, text),
            Err(e) => {
                warn!(
                    call_sid = %self.call_sid,
                    chunk = %preview(text),
                    "dropping malformed JSON stream chunk: {}",
                    e
                );
                self.chunks_dropped += 1;
            }
        }
    }

    fn push_object(&mut self, object: &Map<String, Value>, raw: &str) {
        if let Some(text) = extract_reply(object).filter(|t| !t.is_empty()) {
            self.reply.push_str(text);
            return;
        }

        // A bare "text" field is accepted even where the extractor's own
        // precedence did not pick it (e.g. an empty "output" shadowed it).
        match object.get("text") {
            Some(Value::String(text)) => self.reply.push_str(text),
            Some(other) => {
                warn!(
                    call_sid = %self.call_sid,
                    chunk = %preview(raw),
                    kind = json_kind(other),
                    "dropping stream chunk whose text field is not a string"
                );
                self.chunks_dropped += 1;
            }
            None => {
                debug!(
                    call_sid = %self.call_sid,
                    chunk = %preview(raw),
                    "stream chunk carried no reply text"
                );
            }
        }
    }

    /// Number of non-empty chunks fed so far.
    pub fn chunks_seen(&self) -> usize {
        self.chunks_seen
    }

    /// Number of chunks discarded as undecodable or malformed.
    pub fn chunks_dropped(&self) -> usize {
        self.chunks_dropped
    }

    /// Ends the stream, returning the trimmed reply or `None` when nothing
    /// usable was accumulated.
    pub fn finish(self) -> Option<String> {
        let reply = self.reply.trim();
        if reply.is_empty() {
            warn!(
                call_sid = %self.call_sid,
                chunks = self.chunks_seen,
                dropped = self.chunks_dropped,
                "streaming yielded empty result"
            );
            return None;
        }
        Some(reply.to_string())
    }
}

/// Normalizes a buffered (non-streaming) backend body into a reply.
///
/// The raw body is the default reply. Only when `content_type` declares JSON
/// is the body parsed, and only a non-empty extracted string replaces the
/// raw text.
pub fn normalize_buffered(call_sid: &str, body: &str, content_type: Option<&str>) -> String {
    let declares_json = content_type.is_some_and(|ct| ct.contains("application/json"));
    if !declares_json {
        return body.trim().to_string();
    }

    match serde_json::from_str::<Map<String, Value>>(body) {
        Ok(object) => match extract_reply(&object).filter(|t| !t.is_empty()) {
            Some(text) => text.trim().to_string(),
            None => {
                warn!(
                    call_sid = %call_sid,
                    body = %preview(body),
                    "could not find reply text in backend JSON, using raw body"
                );
                body.trim().to_string()
            }
        },
        Err(e) => {
            warn!(
                call_sid = %call_sid,
                "backend JSON parse failed, using raw body: {}",
                e
            );
            body.trim().to_string()
        }
    }
}

pub(crate) fn preview(text: &str) -> String {
    text.chars().take(LOG_PREVIEW_CHARS).collect()
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}
