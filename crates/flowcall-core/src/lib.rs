//! Reply normalization for the flowcall voice relay.
//!
//! A caller's utterance is forwarded to a conversational-workflow backend
//! (a Langflow run endpoint). The backend answers with one of several JSON
//! envelopes, with plain text, or with a chunked stream of either. This crate
//! reduces whatever comes back to a single string that can be spoken to the
//! caller, and maps every failure to one of the fixed fallback replies so the
//! telephony side always has something to say.
//!
//! The pieces, in the order a turn uses them:
//!
//! - [`backend::BackendClient`] performs the outbound call and owns the
//!   turn boundary ([`BackendClient::reply`] never fails).
//! - [`accumulator::ReplyAccumulator`] folds streamed chunks into one reply;
//!   [`accumulator::normalize_buffered`] handles whole-body responses.
//! - [`extract::extract_reply`] picks the reply text out of one JSON object.

pub mod accumulator;
pub mod backend;
pub mod config;
pub mod error;
pub mod extract;
pub mod messages;

pub use accumulator::{normalize_buffered, ReplyAccumulator};
pub use backend::BackendClient;
pub use config::BackendConfig;
pub use error::RelayError;
pub use extract::extract_reply;
pub use messages::{
    CONFIG_ERROR_MESSAGE, GENERIC_ERROR_MESSAGE, GREETING_MESSAGE, REPROMPT_MESSAGE,
    SPEECH_HINTS,
};
