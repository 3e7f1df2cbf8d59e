use crate::messages::{CONFIG_ERROR_MESSAGE, GENERIC_ERROR_MESSAGE};
use thiserror::Error;

/// Failures that end a turn early.
///
/// Malformed payloads are not represented here: a bad chunk or an
/// unparseable body is logged and handled in place without ending the turn.
#[derive(Error, Debug)]
pub enum RelayError {
    #[error("invalid configuration: {0}")]
    Configuration(String),

    #[error("backend request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    Status(u16),

    #[error("backend stream produced no usable content")]
    EmptyResult,
}

impl RelayError {
    /// The fixed reply a caller hears for this failure.
    pub fn user_message(&self) -> &'static str {
        match self {
            RelayError::Configuration(_) => CONFIG_ERROR_MESSAGE,
            RelayError::Transport(_) | RelayError::Status(_) | RelayError::EmptyResult => {
                GENERIC_ERROR_MESSAGE
            }
        }
    }
}
