//! Fixed caller-facing replies.

/// Spoken when a turn fails for any reason other than missing configuration.
pub const GENERIC_ERROR_MESSAGE: &str =
    "I'm sorry, I encountered an issue and can't respond right now. Please try again later.";

/// Spoken when the backend credential is not configured.
pub const CONFIG_ERROR_MESSAGE: &str =
    "Server configuration error. The application token is missing. Unable to process your call.";

pub const GREETING_MESSAGE: &str = "Hello! How can I assist you today?";

/// Spoken when speech recognition produced nothing usable.
pub const REPROMPT_MESSAGE: &str = "I didn't catch that. Could you please say it again?";

/// Default speech-recognition hints passed to the telephony gather.
pub const SPEECH_HINTS: &str = "sell car, make appointment, check order status, customer service";
