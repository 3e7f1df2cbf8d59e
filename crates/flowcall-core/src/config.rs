use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

fn default_timeout_secs() -> u64 {
    30
}

/// Connection settings for the conversational-workflow backend.
#[derive(Clone, Serialize, Deserialize)]
pub struct BackendConfig {
    /// Full run endpoint of the flow, e.g. `https://host/api/v1/run/<flow-id>`.
    #[serde(default)]
    pub url: String,
    /// Bearer token sent with every request.
    #[serde(default, skip_serializing)]
    pub token: Option<String>,
    /// Ask the backend for a chunked response instead of one buffered body.
    #[serde(default)]
    pub streaming: bool,
    /// Upper bound on one backend call, streaming included. Default: 30.
    /// Zero means the default.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            url: String::new(),
            token: None,
            streaming: false,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for BackendConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BackendConfig")
            .field("url", &self.url)
            .field("token", &self.token.as_ref().map(|_| "[REDACTED]"))
            .field("streaming", &self.streaming)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl BackendConfig {
    pub fn new(url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            token: Some(token.into()),
            ..Self::default()
        }
    }

    pub fn with_streaming(mut self, streaming: bool) -> Self {
        self.streaming = streaming;
        self
    }

    /// Returns the token if one is set and not blank.
    pub fn bearer_token(&self) -> Option<&str> {
        self.token.as_deref().filter(|t| !t.trim().is_empty())
    }

    /// Whether both the endpoint and the credential are present.
    pub fn is_configured(&self) -> bool {
        !self.url.trim().is_empty() && self.bearer_token().is_some()
    }

    pub fn timeout(&self) -> Duration {
        match self.timeout_secs {
            0 => Duration::from_secs(default_timeout_secs()),
            secs => Duration::from_secs(secs),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn debug_output_redacts_token() {
        let config = BackendConfig::new("http://localhost:7860/api/v1/run/flow", "sk-secret");
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("sk-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn blank_token_is_not_configured() {
        let mut config = BackendConfig::new("http://localhost:7860/api/v1/run/flow", "   ");
        assert!(config.bearer_token().is_none());
        assert!(!config.is_configured());

        config.token = Some("tok".to_string());
        assert!(config.is_configured());

        config.url = String::new();
        assert!(!config.is_configured());
    }

    #[test]
    fn defaults_to_buffered_with_thirty_second_timeout() {
        let config: BackendConfig = toml::from_str("url = \"http://x\"").unwrap();
        assert!(!config.streaming);
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }

    #[test]
    fn zero_timeout_falls_back_to_default() {
        let config: BackendConfig = toml::from_str("url = \"http://x\"\ntimeout_secs = 0").unwrap();
        assert_eq!(config.timeout(), Duration::from_secs(30));
    }
}
