//! Server configuration loading from file and environment variables.

use flowcall_core::{BackendConfig, GREETING_MESSAGE, REPROMPT_MESSAGE, SPEECH_HINTS};
use serde::Deserialize;
use std::net::{IpAddr, Ipv4Addr};
use thiserror::Error;

/// Top-level server configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Config {
    /// Server network settings.
    #[serde(default)]
    pub server: ServerConfig,

    /// Conversational-workflow backend.
    #[serde(default)]
    pub backend: BackendConfig,

    /// Telephony-facing prompts.
    #[serde(default)]
    pub voice: VoiceConfig,

    /// Logging settings.
    #[serde(default)]
    pub logging: LoggingConfig,
}

/// Network configuration for the HTTP server.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// Host address to bind to.
    #[serde(default = "default_host")]
    pub host: IpAddr,

    /// Port to listen on.
    #[serde(default = "default_port")]
    pub port: u16,
}

/// Prompts and addresses used when answering the telephony platform.
#[derive(Debug, Clone, Deserialize)]
pub struct VoiceConfig {
    /// Spoken when a call is first answered.
    #[serde(default = "default_greeting")]
    pub greeting: String,

    /// Spoken when speech recognition produced nothing.
    #[serde(default = "default_reprompt")]
    pub reprompt: String,

    /// Comma-separated hints for the speech recognizer.
    #[serde(default = "default_speech_hints")]
    pub speech_hints: String,

    /// Public host name (no scheme) the platform uses to reach `/ws/voice`.
    /// Required for ConversationRelay answers.
    #[serde(default)]
    pub public_host: Option<String>,
}

/// Logging configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level filter (e.g., "info", "debug", "flowcall_server=debug,info").
    #[serde(default = "default_log_level")]
    pub level: String,

    /// Whether to output logs in JSON format.
    #[serde(default)]
    pub json: bool,
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::new(127, 0, 0, 1))
}

fn default_port() -> u16 {
    8000
}

fn default_greeting() -> String {
    GREETING_MESSAGE.to_string()
}

fn default_reprompt() -> String {
    REPROMPT_MESSAGE.to_string()
}

fn default_speech_hints() -> String {
    SPEECH_HINTS.to_string()
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            greeting: default_greeting(),
            reprompt: default_reprompt(),
            speech_hints: default_speech_hints(),
            public_host: None,
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

/// Errors that can occur when loading configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Failed to read the configuration file.
    #[error("failed to read config file: {0}")]
    FileRead(#[from] std::io::Error),

    /// Failed to parse the configuration file.
    #[error("failed to parse config file: {0}")]
    Parse(#[from] toml::de::Error),
}

/// Loads configuration from a TOML file, falling back to defaults, then
/// applies overrides from the process environment.
///
/// # Errors
///
/// Returns `ConfigError` if the file exists but cannot be read or parsed.
pub fn load_config(path: Option<&str>) -> Result<Config, ConfigError> {
    let mut config = read_config_file(path)?;
    apply_env_overrides(&mut config, |key| std::env::var(key).ok());
    Ok(config)
}

fn read_config_file(path: Option<&str>) -> Result<Config, ConfigError> {
    match path {
        Some(p) => match std::fs::read_to_string(p) {
            Ok(contents) => Ok(toml::from_str(&contents)?),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::info!(path = p, "config file not found, using defaults");
                Ok(Config::default())
            }
            Err(e) => Err(ConfigError::FileRead(e)),
        },
        None => Ok(Config::default()),
    }
}

/// Applies environment overrides read through `lookup`.
///
/// - `LANGFLOW_API_URL` overrides `backend.url`
/// - `APPLICATION_TOKEN` overrides `backend.token`
/// - `LANGFLOW_STREAMING` overrides `backend.streaming` ("true", any case)
/// - `LANGFLOW_TIMEOUT_SECS` overrides `backend.timeout_secs`
/// - `FLOWCALL_HOST` overrides `server.host`
/// - `PORT` overrides `server.port`
/// - `TUNNEL_DOMAIN` overrides `voice.public_host` (scheme stripped)
/// - `FLOWCALL_LOG_LEVEL` overrides `logging.level`
/// - `FLOWCALL_LOG_JSON` overrides `logging.json` (set to "true" to enable)
pub fn apply_env_overrides<F>(config: &mut Config, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    if let Some(url) = lookup("LANGFLOW_API_URL") {
        config.backend.url = url;
    }
    if let Some(token) = lookup("APPLICATION_TOKEN") {
        config.backend.token = Some(token);
    }
    if let Some(streaming) = lookup("LANGFLOW_STREAMING") {
        config.backend.streaming = streaming.trim().eq_ignore_ascii_case("true");
    }
    if let Some(timeout) = lookup("LANGFLOW_TIMEOUT_SECS") {
        match timeout.trim().parse::<u64>() {
            Ok(parsed) if parsed > 0 => config.backend.timeout_secs = parsed,
            _ => {}
        }
    }
    if let Some(host) = lookup("FLOWCALL_HOST") {
        if let Ok(parsed) = host.parse() {
            config.server.host = parsed;
        }
    }
    if let Some(port) = lookup("PORT") {
        if let Ok(parsed) = port.parse() {
            config.server.port = parsed;
        }
    }
    if let Some(domain) = lookup("TUNNEL_DOMAIN") {
        let host = strip_scheme(domain.trim());
        config.voice.public_host = (!host.is_empty()).then(|| host.to_string());
    }
    if let Some(level) = lookup("FLOWCALL_LOG_LEVEL") {
        config.logging.level = level;
    }
    if let Some(json) = lookup("FLOWCALL_LOG_JSON") {
        config.logging.json = json == "true" || json == "1";
    }
}

fn strip_scheme(domain: &str) -> &str {
    domain
        .strip_prefix("https://")
        .or_else(|| domain.strip_prefix("http://"))
        .unwrap_or(domain)
        .trim_end_matches('/')
}
