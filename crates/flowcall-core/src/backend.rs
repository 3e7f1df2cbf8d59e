use crate::accumulator::{normalize_buffered, preview, ReplyAccumulator};
use crate::config::BackendConfig;
use crate::error::RelayError;
use futures_util::StreamExt;
use reqwest::header::CONTENT_TYPE;
use serde::Serialize;
use tracing::{error, info};

/// Body of a flow run request.
#[derive(Debug, Serialize)]
struct RunRequest<'a> {
    input_value: &'a str,
    output_type: &'static str,
    input_type: &'static str,
    stream: bool,
    session_id: &'a str,
}

/// Client for the conversational-workflow backend.
///
/// Cloning is cheap; the underlying connection pool is shared.
#[derive(Debug, Clone)]
pub struct BackendClient {
    config: BackendConfig,
    http: reqwest::Client,
}

impl BackendClient {
    /// Builds a client whose every request is bounded by the configured
    /// timeout.
    pub fn new(config: BackendConfig) -> Result<Self, RelayError> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("flowcall/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &BackendConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.is_configured()
    }

    /// Runs one turn and always returns something to say.
    ///
    /// Failures are logged with the call id and replaced by the fixed
    /// configuration-error or generic-error reply.
    pub async fn reply(&self, utterance: &str, call_sid: &str) -> String {
        match self.request_reply(utterance, call_sid).await {
            Ok(reply) => reply,
            Err(e) => {
                error!(call_sid = %call_sid, "backend turn failed: {}", e);
                e.user_message().to_string()
            }
        }
    }

    /// Sends `utterance` to the backend and normalizes the response.
    ///
    /// Returns `RelayError::Configuration` without touching the network when
    /// the endpoint or token is missing.
    pub async fn request_reply(
        &self,
        utterance: &str,
        call_sid: &str,
    ) -> Result<String, RelayError> {
        if self.config.url.trim().is_empty() {
            return Err(RelayError::Configuration(
                "backend URL is not set".to_string(),
            ));
        }
        let token = self.config.bearer_token().ok_or_else(|| {
            RelayError::Configuration("application token is not set".to_string())
        })?;

        let streaming = self.config.streaming;
        info!(call_sid = %call_sid, streaming, "sending utterance to backend");

        let response = self
            .http
            .post(&self.config.url)
            .bearer_auth(token)
            .json(&RunRequest {
                input_value: utterance,
                output_type: "chat",
                input_type: "chat",
                stream: streaming,
                session_id: call_sid,
            })
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            error!(
                call_sid = %call_sid,
                status = status.as_u16(),
                body = %preview(&body),
                "backend returned an error status"
            );
            return Err(RelayError::Status(status.as_u16()));
        }

        let reply = if streaming {
            Self::read_stream(response, call_sid).await?
        } else {
            Self::read_buffered(response, call_sid).await?
        };

        info!(
            call_sid = %call_sid,
            streaming,
            reply = %preview(&reply),
            "backend reply ready"
        );
        Ok(reply)
    }

    async fn read_stream(response: reqwest::Response, call_sid: &str) -> Result<String, RelayError> {
        let mut accumulator = ReplyAccumulator::new(call_sid);
        let mut stream = response.bytes_stream();
        while let Some(chunk) = stream.next().await {
            accumulator.push_chunk(&chunk?);
        }
        accumulator.finish().ok_or(RelayError::EmptyResult)
    }

    async fn read_buffered(
        response: reqwest::Response,
        call_sid: &str,
    ) -> Result<String, RelayError> {
        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|value| value.to_str().ok())
            .map(str::to_owned);
        let body = response.text().await?;
        Ok(normalize_buffered(call_sid, &body, content_type.as_deref()))
    }
}
