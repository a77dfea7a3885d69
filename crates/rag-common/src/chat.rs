/// Chat-completions client for OpenAI-compatible hosts (Ollama's `/v1` endpoint by default).
///
/// Transient failures (timeouts, connection errors, 429 and 5xx) are retried with
/// capped exponential backoff plus jitter.
use std::time::{Duration, SystemTime, UNIX_EPOCH};

use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Clone, Debug)]
pub struct ChatClientConfig {
    pub base_url: String,
    pub timeout: Duration,
    pub max_retries: u32,
    pub initial_backoff: Duration,
    pub max_backoff: Duration,
    pub max_error_body_bytes: usize,
}

impl ChatClientConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let parsed = |key: &str| lookup(key).and_then(|s| s.trim().parse::<u64>().ok());

        let base_url =
            lookup("OPENAI_BASE_URL").unwrap_or_else(|| "http://localhost:11434/v1".to_string());

        // Local generation of a batch of questions is slow; allow two minutes by default.
        let timeout = Duration::from_secs(parsed("OPENAI_TIMEOUT_SECS").unwrap_or(120));
        let max_retries = parsed("OPENAI_MAX_RETRIES").map(|n| n as u32).unwrap_or(2);
        let initial_backoff = Duration::from_millis(parsed("OPENAI_RETRY_INITIAL_MS").unwrap_or(250));
        let max_backoff = Duration::from_millis(parsed("OPENAI_RETRY_MAX_MS").unwrap_or(5_000));
        let max_error_body_bytes = parsed("OPENAI_MAX_ERROR_BODY_BYTES")
            .map(|n| n as usize)
            .unwrap_or(8 * 1024);

        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            timeout,
            max_retries,
            initial_backoff,
            max_backoff,
            max_error_body_bytes,
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ChatClientError {
    #[error("request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("upstream returned error: status={status} message={message}")]
    Upstream { status: StatusCode, message: String },

    #[error("upstream returned non-JSON error: status={status} body={body}")]
    UpstreamBody { status: StatusCode, body: String },

    #[error("completion has no message content")]
    EmptyCompletion,
}

impl ChatClientError {
    fn is_transient(&self) -> bool {
        match self {
            ChatClientError::Request(e) => e.is_timeout() || e.is_connect() || e.is_request(),
            ChatClientError::Upstream { status, .. }
            | ChatClientError::UpstreamBody { status, .. } => {
                *status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error()
            }
            ChatClientError::EmptyCompletion => false,
        }
    }
}

#[derive(Clone)]
pub struct ChatClient {
    config: ChatClientConfig,
    http: reqwest::Client,
}

impl ChatClient {
    pub fn new(config: ChatClientConfig) -> Result<Self, ChatClientError> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("rag-server/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &ChatClientConfig {
        &self.config
    }

    /// Send a single user message to `model` and return the assistant's text.
    pub async fn complete(&self, model: &str, prompt: &str) -> Result<String, ChatClientError> {
        let request = ChatCompletionRequest {
            model: model.to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: prompt.to_string(),
            }],
            temperature: None,
            stream: false,
        };
        debug!(model, prompt_chars = prompt.chars().count(), "sending chat completion");

        let response = self.chat_completions(&request).await?;
        response
            .choices
            .into_iter()
            .next()
            .and_then(|c| c.message.content)
            .ok_or(ChatClientError::EmptyCompletion)
    }

    pub async fn chat_completions(
        &self,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatClientError> {
        let url = format!("{}/chat/completions", self.config.base_url);
        let mut attempt: u32 = 0;
        loop {
            let result = self.post_once(&url, request).await;
            match result {
                Ok(response) => return Ok(response),
                Err(e) if attempt < self.config.max_retries && e.is_transient() => {
                    let delay = backoff_delay(
                        self.config.initial_backoff,
                        self.config.max_backoff,
                        attempt,
                    );
                    attempt += 1;
                    warn!(
                        attempt,
                        delay_ms = delay.as_millis(),
                        error = %e,
                        "chat completion failed, retrying"
                    );
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }

    async fn post_once(
        &self,
        url: &str,
        request: &ChatCompletionRequest,
    ) -> Result<ChatCompletionResponse, ChatClientError> {
        let resp = self
            .http
            .post(url)
            .timeout(self.config.timeout)
            .json(request)
            .send()
            .await?;

        let status = resp.status();
        if status.is_success() {
            return Ok(resp.json::<ChatCompletionResponse>().await?);
        }

        let body = read_limited_text(resp, self.config.max_error_body_bytes).await;
        Err(upstream_error(status, body))
    }
}

fn upstream_error(status: StatusCode, body: String) -> ChatClientError {
    match serde_json::from_str::<ErrorEnvelope>(&body) {
        Ok(envelope) => ChatClientError::Upstream {
            status,
            message: envelope
                .error
                .message
                .unwrap_or_else(|| "unknown upstream error".to_string()),
        },
        Err(_) => ChatClientError::UpstreamBody { status, body },
    }
}

/// `initial * 2^exponent`, capped at `max`, plus up to 25% jitter.
fn backoff_delay(initial: Duration, max: Duration, exponent: u32) -> Duration {
    let mult = 1u128.checked_shl(exponent).unwrap_or(u128::MAX);
    let capped_ms = initial
        .as_millis()
        .saturating_mul(mult)
        .min(max.as_millis()) as u64;
    let jitter_cap = (capped_ms / 4).max(1);
    Duration::from_millis(capped_ms.saturating_add(clock_jitter_ms(jitter_cap)))
}

fn clock_jitter_ms(max_inclusive: u64) -> u64 {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.subsec_nanos() as u64)
        .unwrap_or(0);
    nanos % (max_inclusive + 1)
}

async fn read_limited_text(resp: reqwest::Response, max_bytes: usize) -> String {
    match resp.bytes().await {
        Ok(bytes) => {
            let end = bytes.len().min(max_bytes);
            String::from_utf8_lossy(&bytes[..end]).into_owned()
        }
        Err(e) => {
            warn!(error = %e, "failed to read upstream error body");
            "<failed to read error body>".to_string()
        }
    }
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorObject,
}

#[derive(Debug, Deserialize)]
struct ErrorObject {
    message: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Message {
    pub role: String,
    pub content: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatCompletionRequest {
    pub model: String,
    pub messages: Vec<Message>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    pub stream: bool,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    pub choices: Vec<ChatCompletionChoice>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionChoice {
    pub message: ChatCompletionMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionMessage {
    pub content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn config_defaults_target_local_ollama() {
        let config = ChatClientConfig::from_lookup(|_| None);
        assert_eq!(config.base_url, "http://localhost:11434/v1");
        assert_eq!(config.timeout, Duration::from_secs(120));
        assert_eq!(config.max_retries, 2);
    }

    #[test]
    fn config_reads_overrides_and_trims_slash() {
        let config = ChatClientConfig::from_lookup(|key| match key {
            "OPENAI_BASE_URL" => Some("http://ollama:11434/v1/".to_string()),
            "OPENAI_TIMEOUT_SECS" => Some("5".to_string()),
            "OPENAI_MAX_RETRIES" => Some("not-a-number".to_string()),
            _ => None,
        });
        assert_eq!(config.base_url, "http://ollama:11434/v1");
        assert_eq!(config.timeout, Duration::from_secs(5));
        assert_eq!(config.max_retries, 2, "unparsable values fall back to defaults");
    }

    #[test]
    fn backoff_is_capped() {
        let initial = Duration::from_millis(100);
        let max = Duration::from_millis(1_000);
        for exponent in [0, 1, 5, 64, 200] {
            let delay = backoff_delay(initial, max, exponent);
            assert!(delay >= initial.min(max), "exponent {exponent}: {delay:?}");
            assert!(delay <= max + max / 4, "exponent {exponent}: {delay:?}");
        }
    }

    #[test]
    fn upstream_error_prefers_json_message() {
        let err = upstream_error(
            StatusCode::NOT_FOUND,
            r#"{"error":{"message":"model 'x' not found"}}"#.to_string(),
        );
        assert!(matches!(err, ChatClientError::Upstream { ref message, .. } if message == "model 'x' not found"));
        assert!(!err.is_transient());

        let err = upstream_error(StatusCode::BAD_GATEWAY, "<html>".to_string());
        assert!(matches!(err, ChatClientError::UpstreamBody { .. }));
        assert!(err.is_transient());
    }

    #[test]
    fn request_omits_unset_temperature() {
        let request = ChatCompletionRequest {
            model: "llama3.2:latest".to_string(),
            messages: vec![Message {
                role: "user".to_string(),
                content: "hi".to_string(),
            }],
            temperature: None,
            stream: false,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert!(json.get("temperature").is_none());
        assert_eq!(json["stream"], false);
        assert_eq!(json["messages"][0]["role"], "user");
    }
}
