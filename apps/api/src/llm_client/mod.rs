//! LLM Client — the single point of entry for all language-model calls.
//!
//! ARCHITECTURAL RULE: No other module may call the provider API directly.
//! All LLM interactions MUST go through `LlmClient::call_json`.
//!
//! Retry policy (per call, never shared between calls):
//! - rate-limit signal → wait out the provider cooldown and retry once; a second
//!   rate-limit signal is `QuotaExceeded` and is never retried further.
//! - anything else (transport error, unparseable output) → short delay, retry once,
//!   then `TransientFailure` / `MalformedResponse`.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub mod prompts;

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com/v1beta/models";
const TEMPERATURE: f32 = 0.1;
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);
const MAX_RETRIES: u32 = 1;
/// Free-tier quotas refill on a ~15s cadence.
const RATE_LIMIT_COOLDOWN: Duration = Duration::from_secs(16);
const RETRY_DELAY: Duration = Duration::from_secs(3);

/// Failure reported by the gateway to its callers.
#[derive(Debug, Error)]
pub enum LlmError {
    #[error("Provider quota exceeded")]
    QuotaExceeded,

    #[error("Provider call failed: {0}")]
    TransientFailure(String),

    #[error("Provider returned malformed output: {0}")]
    MalformedResponse(String),
}

/// Failure of a single raw completion attempt.
#[derive(Debug, Error)]
pub enum TransportError {
    #[error("rate limited: {0}")]
    RateLimited(String),

    #[error("{0}")]
    Failed(String),
}

/// One raw completion request. Implementations do no retrying of their own.
#[async_trait]
pub trait CompletionTransport: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError>;
}

#[derive(Debug, Clone)]
pub struct RetryPolicy {
    pub max_retries: u32,
    pub rate_limit_cooldown: Duration,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: MAX_RETRIES,
            rate_limit_cooldown: RATE_LIMIT_COOLDOWN,
            retry_delay: RETRY_DELAY,
        }
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gemini transport
// ────────────────────────────────────────────────────────────────────────────

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<ResponseCandidate>,
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseCandidate {
    pub content: Option<ResponseContent>,
}

#[derive(Debug, Deserialize)]
pub struct ResponseContent {
    #[serde(default)]
    pub parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
pub struct ResponsePart {
    pub text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u32,
    #[serde(default)]
    pub candidates_token_count: u32,
}

impl GenerateContentResponse {
    /// Extracts the text of the first candidate's first text part.
    pub fn text(&self) -> Option<&str> {
        self.candidates
            .iter()
            .filter_map(|c| c.content.as_ref())
            .flat_map(|c| c.parts.iter())
            .find_map(|p| p.text.as_deref())
    }
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    error: GeminiErrorBody,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorBody {
    message: String,
    #[serde(default)]
    status: String,
}

/// Gemini `generateContent`, constrained to JSON output.
pub struct GeminiTransport {
    client: Client,
    api_key: String,
    model: String,
}

impl GeminiTransport {
    pub fn new(api_key: String, model: String) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("Failed to build HTTP client"),
            api_key,
            model,
        }
    }
}

#[async_trait]
impl CompletionTransport for GeminiTransport {
    async fn complete(&self, prompt: &str) -> Result<String, TransportError> {
        let url = format!("{GEMINI_API_BASE}/{}:generateContent", self.model);
        let request_body = GenerateContentRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![Part { text: prompt }],
            }],
            generation_config: GenerationConfig {
                temperature: TEMPERATURE,
                response_mime_type: "application/json",
            },
        };

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&request_body)
            .send()
            .await
            .map_err(|e| TransportError::Failed(format!("HTTP error: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            let parsed = serde_json::from_str::<GeminiError>(&body).ok();
            let exhausted = parsed
                .as_ref()
                .map(|e| e.error.status == "RESOURCE_EXHAUSTED")
                .unwrap_or(false);
            let message = parsed.map(|e| e.error.message).unwrap_or(body);

            if status.as_u16() == 429 || exhausted {
                return Err(TransportError::RateLimited(message));
            }
            return Err(TransportError::Failed(format!(
                "API error (status {}): {message}",
                status.as_u16()
            )));
        }

        let parsed: GenerateContentResponse = response
            .json()
            .await
            .map_err(|e| TransportError::Failed(format!("Unreadable response body: {e}")))?;

        if let Some(usage) = &parsed.usage_metadata {
            debug!(
                "LLM call succeeded: prompt_tokens={}, output_tokens={}",
                usage.prompt_token_count, usage.candidates_token_count
            );
        }

        parsed
            .text()
            .map(str::to_string)
            .ok_or_else(|| TransportError::Failed("LLM returned empty content".to_string()))
    }
}

// ────────────────────────────────────────────────────────────────────────────
// Gateway
// ────────────────────────────────────────────────────────────────────────────

enum AttemptFailure {
    RateLimited(String),
    Transport(String),
    Malformed(String),
}

/// The single LLM client used by the screening services.
/// Wraps a transport with the retry policy and structured-output parsing.
#[derive(Clone)]
pub struct LlmClient {
    transport: Arc<dyn CompletionTransport>,
    policy: RetryPolicy,
}

impl LlmClient {
    pub fn new(transport: Arc<dyn CompletionTransport>, policy: RetryPolicy) -> Self {
        Self { transport, policy }
    }

    pub fn gemini(api_key: String, model: String) -> Self {
        Self::new(
            Arc::new(GeminiTransport::new(api_key, model)),
            RetryPolicy::default(),
        )
    }

    /// Calls the provider and deserializes the text response as JSON.
    /// The prompt must instruct the model to return valid JSON.
    pub async fn call_json<T: DeserializeOwned>(
        &self,
        prompt: &str,
        label: &str,
    ) -> Result<T, LlmError> {
        let attempts = self.policy.max_retries + 1;

        for attempt in 1..=attempts {
            let failure = match self.transport.complete(prompt).await {
                Ok(text) => match serde_json::from_str::<T>(strip_json_fences(&text)) {
                    Ok(value) => return Ok(value),
                    Err(e) => AttemptFailure::Malformed(e.to_string()),
                },
                Err(TransportError::RateLimited(msg)) => AttemptFailure::RateLimited(msg),
                Err(TransportError::Failed(msg)) => AttemptFailure::Transport(msg),
            };

            let can_retry = attempt < attempts;
            match failure {
                AttemptFailure::RateLimited(msg) => {
                    warn!("[{label}] attempt {attempt}: rate limited: {}", preview(&msg));
                    if !can_retry {
                        return Err(LlmError::QuotaExceeded);
                    }
                    tokio::time::sleep(self.policy.rate_limit_cooldown).await;
                }
                AttemptFailure::Transport(msg) => {
                    warn!("[{label}] attempt {attempt}: {}", preview(&msg));
                    if !can_retry {
                        return Err(LlmError::TransientFailure(msg));
                    }
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
                AttemptFailure::Malformed(msg) => {
                    warn!("[{label}] attempt {attempt}: malformed JSON: {}", preview(&msg));
                    if !can_retry {
                        return Err(LlmError::MalformedResponse(msg));
                    }
                    tokio::time::sleep(self.policy.retry_delay).await;
                }
            }
        }

        Err(LlmError::TransientFailure(format!(
            "[{label}] no attempts were made"
        )))
    }
}

fn preview(msg: &str) -> String {
    msg.chars().take(120).collect()
}

/// Strips ```json ... ``` or ``` ... ``` code fences from LLM output.
fn strip_json_fences(text: &str) -> &str {
    let text = text.trim();
    if let Some(stripped) = text.strip_prefix("```json") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else if let Some(stripped) = text.strip_prefix("```") {
        stripped
            .trim_start()
            .strip_suffix("```")
            .map(|s| s.trim())
            .unwrap_or(stripped.trim_start())
    } else {
        text
    }
}
