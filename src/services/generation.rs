use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

use crate::services::retry::{call_with_backoff, is_rate_limit_message, BackoffPolicy, RetryError, Sleeper, TokioSleeper};

pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const SUPPORTED_MODELS: [&str; 1] = [DEFAULT_MODEL];

#[derive(Debug)]
pub enum GenerationError {
    HttpError(String),
    Api { status: u16, body: String },
    ParseError(String),
    RateLimited { attempts: u32 },
}

impl fmt::Display for GenerationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GenerationError::HttpError(msg) => write!(f, "HTTP error: {}", msg),
            GenerationError::Api { status, body } => write!(f, "HTTP {}: {}", status, body),
            GenerationError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            GenerationError::RateLimited { .. } => {
                write!(f, "Gemini is rate-limiting right now. Try again in ~30-60 seconds.")
            }
        }
    }
}

impl std::error::Error for GenerationError {}

impl From<reqwest::Error> for GenerationError {
    fn from(err: reqwest::Error) -> Self {
        GenerationError::HttpError(err.to_string())
    }
}

impl From<serde_json::Error> for GenerationError {
    fn from(err: serde_json::Error) -> Self {
        GenerationError::ParseError(err.to_string())
    }
}

impl GenerationError {
    pub fn is_rate_limited(&self) -> bool {
        match self {
            GenerationError::Api { status: 429, .. } => true,
            other => is_rate_limit_message(&other.to_string()),
        }
    }
}

/// External text generator. Implementations make exactly one attempt per call.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    async fn generate(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, GenerationError>;
}

#[derive(Serialize)]
struct GenerateContentRequest<'a> {
    contents: Vec<Content<'a>>,
}

#[derive(Serialize)]
struct Content<'a> {
    parts: Vec<RequestPart<'a>>,
}

#[derive(Serialize)]
struct RequestPart<'a> {
    text: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateContentResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct CandidateContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

impl GenerateContentResponse {
    /// Text of the first candidate, trimmed; empty when the model returned none.
    fn text(&self) -> String {
        self.candidates
            .first()
            .and_then(|candidate| candidate.content.as_ref())
            .map(|content| {
                content
                    .parts
                    .iter()
                    .filter_map(|part| part.text.as_deref())
                    .collect::<String>()
            })
            .unwrap_or_default()
            .trim()
            .to_string()
    }
}

/// Gemini `generateContent` REST client.
#[derive(Clone)]
pub struct GeminiClient {
    pub client: Client,
    pub base_url: String,
}

impl GeminiClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            base_url: base_url.into(),
        }
    }
}

impl Default for GeminiClient {
    fn default() -> Self {
        Self::new(DEFAULT_API_BASE)
    }
}

#[async_trait]
impl TextGenerator for GeminiClient {
    async fn generate(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let url = format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url.trim_end_matches('/'),
            model
        );
        let payload = GenerateContentRequest {
            contents: vec![Content {
                parts: vec![RequestPart { text: prompt }],
            }],
        };

        tracing::debug!(model, prompt_chars = prompt.chars().count(), "calling gemini");

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", api_key)
            .json(&payload)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(GenerationError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)?;

        Ok(parsed.text())
    }
}

/// Retries the wrapped generator on rate-limit failures.
pub struct ResilientGenerator<G> {
    inner: G,
    policy: BackoffPolicy,
    sleeper: Arc<dyn Sleeper>,
    retry_if: fn(&GenerationError) -> bool,
}

impl<G: TextGenerator> ResilientGenerator<G> {
    pub fn new(inner: G, policy: BackoffPolicy) -> Self {
        Self {
            inner,
            policy,
            sleeper: Arc::new(TokioSleeper),
            retry_if: GenerationError::is_rate_limited,
        }
    }

    pub fn with_sleeper(mut self, sleeper: Arc<dyn Sleeper>) -> Self {
        self.sleeper = sleeper;
        self
    }

    pub fn with_retry_predicate(mut self, retry_if: fn(&GenerationError) -> bool) -> Self {
        self.retry_if = retry_if;
        self
    }
}

#[async_trait]
impl<G: TextGenerator> TextGenerator for ResilientGenerator<G> {
    async fn generate(&self, api_key: &str, model: &str, prompt: &str) -> Result<String, GenerationError> {
        let result = call_with_backoff(&self.policy, self.sleeper.as_ref(), self.retry_if, || {
            self.inner.generate(api_key, model, prompt)
        })
        .await;

        match result {
            Ok(text) => Ok(text),
            Err(RetryError::Exhausted { attempts, .. }) => Err(GenerationError::RateLimited { attempts }),
            Err(RetryError::Fatal(err)) => Err(err),
        }
    }
}
