use std::future::Future;
use std::time::Duration;

use revhook_core::{EngineConfig, RevhookError};
use serde::{Deserialize, Serialize};

/// A text-completion backend.
///
/// The review pipeline is generic over this trait so tests can drive it with
/// a deterministic stub instead of a model server.
pub trait InferenceEngine {
    /// Complete `prompt`, generating at most `max_tokens` tokens.
    fn complete(
        &self,
        prompt: &str,
        max_tokens: u32,
    ) -> impl Future<Output = Result<Completion, RevhookError>> + Send;
}

/// Response of a completion request.
///
/// # Examples
///
/// ```
/// use revhook_review::engine::Completion;
///
/// let completion = Completion::from_text("  looks fine  ");
/// assert_eq!(completion.first_text(), Some("  looks fine  "));
/// ```
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Completion {
    /// Generated alternatives; only the first is used.
    #[serde(default)]
    pub choices: Vec<Choice>,
}

/// One generated alternative.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Choice {
    /// Generated text.
    pub text: String,
}

impl Completion {
    /// Build a single-choice completion.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self {
            choices: vec![Choice { text: text.into() }],
        }
    }

    /// Text of the first choice, if the engine returned any.
    pub fn first_text(&self) -> Option<&str> {
        self.choices.first().map(|c| c.text.as_str())
    }
}

/// Client for an OpenAI-compatible `/v1/completions` endpoint.
///
/// Works with llama.cpp's server, Ollama, vLLM, LM Studio and anything else
/// serving the legacy completions API. The handle owns its connection pool;
/// dropping it closes the pool.
///
/// # Examples
///
/// ```
/// use revhook_core::EngineConfig;
/// use revhook_review::engine::LlmClient;
///
/// let client = LlmClient::open(&EngineConfig::default()).unwrap();
/// assert_eq!(client.endpoint(), "http://127.0.0.1:8080/v1/completions");
/// ```
pub struct LlmClient {
    client: reqwest::Client,
    config: EngineConfig,
}

impl LlmClient {
    /// Create a client from configuration.
    ///
    /// No request is made until the first completion.
    ///
    /// # Errors
    ///
    /// Returns [`RevhookError::Config`] if `base_url` is empty and
    /// [`RevhookError::Llm`] if the HTTP client cannot be built.
    pub fn open(config: &EngineConfig) -> Result<Self, RevhookError> {
        if config.base_url.trim().is_empty() {
            return Err(RevhookError::Config("engine.base_url is empty".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| RevhookError::Llm(format!("failed to create HTTP client: {e}")))?;
        Ok(Self {
            client,
            config: config.clone(),
        })
    }

    /// Model identifier sent with each request.
    pub fn model(&self) -> &str {
        &self.config.model
    }

    /// Full URL of the completions endpoint.
    pub fn endpoint(&self) -> String {
        format!(
            "{}/v1/completions",
            self.config.base_url.trim_end_matches('/')
        )
    }

    fn request_body(&self, prompt: &str, max_tokens: u32) -> serde_json::Value {
        serde_json::json!({
            "model": self.config.model,
            "prompt": prompt,
            "max_tokens": max_tokens,
            "temperature": self.config.temperature,
            "stream": false,
        })
    }
}

impl InferenceEngine for LlmClient {
    async fn complete(&self, prompt: &str, max_tokens: u32) -> Result<Completion, RevhookError> {
        let url = self.endpoint();
        tracing::debug!(%url, max_tokens, "sending completion request");

        let mut request = self.client.post(&url);
        if let Some(api_key) = &self.config.api_key {
            request = request.header("Authorization", format!("Bearer {api_key}"));
        }

        let response = request
            .json(&self.request_body(prompt, max_tokens))
            .send()
            .await
            .map_err(|e| RevhookError::Llm(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body_text = response.text().await.unwrap_or_default();
            return Err(RevhookError::Llm(format!(
                "engine returned {status}: {body_text}"
            )));
        }

        let body: serde_json::Value = response
            .json()
            .await
            .map_err(|e| RevhookError::Llm(format!("failed to parse response: {e}")))?;

        parse_completion(body)
    }
}

/// Decode a completions response body.
///
/// # Errors
///
/// Returns [`RevhookError::Llm`] when the body has no `choices[0].text`.
///
/// # Examples
///
/// ```
/// use revhook_review::engine::parse_completion;
///
/// let body = serde_json::json!({"choices": [{"text": "ok", "index": 0}]});
/// assert_eq!(parse_completion(body).unwrap().first_text(), Some("ok"));
/// ```
pub fn parse_completion(body: serde_json::Value) -> Result<Completion, RevhookError> {
    let completion: Completion = serde_json::from_value(body.clone())
        .map_err(|_| RevhookError::Llm(format!("unexpected response structure: {body}")))?;
    if completion.first_text().is_none() {
        return Err(RevhookError::Llm(format!(
            "response contained no completions: {body}"
        )));
    }
    Ok(completion)
}
