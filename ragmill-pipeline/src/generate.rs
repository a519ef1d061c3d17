//! The generation collaborator: prompt in, answer text out.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Errors from the generation collaborator.
#[derive(Debug, thiserror::Error)]
pub enum GenerateError {
    /// The request never got a usable response.
    #[error("generation request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// The service answered with an error status.
    #[error("generation service returned {status}: {detail}")]
    Api { status: String, detail: String },

    /// The response arrived but could not be interpreted.
    #[error("malformed generation response: {message}")]
    InvalidResponse { message: String },

    /// The generator is unavailable (for example, the queue shut down).
    #[error("generator unavailable: {message}")]
    Unavailable { message: String },
}

impl GenerateError {
    pub fn invalid_response<S: Into<String>>(message: S) -> Self {
        Self::InvalidResponse {
            message: message.into(),
        }
    }

    pub fn unavailable<S: Into<String>>(message: S) -> Self {
        Self::Unavailable {
            message: message.into(),
        }
    }
}

/// A text generation collaborator.
///
/// The pipeline treats generation as a single-capacity resource and hands
/// the collaborator one fully-assembled prompt at a time; implementations
/// need no internal queueing.
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate a completion for the prompt. The returned text is used as
    /// the answer verbatim.
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerateError>;

    /// Name of this generator, for logging.
    fn generator_name(&self) -> &str;
}

/// Generator backed by an OpenAI-compatible chat-completions endpoint.
///
/// Works against any server speaking the `/v1/chat/completions` dialect
/// (llama.cpp server, vLLM, OpenAI itself).
pub struct OpenAiGenerator {
    client: reqwest::Client,
    base_url: String,
    model: String,
    api_key: Option<String>,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f32,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Deserialize)]
struct ChatResponseMessage {
    content: String,
}

#[derive(Deserialize)]
struct ApiErrorResponse {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    message: String,
}

impl OpenAiGenerator {
    /// Create a generator targeting `base_url` (without the
    /// `/chat/completions` suffix) and the given model name.
    pub fn new(base_url: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: None,
        }
    }

    pub fn with_api_key(mut self, api_key: impl Into<String>) -> Self {
        self.api_key = Some(api_key.into());
        self
    }
}

#[async_trait]
impl TextGenerator for OpenAiGenerator {
    async fn generate(
        &self,
        prompt: &str,
        max_tokens: u32,
        temperature: f32,
    ) -> Result<String, GenerateError> {
        tracing::debug!(
            model = %self.model,
            prompt_chars = prompt.chars().count(),
            "requesting completion"
        );

        let body = ChatRequest {
            model: &self.model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            max_tokens,
            temperature,
        };

        let mut request = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .json(&body);
        if let Some(key) = &self.api_key {
            request = request.bearer_auth(key);
        }

        let response = request.send().await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            let detail = serde_json::from_str::<ApiErrorResponse>(&body)
                .map(|e| e.error.message)
                .unwrap_or(body);
            tracing::warn!(%status, "generation service error");
            return Err(GenerateError::Api {
                status: status.to_string(),
                detail,
            });
        }

        let parsed: ChatResponse = response
            .json()
            .await
            .map_err(|e| GenerateError::invalid_response(format!("bad json: {e}")))?;

        parsed
            .choices
            .into_iter()
            .next()
            .map(|choice| choice.message.content)
            .ok_or_else(|| GenerateError::invalid_response("response contained no choices"))
    }

    fn generator_name(&self) -> &str {
        "openai-compatible"
    }
}
