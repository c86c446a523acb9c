use crate::{model_unavailable_after_retries, LlmProvider, Prompt};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use travelmate_core::{CoreError, CoreResult, LlmError, RetryConfig, RetryExecutor};

pub const MISTRAL_API_BASE: &str = "https://api.mistral.ai/v1";
const PROVIDER: &str = "mistral";

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatResponseMessage,
}

#[derive(Debug, Deserialize)]
struct ChatResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Hosted Mistral chat completions.
pub struct MistralProvider {
    http_client: Client,
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    max_tokens: u32,
    retry: RetryExecutor,
}

impl MistralProvider {
    pub fn new(
        api_key: String,
        model: String,
        timeout: Duration,
        retry: RetryConfig,
    ) -> CoreResult<Self> {
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key,
            model,
            base_url: MISTRAL_API_BASE.to_string(),
            temperature: 0.7,
            max_tokens: 2000,
            retry: RetryExecutor::new(retry),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    async fn complete_once(&self, prompt: &Prompt) -> CoreResult<String> {
        let request = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: &prompt.system,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt.user,
                },
            ],
            temperature: self.temperature,
            max_tokens: self.max_tokens,
        };

        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    LlmError::RequestTimeout {
                        provider: PROVIDER.to_string(),
                    }
                    .into()
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Mistral request failed with status: {}", status);
            let error = match status.as_u16() {
                401 | 403 => LlmError::InvalidApiKey {
                    provider: PROVIDER.to_string(),
                },
                404 => LlmError::ModelNotAvailable {
                    model: self.model.clone(),
                },
                429 => LlmError::RateLimitExceeded {
                    provider: PROVIDER.to_string(),
                },
                code if status.is_server_error() => LlmError::ServiceUnavailable {
                    provider: PROVIDER.to_string(),
                    status_code: code,
                },
                code => LlmError::InvalidResponseFormat {
                    provider: PROVIDER.to_string(),
                    details: format!("unexpected status {}", code),
                },
            };
            return Err(error.into());
        }

        let body: ChatResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponseFormat {
                    provider: PROVIDER.to_string(),
                    details: e.to_string(),
                })?;

        Ok(body
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .unwrap_or_default())
    }
}

#[async_trait]
impl LlmProvider for MistralProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &Prompt) -> CoreResult<String> {
        debug!(model = %self.model, "Requesting completion from Mistral");
        let text = self
            .retry
            .execute(PROVIDER, "chat_completions", || self.complete_once(prompt))
            .await
            .map_err(|e| model_unavailable_after_retries(PROVIDER, e))?;
        info!("Mistral returned {} characters", text.len());
        Ok(text)
    }
}
