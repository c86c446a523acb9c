use crate::{model_unavailable_after_retries, LlmProvider, Prompt};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, info, warn};
use travelmate_core::{
    ConfigError, CoreError, CoreResult, LlmError, RetryConfig, RetryExecutor, LOCAL_MODEL_URL_ENV,
};
use url::Url;

const PROVIDER: &str = "local";

#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    response: String,
}

/// A locally served model behind an Ollama-compatible `/api/generate` endpoint.
pub struct LocalProvider {
    http_client: Client,
    endpoint: Url,
    model: String,
    retry: RetryExecutor,
}

impl LocalProvider {
    pub fn new(
        base_url: &str,
        model: String,
        timeout: Duration,
        retry: RetryConfig,
    ) -> CoreResult<Self> {
        let endpoint = generate_endpoint(base_url)?;
        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            endpoint,
            model,
            retry: RetryExecutor::new(retry),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    async fn generate_once(&self, prompt: &str) -> CoreResult<String> {
        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
        };

        let response = self
            .http_client
            .post(self.endpoint.clone())
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
            warn!("Local model request failed with status: {}", status);
            let error = match status.as_u16() {
                404 => LlmError::ModelNotAvailable {
                    model: self.model.clone(),
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

        let body: GenerateResponse =
            response
                .json()
                .await
                .map_err(|e| LlmError::InvalidResponseFormat {
                    provider: PROVIDER.to_string(),
                    details: e.to_string(),
                })?;
        Ok(body.response)
    }
}

/// `{base}/api/generate`, keeping any path prefix of `base`.
fn generate_endpoint(base_url: &str) -> CoreResult<Url> {
    let invalid = || ConfigError::InvalidValue {
        field: LOCAL_MODEL_URL_ENV.to_string(),
        value: base_url.to_string(),
    };
    let mut base = base_url.trim().to_string();
    if !base.ends_with('/') {
        base.push('/');
    }
    let endpoint = Url::parse(&base)
        .and_then(|url| url.join("api/generate"))
        .map_err(|_| invalid())?;
    if !matches!(endpoint.scheme(), "http" | "https") {
        return Err(invalid().into());
    }
    Ok(endpoint)
}

#[async_trait]
impl LlmProvider for LocalProvider {
    fn name(&self) -> &str {
        PROVIDER
    }

    async fn generate(&self, prompt: &Prompt) -> CoreResult<String> {
        let instruct = prompt.to_instruct();
        debug!(model = %self.model, endpoint = %self.endpoint, "Requesting local completion");
        let text = self
            .retry
            .execute(PROVIDER, "generate", || self.generate_once(&instruct))
            .await
            .map_err(|e| model_unavailable_after_retries(PROVIDER, e))?;
        info!("Local model returned {} characters", text.len());
        Ok(text)
    }
}
