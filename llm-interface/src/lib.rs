pub mod local;
pub mod mistral;
pub mod prompt;

pub use local::LocalProvider;
pub use mistral::MistralProvider;
pub use prompt::{build_prompt, Prompt};

use async_trait::async_trait;
use std::sync::Arc;
use tracing::{info, warn};
use travelmate_core::{
    AppConfig, CoreError, CoreResult, ErrorExt, ErrorKind, RedditPost, VerifiedPlace,
};

/// A language-model backend that turns a prompt into text.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    fn name(&self) -> &str;

    async fn generate(&self, prompt: &Prompt) -> CoreResult<String>;
}

/// Hosted Mistral when `MISTRAL_API_KEY` is set, otherwise the local
/// server at `LOCAL_MODEL_URL`.
pub fn backend_from_config(config: &AppConfig) -> CoreResult<Arc<dyn LlmProvider>> {
    let credentials = &config.credentials;
    if let Some(api_key) = &credentials.mistral_api_key {
        info!(model = %config.mistral_model, "Using hosted Mistral backend");
        let provider = MistralProvider::new(
            api_key.clone(),
            config.mistral_model.clone(),
            config.http_timeout(),
            config.retry.clone(),
        )?;
        return Ok(Arc::new(provider));
    }
    if let Some(url) = &credentials.local_model_url {
        info!(model = %config.local_model_name, url = %url, "Using local model backend");
        let provider = LocalProvider::new(
            url,
            config.local_model_name.clone(),
            config.http_timeout(),
            config.retry.clone(),
        )?;
        return Ok(Arc::new(provider));
    }
    Err(CoreError::model_unavailable(
        "none",
        "no language model configured; set MISTRAL_API_KEY or LOCAL_MODEL_URL",
    ))
}

/// Anything that is not an auth or prompt problem means the backend is unusable.
pub(crate) fn model_unavailable_after_retries(backend: &str, error: CoreError) -> CoreError {
    match error.kind() {
        ErrorKind::Authentication | ErrorKind::Validation | ErrorKind::ModelUnavailable => error,
        _ => {
            warn!(backend, "Language model unreachable: {}", error);
            CoreError::model_unavailable(backend, error.to_string())
        }
    }
}

/// Prompt assembly plus a call to the selected backend.
pub struct RecommendationGenerator {
    provider: Arc<dyn LlmProvider>,
    max_snippets: usize,
}

impl RecommendationGenerator {
    pub fn new(provider: Arc<dyn LlmProvider>, max_snippets: usize) -> Self {
        Self {
            provider,
            max_snippets,
        }
    }

    pub async fn generate(
        &self,
        city: &str,
        interests: &[String],
        places: &[VerifiedPlace],
        discussions: &[RedditPost],
    ) -> CoreResult<String> {
        let prompt = build_prompt(city, interests, places, discussions, self.max_snippets);
        let text = self.provider.generate(&prompt).await?;
        let text = text.trim();
        if text.is_empty() {
            return Err(CoreError::model_unavailable(
                self.provider.name(),
                "the model returned an empty completion",
            ));
        }
        Ok(text.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::StatusCode;
    use axum::routing::post;
    use axum::{Json, Router};
    use serde_json::{json, Value};
    use std::sync::Mutex;
    use std::time::Duration;
    use travelmate_core::{Credentials, RetryConfig};

    struct CannedProvider {
        reply: String,
        prompts: Mutex<Vec<Prompt>>,
    }

    #[async_trait]
    impl LlmProvider for CannedProvider {
        fn name(&self) -> &str {
            "canned"
        }

        async fn generate(&self, prompt: &Prompt) -> CoreResult<String> {
            self.prompts.lock().unwrap().push(prompt.clone());
            Ok(self.reply.clone())
        }
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
        }
    }

    fn prompt() -> Prompt {
        Prompt {
            system: "rules".to_string(),
            user: "question".to_string(),
        }
    }

    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    fn config(mistral: Option<&str>, local: Option<&str>) -> AppConfig {
        AppConfig {
            credentials: Credentials {
                mistral_api_key: mistral.map(str::to_string),
                local_model_url: local.map(str::to_string),
                ..Credentials::default()
            },
            ..AppConfig::default()
        }
    }

    #[test]
    fn test_backend_selection() {
        let both = backend_from_config(&config(Some("key"), Some("http://localhost:11434")));
        assert_eq!(both.unwrap().name(), "mistral");

        let local = backend_from_config(&config(None, Some("http://localhost:11434")));
        assert_eq!(local.unwrap().name(), "local");

        let none = backend_from_config(&config(None, None));
        assert_eq!(none.err().map(|e| e.kind()), Some(ErrorKind::ModelUnavailable));
    }

    #[tokio::test]
    async fn test_generator_trims_and_uses_prompt() {
        let provider = Arc::new(CannedProvider {
            reply: "  ## Tokyo\n- Senso-ji  \n".to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let generator = RecommendationGenerator::new(provider.clone(), 12);

        let text = generator
            .generate("Tokyo", &["temples".to_string()], &[], &[])
            .await
            .unwrap();
        assert_eq!(text, "## Tokyo\n- Senso-ji");

        let prompts = provider.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].user.contains("interested in temples"));
    }

    #[tokio::test]
    async fn test_empty_completion_is_model_unavailable() {
        let provider = Arc::new(CannedProvider {
            reply: "   ".to_string(),
            prompts: Mutex::new(Vec::new()),
        });
        let generator = RecommendationGenerator::new(provider, 12);
        let error = generator
            .generate("Tokyo", &["food".to_string()], &[], &[])
            .await
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ModelUnavailable);
    }

    #[tokio::test]
    async fn test_mistral_completion() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|Json(body): Json<Value>| async move {
                assert_eq!(body["model"], "mistral-large-latest");
                assert_eq!(body["messages"][0]["role"], "system");
                assert_eq!(body["max_tokens"], 2000);
                Json(json!({
                    "choices": [{"message": {"role": "assistant", "content": "Visit Senso-ji."}}]
                }))
            }),
        );
        let base = spawn_stub(router).await;
        let provider = MistralProvider::new(
            "key".to_string(),
            "mistral-large-latest".to_string(),
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap()
        .with_base_url(format!("{}/v1", base));

        assert_eq!(provider.generate(&prompt()).await.unwrap(), "Visit Senso-ji.");
    }

    #[tokio::test]
    async fn test_mistral_rejected_key_is_authentication() {
        let router = Router::new().route(
            "/v1/chat/completions",
            post(|| async { StatusCode::UNAUTHORIZED }),
        );
        let base = spawn_stub(router).await;
        let provider = MistralProvider::new(
            "bad".to_string(),
            "mistral-large-latest".to_string(),
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap()
        .with_base_url(format!("{}/v1", base));

        let error = provider.generate(&prompt()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_local_server_errors_become_model_unavailable() {
        let router = Router::new().route(
            "/api/generate",
            post(|| async { StatusCode::BAD_GATEWAY }),
        );
        let base = spawn_stub(router).await;
        let provider = LocalProvider::new(
            &base,
            "mistral:7b-instruct".to_string(),
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap();

        let error = provider.generate(&prompt()).await.unwrap_err();
        assert!(matches!(error, CoreError::ModelUnavailable { .. }));
    }

    #[tokio::test]
    async fn test_local_unknown_model() {
        let router = Router::new().route("/api/generate", post(|| async { StatusCode::NOT_FOUND }));
        let base = spawn_stub(router).await;
        let provider = LocalProvider::new(
            &base,
            "no-such-model".to_string(),
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap();

        let error = provider.generate(&prompt()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ModelUnavailable);
    }

    #[tokio::test]
    async fn test_local_generate_uses_instruct_prompt() {
        let router = Router::new().route(
            "/api/generate",
            post(|Json(body): Json<Value>| async move {
                let prompt = body["prompt"].as_str().unwrap_or_default().to_string();
                assert_eq!(body["stream"], false);
                Json(json!({"model": "m", "response": prompt, "done": true}))
            }),
        );
        let base = spawn_stub(router).await;
        let provider = LocalProvider::new(
            &base,
            "mistral:7b-instruct".to_string(),
            Duration::from_secs(5),
            fast_retry(),
        )
        .unwrap();

        let echoed = provider.generate(&prompt()).await.unwrap();
        assert_eq!(echoed, "<s>[INST] rules\n\nquestion [/INST]");
    }

    #[tokio::test]
    async fn test_unreachable_local_server() {
        // Port 9 (discard) is closed on test machines; connection is refused.
        let provider = LocalProvider::new(
            "http://127.0.0.1:9",
            "mistral:7b-instruct".to_string(),
            Duration::from_secs(2),
            fast_retry(),
        )
        .unwrap();

        let error = provider.generate(&prompt()).await.unwrap_err();
        assert_eq!(error.kind(), ErrorKind::ModelUnavailable);
    }
}
