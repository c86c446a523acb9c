use crate::error::*;
use std::time::Duration;
use tracing::{error, info, warn};

pub trait ErrorExt {
    fn log_error(&self) -> &Self;
    fn log_warn(&self) -> &Self;
    fn is_retryable(&self) -> bool;
    fn retry_after(&self) -> Option<Duration>;
    fn kind(&self) -> ErrorKind;
    fn user_friendly_message(&self) -> String;
    fn error_code(&self) -> String;
}

impl ErrorExt for CoreError {
    fn log_error(&self) -> &Self {
        error!("CoreError: {}", self);
        match self {
            CoreError::RedditApi(e) => {
                error!("Reddit API error details: {:?}", e);
            }
            CoreError::MapsApi(e) => {
                error!("Maps API error details: {:?}", e);
            }
            CoreError::Llm(e) => {
                error!("LLM error details: {:?}", e);
            }
            CoreError::Config(e) => {
                error!("Configuration error details: {:?}", e);
            }
            _ => {}
        }
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("CoreError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            CoreError::RedditApi(e) => e.is_retryable(),
            CoreError::MapsApi(e) => e.is_retryable(),
            CoreError::Llm(e) => e.is_retryable(),
            CoreError::Network(e) => e.is_timeout() || e.is_connect(),
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            CoreError::RedditApi(e) => e.retry_after(),
            _ => None,
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            CoreError::RedditApi(e) => e.kind(),
            CoreError::MapsApi(e) => e.kind(),
            CoreError::Llm(e) => e.kind(),
            CoreError::Config(e) => e.kind(),
            CoreError::Network(e) if e.is_timeout() || e.is_connect() => {
                ErrorKind::ServiceUnavailable
            }
            CoreError::Validation { .. } => ErrorKind::Validation,
            CoreError::Authentication { .. } => ErrorKind::Authentication,
            CoreError::ServiceUnavailable { .. } => ErrorKind::ServiceUnavailable,
            CoreError::ModelUnavailable { .. } => ErrorKind::ModelUnavailable,
            CoreError::Network(_)
            | CoreError::Io(_)
            | CoreError::Serialization(_)
            | CoreError::Internal { .. } => ErrorKind::Internal,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            CoreError::RedditApi(e) => e.user_friendly_message(),
            CoreError::MapsApi(e) => e.user_friendly_message(),
            CoreError::Llm(e) => e.user_friendly_message(),
            CoreError::Config(e) => e.user_friendly_message(),
            CoreError::Network(_) => {
                "Network connection error. Please check your internet connection.".to_string()
            }
            CoreError::Validation { message } => format!("Invalid input: {}", message),
            CoreError::Authentication { service, reason } => format!(
                "Authentication with {} failed ({}). Please check your credentials.",
                service, reason
            ),
            CoreError::ServiceUnavailable {
                service, attempts, ..
            } => format!(
                "{} could not be reached after {} attempt(s). Please try again later.",
                service, attempts
            ),
            CoreError::ModelUnavailable { backend, reason } => format!(
                "The language model backend '{}' is unavailable: {}",
                backend, reason
            ),
            _ => "An unexpected error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            CoreError::RedditApi(_) => "REDDIT_API".to_string(),
            CoreError::MapsApi(_) => "MAPS_API".to_string(),
            CoreError::Llm(_) => "LLM".to_string(),
            CoreError::Config(_) => "CONFIG".to_string(),
            CoreError::Io(_) => "IO".to_string(),
            CoreError::Serialization(_) => "SERIALIZATION".to_string(),
            CoreError::Network(_) => "NETWORK".to_string(),
            CoreError::Validation { .. } => "VALIDATION".to_string(),
            CoreError::Authentication { .. } => "AUTHENTICATION".to_string(),
            CoreError::ServiceUnavailable { .. } => "SERVICE_UNAVAILABLE".to_string(),
            CoreError::ModelUnavailable { .. } => "MODEL_UNAVAILABLE".to_string(),
            CoreError::Internal { .. } => "INTERNAL".to_string(),
        }
    }
}

impl ErrorExt for RedditApiError {
    fn log_error(&self) -> &Self {
        error!("RedditApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("RedditApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            RedditApiError::RateLimitExceeded { .. } => true,
            RedditApiError::RequestTimeout => true,
            RedditApiError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        match self {
            RedditApiError::RateLimitExceeded { retry_after } => {
                Some(Duration::from_secs(*retry_after))
            }
            _ => None,
        }
    }

    fn kind(&self) -> ErrorKind {
        match self {
            RedditApiError::AuthenticationFailed { .. } | RedditApiError::InvalidToken => {
                ErrorKind::Authentication
            }
            RedditApiError::RateLimitExceeded { .. }
            | RedditApiError::RequestTimeout
            | RedditApiError::ServerError { .. } => ErrorKind::ServiceUnavailable,
            _ => ErrorKind::Internal,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => {
                "Reddit authentication failed. Please check your credentials.".to_string()
            }
            RedditApiError::RateLimitExceeded { retry_after } => format!(
                "Too many requests. Please wait {} seconds before trying again.",
                retry_after
            ),
            RedditApiError::Forbidden { resource } => format!(
                "Access denied to {}. You may not have permission to view this content.",
                resource
            ),
            RedditApiError::SubredditNotFound { subreddit } => {
                format!("Subreddit '{}' not found or is private.", subreddit)
            }
            RedditApiError::InvalidToken => {
                "Reddit authentication token is invalid. Please re-authenticate.".to_string()
            }
            RedditApiError::RequestTimeout => {
                "Request to Reddit timed out. Please try again.".to_string()
            }
            _ => "Reddit API error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            RedditApiError::AuthenticationFailed { .. } => "REDDIT_AUTH_FAILED".to_string(),
            RedditApiError::RateLimitExceeded { .. } => "REDDIT_RATE_LIMIT".to_string(),
            RedditApiError::Forbidden { .. } => "REDDIT_FORBIDDEN".to_string(),
            RedditApiError::SubredditNotFound { .. } => "REDDIT_SUBREDDIT_NOT_FOUND".to_string(),
            RedditApiError::InvalidToken => "REDDIT_INVALID_TOKEN".to_string(),
            RedditApiError::RequestTimeout => "REDDIT_TIMEOUT".to_string(),
            RedditApiError::InvalidResponse { .. } => "REDDIT_INVALID_RESPONSE".to_string(),
            RedditApiError::ServerError { .. } => "REDDIT_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for MapsApiError {
    fn log_error(&self) -> &Self {
        error!("MapsApiError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("MapsApiError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        match self {
            MapsApiError::OverQueryLimit
            | MapsApiError::UnknownError
            | MapsApiError::RequestTimeout => true,
            MapsApiError::ServerError { status_code } => *status_code >= 500,
            _ => false,
        }
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn kind(&self) -> ErrorKind {
        match self {
            MapsApiError::RequestDenied { .. } => ErrorKind::Authentication,
            MapsApiError::OverQueryLimit
            | MapsApiError::UnknownError
            | MapsApiError::RequestTimeout
            | MapsApiError::ServerError { .. } => ErrorKind::ServiceUnavailable,
            _ => ErrorKind::Internal,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            MapsApiError::RequestDenied { .. } => {
                "The maps service rejected the API key. Please check GOOGLE_MAPS_API_KEY."
                    .to_string()
            }
            MapsApiError::OverQueryLimit => {
                "The maps service quota is exhausted. Please try again later.".to_string()
            }
            MapsApiError::RequestTimeout => {
                "Request to the maps service timed out. Please try again.".to_string()
            }
            _ => "Maps service error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            MapsApiError::RequestDenied { .. } => "MAPS_REQUEST_DENIED".to_string(),
            MapsApiError::OverQueryLimit => "MAPS_OVER_QUERY_LIMIT".to_string(),
            MapsApiError::InvalidRequest { .. } => "MAPS_INVALID_REQUEST".to_string(),
            MapsApiError::NotFound { .. } => "MAPS_NOT_FOUND".to_string(),
            MapsApiError::UnknownError => "MAPS_UNKNOWN_ERROR".to_string(),
            MapsApiError::RequestTimeout => "MAPS_TIMEOUT".to_string(),
            MapsApiError::InvalidResponse { .. } => "MAPS_INVALID_RESPONSE".to_string(),
            MapsApiError::ServerError { .. } => "MAPS_SERVER_ERROR".to_string(),
        }
    }
}

impl ErrorExt for LlmError {
    fn log_error(&self) -> &Self {
        error!("LlmError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("LlmError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        matches!(
            self,
            LlmError::RateLimitExceeded { .. }
                | LlmError::ServiceUnavailable { .. }
                | LlmError::RequestTimeout { .. }
        )
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn kind(&self) -> ErrorKind {
        match self {
            LlmError::InvalidApiKey { .. } => ErrorKind::Authentication,
            LlmError::InvalidPrompt { .. } => ErrorKind::Validation,
            _ => ErrorKind::ModelUnavailable,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            LlmError::InvalidApiKey { provider } => format!(
                "Invalid API key for {}. Please update your credentials.",
                provider
            ),
            LlmError::RateLimitExceeded { provider } => {
                format!("Rate limit exceeded for {}. Please wait and retry.", provider)
            }
            LlmError::ModelNotAvailable { model } => format!(
                "Model '{}' is not available. Please try a different model.",
                model
            ),
            LlmError::ServiceUnavailable { provider, .. } => format!(
                "{} service is temporarily unavailable. Please try again later.",
                provider
            ),
            _ => "AI service error occurred. Please try again later.".to_string(),
        }
    }

    fn error_code(&self) -> String {
        match self {
            LlmError::InvalidApiKey { .. } => "LLM_INVALID_API_KEY".to_string(),
            LlmError::RateLimitExceeded { .. } => "LLM_RATE_LIMIT".to_string(),
            LlmError::ModelNotAvailable { .. } => "LLM_MODEL_NOT_AVAILABLE".to_string(),
            LlmError::InvalidPrompt { .. } => "LLM_INVALID_PROMPT".to_string(),
            LlmError::ServiceUnavailable { .. } => "LLM_SERVICE_UNAVAILABLE".to_string(),
            LlmError::RequestTimeout { .. } => "LLM_TIMEOUT".to_string(),
            LlmError::InvalidResponseFormat { .. } => "LLM_INVALID_RESPONSE".to_string(),
        }
    }
}

impl ErrorExt for ConfigError {
    fn log_error(&self) -> &Self {
        error!("ConfigError: {}", self);
        self
    }

    fn log_warn(&self) -> &Self {
        warn!("ConfigError (warning): {}", self);
        self
    }

    fn is_retryable(&self) -> bool {
        false // Config errors are typically not retryable
    }

    fn retry_after(&self) -> Option<Duration> {
        None
    }

    fn kind(&self) -> ErrorKind {
        match self {
            ConfigError::MissingEnvironmentVariable { .. } => ErrorKind::Authentication,
            _ => ErrorKind::Validation,
        }
    }

    fn user_friendly_message(&self) -> String {
        match self {
            ConfigError::FileNotFound { path } => {
                format!("Configuration file '{}' not found.", path)
            }
            ConfigError::InvalidValue { field, value } => {
                format!("Invalid value '{}' for configuration field '{}'.", value, field)
            }
            ConfigError::MissingEnvironmentVariable { var_name } => format!(
                "Environment variable '{}' is required but not set.",
                var_name
            ),
            ConfigError::CredentialsFile { details } => {
                format!("Could not update the credentials file: {}", details)
            }
            ConfigError::Parse(e) => format!("Configuration file is not valid TOML: {}", e),
        }
    }

    fn error_code(&self) -> String {
        match self {
            ConfigError::FileNotFound { .. } => "CONFIG_FILE_NOT_FOUND".to_string(),
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE".to_string(),
            ConfigError::MissingEnvironmentVariable { .. } => "CONFIG_MISSING_ENV_VAR".to_string(),
            ConfigError::CredentialsFile { .. } => "CONFIG_CREDENTIALS_FILE".to_string(),
            ConfigError::Parse(_) => "CONFIG_PARSE_ERROR".to_string(),
        }
    }
}

/// Logs a failure once at the edge where it is shown to the user.
#[derive(Debug, Clone, Copy, Default)]
pub struct ErrorReporter;

impl ErrorReporter {
    pub fn new() -> Self {
        Self
    }

    /// A failure that ends the command.
    pub fn report_error(&self, error: &CoreError) {
        error.log_error();
        info!("Error code: {}", error.error_code());
        info!("User message: {}", error.user_friendly_message());
    }

    /// A failure answered with an error response while the process keeps serving.
    pub fn report_warning(&self, error: &CoreError) {
        error.log_warn();
    }
}
