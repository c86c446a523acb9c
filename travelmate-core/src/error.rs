use thiserror::Error;

#[derive(Error, Debug)]
pub enum CoreError {
    #[error("Reddit API error: {0}")]
    RedditApi(#[from] RedditApiError),

    #[error("Maps API error: {0}")]
    MapsApi(#[from] MapsApiError),

    #[error("LLM error: {0}")]
    Llm(#[from] LlmError),

    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("Invalid input: {message}")]
    Validation { message: String },

    #[error("Authentication failed for {service}: {reason}")]
    Authentication { service: String, reason: String },

    #[error("{service} unavailable after {attempts} attempt(s): {reason}")]
    ServiceUnavailable {
        service: String,
        attempts: u32,
        reason: String,
    },

    #[error("Language model unavailable ({backend}): {reason}")]
    ModelUnavailable { backend: String, reason: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl CoreError {
    pub fn validation(message: impl Into<String>) -> Self {
        CoreError::Validation {
            message: message.into(),
        }
    }

    pub fn authentication(service: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::Authentication {
            service: service.into(),
            reason: reason.into(),
        }
    }

    pub fn model_unavailable(backend: impl Into<String>, reason: impl Into<String>) -> Self {
        CoreError::ModelUnavailable {
            backend: backend.into(),
            reason: reason.into(),
        }
    }
}

#[derive(Error, Debug, Clone)]
pub enum RedditApiError {
    #[error("Authentication failed: {reason}")]
    AuthenticationFailed { reason: String },

    #[error("Rate limit exceeded. Retry after {retry_after} seconds")]
    RateLimitExceeded { retry_after: u64 },

    #[error("Forbidden access to resource: {resource}")]
    Forbidden { resource: String },

    #[error("Subreddit not found: {subreddit}")]
    SubredditNotFound { subreddit: String },

    #[error("Invalid OAuth token")]
    InvalidToken,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum MapsApiError {
    #[error("Request denied: {message}")]
    RequestDenied { message: String },

    #[error("Query limit exceeded")]
    OverQueryLimit,

    #[error("Invalid request: {details}")]
    InvalidRequest { details: String },

    #[error("Place not found: {place_id}")]
    NotFound { place_id: String },

    #[error("Unknown server-side error")]
    UnknownError,

    #[error("Request timeout")]
    RequestTimeout,

    #[error("Invalid API response: {details}")]
    InvalidResponse { details: String },

    #[error("Server error: {status_code}")]
    ServerError { status_code: u16 },
}

#[derive(Error, Debug, Clone)]
pub enum LlmError {
    #[error("API key invalid or missing for {provider}")]
    InvalidApiKey { provider: String },

    #[error("Rate limit exceeded for {provider}")]
    RateLimitExceeded { provider: String },

    #[error("Model not available: {model}")]
    ModelNotAvailable { model: String },

    #[error("Invalid prompt: {reason}")]
    InvalidPrompt { reason: String },

    #[error("Provider service unavailable: {provider} ({status_code})")]
    ServiceUnavailable { provider: String, status_code: u16 },

    #[error("Request timeout for {provider}")]
    RequestTimeout { provider: String },

    #[error("Invalid response format from {provider}: {details}")]
    InvalidResponseFormat { provider: String, details: String },
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Configuration file not found: {path}")]
    FileNotFound { path: String },

    #[error("Invalid value for {field}: {value}")]
    InvalidValue { field: String, value: String },

    #[error("Environment variable not set: {var_name}")]
    MissingEnvironmentVariable { var_name: String },

    #[error("Credentials file error: {details}")]
    CredentialsFile { details: String },

    #[error("Configuration parsing error: {0}")]
    Parse(#[from] toml::de::Error),
}

/// The coarse failure categories a run can end in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Validation,
    Authentication,
    ServiceUnavailable,
    ModelUnavailable,
    Internal,
}

impl ErrorKind {
    /// Process exit code used by the CLI for this kind of failure.
    pub fn exit_code(self) -> u8 {
        match self {
            ErrorKind::Internal => 1,
            ErrorKind::Validation => 2,
            ErrorKind::Authentication => 3,
            ErrorKind::ServiceUnavailable => 4,
            ErrorKind::ModelUnavailable => 5,
        }
    }
}

pub type CoreResult<T> = Result<T, CoreError>;
