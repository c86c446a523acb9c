use travelmate_core::{
    ConfigError, CoreError, ErrorExt, ErrorKind, ErrorReporter, LlmError, MapsApiError,
    RedditApiError,
};
use std::time::Duration;

#[test]
fn test_error_codes() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    assert_eq!(reddit_error.error_code(), "REDDIT_API");

    let maps_error = CoreError::MapsApi(MapsApiError::OverQueryLimit);
    assert_eq!(maps_error.error_code(), "MAPS_API");

    let llm_error = CoreError::Llm(LlmError::InvalidApiKey {
        provider: "mistral".to_string(),
    });
    assert_eq!(llm_error.error_code(), "LLM");

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "GOOGLE_MAPS_API_KEY".to_string(),
    });
    assert_eq!(config_error.error_code(), "CONFIG");
}

#[test]
fn test_taxonomy_kinds() {
    assert_eq!(
        CoreError::validation("city must not be empty").kind(),
        ErrorKind::Validation
    );
    assert_eq!(
        CoreError::MapsApi(MapsApiError::RequestDenied {
            message: "The provided API key is invalid.".to_string()
        })
        .kind(),
        ErrorKind::Authentication
    );
    assert_eq!(
        CoreError::Config(ConfigError::MissingEnvironmentVariable {
            var_name: "GOOGLE_MAPS_API_KEY".to_string()
        })
        .kind(),
        ErrorKind::Authentication
    );
    assert_eq!(
        CoreError::ServiceUnavailable {
            service: "maps".to_string(),
            attempts: 3,
            reason: "timeout".to_string()
        }
        .kind(),
        ErrorKind::ServiceUnavailable
    );
    assert_eq!(
        CoreError::Llm(LlmError::ModelNotAvailable {
            model: "mistral:7b".to_string()
        })
        .kind(),
        ErrorKind::ModelUnavailable
    );
}

#[test]
fn test_exit_codes_are_non_zero_and_distinct() {
    let kinds = [
        ErrorKind::Internal,
        ErrorKind::Validation,
        ErrorKind::Authentication,
        ErrorKind::ServiceUnavailable,
        ErrorKind::ModelUnavailable,
    ];
    let mut codes: Vec<u8> = kinds.iter().map(|k| k.exit_code()).collect();
    assert!(codes.iter().all(|c| *c != 0));
    codes.sort();
    codes.dedup();
    assert_eq!(codes.len(), kinds.len());
}

#[test]
fn test_retryable_errors() {
    let retryable_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert!(retryable_error.is_retryable());

    assert!(CoreError::MapsApi(MapsApiError::UnknownError).is_retryable());
    assert!(!CoreError::MapsApi(MapsApiError::InvalidRequest {
        details: "missing query".to_string()
    })
    .is_retryable());

    // Already exhausted
    let exhausted = CoreError::ServiceUnavailable {
        service: "reddit".to_string(),
        attempts: 3,
        reason: "timeout".to_string(),
    };
    assert!(!exhausted.is_retryable());
}

#[test]
fn test_retry_after() {
    let rate_limit_error =
        CoreError::RedditApi(RedditApiError::RateLimitExceeded { retry_after: 60 });
    assert_eq!(
        rate_limit_error.retry_after(),
        Some(Duration::from_secs(60))
    );
    assert_eq!(
        CoreError::MapsApi(MapsApiError::OverQueryLimit).retry_after(),
        None
    );
}

#[test]
fn test_user_friendly_messages() {
    let reddit_error = CoreError::RedditApi(RedditApiError::InvalidToken);
    let message = reddit_error.user_friendly_message();
    assert!(message.contains("authentication token is invalid"));

    let config_error = CoreError::Config(ConfigError::MissingEnvironmentVariable {
        var_name: "GOOGLE_MAPS_API_KEY".to_string(),
    });
    let message = config_error.user_friendly_message();
    assert!(message.contains("GOOGLE_MAPS_API_KEY"));
}

#[test]
fn test_error_reporter() {
    let reporter = ErrorReporter::new();
    let error = CoreError::RedditApi(RedditApiError::InvalidToken);

    // This test just ensures the methods don't panic
    reporter.report_error(&error);
    reporter.report_warning(&error);
}
