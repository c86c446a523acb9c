//! Application-only OAuth for Reddit (`client_credentials` grant).

use oauth2::basic::{BasicClient, BasicErrorResponse, BasicTokenResponse};
use oauth2::{
    AuthUrl, ClientId, ClientSecret, HttpRequest, HttpResponse, RequestTokenError, Scope,
    TokenResponse, TokenUrl,
};
use reqwest::Client;
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};
use travelmate_core::{CoreError, CoreResult, RedditApiError};

pub const REDDIT_AUTH_URL: &str = "https://www.reddit.com/api/v1/authorize";
pub const REDDIT_TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";

/// Seconds before expiry at which a token is treated as stale.
const EXPIRY_MARGIN: Duration = Duration::from_secs(60);

#[derive(Clone)]
pub struct RedditOAuth2Config {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditOAuth2Config {
    pub fn new(client_id: String, client_secret: String, user_agent: String) -> Self {
        Self {
            client_id,
            client_secret,
            user_agent,
        }
    }
}

impl std::fmt::Debug for RedditOAuth2Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RedditOAuth2Config")
            .field("client_id", &self.client_id)
            .field("client_secret", &"<redacted>")
            .field("user_agent", &self.user_agent)
            .finish()
    }
}

#[derive(Debug, Clone)]
pub struct RedditToken {
    pub access_token: String,
    pub expires_at: Instant,
}

impl RedditToken {
    pub fn new(access_token: String, expires_in: Duration) -> Self {
        Self {
            access_token,
            expires_at: Instant::now() + expires_in,
        }
    }

    pub fn is_expired(&self) -> bool {
        Instant::now() + EXPIRY_MARGIN >= self.expires_at
    }
}

/// Exchange client id and secret for an app-only bearer token.
pub async fn request_app_token(
    http: &Client,
    config: &RedditOAuth2Config,
    token_url: &str,
) -> CoreResult<RedditToken> {
    let invalid_url = |e: oauth2::url::ParseError| CoreError::Internal {
        message: format!("invalid OAuth endpoint: {}", e),
    };

    let client = BasicClient::new(
        ClientId::new(config.client_id.clone()),
        Some(ClientSecret::new(config.client_secret.clone())),
        AuthUrl::new(REDDIT_AUTH_URL.to_string()).map_err(invalid_url)?,
        Some(TokenUrl::new(token_url.to_string()).map_err(invalid_url)?),
    );

    debug!("Requesting app-only Reddit token");
    let response: BasicTokenResponse = client
        .exchange_client_credentials()
        .add_scope(Scope::new("read".to_string()))
        .request_async(|request| send_token_request(http, &config.user_agent, request))
        .await
        .map_err(map_token_error)?;

    let expires_in = response
        .expires_in()
        .unwrap_or(Duration::from_secs(3600));
    info!("Obtained Reddit access token valid for {}s", expires_in.as_secs());

    Ok(RedditToken::new(
        response.access_token().secret().clone(),
        expires_in,
    ))
}

/// Transport for the token exchange; uses our own client so the
/// User-Agent header and timeout apply to the token call as well.
async fn send_token_request(
    http: &Client,
    user_agent: &str,
    request: HttpRequest,
) -> Result<HttpResponse, CoreError> {
    let response = http
        .request(request.method, request.url.as_str())
        .headers(request.headers)
        .header("User-Agent", user_agent)
        .body(request.body)
        .send()
        .await
        .map_err(|e| {
            if e.is_timeout() {
                CoreError::RedditApi(RedditApiError::RequestTimeout)
            } else {
                CoreError::Network(e)
            }
        })?;

    let status = response.status();
    match status.as_u16() {
        401 | 403 => {
            warn!("Reddit rejected client credentials ({})", status);
            return Err(RedditApiError::AuthenticationFailed {
                reason: "invalid REDDIT_CLIENT_ID or REDDIT_CLIENT_SECRET".to_string(),
            }
            .into());
        }
        429 => return Err(RedditApiError::RateLimitExceeded { retry_after: 60 }.into()),
        code if status.is_server_error() => {
            return Err(RedditApiError::ServerError { status_code: code }.into())
        }
        _ => {}
    }

    let headers = response.headers().clone();
    let body = response.bytes().await.map_err(CoreError::Network)?.to_vec();
    Ok(HttpResponse {
        status_code: status,
        headers,
        body,
    })
}

fn map_token_error(error: RequestTokenError<CoreError, BasicErrorResponse>) -> CoreError {
    match error {
        RequestTokenError::Request(e) => e,
        RequestTokenError::ServerResponse(response) => RedditApiError::AuthenticationFailed {
            reason: response.to_string(),
        }
        .into(),
        RequestTokenError::Parse(e, _) => RedditApiError::InvalidResponse {
            details: format!("unparsable token response: {}", e),
        }
        .into(),
        RequestTokenError::Other(details) => RedditApiError::InvalidResponse { details }.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry() {
        let token = RedditToken::new("abc".to_string(), Duration::from_secs(3600));
        assert!(!token.is_expired());

        // Inside the safety margin counts as expired
        let token = RedditToken::new("abc".to_string(), Duration::from_secs(30));
        assert!(token.is_expired());
    }

    #[test]
    fn test_config_debug_hides_secret() {
        let config = RedditOAuth2Config::new(
            "id".to_string(),
            "very-secret".to_string(),
            "travelmate/0.1".to_string(),
        );
        let rendered = format!("{:?}", config);
        assert!(!rendered.contains("very-secret"));
        assert!(rendered.contains("travelmate/0.1"));
    }

    #[test]
    fn test_server_response_maps_to_authentication() {
        let response = BasicErrorResponse::new(
            oauth2::basic::BasicErrorResponseType::InvalidClient,
            None,
            None,
        );
        let error = map_token_error(RequestTokenError::ServerResponse(response));
        assert!(matches!(
            error,
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. })
        ));
    }

    #[test]
    fn test_transport_error_passes_through() {
        let error = map_token_error(RequestTokenError::Request(CoreError::RedditApi(
            RedditApiError::ServerError { status_code: 503 },
        )));
        assert!(matches!(
            error,
            CoreError::RedditApi(RedditApiError::ServerError { status_code: 503 })
        ));
    }
}
