use chrono::DateTime;
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::time::Duration;
use tracing::{debug, error, info, warn};
use travelmate_core::{
    CoreError, CoreResult, PostKind, RedditApiError, RedditPost, RetryConfig, RetryExecutor,
    TimeFilter,
};

pub const REDDIT_API_BASE: &str = "https://oauth.reddit.com";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListing<T> {
    pub kind: String,
    pub data: RedditListingData<T>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingData<T> {
    pub children: Vec<RedditListingChild<T>>,
    pub after: Option<String>,
    pub before: Option<String>,
    pub dist: Option<u32>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditListingChild<T> {
    pub kind: String,
    pub data: T,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditPostData {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    pub subreddit: String,
    pub permalink: String,
    pub created_utc: f64,
    pub score: i64,
    #[serde(default)]
    pub num_comments: u32,
    #[serde(default)]
    pub over_18: bool,
    #[serde(default)]
    pub stickied: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedditCommentData {
    pub id: String,
    pub body: String,
    pub score: i64,
    pub created_utc: f64,
    pub subreddit: String,
    pub permalink: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RedditApiClient {
    http_client: Client,
    user_agent: String,
    base_url: String,
    retry: RetryExecutor,
}

impl RedditApiClient {
    pub fn new(user_agent: String, timeout: Duration, retry: RetryConfig) -> CoreResult<Self> {
        let http_client = Client::builder()
            .user_agent(&user_agent)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            http_client,
            user_agent,
            base_url: REDDIT_API_BASE.to_string(),
            retry: RetryExecutor::new(retry),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn http_client(&self) -> &Client {
        &self.http_client
    }

    pub fn user_agent(&self) -> &str {
        &self.user_agent
    }

    pub fn retry(&self) -> &RetryExecutor {
        &self.retry
    }

    /// Issue a single request and map non-success statuses to `RedditApiError`.
    pub async fn make_request(
        &self,
        method: Method,
        endpoint: &str,
        access_token: &str,
        query_params: Option<&[(&str, &str)]>,
    ) -> Result<Response, CoreError> {
        let url = format!("{}{}", self.base_url, endpoint);

        let mut request_builder = self
            .http_client
            .request(method.clone(), &url)
            .bearer_auth(access_token)
            .header("User-Agent", &self.user_agent);

        if let Some(params) = query_params {
            request_builder = request_builder.query(params);
        }

        debug!("Making Reddit API request: {} {}", method, endpoint);
        let response = match request_builder.send().await {
            Ok(response) => response,
            Err(e) => {
                error!("Network error for {} {}: {}", method, endpoint, e);
                if e.is_timeout() {
                    return Err(CoreError::RedditApi(RedditApiError::RequestTimeout));
                }
                return Err(CoreError::Network(e));
            }
        };

        let status = response.status();
        if status.is_success() {
            debug!("Request successful: {} {}", status, endpoint);
            return Ok(response);
        }

        warn!("Request failed with status: {} for {}", status, endpoint);
        let error = match status.as_u16() {
            429 => {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|value| value.to_str().ok())
                    .and_then(|value| value.parse::<u64>().ok())
                    .unwrap_or(60);
                RedditApiError::RateLimitExceeded { retry_after }
            }
            401 => RedditApiError::InvalidToken,
            403 => RedditApiError::Forbidden {
                resource: endpoint.to_string(),
            },
            404 => RedditApiError::SubredditNotFound {
                subreddit: endpoint.to_string(),
            },
            code if status.is_server_error() => RedditApiError::ServerError { status_code: code },
            code => RedditApiError::InvalidResponse {
                details: format!("unexpected status {} for {}", code, endpoint),
            },
        };
        Err(CoreError::RedditApi(error))
    }

    /// Search one subreddit, newest relevance-sorted page only.
    pub async fn search_subreddit(
        &self,
        access_token: &str,
        subreddit: &str,
        query: &str,
        time_filter: TimeFilter,
        limit: u32,
    ) -> Result<RedditListing<RedditPostData>, CoreError> {
        let endpoint = format!("/r/{}/search", subreddit);
        let limit_str = limit.to_string();
        let params = [
            ("q", query),
            ("restrict_sr", "1"),
            ("sort", "relevance"),
            ("t", time_filter.as_str()),
            ("type", "link"),
            ("raw_json", "1"),
            ("limit", limit_str.as_str()),
        ];
        let endpoint = endpoint.as_str();
        let params = &params[..];

        let listing: RedditListing<RedditPostData> = self
            .retry
            .execute("reddit", endpoint, || async move {
                let response = self
                    .make_request(Method::GET, endpoint, access_token, Some(params))
                    .await?;
                response.json().await.map_err(|e| {
                    error!("Failed to parse search results: {}", e);
                    CoreError::RedditApi(RedditApiError::InvalidResponse {
                        details: format!("Failed to parse search results for r/{}", subreddit),
                    })
                })
            })
            .await?;

        info!(
            "Retrieved {} posts from r/{} for '{}'",
            listing.data.children.len(),
            subreddit,
            query
        );
        Ok(listing)
    }

    /// Top-level comments of a post, best first.
    pub async fn get_top_comments(
        &self,
        access_token: &str,
        post_id: &str,
        limit: u32,
    ) -> Result<Vec<RedditCommentData>, CoreError> {
        let endpoint = format!("/comments/{}", post_id);
        let limit_str = limit.to_string();
        let params = [
            ("sort", "top"),
            ("depth", "1"),
            ("raw_json", "1"),
            ("limit", limit_str.as_str()),
        ];
        let endpoint = endpoint.as_str();
        let params = &params[..];

        let listings: Vec<RedditListing<serde_json::Value>> = self
            .retry
            .execute("reddit", endpoint, || async move {
                let response = self
                    .make_request(Method::GET, endpoint, access_token, Some(params))
                    .await?;
                response.json().await.map_err(|e| {
                    error!("Failed to parse comments: {}", e);
                    CoreError::RedditApi(RedditApiError::InvalidResponse {
                        details: format!("Failed to parse comments for {}", post_id),
                    })
                })
            })
            .await?;

        let comments = parse_comment_listing(listings);
        debug!("Retrieved {} comments for {}", comments.len(), post_id);
        Ok(comments)
    }
}

/// The comments endpoint answers with `[post listing, comment listing]`;
/// "more" stubs and anything that is not a `t1` comment are dropped.
pub fn parse_comment_listing(
    listings: Vec<RedditListing<serde_json::Value>>,
) -> Vec<RedditCommentData> {
    listings
        .into_iter()
        .nth(1)
        .map(|listing| {
            listing
                .data
                .children
                .into_iter()
                .filter(|child| child.kind == "t1")
                .filter_map(|child| serde_json::from_value(child.data).ok())
                .collect()
        })
        .unwrap_or_default()
}

fn timestamp(created_utc: f64) -> chrono::DateTime<chrono::Utc> {
    DateTime::from_timestamp(created_utc as i64, 0).unwrap_or_default()
}

impl From<RedditPostData> for RedditPost {
    fn from(post_data: RedditPostData) -> Self {
        let text = if post_data.selftext.trim().is_empty() {
            post_data.title
        } else {
            format!("{}\n{}", post_data.title, post_data.selftext.trim())
        };
        Self {
            id: post_data.id,
            text,
            score: post_data.score,
            created_at: timestamp(post_data.created_utc),
            subreddit: post_data.subreddit,
            kind: PostKind::Submission,
            permalink: Some(format!("https://reddit.com{}", post_data.permalink)),
        }
    }
}

impl From<RedditCommentData> for RedditPost {
    fn from(comment: RedditCommentData) -> Self {
        Self {
            id: comment.id,
            text: comment.body.trim().to_string(),
            score: comment.score,
            created_at: timestamp(comment.created_utc),
            subreddit: comment.subreddit,
            kind: PostKind::Comment,
            permalink: comment
                .permalink
                .map(|p| format!("https://reddit.com{}", p)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_post_data() -> RedditPostData {
        RedditPostData {
            id: "abc123".to_string(),
            title: "Two weeks in Tokyo".to_string(),
            selftext: "You must visit the Senso-ji Temple early.".to_string(),
            subreddit: "travel".to_string(),
            permalink: "/r/travel/comments/abc123/two_weeks_in_tokyo/".to_string(),
            created_utc: 1_700_000_000.0,
            score: 42,
            num_comments: 5,
            over_18: false,
            stickied: false,
        }
    }

    #[test]
    fn test_api_client_creation() {
        let client = RedditApiClient::new(
            "test-user-agent/1.0".to_string(),
            Duration::from_secs(5),
            RetryConfig::default(),
        )
        .unwrap()
        .with_base_url("http://localhost:9999/");
        assert_eq!(client.user_agent(), "test-user-agent/1.0");
        assert_eq!(client.base_url, "http://localhost:9999");
    }

    #[test]
    fn test_reddit_post_conversion() {
        let reddit_post: RedditPost = sample_post_data().into();
        assert_eq!(reddit_post.id, "abc123");
        assert_eq!(
            reddit_post.text,
            "Two weeks in Tokyo\nYou must visit the Senso-ji Temple early."
        );
        assert_eq!(reddit_post.kind, PostKind::Submission);
        assert_eq!(reddit_post.created_at.timestamp(), 1_700_000_000);
        assert_eq!(
            reddit_post.permalink.as_deref(),
            Some("https://reddit.com/r/travel/comments/abc123/two_weeks_in_tokyo/")
        );
    }

    #[test]
    fn test_link_post_uses_title_only() {
        let mut data = sample_post_data();
        data.selftext = "   ".to_string();
        let reddit_post: RedditPost = data.into();
        assert_eq!(reddit_post.text, "Two weeks in Tokyo");
    }

    #[test]
    fn test_search_listing_deserialization() {
        let json = r#"{
            "kind": "Listing",
            "data": {
                "after": null,
                "before": null,
                "dist": 1,
                "children": [{
                    "kind": "t3",
                    "data": {
                        "id": "abc123",
                        "title": "Tokyo food tips",
                        "selftext": "Tsukiji Outer Market for breakfast",
                        "subreddit": "travel",
                        "permalink": "/r/travel/comments/abc123/",
                        "created_utc": 1700000000.0,
                        "score": 17,
                        "num_comments": 3
                    }
                }]
            }
        }"#;

        let listing: RedditListing<RedditPostData> = serde_json::from_str(json).unwrap();
        assert_eq!(listing.data.children.len(), 1);
        assert_eq!(listing.data.children[0].data.score, 17);
        assert!(!listing.data.children[0].data.over_18);
    }

    #[test]
    fn test_comment_listing_skips_more_stubs() {
        let json = r#"[
            {"kind": "Listing", "data": {"after": null, "before": null, "dist": 1,
                "children": [{"kind": "t3", "data": {"id": "abc123"}}]}},
            {"kind": "Listing", "data": {"after": null, "before": null, "dist": null,
                "children": [
                    {"kind": "t1", "data": {"id": "c1", "body": "The Meiji Shrine is also amazing!",
                        "score": 12, "created_utc": 1700000100.0, "subreddit": "travel",
                        "permalink": "/r/travel/comments/abc123/_/c1/"}},
                    {"kind": "more", "data": {"count": 4, "children": ["c2", "c3"]}}
                ]}}
        ]"#;

        let listings: Vec<RedditListing<serde_json::Value>> = serde_json::from_str(json).unwrap();
        let comments = parse_comment_listing(listings);
        assert_eq!(comments.len(), 1);
        assert_eq!(comments[0].id, "c1");

        let post: RedditPost = comments[0].clone().into();
        assert_eq!(post.kind, PostKind::Comment);
        assert_eq!(post.score, 12);
    }

    #[test]
    fn test_comment_listing_missing_second_listing() {
        assert!(parse_comment_listing(Vec::new()).is_empty());
    }
}
