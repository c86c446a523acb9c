pub mod api;
pub mod auth;
pub mod demo;
pub mod fetcher;

#[cfg(test)]
mod tests;

pub use api::RedditApiClient;
pub use auth::{RedditOAuth2Config, RedditToken};
pub use demo::DemoDataset;
pub use fetcher::{PostSource, RedditFetcher, SearchQuery};

use chrono::Utc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};
use travelmate_core::{
    CoreError, CoreResult, PostKind, RedditApiError, RedditPost, RetryConfig,
};

/// Authenticated client for the Reddit search and comments endpoints.
pub struct RedditClient {
    oauth_config: RedditOAuth2Config,
    api: RedditApiClient,
    token_url: String,
    token: Mutex<Option<RedditToken>>,
}

impl RedditClient {
    pub fn new(
        oauth_config: RedditOAuth2Config,
        timeout: Duration,
        retry: RetryConfig,
    ) -> CoreResult<Self> {
        let api = RedditApiClient::new(oauth_config.user_agent.clone(), timeout, retry)?;
        Ok(Self {
            oauth_config,
            api,
            token_url: auth::REDDIT_TOKEN_URL.to_string(),
            token: Mutex::new(None),
        })
    }

    /// Point the client at other hosts, e.g. a local stub server.
    pub fn with_endpoints(mut self, api_base: &str, token_url: &str) -> Self {
        self.api = self.api.with_base_url(api_base);
        self.token_url = token_url.to_string();
        self
    }

    pub fn oauth_config(&self) -> &RedditOAuth2Config {
        &self.oauth_config
    }

    pub async fn is_authenticated(&self) -> bool {
        self.token
            .lock()
            .await
            .as_ref()
            .is_some_and(|token| !token.is_expired())
    }

    /// Cached bearer token, refreshed when expired.
    pub async fn access_token(&self) -> CoreResult<String> {
        let mut guard = self.token.lock().await;
        if let Some(token) = guard.as_ref() {
            if !token.is_expired() {
                return Ok(token.access_token.clone());
            }
            debug!("Reddit token expired, requesting a new one");
        }

        let http = self.api.http_client();
        let config = &self.oauth_config;
        let token_url = self.token_url.as_str();
        let token = self
            .api
            .retry()
            .execute("reddit", "access_token", || {
                auth::request_app_token(http, config, token_url)
            })
            .await?;

        let access_token = token.access_token.clone();
        *guard = Some(token);
        Ok(access_token)
    }

    /// Accepted submissions of one subreddit, each followed by its kept comments.
    pub async fn fetch_subreddit(
        &self,
        query: &SearchQuery,
        subreddit: &str,
    ) -> CoreResult<Vec<RedditPost>> {
        let access_token = self.access_token().await?;
        let listing = match self
            .api
            .search_subreddit(
                &access_token,
                subreddit,
                &query.search_text(),
                query.time_filter,
                (query.post_limit * 2) as u32,
            )
            .await
        {
            Err(CoreError::RedditApi(RedditApiError::InvalidToken)) => {
                self.token.lock().await.take();
                return Err(RedditApiError::AuthenticationFailed {
                    reason: "access token rejected".to_string(),
                }
                .into());
            }
            other => other?,
        };

        let cutoff = query.time_filter.cutoff(Utc::now());
        let city = query.city.to_lowercase();

        let submissions: Vec<RedditPost> = listing
            .data
            .children
            .into_iter()
            .map(|child| child.data)
            .filter(|data| !data.stickied)
            .map(RedditPost::from)
            .filter(|post| post.score >= query.min_score)
            .filter(|post| cutoff.map_or(true, |c| post.created_at >= c))
            .filter(|post| post.text.to_lowercase().contains(&city))
            .take(query.post_limit)
            .collect();

        info!(
            "Accepted {} submissions from r/{} for {}",
            submissions.len(),
            subreddit,
            query.city
        );

        let mut posts = Vec::new();
        for submission in submissions {
            let post_id = submission.id.clone();
            posts.push(submission);
            if query.comments_per_post == 0 {
                continue;
            }
            match self
                .api
                .get_top_comments(&access_token, &post_id, query.comments_per_post as u32)
                .await
            {
                Ok(comments) => posts.extend(
                    comments
                        .into_iter()
                        .map(RedditPost::from)
                        .filter(|c| c.kind == PostKind::Comment)
                        .filter(|c| c.score >= query.min_score && c.text.chars().count() > 15)
                        .take(query.comments_per_post),
                ),
                Err(CoreError::RedditApi(
                    RedditApiError::Forbidden { .. } | RedditApiError::SubredditNotFound { .. },
                )) => {
                    warn!("Comments for {} are not accessible, skipping", post_id);
                }
                Err(e) => return Err(e),
            }
        }

        Ok(posts)
    }
}
