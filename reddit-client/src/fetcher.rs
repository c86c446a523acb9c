use crate::{DemoDataset, RedditClient, RedditOAuth2Config};
use futures::stream::{self, BoxStream, StreamExt};
use std::collections::VecDeque;
use tracing::{debug, info, warn};
use travelmate_core::{AppConfig, CoreError, CoreResult, RedditApiError, RedditPost, TimeFilter};

/// What to look for and how strictly to filter it.
#[derive(Debug, Clone, PartialEq)]
pub struct SearchQuery {
    pub city: String,
    pub interests: Vec<String>,
    pub time_filter: TimeFilter,
    pub min_score: i64,
    pub subreddits: Vec<String>,
    pub post_limit: usize,
    pub comments_per_post: usize,
}

impl SearchQuery {
    /// Query with the configured defaults for filters and limits.
    pub fn new(city: &str, interests: &[String], config: &AppConfig) -> Self {
        Self {
            city: city.to_string(),
            interests: interests.to_vec(),
            time_filter: config.time_filter,
            min_score: config.min_score,
            subreddits: config
                .subreddits
                .iter()
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect(),
            post_limit: config.post_limit,
            comments_per_post: config.comments_per_post,
        }
    }

    pub fn with_time_filter(mut self, time_filter: TimeFilter) -> Self {
        self.time_filter = time_filter;
        self
    }

    pub fn with_min_score(mut self, min_score: i64) -> Self {
        self.min_score = min_score;
        self
    }

    /// `q` parameter: the city followed by the interests.
    pub fn search_text(&self) -> String {
        std::iter::once(self.city.as_str())
            .chain(self.interests.iter().map(String::as_str))
            .collect::<Vec<_>>()
            .join(" ")
    }
}

/// A source of discussion posts.
///
/// The returned stream is lazy: no request is made until it is polled,
/// and once drained it cannot be replayed.
pub trait PostSource: Send + Sync {
    fn fetch<'a>(&'a self, query: &'a SearchQuery) -> BoxStream<'a, CoreResult<RedditPost>>;

    /// Whether the posts come from the fixed offline dataset.
    fn is_demo(&self) -> bool {
        false
    }
}

pub enum RedditFetcher {
    Live(RedditClient),
    Demo(DemoDataset),
}

impl RedditFetcher {
    /// Live client when both credentials are set, demo data when neither is.
    pub fn from_config(config: &AppConfig) -> CoreResult<Self> {
        let credentials = &config.credentials;
        match (
            &credentials.reddit_client_id,
            &credentials.reddit_client_secret,
        ) {
            (Some(client_id), Some(client_secret)) => {
                let oauth_config = RedditOAuth2Config::new(
                    client_id.clone(),
                    client_secret.clone(),
                    config.reddit_user_agent.clone(),
                );
                let client =
                    RedditClient::new(oauth_config, config.http_timeout(), config.retry.clone())?;
                info!("Using live Reddit API");
                Ok(RedditFetcher::Live(client))
            }
            (None, None) => {
                warn!(
                    "REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET are not set; using demo data \
                     (only Barcelona, Tokyo and New York have posts)"
                );
                Ok(RedditFetcher::Demo(DemoDataset::new()))
            }
            _ => Err(CoreError::authentication(
                "reddit",
                "REDDIT_CLIENT_ID and REDDIT_CLIENT_SECRET must both be set",
            )),
        }
    }
}

impl PostSource for RedditFetcher {
    fn fetch<'a>(&'a self, query: &'a SearchQuery) -> BoxStream<'a, CoreResult<RedditPost>> {
        match self {
            RedditFetcher::Live(client) => live_stream(client, query),
            RedditFetcher::Demo(dataset) => {
                let posts = dataset.posts_for(&query.city, query.min_score);
                debug!("Demo dataset has {} posts for {}", posts.len(), query.city);
                stream::iter(posts.into_iter().map(Ok)).boxed()
            }
        }
    }

    fn is_demo(&self) -> bool {
        matches!(self, RedditFetcher::Demo(_))
    }
}

struct LiveState<'a> {
    client: &'a RedditClient,
    query: &'a SearchQuery,
    pending_subreddits: VecDeque<String>,
    buffer: VecDeque<RedditPost>,
}

fn live_stream<'a>(
    client: &'a RedditClient,
    query: &'a SearchQuery,
) -> BoxStream<'a, CoreResult<RedditPost>> {
    let state = LiveState {
        client,
        query,
        pending_subreddits: query.subreddits.iter().cloned().collect(),
        buffer: VecDeque::new(),
    };
    stream::try_unfold(state, next_live_post).boxed()
}

/// Drain the buffered subreddit, then fetch the next one on demand.
async fn next_live_post(
    mut state: LiveState<'_>,
) -> CoreResult<Option<(RedditPost, LiveState<'_>)>> {
    loop {
        if let Some(post) = state.buffer.pop_front() {
            return Ok(Some((post, state)));
        }
        let Some(subreddit) = state.pending_subreddits.pop_front() else {
            return Ok(None);
        };

        match state.client.fetch_subreddit(state.query, &subreddit).await {
            Ok(posts) => state.buffer.extend(posts),
            Err(CoreError::RedditApi(
                RedditApiError::Forbidden { .. } | RedditApiError::SubredditNotFound { .. },
            )) => {
                warn!("r/{} is private or does not exist, skipping", subreddit);
            }
            Err(e) => return Err(e),
        }
    }
}
