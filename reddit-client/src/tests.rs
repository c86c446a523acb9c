#[cfg(test)]
mod tests {
    use crate::{PostSource, RedditClient, RedditFetcher, RedditOAuth2Config, SearchQuery};
    use axum::http::StatusCode;
    use axum::routing::{get, post};
    use axum::{Json, Router};
    use chrono::{Duration as ChronoDuration, Utc};
    use futures::TryStreamExt;
    use serde_json::{json, Value};
    use std::time::Duration;
    use travelmate_core::{
        AppConfig, CoreError, ErrorExt, ErrorKind, PostKind, RedditApiError, RedditPost,
        RetryConfig, TimeFilter,
    };

    fn create_test_config() -> RedditOAuth2Config {
        RedditOAuth2Config::new(
            "test_client_id".to_string(),
            "test_client_secret".to_string(),
            "travelmate/0.1 by test_user".to_string(),
        )
    }

    fn fast_retry() -> RetryConfig {
        RetryConfig {
            max_attempts: 3,
            base_delay_ms: 1,
            max_delay_ms: 5,
            jitter_factor: 0.0,
        }
    }

    fn test_query() -> SearchQuery {
        SearchQuery {
            city: "Tokyo".to_string(),
            interests: vec!["temples".to_string()],
            time_filter: TimeFilter::Month,
            min_score: 5,
            subreddits: vec!["private".to_string(), "travel".to_string()],
            post_limit: 5,
            comments_per_post: 3,
        }
    }

    fn post_json(id: &str, title: &str, score: i64, age_days: i64) -> Value {
        let created = (Utc::now() - ChronoDuration::days(age_days)).timestamp();
        json!({
            "kind": "t3",
            "data": {
                "id": id,
                "title": title,
                "selftext": "",
                "subreddit": "travel",
                "permalink": format!("/r/travel/comments/{}/", id),
                "created_utc": created as f64,
                "score": score,
                "num_comments": 2
            }
        })
    }

    async fn token() -> Json<Value> {
        Json(json!({
            "access_token": "stub-token",
            "token_type": "bearer",
            "expires_in": 3600,
            "scope": "read"
        }))
    }

    async fn search() -> Json<Value> {
        Json(json!({
            "kind": "Listing",
            "data": {
                "after": null,
                "before": null,
                "dist": 4,
                "children": [
                    post_json("keep", "Senso-ji Temple in Tokyo at dawn", 50, 3),
                    post_json("old", "Tokyo trip report from years ago", 80, 400),
                    post_json("low", "Tokyo quick question", 1, 2),
                    post_json("elsewhere", "Kyoto temples are better", 70, 1)
                ]
            }
        }))
    }

    async fn comments() -> Json<Value> {
        Json(json!([
            {"kind": "Listing", "data": {"after": null, "before": null, "dist": 1, "children": []}},
            {"kind": "Listing", "data": {"after": null, "before": null, "dist": null, "children": [
                {"kind": "t1", "data": {"id": "c1", "body": "The Meiji Shrine is also amazing!",
                    "score": 12, "created_utc": 1700000000.0, "subreddit": "travel"}},
                {"kind": "t1", "data": {"id": "c2", "body": "agreed!!", "score": 30,
                    "created_utc": 1700000000.0, "subreddit": "travel"}},
                {"kind": "t1", "data": {"id": "c3", "body": "Downvoted opinion about ramen shops",
                    "score": 0, "created_utc": 1700000000.0, "subreddit": "travel"}}
            ]}}
        ]))
    }

    /// Serve `router` on an ephemeral port and return its base URL.
    async fn spawn_stub(router: Router) -> String {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, router).await.unwrap();
        });
        format!("http://{}", addr)
    }

    async fn stub_client(router: Router) -> RedditClient {
        let base = spawn_stub(router).await;
        RedditClient::new(create_test_config(), Duration::from_secs(5), fast_retry())
            .unwrap()
            .with_endpoints(&base, &format!("{}/api/v1/access_token", base))
    }

    #[test]
    fn test_config_creation() {
        let config = create_test_config();
        assert_eq!(config.client_id, "test_client_id");
        assert_eq!(config.client_secret, "test_client_secret");
        assert_eq!(config.user_agent, "travelmate/0.1 by test_user");
    }

    #[test]
    fn test_client_creation() {
        let client = RedditClient::new(create_test_config(), Duration::from_secs(5), fast_retry());
        assert!(client.is_ok());

        let client = client.unwrap();
        assert!(!tokio_test::block_on(client.is_authenticated()));
    }

    #[tokio::test]
    async fn test_token_is_cached() {
        let router = Router::new().route("/api/v1/access_token", post(token));
        let client = stub_client(router).await;

        assert_eq!(client.access_token().await.unwrap(), "stub-token");
        assert!(client.is_authenticated().await);
        assert_eq!(client.access_token().await.unwrap(), "stub-token");
    }

    #[tokio::test]
    async fn test_rejected_credentials_are_authentication_error() {
        let router = Router::new().route(
            "/api/v1/access_token",
            post(|| async { (StatusCode::UNAUTHORIZED, Json(json!({"message": "Unauthorized", "error": 401}))) }),
        );
        let client = stub_client(router).await;

        let error = client.access_token().await.unwrap_err();
        assert!(matches!(
            error,
            CoreError::RedditApi(RedditApiError::AuthenticationFailed { .. })
        ));
        assert_eq!(error.kind(), ErrorKind::Authentication);
    }

    #[tokio::test]
    async fn test_fetch_filters_and_skips_forbidden_subreddit() {
        let router = Router::new()
            .route("/api/v1/access_token", post(token))
            .route("/r/private/search", get(|| async { StatusCode::FORBIDDEN }))
            .route("/r/travel/search", get(search))
            .route("/comments/:id", get(comments));
        let fetcher = RedditFetcher::Live(stub_client(router).await);
        let query = test_query();

        let posts: Vec<RedditPost> = fetcher.fetch(&query).try_collect().await.unwrap();

        let ids: Vec<&str> = posts.iter().map(|p| p.id.as_str()).collect();
        // old, low-score and off-city submissions dropped; short and low-score comments dropped
        assert_eq!(ids, vec!["keep", "c1"]);
        assert_eq!(posts[0].kind, PostKind::Submission);
        assert_eq!(posts[1].kind, PostKind::Comment);
    }

    #[tokio::test]
    async fn test_server_errors_exhaust_retries() {
        let router = Router::new()
            .route("/api/v1/access_token", post(token))
            .route(
                "/r/travel/search",
                get(|| async { StatusCode::SERVICE_UNAVAILABLE }),
            );
        let client = stub_client(router).await;
        let query = SearchQuery {
            subreddits: vec!["travel".to_string()],
            ..test_query()
        };

        let error = client.fetch_subreddit(&query, "travel").await.unwrap_err();
        assert!(matches!(
            error,
            CoreError::ServiceUnavailable { attempts: 3, .. }
        ));
    }

    #[tokio::test]
    async fn test_default_config_search_query() {
        let config = AppConfig::default();
        let query = SearchQuery::new("Tokyo", &["food".to_string()], &config)
            .with_time_filter(TimeFilter::Week)
            .with_min_score(0);
        assert_eq!(query.time_filter, TimeFilter::Week);
        assert_eq!(query.min_score, 0);
        assert_eq!(query.post_limit, config.post_limit);
    }
}
