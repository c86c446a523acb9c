//! Optional browser front end over the recommendation pipeline.

pub mod render;

use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Form, Json, Router};
use orchestrator::{Orchestrator, RunOutcome, RunRequest};
use serde::Deserialize;
use serde_json::json;
use std::net::SocketAddr;
use std::sync::Arc;
use tracing::info;
use travelmate_core::{
    AppConfig, CoreError, CoreResult, CredentialStore, ErrorExt, ErrorKind, ErrorReporter,
    TimeFilter, GOOGLE_MAPS_API_KEY_ENV,
};

/// Builds a fresh pipeline for each request.
pub type OrchestratorFactory =
    Arc<dyn Fn(Arc<AppConfig>) -> CoreResult<Orchestrator> + Send + Sync>;

#[derive(Clone)]
pub struct AppState {
    config: Arc<AppConfig>,
    factory: OrchestratorFactory,
}

impl AppState {
    pub fn new(config: Arc<AppConfig>) -> Self {
        Self::with_factory(config, Arc::new(Orchestrator::from_config))
    }

    pub fn with_factory(config: Arc<AppConfig>, factory: OrchestratorFactory) -> Self {
        Self { config, factory }
    }

    async fn recommend(&self, request: CoreResult<RunRequest>) -> CoreResult<RunOutcome> {
        let request = request?;
        let orchestrator = (self.factory)(self.config.clone())?;
        orchestrator.run(&request).await
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendForm {
    pub city: String,
    pub interests: String,
    #[serde(default)]
    pub time_filter: String,
    #[serde(default)]
    pub min_score: String,
}

impl RecommendForm {
    fn to_request(&self) -> CoreResult<RunRequest> {
        let time_filter = match self.time_filter.trim() {
            "" => None,
            raw => Some(raw.parse::<TimeFilter>().map_err(CoreError::validation)?),
        };
        let min_score = match self.min_score.trim() {
            "" => None,
            raw => Some(raw.parse::<i64>().map_err(|_| {
                CoreError::validation(format!("minimum score must be a number, got '{}'", raw))
            })?),
        };
        Ok(RunRequest::new(&self.city, &self.interests)?
            .with_time_filter(time_filter)
            .with_min_score(min_score))
    }
}

#[derive(Debug, Deserialize)]
pub struct RecommendBody {
    pub city: String,
    /// Comma-separated, as on the command line.
    pub interests: String,
    pub time_filter: Option<TimeFilter>,
    pub min_score: Option<i64>,
}

impl RecommendBody {
    fn to_request(&self) -> CoreResult<RunRequest> {
        Ok(RunRequest::new(&self.city, &self.interests)?
            .with_time_filter(self.time_filter)
            .with_min_score(self.min_score))
    }
}

#[derive(Debug, Deserialize)]
pub struct MapsKeyForm {
    pub api_key: String,
}

pub fn status_for(error: &CoreError) -> StatusCode {
    match error.kind() {
        ErrorKind::Validation => StatusCode::BAD_REQUEST,
        ErrorKind::Authentication => StatusCode::UNAUTHORIZED,
        ErrorKind::ServiceUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::ModelUnavailable => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::Internal => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

/// JSON error body for the API routes.
pub struct ApiError(CoreError);

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.0.user_friendly_message(),
            "code": self.0.error_code(),
        }));
        (status_for(&self.0), body).into_response()
    }
}

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .route("/", get(index))
        .route("/health", get(health_check))
        .route("/recommend", post(recommend_page))
        .route("/api/recommendations", post(recommend_json))
        .route("/settings/maps-key", post(set_maps_key))
        .with_state(state)
}

pub async fn serve(state: AppState, addr: SocketAddr) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind(addr).await?;
    info!("Web UI listening on http://{}", listener.local_addr()?);
    axum::serve(listener, create_router(state)).await
}

async fn health_check() -> (StatusCode, Json<serde_json::Value>) {
    (StatusCode::OK, Json(json!({ "status": "healthy" })))
}

async fn index(State(state): State<AppState>) -> Html<String> {
    Html(render::index_page(&state.config))
}

async fn recommend_page(
    State(state): State<AppState>,
    Form(form): Form<RecommendForm>,
) -> Response {
    match state.recommend(form.to_request()).await {
        Ok(outcome) => Html(render::results_page(&outcome)).into_response(),
        Err(e) => {
            ErrorReporter::default().report_warning(&e);
            (status_for(&e), Html(render::error_page(&e))).into_response()
        }
    }
}

async fn recommend_json(
    State(state): State<AppState>,
    Json(body): Json<RecommendBody>,
) -> Result<Json<RunOutcome>, ApiError> {
    state
        .recommend(body.to_request())
        .await
        .map(Json)
        .map_err(|e| {
            ErrorReporter::default().report_warning(&e);
            ApiError(e)
        })
}

async fn set_maps_key(State(state): State<AppState>, Form(form): Form<MapsKeyForm>) -> Response {
    let key = form.api_key.trim();
    let result = if key.is_empty() {
        Err(CoreError::validation("the API key must not be empty"))
    } else {
        CredentialStore::new(&state.config.credentials_file).set(GOOGLE_MAPS_API_KEY_ENV, key)
    };

    match result {
        Ok(()) => Html(render::message_page(
            "Google Maps key saved. It takes effect the next time TravelMate starts.",
        ))
        .into_response(),
        Err(e) => (status_for(&e), Html(render::error_page(&e))).into_response(),
    }
}
