//! Process-wide configuration.
//!
//! Built once at startup from an optional TOML settings file, the
//! credentials file and the environment, then shared read-only.

use crate::credentials::CredentialStore;
use crate::retry::RetryConfig;
use crate::{ConfigError, CoreResult, TimeFilter};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::path::{Path, PathBuf};
use tracing::debug;

pub const DEFAULT_CONFIG_FILE: &str = "travelmate.toml";
pub const CONFIG_PATH_ENV: &str = "TRAVELMATE_CONFIG";

pub const REDDIT_CLIENT_ID_ENV: &str = "REDDIT_CLIENT_ID";
pub const REDDIT_CLIENT_SECRET_ENV: &str = "REDDIT_CLIENT_SECRET";
pub const REDDIT_USER_AGENT_ENV: &str = "REDDIT_USER_AGENT";
pub const GOOGLE_MAPS_API_KEY_ENV: &str = "GOOGLE_MAPS_API_KEY";
pub const MISTRAL_API_KEY_ENV: &str = "MISTRAL_API_KEY";
pub const MISTRAL_MODEL_ENV: &str = "MISTRAL_MODEL";
pub const LOCAL_MODEL_URL_ENV: &str = "LOCAL_MODEL_URL";
pub const LOCAL_MODEL_NAME_ENV: &str = "LOCAL_MODEL_NAME";
pub const DEBUG_ENV: &str = "DEBUG";

/// Secrets and endpoints read from the environment.
#[derive(Clone, Default)]
pub struct Credentials {
    pub reddit_client_id: Option<String>,
    pub reddit_client_secret: Option<String>,
    pub google_maps_api_key: Option<String>,
    pub mistral_api_key: Option<String>,
    pub local_model_url: Option<String>,
}

impl Credentials {
    pub fn from_env() -> Self {
        Self {
            reddit_client_id: env_non_empty(REDDIT_CLIENT_ID_ENV),
            reddit_client_secret: env_non_empty(REDDIT_CLIENT_SECRET_ENV),
            google_maps_api_key: env_non_empty(GOOGLE_MAPS_API_KEY_ENV),
            mistral_api_key: env_non_empty(MISTRAL_API_KEY_ENV),
            local_model_url: env_non_empty(LOCAL_MODEL_URL_ENV),
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn redact(value: &Option<String>) -> &'static str {
            if value.is_some() {
                "<set>"
            } else {
                "<unset>"
            }
        }
        f.debug_struct("Credentials")
            .field("reddit_client_id", &redact(&self.reddit_client_id))
            .field("reddit_client_secret", &redact(&self.reddit_client_secret))
            .field("google_maps_api_key", &redact(&self.google_maps_api_key))
            .field("mistral_api_key", &redact(&self.mistral_api_key))
            .field("local_model_url", &self.local_model_url)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    // Reddit
    pub time_filter: TimeFilter,
    pub min_score: i64,
    pub subreddits: Vec<String>,
    pub post_limit: usize,
    pub comments_per_post: usize,
    pub reddit_user_agent: String,

    // Maps
    pub min_rating: f64,
    pub search_radius_m: u32,
    pub results_per_interest: usize,
    pub min_verified_places: usize,
    pub max_total_places: usize,
    pub place_types: BTreeMap<String, Vec<String>>,

    // Extraction
    pub min_place_name_length: usize,
    pub excluded_words: Vec<String>,

    // Language model
    pub mistral_model: String,
    pub local_model_name: String,
    pub max_snippets: usize,

    // Transport
    pub http_timeout_secs: u64,
    pub retry: RetryConfig,

    pub credentials_file: PathBuf,

    #[serde(skip)]
    pub credentials: Credentials,
    #[serde(skip)]
    pub debug: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            time_filter: TimeFilter::Month,
            min_score: 5,
            subreddits: vec!["travel".to_string(), "solotravel".to_string()],
            post_limit: 5,
            comments_per_post: 3,
            reddit_user_agent: format!("travelmate/{}", env!("CARGO_PKG_VERSION")),

            min_rating: 4.0,
            search_radius_m: 5_000,
            results_per_interest: 5,
            min_verified_places: 10,
            max_total_places: 10,
            place_types: default_place_types(),

            min_place_name_length: 3,
            excluded_words: [
                "I", "A", "An", "The", "This", "That", "My", "We", "You", "If", "But", "And",
                "Just", "Also",
            ]
            .iter()
            .map(|w| w.to_string())
            .collect(),

            mistral_model: "mistral-large-latest".to_string(),
            local_model_name: "mistral:7b-instruct".to_string(),
            max_snippets: 12,

            http_timeout_secs: 10,
            retry: RetryConfig::default(),

            credentials_file: PathBuf::from(".env"),

            credentials: Credentials::default(),
            debug: false,
        }
    }
}

fn default_place_types() -> BTreeMap<String, Vec<String>> {
    let table: [(&str, &[&str]); 8] = [
        ("food", &["restaurant", "cafe", "bar", "food"]),
        ("culture", &["museum", "art_gallery", "theater", "library"]),
        ("nature", &["park", "garden", "natural_feature"]),
        ("shopping", &["shopping_mall", "market", "store"]),
        ("entertainment", &["amusement_park", "movie_theater", "zoo"]),
        (
            "landmarks",
            &["tourist_attraction", "point_of_interest", "landmark"],
        ),
        ("religious", &["church", "temple", "mosque", "place_of_worship"]),
        ("historical", &["historic_site", "monument", "castle"]),
    ];
    table
        .iter()
        .map(|(category, types)| {
            (
                category.to_string(),
                types.iter().map(|t| t.to_string()).collect(),
            )
        })
        .collect()
}

impl AppConfig {
    /// Load settings, credentials file and environment, in that order.
    ///
    /// An explicit `config_path` (or `TRAVELMATE_CONFIG`) must exist; the
    /// default `travelmate.toml` is optional.
    pub fn load(config_path: Option<&Path>) -> CoreResult<Self> {
        let explicit = config_path
            .map(Path::to_path_buf)
            .or_else(|| env_non_empty(CONFIG_PATH_ENV).map(PathBuf::from));

        let mut config = match explicit {
            Some(path) => Self::from_toml_file(&path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => {
                Self::from_toml_file(Path::new(DEFAULT_CONFIG_FILE))?
            }
            None => Self::default(),
        };

        CredentialStore::new(&config.credentials_file).load_into_env()?;

        config.credentials = Credentials::from_env();
        config.debug = debug_enabled();
        if let Some(agent) = env_non_empty(REDDIT_USER_AGENT_ENV) {
            config.reddit_user_agent = agent;
        }
        if let Some(model) = env_non_empty(MISTRAL_MODEL_ENV) {
            config.mistral_model = model;
        }
        if let Some(model) = env_non_empty(LOCAL_MODEL_NAME_ENV) {
            config.local_model_name = model;
        }

        config.validate()?;
        debug!(?config, "Configuration loaded");
        Ok(config)
    }

    pub fn from_toml_file(path: &Path) -> CoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|_| ConfigError::FileNotFound {
            path: path.display().to_string(),
        })?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> CoreResult<Self> {
        let config: AppConfig = toml::from_str(content).map_err(ConfigError::from)?;
        Ok(config)
    }

    pub fn validate(&self) -> CoreResult<()> {
        fn invalid(field: &str, value: impl ToString) -> ConfigError {
            ConfigError::InvalidValue {
                field: field.to_string(),
                value: value.to_string(),
            }
        }

        if !(0.0..=5.0).contains(&self.min_rating) {
            return Err(invalid("min_rating", self.min_rating).into());
        }
        if self.subreddits.iter().all(|s| s.trim().is_empty()) {
            return Err(invalid("subreddits", "[]").into());
        }
        if self.post_limit == 0 {
            return Err(invalid("post_limit", self.post_limit).into());
        }
        if self.search_radius_m == 0 || self.search_radius_m > 50_000 {
            return Err(invalid("search_radius_m", self.search_radius_m).into());
        }
        if self.max_total_places == 0 {
            return Err(invalid("max_total_places", self.max_total_places).into());
        }
        let counts = [
            ("comments_per_post", self.comments_per_post),
            ("results_per_interest", self.results_per_interest),
            ("max_snippets", self.max_snippets),
        ];
        if let Some((field, value)) = counts.iter().find(|(_, value)| *value == 0) {
            return Err(invalid(field, value).into());
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts", self.retry.max_attempts).into());
        }
        if self.http_timeout_secs == 0 {
            return Err(invalid("http_timeout_secs", self.http_timeout_secs).into());
        }
        Ok(())
    }

    /// First Google place type of a known interest category.
    pub fn place_type_for(&self, interest: &str) -> Option<&str> {
        self.place_types
            .get(&interest.trim().to_lowercase())
            .and_then(|types| types.first())
            .map(String::as_str)
    }

    pub fn http_timeout(&self) -> std::time::Duration {
        std::time::Duration::from_secs(self.http_timeout_secs)
    }
}

fn env_non_empty(name: &str) -> Option<String> {
    std::env::var(name)
        .ok()
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

/// `DEBUG` set to anything but `0`, `false` or `no`.
pub fn debug_enabled() -> bool {
    env_non_empty(DEBUG_ENV)
        .map(|v| !matches!(v.to_ascii_lowercase().as_str(), "0" | "false" | "no"))
        .unwrap_or(false)
}
