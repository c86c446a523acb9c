//! Runs fetch, extraction, verification and generation one stage at a time.

pub mod request;

pub use request::{parse_interests, RunRequest};

use futures::TryStreamExt;
use llm_interface::prompt::truncate;
use llm_interface::{backend_from_config, LlmProvider, RecommendationGenerator};
use maps_client::{aborts_batch, GoogleMapsClient, PlaceVerifier, PlacesApi};
use place_extractor::{extract_candidates, normalize_name, HeuristicExtractor, PlaceExtractor};
use reddit_client::fetcher::{PostSource, RedditFetcher, SearchQuery};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::sync::Arc;
use tracing::{debug, info, warn};
use travelmate_core::{
    AppConfig, Candidate, CoreResult, PipelineStats, PlaceSource, Recommendation, RedditPost,
    VerifiedPlace,
};

/// Reddit quotes attached to one place.
pub const MAX_MENTIONS_PER_PLACE: usize = 2;
/// Longest quote, ellipsis included.
pub const MAX_MENTION_CHARS: usize = 100;
const ELLIPSIS: &str = "...";

/// The result of a successful run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunOutcome {
    pub recommendation: Recommendation,
    pub stats: PipelineStats,
}

pub struct Orchestrator {
    config: Arc<AppConfig>,
    source: Arc<dyn PostSource>,
    extractor: Arc<dyn PlaceExtractor>,
    places: Arc<dyn PlacesApi>,
    llm: Arc<dyn LlmProvider>,
}

impl Orchestrator {
    pub fn new(
        config: Arc<AppConfig>,
        source: Arc<dyn PostSource>,
        extractor: Arc<dyn PlaceExtractor>,
        places: Arc<dyn PlacesApi>,
        llm: Arc<dyn LlmProvider>,
    ) -> Self {
        Self {
            config,
            source,
            extractor,
            places,
            llm,
        }
    }

    /// Wire up the live components. Fails before any network call when a
    /// required credential is missing.
    pub fn from_config(config: Arc<AppConfig>) -> CoreResult<Self> {
        let source = RedditFetcher::from_config(&config)?;
        let extractor = HeuristicExtractor::from_config(&config)?;
        let places = GoogleMapsClient::from_config(&config)?;
        let llm = backend_from_config(&config)?;
        Ok(Self::new(
            config,
            Arc::new(source),
            Arc::new(extractor),
            Arc::new(places),
            llm,
        ))
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub async fn run(&self, request: &RunRequest) -> CoreResult<RunOutcome> {
        let city = request.city.as_str();
        let mut stats = PipelineStats {
            demo_mode: self.source.is_demo(),
            ..PipelineStats::default()
        };
        info!(
            city,
            interests = %request.interests.join(","),
            demo = stats.demo_mode,
            "Starting recommendation run"
        );

        let posts = self.fetch_posts(request).await?;
        stats.posts_fetched = posts.len();

        let candidates = self.extract(city, &posts);
        stats.candidates_extracted = candidates.len();

        let verifier = PlaceVerifier::new(self.places.clone(), self.config.clone());
        let center = verifier.city_center(city).await?;
        let verified = verifier.verify_all(&candidates, city, center).await?;

        let mut seen = HashSet::new();
        let mut reddit_places = merge_verified(verified, &posts, &mut seen);
        stats.verified_from_reddit = reddit_places.len();

        let mut maps_places = Vec::new();
        if reddit_places.len() < self.config.min_verified_places {
            info!(
                "Only {} verified places, topping up from maps search",
                reddit_places.len()
            );
            for interest in &request.interests {
                let found = match verifier.search_by_interest(interest, city, center).await {
                    Ok(found) => found,
                    Err(e) if aborts_batch(&e) => return Err(e),
                    Err(e) => {
                        warn!("Top-up search for '{}' failed: {}", interest, e);
                        continue;
                    }
                };
                for place in found {
                    if seen.insert(place.place_id.clone()) {
                        maps_places.push(place);
                    }
                }
            }
        }
        stats.added_by_top_up = maps_places.len();

        sort_by_rating(&mut reddit_places);
        sort_by_rating(&mut maps_places);
        let mut places = reddit_places;
        places.extend(maps_places);
        places.truncate(self.config.max_total_places);

        let generator = RecommendationGenerator::new(self.llm.clone(), self.config.max_snippets);
        let generated_text = generator
            .generate(city, &request.interests, &places, &posts)
            .await?;

        info!(
            posts = stats.posts_fetched,
            candidates = stats.candidates_extracted,
            verified = stats.verified_from_reddit,
            top_up = stats.added_by_top_up,
            places = places.len(),
            "Recommendation ready"
        );

        Ok(RunOutcome {
            recommendation: Recommendation {
                city: city.to_string(),
                interests: request.interests.clone(),
                verified_places: places,
                generated_text,
            },
            stats,
        })
    }

    async fn fetch_posts(&self, request: &RunRequest) -> CoreResult<Vec<RedditPost>> {
        let mut query = SearchQuery::new(&request.city, &request.interests, &self.config);
        if let Some(time_filter) = request.time_filter {
            query = query.with_time_filter(time_filter);
        }
        if let Some(min_score) = request.min_score {
            query = query.with_min_score(min_score);
        }

        let posts: Vec<RedditPost> = self.source.fetch(&query).try_collect().await?;
        info!("Fetched {} posts and comments", posts.len());
        Ok(posts)
    }

    fn extract(&self, city: &str, posts: &[RedditPost]) -> Vec<Candidate> {
        let city_key = normalize_name(city);
        let candidates: Vec<Candidate> = extract_candidates(self.extractor.as_ref(), posts)
            .into_iter()
            .filter(|candidate| normalize_name(&candidate.name) != city_key)
            .collect();
        info!("Extracted {} candidate places", candidates.len());
        candidates
    }
}

/// Collapse verified candidates onto unique places, collecting mentions
/// from each candidate's source post.
fn merge_verified(
    verified: Vec<(Candidate, VerifiedPlace)>,
    posts: &[RedditPost],
    seen: &mut HashSet<String>,
) -> Vec<VerifiedPlace> {
    let texts: HashMap<&str, &str> = posts
        .iter()
        .map(|post| (post.id.as_str(), post.text.as_str()))
        .collect();

    let mut places: Vec<VerifiedPlace> = Vec::new();
    for (candidate, mut place) in verified {
        let mention = texts
            .get(candidate.source_post_id.as_str())
            .map(|text| mention_snippet(text, &candidate.name));

        if seen.insert(place.place_id.clone()) {
            place.source = PlaceSource::Reddit;
            place.mentions = mention.into_iter().collect();
            places.push(place);
            continue;
        }

        debug!("'{}' resolved to already verified {}", candidate.name, place.name);
        if let Some(existing) = places.iter_mut().find(|p| p.place_id == place.place_id) {
            if let Some(mention) = mention {
                if existing.mentions.len() < MAX_MENTIONS_PER_PLACE
                    && !existing.mentions.contains(&mention)
                {
                    existing.mentions.push(mention);
                }
            }
        }
    }
    places
}

/// The sentence of `text` naming the place, or the start of the text.
fn mention_snippet(text: &str, name: &str) -> String {
    let needle = name.to_lowercase();
    let sentence = text
        .split(['.', '!', '?', '\n'])
        .map(str::trim)
        .find(|sentence| sentence.to_lowercase().contains(&needle))
        .unwrap_or_else(|| text.trim());
    if sentence.chars().count() <= MAX_MENTION_CHARS {
        return sentence.to_string();
    }
    truncate(sentence, MAX_MENTION_CHARS - ELLIPSIS.len())
}

fn sort_by_rating(places: &mut [VerifiedPlace]) {
    places.sort_by(|a, b| b.rating.total_cmp(&a.rating));
}
