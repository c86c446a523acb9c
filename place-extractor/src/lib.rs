//! Candidate place names from free-form discussion text.

pub mod heuristic;

pub use heuristic::HeuristicExtractor;

use std::collections::HashSet;
use tracing::debug;
use travelmate_core::{Candidate, RedditPost};

/// Text to candidate place names. Precision and recall are best-effort;
/// the verifier is responsible for discarding false positives.
pub trait PlaceExtractor: Send + Sync {
    fn extract(&self, text: &str) -> Vec<String>;
}

/// Dedup key: lowercased with runs of whitespace collapsed.
pub fn normalize_name(name: &str) -> String {
    name.split_whitespace()
        .map(str::to_lowercase)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Run `extractor` over every post, keeping the first spelling of each name.
pub fn extract_candidates(extractor: &dyn PlaceExtractor, posts: &[RedditPost]) -> Vec<Candidate> {
    let mut seen = HashSet::new();
    let mut candidates = Vec::new();

    for post in posts {
        for name in extractor.extract(&post.text) {
            if seen.insert(normalize_name(&name)) {
                candidates.push(Candidate {
                    name,
                    source_post_id: post.id.clone(),
                });
            }
        }
    }

    debug!(
        "Extracted {} unique candidates from {} posts",
        candidates.len(),
        posts.len()
    );
    candidates
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use travelmate_core::PostKind;

    struct FixedExtractor(Vec<&'static str>);

    impl PlaceExtractor for FixedExtractor {
        fn extract(&self, _text: &str) -> Vec<String> {
            self.0.iter().map(|s| s.to_string()).collect()
        }
    }

    fn post(id: &str) -> RedditPost {
        RedditPost {
            id: id.to_string(),
            text: String::new(),
            score: 10,
            created_at: Utc::now(),
            subreddit: "travel".to_string(),
            kind: PostKind::Submission,
            permalink: None,
        }
    }

    #[test]
    fn test_normalize_name() {
        assert_eq!(normalize_name("  Meiji   Shrine "), "meiji shrine");
        assert_eq!(normalize_name("CAFÉ Cremat"), "café cremat");
    }

    #[test]
    fn test_empty_posts_yield_no_candidates() {
        let extractor = FixedExtractor(vec!["Senso-ji Temple"]);
        assert!(extract_candidates(&extractor, &[]).is_empty());
    }

    #[test]
    fn test_dedup_keeps_first_spelling_and_source() {
        let extractor = FixedExtractor(vec!["Meiji Shrine", "meiji  shrine", "Golden Gai"]);
        let candidates = extract_candidates(&extractor, &[post("p1"), post("p2")]);

        assert_eq!(candidates.len(), 2);
        assert_eq!(candidates[0].name, "Meiji Shrine");
        assert_eq!(candidates[0].source_post_id, "p1");
        assert_eq!(candidates[1].name, "Golden Gai");
    }
}
