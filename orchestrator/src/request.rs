use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use travelmate_core::{CoreError, CoreResult, TimeFilter};

/// A validated request for one recommendation run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RunRequest {
    pub city: String,
    pub interests: Vec<String>,
    /// Overrides the configured time filter for this run.
    pub time_filter: Option<TimeFilter>,
    /// Overrides the configured minimum score for this run.
    pub min_score: Option<i64>,
}

impl RunRequest {
    /// Validate a city and a comma-separated interest list.
    pub fn new(city: &str, interests: &str) -> CoreResult<Self> {
        let city = city.trim();
        if city.is_empty() {
            return Err(CoreError::validation("city must not be empty"));
        }

        let interests = parse_interests(interests);
        if interests.is_empty() {
            return Err(CoreError::validation(
                "at least one interest is required (comma-separated, e.g. \"food,museums\")",
            ));
        }

        Ok(Self {
            city: city.to_string(),
            interests,
            time_filter: None,
            min_score: None,
        })
    }

    pub fn with_time_filter(mut self, time_filter: Option<TimeFilter>) -> Self {
        self.time_filter = time_filter;
        self
    }

    pub fn with_min_score(mut self, min_score: Option<i64>) -> Self {
        self.min_score = min_score;
        self
    }
}

/// Split on commas, trim, drop empties and case-insensitive duplicates.
pub fn parse_interests(raw: &str) -> Vec<String> {
    let mut seen = HashSet::new();
    raw.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .filter(|item| seen.insert(item.to_lowercase()))
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use travelmate_core::{ErrorExt, ErrorKind};

    #[test]
    fn test_valid_request() {
        let request = RunRequest::new("  Tokyo ", " food, temples ,,Food ").unwrap();
        assert_eq!(request.city, "Tokyo");
        assert_eq!(request.interests, vec!["food", "temples"]);
        assert_eq!(request.time_filter, None);
    }

    #[test]
    fn test_empty_city_rejected() {
        let error = RunRequest::new("   ", "food").unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Validation);
    }

    #[test]
    fn test_empty_interests_rejected() {
        for raw in ["", " , ,", "   "] {
            let error = RunRequest::new("Tokyo", raw).unwrap_err();
            assert_eq!(error.kind(), ErrorKind::Validation, "input {:?}", raw);
        }
    }

    #[test]
    fn test_unknown_category_is_accepted() {
        let request = RunRequest::new("Tokyo", "underground jazz bars").unwrap();
        assert_eq!(request.interests, vec!["underground jazz bars"]);
    }

    #[test]
    fn test_overrides() {
        let request = RunRequest::new("Tokyo", "food")
            .unwrap()
            .with_time_filter(Some(TimeFilter::Week))
            .with_min_score(Some(0));
        assert_eq!(request.time_filter, Some(TimeFilter::Week));
        assert_eq!(request.min_score, Some(0));
    }
}
