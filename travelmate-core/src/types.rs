use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PostKind {
    Submission,
    Comment,
}

/// A post or comment fetched from Reddit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RedditPost {
    pub id: String,
    pub text: String,
    pub score: i64,
    pub created_at: DateTime<Utc>,
    pub subreddit: String,
    pub kind: PostKind,
    pub permalink: Option<String>,
}

/// An unverified place name pulled out of discussion text.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Candidate {
    pub name: String,
    pub source_post_id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct LatLng {
    pub lat: f64,
    pub lng: f64,
}

impl LatLng {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance in meters.
    pub fn distance_m(&self, other: &LatLng) -> f64 {
        const EARTH_RADIUS_M: f64 = 6_371_000.0;
        let (lat1, lat2) = (self.lat.to_radians(), other.lat.to_radians());
        let dlat = (other.lat - self.lat).to_radians();
        let dlng = (other.lng - self.lng).to_radians();
        let a = (dlat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (dlng / 2.0).sin().powi(2);
        2.0 * EARTH_RADIUS_M * a.sqrt().asin()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlaceSource {
    /// Verified from a candidate found in Reddit discussions
    Reddit,
    /// Added by the maps-only top-up search
    Maps,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct VerifiedPlace {
    pub place_id: String,
    pub name: String,
    pub address: String,
    pub rating: f64,
    pub location: LatLng,
    /// Business status is operational at verification time.
    pub is_open: bool,
    /// Open at this moment, when the service reports opening hours.
    pub open_now: Option<bool>,
    pub maps_url: String,
    pub website: Option<String>,
    pub phone: Option<String>,
    pub place_type: Option<String>,
    pub source: PlaceSource,
    pub mentions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub city: String,
    pub interests: Vec<String>,
    pub verified_places: Vec<VerifiedPlace>,
    pub generated_text: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PipelineStats {
    pub posts_fetched: usize,
    pub candidates_extracted: usize,
    pub verified_from_reddit: usize,
    pub added_by_top_up: usize,
    pub demo_mode: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TimeFilter {
    Week,
    #[default]
    Month,
    Year,
    All,
}

impl TimeFilter {
    pub fn as_str(&self) -> &'static str {
        match self {
            TimeFilter::Week => "week",
            TimeFilter::Month => "month",
            TimeFilter::Year => "year",
            TimeFilter::All => "all",
        }
    }

    /// Oldest acceptable creation time, or `None` for no bound.
    pub fn cutoff(&self, now: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            TimeFilter::Week => Some(now - Duration::days(7)),
            TimeFilter::Month => Some(now - Duration::days(30)),
            TimeFilter::Year => Some(now - Duration::days(365)),
            TimeFilter::All => None,
        }
    }
}

impl fmt::Display for TimeFilter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TimeFilter {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "week" => Ok(TimeFilter::Week),
            "month" => Ok(TimeFilter::Month),
            "year" => Ok(TimeFilter::Year),
            "all" => Ok(TimeFilter::All),
            other => Err(format!(
                "unknown time filter '{}' (expected week, month, year or all)",
                other
            )),
        }
    }
}
