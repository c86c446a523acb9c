//! Turning candidate names into verified places.

use crate::api::{PlaceDetails, PlaceSummary, PlacesApi, TextSearchRequest};
use std::sync::Arc;
use tracing::{debug, info, warn};
use travelmate_core::{
    AppConfig, Candidate, CoreError, CoreResult, ErrorExt, ErrorKind, LatLng, PlaceSource,
    VerifiedPlace,
};

pub const OPERATIONAL: &str = "OPERATIONAL";

/// Errors after which every further maps call would fail the same way.
pub fn aborts_batch(error: &CoreError) -> bool {
    matches!(
        error.kind(),
        ErrorKind::Authentication | ErrorKind::ServiceUnavailable
    )
}

pub fn place_url(place_id: &str) -> String {
    format!("https://www.google.com/maps/place/?q=place_id:{}", place_id)
}

pub struct PlaceVerifier {
    api: Arc<dyn PlacesApi>,
    config: Arc<AppConfig>,
}

impl PlaceVerifier {
    pub fn new(api: Arc<dyn PlacesApi>, config: Arc<AppConfig>) -> Self {
        Self { api, config }
    }

    /// Geocode the city once per run. Lookup failures only disable the radius check.
    pub async fn city_center(&self, city: &str) -> CoreResult<Option<LatLng>> {
        match self.api.geocode(city).await {
            Ok(Some(center)) => {
                debug!("Resolved {} to {},{}", city, center.lat, center.lng);
                Ok(Some(center))
            }
            Ok(None) => {
                warn!("Could not geocode {}, radius check disabled", city);
                Ok(None)
            }
            Err(e) if aborts_batch(&e) => Err(e),
            Err(e) => {
                warn!("Geocoding {} failed, radius check disabled: {}", city, e);
                Ok(None)
            }
        }
    }

    fn within_radius(&self, center: Option<LatLng>, location: Option<LatLng>) -> bool {
        match (center, location) {
            (Some(center), Some(location)) => {
                center.distance_m(&location) <= f64::from(self.config.search_radius_m)
            }
            // Unknown centre: radius check skipped
            (None, _) => true,
            (Some(_), None) => false,
        }
    }

    fn passes(
        &self,
        name: &str,
        business_status: Option<&str>,
        rating: Option<f64>,
        center: Option<LatLng>,
        location: Option<LatLng>,
    ) -> bool {
        if business_status != Some(OPERATIONAL) {
            debug!("Rejected {}: status {:?}", name, business_status);
            return false;
        }
        match rating {
            Some(r) if r >= self.config.min_rating => {}
            _ => {
                debug!("Rejected {}: rating {:?}", name, rating);
                return false;
            }
        }
        if !self.within_radius(center, location) {
            debug!("Rejected {}: outside {} m", name, self.config.search_radius_m);
            return false;
        }
        true
    }

    /// Look up one candidate. At most one place comes back per candidate.
    pub async fn verify(
        &self,
        candidate: &Candidate,
        city: &str,
        center: Option<LatLng>,
    ) -> CoreResult<Option<VerifiedPlace>> {
        let request = TextSearchRequest {
            query: format!("{}, {}", candidate.name, city),
            location: center,
            radius_m: self.config.search_radius_m,
            place_type: None,
        };
        let Some(first) = self.api.text_search(&request).await?.into_iter().next() else {
            debug!("No maps match for '{}'", candidate.name);
            return Ok(None);
        };

        let details = self.api.details(&first.place_id).await?;
        let location = details.geometry.as_ref().map(|g| g.location);
        if !self.passes(
            &details.name,
            details.business_status.as_deref(),
            details.rating,
            center,
            location,
        ) {
            return Ok(None);
        }

        Ok(Some(from_details(details, location, PlaceSource::Reddit)))
    }

    /// Verify candidates one after another. Per-candidate failures count as
    /// "not verified"; authentication and availability failures stop the batch.
    pub async fn verify_all(
        &self,
        candidates: &[Candidate],
        city: &str,
        center: Option<LatLng>,
    ) -> CoreResult<Vec<(Candidate, VerifiedPlace)>> {
        let mut verified = Vec::new();
        for candidate in candidates {
            match self.verify(candidate, city, center).await {
                Ok(Some(place)) => {
                    debug!("Verified '{}' as {}", candidate.name, place.name);
                    verified.push((candidate.clone(), place));
                }
                Ok(None) => {}
                Err(e) if aborts_batch(&e) => return Err(e),
                Err(e) => {
                    warn!("Lookup for '{}' failed: {}", candidate.name, e);
                }
            }
        }
        info!(
            "Verified {} of {} candidates in {}",
            verified.len(),
            candidates.len(),
            city
        );
        Ok(verified)
    }

    /// Maps-only search for one interest, independent of any discussion.
    pub async fn search_by_interest(
        &self,
        interest: &str,
        city: &str,
        center: Option<LatLng>,
    ) -> CoreResult<Vec<VerifiedPlace>> {
        let place_type = self.config.place_type_for(interest).map(str::to_string);
        if place_type.is_none() {
            debug!("'{}' is not a known category, using plain text search", interest);
        }
        let request = TextSearchRequest {
            query: format!("{} in {}", interest.trim(), city),
            location: center,
            radius_m: self.config.search_radius_m,
            place_type,
        };

        let places: Vec<VerifiedPlace> = self
            .api
            .text_search(&request)
            .await?
            .into_iter()
            .filter(|summary| {
                self.passes(
                    &summary.name,
                    summary.business_status.as_deref(),
                    summary.rating,
                    center,
                    summary.geometry.as_ref().map(|g| g.location),
                )
            })
            .take(self.config.results_per_interest)
            .map(from_summary)
            .collect();

        info!(
            "Top-up search '{}' found {} places",
            request.query,
            places.len()
        );
        Ok(places)
    }
}

fn from_details(details: PlaceDetails, location: Option<LatLng>, source: PlaceSource) -> VerifiedPlace {
    VerifiedPlace {
        maps_url: details
            .url
            .unwrap_or_else(|| place_url(&details.place_id)),
        place_id: details.place_id,
        name: details.name,
        address: details.formatted_address.unwrap_or_default(),
        rating: details.rating.unwrap_or_default(),
        location: location.unwrap_or(LatLng::new(0.0, 0.0)),
        is_open: true,
        open_now: details.opening_hours.and_then(|h| h.open_now),
        website: details.website,
        phone: details.formatted_phone_number,
        place_type: details.types.into_iter().next(),
        source,
        mentions: Vec::new(),
    }
}

fn from_summary(summary: PlaceSummary) -> VerifiedPlace {
    VerifiedPlace {
        maps_url: place_url(&summary.place_id),
        place_id: summary.place_id,
        name: summary.name,
        address: summary.formatted_address.unwrap_or_default(),
        rating: summary.rating.unwrap_or_default(),
        location: summary
            .geometry
            .map(|g| g.location)
            .unwrap_or(LatLng::new(0.0, 0.0)),
        is_open: true,
        open_now: summary.opening_hours.and_then(|h| h.open_now),
        website: None,
        phone: None,
        place_type: summary.types.into_iter().next(),
        source: PlaceSource::Maps,
        mentions: Vec::new(),
    }
}
