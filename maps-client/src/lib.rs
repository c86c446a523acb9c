pub mod api;
pub mod verifier;

pub use api::{GoogleMapsClient, PlaceDetails, PlaceSummary, PlacesApi, TextSearchRequest};
pub use verifier::{aborts_batch, place_url, PlaceVerifier};
