use async_trait::async_trait;
use reqwest::Client;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, error, warn};
use travelmate_core::{
    AppConfig, ConfigError, CoreError, CoreResult, LatLng, MapsApiError, RetryConfig,
    RetryExecutor, GOOGLE_MAPS_API_KEY_ENV,
};

pub const MAPS_API_BASE: &str = "https://maps.googleapis.com/maps/api";

/// Result language, so returned names compare the same across locales.
pub const RESULT_LANGUAGE: &str = "en";

/// Fields requested from the details endpoint.
pub const DETAIL_FIELDS: &str = "name,formatted_address,url,website,rating,\
formatted_phone_number,opening_hours,business_status,geometry,types";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Geometry {
    pub location: LatLng,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub open_now: Option<bool>,
}

/// One text search hit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlaceSummary {
    pub place_id: String,
    pub name: String,
    pub formatted_address: Option<String>,
    pub rating: Option<f64>,
    pub business_status: Option<String>,
    pub geometry: Option<Geometry>,
    pub opening_hours: Option<OpeningHours>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PlaceDetails {
    #[serde(default)]
    pub place_id: String,
    pub name: String,
    pub formatted_address: Option<String>,
    pub url: Option<String>,
    pub website: Option<String>,
    pub rating: Option<f64>,
    pub formatted_phone_number: Option<String>,
    pub opening_hours: Option<OpeningHours>,
    pub business_status: Option<String>,
    pub geometry: Option<Geometry>,
    #[serde(default)]
    pub types: Vec<String>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct TextSearchRequest {
    pub query: String,
    /// Bias results towards this point.
    pub location: Option<LatLng>,
    pub radius_m: u32,
    /// Google place type filter, e.g. `restaurant`.
    pub place_type: Option<String>,
}

/// The three maps endpoints the verifier needs.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait PlacesApi: Send + Sync {
    async fn text_search(&self, request: &TextSearchRequest) -> CoreResult<Vec<PlaceSummary>>;

    async fn details(&self, place_id: &str) -> CoreResult<PlaceDetails>;

    /// Coordinates of an address, `None` when nothing matches.
    async fn geocode(&self, address: &str) -> CoreResult<Option<LatLng>>;
}

#[derive(Debug, Deserialize)]
struct GeocodeResult {
    geometry: Geometry,
}

#[derive(Clone)]
pub struct GoogleMapsClient {
    http_client: Client,
    api_key: String,
    base_url: String,
    retry: RetryExecutor,
}

impl std::fmt::Debug for GoogleMapsClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GoogleMapsClient")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .finish()
    }
}

impl GoogleMapsClient {
    pub fn new(api_key: &str, timeout: Duration, retry: RetryConfig) -> CoreResult<Self> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(CoreError::authentication("maps", "the maps API key is empty"));
        }

        let http_client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            http_client,
            api_key: api_key.to_string(),
            base_url: MAPS_API_BASE.to_string(),
            retry: RetryExecutor::new(retry),
        })
    }

    pub fn from_config(config: &AppConfig) -> CoreResult<Self> {
        let api_key = config.credentials.google_maps_api_key.as_deref().ok_or_else(|| {
            ConfigError::MissingEnvironmentVariable {
                var_name: GOOGLE_MAPS_API_KEY_ENV.to_string(),
            }
        })?;
        Self::new(api_key, config.http_timeout(), config.retry.clone())
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    /// GET `endpoint` with retries; returns the body once its status is usable.
    async fn call(&self, endpoint: &str, params: &[(&str, String)]) -> CoreResult<Value> {
        self.retry
            .execute("maps", endpoint, || async move {
                self.call_once(endpoint, params).await
            })
            .await
    }

    async fn call_once(&self, endpoint: &str, params: &[(&str, String)]) -> CoreResult<Value> {
        let url = format!("{}{}", self.base_url, endpoint);
        debug!("Making Maps API request: GET {}", endpoint);

        let response = self
            .http_client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await
            .map_err(|e| {
                error!("Network error for {}: {}", endpoint, e);
                if e.is_timeout() {
                    CoreError::MapsApi(MapsApiError::RequestTimeout)
                } else {
                    CoreError::Network(e)
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            warn!("Maps request failed with status: {} for {}", status, endpoint);
            let error = match status.as_u16() {
                401 | 403 => MapsApiError::RequestDenied {
                    message: format!("HTTP {}", status),
                },
                code if status.is_server_error() => MapsApiError::ServerError { status_code: code },
                code => MapsApiError::InvalidResponse {
                    details: format!("unexpected status {} for {}", code, endpoint),
                },
            };
            return Err(error.into());
        }

        let body: Value = response.json().await.map_err(|e| MapsApiError::InvalidResponse {
            details: format!("unparsable body from {}: {}", endpoint, e),
        })?;
        check_status(&body, endpoint)?;
        Ok(body)
    }
}

/// Map the `status` field of a maps response to an error.
pub fn check_status(body: &Value, context: &str) -> Result<(), MapsApiError> {
    let status = body.get("status").and_then(Value::as_str).unwrap_or("");
    let message = body
        .get("error_message")
        .and_then(Value::as_str)
        .unwrap_or_default()
        .to_string();

    match status {
        "OK" | "ZERO_RESULTS" => Ok(()),
        "REQUEST_DENIED" => Err(MapsApiError::RequestDenied { message }),
        "OVER_QUERY_LIMIT" | "OVER_DAILY_LIMIT" => Err(MapsApiError::OverQueryLimit),
        "INVALID_REQUEST" => Err(MapsApiError::InvalidRequest {
            details: format!("{} {}", context, message).trim().to_string(),
        }),
        "NOT_FOUND" => Err(MapsApiError::NotFound {
            place_id: context.to_string(),
        }),
        "UNKNOWN_ERROR" => Err(MapsApiError::UnknownError),
        other => Err(MapsApiError::InvalidResponse {
            details: format!("unexpected status '{}' from {}", other, context),
        }),
    }
}

fn field<T: DeserializeOwned>(body: &mut Value, name: &str) -> Result<Option<T>, MapsApiError> {
    match body.get_mut(name).map(Value::take) {
        None | Some(Value::Null) => Ok(None),
        Some(value) => serde_json::from_value(value)
            .map(Some)
            .map_err(|e| MapsApiError::InvalidResponse {
                details: format!("malformed '{}': {}", name, e),
            }),
    }
}

fn text_search_params(request: &TextSearchRequest) -> Vec<(&'static str, String)> {
    let mut params = vec![
        ("query", request.query.clone()),
        ("language", RESULT_LANGUAGE.to_string()),
    ];
    if let Some(location) = request.location {
        params.push(("location", format!("{},{}", location.lat, location.lng)));
        params.push(("radius", request.radius_m.to_string()));
    }
    if let Some(place_type) = &request.place_type {
        params.push(("type", place_type.clone()));
    }
    params
}

#[async_trait]
impl PlacesApi for GoogleMapsClient {
    async fn text_search(&self, request: &TextSearchRequest) -> CoreResult<Vec<PlaceSummary>> {
        let params = text_search_params(request);
        let mut body = self.call("/place/textsearch/json", &params).await?;
        let results: Vec<PlaceSummary> = field(&mut body, "results")?.unwrap_or_default();
        debug!("Text search '{}' returned {} results", request.query, results.len());
        Ok(results)
    }

    async fn details(&self, place_id: &str) -> CoreResult<PlaceDetails> {
        let params = [
            ("place_id", place_id.to_string()),
            ("fields", DETAIL_FIELDS.to_string()),
            ("language", RESULT_LANGUAGE.to_string()),
        ];
        let mut body = self.call("/place/details/json", &params).await?;
        let mut details: PlaceDetails =
            field(&mut body, "result")?.ok_or_else(|| MapsApiError::NotFound {
                place_id: place_id.to_string(),
            })?;
        details.place_id = place_id.to_string();
        Ok(details)
    }

    async fn geocode(&self, address: &str) -> CoreResult<Option<LatLng>> {
        let params = [("address", address.to_string())];
        let mut body = self.call("/geocode/json", &params).await?;
        let results: Vec<GeocodeResult> = field(&mut body, "results")?.unwrap_or_default();
        Ok(results.into_iter().next().map(|r| r.geometry.location))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use travelmate_core::{Credentials, ErrorExt, ErrorKind};

    #[test]
    fn test_empty_key_is_authentication_error() {
        let error = GoogleMapsClient::new("  ", Duration::from_secs(1), RetryConfig::default())
            .unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Authentication);
    }

    #[test]
    fn test_missing_key_in_config() {
        let error = GoogleMapsClient::from_config(&AppConfig::default()).unwrap_err();
        assert_eq!(error.kind(), ErrorKind::Authentication);

        let config = AppConfig {
            credentials: Credentials {
                google_maps_api_key: Some("key".to_string()),
                ..Credentials::default()
            },
            ..AppConfig::default()
        };
        let client = GoogleMapsClient::from_config(&config).unwrap();
        assert!(!format!("{:?}", client).contains("\"key\""));
    }

    #[test]
    fn test_status_mapping() {
        assert!(check_status(&json!({"status": "OK"}), "q").is_ok());
        assert!(check_status(&json!({"status": "ZERO_RESULTS"}), "q").is_ok());
        assert!(matches!(
            check_status(
                &json!({"status": "REQUEST_DENIED", "error_message": "The provided API key is invalid."}),
                "q"
            ),
            Err(MapsApiError::RequestDenied { message }) if message.contains("invalid")
        ));
        assert!(matches!(
            check_status(&json!({"status": "OVER_QUERY_LIMIT"}), "q"),
            Err(MapsApiError::OverQueryLimit)
        ));
        assert!(matches!(
            check_status(&json!({"status": "INVALID_REQUEST"}), "q"),
            Err(MapsApiError::InvalidRequest { .. })
        ));
        assert!(matches!(
            check_status(&json!({}), "q"),
            Err(MapsApiError::InvalidResponse { .. })
        ));
    }

    #[test]
    fn test_details_deserialization() {
        let mut body = json!({
            "status": "OK",
            "result": {
                "name": "Senso-ji",
                "formatted_address": "2 Chome-3-1 Asakusa, Taito City, Tokyo",
                "url": "https://maps.google.com/?cid=123",
                "rating": 4.5,
                "business_status": "OPERATIONAL",
                "opening_hours": {"open_now": true, "weekday_text": []},
                "geometry": {"location": {"lat": 35.7148, "lng": 139.7967}},
                "types": ["place_of_worship", "tourist_attraction"]
            }
        });
        let details: PlaceDetails = field(&mut body, "result").unwrap().unwrap();
        assert_eq!(details.name, "Senso-ji");
        assert_eq!(details.rating, Some(4.5));
        assert_eq!(details.opening_hours.and_then(|h| h.open_now), Some(true));
        assert_eq!(details.website, None);
        assert_eq!(details.types.len(), 2);
    }

    #[test]
    fn test_text_search_params() {
        let mut request = TextSearchRequest {
            query: "Senso-ji Temple, Tokyo".to_string(),
            location: None,
            radius_m: 5_000,
            place_type: None,
        };
        assert_eq!(
            text_search_params(&request),
            vec![
                ("query", "Senso-ji Temple, Tokyo".to_string()),
                ("language", "en".to_string()),
            ]
        );

        request.location = Some(LatLng::new(35.71, 139.79));
        request.place_type = Some("restaurant".to_string());
        let params = text_search_params(&request);
        assert!(params.contains(&("language", "en".to_string())));
        assert!(params.contains(&("location", "35.71,139.79".to_string())));
        assert!(params.contains(&("radius", "5000".to_string())));
        assert!(params.contains(&("type", "restaurant".to_string())));
    }

    #[test]
    fn test_missing_results_field() {
        let mut body = json!({"status": "ZERO_RESULTS"});
        let results: Option<Vec<PlaceSummary>> = field(&mut body, "results").unwrap();
        assert!(results.is_none());
    }
}
