//! Google Geocoding API reverse geocoder.
//!
//! Queries `GET {endpoint}/maps/api/geocode/json?latlng=LAT,LNG&key=KEY`.
//! Google reports most failures with HTTP 200 and a `status` string, so the
//! body status is checked as well as the HTTP one.

use crate::config::{GeocodeConfig, GeocodeProvider};
use crate::error::GeocodeError;
use crate::http;
use crate::provider::{ensure_valid, ReverseGeocoder};
use crate::providers::first_segment;
use crate::types::{non_empty, Coordinates, ParsedAddress};
use serde::Deserialize;
use url::Url;

/// Google Geocoding API client.
pub struct GoogleGeocoder {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    language: Option<String>,
}

impl GoogleGeocoder {
    /// Create a client for the configured endpoint and key.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Config`] when no API key is configured, or
    /// [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        let api_key = config
            .api_key
            .clone()
            .filter(|k| !k.is_empty())
            .ok_or_else(|| GeocodeError::Config("the Google provider requires api_key".into()))?;
        Ok(Self {
            client: http::build_client(config)?,
            endpoint: config.endpoint().to_owned(),
            api_key,
            language: config.language.clone(),
        })
    }

    fn geocode_url(&self, coordinates: &Coordinates) -> Result<Url, GeocodeError> {
        let mut url = Url::parse(&format!("{}/maps/api/geocode/json", self.endpoint))
            .map_err(|e| GeocodeError::Config(format!("invalid Google endpoint: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair(
                    "latlng",
                    &format!("{},{}", coordinates.latitude, coordinates.longitude),
                )
                .append_pair("key", &self.api_key);
            if let Some(lang) = &self.language {
                query.append_pair("language", lang);
            }
        }
        Ok(url)
    }
}

impl ReverseGeocoder for GoogleGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<ParsedAddress, GeocodeError> {
        ensure_valid(&coordinates)?;
        tracing::trace!(%coordinates, "Google reverse lookup");

        let url = self.geocode_url(&coordinates)?;
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| GeocodeError::from_transport("Google", &e))?;

        let body = http::read_success_body("Google", response).await?;
        parse_google_response(&body, &coordinates)
    }

    fn provider(&self) -> GeocodeProvider {
        GeocodeProvider::Google
    }
}

#[derive(Debug, Deserialize)]
struct GoogleResponse {
    status: String,
    #[serde(default)]
    error_message: Option<String>,
    #[serde(default)]
    results: Vec<GoogleResult>,
}

#[derive(Debug, Deserialize)]
struct GoogleResult {
    #[serde(default)]
    formatted_address: Option<String>,
    #[serde(default)]
    address_components: Vec<GoogleComponent>,
}

#[derive(Debug, Deserialize)]
struct GoogleComponent {
    long_name: String,
    short_name: String,
    #[serde(default)]
    types: Vec<String>,
}

impl GoogleResult {
    fn component(&self, kind: &str) -> Option<&GoogleComponent> {
        self.address_components
            .iter()
            .find(|c| c.types.iter().any(|t| t == kind))
    }

    fn long(&self, kind: &str) -> Option<String> {
        non_empty(self.component(kind).map(|c| c.long_name.as_str()))
    }

    fn short(&self, kind: &str) -> Option<String> {
        non_empty(self.component(kind).map(|c| c.short_name.as_str()))
    }
}

/// Decode a Google Geocoding API response, using the first (most precise) result.
///
/// Field mapping:
/// - line one: `route`, else the first segment of `formatted_address`
/// - line two: `street_number`, `premise`, else `point_of_interest`
/// - city: `locality`, `postal_town`, else `administrative_area_level_2`
/// - region: `administrative_area_level_1`
pub fn parse_google_response(
    body: &str,
    coordinates: &Coordinates,
) -> Result<ParsedAddress, GeocodeError> {
    let response: GoogleResponse = serde_json::from_str(body)
        .map_err(|e| GeocodeError::Parse(format!("Google response: {e}")))?;

    match response.status.as_str() {
        "OK" => {}
        "ZERO_RESULTS" => return Err(GeocodeError::NoResults(coordinates.to_string())),
        other => {
            let detail = response
                .error_message
                .map(|m| format!("{other}: {m}"))
                .unwrap_or_else(|| other.to_owned());
            return Err(GeocodeError::Rejected(detail));
        }
    }

    let Some(result) = response.results.first() else {
        return Err(GeocodeError::NoResults(coordinates.to_string()));
    };

    let postal_code = result.long("postal_code");
    Ok(ParsedAddress {
        country: result.long("country"),
        address_line_one: result
            .long("route")
            .or_else(|| first_segment(result.formatted_address.as_deref())),
        address_line_two: result
            .long("street_number")
            .or_else(|| result.long("premise"))
            .or_else(|| result.long("point_of_interest")),
        city: result
            .long("locality")
            .or_else(|| result.long("postal_town"))
            .or_else(|| result.long("administrative_area_level_2")),
        region: result.long("administrative_area_level_1"),
        country_code: result.short("country").map(|c| c.to_uppercase()),
        zip_code: postal_code.clone(),
        postal_code,
    })
}
