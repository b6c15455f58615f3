//! OpenStreetMap Nominatim reverse geocoder.
//!
//! Queries `GET {endpoint}/reverse?format=jsonv2&lat=..&lon=..&addressdetails=1`.
//! Nominatim answers unknown locations with HTTP 200 and an `error` field,
//! which maps to [`GeocodeError::NoResults`].

use crate::config::{GeocodeConfig, GeocodeProvider};
use crate::error::GeocodeError;
use crate::http;
use crate::provider::{ensure_valid, ReverseGeocoder};
use crate::providers::first_segment;
use crate::types::{non_empty, Coordinates, ParsedAddress};
use serde::Deserialize;
use url::Url;

/// Nominatim `/reverse` client.
pub struct NominatimGeocoder {
    client: reqwest::Client,
    endpoint: String,
    language: Option<String>,
}

impl NominatimGeocoder {
    /// Create a client for the configured endpoint.
    ///
    /// # Errors
    ///
    /// Returns [`GeocodeError::Http`] if the HTTP client cannot be built.
    pub fn new(config: &GeocodeConfig) -> Result<Self, GeocodeError> {
        Ok(Self {
            client: http::build_client(config)?,
            endpoint: config.endpoint().to_owned(),
            language: config.language.clone(),
        })
    }

    fn reverse_url(&self, coordinates: &Coordinates) -> Result<Url, GeocodeError> {
        let mut url = Url::parse(&format!("{}/reverse", self.endpoint))
            .map_err(|e| GeocodeError::Config(format!("invalid Nominatim endpoint: {e}")))?;
        {
            let mut query = url.query_pairs_mut();
            query
                .append_pair("format", "jsonv2")
                .append_pair("lat", &coordinates.latitude.to_string())
                .append_pair("lon", &coordinates.longitude.to_string())
                .append_pair("zoom", "18")
                .append_pair("addressdetails", "1");
            if let Some(lang) = &self.language {
                query.append_pair("accept-language", lang);
            }
        }
        Ok(url)
    }
}

impl ReverseGeocoder for NominatimGeocoder {
    async fn reverse(&self, coordinates: Coordinates) -> Result<ParsedAddress, GeocodeError> {
        ensure_valid(&coordinates)?;
        tracing::trace!(%coordinates, "Nominatim reverse lookup");

        let url = self.reverse_url(&coordinates)?;
        let response = self
            .client
            .get(url)
            .header("Accept", "application/json")
            .send()
            .await
            .map_err(|e| GeocodeError::from_transport("Nominatim", &e))?;

        let body = http::read_success_body("Nominatim", response).await?;
        parse_nominatim_response(&body, &coordinates)
    }

    fn provider(&self) -> GeocodeProvider {
        GeocodeProvider::Nominatim
    }
}

#[derive(Debug, Deserialize)]
struct NominatimResponse {
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    display_name: Option<String>,
    #[serde(default)]
    address: Option<NominatimAddress>,
}

#[derive(Debug, Default, Deserialize)]
struct NominatimAddress {
    house_number: Option<String>,
    road: Option<String>,
    pedestrian: Option<String>,
    footway: Option<String>,
    city: Option<String>,
    town: Option<String>,
    village: Option<String>,
    municipality: Option<String>,
    county: Option<String>,
    state: Option<String>,
    region: Option<String>,
    postcode: Option<String>,
    country: Option<String>,
    country_code: Option<String>,
}

/// Decode a Nominatim `jsonv2` reverse response.
///
/// Field mapping:
/// - line one: `road`, `pedestrian`, `footway`, else the first segment of `display_name`
/// - line two: `house_number`, else the place `name`
/// - city: `city`, `town`, `village`, `municipality`, else `county`
/// - region: `state`, else `region`
pub fn parse_nominatim_response(
    body: &str,
    coordinates: &Coordinates,
) -> Result<ParsedAddress, GeocodeError> {
    let response: NominatimResponse = serde_json::from_str(body)
        .map_err(|e| GeocodeError::Parse(format!("Nominatim response: {e}")))?;

    if response.error.is_some() {
        return Err(GeocodeError::NoResults(coordinates.to_string()));
    }

    let Some(addr) = response.address else {
        return Err(GeocodeError::NoResults(coordinates.to_string()));
    };

    let address_line_one = non_empty(addr.road.as_deref())
        .or_else(|| non_empty(addr.pedestrian.as_deref()))
        .or_else(|| non_empty(addr.footway.as_deref()))
        .or_else(|| first_segment(response.display_name.as_deref()));
    let address_line_two = non_empty(addr.house_number.as_deref())
        .or_else(|| non_empty(response.name.as_deref()));
    let city = non_empty(addr.city.as_deref())
        .or_else(|| non_empty(addr.town.as_deref()))
        .or_else(|| non_empty(addr.village.as_deref()))
        .or_else(|| non_empty(addr.municipality.as_deref()))
        .or_else(|| non_empty(addr.county.as_deref()));
    let region = non_empty(addr.state.as_deref())
        .or_else(|| non_empty(addr.region.as_deref()));
    let postal_code = non_empty(addr.postcode.as_deref());

    Ok(ParsedAddress {
        country: non_empty(addr.country.as_deref()),
        address_line_one,
        address_line_two,
        city,
        region,
        country_code: non_empty(addr.country_code.as_deref())
            .map(|c| c.to_uppercase()),
        zip_code: postal_code.clone(),
        postal_code,
    })
}
