//! Places REST client: text search, nearby search, and detail fetch.
//!
//! Speaks the Google Places web-service JSON shapes. The base URL is
//! injectable so tests can point it at a local server.

use super::http_retry::send_with_backoff;
use super::{PlaceSearch, ServiceError, ServiceResult};
use crate::geometry::Geo;
use crate::resolve::candidates::{PlaceCandidate, PlaceDetails};
use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api/place";

/// Place search collaborator backed by a Places-style REST API.
pub struct HttpPlaceSearch {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    max_attempts: u32,
}

impl HttpPlaceSearch {
    pub fn new(client: reqwest::Client, api_key: Option<String>) -> Self {
        Self::with_base_url(client, api_key, DEFAULT_BASE_URL.to_string())
    }

    pub fn with_base_url(
        client: reqwest::Client,
        api_key: Option<String>,
        base_url: String,
    ) -> Self {
        Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            base_url,
            max_attempts: 2,
        }
    }

    fn key(&self) -> ServiceResult<&str> {
        self.api_key
            .as_deref()
            .ok_or(ServiceError::MissingCredentials("places"))
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: String,
        context: &'static str,
    ) -> ServiceResult<T> {
        let response = send_with_backoff(&self.client, |c| c.get(&url), self.max_attempts, context)
            .await
            .ok_or_else(|| ServiceError::Unavailable(context, "request failed".to_string()))?;

        response
            .json()
            .await
            .map_err(|e| ServiceError::Malformed(context, e.to_string()))
    }
}

// Wire shapes for the Places JSON responses.

#[derive(Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<WirePlace>,
}

#[derive(Deserialize)]
struct WirePlace {
    name: String,
    place_id: String,
    geometry: WireGeometry,
    #[serde(default)]
    types: Vec<String>,
    rating: Option<f64>,
}

#[derive(Deserialize)]
struct WireGeometry {
    location: WireLatLng,
}

#[derive(Deserialize)]
struct WireLatLng {
    lat: f64,
    lng: f64,
}

#[derive(Deserialize)]
struct DetailsResponse {
    result: Option<WireDetails>,
}

#[derive(Deserialize, Default)]
struct WireDetails {
    formatted_address: Option<String>,
    rating: Option<f64>,
    formatted_phone_number: Option<String>,
    opening_hours: Option<WireHours>,
    editorial_summary: Option<WireSummary>,
    #[serde(default)]
    reviews: Vec<WireReview>,
    url: Option<String>,
}

#[derive(Deserialize)]
struct WireHours {
    #[serde(default)]
    weekday_text: Vec<String>,
}

#[derive(Deserialize)]
struct WireSummary {
    overview: Option<String>,
}

#[derive(Deserialize)]
struct WireReview {
    text: Option<String>,
}

impl From<WirePlace> for PlaceCandidate {
    fn from(w: WirePlace) -> Self {
        PlaceCandidate {
            name: w.name,
            latitude: w.geometry.location.lat,
            longitude: w.geometry.location.lng,
            place_id: w.place_id,
            types: w.types,
            rating: w.rating,
        }
    }
}

impl From<WireDetails> for PlaceDetails {
    fn from(w: WireDetails) -> Self {
        PlaceDetails {
            formatted_address: w.formatted_address,
            rating: w.rating,
            phone: w.formatted_phone_number,
            hours: w.opening_hours.map(|h| h.weekday_text).unwrap_or_default(),
            editorial_summary: w.editorial_summary.and_then(|s| s.overview),
            top_review: w.reviews.into_iter().find_map(|r| r.text),
            url: w.url,
        }
    }
}

#[async_trait]
impl PlaceSearch for HttpPlaceSearch {
    async fn search_text(
        &self,
        query: &str,
        location: &Geo,
        radius_m: f64,
    ) -> ServiceResult<Vec<PlaceCandidate>> {
        let key = self.key()?;
        let url = format!(
            "{}/textsearch/json?query={}&location={},{}&radius={:.0}&key={}",
            self.base_url,
            urlencode(query),
            location.latitude,
            location.longitude,
            radius_m,
            key
        );
        let resp: SearchResponse = self.get_json(url, "place text search").await?;
        debug!(count = resp.results.len(), query, "text search results");
        Ok(resp.results.into_iter().map(Into::into).collect())
    }

    async fn search_nearby(
        &self,
        location: &Geo,
        radius_m: f64,
    ) -> ServiceResult<Vec<PlaceCandidate>> {
        let key = self.key()?;
        let url = format!(
            "{}/nearbysearch/json?location={},{}&radius={:.0}&key={}",
            self.base_url, location.latitude, location.longitude, radius_m, key
        );
        let resp: SearchResponse = self.get_json(url, "place nearby search").await?;
        debug!(count = resp.results.len(), "nearby search results");
        Ok(resp.results.into_iter().map(Into::into).collect())
    }

    async fn fetch_details(&self, place_id: &str) -> ServiceResult<PlaceDetails> {
        let key = self.key()?;
        let url = format!(
            "{}/details/json?place_id={}&key={}",
            self.base_url,
            urlencode(place_id),
            key
        );
        let resp: DetailsResponse = self.get_json(url, "place details").await?;
        Ok(resp.result.unwrap_or_default().into())
    }
}

/// Minimal percent-encoding for query components.
fn urlencode(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for byte in s.bytes() {
        match byte {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'-' | b'_' | b'.' | b'~' => {
                out.push(byte as char)
            }
            b' ' => out.push('+'),
            other => out.push_str(&format!("%{:02X}", other)),
        }
    }
    out
}
