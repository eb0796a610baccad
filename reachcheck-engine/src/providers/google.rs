//! Google Places adapter
//!
//! Place details by place id, text search for name/address/coordinate
//! identity hints. Search-based collection resolves the best candidate and
//! issues one follow-up details call.

use chrono::Utc;
use serde::Deserialize;

use reachcheck_common::config::GoogleCredentials;
use reachcheck_common::types::{BusinessIdentity, Candidate, Coordinates, Provider};

use super::{
    best_candidate, ProviderAdapter, ProviderError, RateLimiter, HTTP_TIMEOUT, RATE_LIMIT_MS,
};
use crate::models::RawRecord;

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com/maps/api";
const DETAILS_FIELDS: &str =
    "name,formatted_address,formatted_phone_number,opening_hours,rating,user_ratings_total";

#[derive(Debug, Deserialize)]
struct TextSearchResponse {
    status: String,
    #[serde(default)]
    results: Vec<TextSearchResult>,
}

#[derive(Debug, Deserialize)]
struct TextSearchResult {
    place_id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    formatted_address: String,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: Location,
}

#[derive(Debug, Deserialize)]
struct Location {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct DetailsResponse {
    status: String,
    result: Option<PlaceDetails>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetails {
    name: Option<String>,
    formatted_address: Option<String>,
    formatted_phone_number: Option<String>,
    opening_hours: Option<OpeningHours>,
    rating: Option<f64>,
    user_ratings_total: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct OpeningHours {
    weekday_text: Option<Vec<String>>,
}

/// Google Places API client
pub struct GoogleAdapter {
    http_client: reqwest::Client,
    api_key: String,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl GoogleAdapter {
    pub fn new(credentials: &GoogleCredentials) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            api_key: credentials.api_key.clone(),
            base_url: credentials
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    /// Text search returning selection candidates in the provider's ranking.
    pub async fn search(
        &self,
        query: &str,
        near: Option<Coordinates>,
    ) -> Result<Vec<Candidate>, ProviderError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/place/textsearch/json", self.base_url);
        tracing::debug!(query = %query, "Querying Google text search");

        let mut request = self.http_client.get(&url).query(&[
            ("query", query),
            ("key", self.api_key.as_str()),
            ("language", "ko"),
        ]);
        if let Some(point) = near {
            let location = format!("{},{}", point.lat, point.lng);
            request = request.query(&[("location", location.as_str())]);
        }

        let response = request.send().await?;
        let body: TextSearchResponse = response.json().await.map_err(ProviderError::from)?;
        map_status(&body.status)?;

        Ok(body
            .results
            .into_iter()
            .map(|r| Candidate {
                provider: Provider::Google,
                place_id: Some(r.place_id),
                name: r.name,
                address: r.formatted_address,
                phone: None,
                coordinates: r
                    .geometry
                    .map(|g| Coordinates { lat: g.location.lat, lng: g.location.lng }),
            })
            .collect())
    }

    async fn details(&self, place_id: &str) -> Result<RawRecord, ProviderError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/place/details/json", self.base_url);
        tracing::debug!(place_id = %place_id, "Fetching Google place details");

        let response = self
            .http_client
            .get(&url)
            .query(&[
                ("place_id", place_id),
                ("fields", DETAILS_FIELDS),
                ("key", self.api_key.as_str()),
                ("language", "ko"),
            ])
            .send()
            .await?;

        let payload: serde_json::Value = response.json().await.map_err(ProviderError::from)?;
        let parsed: DetailsResponse = serde_json::from_value(payload.clone())
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        map_status(&parsed.status)?;

        let details = parsed
            .result
            .ok_or_else(|| ProviderError::NotFound(format!("place_id {}", place_id)))?;

        Ok(RawRecord {
            provider: Provider::Google,
            name: details.name,
            address: details.formatted_address,
            phone: details.formatted_phone_number,
            opening_hours: details.opening_hours.and_then(|h| h.weekday_text),
            rating: details.rating,
            review_count: details.user_ratings_total,
            fetched_at: Utc::now(),
            payload,
        })
    }
}

/// Map Google's in-body status codes onto the adapter error taxonomy.
fn map_status(status: &str) -> Result<(), ProviderError> {
    match status {
        "OK" => Ok(()),
        "ZERO_RESULTS" => Err(ProviderError::NotFound("zero results".into())),
        "OVER_QUERY_LIMIT" => Err(ProviderError::RateLimited),
        "REQUEST_DENIED" => Err(ProviderError::InvalidCredentials),
        other => Err(ProviderError::Network(format!("Google status: {}", other))),
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for GoogleAdapter {
    fn provider(&self) -> Provider {
        Provider::Google
    }

    async fn collect(&self, identity: &BusinessIdentity) -> Result<RawRecord, ProviderError> {
        // A Google place id goes straight to details; everything else is
        // resolved through text search first.
        if let BusinessIdentity::ByPlaceId { provider: Provider::Google, place_id, .. } = identity
        {
            return self.details(place_id).await;
        }

        let name = identity
            .name_hint()
            .ok_or_else(|| ProviderError::NotFound("no name hint to search with".into()))?;
        let query = match identity {
            BusinessIdentity::ByNameAddress { name, address: Some(address) } => {
                format!("{} {}", name, address)
            }
            _ => name.to_string(),
        };

        let candidates = self.search(&query, identity.coordinates()).await?;
        let best = best_candidate(name, candidates)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;
        let place_id = best
            .place_id
            .ok_or_else(|| ProviderError::Parse("search result without place id".into()))?;
        self.details(&place_id).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_details_response() {
        let json = serde_json::json!({
            "status": "OK",
            "result": {
                "name": "스타벅스 강남점",
                "formatted_address": "대한민국 서울특별시 강남구 테헤란로 101",
                "formatted_phone_number": "02-1234-5678",
                "opening_hours": {
                    "open_now": true,
                    "weekday_text": ["월요일: 09:00~22:00"]
                },
                "rating": 4.4,
                "user_ratings_total": 1234
            }
        });
        let parsed: DetailsResponse = serde_json::from_value(json).unwrap();
        let details = parsed.result.unwrap();
        assert_eq!(details.name.as_deref(), Some("스타벅스 강남점"));
        assert_eq!(details.opening_hours.unwrap().weekday_text.unwrap().len(), 1);
        assert_eq!(details.user_ratings_total, Some(1234));
    }

    #[test]
    fn parses_text_search_response() {
        let json = serde_json::json!({
            "status": "OK",
            "results": [{
                "place_id": "ChIJabc",
                "name": "한신포차",
                "formatted_address": "서울 영등포구 영등포로 143",
                "geometry": { "location": { "lat": 37.52, "lng": 126.90 } }
            }]
        });
        let parsed: TextSearchResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.results.len(), 1);
        assert_eq!(parsed.results[0].place_id, "ChIJabc");
    }

    #[test]
    fn status_maps_to_error_taxonomy() {
        assert!(map_status("OK").is_ok());
        assert!(matches!(map_status("ZERO_RESULTS"), Err(ProviderError::NotFound(_))));
        assert!(matches!(map_status("OVER_QUERY_LIMIT"), Err(ProviderError::RateLimited)));
        assert!(matches!(map_status("REQUEST_DENIED"), Err(ProviderError::InvalidCredentials)));
    }
}
