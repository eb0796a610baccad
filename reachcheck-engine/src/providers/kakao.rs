//! Kakao Local Search adapter
//!
//! Keyword search with optional coordinate bias. A Kakao place id in the
//! identity hint is matched against the returned documents, since the local
//! API has no details-by-id endpoint.

use chrono::Utc;
use serde::Deserialize;

use reachcheck_common::config::KakaoCredentials;
use reachcheck_common::types::{BusinessIdentity, Candidate, Coordinates, Provider};

use super::{
    best_candidate, ProviderAdapter, ProviderError, RateLimiter, HTTP_TIMEOUT, RATE_LIMIT_MS,
};
use crate::models::RawRecord;

const DEFAULT_BASE_URL: &str = "https://dapi.kakao.com";
const COLLECT_SIZE: u32 = 5;
const PICKER_SIZE: u32 = 15;

#[derive(Debug, Deserialize)]
struct KeywordSearchResponse {
    #[serde(default)]
    documents: Vec<KakaoDocument>,
}

#[derive(Debug, Clone, Deserialize)]
struct KakaoDocument {
    #[serde(default)]
    id: String,
    #[serde(default)]
    place_name: String,
    #[serde(default)]
    address_name: String,
    #[serde(default)]
    road_address_name: String,
    #[serde(default)]
    phone: String,
    /// Longitude, as a string.
    #[serde(default)]
    x: String,
    /// Latitude, as a string.
    #[serde(default)]
    y: String,
}

impl KakaoDocument {
    fn best_address(&self) -> String {
        if self.road_address_name.is_empty() {
            self.address_name.clone()
        } else {
            self.road_address_name.clone()
        }
    }

    fn coordinates(&self) -> Option<Coordinates> {
        let lat = self.y.parse().ok()?;
        let lng = self.x.parse().ok()?;
        Some(Coordinates { lat, lng })
    }

    fn to_candidate(&self) -> Candidate {
        Candidate {
            provider: Provider::Kakao,
            place_id: Some(self.id.clone()).filter(|id| !id.is_empty()),
            name: self.place_name.clone(),
            address: self.best_address(),
            phone: Some(self.phone.clone()).filter(|p| !p.is_empty()),
            coordinates: self.coordinates(),
        }
    }
}

/// Kakao Local Search client
pub struct KakaoAdapter {
    http_client: reqwest::Client,
    rest_api_key: String,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl KakaoAdapter {
    pub fn new(credentials: &KakaoCredentials) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            rest_api_key: credentials.rest_api_key.clone(),
            base_url: credentials
                .base_url
                .clone()
                .unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
            rate_limiter: RateLimiter::new(RATE_LIMIT_MS),
        })
    }

    async fn search_raw(
        &self,
        query: &str,
        near: Option<Coordinates>,
        size: u32,
    ) -> Result<(serde_json::Value, Vec<KakaoDocument>), ProviderError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v2/local/search/keyword.json", self.base_url);
        tracing::debug!(query = %query, "Querying Kakao keyword search");

        let size = size.to_string();
        let mut request = self
            .http_client
            .get(&url)
            .header("Authorization", format!("KakaoAK {}", self.rest_api_key))
            .query(&[("query", query), ("size", size.as_str())]);
        if let Some(point) = near {
            let x = point.lng.to_string();
            let y = point.lat.to_string();
            request = request.query(&[("x", x.as_str()), ("y", y.as_str())]);
        }

        let response = request.send().await?;
        let status = response.status();
        if status == 401 || status == 403 {
            return Err(ProviderError::InvalidCredentials);
        }
        if status == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("Kakao status: {}", status)));
        }

        let payload: serde_json::Value = response.json().await.map_err(ProviderError::from)?;
        let parsed: KeywordSearchResponse = serde_json::from_value(payload.clone())
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok((payload, parsed.documents))
    }

    /// Search formatted for the candidate picker.
    pub async fn search(&self, query: &str) -> Result<Vec<Candidate>, ProviderError> {
        let (_, documents) = self.search_raw(query, None, PICKER_SIZE).await?;
        Ok(documents.iter().map(KakaoDocument::to_candidate).collect())
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for KakaoAdapter {
    fn provider(&self) -> Provider {
        Provider::Kakao
    }

    async fn collect(&self, identity: &BusinessIdentity) -> Result<RawRecord, ProviderError> {
        let name = identity
            .name_hint()
            .ok_or_else(|| ProviderError::NotFound("no name hint to search with".into()))?;

        let (payload, documents) =
            self.search_raw(name, identity.coordinates(), COLLECT_SIZE).await?;
        if documents.is_empty() {
            return Err(ProviderError::NotFound(name.to_string()));
        }

        // A Kakao place id in the hint pins the exact document.
        let pinned = match identity {
            BusinessIdentity::ByPlaceId { provider: Provider::Kakao, place_id, .. } => {
                documents.iter().find(|d| &d.id == place_id).cloned()
            }
            _ => None,
        };

        let chosen = match pinned {
            Some(document) => document.to_candidate(),
            None => {
                let candidates = documents.iter().map(KakaoDocument::to_candidate).collect();
                best_candidate(name, candidates)
                    .ok_or_else(|| ProviderError::NotFound(name.to_string()))?
            }
        };

        Ok(RawRecord {
            provider: Provider::Kakao,
            name: Some(chosen.name).filter(|n| !n.is_empty()),
            address: Some(chosen.address).filter(|a| !a.is_empty()),
            phone: chosen.phone,
            opening_hours: None,
            rating: None,
            review_count: None,
            fetched_at: Utc::now(),
            payload,
        })
    }
}
