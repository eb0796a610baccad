//! Naver Local Search adapter
//!
//! Keyword search only; Naver's open API exposes no details-by-id lookup,
//! so every identity hint resolves through a name search.

use chrono::Utc;
use serde::Deserialize;

use reachcheck_common::config::NaverCredentials;
use reachcheck_common::types::{BusinessIdentity, Candidate, Provider};

use super::{
    best_candidate, ProviderAdapter, ProviderError, RateLimiter, HTTP_TIMEOUT, RATE_LIMIT_MS,
};
use crate::models::RawRecord;

const DEFAULT_BASE_URL: &str = "https://openapi.naver.com";
const SEARCH_DISPLAY: u32 = 5;

#[derive(Debug, Deserialize)]
struct LocalSearchResponse {
    #[serde(default)]
    items: Vec<LocalItem>,
}

#[derive(Debug, Deserialize)]
struct LocalItem {
    #[serde(default)]
    title: String,
    #[serde(default, rename = "roadAddress")]
    road_address: String,
    #[serde(default)]
    address: String,
    #[serde(default)]
    telephone: String,
}

impl LocalItem {
    /// Titles come back with `<b>` highlight markup around the query terms.
    fn clean_title(&self) -> String {
        self.title.replace("<b>", "").replace("</b>", "").replace("&amp;", "&")
    }

    /// Road address preferred over the lot-number address.
    fn best_address(&self) -> String {
        if self.road_address.is_empty() {
            self.address.clone()
        } else {
            self.road_address.clone()
        }
    }
}

/// Naver Local Search client
pub struct NaverAdapter {
    http_client: reqwest::Client,
    client_id: String,
    client_secret: String,
    base_url: String,
    rate_limiter: RateLimiter,
}

impl NaverAdapter {
    pub fn new(credentials: &NaverCredentials) -> Result<Self, ProviderError> {
        let http_client = reqwest::Client::builder()
            .timeout(HTTP_TIMEOUT)
            .build()
            .map_err(|e| ProviderError::Network(e.to_string()))?;
        Ok(Self {
            http_client,
            client_id: credentials.client_id.clone(),
            client_secret: credentials.client_secret.clone(),
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
    ) -> Result<(serde_json::Value, Vec<LocalItem>), ProviderError> {
        self.rate_limiter.wait().await;

        let url = format!("{}/v1/search/local.json", self.base_url);
        tracing::debug!(query = %query, "Querying Naver local search");

        let display = SEARCH_DISPLAY.to_string();
        let response = self
            .http_client
            .get(&url)
            .header("X-Naver-Client-Id", &self.client_id)
            .header("X-Naver-Client-Secret", &self.client_secret)
            .query(&[("query", query), ("display", display.as_str()), ("sort", "random")])
            .send()
            .await?;

        let status = response.status();
        if status == 401 || status == 403 {
            return Err(ProviderError::InvalidCredentials);
        }
        if status == 429 {
            return Err(ProviderError::RateLimited);
        }
        if !status.is_success() {
            return Err(ProviderError::Network(format!("Naver status: {}", status)));
        }

        let payload: serde_json::Value = response.json().await.map_err(ProviderError::from)?;
        let parsed: LocalSearchResponse = serde_json::from_value(payload.clone())
            .map_err(|e| ProviderError::Parse(e.to_string()))?;
        Ok((payload, parsed.items))
    }
}

#[async_trait::async_trait]
impl ProviderAdapter for NaverAdapter {
    fn provider(&self) -> Provider {
        Provider::Naver
    }

    async fn collect(&self, identity: &BusinessIdentity) -> Result<RawRecord, ProviderError> {
        let name = identity
            .name_hint()
            .ok_or_else(|| ProviderError::NotFound("no name hint to search with".into()))?;

        let (payload, items) = self.search_raw(name).await?;
        if items.is_empty() {
            return Err(ProviderError::NotFound(name.to_string()));
        }

        let candidates: Vec<Candidate> = items
            .iter()
            .map(|item| Candidate {
                provider: Provider::Naver,
                place_id: None,
                name: item.clean_title(),
                address: item.best_address(),
                phone: Some(item.telephone.clone()).filter(|t| !t.is_empty()),
                coordinates: None,
            })
            .collect();

        let best = best_candidate(name, candidates)
            .ok_or_else(|| ProviderError::NotFound(name.to_string()))?;

        Ok(RawRecord {
            provider: Provider::Naver,
            name: Some(best.name).filter(|n| !n.is_empty()),
            address: Some(best.address).filter(|a| !a.is_empty()),
            phone: best.phone,
            opening_hours: None,
            rating: None,
            review_count: None,
            fetched_at: Utc::now(),
            payload,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_local_search_response() {
        let json = serde_json::json!({
            "total": 1,
            "items": [{
                "title": "<b>한신포차</b> 당산점",
                "link": "",
                "category": "음식점>포장마차",
                "roadAddress": "서울특별시 영등포구 영등포로 143",
                "address": "서울특별시 영등포구 당산동 53-4",
                "telephone": "02-1234-5678"
            }]
        });
        let parsed: LocalSearchResponse = serde_json::from_value(json).unwrap();
        let item = &parsed.items[0];
        assert_eq!(item.clean_title(), "한신포차 당산점");
        assert_eq!(item.best_address(), "서울특별시 영등포구 영등포로 143");
    }

    #[test]
    fn lot_address_used_when_road_missing() {
        let item = LocalItem {
            title: "국밥집".into(),
            road_address: String::new(),
            address: "서울 마포구 합정동 357-1".into(),
            telephone: String::new(),
        };
        assert_eq!(item.best_address(), "서울 마포구 합정동 357-1");
    }
}
