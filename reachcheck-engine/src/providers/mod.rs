//! Provider adapters
//!
//! One adapter per upstream map/search provider, all implementing the same
//! capability: `collect(identity) -> RawRecord`. Adapters own their HTTP
//! client and credentials, share no mutable state with each other, and never
//! retry; retry/backoff policy, if any, belongs to the pipeline's caller.

mod google;
mod kakao;
mod naver;

pub use google::GoogleAdapter;
pub use kakao::KakaoAdapter;
pub use naver::NaverAdapter;

use std::time::{Duration, Instant};

use async_trait::async_trait;
use thiserror::Error;
use tokio::sync::Mutex;

use reachcheck_common::types::{BusinessIdentity, Candidate, Provider};

use crate::models::RawRecord;

/// Default per-request timeout for the underlying HTTP client. The pipeline
/// applies its own (usually tighter) collection deadline on top.
pub(crate) const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Minimum interval between requests to one provider.
pub(crate) const RATE_LIMIT_MS: u64 = 200;

/// Per-adapter collection errors
#[derive(Debug, Error)]
pub enum ProviderError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Rate limit exceeded")]
    RateLimited,

    #[error("Request timed out")]
    Timeout,

    #[error("Invalid or missing credentials")]
    InvalidCredentials,

    #[error("Network error: {0}")]
    Network(String),

    #[error("Parse error: {0}")]
    Parse(String),
}

impl ProviderError {
    /// Stable machine-readable code recorded in snapshots and reports.
    pub fn code(&self) -> &'static str {
        match self {
            ProviderError::NotFound(_) => "SEARCH_NO_RESULT",
            ProviderError::RateLimited => "RATE_LIMIT",
            ProviderError::Timeout => "TIMEOUT",
            ProviderError::InvalidCredentials => "AUTH_ERROR",
            ProviderError::Network(_) => "NETWORK_ERROR",
            ProviderError::Parse(_) => "PARSING_ERROR",
        }
    }
}

impl From<reqwest::Error> for ProviderError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            ProviderError::Timeout
        } else if err.is_decode() {
            ProviderError::Parse(err.to_string())
        } else {
            ProviderError::Network(err.to_string())
        }
    }
}

/// Uniform provider capability. Adding or removing an adapter never touches
/// the comparator or the report assembler.
#[async_trait]
pub trait ProviderAdapter: Send + Sync {
    fn provider(&self) -> Provider;

    /// Fetch this provider's view of the identified business. One outbound
    /// call per invocation (search-based adapters may add one follow-up
    /// details call); partial field population is legal.
    async fn collect(&self, identity: &BusinessIdentity) -> Result<RawRecord, ProviderError>;
}

/// Rate limiter enforcing a minimum interval between requests
pub(crate) struct RateLimiter {
    last_request: Mutex<Option<Instant>>,
    min_interval: Duration,
}

impl RateLimiter {
    pub(crate) fn new(min_interval_ms: u64) -> Self {
        Self { last_request: Mutex::new(None), min_interval: Duration::from_millis(min_interval_ms) }
    }

    /// Wait if necessary to comply with the rate limit
    pub(crate) async fn wait(&self) {
        let mut last = self.last_request.lock().await;

        if let Some(last_time) = *last {
            let elapsed = last_time.elapsed();
            if elapsed < self.min_interval {
                let wait_time = self.min_interval - elapsed;
                tracing::debug!("Rate limiting: waiting {:?}", wait_time);
                tokio::time::sleep(wait_time).await;
            }
        }

        *last = Some(Instant::now());
    }
}

/// Threshold below which a similarity-only match is rejected.
const SIMILARITY_THRESHOLD: f64 = 0.6;

/// Pick the candidate that best matches the query name.
///
/// Whitespace-insensitive containment wins outright (in provider order);
/// otherwise the most similar name above a fixed threshold is taken. No
/// candidate above threshold means the provider does not know this business.
pub(crate) fn best_candidate(query: &str, candidates: Vec<Candidate>) -> Option<Candidate> {
    let norm_query = squash(query);
    if norm_query.is_empty() {
        return None;
    }

    for candidate in &candidates {
        let norm_name = squash(&candidate.name);
        if norm_name.contains(&norm_query) || norm_query.contains(&norm_name) {
            return Some(candidate.clone());
        }
    }

    candidates
        .into_iter()
        .map(|c| {
            let score = strsim::normalized_levenshtein(&norm_query, &squash(&c.name));
            (c, score)
        })
        .filter(|(_, score)| *score >= SIMILARITY_THRESHOLD)
        .max_by(|(_, a), (_, b)| a.total_cmp(b))
        .map(|(c, _)| c)
}

fn squash(s: &str) -> String {
    s.chars().filter(|c| !c.is_whitespace()).collect::<String>().to_lowercase()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn candidate(name: &str) -> Candidate {
        Candidate {
            provider: Provider::Kakao,
            place_id: Some("1".into()),
            name: name.into(),
            address: "서울 마포구".into(),
            phone: None,
            coordinates: None,
        }
    }

    #[test]
    fn containment_beats_similarity() {
        let picked = best_candidate(
            "한신포차",
            vec![candidate("한신 포장마차"), candidate("한신포차 합정점")],
        )
        .unwrap();
        assert_eq!(picked.name, "한신포차 합정점");
    }

    #[test]
    fn falls_back_to_similarity() {
        // No containment either way; similarity is well above threshold.
        let picked =
            best_candidate("Starbucks Gangnam Store", vec![candidate("starbucks gangnam R")])
                .unwrap();
        assert_eq!(picked.name, "starbucks gangnam R");
    }

    #[test]
    fn nothing_similar_is_none() {
        assert!(best_candidate("한신포차", vec![candidate("피자스쿨")]).is_none());
        assert!(best_candidate("한신포차", vec![]).is_none());
    }

    #[test]
    fn error_codes_are_stable() {
        assert_eq!(ProviderError::Timeout.code(), "TIMEOUT");
        assert_eq!(ProviderError::NotFound("x".into()).code(), "SEARCH_NO_RESULT");
        assert_eq!(ProviderError::InvalidCredentials.code(), "AUTH_ERROR");
    }
}
