//! Advisory narrative annotator
//!
//! OpenAI-compatible chat-completions client that turns a finalized
//! `DiagnosticReport` into supplementary narrative text. Strictly advisory:
//! it consumes the report by shared reference after the verdicts are final,
//! so it has no write path back into them, and callers treat a failure here
//! as "no narrative", never as a pipeline failure.

use serde::{Deserialize, Serialize};

use reachcheck_common::config::AnnotatorConfig;
use reachcheck_common::{Error, Result};

use crate::models::{AnnotatedReport, DiagnosticReport, VerdictStatus};

const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";
const DEFAULT_MODEL: &str = "gpt-4o-mini";
const MAX_TOKENS: u32 = 300;

#[derive(Debug, Serialize)]
struct ChatRequest {
    model: String,
    messages: Vec<ChatMessage>,
    temperature: f32,
    max_tokens: u32,
}

#[derive(Debug, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    content: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

pub struct Annotator {
    http_client: reqwest::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl Annotator {
    pub fn new(config: &AnnotatorConfig) -> Result<Self> {
        let http_client = reqwest::Client::builder()
            .timeout(std::time::Duration::from_secs(60))
            .build()
            .map_err(|e| Error::Internal(format!("HTTP client: {}", e)))?;
        Ok(Self {
            http_client,
            api_key: config.api_key.clone(),
            model: config.model.clone().unwrap_or_else(|| DEFAULT_MODEL.to_string()),
            base_url: config.base_url.clone().unwrap_or_else(|| DEFAULT_BASE_URL.to_string()),
        })
    }

    /// Produce narrative commentary for a finalized report.
    pub async fn annotate(&self, report: &DiagnosticReport) -> Result<AnnotatedReport> {
        let request = ChatRequest {
            model: self.model.clone(),
            messages: vec![
                ChatMessage {
                    role: "system".into(),
                    content: "You are a local-business listing consultant. Explain the findings \
                              to the owner in plain Korean, succinctly."
                        .into(),
                },
                ChatMessage { role: "user".into(), content: build_prompt(report) },
            ],
            temperature: 0.7,
            max_tokens: MAX_TOKENS,
        };

        tracing::debug!(model = %self.model, "Requesting narrative annotation");
        let response = self
            .http_client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Internal(format!("Annotator request failed: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(Error::Internal(format!("Annotator API status: {}", status)));
        }

        let body: ChatResponse = response
            .json()
            .await
            .map_err(|e| Error::Internal(format!("Annotator response: {}", e)))?;
        let narrative = body
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| Error::Internal("Annotator returned no choices".into()))?;

        Ok(AnnotatedReport { report: report.clone(), narrative })
    }
}

/// Flatten the report into prompt text. Only reads; verdicts are already
/// final when this runs.
fn build_prompt(report: &DiagnosticReport) -> String {
    let mut lines = Vec::new();
    if let Some(name) = &report.entity.name {
        lines.push(format!("Business: {}", name));
    }
    for verdict in &report.verdicts {
        let status = match verdict.status {
            VerdictStatus::Match => "consistent across providers",
            VerdictStatus::Mismatch => "INCONSISTENT across providers",
            VerdictStatus::Unknown => "not verifiable (too little data)",
        };
        let providers: Vec<&str> =
            verdict.evidence.keys().map(|provider| provider.as_str()).collect();
        lines.push(format!("- {}: {} (evidence from: {})", verdict.field, status, providers.join(", ")));
    }
    lines.push(format!(
        "Summary: {} matched, {} mismatched, {} unknown.",
        report.summary.matches, report.summary.mismatches, report.summary.unknowns
    ));
    lines.push(
        "Write a short assessment of how consistently this business appears on Korean map \
         services, and what the owner should fix first."
            .into(),
    );
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::BTreeMap;
    use chrono::Utc;
    use uuid::Uuid;

    use crate::models::{
        Consistency, EntityIdentity, FieldVerdict, ReportSummary,
    };
    use reachcheck_common::types::{ComparisonField, Provider};

    fn report_with_mismatch() -> DiagnosticReport {
        let mut evidence = BTreeMap::new();
        evidence.insert(Provider::Google, "02-1234-5678".to_string());
        evidence.insert(Provider::Kakao, "02-8765-4321".to_string());
        DiagnosticReport {
            request_id: Uuid::new_v4(),
            generated_at: Utc::now(),
            entity: EntityIdentity {
                name: Some("한신포차".into()),
                provider: None,
                place_id: None,
                coordinates: None,
            },
            verdicts: vec![FieldVerdict {
                field: ComparisonField::Phone,
                status: VerdictStatus::Mismatch,
                values: BTreeMap::new(),
                evidence,
            }],
            summary: ReportSummary {
                fields_compared: 1,
                matches: 0,
                mismatches: 1,
                unknowns: 0,
                match_ratio: Some(0.0),
                consistency: Consistency::Inconsistent,
            },
            collection_errors: BTreeMap::new(),
            ratings: BTreeMap::new(),
        }
    }

    #[test]
    fn prompt_reflects_verdicts_without_raw_values() {
        let prompt = build_prompt(&report_with_mismatch());
        assert!(prompt.contains("Business: 한신포차"));
        assert!(prompt.contains("phone: INCONSISTENT"));
        assert!(prompt.contains("google, kakao"));
        assert!(prompt.contains("1 mismatched"));
    }

    #[test]
    fn chat_response_parses() {
        let json = serde_json::json!({
            "id": "chatcmpl-1",
            "choices": [{
                "index": 0,
                "message": { "role": "assistant", "content": "전화번호가 다릅니다." }
            }]
        });
        let parsed: ChatResponse = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.choices[0].message.content, "전화번호가 다릅니다.");
    }
}
