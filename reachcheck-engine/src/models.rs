//! Data model for the reconciliation pipeline.
//!
//! `RawRecord` and `NormalizedRecord` are write-once: the pipeline run that
//! collected them is their only owner and nothing mutates them afterwards.
//! The `DiagnosticReport` is constructed once per request and persisted as a
//! versioned snapshot, never touched again.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use reachcheck_common::types::{BusinessIdentity, ComparisonField, Coordinates, Provider};

/// One provider's as-fetched view of the business.
///
/// Partial population is legal; any field a provider did not supply is
/// `None`. `payload` keeps the untouched upstream response for audit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawRecord {
    pub provider: Provider,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    /// Raw opening-hours lines as the provider sent them.
    pub opening_hours: Option<Vec<String>>,
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
    pub fetched_at: DateTime<Utc>,
    /// Untouched original response body.
    pub payload: serde_json::Value,
}

impl RawRecord {
    /// Raw evidence text for one comparison field, if the provider supplied
    /// a non-empty value.
    pub fn field_text(&self, field: ComparisonField) -> Option<String> {
        let text = match field {
            ComparisonField::Name => self.name.clone(),
            ComparisonField::Address => self.address.clone(),
            ComparisonField::Phone => self.phone.clone(),
            ComparisonField::OpeningHours => {
                self.opening_hours.as_ref().map(|lines| lines.join("; "))
            }
        };
        text.filter(|t| !t.trim().is_empty())
    }
}

/// Half-open daily interval in minutes from midnight.
///
/// `close < open` means the interval runs past midnight.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TimeRange {
    pub open: u16,
    pub close: u16,
}

/// Canonical weekly schedule: one interval list per day, Monday first.
/// An empty list means closed that day.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct WeeklySchedule {
    pub days: [Vec<TimeRange>; 7],
}

impl WeeklySchedule {
    /// Sort and dedupe each day so structurally equal schedules compare
    /// equal regardless of input order.
    pub fn canonicalize(mut self) -> Self {
        for day in &mut self.days {
            day.sort();
            day.dedup();
        }
        self
    }
}

/// Canonical per-field derivation of one [`RawRecord`].
///
/// A `None` field means normalization failed for that field; the raw value
/// still counts as evidence.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NormalizedRecord {
    pub provider: Provider,
    pub name: Option<String>,
    pub address: Option<String>,
    pub phone: Option<String>,
    pub opening_hours: Option<WeeklySchedule>,
}

impl NormalizedRecord {
    /// Canonical value for one comparison field, if normalization produced
    /// one.
    pub fn value(&self, field: ComparisonField) -> Option<NormalizedValue> {
        match field {
            ComparisonField::Name => self.name.clone().map(NormalizedValue::Text),
            ComparisonField::Address => self.address.clone().map(NormalizedValue::Text),
            ComparisonField::Phone => self.phone.clone().map(NormalizedValue::Text),
            ComparisonField::OpeningHours => {
                self.opening_hours.clone().map(NormalizedValue::Schedule)
            }
        }
    }
}

/// A canonical value as recorded in a verdict.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum NormalizedValue {
    Text(String),
    Schedule(WeeklySchedule),
}

/// Per-field judgment.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum VerdictStatus {
    Match,
    Mismatch,
    Unknown,
}

/// One field's verdict with its evidentiary trail.
///
/// Invariant: `evidence` keys are exactly the providers whose raw record
/// carried a non-null value for `field`. `values` keys (providers whose value
/// also normalized) are a subset of `evidence` keys.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FieldVerdict {
    pub field: ComparisonField,
    pub status: VerdictStatus,
    pub values: BTreeMap<Provider, NormalizedValue>,
    pub evidence: BTreeMap<Provider, String>,
}

/// Overall classification derived from the verdicts.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Consistency {
    /// At least one decided field and no mismatch.
    Consistent,
    /// At least one mismatch.
    Inconsistent,
    /// Every field was unknown; nothing could be decided.
    Insufficient,
}

/// Fixed-rule summary over the verdicts (see `report::summarize`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReportSummary {
    pub fields_compared: usize,
    pub matches: usize,
    pub mismatches: usize,
    pub unknowns: usize,
    /// `matches / (matches + mismatches)`; `None` when nothing was decided.
    pub match_ratio: Option<f64>,
    pub consistency: Consistency,
}

/// Which business the report is about.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityIdentity {
    pub name: Option<String>,
    pub provider: Option<Provider>,
    pub place_id: Option<String>,
    pub coordinates: Option<Coordinates>,
}

/// Rating metadata carried along from providers that expose it. Not a
/// comparison field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RatingInfo {
    pub rating: Option<f64>,
    pub review_count: Option<u64>,
}

/// The immutable final output of the comparison pipeline.
///
/// Fully self-describing: a rendering collaborator needs nothing beyond this
/// structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DiagnosticReport {
    pub request_id: Uuid,
    pub generated_at: DateTime<Utc>,
    pub entity: EntityIdentity,
    /// Always in the fixed field order name, address, phone, opening hours.
    pub verdicts: Vec<FieldVerdict>,
    pub summary: ReportSummary,
    /// Per-provider collection failures, by error code. A provider absent
    /// here and absent from all evidence simply returned an empty record.
    pub collection_errors: BTreeMap<Provider, String>,
    pub ratings: BTreeMap<Provider, RatingInfo>,
}

/// A finalized report plus advisory narrative. The narrative is attached
/// strictly after the verdicts are final and has no path back into them.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AnnotatedReport {
    pub report: DiagnosticReport,
    pub narrative: String,
}

/// Everything one pipeline run produced, persisted for audit and
/// reproducibility.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot {
    pub request_id: Uuid,
    pub saved_at: DateTime<Utc>,
    pub identity: BusinessIdentity,
    pub raw_records: Vec<RawRecord>,
    pub normalized_records: Vec<NormalizedRecord>,
    pub report: DiagnosticReport,
}
