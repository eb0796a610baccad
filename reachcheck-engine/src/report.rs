//! Report assembly
//!
//! Composes ordered verdicts plus entity metadata into one immutable
//! `DiagnosticReport`. The summary classification follows a fixed rule:
//! `match_ratio` is the proportion of MATCH among non-UNKNOWN verdicts, and
//! the consistency label is Consistent (decided fields, no mismatch),
//! Inconsistent (any mismatch), or Insufficient (nothing decided).

use std::collections::BTreeMap;

use chrono::Utc;
use uuid::Uuid;

use reachcheck_common::types::{BusinessIdentity, Provider};

use crate::models::{
    Consistency, DiagnosticReport, EntityIdentity, FieldVerdict, RatingInfo, RawRecord,
    ReportSummary, VerdictStatus,
};

/// Derive the fixed-rule summary from the verdicts.
pub fn summarize(verdicts: &[FieldVerdict]) -> ReportSummary {
    let matches = verdicts.iter().filter(|v| v.status == VerdictStatus::Match).count();
    let mismatches = verdicts.iter().filter(|v| v.status == VerdictStatus::Mismatch).count();
    let unknowns = verdicts.iter().filter(|v| v.status == VerdictStatus::Unknown).count();

    let decided = matches + mismatches;
    let match_ratio = if decided > 0 { Some(matches as f64 / decided as f64) } else { None };

    let consistency = if mismatches > 0 {
        Consistency::Inconsistent
    } else if decided > 0 {
        Consistency::Consistent
    } else {
        Consistency::Insufficient
    };

    ReportSummary {
        fields_compared: verdicts.len(),
        matches,
        mismatches,
        unknowns,
        match_ratio,
        consistency,
    }
}

/// Assemble the immutable diagnostic report.
///
/// Entity identity prefers what the caller asked for; a missing display name
/// falls back to the first collected raw name. Ratings ride along from
/// providers that expose them; they are metadata, not comparison fields.
pub fn assemble(
    request_id: Uuid,
    identity: &BusinessIdentity,
    raws: &[RawRecord],
    verdicts: Vec<FieldVerdict>,
    collection_errors: BTreeMap<Provider, String>,
) -> DiagnosticReport {
    let (provider, place_id) = match identity {
        BusinessIdentity::ByPlaceId { provider, place_id, .. } => {
            (Some(*provider), Some(place_id.clone()))
        }
        _ => (None, None),
    };
    let name = identity
        .name_hint()
        .map(String::from)
        .or_else(|| raws.iter().find_map(|r| r.name.clone()));

    let mut ratings = BTreeMap::new();
    for raw in raws {
        if raw.rating.is_some() || raw.review_count.is_some() {
            ratings.insert(
                raw.provider,
                RatingInfo { rating: raw.rating, review_count: raw.review_count },
            );
        }
    }

    let summary = summarize(&verdicts);
    tracing::info!(
        %request_id,
        matches = summary.matches,
        mismatches = summary.mismatches,
        unknowns = summary.unknowns,
        consistency = ?summary.consistency,
        "Assembled diagnostic report"
    );

    DiagnosticReport {
        request_id,
        generated_at: Utc::now(),
        entity: EntityIdentity { name, provider, place_id, coordinates: identity.coordinates() },
        verdicts,
        summary,
        collection_errors,
        ratings,
    }
}
