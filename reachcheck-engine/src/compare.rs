//! Comparator (evidence engine)
//!
//! Groups normalized values per field across providers and emits one
//! `FieldVerdict` per field, in the fixed order name, address, phone,
//! opening hours. Evidence is collected from the raw records, so a value
//! that failed normalization still leaves its trace.
//!
//! Determinism: verdicts are a pure function of the records. Nothing
//! generative touches them.

use std::collections::BTreeMap;

use once_cell::sync::Lazy;
use regex::Regex;

use reachcheck_common::types::{ComparisonField, Provider};

use crate::models::{FieldVerdict, NormalizedRecord, NormalizedValue, RawRecord, VerdictStatus};

/// Compute verdicts for all comparison fields.
///
/// For each field, `evidence` holds every provider whose raw record carried
/// a non-null value (exactly those, no omission, no fabrication), while
/// `values` holds the subset whose value also normalized. Fewer than two
/// normalized contributions yields `Unknown`.
pub fn compare(raws: &[RawRecord], norms: &[NormalizedRecord]) -> Vec<FieldVerdict> {
    ComparisonField::ORDERED.iter().map(|&field| compare_field(field, raws, norms)).collect()
}

fn compare_field(
    field: ComparisonField,
    raws: &[RawRecord],
    norms: &[NormalizedRecord],
) -> FieldVerdict {
    let mut evidence = BTreeMap::new();
    for raw in raws {
        if let Some(text) = raw.field_text(field) {
            evidence.insert(raw.provider, text);
        }
    }

    let mut values = BTreeMap::new();
    for norm in norms {
        if let Some(value) = norm.value(field) {
            values.insert(norm.provider, value);
        }
    }

    let status = if values.len() < 2 {
        VerdictStatus::Unknown
    } else if all_pairwise_equivalent(field, &values) {
        VerdictStatus::Match
    } else {
        VerdictStatus::Mismatch
    };

    tracing::debug!(
        field = %field,
        status = ?status,
        contributing = values.len(),
        evidence = evidence.len(),
        "Field verdict"
    );

    FieldVerdict { field, status, values, evidence }
}

fn all_pairwise_equivalent(
    field: ComparisonField,
    values: &BTreeMap<Provider, NormalizedValue>,
) -> bool {
    let values: Vec<&NormalizedValue> = values.values().collect();
    for i in 0..values.len() {
        for j in (i + 1)..values.len() {
            if !equivalent(field, values[i], values[j]) {
                return false;
            }
        }
    }
    true
}

/// Field-specific equivalence relation.
fn equivalent(field: ComparisonField, a: &NormalizedValue, b: &NormalizedValue) -> bool {
    match (field, a, b) {
        // Exact equality on the canonical form.
        (ComparisonField::Name, NormalizedValue::Text(a), NormalizedValue::Text(b))
        | (ComparisonField::Phone, NormalizedValue::Text(a), NormalizedValue::Text(b)) => a == b,
        // Rule-table equivalence; plain string difference never decides.
        (ComparisonField::Address, NormalizedValue::Text(a), NormalizedValue::Text(b)) => {
            addresses_equivalent(a, b)
        }
        // Structural equality of the parsed schedule.
        (ComparisonField::OpeningHours, NormalizedValue::Schedule(a), NormalizedValue::Schedule(b)) => {
            a == b
        }
        // Mixed representations for one field indicate a normalizer bug.
        _ => false,
    }
}

static DISTRICT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S+구)\b").unwrap());
static ROAD_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(\S+(?:로|길))\s*(\d+(?:-\d+)?)\b").unwrap());
static LOT_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\S+(?:동|가))(?:\s*\d+(?:-\d+)?가)?\s*(\d+(?:-\d+)?)\b").unwrap());

/// Parsed shape of a normalized Korean address.
#[derive(Debug, PartialEq)]
struct AddressForm {
    /// District token (`…구`), spaces removed.
    district: Option<String>,
    /// Road-scheme token: road name plus primary number.
    road: Option<(String, String)>,
    /// Lot-scheme token: dong/ga name plus lot number.
    lot: Option<(String, String)>,
}

fn parse_address_form(addr: &str) -> AddressForm {
    let district =
        DISTRICT_RE.captures(addr).map(|c| c[1].replace(char::is_whitespace, ""));
    let road = ROAD_RE
        .captures(addr)
        .map(|c| (c[1].replace(char::is_whitespace, ""), c[2].to_string()));
    let lot = LOT_RE
        .captures(addr)
        .map(|c| (c[1].replace(char::is_whitespace, ""), c[2].to_string()));
    AddressForm { district, road, lot }
}

/// Explicit address-equivalence rule set.
///
/// 1. Conflicting district (`…구`) tokens are never equivalent.
/// 2. Two road-scheme addresses must agree on road name and number.
/// 3. Two lot-scheme addresses must agree on dong token and lot number.
/// 4. A road-scheme address and a lot-scheme address with no district
///    conflict are treated as equivalent: the two schemes are alternative
///    spellings of the same location, and only a positive conflict in a
///    comparable token may force a mismatch.
pub fn addresses_equivalent(a: &str, b: &str) -> bool {
    if a == b {
        return true;
    }
    let fa = parse_address_form(a);
    let fb = parse_address_form(b);

    if let (Some(da), Some(db)) = (&fa.district, &fb.district) {
        if da != db {
            return false;
        }
    }

    if let (Some(ra), Some(rb)) = (&fa.road, &fb.road) {
        return ra == rb;
    }

    if let (Some(la), Some(lb)) = (&fa.lot, &fb.lot) {
        return la == lb;
    }

    // Mixed schemes (or one side without a recognizable pattern): with no
    // district conflict there is no positive evidence of a different
    // location.
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use reachcheck_common::types::Provider;

    use crate::normalize::normalize_record;

    fn raw(
        provider: Provider,
        name: Option<&str>,
        address: Option<&str>,
        phone: Option<&str>,
    ) -> RawRecord {
        RawRecord {
            provider,
            name: name.map(String::from),
            address: address.map(String::from),
            phone: phone.map(String::from),
            opening_hours: None,
            rating: None,
            review_count: None,
            fetched_at: Utc::now(),
            payload: serde_json::Value::Null,
        }
    }

    fn verdict_for(verdicts: &[FieldVerdict], field: ComparisonField) -> &FieldVerdict {
        verdicts.iter().find(|v| v.field == field).unwrap()
    }

    #[test]
    fn verdicts_come_in_fixed_order() {
        let raws = vec![raw(Provider::Google, Some("A"), None, None)];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        let order: Vec<ComparisonField> = verdicts.iter().map(|v| v.field).collect();
        assert_eq!(order.as_slice(), &ComparisonField::ORDERED);
    }

    #[test]
    fn identical_names_across_three_providers_match() {
        let raws = vec![
            raw(Provider::Google, Some("스타벅스 강남점"), None, None),
            raw(Provider::Naver, Some("스타벅스 강남점"), None, None),
            raw(Provider::Kakao, Some("스타벅스 강남점"), None, None),
        ];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        let name = verdict_for(&verdicts, ComparisonField::Name);
        assert_eq!(name.status, VerdictStatus::Match);
        assert_eq!(name.evidence.len(), 3);
    }

    #[test]
    fn phone_formats_normalize_to_match_with_exact_evidence() {
        let raws = vec![
            raw(Provider::Google, None, None, Some("+82-2-1234-5678")),
            raw(Provider::Naver, None, None, Some("02-1234-5678")),
            raw(Provider::Kakao, None, None, None),
        ];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        let phone = verdict_for(&verdicts, ComparisonField::Phone);
        assert_eq!(phone.status, VerdictStatus::Match);
        // The provider that supplied no phone is absent from evidence.
        let keys: Vec<Provider> = phone.evidence.keys().copied().collect();
        assert_eq!(keys, vec![Provider::Google, Provider::Naver]);
    }

    #[test]
    fn single_contribution_is_unknown() {
        let raws = vec![
            raw(Provider::Google, Some("한신포차"), None, None),
            raw(Provider::Naver, None, None, None),
        ];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        assert_eq!(verdict_for(&verdicts, ComparisonField::Name).status, VerdictStatus::Unknown);
        assert_eq!(verdict_for(&verdicts, ComparisonField::Phone).status, VerdictStatus::Unknown);
    }

    #[test]
    fn differing_names_mismatch() {
        let raws = vec![
            raw(Provider::Google, Some("한신포차 당산점"), None, None),
            raw(Provider::Kakao, Some("한신포차 합정점"), None, None),
        ];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        assert_eq!(verdict_for(&verdicts, ComparisonField::Name).status, VerdictStatus::Mismatch);
    }

    #[test]
    fn evidence_can_exceed_contributing_values() {
        // Kakao's hours are unparsable: raw evidence present, no normalized
        // contribution, so the field stays Unknown with two evidence entries.
        let mut google = raw(Provider::Google, None, None, None);
        google.opening_hours = Some(vec!["월~금 09:00~18:00".into()]);
        let mut kakao = raw(Provider::Kakao, None, None, None);
        kakao.opening_hours = Some(vec!["사장님 마음대로".into()]);

        let raws = vec![google, kakao];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        let hours = verdict_for(&verdicts, ComparisonField::OpeningHours);
        assert_eq!(hours.status, VerdictStatus::Unknown);
        assert_eq!(hours.evidence.len(), 2);
        assert_eq!(hours.values.len(), 1);
    }

    #[test]
    fn schedules_compare_structurally() {
        let mut google = raw(Provider::Google, None, None, None);
        google.opening_hours = Some(vec![
            "Monday: 09:00-18:00".into(),
            "Tuesday: 09:00-18:00".into(),
            "Wednesday: 09:00-18:00".into(),
            "Thursday: 09:00-18:00".into(),
            "Friday: 09:00-18:00".into(),
        ]);
        let mut naver = raw(Provider::Naver, None, None, None);
        naver.opening_hours = Some(vec!["월~금 09:00~18:00".into()]);

        let raws = vec![google, naver];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        assert_eq!(
            verdict_for(&verdicts, ComparisonField::OpeningHours).status,
            VerdictStatus::Match
        );
    }

    #[test]
    fn road_and_lot_addresses_for_same_location_match() {
        let raws = vec![
            raw(Provider::Google, None, Some("서울 영등포구 영등포로 143"), None),
            raw(Provider::Naver, None, Some("서울 영등포구 당산동 53-4"), None),
        ];
        let norms: Vec<_> = raws.iter().map(normalize_record).collect();
        let verdicts = compare(&raws, &norms);
        assert_eq!(verdict_for(&verdicts, ComparisonField::Address).status, VerdictStatus::Match);
    }

    #[test]
    fn address_rule_table() {
        // Same road, same number.
        assert!(addresses_equivalent("서울 영등포구 영등포로 143", "서울 영등포구 영등포로 143"));
        // Same road, different number.
        assert!(!addresses_equivalent("서울 영등포구 영등포로 143", "서울 영등포구 영등포로 210"));
        // Different road.
        assert!(!addresses_equivalent("서울 영등포구 영등포로 143", "서울 영등포구 국회대로 70"));
        // Different district always conflicts.
        assert!(!addresses_equivalent("서울 영등포구 영등포로 143", "서울 마포구 영등포로 143"));
        // Both lot-form, same dong and lot.
        assert!(addresses_equivalent("서울 영등포구 당산동 53-4", "영등포구 당산동 53-4"));
        // Both lot-form, different lot number.
        assert!(!addresses_equivalent("서울 영등포구 당산동 53-4", "서울 영등포구 당산동 88-1"));
        // Mixed schemes, no district conflict: equivalent by rule 4.
        assert!(addresses_equivalent("서울 영등포구 영등포로 143", "서울 영등포구 당산동 53-4"));
    }

    #[test]
    fn no_records_yield_all_unknown_with_empty_evidence() {
        let verdicts = compare(&[], &[]);
        assert_eq!(verdicts.len(), 4);
        for verdict in &verdicts {
            assert_eq!(verdict.status, VerdictStatus::Unknown);
            assert!(verdict.evidence.is_empty());
            assert!(verdict.values.is_empty());
        }
    }
}
