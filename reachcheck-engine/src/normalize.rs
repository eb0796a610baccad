//! Field normalization
//!
//! Pure, field-scoped transforms from raw provider text to canonical
//! comparable forms. Every normalizer is deterministic, total (unparsable
//! input yields `None`, never an error), and idempotent: feeding a canonical
//! value back in returns it unchanged.

use once_cell::sync::Lazy;
use regex::Regex;
use unicode_normalization::UnicodeNormalization;

use crate::models::{NormalizedRecord, RawRecord, TimeRange, WeeklySchedule};

static PAREN_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\([^)]*\)").unwrap());
static WS_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static CORP_SUFFIX_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)[,\s]+(co\.?,?\s*ltd\.?|ltd\.?|inc\.?|llc|corp\.?)$").unwrap());
static BRANCH_SUFFIX_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(지점|점)$").unwrap());

static COUNTRY_PREFIX_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?i)^(대한민국|republic of korea|south korea|korea, republic of)\s*,?\s*").unwrap()
});
static FLOOR_SUITE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)\s+(지하|b)?\d+(층|호)\b").unwrap());
static FLOOR_F_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+\d+f\b").unwrap());
static BASEMENT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?i)\s+(b|지하)\d+\b").unwrap());

/// Administrative-unit synonyms, longest alias first. Targets never appear
/// as sources, which keeps the substitution idempotent.
static ADMIN_ALIASES: Lazy<Vec<(Regex, &'static str)>> = Lazy::new(|| {
    [
        ("서울특별시", "서울"),
        ("서울시", "서울"),
        ("부산광역시", "부산"),
        ("부산시", "부산"),
        ("대구광역시", "대구"),
        ("인천광역시", "인천"),
        ("광주광역시", "광주"),
        ("대전광역시", "대전"),
        ("울산광역시", "울산"),
        ("세종특별자치시", "세종"),
        ("경기도", "경기"),
        ("강원특별자치도", "강원"),
        ("강원도", "강원"),
        ("충청북도", "충북"),
        ("충청남도", "충남"),
        ("전북특별자치도", "전북"),
        ("전라북도", "전북"),
        ("전라남도", "전남"),
        ("경상북도", "경북"),
        ("경상남도", "경남"),
        ("제주특별자치도", "제주"),
        ("제주도", "제주"),
    ]
    .into_iter()
    .map(|(alias, canonical)| {
        (Regex::new(&format!(r"\b{}\b", alias)).unwrap(), canonical)
    })
    .collect()
});

/// Canonicalize a business name.
///
/// NFKC (so fullwidth and compatibility forms of mixed-script names
/// compare), case-fold, drop parentheticals (branch notes, `(주)`),
/// corporate suffixes and decorative whitespace, then trailing branch
/// markers (`…점`, `…지점`).
pub fn normalize_name(raw: &str) -> Option<String> {
    let mut s: String = raw.nfkc().collect::<String>().to_lowercase();
    s = PAREN_RE.replace_all(&s, "").into_owned();
    s = s.replace("주식회사", " ");
    s = CORP_SUFFIX_RE.replace(&s, "").into_owned();
    s = WS_RE.replace_all(&s, "").into_owned();
    // Strip to fixpoint so the transform stays idempotent on names ending
    // in stacked branch markers.
    loop {
        let stripped = BRANCH_SUFFIX_RE.replace(&s, "").into_owned();
        if stripped == s || stripped.is_empty() {
            s = stripped;
            break;
        }
        s = stripped;
    }
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Canonicalize an address.
///
/// Strips country prefixes, parentheticals, and floor/suite/basement detail,
/// rewrites administrative-unit synonyms through the alias table, and
/// collapses whitespace. Whether the text uses the road scheme or the
/// lot-number scheme is preserved; deciding that the two schemes denote the
/// same location is the comparator's job.
pub fn normalize_address(raw: &str) -> Option<String> {
    let mut s: String = raw.nfkc().collect();
    s = COUNTRY_PREFIX_RE.replace(&s, "").into_owned();
    s = PAREN_RE.replace_all(&s, "").into_owned();
    s = FLOOR_SUITE_RE.replace_all(&s, "").into_owned();
    s = FLOOR_F_RE.replace_all(&s, "").into_owned();
    s = BASEMENT_RE.replace_all(&s, "").into_owned();
    for (alias, canonical) in ADMIN_ALIASES.iter() {
        s = alias.replace_all(&s, *canonical).into_owned();
    }
    let s = WS_RE.replace_all(s.trim(), " ").into_owned();
    if s.is_empty() {
        None
    } else {
        Some(s)
    }
}

/// Canonicalize a phone number: digits only, `82` country prefix folded to
/// the domestic leading `0`.
pub fn normalize_phone(raw: &str) -> Option<String> {
    let digits: String = raw.chars().filter(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    // Korean numbers always start with 0, so a 10+ digit "82…" string can
    // only be the country prefix. Canonical output starts with 0 and never
    // re-triggers this rule.
    if digits.starts_with("82") && digits.len() >= 10 {
        Some(format!("0{}", &digits[2..]))
    } else {
        Some(digits)
    }
}

static TIME_RANGE_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d{1,2}):(\d{2})\s*[~\-–—～]\s*(\d{1,2}):(\d{2})").unwrap());
static DAY_SPLIT_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[,、/]").unwrap());
static DAY_RANGE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"[~\-–—～]").unwrap());

/// Parse raw opening-hours lines into a canonical weekly schedule.
///
/// Handles per-day lines (`월요일: 09:00~22:00`, `Monday: 09:00-18:00`),
/// every-day lines (`매일 09:00 - 22:00`), day ranges (`월~금 09:00~18:00`),
/// day lists (`월,수,금 10:00~20:00`) and closed markers (`일요일: 휴무`).
/// Any line that fits none of these makes the whole input unparsable: the
/// result is `None` and the raw text survives only as evidence.
pub fn parse_hours(lines: &[String]) -> Option<WeeklySchedule> {
    let mut schedule = WeeklySchedule::default();
    let mut parsed_any = false;

    for line in lines {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !parse_hours_line(line, &mut schedule) {
            return None;
        }
        parsed_any = true;
    }

    if parsed_any {
        Some(schedule.canonicalize())
    } else {
        None
    }
}

fn parse_hours_line(line: &str, schedule: &mut WeeklySchedule) -> bool {
    let lower = line.to_lowercase();
    let closed = lower.contains("휴무") || lower.contains("closed");

    let day_part = match TIME_RANGE_RE.find(line) {
        Some(m) => line[..m.start()].to_string(),
        None if closed => {
            // Strip the closed marker itself so only day tokens remain.
            let mut s = line.to_string();
            for marker in ["정기휴무", "휴무", "Closed", "closed", "CLOSED"] {
                s = s.replace(marker, "");
            }
            s
        }
        None => return false,
    };
    let days = match parse_day_spec(&day_part) {
        Some(days) if !days.is_empty() => days,
        _ => return false,
    };

    if closed {
        for &day in &days {
            schedule.days[day].clear();
        }
        return true;
    }

    let mut ranges = Vec::new();
    for caps in TIME_RANGE_RE.captures_iter(line) {
        let open = parse_minutes(&caps[1], &caps[2]);
        let close = parse_minutes(&caps[3], &caps[4]);
        match (open, close) {
            (Some(open), Some(close)) => ranges.push(TimeRange { open, close }),
            _ => return false,
        }
    }
    if ranges.is_empty() {
        return false;
    }
    for &day in &days {
        schedule.days[day].extend_from_slice(&ranges);
    }
    true
}

fn parse_minutes(hours: &str, minutes: &str) -> Option<u16> {
    let h: u16 = hours.parse().ok()?;
    let m: u16 = minutes.parse().ok()?;
    if h > 24 || m > 59 {
        return None;
    }
    Some(h * 60 + m)
}

/// Parse the day portion of a line into Monday-first indices.
fn parse_day_spec(text: &str) -> Option<Vec<usize>> {
    let cleaned = text.trim().trim_end_matches(':').trim();
    if cleaned.is_empty() {
        return None;
    }
    let lower = cleaned.to_lowercase();
    if lower == "매일" || lower == "연중무휴" || lower == "daily" || lower == "every day" {
        return Some((0..7).collect());
    }

    let mut days = Vec::new();
    for piece in DAY_SPLIT_RE.split(cleaned) {
        let piece = piece.trim();
        if piece.is_empty() {
            continue;
        }
        let tokens: Vec<&str> = DAY_RANGE_RE.split(piece).map(str::trim).collect();
        match tokens.as_slice() {
            [single] => days.push(parse_day_token(single)?),
            [start, end] => {
                let start = parse_day_token(start)?;
                let end = parse_day_token(end)?;
                if start > end {
                    return None;
                }
                days.extend(start..=end);
            }
            _ => return None,
        }
    }
    days.sort_unstable();
    days.dedup();
    Some(days)
}

fn parse_day_token(token: &str) -> Option<usize> {
    let token = token.trim().to_lowercase();
    let token = token.strip_suffix("요일").unwrap_or(&token);
    match token {
        "월" | "monday" | "mon" => Some(0),
        "화" | "tuesday" | "tue" => Some(1),
        "수" | "wednesday" | "wed" => Some(2),
        "목" | "thursday" | "thu" => Some(3),
        "금" | "friday" | "fri" => Some(4),
        "토" | "saturday" | "sat" => Some(5),
        "일" | "sunday" | "sun" => Some(6),
        _ => None,
    }
}

/// Derive the canonical record for one raw record. Never fails; fields that
/// cannot be parsed come back `None`.
pub fn normalize_record(raw: &RawRecord) -> NormalizedRecord {
    let record = NormalizedRecord {
        provider: raw.provider,
        name: raw.name.as_deref().and_then(normalize_name),
        address: raw.address.as_deref().and_then(normalize_address),
        phone: raw.phone.as_deref().and_then(normalize_phone),
        opening_hours: raw.opening_hours.as_deref().and_then(parse_hours),
    };
    tracing::debug!(
        provider = %raw.provider,
        name = ?record.name,
        address = ?record.address,
        phone = ?record.phone,
        hours_parsed = record.opening_hours.is_some(),
        "Normalized record"
    );
    record
}
