//! Core identity types shared across the pipeline.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Closed set of upstream data providers.
///
/// Ordered so provider-keyed maps serialize deterministically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Provider {
    Google,
    Naver,
    Kakao,
}

impl Provider {
    /// All providers, in canonical order.
    pub const ALL: [Provider; 3] = [Provider::Google, Provider::Naver, Provider::Kakao];

    pub fn as_str(&self) -> &'static str {
        match self {
            Provider::Google => "google",
            Provider::Naver => "naver",
            Provider::Kakao => "kakao",
        }
    }
}

impl fmt::Display for Provider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Provider {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "google" => Ok(Provider::Google),
            "naver" => Ok(Provider::Naver),
            "kakao" => Ok(Provider::Kakao),
            other => Err(Error::Config(format!("Unknown provider: {}", other))),
        }
    }
}

/// Closed set of fields the comparator judges.
///
/// Verdicts are always emitted in the order of [`ComparisonField::ORDERED`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ComparisonField {
    Name,
    Address,
    Phone,
    OpeningHours,
}

impl ComparisonField {
    /// Fixed emission order: name, address, phone, opening hours.
    pub const ORDERED: [ComparisonField; 4] = [
        ComparisonField::Name,
        ComparisonField::Address,
        ComparisonField::Phone,
        ComparisonField::OpeningHours,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ComparisonField::Name => "name",
            ComparisonField::Address => "address",
            ComparisonField::Phone => "phone",
            ComparisonField::OpeningHours => "opening_hours",
        }
    }
}

impl fmt::Display for ComparisonField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// WGS84 point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// How the caller identifies the business to diagnose.
///
/// Validated exactly once at the pipeline boundary; adapters may rely on a
/// validated hint being well-formed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum BusinessIdentity {
    /// A place id issued by one provider. `name` is an optional hint so the
    /// other providers can still search for the same business.
    ByPlaceId {
        provider: Provider,
        place_id: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        name: Option<String>,
    },
    /// Free-text name, optionally narrowed by an address.
    ByNameAddress {
        name: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        address: Option<String>,
    },
    /// A point plus the name to look for near it.
    ByCoordinates { lat: f64, lng: f64, name: String },
}

impl BusinessIdentity {
    /// Boundary validation. Rejects empty ids/names and out-of-range
    /// coordinates before any adapter is invoked.
    pub fn validate(&self) -> Result<()> {
        match self {
            BusinessIdentity::ByPlaceId { place_id, .. } => {
                if place_id.trim().is_empty() {
                    return Err(Error::InvalidIdentity("place_id is empty".into()));
                }
            }
            BusinessIdentity::ByNameAddress { name, .. } => {
                if name.trim().is_empty() {
                    return Err(Error::InvalidIdentity("name is empty".into()));
                }
            }
            BusinessIdentity::ByCoordinates { lat, lng, name } => {
                if name.trim().is_empty() {
                    return Err(Error::InvalidIdentity("name is empty".into()));
                }
                if !(-90.0..=90.0).contains(lat) {
                    return Err(Error::InvalidIdentity(format!("latitude out of range: {}", lat)));
                }
                if !(-180.0..=180.0).contains(lng) {
                    return Err(Error::InvalidIdentity(format!(
                        "longitude out of range: {}",
                        lng
                    )));
                }
            }
        }
        Ok(())
    }

    /// Name hint usable as a search query, if the hint carries one.
    pub fn name_hint(&self) -> Option<&str> {
        match self {
            BusinessIdentity::ByPlaceId { name, .. } => name.as_deref(),
            BusinessIdentity::ByNameAddress { name, .. } => Some(name),
            BusinessIdentity::ByCoordinates { name, .. } => Some(name),
        }
    }

    /// Coordinates, when the hint carries them.
    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            BusinessIdentity::ByCoordinates { lat, lng, .. } => {
                Some(Coordinates { lat: *lat, lng: *lng })
            }
            _ => None,
        }
    }
}

/// One search result offered to the caller for selection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Candidate {
    pub provider: Provider,
    /// Provider-issued id; not every provider exposes one in search results.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub place_id: Option<String>,
    pub name: String,
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coordinates: Option<Coordinates>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn provider_round_trips_through_str() {
        for p in Provider::ALL {
            assert_eq!(p.as_str().parse::<Provider>().unwrap(), p);
        }
        assert!("daum".parse::<Provider>().is_err());
    }

    #[test]
    fn field_order_is_fixed() {
        let names: Vec<&str> = ComparisonField::ORDERED.iter().map(|f| f.as_str()).collect();
        assert_eq!(names, ["name", "address", "phone", "opening_hours"]);
    }

    #[test]
    fn validates_place_id_hint() {
        let id = BusinessIdentity::ByPlaceId {
            provider: Provider::Google,
            place_id: "ChIJabc123".into(),
            name: Some("스타벅스 강남점".into()),
        };
        assert!(id.validate().is_ok());
        assert_eq!(id.name_hint(), Some("스타벅스 강남점"));

        let empty = BusinessIdentity::ByPlaceId {
            provider: Provider::Google,
            place_id: "  ".into(),
            name: None,
        };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn rejects_out_of_range_coordinates() {
        let id = BusinessIdentity::ByCoordinates {
            lat: 137.5,
            lng: 127.0,
            name: "한신포차".into(),
        };
        assert!(id.validate().is_err());
    }

    #[test]
    fn identity_serializes_tagged() {
        let id = BusinessIdentity::ByNameAddress {
            name: "한신포차".into(),
            address: None,
        };
        let json = serde_json::to_value(&id).unwrap();
        assert_eq!(json["kind"], "by_name_address");
        assert_eq!(json["name"], "한신포차");
    }
}
