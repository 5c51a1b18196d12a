//! Domain types for city resolution and search history with strong typing.
//!
//! IDs follow the Newtype pattern so a `CityId` can never be passed where a
//! `UserId` is expected.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unique identifier for a City in the directory.
///
/// # Examples
///
/// ```rust
/// use weatherdesk::domain::CityId;
///
/// let id = CityId::new(42);
/// assert_eq!(id.value(), 42);
/// assert_eq!(id.to_string(), "42");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct CityId(i32);

impl CityId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        debug_assert!(id >= 0, "CityId should be non-negative");
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for CityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<CityId> for i32 {
    fn from(id: CityId) -> Self {
        id.0
    }
}

impl From<i32> for CityId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

impl Serialize for CityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_i32(self.0)
    }
}

impl<'de> Deserialize<'de> for CityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let id = i32::deserialize(deserializer)?;
        Ok(Self::new(id))
    }
}

/// Unique identifier for an authenticated user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct UserId(i32);

impl UserId {
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    #[must_use]
    pub const fn value(&self) -> i32 {
        self.0
    }
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<i32> for UserId {
    fn from(id: i32) -> Self {
        Self::new(id)
    }
}

/// Who performed a search, resolved by the caller before entering the core.
///
/// For `User` the IP is informational only; for `Anonymous` it is the key
/// of the recent-cities cache.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Identity {
    User { id: UserId, ip: Option<String> },
    Anonymous { ip: String },
}

impl Identity {
    #[must_use]
    pub fn user(id: impl Into<UserId>, ip: Option<String>) -> Self {
        Self::User { id: id.into(), ip }
    }

    #[must_use]
    pub fn anonymous(ip: impl Into<String>) -> Self {
        Self::Anonymous { ip: ip.into() }
    }

    #[must_use]
    pub const fn user_id(&self) -> Option<UserId> {
        match self {
            Self::User { id, .. } => Some(*id),
            Self::Anonymous { .. } => None,
        }
    }

    #[must_use]
    pub fn ip(&self) -> Option<&str> {
        match self {
            Self::User { ip, .. } => ip.as_deref(),
            Self::Anonymous { ip } => Some(ip.as_str()),
        }
    }

    #[must_use]
    pub const fn is_anonymous(&self) -> bool {
        matches!(self, Self::Anonymous { .. })
    }
}

impl fmt::Display for Identity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::User { id, .. } => write!(f, "user:{id}"),
            Self::Anonymous { ip } => write!(f, "anonymous:{ip}"),
        }
    }
}

/// Canonical city record. Coordinates are fixed at creation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub id: CityId,
    pub name: String,
    pub latitude: f64,
    pub longitude: f64,
}

/// Normalized form of a city name used for uniqueness and matching.
///
/// Trims surrounding whitespace, collapses inner runs of whitespace and
/// lowercases with Unicode rules, so "  new   YORK " and "New York" share a key.
#[must_use]
pub fn normalize_city_name(name: &str) -> String {
    name.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

/// One immutable search event.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEvent {
    pub id: i32,
    pub user_id: Option<UserId>,
    pub city_id: CityId,
    pub searched_at: String,
    pub ip_address: Option<String>,
}

/// Search event with its city attached, as listed in a user's history.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SearchEntry {
    pub id: i32,
    pub city: City,
    pub searched_at: String,
    pub ip_address: Option<String>,
}

/// Row of the ranked per-city aggregation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CityCount {
    pub city_name: String,
    pub count: i64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn city_id_conversions() {
        let id = CityId::new(42);
        assert_eq!(id.value(), 42);
        assert_eq!(id.to_string(), "42");
        assert_eq!(i32::from(id), 42);
        assert_eq!(CityId::from(42), id);
    }

    #[test]
    fn city_id_serialization() {
        let id = CityId::new(7);
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "7");
        let back: CityId = serde_json::from_str(&json).unwrap();
        assert_eq!(back, id);
    }

    #[test]
    fn identity_accessors() {
        let user = Identity::user(3, Some("10.0.0.1".to_string()));
        assert_eq!(user.user_id(), Some(UserId::new(3)));
        assert_eq!(user.ip(), Some("10.0.0.1"));
        assert!(!user.is_anonymous());

        let anon = Identity::anonymous("192.168.1.5");
        assert_eq!(anon.user_id(), None);
        assert_eq!(anon.ip(), Some("192.168.1.5"));
        assert!(anon.is_anonymous());
        assert_eq!(anon.to_string(), "anonymous:192.168.1.5");
    }

    #[test]
    fn normalization_is_case_and_space_insensitive() {
        assert_eq!(normalize_city_name("  New   YORK "), "new york");
        assert_eq!(normalize_city_name("MÜNCHEN"), "münchen");
        assert_eq!(normalize_city_name(""), "");
    }
}
