//! Domain primitives: EventId, Satoshi.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Identifier of a funded event, issued by the event service.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EventId(pub String);

impl EventId {
    /// Create an EventId from a string.
    pub fn new(id: String) -> Self {
        EventId(id)
    }

    /// Get the id as a string reference.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for EventId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("event id must be non-empty and contain no '/' or whitespace")]
pub struct EventIdParseError;

impl FromStr for EventId {
    type Err = EventIdParseError;

    /// Trims surrounding whitespace; rejects ids that would break a URL path segment.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty()
            || trimmed.contains('/')
            || trimmed.chars().any(char::is_whitespace)
        {
            return Err(EventIdParseError);
        }
        Ok(EventId(trimmed.to_string()))
    }
}

/// An integer amount of satoshis.
///
/// Every monetary value in the crate is carried as whole satoshis. Fractional
/// amounts only exist transiently inside fee arithmetic.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
#[serde(transparent)]
pub struct Satoshi(pub u64);

impl Satoshi {
    pub const ZERO: Satoshi = Satoshi(0);

    pub fn new(sats: u64) -> Self {
        Satoshi(sats)
    }

    pub fn as_u64(&self) -> u64 {
        self.0
    }

    pub fn is_zero(&self) -> bool {
        self.0 == 0
    }

    pub fn checked_add(self, other: Satoshi) -> Option<Satoshi> {
        self.0.checked_add(other.0).map(Satoshi)
    }

    /// Signed `self - other`, wide enough that it can never overflow.
    pub fn signed_difference(self, other: Satoshi) -> i128 {
        i128::from(self.0) - i128::from(other.0)
    }
}

impl std::fmt::Display for Satoshi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<u64> for Satoshi {
    fn from(sats: u64) -> Self {
        Satoshi(sats)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_id_parse_trims() {
        let id = EventId::from_str("  evt-42 ").unwrap();
        assert_eq!(id.as_str(), "evt-42");
    }

    #[test]
    fn test_event_id_rejects_path_separators() {
        assert!(EventId::from_str("a/b").is_err());
        assert!(EventId::from_str("").is_err());
        assert!(EventId::from_str("a b").is_err());
    }

    #[test]
    fn test_satoshi_serializes_as_bare_integer() {
        let json = serde_json::to_string(&Satoshi::new(1500)).unwrap();
        assert_eq!(json, "1500");
        let back: Satoshi = serde_json::from_str("1500").unwrap();
        assert_eq!(back, Satoshi::new(1500));
    }

    #[test]
    fn test_signed_difference() {
        assert_eq!(Satoshi::new(300).signed_difference(Satoshi::new(1000)), -700);
        assert_eq!(Satoshi::new(u64::MAX).signed_difference(Satoshi::ZERO), u64::MAX as i128);
    }

    #[test]
    fn test_satoshi_ordering() {
        assert!(Satoshi::new(1) < Satoshi::new(2));
    }
}
