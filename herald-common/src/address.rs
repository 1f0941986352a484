//! Email address parsing and normalization
//!
//! Addresses entering the engine from contact files or unsubscribe feeds are
//! normalized exactly once, here: trimmed, lowercased, and checked for the
//! minimal structure the engine relies on (exactly one `@`, non-empty local
//! and domain parts). Everything downstream — suppression lookups, rate
//! counters, deduplication — compares normalized addresses byte-for-byte.

use std::{
    fmt::{self, Display},
    sync::Arc,
};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::domain::Domain;

/// Reasons an input string fails address normalization.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum AddressError {
    /// Input was empty after trimming.
    #[error("empty address")]
    Empty,

    /// Input did not contain exactly one `@`.
    #[error("expected exactly one '@' in {0:?}")]
    MalformedSeparator(String),

    /// The part before the `@` was empty.
    #[error("empty local part in {0:?}")]
    EmptyLocalPart(String),

    /// The part after the `@` was empty.
    #[error("empty domain in {0:?}")]
    EmptyDomain(String),
}

/// A normalized email address.
///
/// Stored lowercase with surrounding whitespace removed. The position of the
/// `@` is kept so `local_part()` and `domain()` are slice operations rather
/// than re-parses.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EmailAddress {
    address: Arc<str>,
    at: usize,
}

impl EmailAddress {
    /// Parse and normalize an address.
    ///
    /// # Errors
    ///
    /// Returns an [`AddressError`] if the trimmed input is empty, contains
    /// zero or multiple `@` characters, or has an empty local/domain part.
    pub fn parse(input: &str) -> Result<Self, AddressError> {
        let trimmed = input.trim();
        if trimmed.is_empty() {
            return Err(AddressError::Empty);
        }

        let lowered = trimmed.to_ascii_lowercase();
        let mut ats = lowered.match_indices('@');
        let Some((at, _)) = ats.next() else {
            return Err(AddressError::MalformedSeparator(lowered));
        };
        if ats.next().is_some() {
            return Err(AddressError::MalformedSeparator(lowered));
        }

        if at == 0 {
            return Err(AddressError::EmptyLocalPart(lowered));
        }
        if at + 1 == lowered.len() {
            return Err(AddressError::EmptyDomain(lowered));
        }

        Ok(Self {
            address: Arc::from(lowered),
            at,
        })
    }

    /// The full normalized address.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.address
    }

    /// Everything before the `@`.
    #[must_use]
    pub fn local_part(&self) -> &str {
        &self.address[..self.at]
    }

    /// The domain after the `@`, as a [`Domain`].
    #[must_use]
    pub fn domain(&self) -> Domain {
        Domain::new(&self.address[self.at + 1..])
    }
}

impl Display for EmailAddress {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.address)
    }
}

impl TryFrom<String> for EmailAddress {
    type Error = AddressError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::parse(&value)
    }
}

impl From<EmailAddress> for String {
    fn from(value: EmailAddress) -> Self {
        value.address.to_string()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_normalizes_case_and_whitespace() {
        let addr = EmailAddress::parse("  User@Example.ORG ").unwrap();
        assert_eq!(addr.as_str(), "user@example.org");
        assert_eq!(addr.local_part(), "user");
        assert_eq!(addr.domain().as_str(), "example.org");
    }

    #[test]
    fn test_parse_rejects_missing_at() {
        assert_eq!(
            EmailAddress::parse("userexample.org"),
            Err(AddressError::MalformedSeparator("userexample.org".into()))
        );
    }

    #[test]
    fn test_parse_rejects_multiple_ats() {
        assert!(matches!(
            EmailAddress::parse("user@host@example.org"),
            Err(AddressError::MalformedSeparator(_))
        ));
    }

    #[test]
    fn test_parse_rejects_empty_parts() {
        assert!(matches!(
            EmailAddress::parse("@example.org"),
            Err(AddressError::EmptyLocalPart(_))
        ));
        assert!(matches!(
            EmailAddress::parse("user@"),
            Err(AddressError::EmptyDomain(_))
        ));
        assert_eq!(EmailAddress::parse("   "), Err(AddressError::Empty));
    }

    #[test]
    fn test_serde_round_trip() {
        let addr = EmailAddress::parse("user@example.org").unwrap();
        let json = serde_json::to_string(&addr).unwrap();
        assert_eq!(json, "\"user@example.org\"");

        let back: EmailAddress = serde_json::from_str(&json).unwrap();
        assert_eq!(back, addr);
    }

    #[test]
    fn test_serde_rejects_malformed() {
        let result: Result<EmailAddress, _> = serde_json::from_str("\"not-an-address\"");
        assert!(result.is_err());
    }
}
