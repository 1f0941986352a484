//! Domain newtype for type safety
//!
//! Wraps recipient-domain strings so they cannot be confused with full email
//! addresses or category tags. Rate-limit counters and per-domain policy are
//! keyed by this type.

use std::{
    fmt::{self, Display},
    ops::Deref,
    sync::Arc,
};

use serde::{Deserialize, Serialize};

/// The domain part of a recipient address (`example.org` in
/// `user@example.org`), normalized to ASCII lowercase on construction.
///
/// Per-domain send counters compare domains case-insensitively; normalizing
/// once at the boundary keeps every map lookup a plain equality check.
///
/// # Examples
///
/// ```
/// use herald_common::Domain;
///
/// let domain = Domain::new("Example.ORG");
/// assert_eq!(domain.as_str(), "example.org");
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Domain(Arc<str>);

impl Domain {
    /// Create a new `Domain`, lowercasing the input.
    #[must_use]
    pub fn new(s: impl AsRef<str>) -> Self {
        let s = s.as_ref();
        if s.chars().any(|c| c.is_ascii_uppercase()) {
            Self(Arc::from(s.to_ascii_lowercase()))
        } else {
            Self(Arc::from(s))
        }
    }

    /// Get the domain as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl Display for Domain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl AsRef<str> for Domain {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl Deref for Domain {
    type Target = str;

    fn deref(&self) -> &Self::Target {
        &self.0
    }
}

impl From<&str> for Domain {
    fn from(s: &str) -> Self {
        Self::new(s)
    }
}

impl From<String> for Domain {
    fn from(s: String) -> Self {
        Self::new(s)
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn test_domain_lowercases() {
        let domain = Domain::new("Example.ORG");
        assert_eq!(domain.as_str(), "example.org");
    }

    #[test]
    fn test_domain_already_lowercase() {
        let domain = Domain::new("example.org");
        assert_eq!(domain.as_str(), "example.org");
    }

    #[test]
    fn test_domain_equality_after_normalization() {
        assert_eq!(Domain::new("MAIL.example.com"), Domain::new("mail.example.com"));
        assert_ne!(Domain::new("a.com"), Domain::new("b.com"));
    }

    #[test]
    fn test_domain_display() {
        let domain = Domain::new("display.example.com");
        assert_eq!(format!("{domain}"), "display.example.com");
    }

    #[test]
    fn test_domain_as_map_key() {
        use std::collections::HashMap;

        let mut map = HashMap::new();
        map.insert(Domain::new("Hash.example.com"), 3_u32);
        assert_eq!(map.get(&Domain::new("hash.example.com")), Some(&3));
    }

    #[test]
    fn test_domain_serde() {
        let domain = Domain::new("serde.example.com");
        let serialized = serde_json::to_string(&domain).unwrap();
        assert_eq!(serialized, "\"serde.example.com\"");

        let deserialized: Domain = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, domain);
    }
}
