//! Recipient model
//!
//! A recipient is one row of a resolved contact list: a normalized address
//! plus whatever extra columns the source carried, kept verbatim for
//! template substitution. Recipients are loaded fresh per campaign run and
//! never mutated.

use ahash::AHashMap;
use serde::{Deserialize, Serialize};

use crate::{address::EmailAddress, domain::Domain};

/// A single deliverable contact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recipient {
    /// Normalized address; the unique key within a campaign.
    pub email: EmailAddress,

    /// Display name, if the source provided one.
    #[serde(default)]
    pub display_name: Option<String>,

    /// Organization, if the source provided one.
    #[serde(default)]
    pub organization: Option<String>,

    /// Extra source columns, passed through to template substitution keyed
    /// by column name.
    #[serde(default)]
    pub extras: AHashMap<String, String>,
}

impl Recipient {
    /// Create a recipient with no metadata beyond its address.
    #[must_use]
    pub fn new(email: EmailAddress) -> Self {
        Self {
            email,
            display_name: None,
            organization: None,
            extras: AHashMap::new(),
        }
    }

    /// The recipient's domain, derived from the address.
    #[must_use]
    pub fn domain(&self) -> Domain {
        self.email.domain()
    }

    /// Look up a substitution field by name.
    ///
    /// Well-known fields (`email`, `name`, `organization`) resolve from the
    /// typed members; anything else falls through to the extra columns.
    #[must_use]
    pub fn field(&self, name: &str) -> Option<&str> {
        match name {
            "email" => Some(self.email.as_str()),
            "name" => self.display_name.as_deref(),
            "organization" => self.organization.as_deref(),
            _ => self.extras.get(name).map(String::as_str),
        }
    }
}
