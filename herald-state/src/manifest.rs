//! Tracking-ID manifest
//!
//! A tracking ID namespaces one campaign run's audit artifacts: the outcome
//! records, the per-campaign result file, the archive directory. The
//! manifest remembers every ID ever handed out so repeated runs of the same
//! (category, template) pair on the same day — or even within the same
//! second — can never collide.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// A manifest-guaranteed-unique campaign run identifier.
///
/// Shaped as `CATEGORY_xxxxxxxx_YYYYmmdd_HHMMSS`: the category tag for
/// humans scanning a tracking directory, a short digest of the full
/// (category, template, timestamp) triple, and the allocation timestamp.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TrackingId(String);

impl TrackingId {
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for TrackingId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// The set of every tracking ID ever allocated.
///
/// Persisted as `{ "ids": [...], "last_updated": ... }`. A `BTreeSet` keeps
/// the file diff-stable across rewrites.
#[derive(Debug, Default, Serialize, Deserialize)]
pub struct TrackingManifest {
    #[serde(default)]
    ids: BTreeSet<String>,
    #[serde(default)]
    last_updated: Option<DateTime<Utc>>,
}

impl TrackingManifest {
    /// Allocate a fresh tracking ID for a (category, template) pair.
    ///
    /// The candidate derived from the inputs is checked against the
    /// manifest; on collision a numeric suffix is appended until the ID is
    /// unique. The caller is responsible for persisting the manifest after
    /// a successful allocation.
    pub fn allocate(
        &mut self,
        category: &str,
        template: &str,
        now: DateTime<Utc>,
    ) -> TrackingId {
        let stamp = now.format("%Y%m%d_%H%M%S");
        let digest = Sha256::digest(format!("{category}/{template}/{stamp}").as_bytes());
        let short = &hex::encode(digest)[..8];

        let base = format!("{}_{short}_{stamp}", sanitize_category(category));

        let mut candidate = base.clone();
        let mut suffix = 1_u32;
        while self.ids.contains(&candidate) {
            suffix += 1;
            candidate = format!("{base}_{suffix}");
        }

        self.ids.insert(candidate.clone());
        self.last_updated = Some(now);
        TrackingId(candidate)
    }

    /// Whether an ID has already been handed out.
    #[must_use]
    pub fn contains(&self, id: &TrackingId) -> bool {
        self.ids.contains(&id.0)
    }

    /// Number of IDs ever allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    /// Whether the manifest has never allocated anything.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

/// Make a category tag filesystem- and ID-safe: uppercase, with path
/// separators and whitespace folded to underscores.
fn sanitize_category(category: &str) -> String {
    category
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '-' {
                c.to_ascii_uppercase()
            } else {
                '_'
            }
        })
        .collect()
}
