//! Suppression registry
//!
//! Standing blocks against delivery. Semantically append-only: a later
//! entry for the same email may strengthen its scope (campaign-scoped to
//! global) but never removes an earlier one.
//!
//! Two scopes exist. A globally suppressed email blocks every campaign; a
//! campaign-scoped suppression blocks exactly that campaign. The global
//! list is persisted as a single JSON document; campaign-scoped entries
//! live in a structured log replayed at load time.

use ahash::{AHashMap, AHashSet};
use chrono::{DateTime, Utc};
use herald_common::EmailAddress;
use serde::{Deserialize, Serialize};

/// How widely a suppression applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SuppressionScope {
    /// Blocks delivery to the email for every campaign.
    Global,
    /// Blocks delivery for one campaign only.
    Campaign(String),
}

/// One recorded suppression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuppressionEntry {
    pub email: EmailAddress,
    pub scope: SuppressionScope,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
    /// Where the suppression came from: `opt-out-link`, `inbound-reply`,
    /// `operator`, ...
    pub source: String,
}

/// On-disk shape of the global suppression list.
///
/// `count` is denormalized for humans reading the file; it is recomputed on
/// every save.
#[derive(Debug, Serialize, Deserialize)]
pub(crate) struct GlobalListFile {
    pub suppressed_emails: Vec<EmailAddress>,
    pub count: usize,
    pub last_updated: Option<DateTime<Utc>>,
}

/// In-memory view of all suppressions.
#[derive(Debug, Default)]
pub struct SuppressionRegistry {
    global: AHashSet<EmailAddress>,
    by_campaign: AHashMap<String, AHashSet<EmailAddress>>,
}

impl SuppressionRegistry {
    /// Rebuild the registry from the persisted global list and the replayed
    /// campaign-scoped log.
    #[must_use]
    pub(crate) fn from_parts(
        global: Vec<EmailAddress>,
        campaign_entries: Vec<SuppressionEntry>,
    ) -> Self {
        let mut registry = Self {
            global: global.into_iter().collect(),
            by_campaign: AHashMap::new(),
        };

        for entry in campaign_entries {
            match entry.scope {
                SuppressionScope::Global => {
                    registry.global.insert(entry.email);
                }
                SuppressionScope::Campaign(campaign) => {
                    registry
                        .by_campaign
                        .entry(campaign)
                        .or_default()
                        .insert(entry.email);
                }
            }
        }

        registry
    }

    /// The scope under which `email` is blocked for `campaign`, if any.
    ///
    /// Global scope wins: an email on the global list is reported as
    /// globally suppressed even if it also carries campaign entries.
    #[must_use]
    pub fn lookup(&self, email: &EmailAddress, campaign: &str) -> Option<SuppressionScope> {
        if self.global.contains(email) {
            return Some(SuppressionScope::Global);
        }

        self.by_campaign
            .get(campaign)
            .is_some_and(|set| set.contains(email))
            .then(|| SuppressionScope::Campaign(campaign.to_string()))
    }

    /// Whether `email` is blocked for `campaign`.
    #[must_use]
    pub fn is_suppressed(&self, email: &EmailAddress, campaign: &str) -> bool {
        self.lookup(email, campaign).is_some()
    }

    /// Record a suppression in memory.
    ///
    /// Returns `false` when the exact (email, scope) pair is already
    /// present — the idempotent no-op case, which callers use to skip the
    /// file rewrite.
    pub fn insert(&mut self, entry: &SuppressionEntry) -> bool {
        match &entry.scope {
            SuppressionScope::Global => self.global.insert(entry.email.clone()),
            SuppressionScope::Campaign(campaign) => self
                .by_campaign
                .entry(campaign.clone())
                .or_default()
                .insert(entry.email.clone()),
        }
    }

    /// Number of globally suppressed addresses.
    #[must_use]
    pub fn global_count(&self) -> usize {
        self.global.len()
    }

    /// Snapshot of the global list, sorted for a stable on-disk order.
    #[must_use]
    pub(crate) fn global_sorted(&self) -> Vec<EmailAddress> {
        let mut emails: Vec<_> = self.global.iter().cloned().collect();
        emails.sort_by(|a, b| a.as_str().cmp(b.as_str()));
        emails
    }
}
