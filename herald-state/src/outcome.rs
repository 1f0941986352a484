//! Delivery outcome records
//!
//! One immutable entry per attempted recipient. The outcome log is the
//! campaign's audit trail: the sum of its entries reconstructs exactly what
//! a run did, which is what makes restart-without-resend auditable.

use chrono::{DateTime, Utc};
use herald_common::EmailAddress;
use serde::{Deserialize, Serialize};

/// What happened to one recipient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OutcomeKind {
    /// Transport accepted the message.
    Sent,
    /// The compliance gate denied on suppression.
    SkippedSuppressed,
    /// The compliance gate denied on a daily, per-domain, or cooldown limit.
    SkippedRateLimited,
    /// Transport reported a failure.
    Failed,
}

/// One append-only audit entry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeliveryOutcome {
    pub recipient: EmailAddress,
    pub campaign: String,
    pub attempted_at: DateTime<Utc>,
    pub result: OutcomeKind,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub failure_detail: Option<String>,
}

impl DeliveryOutcome {
    fn new(
        recipient: EmailAddress,
        campaign: &str,
        attempted_at: DateTime<Utc>,
        result: OutcomeKind,
    ) -> Self {
        Self {
            recipient,
            campaign: campaign.to_string(),
            attempted_at,
            result,
            failure_detail: None,
        }
    }

    /// A successful send.
    #[must_use]
    pub fn sent(recipient: EmailAddress, campaign: &str, attempted_at: DateTime<Utc>) -> Self {
        Self::new(recipient, campaign, attempted_at, OutcomeKind::Sent)
    }

    /// Skipped because the recipient is suppressed.
    #[must_use]
    pub fn suppressed(
        recipient: EmailAddress,
        campaign: &str,
        attempted_at: DateTime<Utc>,
    ) -> Self {
        Self::new(
            recipient,
            campaign,
            attempted_at,
            OutcomeKind::SkippedSuppressed,
        )
    }

    /// Skipped because a rate or cooldown limit was hit; `detail` carries
    /// the specific limit for the audit trail.
    #[must_use]
    pub fn rate_limited(
        recipient: EmailAddress,
        campaign: &str,
        attempted_at: DateTime<Utc>,
        detail: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::new(
            recipient,
            campaign,
            attempted_at,
            OutcomeKind::SkippedRateLimited,
        );
        outcome.failure_detail = Some(detail.into());
        outcome
    }

    /// Transport failure.
    #[must_use]
    pub fn failed(
        recipient: EmailAddress,
        campaign: &str,
        attempted_at: DateTime<Utc>,
        detail: impl Into<String>,
    ) -> Self {
        let mut outcome = Self::new(recipient, campaign, attempted_at, OutcomeKind::Failed);
        outcome.failure_detail = Some(detail.into());
        outcome
    }
}
