//! Campaign model
//!
//! A campaign is one template scheduled for delivery to a category's
//! recipients. Campaigns are created at scan time, mutated by the executor
//! as they progress, and terminal once completed, skipped, or failed.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Campaign identity: domain-category plus template path plus the scan
/// timestamp, unique even across repeated scans of the same template.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct CampaignId(String);

impl CampaignId {
    /// Derive an ID from the campaign's coordinates.
    #[must_use]
    pub fn derive(category: &str, template_name: &str, now: DateTime<Utc>) -> Self {
        Self(format!(
            "{category}/{template_name}@{}",
            now.format("%Y%m%dT%H%M%S")
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for CampaignId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// When a campaign should go out.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ScheduleMode {
    /// No descriptor, or an explicit `immediate`: send in the first tier.
    Immediate,
    /// Explicitly marked to go out on this run, after immediates.
    ScheduleNow,
    /// Send on (or after) a specific date.
    Scheduled(NaiveDate),
}

impl ScheduleMode {
    /// Execution tier for queue ordering: immediates, then schedule-now,
    /// then dated campaigns ascending.
    #[must_use]
    pub const fn tier(self) -> u8 {
        match self {
            Self::Immediate => 0,
            Self::ScheduleNow => 1,
            Self::Scheduled(_) => 2,
        }
    }
}

/// Lifecycle of a campaign within one run.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CampaignStatus {
    Queued,
    InProgress,
    Completed,
    /// Nothing to do: no eligible recipients, or not yet due.
    Skipped,
    /// Something went wrong: invalid template at discovery time.
    Failed,
}

/// What to do with a scheduled campaign whose date has already passed.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum OverduePolicy {
    /// Treat the campaign as immediate and send it now.
    #[default]
    CatchUp,
    /// Treat the campaign as stale and skip it.
    Skip,
}

/// Whether a campaign may execute today.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Readiness {
    /// Due now.
    Ready,
    /// Scheduled for a future date; stays queued.
    NotDue(NaiveDate),
    /// Past-due and the overdue policy says to drop it.
    Stale(NaiveDate),
}

/// One template + recipient-targeting unit scheduled for delivery.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Campaign {
    pub id: CampaignId,
    /// Domain-category tag: the (possibly nested) directory path under the
    /// campaign root, e.g. `education/adult-education`.
    pub category: String,
    pub template_path: PathBuf,
    /// Template file stem, used for tracking-ID allocation.
    pub template_name: String,
    pub mode: ScheduleMode,
    pub status: CampaignStatus,
    /// Subject line from the sidecar descriptor, when present.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subject: Option<String>,
}

impl Campaign {
    /// Decide whether this campaign may execute on `today`.
    ///
    /// Immediate and schedule-now campaigns are always ready. A dated
    /// campaign is ready on its date; earlier it is not due, and later it
    /// is either caught up or stale depending on `policy`.
    #[must_use]
    pub fn readiness(&self, today: NaiveDate, policy: OverduePolicy) -> Readiness {
        match self.mode {
            ScheduleMode::Immediate | ScheduleMode::ScheduleNow => Readiness::Ready,
            ScheduleMode::Scheduled(date) => {
                if date > today {
                    Readiness::NotDue(date)
                } else if date == today {
                    Readiness::Ready
                } else {
                    match policy {
                        OverduePolicy::CatchUp => Readiness::Ready,
                        OverduePolicy::Skip => Readiness::Stale(date),
                    }
                }
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn campaign(mode: ScheduleMode) -> Campaign {
        Campaign {
            id: CampaignId::derive("retail", "spring", "2026-08-06T09:00:00Z".parse().unwrap()),
            category: "retail".to_string(),
            template_path: PathBuf::from("campaigns/retail/spring.txt"),
            template_name: "spring".to_string(),
            mode,
            status: CampaignStatus::Queued,
            subject: None,
        }
    }

    fn day(s: &str) -> NaiveDate {
        s.parse().unwrap()
    }

    #[test]
    fn test_id_incorporates_category_template_and_timestamp() {
        let id = CampaignId::derive("retail", "spring", "2026-08-06T09:00:00Z".parse().unwrap());
        assert_eq!(id.as_str(), "retail/spring@20260806T090000");
    }

    #[test]
    fn test_immediate_always_ready() {
        let c = campaign(ScheduleMode::Immediate);
        assert_eq!(
            c.readiness(day("2026-08-06"), OverduePolicy::Skip),
            Readiness::Ready
        );
    }

    #[test]
    fn test_future_date_not_due() {
        let c = campaign(ScheduleMode::Scheduled(day("2026-09-01")));
        assert_eq!(
            c.readiness(day("2026-08-06"), OverduePolicy::CatchUp),
            Readiness::NotDue(day("2026-09-01"))
        );
    }

    #[test]
    fn test_on_date_is_ready() {
        let c = campaign(ScheduleMode::Scheduled(day("2026-08-06")));
        assert_eq!(
            c.readiness(day("2026-08-06"), OverduePolicy::Skip),
            Readiness::Ready
        );
    }

    #[test]
    fn test_overdue_policy_switch() {
        let c = campaign(ScheduleMode::Scheduled(day("2026-08-01")));
        assert_eq!(
            c.readiness(day("2026-08-06"), OverduePolicy::CatchUp),
            Readiness::Ready
        );
        assert_eq!(
            c.readiness(day("2026-08-06"), OverduePolicy::Skip),
            Readiness::Stale(day("2026-08-01"))
        );
    }

    #[test]
    fn test_tier_ordering() {
        assert!(ScheduleMode::Immediate.tier() < ScheduleMode::ScheduleNow.tier());
        assert!(
            ScheduleMode::ScheduleNow.tier() < ScheduleMode::Scheduled(day("2026-08-06")).tier()
        );
    }
}
