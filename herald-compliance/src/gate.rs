//! The compliance gate

use chrono::{DateTime, NaiveDate, Utc};
use herald_common::{Domain, EmailAddress, Recipient};
use herald_state::{StateStore, SuppressionEntry, SuppressionScope};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sending policy limits.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PolicyConfig {
    /// Maximum sends per day, total.
    #[serde(default = "default_daily_limit")]
    pub daily_limit: u32,

    /// Maximum sends per recipient domain per day.
    #[serde(default = "default_per_domain_limit")]
    pub per_domain_limit: u32,

    /// Minimum elapsed seconds between consecutive sends.
    #[serde(default = "default_min_delay_secs")]
    pub min_delay_secs: u64,
}

impl Default for PolicyConfig {
    fn default() -> Self {
        Self {
            daily_limit: default_daily_limit(),
            per_domain_limit: default_per_domain_limit(),
            min_delay_secs: default_min_delay_secs(),
        }
    }
}

const fn default_daily_limit() -> u32 {
    50
}

const fn default_per_domain_limit() -> u32 {
    5
}

const fn default_min_delay_secs() -> u64 {
    30
}

/// Why a send was denied.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DenyReason {
    /// The recipient is suppressed, globally or for this campaign.
    Suppressed,
    /// Today's total send cap is exhausted.
    DailyLimit,
    /// Today's cap for the recipient's domain is exhausted.
    DomainLimit(Domain),
    /// Not enough time has passed since the previous send. The executor
    /// may wait `remaining_secs` and re-check once.
    Cooldown { remaining_secs: u64 },
}

impl DenyReason {
    /// Short detail string for the outcome audit trail.
    #[must_use]
    pub fn detail(&self) -> String {
        match self {
            Self::Suppressed => "suppressed".to_string(),
            Self::DailyLimit => "daily-limit".to_string(),
            Self::DomainLimit(domain) => format!("domain-limit {domain}"),
            Self::Cooldown { remaining_secs } => format!("cooldown {remaining_secs}s"),
        }
    }
}

/// The gate's answer for one (recipient, campaign) pair.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Decision {
    Allow,
    Deny(DenyReason),
}

/// Point-in-time compliance statistics.
#[derive(Debug, Clone, Serialize)]
pub struct StatsSnapshot {
    pub date: NaiveDate,
    pub suppressed_count: usize,
    pub sent_today: u32,
    pub daily_limit: u32,
    pub remaining_today: u32,
    pub domains_contacted: usize,
    pub per_domain_limit: u32,
}

/// Policy evaluation in front of the send loop.
#[derive(Debug, Clone)]
pub struct ComplianceGate {
    policy: PolicyConfig,
}

impl ComplianceGate {
    #[must_use]
    pub const fn new(policy: PolicyConfig) -> Self {
        Self { policy }
    }

    #[must_use]
    pub const fn policy(&self) -> &PolicyConfig {
        &self.policy
    }

    /// Decide whether `recipient` may be sent `campaign` right now.
    ///
    /// Evaluation order, first match wins:
    /// 1. global suppression
    /// 2. campaign-scoped suppression
    /// 3. daily total at or above cap
    /// 4. per-domain count at or above cap
    /// 5. cooldown clock
    ///
    /// The check mutates nothing: counters move only via
    /// [`ComplianceGate::record_send`] after a successful transport call.
    pub fn check(
        &self,
        store: &mut StateStore,
        recipient: &Recipient,
        campaign: &str,
        now: DateTime<Utc>,
    ) -> Decision {
        if let Some(scope) = store
            .suppression()
            .lookup(&recipient.email, campaign)
        {
            debug!(email = %recipient.email, ?scope, "Denied: suppressed");
            return Decision::Deny(DenyReason::Suppressed);
        }

        let rate = store.rate_for(now.date_naive());

        if rate.total_sent >= self.policy.daily_limit {
            debug!(
                sent = rate.total_sent,
                limit = self.policy.daily_limit,
                "Denied: daily limit reached"
            );
            return Decision::Deny(DenyReason::DailyLimit);
        }

        let domain = recipient.domain();
        if rate.sent_to(&domain) >= self.policy.per_domain_limit {
            debug!(%domain, limit = self.policy.per_domain_limit, "Denied: domain limit reached");
            return Decision::Deny(DenyReason::DomainLimit(domain));
        }

        if let Some(elapsed) = rate.seconds_since_last_send(now) {
            let elapsed = u64::try_from(elapsed.max(0)).unwrap_or(0);
            if elapsed < self.policy.min_delay_secs {
                let remaining_secs = self.policy.min_delay_secs - elapsed;
                debug!(remaining_secs, "Denied: cooldown");
                return Decision::Deny(DenyReason::Cooldown { remaining_secs });
            }
        }

        Decision::Allow
    }

    /// Record a successful send. Call immediately after the transport call
    /// succeeds — never on a denial or a transport failure.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate state cannot be persisted; this is
    /// fatal for the run.
    pub fn record_send(
        &self,
        store: &mut StateStore,
        recipient: &Recipient,
        now: DateTime<Utc>,
    ) -> herald_state::Result<()> {
        store.record_send(&recipient.email, now)
    }

    /// Append a suppression entry. Idempotent.
    ///
    /// # Errors
    ///
    /// Returns an error if the registry cannot be persisted.
    pub fn add_suppression(
        &self,
        store: &mut StateStore,
        email: EmailAddress,
        scope: SuppressionScope,
        reason: impl Into<String>,
        source: impl Into<String>,
        now: DateTime<Utc>,
    ) -> herald_state::Result<bool> {
        store.add_suppression(&SuppressionEntry {
            email,
            scope,
            reason: reason.into(),
            recorded_at: now,
            source: source.into(),
        })
    }

    /// Current compliance statistics for reporting.
    pub fn stats(&self, store: &mut StateStore, today: NaiveDate) -> StatsSnapshot {
        let suppressed_count = store.suppression().global_count();
        let rate = store.rate_for(today);

        StatsSnapshot {
            date: rate.date,
            suppressed_count,
            sent_today: rate.total_sent,
            daily_limit: self.policy.daily_limit,
            remaining_today: self.policy.daily_limit.saturating_sub(rate.total_sent),
            domains_contacted: rate.domain_counts.len(),
            per_domain_limit: self.policy.per_domain_limit,
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<Utc> {
        s.parse().unwrap()
    }

    fn recipient(addr: &str) -> Recipient {
        Recipient::new(EmailAddress::parse(addr).unwrap())
    }

    fn store() -> (tempfile::TempDir, StateStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = StateStore::open(dir.path(), "2026-08-06".parse().unwrap()).unwrap();
        (dir, store)
    }

    fn gate(daily: u32, per_domain: u32, min_delay: u64) -> ComplianceGate {
        ComplianceGate::new(PolicyConfig {
            daily_limit: daily,
            per_domain_limit: per_domain,
            min_delay_secs: min_delay,
        })
    }

    #[test]
    fn test_allow_when_nothing_applies() {
        let (_dir, mut store) = store();
        let gate = gate(50, 5, 0);

        assert_eq!(
            gate.check(&mut store, &recipient("a@one.org"), "CAMP", at("2026-08-06T09:00:00Z")),
            Decision::Allow
        );
    }

    #[test]
    fn test_global_suppression_blocks_every_campaign() {
        let (_dir, mut store) = store();
        let gate = gate(50, 5, 0);
        let now = at("2026-08-06T09:00:00Z");

        gate.add_suppression(
            &mut store,
            EmailAddress::parse("a@one.org").unwrap(),
            SuppressionScope::Global,
            "opt-out",
            "test",
            now,
        )
        .unwrap();

        for campaign in ["CAMP_1", "CAMP_2", "CAMP_3"] {
            assert_eq!(
                gate.check(&mut store, &recipient("a@one.org"), campaign, now),
                Decision::Deny(DenyReason::Suppressed)
            );
        }
    }

    #[test]
    fn test_campaign_suppression_blocks_exactly_that_campaign() {
        let (_dir, mut store) = store();
        let gate = gate(50, 5, 0);
        let now = at("2026-08-06T09:00:00Z");

        gate.add_suppression(
            &mut store,
            EmailAddress::parse("a@one.org").unwrap(),
            SuppressionScope::Campaign("CAMP_1".to_string()),
            "complaint",
            "test",
            now,
        )
        .unwrap();

        assert_eq!(
            gate.check(&mut store, &recipient("a@one.org"), "CAMP_1", now),
            Decision::Deny(DenyReason::Suppressed)
        );
        assert_eq!(
            gate.check(&mut store, &recipient("a@one.org"), "CAMP_2", now),
            Decision::Allow
        );
    }

    #[test]
    fn test_daily_limit_reached() {
        let (_dir, mut store) = store();
        let gate = gate(2, 5, 0);

        gate.record_send(&mut store, &recipient("a@one.org"), at("2026-08-06T09:00:00Z"))
            .unwrap();
        gate.record_send(&mut store, &recipient("b@two.org"), at("2026-08-06T09:01:00Z"))
            .unwrap();

        assert_eq!(
            gate.check(&mut store, &recipient("c@three.org"), "CAMP", at("2026-08-06T09:02:00Z")),
            Decision::Deny(DenyReason::DailyLimit)
        );
    }

    #[test]
    fn test_domain_limit_cites_domain() {
        let (_dir, mut store) = store();
        let gate = gate(50, 1, 0);

        gate.record_send(&mut store, &recipient("a@one.org"), at("2026-08-06T09:00:00Z"))
            .unwrap();

        assert_eq!(
            gate.check(&mut store, &recipient("b@one.org"), "CAMP", at("2026-08-06T09:01:00Z")),
            Decision::Deny(DenyReason::DomainLimit(Domain::new("one.org")))
        );
        // A different domain is still fine.
        assert_eq!(
            gate.check(&mut store, &recipient("c@two.org"), "CAMP", at("2026-08-06T09:01:00Z")),
            Decision::Allow
        );
    }

    #[test]
    fn test_cooldown_reports_remaining() {
        let (_dir, mut store) = store();
        let gate = gate(50, 5, 30);

        gate.record_send(&mut store, &recipient("a@one.org"), at("2026-08-06T09:00:00Z"))
            .unwrap();

        assert_eq!(
            gate.check(&mut store, &recipient("b@two.org"), "CAMP", at("2026-08-06T09:00:10Z")),
            Decision::Deny(DenyReason::Cooldown { remaining_secs: 20 })
        );
        assert_eq!(
            gate.check(&mut store, &recipient("b@two.org"), "CAMP", at("2026-08-06T09:00:30Z")),
            Decision::Allow
        );
    }

    #[test]
    fn test_suppression_wins_over_limits() {
        let (_dir, mut store) = store();
        let gate = gate(0, 0, 1000);
        let now = at("2026-08-06T09:00:00Z");

        gate.add_suppression(
            &mut store,
            EmailAddress::parse("a@one.org").unwrap(),
            SuppressionScope::Global,
            "opt-out",
            "test",
            now,
        )
        .unwrap();

        // Everything would deny here; suppression is evaluated first.
        assert_eq!(
            gate.check(&mut store, &recipient("a@one.org"), "CAMP", now),
            Decision::Deny(DenyReason::Suppressed)
        );
    }

    #[test]
    fn test_denied_check_consumes_no_budget() {
        let (_dir, mut store) = store();
        let gate = gate(1, 1, 0);
        let now = at("2026-08-06T09:00:00Z");

        gate.record_send(&mut store, &recipient("a@one.org"), now).unwrap();

        // Deny repeatedly; counters must not move.
        for _ in 0..3 {
            let _ = gate.check(&mut store, &recipient("b@one.org"), "CAMP", now);
        }
        let stats = gate.stats(&mut store, now.date_naive());
        assert_eq!(stats.sent_today, 1);
    }

    #[test]
    fn test_day_rollover_reopens_budget() {
        let (_dir, mut store) = store();
        let gate = gate(1, 1, 0);

        gate.record_send(&mut store, &recipient("a@one.org"), at("2026-08-06T09:00:00Z"))
            .unwrap();
        assert_eq!(
            gate.check(&mut store, &recipient("b@two.org"), "CAMP", at("2026-08-06T10:00:00Z")),
            Decision::Deny(DenyReason::DailyLimit)
        );

        // First check after midnight sees fresh counters.
        assert_eq!(
            gate.check(&mut store, &recipient("b@two.org"), "CAMP", at("2026-08-07T00:00:01Z")),
            Decision::Allow
        );
    }

    #[test]
    fn test_stats_snapshot() {
        let (_dir, mut store) = store();
        let gate = gate(10, 5, 0);

        gate.record_send(&mut store, &recipient("a@one.org"), at("2026-08-06T09:00:00Z"))
            .unwrap();
        gate.record_send(&mut store, &recipient("b@two.org"), at("2026-08-06T09:01:00Z"))
            .unwrap();

        let stats = gate.stats(&mut store, "2026-08-06".parse().unwrap());
        assert_eq!(stats.sent_today, 2);
        assert_eq!(stats.remaining_today, 8);
        assert_eq!(stats.domains_contacted, 2);
    }
}
