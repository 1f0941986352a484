//! The delivery executor
//!
//! One campaign at a time, one recipient at a time. The total order over
//! send attempts is what makes the rate counters meaningful, so there is no
//! parallelism here on purpose. The single permitted suspension point is
//! the cooldown wait; cancellation is honored between recipients, never
//! mid-send, so a stopped run always leaves fully-recorded outcomes.

use std::{path::PathBuf, sync::Arc, time::Duration};

use chrono::Utc;
use herald_catalog::{Campaign, CampaignStatus, Template};
use herald_common::{Recipient, Signal};
use herald_compliance::{ComplianceGate, Decision, DenyReason};
use herald_state::{DeliveryOutcome, StateStore, TrackingId};
use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tracing::{debug, info, warn};

use crate::{
    error::ExecutorError,
    message::MessageAssembler,
    transport::Transport,
};

const fn default_max_cooldown_wait_secs() -> u64 {
    60
}

/// Executor tuning.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorConfig {
    /// Upper bound on how long to honor a cooldown denial before skipping
    /// the recipient instead.
    #[serde(default = "default_max_cooldown_wait_secs")]
    pub max_cooldown_wait_secs: u64,
}

impl Default for ExecutorConfig {
    fn default() -> Self {
        Self {
            max_cooldown_wait_secs: default_max_cooldown_wait_secs(),
        }
    }
}

/// What one campaign run did.
#[derive(Debug, Clone, Serialize)]
pub struct CampaignResult {
    pub campaign: String,
    pub tracking_id: TrackingId,
    pub category: String,
    pub template: String,
    pub status: CampaignStatus,
    pub sent: u32,
    pub skipped_suppressed: u32,
    pub skipped_rate_limited: u32,
    pub failed: u32,
    /// Placeholder names that stayed unresolved for at least one message.
    pub unresolved_placeholders: Vec<String>,
    /// True when an operator stop ended the loop early.
    pub cancelled: bool,
}

impl CampaignResult {
    /// Total recipients skipped by the compliance gate.
    #[must_use]
    pub const fn skipped(&self) -> u32 {
        self.skipped_suppressed + self.skipped_rate_limited
    }
}

/// Drives campaigns through the gate and the transport.
#[derive(Debug)]
pub struct DeliveryExecutor {
    gate: ComplianceGate,
    transport: Arc<dyn Transport>,
    assembler: MessageAssembler,
    config: ExecutorConfig,
    shutdown: broadcast::Receiver<Signal>,
}

impl DeliveryExecutor {
    #[must_use]
    pub fn new(
        gate: ComplianceGate,
        transport: Arc<dyn Transport>,
        assembler: MessageAssembler,
        config: ExecutorConfig,
        shutdown: broadcast::Receiver<Signal>,
    ) -> Self {
        Self {
            gate,
            transport,
            assembler,
            config,
            shutdown,
        }
    }

    /// Execute one campaign against an already-resolved recipient list.
    ///
    /// Every recipient gets exactly one recorded outcome (unless the run is
    /// cancelled first). A campaign that attempts nothing — empty roster,
    /// or every recipient denied — finishes as skipped, distinguishing
    /// "nothing to do" from "something went wrong". Consumed sources are
    /// archived afterwards so the next run starts from a clean list.
    ///
    /// # Errors
    ///
    /// Returns an error only on unrecoverable state persistence failure.
    pub async fn execute(
        &mut self,
        store: &mut StateStore,
        campaign: &mut Campaign,
        template: &Template,
        recipients: &[Recipient],
        sources: &[PathBuf],
    ) -> Result<CampaignResult, ExecutorError> {
        campaign.status = CampaignStatus::InProgress;

        let tracking_id = store.allocate_tracking_id(
            &campaign.category,
            &campaign.template_name,
            Utc::now(),
        )?;

        info!(
            campaign = %campaign.id,
            tracking_id = %tracking_id,
            recipients = recipients.len(),
            "Executing campaign"
        );

        let mut result = CampaignResult {
            campaign: campaign.id.as_str().to_string(),
            tracking_id,
            category: campaign.category.clone(),
            template: campaign.template_name.clone(),
            status: CampaignStatus::InProgress,
            sent: 0,
            skipped_suppressed: 0,
            skipped_rate_limited: 0,
            failed: 0,
            unresolved_placeholders: Vec::new(),
            cancelled: false,
        };

        for recipient in recipients {
            // Cancellation is only honored here, between recipients, so a
            // stopped run never leaves a half-recorded outcome.
            if matches!(self.shutdown.try_recv(), Ok(Signal::Shutdown)) {
                warn!(campaign = %campaign.id, "Cancelled between recipients");
                result.cancelled = true;
                break;
            }

            self.process_recipient(store, campaign, template, recipient, &mut result)
                .await?;
        }

        result.status = if result.sent == 0 && result.failed == 0 {
            CampaignStatus::Skipped
        } else {
            CampaignStatus::Completed
        };
        campaign.status = result.status;

        if result.cancelled {
            debug!(campaign = %campaign.id, "Skipping archival for cancelled run");
        } else {
            store.archive_sources(&result.tracking_id, sources, Utc::now())?;
        }

        info!(
            campaign = %campaign.id,
            status = ?result.status,
            sent = result.sent,
            skipped = result.skipped(),
            failed = result.failed,
            "Campaign finished"
        );

        Ok(result)
    }

    /// One recipient: gate, optional cooldown wait, transport, outcome.
    async fn process_recipient(
        &mut self,
        store: &mut StateStore,
        campaign: &Campaign,
        template: &Template,
        recipient: &Recipient,
        result: &mut CampaignResult,
    ) -> Result<(), ExecutorError> {
        let campaign_id = campaign.id.as_str();

        let mut decision = self.gate.check(store, recipient, campaign_id, Utc::now());

        // A cooldown denial is the one decision worth waiting out: sleep
        // (bounded) and re-check once. Still denied means skip, not retry.
        if let Decision::Deny(DenyReason::Cooldown { remaining_secs }) = decision {
            let wait = remaining_secs.min(self.config.max_cooldown_wait_secs);
            debug!(email = %recipient.email, wait, "Waiting out cooldown");
            tokio::time::sleep(Duration::from_secs(wait)).await;
            decision = self.gate.check(store, recipient, campaign_id, Utc::now());
        }

        match decision {
            Decision::Deny(DenyReason::Suppressed) => {
                result.skipped_suppressed += 1;
                store.append_outcome(&DeliveryOutcome::suppressed(
                    recipient.email.clone(),
                    campaign_id,
                    Utc::now(),
                ))?;
            }
            Decision::Deny(reason) => {
                result.skipped_rate_limited += 1;
                store.append_outcome(&DeliveryOutcome::rate_limited(
                    recipient.email.clone(),
                    campaign_id,
                    Utc::now(),
                    reason.detail(),
                ))?;
            }
            Decision::Allow => {
                self.attempt_send(store, campaign, template, recipient, result)
                    .await?;
            }
        }

        Ok(())
    }

    async fn attempt_send(
        &mut self,
        store: &mut StateStore,
        campaign: &Campaign,
        template: &Template,
        recipient: &Recipient,
        result: &mut CampaignResult,
    ) -> Result<(), ExecutorError> {
        let message = self
            .assembler
            .assemble(campaign, template, recipient, Utc::now());

        for name in &message.unresolved {
            if !result.unresolved_placeholders.contains(name) {
                warn!(
                    email = %recipient.email,
                    placeholder = %name,
                    "Placeholder unresolved, left as literal text"
                );
                result.unresolved_placeholders.push(name.clone());
            }
        }

        match self
            .transport
            .send(&recipient.email, &message.subject, &message.body)
            .await
        {
            Ok(()) => {
                let now = Utc::now();
                store.append_outcome(&DeliveryOutcome::sent(
                    recipient.email.clone(),
                    campaign.id.as_str(),
                    now,
                ))?;
                // Counters move only after transport success; a failed send
                // must not consume rate budget.
                self.gate.record_send(store, recipient, now)?;
                result.sent += 1;
                debug!(email = %recipient.email, "Sent");
            }
            Err(e) => {
                result.failed += 1;
                warn!(email = %recipient.email, error = %e, "Transport failure, continuing");
                store.append_outcome(&DeliveryOutcome::failed(
                    recipient.email.clone(),
                    campaign.id.as_str(),
                    Utc::now(),
                    e.to_string(),
                ))?;
            }
        }

        Ok(())
    }
}
