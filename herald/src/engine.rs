//! Run orchestration
//!
//! One run: discover campaigns, then for each campaign in queue order —
//! readiness check, recipient resolution, gated execution, result record.
//! Campaigns are strictly sequential; the executor serializes recipients
//! within each one.

use std::sync::Arc;

use chrono::Utc;
use herald_catalog::{CampaignStatus, Readiness, discover};
use herald_common::Signal;
use herald_compliance::{ComplianceGate, StatsSnapshot, TokenMinter, load_or_create_secret};
use herald_delivery::{CampaignResult, DeliveryExecutor, MessageAssembler, Transport};
use herald_roster::resolve;
use herald_state::StateStore;
use serde::Serialize;
use tokio::sync::broadcast;
use tracing::{info, warn};

use crate::config::EngineConfig;

/// Aggregate result of one engine run.
#[derive(Debug, Serialize)]
pub struct RunSummary {
    /// Per-campaign results, in execution order.
    pub campaigns: Vec<CampaignResult>,
    /// Candidates seen by discovery.
    pub discovered: usize,
    /// Campaigns that failed discovery validation.
    pub failed_discovery: usize,
    /// Future-dated campaigns left queued for a later run.
    pub deferred: usize,
    /// Past-due campaigns dropped under the skip-stale policy.
    pub stale: usize,
    pub sent: u32,
    pub skipped: u32,
    pub failed: u32,
    /// True when an operator stop ended the run early.
    pub cancelled: bool,
    /// Compliance statistics after the run.
    pub stats: StatsSnapshot,
}

/// The engine: configuration plus a transport.
#[derive(Debug)]
pub struct Engine {
    config: EngineConfig,
    transport: Arc<dyn Transport>,
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig, transport: Arc<dyn Transport>) -> Self {
        Self { config, transport }
    }

    /// Execute one full run.
    ///
    /// # Errors
    ///
    /// Returns an error for the two fatal conditions: an absent campaign
    /// root, and unrecoverable state persistence failure. Everything else
    /// is recorded and the run continues.
    pub async fn run(&self, shutdown: &broadcast::Sender<Signal>) -> anyhow::Result<RunSummary> {
        let now = Utc::now();
        let today = now.date_naive();

        let mut store = StateStore::open(&self.config.paths.tracking_dir, today)?;

        let secret = load_or_create_secret(&self.config.paths.secret_file())?;
        let minter = TokenMinter::new(secret, self.config.tokens.ttl_days);
        let gate = ComplianceGate::new(self.config.policy.clone());
        let assembler = MessageAssembler::new(self.config.sender.clone(), Some(minter));

        let mut executor = DeliveryExecutor::new(
            gate.clone(),
            Arc::clone(&self.transport),
            assembler,
            self.config.executor.clone(),
            shutdown.subscribe(),
        );
        let mut engine_shutdown = shutdown.subscribe();

        let discovery = discover(&self.config.paths.campaigns_dir, now)?;

        let mut summary = RunSummary {
            campaigns: Vec::new(),
            discovered: discovery.report.discovered,
            failed_discovery: discovery.failed.len(),
            deferred: 0,
            stale: 0,
            sent: 0,
            skipped: 0,
            failed: 0,
            cancelled: false,
            stats: gate.stats(&mut store, today),
        };

        for mut discovered in discovery.queue {
            if matches!(engine_shutdown.try_recv(), Ok(Signal::Shutdown)) {
                warn!("Run cancelled between campaigns");
                summary.cancelled = true;
                break;
            }

            let campaign = &mut discovered.campaign;
            match campaign.readiness(today, self.config.catalog.overdue) {
                Readiness::NotDue(date) => {
                    info!(campaign = %campaign.id, %date, "Not yet due, leaving queued");
                    summary.deferred += 1;
                    continue;
                }
                Readiness::Stale(date) => {
                    warn!(campaign = %campaign.id, %date, "Past due under skip policy, skipping");
                    campaign.status = CampaignStatus::Skipped;
                    summary.stale += 1;
                    continue;
                }
                Readiness::Ready => {}
            }

            let contacts_dir = self.config.paths.contacts_for(&campaign.category);
            let resolution = resolve(&contacts_dir);
            info!(
                campaign = %campaign.id,
                valid = resolution.report.valid,
                dropped = resolution.report.dropped_invalid,
                duplicates = resolution.report.duplicates,
                domains = resolution.report.unique_domains,
                "Resolved recipients"
            );
            for (source, reason) in &resolution.report.failed_sources {
                warn!(source = %source.display(), %reason, "Source skipped during resolution");
            }

            let result = executor
                .execute(
                    &mut store,
                    campaign,
                    &discovered.template,
                    &resolution.recipients,
                    &resolution.sources,
                )
                .await?;

            store.save_campaign_record(&result.category, &result.tracking_id, &result)?;

            summary.sent += result.sent;
            summary.skipped += result.skipped();
            summary.failed += result.failed;
            if result.cancelled {
                summary.cancelled = true;
                summary.campaigns.push(result);
                break;
            }
            summary.campaigns.push(result);
        }

        summary.stats = gate.stats(&mut store, today);

        info!(
            campaigns = summary.campaigns.len(),
            sent = summary.sent,
            skipped = summary.skipped,
            failed = summary.failed,
            deferred = summary.deferred,
            remaining_today = summary.stats.remaining_today,
            "Run complete"
        );

        Ok(summary)
    }
}
