//! Herald command-line interface.

use std::{path::PathBuf, sync::Arc};

use chrono::Utc;
use clap::{Parser, Subcommand};
use herald::{Engine, EngineConfig};
use herald_common::{EmailAddress, Signal, logging};
use herald_compliance::ComplianceGate;
use herald_delivery::FileOutboxTransport;
use herald_state::{StateStore, SuppressionScope};
use tokio::sync::broadcast;
use tracing::{error, info};

#[derive(Debug, Parser)]
#[command(name = "herald", about = "Compliance-gated campaign delivery engine", version)]
struct Cli {
    /// Path to the engine configuration file.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Discover and execute pending campaigns.
    Run {
        /// Write messages to the outbox directory instead of the configured
        /// transport.
        #[arg(long)]
        outbox: Option<PathBuf>,
    },

    /// Scan the campaign root and print the discovery report.
    Discover,

    /// Add an email to the suppression registry.
    Suppress {
        email: String,

        /// Limit the suppression to one campaign instead of all.
        #[arg(long)]
        campaign: Option<String>,

        #[arg(long, default_value = "operator")]
        reason: String,
    },

    /// Print current compliance statistics.
    Stats,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    logging::init();

    let cli = Cli::parse();
    let config = EngineConfig::load_or_default(cli.config.as_deref())?;

    match cli.command {
        Command::Run { outbox } => run(config, outbox).await,
        Command::Discover => discover(&config),
        Command::Suppress {
            email,
            campaign,
            reason,
        } => suppress(&config, &email, campaign, &reason),
        Command::Stats => stats(&config),
    }
}

async fn run(config: EngineConfig, outbox: Option<PathBuf>) -> anyhow::Result<()> {
    let outbox = outbox.unwrap_or_else(|| config.paths.outbox_dir.clone());
    let transport = Arc::new(FileOutboxTransport::new(outbox));

    let (shutdown, _) = broadcast::channel(1);
    let signaller = shutdown.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            info!("Interrupt received, stopping after the current recipient");
            let _ = signaller.send(Signal::Shutdown);
        }
    });

    let engine = Engine::new(config, transport);
    let summary = engine.run(&shutdown).await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    Ok(())
}

fn discover(config: &EngineConfig) -> anyhow::Result<()> {
    let discovery = herald_catalog::discover(&config.paths.campaigns_dir, Utc::now())?;

    for discovered in &discovery.queue {
        println!(
            "queued   {} ({:?})",
            discovered.campaign.id, discovered.campaign.mode
        );
    }
    for campaign in &discovery.failed {
        println!("failed   {}", campaign.id);
    }
    for (path, reason) in &discovery.report.failures {
        error!(path = %path.display(), %reason, "Discovery failure");
    }

    println!(
        "{} discovered, {} queued, {} failed",
        discovery.report.discovered,
        discovery.report.queued,
        discovery.report.failures.len()
    );
    Ok(())
}

fn suppress(
    config: &EngineConfig,
    email: &str,
    campaign: Option<String>,
    reason: &str,
) -> anyhow::Result<()> {
    let email = EmailAddress::parse(email)?;
    let scope = campaign.map_or(SuppressionScope::Global, SuppressionScope::Campaign);

    let mut store = StateStore::open(&config.paths.tracking_dir, Utc::now().date_naive())?;
    let gate = ComplianceGate::new(config.policy.clone());

    let added = gate.add_suppression(&mut store, email, scope, reason, "operator", Utc::now())?;
    println!("{}", if added { "added" } else { "already present" });
    Ok(())
}

fn stats(config: &EngineConfig) -> anyhow::Result<()> {
    let mut store = StateStore::open(&config.paths.tracking_dir, Utc::now().date_naive())?;
    let gate = ComplianceGate::new(config.policy.clone());

    let snapshot = gate.stats(&mut store, Utc::now().date_naive());
    println!("{}", serde_json::to_string_pretty(&snapshot)?);
    Ok(())
}
