//! Engine configuration
//!
//! One TOML file with a section per component. Every field has a default,
//! so an empty file — or no file at all — yields a working engine rooted in
//! the current directory.
//!
//! ```toml
//! [paths]
//! campaigns_dir = "campaigns"
//! contacts_dir = "contacts"
//! tracking_dir = "tracking"
//!
//! [policy]
//! daily_limit = 50
//! per_domain_limit = 5
//! min_delay_secs = 30
//!
//! [catalog]
//! overdue = "catch-up"
//!
//! [sender]
//! from_name = "Acme Outreach"
//! opt_out_base_url = "https://outreach.example.org/opt-out"
//! ```

use std::path::{Path, PathBuf};

use herald_catalog::OverduePolicy;
use herald_compliance::PolicyConfig;
use herald_delivery::{ExecutorConfig, SenderConfig};
use serde::Deserialize;

/// Filesystem layout of one installation.
#[derive(Debug, Clone, Deserialize)]
pub struct PathsConfig {
    /// Root of the campaign template tree.
    #[serde(default = "default_campaigns_dir")]
    pub campaigns_dir: PathBuf,

    /// Root of the per-category contacts tree.
    #[serde(default = "default_contacts_dir")]
    pub contacts_dir: PathBuf,

    /// Tracking root: all durable state lives here.
    #[serde(default = "default_tracking_dir")]
    pub tracking_dir: PathBuf,

    /// Outbox directory for the dry-run transport.
    #[serde(default = "default_outbox_dir")]
    pub outbox_dir: PathBuf,
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            campaigns_dir: default_campaigns_dir(),
            contacts_dir: default_contacts_dir(),
            tracking_dir: default_tracking_dir(),
            outbox_dir: default_outbox_dir(),
        }
    }
}

impl PathsConfig {
    /// Where the per-installation token secret lives.
    #[must_use]
    pub fn secret_file(&self) -> PathBuf {
        self.tracking_dir.join(".secret")
    }

    /// Contacts directory for one campaign category.
    #[must_use]
    pub fn contacts_for(&self, category: &str) -> PathBuf {
        self.contacts_dir.join(category)
    }
}

fn default_campaigns_dir() -> PathBuf {
    PathBuf::from("campaigns")
}

fn default_contacts_dir() -> PathBuf {
    PathBuf::from("contacts")
}

fn default_tracking_dir() -> PathBuf {
    PathBuf::from("tracking")
}

fn default_outbox_dir() -> PathBuf {
    PathBuf::from("outbox")
}

/// Catalog behavior switches.
#[derive(Debug, Clone, Copy, Default, Deserialize)]
pub struct CatalogConfig {
    /// What to do with a scheduled campaign whose date has already passed:
    /// catch up (send now) or skip as stale.
    #[serde(default)]
    pub overdue: OverduePolicy,
}

/// Opt-out token settings.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct TokenConfig {
    /// Days a minted opt-out token stays verifiable.
    #[serde(default = "default_token_ttl_days")]
    pub ttl_days: i64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            ttl_days: default_token_ttl_days(),
        }
    }
}

const fn default_token_ttl_days() -> i64 {
    herald_compliance::token::DEFAULT_TTL_DAYS
}

/// Top-level engine configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub paths: PathsConfig,

    #[serde(default)]
    pub policy: PolicyConfig,

    #[serde(default)]
    pub catalog: CatalogConfig,

    #[serde(default)]
    pub sender: SenderConfig,

    #[serde(default)]
    pub executor: ExecutorConfig,

    #[serde(default)]
    pub tokens: TokenConfig,
}

impl EngineConfig {
    /// Load configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("failed to read config {}: {e}", path.display()))?;
        toml::from_str(&content)
            .map_err(|e| anyhow::anyhow!("failed to parse config {}: {e}", path.display()))
    }

    /// Load from `path` when given, defaults otherwise.
    ///
    /// # Errors
    ///
    /// Returns an error if a given path cannot be read or parsed.
    pub fn load_or_default(path: Option<&Path>) -> anyhow::Result<Self> {
        path.map_or_else(|| Ok(Self::default()), Self::load)
    }
}
