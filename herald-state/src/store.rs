//! The state store proper
//!
//! [`StateStore`] composes the independently persisted units — suppression
//! registry, daily rate counters, tracking manifest, outcome log — behind
//! one handle. Every read-modify-write goes through a `&mut self` method,
//! which statically gives the single-process atomicity the engine requires:
//! there is exactly one mutable path to each unit.
//!
//! # Persistence discipline
//!
//! Each unit is rewritten via write-to-temp-then-rename so a crash mid-write
//! never leaves a torn file. Reads fail closed: a corrupted or unreadable
//! unit is logged and treated as empty, to be replaced on the next
//! successful write. Writes retry once; a second failure is fatal for the
//! run, because silently losing rate-limit state risks violating sending
//! policy.

use std::{
    fs,
    io::Write,
    path::{Path, PathBuf},
};

use chrono::{DateTime, NaiveDate, Utc};
use herald_common::EmailAddress;
use serde::{Serialize, de::DeserializeOwned};
use tracing::{debug, info, warn};

use crate::{
    archive,
    error::{Result, StateError},
    manifest::{TrackingId, TrackingManifest},
    outcome::DeliveryOutcome,
    rate::RateState,
    suppression::{GlobalListFile, SuppressionEntry, SuppressionRegistry, SuppressionScope},
};

/// Locations of every state unit under one tracking root.
#[derive(Debug, Clone)]
pub struct StatePaths {
    root: PathBuf,
}

impl StatePaths {
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn suppression_file(&self) -> PathBuf {
        self.root.join("suppression_list.json")
    }

    fn campaign_suppression_log(&self) -> PathBuf {
        self.root.join("campaign_suppressions.jsonl")
    }

    fn suppression_audit_log(&self) -> PathBuf {
        self.root.join("suppression_log.jsonl")
    }

    fn rate_file(&self) -> PathBuf {
        self.root.join("rate_limits.json")
    }

    fn manifest_file(&self) -> PathBuf {
        self.root.join("tracking_manifest.json")
    }

    fn outcome_log(&self) -> PathBuf {
        self.root.join("outcomes.jsonl")
    }

    fn archive_root(&self) -> PathBuf {
        self.root.join("archive")
    }

    fn campaign_record_file(&self, category: &str, tracking_id: &TrackingId) -> PathBuf {
        self.root
            .join(category)
            .join("campaigns")
            .join(format!("{tracking_id}.json"))
    }
}

/// Durable engine state behind a single mutable handle.
#[derive(Debug)]
pub struct StateStore {
    paths: StatePaths,
    suppression: SuppressionRegistry,
    rate: RateState,
    manifest: TrackingManifest,
}

impl StateStore {
    /// Open (or create) the tracking root and load every unit.
    ///
    /// Missing or corrupt units load as empty with a warning; only failure
    /// to create the root directory itself is an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the tracking root cannot be created.
    pub fn open(root: impl Into<PathBuf>, today: NaiveDate) -> Result<Self> {
        let paths = StatePaths::new(root);
        fs::create_dir_all(paths.root())?;

        let global: Vec<EmailAddress> = load_json_or_empty::<GlobalListFile>(
            &paths.suppression_file(),
        )
        .map_or_else(Vec::new, |file| file.suppressed_emails);

        let campaign_entries =
            read_jsonl::<SuppressionEntry>(&paths.campaign_suppression_log());
        let suppression = SuppressionRegistry::from_parts(global, campaign_entries);

        let rate = load_json_or_empty::<RateState>(&paths.rate_file())
            .map_or_else(|| RateState::empty(today), |stored| stored.for_day(today));

        let manifest =
            load_json_or_empty::<TrackingManifest>(&paths.manifest_file()).unwrap_or_default();

        info!(
            root = %paths.root().display(),
            suppressed = suppression.global_count(),
            sent_today = rate.total_sent,
            "State store opened"
        );

        Ok(Self {
            paths,
            suppression,
            rate,
            manifest,
        })
    }

    /// The suppression registry, read-only.
    #[must_use]
    pub fn suppression(&self) -> &SuppressionRegistry {
        &self.suppression
    }

    /// Today's rate counters, applying day rollover at read time.
    pub fn rate_for(&mut self, today: NaiveDate) -> &RateState {
        if self.rate.date != today {
            info!(
                stored = %self.rate.date,
                today = %today,
                "Rate state rolled over to new day"
            );
            let stored = std::mem::replace(&mut self.rate, RateState::empty(today));
            self.rate = stored.for_day(today);
        }
        &self.rate
    }

    /// Record one successful send and persist the counters atomically.
    ///
    /// Called by the executor immediately after a successful transport
    /// call — never on a denial or a transport failure, so failed sends
    /// consume no rate budget.
    ///
    /// # Errors
    ///
    /// Returns an error if the rate file cannot be written after a retry.
    pub fn record_send(&mut self, email: &EmailAddress, now: DateTime<Utc>) -> Result<()> {
        let today = now.date_naive();
        let _ = self.rate_for(today);
        self.rate.record(email.domain(), now);
        save_json_atomic(&self.paths.rate_file(), &self.rate)?;

        debug!(
            email = %email,
            total = self.rate.total_sent,
            domain = %email.domain(),
            "Recorded send"
        );
        Ok(())
    }

    /// Append a suppression. Idempotent: re-adding the same (email, scope)
    /// pair changes nothing and writes nothing.
    ///
    /// Returns `true` if the registry changed.
    ///
    /// # Errors
    ///
    /// Returns an error if a registry file cannot be written after a retry.
    pub fn add_suppression(&mut self, entry: &SuppressionEntry) -> Result<bool> {
        if !self.suppression.insert(entry) {
            debug!(email = %entry.email, "Suppression already present, no-op");
            return Ok(false);
        }

        match &entry.scope {
            SuppressionScope::Global => {
                let emails = self.suppression.global_sorted();
                let file = GlobalListFile {
                    count: emails.len(),
                    suppressed_emails: emails,
                    last_updated: Some(entry.recorded_at),
                };
                save_json_atomic(&self.paths.suppression_file(), &file)?;
            }
            SuppressionScope::Campaign(_) => {
                append_jsonl(&self.paths.campaign_suppression_log(), entry)?;
            }
        }

        append_jsonl(&self.paths.suppression_audit_log(), entry)?;

        info!(
            email = %entry.email,
            scope = ?entry.scope,
            reason = %entry.reason,
            source = %entry.source,
            "Suppression recorded"
        );
        Ok(true)
    }

    /// Allocate a tracking ID and persist the manifest.
    ///
    /// # Errors
    ///
    /// Returns an error if the manifest cannot be written after a retry.
    pub fn allocate_tracking_id(
        &mut self,
        category: &str,
        template: &str,
        now: DateTime<Utc>,
    ) -> Result<TrackingId> {
        let id = self.manifest.allocate(category, template, now);
        save_json_atomic(&self.paths.manifest_file(), &self.manifest)?;
        debug!(tracking_id = %id, category, template, "Allocated tracking ID");
        Ok(id)
    }

    /// Append one outcome to the audit log.
    ///
    /// # Errors
    ///
    /// Returns an error if the log cannot be appended to after a retry.
    pub fn append_outcome(&mut self, outcome: &DeliveryOutcome) -> Result<()> {
        append_jsonl(&self.paths.outcome_log(), outcome)
    }

    /// Save a per-campaign result artifact under
    /// `<root>/<category>/campaigns/<tracking-id>.json`.
    ///
    /// # Errors
    ///
    /// Returns an error if the record cannot be written after a retry.
    pub fn save_campaign_record<T: Serialize>(
        &self,
        category: &str,
        tracking_id: &TrackingId,
        record: &T,
    ) -> Result<PathBuf> {
        let path = self.paths.campaign_record_file(category, tracking_id);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        save_json_atomic(&path, record)?;
        Ok(path)
    }

    /// Archive consumed recipient sources for a finished campaign.
    ///
    /// # Errors
    ///
    /// Returns an error if a source cannot be moved into the archive.
    pub fn archive_sources(
        &self,
        tracking_id: &TrackingId,
        sources: &[PathBuf],
        now: DateTime<Utc>,
    ) -> Result<Vec<PathBuf>> {
        archive::archive_sources(&self.paths.archive_root(), tracking_id, sources, now)
    }
}

/// Load a JSON unit, failing closed.
///
/// Missing file → `None` silently. Unreadable or unparseable file → `None`
/// with a warning; the next successful write replaces it.
fn load_json_or_empty<T: DeserializeOwned>(path: &Path) -> Option<T> {
    let bytes = match fs::read(path) {
        Ok(bytes) => bytes,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return None,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "State file unreadable, treating as empty");
            return None;
        }
    };

    match serde_json::from_slice(&bytes) {
        Ok(value) => Some(value),
        Err(e) => {
            warn!(path = %path.display(), error = %e, "State file corrupt, treating as empty");
            None
        }
    }
}

/// Read a JSONL log, skipping (and warning about) malformed lines.
fn read_jsonl<T: DeserializeOwned>(path: &Path) -> Vec<T> {
    let Ok(content) = fs::read_to_string(path) else {
        return Vec::new();
    };

    content
        .lines()
        .filter(|line| !line.trim().is_empty())
        .filter_map(|line| match serde_json::from_str(line) {
            Ok(entry) => Some(entry),
            Err(e) => {
                warn!(path = %path.display(), error = %e, "Skipping malformed log line");
                None
            }
        })
        .collect()
}

/// Rewrite a JSON unit atomically: serialize, write a sibling temp file,
/// rename over the target. Retries the write once.
fn save_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let bytes = serde_json::to_vec_pretty(value)?;

    let write = || -> std::io::Result<()> {
        let temp = temp_sibling(path);
        fs::write(&temp, &bytes)?;
        fs::rename(&temp, path)
    };

    match write() {
        Ok(()) => Ok(()),
        Err(first) => {
            warn!(path = %path.display(), error = %first, "State write failed, retrying once");
            write().map_err(|source| StateError::WriteFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Append one JSON line to a log. Retries once.
fn append_jsonl<T: Serialize>(path: &Path, entry: &T) -> Result<()> {
    let mut line = serde_json::to_vec(entry)?;
    line.push(b'\n');

    let append = || -> std::io::Result<()> {
        fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(path)?
            .write_all(&line)
    };

    match append() {
        Ok(()) => Ok(()),
        Err(first) => {
            warn!(path = %path.display(), error = %first, "Log append failed, retrying once");
            append().map_err(|source| StateError::WriteFailed {
                path: path.to_path_buf(),
                source,
            })
        }
    }
}

/// Hidden temp-file name next to the target, so the rename stays on one
/// filesystem.
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "state".to_string(), |n| n.to_string_lossy().to_string());
    path.with_file_name(format!(".tmp_{name}"))
}
