//! Campaign discovery
//!
//! `discover` walks the campaign root. Immediate subdirectories are
//! domain-categories; nested subdirectories become nested categories
//! (`education/adult-education`). Every template file found becomes a
//! candidate campaign, classified by its optional sidecar descriptor.
//!
//! Ordering: immediate campaigns first, then schedule-now, then dated
//! campaigns ascending by date. Within a tier, categories keep discovery
//! order and templates keep directory-listing order.

use std::{
    cmp::Ordering,
    fs,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::{
    campaign::{Campaign, CampaignId, CampaignStatus, ScheduleMode},
    descriptor::Descriptor,
    error::{CatalogError, Result},
    template::Template,
};

/// Template file extensions treated as campaign candidates. Sidecar
/// descriptors share the stem with a `.toml` extension and are never
/// candidates themselves.
const TEMPLATE_EXTENSIONS: &[&str] = &["txt", "md"];

/// A queued campaign paired with its parsed template.
#[derive(Debug, Clone)]
pub struct Discovered {
    pub campaign: Campaign,
    pub template: Template,
}

/// Aggregate numbers for the discovery report.
#[derive(Debug, Default, Clone)]
pub struct DiscoveryReport {
    /// Candidates seen, valid or not.
    pub discovered: usize,
    /// Candidates that entered the execution queue.
    pub queued: usize,
    /// (template path, reason) for every failed candidate.
    pub failures: Vec<(PathBuf, String)>,
}

/// The result of one catalog scan.
#[derive(Debug)]
pub struct Discovery {
    /// Execution queue, ordered by scheduling tier.
    pub queue: Vec<Discovered>,
    /// Campaigns that failed structural validation; excluded from the
    /// queue, present for the report.
    pub failed: Vec<Campaign>,
    pub report: DiscoveryReport,
}

/// Walk `root` and produce the ordered campaign queue.
///
/// # Errors
///
/// Returns [`CatalogError::RootMissing`] when the root directory does not
/// exist — the only fatal discovery condition. Individual bad templates or
/// descriptors mark their campaign failed and are reported, not raised.
pub fn discover(root: &Path, now: DateTime<Utc>) -> Result<Discovery> {
    if !root.is_dir() {
        return Err(CatalogError::RootMissing(root.to_path_buf()));
    }

    let mut discovery = Discovery {
        queue: Vec::new(),
        failed: Vec::new(),
        report: DiscoveryReport::default(),
    };

    for category_dir in sorted_dirs(root)? {
        let category = category_dir
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().to_string());
        scan_category(&category_dir, &category, now, &mut discovery)?;
    }

    order_queue(&mut discovery.queue);

    info!(
        discovered = discovery.report.discovered,
        queued = discovery.report.queued,
        failed = discovery.report.failures.len(),
        "Campaign discovery complete"
    );

    Ok(discovery)
}

/// Scan one category directory: templates at this level, then nested
/// sub-categories.
fn scan_category(
    dir: &Path,
    category: &str,
    now: DateTime<Utc>,
    discovery: &mut Discovery,
) -> Result<()> {
    for template_path in sorted_template_files(dir)? {
        discovery.report.discovered += 1;

        let template_name = template_path
            .file_stem()
            .map_or_else(String::new, |stem| stem.to_string_lossy().to_string());
        let id = CampaignId::derive(category, &template_name, now);

        match load_candidate(&template_path) {
            Ok((template, descriptor)) => {
                debug!(campaign = %id, mode = ?descriptor.schedule_mode(), "Queued campaign");
                discovery.report.queued += 1;
                discovery.queue.push(Discovered {
                    campaign: Campaign {
                        id,
                        category: category.to_string(),
                        template_path,
                        template_name,
                        mode: descriptor.schedule_mode(),
                        status: CampaignStatus::Queued,
                        subject: descriptor.subject,
                    },
                    template,
                });
            }
            Err(e) => {
                warn!(campaign = %id, error = %e, "Campaign failed discovery validation");
                discovery
                    .report
                    .failures
                    .push((template_path.clone(), e.to_string()));
                discovery.failed.push(Campaign {
                    id,
                    category: category.to_string(),
                    template_path,
                    template_name,
                    mode: ScheduleMode::Immediate,
                    status: CampaignStatus::Failed,
                    subject: None,
                });
            }
        }
    }

    for sub_dir in sorted_dirs(dir)? {
        let name = sub_dir
            .file_name()
            .map_or_else(String::new, |n| n.to_string_lossy().to_string());
        let nested = format!("{category}/{name}");
        scan_category(&sub_dir, &nested, now, discovery)?;
    }

    Ok(())
}

fn load_candidate(template_path: &Path) -> Result<(Template, Descriptor)> {
    let template = Template::load(template_path)?;
    let descriptor = Descriptor::load_for(template_path)?;
    Ok((template, descriptor))
}

/// Stable tier ordering. `sort_by` is stable, so discovery order is
/// preserved within a tier; dated campaigns additionally sort ascending.
fn order_queue(queue: &mut [Discovered]) {
    queue.sort_by(|a, b| {
        let (a, b) = (a.campaign.mode, b.campaign.mode);
        match a.tier().cmp(&b.tier()) {
            Ordering::Equal => match (a, b) {
                (ScheduleMode::Scheduled(da), ScheduleMode::Scheduled(db)) => da.cmp(&db),
                _ => Ordering::Equal,
            },
            other => other,
        }
    });
}

/// Subdirectories of `dir`, sorted by name for deterministic discovery
/// order.
fn sorted_dirs(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut dirs: Vec<_> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_dir())
        .collect();
    dirs.sort();
    Ok(dirs)
}

/// Template files directly inside `dir`, sorted by name.
fn sorted_template_files(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut files: Vec<_> = fs::read_dir(dir)?
        .filter_map(std::result::Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| TEMPLATE_EXTENSIONS.contains(&ext))
        })
        .collect();
    files.sort();
    Ok(files)
}
