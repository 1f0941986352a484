//! CSV source loading and merging

use std::path::{Path, PathBuf};

use ahash::AHashSet;
use csv::ReaderBuilder;
use herald_common::{EmailAddress, Recipient};
use tracing::{debug, warn};

use crate::report::ValidationReport;

/// Header names recognized for the address column.
const EMAIL_HEADERS: &[&str] = &["email", "email_address"];
/// Header names folded into `Recipient::display_name`.
const NAME_HEADERS: &[&str] = &["name", "full_name", "display_name"];
/// Header names folded into `Recipient::organization`.
const ORGANIZATION_HEADERS: &[&str] = &["organization", "organisation", "company"];
/// Header carrying explicit consent. Absent means opted in.
const OPT_IN_HEADER: &str = "opt_in";

/// A resolved recipient set plus everything needed to report on it and to
/// archive the consumed sources afterwards.
#[derive(Debug, Default)]
pub struct Resolution {
    /// Deduplicated recipients in source order.
    pub recipients: Vec<Recipient>,
    /// The source files that were read; the executor archives these once
    /// every recipient has an outcome.
    pub sources: Vec<PathBuf>,
    pub report: ValidationReport,
}

/// Resolve every `.csv` source under `dir`.
///
/// Sources are read in name order; rows keep their file order, so the
/// resolved list is deterministic. A missing directory resolves to an empty
/// roster, and a source that fails to parse is recorded and skipped — both
/// are control-flow decisions for the executor, not errors here.
#[must_use]
pub fn resolve(dir: &Path) -> Resolution {
    let mut resolution = Resolution::default();

    let sources = match source_files(dir) {
        Ok(sources) => sources,
        Err(e) => {
            debug!(dir = %dir.display(), error = %e, "Contacts directory unreadable, empty roster");
            return resolution;
        }
    };

    let mut seen = AHashSet::new();
    for source in sources {
        match read_source(&source, &mut seen, &mut resolution) {
            Ok(()) => {
                resolution.report.sources_read += 1;
                resolution.sources.push(source);
            }
            Err(e) => {
                warn!(source = %source.display(), error = %e, "Skipping unreadable source");
                resolution
                    .report
                    .failed_sources
                    .push((source, e.to_string()));
            }
        }
    }

    let domains: AHashSet<_> = resolution
        .recipients
        .iter()
        .map(herald_common::Recipient::domain)
        .collect();
    resolution.report.unique_domains = domains.len();

    debug!(
        valid = resolution.report.valid,
        dropped = resolution.report.dropped_invalid,
        duplicates = resolution.report.duplicates,
        domains = resolution.report.unique_domains,
        "Resolved recipients"
    );

    resolution
}

fn source_files(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    let mut files: Vec<_> = std::fs::read_dir(dir)?
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| {
            path.is_file()
                && path
                    .extension()
                    .and_then(|ext| ext.to_str())
                    .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"))
        })
        .collect();
    files.sort();
    Ok(files)
}

fn read_source(
    source: &Path,
    seen: &mut AHashSet<EmailAddress>,
    resolution: &mut Resolution,
) -> csv::Result<()> {
    let mut reader = ReaderBuilder::new().flexible(true).from_path(source)?;

    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_ascii_lowercase())
        .collect();

    for record in reader.records() {
        let record = match record {
            Ok(record) => record,
            Err(e) => {
                // One malformed row is a dropped row, not a dead source.
                warn!(source = %source.display(), error = %e, "Dropping malformed row");
                resolution.report.total_rows += 1;
                resolution.report.dropped_invalid += 1;
                continue;
            }
        };

        resolution.report.total_rows += 1;
        merge_row(&headers, &record, seen, resolution);
    }

    Ok(())
}

fn merge_row(
    headers: &[String],
    record: &csv::StringRecord,
    seen: &mut AHashSet<EmailAddress>,
    resolution: &mut Resolution,
) {
    let field = |names: &[&str]| -> Option<String> {
        headers.iter().zip(record.iter()).find_map(|(header, value)| {
            (names.contains(&header.as_str()) && !value.trim().is_empty())
                .then(|| value.trim().to_string())
        })
    };

    let Some(raw_email) = field(EMAIL_HEADERS) else {
        resolution.report.dropped_invalid += 1;
        return;
    };

    let email = match EmailAddress::parse(&raw_email) {
        Ok(email) => email,
        Err(e) => {
            debug!(row_email = %raw_email, error = %e, "Dropping row with invalid email");
            resolution.report.dropped_invalid += 1;
            return;
        }
    };

    if let Some(opt_in) = field(&[OPT_IN_HEADER])
        && matches!(
            opt_in.to_ascii_lowercase().as_str(),
            "0" | "false" | "no" | "n"
        )
    {
        resolution.report.opted_out += 1;
        return;
    }

    if !seen.insert(email.clone()) {
        resolution.report.duplicates += 1;
        return;
    }

    let mut recipient = Recipient::new(email);
    recipient.display_name = field(NAME_HEADERS);
    recipient.organization = field(ORGANIZATION_HEADERS);

    for (header, value) in headers.iter().zip(record.iter()) {
        let consumed = EMAIL_HEADERS.contains(&header.as_str())
            || NAME_HEADERS.contains(&header.as_str())
            || ORGANIZATION_HEADERS.contains(&header.as_str())
            || header == OPT_IN_HEADER;
        if !consumed && !value.trim().is_empty() {
            recipient
                .extras
                .insert(header.clone(), value.trim().to_string());
        }
    }

    resolution.report.valid += 1;
    resolution.recipients.push(recipient);
}
