//! Resolution reporting

use std::path::PathBuf;

/// What the resolver saw while reading a contacts directory.
#[derive(Debug, Default, Clone)]
pub struct ValidationReport {
    /// Rows seen across all readable sources.
    pub total_rows: usize,
    /// Rows that produced a deliverable recipient.
    pub valid: usize,
    /// Rows dropped for lacking a syntactically minimal email.
    pub dropped_invalid: usize,
    /// Rows dropped as duplicates of an earlier email.
    pub duplicates: usize,
    /// Rows dropped because their `opt_in` column was explicitly false.
    pub opted_out: usize,
    /// Distinct recipient domains among the valid rows.
    pub unique_domains: usize,
    /// Source files read successfully.
    pub sources_read: usize,
    /// Sources that could not be parsed, with the reason. Non-fatal:
    /// resolution proceeds with the remaining sources.
    pub failed_sources: Vec<(PathBuf, String)>,
}
