//! Recipient resolution for the herald delivery engine.
//!
//! Reads every tabular source under a campaign's contacts directory, merges
//! rows, normalizes and validates addresses, and deduplicates by email
//! keeping the first occurrence. A dataset of zero valid recipients is not
//! an error at this layer — the executor turns an empty roster into a
//! skipped campaign.

pub mod report;
pub mod resolve;

pub use report::ValidationReport;
pub use resolve::{Resolution, resolve};
