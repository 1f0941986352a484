//! Error types for campaign discovery.
//!
//! Only an absent root directory is fatal. A single bad template or
//! descriptor marks that one campaign failed and discovery continues.

use std::path::PathBuf;

use thiserror::Error;

/// Catalog error type.
#[derive(Debug, Error)]
pub enum CatalogError {
    /// The campaign root directory does not exist. Fatal for the run.
    #[error("campaign root not found: {0}")]
    RootMissing(PathBuf),

    /// I/O failure while walking the tree.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// A template failed structural validation.
    #[error("template {path} is invalid: {detail}")]
    TemplateInvalid { path: PathBuf, detail: String },

    /// A sidecar descriptor could not be parsed or was inconsistent.
    #[error("descriptor {path} is invalid: {detail}")]
    DescriptorInvalid { path: PathBuf, detail: String },
}

/// Specialized `Result` type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
