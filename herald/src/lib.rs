//! Herald: a compliance-gated campaign delivery engine.
//!
//! Ties the catalog, resolver, gate, executor, and state store into one
//! sequential run: discover campaigns, resolve each campaign's recipients,
//! gate and send, record outcomes, archive consumed sources.

pub mod config;
pub mod engine;

pub use config::{CatalogConfig, EngineConfig, PathsConfig};
pub use engine::{Engine, RunSummary};
