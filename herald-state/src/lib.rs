//! Durable state for the herald delivery engine.
//!
//! Every unit of state — the suppression registry, the daily rate counters,
//! the tracking-ID manifest, the outcome log — is an independently loadable
//! and saveable file under one tracking root. Corruption of any one file
//! never touches the others, and a corrupted or unreadable unit is treated
//! as empty (logged as a warning) rather than aborting the run.

pub mod archive;
pub mod error;
pub mod manifest;
pub mod outcome;
pub mod rate;
pub mod store;
pub mod suppression;

pub use error::{Result, StateError};
pub use manifest::{TrackingId, TrackingManifest};
pub use outcome::{DeliveryOutcome, OutcomeKind};
pub use rate::RateState;
pub use store::{StatePaths, StateStore};
pub use suppression::{SuppressionEntry, SuppressionRegistry, SuppressionScope};
