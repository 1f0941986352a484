//! Campaign catalog for the herald delivery engine.
//!
//! Walks a hierarchical template store whose subdirectories are
//! domain-categories, classifies every discovered template by scheduling
//! mode, and produces the ordered execution queue the delivery executor
//! consumes.

pub mod campaign;
pub mod descriptor;
pub mod error;
pub mod scan;
pub mod template;

pub use campaign::{Campaign, CampaignId, CampaignStatus, OverduePolicy, Readiness, ScheduleMode};
pub use descriptor::Descriptor;
pub use error::{CatalogError, Result};
pub use scan::{Discovered, Discovery, DiscoveryReport, discover};
pub use template::{Rendered, Template, substitute};
