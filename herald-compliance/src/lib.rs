//! Compliance gating for the herald delivery engine.
//!
//! The gate is the single decision point in front of every send attempt:
//! suppression first, then the daily cap, the per-domain cap, and the
//! cooldown clock — first match wins. It is called once per recipient,
//! immediately before the attempt, so counters always reflect true send
//! order.
//!
//! The gate holds policy only. All mutable state lives in the
//! [`herald_state::StateStore`], passed in by reference; with a single
//! `&mut` path to the store, read-modify-write atomicity is a property of
//! the type system rather than a locking discipline.

pub mod gate;
pub mod link;
pub mod token;
pub mod unsubscribe;

pub use gate::{ComplianceGate, Decision, DenyReason, PolicyConfig, StatsSnapshot};
pub use link::opt_out_url;
pub use token::{TokenError, TokenMinter, load_or_create_secret};
pub use unsubscribe::{UnsubscribeEvent, apply_unsubscribes};
