//! Inbound unsubscribe application
//!
//! An external reader watches the inbound mailbox and periodically supplies
//! detected opt-out requests. The engine's only obligation is to turn each
//! one into a global suppression.

use chrono::{DateTime, Utc};
use herald_common::EmailAddress;
use herald_state::{StateStore, SuppressionScope};
use tracing::info;

use crate::gate::ComplianceGate;

/// One detected opt-out request from the inbound side.
#[derive(Debug, Clone)]
pub struct UnsubscribeEvent {
    pub email: EmailAddress,
    pub detected_at: DateTime<Utc>,
    pub source_message_id: String,
}

/// Apply a batch of detected unsubscribes as global suppressions.
///
/// Returns how many were newly added (already-suppressed addresses are
/// idempotent no-ops).
///
/// # Errors
///
/// Returns an error if the suppression registry cannot be persisted.
pub fn apply_unsubscribes(
    gate: &ComplianceGate,
    store: &mut StateStore,
    events: impl IntoIterator<Item = UnsubscribeEvent>,
) -> herald_state::Result<usize> {
    let mut added = 0;

    for event in events {
        let source = format!("inbound-reply:{}", event.source_message_id);
        if gate.add_suppression(
            store,
            event.email,
            SuppressionScope::Global,
            "unsubscribe-reply",
            source,
            event.detected_at,
        )? {
            added += 1;
        }
    }

    if added > 0 {
        info!(added, "Applied inbound unsubscribes");
    }
    Ok(added)
}
