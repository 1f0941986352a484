//! Error types for delivery execution.
//!
//! Almost nothing in the recipient loop is an error: compliance denials and
//! transport failures are recorded outcomes and the loop continues. What
//! remains fatal is losing durable state — an outcome or counter that
//! cannot be persisted even after a retry.

use thiserror::Error;

/// Fatal executor error.
#[derive(Debug, Error)]
pub enum ExecutorError {
    /// A state unit could not be persisted; continuing would risk
    /// re-sending or double-counting on the next run.
    #[error("state persistence failure: {0}")]
    State(#[from] herald_state::StateError),
}
