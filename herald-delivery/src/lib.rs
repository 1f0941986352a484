//! Delivery execution for the herald campaign engine.
//!
//! The executor drives one campaign to completion: it pulls each recipient
//! through the compliance gate, invokes the transport for the allowed ones,
//! records an outcome for every recipient, and finally requests archival of
//! the consumed sources. Recipients are processed strictly sequentially —
//! the gate's decision for recipient *n+1* depends on the side effects
//! recorded for recipient *n*.

pub mod error;
pub mod executor;
pub mod message;
pub mod transport;

pub use error::ExecutorError;
pub use executor::{CampaignResult, DeliveryExecutor, ExecutorConfig};
pub use message::{AssembledMessage, MessageAssembler, SenderConfig};
pub use transport::{FileOutboxTransport, Transport, TransportError};
