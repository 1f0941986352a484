pub mod address;
pub mod domain;
pub mod logging;
pub mod recipient;

pub use address::{AddressError, EmailAddress};
pub use domain::Domain;
pub use recipient::Recipient;

pub use tracing;

/// Control signal broadcast to long-running components.
#[derive(Debug, Clone, Copy)]
pub enum Signal {
    /// Operator requested an orderly stop. Components finish the unit of
    /// work they are on and exit; nothing new is started.
    Shutdown,
}
