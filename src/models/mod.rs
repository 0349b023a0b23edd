mod status;
mod transaction;

pub use status::{RiskClass, Status};
pub use transaction::{Decision, PaymentInput, RiskFactor, Transaction};

/// Rendered in place of any optional input field the backend did not send.
pub const NOT_AVAILABLE: &str = "N/A";
