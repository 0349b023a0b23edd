mod amount;
mod errors;

pub use amount::Amount;
pub use errors::AmountError;

/// Locally assigned key, unique for the lifetime of a store.
pub type TransactionKey = u64;
