//! State error types

use flora_primitives::Address;
use thiserror::Error;

/// State access errors
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StateError {
    /// Account does not exist
    #[error("account {0} does not exist")]
    UnknownAccount(Address),

    /// Balance too low for a debit
    #[error("insufficient funds for {address}: {available}{denom} < {needed}{denom}")]
    InsufficientFunds {
        /// Debited account
        address: Address,
        /// Denomination
        denom: String,
        /// Requested amount
        needed: u128,
        /// Spendable amount
        available: u128,
    },

    /// Arithmetic overflow
    #[error("{0} overflow")]
    Overflow(&'static str),
}

/// Result type for state operations
pub type StateResult<T> = Result<T, StateError>;
