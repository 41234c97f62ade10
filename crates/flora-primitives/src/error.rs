//! Common error types for primitives

use crate::address::AddressError;
use thiserror::Error;

/// Primitive operation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PrimitiveError {
    /// Address error
    #[error("address error: {0}")]
    Address(#[from] AddressError),

    /// Decimal could not be parsed
    #[error("invalid decimal {0:?}")]
    InvalidDecimal(String),

    /// Coin string could not be parsed
    #[error("invalid coin {0:?}")]
    InvalidCoin(String),

    /// Denomination does not match `[a-zA-Z][a-zA-Z0-9/:._-]{2,127}`
    #[error("invalid denom {0:?}")]
    InvalidDenom(String),

    /// Arithmetic overflow
    #[error("arithmetic overflow")]
    Overflow,
}
