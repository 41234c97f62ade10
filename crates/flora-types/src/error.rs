//! Transaction validation errors

use thiserror::Error;

/// Stateless transaction validation failure
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TxError {
    /// Transaction carries no messages
    #[error("must contain at least one message")]
    EmptyMessages,

    /// Fee amount is malformed
    #[error("invalid fee amount: {0}")]
    InvalidFee(String),

    /// Gas limit out of range
    #[error("invalid gas limit {gas_limit}: must be within (0, {max}]")]
    InvalidGasLimit {
        /// Declared gas limit
        gas_limit: u64,
        /// Largest accepted gas limit
        max: u64,
    },

    /// No signatures attached
    #[error("no signatures supplied")]
    NoSignatures,

    /// Signature count does not match required signers
    #[error("wrong number of signers; expected {expected}, got {got}")]
    WrongSignerCount {
        /// Required signers
        expected: usize,
        /// Signatures provided
        got: usize,
    },

    /// Signer info count does not match signature count
    #[error("signer info count {infos} does not match signature count {signatures}")]
    SignerInfoMismatch {
        /// Signer infos provided
        infos: usize,
        /// Signatures provided
        signatures: usize,
    },

    /// A message failed its own validation
    #[error("invalid {type_url}: {reason}")]
    InvalidMsg {
        /// Message type
        type_url: &'static str,
        /// Failure reason
        reason: String,
    },
}

/// Result type for transaction validation
pub type TxResult<T> = Result<T, TxError>;
