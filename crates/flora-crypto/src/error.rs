//! Cryptographic errors

use thiserror::Error;

/// Cryptographic operation error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum CryptoError {
    /// Signing failed
    #[error("signing failed: {0}")]
    SigningFailed(String),

    /// Invalid signature encoding
    #[error("invalid signature: {0}")]
    InvalidSignature(String),

    /// Invalid public key encoding
    #[error("invalid public key: {0}")]
    InvalidPublicKey(String),

    /// Signature shape does not fit the key (single vs multisig)
    #[error("signature does not match key type {0}")]
    KeyTypeMismatch(&'static str),

    /// Multisig threshold is zero or above the number of keys
    #[error("invalid multisig threshold {threshold} for {keys} keys")]
    InvalidThreshold {
        /// Declared threshold
        threshold: u32,
        /// Number of sub-keys
        keys: usize,
    },
}
