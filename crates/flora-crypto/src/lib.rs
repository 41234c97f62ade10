//! # flora-crypto
//!
//! Cryptographic primitives for Flora.
//!
//! - Keccak-256 and SHA-256 hashing
//! - secp256k1 ECDSA signing/verification (low-s enforced)
//! - Public keys: cosmos-style secp256k1, Ethereum-style secp256k1 and
//!   threshold multisig, with address derivation
//! - Signature data for single and multisig signers

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod hash;
mod keys;
mod signature;

pub use error::CryptoError;
pub use hash::{keccak256, sha256};
pub use keys::{KeyAlgo, PublicKey, SignatureData};
pub use signature::{sign, sign_message, verify, PrivateKey, Signature, VerifyingKey};
