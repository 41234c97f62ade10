//! # flora-types
//!
//! Transaction types for Flora.
//!
//! This crate provides:
//! - [`Tx`]: body + auth info + signatures, immutable once received
//! - [`Msg`]: the message set understood by the admission pipeline
//! - [`codec`]: deterministic binary encoding used for size accounting and
//!   `Direct` sign bytes

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod codec;
mod error;
mod msg;
mod tx;

pub use error::{TxError, TxResult};
pub use msg::{type_url, Authorization, Msg, Packet};
pub use tx::{AuthInfo, ExtensionOption, Fee, SignMode, SignerInfo, Tx, TxBody, MAX_GAS_WANTED};
