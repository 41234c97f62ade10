//! # flora-primitives
//!
//! Primitive types shared by every Flora crate.
//!
//! - [`Address`]: 20-byte account address
//! - [`H256`]: 32-byte digest
//! - [`Coin`] / [`Coins`] / [`DecCoin`]: denominated token amounts
//! - [`Dec`]: 18-decimal fixed-point number used for gas prices

#![warn(missing_docs)]
#![warn(clippy::all)]

mod address;
mod coin;
mod dec;
mod error;
mod hash;
#[cfg(feature = "serde")]
pub mod serde_str;

pub use address::{Address, AddressError};
pub use coin::{validate_denom, Coin, Coins, DecCoin};
pub use dec::Dec;
pub use error::PrimitiveError;
pub use hash::H256;

/// Block height type
pub type BlockHeight = u64;

/// Gas type
pub type Gas = u64;

/// Per-account replay-protection counter
pub type Sequence = u64;
