//! # flora-state
//!
//! State access for the Flora admission pipeline.
//!
//! This crate provides:
//! - [`StateReader`] / [`StateWriter`]: account, balance and fee allowance access
//! - [`StateCache`]: a write set collected by one pipeline run
//! - [`CachedState`]: an isolated per-run view layered over a snapshot
//! - [`MemoryState`]: the canonical in-memory store a write set commits into

#![warn(missing_docs)]
#![warn(clippy::all)]

mod error;
mod state;
mod traits;

pub use error::{StateError, StateResult};
pub use state::{CachedState, MemoryState, StateCache};
pub use traits::{Account, FeeAllowance, StateReader, StateWriter};
