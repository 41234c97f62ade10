//! # flora-ante
//!
//! Transaction admission pipeline for Flora.
//!
//! Every transaction passes through an ordered chain of validation stages
//! before it reaches the mempool or block execution. The stages check
//! structure, fees, signatures and account sequences against a snapshot
//! of chain state, charge gas for the work they do, and either admit the
//! transaction with a write set or reject it with a typed error.
//!
//! This crate provides:
//! - [`AnteHandler`]: the composed pipeline, built from [`HandlerOptions`]
//! - [`Context`]: per-run gas meter, events and isolated state view
//! - [`ExecMode`]: check, re-check, simulate and deliver runs with their
//!   skip and relaxation policy
//! - [`AdmissionGateway`]: runs transactions against shared state and
//!   commits successful deliveries
//! - [`AnteConfig`]: TOML configuration for the whole pipeline
//!
//! ## Stage order
//!
//! ```text
//! setup_context -> reject_messages -> authz_limiter -> circuit_breaker
//!   -> extension_options -> validate_basic -> timeout_height -> memo
//!   -> min_gas_price -> tx_size_gas -> deduct_fee -> set_pubkey
//!   -> sig_count -> sig_gas -> sig_verify -> increment_sequence
//!   -> redundant_relay -> gas_wanted
//! ```
//!
//! ## Usage
//!
//! ```ignore
//! use flora_ante::{AdmissionGateway, AnteConfig, ExecMode};
//!
//! let config = AnteConfig::load(path)?;
//! let gateway = AdmissionGateway::new(config.build_handler()?, state, config.block_info(1));
//! let admission = gateway.admit(&tx, ExecMode::CheckOnly)?;
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

mod builder;
mod config;
mod context;
mod error;
mod executor;
mod gas;
mod gateway;
pub mod keepers;
mod mode;
pub mod sign_mode;
mod stages;

pub use builder::{
    allow_extensions, default_authz_denylist, dynamic_fee_checker, reject_extensions,
    AnteHandler, ExtensionChecker, HandlerOptions, DEFAULT_VM_BASE_GAS, DEFAULT_VM_PER_BYTE_GAS,
    DYNAMIC_FEE_EXTENSION,
};
pub use config::{AnteConfig, ConfigError, FeeMarketConfig, VmConfig};
pub use context::{Admission, BlockInfo, Context, Event, StageResult};
pub use error::{AnteError, AnteResult, BuildError, ErrorKind, Rejection};
pub use gas::GasMeter;
pub use gateway::AdmissionGateway;
pub use mode::{ExecMode, ModePolicy};
pub use stages::StageId;
