//! Pipeline configuration

use crate::builder::{
    allow_extensions, default_authz_denylist, reject_extensions, HandlerOptions,
    DEFAULT_VM_BASE_GAS, DEFAULT_VM_PER_BYTE_GAS, DYNAMIC_FEE_EXTENSION,
};
use crate::context::BlockInfo;
use crate::error::BuildError;
use crate::keepers::{
    AuthKeeper, AuthParams, Bank, CircuitRegistry, FeeGrants, FlatGasEstimator, PacketIndex,
    StaticFeeMarket,
};
use crate::sign_mode::DefaultSignModeHandler;
use crate::AnteHandler;
use flora_primitives::{validate_denom, BlockHeight, Dec, DecCoin, Gas, PrimitiveError};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use thiserror::Error;

/// Configuration loading failure
#[derive(Debug, Error)]
pub enum ConfigError {
    /// File could not be read or written
    #[error("config io error: {0}")]
    Io(#[from] std::io::Error),

    /// TOML could not be parsed
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),

    /// TOML could not be produced
    #[error("failed to serialize config: {0}")]
    Serialize(#[from] toml::ser::Error),

    /// A value is out of range
    #[error("invalid config: {0}")]
    Invalid(String),

    /// A price or denom could not be parsed
    #[error(transparent)]
    Primitive(#[from] PrimitiveError),

    /// The pipeline could not be assembled
    #[error(transparent)]
    Build(#[from] BuildError),
}

/// Global fee floor settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeeMarketConfig {
    /// Minimum gas price; zero disables the floor
    #[serde(default)]
    pub min_gas_price: Dec,
    /// Denom fees must be paid in
    #[serde(default = "default_evm_denom")]
    pub evm_denom: String,
}

impl Default for FeeMarketConfig {
    fn default() -> Self {
        Self {
            min_gas_price: Dec::ZERO,
            evm_denom: default_evm_denom(),
        }
    }
}

/// Execution gas estimator settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VmConfig {
    /// Gas per contract call
    #[serde(default = "default_vm_base_gas")]
    pub base_gas: Gas,
    /// Gas per call-data byte
    #[serde(default = "default_vm_per_byte_gas")]
    pub per_byte_gas: Gas,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self {
            base_gas: default_vm_base_gas(),
            per_byte_gas: default_vm_per_byte_gas(),
        }
    }
}

/// Admission pipeline configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnteConfig {
    /// Chain identifier bound into sign bytes
    #[serde(default = "default_chain_id")]
    pub chain_id: String,
    /// Node-local minimum gas prices, e.g. `"0.025aflora"`
    #[serde(default)]
    pub minimum_gas_prices: String,
    /// Auth module parameters
    #[serde(default)]
    pub auth: AuthParams,
    /// Global fee floor
    #[serde(default)]
    pub fee_market: FeeMarketConfig,
    /// Block gas limit
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub block_max_gas: Option<Gas>,
    /// Message types denied inside delegated execution
    #[serde(default = "default_authz_denylist")]
    pub authz_denylist: Vec<String>,
    /// Message types disabled at startup
    #[serde(default)]
    pub disabled_msg_types: Vec<String>,
    /// Accepted critical extension options
    #[serde(default = "default_allowed_extension_options")]
    pub allowed_extension_options: Vec<String>,
    /// Execution gas estimator
    #[serde(default)]
    pub vm: VmConfig,
}

fn default_chain_id() -> String {
    "flora_9000-1".to_string()
}

fn default_evm_denom() -> String {
    "aflora".to_string()
}

fn default_vm_base_gas() -> Gas {
    DEFAULT_VM_BASE_GAS
}

fn default_vm_per_byte_gas() -> Gas {
    DEFAULT_VM_PER_BYTE_GAS
}

fn default_allowed_extension_options() -> Vec<String> {
    vec![DYNAMIC_FEE_EXTENSION.to_string()]
}

impl Default for AnteConfig {
    fn default() -> Self {
        Self {
            chain_id: default_chain_id(),
            minimum_gas_prices: String::new(),
            auth: AuthParams::default(),
            fee_market: FeeMarketConfig::default(),
            block_max_gas: None,
            authz_denylist: default_authz_denylist(),
            disabled_msg_types: Vec::new(),
            allowed_extension_options: default_allowed_extension_options(),
            vm: VmConfig::default(),
        }
    }
}

impl AnteConfig {
    /// Load and validate a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_toml_str(&content)
    }

    /// Parse and validate TOML
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: AnteConfig = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Write as TOML
    pub fn save(&self, path: &Path) -> Result<(), ConfigError> {
        std::fs::write(path, toml::to_string_pretty(self)?)?;
        Ok(())
    }

    /// Check value ranges
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chain_id.is_empty() {
            return Err(ConfigError::Invalid("chain_id must not be empty".into()));
        }
        validate_denom(&self.fee_market.evm_denom)?;
        if self.auth.tx_sig_limit == 0 {
            return Err(ConfigError::Invalid("auth.tx_sig_limit must be positive".into()));
        }
        if self.block_max_gas == Some(0) {
            return Err(ConfigError::Invalid("block_max_gas must be positive".into()));
        }
        self.min_gas_prices()?;
        Ok(())
    }

    /// Parsed node-local minimum gas prices
    pub fn min_gas_prices(&self) -> Result<Vec<DecCoin>, ConfigError> {
        Ok(DecCoin::parse_list(&self.minimum_gas_prices)?)
    }

    /// Block at `height` on the configured chain
    pub fn block_info(&self, height: BlockHeight) -> BlockInfo {
        let block = BlockInfo::new(self.chain_id.clone(), height);
        match self.block_max_gas {
            Some(max) => block.with_max_gas(max),
            None => block,
        }
    }

    /// Pipeline options wired to the in-memory keepers
    pub fn handler_options(&self) -> Result<HandlerOptions, ConfigError> {
        let extension_checker = if self.allowed_extension_options.is_empty() {
            reject_extensions()
        } else {
            allow_extensions(self.allowed_extension_options.iter().cloned())
        };
        let estimator = FlatGasEstimator::new(
            self.fee_market.evm_denom.clone(),
            self.vm.base_gas,
            self.vm.per_byte_gas,
        );

        Ok(HandlerOptions::default()
            .account_keeper(Arc::new(AuthKeeper::new(self.auth.clone())))
            .bank_keeper(Arc::new(Bank))
            .fee_grant_keeper(Arc::new(FeeGrants))
            .fee_market_keeper(Arc::new(StaticFeeMarket::new(self.fee_market.min_gas_price)))
            .evm_keeper(Arc::new(estimator))
            .circuit_keeper(Arc::new(CircuitRegistry::with_disabled(
                self.disabled_msg_types.iter().cloned(),
            )))
            .sign_mode_handler(Arc::new(DefaultSignModeHandler))
            .relay_index(Arc::new(PacketIndex::new()))
            .extension_checker(extension_checker)
            .authz_denylist(self.authz_denylist.clone())
            .min_gas_prices(self.min_gas_prices()?))
    }

    /// Build the pipeline from this configuration
    pub fn build_handler(&self) -> Result<AnteHandler, ConfigError> {
        Ok(AnteHandler::build(self.handler_options()?)?)
    }
}
