//! Pipeline construction

use crate::error::BuildError;
use crate::keepers::{
    AccountKeeper, AuthKeeper, AuthParams, Bank, BankKeeper, CircuitKeeper, CircuitRegistry,
    EvmKeeper, FeeGrantKeeper, FeeGrants, FeeMarketKeeper, FlatGasEstimator, PacketIndex,
    RelayIndex, StaticFeeMarket,
};
use crate::sign_mode::{DefaultSignModeHandler, SignModeHandler};
use crate::stages::{self, Stage, StageId};
use flora_primitives::{DecCoin, Gas};
use flora_types::{type_url, ExtensionOption};
use std::collections::HashSet;
use std::sync::Arc;

/// Type URL of the dynamic-fee transaction extension
pub const DYNAMIC_FEE_EXTENSION: &str = "/cosmos.evm.types.v1.ExtensionOptionDynamicFeeTx";

/// Base gas of a VM call for the default estimator
pub const DEFAULT_VM_BASE_GAS: Gas = 21_000;

/// Gas per call-data byte for the default estimator
pub const DEFAULT_VM_PER_BYTE_GAS: Gas = 16;

/// Predicate accepting a critical extension option
pub type ExtensionChecker = Arc<dyn Fn(&ExtensionOption) -> bool + Send + Sync>;

/// Checker that accepts no extension option
pub fn reject_extensions() -> ExtensionChecker {
    Arc::new(|_| false)
}

/// Checker that accepts only the dynamic-fee extension
pub fn dynamic_fee_checker() -> ExtensionChecker {
    Arc::new(|option| option.type_url == DYNAMIC_FEE_EXTENSION)
}

/// Checker that accepts the listed type URLs
pub fn allow_extensions<I, S>(type_urls: I) -> ExtensionChecker
where
    I: IntoIterator<Item = S>,
    S: Into<String>,
{
    let allowed: HashSet<String> = type_urls.into_iter().map(Into::into).collect();
    Arc::new(move |option| allowed.contains(&option.type_url))
}

/// Message types that may not be executed through an authorization
pub fn default_authz_denylist() -> Vec<String> {
    vec![
        type_url::MSG_ETHEREUM_TX.to_string(),
        type_url::MSG_CREATE_VESTING_ACCOUNT.to_string(),
    ]
}

/// Collaborators and settings the pipeline is built from.
///
/// Every keeper except the fee grant keeper is required; the extension
/// checker defaults to [`reject_extensions`].
#[derive(Clone)]
pub struct HandlerOptions {
    /// Account store
    pub account_keeper: Option<Arc<dyn AccountKeeper>>,
    /// Balance store
    pub bank_keeper: Option<Arc<dyn BankKeeper>>,
    /// Fee allowance store; without it fee granters are rejected
    pub fee_grant_keeper: Option<Arc<dyn FeeGrantKeeper>>,
    /// Global minimum gas price
    pub fee_market_keeper: Option<Arc<dyn FeeMarketKeeper>>,
    /// VM denom and execution gas estimates
    pub evm_keeper: Option<Arc<dyn EvmKeeper>>,
    /// Disabled message types
    pub circuit_keeper: Option<Arc<dyn CircuitKeeper>>,
    /// Sign bytes per signing mode
    pub sign_mode_handler: Option<Arc<dyn SignModeHandler>>,
    /// Relay de-duplication
    pub relay_index: Option<Arc<dyn RelayIndex>>,
    /// Critical extension option predicate
    pub extension_checker: Option<ExtensionChecker>,
    /// Message types denied inside delegated execution
    pub authz_denylist: Vec<String>,
    /// Node-local minimum gas prices, enforced before block execution
    pub min_gas_prices: Vec<DecCoin>,
}

impl Default for HandlerOptions {
    fn default() -> Self {
        Self {
            account_keeper: None,
            bank_keeper: None,
            fee_grant_keeper: None,
            fee_market_keeper: None,
            evm_keeper: None,
            circuit_keeper: None,
            sign_mode_handler: None,
            relay_index: None,
            extension_checker: None,
            authz_denylist: default_authz_denylist(),
            min_gas_prices: Vec::new(),
        }
    }
}

impl HandlerOptions {
    /// Options wired to the in-memory keepers: no fee floor, no disabled
    /// message types, fees in `evm_denom`
    pub fn in_memory(params: AuthParams, evm_denom: &str) -> Self {
        Self::default()
            .account_keeper(Arc::new(AuthKeeper::new(params)))
            .bank_keeper(Arc::new(Bank))
            .fee_grant_keeper(Arc::new(FeeGrants))
            .fee_market_keeper(Arc::new(StaticFeeMarket::default()))
            .evm_keeper(Arc::new(FlatGasEstimator::new(
                evm_denom,
                DEFAULT_VM_BASE_GAS,
                DEFAULT_VM_PER_BYTE_GAS,
            )))
            .circuit_keeper(Arc::new(CircuitRegistry::default()))
            .sign_mode_handler(Arc::new(DefaultSignModeHandler))
            .relay_index(Arc::new(PacketIndex::new()))
    }

    /// Set the account keeper
    pub fn account_keeper(mut self, keeper: Arc<dyn AccountKeeper>) -> Self {
        self.account_keeper = Some(keeper);
        self
    }

    /// Set the bank keeper
    pub fn bank_keeper(mut self, keeper: Arc<dyn BankKeeper>) -> Self {
        self.bank_keeper = Some(keeper);
        self
    }

    /// Set the fee grant keeper
    pub fn fee_grant_keeper(mut self, keeper: Arc<dyn FeeGrantKeeper>) -> Self {
        self.fee_grant_keeper = Some(keeper);
        self
    }

    /// Set the fee market keeper
    pub fn fee_market_keeper(mut self, keeper: Arc<dyn FeeMarketKeeper>) -> Self {
        self.fee_market_keeper = Some(keeper);
        self
    }

    /// Set the VM keeper
    pub fn evm_keeper(mut self, keeper: Arc<dyn EvmKeeper>) -> Self {
        self.evm_keeper = Some(keeper);
        self
    }

    /// Set the circuit keeper
    pub fn circuit_keeper(mut self, keeper: Arc<dyn CircuitKeeper>) -> Self {
        self.circuit_keeper = Some(keeper);
        self
    }

    /// Set the sign mode handler
    pub fn sign_mode_handler(mut self, handler: Arc<dyn SignModeHandler>) -> Self {
        self.sign_mode_handler = Some(handler);
        self
    }

    /// Set the relay index
    pub fn relay_index(mut self, index: Arc<dyn RelayIndex>) -> Self {
        self.relay_index = Some(index);
        self
    }

    /// Set the extension option checker
    pub fn extension_checker(mut self, checker: ExtensionChecker) -> Self {
        self.extension_checker = Some(checker);
        self
    }

    /// Replace the authorization denylist
    pub fn authz_denylist(mut self, type_urls: Vec<String>) -> Self {
        self.authz_denylist = type_urls;
        self
    }

    /// Set node-local minimum gas prices
    pub fn min_gas_prices(mut self, prices: Vec<DecCoin>) -> Self {
        self.min_gas_prices = prices;
        self
    }

    pub(crate) fn into_bundle(self) -> Result<AnteBundle, BuildError> {
        fn require<T: ?Sized>(
            keeper: Option<Arc<T>>,
            name: &'static str,
        ) -> Result<Arc<T>, BuildError> {
            keeper.ok_or(BuildError::MissingCollaborator(name))
        }

        Ok(AnteBundle {
            account_keeper: require(self.account_keeper, "account keeper")?,
            bank_keeper: require(self.bank_keeper, "bank keeper")?,
            fee_grant_keeper: self.fee_grant_keeper,
            fee_market_keeper: require(self.fee_market_keeper, "fee market keeper")?,
            evm_keeper: require(self.evm_keeper, "evm keeper")?,
            circuit_keeper: require(self.circuit_keeper, "circuit keeper")?,
            sign_mode_handler: require(self.sign_mode_handler, "sign mode handler")?,
            relay_index: require(self.relay_index, "relay index")?,
            extension_checker: self.extension_checker.unwrap_or_else(reject_extensions),
            authz_denylist: self.authz_denylist,
            min_gas_prices: self.min_gas_prices,
        })
    }
}

/// Resolved collaborators shared read-only by every run
pub(crate) struct AnteBundle {
    pub(crate) account_keeper: Arc<dyn AccountKeeper>,
    pub(crate) bank_keeper: Arc<dyn BankKeeper>,
    pub(crate) fee_grant_keeper: Option<Arc<dyn FeeGrantKeeper>>,
    pub(crate) fee_market_keeper: Arc<dyn FeeMarketKeeper>,
    pub(crate) evm_keeper: Arc<dyn EvmKeeper>,
    pub(crate) circuit_keeper: Arc<dyn CircuitKeeper>,
    pub(crate) sign_mode_handler: Arc<dyn SignModeHandler>,
    pub(crate) relay_index: Arc<dyn RelayIndex>,
    pub(crate) extension_checker: ExtensionChecker,
    pub(crate) authz_denylist: Vec<String>,
    pub(crate) min_gas_prices: Vec<DecCoin>,
}

/// The composed admission handler
pub struct AnteHandler {
    pub(crate) bundle: AnteBundle,
    pub(crate) stages: Vec<Stage>,
}

impl AnteHandler {
    /// Build the pipeline, failing if a required collaborator is missing
    pub fn build(options: HandlerOptions) -> Result<Self, BuildError> {
        Ok(Self {
            bundle: options.into_bundle()?,
            stages: stages::pipeline(),
        })
    }

    /// Stage order
    pub fn stage_ids(&self) -> Vec<StageId> {
        self.stages.iter().map(|stage| stage.id).collect()
    }

    /// Auth parameters from the account keeper
    pub fn params(&self) -> AuthParams {
        self.bundle.account_keeper.params()
    }
}

impl std::fmt::Debug for AnteHandler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnteHandler")
            .field("stages", &self.stage_ids())
            .field("authz_denylist", &self.bundle.authz_denylist)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_collaborator_fails_build() {
        let options = HandlerOptions::default().bank_keeper(Arc::new(Bank));
        let err = AnteHandler::build(options).unwrap_err();
        assert_eq!(err, BuildError::MissingCollaborator("account keeper"));

        let mut options = HandlerOptions::in_memory(AuthParams::default(), "aflora");
        options.relay_index = None;
        assert_eq!(
            AnteHandler::build(options).unwrap_err(),
            BuildError::MissingCollaborator("relay index")
        );
    }

    #[test]
    fn test_fee_grant_keeper_is_optional() {
        let mut options = HandlerOptions::in_memory(AuthParams::default(), "aflora");
        options.fee_grant_keeper = None;
        let handler = AnteHandler::build(options).unwrap();
        assert!(handler.bundle.fee_grant_keeper.is_none());
    }

    #[test]
    fn test_order_does_not_depend_on_options() {
        let plain = AnteHandler::build(HandlerOptions::in_memory(AuthParams::default(), "aflora"))
            .unwrap();
        let custom = AnteHandler::build(
            HandlerOptions::in_memory(AuthParams::default(), "petal")
                .authz_denylist(vec![])
                .extension_checker(dynamic_fee_checker()),
        )
        .unwrap();
        assert_eq!(plain.stage_ids(), StageId::ORDER.to_vec());
        assert_eq!(plain.stage_ids(), custom.stage_ids());
    }

    #[test]
    fn test_extension_checkers() {
        let dynamic = ExtensionOption {
            type_url: DYNAMIC_FEE_EXTENSION.into(),
            value: vec![],
        };
        let other = ExtensionOption {
            type_url: "/other.Ext".into(),
            value: vec![],
        };
        assert!(!reject_extensions()(&dynamic));
        assert!(dynamic_fee_checker()(&dynamic));
        assert!(!dynamic_fee_checker()(&other));
        let listed = allow_extensions(["/other.Ext"]);
        assert!(listed(&other));
        assert!(!listed(&dynamic));
    }
}
