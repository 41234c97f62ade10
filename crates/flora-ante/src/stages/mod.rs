//! The admission stages.
//!
//! Every stage is a plain function with the same signature: it takes the
//! collaborator bundle, the transaction and the context by value, and
//! returns the context or a [`Rejection`](crate::Rejection). The order is
//! fixed by [`StageId::ORDER`].

mod execution;
mod fees;
mod messages;
mod relay;
mod setup;
mod signatures;

use crate::builder::AnteBundle;
use crate::context::StageResult;
use crate::Context;
use flora_types::Tx;
use std::fmt;

/// Stage identifier
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum StageId {
    /// Installs the gas meter and gas wanted
    ContextInitializer,
    /// Rejects message types forbidden at the top level
    RejectUnsupportedMessage,
    /// Rejects denied message types inside delegated execution
    AuthorizationScopeLimiter,
    /// Rejects message types disabled in the circuit registry
    CircuitBreaker,
    /// Rejects unknown critical extension options
    ExtensionOptionValidator,
    /// Stateless transaction checks
    BasicStructuralValidator,
    /// Rejects transactions past their timeout height
    TimeoutHeightValidator,
    /// Enforces the memo length limit
    MemoValidator,
    /// Enforces the fee market floor
    MinGasPriceValidator,
    /// Charges gas per encoded byte
    TxSizeGasConsumer,
    /// Deducts the fee from the payer or granter
    FeeDeductor,
    /// Resolves and stores signer public keys
    PubKeySetter,
    /// Bounds the number of signatures
    SignatureCountValidator,
    /// Charges signature verification gas
    SignatureGasConsumer,
    /// Checks sequences and signatures
    SignatureVerifier,
    /// Bumps every signer's sequence
    SequenceIncrementer,
    /// Ends the run early for fully redundant relays
    RedundantRelayFilter,
    /// Checks declared gas against VM execution needs
    ExecutionGasWantedValidator,
}

impl StageId {
    /// Execution order
    pub const ORDER: [StageId; 18] = [
        StageId::ContextInitializer,
        StageId::RejectUnsupportedMessage,
        StageId::AuthorizationScopeLimiter,
        StageId::CircuitBreaker,
        StageId::ExtensionOptionValidator,
        StageId::BasicStructuralValidator,
        StageId::TimeoutHeightValidator,
        StageId::MemoValidator,
        StageId::MinGasPriceValidator,
        StageId::TxSizeGasConsumer,
        StageId::FeeDeductor,
        StageId::PubKeySetter,
        StageId::SignatureCountValidator,
        StageId::SignatureGasConsumer,
        StageId::SignatureVerifier,
        StageId::SequenceIncrementer,
        StageId::RedundantRelayFilter,
        StageId::ExecutionGasWantedValidator,
    ];

    /// Short snake_case name, used in logs and metrics
    pub fn name(&self) -> &'static str {
        match self {
            StageId::ContextInitializer => "setup_context",
            StageId::RejectUnsupportedMessage => "reject_messages",
            StageId::AuthorizationScopeLimiter => "authz_limiter",
            StageId::CircuitBreaker => "circuit_breaker",
            StageId::ExtensionOptionValidator => "extension_options",
            StageId::BasicStructuralValidator => "validate_basic",
            StageId::TimeoutHeightValidator => "timeout_height",
            StageId::MemoValidator => "memo",
            StageId::MinGasPriceValidator => "min_gas_price",
            StageId::TxSizeGasConsumer => "tx_size_gas",
            StageId::FeeDeductor => "deduct_fee",
            StageId::PubKeySetter => "set_pubkey",
            StageId::SignatureCountValidator => "sig_count",
            StageId::SignatureGasConsumer => "sig_gas",
            StageId::SignatureVerifier => "sig_verify",
            StageId::SequenceIncrementer => "increment_sequence",
            StageId::RedundantRelayFilter => "redundant_relay",
            StageId::ExecutionGasWantedValidator => "gas_wanted",
        }
    }

    fn run_fn(&self) -> StageFn {
        match self {
            StageId::ContextInitializer => setup::setup_context,
            StageId::RejectUnsupportedMessage => messages::reject_unsupported,
            StageId::AuthorizationScopeLimiter => messages::limit_authz,
            StageId::CircuitBreaker => messages::circuit_breaker,
            StageId::ExtensionOptionValidator => setup::extension_options,
            StageId::BasicStructuralValidator => setup::validate_basic,
            StageId::TimeoutHeightValidator => setup::timeout_height,
            StageId::MemoValidator => setup::validate_memo,
            StageId::MinGasPriceValidator => fees::min_gas_price,
            StageId::TxSizeGasConsumer => fees::consume_tx_size_gas,
            StageId::FeeDeductor => fees::deduct_fee,
            StageId::PubKeySetter => signatures::set_pubkeys,
            StageId::SignatureCountValidator => signatures::validate_sig_count,
            StageId::SignatureGasConsumer => signatures::consume_sig_gas,
            StageId::SignatureVerifier => signatures::verify_signatures,
            StageId::SequenceIncrementer => signatures::increment_sequences,
            StageId::RedundantRelayFilter => relay::filter_redundant_relay,
            StageId::ExecutionGasWantedValidator => execution::check_gas_wanted,
        }
    }
}

impl fmt::Display for StageId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Uniform stage signature
pub(crate) type StageFn = for<'a> fn(&AnteBundle, &Tx, Context<'a>) -> StageResult<'a>;

/// A stage bound to its identifier
#[derive(Clone, Copy)]
pub(crate) struct Stage {
    pub(crate) id: StageId,
    pub(crate) run: StageFn,
}

/// Stages in execution order
pub(crate) fn pipeline() -> Vec<Stage> {
    StageId::ORDER
        .iter()
        .map(|id| Stage {
            id: *id,
            run: id.run_fn(),
        })
        .collect()
}

#[cfg(test)]
pub(crate) mod test_support;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pipeline_follows_order() {
        let ids: Vec<StageId> = pipeline().iter().map(|s| s.id).collect();
        assert_eq!(ids, StageId::ORDER.to_vec());
    }

    #[test]
    fn test_ordering_invariants() {
        let pos = |id: StageId| StageId::ORDER.iter().position(|s| *s == id).unwrap();
        assert_eq!(pos(StageId::ContextInitializer), 0);
        assert!(pos(StageId::MinGasPriceValidator) < pos(StageId::TxSizeGasConsumer));
        for dependent in [
            StageId::SignatureCountValidator,
            StageId::SignatureGasConsumer,
            StageId::SignatureVerifier,
        ] {
            assert!(pos(StageId::PubKeySetter) < pos(dependent));
        }
        assert!(pos(StageId::SignatureVerifier) < pos(StageId::SequenceIncrementer));
        assert_eq!(pos(StageId::ExecutionGasWantedValidator), StageId::ORDER.len() - 1);
    }

    #[test]
    fn test_names_are_unique() {
        let mut names: Vec<&str> = StageId::ORDER.iter().map(StageId::name).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), StageId::ORDER.len());
    }
}
