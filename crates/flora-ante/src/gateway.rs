//! Admission gateway: the boundary called once per transaction per mode

use crate::builder::AnteHandler;
use crate::context::{Admission, BlockInfo};
use crate::error::Rejection;
use crate::mode::ExecMode;
use crate::Context;
use flora_metrics::AdmissionMetrics;
use flora_state::MemoryState;
use flora_types::Tx;
use parking_lot::{RwLock, RwLockUpgradableReadGuard};
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// Admits transactions against canonical state.
///
/// Every run works on an isolated view of a state snapshot. Only a
/// successful `Deliver` run writes back, exactly once, while holding the
/// upgradable lock it ran under; concurrent check runs keep reading.
pub struct AdmissionGateway {
    handler: AnteHandler,
    state: Arc<RwLock<MemoryState>>,
    block: RwLock<BlockInfo>,
    metrics: AdmissionMetrics,
}

impl AdmissionGateway {
    /// Create a gateway over shared canonical state
    pub fn new(handler: AnteHandler, state: Arc<RwLock<MemoryState>>, block: BlockInfo) -> Self {
        let metrics = AdmissionMetrics::new();
        metrics.set_height(block.height);
        Self {
            handler,
            state,
            block: RwLock::new(block),
            metrics,
        }
    }

    /// Record into an existing metrics registry
    pub fn with_metrics(mut self, metrics: AdmissionMetrics) -> Self {
        metrics.set_height(self.block.read().height);
        self.metrics = metrics;
        self
    }

    /// Canonical state
    pub fn state(&self) -> &Arc<RwLock<MemoryState>> {
        &self.state
    }

    /// The composed handler
    pub fn handler(&self) -> &AnteHandler {
        &self.handler
    }

    /// Admission metrics
    pub fn metrics(&self) -> &AdmissionMetrics {
        &self.metrics
    }

    /// Current block
    pub fn block(&self) -> BlockInfo {
        self.block.read().clone()
    }

    /// Move to a new block
    pub fn begin_block(&self, block: BlockInfo) {
        info!(height = block.height, chain_id = %block.chain_id, "begin block");
        self.metrics.set_height(block.height);
        *self.block.write() = block;
    }

    /// Run the pipeline for `tx` under `mode`
    pub fn admit(&self, tx: &Tx, mode: ExecMode) -> Result<Admission, Rejection> {
        let started = Instant::now();
        let block = self.block();
        let tx_size = tx.encode().len();

        let outcome = if mode.commits() {
            let guard = self.state.upgradable_read();
            let result = self
                .handler
                .run(tx, Context::new(&*guard, block, mode, tx_size))
                .map(Context::into_admission);
            result.map(|(admission, cache)| {
                let (accounts, balances) = (cache.account_count(), cache.balance_count());
                let mut state = RwLockUpgradableReadGuard::upgrade(guard);
                state.commit(cache);
                self.metrics.record_commit();
                info!(accounts, balances, "committed transaction state");
                admission
            })
        } else {
            let guard = self.state.read();
            self.handler
                .run(tx, Context::new(&*guard, block, mode, tx_size))
                .map(|ctx| ctx.into_admission().0)
        };

        let elapsed = started.elapsed();
        match &outcome {
            Ok(admission) => {
                self.metrics
                    .record_admitted(mode.as_str(), admission.gas_used, elapsed);
                info!(
                    %mode,
                    gas_wanted = admission.gas_wanted,
                    gas_used = admission.gas_used,
                    priority = admission.priority,
                    redundant = admission.redundant,
                    "transaction admitted"
                );
            }
            Err(rejection) => self.metrics.record_rejected(
                mode.as_str(),
                rejection.stage.name(),
                rejection.kind().as_str(),
                rejection.gas_used,
                elapsed,
            ),
        }
        outcome
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::stages::test_support::{options, send_tx, Fixture, DENOM, STARTING_BALANCE};
    use crate::ErrorKind;
    use flora_state::StateReader;

    fn gateway(fx: Fixture) -> AdmissionGateway {
        let handler = AnteHandler::build(options()).unwrap();
        AdmissionGateway::new(handler, Arc::new(RwLock::new(fx.state)), fx.block)
    }

    #[test]
    fn test_check_does_not_commit() {
        let fx = Fixture::new();
        let tx = send_tx(&fx, 100_000);
        let alice = fx.alice.address;
        let gateway = gateway(fx);

        let first = gateway.admit(&tx, ExecMode::CheckOnly).unwrap();
        let second = gateway.admit(&tx, ExecMode::CheckOnly).unwrap();
        assert_eq!(first, second);
        assert_eq!(gateway.state().read().get_sequence(&alice).unwrap(), 0);
        assert_eq!(gateway.metrics().admitted("check"), 2);
        assert_eq!(gateway.metrics().commits(), 0);
    }

    #[test]
    fn test_deliver_commits_once() {
        let fx = Fixture::new();
        let tx = send_tx(&fx, 100_000);
        let alice = fx.alice.address;
        let gateway = gateway(fx);

        let admission = gateway.admit(&tx, ExecMode::Deliver).unwrap();
        assert_eq!(admission.gas_wanted, 100_000);
        {
            let state = gateway.state().read();
            assert_eq!(state.get_sequence(&alice).unwrap(), 1);
            assert_eq!(
                state.get_balance(&alice, DENOM).unwrap(),
                STARTING_BALANCE - 100_000
            );
        }
        assert_eq!(gateway.metrics().commits(), 1);

        // replaying the same transaction now fails on its sequence
        let rejection = gateway.admit(&tx, ExecMode::Deliver).unwrap_err();
        assert_eq!(rejection.kind(), ErrorKind::WrongSequence);
        assert_eq!(gateway.metrics().commits(), 1);
        assert_eq!(gateway.metrics().rejected_kind("wrong_sequence"), 1);
    }

    #[test]
    fn test_shared_metrics_registry() {
        let fx = Fixture::new();
        let tx = send_tx(&fx, 100_000);
        let shared = AdmissionMetrics::new();
        let gateway = gateway(fx).with_metrics(shared.clone());

        gateway.admit(&tx, ExecMode::Simulate).unwrap();
        assert_eq!(shared.admitted("simulate"), 1);
        assert_eq!(shared.snapshot().gauges["block.height"], 5);
    }

    #[test]
    fn test_begin_block_updates_height() {
        let gateway = gateway(Fixture::new());
        gateway.begin_block(BlockInfo::new("flora-test", 9));
        assert_eq!(gateway.block().height, 9);
        assert_eq!(gateway.metrics().snapshot().gauges["block.height"], 9);
    }
}
