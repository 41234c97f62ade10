//! Gas wanted check for virtual-machine execution

use crate::builder::AnteBundle;
use crate::context::StageResult;
use crate::error::AnteError;
use crate::Context;
use flora_primitives::Gas;
use flora_types::{Msg, Tx};

/// Requires the gas limit to cover the gas consumed so far plus the VM's
/// estimate for every contract call, and records gas wanted.
pub(super) fn check_gas_wanted<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let gas_limit = tx.gas_limit();
        let mut required: Gas = ctx.gas_consumed();
        for msg in tx.messages() {
            if let Msg::ExecuteContract { .. } = msg {
                let estimate = bundle.evm_keeper.estimate_gas_wanted(msg)?;
                required = required.saturating_add(estimate);
            }
        }
        if gas_limit < required {
            return Err(AnteError::ExecutionGasTooLow {
                gas_limit,
                required,
            });
        }
        ctx.set_gas_wanted(gas_limit);
        Ok(())
    })
}
