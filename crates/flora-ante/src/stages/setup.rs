//! Context setup and state-independent checks

use crate::builder::AnteBundle;
use crate::context::StageResult;
use crate::error::AnteError;
use crate::gas::GasMeter;
use crate::Context;
use flora_types::Tx;

/// Installs the gas meter for the run and records gas wanted.
///
/// The meter is unbounded when relaxed and at genesis.
pub(super) fn setup_context<'a>(_: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let gas_limit = tx.gas_limit();
        let meter = if ctx.is_relaxed() || ctx.block().is_genesis() {
            GasMeter::infinite()
        } else {
            GasMeter::new(gas_limit)
        };
        ctx.set_gas_meter(meter);
        ctx.clear_events();
        ctx.set_gas_wanted(gas_limit);

        match ctx.block().max_gas {
            Some(max) if gas_limit > max => Err(AnteError::GasLimitAboveBlockMax { gas_limit, max }),
            _ => Ok(()),
        }
    })
}

pub(super) fn extension_options<'a>(
    bundle: &AnteBundle,
    tx: &Tx,
    ctx: Context<'a>,
) -> StageResult<'a> {
    let checker = &bundle.extension_checker;
    match tx.body.extension_options.iter().find(|option| !checker(option)) {
        Some(option) => Err(ctx.reject(AnteError::UnknownExtensionOption(option.type_url.clone()))),
        None => Ok(ctx),
    }
}

pub(super) fn validate_basic<'a>(_: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|_| Ok(tx.validate_basic()?))
}

pub(super) fn timeout_height<'a>(_: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    let timeout = tx.body.timeout_height;
    let height = ctx.block().height;
    if timeout > 0 && height > timeout {
        return Err(ctx.reject(AnteError::TimeoutHeight { timeout, height }));
    }
    Ok(ctx)
}

/// Bounds the memo by its UTF-8 byte length
pub(super) fn validate_memo<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    let max = bundle.account_keeper.params().max_memo_characters;
    let len = tx.body.memo.len();
    if len as u64 > max {
        return Err(ctx.reject(AnteError::MemoTooLarge { len, max }));
    }
    Ok(ctx)
}
