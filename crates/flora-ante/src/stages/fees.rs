//! Fee floor, size gas and fee deduction

use crate::builder::AnteBundle;
use crate::context::{Event, StageResult};
use crate::error::{AnteError, AnteResult};
use crate::keepers::{module_address, FEE_COLLECTOR};
use crate::Context;
use flora_crypto::{PublicKey, SignatureData};
use flora_primitives::{Coin, Coins, DecCoin, Gas, PrimitiveError};
use flora_types::{codec, Tx};

fn arithmetic(e: PrimitiveError) -> AnteError {
    AnteError::Internal(format!("fee arithmetic: {e}"))
}

/// Enforces the fee market floor: a single coin in the EVM denom worth at
/// least `ceil(min_gas_price * gas_limit)`.
pub(super) fn min_gas_price<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|_| {
        let floor = bundle.fee_market_keeper.min_gas_price();
        if floor.is_zero() {
            return Ok(());
        }

        let denom = bundle.evm_keeper.evm_denom();
        let fee = &tx.fee().amount;
        if fee.len() > 1 || fee.iter().any(|coin| coin.denom != denom) {
            return Err(AnteError::InvalidFeeDenom {
                expected: denom,
                got: fee.to_string(),
            });
        }

        let required = floor.mul_gas_ceil(tx.gas_limit()).map_err(arithmetic)?;
        if fee.amount_of(&denom) < required {
            return Err(AnteError::InsufficientFee {
                got: fee.to_string(),
                required: Coin::new(denom, required).to_string(),
            });
        }
        Ok(())
    })
}

/// Charges `tx_size_cost_per_byte` per encoded byte. When relaxed, signers
/// without a complete signature are also charged for a full one.
pub(super) fn consume_tx_size_gas<'a>(
    bundle: &AnteBundle,
    tx: &Tx,
    ctx: Context<'a>,
) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let params = bundle.account_keeper.params();
        let per_byte = params.tx_size_cost_per_byte;
        ctx.consume_gas(per_byte.saturating_mul(ctx.tx_size() as Gas), "txSize")?;
        if !ctx.is_relaxed() {
            return Ok(());
        }

        for (i, signer) in tx.signers().iter().enumerate() {
            if tx.signatures.get(i).is_some_and(|sig| !sig.is_incomplete()) {
                continue;
            }
            let key = match bundle
                .account_keeper
                .get_account(ctx.state(), signer)?
                .and_then(|account| account.public_key)
            {
                Some(key) => key,
                None => PublicKey::simulation()?,
            };
            let mut cost = codec::signature_pair_len(&key, &SignatureData::placeholder()) as Gas + 6;
            if matches!(key, PublicKey::Multisig { .. }) {
                cost = cost.saturating_mul(params.tx_sig_limit);
            }
            ctx.consume_gas(per_byte.saturating_mul(cost), "txSize")?;
        }
        Ok(())
    })
}

/// Checks node-local gas prices (unless relaxed), sets the mempool
/// priority and moves the fee from the payer, or its granter, to the fee
/// collector.
pub(super) fn deduct_fee<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let fee = tx.fee();
        let gas = fee.gas_limit;
        if !ctx.is_relaxed() && gas == 0 {
            return Err(AnteError::ZeroGas);
        }
        if !ctx.is_relaxed() {
            check_local_min_gas_prices(&bundle.min_gas_prices, &fee.amount, gas)?;
        }
        ctx.set_priority(tx_priority(&fee.amount, gas));

        let payer = tx
            .fee_payer()
            .ok_or_else(|| AnteError::Internal("transaction has no fee payer".into()))?;
        let mut deduct_from = payer;
        if let Some(granter) = fee.granter.filter(|granter| *granter != payer) {
            let keeper = bundle
                .fee_grant_keeper
                .as_ref()
                .ok_or(AnteError::FeeGrantsDisabled)?;
            let height = ctx.block().height;
            keeper.use_granted_fees(
                ctx.state_mut(),
                height,
                &granter,
                &payer,
                &fee.amount,
                tx.messages(),
            )?;
            deduct_from = granter;
        }

        bundle
            .account_keeper
            .require_account(ctx.state(), &deduct_from)?;
        if !fee.amount.is_zero() {
            bundle.bank_keeper.send_coins(
                ctx.state_mut(),
                &deduct_from,
                &module_address(FEE_COLLECTOR),
                &fee.amount,
            )?;
        }

        ctx.emit(
            Event::new("tx")
                .attr("fee", fee.amount.to_string())
                .attr("fee_payer", deduct_from.to_string()),
        );
        Ok(())
    })
}

/// The fee must cover `ceil(price * gas)` in at least one of the priced denoms
fn check_local_min_gas_prices(prices: &[DecCoin], fee: &Coins, gas: Gas) -> AnteResult<()> {
    if prices.is_empty() {
        return Ok(());
    }
    let required = prices
        .iter()
        .map(|price| Ok(Coin::new(price.denom.clone(), price.amount.mul_gas_ceil(gas)?)))
        .collect::<Result<Vec<Coin>, PrimitiveError>>()
        .and_then(Coins::normalized)
        .map_err(arithmetic)?;
    if required.is_zero() {
        return Ok(());
    }
    if required.iter().any(|coin| fee.amount_of(&coin.denom) >= coin.amount) {
        return Ok(());
    }
    Err(AnteError::InsufficientFee {
        got: fee.to_string(),
        required: required.to_string(),
    })
}

/// Smallest per-gas price across fee coins, capped at `i64::MAX`
fn tx_priority(fee: &Coins, gas: Gas) -> i64 {
    if gas == 0 {
        return 0;
    }
    fee.iter()
        .map(|coin| coin.amount / u128::from(gas))
        .min()
        .map_or(0, |price| price.min(i64::MAX as u128) as i64)
}
