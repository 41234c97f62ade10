//! Public keys, signature gas, verification and replay protection

use crate::builder::AnteBundle;
use crate::context::{Event, StageResult};
use crate::error::{AnteError, AnteResult};
use crate::keepers::AuthParams;
use crate::sign_mode::SignerData;
use crate::Context;
use flora_crypto::{CryptoError, KeyAlgo, PublicKey, SignatureData};
use flora_types::Tx;

/// Stores signer-declared keys on accounts that have none yet.
///
/// Declared keys must derive the signer address unless relaxed; a relaxed
/// run substitutes the simulation key for missing ones.
pub(super) fn set_pubkeys<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let signers = tx.signers();
        for (index, (info, signer)) in tx.auth_info.signer_infos.iter().zip(&signers).enumerate() {
            let key = match &info.public_key {
                Some(key) => key.clone(),
                None if ctx.is_relaxed() => PublicKey::simulation()?,
                None => continue,
            };
            if !ctx.is_relaxed() && key.address() != *signer {
                return Err(AnteError::PubKeyMismatch {
                    address: *signer,
                    index,
                });
            }

            let mut account = bundle.account_keeper.require_account(ctx.state(), signer)?;
            if account.public_key.is_none() {
                account.public_key = Some(key);
                bundle.account_keeper.set_account(ctx.state_mut(), account)?;
            }
        }

        for ((info, signer), sig) in tx
            .auth_info
            .signer_infos
            .iter()
            .zip(&signers)
            .zip(&tx.signatures)
        {
            ctx.emit(Event::new("tx").attr("acc_seq", format!("{signer}/{}", info.sequence)));
            for bytes in signature_bytes(sig) {
                ctx.emit(Event::new("tx").attr("signature", hex::encode(bytes)));
            }
        }
        Ok(())
    })
}

fn signature_bytes(data: &SignatureData) -> Vec<Vec<u8>> {
    match data {
        SignatureData::Single(sig) => vec![sig.to_bytes().to_vec()],
        SignatureData::Multi(sigs) => sigs.iter().flatten().flat_map(signature_bytes).collect(),
    }
}

pub(super) fn validate_sig_count<'a>(
    bundle: &AnteBundle,
    tx: &Tx,
    ctx: Context<'a>,
) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let limit = bundle.account_keeper.params().tx_sig_limit;
        let mut count: u64 = 0;
        for (info, signer) in tx.auth_info.signer_infos.iter().zip(tx.signers()) {
            let stored = match &info.public_key {
                Some(_) => None,
                None => bundle
                    .account_keeper
                    .get_account(ctx.state(), &signer)?
                    .and_then(|account| account.public_key),
            };
            let leaves = info
                .public_key
                .as_ref()
                .or(stored.as_ref())
                .map_or(1, PublicKey::leaf_count);
            count = count.saturating_add(leaves as u64);
            if count > limit {
                return Err(AnteError::TooManySignatures { count, limit });
            }
        }
        Ok(())
    })
}

pub(super) fn consume_sig_gas<'a>(bundle: &AnteBundle, tx: &Tx, ctx: Context<'a>) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let params = bundle.account_keeper.params();
        for (signer, sig) in tx.signers().iter().zip(&tx.signatures) {
            let account = bundle.account_keeper.require_account(ctx.state(), signer)?;
            let key = match account.public_key {
                Some(key) => key,
                None if ctx.is_relaxed() => PublicKey::simulation()?,
                None => return Err(AnteError::MissingPubKey(*signer)),
            };
            charge_signature(ctx, &params, &key, sig)?;
        }
        Ok(())
    })
}

/// Charge the verification cost of `key`; multisig keys charge each
/// sub-key that carries a signature
fn charge_signature(
    ctx: &mut Context<'_>,
    params: &AuthParams,
    key: &PublicKey,
    sig: &SignatureData,
) -> AnteResult<()> {
    match (key, sig) {
        (PublicKey::Single { algo: KeyAlgo::Secp256k1, .. }, _) => {
            ctx.consume_gas(params.sig_verify_cost_secp256k1, "ante verify: secp256k1")
        }
        (PublicKey::Single { algo: KeyAlgo::EthSecp256k1, .. }, _) => {
            ctx.consume_gas(params.sig_verify_cost_eth_secp256k1, "ante verify: eth_secp256k1")
        }
        (PublicKey::Multisig { keys, .. }, SignatureData::Multi(sigs)) if keys.len() == sigs.len() => {
            for (sub_key, sub_sig) in keys.iter().zip(sigs) {
                if let Some(sub_sig) = sub_sig {
                    charge_signature(ctx, params, sub_key, sub_sig)?;
                }
            }
            Ok(())
        }
        (PublicKey::Multisig { .. }, _) => Err(CryptoError::KeyTypeMismatch("multisig").into()),
    }
}

/// Checks every signer's sequence, then its signature unless relaxed.
///
/// Account number 0 is bound into the sign bytes at genesis.
pub(super) fn verify_signatures<'a>(
    bundle: &AnteBundle,
    tx: &Tx,
    ctx: Context<'a>,
) -> StageResult<'a> {
    ctx.apply(|ctx| {
        let chain_id = ctx.block().chain_id.clone();
        let genesis = ctx.block().is_genesis();
        let signers = tx.signers();
        let entries = signers
            .iter()
            .zip(&tx.auth_info.signer_infos)
            .zip(&tx.signatures);

        for ((signer, info), sig) in entries {
            let account = bundle.account_keeper.require_account(ctx.state(), signer)?;
            if account.public_key.is_none() && !ctx.is_relaxed() {
                return Err(AnteError::MissingPubKey(*signer));
            }
            if info.sequence != account.sequence {
                return Err(AnteError::WrongSequence {
                    address: *signer,
                    expected: account.sequence,
                    got: info.sequence,
                });
            }
            if ctx.is_relaxed() {
                continue;
            }
            let Some(key) = account.public_key else {
                return Err(AnteError::MissingPubKey(*signer));
            };

            let account_number = if genesis { 0 } else { account.account_number };
            let signer_data = SignerData {
                address: *signer,
                chain_id: chain_id.clone(),
                account_number,
                sequence: account.sequence,
                public_key: Some(key.clone()),
            };
            let sign_bytes = bundle
                .sign_mode_handler
                .get_sign_bytes(info.sign_mode, &signer_data, tx)?;
            if !key.verify(&sign_bytes, sig)? {
                return Err(AnteError::SignatureVerificationFailed {
                    account_number,
                    chain_id,
                });
            }
        }
        Ok(())
    })
}

pub(super) fn increment_sequences<'a>(
    bundle: &AnteBundle,
    tx: &Tx,
    ctx: Context<'a>,
) -> StageResult<'a> {
    ctx.apply(|ctx| {
        for signer in tx.signers() {
            bundle
                .account_keeper
                .increment_sequence(ctx.state_mut(), &signer)?;
        }
        Ok(())
    })
}
