//! Sign bytes per signing mode

use crate::error::{AnteError, AnteResult};
use flora_crypto::PublicKey;
use flora_primitives::Address;
use flora_types::{codec, SignMode, Tx};
use serde_json::{json, Map, Value};

/// Signer-specific data bound into the sign bytes
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SignerData {
    /// Signer address
    pub address: Address,
    /// Chain identifier
    pub chain_id: String,
    /// Account number (0 at genesis)
    pub account_number: u64,
    /// Account sequence
    pub sequence: u64,
    /// Key the signature is checked against
    pub public_key: Option<PublicKey>,
}

/// Produces the bytes a signer commits to
pub trait SignModeHandler: Send + Sync {
    /// Sign bytes for `signer` under `mode`
    fn get_sign_bytes(&self, mode: SignMode, signer: &SignerData, tx: &Tx) -> AnteResult<Vec<u8>>;
}

/// Handles `Direct` and `LegacyAminoJson`
#[derive(Clone, Copy, Debug, Default)]
pub struct DefaultSignModeHandler;

impl SignModeHandler for DefaultSignModeHandler {
    fn get_sign_bytes(&self, mode: SignMode, signer: &SignerData, tx: &Tx) -> AnteResult<Vec<u8>> {
        match mode {
            SignMode::Direct => Ok(direct_sign_bytes(signer, tx)),
            SignMode::LegacyAminoJson => legacy_amino_json_sign_bytes(signer, tx),
        }
    }
}

/// Binary sign doc: body bytes, auth info bytes, chain id, account number
pub fn direct_sign_bytes(signer: &SignerData, tx: &Tx) -> Vec<u8> {
    codec::encode_sign_doc(
        &codec::encode_body(&tx.body),
        &codec::encode_auth_info(&tx.auth_info),
        &signer.chain_id,
        signer.account_number,
    )
}

/// Canonical JSON sign doc with lexicographically sorted keys and integers
/// rendered as strings
pub fn legacy_amino_json_sign_bytes(signer: &SignerData, tx: &Tx) -> AnteResult<Vec<u8>> {
    let internal = |e: serde_json::Error| AnteError::Internal(format!("amino json: {e}"));

    let msgs = tx
        .body
        .messages
        .iter()
        .map(serde_json::to_value)
        .collect::<Result<Vec<Value>, _>>()
        .map_err(internal)?;

    let fee = tx.fee();
    let amount: Vec<Value> = fee
        .amount
        .iter()
        .map(|c| json!({ "amount": c.amount.to_string(), "denom": c.denom }))
        .collect();
    let mut fee_doc = Map::new();
    fee_doc.insert("amount".into(), Value::Array(amount));
    fee_doc.insert("gas".into(), Value::String(fee.gas_limit.to_string()));
    if let Some(payer) = fee.payer {
        fee_doc.insert("payer".into(), Value::String(payer.to_string()));
    }
    if let Some(granter) = fee.granter {
        fee_doc.insert("granter".into(), Value::String(granter.to_string()));
    }

    let mut doc = Map::new();
    doc.insert("account_number".into(), Value::String(signer.account_number.to_string()));
    doc.insert("chain_id".into(), Value::String(signer.chain_id.clone()));
    doc.insert("fee".into(), Value::Object(fee_doc));
    doc.insert("memo".into(), Value::String(tx.body.memo.clone()));
    doc.insert("msgs".into(), Value::Array(msgs));
    doc.insert("sequence".into(), Value::String(signer.sequence.to_string()));
    if tx.body.timeout_height != 0 {
        doc.insert(
            "timeout_height".into(),
            Value::String(tx.body.timeout_height.to_string()),
        );
    }

    serde_json::to_vec(&sorted(Value::Object(doc))).map_err(internal)
}

fn sorted(value: Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(String, Value)> = map.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            Value::Object(entries.into_iter().map(|(k, v)| (k, sorted(v))).collect())
        }
        Value::Array(items) => Value::Array(items.into_iter().map(sorted).collect()),
        other => other,
    }
}
