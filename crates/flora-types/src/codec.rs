//! Deterministic binary encoding for transactions.
//!
//! The encoding is used for two things: transaction size gas, and the
//! `Direct` sign doc. Integers are little-endian, variable-length fields
//! carry a `u32` length prefix and enum variants a one-byte tag.

use crate::msg::{Authorization, Msg, Packet};
use crate::tx::{AuthInfo, ExtensionOption, Fee, SignMode, SignerInfo, Tx, TxBody};
use bytes::BufMut;
use flora_crypto::{PublicKey, SignatureData};
use flora_primitives::{Address, Coins};

// ============================================================================
// Top-level encoders
// ============================================================================

/// Encode a full transaction: body, auth info, signatures.
pub fn encode_tx(tx: &Tx) -> Vec<u8> {
    let mut buf = Vec::new();
    put_bytes(&mut buf, &encode_body(&tx.body));
    put_bytes(&mut buf, &encode_auth_info(&tx.auth_info));
    buf.put_u32_le(tx.signatures.len() as u32);
    for sig in &tx.signatures {
        put_signature(&mut buf, sig);
    }
    buf
}

/// Encode a transaction body.
pub fn encode_body(body: &TxBody) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.put_u32_le(body.messages.len() as u32);
    for msg in &body.messages {
        put_msg(&mut buf, msg);
    }
    put_str(&mut buf, &body.memo);
    buf.put_u64_le(body.timeout_height);
    put_extensions(&mut buf, &body.extension_options);
    put_extensions(&mut buf, &body.non_critical_extension_options);
    buf
}

/// Encode signer infos and fee.
pub fn encode_auth_info(auth_info: &AuthInfo) -> Vec<u8> {
    let mut buf = Vec::new();
    buf.put_u32_le(auth_info.signer_infos.len() as u32);
    for info in &auth_info.signer_infos {
        put_signer_info(&mut buf, info);
    }
    put_fee(&mut buf, &auth_info.fee);
    buf
}

/// Encode the `Direct` sign doc a signer commits to.
pub fn encode_sign_doc(
    body_bytes: &[u8],
    auth_info_bytes: &[u8],
    chain_id: &str,
    account_number: u64,
) -> Vec<u8> {
    let mut buf = Vec::with_capacity(body_bytes.len() + auth_info_bytes.len() + chain_id.len() + 20);
    put_bytes(&mut buf, body_bytes);
    put_bytes(&mut buf, auth_info_bytes);
    put_str(&mut buf, chain_id);
    buf.put_u64_le(account_number);
    buf
}

/// Encoded size of a public key plus signature pair.
pub fn signature_pair_len(public_key: &PublicKey, sig: &SignatureData) -> usize {
    4 + public_key.to_bytes().len() + sig.encoded_len()
}

// ============================================================================
// Field helpers
// ============================================================================

fn put_bytes(buf: &mut Vec<u8>, bytes: &[u8]) {
    buf.put_u32_le(bytes.len() as u32);
    buf.put_slice(bytes);
}

fn put_str(buf: &mut Vec<u8>, s: &str) {
    put_bytes(buf, s.as_bytes());
}

fn put_address(buf: &mut Vec<u8>, address: &Address) {
    buf.put_slice(address.as_bytes());
}

fn put_opt_address(buf: &mut Vec<u8>, address: &Option<Address>) {
    match address {
        Some(address) => {
            buf.put_u8(1);
            put_address(buf, address);
        }
        None => buf.put_u8(0),
    }
}

fn put_coins(buf: &mut Vec<u8>, coins: &Coins) {
    buf.put_u32_le(coins.len() as u32);
    for coin in coins {
        put_str(buf, &coin.denom);
        buf.put_u128_le(coin.amount);
    }
}

fn put_extensions(buf: &mut Vec<u8>, options: &[ExtensionOption]) {
    buf.put_u32_le(options.len() as u32);
    for option in options {
        put_str(buf, &option.type_url);
        put_bytes(buf, &option.value);
    }
}

fn put_packet(buf: &mut Vec<u8>, packet: &Packet) {
    buf.put_u64_le(packet.sequence);
    put_str(buf, &packet.source_port);
    put_str(buf, &packet.source_channel);
    put_str(buf, &packet.destination_port);
    put_str(buf, &packet.destination_channel);
    put_bytes(buf, &packet.data);
    buf.put_u64_le(packet.timeout_height);
}

fn put_msg(buf: &mut Vec<u8>, msg: &Msg) {
    put_str(buf, msg.type_url());
    match msg {
        Msg::Send { from, to, amount } => {
            put_address(buf, from);
            put_address(buf, to);
            put_coins(buf, amount);
        }
        Msg::Exec { grantee, msgs } => {
            put_address(buf, grantee);
            buf.put_u32_le(msgs.len() as u32);
            for inner in msgs {
                put_msg(buf, inner);
            }
        }
        Msg::Grant {
            granter,
            grantee,
            authorization,
        } => {
            put_address(buf, granter);
            put_address(buf, grantee);
            match authorization {
                Authorization::Generic { msg_type_url } => {
                    buf.put_u8(0);
                    put_str(buf, msg_type_url);
                }
                Authorization::Send { spend_limit } => {
                    buf.put_u8(1);
                    put_coins(buf, spend_limit);
                }
            }
        }
        Msg::CreateVestingAccount {
            from,
            to,
            amount,
            end_time,
        } => {
            put_address(buf, from);
            put_address(buf, to);
            put_coins(buf, amount);
            buf.put_u64_le(*end_time);
        }
        Msg::EthereumTx { from, raw, gas } => {
            put_address(buf, from);
            put_bytes(buf, raw);
            buf.put_u64_le(*gas);
        }
        Msg::ExecuteContract {
            sender,
            contract,
            input,
            value,
        } => {
            put_address(buf, sender);
            put_address(buf, contract);
            put_bytes(buf, input);
            buf.put_u128_le(*value);
        }
        Msg::RecvPacket { packet, signer } | Msg::Timeout { packet, signer } => {
            put_packet(buf, packet);
            put_address(buf, signer);
        }
        Msg::Acknowledgement {
            packet,
            acknowledgement,
            signer,
        } => {
            put_packet(buf, packet);
            put_bytes(buf, acknowledgement);
            put_address(buf, signer);
        }
        Msg::UpdateClient {
            client_id,
            height,
            signer,
        } => {
            put_str(buf, client_id);
            buf.put_u64_le(*height);
            put_address(buf, signer);
        }
    }
}

fn put_signer_info(buf: &mut Vec<u8>, info: &SignerInfo) {
    match &info.public_key {
        Some(key) => {
            buf.put_u8(1);
            put_bytes(buf, &key.to_bytes());
        }
        None => buf.put_u8(0),
    }
    buf.put_u8(match info.sign_mode {
        SignMode::Direct => 1,
        SignMode::LegacyAminoJson => 127,
    });
    buf.put_u64_le(info.sequence);
}

fn put_fee(buf: &mut Vec<u8>, fee: &Fee) {
    put_coins(buf, &fee.amount);
    buf.put_u64_le(fee.gas_limit);
    put_opt_address(buf, &fee.payer);
    put_opt_address(buf, &fee.granter);
}

fn put_signature(buf: &mut Vec<u8>, sig: &SignatureData) {
    match sig {
        SignatureData::Single(sig) => {
            buf.put_u8(0);
            buf.put_slice(&sig.to_bytes());
        }
        SignatureData::Multi(sigs) => {
            buf.put_u8(1);
            buf.put_u32_le(sigs.len() as u32);
            for sig in sigs {
                match sig {
                    Some(sig) => {
                        buf.put_u8(1);
                        put_signature(buf, sig);
                    }
                    None => buf.put_u8(0),
                }
            }
        }
    }
}
