//! Public key types and signature data

use crate::signature::{verify, Signature, VerifyingKey};
use crate::{keccak256, sha256, CryptoError};
use flora_primitives::{Address, H256};

/// Compressed generator point, used as the stand-in key when simulating
/// a transaction whose signer has not published a key yet.
const SIMULATION_KEY: [u8; 33] = [
    0x02, 0x79, 0xBE, 0x66, 0x7E, 0xF9, 0xDC, 0xBB, 0xAC, 0x55, 0xA0, 0x62, 0x95, 0xCE, 0x87,
    0x0B, 0x07, 0x02, 0x9B, 0xFC, 0xDB, 0x2D, 0xCE, 0x28, 0xD9, 0x59, 0xF2, 0x81, 0x5B, 0x16,
    0xF8, 0x17, 0x98,
];

/// Signing algorithm of a single key
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum KeyAlgo {
    /// Cosmos-style secp256k1: SHA-256 message digest
    Secp256k1,
    /// Ethereum-style secp256k1: Keccak-256 message digest
    EthSecp256k1,
}

impl KeyAlgo {
    /// Digest applied to sign bytes before ECDSA
    pub fn digest(&self, message: &[u8]) -> H256 {
        match self {
            KeyAlgo::Secp256k1 => sha256(message),
            KeyAlgo::EthSecp256k1 => keccak256(message),
        }
    }

    fn tag(&self) -> u8 {
        match self {
            KeyAlgo::Secp256k1 => 0x01,
            KeyAlgo::EthSecp256k1 => 0x02,
        }
    }
}

/// A signer's public key
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum PublicKey {
    /// Single secp256k1 key
    Single {
        /// Digest/address flavour
        algo: KeyAlgo,
        /// Curve point
        key: VerifyingKey,
    },
    /// `threshold`-of-`keys.len()` multisig
    Multisig {
        /// Required number of valid sub-signatures
        threshold: u32,
        /// Sub-keys, possibly nested multisigs
        keys: Vec<PublicKey>,
    },
}

/// Signature material matching a [`PublicKey`]
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SignatureData {
    /// Signature of a single key
    Single(Signature),
    /// One optional entry per multisig sub-key, in key order
    Multi(Vec<Option<SignatureData>>),
}

impl PublicKey {
    /// Wrap a cosmos-style secp256k1 key
    pub fn secp256k1(key: VerifyingKey) -> Self {
        PublicKey::Single {
            algo: KeyAlgo::Secp256k1,
            key,
        }
    }

    /// Wrap an Ethereum-style secp256k1 key
    pub fn eth_secp256k1(key: VerifyingKey) -> Self {
        PublicKey::Single {
            algo: KeyAlgo::EthSecp256k1,
            key,
        }
    }

    /// Build a multisig key, checking the threshold
    pub fn multisig(threshold: u32, keys: Vec<PublicKey>) -> Result<Self, CryptoError> {
        if threshold == 0 || threshold as usize > keys.len() {
            return Err(CryptoError::InvalidThreshold {
                threshold,
                keys: keys.len(),
            });
        }
        Ok(PublicKey::Multisig { threshold, keys })
    }

    /// Placeholder key used while simulating
    pub fn simulation() -> Result<Self, CryptoError> {
        let key = VerifyingKey::from_sec1_bytes(&SIMULATION_KEY)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey::secp256k1(key))
    }

    /// Parse a single key from its compressed SEC1 encoding
    pub fn from_sec1(algo: KeyAlgo, bytes: &[u8]) -> Result<Self, CryptoError> {
        let key = VerifyingKey::from_sec1_bytes(bytes)
            .map_err(|e| CryptoError::InvalidPublicKey(e.to_string()))?;
        Ok(PublicKey::Single { algo, key })
    }

    /// Type name, used in gas descriptors and errors
    pub fn type_name(&self) -> &'static str {
        match self {
            PublicKey::Single {
                algo: KeyAlgo::Secp256k1,
                ..
            } => "secp256k1",
            PublicKey::Single {
                algo: KeyAlgo::EthSecp256k1,
                ..
            } => "eth_secp256k1",
            PublicKey::Multisig { .. } => "multisig",
        }
    }

    /// Deterministic byte encoding: `tag || sec1` or
    /// `0x03 || threshold || count || sub-keys`
    pub fn to_bytes(&self) -> Vec<u8> {
        match self {
            PublicKey::Single { algo, key } => {
                let point = key.to_encoded_point(true);
                let mut out = Vec::with_capacity(1 + point.len());
                out.push(algo.tag());
                out.extend_from_slice(point.as_bytes());
                out
            }
            PublicKey::Multisig { threshold, keys } => {
                let mut out = vec![0x03];
                out.extend_from_slice(&threshold.to_be_bytes());
                out.extend_from_slice(&(keys.len() as u32).to_be_bytes());
                for key in keys {
                    let sub = key.to_bytes();
                    out.extend_from_slice(&(sub.len() as u32).to_be_bytes());
                    out.extend_from_slice(&sub);
                }
                out
            }
        }
    }

    /// Account address controlled by this key
    pub fn address(&self) -> Address {
        match self {
            PublicKey::Single {
                algo: KeyAlgo::Secp256k1,
                key,
            } => Address::from_digest(sha256(key.to_encoded_point(true).as_bytes()).as_bytes()),
            PublicKey::Single {
                algo: KeyAlgo::EthSecp256k1,
                key,
            } => {
                let point = key.to_encoded_point(false);
                Address::from_digest(keccak256(&point.as_bytes()[1..]).as_bytes())
            }
            PublicKey::Multisig { .. } => {
                Address::from_digest(sha256(&self.to_bytes()).as_bytes())
            }
        }
    }

    /// Number of leaf keys, counting nested multisigs recursively
    pub fn leaf_count(&self) -> usize {
        match self {
            PublicKey::Single { .. } => 1,
            PublicKey::Multisig { keys, .. } => keys.iter().map(PublicKey::leaf_count).sum(),
        }
    }

    /// Verify `data` over `message` (the raw sign bytes)
    pub fn verify(&self, message: &[u8], data: &SignatureData) -> Result<bool, CryptoError> {
        match (self, data) {
            (PublicKey::Single { algo, key }, SignatureData::Single(sig)) => {
                verify(&algo.digest(message), sig, key)
            }
            (PublicKey::Multisig { threshold, keys }, SignatureData::Multi(sigs)) => {
                if sigs.len() != keys.len() {
                    return Ok(false);
                }
                let mut valid = 0u32;
                for (key, sig) in keys.iter().zip(sigs) {
                    if let Some(sig) = sig {
                        if !key.verify(message, sig)? {
                            return Ok(false);
                        }
                        valid += 1;
                    }
                }
                Ok(valid >= *threshold)
            }
            (key, _) => Err(CryptoError::KeyTypeMismatch(key.type_name())),
        }
    }
}

impl SignatureData {
    /// All-zero placeholder signature, carried by unsigned simulation requests
    pub fn placeholder() -> Self {
        SignatureData::Single(Signature::new([0; 32], [0; 32], 0))
    }

    /// True when the signature is a placeholder or a multisig with a
    /// placeholder (or no entries) somewhere inside
    pub fn is_incomplete(&self) -> bool {
        match self {
            SignatureData::Single(sig) => sig.r == [0; 32] && sig.s == [0; 32],
            SignatureData::Multi(sigs) => {
                sigs.iter().all(Option::is_none)
                    || sigs.iter().flatten().any(SignatureData::is_incomplete)
            }
        }
    }

    /// Encoded size in bytes, as carried in a transaction
    pub fn encoded_len(&self) -> usize {
        match self {
            SignatureData::Single(_) => 1 + Signature::LEN,
            SignatureData::Multi(sigs) => {
                1 + 4 + sigs
                    .iter()
                    .map(|s| 1 + s.as_ref().map_or(0, SignatureData::encoded_len))
                    .sum::<usize>()
            }
        }
    }
}
