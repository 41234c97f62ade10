//! Account address type (20 bytes)

use std::fmt;
use thiserror::Error;

/// Address parsing error
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum AddressError {
    /// Invalid hex string
    #[error("invalid hex string: {0}")]
    InvalidHex(String),
    /// Invalid length
    #[error("invalid address length: expected 20 bytes, got {0}")]
    InvalidLength(usize),
}

/// 20-byte account address.
///
/// Both secp256k1 flavours and module accounts live in the same address
/// space; the derivation lives in `flora-crypto`.
#[derive(Clone, Copy, PartialEq, Eq, Hash, Default, PartialOrd, Ord)]
pub struct Address([u8; 20]);

impl Address {
    /// All-zero address, never derived from a key
    pub const ZERO: Address = Address([0u8; 20]);

    /// Wrap raw bytes
    pub const fn from_bytes(bytes: [u8; 20]) -> Self {
        Address(bytes)
    }

    /// Take the trailing 20 bytes of a 32-byte digest
    pub fn from_digest(digest: &[u8; 32]) -> Self {
        let mut bytes = [0u8; 20];
        bytes.copy_from_slice(&digest[12..]);
        Address(bytes)
    }

    /// Parse `0x`-prefixed or bare hex, any case
    pub fn from_hex(s: &str) -> Result<Self, AddressError> {
        let raw = hex::decode(s.strip_prefix("0x").unwrap_or(s))
            .map_err(|e| AddressError::InvalidHex(e.to_string()))?;
        let bytes: [u8; 20] = raw
            .as_slice()
            .try_into()
            .map_err(|_| AddressError::InvalidLength(raw.len()))?;
        Ok(Address(bytes))
    }

    /// Raw bytes
    pub fn as_bytes(&self) -> &[u8; 20] {
        &self.0
    }

    /// Whether this is [`Address::ZERO`]
    pub fn is_zero(&self) -> bool {
        *self == Address::ZERO
    }
}

impl fmt::Debug for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Address({self})")
    }
}

/// Lowercase hex with a `0x` prefix
impl fmt::Display for Address {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "0x{}", hex::encode(self.0))
    }
}

impl AsRef<[u8]> for Address {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

impl std::str::FromStr for Address {
    type Err = AddressError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

#[cfg(feature = "serde")]
mod serde_impl {
    use super::Address;
    use serde::{de, Deserialize, Deserializer, Serialize, Serializer};

    impl Serialize for Address {
        fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
            serializer.collect_str(self)
        }
    }

    impl<'de> Deserialize<'de> for Address {
        fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
            let s = String::deserialize(deserializer)?;
            Address::from_hex(&s).map_err(de::Error::custom)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_from_hex() {
        let addr = Address::from_hex("0x742d35Cc6634C0532925a3b844Bc9e7595f0aB3d").unwrap();
        let bare = Address::from_hex("742d35cc6634c0532925a3b844bc9e7595f0ab3d").unwrap();
        assert_eq!(addr, bare);
        assert_eq!(addr.to_string(), "0x742d35cc6634c0532925a3b844bc9e7595f0ab3d");
    }

    #[test]
    fn test_address_invalid_length() {
        assert_eq!(
            Address::from_hex("0x1234").unwrap_err(),
            AddressError::InvalidLength(2)
        );
        assert!(matches!(
            Address::from_hex("0xzz"),
            Err(AddressError::InvalidHex(_))
        ));
    }

    #[test]
    fn test_address_from_digest_takes_tail() {
        let mut digest = [0u8; 32];
        digest[12] = 0xab;
        digest[31] = 0xcd;
        let addr = Address::from_digest(&digest);
        assert_eq!(addr.as_bytes()[0], 0xab);
        assert_eq!(addr.as_bytes()[19], 0xcd);
    }

    #[test]
    fn test_parse_display_agree() {
        let addr = Address::from_bytes([0x5a; 20]);
        assert_eq!(addr.to_string().parse::<Address>().unwrap(), addr);
        assert_ne!(addr, Address::ZERO);
    }

    #[test]
    fn test_zero_address() {
        assert!(Address::ZERO.is_zero());
        assert!(Address::default().is_zero());
        assert!(!Address::from_bytes([1u8; 20]).is_zero());
    }
}
