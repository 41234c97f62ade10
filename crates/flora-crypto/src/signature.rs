//! secp256k1 ECDSA over prehashed messages

use crate::keys::KeyAlgo;
use crate::CryptoError;
use flora_primitives::H256;
use k256::ecdsa::signature::hazmat::PrehashVerifier;
use k256::ecdsa::{RecoveryId, Signature as K256Signature, SigningKey};

pub use k256::ecdsa::VerifyingKey;

/// Private key (32 bytes)
pub type PrivateKey = SigningKey;

/// Recoverable signature. `s` is always in the lower half of the curve
/// order for signatures produced by [`sign`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Signature {
    /// r scalar, big-endian
    pub r: [u8; 32],
    /// s scalar, big-endian
    pub s: [u8; 32],
    /// recovery id plus 27
    pub v: u8,
}

impl Signature {
    /// Encoded length: r || s || v
    pub const LEN: usize = 65;

    /// Assemble from components
    pub fn new(r: [u8; 32], s: [u8; 32], v: u8) -> Self {
        Signature { r, s, v }
    }

    /// r || s || v
    pub fn to_bytes(&self) -> [u8; 65] {
        let mut bytes = [0u8; 65];
        bytes[..32].copy_from_slice(&self.r);
        bytes[32..64].copy_from_slice(&self.s);
        bytes[64] = self.v;
        bytes
    }

    fn to_k256(&self) -> Result<K256Signature, CryptoError> {
        K256Signature::from_scalars(self.r, self.s)
            .map_err(|e| CryptoError::InvalidSignature(e.to_string()))
    }
}

/// Sign a prehashed message, normalizing to low-s
pub fn sign(message_hash: &H256, private_key: &PrivateKey) -> Result<Signature, CryptoError> {
    let (signature, recovery_id) = private_key
        .sign_prehash_recoverable(message_hash.as_bytes())
        .map_err(|e| CryptoError::SigningFailed(e.to_string()))?;

    // flipping s mirrors the nonce point, so the y parity flips with it
    let (signature, recovery_id) = match signature.normalize_s() {
        Some(low) => (
            low,
            RecoveryId::new(!recovery_id.is_y_odd(), recovery_id.is_x_reduced()),
        ),
        None => (signature, recovery_id),
    };

    Ok(Signature {
        r: signature.r().to_bytes().into(),
        s: signature.s().to_bytes().into(),
        v: recovery_id.to_byte() + 27,
    })
}

/// Hash `message` the way `algo` expects, then sign it
pub fn sign_message(
    algo: KeyAlgo,
    message: &[u8],
    private_key: &PrivateKey,
) -> Result<Signature, CryptoError> {
    sign(&algo.digest(message), private_key)
}

/// Verify a signature against a prehashed message.
///
/// High-s signatures are malleable and never verify.
pub fn verify(
    message_hash: &H256,
    signature: &Signature,
    public_key: &VerifyingKey,
) -> Result<bool, CryptoError> {
    let k256_sig = signature.to_k256()?;
    if k256_sig.normalize_s().is_some() {
        return Ok(false);
    }
    Ok(public_key
        .verify_prehash(message_hash.as_bytes(), &k256_sig)
        .is_ok())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::keccak256;
    use rand::rngs::OsRng;

    #[test]
    fn test_sign_and_verify() {
        let private_key = SigningKey::random(&mut OsRng);
        let hash = keccak256(b"flora");

        let signature = sign(&hash, &private_key).unwrap();
        assert!(verify(&hash, &signature, private_key.verifying_key()).unwrap());
        assert!(matches!(signature.v, 27 | 28));

        let other = keccak256(b"not flora");
        assert!(!verify(&other, &signature, private_key.verifying_key()).unwrap());
    }

    #[test]
    fn test_high_s_twin_does_not_verify() {
        let private_key = SigningKey::random(&mut OsRng);
        let hash = keccak256(b"malleable");

        let mut signature = sign(&hash, &private_key).unwrap();
        let k256_sig = signature.to_k256().unwrap();
        let s: k256::Scalar = *k256_sig.s();
        signature.s = (-s).to_bytes().into();
        assert!(!verify(&hash, &signature, private_key.verifying_key()).unwrap());
    }

    #[test]
    fn test_out_of_range_scalar_is_an_error() {
        let private_key = SigningKey::random(&mut OsRng);
        let signature = Signature::new([0xff; 32], [1; 32], 27);
        assert!(matches!(
            verify(&keccak256(b"x"), &signature, private_key.verifying_key()),
            Err(CryptoError::InvalidSignature(_))
        ));
    }
}
