//! Deterministic secp256k1 test signers.
//!
//! The contract verifies recipient authorizations by secp256k1 public-key
//! recovery over a keccak digest; these helpers produce the matching
//! `r || s || v` signatures. Digest construction stays in the contract crate
//! (it is the canonical encoding under test) — callers pass the 32-byte
//! prehash in.

use k256::ecdsa::{RecoveryId, Signature, SigningKey};
use k256::elliptic_curve::sec1::ToEncodedPoint;

pub struct TestSigner {
    key: SigningKey,
}

impl TestSigner {
    /// Deterministic signer from a nonzero seed byte.
    pub fn from_seed(seed: u8) -> Self {
        assert!(seed != 0, "seed 0 is not a valid secp256k1 scalar");
        let mut bytes = [0u8; 32];
        bytes[31] = seed;
        Self {
            key: SigningKey::from_bytes(&bytes.into()).unwrap(),
        }
    }

    /// Uncompressed SEC-1 public key (65 bytes, `0x04` prefix).
    pub fn public_key(&self) -> [u8; 65] {
        let point = self.key.verifying_key().to_encoded_point(false);
        let mut out = [0u8; 65];
        out.copy_from_slice(point.as_bytes());
        out
    }

    /// Signs a 32-byte prehash, returning `r || s || v` with `v` in {0, 1}.
    /// k256 emits low-`s` signatures, which is what the contract requires.
    pub fn sign_prehash(&self, digest: &[u8; 32]) -> [u8; 65] {
        let (signature, recovery_id): (Signature, RecoveryId) =
            self.key.sign_prehash_recoverable(digest).unwrap();
        let mut out = [0u8; 65];
        out[..64].copy_from_slice(signature.to_bytes().as_slice());
        out[64] = recovery_id.to_byte();
        out
    }
}
