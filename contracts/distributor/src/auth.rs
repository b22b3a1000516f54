//! Recipient authorization for payment entries.
//!
//! A payment is admitted into a batch only when it carries a recoverable
//! secp256k1 signature from its recipient over the canonical payment message
//! `(batch_id, recipient, amount)`. The message is hashed with keccak-256 and
//! wrapped in an engine-specific domain tag before recovery, so a signature
//! produced for this engine cannot double as a generic signed message
//! elsewhere (and vice versa).
//!
//! Everything here is pure: no storage reads, no events. The ledger compares
//! the recovered identity against the recipient's registered claim key.

use soroban_sdk::{crypto::Hash, xdr::ToXdr, Address, Bytes, BytesN, Env};

use crate::Error;

/// Domain separation tag prepended to the inner payment hash.
const DOMAIN_TAG: &[u8; 16] = b"BATCHPAY_AUTH_V1";

/// Half of the secp256k1 group order, big-endian. Signatures whose `s`
/// exceeds this are the malleable twin of a valid signature and are rejected
/// so that a signature's hash identifies exactly one authorization.
const SECP256K1_HALF_N: [u8; 32] = [
    0x7f, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff, 0xff,
    0xff, 0x5d, 0x57, 0x6e, 0x73, 0x57, 0xa4, 0x50, 0x1d, 0xdf, 0xe9, 0x2f, 0x46, 0x68, 0x1b,
    0x20, 0xa0,
];

/// Digest the recipient signs: `keccak256(TAG || keccak256(batch_id ||
/// xdr(recipient) || amount_be))`. Including the payout address binds the
/// signature to its destination, not just to an amount.
pub(crate) fn payment_digest(
    env: &Env,
    batch_id: &BytesN<32>,
    recipient: &Address,
    amount: i128,
) -> Hash<32> {
    let mut message = Bytes::from_array(env, &batch_id.to_array());
    message.append(&recipient.clone().to_xdr(env));
    message.append(&Bytes::from_array(env, &amount.to_be_bytes()));
    let inner = env.crypto().keccak256(&message);

    let mut wrapped = Bytes::from_slice(env, DOMAIN_TAG);
    wrapped.append(&Bytes::from_array(env, &inner.to_array()));
    env.crypto().keccak256(&wrapped)
}

/// Recovers the signer identity behind `signature` for the given payment.
///
/// The identity is the keccak-160 of the signer's uncompressed public key
/// (the last 20 bytes of `keccak256(pubkey)`), matching the claim keys
/// recipients register. Malformed signatures fail closed with
/// `MalformedSignature`; they are never recovered to an arbitrary identity.
pub(crate) fn recover_signer(
    env: &Env,
    batch_id: &BytesN<32>,
    recipient: &Address,
    amount: i128,
    signature: &BytesN<65>,
) -> Result<BytesN<20>, Error> {
    let (sig, recovery_id) = split_signature(env, signature)?;
    let digest = payment_digest(env, batch_id, recipient, amount);
    let pubkey = env.crypto().secp256k1_recover(&digest, &sig, recovery_id);
    Ok(pubkey_identity(env, &pubkey))
}

/// keccak-160 identity of an uncompressed SEC-1 public key (65 bytes,
/// leading `0x04` excluded from the hash).
pub(crate) fn pubkey_identity(env: &Env, pubkey: &BytesN<65>) -> BytesN<20> {
    let sec1: Bytes = pubkey.clone().into();
    let digest = env.crypto().keccak256(&sec1.slice(1..)).to_array();
    let mut identity = [0u8; 20];
    identity.copy_from_slice(&digest[12..]);
    BytesN::from_array(env, &identity)
}

/// Content address of a signature, the key of the global used-signature set.
pub(crate) fn signature_hash(env: &Env, signature: &BytesN<65>) -> BytesN<32> {
    let raw: Bytes = signature.clone().into();
    env.crypto().keccak256(&raw).to_bytes()
}

/// Splits `r || s || v` into the 64-byte core and recovery id, rejecting
/// shapes that must never reach recovery: a recovery id outside {0, 1, 27,
/// 28}, a zero `r` or `s`, or a high `s`.
fn split_signature(env: &Env, signature: &BytesN<65>) -> Result<(BytesN<64>, u32), Error> {
    let raw = signature.to_array();

    let mut v = raw[64] as u32;
    if v == 27 || v == 28 {
        v -= 27;
    }
    if v > 1 {
        return Err(Error::MalformedSignature);
    }

    let r = &raw[..32];
    let s = &raw[32..64];
    if r.iter().all(|b| *b == 0) || s.iter().all(|b| *b == 0) {
        return Err(Error::MalformedSignature);
    }
    // Big-endian byte comparison; both sides are 32 bytes.
    if s > &SECP256K1_HALF_N[..] {
        return Err(Error::MalformedSignature);
    }

    let mut core = [0u8; 64];
    core.copy_from_slice(&raw[..64]);
    Ok((BytesN::from_array(env, &core), v))
}
