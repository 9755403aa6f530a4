//! secp256k1 signing over 32-byte digests.
//!
//! Signatures are 65 bytes laid out as `r ‖ s ‖ recoveryId`, with the
//! recovery id being `0` or `1` as the rollup's ECDSA verifier expects.

use alloy_primitives::{Address, FixedBytes, PrimitiveSignature, B256, U256};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;

pub const SIGNATURE_LEN: usize = 65;

#[derive(thiserror::Error, Debug)]
pub enum SignError {
    #[error("private key must be 32 bytes, got {0}")]
    InvalidKeyLength(usize),
    #[error("invalid private key: {0}")]
    InvalidPrivateKey(#[from] alloy_signer_local::LocalSignerError),
    #[error("signing failed: {0}")]
    Signer(#[from] alloy_signer::Error),
    #[error("invalid signature: {0}")]
    InvalidSignature(#[from] alloy_primitives::SignatureError),
}

pub fn sign(private_key: &[u8], digest: B256) -> Result<FixedBytes<SIGNATURE_LEN>, SignError> {
    if private_key.len() != 32 {
        return Err(SignError::InvalidKeyLength(private_key.len()));
    }
    let signer = PrivateKeySigner::from_bytes(&B256::from_slice(private_key))
        .map_err(alloy_signer_local::LocalSignerError::from)?;
    let signature = signer.sign_hash_sync(&digest)?;

    let mut out = [0u8; SIGNATURE_LEN];
    out[..32].copy_from_slice(&signature.r().to_be_bytes::<32>());
    out[32..64].copy_from_slice(&signature.s().to_be_bytes::<32>());
    out[64] = signature.v() as u8;
    Ok(out.into())
}

/// Recovers the address that produced `signature` over `digest`. Accepts a
/// recovery byte of `0`/`1` as well as the legacy `27`/`28`.
pub fn recover_signer(
    signature: &FixedBytes<SIGNATURE_LEN>,
    digest: B256,
) -> Result<Address, SignError> {
    let r = U256::from_be_slice(&signature[..32]);
    let s = U256::from_be_slice(&signature[32..64]);
    let parity = match signature[64] {
        0 | 27 => false,
        1 | 28 => true,
        _ => return Err(alloy_primitives::SignatureError::InvalidParity(signature[64] as u64).into()),
    };
    Ok(PrimitiveSignature::new(r, s, parity).recover_address_from_prehash(&digest)?)
}
