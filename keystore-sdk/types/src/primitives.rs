//! Fixed-width hex and byte helpers shared by the account, transaction and
//! configuration code.

use alloy_primitives::{hex, Bytes, FixedBytes, U256};

pub use alloy_primitives::keccak256;

#[derive(thiserror::Error, Debug, Clone, PartialEq, Eq)]
pub enum CodecError {
    #[error("hex string must start with 0x")]
    MissingPrefix,
    #[error("hex string has odd length")]
    OddLength,
    #[error("invalid hex digit")]
    InvalidHexDigit,
    #[error("input of {got} bytes does not fit in {max} bytes")]
    TooLong { max: usize, got: usize },
    #[error("quantity of {0} bytes overflows uint256")]
    QuantityOverflow(usize),
    #[error("rlp decode failed: {0}")]
    Rlp(#[from] alloy_rlp::Error),
    #[error("expected {expected} rlp fields, got {got}")]
    FieldCount { expected: usize, got: usize },
    #[error("{0} trailing bytes after rlp payload")]
    TrailingBytes(usize),
}

/// Parses a `0x`-prefixed hex string. An empty payload (`"0x"`) is valid and
/// yields empty bytes.
pub fn parse_hex(s: &str) -> Result<Bytes, CodecError> {
    let digits = s.strip_prefix("0x").ok_or(CodecError::MissingPrefix)?;
    if digits.len() % 2 != 0 {
        return Err(CodecError::OddLength);
    }
    // `hex::decode` tolerates its own `0x`, so a doubled prefix must fail here
    if !digits.bytes().all(|b| b.is_ascii_hexdigit()) {
        return Err(CodecError::InvalidHexDigit);
    }
    hex::decode(digits)
        .map(Bytes::from)
        .map_err(|_| CodecError::InvalidHexDigit)
}

/// Left pads `bytes` with zeros to `N` bytes.
pub fn left_pad<const N: usize>(bytes: &[u8]) -> Result<FixedBytes<N>, CodecError> {
    if bytes.len() > N {
        return Err(CodecError::TooLong {
            max: N,
            got: bytes.len(),
        });
    }
    Ok(FixedBytes::<N>::left_padding_from(bytes))
}

pub fn parse_fixed_hex<const N: usize>(s: &str) -> Result<FixedBytes<N>, CodecError> {
    left_pad(&parse_hex(s)?)
}

/// Encodes a quantity as the 32-byte big-endian word used for the rollup's
/// `feePerGas` and `l1InitiatedNonce` byte fields.
pub fn quantity_to_be_bytes(value: U256) -> Bytes {
    value.to_be_bytes_vec().into()
}

/// Decodes a big-endian quantity of at most 32 bytes. Leading zeros are
/// accepted so both minimal and word-sized encodings round trip.
pub fn quantity_from_be_slice(bytes: &[u8]) -> Result<U256, CodecError> {
    U256::try_from_be_slice(bytes).ok_or(CodecError::QuantityOverflow(bytes.len()))
}
