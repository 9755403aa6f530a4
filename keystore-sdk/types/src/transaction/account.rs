use alloy_primitives::{keccak256, Bytes, FixedBytes};

use super::FieldList;
use crate::primitives::{left_pad, parse_fixed_hex, parse_hex, CodecError};

/// A keystore account. The address of a counterfactual account commits to
/// its salt, data hash and verification key; an account that already exists
/// onchain is referenced by address with a zero salt.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    alloy_rlp::RlpDecodable,
    alloy_rlp::RlpEncodable,
    serde::Serialize,
    serde::Deserialize,
)]
#[serde(rename_all = "camelCase")]
pub struct KeystoreAccount {
    pub keystore_address: FixedBytes<32>,
    pub salt: FixedBytes<32>,
    pub data_hash: FixedBytes<32>,
    pub vkey: Bytes,
}

impl FieldList for KeystoreAccount {
    const FIELDS: &'static [&'static str] = &["keystoreAddress", "salt", "dataHash", "vkey"];
}

impl KeystoreAccount {
    pub fn with_keystore_address(
        keystore_address: FixedBytes<32>,
        data_hash: FixedBytes<32>,
        vkey: Bytes,
    ) -> Self {
        Self {
            keystore_address,
            salt: FixedBytes::ZERO,
            data_hash,
            vkey,
        }
    }

    pub fn with_salt(salt: FixedBytes<32>, data_hash: FixedBytes<32>, vkey: Bytes) -> Self {
        let keystore_address = Self::counterfactual_address(salt, data_hash, &vkey);
        Self {
            keystore_address,
            salt,
            data_hash,
            vkey,
        }
    }

    /// Like [`KeystoreAccount::with_salt`] but accepts unpadded `salt` and
    /// `data_hash`, which are left padded to 32 bytes.
    pub fn counterfactual_from_slices(
        salt: &[u8],
        data_hash: &[u8],
        vkey: Bytes,
    ) -> Result<Self, CodecError> {
        Ok(Self::with_salt(left_pad(salt)?, left_pad(data_hash)?, vkey))
    }

    /// Builds an existing account from `0x`-prefixed hex strings, e.g. a
    /// sponsor read from configuration.
    pub fn existing_from_hex(
        keystore_address: &str,
        data_hash: &str,
        vkey: &str,
    ) -> Result<Self, CodecError> {
        Ok(Self::with_keystore_address(
            parse_fixed_hex(keystore_address)?,
            parse_fixed_hex(data_hash)?,
            parse_hex(vkey)?,
        ))
    }

    pub fn counterfactual_address(
        salt: FixedBytes<32>,
        data_hash: FixedBytes<32>,
        vkey: &[u8],
    ) -> FixedBytes<32> {
        keccak256([salt, data_hash, keccak256(vkey)].concat())
    }

    /// Whether the address is the counterfactual derivation of the other
    /// three fields.
    pub fn is_counterfactual(&self) -> bool {
        self.keystore_address == Self::counterfactual_address(self.salt, self.data_hash, &self.vkey)
    }

    /// Same account with the salt cleared, as referenced once deployed.
    pub fn deployed(&self) -> Self {
        Self::with_keystore_address(self.keystore_address, self.data_hash, self.vkey.clone())
    }

    pub fn rlp_encode(&self) -> Bytes {
        self.encode_fields().into()
    }

    pub fn rlp_decode(bytes: &[u8]) -> Result<Self, CodecError> {
        Self::decode_exact(bytes)
    }
}
