//! Authentication rules: how an account's key material is committed to in
//! its data hash, and how signatures are packaged into the `(keyData,
//! authData)` pair the signature prover consumes.

use alloy_primitives::{bytes, hex, keccak256, Address, Bytes, FixedBytes, B256, U256};
use alloy_sol_types::SolValue;

use crate::KeystoreAccount;

/// Discriminator prepended to the m-of-n ECDSA key data.
pub const M_OF_N_ECDSA_KEY_DATA_PREFIX: u8 = 0x00;

/// Verifying key of the m-of-n ECDSA authentication circuit.
pub const M_OF_N_ECDSA_VKEY: Bytes = Bytes::from_static(&hex!("01010000001001000100010100000100000000000000000000000000000000009171ded76cb8d446b69cb901fe413fe380886240549feb11014fec000a7eb1280750a550988ceaef9a37f6794af0d9bf472445bc9dfacf89b9f4a6130c2b0eb42ef05dfd54c6d765973c1b3e0c15885e1307bedc893a3474103a065e7a032d04078f64fde979db4eea6692dbde7d161c3e6c3ae99f2e7cf9c58229f8d1a5bb97056fb20596873754a862cbe247b25315399d7be7a8bfe72942564c469d6a95e141a2f3c0bb526ad5ded741e9c10d6920cd28a10f108b0d1f2b22688b67a32c4055f6d42ed1d1c3eb767c513d8aa832c470b29a9dc7afb33fdcfeda198b820f724d13a24c6d1123d95b1124cf08c4aaf9531dd819011b9a13b6151d5ab83225fe4517"));

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AuthInputs {
    /// Encoded `data`
    pub key_data: Bytes,
    /// Just authentication-related data
    pub auth_data: Bytes,
}

pub trait KeyData {
    fn encode(&self) -> Bytes;

    fn data_hash(&self) -> B256 {
        keccak256(self.encode())
    }
}

/// An authentication rule an account's data hash commits to.
pub trait AuthRule: KeyData + Send + Sync {
    /// Verifying key of the circuit that checks this rule.
    fn vkey(&self) -> Bytes;

    /// Packages signatures over a message hash into prover inputs.
    fn make_auth_inputs(&self, signatures: &[FixedBytes<65>]) -> AuthInputs;

    fn counterfactual_account(&self, salt: FixedBytes<32>) -> KeystoreAccount {
        KeystoreAccount::with_salt(salt, self.data_hash(), self.vkey())
    }

    fn existing_account(&self, keystore_address: FixedBytes<32>) -> KeystoreAccount {
        KeystoreAccount::with_keystore_address(keystore_address, self.data_hash(), self.vkey())
    }
}

/// `0x00 ‖ abi.encode(bytes32 codehash, uint256 m, address[] signers)`
pub fn encode_key_data(codehash: B256, m: U256, signers: &[Address]) -> Bytes {
    let encoded = (codehash, m, signers.to_vec()).abi_encode_params();
    let mut key_data = Vec::with_capacity(1 + encoded.len());
    key_data.push(M_OF_N_ECDSA_KEY_DATA_PREFIX);
    key_data.extend_from_slice(&encoded);
    key_data.into()
}

/// Signatures concatenated in signer order, or empty bytes if none.
pub fn encode_auth_data(signatures: &[FixedBytes<65>]) -> Bytes {
    if signatures.is_empty() {
        return bytes!("");
    }
    signatures
        .iter()
        .flat_map(|signature| signature.0)
        .collect::<Vec<u8>>()
        .into()
}

pub fn compute_data_hash(codehash: B256, m: U256, signers: &[Address]) -> B256 {
    keccak256(encode_key_data(codehash, m, signers))
}

/// Builds prover inputs with `m` set to the number of signatures supplied,
/// so a partial submission states how many signers took part. Whether the
/// signature count matches the signer list is checked by the prover.
pub fn make_auth_inputs(
    codehash: B256,
    signatures: &[FixedBytes<65>],
    signers: &[Address],
) -> AuthInputs {
    AuthInputs {
        key_data: encode_key_data(codehash, U256::from(signatures.len()), signers),
        auth_data: encode_auth_data(signatures),
    }
}

/// m-of-n ECDSA: at least `m` of the ordered `signers` must sign.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MOfNEcdsa {
    pub codehash: B256,
    pub m: U256,
    pub signers: Vec<Address>,
}

impl MOfNEcdsa {
    pub fn new(codehash: B256, m: u64, signers: Vec<Address>) -> Self {
        Self {
            codehash,
            m: U256::from(m),
            signers,
        }
    }
}

impl KeyData for MOfNEcdsa {
    fn encode(&self) -> Bytes {
        encode_key_data(self.codehash, self.m, &self.signers)
    }
}

impl AuthRule for MOfNEcdsa {
    fn vkey(&self) -> Bytes {
        M_OF_N_ECDSA_VKEY
    }

    fn make_auth_inputs(&self, signatures: &[FixedBytes<65>]) -> AuthInputs {
        make_auth_inputs(self.codehash, signatures, &self.signers)
    }
}
