use alloy_dyn_abi::TypedData;
use alloy_primitives::{Address, Bytes, FixedBytes, U256};
use alloy_sol_types::{sol, SolStruct};
use serde::Serialize;

use crate::{
    signer::{sign, SignError},
    RollupTx, EIP712_DOMAIN,
};

sol! {
    #[allow(missing_docs)]
    #[derive(Serialize)]
    struct Withdraw {
        bytes32 userKeystoreAddress;
        uint256 nonce;
        bytes feePerGas;
        address to;
        uint256 amt;
    }

    #[allow(missing_docs)]
    #[derive(Serialize)]
    struct Update {
        bytes32 userKeystoreAddress;
        uint256 nonce;
        bytes feePerGas;
        bytes newUserData;
        bytes newUserVkey;
    }

    #[allow(missing_docs)]
    #[derive(Serialize)]
    struct Sponsor {
        bytes32 sponsorKeystoreAddress;
        bytes32 userMsgHash;
        bytes32 userKeystoreAddress;
    }
}

pub fn withdraw_user_msg_hash(
    user_keystore_address: FixedBytes<32>,
    nonce: U256,
    fee_per_gas: &Bytes,
    to: Address,
    amt: U256,
) -> FixedBytes<32> {
    let withdraw = Withdraw {
        userKeystoreAddress: user_keystore_address,
        nonce,
        feePerGas: fee_per_gas.clone(),
        to,
        amt,
    };
    withdraw.eip712_signing_hash(&EIP712_DOMAIN)
}

pub fn update_user_msg_hash(
    user_keystore_address: FixedBytes<32>,
    nonce: U256,
    fee_per_gas: &Bytes,
    new_user_data: &Bytes,
    new_user_vkey: &Bytes,
) -> FixedBytes<32> {
    let update = Update {
        userKeystoreAddress: user_keystore_address,
        nonce,
        feePerGas: fee_per_gas.clone(),
        newUserData: new_user_data.clone(),
        newUserVkey: new_user_vkey.clone(),
    };
    update.eip712_signing_hash(&EIP712_DOMAIN)
}

/// Digest a sponsor signs to co-authorize the user message `user_msg_hash`.
pub fn sponsor_msg_hash(
    sponsor_keystore_address: FixedBytes<32>,
    user_msg_hash: FixedBytes<32>,
    user_keystore_address: FixedBytes<32>,
) -> FixedBytes<32> {
    let sponsor = Sponsor {
        sponsorKeystoreAddress: sponsor_keystore_address,
        userMsgHash: user_msg_hash,
        userKeystoreAddress: user_keystore_address,
    };
    sponsor.eip712_signing_hash(&EIP712_DOMAIN)
}

/// A transaction the user authorizes by signing an EIP-712 digest.
///
/// The digest ([`SignableTx::user_msg_hash`]) covers only the user-intent
/// fields and is distinct from [`RollupTx::tx_hash`], which hashes the full
/// wire encoding including proofs.
pub trait SignableTx: RollupTx {
    type Message: SolStruct + Serialize;

    fn eip712_message(&self) -> Self::Message;

    fn user_msg_hash(&self) -> FixedBytes<32> {
        self.eip712_message().eip712_signing_hash(&EIP712_DOMAIN)
    }

    /// The full typed-data document, suitable for `eth_signTypedData_v4`.
    fn typed_data(&self) -> TypedData {
        TypedData::from_struct(&self.eip712_message(), Some(EIP712_DOMAIN))
    }

    fn sign(&self, private_key: &[u8]) -> Result<FixedBytes<65>, SignError> {
        sign(private_key, self.user_msg_hash())
    }
}
