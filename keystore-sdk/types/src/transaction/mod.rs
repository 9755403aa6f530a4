mod field_list;
pub use field_list::*;

mod l2_tx;
pub use l2_tx::*;

mod update_tx;
pub use update_tx::*;

mod deposit_tx;
pub use deposit_tx::*;

mod withdraw_tx;
pub use withdraw_tx::*;

mod option_bytes;
pub use option_bytes::*;

mod account;
pub use account::*;

mod constants {
    use alloy_dyn_abi::Eip712Domain;
    use alloy_sol_types::eip712_domain;

    pub const EIP712_DOMAIN: Eip712Domain = eip712_domain!(
        name: "AxiomKeystore",
        version: "1",
        chain_id: 999999999,
    );
}
pub use constants::*;

#[cfg(any(test, feature = "test-utils"))]
mod utils {
    use alloy_primitives::{Bytes, FixedBytes};

    /// Proof bytes with the layout the rollup verifier expects but an all-zero
    /// proof body: 384 zero bytes followed by the hi/lo limbs of the data hash
    /// and message hash.
    pub fn gen_tx_mock_proof(data_hash: FixedBytes<32>, msg_hash: FixedBytes<32>) -> Bytes {
        let limbs = |input: FixedBytes<32>| -> [FixedBytes<32>; 2] {
            [
                FixedBytes::<32>::left_padding_from(&input[..16]),
                FixedBytes::<32>::left_padding_from(&input[16..]),
            ]
        };

        let mut proof = vec![0u8; 384];
        for limb in limbs(data_hash).into_iter().chain(limbs(msg_hash)) {
            proof.extend_from_slice(limb.as_slice());
        }
        Bytes::from(proof)
    }
}
#[cfg(any(test, feature = "test-utils"))]
pub use utils::*;
