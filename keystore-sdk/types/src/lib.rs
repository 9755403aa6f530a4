use alloy_primitives::{Bytes, B256};

pub mod primitives;

mod hash;
pub use hash::*;

mod decoder;
pub use decoder::*;

mod transaction;
pub use transaction::*;

mod bridge;
pub use bridge::*;

pub mod auth_rule;
pub use auth_rule::{AuthInputs, AuthRule, KeyData, MOfNEcdsa};

pub mod signer;

pub type L2TransactionHash = B256;

pub trait RollupTx {
    fn tx_bytes(&self) -> &Bytes;

    fn into_tx_bytes(self) -> Bytes;

    /// `keccak256` of [`RollupTx::tx_bytes`].
    fn tx_hash(&self) -> L2TransactionHash;
}
