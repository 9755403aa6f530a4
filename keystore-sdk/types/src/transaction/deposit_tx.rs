use std::sync::OnceLock;

use alloy_primitives::{keccak256, Bytes, FixedBytes, U256};
use alloy_sol_types::SolValue;

use super::KeystoreTxType;
use crate::{L1InitiatedTransaction, L2TransactionHash, RollupTx};

/// Bridges ETH from L1 into a keystore account. Deposits are always
/// L1-initiated, so they carry no proof and are not user-signed.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct DepositTransaction {
    l1_initiated_nonce: U256,
    amt: U256,
    keystore_address: FixedBytes<32>,

    #[serde(skip)]
    tx_bytes: OnceLock<Bytes>,
    #[serde(skip)]
    tx_hash: OnceLock<L2TransactionHash>,
}

impl DepositTransaction {
    pub fn new(l1_initiated_nonce: U256, amt: U256, keystore_address: FixedBytes<32>) -> Self {
        Self {
            l1_initiated_nonce,
            amt,
            keystore_address,
            tx_bytes: OnceLock::new(),
            tx_hash: OnceLock::new(),
        }
    }

    pub fn l1_initiated_nonce(&self) -> U256 {
        self.l1_initiated_nonce
    }

    pub fn amt(&self) -> U256 {
        self.amt
    }

    pub fn keystore_address(&self) -> FixedBytes<32> {
        self.keystore_address
    }

    fn encode_tx_bytes(&self) -> Bytes {
        // type(1) ‖ l1InitiatedNonce(32) ‖ amt(32) ‖ keystoreAddress(32)
        (
            Bytes::from([KeystoreTxType::Deposit as u8]),
            self.l1_initiated_nonce,
            self.amt,
            self.keystore_address,
        )
            .abi_encode_packed()
            .into()
    }

    pub fn l1_initiated_transaction(&self) -> L1InitiatedTransaction {
        L1InitiatedTransaction {
            txType: KeystoreTxType::Deposit as u8,
            data: self.keystore_address.into(),
        }
    }
}

impl RollupTx for DepositTransaction {
    fn tx_bytes(&self) -> &Bytes {
        self.tx_bytes.get_or_init(|| self.encode_tx_bytes())
    }

    fn into_tx_bytes(self) -> Bytes {
        match self.tx_bytes.get() {
            Some(tx_bytes) => tx_bytes.clone(),
            None => self.encode_tx_bytes(),
        }
    }

    fn tx_hash(&self) -> L2TransactionHash {
        *self.tx_hash.get_or_init(|| keccak256(self.tx_bytes()))
    }
}

#[derive(Debug, thiserror::Error)]
#[error("deposit tx builder error: {msg}")]
pub struct DepositTransactionBuilderError {
    pub msg: &'static str,
}

impl DepositTransactionBuilderError {
    pub fn new(msg: &'static str) -> Self {
        Self { msg }
    }
}

#[derive(Debug, Default, Clone)]
pub struct DepositTransactionBuilder {
    l1_initiated_nonce: Option<U256>,
    amt: Option<U256>,
    keystore_address: Option<FixedBytes<32>>,
}

impl From<DepositTransaction> for DepositTransactionBuilder {
    fn from(deposit_tx: DepositTransaction) -> Self {
        Self {
            l1_initiated_nonce: Some(deposit_tx.l1_initiated_nonce),
            amt: Some(deposit_tx.amt),
            keystore_address: Some(deposit_tx.keystore_address),
        }
    }
}

impl DepositTransactionBuilder {
    pub fn l1_initiated_nonce(mut self, l1_initiated_nonce: U256) -> Self {
        self.l1_initiated_nonce = Some(l1_initiated_nonce);
        self
    }

    pub fn amt(mut self, amt: U256) -> Self {
        self.amt = Some(amt);
        self
    }

    pub fn keystore_address(mut self, keystore_address: FixedBytes<32>) -> Self {
        self.keystore_address = Some(keystore_address);
        self
    }

    pub fn build(self) -> Result<DepositTransaction, DepositTransactionBuilderError> {
        let l1_initiated_nonce = self
            .l1_initiated_nonce
            .ok_or(DepositTransactionBuilderError::new(
                "l1_initiated_nonce is required",
            ))?;
        let amt = self
            .amt
            .ok_or(DepositTransactionBuilderError::new("amt is required"))?;
        let keystore_address = self
            .keystore_address
            .ok_or(DepositTransactionBuilderError::new(
                "keystore_address is required",
            ))?;

        Ok(DepositTransaction::new(
            l1_initiated_nonce,
            amt,
            keystore_address,
        ))
    }
}
