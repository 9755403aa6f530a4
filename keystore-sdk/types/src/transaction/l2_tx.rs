use alloy_primitives::{Bytes, FixedBytes, U256, U64};

use super::{DepositTransaction, UpdateTransaction, WithdrawTransaction};
use crate::{L1InitiatedTransaction, L2TransactionHash, RollupTx, TxDecode, TxDecodeError};

/// Transaction type tag, the first byte of every encoded transaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum KeystoreTxType {
    Deposit = 0,
    Withdraw = 1,
    Update = 2,
}

#[derive(thiserror::Error, Debug)]
#[error("invalid keystore tx type")]
pub struct InvalidKeystoreTxType;

impl TryFrom<u8> for KeystoreTxType {
    type Error = InvalidKeystoreTxType;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Self::Deposit),
            1 => Ok(Self::Withdraw),
            2 => Ok(Self::Update),
            _ => Err(InvalidKeystoreTxType),
        }
    }
}

#[allow(clippy::large_enum_variant)]
#[derive(Debug, Clone, serde::Serialize, serde::Deserialize)]
pub enum L2Transaction {
    Deposit(DepositTransaction),
    Withdraw(WithdrawTransaction),
    Update(UpdateTransaction),
}

impl From<DepositTransaction> for L2Transaction {
    fn from(tx: DepositTransaction) -> Self {
        Self::Deposit(tx)
    }
}

impl From<WithdrawTransaction> for L2Transaction {
    fn from(tx: WithdrawTransaction) -> Self {
        Self::Withdraw(tx)
    }
}

impl From<UpdateTransaction> for L2Transaction {
    fn from(tx: UpdateTransaction) -> Self {
        Self::Update(tx)
    }
}

impl L2Transaction {
    pub fn as_deposit_tx(&self) -> Option<&DepositTransaction> {
        match self {
            L2Transaction::Deposit(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn as_withdraw_tx(&self) -> Option<&WithdrawTransaction> {
        match self {
            L2Transaction::Withdraw(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn as_update_tx(&self) -> Option<&UpdateTransaction> {
        match self {
            L2Transaction::Update(tx) => Some(tx),
            _ => None,
        }
    }

    pub fn tx_type(&self) -> KeystoreTxType {
        match self {
            L2Transaction::Deposit(_) => KeystoreTxType::Deposit,
            L2Transaction::Withdraw(_) => KeystoreTxType::Withdraw,
            L2Transaction::Update(_) => KeystoreTxType::Update,
        }
    }

    pub fn user_keystore_address(&self) -> FixedBytes<32> {
        match self {
            L2Transaction::Deposit(tx) => tx.keystore_address(),
            L2Transaction::Withdraw(tx) => tx.user_acct().keystore_address,
            L2Transaction::Update(tx) => tx.user_acct().keystore_address,
        }
    }

    pub fn l1_initiated_nonce(&self) -> Option<U256> {
        match self {
            L2Transaction::Deposit(tx) => Some(tx.l1_initiated_nonce()),
            L2Transaction::Withdraw(tx) => tx.l1_initiated_nonce().option().copied(),
            L2Transaction::Update(tx) => tx.l1_initiated_nonce().option().copied(),
        }
    }

    /// `(txType, data)` pair submitted to the L1 bridge for this transaction.
    pub fn l1_initiated_transaction(&self) -> L1InitiatedTransaction {
        match self {
            L2Transaction::Deposit(tx) => tx.l1_initiated_transaction(),
            L2Transaction::Withdraw(tx) => tx.l1_initiated_transaction(),
            L2Transaction::Update(tx) => tx.l1_initiated_transaction(),
        }
    }
}

impl RollupTx for L2Transaction {
    fn tx_bytes(&self) -> &Bytes {
        match self {
            L2Transaction::Deposit(tx) => tx.tx_bytes(),
            L2Transaction::Withdraw(tx) => tx.tx_bytes(),
            L2Transaction::Update(tx) => tx.tx_bytes(),
        }
    }

    fn into_tx_bytes(self) -> Bytes {
        match self {
            L2Transaction::Deposit(tx) => tx.into_tx_bytes(),
            L2Transaction::Withdraw(tx) => tx.into_tx_bytes(),
            L2Transaction::Update(tx) => tx.into_tx_bytes(),
        }
    }

    fn tx_hash(&self) -> L2TransactionHash {
        match self {
            L2Transaction::Deposit(tx) => tx.tx_hash(),
            L2Transaction::Withdraw(tx) => tx.tx_hash(),
            L2Transaction::Update(tx) => tx.tx_hash(),
        }
    }
}

impl PartialEq for L2Transaction {
    fn eq(&self, other: &Self) -> bool {
        self.tx_hash() == other.tx_hash()
    }
}
impl Eq for L2Transaction {}

/// Block inclusion metadata reported by the node for a transaction.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BaseTransaction {
    pub hash: L2TransactionHash,
    pub transaction_index: U64,
    pub block_hash: FixedBytes<32>,
    pub block_number: U64,
}

/// A transaction together with where it was included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludedTransaction {
    base: BaseTransaction,
    tx: L2Transaction,
}

impl IncludedTransaction {
    /// Fails if the reported hash is not the hash of `tx`.
    pub fn new(base: BaseTransaction, tx: L2Transaction) -> Result<Self, TxDecodeError> {
        let computed = tx.tx_hash();
        if computed != base.hash {
            return Err(TxDecodeError::HashMismatch {
                expected: base.hash,
                computed,
            });
        }
        Ok(Self { base, tx })
    }

    pub fn from_tx_bytes(base: BaseTransaction, tx_bytes: Bytes) -> Result<Self, TxDecodeError> {
        Self::new(base, L2Transaction::decode_tx_bytes(tx_bytes)?)
    }

    pub fn base(&self) -> &BaseTransaction {
        &self.base
    }

    pub fn tx(&self) -> &L2Transaction {
        &self.tx
    }

    pub fn into_tx(self) -> L2Transaction {
        self.tx
    }
}
