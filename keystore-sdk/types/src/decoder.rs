use alloy_primitives::{Bytes, FixedBytes, U256};

use crate::{
    primitives::{quantity_from_be_slice, CodecError},
    DepositTransaction, FieldList, KeystoreTxType, L2Transaction, L2TransactionHash, OptionBytes,
    OptionBytesError, RlpUpdateTransaction, RlpWithdrawTransaction, UpdateTransaction,
    WithdrawTransaction,
};

pub trait TxDecode: Sized {
    type Error: std::error::Error;

    /// Decodes the `(txType, data)` pair emitted by the L1 bridge together
    /// with the nonce the bridge assigned to it.
    fn decode_l1_initiated_tx_bytes(
        tx_type: u8,
        l1_initiated_nonce: U256,
        amt: U256, // only relevant to deposit transaction
        bytes: Bytes,
    ) -> Result<Self, Self::Error>;

    /// Decodes transaction bytes as submitted to the sequencer. Withdraw and
    /// update transactions must not be flagged as L1-initiated.
    fn decode_tx_bytes(tx_bytes: Bytes) -> Result<Self, Self::Error>;
}

#[derive(thiserror::Error, Debug)]
pub enum TxDecodeError {
    #[error("invalid tx_bytes length")]
    InvalidLength,
    #[error("invalid keystore tx type")]
    InvalidKeystoreTxType,
    #[error("invalid encoding: {0}")]
    Codec(#[from] CodecError),
    #[error("{field_name} option bytes decode failed: {err}")]
    OptionBytesDecodeFailed {
        field_name: &'static str,
        err: OptionBytesError,
    },
    #[error("sequencer tx must have is_l1_initiated = false")]
    IsL1Initiated,
    #[error("invalid keystore address")]
    InvalidKeystoreAddress,
    #[error("tx hash mismatch: expected {expected}, computed {computed}")]
    HashMismatch {
        expected: L2TransactionHash,
        computed: L2TransactionHash,
    },
}

const DEPOSIT_TX_BYTES_LEN: usize = 1 + 32 + 32 + 32;

fn option_bytes<T>(
    field_name: &'static str,
    bytes: Bytes,
) -> Result<OptionBytes<T>, TxDecodeError>
where
    OptionBytes<T>: TryFrom<Bytes, Error = OptionBytesError>,
{
    OptionBytes::try_from(bytes)
        .map_err(|err| TxDecodeError::OptionBytesDecodeFailed { field_name, err })
}

/// Checks the type byte and the `isL1Initiated` flag and returns the RLP
/// field list that follows them.
fn sequencer_rlp_portion(
    tx_bytes: &[u8],
    expected: KeystoreTxType,
) -> Result<&[u8], TxDecodeError> {
    if tx_bytes.len() < 2 {
        return Err(TxDecodeError::InvalidLength);
    }

    let tx_type =
        KeystoreTxType::try_from(tx_bytes[0]).map_err(|_| TxDecodeError::InvalidKeystoreTxType)?;
    if tx_type != expected {
        return Err(TxDecodeError::InvalidKeystoreTxType);
    }

    if tx_bytes[1] != 0 {
        return Err(TxDecodeError::IsL1Initiated);
    }

    Ok(&tx_bytes[2..])
}

impl DepositTransaction {
    fn decode_l1_initiated_tx_bytes(
        l1_initiated_nonce: U256,
        amt: U256,
        bytes: Bytes,
    ) -> Result<Self, TxDecodeError> {
        let keystore_address = FixedBytes::<32>::try_from(bytes.as_ref())
            .map_err(|_| TxDecodeError::InvalidKeystoreAddress)?;
        Ok(DepositTransaction::new(
            l1_initiated_nonce,
            amt,
            keystore_address,
        ))
    }

    /// Deposits are always L1-initiated, so their tx bytes have a fixed
    /// packed layout instead of the flag and RLP list.
    fn decode_tx_bytes(tx_bytes: Bytes) -> Result<Self, TxDecodeError> {
        if tx_bytes.len() != DEPOSIT_TX_BYTES_LEN {
            return Err(TxDecodeError::InvalidLength);
        }

        let tx_type = KeystoreTxType::try_from(tx_bytes[0])
            .map_err(|_| TxDecodeError::InvalidKeystoreTxType)?;
        if tx_type != KeystoreTxType::Deposit {
            return Err(TxDecodeError::InvalidKeystoreTxType);
        }

        let l1_initiated_nonce = quantity_from_be_slice(&tx_bytes[1..33])?;
        let amt = quantity_from_be_slice(&tx_bytes[33..65])?;
        let keystore_address = FixedBytes::<32>::from_slice(&tx_bytes[65..]);

        Ok(DepositTransaction::new(
            l1_initiated_nonce,
            amt,
            keystore_address,
        ))
    }
}

impl WithdrawTransaction {
    fn decode_rlp_portion(
        is_l1_initiated: bool,
        l1_initiated_nonce: Option<U256>,
        rlp_bytes: &[u8],
    ) -> Result<Self, TxDecodeError> {
        let mut fields = RlpWithdrawTransaction::decode_exact(rlp_bytes)?;
        let fee_per_gas = option_bytes("fee_per_gas", std::mem::take(&mut fields.fee_per_gas))?;

        Ok(WithdrawTransaction::from_rlp(
            is_l1_initiated,
            fee_per_gas,
            l1_initiated_nonce.into(),
            fields,
        ))
    }

    fn decode_l1_initiated_tx_bytes(
        l1_initiated_nonce: U256,
        bytes: Bytes,
    ) -> Result<Self, TxDecodeError> {
        Self::decode_rlp_portion(true, Some(l1_initiated_nonce), &bytes)
    }

    fn decode_tx_bytes(tx_bytes: Bytes) -> Result<Self, TxDecodeError> {
        let rlp_bytes = sequencer_rlp_portion(&tx_bytes, KeystoreTxType::Withdraw)?;
        Self::decode_rlp_portion(false, None, rlp_bytes)
    }
}

impl UpdateTransaction {
    fn decode_rlp_portion(
        is_l1_initiated: bool,
        l1_initiated_nonce: Option<U256>,
        rlp_bytes: &[u8],
    ) -> Result<Self, TxDecodeError> {
        let mut fields = RlpUpdateTransaction::decode_exact(rlp_bytes)?;
        let fee_per_gas = option_bytes("fee_per_gas", std::mem::take(&mut fields.fee_per_gas))?;
        let sponsor_acct_bytes = option_bytes(
            "sponsor_acct_bytes",
            std::mem::take(&mut fields.sponsor_acct_bytes),
        )?;

        Ok(UpdateTransaction::from_rlp(
            is_l1_initiated,
            fee_per_gas,
            l1_initiated_nonce.into(),
            sponsor_acct_bytes,
            fields,
        ))
    }

    fn decode_l1_initiated_tx_bytes(
        l1_initiated_nonce: U256,
        bytes: Bytes,
    ) -> Result<Self, TxDecodeError> {
        Self::decode_rlp_portion(true, Some(l1_initiated_nonce), &bytes)
    }

    fn decode_tx_bytes(tx_bytes: Bytes) -> Result<Self, TxDecodeError> {
        let rlp_bytes = sequencer_rlp_portion(&tx_bytes, KeystoreTxType::Update)?;
        Self::decode_rlp_portion(false, None, rlp_bytes)
    }
}

impl TxDecode for L2Transaction {
    type Error = TxDecodeError;

    fn decode_l1_initiated_tx_bytes(
        tx_type: u8,
        l1_initiated_nonce: U256,
        amt: U256,
        bytes: Bytes,
    ) -> Result<Self, Self::Error> {
        let decoded_tx_type =
            KeystoreTxType::try_from(tx_type).map_err(|_| TxDecodeError::InvalidKeystoreTxType)?;
        let tx = match decoded_tx_type {
            KeystoreTxType::Deposit => {
                DepositTransaction::decode_l1_initiated_tx_bytes(l1_initiated_nonce, amt, bytes)?
                    .into()
            }
            KeystoreTxType::Withdraw => {
                WithdrawTransaction::decode_l1_initiated_tx_bytes(l1_initiated_nonce, bytes)?.into()
            }
            KeystoreTxType::Update => {
                UpdateTransaction::decode_l1_initiated_tx_bytes(l1_initiated_nonce, bytes)?.into()
            }
        };
        Ok(tx)
    }

    fn decode_tx_bytes(tx_bytes: Bytes) -> Result<Self, Self::Error> {
        let first_byte = tx_bytes.first().ok_or(TxDecodeError::InvalidLength)?;
        let tx_type = KeystoreTxType::try_from(*first_byte)
            .map_err(|_| TxDecodeError::InvalidKeystoreTxType)?;

        match tx_type {
            KeystoreTxType::Deposit => Ok(DepositTransaction::decode_tx_bytes(tx_bytes)?.into()),
            KeystoreTxType::Withdraw => Ok(WithdrawTransaction::decode_tx_bytes(tx_bytes)?.into()),
            KeystoreTxType::Update => Ok(UpdateTransaction::decode_tx_bytes(tx_bytes)?.into()),
        }
    }
}
