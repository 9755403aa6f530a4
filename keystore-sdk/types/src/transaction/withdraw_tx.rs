use std::sync::OnceLock;

use alloy_primitives::{keccak256, Address, Bytes, FixedBytes, U256};
use alloy_sol_types::SolValue;
use tracing::debug;

use super::{FieldList, KeystoreAccount, KeystoreTxType, OptionBytes};
use crate::{L1InitiatedTransaction, L2TransactionHash, RollupTx, SignableTx, Withdraw};

/// RLP field list of the [`WithdrawTransaction`]:
///
/// ```solidity
/// rlp.encode([
///     nonce,
///     feePerGas,
///     to,
///     amt,
///     userAcct.keystoreAddress,
///     userAcct.salt,
///     userAcct.dataHash,
///     userAcct.vkey,
///     userProof
/// ])
/// ```
#[derive(Debug, Clone, PartialEq, Eq, alloy_rlp::RlpDecodable, alloy_rlp::RlpEncodable)]
pub struct RlpWithdrawTransaction {
    pub nonce: U256,
    pub fee_per_gas: Bytes,
    pub to: Address,
    pub amt: U256,
    pub user_acct_keystore_address: FixedBytes<32>,
    pub user_acct_salt: FixedBytes<32>,
    pub user_acct_data_hash: FixedBytes<32>,
    pub user_acct_vkey: Bytes,
    pub user_proof: Bytes,
}

impl FieldList for RlpWithdrawTransaction {
    const FIELDS: &'static [&'static str] = &[
        "nonce",
        "feePerGas",
        "to",
        "amt",
        "userAcct.keystoreAddress",
        "userAcct.salt",
        "userAcct.dataHash",
        "userAcct.vkey",
        "userProof",
    ];
}

#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct WithdrawTransaction {
    is_l1_initiated: bool,
    nonce: U256,
    fee_per_gas: OptionBytes<U256>,
    l1_initiated_nonce: OptionBytes<U256>,
    to: Address,
    amt: U256,
    user_acct: KeystoreAccount,
    user_proof: Bytes,

    #[serde(skip)]
    tx_bytes: OnceLock<Bytes>,
    #[serde(skip)]
    tx_hash: OnceLock<L2TransactionHash>,
}

impl WithdrawTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        is_l1_initiated: bool,
        nonce: U256,
        fee_per_gas: OptionBytes<U256>,
        l1_initiated_nonce: OptionBytes<U256>,
        to: Address,
        amt: U256,
        user_acct: KeystoreAccount,
        user_proof: Bytes,
    ) -> Self {
        Self {
            is_l1_initiated,
            nonce,
            fee_per_gas,
            l1_initiated_nonce,
            to,
            amt,
            user_acct,
            user_proof,
            tx_bytes: OnceLock::new(),
            tx_hash: OnceLock::new(),
        }
    }

    pub(crate) fn from_rlp(
        is_l1_initiated: bool,
        fee_per_gas: OptionBytes<U256>,
        l1_initiated_nonce: OptionBytes<U256>,
        rlp: RlpWithdrawTransaction,
    ) -> Self {
        let user_acct = KeystoreAccount {
            keystore_address: rlp.user_acct_keystore_address,
            salt: rlp.user_acct_salt,
            data_hash: rlp.user_acct_data_hash,
            vkey: rlp.user_acct_vkey,
        };
        Self::new(
            is_l1_initiated,
            rlp.nonce,
            fee_per_gas,
            l1_initiated_nonce,
            rlp.to,
            rlp.amt,
            user_acct,
            rlp.user_proof,
        )
    }

    pub fn is_l1_initiated(&self) -> bool {
        self.is_l1_initiated
    }

    pub fn nonce(&self) -> U256 {
        self.nonce
    }

    pub fn fee_per_gas(&self) -> &OptionBytes<U256> {
        &self.fee_per_gas
    }

    pub fn l1_initiated_nonce(&self) -> &OptionBytes<U256> {
        &self.l1_initiated_nonce
    }

    pub fn to(&self) -> Address {
        self.to
    }

    pub fn amt(&self) -> U256 {
        self.amt
    }

    pub fn user_acct(&self) -> &KeystoreAccount {
        &self.user_acct
    }

    pub fn user_proof(&self) -> &Bytes {
        &self.user_proof
    }

    pub fn rlp_fields(&self) -> RlpWithdrawTransaction {
        RlpWithdrawTransaction {
            nonce: self.nonce,
            fee_per_gas: self.fee_per_gas.bytes().clone(),
            to: self.to,
            amt: self.amt,
            user_acct_keystore_address: self.user_acct.keystore_address,
            user_acct_salt: self.user_acct.salt,
            user_acct_data_hash: self.user_acct.data_hash,
            user_acct_vkey: self.user_acct.vkey.clone(),
            user_proof: self.user_proof.clone(),
        }
    }

    fn encode_tx_bytes(&self) -> Bytes {
        // type(1) ‖ isL1Initiated(1) ‖ l1InitiatedNonce ‖ rlp(fields)
        (
            Bytes::from([KeystoreTxType::Withdraw as u8]),
            self.is_l1_initiated,
            self.l1_initiated_nonce.bytes().clone(),
            Bytes::from(self.rlp_fields().encode_fields()),
        )
            .abi_encode_packed()
            .into()
    }

    pub fn l1_initiated_transaction(&self) -> L1InitiatedTransaction {
        L1InitiatedTransaction {
            txType: KeystoreTxType::Withdraw as u8,
            data: self.rlp_fields().encode_fields().into(),
        }
    }

    /// Identifies the withdrawal on L1 when proving it against an output root:
    /// `keccak256(userKeystoreAddress ‖ uint256(nonce))`.
    pub fn withdrawal_hash(&self) -> FixedBytes<32> {
        keccak256((self.user_acct.keystore_address, self.nonce).abi_encode_packed())
    }
}

impl RollupTx for WithdrawTransaction {
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

impl SignableTx for WithdrawTransaction {
    type Message = Withdraw;

    fn eip712_message(&self) -> Withdraw {
        Withdraw {
            userKeystoreAddress: self.user_acct.keystore_address,
            nonce: self.nonce,
            feePerGas: self.fee_per_gas.bytes().clone(),
            to: self.to,
            amt: self.amt,
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("withdraw tx builder error: {msg}")]
pub struct WithdrawTransactionBuilderError {
    pub msg: &'static str,
}

impl WithdrawTransactionBuilderError {
    fn new(msg: &'static str) -> Self {
        Self { msg }
    }
}

#[derive(Debug, Default, Clone)]
pub struct WithdrawTransactionBuilder {
    nonce: Option<U256>,
    fee_per_gas: Option<U256>,
    l1_initiated_nonce: Option<U256>,
    to: Option<Address>,
    amt: Option<U256>,
    user_acct: Option<KeystoreAccount>,
    user_proof: Option<Bytes>,

    #[cfg(any(test, feature = "test-utils"))]
    mock_user_proof: bool,
}

impl From<WithdrawTransaction> for WithdrawTransactionBuilder {
    fn from(withdraw_tx: WithdrawTransaction) -> Self {
        Self {
            nonce: Some(withdraw_tx.nonce),
            fee_per_gas: withdraw_tx.fee_per_gas.into_option(),
            l1_initiated_nonce: withdraw_tx.l1_initiated_nonce.into_option(),
            to: Some(withdraw_tx.to),
            amt: Some(withdraw_tx.amt),
            user_acct: Some(withdraw_tx.user_acct),
            user_proof: Some(withdraw_tx.user_proof),
            ..Default::default()
        }
    }
}

impl WithdrawTransactionBuilder {
    /// Starts a builder for a transaction submitted to the sequencer.
    pub fn sequencer_tx(fee_per_gas: U256) -> Self {
        Self::default().fee_per_gas(fee_per_gas)
    }

    /// Starts a builder for a transaction submitted through the L1 bridge.
    pub fn l1_initiated_tx(l1_initiated_nonce: U256) -> Self {
        Self::default().l1_initiated_nonce(l1_initiated_nonce)
    }

    pub fn l1_initiated_nonce(mut self, l1_initiated_nonce: U256) -> Self {
        self.l1_initiated_nonce = Some(l1_initiated_nonce);
        self
    }

    pub fn fee_per_gas(mut self, fee_per_gas: U256) -> Self {
        self.fee_per_gas = Some(fee_per_gas);
        self
    }

    pub fn nonce(mut self, nonce: U256) -> Self {
        self.nonce = Some(nonce);
        self
    }

    pub fn to(mut self, to: Address) -> Self {
        self.to = Some(to);
        self
    }

    pub fn amt(mut self, amt: U256) -> Self {
        self.amt = Some(amt);
        self
    }

    pub fn user_acct(mut self, user_acct: KeystoreAccount) -> Self {
        self.user_acct = Some(user_acct);
        self
    }

    pub fn user_proof(mut self, user_proof: Bytes) -> Self {
        self.user_proof = Some(user_proof);
        #[cfg(any(test, feature = "test-utils"))]
        {
            self.mock_user_proof = false;
        }
        self
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock_user_proof(mut self) -> Self {
        self.user_proof = None;
        self.mock_user_proof = true;
        self
    }

    pub fn is_nonce_set(&self) -> bool {
        self.nonce.is_some()
    }

    pub fn is_fee_set(&self) -> bool {
        self.fee_per_gas.is_some() || self.l1_initiated_nonce.is_some()
    }

    pub fn user_keystore_address(&self) -> Option<FixedBytes<32>> {
        self.user_acct.as_ref().map(|acct| acct.keystore_address)
    }

    pub fn build(self) -> Result<WithdrawTransaction, WithdrawTransactionBuilderError> {
        let is_l1_initiated = self.l1_initiated_nonce.is_some();
        if is_l1_initiated && self.fee_per_gas.is_some() {
            return Err(WithdrawTransactionBuilderError::new(
                "L1-initiated transaction cannot have fee_per_gas",
            ));
        }
        if !is_l1_initiated && self.fee_per_gas.is_none() {
            return Err(WithdrawTransactionBuilderError::new(
                "fee_per_gas is required for sequencer transaction",
            ));
        }

        let nonce = self
            .nonce
            .ok_or(WithdrawTransactionBuilderError::new("nonce is required"))?;
        let to = self
            .to
            .ok_or(WithdrawTransactionBuilderError::new("to is required"))?;
        let amt = self
            .amt
            .ok_or(WithdrawTransactionBuilderError::new("amt is required"))?;
        let mut user_acct = self
            .user_acct
            .ok_or(WithdrawTransactionBuilderError::new(
                "user_acct is required",
            ))?;

        if nonce > U256::ZERO && user_acct.salt != FixedBytes::ZERO {
            debug!(
                keystore_address = %user_acct.keystore_address,
                %nonce,
                "account already deployed, clearing counterfactual salt"
            );
            user_acct = user_acct.deployed();
        }

        let fee_per_gas = OptionBytes::from(self.fee_per_gas);

        #[cfg(any(test, feature = "test-utils"))]
        let user_proof = match self.user_proof {
            None if self.mock_user_proof => super::gen_tx_mock_proof(
                user_acct.data_hash,
                crate::withdraw_user_msg_hash(
                    user_acct.keystore_address,
                    nonce,
                    fee_per_gas.bytes(),
                    to,
                    amt,
                ),
            ),
            user_proof => user_proof.unwrap_or_default(),
        };
        #[cfg(not(any(test, feature = "test-utils")))]
        let user_proof = self.user_proof.unwrap_or_default();

        Ok(WithdrawTransaction::new(
            is_l1_initiated,
            nonce,
            fee_per_gas,
            self.l1_initiated_nonce.into(),
            to,
            amt,
            user_acct,
            user_proof,
        ))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{address, b256, bytes, hex, Address, Bytes, FixedBytes, U256};

    use super::*;

    fn vector_user_acct() -> KeystoreAccount {
        KeystoreAccount::counterfactual_from_slices(
            &bytes!("1234567890ababab"),
            &bytes!("1234567890"),
            bytes!("1234abcd"),
        )
        .unwrap()
    }

    fn vector_withdraw_tx() -> WithdrawTransaction {
        WithdrawTransactionBuilder::sequencer_tx(U256::from(10_000_000u64))
            .nonce(U256::ZERO)
            .to(address!("a5cc3c03994DB5b0d9A5eEdD10CabaB0813678AC"))
            .amt(U256::from(20_000u64))
            .user_acct(vector_user_acct())
            .user_proof(Bytes::new())
            .build()
            .unwrap()
    }

    #[test]
    fn test_withdraw_tx_bytes_vector() {
        let tx = vector_withdraw_tx();
        assert_eq!(
            tx.tx_bytes(),
            &Bytes::from(hex!("0100f8a380a0000000000000000000000000000000000000000000000000000000000098968094a5cc3c03994db5b0d9a5eedd10cabab0813678ac824e20a0dafd7a698501896eefef0a3893d88ca07bc07a09888ee54ab60a4b079baa2179a00000000000000000000000000000000000000000000000001234567890abababa00000000000000000000000000000000000000000000000000000001234567890841234abcd80"))
        );
        assert_eq!(tx.tx_hash(), keccak256(tx.tx_bytes()));
        assert_eq!(tx.clone().into_tx_bytes(), *tx.tx_bytes());
    }

    #[test]
    fn test_withdraw_user_msg_hash_vector() {
        let tx = vector_withdraw_tx();
        assert_eq!(
            tx.user_msg_hash(),
            b256!("5a39e6dfaeac7043c97e0c510564c7ee61d4a45b46591fe66627cee1bcca49bf")
        );
        assert_ne!(tx.user_msg_hash(), tx.tx_hash());
    }

    #[test]
    fn test_withdraw_typed_data() -> eyre::Result<()> {
        let tx = vector_withdraw_tx();
        let typed_data = tx.typed_data();
        assert_eq!(typed_data.primary_type, "Withdraw");
        assert_eq!(typed_data.domain.name.as_deref(), Some("AxiomKeystore"));
        assert_eq!(typed_data.eip712_signing_hash()?, tx.user_msg_hash());
        Ok(())
    }

    #[test]
    fn test_withdraw_sign_recovers_signer() -> eyre::Result<()> {
        let pk = hex!("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
        let tx = vector_withdraw_tx();
        let signature = tx.sign(&pk)?;
        assert_eq!(
            crate::signer::recover_signer(&signature, tx.user_msg_hash())?,
            address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266")
        );
        Ok(())
    }

    #[test]
    fn test_withdrawal_hash() {
        let tx = vector_withdraw_tx();
        let mut preimage = tx.user_acct().keystore_address.to_vec();
        preimage.extend_from_slice(&[0u8; 32]);
        assert_eq!(tx.withdrawal_hash(), keccak256(preimage));
    }

    #[test]
    fn test_salt_cleared_for_deployed_account() -> eyre::Result<()> {
        let user_acct = vector_user_acct();
        let tx = WithdrawTransactionBuilder::sequencer_tx(U256::from(1))
            .nonce(U256::from(3))
            .to(Address::random())
            .amt(U256::from(1))
            .user_acct(user_acct.clone())
            .build()?;
        assert_eq!(tx.user_acct().salt, FixedBytes::ZERO);
        assert_eq!(tx.user_acct().keystore_address, user_acct.keystore_address);
        assert_eq!(tx.user_acct().data_hash, user_acct.data_hash);
        Ok(())
    }

    #[test]
    fn test_builder_fee_and_l1_nonce_are_exclusive() {
        let base = WithdrawTransactionBuilder::default()
            .nonce(U256::ZERO)
            .to(Address::random())
            .amt(U256::from(1))
            .user_acct(vector_user_acct());

        let err = base
            .clone()
            .fee_per_gas(U256::from(1))
            .l1_initiated_nonce(U256::from(1))
            .build()
            .unwrap_err();
        assert_eq!(err.msg, "L1-initiated transaction cannot have fee_per_gas");

        let err = base.clone().build().unwrap_err();
        assert_eq!(err.msg, "fee_per_gas is required for sequencer transaction");

        let err = WithdrawTransactionBuilder::sequencer_tx(U256::from(1))
            .nonce(U256::ZERO)
            .build()
            .unwrap_err();
        assert_eq!(err.msg, "to is required");
    }

    #[test]
    fn test_l1_initiated_withdraw_encoding() -> eyre::Result<()> {
        let tx = WithdrawTransactionBuilder::l1_initiated_tx(U256::from(9))
            .nonce(U256::ZERO)
            .to(Address::random())
            .amt(U256::from(5))
            .user_acct(vector_user_acct())
            .mock_user_proof()
            .build()?;

        let tx_bytes = tx.tx_bytes();
        assert_eq!(tx_bytes[..2], [0x01, 0x01]);
        assert_eq!(U256::from_be_slice(&tx_bytes[2..34]), U256::from(9));
        assert!(tx.fee_per_gas().bytes().is_empty());

        let l1_tx = tx.l1_initiated_transaction();
        assert_eq!(l1_tx.txType, KeystoreTxType::Withdraw as u8);
        assert_eq!(l1_tx.data.as_ref(), &tx_bytes[34..]);
        Ok(())
    }

    #[test]
    fn test_builder_from_tx_replaces_proof() -> eyre::Result<()> {
        let tx = vector_withdraw_tx();
        let proven = WithdrawTransactionBuilder::from(tx.clone())
            .user_proof(bytes!("dead"))
            .build()?;
        assert_eq!(proven.user_proof(), &bytes!("dead"));
        assert_eq!(proven.user_msg_hash(), tx.user_msg_hash());
        assert_ne!(proven.tx_hash(), tx.tx_hash());
        Ok(())
    }
}
