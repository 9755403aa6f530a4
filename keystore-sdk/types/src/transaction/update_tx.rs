use std::sync::OnceLock;

use alloy_primitives::{keccak256, Bytes, FixedBytes, U256};
use alloy_sol_types::SolValue;
use tracing::debug;

use super::{FieldList, KeystoreAccount, KeystoreTxType, OptionBytes};
use crate::{
    sponsor_msg_hash, L1InitiatedTransaction, L2TransactionHash, RollupTx, SignableTx, Update,
};

/// RLP field list of the [`UpdateTransaction`]:
///
/// ```solidity
/// rlp.encode([
///     nonce,
///     feePerGas,
///     newUserData,
///     newUserVkey,
///     userAcct.keystoreAddress,
///     userAcct.salt,
///     userAcct.dataHash,
///     userAcct.vkey,
///     userProof,
///     sponsorAcctBytes,
///     sponsorProof
/// ])
/// ```
#[derive(Debug, Clone, PartialEq, Eq, alloy_rlp::RlpDecodable, alloy_rlp::RlpEncodable)]
pub struct RlpUpdateTransaction {
    pub nonce: U256,
    pub fee_per_gas: Bytes,
    pub new_user_data: Bytes,
    pub new_user_vkey: Bytes,
    pub user_acct_keystore_address: FixedBytes<32>,
    pub user_acct_salt: FixedBytes<32>,
    pub user_acct_data_hash: FixedBytes<32>,
    pub user_acct_vkey: Bytes,
    pub user_proof: Bytes,
    pub sponsor_acct_bytes: Bytes,
    pub sponsor_proof: Bytes,
}

impl FieldList for RlpUpdateTransaction {
    const FIELDS: &'static [&'static str] = &[
        "nonce",
        "feePerGas",
        "newUserData",
        "newUserVkey",
        "userAcct.keystoreAddress",
        "userAcct.salt",
        "userAcct.dataHash",
        "userAcct.vkey",
        "userProof",
        "sponsorAcctBytes",
        "sponsorProof",
    ];
}

/// Rotates the data hash and vkey of a keystore account, optionally paid for
/// by a sponsor account.
#[derive(Clone, Debug, serde::Serialize, serde::Deserialize)]
pub struct UpdateTransaction {
    is_l1_initiated: bool,
    nonce: U256,
    fee_per_gas: OptionBytes<U256>,
    l1_initiated_nonce: OptionBytes<U256>,
    new_user_data: Bytes,
    new_user_vkey: Bytes,
    user_acct: KeystoreAccount,
    user_proof: Bytes,
    sponsor_acct_bytes: OptionBytes<KeystoreAccount>,
    sponsor_proof: Bytes,

    #[serde(skip)]
    tx_bytes: OnceLock<Bytes>,
    #[serde(skip)]
    tx_hash: OnceLock<L2TransactionHash>,
}

impl UpdateTransaction {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        is_l1_initiated: bool,
        nonce: U256,
        fee_per_gas: OptionBytes<U256>,
        l1_initiated_nonce: OptionBytes<U256>,
        new_user_data: Bytes,
        new_user_vkey: Bytes,
        user_acct: KeystoreAccount,
        user_proof: Bytes,
        sponsor_acct_bytes: OptionBytes<KeystoreAccount>,
        sponsor_proof: Bytes,
    ) -> Self {
        Self {
            is_l1_initiated,
            nonce,
            fee_per_gas,
            l1_initiated_nonce,
            new_user_data,
            new_user_vkey,
            user_acct,
            user_proof,
            sponsor_acct_bytes,
            sponsor_proof,
            tx_bytes: OnceLock::new(),
            tx_hash: OnceLock::new(),
        }
    }

    pub(crate) fn from_rlp(
        is_l1_initiated: bool,
        fee_per_gas: OptionBytes<U256>,
        l1_initiated_nonce: OptionBytes<U256>,
        sponsor_acct_bytes: OptionBytes<KeystoreAccount>,
        rlp: RlpUpdateTransaction,
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
            rlp.new_user_data,
            rlp.new_user_vkey,
            user_acct,
            rlp.user_proof,
            sponsor_acct_bytes,
            rlp.sponsor_proof,
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

    pub fn new_user_data(&self) -> &Bytes {
        &self.new_user_data
    }

    pub fn new_user_vkey(&self) -> &Bytes {
        &self.new_user_vkey
    }

    pub fn user_acct(&self) -> &KeystoreAccount {
        &self.user_acct
    }

    pub fn user_proof(&self) -> &Bytes {
        &self.user_proof
    }

    pub fn sponsor_acct_bytes(&self) -> &OptionBytes<KeystoreAccount> {
        &self.sponsor_acct_bytes
    }

    pub fn sponsor_proof(&self) -> &Bytes {
        &self.sponsor_proof
    }

    pub fn is_sponsored(&self) -> bool {
        self.sponsor_acct_bytes.is_some()
    }

    /// Digest the sponsor signs, or `None` for an unsponsored update.
    pub fn sponsor_msg_hash(&self) -> Option<FixedBytes<32>> {
        self.sponsor_acct_bytes.option().map(|sponsor_acct| {
            sponsor_msg_hash(
                sponsor_acct.keystore_address,
                self.user_msg_hash(),
                self.user_acct.keystore_address,
            )
        })
    }

    pub fn rlp_fields(&self) -> RlpUpdateTransaction {
        RlpUpdateTransaction {
            nonce: self.nonce,
            fee_per_gas: self.fee_per_gas.bytes().clone(),
            new_user_data: self.new_user_data.clone(),
            new_user_vkey: self.new_user_vkey.clone(),
            user_acct_keystore_address: self.user_acct.keystore_address,
            user_acct_salt: self.user_acct.salt,
            user_acct_data_hash: self.user_acct.data_hash,
            user_acct_vkey: self.user_acct.vkey.clone(),
            user_proof: self.user_proof.clone(),
            sponsor_acct_bytes: self.sponsor_acct_bytes.bytes().clone(),
            sponsor_proof: self.sponsor_proof.clone(),
        }
    }

    fn encode_tx_bytes(&self) -> Bytes {
        (
            Bytes::from([KeystoreTxType::Update as u8]),
            self.is_l1_initiated,
            self.l1_initiated_nonce.bytes().clone(),
            Bytes::from(self.rlp_fields().encode_fields()),
        )
            .abi_encode_packed()
            .into()
    }

    pub fn l1_initiated_transaction(&self) -> L1InitiatedTransaction {
        L1InitiatedTransaction {
            txType: KeystoreTxType::Update as u8,
            data: self.rlp_fields().encode_fields().into(),
        }
    }
}

impl RollupTx for UpdateTransaction {
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

impl SignableTx for UpdateTransaction {
    type Message = Update;

    fn eip712_message(&self) -> Update {
        Update {
            userKeystoreAddress: self.user_acct.keystore_address,
            nonce: self.nonce,
            feePerGas: self.fee_per_gas.bytes().clone(),
            newUserData: self.new_user_data.clone(),
            newUserVkey: self.new_user_vkey.clone(),
        }
    }
}

#[derive(thiserror::Error, Debug)]
#[error("update tx builder error: {msg}")]
pub struct UpdateTransactionBuilderError {
    pub msg: &'static str,
}

impl UpdateTransactionBuilderError {
    fn new(msg: &'static str) -> Self {
        Self { msg }
    }
}

#[derive(Debug, Default, Clone)]
pub struct UpdateTransactionBuilder {
    nonce: Option<U256>,
    fee_per_gas: Option<U256>,
    l1_initiated_nonce: Option<U256>,
    new_user_data: Option<Bytes>,
    new_user_vkey: Option<Bytes>,
    user_acct: Option<KeystoreAccount>,
    user_proof: Option<Bytes>,
    sponsor_acct: Option<KeystoreAccount>,
    sponsor_proof: Option<Bytes>,

    #[cfg(any(test, feature = "test-utils"))]
    mock_user_proof: bool,
    #[cfg(any(test, feature = "test-utils"))]
    mock_sponsor_proof: bool,
}

impl From<UpdateTransaction> for UpdateTransactionBuilder {
    fn from(update_tx: UpdateTransaction) -> Self {
        Self {
            nonce: Some(update_tx.nonce),
            fee_per_gas: update_tx.fee_per_gas.into_option(),
            l1_initiated_nonce: update_tx.l1_initiated_nonce.into_option(),
            new_user_data: Some(update_tx.new_user_data),
            new_user_vkey: Some(update_tx.new_user_vkey),
            user_acct: Some(update_tx.user_acct),
            user_proof: Some(update_tx.user_proof),
            sponsor_acct: update_tx.sponsor_acct_bytes.into_option(),
            sponsor_proof: Some(update_tx.sponsor_proof),
            ..Default::default()
        }
    }
}

impl UpdateTransactionBuilder {
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

    pub fn new_user_data(mut self, new_user_data: Bytes) -> Self {
        self.new_user_data = Some(new_user_data);
        self
    }

    pub fn new_user_vkey(mut self, new_user_vkey: Bytes) -> Self {
        self.new_user_vkey = Some(new_user_vkey);
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

    pub fn sponsor_acct(mut self, sponsor_acct: Option<KeystoreAccount>) -> Self {
        self.sponsor_acct = sponsor_acct;
        self
    }

    pub fn sponsor_proof(mut self, sponsor_proof: Bytes) -> Self {
        self.sponsor_proof = Some(sponsor_proof);
        #[cfg(any(test, feature = "test-utils"))]
        {
            self.mock_sponsor_proof = false;
        }
        self
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock_user_proof(mut self) -> Self {
        self.user_proof = None;
        self.mock_user_proof = true;
        self
    }

    #[cfg(any(test, feature = "test-utils"))]
    pub fn mock_sponsor_proof(mut self) -> Self {
        self.sponsor_proof = None;
        self.mock_sponsor_proof = true;
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

    pub fn build(self) -> Result<UpdateTransaction, UpdateTransactionBuilderError> {
        let is_l1_initiated = self.l1_initiated_nonce.is_some();
        if is_l1_initiated && self.fee_per_gas.is_some() {
            return Err(UpdateTransactionBuilderError::new(
                "L1-initiated transaction cannot have fee_per_gas",
            ));
        }
        if !is_l1_initiated && self.fee_per_gas.is_none() {
            return Err(UpdateTransactionBuilderError::new(
                "fee_per_gas is required for sequencer transaction",
            ));
        }

        let nonce = self
            .nonce
            .ok_or(UpdateTransactionBuilderError::new("nonce is required"))?;
        let new_user_vkey = self
            .new_user_vkey
            .ok_or(UpdateTransactionBuilderError::new(
                "new user vkey is required",
            ))?;
        let new_user_data = self
            .new_user_data
            .ok_or(UpdateTransactionBuilderError::new(
                "new user data is required",
            ))?;
        let mut user_acct = self
            .user_acct
            .ok_or(UpdateTransactionBuilderError::new(
                "user account is required",
            ))?;

        if nonce > U256::ZERO && user_acct.salt != FixedBytes::ZERO {
            debug!(
                keystore_address = %user_acct.keystore_address,
                %nonce,
                "account already deployed, clearing counterfactual salt"
            );
            user_acct = user_acct.deployed();
        }

        let has_sponsor_proof = self
            .sponsor_proof
            .as_ref()
            .is_some_and(|proof| !proof.is_empty());
        if has_sponsor_proof && self.sponsor_acct.is_none() {
            return Err(UpdateTransactionBuilderError::new(
                "sponsor proof requires a sponsor account",
            ));
        }

        let fee_per_gas = OptionBytes::from(self.fee_per_gas);

        #[cfg(any(test, feature = "test-utils"))]
        let (user_proof, sponsor_proof) = {
            let user_msg_hash = crate::update_user_msg_hash(
                user_acct.keystore_address,
                nonce,
                fee_per_gas.bytes(),
                &new_user_data,
                &new_user_vkey,
            );
            let user_proof = match self.user_proof {
                None if self.mock_user_proof => {
                    super::gen_tx_mock_proof(user_acct.data_hash, user_msg_hash)
                }
                user_proof => user_proof.unwrap_or_default(),
            };
            let sponsor_proof = match (self.sponsor_proof, self.sponsor_acct.as_ref()) {
                (None, Some(sponsor_acct)) if self.mock_sponsor_proof => {
                    super::gen_tx_mock_proof(
                        sponsor_acct.data_hash,
                        sponsor_msg_hash(
                            sponsor_acct.keystore_address,
                            user_msg_hash,
                            user_acct.keystore_address,
                        ),
                    )
                }
                (None, None) if self.mock_sponsor_proof => {
                    return Err(UpdateTransactionBuilderError::new(
                        "sponsor account is required to generate mock sponsor proof",
                    ));
                }
                (sponsor_proof, _) => sponsor_proof.unwrap_or_default(),
            };
            (user_proof, sponsor_proof)
        };
        #[cfg(not(any(test, feature = "test-utils")))]
        let (user_proof, sponsor_proof) = (
            self.user_proof.unwrap_or_default(),
            self.sponsor_proof.unwrap_or_default(),
        );

        Ok(UpdateTransaction::new(
            is_l1_initiated,
            nonce,
            fee_per_gas,
            self.l1_initiated_nonce.into(),
            new_user_data,
            new_user_vkey,
            user_acct,
            user_proof,
            self.sponsor_acct.into(),
            sponsor_proof,
        ))
    }
}

#[cfg(test)]
mod tests {
    use alloy_primitives::{b256, bytes, Bytes, FixedBytes, U256};

    use super::*;

    fn random_keystore_account() -> KeystoreAccount {
        KeystoreAccount::with_salt(
            FixedBytes::random(),
            FixedBytes::random(),
            FixedBytes::<20>::random().into(),
        )
    }

    fn sponsor_account() -> KeystoreAccount {
        KeystoreAccount::with_keystore_address(
            b256!("b5ce21832ca3bbf53de610c6dda13d6a735b0a8ea3422aeaab678a01e298269d"),
            b256!("ecf85bc51a8b47c545dad1a47e868276d0a92b7cf2716033ce77d385a6b67c4b"),
            bytes!("0101"),
        )
    }

    fn update_builder(user_acct: KeystoreAccount) -> UpdateTransactionBuilder {
        UpdateTransactionBuilder::sequencer_tx(U256::from(5))
            .nonce(U256::ZERO)
            .new_user_data(Bytes::from(FixedBytes::<20>::random()))
            .new_user_vkey(Bytes::from(FixedBytes::<20>::random()))
            .user_acct(user_acct)
    }

    #[test]
    fn test_update_tx_bytes_layout() -> eyre::Result<()> {
        let tx = update_builder(random_keystore_account()).build()?;
        let tx_bytes = tx.tx_bytes();
        assert_eq!(tx_bytes[..2], [KeystoreTxType::Update as u8, 0]);

        let fields = RlpUpdateTransaction::decode_exact(&tx_bytes[2..])?;
        assert_eq!(fields, tx.rlp_fields());
        assert_eq!(fields.fee_per_gas.len(), 32);
        assert!(fields.sponsor_acct_bytes.is_empty());
        assert!(fields.sponsor_proof.is_empty());
        assert_eq!(tx.tx_hash(), keccak256(tx_bytes));
        Ok(())
    }

    #[test]
    fn test_sponsor_account_is_embedded_as_bytes() -> eyre::Result<()> {
        let sponsor = sponsor_account();
        let tx = update_builder(random_keystore_account())
            .sponsor_acct(Some(sponsor.clone()))
            .mock_sponsor_proof()
            .build()?;

        assert!(tx.is_sponsored());
        let fields = tx.rlp_fields();
        assert_eq!(fields.sponsor_acct_bytes, sponsor.rlp_encode());
        assert_eq!(KeystoreAccount::rlp_decode(&fields.sponsor_acct_bytes)?, sponsor);

        let sponsor_msg_hash = tx.sponsor_msg_hash().unwrap();
        assert_ne!(sponsor_msg_hash, tx.user_msg_hash());
        assert_eq!(
            tx.sponsor_proof(),
            &crate::gen_tx_mock_proof(sponsor.data_hash, sponsor_msg_hash)
        );
        Ok(())
    }

    #[test]
    fn test_unsponsored_update_has_no_sponsor_hash() -> eyre::Result<()> {
        let tx = update_builder(random_keystore_account()).build()?;
        assert!(!tx.is_sponsored());
        assert!(tx.sponsor_msg_hash().is_none());
        Ok(())
    }

    #[test]
    fn test_sponsor_proof_without_sponsor_is_rejected() {
        let err = update_builder(random_keystore_account())
            .sponsor_proof(Bytes::from_static(&[1, 2, 3]))
            .build()
            .unwrap_err();
        assert_eq!(err.msg, "sponsor proof requires a sponsor account");

        let err = update_builder(random_keystore_account())
            .mock_sponsor_proof()
            .build()
            .unwrap_err();
        assert_eq!(
            err.msg,
            "sponsor account is required to generate mock sponsor proof"
        );
    }

    #[test]
    fn test_update_digests_differ() -> eyre::Result<()> {
        let tx = update_builder(random_keystore_account())
            .mock_user_proof()
            .build()?;
        assert_ne!(tx.tx_hash(), tx.user_msg_hash());
        assert_eq!(tx.typed_data().eip712_signing_hash()?, tx.user_msg_hash());
        assert_eq!(
            tx.user_proof(),
            &crate::gen_tx_mock_proof(tx.user_acct().data_hash, tx.user_msg_hash())
        );
        Ok(())
    }

    #[test]
    fn test_salt_cleared_for_deployed_account() -> eyre::Result<()> {
        let user_acct = random_keystore_account();
        let tx = update_builder(user_acct.clone()).nonce(U256::from(1)).build()?;
        assert_eq!(tx.user_acct(), &user_acct.deployed());

        let tx = update_builder(user_acct.clone()).build()?;
        assert_eq!(tx.user_acct(), &user_acct);
        Ok(())
    }

    #[test]
    fn test_builder_from_tx_rebuilds_same_tx() -> eyre::Result<()> {
        let tx = update_builder(random_keystore_account())
            .sponsor_acct(Some(sponsor_account()))
            .mock_user_proof()
            .mock_sponsor_proof()
            .build()?;
        let rebuilt = UpdateTransactionBuilder::from(tx.clone()).build()?;
        assert_eq!(rebuilt.tx_hash(), tx.tx_hash());
        Ok(())
    }
}
