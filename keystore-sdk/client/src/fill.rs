//! Fetches the nonce and fee of a transaction from the node and sequencer
//! when the caller left them unset.

use alloy_primitives::{FixedBytes, U256};
use keystore_sdk_types::{UpdateTransactionBuilder, WithdrawTransactionBuilder};
use tracing::debug;

use crate::{error::KeystoreClientError, BlockTag, NodeClient, SequencerClient};

/// A transaction builder whose nonce and fee can be filled from chain state.
pub trait FillableBuilder: Sized {
    fn is_nonce_set(&self) -> bool;
    fn is_fee_set(&self) -> bool;
    fn user_keystore_address(&self) -> Option<FixedBytes<32>>;
    fn with_nonce(self, nonce: U256) -> Self;
    fn with_fee_per_gas(self, fee_per_gas: U256) -> Self;
}

macro_rules! impl_fillable_builder {
    ($builder:ty) => {
        impl FillableBuilder for $builder {
            fn is_nonce_set(&self) -> bool {
                <$builder>::is_nonce_set(self)
            }

            fn is_fee_set(&self) -> bool {
                <$builder>::is_fee_set(self)
            }

            fn user_keystore_address(&self) -> Option<FixedBytes<32>> {
                <$builder>::user_keystore_address(self)
            }

            fn with_nonce(self, nonce: U256) -> Self {
                self.nonce(nonce)
            }

            fn with_fee_per_gas(self, fee_per_gas: U256) -> Self {
                self.fee_per_gas(fee_per_gas)
            }
        }
    };
}

impl_fillable_builder!(WithdrawTransactionBuilder);
impl_fillable_builder!(UpdateTransactionBuilder);

/// Sets the latest nonce of the user account and the sequencer's gas price on
/// `builder`, leaving values the caller already set untouched. An
/// L1-initiated builder counts as having its fee set.
pub async fn fill_transaction<B: FillableBuilder>(
    node: &NodeClient,
    sequencer: &SequencerClient,
    mut builder: B,
) -> Result<B, KeystoreClientError> {
    if !builder.is_nonce_set() {
        let address = builder
            .user_keystore_address()
            .ok_or(KeystoreClientError::MissingUserAccount)?;
        let nonce = node
            .get_transaction_count(address, BlockTag::Latest)
            .await?;
        debug!(%address, %nonce, "Filled nonce");
        builder = builder.with_nonce(nonce);
    }
    if !builder.is_fee_set() {
        let fee_per_gas = sequencer.gas_price().await?;
        debug!(%fee_per_gas, "Filled fee per gas");
        builder = builder.with_fee_per_gas(fee_per_gas);
    }
    Ok(builder)
}

pub async fn fill_withdraw(
    node: &NodeClient,
    sequencer: &SequencerClient,
    builder: WithdrawTransactionBuilder,
) -> Result<WithdrawTransactionBuilder, KeystoreClientError> {
    fill_transaction(node, sequencer, builder).await
}

pub async fn fill_update(
    node: &NodeClient,
    sequencer: &SequencerClient,
    builder: UpdateTransactionBuilder,
) -> Result<UpdateTransactionBuilder, KeystoreClientError> {
    fill_transaction(node, sequencer, builder).await
}
