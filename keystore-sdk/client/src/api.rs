use alloy_primitives::{Bytes, B256, U256};
use jsonrpsee::{core::RpcResult, proc_macros::rpc};
use keystore_sdk_types::AuthInputs;

use crate::types::{AuthenticationStatus, BlockTagOrNumber, SponsoredAuthInputs};

#[rpc(server, client)]
pub trait SignatureProverApi {
    #[method(name = "keystore_authenticateTransaction")]
    async fn authenticate_transaction(
        &self,
        unauthenticated_transaction: Bytes,
        auth_inputs: AuthInputs,
    ) -> RpcResult<B256>;

    #[method(name = "keystore_getAuthenticationStatus")]
    async fn get_authentication_status(
        &self,
        request_hash: B256,
    ) -> RpcResult<Option<AuthenticationStatus>>;

    #[method(name = "keystore_authenticateSponsoredTransaction")]
    async fn authenticate_sponsored_transaction(
        &self,
        unauthenticated_transaction: Bytes,
        auth_inputs: SponsoredAuthInputs,
    ) -> RpcResult<B256>;

    #[method(name = "keystore_getSponsoredAuthenticationStatus")]
    async fn get_sponsored_authentication_status(
        &self,
        request_hash: B256,
    ) -> RpcResult<Option<AuthenticationStatus>>;
}

#[rpc(server, client)]
pub trait NodeApi {
    #[method(name = "keystore_getTransactionCount")]
    async fn get_transaction_count(
        &self,
        address: B256,
        block: BlockTagOrNumber,
    ) -> RpcResult<U256>;
}

#[rpc(server, client)]
pub trait SequencerApi {
    #[method(name = "keystore_gasPrice")]
    async fn gas_price(&self) -> RpcResult<U256>;

    #[method(name = "keystore_sendRawTransaction")]
    async fn send_raw_transaction(&self, data: Bytes) -> RpcResult<B256>;
}
