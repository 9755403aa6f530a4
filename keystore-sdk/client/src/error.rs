use alloy_primitives::B256;
use jsonrpsee::core::ClientError;
use keystore_sdk_types::{primitives::CodecError, TxDecodeError};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum KeystoreClientError {
    #[error("invalid encoding: {0}")]
    InvalidEncoding(#[from] CodecError),
    #[error("invalid transaction: {0}")]
    InvalidTransaction(#[from] TxDecodeError),
    #[error(
        "invalid combination of sponsored auth inputs: expected user and sponsor auth inputs, \
         a user proof and sponsor auth inputs, or only user auth inputs"
    )]
    InvalidAuthInputsCombination,
    #[error("cannot look up nonce: user account is not set")]
    MissingUserAccount,

    // Authentication outcomes
    #[error("authentication failed: {0}")]
    RemoteAuthenticationFailed(String),
    #[error("authentication of {request_hash} still pending after {attempts} status checks")]
    AuthenticationTimeout { request_hash: B256, attempts: u32 },
    #[error("authentication completed without an authenticated transaction")]
    MissingAuthenticatedTransaction,

    #[error("rpc error: {0}")]
    Rpc(#[from] ClientError),
    #[error("rpc client creation failed: {0}")]
    ClientCreation(String),
}

impl KeystoreClientError {
    /// Whether waiting longer could still produce an authenticated transaction.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::AuthenticationTimeout { .. })
    }
}
