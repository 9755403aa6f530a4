use std::time::Duration;

use alloy_primitives::{B256, U256};
use jsonrpsee::http_client::HttpClient;
use tracing::{debug, info};
use url::Url;

use crate::{
    build_http_client, config::ClientConfig, error::KeystoreClientError, BlockTagOrNumber,
    NodeApiClient,
};

/// Read access to rollup node state needed to build transactions.
#[derive(Debug, Clone)]
pub struct NodeClient {
    client: HttpClient,
}

impl NodeClient {
    pub fn new(url: Url, request_timeout: Duration) -> Result<Self, KeystoreClientError> {
        info!(%url, "Initializing node client");
        let client = build_http_client(&url, request_timeout)?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, KeystoreClientError> {
        Self::new(config.node_url.clone(), config.request_timeout())
    }

    /// Nonce of `address` at `block`.
    pub async fn get_transaction_count(
        &self,
        address: B256,
        block: impl Into<BlockTagOrNumber>,
    ) -> Result<U256, KeystoreClientError> {
        let block = block.into();
        let nonce = self.client.get_transaction_count(address, block).await?;
        debug!(%address, ?block, %nonce, "Fetched transaction count");
        Ok(nonce)
    }
}
