use std::time::Duration;

use alloy_primitives::{Bytes, B256, U256};
use jsonrpsee::http_client::HttpClient;
use tracing::{debug, info};
use url::Url;

use crate::{
    build_http_client, config::ClientConfig, error::KeystoreClientError, SequencerApiClient,
};

#[derive(Debug, Clone)]
pub struct SequencerClient {
    client: HttpClient,
}

impl SequencerClient {
    pub fn new(url: Url, request_timeout: Duration) -> Result<Self, KeystoreClientError> {
        info!(%url, "Initializing sequencer client");
        let client = build_http_client(&url, request_timeout)?;
        Ok(Self { client })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, KeystoreClientError> {
        Self::new(config.sequencer_url.clone(), config.request_timeout())
    }

    /// Current fee per gas charged by the sequencer.
    pub async fn gas_price(&self) -> Result<U256, KeystoreClientError> {
        let fee_per_gas = self.client.gas_price().await?;
        debug!(%fee_per_gas, "Fetched gas price");
        Ok(fee_per_gas)
    }

    /// Submits an authenticated transaction and returns its hash.
    pub async fn send_raw_transaction(&self, tx: Bytes) -> Result<B256, KeystoreClientError> {
        let tx_hash = self.client.send_raw_transaction(tx).await?;
        info!(%tx_hash, "Transaction sent to sequencer");
        Ok(tx_hash)
    }
}
