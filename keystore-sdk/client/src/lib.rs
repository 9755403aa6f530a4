use std::time::Duration;

use jsonrpsee::http_client::{HttpClient, HttpClientBuilder};
use url::Url;

mod api;
pub use api::*;

pub mod config;
pub use config::{load_client_config, ClientArgs, ClientConfig};

pub mod error;
pub use error::KeystoreClientError;

mod fill;
pub use fill::*;

mod node;
pub use node::NodeClient;

mod poll;
pub use poll::*;

mod prover;
pub use prover::{decode_authenticated_transaction, SignatureProverClient};

mod sequencer;
pub use sequencer::SequencerClient;

mod telemetry;
pub use telemetry::{init_tracing, LogFormat};

mod types;
pub use types::*;

pub(crate) fn build_http_client(
    url: &Url,
    request_timeout: Duration,
) -> Result<HttpClient, KeystoreClientError> {
    HttpClientBuilder::default()
        .request_timeout(request_timeout)
        .build(url)
        .map_err(|e| KeystoreClientError::ClientCreation(e.to_string()))
}
