use std::{
    path::{Path, PathBuf},
    time::Duration,
};

use clap::Parser;
use keystore_sdk_types::KeystoreAccount;
use serde::Deserialize;
use tracing::info;
use url::Url;

use crate::{error::KeystoreClientError, LogFormat, PollConfig};

pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Client CLI args
#[derive(Parser, Debug)]
pub struct ClientArgs {
    /// Path to the config toml file
    #[arg(long)]
    pub config_path: PathBuf,

    #[arg(long = "log-format", value_name = "FORMAT", default_value_t = LogFormat::Terminal)]
    pub log_format: LogFormat,

    /// Overrides `signature_prover_url` from the config file.
    #[arg(long)]
    pub signature_prover_url: Option<Url>,

    /// Overrides `node_url` from the config file.
    #[arg(long)]
    pub node_url: Option<Url>,

    /// Overrides `sequencer_url` from the config file.
    #[arg(long)]
    pub sequencer_url: Option<Url>,
}

impl ClientArgs {
    /// Loads the config file and applies the URL overrides.
    pub fn load_config(&self) -> eyre::Result<ClientConfig> {
        let mut config = load_client_config(&self.config_path)?;
        if let Some(url) = &self.signature_prover_url {
            config.signature_prover_url = url.clone();
        }
        if let Some(url) = &self.node_url {
            config.node_url = url.clone();
        }
        if let Some(url) = &self.sequencer_url {
            config.sequencer_url = url.clone();
        }
        Ok(config)
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct ClientConfig {
    pub signature_prover_url: Url,
    pub node_url: Url,
    pub sequencer_url: Url,
    #[serde(default)]
    pub polling: PollConfig,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    #[serde(default)]
    sponsor: Option<SponsorConfig>,
}

fn default_request_timeout_secs() -> u64 {
    DEFAULT_REQUEST_TIMEOUT_SECS
}

/// Existing account that sponsors transactions, given as hex strings.
#[derive(Debug, Clone, Deserialize)]
struct SponsorConfig {
    keystore_address: String,
    data_hash: String,
    vkey: String,
}

impl ClientConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn sponsor_account(&self) -> Result<Option<KeystoreAccount>, KeystoreClientError> {
        self.sponsor
            .as_ref()
            .map(|sponsor| {
                KeystoreAccount::existing_from_hex(
                    &sponsor.keystore_address,
                    &sponsor.data_hash,
                    &sponsor.vkey,
                )
                .map_err(KeystoreClientError::from)
            })
            .transpose()
    }
}

pub fn parse_client_config(contents: &str) -> eyre::Result<ClientConfig> {
    let config: ClientConfig = toml::from_str(contents)?;
    // surface malformed sponsor hex at load time
    config.sponsor_account()?;
    Ok(config)
}

/// load client config
pub fn load_client_config(path: impl AsRef<Path>) -> eyre::Result<ClientConfig> {
    let path = path.as_ref();
    let contents = std::fs::read_to_string(path)?;
    let config = parse_client_config(&contents)?;
    info!(path = %path.display(), ?config, "Loaded client config");
    Ok(config)
}
