use std::time::Duration;

use alloy_primitives::{Bytes, B256};
use jsonrpsee::http_client::HttpClient;
use keystore_sdk_types::{AuthInputs, L2Transaction, TxDecode};
use tracing::{info, instrument};
use url::Url;

use crate::{
    build_http_client, config::ClientConfig, error::KeystoreClientError, poll_until_terminal,
    AuthenticationStatus, PollConfig, SignatureProverApiClient, SponsoredAuthInputs,
};

/// Submits transactions to the signature prover and waits for the
/// authenticated result.
#[derive(Debug, Clone)]
pub struct SignatureProverClient {
    client: HttpClient,
    poll: PollConfig,
}

impl SignatureProverClient {
    pub fn new(
        url: Url,
        poll: PollConfig,
        request_timeout: Duration,
    ) -> Result<Self, KeystoreClientError> {
        info!(%url, ?poll, "Initializing signature prover client");
        let client = build_http_client(&url, request_timeout)?;
        Ok(Self { client, poll })
    }

    pub fn from_config(config: &ClientConfig) -> Result<Self, KeystoreClientError> {
        Self::new(
            config.signature_prover_url.clone(),
            config.polling,
            config.request_timeout(),
        )
    }

    pub fn poll_config(&self) -> &PollConfig {
        &self.poll
    }

    /// Returns the request hash to poll with.
    #[instrument(skip_all, err)]
    pub async fn authenticate_transaction(
        &self,
        tx_bytes: Bytes,
        auth_inputs: AuthInputs,
    ) -> Result<B256, KeystoreClientError> {
        let request_hash = self
            .client
            .authenticate_transaction(tx_bytes, auth_inputs)
            .await?;
        info!(%request_hash, "Authentication request submitted");
        Ok(request_hash)
    }

    pub async fn get_authentication_status(
        &self,
        request_hash: B256,
    ) -> Result<Option<AuthenticationStatus>, KeystoreClientError> {
        Ok(self.client.get_authentication_status(request_hash).await?)
    }

    #[instrument(skip_all, err)]
    pub async fn authenticate_sponsored_transaction(
        &self,
        tx_bytes: Bytes,
        auth_inputs: SponsoredAuthInputs,
    ) -> Result<B256, KeystoreClientError> {
        let request_hash = self
            .client
            .authenticate_sponsored_transaction(tx_bytes, auth_inputs)
            .await?;
        info!(%request_hash, "Sponsored authentication request submitted");
        Ok(request_hash)
    }

    pub async fn get_sponsored_authentication_status(
        &self,
        request_hash: B256,
    ) -> Result<Option<AuthenticationStatus>, KeystoreClientError> {
        Ok(self
            .client
            .get_sponsored_authentication_status(request_hash)
            .await?)
    }

    pub async fn wait_for_authentication(
        &self,
        request_hash: B256,
    ) -> Result<Bytes, KeystoreClientError> {
        let client = &self.client;
        poll_until_terminal(&self.poll, request_hash, move || {
            client.get_authentication_status(request_hash)
        })
        .await
    }

    pub async fn wait_for_sponsored_authentication(
        &self,
        request_hash: B256,
    ) -> Result<Bytes, KeystoreClientError> {
        let client = &self.client;
        poll_until_terminal(&self.poll, request_hash, move || {
            client.get_sponsored_authentication_status(request_hash)
        })
        .await
    }

    pub async fn authenticate_and_wait(
        &self,
        tx_bytes: Bytes,
        auth_inputs: AuthInputs,
    ) -> Result<Bytes, KeystoreClientError> {
        let request_hash = self.authenticate_transaction(tx_bytes, auth_inputs).await?;
        self.wait_for_authentication(request_hash).await
    }

    pub async fn authenticate_sponsored_and_wait(
        &self,
        tx_bytes: Bytes,
        auth_inputs: SponsoredAuthInputs,
    ) -> Result<Bytes, KeystoreClientError> {
        let request_hash = self
            .authenticate_sponsored_transaction(tx_bytes, auth_inputs)
            .await?;
        self.wait_for_sponsored_authentication(request_hash).await
    }
}

/// Decodes an authenticated transaction returned by the prover.
pub fn decode_authenticated_transaction(tx: Bytes) -> Result<L2Transaction, KeystoreClientError> {
    Ok(L2Transaction::decode_tx_bytes(tx)?)
}

#[cfg(test)]
mod tests {
    use std::{
        collections::HashMap,
        sync::{Arc, Mutex},
    };

    use alloy_primitives::{address, b256, bytes, keccak256, Address, FixedBytes, U256};
    use jsonrpsee::{
        core::RpcResult,
        server::{Server, ServerHandle},
    };
    use keystore_sdk_types::{
        AuthRule, KeystoreAccount, MOfNEcdsa, RollupTx, SignableTx, UpdateTransactionBuilder,
        WithdrawTransactionBuilder,
    };

    use super::*;
    use crate::SignatureProverApiServer;

    const CODEHASH: B256 =
        b256!("595b7552e60f6430c898abc2b292aa805e94834a576f57969406940f6d12d4d9");
    const PRIVATE_KEY: B256 =
        b256!("ac0974bec39a17e36ba4a6b4d238ff944bacb478cbed5efcae784d7bf4f2ff80");
    const SIGNER: Address = address!("f39fd6e51aad88f6f4ce6ab8827279cfffb92266");

    struct Request {
        tx: Bytes,
        polls: u32,
    }

    /// Prover that reports `Pending` for `pending_polls` status calls and
    /// then hands back the submitted transaction with a fixed proof.
    #[derive(Clone, Default)]
    struct MockProver {
        pending_polls: u32,
        fail_with: Option<String>,
        requests: Arc<Mutex<HashMap<B256, Request>>>,
        sponsored_inputs: Arc<Mutex<Vec<SponsoredAuthInputs>>>,
    }

    impl MockProver {
        fn submit(&self, tx: Bytes) -> B256 {
            let request_hash = keccak256(&tx);
            self.requests
                .lock()
                .unwrap()
                .insert(request_hash, Request { tx, polls: 0 });
            request_hash
        }

        fn status(&self, request_hash: B256) -> Option<AuthenticationStatus> {
            let mut requests = self.requests.lock().unwrap();
            let request = requests.get_mut(&request_hash)?;
            request.polls += 1;
            if request.polls <= self.pending_polls {
                return Some(AuthenticationStatus::pending());
            }
            if let Some(err) = &self.fail_with {
                return Some(AuthenticationStatus::failed(err.clone()));
            }
            let tx = L2Transaction::decode_tx_bytes(request.tx.clone()).ok()?;
            let authenticated = match tx {
                L2Transaction::Withdraw(tx) => WithdrawTransactionBuilder::from(tx)
                    .user_proof(bytes!("dead"))
                    .build()
                    .ok()?
                    .into_tx_bytes(),
                L2Transaction::Update(tx) => UpdateTransactionBuilder::from(tx)
                    .user_proof(bytes!("dead"))
                    .sponsor_proof(bytes!("beef"))
                    .build()
                    .ok()?
                    .into_tx_bytes(),
                L2Transaction::Deposit(_) => return Some(AuthenticationStatus::failed("deposit")),
            };
            Some(AuthenticationStatus::completed(authenticated))
        }

        fn polls(&self, request_hash: B256) -> u32 {
            self.requests
                .lock()
                .unwrap()
                .get(&request_hash)
                .map_or(0, |request| request.polls)
        }
    }

    #[async_trait::async_trait]
    impl SignatureProverApiServer for MockProver {
        async fn authenticate_transaction(
            &self,
            unauthenticated_transaction: Bytes,
            _auth_inputs: AuthInputs,
        ) -> RpcResult<B256> {
            Ok(self.submit(unauthenticated_transaction))
        }

        async fn get_authentication_status(
            &self,
            request_hash: B256,
        ) -> RpcResult<Option<AuthenticationStatus>> {
            Ok(self.status(request_hash))
        }

        async fn authenticate_sponsored_transaction(
            &self,
            unauthenticated_transaction: Bytes,
            auth_inputs: SponsoredAuthInputs,
        ) -> RpcResult<B256> {
            self.sponsored_inputs.lock().unwrap().push(auth_inputs);
            Ok(self.submit(unauthenticated_transaction))
        }

        async fn get_sponsored_authentication_status(
            &self,
            request_hash: B256,
        ) -> RpcResult<Option<AuthenticationStatus>> {
            Ok(self.status(request_hash))
        }
    }

    async fn start_prover(mock: MockProver) -> eyre::Result<(ServerHandle, Url)> {
        let server = Server::builder().build("127.0.0.1:0").await?;
        let addr = server.local_addr()?;
        let handle = server.start(mock.into_rpc());
        Ok((handle, format!("http://{addr}").parse()?))
    }

    fn client(url: Url, retries: u32) -> eyre::Result<SignatureProverClient> {
        let poll = PollConfig {
            interval: Duration::from_millis(10),
            retries,
        };
        Ok(SignatureProverClient::new(
            url,
            poll,
            Duration::from_secs(5),
        )?)
    }

    fn withdraw_tx(rule: &MOfNEcdsa) -> eyre::Result<keystore_sdk_types::WithdrawTransaction> {
        Ok(WithdrawTransactionBuilder::sequencer_tx(U256::from(100))
            .nonce(U256::ZERO)
            .to(Address::random())
            .amt(U256::from(1))
            .user_acct(rule.counterfactual_account(FixedBytes::random()))
            .build()?)
    }

    #[tokio::test]
    async fn test_authenticate_and_wait() -> eyre::Result<()> {
        let mock = MockProver {
            pending_polls: 3,
            ..Default::default()
        };
        let (handle, url) = start_prover(mock.clone()).await?;
        let client = client(url, 10)?;

        let rule = MOfNEcdsa::new(CODEHASH, 1, vec![SIGNER]);
        let tx = withdraw_tx(&rule)?;
        let signature = tx.sign(PRIVATE_KEY.as_slice())?;
        let auth_inputs = rule.make_auth_inputs(&[signature]);

        let request_hash = client
            .authenticate_transaction(tx.tx_bytes().clone(), auth_inputs)
            .await?;
        let authenticated = client.wait_for_authentication(request_hash).await?;
        assert_eq!(mock.polls(request_hash), 4);

        let L2Transaction::Withdraw(authenticated) = decode_authenticated_transaction(authenticated)?
        else {
            eyre::bail!("expected withdraw transaction");
        };
        assert_eq!(authenticated.user_proof(), &bytes!("dead"));
        assert_eq!(authenticated.user_msg_hash(), tx.user_msg_hash());

        handle.stop()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_sponsored_authentication() -> eyre::Result<()> {
        let mock = MockProver::default();
        let (handle, url) = start_prover(mock.clone()).await?;
        let client = client(url, 10)?;

        let rule = MOfNEcdsa::new(CODEHASH, 1, vec![SIGNER]);
        let sponsor = KeystoreAccount::with_keystore_address(
            FixedBytes::random(),
            FixedBytes::random(),
            rule.vkey(),
        );
        let tx = UpdateTransactionBuilder::sequencer_tx(U256::from(100))
            .nonce(U256::from(1))
            .new_user_data(bytes!("01"))
            .new_user_vkey(rule.vkey())
            .user_acct(rule.existing_account(FixedBytes::random()))
            .sponsor_acct(Some(sponsor))
            .build()?;
        let signature = tx.sign(PRIVATE_KEY.as_slice())?;
        let auth_inputs =
            SponsoredAuthInputs::from_parts(Some(rule.make_auth_inputs(&[signature])), None, None)?;

        let authenticated = client
            .authenticate_sponsored_and_wait(tx.tx_bytes().clone(), auth_inputs.clone())
            .await?;
        let L2Transaction::Update(authenticated) = decode_authenticated_transaction(authenticated)?
        else {
            eyre::bail!("expected update transaction");
        };
        assert!(authenticated.is_sponsored());
        assert_eq!(authenticated.sponsor_proof(), &bytes!("beef"));
        assert_eq!(*mock.sponsored_inputs.lock().unwrap(), vec![auth_inputs]);

        handle.stop()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_remote_failure() -> eyre::Result<()> {
        let mock = MockProver {
            pending_polls: 1,
            fail_with: Some("signature does not match signer".to_string()),
            ..Default::default()
        };
        let (handle, url) = start_prover(mock.clone()).await?;
        let client = client(url, 10)?;

        let tx = withdraw_tx(&MOfNEcdsa::new(CODEHASH, 1, vec![SIGNER]))?;
        let request_hash = client
            .authenticate_transaction(tx.tx_bytes().clone(), AuthInputs {
                key_data: bytes!("00"),
                auth_data: bytes!(""),
            })
            .await?;
        let err = client
            .wait_for_authentication(request_hash)
            .await
            .unwrap_err();
        assert!(
            matches!(err, KeystoreClientError::RemoteAuthenticationFailed(ref msg) if msg == "signature does not match signer")
        );
        assert_eq!(mock.polls(request_hash), 2);

        handle.stop()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_unknown_request_times_out() -> eyre::Result<()> {
        let (handle, url) = start_prover(MockProver::default()).await?;
        let client = client(url, 3)?;

        let err = client
            .wait_for_sponsored_authentication(B256::random())
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KeystoreClientError::AuthenticationTimeout { attempts: 3, .. }
        ));

        handle.stop()?;
        Ok(())
    }

    #[tokio::test]
    async fn test_unreachable_prover_times_out() -> eyre::Result<()> {
        let server = Server::builder().build("127.0.0.1:0").await?;
        let addr = server.local_addr()?;
        drop(server);

        let client = client(format!("http://{addr}").parse()?, 2)?;
        let err = client
            .wait_for_authentication(B256::random())
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        Ok(())
    }

    #[test]
    fn test_decode_authenticated_rejects_garbage() {
        assert!(matches!(
            decode_authenticated_transaction(bytes!("07")),
            Err(KeystoreClientError::InvalidTransaction(_))
        ));
    }
}
