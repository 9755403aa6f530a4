use std::{fmt::Display, future::Future, time::Duration};

use alloy_primitives::{Bytes, B256};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};

use crate::{error::KeystoreClientError, types::AuthenticationStatus};

pub const DEFAULT_POLLING_INTERVAL_MS: u64 = 10_000;
pub const DEFAULT_POLLING_RETRIES: u32 = 60;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PollConfig {
    /// Delay between two status calls.
    #[serde(rename = "interval_ms", with = "duration_ms")]
    pub interval: Duration,
    /// Maximum number of status calls for one request.
    pub retries: u32,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(DEFAULT_POLLING_INTERVAL_MS),
            retries: DEFAULT_POLLING_RETRIES,
        }
    }
}

mod duration_ms {
    use std::time::Duration;

    use serde::{ser::Error as _, Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        let millis = u64::try_from(duration.as_millis()).map_err(S::Error::custom)?;
        serializer.serialize_u64(millis)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

/// Calls `fetch` until the request reaches a terminal status.
///
/// A pending status, an unknown request and a transport error all count
/// against the same `retries` budget. A failed or completed status ends the
/// loop at once. There is no sleep after the last attempt.
pub async fn poll_until_terminal<F, Fut, E>(
    config: &PollConfig,
    request_hash: B256,
    mut fetch: F,
) -> Result<Bytes, KeystoreClientError>
where
    F: FnMut() -> Fut,
    Fut: Future<Output = Result<Option<AuthenticationStatus>, E>>,
    E: Display,
{
    info!(%request_hash, retries = config.retries, "Waiting for authentication");

    for attempt in 1..=config.retries {
        match fetch().await {
            Ok(Some(status)) => match status.into_outcome() {
                Some(Ok(tx)) => {
                    info!(%request_hash, attempt, "Authentication completed");
                    return Ok(tx);
                }
                Some(Err(err)) => {
                    error!(%request_hash, attempt, error = %err, "Authentication failed");
                    return Err(err);
                }
                None => debug!(%request_hash, attempt, "Authentication pending"),
            },
            Ok(None) => debug!(%request_hash, attempt, "Request not yet known to prover"),
            Err(err) => warn!(%request_hash, attempt, error = %err, "Status request failed"),
        }

        if attempt < config.retries {
            tokio::time::sleep(config.interval).await;
        }
    }

    error!(%request_hash, attempts = config.retries, "Timed out waiting for authentication");
    Err(KeystoreClientError::AuthenticationTimeout {
        request_hash,
        attempts: config.retries,
    })
}

#[cfg(test)]
mod tests {
    use std::sync::{
        atomic::{AtomicU32, Ordering},
        Arc, Mutex,
    };

    use alloy_primitives::bytes;
    use tokio::time::Instant;

    use super::*;

    const INTERVAL: Duration = Duration::from_secs(10);

    fn config(retries: u32) -> PollConfig {
        PollConfig {
            interval: INTERVAL,
            retries,
        }
    }

    /// Replays `responses` in order and records when each call happened.
    fn scripted(
        responses: Vec<Result<Option<AuthenticationStatus>, String>>,
    ) -> (
        Arc<Mutex<Vec<Instant>>>,
        impl FnMut() -> std::future::Ready<Result<Option<AuthenticationStatus>, String>>,
    ) {
        let calls = Arc::new(Mutex::new(Vec::new()));
        let recorded = Arc::clone(&calls);
        let mut responses = responses.into_iter();
        let fetch = move || {
            recorded.lock().unwrap().push(Instant::now());
            std::future::ready(
                responses
                    .next()
                    .unwrap_or_else(|| Ok(Some(AuthenticationStatus::pending()))),
            )
        };
        (calls, fetch)
    }

    #[test]
    fn test_poll_config_interval_millis() -> eyre::Result<()> {
        let config = PollConfig {
            interval: Duration::from_millis(2500),
            retries: 3,
        };
        let json = serde_json::to_value(config)?;
        assert_eq!(json, serde_json::json!({ "interval_ms": 2500, "retries": 3 }));
        assert_eq!(serde_json::from_value::<PollConfig>(json)?, config);

        let too_long = PollConfig {
            interval: Duration::MAX,
            retries: 1,
        };
        assert!(serde_json::to_value(too_long).is_err());
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_pending_then_completed() -> eyre::Result<()> {
        let pending = 4;
        let mut responses = vec![Ok(Some(AuthenticationStatus::pending())); pending];
        responses.push(Ok(Some(AuthenticationStatus::completed(bytes!("c0ffee")))));
        let (calls, fetch) = scripted(responses);

        let tx = poll_until_terminal(&config(60), B256::ZERO, fetch).await?;
        assert_eq!(tx, bytes!("c0ffee"));

        let calls = calls.lock().unwrap();
        assert_eq!(calls.len(), pending + 1);
        for pair in calls.windows(2) {
            assert!(pair[1] - pair[0] >= INTERVAL);
        }
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_failed_returns_immediately() {
        let (calls, fetch) = scripted(vec![
            Ok(Some(AuthenticationStatus::pending())),
            Ok(Some(AuthenticationStatus::failed("invalid signature"))),
        ]);

        let err = poll_until_terminal(&config(60), B256::ZERO, fetch)
            .await
            .unwrap_err();
        assert!(
            matches!(err, KeystoreClientError::RemoteAuthenticationFailed(ref msg) if msg == "invalid signature")
        );
        assert!(!err.is_timeout());
        assert_eq!(calls.lock().unwrap().len(), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_timeout_after_retries() {
        let (calls, fetch) = scripted(vec![]);
        let start = Instant::now();

        let err = poll_until_terminal(&config(5), B256::ZERO, fetch)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            KeystoreClientError::AuthenticationTimeout { attempts: 5, .. }
        ));
        assert!(err.is_timeout());
        assert_eq!(calls.lock().unwrap().len(), 5);
        // four sleeps between five calls, none after the last
        let elapsed = start.elapsed();
        assert!(elapsed >= INTERVAL * 4 && elapsed < INTERVAL * 5);
    }

    #[tokio::test(start_paused = true)]
    async fn test_transient_errors_share_retry_budget() {
        let (calls, fetch) = scripted(vec![
            Err("connection refused".to_string()),
            Ok(None),
            Ok(Some(AuthenticationStatus::pending())),
        ]);

        let err = poll_until_terminal(&config(3), B256::ZERO, fetch)
            .await
            .unwrap_err();
        assert!(err.is_timeout());
        assert_eq!(calls.lock().unwrap().len(), 3);
    }

    #[tokio::test(start_paused = true)]
    async fn test_recovers_after_transient_error() -> eyre::Result<()> {
        let (_, fetch) = scripted(vec![
            Err("connection reset".to_string()),
            Ok(Some(AuthenticationStatus::completed(bytes!("01")))),
        ]);

        let tx = poll_until_terminal(&config(3), B256::ZERO, fetch).await?;
        assert_eq!(tx, bytes!("01"));
        Ok(())
    }

    #[tokio::test(start_paused = true)]
    async fn test_completed_without_transaction() {
        let status: AuthenticationStatus =
            serde_json::from_value(serde_json::json!({ "status": "Completed" })).unwrap();
        let attempts = Arc::new(AtomicU32::new(0));
        let counter = Arc::clone(&attempts);

        let err = poll_until_terminal(&config(10), B256::ZERO, move || {
            counter.fetch_add(1, Ordering::SeqCst);
            std::future::ready(Ok::<_, String>(Some(status.clone())))
        })
        .await
        .unwrap_err();
        assert!(matches!(
            err,
            KeystoreClientError::MissingAuthenticatedTransaction
        ));
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }
}
