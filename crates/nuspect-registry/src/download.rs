//! JSON retrieval from NuGet v3 endpoints.

use std::time::Duration;

use reqwest::Client;
use serde::de::DeserializeOwned;

use nuspect_util::errors::NuspectError;

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(60);

/// Build a shared reqwest client for registry requests.
pub fn build_client() -> miette::Result<Client> {
    Client::builder()
        .timeout(REQUEST_TIMEOUT)
        .user_agent(concat!("nuspect/", env!("CARGO_PKG_VERSION")))
        .build()
        .map_err(|e| {
            NuspectError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            }
            .into()
        })
}

/// Fetch and deserialize a JSON document, with retries.
///
/// Returns `Ok(None)` for 404 (the resource does not exist on this source).
/// Server errors, timeouts, and connection failures are retried.
pub async fn fetch_json<T: DeserializeOwned>(client: &Client, url: &str) -> miette::Result<Option<T>> {
    let mut last_err = String::new();

    for attempt in 0..MAX_RETRIES {
        if attempt > 0 {
            tokio::time::sleep(RETRY_DELAY * attempt).await;
        }

        match client.get(url).send().await {
            Ok(resp) => {
                let status = resp.status();
                if status == reqwest::StatusCode::NOT_FOUND {
                    return Ok(None);
                }
                if status.is_server_error() {
                    last_err = format!("HTTP {status} from {url}");
                    continue;
                }
                if !status.is_success() {
                    return Err(NuspectError::Network {
                        message: format!("HTTP {status} fetching {url}"),
                    }
                    .into());
                }

                let bytes = resp.bytes().await.map_err(|e| NuspectError::Network {
                    message: format!("Failed to read response from {url}: {e}"),
                })?;
                let parsed = serde_json::from_slice(&bytes).map_err(|e| NuspectError::Registry {
                    message: format!("Unexpected response from {url}: {e}"),
                })?;
                return Ok(Some(parsed));
            }
            Err(e) if e.is_timeout() || e.is_connect() => {
                last_err = format!("{e}");
                continue;
            }
            Err(e) => {
                return Err(NuspectError::Network {
                    message: format!("Request to {url} failed: {e}"),
                }
                .into());
            }
        }
    }

    Err(NuspectError::Network {
        message: format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
    }
    .into())
}
