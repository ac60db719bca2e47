//! ==============================================================================
//! fetch.rs - remote snapshot retrieval
//! ==============================================================================
//!
//! purpose:
//!     pulls the latest reading published by the remote collector node.
//!     one GET per run, bounded by a timeout, no retries.
//!
//! relationships:
//!     - used by: main.rs (once per run, before the merge)
//!     - produces: domain::RemoteSnapshot for reconcile.rs
//!
//! failure policy:
//!     every failure degrades to "no snapshot". the next scheduled run is
//!     the retry.
//!
//! ==============================================================================

use crate::domain::RemoteSnapshot;
use crate::error::FetchError;

use reqwest::Client;
use serde_json::{Number, Value};
use std::time::Duration;
use tracing::{info, warn};

#[derive(Debug, Clone)]
pub struct SnapshotFetcher {
    client: Client,
    url: String,
}

impl SnapshotFetcher {
    pub fn new(url: &str, timeout: Duration) -> Result<Self, FetchError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(FetchError::Client)?;

        Ok(Self {
            client,
            url: url.to_string(),
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetch the snapshot, or `None` if it could not be obtained for any reason.
    pub async fn fetch(&self) -> Option<RemoteSnapshot> {
        match self.try_fetch().await {
            Ok(snapshot) => {
                info!(
                    humidity = snapshot.humidity.as_ref().and_then(Number::as_f64),
                    temp = snapshot.temp.as_ref().and_then(Number::as_f64),
                    "remote snapshot fetched"
                );
                Some(snapshot)
            }
            Err(e) => {
                warn!("remote snapshot unavailable, merging local history only: {}", e);
                None
            }
        }
    }

    pub async fn try_fetch(&self) -> Result<RemoteSnapshot, FetchError> {
        let request_failed = |source: reqwest::Error| FetchError::Request {
            url: self.url.clone(),
            source,
        };

        let response = self.client.get(&self.url).send().await.map_err(request_failed)?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Status {
                url: self.url.clone(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await.map_err(request_failed)?;
        self.decode(&body)
    }

    fn decode(&self, body: &[u8]) -> Result<RemoteSnapshot, FetchError> {
        let malformed = |source: serde_json::Error| FetchError::Malformed {
            url: self.url.clone(),
            source,
        };

        let value: Value = serde_json::from_slice(body).map_err(malformed)?;
        let is_empty = match &value {
            Value::Null => true,
            Value::Object(map) => map.is_empty(),
            _ => false,
        };
        if is_empty {
            return Err(FetchError::Empty {
                url: self.url.clone(),
            });
        }

        serde_json::from_value(value).map_err(malformed)
    }
}
