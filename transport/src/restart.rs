//! Server-restart readiness polling.
//!
//! After a configuration change that bounces the server, the admin API's
//! `/timestamp` endpoint is the readiness signal: its value advances once
//! the server is back up. The poller compares against the pre-restart
//! timestamp so a fast bounce is not mistaken for completion.

use std::time::Duration;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use tracing::{debug, info};

use crate::client::{DigestClient, RequestParams};
use crate::error::{Result, TransportError};

/// Default pause before each poll.
const DEFAULT_INTERVAL: Duration = Duration::from_secs(1);

/// Default total number of polls before giving up.
const DEFAULT_MAX_ATTEMPTS: u32 = 10;

/// Waits for a server restart to complete.
pub struct RestartPoller {
    client: DigestClient,
    admin: RequestParams,
    interval: Duration,
    max_attempts: u32,
}

impl RestartPoller {
    /// Create a poller against the admin API described by `admin`.
    pub fn new(client: DigestClient, admin: RequestParams) -> Self {
        Self {
            client,
            admin,
            interval: DEFAULT_INTERVAL,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override the pause between polls.
    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Override the total attempt bound.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = max_attempts;
        self
    }

    /// Poll until the server's timestamp advances strictly past `previous`.
    ///
    /// Each attempt sleeps one interval, then GETs `/timestamp`. A 503 and
    /// connection-level failures (refused, reset, timed out) mean the server
    /// is still restarting and are retried within the attempt bound. Any
    /// other non-200 status, and any 200 whose timestamp has not advanced,
    /// fails with [`TransportError::RestartVerification`]; running out of
    /// attempts fails with [`TransportError::RestartTimeout`]. On success the
    /// new timestamp is returned as the baseline for a subsequent restart.
    pub async fn wait_for_restart(&self, previous: DateTime<Utc>) -> Result<DateTime<Utc>> {
        debug!("Waiting for {} to restart", self.admin.base_url());
        for attempt in 1..=self.max_attempts {
            tokio::time::sleep(self.interval).await;
            if attempt % 3 == 0 {
                debug!(
                    "Still waiting for restart (attempt {attempt}/{})",
                    self.max_attempts
                );
            }

            let response = match self.client.get(&self.admin, "/timestamp").await {
                Ok(response) => response,
                Err(TransportError::Network(e)) if is_still_restarting(&e) => {
                    debug!("Server not reachable yet: {e}");
                    continue;
                }
                Err(e) => return Err(e),
            };

            if response.status == StatusCode::SERVICE_UNAVAILABLE {
                debug!("Server still restarting (503), attempt {attempt}");
                continue;
            }
            if response.status != StatusCode::OK {
                return Err(TransportError::RestartVerification(format!(
                    "unexpected status {} from the timestamp endpoint",
                    response.status
                )));
            }

            let body = response.text();
            let now = DateTime::parse_from_rfc3339(body.trim())
                .map_err(|e| {
                    TransportError::RestartVerification(format!(
                        "unparseable restart timestamp {body:?}: {e}"
                    ))
                })?
                .with_timezone(&Utc);
            if now <= previous {
                return Err(TransportError::RestartVerification(format!(
                    "timestamp did not advance: {previous} -> {now}"
                )));
            }
            info!("Server restarted, timestamp now {now}");
            return Ok(now);
        }
        Err(TransportError::RestartTimeout {
            attempts: self.max_attempts,
        })
    }
}

/// Whether a transport-level error looks like the server being down
/// mid-restart rather than a real failure.
fn is_still_restarting(err: &reqwest::Error) -> bool {
    if err.is_connect() || err.is_timeout() {
        return true;
    }
    // A reset mid-response surfaces as a generic request error; the io-level
    // kind is only visible down the source chain.
    let mut source = std::error::Error::source(err);
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            if matches!(
                io.kind(),
                std::io::ErrorKind::ConnectionReset | std::io::ErrorKind::ConnectionRefused
            ) {
                return true;
            }
        }
        source = cause.source();
    }
    false
}
