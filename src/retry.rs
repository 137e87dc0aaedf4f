use std::{future::Future, time::Duration};

use tracing::{debug, info, warn};

use crate::{
    config::Settings,
    error::{Error, Result},
};

/// Per-call timeout plus a fixed number of attempts with linear backoff.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub timeout: Duration,
    pub max_attempts: u32,
    pub retry_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(30),
            max_attempts: 3,
            retry_delay: Duration::from_secs(2),
        }
    }
}

impl RetryPolicy {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            timeout: settings.request_timeout,
            max_attempts: settings.max_retries,
            retry_delay: settings.retry_delay,
        }
    }

    /// Wait before the attempt following `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        self.retry_delay * attempt
    }

    pub async fn run<T, F, Fut>(&self, what: &str, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let attempts = self.max_attempts.max(1);
        let mut last_error = None;

        for attempt in 1..=attempts {
            debug!("{what} (attempt {attempt}/{attempts})");
            match tokio::time::timeout(self.timeout, op()).await {
                Ok(Ok(value)) => return Ok(value),
                Ok(Err(e)) => {
                    warn!("{what}: attempt {attempt} failed: {e}");
                    last_error = Some(e);
                }
                Err(_) => {
                    warn!("{what}: attempt {attempt} timed out after {:?}", self.timeout);
                    last_error = Some(Error::Timeout(self.timeout));
                }
            }

            if attempt < attempts {
                let wait = self.backoff(attempt);
                info!("Retrying in {wait:?}...");
                tokio::time::sleep(wait).await;
            }
        }

        Err(last_error.unwrap_or(Error::Timeout(self.timeout)))
    }
}
