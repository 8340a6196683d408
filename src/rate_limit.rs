use std::future::Future;
use std::time::Duration;

use log::warn;
use octocrab::Octocrab;
use serde::Deserialize;

use crate::cli::NetworkConfig;
use crate::error::{MigrateError, Result};

const MAX_WAITS: u32 = 5;

#[derive(Debug, Deserialize)]
struct RateLimitResponse {
    resources: RateLimitResources,
}

#[derive(Debug, Deserialize)]
struct RateLimitResources {
    core: RateWindow,
}

#[derive(Debug, Deserialize)]
struct RateWindow {
    reset: i64,
}

/// Runs API calls under a timeout and sleeps through primary rate limits.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    request_timeout: Duration,
    max_wait: Duration,
}

impl RateLimiter {
    pub fn new(network: &NetworkConfig) -> Self {
        RateLimiter {
            request_timeout: network.request_timeout,
            max_wait: network.max_rate_limit_wait,
        }
    }

    pub async fn run<T, F, Fut>(&self, octocrab: &Octocrab, mut operation: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = octocrab::Result<T>>,
    {
        let mut waits = 0;

        loop {
            match self.with_timeout(operation()).await? {
                Ok(value) => return Ok(value),
                Err(error) if is_rate_limited(&error) => {
                    if waits >= MAX_WAITS {
                        return Err(MigrateError::RateLimitRetriesExhausted { attempts: waits });
                    }

                    let wait = self.time_until_reset(octocrab).await?;
                    if wait > self.max_wait {
                        return Err(MigrateError::RateLimited {
                            wait,
                            max_wait: self.max_wait,
                        });
                    }

                    warn!("Rate limit hit, waiting {:?} until it resets", wait);
                    tokio::time::sleep(wait).await;
                    waits += 1;
                }
                Err(error) => return Err(error.into()),
            }
        }
    }

    pub async fn with_timeout<T>(&self, future: impl Future<Output = T>) -> Result<T> {
        tokio::time::timeout(self.request_timeout, future)
            .await
            .map_err(|_| MigrateError::Timeout(self.request_timeout))
    }

    async fn time_until_reset(&self, octocrab: &Octocrab) -> Result<Duration> {
        let response: RateLimitResponse = self
            .with_timeout(octocrab.get("/rate_limit", None::<&()>))
            .await??;

        Ok(wait_until(response.resources.core.reset, chrono::Utc::now().timestamp()))
    }
}

/// At least one second, so a reset that already passed does not spin.
fn wait_until(reset: i64, now: i64) -> Duration {
    Duration::from_secs(reset.saturating_sub(now).max(1) as u64)
}

pub fn is_rate_limited(error: &octocrab::Error) -> bool {
    match error {
        octocrab::Error::GitHub { source, .. } => {
            let status = source.status_code.as_u16();
            (status == 403 || status == 429)
                && source.message.to_lowercase().contains("rate limit")
        }
        _ => false,
    }
}
