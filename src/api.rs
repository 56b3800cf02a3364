//! Chat-completion access with exponential backoff.
//!
//! - [`AskAsync`]: anything that can turn a prompt into a response
//! - [`ModelClient`]: `awful_aj` config + template, calling the OpenAI-compatible API
//! - [`RetryPolicy`]: retries any [`AskAsync`] call with capped, jittered backoff
//!
//! The default policy makes up to 5 retries, waiting 1s, 2s, 4s, 8s, 16s
//! (never more than 30s) plus 0-250ms of jitter before each one.

use awful_aj::api::ask;
use awful_aj::{config::AwfulJadeConfig, template::ChatTemplate};
use rand::{Rng, rng};
use std::error::Error;
use std::time::{Duration, Instant};
use tokio::time::sleep;
use tracing::{error, info, instrument, warn};

/// Async prompt → response call.
pub trait AskAsync {
    type Response;

    async fn ask(&self, text: &str) -> Result<Self::Response, Box<dyn Error>>;
}

/// Loaded model settings and chat template for one run.
#[derive(Debug)]
pub struct ModelClient {
    config: AwfulJadeConfig,
    template: ChatTemplate,
}

impl ModelClient {
    pub fn new(config: AwfulJadeConfig, template: ChatTemplate) -> Self {
        Self { config, template }
    }
}

impl AskAsync for ModelClient {
    type Response = String;

    #[instrument(level = "info", skip_all)]
    async fn ask(&self, text: &str) -> Result<String, Box<dyn Error>> {
        let t0 = Instant::now();
        let res = ask(&self.config, text.to_string(), &self.template, None, None).await;
        if let Err(e) = &res {
            warn!(elapsed_ms = t0.elapsed().as_millis(), error = %e, "API call failed");
        }
        res
    }
}

/// How often and how patiently a failed call is repeated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    pub max_retries: usize,
    pub base_delay: Duration,
    pub max_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 5,
            base_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
        }
    }
}

impl RetryPolicy {
    /// Wait before retry number `attempt` (1-based), jitter excluded.
    fn delay_for(&self, attempt: usize) -> Duration {
        let shift = attempt.saturating_sub(1).min(31) as u32;
        self.base_delay
            .saturating_mul(1u32 << shift)
            .min(self.max_delay)
    }

    /// Call `client` until it succeeds or the retries are used up.
    ///
    /// # Errors
    ///
    /// Returns the last error once `max_retries` retries have failed.
    #[instrument(level = "info", skip_all, fields(max_retries = self.max_retries))]
    pub async fn ask<T: AskAsync>(&self, client: &T, text: &str) -> Result<T::Response, Box<dyn Error>> {
        let t0 = Instant::now();
        let mut failures = 0usize;

        loop {
            let e = match client.ask(text).await {
                Ok(resp) => {
                    info!(attempts = failures + 1, elapsed_ms_total = t0.elapsed().as_millis(), "Model call succeeded");
                    return Ok(resp);
                }
                Err(e) => e,
            };

            failures += 1;
            if failures > self.max_retries {
                error!(
                    attempts = failures,
                    elapsed_ms_total = t0.elapsed().as_millis(),
                    error = %e,
                    "Model call failed; retries exhausted"
                );
                return Err(e);
            }

            let jitter = Duration::from_millis(rng().random_range(0..=250));
            let delay = self.delay_for(failures) + jitter;
            warn!(attempt = failures, ?delay, error = %e, "Model call failed; backing off");
            sleep(delay).await;
        }
    }
}
