//! Retry policy for permission-propagation failures.
//!
//! Freshly granted execution-role permissions take a while to become visible
//! to the control plane, which reports them as invalid-argument rejections in
//! the meantime. Only that exact failure shape is retried; every other error
//! surfaces immediately.

use std::future::Future;
use std::time::Duration;

use streamplane_api::ApiError;
use tokio::time::{sleep, Instant};
use tracing::debug;

/// Fixed-interval retry loop with a wall-clock budget.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    budget: Duration,
    interval: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            budget: Duration::from_secs(60),
            interval: Duration::from_secs(5),
        }
    }
}

impl RetryPolicy {
    pub fn new(budget: Duration, interval: Duration) -> Self {
        Self { budget, interval }
    }

    /// Run `attempt` until it succeeds, fails non-retryably, or the budget
    /// elapses. The first attempt made past the deadline is returned as-is,
    /// so a propagation delay that resolves right at the boundary still
    /// succeeds.
    pub async fn run<T, F, Fut>(&self, mut attempt: F) -> Result<T, ApiError>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T, ApiError>>,
    {
        let deadline = Instant::now() + self.budget;
        loop {
            match attempt().await {
                Ok(value) => return Ok(value),
                Err(err) if err.is_permission_propagation() && Instant::now() < deadline => {
                    debug!(error = %err, "waiting out permission propagation");
                    sleep(self.interval).await;
                }
                Err(err) => return Err(err),
            }
        }
    }
}
