// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Retry policy for transient engine failures

use anyhow::Result;
use futures::Future;
use std::time::Duration;
use tokio::time::sleep;
use tracing::debug;

/// Error-message fragments the retry policy is allowed to absorb
const RETRYABLE_FRAGMENTS: [&str; 5] = [
    "DEADLOCK",
    "TIMEOUT",
    "CONNECTION_LOST",
    "TEMPORARY_FAILURE",
    "LOCK_TIMEOUT",
];

/// true when the error message marks a failure worth retrying
#[must_use]
pub fn is_transient(msg: &str) -> bool {
    let upper = msg.to_ascii_uppercase();
    RETRYABLE_FRAGMENTS
        .iter()
        .any(|fragment| upper.contains(fragment))
}

/// Linear-backoff retry: attempt `n` waits `base_delay × n`
#[derive(Clone, Copy, Debug)]
pub struct RetryPolicy {
    ///
    pub max_retries: u32,
    ///
    pub base_delay: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: 3,
            base_delay: Duration::from_millis(100),
        }
    }
}

impl RetryPolicy {
    /// Run an operation, retrying transient failures up to `max_retries`
    /// times.  Non-transient errors and exhaustion propagate.
    pub async fn run<T, F, Fut>(&self, mut op: F) -> Result<T>
    where
        F: FnMut() -> Fut,
        Fut: Future<Output = Result<T>>,
    {
        let mut attempt = 0_u32;
        loop {
            match op().await {
                Ok(value) => return Ok(value),
                Err(err) => {
                    attempt += 1;
                    if attempt > self.max_retries || !is_transient(&format!("{:#}", err)) {
                        return Err(err);
                    }
                    let delay = self.base_delay * attempt;
                    debug!(attempt, delay_ms = delay.as_millis() as u64, "retrying transient failure");
                    sleep(delay).await;
                }
            }
        }
    }
}
