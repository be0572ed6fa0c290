// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Per-client rate limiting
//!
//! Admission control sits in front of validation so floods are rejected
//! before any real work happens.  Counters live in minute and hour
//! buckets keyed by client id; stale buckets are purged by the sweeper.

use crate::error::RukuzuErr::ResourceExhausted;
use anyhow::Result;
use dashmap::DashMap;
use derive_builder::Builder;
use getset::Getters;
use std::time::{Duration, SystemTime, UNIX_EPOCH};
use tracing::debug;

/// Fallback identity for submissions without a client id
pub(crate) const ANONYMOUS: &str = "anonymous";

/// Rate limiter tuning knobs
#[derive(Builder, Clone, Copy, Debug, Getters)]
#[getset(get = "pub(crate)")]
pub struct Config {
    ///
    #[builder(default = "true")]
    enabled: bool,
    ///
    #[builder(default = "120")]
    per_minute: u32,
    ///
    #[builder(default = "3_600")]
    per_hour: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            enabled: true,
            per_minute: 120,
            per_hour: 3_600,
        }
    }
}

#[derive(Clone, Copy, Debug, Default)]
struct Buckets {
    minute_bucket: u64,
    minute_count: u32,
    hour_bucket: u64,
    hour_count: u32,
}

/// Minute/hour request counters per client
#[derive(Debug)]
pub struct RateLimiter {
    config: Config,
    clients: DashMap<String, Buckets>,
}

impl RateLimiter {
    ///
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self {
            config,
            clients: DashMap::new(),
        }
    }

    /// Count one request for the client and reject it when either the
    /// minute or hour cap is exceeded
    pub fn check(&self, client_id: Option<&str>) -> Result<()> {
        if !*self.config.enabled() {
            return Ok(());
        }
        let client = client_id.unwrap_or(ANONYMOUS);
        let now = epoch_secs();
        let minute = now / 60;
        let hour = now / 3_600;

        let mut entry = self.clients.entry(client.to_string()).or_default();
        if entry.minute_bucket != minute {
            entry.minute_bucket = minute;
            entry.minute_count = 0;
        }
        if entry.hour_bucket != hour {
            entry.hour_bucket = hour;
            entry.hour_count = 0;
        }
        if entry.minute_count >= *self.config.per_minute() {
            return Err(ResourceExhausted {
                resource: format!("requests per minute for client '{}'", client),
                limit: u64::from(*self.config.per_minute()),
            }
            .into());
        }
        if entry.hour_count >= *self.config.per_hour() {
            return Err(ResourceExhausted {
                resource: format!("requests per hour for client '{}'", client),
                limit: u64::from(*self.config.per_hour()),
            }
            .into());
        }
        entry.minute_count += 1;
        entry.hour_count += 1;
        Ok(())
    }

    /// Drop clients whose buckets are older than two periods; called by
    /// the background sweeper
    pub fn purge(&self) -> usize {
        let now = epoch_secs();
        let minute = now / 60;
        let hour = now / 3_600;
        let before = self.clients.len();
        self.clients
            .retain(|_, buckets| {
                minute.saturating_sub(buckets.minute_bucket) < 2
                    || hour.saturating_sub(buckets.hour_bucket) < 2
            });
        let purged = before - self.clients.len();
        if purged > 0 {
            debug!(purged, "purged stale rate-limit buckets");
        }
        purged
    }

    /// Number of clients currently tracked
    #[must_use]
    pub fn tracked_clients(&self) -> usize {
        self.clients.len()
    }

    pub(crate) fn purge_interval(&self) -> Duration {
        Duration::from_secs(120)
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

fn epoch_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}
