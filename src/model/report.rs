// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Monitoring output structs

use crate::model::{Health, Severity};
use chrono::{DateTime, Utc};
use getset::Getters;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

/// One completed operation as recorded by the performance monitor
#[derive(Clone, Debug, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct MetricSample {
    /// When the operation finished
    timestamp: DateTime<Utc>,
    /// Which subsystem produced the sample, i.e. "query", "batch",
    /// "transaction", "stream"
    component: String,
    /// The query signature
    signature: String,
    /// Wall-clock execution time in milliseconds
    duration_ms: u64,
    /// Number of rows returned
    rows: usize,
    /// Served from the result cache
    cache_hit: bool,
    /// At least one rewrite rule modified the query
    optimized: bool,
    /// The error message, when the operation failed
    error: Option<String>,
}

impl MetricSample {
    #[doc(hidden)]
    #[must_use]
    pub fn new(
        component: &str,
        signature: &str,
        duration_ms: u64,
        rows: usize,
        cache_hit: bool,
        optimized: bool,
        error: Option<String>,
    ) -> Self {
        Self {
            timestamp: Utc::now(),
            component: component.to_string(),
            signature: signature.to_string(),
            duration_ms,
            rows,
            cache_hit,
            optimized,
            error,
        }
    }

    /// true when the sample records a failed operation
    #[must_use]
    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// An emitted observation that a monitored threshold was crossed or a
/// security-relevant event occurred
#[derive(Clone, Debug, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct Alert {
    ///
    id: Uuid,
    ///
    timestamp: DateTime<Utc>,
    /// The alert type, i.e. "slow_query", "high_error_rate",
    /// "security_threat", "deadlock_suspected"
    kind: String,
    ///
    severity: Severity,
    /// Alert-specific details
    payload: Value,
    /// Whether the application is expected to act on this alert
    action_required: bool,
}

impl Alert {
    #[doc(hidden)]
    #[must_use]
    pub fn new(kind: &str, severity: Severity, payload: Value, action_required: bool) -> Self {
        Self {
            id: Uuid::new_v4(),
            timestamp: Utc::now(),
            kind: kind.to_string(),
            severity,
            payload,
            action_required,
        }
    }
}

/// Aggregate counters over the monitor's current window
#[derive(Clone, Copy, Debug, Default, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct WindowStats {
    ///
    total: usize,
    ///
    errors: usize,
    /// errors / total, 0.0 when the window is empty
    error_rate: f64,
    ///
    cache_hits: usize,
    /// cache hits / total, 0.0 when the window is empty
    cache_hit_rate: f64,
    ///
    avg_duration_ms: f64,
}

impl WindowStats {
    #[doc(hidden)]
    #[must_use]
    pub fn new(total: usize, errors: usize, cache_hits: usize, avg_duration_ms: f64) -> Self {
        let error_rate = if total == 0 {
            0.0
        } else {
            errors as f64 / total as f64
        };
        let cache_hit_rate = if total == 0 {
            0.0
        } else {
            cache_hits as f64 / total as f64
        };
        Self {
            total,
            errors,
            error_rate,
            cache_hits,
            cache_hit_rate,
            avg_duration_ms,
        }
    }
}

/// Response-time distribution over a report range
#[derive(Clone, Copy, Debug, Default, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct Percentiles {
    ///
    avg_ms: f64,
    ///
    min_ms: u64,
    ///
    max_ms: u64,
    ///
    median_ms: u64,
    ///
    p95_ms: u64,
}

impl Percentiles {
    #[doc(hidden)]
    #[must_use]
    pub fn new(avg_ms: f64, min_ms: u64, max_ms: u64, median_ms: u64, p95_ms: u64) -> Self {
        Self {
            avg_ms,
            min_ms,
            max_ms,
            median_ms,
            p95_ms,
        }
    }
}

/// Average latency for one hour bucket plus the percentage change from
/// the preceding bucket
#[derive(Clone, Debug, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct TrendPoint {
    /// Start of the hour bucket
    hour: DateTime<Utc>,
    ///
    avg_duration_ms: f64,
    /// Percentage change versus the previous bucket, 0.0 for the first
    delta_pct: f64,
}

impl TrendPoint {
    #[doc(hidden)]
    #[must_use]
    pub fn new(hour: DateTime<Utc>, avg_duration_ms: f64, delta_pct: f64) -> Self {
        Self {
            hour,
            avg_duration_ms,
            delta_pct,
        }
    }
}

/// Per-component operation counts and average latency
#[derive(Clone, Debug, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct ComponentBreakdown {
    ///
    component: String,
    ///
    operations: usize,
    ///
    errors: usize,
    ///
    avg_duration_ms: f64,
}

impl ComponentBreakdown {
    #[doc(hidden)]
    #[must_use]
    pub fn new(component: &str, operations: usize, errors: usize, avg_duration_ms: f64) -> Self {
        Self {
            component: component.to_string(),
            operations,
            errors,
            avg_duration_ms,
        }
    }
}

/// The report generator's output for a given time range
#[derive(Clone, Debug, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct PerformanceReport {
    ///
    from: DateTime<Utc>,
    ///
    until: DateTime<Utc>,
    ///
    summary: WindowStats,
    ///
    components: Vec<ComponentBreakdown>,
    ///
    percentiles: Percentiles,
    ///
    trend: Vec<TrendPoint>,
    /// Plain-language suggestions derived from crossed thresholds
    recommendations: Vec<String>,
}

impl PerformanceReport {
    #[doc(hidden)]
    #[must_use]
    pub fn new(
        from: DateTime<Utc>,
        until: DateTime<Utc>,
        summary: WindowStats,
        components: Vec<ComponentBreakdown>,
        percentiles: Percentiles,
        trend: Vec<TrendPoint>,
        recommendations: Vec<String>,
    ) -> Self {
        Self {
            from,
            until,
            summary,
            components,
            percentiles,
            trend,
            recommendations,
        }
    }
}

/// Result-cache occupancy counters
#[derive(Clone, Copy, Debug, Default, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct CacheStats {
    ///
    entries: usize,
    ///
    hits: u64,
    ///
    misses: u64,
    ///
    evictions: u64,
    ///
    expirations: u64,
}

impl CacheStats {
    #[doc(hidden)]
    #[must_use]
    pub fn new(entries: usize, hits: u64, misses: u64, evictions: u64, expirations: u64) -> Self {
        Self {
            entries,
            hits,
            misses,
            evictions,
            expirations,
        }
    }
}

/// A point-in-time snapshot of the coordinator and its registries
#[derive(Clone, Debug, Deserialize, Getters, Serialize)]
#[getset(get = "pub")]
pub struct SystemStatus {
    ///
    health: Health,
    ///
    active_transactions: usize,
    ///
    active_streams: usize,
    ///
    running_batches: usize,
    ///
    result_cache: CacheStats,
    ///
    plan_cache_entries: usize,
    /// Clients currently tracked by the rate limiter
    tracked_clients: usize,
    ///
    uptime_ms: u64,
}

impl SystemStatus {
    #[doc(hidden)]
    #[must_use]
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        health: Health,
        active_transactions: usize,
        active_streams: usize,
        running_batches: usize,
        result_cache: CacheStats,
        plan_cache_entries: usize,
        tracked_clients: usize,
        uptime_ms: u64,
    ) -> Self {
        Self {
            health,
            active_transactions,
            active_streams,
            running_batches,
            result_cache,
            plan_cache_entries,
            tracked_clients,
            uptime_ms,
        }
    }
}
