// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Performance monitoring
//!
//! A rolling window of operation samples feeds alert rules on every
//! record: slow queries, windowed error rate, per-sample response time,
//! and the cumulative security-threat counter.  The report generator
//! summarizes any time range with percentiles, per-component breakdowns,
//! and hourly trend deltas.

use crate::event::{Event, EventBus};
use crate::model::report::{
    Alert, ComponentBreakdown, MetricSample, Percentiles, PerformanceReport, TrendPoint,
    WindowStats,
};
use crate::model::Severity;
use chrono::{DateTime, Duration as ChronoDuration, DurationRound, Utc};
use derive_builder::Builder;
use getset::Getters;
use parking_lot::RwLock;
use serde_json::{json, Value};
use std::collections::{BTreeMap, HashMap, VecDeque};
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;
use tracing::{info, warn};

/// Monitor tuning knobs
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
pub struct Config {
    /// How long samples are retained
    #[builder(default = "Duration::from_secs(24 * 60 * 60)")]
    window: Duration,
    /// Executions slower than this raise `slow_query`
    #[builder(default = "Duration::from_secs(1)")]
    slow_threshold: Duration,
    /// Windowed error rate above this raises `high_error_rate`
    #[builder(default = "0.1")]
    error_rate_threshold: f64,
    /// A single execution slower than this raises `slow_response`
    #[builder(default = "Duration::from_secs(2)")]
    response_time_threshold: Duration,
    /// Every this many security threats raises `security_threat_surge`
    #[builder(default = "10")]
    security_surge_threshold: u64,
    /// How often old samples are swept and the summary logged
    #[builder(default = "Duration::from_secs(60 * 60)")]
    cleanup_interval: Duration,
    /// Retained alert history
    #[builder(default = "1_000")]
    max_alerts: usize,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            window: Duration::from_secs(24 * 60 * 60),
            slow_threshold: Duration::from_secs(1),
            error_rate_threshold: 0.1,
            response_time_threshold: Duration::from_secs(2),
            security_surge_threshold: 10,
            cleanup_interval: Duration::from_secs(60 * 60),
            max_alerts: 1_000,
        }
    }
}

/// Rolling metrics, alert routing, and report generation
#[derive(Debug)]
pub struct Monitor {
    config: Config,
    samples: RwLock<VecDeque<MetricSample>>,
    alerts: RwLock<VecDeque<Alert>>,
    security_threats: AtomicU64,
    events: EventBus,
}

impl Monitor {
    ///
    #[must_use]
    pub fn new(config: Config, events: EventBus) -> Self {
        Self {
            config,
            samples: RwLock::new(VecDeque::new()),
            alerts: RwLock::new(VecDeque::new()),
            security_threats: AtomicU64::new(0),
            events,
        }
    }

    /// Record one completed operation and evaluate every alert condition
    pub fn record(&self, sample: MetricSample) {
        let duration = Duration::from_millis(*sample.duration_ms());
        {
            let mut samples = self.samples.write();
            prune(&mut samples, *self.config.window());
            samples.push_back(sample.clone());
        }

        if duration > *self.config.slow_threshold() {
            self.events.emit(Event::SlowQuery {
                sample: sample.clone(),
            });
            self.raise(
                "slow_query",
                Severity::Medium,
                json!({
                    "signature": sample.signature(),
                    "duration_ms": sample.duration_ms(),
                    "threshold_ms": self.config.slow_threshold().as_millis() as u64,
                }),
                false,
            );
        }

        if duration > *self.config.response_time_threshold() {
            self.raise(
                "slow_response",
                Severity::High,
                serde_json::to_value(&sample).unwrap_or(Value::Null),
                true,
            );
        }

        let stats = self.windowed_stats();
        if *stats.total() > 1 && *stats.error_rate() > *self.config.error_rate_threshold() {
            self.raise(
                "high_error_rate",
                Severity::High,
                json!({
                    "error_rate": stats.error_rate(),
                    "threshold": self.config.error_rate_threshold(),
                    "window_total": stats.total(),
                }),
                true,
            );
        }
    }

    /// Record a security-relevant event.  Critical and high severities
    /// raise an immediate alert; the cumulative counter raises a surge
    /// alert at every threshold crossing.
    pub fn security_event(&self, severity: Severity, detail: Value) {
        let count = self.security_threats.fetch_add(1, Ordering::SeqCst) + 1;
        warn!(count, severity = %severity, "security event recorded");
        if severity >= Severity::High {
            self.raise("security_threat", severity, detail, true);
        }
        let threshold = *self.config.security_surge_threshold();
        if threshold > 0 && count % threshold == 0 {
            self.raise(
                "security_threat_surge",
                Severity::Critical,
                json!({ "cumulative": count, "threshold": threshold }),
                true,
            );
        }
    }

    /// Raise a `deadlock_suspected` alert naming the stuck transactions
    pub fn deadlock_alert(&self, ids: &[String]) {
        self.raise(
            "deadlock_suspected",
            Severity::High,
            json!({ "transactions": ids }),
            true,
        );
    }

    fn raise(&self, kind: &str, severity: Severity, payload: Value, action_required: bool) {
        let alert = Alert::new(kind, severity, payload, action_required);
        {
            let mut alerts = self.alerts.write();
            if alerts.len() == *self.config.max_alerts() {
                let _ = alerts.pop_front();
            }
            alerts.push_back(alert.clone());
        }
        self.events.emit(Event::PerformanceAlert { alert });
    }

    /// Aggregate counters over the retention window
    #[must_use]
    pub fn windowed_stats(&self) -> WindowStats {
        let samples = self.samples.read();
        let total = samples.len();
        let errors = samples.iter().filter(|s| s.is_error()).count();
        let cache_hits = samples.iter().filter(|s| *s.cache_hit()).count();
        let avg = if total == 0 {
            0.0
        } else {
            samples.iter().map(|s| *s.duration_ms() as f64).sum::<f64>() / total as f64
        };
        WindowStats::new(total, errors, cache_hits, avg)
    }

    /// Total security threats observed since startup
    #[must_use]
    pub fn security_threat_count(&self) -> u64 {
        self.security_threats.load(Ordering::SeqCst)
    }

    /// Snapshot of retained alerts, oldest first
    #[must_use]
    pub fn alerts(&self) -> Vec<Alert> {
        self.alerts.read().iter().cloned().collect()
    }

    /// Build the report for a time range
    #[must_use]
    pub fn report(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> PerformanceReport {
        let samples = self.samples.read();
        let selected: Vec<&MetricSample> = samples
            .iter()
            .filter(|s| *s.timestamp() >= from && *s.timestamp() <= until)
            .collect();

        let total = selected.len();
        let errors = selected.iter().filter(|s| s.is_error()).count();
        let cache_hits = selected.iter().filter(|s| *s.cache_hit()).count();
        let mut durations: Vec<u64> = selected.iter().map(|s| *s.duration_ms()).collect();
        durations.sort_unstable();
        let avg = if total == 0 {
            0.0
        } else {
            durations.iter().map(|d| *d as f64).sum::<f64>() / total as f64
        };
        let summary = WindowStats::new(total, errors, cache_hits, avg);
        let percentiles = percentiles(&durations, avg);

        let mut by_component: HashMap<&str, (usize, usize, f64)> = HashMap::new();
        for sample in &selected {
            let slot = by_component
                .entry(sample.component().as_str())
                .or_insert((0, 0, 0.0));
            slot.0 += 1;
            if sample.is_error() {
                slot.1 += 1;
            }
            slot.2 += *sample.duration_ms() as f64;
        }
        let mut components: Vec<ComponentBreakdown> = by_component
            .into_iter()
            .map(|(component, (ops, errs, sum))| {
                ComponentBreakdown::new(component, ops, errs, sum / ops.max(1) as f64)
            })
            .collect();
        components.sort_by(|a, b| a.component().cmp(b.component()));

        let trend = trend(&selected);
        let recommendations = self.recommendations(&summary, &percentiles);

        PerformanceReport::new(from, until, summary, components, percentiles, trend, recommendations)
    }

    fn recommendations(&self, summary: &WindowStats, percentiles: &Percentiles) -> Vec<String> {
        let mut out = Vec::new();
        if *summary.total() == 0 {
            return out;
        }
        if *summary.error_rate() > *self.config.error_rate_threshold() {
            out.push(format!(
                "error rate {:.1}% exceeds the {:.1}% threshold; inspect recent failures",
                summary.error_rate() * 100.0,
                self.config.error_rate_threshold() * 100.0
            ));
        }
        if *summary.cache_hit_rate() < 0.2 {
            out.push(
                "cache hit rate is below 20%; consider longer TTLs or warming frequent queries"
                    .to_string(),
            );
        }
        if *percentiles.p95_ms() as u128 > self.config.response_time_threshold().as_millis() {
            out.push(format!(
                "p95 latency {}ms exceeds the {}ms response-time threshold; review slow queries",
                percentiles.p95_ms(),
                self.config.response_time_threshold().as_millis()
            ));
        }
        if self.security_threat_count() > 0 {
            out.push(
                "security threats were recorded; audit rejected queries and their sources"
                    .to_string(),
            );
        }
        out
    }

    /// Drop samples older than the window and log the periodic summary.
    /// Returns how many samples were dropped.
    pub fn cleanup(&self) -> usize {
        let dropped = {
            let mut samples = self.samples.write();
            prune(&mut samples, *self.config.window())
        };
        let stats = self.windowed_stats();
        info!(
            total = stats.total(),
            errors = stats.errors(),
            cache_hit_rate = format!("{:.2}", stats.cache_hit_rate()),
            avg_ms = format!("{:.1}", stats.avg_duration_ms()),
            dropped,
            "periodic monitor summary"
        );
        dropped
    }

    pub(crate) fn cleanup_interval(&self) -> Duration {
        *self.config.cleanup_interval()
    }
}

fn prune(samples: &mut VecDeque<MetricSample>, window: Duration) -> usize {
    let cutoff = Utc::now()
        - ChronoDuration::from_std(window).unwrap_or_else(|_| ChronoDuration::hours(24));
    let mut dropped = 0_usize;
    while samples
        .front()
        .map_or(false, |sample| *sample.timestamp() < cutoff)
    {
        let _ = samples.pop_front();
        dropped += 1;
    }
    dropped
}

fn percentiles(sorted: &[u64], avg: f64) -> Percentiles {
    if sorted.is_empty() {
        return Percentiles::default();
    }
    let min = sorted[0];
    let max = sorted[sorted.len() - 1];
    let median = sorted[sorted.len() / 2];
    let p95_idx = ((sorted.len() as f64 * 0.95).ceil() as usize).saturating_sub(1);
    let p95 = sorted[p95_idx.min(sorted.len() - 1)];
    Percentiles::new(avg, min, max, median, p95)
}

fn trend(selected: &[&MetricSample]) -> Vec<TrendPoint> {
    let mut buckets: BTreeMap<DateTime<Utc>, (usize, f64)> = BTreeMap::new();
    for sample in selected {
        let hour = sample
            .timestamp()
            .duration_trunc(ChronoDuration::hours(1))
            .unwrap_or(*sample.timestamp());
        let slot = buckets.entry(hour).or_insert((0, 0.0));
        slot.0 += 1;
        slot.1 += *sample.duration_ms() as f64;
    }
    let mut out = Vec::with_capacity(buckets.len());
    let mut previous: Option<f64> = None;
    for (hour, (count, sum)) in buckets {
        let avg = sum / count.max(1) as f64;
        let delta = match previous {
            Some(prev) if prev > 0.0 => (avg - prev) / prev * 100.0,
            _ => 0.0,
        };
        out.push(TrendPoint::new(hour, avg, delta));
        previous = Some(avg);
    }
    out
}

#[cfg(test)]
mod test {
    use super::{Config, ConfigBuilder, Monitor};
    use crate::event::EventBus;
    use crate::model::report::MetricSample;
    use crate::model::Severity;
    use anyhow::Result;
    use chrono::{Duration as ChronoDuration, Utc};
    use serde_json::json;
    use std::time::Duration;

    fn sample(duration_ms: u64, error: bool) -> MetricSample {
        MetricSample::new(
            "query",
            "sig",
            duration_ms,
            1,
            false,
            false,
            if error { Some("boom".to_string()) } else { None },
        )
    }

    fn monitor(config: Config) -> Monitor {
        Monitor::new(config, EventBus::new(64))
    }

    #[test]
    fn windowed_stats_aggregate() {
        let mon = monitor(Config::default());
        mon.record(sample(10, false));
        mon.record(sample(30, true));
        let stats = mon.windowed_stats();
        assert_eq!(*stats.total(), 2);
        assert_eq!(*stats.errors(), 1);
        assert!((stats.avg_duration_ms() - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn slow_query_raises_alert() -> Result<()> {
        let mon = monitor(
            ConfigBuilder::default()
                .slow_threshold(Duration::from_millis(5))
                .build()?,
        );
        mon.record(sample(50, false));
        assert!(mon.alerts().iter().any(|a| a.kind() == "slow_query"));
        Ok(())
    }

    #[test]
    fn error_rate_alert_needs_multiple_samples() -> Result<()> {
        let mon = monitor(ConfigBuilder::default().error_rate_threshold(0.4).build()?);
        mon.record(sample(1, true));
        assert!(!mon.alerts().iter().any(|a| a.kind() == "high_error_rate"));
        mon.record(sample(1, true));
        assert!(mon.alerts().iter().any(|a| a.kind() == "high_error_rate"));
        Ok(())
    }

    #[test]
    fn critical_security_event_is_immediate() {
        let mon = monitor(Config::default());
        mon.security_event(Severity::Critical, json!({"pattern": "stacked ddl"}));
        let alerts = mon.alerts();
        assert!(alerts.iter().any(|a| a.kind() == "security_threat"));
        assert_eq!(mon.security_threat_count(), 1);
    }

    #[test]
    fn low_severity_security_events_only_surge() -> Result<()> {
        let mon = monitor(
            ConfigBuilder::default()
                .security_surge_threshold(3)
                .build()?,
        );
        for _ in 0..3 {
            mon.security_event(Severity::Low, json!({}));
        }
        let alerts = mon.alerts();
        assert!(!alerts.iter().any(|a| a.kind() == "security_threat"));
        assert!(alerts.iter().any(|a| a.kind() == "security_threat_surge"));
        Ok(())
    }

    #[test]
    fn report_has_percentiles_and_components() {
        let mon = monitor(Config::default());
        for ms in [10, 20, 30, 40, 100] {
            mon.record(sample(ms, false));
        }
        let report = mon.report(Utc::now() - ChronoDuration::hours(1), Utc::now());
        assert_eq!(*report.summary().total(), 5);
        assert_eq!(*report.percentiles().min_ms(), 10);
        assert_eq!(*report.percentiles().max_ms(), 100);
        assert_eq!(*report.percentiles().median_ms(), 30);
        assert_eq!(*report.percentiles().p95_ms(), 100);
        assert_eq!(report.components().len(), 1);
        assert_eq!(report.components()[0].component(), "query");
    }

    #[test]
    fn report_range_excludes_outside_samples() {
        let mon = monitor(Config::default());
        mon.record(sample(10, false));
        let report = mon.report(
            Utc::now() - ChronoDuration::hours(2),
            Utc::now() - ChronoDuration::hours(1),
        );
        assert_eq!(*report.summary().total(), 0);
    }

    #[test]
    fn alert_history_is_bounded() -> Result<()> {
        let mon = monitor(
            ConfigBuilder::default()
                .max_alerts(2)
                .slow_threshold(Duration::from_millis(1))
                .build()?,
        );
        for _ in 0..5 {
            mon.record(sample(10, false));
        }
        assert_eq!(mon.alerts().len(), 2);
        Ok(())
    }
}
