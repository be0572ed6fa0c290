// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! The system coordinator
//!
//! One facade wires the validator, optimizer, result cache, transaction
//! manager, executors, monitor, and rate limiter, and enforces the
//! per-query pipeline: admit, validate, optimize, probe the cache,
//! execute under a deadline, then record and alert.

use crate::engine::{Engine, EngineConnection};
use crate::error::RukuzuErr::{Fatal, Timeout, UnknownTemplate};
use crate::event::{Event, EventBus, EventStream};
use crate::exec::batch::BatchRegistry;
use crate::exec::stream::{StreamRegistry, ResultStream};
use crate::exec::ExecCtx;
use crate::limits::RateLimiter;
use crate::model::query::input::Config as QueryConfig;
use crate::model::query::output::Outcome as QueryOutcome;
use crate::model::report::{MetricSample, PerformanceReport, SystemStatus};
use crate::model::{Health, Severity};
use crate::monitor::Monitor;
use crate::optimize::cache::ResultCache;
use crate::optimize::{Optimizer, Plan};
use crate::txn::TxnManager;
use crate::types::Params;
use crate::validate::{inline::inline, Validator, Verdict};
use anyhow::{Context as _, Result};
use chrono::{DateTime, Utc};
use derive_builder::Builder;
use getset::Getters;
use parking_lot::{Mutex, RwLock};
use serde_json::json;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Weak};
use std::time::{Duration, Instant};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// Coordinator tuning knobs
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
pub struct Config {
    /// Per-query deadline when the caller supplies none; a caller
    /// timeout is clamped to this
    #[builder(default = "Duration::from_secs(30)")]
    default_timeout: Duration,
    ///
    #[builder(default = "Duration::from_secs(60)")]
    health_interval: Duration,
    /// Issued at build time and by every health check
    #[builder(default = "String::from(\"RETURN 1\")", setter(into))]
    probe_query: String,
    /// Windowed error rate above which health degrades to WARNING
    #[builder(default = "0.25")]
    warning_error_rate: f64,
    /// Active-transaction count at which health degrades to WARNING
    #[builder(default = "8")]
    warning_active_txns: usize,
    /// Event channel depth per subscriber
    #[builder(default = "256")]
    event_capacity: usize,
    /// How often finished stream records are reaped
    #[builder(default = "Duration::from_secs(60 * 60)")]
    stream_reap_interval: Duration,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            default_timeout: Duration::from_secs(30),
            health_interval: Duration::from_secs(60),
            probe_query: String::from("RETURN 1"),
            warning_error_rate: 0.25,
            warning_active_txns: 8,
            event_capacity: 256,
            stream_reap_interval: Duration::from_secs(60 * 60),
        }
    }
}

/// A pre-validated, pre-parameterized query shape registered at
/// initialization
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Template {
    ///
    name: String,
    ///
    cypher: String,
}

impl Template {
    ///
    #[must_use]
    pub fn new<N, C>(name: N, cypher: C) -> Self
    where
        N: Into<String>,
        C: Into<String>,
    {
        Self {
            name: name.into(),
            cypher: cypher.into(),
        }
    }
}

#[derive(Debug)]
pub(crate) struct Inner {
    pub(crate) config: Config,
    pub(crate) engine: Arc<dyn Engine>,
    pub(crate) conn: Arc<dyn EngineConnection>,
    pub(crate) validator: Arc<Validator>,
    pub(crate) optimizer: Arc<Optimizer>,
    pub(crate) results: Arc<ResultCache>,
    pub(crate) monitor: Arc<Monitor>,
    pub(crate) txns: TxnManager,
    pub(crate) limiter: Arc<RateLimiter>,
    pub(crate) events: EventBus,
    pub(crate) templates: HashMap<String, Template>,
    pub(crate) streams: Arc<StreamRegistry>,
    pub(crate) batches: Arc<BatchRegistry>,
    pub(crate) health: RwLock<Health>,
    pub(crate) started: Instant,
    pub(crate) tasks: Mutex<Vec<JoinHandle<()>>>,
    pub(crate) closed: AtomicBool,
}

/// The single surface over the whole orchestration layer.  Built with
/// [`CoordinatorBuilder`](crate::CoordinatorBuilder); operations live on
/// the [`Cypher`](crate::Cypher), [`Batch`](crate::Batch),
/// [`Streaming`](crate::Streaming),
/// [`Transactional`](crate::Transactional), and
/// [`Admin`](crate::Admin) traits.
#[derive(Clone, Debug)]
pub struct Coordinator {
    pub(crate) inner: Arc<Inner>,
}

impl Coordinator {
    pub(crate) fn exec_ctx(&self) -> ExecCtx {
        ExecCtx {
            conn: Arc::clone(&self.inner.conn),
            validator: Arc::clone(&self.inner.validator),
            optimizer: Arc::clone(&self.inner.optimizer),
            monitor: Arc::clone(&self.inner.monitor),
            events: self.inner.events.clone(),
            txns: self.inner.txns.clone(),
        }
    }

    /// The full per-query pipeline
    pub(crate) async fn run_query(&self, config: QueryConfig) -> Result<QueryOutcome> {
        let query_id = Uuid::new_v4();
        let started = Instant::now();
        let inner = &self.inner;

        if inner.closed.load(Ordering::SeqCst) {
            return Err(Fatal {
                msg: "coordinator is shut down".to_string(),
            }
            .into());
        }
        // fail fast while the engine is unreachable
        if *inner.health.read() == Health::Unhealthy {
            return Err(Fatal {
                msg: "engine is unreachable, query rejected".to_string(),
            }
            .into());
        }

        // 1. admit
        inner.limiter.check(config.client_id().as_deref())?;

        // 2. validate
        let verdict = inner.validator.validate(config.cypher(), config.params());
        if !verdict.valid() {
            return Err(self.reject(&query_id, &verdict, started));
        }

        // 3. optimize
        let (plan, plan_hit) = inner
            .optimizer
            .optimize(verdict.cypher(), verdict.params());
        if !plan_hit {
            inner.events.emit(Event::QueryOptimized {
                signature: plan.signature().clone(),
                rules_applied: plan.rules_applied().clone(),
            });
        }

        // 4. probe the result cache
        let cacheable = plan.analysis().kind().is_cacheable() && !config.bypass_cache();
        if cacheable {
            if let Some(rows) = inner.results.get(plan.signature()) {
                let duration_ms = started.elapsed().as_millis() as u64;
                inner.events.emit(Event::CacheHit {
                    signature: plan.signature().clone(),
                });
                inner.monitor.record(MetricSample::new(
                    "query",
                    plan.signature(),
                    duration_ms,
                    rows.len(),
                    true,
                    !plan.rules_applied().is_empty(),
                    None,
                ));
                debug!(query_id = %query_id, "served from result cache");
                return Ok(QueryOutcome::new(
                    query_id,
                    rows,
                    true,
                    !plan.rules_applied().is_empty(),
                    plan.rules_applied().clone(),
                    verdict.warnings().clone(),
                    duration_ms,
                ));
            }
        }

        // 5. execute under the effective deadline
        let final_query = inline(plan.optimized(), verdict.params())?;
        let deadline = config
            .timeout()
            .map_or(*inner.config.default_timeout(), |t| {
                t.min(*inner.config.default_timeout())
            });
        let outcome = match tokio::time::timeout(deadline, inner.conn.run(&final_query)).await {
            Ok(outcome) => outcome,
            Err(_elapsed) => {
                let duration_ms = started.elapsed().as_millis() as u64;
                let err = Timeout {
                    query_id: query_id.to_string(),
                    waited_ms: duration_ms,
                };
                self.record_failure(&plan, duration_ms, &format!("{}", err));
                return Err(err.into());
            }
        };

        // 6. post-process
        let duration_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(rows) => {
                if cacheable {
                    let write_flavored = {
                        let upper = plan.optimized().to_ascii_uppercase();
                        upper.contains("CREATE") || upper.contains("MERGE")
                    };
                    let ttl = inner.results.effective_ttl(
                        *plan.analysis().complexity(),
                        crate::utils::byte_estimate(&rows),
                        write_flavored,
                    );
                    inner.results.put(plan.signature(), rows.clone(), ttl);
                    inner.events.emit(Event::ResultCached {
                        signature: plan.signature().clone(),
                    });
                }
                inner.monitor.record(MetricSample::new(
                    "query",
                    plan.signature(),
                    duration_ms,
                    rows.len(),
                    false,
                    !plan.rules_applied().is_empty(),
                    None,
                ));
                Ok(QueryOutcome::new(
                    query_id,
                    rows,
                    false,
                    !plan.rules_applied().is_empty(),
                    plan.rules_applied().clone(),
                    verdict.warnings().clone(),
                    duration_ms,
                ))
            }
            Err(err) => {
                self.record_failure(&plan, duration_ms, &format!("{:#}", err));
                Err(err).with_context(|| {
                    format!("query '{}' failed after {}ms", query_id, duration_ms)
                })
            }
        }
    }

    fn reject(&self, query_id: &Uuid, verdict: &Verdict, started: Instant) -> anyhow::Error {
        let inner = &self.inner;
        let duration_ms = started.elapsed().as_millis() as u64;
        let err: crate::error::RukuzuErr = match verdict.injection_pattern() {
            Some(pattern) => {
                inner.monitor.security_event(
                    Severity::Critical,
                    json!({ "pattern": pattern, "query_id": query_id.to_string() }),
                );
                crate::error::RukuzuErr::InjectionDetected {
                    query_id: query_id.to_string(),
                    pattern: pattern.to_string(),
                }
            }
            None => crate::error::RukuzuErr::Validation {
                query_id: query_id.to_string(),
                errors: verdict.errors().clone(),
                risk: *verdict.risk(),
            },
        };
        inner.monitor.record(MetricSample::new(
            "query",
            "rejected",
            duration_ms,
            0,
            false,
            false,
            Some(format!("{}", err)),
        ));
        err.into()
    }

    fn record_failure(&self, plan: &Plan, duration_ms: u64, error: &str) {
        self.inner.monitor.record(MetricSample::new(
            "query",
            plan.signature(),
            duration_ms,
            0,
            false,
            !plan.rules_applied().is_empty(),
            Some(error.to_string()),
        ));
    }

    pub(crate) async fn run_template(&self, name: &str, params: Params) -> Result<QueryOutcome> {
        let template = self
            .inner
            .templates
            .get(name)
            .ok_or_else(|| UnknownTemplate {
                name: name.to_string(),
            })?
            .clone();
        let config = crate::model::query::input::ConfigBuilder::default()
            .cypher(template.cypher().clone())
            .params(params)
            .build()
            .map_err(|e| crate::error::RukuzuErr::Internal {
                msg: format!("template '{}' produced an invalid config: {}", name, e),
            })?;
        self.run_query(config).await
    }

    pub(crate) fn open_stream(
        &self,
        config: crate::model::stream::input::Config,
    ) -> Result<ResultStream> {
        self.inner.limiter.check(config.client_id().as_deref())?;
        crate::exec::stream::create(self.exec_ctx(), Arc::clone(&self.inner.streams), config)
    }

    pub(crate) fn status(&self) -> SystemStatus {
        let inner = &self.inner;
        SystemStatus::new(
            *inner.health.read(),
            inner.txns.active_count(),
            inner.streams.active_count(),
            inner.batches.running(),
            inner.results.stats(),
            inner.optimizer.plan_count(),
            inner.limiter.tracked_clients(),
            inner.started.elapsed().as_millis() as u64,
        )
    }

    pub(crate) fn report(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> PerformanceReport {
        self.inner.monitor.report(from, until)
    }

    pub(crate) fn subscribe_events(&self) -> EventStream {
        self.inner.events.subscribe()
    }

    /// Re-probe the engine and fold monitor and transaction pressure
    /// into the published health state
    pub(crate) async fn health_check(&self) {
        let inner = &self.inner;
        let probe = tokio::time::timeout(
            Duration::from_secs(5),
            inner.conn.run(inner.config.probe_query()),
        )
        .await;
        let mut health = match probe {
            Ok(Ok(_rows)) => Health::Healthy,
            Ok(Err(err)) => {
                warn!(error = %err, "health probe failed");
                Health::Unhealthy
            }
            Err(_elapsed) => {
                warn!("health probe timed out");
                Health::Unhealthy
            }
        };
        if health == Health::Unhealthy {
            // engine failures are fatal for open transactions
            let rolled = inner.txns.force_rollback_all("engine_unreachable").await;
            if rolled > 0 {
                warn!(rolled, "force-rolled-back transactions after failed probe");
            }
        } else {
            let stats = inner.monitor.windowed_stats();
            if *stats.total() > 0 && *stats.error_rate() > *inner.config.warning_error_rate() {
                health = Health::Warning;
            }
            if inner.txns.active_count() >= *inner.config.warning_active_txns() {
                health = Health::Warning;
            }
        }
        *inner.health.write() = health;
        inner.events.emit(Event::HealthCheck { health });
    }

    /// Stop background tasks, roll back whatever is still active, close
    /// the engine
    pub(crate) async fn run_shutdown(&self) -> Result<()> {
        let inner = &self.inner;
        if inner.closed.swap(true, Ordering::SeqCst) {
            return Ok(());
        }
        info!("coordinator shutting down");
        for handle in inner.tasks.lock().drain(..) {
            handle.abort();
        }
        let rolled = inner.txns.force_rollback_all("shutdown").await;
        if rolled > 0 {
            info!(rolled, "rolled back active transactions at shutdown");
        }
        inner.events.emit(Event::SystemShutdown);
        inner.engine.close().await
    }

    /// Start every sweeper and the health check; called once by the
    /// builder
    pub(crate) fn spawn_background(&self) {
        let mut tasks = self.inner.tasks.lock();

        tasks.push(spawn_sweeper(
            Arc::downgrade(&self.inner),
            self.inner.results.sweep_interval(),
            |inner| {
                let swept = inner.results.sweep();
                if swept > 0 {
                    debug!(swept, "result-cache sweep");
                }
            },
        ));

        tasks.push(spawn_sweeper(
            Arc::downgrade(&self.inner),
            self.inner.optimizer.sweep_interval(),
            |inner| {
                let swept = inner.optimizer.sweep();
                if swept > 0 {
                    debug!(swept, "plan-cache sweep");
                }
            },
        ));

        tasks.push(spawn_sweeper(
            Arc::downgrade(&self.inner),
            self.inner.monitor.cleanup_interval(),
            |inner| {
                let _ = inner.monitor.cleanup();
            },
        ));

        tasks.push(spawn_sweeper(
            Arc::downgrade(&self.inner),
            self.inner.limiter.purge_interval(),
            |inner| {
                let _ = inner.limiter.purge();
            },
        ));

        tasks.push(spawn_sweeper(
            Arc::downgrade(&self.inner),
            *self.inner.config.stream_reap_interval(),
            |inner| {
                let reaped = inner.streams.reap();
                if reaped > 0 {
                    debug!(reaped, "stream registry reap");
                }
            },
        ));

        // the transaction timeout sweeper and deadlock detector await
        let weak = Arc::downgrade(&self.inner);
        let interval = self.inner.txns.sweep_interval();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let inner = match weak.upgrade() {
                    Some(inner) => inner,
                    None => break,
                };
                let swept = inner.txns.sweep_expired().await;
                if !swept.is_empty() {
                    info!(count = swept.len(), "transaction timeout sweep");
                }
            }
        }));

        let weak = Arc::downgrade(&self.inner);
        let interval = self.inner.txns.deadlock_interval();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                let inner = match weak.upgrade() {
                    Some(inner) => inner,
                    None => break,
                };
                let _ = inner.txns.detect_deadlocks();
            }
        }));

        let weak = Arc::downgrade(&self.inner);
        let interval = *self.inner.config.health_interval();
        tasks.push(tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.tick().await;
            loop {
                ticker.tick().await;
                match weak.upgrade() {
                    Some(inner) => Coordinator { inner }.health_check().await,
                    None => break,
                }
            }
        }));
    }
}

fn spawn_sweeper<F>(weak: Weak<Inner>, interval: Duration, sweep: F) -> JoinHandle<()>
where
    F: Fn(&Inner) + Send + 'static,
{
    tokio::spawn(async move {
        let mut ticker = tokio::time::interval(interval);
        // the first tick fires immediately; skip it
        ticker.tick().await;
        loop {
            ticker.tick().await;
            match weak.upgrade() {
                Some(inner) => sweep(&inner),
                None => break,
            }
        }
    })
}
