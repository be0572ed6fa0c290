// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Transaction management
//!
//! A transaction owns one engine connection from `begin` until a
//! terminal state.  Operations on a transaction are serialized through
//! an internal async lock, so concurrent submission to the same handle
//! is safe but ordered.  The timeout sweeper force-rolls-back
//! transactions that outlive their deadline; the deadlock detector only
//! raises an alert, never picks a victim.

pub mod retry;

use crate::engine::{Engine, EngineConnection};
use crate::error::RukuzuErr::{ResourceExhausted, TxnInactive, UnknownSavepoint};
use crate::event::{Event, EventBus};
use crate::model::report::MetricSample;
use crate::model::txn::input::{Config as TxnOptions, Op};
use crate::model::txn::output::{OpOutcome, Outcome};
use crate::model::{ErrorStrategy, TxnState};
use crate::monitor::Monitor;
use crate::optimize::Optimizer;
use crate::types::{Params, RowVec};
use crate::validate::{inline::inline, Validator};
use anyhow::Result;
use dashmap::DashMap;
use derive_builder::Builder;
use getset::Getters;
use libeither::Either;
use retry::RetryPolicy;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::Mutex;
use tracing::{info, warn};
use uuid::Uuid;

const SAVEPOINT_PREFIX: &str = "sp_";

/// Transaction manager tuning knobs
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
pub struct Config {
    /// Hard cap on concurrently active transactions
    #[builder(default = "10")]
    max_active: usize,
    /// How often the timeout sweeper scans the active map
    #[builder(default = "Duration::from_secs(30)")]
    sweep_interval: Duration,
    /// How often the deadlock detector scans the active map
    #[builder(default = "Duration::from_secs(5)")]
    deadlock_interval: Duration,
    /// Transactions active longer than this count as deadlock suspects
    #[builder(default = "Duration::from_secs(30)")]
    deadlock_timeout: Duration,
    /// Whether the CONTINUE strategy may take per-operation savepoints
    #[builder(default = "true")]
    savepoints_enabled: bool,
    ///
    #[builder(default)]
    retry: RetryPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_active: 10,
            sweep_interval: Duration::from_secs(30),
            deadlock_interval: Duration::from_secs(5),
            deadlock_timeout: Duration::from_secs(30),
            savepoints_enabled: true,
            retry: RetryPolicy::default(),
        }
    }
}

#[derive(Debug)]
struct TxnCore {
    state: TxnState,
    /// `(name, savepoint id)` in creation order; rollback-to leaves later
    /// entries untouched
    savepoints: Vec<(String, u64)>,
    next_savepoint: u64,
    /// Statements applied so far, in order
    applied: Vec<String>,
}

#[derive(Debug)]
struct TxnShared {
    id: Uuid,
    started: Instant,
    opts: TxnOptions,
    conn: Arc<dyn EngineConnection>,
    core: Mutex<TxnCore>,
}

#[derive(Debug)]
pub(crate) struct ManagerInner {
    config: Config,
    engine: Arc<dyn Engine>,
    active: DashMap<Uuid, Arc<TxnShared>>,
    events: EventBus,
    monitor: Arc<Monitor>,
    validator: Arc<Validator>,
    optimizer: Arc<Optimizer>,
}

/// Hands out transactions and polices their lifetimes
#[derive(Clone, Debug)]
pub struct TxnManager {
    inner: Arc<ManagerInner>,
}

/// An explicit ACID transaction over one engine connection.
///
/// Queries inside a transaction pass the validator and the optimizer but
/// never touch the result cache; isolation would leak otherwise.  A
/// handle dropped without commit stays active until the timeout sweeper
/// rolls it back.
#[derive(Clone, Debug)]
pub struct Transaction {
    shared: Arc<TxnShared>,
    manager: Arc<ManagerInner>,
}

impl TxnManager {
    pub(crate) fn new(
        config: Config,
        engine: Arc<dyn Engine>,
        events: EventBus,
        monitor: Arc<Monitor>,
        validator: Arc<Validator>,
        optimizer: Arc<Optimizer>,
    ) -> Self {
        Self {
            inner: Arc::new(ManagerInner {
                config,
                engine,
                active: DashMap::new(),
                events,
                monitor,
                validator,
                optimizer,
            }),
        }
    }

    /// Begin a transaction.  Fails with `ResourceExhausted` when the
    /// active cap is reached.
    pub async fn begin(&self, opts: TxnOptions) -> Result<Transaction> {
        let inner = &self.inner;
        if inner.active.len() >= *inner.config.max_active() {
            return Err(ResourceExhausted {
                resource: "active transactions".to_string(),
                limit: *inner.config.max_active() as u64,
            }
            .into());
        }
        let conn = inner.engine.connect().await?;
        conn.begin().await?;
        let shared = Arc::new(TxnShared {
            id: Uuid::new_v4(),
            started: Instant::now(),
            opts,
            conn,
            core: Mutex::new(TxnCore {
                state: TxnState::Active,
                savepoints: Vec::new(),
                next_savepoint: 0,
                applied: Vec::new(),
            }),
        });
        inner.active.insert(shared.id, Arc::clone(&shared));
        inner.events.emit(Event::TransactionStarted { id: shared.id });
        Ok(Transaction {
            shared,
            manager: Arc::clone(inner),
        })
    }

    /// Run a list of operations as one transaction under the configured
    /// error strategy, then commit
    pub async fn execute(&self, ops: &[Op], opts: TxnOptions) -> Result<Outcome> {
        let strategy = *opts.strategy();
        let retryable = *opts.retryable();
        let started = Instant::now();
        let txn = self.begin(opts).await?;
        let savepoints = *self.inner.config.savepoints_enabled();
        let mut results = Vec::with_capacity(ops.len());

        for (index, op) in ops.iter().enumerate() {
            let guarded = strategy == ErrorStrategy::Continue && savepoints;
            let sp_name = format!("op_{}", index);
            if guarded {
                txn.create_savepoint(&sp_name).await?;
            }
            let attempt = if retryable || strategy == ErrorStrategy::Retry {
                self.inner
                    .config
                    .retry()
                    .run(|| txn.query(op.cypher(), op.params()))
                    .await
            } else {
                txn.query(op.cypher(), op.params()).await
            };
            match attempt {
                Ok(rows) => {
                    if guarded {
                        txn.release_savepoint(&sp_name).await?;
                    }
                    results.push(OpOutcome::new(index, Either::new_right(rows)));
                }
                Err(err) if guarded => {
                    // undo the failed operation's partial effect, keep going
                    txn.rollback_to_savepoint(&sp_name).await?;
                    results.push(OpOutcome::failed(index, &format!("{:#}", err)));
                }
                Err(err) => {
                    txn.rollback().await?;
                    return Err(err);
                }
            }
        }

        txn.commit().await?;
        Ok(Outcome::new(
            *txn.id(),
            TxnState::Committed,
            results,
            started.elapsed().as_millis() as u64,
        ))
    }

    /// Roll back every transaction older than its configured timeout.
    /// Returns the ids that were swept.
    pub async fn sweep_expired(&self) -> Vec<Uuid> {
        let expired: Vec<Arc<TxnShared>> = self
            .inner
            .active
            .iter()
            .filter(|entry| entry.started.elapsed() > *entry.opts.timeout())
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut swept = Vec::with_capacity(expired.len());
        for shared in expired {
            if self.force_rollback(&shared, "timeout").await {
                swept.push(shared.id);
            }
        }
        swept
    }

    /// Roll back everything still active, e.g. at shutdown or when the
    /// engine goes unreachable
    pub async fn force_rollback_all(&self, reason: &str) -> usize {
        let all: Vec<Arc<TxnShared>> = self
            .inner
            .active
            .iter()
            .map(|entry| Arc::clone(entry.value()))
            .collect();
        let mut count = 0_usize;
        for shared in all {
            if self.force_rollback(&shared, reason).await {
                count += 1;
            }
        }
        count
    }

    async fn force_rollback(&self, shared: &Arc<TxnShared>, reason: &str) -> bool {
        let mut core = shared.core.lock().await;
        if core.state != TxnState::Active {
            return false;
        }
        if let Err(err) = shared.conn.rollback().await {
            warn!(id = %shared.id, error = %err, "engine rollback failed during force rollback");
        }
        core.state = TxnState::RolledBack;
        drop(core);
        let _ = self.inner.active.remove(&shared.id);
        info!(id = %shared.id, reason, "transaction force-rolled-back");
        self.inner.events.emit(Event::TransactionForceRollback {
            id: shared.id,
            reason: reason.to_string(),
        });
        true
    }

    /// Emit a deadlock alert when more than one transaction has been
    /// active past the deadlock window.  Returns the suspect ids; no
    /// victim is ever selected here.
    pub fn detect_deadlocks(&self) -> Vec<Uuid> {
        let suspects: Vec<Uuid> = self
            .inner
            .active
            .iter()
            .filter(|entry| entry.started.elapsed() > *self.inner.config.deadlock_timeout())
            .map(|entry| entry.id)
            .collect();
        if suspects.len() > 1 {
            warn!(count = suspects.len(), "deadlock suspected between long-running transactions");
            self.inner.events.emit(Event::DeadlockDetected {
                ids: suspects.clone(),
            });
            self.inner.monitor.deadlock_alert(
                &suspects.iter().map(ToString::to_string).collect::<Vec<_>>(),
            );
            suspects
        } else {
            Vec::new()
        }
    }

    ///
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.inner.active.len()
    }

    pub(crate) fn sweep_interval(&self) -> Duration {
        *self.inner.config.sweep_interval()
    }

    pub(crate) fn deadlock_interval(&self) -> Duration {
        *self.inner.config.deadlock_interval()
    }
}

impl Transaction {
    ///
    #[must_use]
    pub fn id(&self) -> &Uuid {
        &self.shared.id
    }

    /// Current lifecycle state
    pub async fn state(&self) -> TxnState {
        self.shared.core.lock().await.state
    }

    /// Statements applied so far, in submission order
    pub async fn applied(&self) -> Vec<String> {
        self.shared.core.lock().await.applied.clone()
    }

    /// Run one query inside the transaction.  Validation and
    /// optimization apply; the result cache does not.
    pub async fn query(&self, cypher: &str, params: &Params) -> Result<RowVec> {
        let mut core = self.shared.core.lock().await;
        self.ensure_active(&core)?;

        let verdict = self.manager.validator.validate(cypher, params);
        if !verdict.valid() {
            if let Some(pattern) = verdict.injection_pattern() {
                self.manager.monitor.security_event(
                    crate::model::Severity::Critical,
                    serde_json::json!({ "pattern": pattern, "transaction": self.shared.id }),
                );
                return Err(crate::error::RukuzuErr::InjectionDetected {
                    query_id: self.shared.id.to_string(),
                    pattern: pattern.to_string(),
                }
                .into());
            }
            return Err(crate::error::RukuzuErr::Validation {
                query_id: self.shared.id.to_string(),
                errors: verdict.errors().clone(),
                risk: *verdict.risk(),
            }
            .into());
        }

        let (plan, _cached) = self
            .manager
            .optimizer
            .optimize(verdict.cypher(), verdict.params());
        let final_query = inline(plan.optimized(), verdict.params())?;

        let started = Instant::now();
        let outcome = self.shared.conn.run(&final_query).await;
        let duration_ms = started.elapsed().as_millis() as u64;
        self.manager.monitor.record(MetricSample::new(
            "transaction",
            plan.signature(),
            duration_ms,
            outcome.as_ref().map(Vec::len).unwrap_or(0),
            false,
            !plan.rules_applied().is_empty(),
            outcome.as_ref().err().map(|e| format!("{:#}", e)),
        ));
        let rows = outcome?;
        core.applied.push(final_query);
        Ok(rows)
    }

    /// Create a named savepoint.  Re-creating an existing name moves it.
    pub async fn create_savepoint(&self, name: &str) -> Result<()> {
        let mut core = self.shared.core.lock().await;
        self.ensure_active(&core)?;
        let sp = core.next_savepoint;
        core.next_savepoint += 1;
        let sp_id = format!("{}{}", SAVEPOINT_PREFIX, sp);
        self.shared.conn.savepoint(&sp_id).await?;
        if let Some(slot) = core.savepoints.iter_mut().find(|(n, _)| n == name) {
            slot.1 = sp;
        } else {
            core.savepoints.push((name.to_string(), sp));
        }
        Ok(())
    }

    /// Roll back to a named savepoint.  Later savepoints stay in the
    /// map; rolling back to an unknown name fails.
    pub async fn rollback_to_savepoint(&self, name: &str) -> Result<()> {
        let core = self.shared.core.lock().await;
        self.ensure_active(&core)?;
        let sp = core
            .savepoints
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, sp)| *sp)
            .ok_or_else(|| UnknownSavepoint {
                name: name.to_string(),
            })?;
        self.shared
            .conn
            .rollback_to_savepoint(&format!("{}{}", SAVEPOINT_PREFIX, sp))
            .await
    }

    /// Release a named savepoint.  Releasing an unknown name is a no-op.
    pub async fn release_savepoint(&self, name: &str) -> Result<()> {
        let mut core = self.shared.core.lock().await;
        self.ensure_active(&core)?;
        let position = match core.savepoints.iter().position(|(n, _)| n == name) {
            Some(position) => position,
            None => return Ok(()),
        };
        let (_, sp) = core.savepoints.remove(position);
        self.shared
            .conn
            .release_savepoint(&format!("{}{}", SAVEPOINT_PREFIX, sp))
            .await
    }

    /// Commit.  Fails on a transaction that is no longer active; an
    /// engine failure during commit poisons the transaction.
    pub async fn commit(&self) -> Result<()> {
        let mut core = self.shared.core.lock().await;
        self.ensure_active(&core)?;
        if let Err(err) = self.shared.conn.commit().await {
            core.state = TxnState::Failed;
            return Err(err);
        }
        core.state = TxnState::Committed;
        drop(core);
        let _ = self.manager.active.remove(&self.shared.id);
        self.manager
            .events
            .emit(Event::TransactionCommitted { id: self.shared.id });
        Ok(())
    }

    /// Roll back.  A no-op on an already-terminated transaction.
    pub async fn rollback(&self) -> Result<()> {
        let mut core = self.shared.core.lock().await;
        match core.state {
            TxnState::Active | TxnState::Pending => {}
            TxnState::Failed => {
                // cleanup of a poisoned transaction: best-effort engine
                // rollback, keep the FAILED state
                if let Err(err) = self.shared.conn.rollback().await {
                    warn!(id = %self.shared.id, error = %err, "rollback of failed transaction");
                }
                drop(core);
                let _ = self.manager.active.remove(&self.shared.id);
                return Ok(());
            }
            _ => return Ok(()),
        }
        self.shared.conn.rollback().await?;
        core.state = TxnState::RolledBack;
        drop(core);
        let _ = self.manager.active.remove(&self.shared.id);
        self.manager
            .events
            .emit(Event::TransactionRolledBack { id: self.shared.id });
        Ok(())
    }

    fn ensure_active(&self, core: &TxnCore) -> Result<()> {
        if core.state == TxnState::Active {
            Ok(())
        } else {
            Err(TxnInactive {
                id: self.shared.id.to_string(),
                state: core.state,
            }
            .into())
        }
    }
}
