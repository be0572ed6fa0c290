// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Batch executor
//!
//! Operations are split into fixed-size chunks and pushed through a
//! semaphore, so at most `max_concurrency` chunks touch the engine at
//! once.  Whatever order chunks finish in, the returned results are
//! stable-ordered by the caller's original operation index.

use crate::error::RukuzuErr::BatchCancelled;
use crate::event::Event;
use crate::exec::ExecCtx;
use crate::model::batch::input::{Config, Op, ProgressHook};
use crate::model::batch::output::{OpOutcome, Outcome, Progress};
use crate::model::report::MetricSample;
use crate::model::BatchStatus;
use crate::types::{Params, RowVec};
use crate::validate::inline::inline;
use anyhow::Result;
use dashmap::DashMap;
use libeither::Either;
use std::sync::atomic::{AtomicBool, AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Instant;
use tokio::sync::Semaphore;
use tokio::time::sleep;
use tracing::{debug, warn};
use uuid::Uuid;

/// Process-wide counter backing synthesized parameter names, so names
/// never collide across concurrently built queries
static PARAM_COUNTER: AtomicU64 = AtomicU64::new(0);

#[derive(Debug)]
struct Job {
    cancelled: AtomicBool,
    completed: AtomicUsize,
    total: usize,
}

/// Running batch jobs, for cancellation and status
#[derive(Debug, Default)]
pub(crate) struct BatchRegistry {
    jobs: DashMap<Uuid, Arc<Job>>,
}

impl BatchRegistry {
    pub(crate) fn running(&self) -> usize {
        self.jobs.len()
    }

    /// Mark a batch cancelled: in-flight chunks finish, queued chunks
    /// are dropped.  Returns false for unknown ids.
    pub(crate) fn cancel(&self, id: &Uuid) -> bool {
        match self.jobs.get(id) {
            Some(job) => {
                job.cancelled.store(true, Ordering::SeqCst);
                true
            }
            None => false,
        }
    }
}

pub(crate) async fn execute(
    ctx: &ExecCtx,
    registry: &Arc<BatchRegistry>,
    ops: Vec<Op>,
    config: Config,
) -> Result<Outcome> {
    let batch_id = Uuid::new_v4();
    let total = ops.len();
    let job = Arc::new(Job {
        cancelled: AtomicBool::new(false),
        completed: AtomicUsize::new(0),
        total,
    });
    registry.jobs.insert(batch_id, Arc::clone(&job));
    let started = Instant::now();

    let semaphore = Arc::new(Semaphore::new(*config.max_concurrency()));
    let fallback_ops = ops.clone();
    let mut tasks = Vec::new();
    for (chunk_idx, chunk) in ops.chunks(*config.batch_size()).enumerate() {
        let base = chunk_idx * *config.batch_size();
        let chunk: Vec<Op> = chunk.to_vec();
        let semaphore = Arc::clone(&semaphore);
        let job = Arc::clone(&job);
        let ctx = ctx.clone();
        let progress = config.progress().clone();
        let retry_attempts = *config.retry_attempts();
        let retry_delay = *config.retry_delay();
        let use_transaction = *config.use_transaction();
        tasks.push(tokio::spawn(async move {
            let _permit = match semaphore.acquire_owned().await {
                Ok(permit) => permit,
                Err(_closed) => return Vec::new(),
            };
            if job.cancelled.load(Ordering::SeqCst) {
                // this chunk never started; drop it with a marker error
                return chunk
                    .into_iter()
                    .enumerate()
                    .map(|(offset, op)| {
                        OpOutcome::failed(
                            base + offset,
                            op,
                            &format!(
                                "{}",
                                BatchCancelled {
                                    id: batch_id.to_string()
                                }
                            ),
                        )
                    })
                    .collect();
            }
            let results =
                run_chunk(&ctx, base, chunk, retry_attempts, retry_delay, use_transaction).await;
            let done = job.completed.fetch_add(results.len(), Ordering::SeqCst) + results.len();
            let update = Progress::new(batch_id, done, job.total);
            if let Some(hook) = &progress {
                hook.call(update);
            }
            ctx.events.emit(Event::BatchProgress {
                batch_id,
                completed: done,
                total: job.total,
                percentage: *update.percentage(),
            });
            results
        }));
    }

    let mut slots: Vec<Option<OpOutcome>> = (0..total).map(|_| None).collect();
    for task in tasks {
        match task.await {
            Ok(outcomes) => {
                for outcome in outcomes {
                    let index = *outcome.index();
                    slots[index] = Some(outcome);
                }
            }
            Err(err) => warn!(batch_id = %batch_id, error = %err, "batch chunk task failed"),
        }
    }
    let results: Vec<OpOutcome> = slots
        .into_iter()
        .enumerate()
        .map(|(index, slot)| {
            slot.unwrap_or_else(|| {
                OpOutcome::failed(index, fallback_ops[index].clone(), "chunk task lost")
            })
        })
        .collect();

    let cancelled = job.cancelled.load(Ordering::SeqCst);
    let failed = results.iter().filter(|r| !r.success()).count();
    let status = if cancelled {
        BatchStatus::Cancelled
    } else if failed == total && total > 0 {
        BatchStatus::Failed
    } else {
        BatchStatus::Completed
    };
    let _ = registry.jobs.remove(&batch_id);

    match status {
        BatchStatus::Failed => ctx.events.emit(Event::BatchFailed {
            batch_id,
            error: "every operation failed".to_string(),
        }),
        _ => ctx.events.emit(Event::BatchCompleted { batch_id }),
    }

    Ok(Outcome::new(
        batch_id,
        status,
        results,
        started.elapsed().as_millis() as u64,
    ))
}

/// Run one chunk, retrying the whole chunk on failure with linear
/// backoff.  After exhausting retries every operation in the chunk is
/// marked failed with the last error.
async fn run_chunk(
    ctx: &ExecCtx,
    base: usize,
    chunk: Vec<Op>,
    retry_attempts: u32,
    retry_delay: std::time::Duration,
    use_transaction: bool,
) -> Vec<OpOutcome> {
    let mut last_error = String::new();
    for attempt in 0..=retry_attempts {
        match try_chunk(ctx, base, &chunk, use_transaction).await {
            Ok(results) => return results,
            Err(err) => {
                last_error = format!("{:#}", err);
                if attempt < retry_attempts {
                    let delay = retry_delay * (attempt + 1);
                    debug!(base, attempt, "chunk failed, retrying");
                    sleep(delay).await;
                }
            }
        }
    }
    chunk
        .into_iter()
        .enumerate()
        .map(|(offset, op)| OpOutcome::failed(base + offset, op, &last_error))
        .collect()
}

/// One attempt at a chunk.  Transactional chunks fail as a unit; in
/// individual mode only a fully failed chunk counts as a chunk failure.
async fn try_chunk(
    ctx: &ExecCtx,
    base: usize,
    chunk: &[Op],
    use_transaction: bool,
) -> Result<Vec<OpOutcome>> {
    if use_transaction && chunk.len() > 1 {
        let txn = ctx.txns.begin(Default::default()).await?;
        let mut results = Vec::with_capacity(chunk.len());
        for (offset, op) in chunk.iter().enumerate() {
            let (query, params) = synthesize(op);
            match txn.query(&query, &params).await {
                Ok(rows) => {
                    results.push(OpOutcome::new(base + offset, op.clone(), Either::new_right(rows)));
                }
                Err(err) => {
                    txn.rollback().await?;
                    return Err(err);
                }
            }
        }
        txn.commit().await?;
        return Ok(results);
    }

    let mut results = Vec::with_capacity(chunk.len());
    let mut failures = 0_usize;
    let mut last_error = String::new();
    for (offset, op) in chunk.iter().enumerate() {
        match run_op(ctx, op).await {
            Ok(rows) => {
                results.push(OpOutcome::new(base + offset, op.clone(), Either::new_right(rows)));
            }
            Err(err) => {
                failures += 1;
                last_error = format!("{:#}", err);
                results.push(OpOutcome::failed(base + offset, op.clone(), &last_error));
            }
        }
    }
    if !chunk.is_empty() && failures == chunk.len() {
        return Err(anyhow::anyhow!("chunk failed as a unit: {}", last_error));
    }
    Ok(results)
}

/// Execute one operation through the validation and optimization
/// pipeline on the shared connection
async fn run_op(ctx: &ExecCtx, op: &Op) -> Result<RowVec> {
    let (query, params) = synthesize(op);
    let verdict = ctx.validator.validate(&query, &params);
    if !verdict.valid() {
        return Err(crate::error::RukuzuErr::Validation {
            query_id: "batch".to_string(),
            errors: verdict.errors().clone(),
            risk: *verdict.risk(),
        }
        .into());
    }
    let (plan, _hit) = ctx.optimizer.optimize(verdict.cypher(), verdict.params());
    let final_query = inline(plan.optimized(), verdict.params())?;
    let started = Instant::now();
    let outcome = ctx.conn.run(&final_query).await;
    ctx.monitor.record(MetricSample::new(
        "batch",
        plan.signature(),
        started.elapsed().as_millis() as u64,
        outcome.as_ref().map(Vec::len).unwrap_or(0),
        false,
        !plan.rules_applied().is_empty(),
        outcome.as_ref().err().map(|e| format!("{:#}", e)),
    ));
    outcome
}

/// Turn an operation into (query, params).  Inserts synthesize a CREATE
/// with fresh globally unique parameter names.
pub(crate) fn synthesize(op: &Op) -> (String, Params) {
    match op {
        Op::Insert { table, data } => {
            let mut params = Params::new();
            let mut assignments = Vec::with_capacity(data.len());
            for (field, value) in data {
                let name = format!("p{}", PARAM_COUNTER.fetch_add(1, Ordering::SeqCst));
                assignments.push(format!("{}: ${}", field, name));
                let _ = params.insert(name, value.clone());
            }
            (
                format!("CREATE (n:{} {{{}}}) RETURN n", table, assignments.join(", ")),
                params,
            )
        }
        Op::Update { query, params } | Op::Query { query, params } => {
            (query.clone(), params.clone())
        }
    }
}
