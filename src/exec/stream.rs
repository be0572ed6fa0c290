// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Paginated result streams
//!
//! A stream polls the engine with `SKIP offset LIMIT batch_size` pages
//! and hands rows to the consumer with back-pressure: nothing is fetched
//! until the consumer polls.  Streams are single-use; finished and
//! abandoned records are reaped hourly.

use crate::error::RukuzuErr::Timeout;
use crate::event::Event;
use crate::exec::ExecCtx;
use crate::model::stream::input::Config;
use crate::model::stream::output::Chunk;
use crate::model::StreamStatus;
use crate::validate::inline::inline;
use anyhow::Result;
use dashmap::DashMap;
use futures::stream::{self, Stream};
use std::collections::VecDeque;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tracing::debug;
use uuid::Uuid;

/// Polls returning at most this many rows are flattened into singleton
/// emissions
const SINGLETON_CUTOFF: usize = 10;
/// Records idle longer than this are reaped once no longer active
const REAP_AGE: Duration = Duration::from_secs(60 * 60);

#[derive(Clone, Debug)]
pub(crate) struct StreamRecord {
    pub(crate) status: StreamStatus,
    pub(crate) rows_emitted: u64,
    pub(crate) last_activity: Instant,
}

/// Live and recently finished streams
#[derive(Debug, Default)]
pub(crate) struct StreamRegistry {
    streams: DashMap<Uuid, StreamRecord>,
}

impl StreamRegistry {
    pub(crate) fn active_count(&self) -> usize {
        self.streams
            .iter()
            .filter(|entry| entry.status == StreamStatus::Active)
            .count()
    }

    fn set_status(&self, id: &Uuid, status: StreamStatus) {
        if let Some(mut record) = self.streams.get_mut(id) {
            record.status = status;
            record.last_activity = Instant::now();
        }
    }

    fn touch(&self, id: &Uuid, emitted: usize) {
        if let Some(mut record) = self.streams.get_mut(id) {
            record.rows_emitted += emitted as u64;
            record.last_activity = Instant::now();
        }
    }

    /// Drop non-active records idle past the reap age; called hourly
    pub(crate) fn reap(&self) -> usize {
        let before = self.streams.len();
        self.streams.retain(|_, record| {
            record.status == StreamStatus::Active || record.last_activity.elapsed() < REAP_AGE
        });
        before - self.streams.len()
    }

    #[cfg(test)]
    pub(crate) fn status_of(&self, id: &Uuid) -> Option<StreamStatus> {
        self.streams.get(id).map(|record| record.status)
    }
}

struct PollState {
    ctx: ExecCtx,
    registry: Arc<StreamRegistry>,
    id: Uuid,
    base_query: String,
    paginate: bool,
    batch_size: usize,
    timeout: Duration,
    offset: usize,
    exhausted: bool,
    pending: VecDeque<Chunk>,
}

/// A lazy, finite, single-use sequence of result rows
pub struct ResultStream {
    id: Uuid,
    registry: Arc<StreamRegistry>,
    inner: Pin<Box<dyn Stream<Item = Result<Chunk>> + Send>>,
}

impl std::fmt::Debug for ResultStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ResultStream").field("id", &self.id).finish()
    }
}

impl ResultStream {
    ///
    #[must_use]
    pub fn id(&self) -> &Uuid {
        &self.id
    }
}

impl Stream for ResultStream {
    type Item = Result<Chunk>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        self.inner.as_mut().poll_next(cx)
    }
}

impl Drop for ResultStream {
    fn drop(&mut self) {
        // a consumer that stops reading cancels the stream
        if let Some(record) = self.registry.streams.get(&self.id) {
            if record.status == StreamStatus::Active {
                drop(record);
                self.registry.set_status(&self.id, StreamStatus::Completed);
            }
        }
    }
}

/// Create a stream.  The query is validated and optimized once; every
/// poll appends `SKIP`/`LIMIT` unless the caller supplied their own.
pub(crate) fn create(
    ctx: ExecCtx,
    registry: Arc<StreamRegistry>,
    config: Config,
) -> Result<ResultStream> {
    let verdict = ctx.validator.validate(config.query(), config.params());
    if !verdict.valid() {
        return Err(crate::error::RukuzuErr::Validation {
            query_id: "stream".to_string(),
            errors: verdict.errors().clone(),
            risk: *verdict.risk(),
        }
        .into());
    }
    let (plan, _hit) = ctx.optimizer.optimize(verdict.cypher(), verdict.params());
    let base_query = inline(plan.optimized(), verdict.params())?;
    let paginate = !has_pagination(&base_query);

    let id = Uuid::new_v4();
    registry.streams.insert(
        id,
        StreamRecord {
            status: StreamStatus::Active,
            rows_emitted: 0,
            last_activity: Instant::now(),
        },
    );
    debug!(stream_id = %id, paginate, "stream created");

    let state = PollState {
        ctx,
        registry: Arc::clone(&registry),
        id,
        base_query,
        paginate,
        batch_size: *config.batch_size(),
        timeout: *config.timeout(),
        offset: 0,
        exhausted: false,
        pending: VecDeque::new(),
    };

    let inner = stream::try_unfold(state, |mut state| async move {
        loop {
            if let Some(chunk) = state.pending.pop_front() {
                return Ok(Some((chunk, state)));
            }
            if state.exhausted {
                state
                    .registry
                    .set_status(&state.id, StreamStatus::Completed);
                state.ctx.events.emit(Event::StreamEnd { stream_id: state.id });
                return Ok(None);
            }

            let page = if state.paginate {
                format!(
                    "{} SKIP {} LIMIT {}",
                    state.base_query, state.offset, state.batch_size
                )
            } else {
                state.base_query.clone()
            };

            let rows = match tokio::time::timeout(state.timeout, state.ctx.conn.run(&page)).await
            {
                Ok(Ok(rows)) => rows,
                Ok(Err(err)) => {
                    state.registry.set_status(&state.id, StreamStatus::Error);
                    state.ctx.events.emit(Event::StreamError {
                        stream_id: state.id,
                        error: format!("{:#}", err),
                    });
                    return Err(err);
                }
                Err(_elapsed) => {
                    state.registry.set_status(&state.id, StreamStatus::Error);
                    let err = Timeout {
                        query_id: state.id.to_string(),
                        waited_ms: state.timeout.as_millis() as u64,
                    };
                    state.ctx.events.emit(Event::StreamError {
                        stream_id: state.id,
                        error: format!("{}", err),
                    });
                    return Err(err.into());
                }
            };

            if rows.len() < state.batch_size || !state.paginate {
                state.exhausted = true;
            }
            state.offset += rows.len();
            if rows.is_empty() {
                continue;
            }
            state.registry.touch(&state.id, rows.len());
            state.ctx.events.emit(Event::StreamData {
                stream_id: state.id,
                rows: rows.len(),
            });
            if rows.len() <= SINGLETON_CUTOFF {
                state.pending.extend(rows.into_iter().map(Chunk::Single));
            } else {
                state.pending.push_back(Chunk::Rows(rows));
            }
        }
    });

    Ok(ResultStream {
        id,
        registry,
        inner: Box::pin(inner),
    })
}

/// Whether the query already carries its own SKIP or LIMIT clause
fn has_pagination(query: &str) -> bool {
    crate::optimize::analysis::clauses(query)
        .iter()
        .any(|c| c.keyword == "SKIP" || c.keyword == "LIMIT")
}

#[cfg(test)]
mod test {
    use super::has_pagination;

    #[test]
    fn pagination_detection() {
        assert!(!has_pagination("MATCH (e:CodeEntity) RETURN e.id"));
        assert!(has_pagination("MATCH (e) RETURN e LIMIT 10"));
        assert!(has_pagination("MATCH (e) RETURN e SKIP 5"));
        // a LIMIT inside a string literal does not count
        assert!(!has_pagination("MATCH (e) WHERE e.note = 'LIMIT 5' RETURN e"));
    }
}
