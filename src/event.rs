// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Coordinator event channel
//!
//! Every observable lifecycle event flows through a single bounded
//! broadcast channel owned by the coordinator.  Subscribers that fall
//! behind lose the oldest events rather than blocking the hot path.

use crate::model::{report::Alert, report::MetricSample, Health};
use tokio::sync::broadcast::{self, error::RecvError, Receiver, Sender};
use tracing::warn;
use uuid::Uuid;

/// Everything the coordinator and its subsystems announce
#[derive(Clone, Debug)]
#[non_exhaustive]
pub enum Event {
    /// A rewrite pass produced a plan for a previously unseen signature
    QueryOptimized {
        ///
        signature: String,
        ///
        rules_applied: Vec<String>,
    },
    /// A query was served from the result cache
    CacheHit {
        ///
        signature: String,
    },
    /// A query's rows were inserted into the result cache
    ResultCached {
        ///
        signature: String,
    },
    /// Execution time crossed the slow-query threshold
    SlowQuery {
        ///
        sample: MetricSample,
    },
    /// A monitor alert condition fired
    PerformanceAlert {
        ///
        alert: Alert,
    },
    ///
    TransactionStarted {
        ///
        id: Uuid,
    },
    ///
    TransactionCommitted {
        ///
        id: Uuid,
    },
    ///
    TransactionRolledBack {
        ///
        id: Uuid,
    },
    /// The sweeper rolled a transaction back without the owner's consent
    TransactionForceRollback {
        ///
        id: Uuid,
        ///
        reason: String,
    },
    /// More than one transaction exceeded the deadlock window
    DeadlockDetected {
        ///
        ids: Vec<Uuid>,
    },
    ///
    BatchProgress {
        ///
        batch_id: Uuid,
        ///
        completed: usize,
        ///
        total: usize,
        ///
        percentage: f64,
    },
    ///
    BatchCompleted {
        ///
        batch_id: Uuid,
    },
    ///
    BatchFailed {
        ///
        batch_id: Uuid,
        ///
        error: String,
    },
    /// A stream poll handed rows to the consumer
    StreamData {
        ///
        stream_id: Uuid,
        ///
        rows: usize,
    },
    ///
    StreamEnd {
        ///
        stream_id: Uuid,
    },
    ///
    StreamError {
        ///
        stream_id: Uuid,
        ///
        error: String,
    },
    /// The periodic health check ran
    HealthCheck {
        ///
        health: Health,
    },
    ///
    SystemInitialized,
    ///
    SystemShutdown,
}

/// Bounded fan-out channel for [`Event`]s
#[derive(Clone, Debug)]
pub struct EventBus {
    tx: Sender<Event>,
}

impl EventBus {
    /// Create a bus retaining at most `capacity` undelivered events per
    /// subscriber
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity.max(1));
        Self { tx }
    }

    /// Publish an event.  Delivery is best-effort: with no subscribers the
    /// event is dropped silently, and a lagging subscriber loses the
    /// oldest events first.
    pub fn emit(&self, event: Event) {
        let _ = self.tx.send(event);
    }

    /// Attach a new subscriber
    #[must_use]
    pub fn subscribe(&self) -> EventStream {
        EventStream {
            rx: self.tx.subscribe(),
        }
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new(256)
    }
}

/// A single subscriber's view of the event channel
#[derive(Debug)]
pub struct EventStream {
    rx: Receiver<Event>,
}

impl EventStream {
    /// Wait for the next event.  Returns `None` once the coordinator has
    /// shut down and the channel is drained.  Lag is logged and skipped.
    pub async fn next(&mut self) -> Option<Event> {
        loop {
            match self.rx.recv().await {
                Ok(event) => return Some(event),
                Err(RecvError::Closed) => return None,
                Err(RecvError::Lagged(missed)) => {
                    warn!(missed, "event subscriber lagging, dropping events");
                }
            }
        }
    }

    /// Non-blocking poll used by tests and status endpoints
    pub fn try_next(&mut self) -> Option<Event> {
        loop {
            match self.rx.try_recv() {
                Ok(event) => return Some(event),
                Err(broadcast::error::TryRecvError::Lagged(missed)) => {
                    warn!(missed, "event subscriber lagging, dropping events");
                }
                Err(_) => return None,
            }
        }
    }
}
