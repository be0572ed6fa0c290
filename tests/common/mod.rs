// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Common functionality for Integration Tests

use anyhow::Result;
use rand::{distributions::Alphanumeric, thread_rng, Rng};
use rukuzu::{Coordinator, CoordinatorBuilder, Event, EventStream, MockEngine, Row};
use serde_json::json;
use std::iter;
use std::sync::{Arc, Once};
use std::time::Duration;

static TRACING: Once = Once::new();

fn init_tracing() {
    TRACING.call_once(|| {
        let _ = tracing_subscriber::fmt()
            .with_max_level(tracing::Level::INFO)
            .with_test_writer()
            .try_init();
    });
}

/// A coordinator over a fresh mock engine with default settings
pub async fn default_coordinator() -> Result<(MockEngine, Coordinator)> {
    init_tracing();
    let engine = MockEngine::new();
    let coordinator = CoordinatorBuilder::default()
        .engine(Arc::new(engine.clone()))
        .build()
        .await?;
    Ok((engine, coordinator))
}

/// A random lowercase identifier for test fixtures
pub fn rand_name() -> String {
    let mut rng = thread_rng();
    iter::repeat(())
        .map(|_| rng.sample(Alphanumeric))
        .map(char::from)
        .take(10)
        .collect::<String>()
        .to_lowercase()
}

/// A coordinator whose background sweepers run fast enough for tests
pub async fn sweeping_coordinator(
    txn_sweep: Duration,
    deadlock_timeout: Duration,
) -> Result<(MockEngine, Coordinator)> {
    init_tracing();
    let engine = MockEngine::new();
    let coordinator = CoordinatorBuilder::default()
        .engine(Arc::new(engine.clone()))
        .txn(
            rukuzu::TxnManagerConfigBuilder::default()
                .sweep_interval(txn_sweep)
                .deadlock_interval(txn_sweep)
                .deadlock_timeout(deadlock_timeout)
                .build()?,
        )
        .build()
        .await?;
    Ok((engine, coordinator))
}

/// One CodeEntity row with the fields the scenarios filter on
pub fn entity_row(name: &str, kind: &str) -> Row {
    let mut row = Row::new();
    let _ = row.insert("name".to_string(), json!(name));
    let _ = row.insert("type".to_string(), json!(kind));
    row
}

/// Seed `count` committed CodeEntity rows straight into the engine
pub fn seed_entities(engine: &MockEngine, count: usize) {
    for idx in 0..count {
        let mut row = Row::new();
        let _ = row.insert("id".to_string(), json!(idx));
        engine.insert_row("CodeEntity", row);
    }
}

/// Drain pending events, returning those matching the filter
pub fn drain_events<F>(sub: &mut EventStream, keep: F) -> Vec<Event>
where
    F: Fn(&Event) -> bool,
{
    let mut out = Vec::new();
    while let Some(event) = sub.try_next() {
        if keep(&event) {
            out.push(event);
        }
    }
    out
}

/// Wait until the condition holds or the deadline passes
pub async fn wait_for<F>(deadline: Duration, mut condition: F) -> bool
where
    F: FnMut() -> bool,
{
    let started = std::time::Instant::now();
    while started.elapsed() < deadline {
        if condition() {
            return true;
        }
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
    condition()
}
