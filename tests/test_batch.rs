// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Batch executor integration tests

use crate::common::{default_coordinator, drain_events};
use anyhow::Result;
use rukuzu::{
    Admin, Batch, BatchConfigBuilder, BatchOp, Event, Params, ProgressHook, Row,
};
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn insert_ops(count: usize) -> Vec<BatchOp> {
    (0..count)
        .map(|idx| {
            let mut data = Row::new();
            let _ = data.insert("id".to_string(), json!(idx));
            BatchOp::Insert {
                table: "CodeEntity".to_string(),
                data,
            }
        })
        .collect()
}

#[tokio::test]
async fn hundred_inserts_come_back_in_submission_order() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;

    let outcome = coordinator
        .execute_batch(
            insert_ops(100),
            BatchConfigBuilder::default()
                .batch_size(10)
                .max_concurrency(4)
                .build()?,
        )
        .await?;

    assert_eq!(*outcome.status(), rukuzu::BatchStatus::Completed);
    assert_eq!(outcome.results().len(), 100);
    for (position, result) in outcome.results().iter().enumerate() {
        assert_eq!(*result.index(), position);
        assert!(result.success(), "op {} failed: {:?}", position, result.error());
    }
    assert_eq!(engine.table("CodeEntity").len(), 100);
    // every synthesized CREATE reached the engine
    let creates = engine
        .statements()
        .iter()
        .filter(|s| s.starts_with("CREATE (n:CodeEntity"))
        .count();
    assert_eq!(creates, 100);
    coordinator.shutdown().await
}

#[tokio::test]
async fn chunk_count_tracks_the_batch_size_boundary() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;
    let mut events = coordinator.subscribe();

    // exactly one chunk
    let _ = coordinator
        .execute_batch(
            insert_ops(10),
            BatchConfigBuilder::default().batch_size(10).build()?,
        )
        .await?;
    let one = drain_events(&mut events, |e| matches!(e, Event::BatchProgress { .. }));
    assert_eq!(one.len(), 1);

    // one more op, one more chunk
    let _ = coordinator
        .execute_batch(
            insert_ops(11),
            BatchConfigBuilder::default().batch_size(10).build()?,
        )
        .await?;
    let two = drain_events(&mut events, |e| matches!(e, Event::BatchProgress { .. }));
    assert_eq!(two.len(), 2);
    coordinator.shutdown().await
}

#[tokio::test]
async fn progress_hook_sees_each_chunk() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;
    let calls = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&calls);

    let _ = coordinator
        .execute_batch(
            insert_ops(25),
            BatchConfigBuilder::default()
                .batch_size(10)
                .progress(ProgressHook::new(move |progress| {
                    assert!(*progress.percentage() <= 100.0);
                    let _ = counter.fetch_add(1, Ordering::SeqCst);
                }))
                .build()?,
        )
        .await?;
    assert_eq!(calls.load(Ordering::SeqCst), 3);
    coordinator.shutdown().await
}

#[tokio::test]
async fn transient_chunk_failure_is_retried() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.fail("Rule", "TEMPORARY_FAILURE: induced", 1);

    let ops = vec![BatchOp::Query {
        query: "MATCH (r:Rule) RETURN r".to_string(),
        params: Params::new(),
    }];
    let outcome = coordinator
        .execute_batch(
            ops,
            BatchConfigBuilder::default()
                .retry_attempts(2)
                .retry_delay(Duration::from_millis(5))
                .build()?,
        )
        .await?;
    assert!(outcome.results()[0].success());
    coordinator.shutdown().await
}

#[tokio::test]
async fn exhausted_retries_mark_the_whole_chunk_failed() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.fail("Rule", "TEMPORARY_FAILURE: induced", 10);

    let ops = vec![
        BatchOp::Query {
            query: "MATCH (r:Rule) RETURN r".to_string(),
            params: Params::new(),
        },
        BatchOp::Query {
            query: "MATCH (q:Rule) RETURN q".to_string(),
            params: Params::new(),
        },
    ];
    let outcome = coordinator
        .execute_batch(
            ops,
            BatchConfigBuilder::default()
                .batch_size(2)
                .retry_attempts(1)
                .retry_delay(Duration::from_millis(5))
                .build()?,
        )
        .await?;
    assert_eq!(*outcome.failed(), 2);
    for result in outcome.results() {
        assert!(result
            .error()
            .map_or(false, |msg| msg.contains("TEMPORARY_FAILURE")));
    }
    coordinator.shutdown().await
}

#[tokio::test]
async fn transactional_chunk_rolls_back_as_a_unit() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;

    let ops = vec![
        BatchOp::Insert {
            table: "Rule".to_string(),
            data: {
                let mut data = Row::new();
                let _ = data.insert("id".to_string(), json!(1));
                data
            },
        },
        // the keyword gate rejects this op, poisoning the chunk
        BatchOp::Query {
            query: "GRANT ALL TO nobody".to_string(),
            params: Params::new(),
        },
    ];
    let outcome = coordinator
        .execute_batch(
            ops,
            BatchConfigBuilder::default()
                .batch_size(2)
                .use_transaction(true)
                .retry_attempts(0)
                .build()?,
        )
        .await?;
    assert_eq!(*outcome.failed(), 2);
    assert!(engine.table("Rule").is_empty(), "chunk must roll back whole");
    coordinator.shutdown().await
}

#[tokio::test]
async fn cancellation_drops_queued_chunks() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.set_latency(Duration::from_millis(30));
    let mut events = coordinator.subscribe();

    let runner = coordinator.clone();
    let handle = tokio::spawn(async move {
        runner
            .execute_batch(
                insert_ops(40),
                BatchConfigBuilder::default()
                    .batch_size(2)
                    .max_concurrency(1)
                    .build()?,
            )
            .await
    });

    // wait for the first chunk to report, then cancel
    let batch_id = loop {
        if let Some(Event::BatchProgress { batch_id, .. }) = events.next().await {
            break batch_id;
        }
    };
    assert!(coordinator.cancel_batch(&batch_id));

    let outcome = handle.await??;
    assert_eq!(*outcome.status(), rukuzu::BatchStatus::Cancelled);
    assert!(*outcome.failed() > 0, "queued chunks must be dropped");
    assert!(*outcome.succeeded() > 0, "in-flight work still lands");
    engine.set_latency(Duration::ZERO);
    coordinator.shutdown().await
}
