// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Result stream integration tests

use crate::common::{default_coordinator, seed_entities, wait_for};
use anyhow::Result;
use futures::StreamExt;
use rukuzu::{Admin, Error, StreamChunk, StreamConfigBuilder, Streaming};
use std::time::Duration;

#[tokio::test]
async fn twenty_three_rows_page_as_five_by_five() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    seed_entities(&engine, 23);

    let mut stream = coordinator.create_query_stream(
        StreamConfigBuilder::default()
            .query("MATCH (e:CodeEntity) RETURN e.id")
            .batch_size(5)
            .build()?,
    )?;

    let mut total = 0_usize;
    let mut emissions = 0_usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        // five-row polls are flattened into singletons
        assert!(matches!(chunk, StreamChunk::Single(_)));
        total += chunk.len();
        emissions += 1;
    }
    assert_eq!(total, 23);
    assert_eq!(emissions, 23);

    // the engine saw SKIP/LIMIT pagination
    let pages: Vec<String> = engine
        .statements()
        .iter()
        .filter(|s| s.contains("SKIP"))
        .cloned()
        .collect();
    assert_eq!(pages.len(), 5);
    assert!(pages[0].ends_with("SKIP 0 LIMIT 5"));
    assert!(pages[4].ends_with("SKIP 20 LIMIT 5"));
    coordinator.shutdown().await
}

#[tokio::test]
async fn large_polls_arrive_as_one_payload() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    seed_entities(&engine, 23);

    let mut stream = coordinator.create_query_stream(
        StreamConfigBuilder::default()
            .query("MATCH (e:CodeEntity) RETURN e.id")
            .batch_size(15)
            .build()?,
    )?;

    let first = stream.next().await.expect("first emission")?;
    assert!(matches!(first, StreamChunk::Rows(_)));
    assert_eq!(first.len(), 15);

    // the trailing 8 rows are a short poll, emitted one by one
    let mut tail = 0_usize;
    while let Some(chunk) = stream.next().await {
        let chunk = chunk?;
        assert!(matches!(chunk, StreamChunk::Single(_)));
        tail += chunk.len();
    }
    assert_eq!(tail, 8);
    coordinator.shutdown().await
}

#[tokio::test]
async fn caller_pagination_is_respected() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    seed_entities(&engine, 23);

    let mut stream = coordinator.create_query_stream(
        StreamConfigBuilder::default()
            .query("MATCH (e:CodeEntity) RETURN e.id LIMIT 4")
            .batch_size(10)
            .build()?,
    )?;

    let mut total = 0_usize;
    while let Some(chunk) = stream.next().await {
        total += chunk?.len();
    }
    // one poll, no appended pagination
    assert_eq!(total, 4);
    assert!(!engine.statements().iter().any(|s| s.contains("SKIP")));
    coordinator.shutdown().await
}

#[tokio::test]
async fn poll_deadline_ends_the_stream_with_an_error() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    seed_entities(&engine, 5);
    engine.set_latency(Duration::from_millis(100));

    let mut stream = coordinator.create_query_stream(
        StreamConfigBuilder::default()
            .query("MATCH (e:CodeEntity) RETURN e.id")
            .batch_size(5)
            .timeout(Duration::from_millis(20))
            .build()?,
    )?;

    let err = stream
        .next()
        .await
        .expect("an item must arrive")
        .expect_err("the poll deadline must fire");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Timeout { .. })
    ));
    // the stream is terminal now
    assert!(stream.next().await.is_none());
    engine.set_latency(Duration::ZERO);
    coordinator.shutdown().await
}

#[tokio::test]
async fn dropped_streams_leave_the_registry() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    seed_entities(&engine, 50);

    let stream = coordinator.create_query_stream(
        StreamConfigBuilder::default()
            .query("MATCH (e:CodeEntity) RETURN e.id")
            .batch_size(10)
            .build()?,
    )?;
    assert_eq!(*coordinator.system_status().active_streams(), 1);

    drop(stream);
    let cleared = wait_for(Duration::from_secs(1), || {
        *coordinator.system_status().active_streams() == 0
    })
    .await;
    assert!(cleared, "abandoned streams must not stay active");
    coordinator.shutdown().await
}

#[tokio::test]
async fn streams_are_lazy() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    seed_entities(&engine, 10);
    let before = engine.statements().len();

    let stream = coordinator.create_query_stream(
        StreamConfigBuilder::default()
            .query("MATCH (e:CodeEntity) RETURN e.id")
            .batch_size(5)
            .build()?,
    )?;
    // creating the stream touches nothing
    assert_eq!(engine.statements().len(), before);
    drop(stream);
    coordinator.shutdown().await
}
