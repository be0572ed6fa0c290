// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Transaction manager integration tests

use crate::common::{default_coordinator, rand_name, sweeping_coordinator, wait_for};
use anyhow::Result;
use rukuzu::{
    Admin, Cypher, Error, ErrorStrategy, Event, MockEngine, Params, QueryConfigBuilder,
    Transactional, TxnConfigBuilder, TxnManagerConfigBuilder, TxnOp, TxnState,
};
use rukuzu::{Coordinator, CoordinatorBuilder};
use std::sync::Arc;
use std::time::Duration;

fn create_rule(id: &str) -> TxnOp {
    TxnOp::new(
        format!("CREATE (r:Rule {{id: '{}'}}) RETURN r", id),
        Params::new(),
    )
}

fn bad_op() -> TxnOp {
    // rejected by the keyword gate, so the operation fails mid-txn
    TxnOp::new("GRANT ALL TO nobody", Params::new())
}

async fn read_rules(coordinator: &Coordinator) -> Result<usize> {
    let outcome = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("MATCH (r:Rule) RETURN r")
                .bypass_cache(true)
                .build()?,
        )
        .await?;
    Ok(outcome.row_count())
}

#[tokio::test]
async fn rollback_strategy_leaves_nothing_behind() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;

    let ops = vec![create_rule("one"), bad_op(), create_rule("three")];
    let result = coordinator
        .execute_transaction(
            ops,
            TxnConfigBuilder::default()
                .strategy(ErrorStrategy::Rollback)
                .build()?,
        )
        .await;
    assert!(result.is_err());
    assert_eq!(read_rules(&coordinator).await?, 0);
    coordinator.shutdown().await
}

#[tokio::test]
async fn continue_strategy_keeps_the_good_operations() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;

    let ops = vec![create_rule("one"), bad_op(), create_rule("three")];
    let outcome = coordinator
        .execute_transaction(
            ops,
            TxnConfigBuilder::default()
                .strategy(ErrorStrategy::Continue)
                .build()?,
        )
        .await?;
    assert_eq!(*outcome.state(), TxnState::Committed);
    assert_eq!(outcome.succeeded(), 2);
    assert!(outcome.results()[0].success());
    assert!(!outcome.results()[1].success());
    assert!(outcome.results()[2].success());
    assert_eq!(read_rules(&coordinator).await?, 2);
    coordinator.shutdown().await
}

#[tokio::test]
async fn retry_strategy_absorbs_transient_failures() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.fail("Rule", "LOCK_TIMEOUT: induced", 1);

    let outcome = coordinator
        .execute_transaction(
            vec![create_rule("one")],
            TxnConfigBuilder::default()
                .strategy(ErrorStrategy::Retry)
                .build()?,
        )
        .await?;
    assert_eq!(*outcome.state(), TxnState::Committed);
    assert_eq!(read_rules(&coordinator).await?, 1);
    coordinator.shutdown().await
}

#[tokio::test]
async fn timeout_sweeper_force_rolls_back() -> Result<()> {
    let (_engine, coordinator) =
        sweeping_coordinator(Duration::from_millis(50), Duration::from_secs(60)).await?;
    let mut events = coordinator.subscribe();

    let txn = coordinator
        .begin_transaction(
            TxnConfigBuilder::default()
                .timeout(Duration::from_millis(100))
                .build()?,
        )
        .await?;
    let _ = txn
        .query("CREATE (r:Rule {id: 'doomed'}) RETURN r", &Params::new())
        .await?;

    // the sweeper fires within a few intervals
    let swept = wait_for(Duration::from_secs(3), || {
        *coordinator.system_status().active_transactions() == 0
    })
    .await;
    assert!(swept, "the sweeper must remove the expired transaction");
    assert_eq!(txn.state().await, TxnState::RolledBack);

    let mut saw_force_rollback = false;
    while let Some(event) = events.try_next() {
        if let Event::TransactionForceRollback { reason, .. } = event {
            assert_eq!(reason, "timeout");
            saw_force_rollback = true;
        }
    }
    assert!(saw_force_rollback);

    // the handle is dead now
    let err = txn
        .query("MATCH (r:Rule) RETURN r", &Params::new())
        .await
        .expect_err("swept transactions accept nothing");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::TxnInactive { .. })
    ));
    assert_eq!(read_rules(&coordinator).await?, 0);
    coordinator.shutdown().await
}

#[tokio::test]
async fn active_cap_is_exact() -> Result<()> {
    let engine = MockEngine::new();
    let coordinator = CoordinatorBuilder::default()
        .engine(Arc::new(engine))
        .txn(TxnManagerConfigBuilder::default().max_active(2).build()?)
        .build()
        .await?;

    let first = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await?;
    let second = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await?;
    let err = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await
        .expect_err("the cap is exact");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ResourceExhausted { .. })
    ));

    first.rollback().await?;
    second.rollback().await?;
    // capacity is released by terminal transactions
    let third = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await?;
    third.rollback().await?;
    coordinator.shutdown().await
}

#[tokio::test]
async fn savepoint_identities() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;
    let txn = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await?;

    // create + rollback-to with no statements in between is a no-op
    let anchor = rand_name();
    txn.create_savepoint(&anchor).await?;
    let before = txn.applied().await;
    txn.rollback_to_savepoint(&anchor).await?;
    assert_eq!(txn.applied().await, before);
    assert_eq!(txn.state().await, TxnState::Active);

    // releasing an unknown savepoint succeeds quietly
    txn.release_savepoint("never-created").await?;

    // rolling back to an unknown savepoint fails
    let err = txn
        .rollback_to_savepoint("never-created")
        .await
        .expect_err("unknown savepoints cannot be rolled back to");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::UnknownSavepoint { .. })
    ));

    txn.rollback().await?;
    coordinator.shutdown().await
}

#[tokio::test]
async fn savepoint_rollback_undoes_later_work_only() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;
    let txn = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await?;

    let _ = txn
        .query("CREATE (r:Rule {id: 'keep'}) RETURN r", &Params::new())
        .await?;
    txn.create_savepoint("mid").await?;
    let _ = txn
        .query("CREATE (r:Rule {id: 'drop'}) RETURN r", &Params::new())
        .await?;
    txn.rollback_to_savepoint("mid").await?;
    txn.commit().await?;

    assert_eq!(read_rules(&coordinator).await?, 1);
    coordinator.shutdown().await
}

#[tokio::test]
async fn terminal_transactions_reject_mutations() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;
    let txn = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await?;
    txn.commit().await?;

    assert!(txn.query("RETURN 1", &Params::new()).await.is_err());
    assert!(txn.create_savepoint("late").await.is_err());
    assert!(txn.commit().await.is_err());
    // rollback after commit is a harmless no-op
    txn.rollback().await?;
    coordinator.shutdown().await
}

#[tokio::test]
async fn transactional_reads_skip_the_result_cache() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.insert_row("Rule", {
        let mut row = rukuzu::Row::new();
        let _ = row.insert("id".to_string(), serde_json::json!("seed"));
        row
    });

    // warm the cache outside a transaction
    let warmup = QueryConfigBuilder::default()
        .cypher("MATCH (r:Rule) RETURN r")
        .build()?;
    let _ = coordinator.query(warmup.clone()).await?;
    let cached = coordinator.query(warmup).await?;
    assert!(cached.cached());

    let calls_before = engine
        .statements()
        .iter()
        .filter(|s| s.contains("MATCH"))
        .count();
    let txn = coordinator
        .begin_transaction(TxnConfigBuilder::default().build()?)
        .await?;
    let rows = txn.query("MATCH (r:Rule) RETURN r", &Params::new()).await?;
    assert_eq!(rows.len(), 1);
    txn.commit().await?;
    // the transactional read reached the engine despite the warm cache
    let calls_after = engine
        .statements()
        .iter()
        .filter(|s| s.contains("MATCH"))
        .count();
    assert_eq!(calls_after, calls_before + 1);
    coordinator.shutdown().await
}

#[tokio::test]
async fn deadlock_detector_raises_an_alert_only() -> Result<()> {
    let (_engine, coordinator) =
        sweeping_coordinator(Duration::from_millis(50), Duration::from_millis(80)).await?;
    let mut events = coordinator.subscribe();

    let first = coordinator
        .begin_transaction(
            TxnConfigBuilder::default()
                .timeout(Duration::from_secs(60))
                .build()?,
        )
        .await?;
    let second = coordinator
        .begin_transaction(
            TxnConfigBuilder::default()
                .timeout(Duration::from_secs(60))
                .build()?,
        )
        .await?;

    let detected = wait_for(Duration::from_secs(3), || {
        let mut saw = false;
        while let Some(event) = events.try_next() {
            if matches!(event, Event::DeadlockDetected { .. }) {
                saw = true;
            }
        }
        saw
    })
    .await;
    assert!(detected, "two stuck transactions must raise the alert");

    // alert only: both transactions are still alive
    assert_eq!(first.state().await, TxnState::Active);
    assert_eq!(second.state().await, TxnState::Active);
    first.rollback().await?;
    second.rollback().await?;
    coordinator.shutdown().await
}
