// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Per-query pipeline integration tests

use crate::common::{default_coordinator, drain_events, entity_row};
use anyhow::Result;
use rukuzu::{
    Admin, Coordinator, CoordinatorBuilder, Cypher, Error, Event, MockEngine, Params,
    QueryConfigBuilder, RateLimitConfigBuilder, Severity, Template, ValidationConfigBuilder,
};
use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

const TYPED_READ: &str = "MATCH (e:CodeEntity) WHERE e.type = $t RETURN e.name";

fn typed_params() -> Params {
    let mut params = Params::new();
    let _ = params.insert("t".to_string(), json!("function"));
    params
}

async fn read_typed(coordinator: &Coordinator) -> Result<rukuzu::query::output::Outcome> {
    coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher(TYPED_READ)
                .params(typed_params())
                .build()?,
        )
        .await
}

#[tokio::test]
async fn cold_read_then_warm_read() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.insert_row("CodeEntity", entity_row("parse", "function"));
    engine.insert_row("CodeEntity", entity_row("Config", "class"));

    let cold = read_typed(&coordinator).await?;
    assert!(!cold.cached());
    assert_eq!(cold.row_count(), 1);
    assert_eq!(cold.rows()[0].get("e.name"), Some(&json!("parse")));

    let engine_calls_before = engine
        .statements()
        .iter()
        .filter(|s| s.contains("MATCH"))
        .count();

    let warm = read_typed(&coordinator).await?;
    assert!(warm.cached());
    assert_eq!(warm.rows(), cold.rows());

    // the warm read never reached the engine
    let engine_calls_after = engine
        .statements()
        .iter()
        .filter(|s| s.contains("MATCH"))
        .count();
    assert_eq!(engine_calls_before, engine_calls_after);

    coordinator.shutdown().await
}

#[tokio::test]
async fn spacing_and_case_variants_share_the_cache_slot() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.insert_row("CodeEntity", entity_row("parse", "function"));

    let first = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("MATCH (e:CodeEntity)   WHERE e.type = $t RETURN e.name")
                .params(typed_params())
                .build()?,
        )
        .await?;
    assert!(!first.cached());

    let second = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("match (e:CodeEntity) where e.type = $t return e.name")
                .params(typed_params())
                .build()?,
        )
        .await?;
    assert!(second.cached());
    coordinator.shutdown().await
}

#[tokio::test]
async fn stacked_ddl_is_rejected_before_the_engine() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    let mut events = coordinator.subscribe();

    let result = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("MATCH (n) RETURN n; DROP TABLE Pattern")
                .build()?,
        )
        .await;

    let err = result.expect_err("stacked DDL must be rejected");
    match err.downcast_ref::<Error>() {
        Some(Error::InjectionDetected { pattern, .. }) => {
            assert_eq!(pattern, "stacked ddl statement");
        }
        other => panic!("unexpected error: {:?}", other),
    }

    // no engine call was attempted for the poisoned query
    assert!(!engine.statements().iter().any(|s| s.contains("DROP")));

    // a critical security alert was emitted
    let alerts = drain_events(&mut events, |event| {
        matches!(event, Event::PerformanceAlert { .. })
    });
    let critical = alerts.iter().any(|event| match event {
        Event::PerformanceAlert { alert } => {
            alert.kind() == "security_threat" && *alert.severity() == Severity::Critical
        }
        _ => false,
    });
    assert!(critical, "expected a critical security_threat alert");
    coordinator.shutdown().await
}

#[tokio::test]
async fn query_length_boundary_is_exact() -> Result<()> {
    let engine = MockEngine::new();
    let coordinator = CoordinatorBuilder::default()
        .engine(Arc::new(engine))
        .validation(ValidationConfigBuilder::default().max_query_length(26).build()?)
        .build()
        .await?;

    let at_cap = "MATCH (n:Rule) RETURN n --";
    assert_eq!(at_cap.len(), 26);
    // length passes at the cap; the comment is a separate rejection
    let err = coordinator
        .query(QueryConfigBuilder::default().cypher(at_cap).build()?)
        .await
        .expect_err("comment still rejects");
    assert!(!format!("{:#}", err).contains("query length"));

    let over = "MATCH (nn:Rule) RETURN nn -";
    assert_eq!(over.len(), 27);
    let err = coordinator
        .query(QueryConfigBuilder::default().cypher(over).build()?)
        .await
        .expect_err("one byte over the cap fails");
    assert!(format!("{:#}", err).contains("query length"));
    coordinator.shutdown().await
}

#[tokio::test]
async fn rate_limit_rejects_the_overflow_request() -> Result<()> {
    let engine = MockEngine::new();
    let coordinator = CoordinatorBuilder::default()
        .engine(Arc::new(engine))
        .limits(RateLimitConfigBuilder::default().per_minute(2).build()?)
        .build()
        .await?;

    for _ in 0..2 {
        let _ = coordinator
            .query(
                QueryConfigBuilder::default()
                    .cypher("MATCH (r:Rule) RETURN r")
                    .client_id("flooder")
                    .bypass_cache(true)
                    .build()?,
            )
            .await?;
    }
    let err = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("MATCH (r:Rule) RETURN r")
                .client_id("flooder")
                .build()?,
        )
        .await
        .expect_err("third request in the window must be rejected");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::ResourceExhausted { .. })
    ));
    coordinator.shutdown().await
}

#[tokio::test]
async fn per_query_deadline_is_enforced() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.set_latency(Duration::from_millis(200));

    let err = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("MATCH (r:Rule) RETURN r")
                .timeout(Duration::from_millis(40))
                .build()?,
        )
        .await
        .expect_err("the deadline must fire first");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::Timeout { .. })
    ));

    engine.set_latency(Duration::ZERO);
    coordinator.shutdown().await
}

#[tokio::test]
async fn templates_run_through_the_pipeline() -> Result<()> {
    let engine = MockEngine::new();
    engine.insert_row("CodeEntity", entity_row("parse", "function"));
    let coordinator = CoordinatorBuilder::default()
        .engine(Arc::new(engine))
        .templates(vec![Template::new("entities_by_type", TYPED_READ)])
        .build()
        .await?;

    let outcome = coordinator
        .execute_template("entities_by_type", typed_params())
        .await?;
    assert_eq!(outcome.row_count(), 1);

    let err = coordinator
        .execute_template("nope", Params::new())
        .await
        .expect_err("unknown templates fail");
    assert!(matches!(
        err.downcast_ref::<Error>(),
        Some(Error::UnknownTemplate { .. })
    ));
    coordinator.shutdown().await
}

#[tokio::test]
async fn invalidation_then_reexecution_matches_cold_rows() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.insert_row("CodeEntity", entity_row("parse", "function"));

    let cold = read_typed(&coordinator).await?;
    let warm = read_typed(&coordinator).await?;
    assert!(warm.cached());

    let invalidated = coordinator.invalidate_results("");
    assert!(invalidated >= 1);

    let reread = read_typed(&coordinator).await?;
    assert!(!reread.cached());
    assert_eq!(reread.rows(), cold.rows());
    coordinator.shutdown().await
}

#[tokio::test]
async fn writes_bypass_the_result_cache() -> Result<()> {
    let (_engine, coordinator) = default_coordinator().await?;

    let first = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("CREATE (r:Rule {id: 'a'}) RETURN r")
                .build()?,
        )
        .await?;
    assert!(!first.cached());

    let second = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("CREATE (r:Rule {id: 'a'}) RETURN r")
                .build()?,
        )
        .await?;
    assert!(!second.cached(), "writes must never be served from cache");
    coordinator.shutdown().await
}

#[tokio::test]
async fn status_reflects_activity() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.insert_row("CodeEntity", entity_row("parse", "function"));
    let _ = read_typed(&coordinator).await?;
    let _ = read_typed(&coordinator).await?;

    let status = coordinator.system_status();
    assert_eq!(*status.health(), rukuzu::Health::Healthy);
    assert_eq!(*status.active_transactions(), 0);
    assert!(*status.plan_cache_entries() >= 1);
    assert!(*status.result_cache().hits() >= 1);
    coordinator.shutdown().await
}

#[tokio::test]
async fn failed_probe_flips_health_and_fails_fast() -> Result<()> {
    let engine = MockEngine::new();
    let coordinator = CoordinatorBuilder::default()
        .engine(Arc::new(engine.clone()))
        .config(
            rukuzu::CoordinatorConfigBuilder::default()
                .health_interval(Duration::from_millis(50))
                .build()?,
        )
        .build()
        .await?;

    // every further probe fails
    engine.fail("RETURN 1", "CONNECTION_LOST: induced", 1_000);

    let flipped = crate::common::wait_for(Duration::from_secs(3), || {
        *coordinator.system_status().health() == rukuzu::Health::Unhealthy
    })
    .await;
    assert!(flipped, "the health check must observe the dead engine");

    // non-transactional queries now fail fast, before the engine
    let reads_before = engine
        .statements()
        .iter()
        .filter(|s| s.contains("MATCH"))
        .count();
    let err = coordinator
        .query(
            QueryConfigBuilder::default()
                .cypher("MATCH (r:Rule) RETURN r")
                .build()?,
        )
        .await
        .expect_err("queries must fail fast while unhealthy");
    assert!(matches!(err.downcast_ref::<Error>(), Some(Error::Fatal { .. })));
    let reads_after = engine
        .statements()
        .iter()
        .filter(|s| s.contains("MATCH"))
        .count();
    assert_eq!(reads_after, reads_before);
    coordinator.shutdown().await
}

#[tokio::test]
async fn report_covers_recent_queries() -> Result<()> {
    let (engine, coordinator) = default_coordinator().await?;
    engine.insert_row("CodeEntity", entity_row("parse", "function"));
    let _ = read_typed(&coordinator).await?;
    let _ = read_typed(&coordinator).await?;

    let report = coordinator.performance_report(
        chrono::Utc::now() - chrono::Duration::minutes(5),
        chrono::Utc::now(),
    );
    assert_eq!(*report.summary().total(), 2);
    assert_eq!(*report.summary().cache_hits(), 1);
    assert_eq!(report.components().len(), 1);
    coordinator.shutdown().await
}
