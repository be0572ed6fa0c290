// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! `rukuzu` coordinator builder

use crate::bootstrap;
use crate::coordinator::{Config as CoordinatorConfig, Coordinator as Coord, Inner, Template};
use crate::error::RukuzuErr::{MissingEngine, Validation};
use crate::event::{Event, EventBus};
use crate::exec::batch::BatchRegistry;
use crate::exec::stream::StreamRegistry;
use crate::limits::{Config as LimitConfig, RateLimiter};
use crate::model::Health;
use crate::monitor::{Config as MonitorConfig, Monitor};
use crate::optimize::cache::{Config as CacheConfig, ResultCache};
use crate::optimize::{Config as OptimizerConfig, Optimizer};
use crate::txn::{Config as TxnConfig, TxnManager};
use crate::validate::{Config as ValidationConfig, Validator};
use crate::engine::Engine;
use anyhow::{Context, Result};
use derive_builder::Builder;
use parking_lot::{Mutex, RwLock};
use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::Instant;
use tracing::info;

/// A `rukuzu` coordinator definition
#[doc(hidden)]
#[derive(Builder, Clone, Debug)]
#[allow(clippy::module_name_repetitions)]
#[builder(build_fn(skip), pattern = "immutable")]
#[allow(dead_code)]
pub struct Coordinator {
    /// The embedded engine to orchestrate
    engine: Arc<dyn Engine>,
    /// Working directory for the auxiliary layout; skipped when absent
    #[builder(setter(into, strip_option), default)]
    working_dir: Option<PathBuf>,
    /// Coordinator knobs: deadlines, health check, event capacity
    #[builder(default)]
    config: CoordinatorConfig,
    ///
    #[builder(default)]
    validation: ValidationConfig,
    ///
    #[builder(default)]
    optimizer: OptimizerConfig,
    ///
    #[builder(default)]
    cache: CacheConfig,
    ///
    #[builder(default)]
    txn: TxnConfig,
    ///
    #[builder(default)]
    monitor: MonitorConfig,
    ///
    #[builder(default)]
    limits: LimitConfig,
    /// Pre-validated query shapes available to `execute_template`
    #[builder(default)]
    templates: Vec<Template>,
}

impl CoordinatorBuilder {
    /// Build the coordinator: open the engine, probe connectivity,
    /// bootstrap fixtures, wire the subsystems, start the sweepers.
    ///
    /// # Errors
    /// A missing engine, an unreachable engine, or an invalid template
    /// fails the build; initialization failure is fatal by design.
    pub async fn build(self) -> Result<Coord> {
        let engine = self.engine.ok_or(MissingEngine)?;
        let config = self.config.unwrap_or_default();
        let validation = self.validation.unwrap_or_default();
        let optimizer_config = self.optimizer.unwrap_or_default();
        let cache_config = self.cache.unwrap_or_default();
        let txn_config = self.txn.unwrap_or_default();
        let monitor_config = self.monitor.unwrap_or_default();
        let limit_config = self.limits.unwrap_or_default();
        let templates = self.templates.unwrap_or_default();

        // open and probe the engine; a failed probe is fatal
        let conn = engine
            .connect()
            .await
            .with_context(|| "Unable to open the engine connection")?;
        let _probe = conn
            .run(config.probe_query())
            .await
            .with_context(|| "Engine connectivity probe failed")?;

        if let Some(Some(dir)) = &self.working_dir {
            bootstrap::ensure_layout(dir)?;
        }
        bootstrap::ensure_schema(&conn).await?;

        let validator = Arc::new(Validator::new(validation));
        let mut registered = HashMap::with_capacity(templates.len());
        for template in templates {
            let verdict = validator.validate(template.cypher(), &crate::types::Params::new());
            if !verdict.valid() {
                return Err(Validation {
                    query_id: format!("template:{}", template.name()),
                    errors: verdict.errors().clone(),
                    risk: *verdict.risk(),
                }
                .into());
            }
            let _old = registered.insert(template.name().clone(), template);
        }

        let events = EventBus::new(*config.event_capacity());
        let optimizer = Arc::new(Optimizer::new(optimizer_config));
        let results = Arc::new(ResultCache::new(cache_config));
        let monitor = Arc::new(Monitor::new(monitor_config, events.clone()));
        let txns = TxnManager::new(
            txn_config,
            Arc::clone(&engine),
            events.clone(),
            Arc::clone(&monitor),
            Arc::clone(&validator),
            Arc::clone(&optimizer),
        );
        let limiter = Arc::new(RateLimiter::new(limit_config));

        let coordinator = Coord {
            inner: Arc::new(Inner {
                config,
                engine,
                conn,
                validator,
                optimizer,
                results,
                monitor,
                txns,
                limiter,
                events,
                templates: registered,
                streams: Arc::new(StreamRegistry::default()),
                batches: Arc::new(BatchRegistry::default()),
                health: RwLock::new(Health::Healthy),
                started: Instant::now(),
                tasks: Mutex::new(Vec::new()),
                closed: AtomicBool::new(false),
            }),
        };
        coordinator.spawn_background();
        coordinator.inner.events.emit(Event::SystemInitialized);
        info!("coordinator initialized");
        Ok(coordinator)
    }
}
