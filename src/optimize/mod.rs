// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Query optimization
//!
//! Plans are memoized by query signature in an LRU plan cache; the
//! analysis and rewrite machinery only runs on a miss.  A failing rule is
//! logged and skipped, never surfacing to the caller.

pub mod analysis;
pub mod cache;
pub(crate) mod rewrite;

use crate::model::OptimizationLevel;
use crate::types::Params;
use crate::utils::signature;
use analysis::{analyze, Analysis};
use derive_builder::Builder;
use getset::Getters;
use lru::LruCache;
use parking_lot::Mutex;
use rewrite::RewriteRule;
pub use rewrite::Weights;
use std::num::NonZeroUsize;
use std::time::{Duration, Instant};
use tracing::{debug, warn};

const PLAN_CACHE_ZERO_ERR: &str = "plan_cache_size cannot be 0!";

/// Optimizer tuning knobs
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    ///
    #[builder(default)]
    level: OptimizationLevel,
    ///
    #[builder(default = "500")]
    plan_cache_size: usize,
    /// Plans unused for longer than this are rebuilt on next demand and
    /// dropped by the sweeper
    #[builder(default = "Duration::from_secs(60 * 60)")]
    plan_ttl: Duration,
    /// How often the background sweeper drops expired plans
    #[builder(default = "Duration::from_secs(60)")]
    plan_sweep_interval: Duration,
    /// Improvement estimates reported per rule
    #[builder(default)]
    weights: Weights,
    /// Plans above this estimated row count get the streaming hint
    #[builder(default = "100_000")]
    streaming_rows_threshold: u64,
    /// Plans above this complexity get the parallel hint
    #[builder(default = "15")]
    parallel_complexity_threshold: u32,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: OptimizationLevel::default(),
            plan_cache_size: 500,
            plan_ttl: Duration::from_secs(60 * 60),
            plan_sweep_interval: Duration::from_secs(60),
            weights: Weights::default(),
            streaming_rows_threshold: 100_000,
            parallel_complexity_threshold: 15,
        }
    }
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(0) = self.plan_cache_size {
            return Err(PLAN_CACHE_ZERO_ERR.into());
        }
        Ok(())
    }
}

/// Execution hints derived from analysis and the applied rules
#[derive(Clone, Debug, Default, Getters)]
#[getset(get = "pub")]
pub struct Hints {
    /// Fields the engine should look indexes up for
    use_indexes: Vec<String>,
    /// Preferred join evaluation order, most selective first
    join_order: Vec<String>,
    /// Result set large enough that the caller should stream
    streaming: bool,
    /// Complexity high enough to justify parallel evaluation
    parallel: bool,
    /// Filters were (or should be) evaluated as early as possible
    pushdown_filters: bool,
}

/// A memoized optimization outcome for one query signature
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Plan {
    ///
    signature: String,
    /// The submitted query, post-validation
    original: String,
    /// The query after all rewrite rules ran
    optimized: String,
    /// Rule names that modified the query, in application order
    rules_applied: Vec<String>,
    /// Estimated improvement percentage, capped at 100
    improvement: u8,
    ///
    analysis: Analysis,
    ///
    hints: Hints,
    /// How many times this plan has been served from the cache
    access_count: u64,
    /// When this plan was last built or served
    last_access: Instant,
}

/// The rewrite engine plus its plan cache
pub struct Optimizer {
    config: Config,
    rules: Vec<Box<dyn RewriteRule>>,
    plans: Mutex<LruCache<String, Plan>>,
}

impl std::fmt::Debug for Optimizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Optimizer")
            .field("config", &self.config)
            .field("rules", &self.rules)
            .field("plans", &self.plan_count())
            .finish()
    }
}

impl Optimizer {
    ///
    #[must_use]
    pub fn new(config: Config) -> Self {
        let rules = rewrite::registry(*config.level(), *config.weights());
        let capacity = NonZeroUsize::new(*config.plan_cache_size())
            .unwrap_or_else(|| NonZeroUsize::new(1).expect("1 is non-zero"));
        Self {
            config,
            rules,
            plans: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Optimize one query.  Returns the plan and whether it came from
    /// the plan cache.
    pub fn optimize(&self, cypher: &str, params: &Params) -> (Plan, bool) {
        let sig = signature(cypher, params);
        {
            let ttl = *self.config.plan_ttl();
            let mut plans = self.plans.lock();
            let expired = match plans.get_mut(&sig) {
                Some(plan) if plan.last_access.elapsed() <= ttl => {
                    plan.access_count += 1;
                    plan.last_access = Instant::now();
                    return (plan.clone(), true);
                }
                Some(_stale) => true,
                None => false,
            };
            if expired {
                let _ = plans.pop(&sig);
            }
        }

        let plan = self.build_plan(&sig, cypher);
        let mut plans = self.plans.lock();
        let _ = plans.put(sig, plan.clone());
        (plan, false)
    }

    fn build_plan(&self, sig: &str, cypher: &str) -> Plan {
        let mut current = cypher.to_string();
        let mut rules_applied = Vec::new();
        let mut improvement = 0_u32;
        let mut analysis = analyze(&current);

        for rule in &self.rules {
            if !rule.condition(&analysis) {
                continue;
            }
            match rule.apply(&current, &analysis) {
                Ok(outcome) => {
                    improvement += outcome.improvement;
                    if outcome.modified {
                        debug!(rule = rule.name(), "rewrite rule modified the query");
                        rules_applied.push(rule.name().to_string());
                        current = outcome.query;
                        analysis = analyze(&current);
                    }
                }
                Err(err) => {
                    // internal failure: skip the rule, keep the pipeline
                    warn!(rule = rule.name(), error = %err, "rewrite rule failed, skipping");
                }
            }
        }

        let hints = Hints {
            use_indexes: analysis.suggested_indexes().clone(),
            join_order: analysis.patterns().clone(),
            streaming: *analysis.estimated_rows() > *self.config.streaming_rows_threshold(),
            parallel: *analysis.complexity() > *self.config.parallel_complexity_threshold(),
            pushdown_filters: rules_applied.iter().any(|r| r == "filter_pushdown"),
        };

        Plan {
            signature: sig.to_string(),
            original: cypher.to_string(),
            optimized: current,
            rules_applied,
            improvement: improvement.min(100) as u8,
            analysis,
            hints,
            access_count: 0,
            last_access: Instant::now(),
        }
    }

    /// Drop every plan whose signature or original text contains the
    /// fragment.  Independent of the result cache.
    pub fn invalidate(&self, fragment: &str) -> usize {
        let mut plans = self.plans.lock();
        let doomed: Vec<String> = plans
            .iter()
            .filter(|(key, plan)| key.contains(fragment) || plan.original().contains(fragment))
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            let _ = plans.pop(key);
        }
        doomed.len()
    }

    /// Remove plans idle past the plan TTL; called by the background
    /// sweeper
    pub fn sweep(&self) -> usize {
        let ttl = *self.config.plan_ttl();
        let mut plans = self.plans.lock();
        let doomed: Vec<String> = plans
            .iter()
            .filter(|(_, plan)| plan.last_access.elapsed() > ttl)
            .map(|(key, _)| key.clone())
            .collect();
        for key in &doomed {
            let _ = plans.pop(key);
        }
        doomed.len()
    }

    ///
    #[must_use]
    pub fn plan_count(&self) -> usize {
        self.plans.lock().len()
    }

    pub(crate) fn sweep_interval(&self) -> Duration {
        *self.config.plan_sweep_interval()
    }
}

impl Default for Optimizer {
    fn default() -> Self {
        Self::new(Config::default())
    }
}

#[cfg(test)]
mod test {
    use super::{Config, ConfigBuilder, Optimizer};
    use crate::model::OptimizationLevel;
    use crate::types::Params;
    use anyhow::Result;

    #[test]
    fn plan_cache_hit_on_second_call() {
        let optimizer = Optimizer::new(Config::default());
        let (first, hit1) = optimizer.optimize("MATCH (n:Rule) RETURN n", &Params::new());
        let (second, hit2) = optimizer.optimize("MATCH (n:Rule) RETURN n", &Params::new());
        assert!(!hit1);
        assert!(hit2);
        assert_eq!(first.signature(), second.signature());
        assert_eq!(*second.access_count(), 1);
    }

    #[test]
    fn spacing_variants_share_a_plan() {
        let optimizer = Optimizer::new(Config::default());
        let (_, hit1) = optimizer.optimize("MATCH (n:Rule)  RETURN n", &Params::new());
        let (_, hit2) = optimizer.optimize("match (n:Rule) return n", &Params::new());
        assert!(!hit1);
        assert!(hit2);
        assert_eq!(optimizer.plan_count(), 1);
    }

    #[test]
    fn rewrites_are_recorded() {
        let optimizer = Optimizer::new(Config::default());
        let (plan, _) = optimizer.optimize(
            "MATCH (a:Rule) MATCH (b:Pattern) WHERE a.id = $id RETURN a, b",
            &Params::new(),
        );
        assert!(plan
            .rules_applied()
            .iter()
            .any(|r| r == "filter_pushdown"));
        assert!(*plan.improvement() > 0);
        assert!(plan.hints().pushdown_filters());
    }

    #[test]
    fn improvement_is_capped() -> Result<()> {
        let config = ConfigBuilder::default()
            .weights(super::Weights {
                filter_pushdown: 90,
                index_hints: 90,
                limit_pushdown: 90,
                join_reorder: 90,
            })
            .build()?;
        let optimizer = Optimizer::new(config);
        let (plan, _) = optimizer.optimize(
            "MATCH (a:Rule) MATCH (b:Pattern) WHERE a.id = $id RETURN a, b LIMIT 5",
            &Params::new(),
        );
        assert_eq!(*plan.improvement(), 100);
        Ok(())
    }

    #[test]
    fn plan_cache_evicts_least_recent() -> Result<()> {
        let config = ConfigBuilder::default().plan_cache_size(2).build()?;
        let optimizer = Optimizer::new(config);
        let _ = optimizer.optimize("MATCH (a:Rule) RETURN a", &Params::new());
        let _ = optimizer.optimize("MATCH (b:Pattern) RETURN b", &Params::new());
        let _ = optimizer.optimize("MATCH (c:Standard) RETURN c", &Params::new());
        assert_eq!(optimizer.plan_count(), 2);
        // the first plan was evicted, so this is a rebuild
        let (_, hit) = optimizer.optimize("MATCH (a:Rule) RETURN a", &Params::new());
        assert!(!hit);
        Ok(())
    }

    #[test]
    fn invalidate_by_original_text() {
        let optimizer = Optimizer::new(Config::default());
        let _ = optimizer.optimize("MATCH (a:Rule) RETURN a", &Params::new());
        let _ = optimizer.optimize("MATCH (b:Pattern) RETURN b", &Params::new());
        assert_eq!(optimizer.invalidate("Pattern"), 1);
        assert_eq!(optimizer.plan_count(), 1);
    }

    #[test]
    fn conservative_level_never_reorders_joins() {
        let optimizer = Optimizer::new(
            ConfigBuilder::default()
                .level(OptimizationLevel::Conservative)
                .build()
                .expect("valid config"),
        );
        let (plan, _) = optimizer.optimize(
            "MATCH (a:Rule) MATCH (b:Pattern) WHERE b.id = $id RETURN a, b",
            &Params::new(),
        );
        assert!(!plan.rules_applied().iter().any(|r| r == "join_reorder"));
    }
}
