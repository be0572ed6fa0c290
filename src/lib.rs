// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! `rukuzu`
//!
//! A Cypher query orchestration layer for embedded graph databases.  The
//! engine underneath (Kuzu, or anything else implementing the
//! [`Engine`] driver contract) executes one text statement at a time.
//! Everything around that call lives here behind a single
//! [`Coordinator`] facade: validation and sanitization, rewrite
//! optimization, adaptive result caching, ACID transactions with
//! savepoints, bounded-parallel batches, paginated streams, and
//! performance monitoring.
//!
//! # Running a query
//!
//! ```
//! # use anyhow::Result;
//! // Build a coordinator and pull in the traits for the operations you
//! // wish to use
//! use rukuzu::{Cypher, Admin, CoordinatorBuilder, MockEngine, QueryConfigBuilder};
//! use std::sync::Arc;
//! #
//! # async fn blah() -> Result<()> {
//! let engine = MockEngine::new();
//! let coordinator = CoordinatorBuilder::default()
//!     .engine(Arc::new(engine.clone()))
//!     .build()
//!     .await?;
//!
//! // Insert a node, then read it back through the pipeline
//! let _ = coordinator
//!     .query(
//!         QueryConfigBuilder::default()
//!             .cypher("CREATE (n:CodeEntity {name: 'parser', kind: 'function'}) RETURN n")
//!             .build()?,
//!     )
//!     .await?;
//!
//! let outcome = coordinator
//!     .query(
//!         QueryConfigBuilder::default()
//!             .cypher("MATCH (e:CodeEntity) RETURN e.name")
//!             .build()?,
//!     )
//!     .await?;
//! assert_eq!(outcome.row_count(), 1);
//! assert!(!outcome.cached());
//!
//! // An identical resubmission is served from the result cache
//! let warm = coordinator
//!     .query(
//!         QueryConfigBuilder::default()
//!             .cypher("MATCH (e:CodeEntity) RETURN e.name")
//!             .build()?,
//!     )
//!     .await?;
//! assert!(warm.cached());
//!
//! coordinator.shutdown().await?;
//! #     Ok(())
//! # }
//! # tokio_test::block_on(blah());
//! ```
//!
//! # Explicit transactions
//!
//! ```
//! # use anyhow::Result;
//! use rukuzu::{Admin, CoordinatorBuilder, MockEngine, Transactional, TxnConfigBuilder};
//! use std::sync::Arc;
//! #
//! # async fn blah() -> Result<()> {
//! let coordinator = CoordinatorBuilder::default()
//!     .engine(Arc::new(MockEngine::new()))
//!     .build()
//!     .await?;
//!
//! let txn = coordinator
//!     .begin_transaction(TxnConfigBuilder::default().build()?)
//!     .await?;
//! let _ = txn
//!     .query("CREATE (r:Rule {id: 'naming'}) RETURN r", &Default::default())
//!     .await?;
//! txn.create_savepoint("before-risky").await?;
//! let _ = txn
//!     .query("CREATE (r:Rule {id: 'risky'}) RETURN r", &Default::default())
//!     .await?;
//! // changed our mind about the second rule
//! txn.rollback_to_savepoint("before-risky").await?;
//! txn.commit().await?;
//!
//! coordinator.shutdown().await?;
//! #     Ok(())
//! # }
//! # tokio_test::block_on(blah());
//! ```

// rustc lints
#![cfg_attr(nightly, allow(single_use_lifetimes))]
#![cfg_attr(
    nightly,
    deny(
        absolute_paths_not_starting_with_crate,
        anonymous_parameters,
        array_into_iter,
        bare_trait_objects,
        break_with_label_and_loop,
        clashing_extern_declarations,
        coherence_leak_check,
        confusable_idents,
        const_item_mutation,
        dead_code,
        deprecated,
        deprecated_in_future,
        deprecated_where_clause_location,
        deref_into_dyn_supertrait,
        deref_nullptr,
        drop_bounds,
        dropping_copy_types,
        dropping_references,
        duplicate_macro_attributes,
        dyn_drop,
        ellipsis_inclusive_range_patterns,
        explicit_outlives_requirements,
        exported_private_dependencies,
        for_loops_over_fallibles,
        forbidden_lint_groups,
        forgetting_copy_types,
        forgetting_references,
        function_item_references,
        hidden_glob_reexports,
        improper_ctypes,
        improper_ctypes_definitions,
        incomplete_features,
        inline_no_sanitize,
        invalid_from_utf8,
        invalid_macro_export_arguments,
        invalid_nan_comparisons,
        invalid_value,
        irrefutable_let_patterns,
        keyword_idents,
        large_assignments,
        late_bound_lifetime_arguments,
        legacy_derive_helpers,
        let_underscore_drop,
        macro_use_extern_crate,
        map_unit_fn,
        meta_variable_misuse,
        missing_abi,
        missing_copy_implementations,
        missing_debug_implementations,
        missing_docs,
        mixed_script_confusables,
        named_arguments_used_positionally,
        no_mangle_generic_items,
        non_ascii_idents,
        non_camel_case_types,
        non_fmt_panics,
        non_shorthand_field_patterns,
        non_snake_case,
        non_upper_case_globals,
        noop_method_call,
        opaque_hidden_inferred_bound,
        overlapping_range_endpoints,
        path_statements,
        private_bounds,
        private_interfaces,
        redundant_semicolons,
        refining_impl_trait,
        renamed_and_removed_lints,
        repr_transparent_external_private_fields,
        rust_2021_incompatible_closure_captures,
        rust_2021_incompatible_or_patterns,
        rust_2021_prefixes_incompatible_syntax,
        rust_2021_prelude_collisions,
        semicolon_in_expressions_from_macros,
        special_module_name,
        stable_features,
        suspicious_double_ref_op,
        trivial_bounds,
        trivial_casts,
        trivial_numeric_casts,
        type_alias_bounds,
        uncommon_codepoints,
        unconditional_recursion,
        uninhabited_static,
        unit_bindings,
        unknown_lints,
        unnameable_test_items,
        unreachable_code,
        unreachable_patterns,
        unreachable_pub,
        unsafe_code,
        unsafe_op_in_unsafe_fn,
        unstable_name_collisions,
        unstable_syntax_pre_expansion,
        unsupported_calling_conventions,
        unused_allocation,
        unused_assignments,
        unused_associated_type_bounds,
        unused_attributes,
        unused_braces,
        unused_comparisons,
        unused_doc_comments,
        unused_extern_crates,
        unused_features,
        unused_import_braces,
        unused_imports,
        unused_labels,
        unused_lifetimes,
        unused_macro_rules,
        unused_macros,
        unused_must_use,
        unused_mut,
        unused_parens,
        unused_qualifications,
        unused_results,
        unused_unsafe,
        unused_variables,
        variant_size_differences,
        while_true,
    )
)]
// If nightly and unstable, allow `unstable_features`
#![cfg_attr(all(feature = "unstable", nightly), allow(unstable_features))]
// If nightly and not unstable, deny `unstable_features`
#![cfg_attr(all(not(feature = "unstable"), nightly), deny(unstable_features))]
// clippy lints
#![cfg_attr(nightly, deny(clippy::all, clippy::pedantic))]
// rustdoc lints
#![cfg_attr(
    nightly,
    deny(
        rustdoc::bare_urls,
        rustdoc::broken_intra_doc_links,
        rustdoc::invalid_codeblock_attributes,
        rustdoc::invalid_html_tags,
        rustdoc::missing_crate_level_docs,
        rustdoc::private_doc_tests,
        rustdoc::private_intra_doc_links,
    )
)]
#![cfg_attr(all(doc, nightly), feature(doc_auto_cfg))]

mod impls;

mod bootstrap;
mod builder;
mod coordinator;
mod engine;
mod error;
mod event;
mod exec;
mod limits;
#[doc(hidden)]
mod mocks;
mod model;
mod monitor;
mod optimize;
mod traits;
mod txn;
mod types;
mod utils;
mod validate;

pub use bootstrap::ensure_layout;
pub use builder::Coordinator as BaseCoordinator;
pub use builder::CoordinatorBuilder;
pub use coordinator::Config as CoordinatorConfig;
pub use coordinator::ConfigBuilder as CoordinatorConfigBuilder;
pub use coordinator::Coordinator;
pub use coordinator::Template;
pub use engine::Engine;
pub use engine::EngineConnection;
pub use error::RukuzuErr as Error;
pub use event::Event;
pub use event::EventBus;
pub use event::EventStream;
pub use exec::stream::ResultStream;
pub use limits::Config as RateLimitConfig;
pub use limits::ConfigBuilder as RateLimitConfigBuilder;
pub use limits::RateLimiter;
#[doc(hidden)]
pub use mocks::MockEngine;
pub use model::batch;
pub use model::batch::input::Config as BatchConfig;
pub use model::batch::input::ConfigBuilder as BatchConfigBuilder;
pub use model::batch::input::Op as BatchOp;
pub use model::batch::input::ProgressHook;
pub use model::query;
pub use model::query::input::Config as QueryConfig;
pub use model::query::input::ConfigBuilder as QueryConfigBuilder;
pub use model::report;
pub use model::stream;
pub use model::stream::input::Config as StreamConfig;
pub use model::stream::input::ConfigBuilder as StreamConfigBuilder;
pub use model::stream::output::Chunk as StreamChunk;
pub use model::txn::input::Config as TxnConfig;
pub use model::txn::input::ConfigBuilder as TxnConfigBuilder;
pub use model::txn::input::Op as TxnOp;
pub use model::BatchStatus;
pub use model::ErrorStrategy;
pub use model::Health;
pub use model::Isolation;
pub use model::OptimizationLevel;
pub use model::QueryKind;
pub use model::Risk;
pub use model::Severity;
pub use model::StreamStatus;
pub use model::TxnState;
pub use monitor::Config as MonitorConfig;
pub use monitor::ConfigBuilder as MonitorConfigBuilder;
pub use monitor::Monitor;
pub use optimize::analysis::Analysis;
pub use optimize::analysis::Filter;
pub use optimize::analysis::FilterKind;
pub use optimize::cache::Config as CacheConfig;
pub use optimize::cache::ConfigBuilder as CacheConfigBuilder;
pub use optimize::cache::ResultCache;
pub use optimize::Config as OptimizerConfig;
pub use optimize::ConfigBuilder as OptimizerConfigBuilder;
pub use optimize::Hints;
pub use optimize::Optimizer;
pub use optimize::Plan;
pub use optimize::Weights;
pub use traits::Admin;
pub use traits::Batch;
pub use traits::Cypher;
pub use traits::Streaming;
pub use traits::Transactional;
pub use txn::retry::is_transient;
pub use txn::retry::RetryPolicy;
pub use txn::Config as TxnManagerConfig;
pub use txn::ConfigBuilder as TxnManagerConfigBuilder;
pub use txn::Transaction;
pub use txn::TxnManager;
pub use types::OpEither;
pub use types::Params;
pub use types::Row;
pub use types::RowVec;
pub use utils::signature;
pub use validate::Config as ValidationConfig;
pub use validate::ConfigBuilder as ValidationConfigBuilder;
pub use validate::Validator;
pub use validate::Verdict;
