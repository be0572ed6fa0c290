// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Batch Input Structs

use crate::model::batch::output::Progress;
use crate::types::{Params, Row};
use derive_builder::Builder;
use getset::Getters;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;

const BATCH_SIZE_ZERO_ERR: &str = "batch_size cannot be 0!";
const CONCURRENCY_ZERO_ERR: &str = "max_concurrency cannot be 0!";

/// One operation inside a batch
#[derive(Clone, Debug)]
pub enum Op {
    /// A node insert; the executor synthesizes
    /// `CREATE (n:<table> {field: $p<i>, ...}) RETURN n` with parameter
    /// names unique across all concurrently built queries
    Insert {
        /// Target node table
        table: String,
        /// Field values for the new node
        data: Row,
    },
    /// A raw update statement with its own parameters
    Update {
        ///
        query: String,
        ///
        params: Params,
    },
    /// Any other free-form query
    Query {
        ///
        query: String,
        ///
        params: Params,
    },
}

/// Callback invoked after every completed chunk
#[derive(Clone)]
pub struct ProgressHook(Arc<dyn Fn(Progress) + Send + Sync>);

impl ProgressHook {
    /// Wrap a callback
    pub fn new<F>(hook: F) -> Self
    where
        F: Fn(Progress) + Send + Sync + 'static,
    {
        Self(Arc::new(hook))
    }

    pub(crate) fn call(&self, progress: Progress) {
        (self.0)(progress);
    }
}

impl fmt::Debug for ProgressHook {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ProgressHook")
    }
}

/// Batch execution configuration
#[derive(Builder, Clone, Debug, Default, Getters)]
#[getset(get = "pub(crate)")]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Operations are split into fixed-size chunks of this many
    #[builder(default = "50")]
    batch_size: usize,
    /// At most this many chunks run at once
    #[builder(default = "4")]
    max_concurrency: usize,
    /// How many times a failed chunk is retried before every operation in
    /// it is marked failed
    #[builder(default = "2")]
    retry_attempts: u32,
    /// Base delay for the linear chunk-retry backoff
    #[builder(default = "Duration::from_millis(100)")]
    retry_delay: Duration,
    /// Run each multi-operation chunk inside a single transaction
    #[builder(default)]
    use_transaction: bool,
    /// Client identity for rate limiting
    #[builder(setter(into, strip_option), default)]
    client_id: Option<String>,
    /// Invoked after each chunk with completion counts
    #[builder(setter(strip_option), default)]
    progress: Option<ProgressHook>,
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(0) = self.batch_size {
            return Err(BATCH_SIZE_ZERO_ERR.into());
        }
        if let Some(0) = self.max_concurrency {
            return Err(CONCURRENCY_ZERO_ERR.into());
        }
        Ok(())
    }
}
