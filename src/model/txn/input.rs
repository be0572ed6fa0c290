// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Transaction Input Structs

use crate::model::{ErrorStrategy, Isolation};
use crate::types::Params;
use derive_builder::Builder;
use getset::Getters;
use std::time::Duration;

const ZERO_TIMEOUT_ERR: &str = "timeout cannot be zero!";

/// Per-transaction configuration
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// Overall transaction deadline enforced by the timeout sweeper
    #[builder(default = "Duration::from_secs(60)")]
    timeout: Duration,
    ///
    #[builder(default)]
    isolation: Isolation,
    ///
    #[builder(default)]
    read_only: bool,
    /// How `execute_transaction` reacts to a failed operation
    #[builder(default)]
    strategy: ErrorStrategy,
    /// Allow the retry policy to absorb transient engine failures
    #[builder(default)]
    retryable: bool,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            timeout: Duration::from_secs(60),
            isolation: Isolation::default(),
            read_only: false,
            strategy: ErrorStrategy::default(),
            retryable: false,
        }
    }
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(timeout) = self.timeout {
            if timeout.is_zero() {
                return Err(ZERO_TIMEOUT_ERR.into());
            }
        }
        Ok(())
    }
}

/// One operation submitted to `execute_transaction`
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
pub struct Op {
    ///
    cypher: String,
    ///
    params: Params,
}

impl Op {
    /// Wrap a statement and its parameters
    #[must_use]
    pub fn new<T>(cypher: T, params: Params) -> Self
    where
        T: Into<String>,
    {
        Self {
            cypher: cypher.into(),
            params,
        }
    }
}
