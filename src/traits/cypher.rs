// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Query operations trait

use crate::model::query::{input::Config, output::Outcome};
use crate::types::Params;
use anyhow::Result;
use async_trait::async_trait;

/// Query Operations
#[async_trait]
pub trait Cypher {
    /// Run one query through the full pipeline: admission, validation,
    /// optimization, cache probe, deadline-bounded execution, metrics
    async fn query(&self, config: Config) -> Result<Outcome>;

    /// Run a registered template with the caller's parameters
    async fn execute_template(&self, name: &str, params: Params) -> Result<Outcome>;
}
