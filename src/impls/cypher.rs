// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Cypher trait implementation

use crate::coordinator::Coordinator;
use crate::model::query::{input::Config, output::Outcome};
use crate::types::Params;
use crate::Cypher;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
impl Cypher for Coordinator {
    async fn query(&self, config: Config) -> Result<Outcome> {
        self.run_query(config).await
    }

    async fn execute_template(&self, name: &str, params: Params) -> Result<Outcome> {
        self.run_template(name, params).await
    }
}
