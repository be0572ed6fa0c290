// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Transactional trait implementation

use crate::coordinator::Coordinator;
use crate::model::txn::{
    input::{Config, Op},
    output::Outcome,
};
use crate::txn::Transaction;
use crate::Transactional;
use anyhow::Result;
use async_trait::async_trait;

#[async_trait]
impl Transactional for Coordinator {
    async fn begin_transaction(&self, config: Config) -> Result<Transaction> {
        self.inner.txns.begin(config).await
    }

    async fn execute_transaction(&self, ops: Vec<Op>, config: Config) -> Result<Outcome> {
        self.inner.txns.execute(&ops, config).await
    }
}
