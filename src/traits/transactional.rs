// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Transaction operations trait

use crate::model::txn::{
    input::{Config, Op},
    output::Outcome,
};
use crate::txn::Transaction;
use anyhow::Result;
use async_trait::async_trait;

/// Transaction Operations
#[async_trait]
pub trait Transactional {
    /// Begin an explicit transaction.  Fails with `ResourceExhausted`
    /// once the active cap is reached.
    async fn begin_transaction(&self, config: Config) -> Result<Transaction>;

    /// Run operations as one transaction under the configured error
    /// strategy, then commit
    async fn execute_transaction(&self, ops: Vec<Op>, config: Config) -> Result<Outcome>;
}
