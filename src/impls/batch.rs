// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Batch trait implementation

use crate::coordinator::Coordinator;
use crate::model::batch::{
    input::{Config, Op},
    output::Outcome,
};
use crate::Batch;
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

#[async_trait]
impl Batch for Coordinator {
    async fn execute_batch(&self, ops: Vec<Op>, config: Config) -> Result<Outcome> {
        self.inner.limiter.check(config.client_id().as_deref())?;
        crate::exec::batch::execute(&self.exec_ctx(), &self.inner.batches, ops, config).await
    }

    fn cancel_batch(&self, id: &Uuid) -> bool {
        self.inner.batches.cancel(id)
    }
}
