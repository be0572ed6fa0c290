// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Batch operations trait

use crate::model::batch::{
    input::{Config, Op},
    output::Outcome,
};
use anyhow::Result;
use async_trait::async_trait;
use uuid::Uuid;

/// Batch Operations
#[async_trait]
pub trait Batch {
    /// Execute operations in bounded-parallel chunks; results come back
    /// stable-ordered by the original operation index
    async fn execute_batch(&self, ops: Vec<Op>, config: Config) -> Result<Outcome>;

    /// Cooperatively cancel a running batch: in-flight chunks finish,
    /// queued chunks are dropped.  Returns false for unknown ids.
    fn cancel_batch(&self, id: &Uuid) -> bool;
}
