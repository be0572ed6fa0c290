// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Batch and streaming execution

pub(crate) mod batch;
pub(crate) mod stream;

use crate::engine::EngineConnection;
use crate::event::EventBus;
use crate::monitor::Monitor;
use crate::optimize::Optimizer;
use crate::txn::TxnManager;
use crate::validate::Validator;
use std::sync::Arc;

/// Shared handles every executor needs; cheap to clone into tasks
#[derive(Clone, Debug)]
pub(crate) struct ExecCtx {
    pub(crate) conn: Arc<dyn EngineConnection>,
    pub(crate) validator: Arc<Validator>,
    pub(crate) optimizer: Arc<Optimizer>,
    pub(crate) monitor: Arc<Monitor>,
    pub(crate) events: EventBus,
    pub(crate) txns: TxnManager,
}
