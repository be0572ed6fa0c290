// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Transaction Output Structs

use crate::model::TxnState;
use crate::types::OpEither;
use getset::Getters;
use libeither::Either;
use uuid::Uuid;

/// Outcome of one operation inside `execute_transaction`
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct OpOutcome {
    /// Zero-based index of the operation in the submitted list
    index: usize,
    /// Error message on the left, rows on the right
    result: OpEither,
}

impl OpOutcome {
    #[doc(hidden)]
    #[must_use]
    pub fn new(index: usize, result: OpEither) -> Self {
        Self { index, result }
    }

    #[doc(hidden)]
    #[must_use]
    pub fn failed(index: usize, error: &str) -> Self {
        Self {
            index,
            result: Either::new_left(error.to_string()),
        }
    }

    /// true when the operation produced rows rather than an error
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_right()
    }
}

/// The result of a composite transaction
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Outcome {
    ///
    txn_id: Uuid,
    /// Terminal state the transaction reached
    state: TxnState,
    /// Per-operation outcomes, ordered by submission
    results: Vec<OpOutcome>,
    ///
    duration_ms: u64,
}

impl Outcome {
    #[doc(hidden)]
    #[must_use]
    pub fn new(txn_id: Uuid, state: TxnState, results: Vec<OpOutcome>, duration_ms: u64) -> Self {
        Self {
            txn_id,
            state,
            results,
            duration_ms,
        }
    }

    /// Count of operations that produced rows
    #[must_use]
    pub fn succeeded(&self) -> usize {
        self.results.iter().filter(|r| r.success()).count()
    }
}
