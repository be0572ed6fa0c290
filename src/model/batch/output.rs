// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Batch Output Structs

use crate::model::batch::input::Op;
use crate::model::BatchStatus;
use crate::types::OpEither;
use getset::Getters;
use libeither::Either;
use uuid::Uuid;

/// Completion counts handed to the progress hook after every chunk
#[derive(Clone, Copy, Debug, Getters)]
#[getset(get = "pub")]
pub struct Progress {
    ///
    batch_id: Uuid,
    /// Operations finished so far, successful or not
    completed: usize,
    ///
    total: usize,
    ///
    percentage: f64,
}

impl Progress {
    #[doc(hidden)]
    #[must_use]
    pub fn new(batch_id: Uuid, completed: usize, total: usize) -> Self {
        let percentage = if total == 0 {
            100.0
        } else {
            completed as f64 * 100.0 / total as f64
        };
        Self {
            batch_id,
            completed,
            total,
            percentage,
        }
    }
}

/// The outcome of one operation, at the position it was submitted
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct OpOutcome {
    /// Zero-based index of the operation in the caller's original list
    index: usize,
    /// The operation, echoed back
    op: Op,
    /// Error message on the left, rows on the right
    result: OpEither,
}

impl OpOutcome {
    #[doc(hidden)]
    #[must_use]
    pub fn new(index: usize, op: Op, result: OpEither) -> Self {
        Self { index, op, result }
    }

    #[doc(hidden)]
    #[must_use]
    pub fn failed(index: usize, op: Op, error: &str) -> Self {
        Self {
            index,
            op,
            result: Either::new_left(error.to_string()),
        }
    }

    /// true when the operation produced rows rather than an error
    #[must_use]
    pub fn success(&self) -> bool {
        self.result.is_right()
    }

    /// The error message, when the operation failed
    #[must_use]
    pub fn error(&self) -> Option<String> {
        if self.result.is_left() {
            self.result.clone().left_safe().ok().map(|msg| msg.to_string())
        } else {
            None
        }
    }
}

/// The stable-ordered result of a whole batch
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Outcome {
    ///
    batch_id: Uuid,
    ///
    status: BatchStatus,
    /// One entry per submitted operation, ordered by original index
    results: Vec<OpOutcome>,
    ///
    succeeded: usize,
    ///
    failed: usize,
    ///
    duration_ms: u64,
}

impl Outcome {
    #[doc(hidden)]
    #[must_use]
    pub fn new(
        batch_id: Uuid,
        status: BatchStatus,
        results: Vec<OpOutcome>,
        duration_ms: u64,
    ) -> Self {
        let succeeded = results.iter().filter(|r| r.success()).count();
        let failed = results.len() - succeeded;
        Self {
            batch_id,
            status,
            results,
            succeeded,
            failed,
            duration_ms,
        }
    }
}

#[cfg(test)]
mod test {
    use super::{OpOutcome, Outcome, Progress};
    use crate::model::batch::input::Op;
    use crate::model::BatchStatus;
    use libeither::Either;
    use uuid::Uuid;

    fn query_op() -> Op {
        Op::Query {
            query: "RETURN 1".to_string(),
            params: crate::types::Params::new(),
        }
    }

    #[test]
    fn progress_percentage() {
        let progress = Progress::new(Uuid::new_v4(), 25, 100);
        assert!((progress.percentage() - 25.0).abs() < f64::EPSILON);
    }

    #[test]
    fn empty_batch_is_complete() {
        let progress = Progress::new(Uuid::new_v4(), 0, 0);
        assert!((progress.percentage() - 100.0).abs() < f64::EPSILON);
    }

    #[test]
    fn outcome_counts_failures() {
        let results = vec![
            OpOutcome::new(0, query_op(), Either::new_right(vec![])),
            OpOutcome::failed(1, query_op(), "boom"),
        ];
        let outcome = Outcome::new(Uuid::new_v4(), BatchStatus::Completed, results, 5);
        assert_eq!(*outcome.succeeded(), 1);
        assert_eq!(*outcome.failed(), 1);
        assert_eq!(outcome.results()[1].error().as_deref(), Some("boom"));
    }
}
