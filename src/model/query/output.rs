// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Query Output Structs

use crate::types::RowVec;
use getset::Getters;
use uuid::Uuid;

/// What the coordinator hands back for a completed query
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Outcome {
    /// Unique id assigned at admission; also attached to errors and
    /// metric samples for this submission
    query_id: Uuid,
    ///
    rows: RowVec,
    /// Served from the result cache
    cached: bool,
    /// At least one rewrite rule modified the query text
    optimized: bool,
    /// Names of the rewrite rules that ran, in application order
    rules_applied: Vec<String>,
    /// Validator warnings that did not block execution
    warnings: Vec<String>,
    ///
    execution_ms: u64,
}

impl Outcome {
    #[doc(hidden)]
    #[must_use]
    pub fn new(
        query_id: Uuid,
        rows: RowVec,
        cached: bool,
        optimized: bool,
        rules_applied: Vec<String>,
        warnings: Vec<String>,
        execution_ms: u64,
    ) -> Self {
        Self {
            query_id,
            rows,
            cached,
            optimized,
            rules_applied,
            warnings,
            execution_ms,
        }
    }

    /// Number of rows returned
    #[must_use]
    pub fn row_count(&self) -> usize {
        self.rows.len()
    }
}
