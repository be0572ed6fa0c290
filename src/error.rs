// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! `rukuzu` error

use crate::model::{Risk, TxnState};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::error::Error;

/// When bad things happen
#[derive(thiserror::Error, Clone, Debug, Eq, PartialEq)]
#[allow(variant_size_differences)]
pub enum RukuzuErr {
    /// The query failed one or more validation pipeline steps
    #[error("Query '{}' failed validation ({}): {}", query_id, risk, errors.join("; "))]
    Validation {
        ///
        query_id: String,
        ///
        errors: Vec<String>,
        ///
        risk: Risk,
    },
    /// A security pattern matched; always rejected, always audited
    #[error("Injection attempt detected in query '{}': {}", query_id, pattern)]
    InjectionDetected {
        ///
        query_id: String,
        ///
        pattern: String,
    },
    /// A capacity limit was hit; the caller may retry later
    #[error("Resource exhausted: {} (limit {})", resource, limit)]
    ResourceExhausted {
        ///
        resource: String,
        ///
        limit: u64,
    },
    /// A deadline was exceeded at the query, transaction, or stream layer
    #[error("Query '{}' timed out after {}ms", query_id, waited_ms)]
    Timeout {
        ///
        query_id: String,
        ///
        waited_ms: u64,
    },
    /// An engine-level failure that the retry policy may absorb
    #[error("Transient engine failure: {}", msg)]
    Transient {
        ///
        msg: String,
    },
    /// The engine is unreachable; the coordinator flips to UNHEALTHY
    #[error("Fatal engine failure: {}", msg)]
    Fatal {
        ///
        msg: String,
    },
    /// A rule inside the optimizer or sanitizer failed; logged and skipped
    #[error("Internal: {}", msg)]
    Internal {
        ///
        msg: String,
    },
    /// A mutating call reached a transaction that is not ACTIVE
    #[error("Transaction '{}' is {} and accepts no further operations", id, state)]
    TxnInactive {
        ///
        id: String,
        ///
        state: TxnState,
    },
    /// Rollback was requested to a savepoint this transaction never created
    #[error("Unknown savepoint '{}'", name)]
    UnknownSavepoint {
        ///
        name: String,
    },
    /// `execute_template` was called with an unregistered template name
    #[error("Unknown query template '{}'", name)]
    UnknownTemplate {
        ///
        name: String,
    },
    /// Parameter inlining hit a non-finite number
    #[error("Parameter '{}' is not a finite number", name)]
    NonFiniteNumber {
        ///
        name: String,
    },
    /// The batch was cancelled before this operation was scheduled
    #[error("Batch '{}' was cancelled", id)]
    BatchCancelled {
        ///
        id: String,
    },
    /// `CoordinatorBuilder::build` was called without an engine
    #[error("You have not supplied an engine to orchestrate")]
    MissingEngine,
    #[cfg(test)]
    #[error("A test error has occurred: {}", val)]
    TestError { val: String },
}

impl RukuzuErr {
    /// true when the retry policy is allowed to absorb this error
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Transient { .. } | Self::Timeout { .. })
    }
}

impl Serialize for RukuzuErr {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("RukuzuErr", 2)?;
        state.serialize_field("reason", &format!("{}", self))?;
        if let Some(source) = self.source() {
            state.serialize_field("source", &format!("{}", source))?;
        }
        state.end()
    }
}

#[cfg(test)]
impl From<&str> for RukuzuErr {
    fn from(val: &str) -> Self {
        Self::TestError {
            val: val.to_string(),
        }
    }
}
