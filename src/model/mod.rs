// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Input/Output models

use serde::{Deserialize, Serialize};
use std::fmt;

pub mod batch;
pub mod query;
pub mod report;
pub mod stream;
pub mod txn;

/// Risk level attached to a validation verdict.  Ordered so that the
/// highest risk observed across pipeline steps wins.
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Risk {
    /// Nothing suspicious was found
    Minimal,
    /// Structural warnings only
    Low,
    /// Complexity or keyword warnings
    Medium,
    /// Structural bound violations
    High,
    /// A security pattern matched
    Critical,
}

impl Default for Risk {
    fn default() -> Self {
        Self::Minimal
    }
}

impl fmt::Display for Risk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Minimal => "minimal",
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{}", label)
    }
}

/// Coordinator health as reported by the periodic health check
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Health {
    /// All probes pass and no thresholds are crossed
    Healthy,
    /// A warning threshold was crossed
    Warning,
    /// The engine is unreachable or an unhealthy threshold was crossed
    Unhealthy,
}

impl fmt::Display for Health {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Healthy => "HEALTHY",
            Self::Warning => "WARNING",
            Self::Unhealthy => "UNHEALTHY",
        };
        write!(f, "{}", label)
    }
}

/// Alert severity
#[derive(Clone, Copy, Debug, Deserialize, Eq, Ord, PartialEq, PartialOrd, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    ///
    Low,
    ///
    Medium,
    ///
    High,
    ///
    Critical,
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
            Self::Critical => "critical",
        };
        write!(f, "{}", label)
    }
}

/// Transaction lifecycle state
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TxnState {
    /// Created but not yet begun on the engine
    Pending,
    /// Accepting queries, savepoints, commit, and rollback
    Active,
    /// Terminal: committed
    Committed,
    /// Terminal: rolled back (explicitly or by the timeout sweeper)
    RolledBack,
    /// Terminal: an engine-level failure poisoned the transaction
    Failed,
}

impl TxnState {
    /// true for the three terminal states
    #[must_use]
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Committed | Self::RolledBack | Self::Failed)
    }
}

impl fmt::Display for TxnState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Pending => "PENDING",
            Self::Active => "ACTIVE",
            Self::Committed => "COMMITTED",
            Self::RolledBack => "ROLLED_BACK",
            Self::Failed => "FAILED",
        };
        write!(f, "{}", label)
    }
}

/// Transaction isolation hint forwarded to the engine
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Isolation {
    ///
    ReadCommitted,
    ///
    Serializable,
}

impl Default for Isolation {
    fn default() -> Self {
        Self::Serializable
    }
}

/// Batch job status
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum BatchStatus {
    ///
    Running,
    ///
    Completed,
    ///
    Failed,
    ///
    Cancelled,
}

/// Result stream status
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StreamStatus {
    ///
    Active,
    ///
    Completed,
    ///
    Error,
}

/// Per-operation error handling strategy inside a composite transaction
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum ErrorStrategy {
    /// Record the failure, roll back to the savepoint taken before the
    /// failed operation, and keep going
    Continue,
    /// Roll back the whole transaction and surface the error
    Rollback,
    /// Apply the retry policy, then fall through to `Rollback`
    Retry,
}

impl Default for ErrorStrategy {
    fn default() -> Self {
        Self::Rollback
    }
}

/// How aggressively the optimizer rewrites queries
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum OptimizationLevel {
    /// Skip join reordering
    Conservative,
    ///
    Balanced,
    ///
    Aggressive,
}

impl Default for OptimizationLevel {
    fn default() -> Self {
        Self::Balanced
    }
}

/// Coarse classification of what a query does
#[derive(Clone, Copy, Debug, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum QueryKind {
    ///
    Read,
    ///
    Write,
    ///
    Update,
    ///
    Delete,
}

impl QueryKind {
    /// Only plain reads are eligible for the result cache
    #[must_use]
    pub fn is_cacheable(self) -> bool {
        matches!(self, Self::Read)
    }
}
