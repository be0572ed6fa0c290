// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Administrative operations trait

use crate::event::EventStream;
use crate::model::report::{PerformanceReport, SystemStatus};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

/// Administrative Operations
#[async_trait]
pub trait Admin {
    /// A point-in-time snapshot of health and registry occupancy
    fn system_status(&self) -> SystemStatus;

    /// Summary, percentiles, breakdowns, trend, and recommendations for
    /// a time range
    fn performance_report(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> PerformanceReport;

    /// Drop cached result sets whose key contains the fragment
    fn invalidate_results(&self, fragment: &str) -> usize;

    /// Drop cached plans whose signature or source contains the
    /// fragment; independent of the result cache
    fn invalidate_plans(&self, fragment: &str) -> usize;

    /// Subscribe to the coordinator's event channel
    fn subscribe(&self) -> EventStream;

    /// Stop sweepers, roll back active transactions, close the engine
    async fn shutdown(&self) -> Result<()>;
}
