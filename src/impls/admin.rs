// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Admin trait implementation

use crate::coordinator::Coordinator;
use crate::event::EventStream;
use crate::model::report::{PerformanceReport, SystemStatus};
use crate::Admin;
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};

#[async_trait]
impl Admin for Coordinator {
    fn system_status(&self) -> SystemStatus {
        self.status()
    }

    fn performance_report(&self, from: DateTime<Utc>, until: DateTime<Utc>) -> PerformanceReport {
        self.report(from, until)
    }

    fn invalidate_results(&self, fragment: &str) -> usize {
        self.inner.results.invalidate(fragment)
    }

    fn invalidate_plans(&self, fragment: &str) -> usize {
        self.inner.optimizer.invalidate(fragment)
    }

    fn subscribe(&self) -> EventStream {
        self.subscribe_events()
    }

    async fn shutdown(&self) -> Result<()> {
        self.run_shutdown().await
    }
}
