// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Engine driver contract
//!
//! The orchestration layer never talks to a concrete graph engine
//! directly.  A driver supplies an [`Engine`] that opens
//! [`EngineConnection`]s, and each connection executes one Cypher string
//! at a time.  Engines without a native transaction interface inherit the
//! text-statement fallback: `BEGIN TRANSACTION`, `COMMIT`, `ROLLBACK`,
//! and savepoint statements are issued through [`EngineConnection::run`].

use crate::types::RowVec;
use anyhow::Result;
use async_trait::async_trait;
use std::fmt::Debug;
use std::sync::Arc;

/// An embedded graph database as seen by the coordinator
#[async_trait]
pub trait Engine: Debug + Send + Sync {
    /// Open a connection.  Engines that expose a sole connection may
    /// return clones sharing state; the coordinator serializes mutations
    /// through transaction ownership either way.
    async fn connect(&self) -> Result<Arc<dyn EngineConnection>>;

    /// Release the underlying database at shutdown
    async fn close(&self) -> Result<()>;
}

/// A single engine connection executing one text statement at a time.
/// There is no bind interface; parameters are inlined by the validator's
/// sanitizer before a query reaches this trait.
#[async_trait]
pub trait EngineConnection: Debug + Send + Sync {
    /// Execute a Cypher string and collect the resulting rows
    async fn run(&self, cypher: &str) -> Result<RowVec>;

    /// Begin a transaction on this connection
    async fn begin(&self) -> Result<()> {
        let _rows = self.run("BEGIN TRANSACTION").await?;
        Ok(())
    }

    ///
    async fn commit(&self) -> Result<()> {
        let _rows = self.run("COMMIT").await?;
        Ok(())
    }

    ///
    async fn rollback(&self) -> Result<()> {
        let _rows = self.run("ROLLBACK").await?;
        Ok(())
    }

    ///
    async fn savepoint(&self, id: &str) -> Result<()> {
        let _rows = self.run(&format!("SAVEPOINT {}", id)).await?;
        Ok(())
    }

    ///
    async fn release_savepoint(&self, id: &str) -> Result<()> {
        let _rows = self.run(&format!("RELEASE SAVEPOINT {}", id)).await?;
        Ok(())
    }

    ///
    async fn rollback_to_savepoint(&self, id: &str) -> Result<()> {
        let _rows = self.run(&format!("ROLLBACK TO SAVEPOINT {}", id)).await?;
        Ok(())
    }
}
