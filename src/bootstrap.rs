// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! First-run fixtures
//!
//! The working directory gains its auxiliary subdirectories (each with a
//! marker file so empty directories survive source control), and the
//! fixed schema tables consumed by higher layers are created on the
//! engine.

use crate::engine::EngineConnection;
use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use std::sync::Arc;
use tracing::debug;

const SUBDIRS: [&str; 6] = ["backups", "exports", "imports", "logs", "cache", "temp"];
const MARKER: &str = ".gitkeep";

const NODE_TABLES: [&str; 5] = ["CodeEntity", "Pattern", "Rule", "Standard", "Decision"];
const REL_TABLES: [(&str, &str, &str); 5] = [
    ("IMPLEMENTS", "CodeEntity", "Pattern"),
    ("DEPENDS_ON", "CodeEntity", "CodeEntity"),
    ("VIOLATES", "CodeEntity", "Rule"),
    ("FOLLOWS", "CodeEntity", "Standard"),
    ("SUPPORTS", "Decision", "Pattern"),
];

/// Create the working-directory layout next to the database files
pub fn ensure_layout(root: &Path) -> Result<()> {
    for subdir in &SUBDIRS {
        let dir = root.join(subdir);
        fs::create_dir_all(&dir)
            .with_context(|| format!("Unable to create '{}'", dir.display()))?;
        let marker = dir.join(MARKER);
        if !marker.exists() {
            fs::write(&marker, b"")
                .with_context(|| format!("Unable to write '{}'", marker.display()))?;
        }
    }
    debug!(root = %root.display(), "working directory layout ensured");
    Ok(())
}

/// Create the fixed node and relation tables consumed by higher layers
pub(crate) async fn ensure_schema(conn: &Arc<dyn EngineConnection>) -> Result<()> {
    for table in &NODE_TABLES {
        let ddl = format!(
            "CREATE NODE TABLE IF NOT EXISTS {}(id STRING, name STRING, type STRING, PRIMARY KEY(id))",
            table
        );
        let _rows = conn
            .run(&ddl)
            .await
            .with_context(|| format!("Unable to create node table '{}'", table))?;
    }
    for (rel, from, to) in &REL_TABLES {
        let ddl = format!(
            "CREATE REL TABLE IF NOT EXISTS {}(FROM {} TO {})",
            rel, from, to
        );
        let _rows = conn
            .run(&ddl)
            .await
            .with_context(|| format!("Unable to create relation table '{}'", rel))?;
    }
    Ok(())
}
