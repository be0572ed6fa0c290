// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Stream Input Structs

use crate::types::Params;
use derive_builder::Builder;
use getset::Getters;
use std::time::Duration;

const EMPTY_QUERY_ERR: &str = "query cannot be empty!";
const BATCH_SIZE_ZERO_ERR: &str = "batch_size cannot be 0!";

/// Result stream configuration.  The source query is paginated with
/// `SKIP`/`LIMIT`, so it must not carry its own pagination clauses unless
/// the caller wants them respected verbatim.
#[derive(Builder, Clone, Debug, Default, Getters)]
#[getset(get = "pub(crate)")]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// The query to page through
    #[builder(setter(into))]
    query: String,
    ///
    #[builder(default)]
    params: Params,
    /// Rows fetched per engine poll
    #[builder(default = "100")]
    batch_size: usize,
    /// Deadline applied to every individual poll
    #[builder(default = "Duration::from_secs(10)")]
    timeout: Duration,
    /// Client identity for rate limiting
    #[builder(setter(into, strip_option), default)]
    client_id: Option<String>,
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        if let Some(query) = self.query.as_ref() {
            if query.trim().is_empty() {
                return Err(EMPTY_QUERY_ERR.into());
            }
        }
        if let Some(0) = self.batch_size {
            return Err(BATCH_SIZE_ZERO_ERR.into());
        }
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::ConfigBuilder;
    use anyhow::Result;
    use std::time::Duration;

    #[test]
    fn defaults() -> Result<()> {
        let config = ConfigBuilder::default()
            .query("MATCH (e:CodeEntity) RETURN e.id")
            .build()?;
        assert_eq!(*config.batch_size(), 100);
        assert_eq!(*config.timeout(), Duration::from_secs(10));
        Ok(())
    }

    #[test]
    fn zero_batch_size_is_rejected() {
        assert!(ConfigBuilder::default()
            .query("MATCH (n) RETURN n")
            .batch_size(0)
            .build()
            .is_err());
    }

    #[test]
    fn empty_query_is_rejected() {
        assert!(ConfigBuilder::default().query("").build().is_err());
    }
}
