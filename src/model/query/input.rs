// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Query Input Structs

use crate::types::Params;
use derive_builder::Builder;
use getset::Getters;
use std::time::Duration;

const EMPTY_QUERY_ERR: &str = "cypher cannot be empty!";

/// A single query submission
#[derive(Builder, Clone, Debug, Default, Getters)]
#[getset(get = "pub(crate)")]
#[builder(build_fn(validate = "Self::validate"))]
pub struct Config {
    /// The Cypher text to execute
    #[builder(setter(into))]
    cypher: String,
    /// Named parameters referenced as `$name` in the query
    #[builder(default)]
    params: Params,
    /// Per-query deadline; the effective deadline is the smaller of this
    /// and the coordinator's default
    #[builder(setter(strip_option), default)]
    timeout: Option<Duration>,
    /// Skip the result-cache probe for this submission
    #[builder(default)]
    bypass_cache: bool,
    /// Client identity for rate limiting; anonymous submissions share
    /// one bucket
    #[builder(setter(into, strip_option), default)]
    client_id: Option<String>,
}

impl ConfigBuilder {
    fn validate(&self) -> std::result::Result<(), String> {
        self.cypher.as_ref().map_or(Ok(()), |cypher| {
            if cypher.trim().is_empty() {
                Err(EMPTY_QUERY_ERR.into())
            } else {
                Ok(())
            }
        })
    }
}

#[cfg(test)]
mod test {
    use super::ConfigBuilder;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn builds_with_defaults() -> Result<()> {
        let config = ConfigBuilder::default()
            .cypher("MATCH (n) RETURN n")
            .build()?;
        assert!(config.params().is_empty());
        assert!(config.timeout().is_none());
        assert!(!config.bypass_cache());
        Ok(())
    }

    #[test]
    fn rejects_empty_cypher() {
        assert!(ConfigBuilder::default().cypher("   ").build().is_err());
    }

    #[test]
    fn carries_params() -> Result<()> {
        let mut params = crate::types::Params::new();
        let _ = params.insert("t".to_string(), json!("function"));
        let config = ConfigBuilder::default()
            .cypher("MATCH (e) WHERE e.type = $t RETURN e")
            .params(params)
            .client_id("tester")
            .build()?;
        assert_eq!(config.params().len(), 1);
        assert_eq!(config.client_id().as_deref(), Some("tester"));
        Ok(())
    }
}
