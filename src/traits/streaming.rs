// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Streaming operations trait

use crate::exec::stream::ResultStream;
use crate::model::stream::input::Config;
use anyhow::Result;

/// Streaming Operations
pub trait Streaming {
    /// Open a lazy, single-use, paginated stream over a query's rows.
    /// Nothing touches the engine until the stream is polled.
    fn create_query_stream(&self, config: Config) -> Result<ResultStream>;
}
