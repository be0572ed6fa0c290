// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Streaming trait implementation

use crate::coordinator::Coordinator;
use crate::exec::stream::ResultStream;
use crate::model::stream::input::Config;
use crate::Streaming;
use anyhow::Result;

impl Streaming for Coordinator {
    fn create_query_stream(&self, config: Config) -> Result<ResultStream> {
        self.open_stream(config)
    }
}
