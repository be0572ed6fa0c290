// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Types

use libeither::Either;
use serde_json::Value;
use std::collections::HashMap;

/// One result row: column name mapped to a scalar or graph value as
/// yielded by the engine.  Rows are treated opaquely downstream.
pub type Row = serde_json::Map<String, Value>;

/// Rows from a single execution
pub type RowVec = Vec<Row>;

/// Named query parameters: scalar or list-of-scalar JSON values
pub type Params = HashMap<String, Value>;

/// The outcome of a single operation inside a batch or composite
/// transaction: an error description on the left or the operation's rows
/// on the right
pub type OpEither = Either<String, RowVec>;
