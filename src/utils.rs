// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! `rukuzu` utils

use crate::types::Params;
use ahash::RandomState;
use serde_json::Value;
use std::collections::BTreeMap;

/// Compute the deterministic signature of a query and its parameters.
///
/// The query text is whitespace-normalized and lower-cased, and the
/// parameters are serialized with their keys in sorted order, so two
/// logically identical submissions always collapse onto the same cache
/// slot.  Uses `ahash` with fixed seeds so the digest is stable across
/// processes.
#[must_use]
pub fn signature(query: &str, params: &Params) -> String {
    let build_hasher = RandomState::with_seeds(
        0x243f_6a88_85a3_08d3,
        0x1319_8a2e_0370_7344,
        0xa409_3822_299f_31d0,
        0x082e_fa98_ec4e_6c89,
    );
    let normalized = normalize(query);
    let sorted: BTreeMap<&String, &Value> = params.iter().collect();
    let serialized = serde_json::to_string(&sorted).unwrap_or_default();
    format!(
        "{:016x}",
        build_hasher.hash_one(format!("{}\u{1f}{}", normalized, serialized))
    )
}

/// Collapse runs of whitespace to single spaces and lower-case the text
#[must_use]
pub fn normalize(query: &str) -> String {
    query
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ")
        .to_lowercase()
}

/// Rough payload size of a row set, used by the adaptive TTL calculation
#[must_use]
pub fn byte_estimate(rows: &[crate::types::Row]) -> usize {
    rows.iter()
        .map(|row| serde_json::to_string(row).map(|s| s.len()).unwrap_or(64))
        .sum()
}
