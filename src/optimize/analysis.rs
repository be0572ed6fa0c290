// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Heuristic query analysis
//!
//! Everything here is string-level: clause spans, filter classification,
//! and row estimates feed the rewrite rules and the adaptive TTL without
//! any pretense of a real Cypher parser.

use crate::model::QueryKind;
use crate::validate::pattern::mask_strings;
use crate::validate::complexity_score;
use getset::Getters;
use lazy_static::lazy_static;
use regex::Regex;

lazy_static! {
    static ref PROPERTY_REF: Regex =
        Regex::new(r"([A-Za-z_][A-Za-z0-9_]*)\.([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex");
    static ref NODE_PATTERN: Regex =
        Regex::new(r"\([A-Za-z_][A-Za-z0-9_]*:[A-Za-z_][A-Za-z0-9_]*[^)]*\)")
            .expect("valid regex");
    static ref BOUND_VAR: Regex =
        Regex::new(r"[(\[]([A-Za-z_][A-Za-z0-9_]*)[:)\]]").expect("valid regex");
    static ref CONDITION_SPLIT: Regex =
        Regex::new(r"(?i)\s+(?:AND|OR|XOR)\s+").expect("valid regex");
    static ref TEXT_OP: Regex =
        Regex::new(r"(?i)(CONTAINS|STARTS\s+WITH|ENDS\s+WITH|=~)").expect("valid regex");
    static ref RANGE_OP: Regex = Regex::new(r"<=|>=|<|>").expect("valid regex");
    static ref LIST_OP: Regex = Regex::new(r"(?i)\bIN\b").expect("valid regex");
    static ref AGG_CALL: Regex =
        Regex::new(r"(?i)\b(count|sum|avg|min|max|collect)\s*\(").expect("valid regex");
}

/// Clause keywords recognized by the segmenter, longest first so
/// `ORDER BY` wins over a bare prefix match
const CLAUSE_KEYWORDS: [&str; 16] = [
    "OPTIONAL MATCH",
    "DETACH DELETE",
    "ORDER BY",
    "MATCH",
    "CREATE",
    "MERGE",
    "UNWIND",
    "WITH",
    "WHERE",
    "RETURN",
    "SKIP",
    "LIMIT",
    "SET",
    "DELETE",
    "REMOVE",
    "UNION",
];

/// One top-level clause of a query
#[derive(Clone, Debug)]
pub(crate) struct Clause {
    /// The canonical keyword, upper-cased
    pub(crate) keyword: &'static str,
    /// Byte span of the whole clause, keyword included
    pub(crate) start: usize,
    ///
    pub(crate) end: usize,
}

impl Clause {
    pub(crate) fn text<'a>(&self, query: &'a str) -> &'a str {
        &query[self.start..self.end]
    }
}

/// Split a query into top-level clause spans.  String literals are
/// masked and bracketed sub-expressions are skipped, so keywords inside
/// patterns or literals never start a clause.
pub(crate) fn clauses(query: &str) -> Vec<Clause> {
    let masked = mask_strings(query).to_ascii_uppercase();
    let bytes = masked.as_bytes();
    let mut found: Vec<(usize, &'static str)> = Vec::new();
    let mut depth = 0_i32;
    let mut idx = 0_usize;
    while idx < bytes.len() {
        match bytes[idx] {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => depth -= 1,
            _ => {
                if depth == 0 && masked.is_char_boundary(idx) {
                    if let Some(keyword) = keyword_at(&masked, idx) {
                        found.push((idx, keyword));
                        idx += keyword.len();
                        continue;
                    }
                }
            }
        }
        idx += 1;
    }
    let mut out = Vec::with_capacity(found.len());
    for (pos, (start, keyword)) in found.iter().enumerate() {
        let end = found
            .get(pos + 1)
            .map_or_else(|| query.len(), |(next, _)| *next);
        out.push(Clause {
            keyword: *keyword,
            start: *start,
            end,
        });
    }
    out
}

fn keyword_at(masked: &str, idx: usize) -> Option<&'static str> {
    let prev_ok = idx == 0
        || masked[..idx]
            .chars()
            .next_back()
            .map_or(true, |c| !c.is_alphanumeric() && c != '_');
    if !prev_ok {
        return None;
    }
    for keyword in &CLAUSE_KEYWORDS {
        if masked[idx..].starts_with(keyword) {
            let after = idx + keyword.len();
            let next_ok = masked[after..]
                .chars()
                .next()
                .map_or(true, |c| !c.is_alphanumeric() && c != '_');
            if !next_ok {
                continue;
            }
            // `STARTS WITH` / `ENDS WITH` are operators, not a WITH stage
            if *keyword == "WITH" {
                let lead = masked[..idx].trim_end();
                if lead.ends_with("STARTS") || lead.ends_with("ENDS") {
                    return None;
                }
            }
            return Some(keyword);
        }
    }
    None
}

/// How a WHERE condition narrows the result
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum FilterKind {
    ///
    Equality,
    ///
    Range,
    ///
    Text,
    ///
    List,
    ///
    Other,
}

impl FilterKind {
    /// Heuristic fraction of rows the filter retains
    #[must_use]
    pub fn selectivity(self) -> f64 {
        match self {
            Self::Equality => 0.1,
            Self::Text => 0.3,
            Self::Range => 0.5,
            Self::List | Self::Other => 0.8,
        }
    }
}

/// One classified WHERE condition
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Filter {
    /// `var.property` path the condition constrains, when detectable
    field: Option<String>,
    ///
    kind: FilterKind,
    ///
    selectivity: f64,
}

/// Analysis metadata attached to every optimization plan
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Analysis {
    ///
    kind: QueryKind,
    ///
    complexity: u32,
    /// Labeled node patterns appearing in the query
    patterns: Vec<String>,
    /// Join descriptions: multi-MATCH combinations and relationship hops
    joins: Vec<String>,
    ///
    filters: Vec<Filter>,
    ///
    aggregations: Vec<String>,
    ///
    order_by: Option<String>,
    ///
    limit: Option<u64>,
    ///
    estimated_rows: u64,
    /// Fields worth indexing: equality-filtered or sorted
    suggested_indexes: Vec<String>,
    ///
    bottlenecks: Vec<String>,
}

/// Analyze one query
#[must_use]
pub fn analyze(query: &str) -> Analysis {
    let masked = mask_strings(query);
    let upper = masked.to_uppercase();
    let kind = classify(&upper);
    let complexity = complexity_score(query);
    let clause_list = clauses(query);

    let patterns: Vec<String> = NODE_PATTERN
        .find_iter(&masked)
        .map(|m| m.as_str().to_string())
        .collect();

    let match_count = clause_list
        .iter()
        .filter(|c| c.keyword.ends_with("MATCH"))
        .count();
    let where_count = clause_list.iter().filter(|c| c.keyword == "WHERE").count();
    let relationship_hops = masked.matches("-[").count() + masked.matches("- [").count();

    let mut joins = Vec::new();
    if match_count > 1 {
        joins.push(format!("{} MATCH clauses combined", match_count));
    }
    if relationship_hops > 0 {
        joins.push(format!("{} relationship traversal(s)", relationship_hops));
    }

    let mut filters = Vec::new();
    for clause in clause_list.iter().filter(|c| c.keyword == "WHERE") {
        let text = clause.text(query);
        let body = &text[text.len().min(5)..];
        for condition in CONDITION_SPLIT.split(body) {
            if !condition.trim().is_empty() {
                filters.push(classify_condition(condition));
            }
        }
    }

    let aggregations: Vec<String> = AGG_CALL
        .captures_iter(&masked)
        .map(|cap| cap[1].to_lowercase())
        .collect();

    let order_by = clause_list
        .iter()
        .find(|c| c.keyword == "ORDER BY")
        .map(|c| c.text(query)["ORDER BY".len()..].trim().to_string());

    // the trailing LIMIT governs; WITH-stage limits are inner
    let limit = clause_list
        .iter()
        .filter(|c| c.keyword == "LIMIT")
        .filter_map(|c| c.text(query)["LIMIT".len()..].trim().parse::<u64>().ok())
        .next_back();

    let mut suggested_indexes: Vec<String> = filters
        .iter()
        .filter(|f| *f.kind() == FilterKind::Equality)
        .filter_map(|f| f.field().clone())
        .collect();
    if let Some(fields) = &order_by {
        for field in fields.split(',') {
            let field = field.trim();
            if !field.is_empty() && !suggested_indexes.iter().any(|s| s == field) {
                suggested_indexes.push(field.to_string());
            }
        }
    }
    suggested_indexes.dedup();

    let mut estimated_rows = 10_000_f64;
    for filter in &filters {
        estimated_rows *= filter.selectivity();
    }
    let mut estimated_rows = estimated_rows.max(1.0) as u64;
    if let Some(cap) = limit {
        estimated_rows = estimated_rows.min(cap);
    }

    let mut bottlenecks = Vec::new();
    if match_count > 1 && where_count == 0 {
        bottlenecks.push("cartesian product between unfiltered MATCH clauses".to_string());
    }
    if kind == QueryKind::Read && limit.is_none() {
        bottlenecks.push("unbounded result set".to_string());
    }
    if !suggested_indexes.is_empty() {
        bottlenecks.push("filtered fields lack declared indexes".to_string());
    }

    Analysis {
        kind,
        complexity,
        patterns,
        joins,
        filters,
        aggregations,
        order_by,
        limit,
        estimated_rows,
        suggested_indexes,
        bottlenecks,
    }
}

fn classify(upper: &str) -> QueryKind {
    if upper.contains("DELETE") || upper.contains("REMOVE") {
        QueryKind::Delete
    } else if upper.contains("SET") {
        QueryKind::Update
    } else if upper.contains("CREATE") || upper.contains("MERGE") {
        QueryKind::Write
    } else {
        QueryKind::Read
    }
}

fn classify_condition(condition: &str) -> Filter {
    let field = PROPERTY_REF
        .captures(condition)
        .map(|cap| format!("{}.{}", &cap[1], &cap[2]));
    let kind = if TEXT_OP.is_match(condition) {
        FilterKind::Text
    } else if RANGE_OP.is_match(condition) {
        FilterKind::Range
    } else if LIST_OP.is_match(condition) {
        FilterKind::List
    } else if condition.contains('=') {
        FilterKind::Equality
    } else {
        FilterKind::Other
    };
    Filter {
        field,
        selectivity: kind.selectivity(),
        kind,
    }
}

/// Variables bound by a MATCH pattern, i.e. `(a:Label)` or `[r:TYPE]`
pub(crate) fn bound_vars(text: &str) -> Vec<String> {
    BOUND_VAR
        .captures_iter(&mask_strings(text))
        .map(|cap| cap[1].to_string())
        .collect()
}

/// Variables a condition dereferences, i.e. the `e` of `e.type`
pub(crate) fn referenced_vars(text: &str) -> Vec<String> {
    PROPERTY_REF
        .captures_iter(&mask_strings(text))
        .map(|cap| cap[1].to_string())
        .collect()
}
