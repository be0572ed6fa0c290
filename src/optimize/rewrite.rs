// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Rewrite rules
//!
//! Each rule is a named, isolated unit with a `condition` predicate and
//! an `apply` transformation; the registry is the ordering authority.
//! Rules are idempotent: re-applying a rule to its own output changes
//! nothing.  Improvement estimates are configured weights, not
//! measurements.

use crate::model::OptimizationLevel;
use crate::optimize::analysis::{bound_vars, clauses, referenced_vars, Analysis};
use anyhow::Result;
use std::fmt::Debug;

/// What one rule did to the query
#[derive(Clone, Debug)]
pub(crate) struct RewriteOutcome {
    pub(crate) query: String,
    pub(crate) modified: bool,
    pub(crate) improvement: u32,
}

impl RewriteOutcome {
    fn unchanged(query: &str, improvement: u32) -> Self {
        Self {
            query: query.to_string(),
            modified: false,
            improvement,
        }
    }
}

/// A single rewrite rule
pub(crate) trait RewriteRule: Debug + Send + Sync {
    /// Stable rule name recorded on the plan
    fn name(&self) -> &'static str;

    /// Whether the rule has anything to contribute for this analysis
    fn condition(&self, analysis: &Analysis) -> bool;

    /// Transform the query.  A failing rule is logged and skipped; it
    /// never fails the caller's query.
    fn apply(&self, query: &str, analysis: &Analysis) -> Result<RewriteOutcome>;
}

/// Configured improvement weights, one per rule
#[derive(Clone, Copy, Debug)]
pub struct Weights {
    ///
    pub filter_pushdown: u32,
    ///
    pub index_hints: u32,
    ///
    pub limit_pushdown: u32,
    ///
    pub join_reorder: u32,
}

impl Default for Weights {
    fn default() -> Self {
        Self {
            filter_pushdown: 15,
            index_hints: 10,
            limit_pushdown: 10,
            join_reorder: 20,
        }
    }
}

/// Build the ordered rule registry for a given optimization level.
/// Conservative runs skip join reordering.
pub(crate) fn registry(level: OptimizationLevel, weights: Weights) -> Vec<Box<dyn RewriteRule>> {
    let mut rules: Vec<Box<dyn RewriteRule>> = vec![
        Box::new(FilterPushdown {
            weight: weights.filter_pushdown,
        }),
        Box::new(IndexHints {
            weight: weights.index_hints,
        }),
        Box::new(LimitPushdown {
            weight: weights.limit_pushdown,
        }),
    ];
    if level != OptimizationLevel::Conservative {
        rules.push(Box::new(JoinReorder {
            weight: weights.join_reorder,
        }));
    }
    rules
}

/// Move a trailing WHERE next to the first MATCH when it only references
/// variables the first MATCH binds
#[derive(Debug)]
struct FilterPushdown {
    weight: u32,
}

impl RewriteRule for FilterPushdown {
    fn name(&self) -> &'static str {
        "filter_pushdown"
    }

    fn condition(&self, analysis: &Analysis) -> bool {
        !analysis.filters().is_empty() && analysis.joins().iter().any(|j| j.contains("MATCH"))
    }

    fn apply(&self, query: &str, _analysis: &Analysis) -> Result<RewriteOutcome> {
        let spans = clauses(query);
        // looking for MATCH .. MATCH WHERE where the filter only touches
        // the first MATCH's variables
        let keywords: Vec<&str> = spans.iter().map(|c| c.keyword).collect();
        for idx in 0..keywords.len().saturating_sub(2) {
            if keywords[idx] == "MATCH"
                && keywords[idx + 1] == "MATCH"
                && keywords[idx + 2] == "WHERE"
            {
                let first_vars = bound_vars(spans[idx].text(query));
                let referenced = referenced_vars(spans[idx + 2].text(query));
                if !referenced.is_empty()
                    && referenced.iter().all(|var| first_vars.contains(var))
                {
                    let mut out = String::with_capacity(query.len() + 1);
                    out.push_str(&query[..spans[idx].end]);
                    out.push_str(spans[idx + 2].text(query).trim_end());
                    out.push(' ');
                    out.push_str(spans[idx + 1].text(query));
                    out.push_str(&query[spans[idx + 2].end..]);
                    return Ok(RewriteOutcome {
                        query: collapse(&out),
                        modified: true,
                        improvement: self.weight,
                    });
                }
            }
        }
        Ok(RewriteOutcome::unchanged(query, self.weight))
    }
}

/// Record index suggestions on the plan; the query text is engine-agnostic
/// and stays untouched
#[derive(Debug)]
struct IndexHints {
    weight: u32,
}

impl RewriteRule for IndexHints {
    fn name(&self) -> &'static str {
        "index_hints"
    }

    fn condition(&self, analysis: &Analysis) -> bool {
        !analysis.suggested_indexes().is_empty()
    }

    fn apply(&self, query: &str, _analysis: &Analysis) -> Result<RewriteOutcome> {
        Ok(RewriteOutcome::unchanged(query, self.weight))
    }
}

/// Copy the final LIMIT into a WITH stage whose ORDER BY lacks one
#[derive(Debug)]
struct LimitPushdown {
    weight: u32,
}

impl RewriteRule for LimitPushdown {
    fn name(&self) -> &'static str {
        "limit_pushdown"
    }

    fn condition(&self, analysis: &Analysis) -> bool {
        analysis.limit().is_some()
    }

    fn apply(&self, query: &str, analysis: &Analysis) -> Result<RewriteOutcome> {
        let limit = match analysis.limit() {
            Some(limit) => *limit,
            None => return Ok(RewriteOutcome::unchanged(query, 0)),
        };
        let spans = clauses(query);
        let keywords: Vec<&str> = spans.iter().map(|c| c.keyword).collect();
        for idx in 0..keywords.len().saturating_sub(2) {
            if keywords[idx] == "WITH"
                && keywords[idx + 1] == "ORDER BY"
                && keywords[idx + 2] != "LIMIT"
                && keywords[idx + 2] != "SKIP"
            {
                let mut out = String::with_capacity(query.len() + 12);
                out.push_str(query[..spans[idx + 1].end].trim_end());
                out.push_str(&format!(" LIMIT {} ", limit));
                out.push_str(&query[spans[idx + 2].start..]);
                return Ok(RewriteOutcome {
                    query: collapse(&out),
                    modified: true,
                    improvement: self.weight,
                });
            }
        }
        Ok(RewriteOutcome::unchanged(query, self.weight))
    }
}

/// Order leading MATCH groups so the most selective one runs first
#[derive(Debug)]
struct JoinReorder {
    weight: u32,
}

impl RewriteRule for JoinReorder {
    fn name(&self) -> &'static str {
        "join_reorder"
    }

    fn condition(&self, analysis: &Analysis) -> bool {
        analysis.joins().iter().any(|j| j.contains("MATCH")) && !analysis.filters().is_empty()
    }

    fn apply(&self, query: &str, _analysis: &Analysis) -> Result<RewriteOutcome> {
        let spans = clauses(query);
        // leading (MATCH [WHERE]) groups; anything else ends the window
        let mut groups: Vec<(String, f64)> = Vec::new();
        let mut cursor = 0_usize;
        while cursor < spans.len() {
            if spans[cursor].keyword != "MATCH" {
                break;
            }
            let mut text = spans[cursor].text(query).to_string();
            let mut selectivity = 1.0_f64;
            if spans.get(cursor + 1).map(|c| c.keyword) == Some("WHERE") {
                let where_text = spans[cursor + 1].text(query);
                // a bare WHERE clause analyzes fine on its own
                selectivity = crate::optimize::analysis::analyze(where_text)
                    .filters()
                    .iter()
                    .map(|f| *f.selectivity())
                    .fold(1.0, f64::min);
                text.push_str(where_text);
                cursor += 1;
            }
            groups.push((text, selectivity));
            cursor += 1;
        }
        if groups.len() < 2 || cursor >= spans.len() {
            return Ok(RewriteOutcome::unchanged(query, self.weight));
        }
        let tail_start = spans[cursor].start;
        let mut reordered = groups.clone();
        reordered.sort_by(|a, b| a.1.partial_cmp(&b.1).unwrap_or(std::cmp::Ordering::Equal));
        if reordered
            .iter()
            .map(|(text, _)| text.as_str())
            .eq(groups.iter().map(|(text, _)| text.as_str()))
        {
            return Ok(RewriteOutcome::unchanged(query, self.weight));
        }
        let mut out = String::with_capacity(query.len());
        for (text, _selectivity) in &reordered {
            out.push_str(text.trim());
            out.push(' ');
        }
        out.push_str(&query[tail_start..]);
        Ok(RewriteOutcome {
            query: collapse(&out),
            modified: true,
            improvement: self.weight,
        })
    }
}

fn collapse(query: &str) -> String {
    query.split_whitespace().collect::<Vec<&str>>().join(" ")
}
