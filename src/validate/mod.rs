// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Query validation and sanitization
//!
//! Every submission passes the full ordered pipeline before it can reach
//! the optimizer: structural bounds, parameter-name checks, the keyword
//! allow-list, security patterns, bracket balance, the complexity score,
//! parameter-reference checks, and (optionally) sanitization with a
//! re-check of the rewritten text.  Errors accumulate rather than
//! short-circuiting, so a verdict lists everything wrong at once.

pub(crate) mod inline;
pub(crate) mod pattern;

use crate::model::Risk;
use crate::types::Params;
use derive_builder::Builder;
use getset::Getters;
use pattern::{
    mask_strings, AGGREGATION_CALL, BARE_KEYWORD, BLOCK_COMMENT, LINE_COMMENT, PARAM_NAME,
    PARAM_REF, RELATIONSHIP, SECURITY_PATTERNS, VAR_LENGTH,
};
use serde_json::Value;
use std::collections::HashSet;
use tracing::debug;

const DEPTH_EXCEEDED_ERR: &str = "parameter nesting exceeds the configured depth";

/// Validator tuning knobs
#[derive(Builder, Clone, Debug, Getters)]
#[getset(get = "pub(crate)")]
pub struct Config {
    /// Longest admissible query text, in bytes
    #[builder(default = "10_000")]
    max_query_length: usize,
    ///
    #[builder(default = "100")]
    max_params: usize,
    /// Longest admissible string parameter, in characters
    #[builder(default = "5_000")]
    max_string_length: usize,
    ///
    #[builder(default = "1_000")]
    max_list_length: usize,
    /// Deepest admissible nesting inside object/list parameters
    #[builder(default = "5")]
    max_depth: usize,
    /// Total keys across all object parameters
    #[builder(default = "200")]
    max_object_keys: usize,
    /// Complexity score above which a query is rejected (strict) or
    /// flagged (lenient)
    #[builder(default = "50")]
    max_complexity: u32,
    /// Errors reject; lenient mode downgrades keyword and complexity
    /// violations to warnings
    #[builder(default = "true")]
    strict: bool,
    /// Strip comments and collapse whitespace when a query would
    /// otherwise carry them
    #[builder(default = "true")]
    sanitize: bool,
    /// The keyword vocabulary; anything outside it is flagged
    #[builder(default = "pattern::default_keywords()")]
    allowed_keywords: HashSet<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_query_length: 10_000,
            max_params: 100,
            max_string_length: 5_000,
            max_list_length: 1_000,
            max_depth: 5,
            max_object_keys: 200,
            max_complexity: 50,
            strict: true,
            sanitize: true,
            allowed_keywords: pattern::default_keywords(),
        }
    }
}

/// The validator's verdict on one submission
#[derive(Clone, Debug, Getters)]
#[getset(get = "pub")]
pub struct Verdict {
    /// false when any error was recorded
    valid: bool,
    /// The (possibly sanitized) query text
    cypher: String,
    /// The (possibly sanitized) parameters
    params: Params,
    ///
    warnings: Vec<String>,
    ///
    errors: Vec<String>,
    /// Highest risk observed across all pipeline steps
    risk: Risk,
    /// true when sanitization modified the query or parameters
    sanitized: bool,
    /// Name of the first security pattern that matched, if any
    injection: Option<String>,
}

impl Verdict {
    /// The matched security pattern, when the query was rejected as an
    /// injection attempt
    #[must_use]
    pub fn injection_pattern(&self) -> Option<&str> {
        self.injection.as_deref()
    }
}

/// The syntactic and security gate in front of the execution pipeline
#[derive(Clone, Debug, Default)]
pub struct Validator {
    config: Config,
}

impl Validator {
    ///
    #[must_use]
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Run the full validation pipeline over one submission
    #[must_use]
    pub fn validate(&self, cypher: &str, params: &Params) -> Verdict {
        let mut query = cypher.to_string();
        let mut params = params.clone();
        let mut warnings = Vec::new();
        let mut errors = Vec::new();
        let mut risk = Risk::Minimal;
        let mut injection = None;

        self.check_structure(&query, &params, &mut errors, &mut risk);
        self.check_param_names(&params, &mut errors, &mut risk);
        self.check_keywords(&query, &mut warnings, &mut errors, &mut risk);
        self.check_security(&query, &mut warnings, &mut errors, &mut risk, &mut injection);
        check_brackets(&query, &mut errors, &mut risk);
        self.check_complexity(&query, &mut warnings, &mut errors, &mut risk);
        check_param_refs(&query, &params, &mut warnings);

        let mut sanitized = false;
        if *self.config.sanitize() {
            sanitized = sanitize(&mut query, &mut params);
            if sanitized {
                debug!("sanitizer rewrote the query, re-running structural checks");
                self.check_structure(&query, &params, &mut errors, &mut risk);
                check_brackets(&query, &mut errors, &mut risk);
            }
        }

        Verdict {
            valid: errors.is_empty(),
            cypher: query,
            params,
            warnings,
            errors,
            risk,
            sanitized,
            injection,
        }
    }

    /// The complexity score of a query, per the weighted clause formula
    #[must_use]
    pub fn complexity(&self, cypher: &str) -> u32 {
        complexity_score(cypher)
    }

    fn check_structure(
        &self,
        query: &str,
        params: &Params,
        errors: &mut Vec<String>,
        risk: &mut Risk,
    ) {
        let cfg = &self.config;
        let before = errors.len();
        if query.len() > *cfg.max_query_length() {
            errors.push(format!(
                "query length {} exceeds the maximum of {}",
                query.len(),
                cfg.max_query_length()
            ));
        }
        if params.len() > *cfg.max_params() {
            errors.push(format!(
                "parameter count {} exceeds the maximum of {}",
                params.len(),
                cfg.max_params()
            ));
        }
        let mut total_keys = 0_usize;
        for (name, value) in params {
            self.check_value(name, value, 0, &mut total_keys, errors);
        }
        if total_keys > *cfg.max_object_keys() {
            errors.push(format!(
                "object parameters carry {} keys, more than the maximum of {}",
                total_keys,
                cfg.max_object_keys()
            ));
        }
        if errors.len() > before {
            *risk = (*risk).max(Risk::High);
        }
    }

    fn check_value(
        &self,
        name: &str,
        value: &Value,
        depth: usize,
        total_keys: &mut usize,
        errors: &mut Vec<String>,
    ) {
        if depth > *self.config.max_depth() {
            errors.push(format!("parameter '{}': {}", name, DEPTH_EXCEEDED_ERR));
            return;
        }
        match value {
            Value::String(s) => {
                if s.len() > *self.config.max_string_length() {
                    errors.push(format!(
                        "parameter '{}' is {} characters long, more than the maximum of {}",
                        name,
                        s.len(),
                        self.config.max_string_length()
                    ));
                }
            }
            Value::Array(items) => {
                if items.len() > *self.config.max_list_length() {
                    errors.push(format!(
                        "parameter '{}' has {} elements, more than the maximum of {}",
                        name,
                        items.len(),
                        self.config.max_list_length()
                    ));
                }
                for item in items {
                    self.check_value(name, item, depth + 1, total_keys, errors);
                }
            }
            Value::Object(map) => {
                *total_keys += map.len();
                for item in map.values() {
                    self.check_value(name, item, depth + 1, total_keys, errors);
                }
            }
            _ => {}
        }
    }

    fn check_param_names(&self, params: &Params, errors: &mut Vec<String>, risk: &mut Risk) {
        for name in params.keys() {
            if !PARAM_NAME.is_match(name) {
                errors.push(format!("invalid parameter name '{}'", name));
                *risk = (*risk).max(Risk::High);
            }
        }
    }

    fn check_keywords(
        &self,
        query: &str,
        warnings: &mut Vec<String>,
        errors: &mut Vec<String>,
        risk: &mut Risk,
    ) {
        let masked = mask_strings(query);
        for token in BARE_KEYWORD.find_iter(&masked) {
            // a token preceded by ':' is a node label or relationship
            // type, not vocabulary
            if masked[..token.start()].trim_end().ends_with(':') {
                continue;
            }
            if !self.config.allowed_keywords().contains(token.as_str()) {
                let msg = format!("keyword '{}' is not in the allowed vocabulary", token.as_str());
                if *self.config.strict() {
                    errors.push(msg);
                    *risk = (*risk).max(Risk::High);
                } else {
                    warnings.push(msg);
                    *risk = (*risk).max(Risk::Medium);
                }
            }
        }
    }

    fn check_security(
        &self,
        query: &str,
        warnings: &mut Vec<String>,
        errors: &mut Vec<String>,
        risk: &mut Risk,
        injection: &mut Option<String>,
    ) {
        let masked = mask_strings(query);
        for pat in SECURITY_PATTERNS.iter() {
            if pat.regex.is_match(&masked) {
                if pat.sanitizable && !*self.config.strict() && *self.config.sanitize() {
                    warnings.push(format!("{} will be stripped", pat.name));
                    *risk = (*risk).max(Risk::Medium);
                } else {
                    errors.push(format!("security pattern matched: {}", pat.name));
                    *risk = Risk::Critical;
                    if injection.is_none() {
                        *injection = Some(pat.name.to_string());
                    }
                }
            }
        }
    }

    fn check_complexity(
        &self,
        query: &str,
        warnings: &mut Vec<String>,
        errors: &mut Vec<String>,
        risk: &mut Risk,
    ) {
        let score = complexity_score(query);
        if score > *self.config.max_complexity() {
            let msg = format!(
                "complexity score {} exceeds the maximum of {}",
                score,
                self.config.max_complexity()
            );
            if *self.config.strict() {
                errors.push(msg);
                *risk = (*risk).max(Risk::High);
            } else {
                warnings.push(msg);
                *risk = (*risk).max(Risk::Medium);
            }
        }
    }
}

/// `1 + 2·MATCH + 3·relationship + 10·variable-length + 3·aggregation +
/// 5·WITH + 2·depth`
#[must_use]
pub(crate) fn complexity_score(query: &str) -> u32 {
    let masked = mask_strings(query);
    let upper = masked.to_ascii_uppercase();
    let matches = upper.matches("MATCH").count() as u32;
    let withs = upper.matches("WITH").count() as u32;
    let relationships = RELATIONSHIP.find_iter(&masked).count() as u32;
    let var_length = VAR_LENGTH.find_iter(&masked).count() as u32;
    let aggregations = AGGREGATION_CALL.find_iter(&masked).count() as u32;
    let depth = bracket_depth(&masked);
    1 + 2 * matches + 3 * relationships + 10 * var_length + 3 * aggregations + 5 * withs
        + 2 * depth
}

fn bracket_depth(masked: &str) -> u32 {
    let mut depth = 0_u32;
    let mut max_depth = 0_u32;
    for ch in masked.chars() {
        match ch {
            '(' | '[' | '{' => {
                depth += 1;
                max_depth = max_depth.max(depth);
            }
            ')' | ']' | '}' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    max_depth
}

fn check_brackets(query: &str, errors: &mut Vec<String>, risk: &mut Risk) {
    let masked = mask_strings(query);
    let mut stack = Vec::new();
    let mut balanced = true;
    for ch in masked.chars() {
        match ch {
            '(' | '[' | '{' => stack.push(ch),
            ')' => balanced &= stack.pop() == Some('('),
            ']' => balanced &= stack.pop() == Some('['),
            '}' => balanced &= stack.pop() == Some('{'),
            _ => {}
        }
        if !balanced {
            break;
        }
    }
    if !balanced || !stack.is_empty() {
        errors.push("unbalanced brackets outside string literals".to_string());
        *risk = (*risk).max(Risk::High);
    }
}

fn check_param_refs(query: &str, params: &Params, warnings: &mut Vec<String>) {
    let masked = mask_strings(query);
    for cap in PARAM_REF.captures_iter(&masked) {
        let name = &cap[1];
        if !params.contains_key(name) {
            warnings.push(format!("query references undefined parameter '${}'", name));
        }
    }
}

/// Strip comments and collapse whitespace runs.  Returns true when the
/// query text changed.  Quote escaping for string parameters is owned by
/// the inlining step so values are escaped exactly once.
fn sanitize(query: &mut String, _params: &mut Params) -> bool {
    let original = query.clone();
    let stripped = LINE_COMMENT.replace_all(query, " ");
    let stripped = BLOCK_COMMENT.replace_all(&stripped, " ");
    let collapsed = stripped
        .split_whitespace()
        .collect::<Vec<&str>>()
        .join(" ");
    *query = collapsed;
    *query != original
}
