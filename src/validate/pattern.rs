// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Security patterns and the Cypher keyword allow-list

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashSet;

/// A named injection pattern.  Matching any of these flips the risk to
/// critical.
#[derive(Debug)]
pub(crate) struct SecurityPattern {
    pub(crate) name: &'static str,
    pub(crate) regex: Regex,
    /// Comments can be stripped by the sanitizer in lenient mode; the
    /// rest always reject
    pub(crate) sanitizable: bool,
}

lazy_static! {
    pub(crate) static ref SECURITY_PATTERNS: Vec<SecurityPattern> = vec![
        SecurityPattern {
            name: "stacked ddl statement",
            regex: Regex::new(r"(?i);\s*(DROP|TRUNCATE|ALTER)\b").expect("valid regex"),
            sanitizable: false,
        },
        SecurityPattern {
            name: "inline comment",
            regex: Regex::new(r"--|/\*").expect("valid regex"),
            sanitizable: true,
        },
        SecurityPattern {
            name: "exec call",
            regex: Regex::new(r"(?i)\b(EXEC|EVAL|SYSTEM)\s*\(").expect("valid regex"),
            sanitizable: false,
        },
        SecurityPattern {
            name: "template literal",
            regex: Regex::new(r"\$\{[^}]*\}").expect("valid regex"),
            sanitizable: false,
        },
        SecurityPattern {
            name: "server-side include",
            regex: Regex::new(r"<%").expect("valid regex"),
            sanitizable: false,
        },
        SecurityPattern {
            name: "file loading clause",
            regex: Regex::new(r"(?i)\bLOAD\s+CSV\b").expect("valid regex"),
            sanitizable: false,
        },
    ];
    pub(crate) static ref BARE_KEYWORD: Regex =
        Regex::new(r"\b[A-Z][A-Z_]+\b").expect("valid regex");
    pub(crate) static ref PARAM_NAME: Regex =
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").expect("valid regex");
    pub(crate) static ref PARAM_REF: Regex =
        Regex::new(r"\$([A-Za-z_][A-Za-z0-9_]*)").expect("valid regex");
    pub(crate) static ref LINE_COMMENT: Regex =
        Regex::new(r"--[^\n]*").expect("valid regex");
    pub(crate) static ref BLOCK_COMMENT: Regex =
        Regex::new(r"/\*.*?\*/").expect("valid regex");
    pub(crate) static ref AGGREGATION_CALL: Regex =
        Regex::new(r"(?i)\b(count|sum|avg|min|max|collect)\s*\(").expect("valid regex");
    pub(crate) static ref RELATIONSHIP: Regex = Regex::new(r"-\s*\[").expect("valid regex");
    pub(crate) static ref VAR_LENGTH: Regex =
        Regex::new(r"\[[^\]]*\*[^\]]*\]").expect("valid regex");
}

/// The default keyword vocabulary: reading, writing, aggregation,
/// predicate, and schema keywords only.  Administrative and file-loading
/// vocabulary is absent on purpose.
#[must_use]
pub(crate) fn default_keywords() -> HashSet<String> {
    [
        // reading
        "MATCH", "OPTIONAL", "WHERE", "RETURN", "WITH", "UNWIND", "ORDER", "BY", "SKIP", "LIMIT",
        "DISTINCT", "AS", "ASC", "DESC", "ASCENDING", "DESCENDING", "UNION",
        // writing
        "CREATE", "MERGE", "SET", "DELETE", "DETACH", "REMOVE", "ON",
        // aggregation
        "COUNT", "SUM", "AVG", "MIN", "MAX", "COLLECT", "ALL",
        // predicates and expressions
        "AND", "OR", "NOT", "XOR", "IN", "IS", "NULL", "TRUE", "FALSE", "STARTS", "ENDS",
        "CONTAINS", "EXISTS", "CASE", "WHEN", "THEN", "ELSE", "END",
        // schema
        "NODE", "REL", "TABLE", "PRIMARY", "KEY", "STRING", "INT64", "DOUBLE", "BOOLEAN",
        "TIMESTAMP", "FROM", "TO", "IF",
    ]
    .iter()
    .map(|kw| (*kw).to_string())
    .collect()
}

/// Blank out string-literal contents so scans never match quoted data.
/// Quotes themselves survive; everything between them becomes spaces.
/// Byte offsets are preserved (one space per masked byte) so spans found
/// on the masked text index safely into the original.
#[must_use]
pub(crate) fn mask_strings(query: &str) -> String {
    let mut out = String::with_capacity(query.len());
    let mut in_quote: Option<char> = None;
    let mut escaped = false;
    for ch in query.chars() {
        match in_quote {
            Some(quote) => {
                if escaped {
                    escaped = false;
                    push_blank(&mut out, ch);
                } else if ch == '\\' {
                    escaped = true;
                    push_blank(&mut out, ch);
                } else if ch == quote {
                    in_quote = None;
                    out.push(quote);
                } else {
                    push_blank(&mut out, ch);
                }
            }
            None => {
                if ch == '\'' || ch == '"' {
                    in_quote = Some(ch);
                }
                out.push(ch);
            }
        }
    }
    out
}

fn push_blank(out: &mut String, ch: char) {
    for _ in 0..ch.len_utf8() {
        out.push(' ');
    }
}

#[cfg(test)]
mod test {
    use super::{default_keywords, mask_strings, BARE_KEYWORD, SECURITY_PATTERNS};

    #[test]
    fn stacked_ddl_matches() {
        let masked = mask_strings("MATCH (n) RETURN n; DROP TABLE Pattern");
        assert!(SECURITY_PATTERNS
            .iter()
            .any(|p| p.name == "stacked ddl statement" && p.regex.is_match(&masked)));
    }

    #[test]
    fn quoted_text_never_matches() {
        let masked = mask_strings("MATCH (n) WHERE n.note = '; DROP TABLE x' RETURN n");
        assert!(!SECURITY_PATTERNS
            .iter()
            .any(|p| p.name == "stacked ddl statement" && p.regex.is_match(&masked)));
    }

    #[test]
    fn escaped_quote_stays_inside_string() {
        let masked = mask_strings(r"RETURN 'it\'s masked -- fully'");
        assert!(!masked.contains("--"));
    }

    #[test]
    fn keyword_extraction_sees_bare_uppercase_only() {
        let masked = mask_strings("MATCH (n:CodeEntity) WHERE n.name = 'RETURN' RETURN n");
        let tokens: Vec<&str> = BARE_KEYWORD.find_iter(&masked).map(|m| m.as_str()).collect();
        assert_eq!(tokens, vec!["MATCH", "WHERE", "RETURN"]);
    }

    #[test]
    fn allow_list_has_no_admin_vocabulary() {
        let keywords = default_keywords();
        assert!(keywords.contains("MATCH"));
        assert!(keywords.contains("MERGE"));
        assert!(!keywords.contains("DROP"));
        assert!(!keywords.contains("CALL"));
        assert!(!keywords.contains("LOAD"));
    }
}
