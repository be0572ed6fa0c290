// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! Parameter inlining
//!
//! The engine contract accepts a single text statement with no bind
//! interface, so every `$name` reference is substituted with a SQL-style
//! literal before execution.  Against a driver with native binding this
//! whole module disappears and parameters are forwarded directly.

use crate::error::RukuzuErr::NonFiniteNumber;
use crate::types::Params;
use crate::validate::pattern::PARAM_REF;
use anyhow::Result;
use serde_json::Value;

/// Substitute every known `$name` reference with a literal.  References
/// without a matching parameter are left untouched; the validator has
/// already warned about them.
pub(crate) fn inline(query: &str, params: &Params) -> Result<String> {
    let mut out = String::with_capacity(query.len());
    let mut last = 0_usize;
    for cap in PARAM_REF.captures_iter(query) {
        let whole = cap.get(0).ok_or_else(|| {
            crate::error::RukuzuErr::Internal {
                msg: "parameter capture without a match".to_string(),
            }
        })?;
        let name = &cap[1];
        out.push_str(&query[last..whole.start()]);
        match params.get(name) {
            Some(value) => out.push_str(&render(name, value)?),
            None => out.push_str(whole.as_str()),
        }
        last = whole.end();
    }
    out.push_str(&query[last..]);
    Ok(out)
}

/// Render one parameter value as a literal: `NULL`, a decimal number, an
/// unquoted boolean, a single-quoted string with `'` doubled, or a
/// bracketed list
pub(crate) fn render(name: &str, value: &Value) -> Result<String> {
    match value {
        Value::Null => Ok("NULL".to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Number(n) => {
            let finite = n.as_f64().map_or(false, f64::is_finite);
            if finite {
                Ok(n.to_string())
            } else {
                Err(NonFiniteNumber {
                    name: name.to_string(),
                }
                .into())
            }
        }
        Value::String(s) => Ok(format!("'{}'", s.replace('\'', "''"))),
        Value::Array(items) => {
            let rendered: Result<Vec<String>> =
                items.iter().map(|item| render(name, item)).collect();
            Ok(format!("[{}]", rendered?.join(", ")))
        }
        Value::Object(map) => {
            let rendered: Result<Vec<String>> = map
                .iter()
                .map(|(key, item)| Ok(format!("{}: {}", key, render(name, item)?)))
                .collect();
            Ok(format!("{{{}}}", rendered?.join(", ")))
        }
    }
}

#[cfg(test)]
mod test {
    use super::{inline, render};
    use crate::types::Params;
    use anyhow::Result;
    use serde_json::json;

    #[test]
    fn inlines_each_kind() -> Result<()> {
        let mut params = Params::new();
        let _ = params.insert("name".to_string(), json!("O'Brien"));
        let _ = params.insert("age".to_string(), json!(42));
        let _ = params.insert("active".to_string(), json!(true));
        let _ = params.insert("tags".to_string(), json!(["a", "b"]));
        let _ = params.insert("missing_val".to_string(), json!(null));
        let out = inline(
            "CREATE (n:Person {name: $name, age: $age, active: $active, tags: $tags, x: $missing_val})",
            &params,
        )?;
        assert!(out.contains("'O''Brien'"));
        assert!(out.contains("age: 42"));
        assert!(out.contains("active: true"));
        assert!(out.contains("tags: ['a', 'b']"));
        assert!(out.contains("x: NULL"));
        assert!(!out.contains('$'));
        Ok(())
    }

    #[test]
    fn unknown_reference_is_left_alone() -> Result<()> {
        let out = inline("MATCH (n) WHERE n.t = $ghost RETURN n", &Params::new())?;
        assert!(out.contains("$ghost"));
        Ok(())
    }

    #[test]
    fn prefix_names_do_not_collide() -> Result<()> {
        let mut params = Params::new();
        let _ = params.insert("p".to_string(), json!(1));
        let _ = params.insert("p2".to_string(), json!(2));
        let out = inline("RETURN $p, $p2", &params)?;
        assert_eq!(out, "RETURN 1, 2");
        Ok(())
    }

    #[test]
    fn renders_nested_lists() -> Result<()> {
        assert_eq!(render("x", &json!([[1, 2], [3]]))?, "[[1, 2], [3]]");
        Ok(())
    }

    #[test]
    fn quotes_are_doubled_exactly_once() -> Result<()> {
        assert_eq!(render("s", &json!("a'b"))?, "'a''b'");
        Ok(())
    }
}
