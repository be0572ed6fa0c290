// Copyright (c) 2026 rukuzu developers
//
// Licensed under the Apache License, Version 2.0
// <LICENSE-APACHE or http://www.apache.org/licenses/LICENSE-2.0> or the MIT
// license <LICENSE-MIT or http://opensource.org/licenses/MIT>, at your
// option. All files in the project carrying such notice may not be copied,
// modified, or distributed except according to those terms.

//! An in-memory mock engine for doctests and integration tests
//!
//! Understands just enough inlined Cypher to exercise the whole
//! orchestration layer: `CREATE (n:Label {..}) RETURN n`, label scans
//! with a single equality filter, `SKIP`/`LIMIT` pagination, `RETURN 1`
//! probes, and the text-statement transaction fallback with real staged
//! semantics (BEGIN, COMMIT, ROLLBACK, savepoints).  Canned responses
//! can be mounted by substring, failures injected per pattern, and every
//! executed statement is logged.

use crate::engine::{Engine, EngineConnection};
use crate::types::{Row, RowVec};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

#[derive(Debug)]
struct Mount {
    needle: String,
    rows: RowVec,
}

#[derive(Debug)]
struct FailRule {
    needle: String,
    msg: String,
    remaining: u32,
}

#[derive(Debug, Default)]
struct MockState {
    tables: Mutex<HashMap<String, RowVec>>,
    mounts: Mutex<Vec<Mount>>,
    fail_rules: Mutex<Vec<FailRule>>,
    log: Mutex<Vec<String>>,
    latency: Mutex<Duration>,
    closed: Mutex<bool>,
}

/// The in-memory engine handed to `CoordinatorBuilder` in tests
#[derive(Clone, Debug, Default)]
pub struct MockEngine {
    state: Arc<MockState>,
}

impl MockEngine {
    ///
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Mount a canned row set served for any query containing `needle`.
    /// Mounted responses win over the built-in table scan and still
    /// respect trailing `SKIP`/`LIMIT` clauses.
    pub fn mount(&self, needle: &str, rows: RowVec) {
        self.state.mounts.lock().push(Mount {
            needle: needle.to_string(),
            rows,
        });
    }

    /// Fail the next `times` queries containing `needle` with `msg`
    pub fn fail(&self, needle: &str, msg: &str, times: u32) {
        self.state.fail_rules.lock().push(FailRule {
            needle: needle.to_string(),
            msg: msg.to_string(),
            remaining: times,
        });
    }

    /// Delay every statement by `latency`
    pub fn set_latency(&self, latency: Duration) {
        *self.state.latency.lock() = latency;
    }

    /// Every statement executed so far, in order
    #[must_use]
    pub fn statements(&self) -> Vec<String> {
        self.state.log.lock().clone()
    }

    /// Committed rows of one table
    #[must_use]
    pub fn table(&self, label: &str) -> RowVec {
        self.state
            .tables
            .lock()
            .get(label)
            .cloned()
            .unwrap_or_default()
    }

    /// Seed a committed row directly, bypassing the query path
    pub fn insert_row(&self, label: &str, row: Row) {
        self.state
            .tables
            .lock()
            .entry(label.to_string())
            .or_default()
            .push(row);
    }
}

#[async_trait]
impl Engine for MockEngine {
    async fn connect(&self) -> Result<Arc<dyn EngineConnection>> {
        if *self.state.closed.lock() {
            return Err(anyhow!("CONNECTION_LOST: engine closed"));
        }
        Ok(Arc::new(MockConnection {
            state: Arc::clone(&self.state),
            txn: Mutex::new(None),
        }))
    }

    async fn close(&self) -> Result<()> {
        *self.state.closed.lock() = true;
        Ok(())
    }
}

#[derive(Debug)]
struct TxnBuffer {
    staged: Vec<(String, Row)>,
    savepoints: Vec<(String, usize)>,
}

/// One connection; transactions stage writes until COMMIT
#[derive(Debug)]
pub struct MockConnection {
    state: Arc<MockState>,
    txn: Mutex<Option<TxnBuffer>>,
}

#[async_trait]
impl EngineConnection for MockConnection {
    async fn run(&self, cypher: &str) -> Result<RowVec> {
        let latency = *self.state.latency.lock();
        if !latency.is_zero() {
            tokio::time::sleep(latency).await;
        }
        if *self.state.closed.lock() {
            return Err(anyhow!("CONNECTION_LOST: engine closed"));
        }
        self.state.log.lock().push(cypher.to_string());

        {
            let mut rules = self.state.fail_rules.lock();
            if let Some(rule) = rules
                .iter_mut()
                .find(|rule| rule.remaining > 0 && cypher.contains(&rule.needle))
            {
                rule.remaining -= 1;
                return Err(anyhow!("{}", rule.msg));
            }
        }

        let trimmed = cypher.trim();
        let upper = trimmed.to_ascii_uppercase();

        if upper.starts_with("BEGIN") {
            *self.txn.lock() = Some(TxnBuffer {
                staged: Vec::new(),
                savepoints: Vec::new(),
            });
            return Ok(Vec::new());
        }
        if upper.starts_with("COMMIT") {
            if let Some(buffer) = self.txn.lock().take() {
                let mut tables = self.state.tables.lock();
                for (label, row) in buffer.staged {
                    tables.entry(label).or_default().push(row);
                }
            }
            return Ok(Vec::new());
        }
        if upper.starts_with("ROLLBACK TO SAVEPOINT") {
            let sp_id = trimmed.split_whitespace().last().unwrap_or_default();
            let mut guard = self.txn.lock();
            let buffer = guard
                .as_mut()
                .ok_or_else(|| anyhow!("no transaction in progress"))?;
            let len = buffer
                .savepoints
                .iter()
                .find(|(name, _)| name == sp_id)
                .map(|(_, len)| *len)
                .ok_or_else(|| anyhow!("unknown savepoint {}", sp_id))?;
            buffer.staged.truncate(len);
            return Ok(Vec::new());
        }
        if upper.starts_with("ROLLBACK") {
            *self.txn.lock() = None;
            return Ok(Vec::new());
        }
        if upper.starts_with("RELEASE SAVEPOINT") {
            let sp_id = trimmed.split_whitespace().last().unwrap_or_default();
            let mut guard = self.txn.lock();
            if let Some(buffer) = guard.as_mut() {
                buffer.savepoints.retain(|(name, _)| name != sp_id);
            }
            return Ok(Vec::new());
        }
        if upper.starts_with("SAVEPOINT") {
            let sp_id = trimmed.split_whitespace().last().unwrap_or_default();
            let mut guard = self.txn.lock();
            let buffer = guard
                .as_mut()
                .ok_or_else(|| anyhow!("no transaction in progress"))?;
            let len = buffer.staged.len();
            buffer.savepoints.push((sp_id.to_string(), len));
            return Ok(Vec::new());
        }
        if upper.starts_with("CREATE NODE TABLE") || upper.starts_with("CREATE REL TABLE") {
            return Ok(Vec::new());
        }
        if upper.starts_with("RETURN 1") {
            let mut row = Row::new();
            let _ = row.insert("1".to_string(), json!(1));
            return Ok(vec![row]);
        }

        let (skip, limit) = pagination(&upper);

        {
            let mounts = self.state.mounts.lock();
            if let Some(mount) = mounts.iter().find(|m| cypher.contains(&m.needle)) {
                return Ok(paginate(mount.rows.clone(), skip, limit));
            }
        }

        if upper.starts_with("CREATE (") || upper.starts_with("MERGE (") {
            return self.run_create(trimmed);
        }
        if upper.contains("MATCH") {
            return self.run_match(trimmed, skip, limit);
        }
        Ok(Vec::new())
    }
}

impl MockConnection {
    fn run_create(&self, query: &str) -> Result<RowVec> {
        let (var, label, props) = parse_create(query)
            .ok_or_else(|| anyhow!("mock engine cannot parse: {}", query))?;
        let row: Row = props;
        let mut guard = self.txn.lock();
        if let Some(buffer) = guard.as_mut() {
            buffer.staged.push((label, row.clone()));
        } else {
            self.state
                .tables
                .lock()
                .entry(label)
                .or_default()
                .push(row.clone());
        }
        if query.to_ascii_uppercase().contains("RETURN") {
            let mut out = Row::new();
            let _ = out.insert(var, Value::Object(row));
            return Ok(vec![out]);
        }
        Ok(Vec::new())
    }

    fn run_match(&self, query: &str, skip: usize, limit: Option<usize>) -> Result<RowVec> {
        let scan = parse_match(query)
            .ok_or_else(|| anyhow!("mock engine cannot parse: {}", query))?;

        let mut source: RowVec = {
            let tables = self.state.tables.lock();
            match &scan.label {
                Some(label) => tables.get(label).cloned().unwrap_or_default(),
                None => {
                    let mut all = Vec::new();
                    for rows in tables.values() {
                        all.extend(rows.iter().cloned());
                    }
                    all
                }
            }
        };
        // a transaction sees its own staged writes
        if let Some(buffer) = self.txn.lock().as_ref() {
            for (label, row) in &buffer.staged {
                if scan
                    .label
                    .as_deref()
                    .map_or(true, |wanted| wanted == label.as_str())
                {
                    source.push(row.clone());
                }
            }
        }

        if let Some((field, value)) = &scan.filter {
            source.retain(|row| row.get(field) == Some(value));
        }

        let selected = paginate(source, skip, limit);
        let mut out = Vec::with_capacity(selected.len());
        for row in selected {
            let mut projected = Row::new();
            for item in &scan.projections {
                if let Some(field) = item.strip_prefix(&format!("{}.", scan.var)) {
                    let _ = projected.insert(
                        item.clone(),
                        row.get(field).cloned().unwrap_or(Value::Null),
                    );
                } else if item == &scan.var {
                    let _ = projected.insert(item.clone(), Value::Object(row.clone()));
                } else {
                    let _ = projected.insert(item.clone(), Value::Null);
                }
            }
            out.push(projected);
        }
        Ok(out)
    }
}

struct MatchScan {
    var: String,
    label: Option<String>,
    filter: Option<(String, Value)>,
    projections: Vec<String>,
}

fn pagination(upper: &str) -> (usize, Option<usize>) {
    let skip = clause_number(upper, "SKIP").unwrap_or(0);
    let limit = clause_number(upper, "LIMIT");
    (skip, limit)
}

fn clause_number(upper: &str, keyword: &str) -> Option<usize> {
    let pos = upper.rfind(keyword)?;
    upper[pos + keyword.len()..]
        .split_whitespace()
        .next()?
        .parse()
        .ok()
}

fn paginate(rows: RowVec, skip: usize, limit: Option<usize>) -> RowVec {
    let iter = rows.into_iter().skip(skip);
    match limit {
        Some(limit) => iter.take(limit).collect(),
        None => iter.collect(),
    }
}

/// Parse `CREATE (var:Label {key: literal, ...}) [RETURN ...]`
fn parse_create(query: &str) -> Option<(String, String, Row)> {
    let open = query.find('(')?;
    let rest = &query[open + 1..];
    let colon = rest.find(':')?;
    let var = rest[..colon].trim().to_string();
    let after = &rest[colon + 1..];
    let brace = after.find('{');
    let label_end = brace.unwrap_or_else(|| after.find(')').unwrap_or(after.len()));
    let label = after[..label_end].trim().to_string();
    let props = match brace {
        Some(start) => {
            let body = &after[start + 1..];
            let end = matching_brace(body)?;
            parse_props(&body[..end])?
        }
        None => Row::new(),
    };
    Some((var, label, props))
}

/// Parse `MATCH (var[:Label]) [WHERE var.f = literal] RETURN a, b.c ...`
fn parse_match(query: &str) -> Option<MatchScan> {
    let upper = query.to_ascii_uppercase();
    let match_pos = upper.find("MATCH")?;
    let open = query[match_pos..].find('(')? + match_pos;
    let close = query[open..].find(')')? + open;
    let pattern = &query[open + 1..close];
    let (var, label) = match pattern.find(':') {
        Some(colon) => (
            pattern[..colon].trim().to_string(),
            Some(pattern[colon + 1..].trim().to_string()),
        ),
        None => (pattern.trim().to_string(), None),
    };

    let filter = upper.find("WHERE").and_then(|where_pos| {
        let clause = &query[where_pos + 5..];
        let eq = clause.find('=')?;
        let lhs = clause[..eq].trim();
        let field = lhs.strip_prefix(&format!("{}.", var))?.trim().to_string();
        let mut rhs = clause[eq + 1..].trim();
        let value = parse_literal(&mut rhs)?;
        Some((field, value))
    });

    let return_pos = upper.find("RETURN")?;
    let mut tail = query[return_pos + 6..].trim();
    for marker in ["SKIP", "LIMIT", "ORDER"] {
        if let Some(pos) = tail.to_ascii_uppercase().find(marker) {
            tail = tail[..pos].trim();
        }
    }
    let projections: Vec<String> = tail
        .split(',')
        .map(|item| item.trim().to_string())
        .filter(|item| !item.is_empty())
        .collect();

    Some(MatchScan {
        var,
        label,
        filter,
        projections,
    })
}

fn matching_brace(body: &str) -> Option<usize> {
    let mut depth = 0_i32;
    let mut in_string = false;
    for (idx, ch) in body.char_indices() {
        if in_string {
            if ch == '\'' {
                in_string = false;
            }
            continue;
        }
        match ch {
            '\'' => in_string = true,
            '{' => depth += 1,
            '}' => {
                if depth == 0 {
                    return Some(idx);
                }
                depth -= 1;
            }
            _ => {}
        }
    }
    None
}

fn parse_props(body: &str) -> Option<Row> {
    let mut out = Row::new();
    let mut rest = body.trim();
    while !rest.is_empty() {
        let colon = rest.find(':')?;
        let key = rest[..colon].trim().to_string();
        rest = rest[colon + 1..].trim();
        let value = parse_literal(&mut rest)?;
        let _ = out.insert(key, value);
        rest = rest.trim();
        if let Some(stripped) = rest.strip_prefix(',') {
            rest = stripped.trim();
        } else {
            break;
        }
    }
    Some(out)
}

/// Parse one inlined literal off the front of `rest`, advancing it
fn parse_literal(rest: &mut &str) -> Option<Value> {
    *rest = rest.trim_start();
    if rest.is_empty() {
        return None;
    }
    let upper = rest.to_ascii_uppercase();
    if upper.starts_with("NULL") {
        *rest = &rest[4..];
        return Some(Value::Null);
    }
    if upper.starts_with("TRUE") {
        *rest = &rest[4..];
        return Some(json!(true));
    }
    if upper.starts_with("FALSE") {
        *rest = &rest[5..];
        return Some(json!(false));
    }
    let first = rest.chars().next()?;
    match first {
        '\'' => {
            let mut out = String::new();
            let bytes = rest.as_bytes();
            let mut idx = 1_usize;
            while idx < bytes.len() {
                if bytes[idx] == b'\'' {
                    if bytes.get(idx + 1) == Some(&b'\'') {
                        out.push('\'');
                        idx += 2;
                    } else {
                        *rest = &rest[idx + 1..];
                        return Some(Value::String(out));
                    }
                } else {
                    let ch_rest = &rest[idx..];
                    let ch = ch_rest.chars().next()?;
                    out.push(ch);
                    idx += ch.len_utf8();
                }
            }
            None
        }
        '[' => {
            let mut items = Vec::new();
            *rest = rest[1..].trim_start();
            loop {
                if let Some(stripped) = rest.strip_prefix(']') {
                    *rest = stripped;
                    return Some(Value::Array(items));
                }
                let item = parse_literal(rest)?;
                items.push(item);
                *rest = rest.trim_start();
                if let Some(stripped) = rest.strip_prefix(',') {
                    *rest = stripped.trim_start();
                }
            }
        }
        '{' => {
            let body_end = matching_brace(&rest[1..])?;
            let props = parse_props(&rest[1..=body_end])?;
            *rest = &rest[body_end + 2..];
            Some(Value::Object(props))
        }
        _ => {
            let end = rest
                .find(|c: char| !(c.is_ascii_digit() || c == '-' || c == '+' || c == '.' || c == 'e' || c == 'E'))
                .unwrap_or(rest.len());
            let token = &rest[..end];
            if token.is_empty() {
                return None;
            }
            let value = if token.contains('.') || token.contains('e') || token.contains('E') {
                token.parse::<f64>().ok().map(|f| json!(f))
            } else {
                token.parse::<i64>().ok().map(|i| json!(i))
            }?;
            *rest = &rest[end..];
            Some(value)
        }
    }
}
