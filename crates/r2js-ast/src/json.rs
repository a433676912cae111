//! JSON interchange format for trees.
//!
//! ```json
//! {"type": "send", "children": [null, {"sym": "puts"}, {"type": "str", "children": ["hi"]}],
//!  "loc": {"startLine": 1, "startCol": 0, "endLine": 1, "endCol": 9}}
//! ```
//!
//! Literal children: JSON strings are string values, `{"sym": ..}` is a
//! symbol, `{"regex": .., "flags": ..}` a regex literal; numbers, booleans
//! and `null` map directly.

use crate::kind::NodeKind;
use crate::literal::Literal;
use crate::node::{Child, Node};
use crate::parser::{ParserAdapter, SyntaxError};
use r2js_common::{SourceSpan, limits};
use serde::de::Error as _;
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::{Map, Value};
use std::sync::Arc;
use tracing::debug;

/// Parser adapter for trees that were parsed elsewhere and shipped as JSON.
#[derive(Clone, Copy, Debug, Default)]
pub struct JsonAstParser;

impl JsonAstParser {
    pub fn new() -> Self {
        JsonAstParser
    }
}

/// JSON nesting that still fits in `MAX_AST_DEPTH` nodes: each node level
/// is an object plus its `children` array, and the innermost node may hold
/// one more object (`loc`, `sym`, `regex`).
const MAX_JSON_DEPTH: usize = 2 * (limits::MAX_AST_DEPTH as usize + 1) + 1;

/// Stack kept free while decoding, and the size of a fresh segment when it
/// runs low.
const STACK_RED_ZONE: usize = 1024 * 1024;
const STACK_SEGMENT: usize = 8 * 1024 * 1024;

impl ParserAdapter for JsonAstParser {
    fn parse(&self, source: &str, file_name: Option<&str>) -> Result<Node, SyntaxError> {
        if let Some(offset) = nesting_overflow(source, MAX_JSON_DEPTH) {
            let (line, col) = line_col(source, offset);
            let mut span = SourceSpan::new(line, col, line, col);
            if let Some(file) = file_name {
                span = span.with_file(file);
            }
            return Err(SyntaxError::new(format!(
                "AST nesting exceeds {} levels",
                limits::MAX_AST_DEPTH
            ))
            .at(span));
        }
        let file: Option<Arc<str>> = file_name.map(Arc::from);
        let node = stacker::maybe_grow(STACK_RED_ZONE, STACK_SEGMENT, || {
            let value = decode(source, file_name)?;
            node_from_value(&value, file.as_ref(), 0)
        })?;
        debug!(nodes = node.subtree_size(), "parsed JSON AST");
        Ok(node)
    }

    fn reads_source_text(&self) -> bool {
        false
    }
}

/// Decode `source` with serde_json's own recursion limit lifted; nesting is
/// bounded by `nesting_overflow` instead.
fn decode(source: &str, file_name: Option<&str>) -> Result<Value, SyntaxError> {
    let mut deserializer = serde_json::Deserializer::from_str(source);
    deserializer.disable_recursion_limit();
    Value::deserialize(&mut deserializer)
        .and_then(|value| deserializer.end().map(|()| value))
        .map_err(|err| {
            let line = err.line() as u32;
            let col = (err.column() as u32).saturating_sub(1);
            let mut span = SourceSpan::new(line, col, line, col);
            if let Some(file) = file_name {
                span = span.with_file(file);
            }
            SyntaxError::new(format!("invalid AST JSON: {}", without_position(&err))).at(span)
        })
}

/// serde_json appends ` at line L column C`; the span carries that already.
fn without_position(err: &serde_json::Error) -> String {
    let text = err.to_string();
    let suffix = format!(" at line {} column {}", err.line(), err.column());
    match text.strip_suffix(&suffix) {
        Some(message) => message.to_string(),
        None => text,
    }
}

/// Byte offset of the first bracket that opens deeper than `max` levels,
/// ignoring brackets inside strings.
fn nesting_overflow(source: &str, max: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;
    for (offset, byte) in source.bytes().enumerate() {
        if in_string {
            match byte {
                _ if escaped => escaped = false,
                b'\\' => escaped = true,
                b'"' => in_string = false,
                _ => {}
            }
            continue;
        }
        match byte {
            b'"' => in_string = true,
            b'{' | b'[' => {
                depth += 1;
                if depth > max {
                    return Some(offset);
                }
            }
            b'}' | b']' => depth = depth.saturating_sub(1),
            _ => {}
        }
    }
    None
}

/// 1-based line and 0-based byte column of `offset`.
fn line_col(source: &str, offset: usize) -> (u32, u32) {
    let before = &source.as_bytes()[..offset.min(source.len())];
    let line = before.iter().filter(|byte| **byte == b'\n').count() + 1;
    let start = before.iter().rposition(|byte| *byte == b'\n').map_or(0, |pos| pos + 1);
    (line as u32, (before.len() - start) as u32)
}

/// Convert an already-decoded JSON value into a tree.
pub fn node_from_json(value: &Value) -> Result<Node, SyntaxError> {
    node_from_value(value, None, 0)
}

fn node_from_value(
    value: &Value,
    file: Option<&Arc<str>>,
    depth: u32,
) -> Result<Node, SyntaxError> {
    if depth > limits::MAX_AST_DEPTH {
        return Err(SyntaxError::new(format!(
            "AST nesting exceeds {} levels",
            limits::MAX_AST_DEPTH
        )));
    }
    let Value::Object(object) = value else {
        return Err(SyntaxError::new(format!("expected a node object, found {value}")));
    };

    let location = match object.get("loc") {
        None | Some(Value::Null) => None,
        Some(loc) => {
            let mut span = SourceSpan::deserialize(loc)
                .map_err(|err| SyntaxError::new(format!("invalid location: {err}")))?;
            if span.source_file.is_none() {
                span.source_file = file.cloned();
            }
            Some(span)
        }
    };

    let Some(type_name) = object.get("type").and_then(Value::as_str) else {
        let err = SyntaxError::new("node object is missing a string `type`");
        return Err(match location {
            Some(span) => err.at(span),
            None => err,
        });
    };
    let Some(kind) = NodeKind::from_name(type_name) else {
        let err = SyntaxError::new(format!("unknown node type `{type_name}`"));
        return Err(match location {
            Some(span) => err.at(span),
            None => err,
        });
    };

    let children = match object.get("children") {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items
            .iter()
            .map(|item| child_from_value(item, file, depth))
            .collect::<Result<Vec<_>, _>>()?,
        Some(other) => {
            return Err(SyntaxError::new(format!(
                "`children` of `{type_name}` must be an array, found {other}"
            )));
        }
    };

    Ok(Node::with_location(kind, children, location))
}

fn child_from_value(
    value: &Value,
    file: Option<&Arc<str>>,
    depth: u32,
) -> Result<Child, SyntaxError> {
    Ok(match value {
        Value::Null => Child::NIL,
        Value::Bool(b) => Child::Lit(Literal::Bool(*b)),
        Value::String(s) => Child::str(s.as_str()),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                Child::Lit(Literal::Int(int))
            } else if let Some(float) = number.as_f64() {
                Child::Lit(Literal::Float(float))
            } else {
                return Err(SyntaxError::new(format!("unrepresentable number {number}")));
            }
        }
        Value::Object(object) => {
            if let Some(name) = object.get("sym").and_then(Value::as_str) {
                Child::sym(name)
            } else if let Some(pattern) = object.get("regex").and_then(Value::as_str) {
                let flags = object.get("flags").and_then(Value::as_str).unwrap_or("");
                Child::Lit(Literal::Regex {
                    pattern: pattern.to_string(),
                    flags: flags.to_string(),
                })
            } else {
                Child::Node(node_from_value(value, file, depth + 1)?)
            }
        }
        Value::Array(_) => {
            return Err(SyntaxError::new(format!(
                "unexpected array among children: {value}"
            )));
        }
    })
}

// =============================================================================
// Serde integration
// =============================================================================

struct LiteralRepr<'a>(&'a Literal);

impl Serialize for LiteralRepr<'_> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self.0 {
            Literal::Nil => serializer.serialize_unit(),
            Literal::Bool(value) => serializer.serialize_bool(*value),
            Literal::Int(value) => serializer.serialize_i64(*value),
            Literal::Float(value) => serializer.serialize_f64(*value),
            Literal::Str(value) => serializer.serialize_str(value),
            Literal::Sym(name) => {
                let mut map = serializer.serialize_map(Some(1))?;
                map.serialize_entry("sym", name)?;
                map.end()
            }
            Literal::Regex { pattern, flags } => {
                let mut map = serializer.serialize_map(Some(2))?;
                map.serialize_entry("regex", pattern)?;
                map.serialize_entry("flags", flags)?;
                map.end()
            }
        }
    }
}

impl Serialize for Child {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            Child::Node(node) => node.serialize(serializer),
            Child::Lit(literal) => LiteralRepr(literal).serialize(serializer),
        }
    }
}

impl Serialize for Node {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let entries = if self.location().is_some() { 3 } else { 2 };
        let mut map = serializer.serialize_map(Some(entries))?;
        map.serialize_entry("type", &self.kind())?;
        map.serialize_entry("children", self.children())?;
        if let Some(location) = self.location() {
            map.serialize_entry("loc", location)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for Node {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let value = Value::Object(Map::deserialize(deserializer)?);
        node_from_json(&value).map_err(D::Error::custom)
    }
}
