use super::operators::prec;
use super::{Printer, is_identifier, nodes_from};
use crate::error::Result;
use r2js_ast::{Child, Literal, Node, NodeKind};
use r2js_common::EsLevel;

/// A piece of an interpolated string or regular expression.
pub(super) enum Part {
    Text(String),
    Expr(Node),
}

impl<'a> Printer<'a> {
    // =========================================================================
    // Numbers, strings and symbols
    // =========================================================================

    pub(super) fn emit_int(&mut self, node: &Node) -> Result<u8> {
        let Some(value) = node.child(0).and_then(Child::as_int) else {
            return Err(self.malformed(node, "integer literal without a value"));
        };
        self.write(&value.to_string());
        Ok(if value < 0 { prec::UNARY } else { prec::PRIMARY })
    }

    pub(super) fn emit_float(&mut self, node: &Node) -> Result<u8> {
        let value = match node.child(0) {
            Some(Child::Lit(Literal::Float(value))) => *value,
            Some(Child::Lit(Literal::Int(value))) => *value as f64,
            _ => return Err(self.malformed(node, "float literal without a value")),
        };
        let text = if value.is_nan() {
            "NaN".to_string()
        } else if value.is_infinite() {
            if value > 0.0 { "Infinity" } else { "-Infinity" }.to_string()
        } else {
            format!("{value:?}")
        };
        self.write(&text);
        Ok(if value.is_sign_negative() { prec::UNARY } else { prec::PRIMARY })
    }

    pub(super) fn emit_str(&mut self, node: &Node) -> Result<u8> {
        let Some(value) = node.child(0).and_then(|child| child.as_str().or_else(|| child.as_sym()))
        else {
            return Err(self.malformed(node, "string literal without a value"));
        };
        self.write(&quote(value));
        Ok(prec::PRIMARY)
    }

    pub(super) fn emit_sym(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.child(0).and_then(|child| child.as_sym().or_else(|| child.as_str()))
        else {
            return Err(self.malformed(node, "symbol without a name"));
        };
        self.write(&quote(name));
        Ok(prec::PRIMARY)
    }

    /// `"a#{b}"`: a template literal, or concatenation below ES2015.
    pub(super) fn emit_dstr(&mut self, node: &Node) -> Result<u8> {
        let mut parts = Vec::new();
        collect_parts(node, &mut parts);
        self.emit_string_parts(&parts)
    }

    pub(super) fn emit_string_parts(&mut self, parts: &[Part]) -> Result<u8> {
        if parts.iter().all(|part| matches!(part, Part::Text(_))) {
            let text: String = parts
                .iter()
                .filter_map(|part| match part {
                    Part::Text(text) => Some(text.as_str()),
                    Part::Expr(_) => None,
                })
                .collect();
            self.write(&quote(&text));
            return Ok(prec::PRIMARY);
        }

        if self.es(EsLevel::ES2015) {
            self.write("`");
            for part in parts {
                match part {
                    Part::Text(text) => self.write(&escape_template(text)),
                    Part::Expr(expr) => {
                        self.write("${");
                        self.emit_expr(expr, prec::LOWEST)?;
                        self.write("}");
                    }
                }
            }
            self.write("`");
            return Ok(prec::PRIMARY);
        }

        if matches!(parts.first(), Some(Part::Expr(_))) {
            self.write("\"\" + ");
        }
        for (index, part) in parts.iter().enumerate() {
            if index > 0 {
                self.write(" + ");
            }
            match part {
                Part::Text(text) => self.write(&quote(text)),
                Part::Expr(expr) => {
                    self.emit_expr(expr, prec::MULTIPLICATIVE)?;
                }
            }
        }
        Ok(prec::ADDITIVE)
    }

    // =========================================================================
    // Regular expressions
    // =========================================================================

    pub(super) fn emit_regexp(&mut self, node: &Node) -> Result<u8> {
        let mut parts = Vec::new();
        let mut ruby_flags = String::new();
        for child in node.children() {
            match child {
                Child::Node(opts) if opts.is(NodeKind::Regopt) => {
                    ruby_flags.extend(opts.children().iter().filter_map(Child::as_sym));
                }
                Child::Lit(Literal::Regex { pattern, flags }) => {
                    parts.push(Part::Text(pattern.clone()));
                    ruby_flags.push_str(flags);
                }
                Child::Lit(Literal::Str(text)) => parts.push(Part::Text(text.clone())),
                Child::Node(part) => collect_parts(part, &mut parts),
                Child::Lit(_) => {}
            }
        }
        let flags = self.regex_flags(node, &ruby_flags)?;
        let parts: Vec<Part> = parts
            .into_iter()
            .map(|part| match part {
                Part::Text(text) => Part::Text(convert_anchors(&text)),
                expr => expr,
            })
            .collect();

        if parts.iter().all(|part| matches!(part, Part::Text(_))) {
            let pattern: String = parts
                .iter()
                .filter_map(|part| match part {
                    Part::Text(text) => Some(text.as_str()),
                    Part::Expr(_) => None,
                })
                .collect();
            let pattern = if pattern.is_empty() {
                "(?:)".to_string()
            } else {
                escape_slashes(&pattern)
            };
            self.write(&format!("/{pattern}/{flags}"));
            return Ok(prec::PRIMARY);
        }

        self.write("new RegExp(");
        self.emit_string_parts(&parts)?;
        if !flags.is_empty() {
            self.write(", ");
            self.write(&quote(&flags));
        }
        self.write(")");
        Ok(prec::CALL)
    }

    fn regex_flags(&self, node: &Node, ruby: &str) -> Result<String> {
        let mut flags = String::new();
        for flag in ruby.chars() {
            let js = match flag {
                'i' | 'g' | 'u' | 'y' => flag,
                'm' => {
                    self.require(node, "dot-all regular expression flag", EsLevel::ES2018)?;
                    's'
                }
                'x' => return Err(self.unsupported(node, "extended regular expression", None)),
                _ => continue,
            };
            if !flags.contains(js) {
                flags.push(js);
            }
        }
        Ok(flags)
    }

    // =========================================================================
    // Arrays and hashes
    // =========================================================================

    pub(super) fn emit_array(&mut self, node: &Node) -> Result<u8> {
        let elements = nodes_from(node, 0);
        self.emit_elements(&elements)
    }

    /// `[a, ...b]`, or `[a].concat(b)` below ES2015.
    pub(super) fn emit_elements(&mut self, elements: &[Node]) -> Result<u8> {
        if elements.iter().any(|element| element.is(NodeKind::Splat)) && !self.es(EsLevel::ES2015) {
            return self.emit_concat(elements);
        }
        self.write("[");
        for (index, element) in elements.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            if element.is(NodeKind::Splat) {
                self.emit_spread(element)?;
            } else {
                self.emit_expr(element, prec::ASSIGN)?;
            }
        }
        self.write("]");
        Ok(prec::PRIMARY)
    }

    pub(super) fn emit_spread(&mut self, splat: &Node) -> Result<()> {
        self.write("...");
        self.emit_child_expr(splat.child(0), prec::ASSIGN)?;
        Ok(())
    }

    /// Splats without spread syntax: runs of plain elements become array
    /// literals joined with `concat`.
    pub(super) fn emit_concat(&mut self, elements: &[Node]) -> Result<u8> {
        let mut segments: Vec<Vec<&Node>> = Vec::new();
        for element in elements {
            match segments.last_mut() {
                Some(segment)
                    if !element.is(NodeKind::Splat)
                        && segment.first().is_some_and(|first| !first.is(NodeKind::Splat)) =>
                {
                    segment.push(element);
                }
                _ => segments.push(vec![element]),
            }
        }

        for (index, segment) in segments.iter().enumerate() {
            match index {
                0 => {}
                1 => self.write(".concat("),
                _ => self.write(", "),
            }
            let min = if index == 0 { prec::CALL } else { prec::ASSIGN };
            match segment.as_slice() {
                [splat] if splat.is(NodeKind::Splat) => {
                    self.emit_child_expr(splat.child(0), min)?;
                }
                plain => {
                    self.write("[");
                    for (position, element) in plain.iter().enumerate() {
                        if position > 0 {
                            self.write(", ");
                        }
                        self.emit_expr(element, prec::ASSIGN)?;
                    }
                    self.write("]");
                }
            }
        }
        if segments.len() > 1 {
            self.write(")");
            return Ok(prec::CALL);
        }
        Ok(prec::PRIMARY)
    }

    pub(super) fn emit_hash(&mut self, node: &Node) -> Result<u8> {
        let entries = nodes_from(node, 0);
        if entries.is_empty() {
            self.write("{}");
            return Ok(prec::PRIMARY);
        }
        if entries.iter().any(|entry| entry.is(NodeKind::Kwsplat)) && !self.es(EsLevel::ES2018) {
            self.require(node, "hash splat", EsLevel::ES2015)?;
            return self.emit_object_assign(&entries);
        }
        self.emit_object_literal(&entries)?;
        Ok(prec::PRIMARY)
    }

    fn emit_object_literal(&mut self, entries: &[Node]) -> Result<()> {
        self.write("{");
        for (index, entry) in entries.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            match entry.kind() {
                NodeKind::Pair => self.emit_pair(entry)?,
                NodeKind::Kwsplat => self.emit_spread(entry)?,
                kind => return Err(self.unexpected(entry, &format!("`{kind}` inside a hash"))),
            }
        }
        self.write("}");
        Ok(())
    }

    /// `{a: 1, **b}` below ES2018: `Object.assign({}, {a: 1}, b)`.
    fn emit_object_assign(&mut self, entries: &[Node]) -> Result<u8> {
        self.write("Object.assign({}");
        let mut pending: Vec<Node> = Vec::new();
        for entry in entries {
            if entry.is(NodeKind::Kwsplat) {
                if !pending.is_empty() {
                    self.write(", ");
                    self.emit_object_literal(&pending)?;
                    pending.clear();
                }
                self.write(", ");
                self.emit_child_expr(entry.child(0), prec::ASSIGN)?;
            } else {
                pending.push(entry.clone());
            }
        }
        if !pending.is_empty() {
            self.write(", ");
            self.emit_object_literal(&pending)?;
        }
        self.write(")");
        Ok(prec::CALL)
    }

    fn emit_pair(&mut self, pair: &Node) -> Result<()> {
        let Some(key) = pair.node_at(0) else {
            return Err(self.malformed(pair, "pair without a key"));
        };
        match key.kind() {
            NodeKind::Sym => {
                let name = key.sym_at(0).or_else(|| key.str_at(0)).unwrap_or_default();
                let shorthand = pair
                    .node_at(1)
                    .is_some_and(|value| value.is(NodeKind::Lvar) && value.sym_at(0) == Some(name));
                if shorthand && self.es(EsLevel::ES2015) && is_identifier(name) {
                    self.write_identifier(name, name);
                    return Ok(());
                }
                if is_identifier(name) {
                    self.write(name);
                } else {
                    self.write(&quote(name));
                }
            }
            NodeKind::Str | NodeKind::Int => {
                self.emit_expr(key, prec::PRIMARY)?;
            }
            _ => {
                self.require(key, "computed object key", EsLevel::ES2015)?;
                self.write("[");
                self.emit_expr(key, prec::ASSIGN)?;
                self.write("]");
            }
        }
        self.write(": ");
        self.emit_child_expr(pair.child(1), prec::ASSIGN)?;
        Ok(())
    }
}

/// Flatten the pieces of a `dstr`/`dsym`/`regexp` body.
fn collect_parts(node: &Node, parts: &mut Vec<Part>) {
    match node.kind() {
        NodeKind::Str => {
            if let Some(text) = node.str_at(0) {
                push_text(parts, text);
            }
        }
        NodeKind::Dstr | NodeKind::Dsym => {
            for child in node.children() {
                match child {
                    Child::Node(inner) => collect_parts(inner, parts),
                    Child::Lit(Literal::Str(text)) => push_text(parts, text),
                    Child::Lit(_) => {}
                }
            }
        }
        NodeKind::Begin => match node.children() {
            [] => {}
            [Child::Node(inner)] => parts.push(Part::Expr(inner.clone())),
            _ => parts.push(Part::Expr(node.clone())),
        },
        _ => parts.push(Part::Expr(node.clone())),
    }
}

fn push_text(parts: &mut Vec<Part>, text: &str) {
    if let Some(Part::Text(last)) = parts.last_mut() {
        last.push_str(text);
    } else {
        parts.push(Part::Text(text.to_string()));
    }
}

/// A double-quoted JavaScript string literal.
///
/// JSON leaves U+2028 and U+2029 raw, but they end a string literal before
/// ES2019; the escaped form is valid at every tier.
pub(crate) fn quote(text: &str) -> String {
    let quoted = serde_json::Value::String(text.to_string()).to_string();
    if quoted.contains(['\u{2028}', '\u{2029}']) {
        quoted.replace('\u{2028}', "\\u2028").replace('\u{2029}', "\\u2029")
    } else {
        quoted
    }
}

fn escape_template(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();
    while let Some(ch) = chars.next() {
        match ch {
            '\\' => out.push_str("\\\\"),
            '`' => out.push_str("\\`"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '$' if chars.peek() == Some(&'{') => out.push_str("\\$"),
            _ => out.push(ch),
        }
    }
    out
}

/// Ruby-only escapes: `\A` → `^`, `\z`/`\Z` → `$`, `\h` → a hex class.
fn convert_anchors(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut chars = pattern.chars();
    while let Some(ch) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        match chars.next() {
            Some('A') => out.push('^'),
            Some('z' | 'Z') => out.push('$'),
            Some('h') => out.push_str("[0-9a-fA-F]"),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

fn escape_slashes(pattern: &str) -> String {
    let mut out = String::with_capacity(pattern.len());
    let mut escaped = false;
    for ch in pattern.chars() {
        match ch {
            '/' if !escaped => out.push_str("\\/"),
            '\n' => out.push_str("\\n"),
            _ => out.push(ch),
        }
        escaped = ch == '\\' && !escaped;
    }
    out
}
