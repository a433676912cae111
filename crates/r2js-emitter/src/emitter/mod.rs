//! JavaScript printer.
//!
//! The printer walks the rewritten tree once and writes tokens into a
//! [`LineWriter`]. Statements and expressions have separate entry points:
//! `emit_statement` reports whether the statement ended with a block (so no
//! `;` follows), and `emit_expr` returns the precedence of what it wrote so
//! the caller can parenthesize by position. Indentation is not tracked here;
//! the normalizer assigns it afterwards from the braces.

mod classes;
mod expressions;
mod functions;
mod literals;
mod operators;
mod scope;
mod statements;
mod variables;

use crate::error::{ConvertError, Result};
use crate::options::Options;
use crate::output::{Line, LineWriter, Origin};
use classes::ClassContext;
use operators::prec;
use r2js_ast::{Child, Literal, Node, NodeKind};
use r2js_common::{EsLevel, SourceSpan, limits};
use rustc_hash::FxHashSet;
use scope::{Frame, FrameKind, Scope};
use tracing::debug;

/// How a statement ended, which decides whether a terminator follows it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) enum Shape {
    /// Needs a `;` before the next statement.
    Simple,
    /// Ended with a closing brace.
    Compound,
}

pub struct Printer<'a> {
    options: &'a Options,
    writer: LineWriter,
    /// One statement per line instead of the compact single-line form.
    vertical: bool,
    depth: u32,
    /// Locations of the nodes being emitted; tokens take the innermost.
    spans: Vec<Option<SourceSpan>>,
    frames: Vec<Frame>,
    scopes: Vec<Scope>,
    classes: Vec<ClassContext>,
    /// Every name appearing in the tree, so generated temps never collide.
    file_identifiers: FxHashSet<String>,
    generated_temp_names: FxHashSet<String>,
    temp_var_counter: u32,
}

impl<'a> Printer<'a> {
    pub fn new(options: &'a Options) -> Self {
        Printer {
            options,
            writer: LineWriter::new(),
            vertical: false,
            depth: 0,
            spans: Vec::new(),
            frames: Vec::new(),
            scopes: Vec::new(),
            classes: Vec::new(),
            file_identifiers: FxHashSet::default(),
            generated_temp_names: FxHashSet::default(),
            temp_var_counter: 0,
        }
    }

    #[must_use]
    pub fn vertical(mut self, vertical: bool) -> Self {
        self.vertical = vertical;
        self
    }

    /// Print a whole program.
    #[tracing::instrument(level = "debug", skip_all, fields(eslevel = %self.options.eslevel, vertical = self.vertical))]
    pub fn print(mut self, ast: &Node) -> Result<Vec<Line>> {
        let identifiers = &mut self.file_identifiers;
        ast.walk(&mut |node| {
            identifiers.extend(
                node.children()
                    .iter()
                    .filter_map(Child::as_sym)
                    .map(str::to_string),
            );
        });

        self.push_frame(FrameKind::Program, false);
        self.open_slots();
        self.prepare_hoisting(ast);
        let statements = statement_list(Some(ast));
        self.emit_statement_list(&statements)?;
        self.finish_frame();

        let lines = self.writer.finish();
        debug!(lines = lines.len(), statements = statements.len(), "printed program");
        Ok(lines)
    }

    // =========================================================================
    // Dispatch
    // =========================================================================

    pub(crate) fn emit_statement(&mut self, node: &Node) -> Result<Shape> {
        self.enter(node)?;
        let result = self.emit_statement_inner(node);
        self.leave();
        result
    }

    /// Emit `node` as an expression, wrapping it in parentheses when its
    /// precedence is below `min`. Returns the precedence of the result.
    pub(crate) fn emit_expr(&mut self, node: &Node, min: u8) -> Result<u8> {
        self.enter(node)?;
        let mark = self.writer.mark();
        let result = self.emit_expr_inner(node);
        self.leave();
        let produced = result?;
        if produced < min {
            self.writer.wrap_parens(mark);
            return Ok(prec::PRIMARY);
        }
        Ok(produced)
    }

    /// A child slot as an expression; `nil` slots print `null`.
    pub(crate) fn emit_child_expr(&mut self, child: Option<&Child>, min: u8) -> Result<u8> {
        match child {
            Some(Child::Node(node)) => self.emit_expr(node, min),
            Some(Child::Lit(literal)) => {
                let node = literal_node(literal);
                self.emit_expr(&node, min)
            }
            None => {
                self.write("null");
                Ok(prec::PRIMARY)
            }
        }
    }

    fn emit_statement_inner(&mut self, node: &Node) -> Result<Shape> {
        match node.kind() {
            NodeKind::Begin | NodeKind::Kwbegin | NodeKind::Hide => {
                let statements = statement_list(Some(node));
                Ok(self
                    .emit_statement_list(&statements)?
                    .unwrap_or(Shape::Compound))
            }
            NodeKind::Autoreturn => {
                let body = self.tail_return(node);
                let statements = statement_list(Some(&body));
                Ok(self
                    .emit_statement_list(&statements)?
                    .unwrap_or(Shape::Compound))
            }
            NodeKind::Nil => Ok(Shape::Compound),
            NodeKind::If => self.emit_if_statement(node),
            NodeKind::Case => self.emit_case(node),
            NodeKind::While | NodeKind::Until => self.emit_while(node),
            NodeKind::WhilePost | NodeKind::UntilPost => self.emit_do_while(node),
            NodeKind::For => self.emit_for(node),
            NodeKind::Rescue | NodeKind::Ensure => self.emit_try(node),
            NodeKind::Return => self.emit_return(node),
            NodeKind::Break => self.emit_break(node),
            NodeKind::Next => self.emit_next(node),
            NodeKind::Throw => {
                self.write("throw ");
                self.emit_child_expr(node.child(0), prec::LOWEST)?;
                Ok(Shape::Simple)
            }
            NodeKind::Def => self.emit_function_declaration(node),
            NodeKind::Defs => self.emit_singleton_method(node),
            NodeKind::Class => self.emit_class(node),
            NodeKind::Module => self.emit_module(node),
            NodeKind::Lvasgn => self.emit_local_declaration(node),
            NodeKind::Casgn => self.emit_constant_declaration(node),
            NodeKind::Masgn => self.emit_masgn_statement(node),
            NodeKind::OpAsgn => self.emit_op_asgn_statement(node),
            NodeKind::OrAsgn | NodeKind::AndAsgn => self.emit_logical_asgn_statement(node),
            NodeKind::Import => self.emit_import(node),
            NodeKind::Export => self.emit_export(node),
            NodeKind::Alias => Err(self.unsupported(node, "`alias` outside of a class body", None)),
            NodeKind::Undef => Err(self.unsupported(node, "`undef`", None)),
            NodeKind::Sclass => Err(self.unsupported(node, "`class << self`", None)),
            NodeKind::Retry => Err(self.unsupported(node, "`retry`", None)),
            NodeKind::Redo => Err(self.unsupported(node, "`redo`", None)),
            _ => self.emit_expression_statement(node),
        }
    }

    fn emit_expr_inner(&mut self, node: &Node) -> Result<u8> {
        match node.kind() {
            NodeKind::Nil => {
                self.write("null");
                Ok(prec::PRIMARY)
            }
            NodeKind::True => {
                self.write("true");
                Ok(prec::PRIMARY)
            }
            NodeKind::False => {
                self.write("false");
                Ok(prec::PRIMARY)
            }
            NodeKind::Int => self.emit_int(node),
            NodeKind::Float => self.emit_float(node),
            NodeKind::Str => self.emit_str(node),
            NodeKind::Sym => self.emit_sym(node),
            NodeKind::Dstr | NodeKind::Dsym => self.emit_dstr(node),
            NodeKind::Regexp => self.emit_regexp(node),
            NodeKind::Array => self.emit_array(node),
            NodeKind::Hash => self.emit_hash(node),
            NodeKind::Xstr => Err(self.unsupported(node, "shell command string", None)),
            NodeKind::Irange | NodeKind::Erange => Err(self.unsupported(
                node,
                "range outside of a `for` loop, index or `when`",
                None,
            )),
            NodeKind::SelfRef => {
                let this = self.this_ref();
                self.write(this);
                Ok(prec::PRIMARY)
            }
            NodeKind::Lvar => self.emit_lvar(node),
            NodeKind::Ivar => self.emit_ivar(node),
            NodeKind::Cvar => self.emit_cvar(node),
            NodeKind::Gvar => self.emit_gvar(node),
            NodeKind::Const => self.emit_const(node),
            NodeKind::Lvasgn
            | NodeKind::Ivasgn
            | NodeKind::Cvasgn
            | NodeKind::Gvasgn
            | NodeKind::Casgn => self.emit_assignment(node),
            NodeKind::OpAsgn => self.emit_op_asgn(node),
            NodeKind::OrAsgn | NodeKind::AndAsgn => self.emit_logical_asgn(node),
            NodeKind::Masgn => self.emit_masgn_expr(node),
            NodeKind::Send | NodeKind::Csend => self.emit_send(node, None),
            NodeKind::Index => self.emit_index_node(node),
            NodeKind::Indexasgn => self.emit_indexasgn_node(node),
            NodeKind::Attr => self.emit_attr(node),
            NodeKind::Call => self.emit_call(node, None),
            NodeKind::And | NodeKind::Or => self.emit_logical(node),
            NodeKind::Not => {
                self.write("!");
                self.emit_child_expr(node.child(0), prec::UNARY)?;
                Ok(prec::UNARY)
            }
            NodeKind::Defined => self.emit_defined(node),
            NodeKind::Block => self.emit_block(node),
            NodeKind::Def => self.emit_function_expression(node),
            NodeKind::Super | NodeKind::Zsuper => self.emit_super(node, None),
            NodeKind::Yield => self.emit_yield(node),
            NodeKind::If => self.emit_if_expression(node),
            NodeKind::Begin | NodeKind::Kwbegin => self.emit_group(node),
            NodeKind::Case
            | NodeKind::While
            | NodeKind::Until
            | NodeKind::WhilePost
            | NodeKind::UntilPost
            | NodeKind::For
            | NodeKind::Rescue
            | NodeKind::Ensure
            | NodeKind::Throw
            | NodeKind::Autoreturn
            | NodeKind::Hide => self.emit_iife(node),
            NodeKind::Return | NodeKind::Break | NodeKind::Next => Err(self.unsupported(
                node,
                format!("`{}` in expression position", node.kind()),
                None,
            )),
            NodeKind::Alias
            | NodeKind::Undef
            | NodeKind::Sclass
            | NodeKind::Retry
            | NodeKind::Redo => Err(self.unsupported(node, format!("`{}`", node.kind()), None)),
            kind => Err(self.unexpected(node, &format!("`{kind}` in expression position"))),
        }
    }

    fn emit_expression_statement(&mut self, node: &Node) -> Result<Shape> {
        let mark = self.writer.mark();
        self.emit_expr(node, prec::LOWEST)?;
        let ambiguous = self.writer.first_text_since(mark).is_some_and(|text| {
            text.starts_with('{') || text.starts_with("function") || text.starts_with("class ")
        });
        if ambiguous {
            self.writer.wrap_parens(mark);
        }
        Ok(Shape::Simple)
    }

    // =========================================================================
    // Statement lists and bodies
    // =========================================================================

    /// Emit statements with separators between them. Returns the shape of
    /// the last one, or `None` when nothing was emitted.
    pub(crate) fn emit_statement_list(&mut self, statements: &[Node]) -> Result<Option<Shape>> {
        let mut last = None;
        for statement in statements {
            if let Some(shape) = last {
                self.statement_separator(shape);
            }
            last = Some(self.emit_statement(statement)?);
        }
        Ok(last)
    }

    pub(crate) fn statement_separator(&mut self, previous: Shape) {
        if self.vertical {
            if previous == Shape::Simple {
                self.writer.write(";");
            }
            self.writer.newline();
        } else {
            self.writer.write("; ");
        }
    }

    /// `{ statements }` with its own block scope; `{}` when empty.
    pub(crate) fn emit_braced(&mut self, body: Option<&Node>) -> Result<()> {
        self.emit_braced_with(body, None)
    }

    /// Like [`Self::emit_braced`], with an extra statement emitted first.
    pub(crate) fn emit_braced_with(
        &mut self,
        body: Option<&Node>,
        prologue: Option<&dyn Fn(&mut Self) -> Result<Shape>>,
    ) -> Result<()> {
        let statements = statement_list(body);
        if statements.is_empty() && prologue.is_none() {
            self.write("{}");
            return Ok(());
        }
        self.write("{");
        self.line_break();
        self.push_block_scope();
        let result = self.emit_braced_contents(&statements, prologue);
        self.pop_block_scope();
        result?;
        self.line_break();
        self.write("}");
        Ok(())
    }

    fn emit_braced_contents(
        &mut self,
        statements: &[Node],
        prologue: Option<&dyn Fn(&mut Self) -> Result<Shape>>,
    ) -> Result<()> {
        if let Some(prologue) = prologue {
            let shape = prologue(self)?;
            if !statements.is_empty() {
                self.statement_separator(shape);
            }
        }
        self.emit_statement_list(statements)?;
        Ok(())
    }

    // =========================================================================
    // Writing
    // =========================================================================

    pub(crate) fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        match self.spans.last() {
            Some(Some(span)) => self.writer.write_mapped(
                text,
                Origin {
                    span: span.clone(),
                    name: None,
                },
            ),
            _ => self.writer.write(text),
        }
    }

    /// Write a name, recording the original spelling in the map's `names`.
    pub(crate) fn write_identifier(&mut self, text: &str, original: &str) {
        match self.spans.last() {
            Some(Some(span)) => self.writer.write_mapped(
                text,
                Origin {
                    span: span.clone(),
                    name: Some(original.to_string()),
                },
            ),
            _ => self.writer.write(text),
        }
    }

    /// A newline in vertical mode; nothing in compact mode.
    pub(crate) fn line_break(&mut self) {
        if self.vertical {
            self.writer.newline();
        }
    }

    pub(crate) fn es(&self, level: EsLevel) -> bool {
        self.options.eslevel.supports(level)
    }

    fn enter(&mut self, node: &Node) -> Result<()> {
        if self.depth >= limits::MAX_EMIT_DEPTH {
            return Err(ConvertError::Pipeline {
                kind: node.kind(),
                message: format!("tree nesting exceeds {} levels", limits::MAX_EMIT_DEPTH),
                location: node.location().cloned(),
                stage: "emit".to_string(),
            });
        }
        self.depth += 1;
        self.spans.push(node.location().cloned());
        Ok(())
    }

    fn leave(&mut self) {
        self.depth -= 1;
        self.spans.pop();
    }

    // =========================================================================
    // Errors
    // =========================================================================

    pub(crate) fn unsupported(
        &self,
        node: &Node,
        feature: impl Into<String>,
        required: Option<EsLevel>,
    ) -> ConvertError {
        ConvertError::UnsupportedConstruct {
            kind: node.kind(),
            feature: feature.into(),
            required,
            configured: self.options.eslevel,
            location: node.location().cloned(),
            stage: "emit".to_string(),
        }
    }

    /// Fail unless the configured tier reaches `level`.
    pub(crate) fn require(&self, node: &Node, feature: &str, level: EsLevel) -> Result<()> {
        if self.es(level) {
            Ok(())
        } else {
            Err(self.unsupported(node, feature, Some(level)))
        }
    }

    pub(crate) fn malformed(&self, node: &Node, message: impl Into<String>) -> ConvertError {
        ConvertError::Pipeline {
            kind: node.kind(),
            message: message.into(),
            location: node.location().cloned(),
            stage: "emit".to_string(),
        }
    }

    pub(crate) fn unexpected(&self, node: &Node, context: &str) -> ConvertError {
        self.malformed(node, format!("no pass lowered {context}"))
    }
}

/// Flatten `begin`-style sequences into the statements they hold, dropping
/// `nil` placeholders.
pub(crate) fn statement_list(body: Option<&Node>) -> Vec<Node> {
    fn flatten(node: &Node, out: &mut Vec<Node>) {
        match node.kind() {
            NodeKind::Begin | NodeKind::Kwbegin | NodeKind::Hide => {
                for child in node.child_nodes() {
                    flatten(child, out);
                }
            }
            NodeKind::Nil => {}
            _ => out.push(node.clone()),
        }
    }
    let mut out = Vec::new();
    if let Some(body) = body {
        flatten(body, &mut out);
    }
    out
}

/// A literal child wrapped in the node kind that prints it.
pub(crate) fn literal_node(literal: &Literal) -> Node {
    let kind = match literal {
        Literal::Nil => NodeKind::Nil,
        Literal::Bool(true) => NodeKind::True,
        Literal::Bool(false) => NodeKind::False,
        Literal::Int(_) => NodeKind::Int,
        Literal::Float(_) => NodeKind::Float,
        Literal::Str(_) => NodeKind::Str,
        Literal::Sym(_) => NodeKind::Sym,
        Literal::Regex { .. } => NodeKind::Regexp,
    };
    match literal {
        Literal::Nil | Literal::Bool(_) => Node::new(kind, Vec::new()),
        _ => Node::new(kind, vec![Child::Lit(literal.clone())]),
    }
}

/// Children from `from` on, as nodes (literal children are wrapped).
pub(crate) fn nodes_from(node: &Node, from: usize) -> Vec<Node> {
    node.children()
        .get(from..)
        .unwrap_or(&[])
        .iter()
        .map(|child| match child {
            Child::Node(node) => node.clone(),
            Child::Lit(literal) => literal_node(literal),
        })
        .collect()
}

/// Ruby method name as a JavaScript property: `empty?` → `empty`.
pub(crate) fn js_method_name(name: &str) -> &str {
    name.strip_suffix(['?', '!']).unwrap_or(name)
}

/// `@name` → `_name`.
pub(crate) fn ivar_property(name: &str) -> String {
    format!("_{}", name.trim_start_matches('@'))
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    chars
        .next()
        .is_some_and(|first| first.is_alphabetic() || first == '_' || first == '$')
        && chars.all(|ch| ch.is_alphanumeric() || ch == '_' || ch == '$')
}
