use super::operators::prec;
use super::scope::FrameKind;
use super::{Printer, Shape, js_method_name, nodes_from, statement_list};
use crate::error::Result;
use r2js_ast::{Child, Node, NodeKind};
use r2js_common::EsLevel;
use tracing::trace;

/// Parameter added to methods that `yield` without naming their block.
const IMPLICIT_BLOCK: &str = "_implicitBlockYield";

/// Work a parameter list leaves for the top of the body below ES2015.
enum ParamPrologue {
    /// `if (name == null) name = value`
    Default { name: String, value: Node },
    /// `var name = Array.prototype.slice.call(arguments, index)`
    Rest { name: String, index: usize },
}

impl<'a> Printer<'a> {
    // =========================================================================
    // Methods
    // =========================================================================

    /// `def name(args) body` as a statement → `function name(args) {...}`.
    pub(super) fn emit_function_declaration(&mut self, node: &Node) -> Result<Shape> {
        self.emit_function_expression(node)?;
        Ok(Shape::Compound)
    }

    pub(super) fn emit_function_expression(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.sym_at(0) else {
            return Err(self.malformed(node, "def without a name"));
        };
        self.write("function ");
        self.write_identifier(js_method_name(name), name);
        self.emit_callable(node.node_at(1), node.node_at(2), FrameKind::Method, false)?;
        Ok(prec::PRIMARY)
    }

    /// `def self.name` outside of a class → `recv.name = function(...) {...}`.
    pub(super) fn emit_singleton_method(&mut self, node: &Node) -> Result<Shape> {
        let (Some(receiver), Some(name)) = (node.node_at(0), node.sym_at(1)) else {
            return Err(self.malformed(node, "defs needs a receiver and a name"));
        };
        self.emit_receiver(receiver)?;
        self.write(".");
        self.write_identifier(js_method_name(name), name);
        self.write(" = function");
        self.emit_callable(node.node_at(2), node.node_at(3), FrameKind::Method, false)?;
        Ok(Shape::Simple)
    }

    /// `async def ...` / `async -> {...}`.
    pub(super) fn emit_async(&mut self, node: &Node, target: &Node) -> Result<u8> {
        self.require(node, "`async` functions", EsLevel::ES2017)?;
        if !matches!(target.kind(), NodeKind::Def | NodeKind::Block) {
            return Err(self.unsupported(node, "`async` applied to something other than a function", None));
        }
        self.write("async ");
        self.emit_expr(target, prec::ASSIGN)
    }

    // =========================================================================
    // Blocks and closures
    // =========================================================================

    /// `(block call args body)`: the call with the block as last argument, or
    /// a bare function for `lambda`, `proc` and `->`.
    pub(super) fn emit_block(&mut self, node: &Node) -> Result<u8> {
        let Some(call) = node.node_at(0) else {
            return Err(self.malformed(node, "block without a call"));
        };
        match call.kind() {
            NodeKind::Lambda => self.emit_block_function(node),
            NodeKind::Send
                if call.child(0).is_none_or(Child::is_nil)
                    && matches!(call.sym_at(1), Some("lambda" | "proc"))
                    && call.children().len() == 2 =>
            {
                self.emit_block_function(node)
            }
            NodeKind::Send | NodeKind::Csend => self.emit_send(call, Some(node)),
            NodeKind::Call => self.emit_call(call, Some(node)),
            NodeKind::Super | NodeKind::Zsuper => self.emit_super(call, Some(node)),
            kind => Err(self.unexpected(node, &format!("a block attached to `{kind}`"))),
        }
    }

    /// The function a block turns into: an arrow from ES2015, otherwise a
    /// function expression that reaches `this` through `_this`.
    pub(super) fn emit_block_function(&mut self, block: &Node) -> Result<u8> {
        let arrow = self.es(EsLevel::ES2015);
        if !arrow {
            self.write("function");
        }
        self.emit_callable(block.node_at(1), block.node_at(2), FrameKind::Closure, arrow)?;
        Ok(if arrow { prec::ASSIGN } else { prec::PRIMARY })
    }

    /// `&:name` → `item => item.name`.
    pub(super) fn emit_symbol_function(&mut self, name: &str) -> Result<()> {
        let property = js_method_name(name);
        if self.es(EsLevel::ES2015) {
            self.write(&format!("item => item.{property}"));
        } else {
            self.write(&format!("function(item) {{return item.{property}}}"));
        }
        Ok(())
    }

    /// `yield args` calls the method's block parameter.
    pub(super) fn emit_yield(&mut self, node: &Node) -> Result<u8> {
        let Some(callee) = self.block_param().map(str::to_string) else {
            return Err(self.unsupported(node, "`yield` outside of a method", None));
        };
        let args = nodes_from(node, 0);
        self.write_identifier(&callee, &callee);
        self.emit_arguments(&args, None)?;
        Ok(prec::CALL)
    }

    // =========================================================================
    // Parameters and bodies
    // =========================================================================

    /// `(params) {body}`, or `(params) => body` for arrows, in a new frame.
    pub(super) fn emit_callable(
        &mut self,
        args: Option<&Node>,
        body: Option<&Node>,
        kind: FrameKind,
        arrow: bool,
    ) -> Result<()> {
        self.push_frame(kind, arrow);
        let result = self.emit_callable_inner(args, body, kind, arrow);
        self.finish_frame();
        result
    }

    fn emit_callable_inner(
        &mut self,
        args: Option<&Node>,
        body: Option<&Node>,
        kind: FrameKind,
        arrow: bool,
    ) -> Result<()> {
        let params: Vec<Node> = args.map(|args| nodes_from(args, 0)).unwrap_or_default();

        if kind == FrameKind::Method && body.is_some_and(uses_yield) {
            let named = params
                .iter()
                .find(|param| param.is(NodeKind::Blockarg))
                .and_then(|param| param.sym_at(0))
                .map(str::to_string);
            let callee = named.unwrap_or_else(|| IMPLICIT_BLOCK.to_string());
            if let Some(frame) = self.frames.last_mut() {
                frame.block_param = Some(callee);
            }
        }
        let implicit_block = self
            .frames
            .last()
            .and_then(|frame| frame.block_param.as_deref())
            == Some(IMPLICIT_BLOCK);

        let bare = arrow && !implicit_block && single_plain_param(&params).is_some();
        if let Some(name) = single_plain_param(&params).filter(|_| bare) {
            self.declare(name);
            self.write_identifier(name, name);
        } else {
            self.write("(");
            let prologue = self.emit_params(&params, implicit_block)?;
            self.write(")");
            if !prologue.is_empty() {
                self.write(if arrow { " => " } else { " " });
                let emit_prologue = |printer: &mut Self| printer.emit_param_prologue(&prologue);
                return self.emit_function_body(body, Some(&emit_prologue));
            }
        }

        if !arrow {
            self.write(" ");
            return self.emit_function_body(body, None);
        }
        self.write(" => ");

        if let Some(value) = body.and_then(|body| self.concise_body(body)) {
            let mark = self.writer.mark();
            self.emit_expr(&value, prec::ASSIGN)?;
            if self.writer.first_text_since(mark).is_some_and(|text| text.starts_with('{')) {
                self.writer.wrap_parens(mark);
            }
            return Ok(());
        }
        self.emit_function_body(body, None)
    }

    /// The returned expression when an arrow body is a single `return`.
    fn concise_body(&self, body: &Node) -> Option<Node> {
        let rewritten = if body.is(NodeKind::Autoreturn) {
            self.tail_return(body)
        } else {
            body.clone()
        };
        let statements = statement_list(Some(&rewritten));
        let [statement] = statements.as_slice() else {
            return None;
        };
        if !statement.is(NodeKind::Return) || statement.children().len() != 1 {
            return None;
        }
        let value = statement.node_at(0)?;
        if self.is_statement_only(value) || assigns_locals(value) {
            return None;
        }
        Some(value.clone())
    }

    /// Write the parameters between the parentheses, declaring each name.
    fn emit_params(&mut self, params: &[Node], implicit_block: bool) -> Result<Vec<ParamPrologue>> {
        let mut prologue = Vec::new();
        let mut written = 0usize;
        let keywords: Vec<&Node> = params
            .iter()
            .filter(|param| {
                matches!(param.kind(), NodeKind::Kwarg | NodeKind::Kwoptarg | NodeKind::Kwrestarg)
            })
            .collect();
        let mut keywords_written = false;

        for param in params {
            match param.kind() {
                NodeKind::Kwarg | NodeKind::Kwoptarg | NodeKind::Kwrestarg => {
                    if keywords_written {
                        continue;
                    }
                    self.separate_param(&mut written);
                    self.emit_keyword_params(&keywords)?;
                    keywords_written = true;
                }
                NodeKind::Optarg => {
                    let (Some(name), Some(value)) = (param.sym_at(0), param.node_at(1)) else {
                        return Err(self.malformed(param, "optarg needs a name and a default"));
                    };
                    self.separate_param(&mut written);
                    self.declare(name);
                    self.write_identifier(name, name);
                    if self.es(EsLevel::ES2015) {
                        self.write(" = ");
                        self.emit_expr(value, prec::ASSIGN)?;
                    } else {
                        prologue.push(ParamPrologue::Default {
                            name: name.to_string(),
                            value: value.clone(),
                        });
                    }
                }
                NodeKind::Restarg => {
                    let Some(name) = param.sym_at(0) else { continue };
                    if self.es(EsLevel::ES2015) {
                        self.separate_param(&mut written);
                        self.declare(name);
                        self.write("...");
                        self.write_identifier(name, name);
                    } else {
                        self.declare(name);
                        prologue.push(ParamPrologue::Rest {
                            name: name.to_string(),
                            index: written,
                        });
                    }
                }
                _ => {
                    self.separate_param(&mut written);
                    self.emit_param(param)?;
                }
            }
        }
        if implicit_block {
            self.separate_param(&mut written);
            self.declare(IMPLICIT_BLOCK);
            self.write(IMPLICIT_BLOCK);
        }
        Ok(prologue)
    }

    fn separate_param(&mut self, written: &mut usize) {
        if *written > 0 {
            self.write(", ");
        }
        *written += 1;
    }

    /// A positional parameter: `x`, `[a, b]`.
    fn emit_param(&mut self, param: &Node) -> Result<()> {
        match param.kind() {
            NodeKind::Arg | NodeKind::Blockarg => {
                let Some(name) = param.sym_at(0) else {
                    return Err(self.malformed(param, "parameter without a name"));
                };
                self.declare(name);
                self.write_identifier(name, name);
                Ok(())
            }
            NodeKind::Procarg0 => {
                if let Some(name) = param.sym_at(0) {
                    self.declare(name);
                    self.write_identifier(name, name);
                    return Ok(());
                }
                let inner: Vec<&Node> = param.child_nodes().collect();
                match inner.as_slice() {
                    [single] => self.emit_param(single),
                    _ => self.emit_destructured_param(param),
                }
            }
            NodeKind::Mlhs => self.emit_destructured_param(param),
            NodeKind::Restarg => {
                self.require(param, "rest parameter", EsLevel::ES2015)?;
                self.write("...");
                match param.sym_at(0) {
                    Some(name) => {
                        self.declare(name);
                        self.write_identifier(name, name);
                    }
                    None => self.write("_"),
                }
                Ok(())
            }
            kind => Err(self.unexpected(param, &format!("`{kind}` as a parameter"))),
        }
    }

    /// `[a, b]` for a destructured block parameter.
    fn emit_destructured_param(&mut self, param: &Node) -> Result<()> {
        self.require(param, "destructured parameter", EsLevel::ES2015)?;
        self.write("[");
        for (index, inner) in param.child_nodes().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            self.emit_param(inner)?;
        }
        self.write("]");
        Ok(())
    }

    /// Keyword parameters destructure one options object:
    /// `{a, b = 1, ...rest}`.
    fn emit_keyword_params(&mut self, keywords: &[&Node]) -> Result<()> {
        let Some(first) = keywords.first() else {
            return Ok(());
        };
        self.require(first, "keyword arguments", EsLevel::ES2015)?;
        self.write("{");
        for (index, keyword) in keywords.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            let name = keyword.sym_at(0);
            match keyword.kind() {
                NodeKind::Kwrestarg => {
                    self.require(keyword, "keyword rest parameter", EsLevel::ES2018)?;
                    self.write("...");
                    let name = name.unwrap_or("_rest");
                    self.declare(name);
                    self.write_identifier(name, name);
                }
                kind => {
                    let Some(name) = name else {
                        return Err(self.malformed(keyword, "keyword parameter without a name"));
                    };
                    self.declare(name);
                    self.write_identifier(name, name);
                    if kind == NodeKind::Kwoptarg {
                        self.write(" = ");
                        self.emit_child_expr(keyword.child(1), prec::ASSIGN)?;
                    }
                }
            }
        }
        self.write("}");
        if keywords.iter().all(|keyword| !keyword.is(NodeKind::Kwarg)) {
            self.write(" = {}");
        }
        Ok(())
    }

    fn emit_param_prologue(&mut self, prologue: &[ParamPrologue]) -> Result<Shape> {
        for (index, item) in prologue.iter().enumerate() {
            if index > 0 {
                self.statement_separator(Shape::Simple);
            }
            match item {
                ParamPrologue::Default { name, value } => {
                    self.write("if (");
                    self.write_identifier(name, name);
                    self.write(" == null) ");
                    self.write_identifier(name, name);
                    self.write(" = ");
                    self.emit_expr(value, prec::ASSIGN)?;
                }
                ParamPrologue::Rest { name, index } => {
                    trace!(name = %name, "rest parameter from arguments");
                    self.write("var ");
                    self.write_identifier(name, name);
                    self.write(&format!(" = Array.prototype.slice.call(arguments, {index})"));
                }
            }
        }
        Ok(Shape::Simple)
    }

    /// `{ statements }` for a function, reserving room for the `_this` alias
    /// and hoisted declarations. The frame must already be pushed.
    pub(super) fn emit_function_body(
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
        self.open_slots();
        if let Some(body) = body {
            self.prepare_hoisting(body);
        }
        self.emit_braced_contents(&statements, prologue)?;
        self.line_break();
        self.write("}");
        Ok(())
    }
}

/// The name of a lone simple parameter, which an arrow writes bare.
fn single_plain_param(params: &[Node]) -> Option<&str> {
    let [param] = params else {
        return None;
    };
    match param.kind() {
        NodeKind::Arg => param.sym_at(0),
        NodeKind::Procarg0 => {
            if let Some(name) = param.sym_at(0) {
                return Some(name);
            }
            let mut inner = param.child_nodes();
            match (inner.next(), inner.next()) {
                (Some(arg), None) if arg.is(NodeKind::Arg) => arg.sym_at(0),
                _ => None,
            }
        }
        _ => None,
    }
}

/// `yield` in this method's body, including inside its blocks.
pub(super) fn uses_yield(body: &Node) -> bool {
    match body.kind() {
        NodeKind::Yield => true,
        NodeKind::Def | NodeKind::Defs | NodeKind::Class | NodeKind::Module | NodeKind::Sclass => false,
        _ => body.child_nodes().any(uses_yield),
    }
}

fn assigns_locals(node: &Node) -> bool {
    let mut found = false;
    node.walk(&mut |inner| {
        if matches!(inner.kind(), NodeKind::Lvasgn | NodeKind::Masgn) {
            found = true;
        }
    });
    found
}
