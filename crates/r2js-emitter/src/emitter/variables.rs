use super::operators::prec;
use super::statements::is_simple;
use super::{Printer, Shape, ivar_property, js_method_name, nodes_from};
use crate::error::Result;
use r2js_ast::{Child, Node, NodeKind};
use r2js_common::{EsLevel, LogicalOperator};

impl<'a> Printer<'a> {
    // =========================================================================
    // Variable references
    // =========================================================================

    pub(super) fn emit_lvar(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.sym_at(0) else {
            return Err(self.malformed(node, "local variable without a name"));
        };
        self.write_identifier(name, name);
        Ok(prec::PRIMARY)
    }

    /// `@name` → `this._name`.
    pub(super) fn emit_ivar(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.sym_at(0) else {
            return Err(self.malformed(node, "instance variable without a name"));
        };
        let this = self.this_ref();
        self.write(this);
        self.write(".");
        self.write_identifier(&ivar_property(name), name);
        Ok(prec::CALL)
    }

    /// `@@name` → `ClassName._name`.
    pub(super) fn emit_cvar(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.sym_at(0) else {
            return Err(self.malformed(node, "class variable without a name"));
        };
        let Some(class) = self.classes.last().map(|class| class.name.clone()) else {
            return Err(self.unsupported(node, "class variable outside of a class", None));
        };
        self.write(&class);
        self.write(".");
        self.write_identifier(&format!("_{}", name.trim_start_matches('@')), name);
        Ok(prec::CALL)
    }

    pub(super) fn emit_gvar(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.sym_at(0) else {
            return Err(self.malformed(node, "global variable without a name"));
        };
        self.write_identifier(name, name);
        Ok(prec::PRIMARY)
    }

    /// `(const scope :Name)`; a `cbase` scope is the global namespace.
    pub(super) fn emit_const(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.sym_at(1) else {
            return Err(self.malformed(node, "constant without a name"));
        };
        match node.node_at(0) {
            Some(scope) if !scope.is(NodeKind::Cbase) => {
                self.emit_expr(scope, prec::CALL)?;
                self.write(".");
                self.write_identifier(name, name);
                Ok(prec::CALL)
            }
            _ => {
                self.write_identifier(name, name);
                Ok(prec::PRIMARY)
            }
        }
    }

    // =========================================================================
    // Assignment
    // =========================================================================

    /// Assignment in expression position. Undeclared locals are hoisted.
    pub(super) fn emit_assignment(&mut self, node: &Node) -> Result<u8> {
        self.emit_assignment_target(node)?;
        self.write(" = ");
        let value_index = if node.is(NodeKind::Casgn) { 2 } else { 1 };
        self.emit_child_expr(node.child(value_index), prec::ASSIGN)?;
        Ok(prec::ASSIGN)
    }

    /// The left-hand side of an assignment node (`lvasgn`, `ivasgn`, ...)
    /// or of the target of `op_asgn`/`or_asgn`/`and_asgn`.
    pub(super) fn emit_assignment_target(&mut self, target: &Node) -> Result<()> {
        match target.kind() {
            NodeKind::Lvasgn => {
                let Some(name) = target.sym_at(0) else {
                    return Err(self.malformed(target, "assignment without a name"));
                };
                if !self.is_declared(name) {
                    self.hoist(name);
                }
                self.write_identifier(name, name);
            }
            NodeKind::Ivasgn => {
                let name = target.sym_at(0).unwrap_or_default();
                let this = self.this_ref();
                self.write(this);
                self.write(".");
                self.write_identifier(&ivar_property(name), name);
            }
            NodeKind::Cvasgn => {
                let cvar = target.updated(Some(NodeKind::Cvar), target.children().get(..1).unwrap_or(&[]).to_vec());
                self.emit_cvar(&cvar)?;
            }
            NodeKind::Gvasgn => {
                let name = target.sym_at(0).unwrap_or_default();
                self.write_identifier(name, name);
            }
            NodeKind::Casgn => {
                let constant = target.updated(Some(NodeKind::Const), target.children().get(..2).unwrap_or(&[]).to_vec());
                self.emit_const(&constant)?;
            }
            NodeKind::Send => {
                let Some(receiver) = target.node_at(0) else {
                    let name = target.sym_at(1).unwrap_or_default();
                    self.write_identifier(js_method_name(name), name);
                    return Ok(());
                };
                let method = target.sym_at(1).unwrap_or_default();
                let args = nodes_from(target, 2);
                self.emit_receiver(receiver)?;
                match method {
                    "[]" => {
                        let [index] = args.as_slice() else {
                            return Err(self.unsupported(target, "multi-argument index assignment", None));
                        };
                        self.write("[");
                        self.emit_expr(index, prec::LOWEST)?;
                        self.write("]");
                    }
                    _ => {
                        self.write(".");
                        self.write(js_method_name(method.trim_end_matches('=')));
                    }
                }
            }
            NodeKind::Index | NodeKind::Indexasgn => {
                let Some(receiver) = target.node_at(0) else {
                    return Err(self.malformed(target, "index without a receiver"));
                };
                let args = nodes_from(target, 1);
                let [index] = args.as_slice() else {
                    return Err(self.unsupported(target, "multi-argument index assignment", None));
                };
                self.emit_receiver(receiver)?;
                self.write("[");
                self.emit_expr(index, prec::LOWEST)?;
                self.write("]");
            }
            NodeKind::Csend => {
                return Err(self.unsupported(target, "assignment through `&.`", None));
            }
            kind => return Err(self.unexpected(target, &format!("`{kind}` as an assignment target"))),
        }
        Ok(())
    }

    /// Write `target` where it is first used and return the node that reads
    /// it again. Receivers and indexes with side effects are stored in temps
    /// on the way: `(_a = g()).x` then `_a.x`.
    fn emit_target_once(&mut self, target: &Node) -> Result<Node> {
        let (receiver_at, index_at) = match target.kind() {
            NodeKind::Send if target.node_at(0).is_some() => {
                (0, (target.sym_at(1) == Some("[]")).then_some(2))
            }
            NodeKind::Index | NodeKind::Indexasgn => (0, Some(1)),
            _ => {
                self.emit_assignment_target(target)?;
                return Ok(target.clone());
            }
        };
        let mut first = target.children().to_vec();
        let mut again = first.clone();
        for position in std::iter::once(receiver_at).chain(index_at) {
            let Some(part) = target.node_at(position) else { continue };
            if is_simple(part) {
                continue;
            }
            let (store, load) = self.bind_temporary(part);
            first[position] = Child::from(store);
            again[position] = Child::from(load);
        }
        self.emit_assignment_target(&target.updated(None, first))?;
        Ok(target.updated(None, again))
    }

    /// `x = value` as a statement: declares `x` on first assignment.
    pub(super) fn emit_local_declaration(&mut self, node: &Node) -> Result<Shape> {
        let Some(name) = node.sym_at(0) else {
            return Err(self.malformed(node, "assignment without a name"));
        };
        if !self.is_declared(name) {
            let keyword = self.decl_keyword();
            self.write(keyword);
            self.write(" ");
            self.declare(name);
        }
        self.write_identifier(name, name);
        self.write(" = ");
        self.emit_child_expr(node.child(1), prec::ASSIGN)?;
        Ok(Shape::Simple)
    }

    /// `X = value` → `const X = value`; scoped constants assign a property.
    pub(super) fn emit_constant_declaration(&mut self, node: &Node) -> Result<Shape> {
        let Some(name) = node.sym_at(1) else {
            return Err(self.malformed(node, "constant assignment without a name"));
        };
        match node.node_at(0) {
            Some(scope) if !scope.is(NodeKind::Cbase) => {
                self.emit_expr(scope, prec::CALL)?;
                self.write(".");
                self.write_identifier(name, name);
            }
            _ => {
                if !self.is_declared(name) {
                    let keyword = self.const_keyword();
                    self.write(keyword);
                    self.write(" ");
                    self.declare(name);
                }
                self.write_identifier(name, name);
            }
        }
        self.write(" = ");
        self.emit_child_expr(node.child(2), prec::ASSIGN)?;
        Ok(Shape::Simple)
    }

    // =========================================================================
    // Compound assignment
    // =========================================================================

    pub(super) fn emit_op_asgn(&mut self, node: &Node) -> Result<u8> {
        let (Some(target), Some(operator)) = (node.node_at(0), node.sym_at(1)) else {
            return Err(self.malformed(node, "op_asgn needs a target and an operator"));
        };
        let value = node.child(2);
        if operator == "**" && !self.es(EsLevel::ES2016) {
            let again = self.emit_target_once(target)?;
            self.write(" = Math.pow(");
            self.emit_assignment_target(&again)?;
            self.write(", ");
            self.emit_child_expr(value, prec::ASSIGN)?;
            self.write(")");
            return Ok(prec::ASSIGN);
        }
        if !matches!(operator, "+" | "-" | "*" | "/" | "%" | "**" | "<<" | ">>" | "&" | "|" | "^") {
            return Err(self.unsupported(node, format!("compound assignment with `{operator}`"), None));
        }
        self.emit_assignment_target(target)?;
        self.write(&format!(" {operator}= "));
        self.emit_child_expr(value, prec::ASSIGN)?;
        Ok(prec::ASSIGN)
    }

    /// Statement form: `x += 1` becomes `x++`.
    pub(super) fn emit_op_asgn_statement(&mut self, node: &Node) -> Result<Shape> {
        let step = node
            .node_at(2)
            .filter(|value| value.is(NodeKind::Int))
            .and_then(|value| value.child(0).and_then(Child::as_int));
        if let (Some(target), Some(operator), Some(1)) = (node.node_at(0), node.sym_at(1), step)
            && matches!(operator, "+" | "-")
        {
            self.emit_assignment_target(target)?;
            self.write(if operator == "+" { "++" } else { "--" });
            return Ok(Shape::Simple);
        }
        self.emit_op_asgn(node)?;
        Ok(Shape::Simple)
    }

    /// `a ||= b` / `a &&= b`; below ES2021 `a = a || b`.
    pub(super) fn emit_logical_asgn(&mut self, node: &Node) -> Result<u8> {
        let Some(target) = node.node_at(0) else {
            return Err(self.malformed(node, "logical assignment without a target"));
        };
        let value = node.child(1);
        let operator = if node.is(NodeKind::AndAsgn) {
            "&&"
        } else if self.options.or == LogicalOperator::Nullish {
            self.require(node, "nullish coalescing (`??`)", EsLevel::ES2020)?;
            "??"
        } else {
            "||"
        };
        if self.es(EsLevel::ES2021) {
            self.emit_assignment_target(target)?;
            self.write(&format!(" {operator}= "));
            self.emit_child_expr(value, prec::ASSIGN)?;
            return Ok(prec::ASSIGN);
        }
        let again = self.emit_target_once(target)?;
        self.write(" = ");
        self.emit_assignment_target(&again)?;
        self.write(&format!(" {operator} "));
        let min = if operator == "??" { prec::BIT_OR } else { prec::OR + 1 };
        self.emit_child_expr(value, min)?;
        Ok(prec::ASSIGN)
    }

    /// Statement form: `x ||= 1` on an undeclared local is a declaration.
    pub(super) fn emit_logical_asgn_statement(&mut self, node: &Node) -> Result<Shape> {
        if let Some(target) = node.node_at(0)
            && target.is(NodeKind::Lvasgn)
            && let Some(name) = target.sym_at(0)
            && !self.is_declared(name)
        {
            if node.is(NodeKind::AndAsgn) {
                let keyword = self.decl_keyword();
                self.write(&format!("{keyword} "));
                self.declare(name);
                self.write_identifier(name, name);
                return Ok(Shape::Simple);
            }
            let declaration = target.updated(None, vec![Child::sym(name), node.child(1).cloned().unwrap_or(Child::NIL)]);
            return self.emit_local_declaration(&declaration);
        }
        self.emit_logical_asgn(node)?;
        Ok(Shape::Simple)
    }

    // =========================================================================
    // Multiple assignment
    // =========================================================================

    /// `a, b = b, a` → `[a, b] = [b, a]`, declaring with `let` when every
    /// target is a new local.
    pub(super) fn emit_masgn_statement(&mut self, node: &Node) -> Result<Shape> {
        let (Some(targets), Some(value)) = (node.node_at(0), node.node_at(1)) else {
            return Err(self.malformed(node, "masgn needs targets and a value"));
        };
        if !self.es(EsLevel::ES2015) {
            return self.emit_masgn_temporaries(targets, value);
        }
        let mut locals = Vec::new();
        collect_local_targets(targets, &mut locals);
        let fresh = !locals.is_empty()
            && locals.iter().all(|name| !self.is_declared(name))
            && all_local_targets(targets);
        if fresh {
            let keyword = self.decl_keyword();
            self.write(&format!("{keyword} "));
            for name in &locals {
                self.declare(name);
            }
        }
        self.emit_destructuring(targets)?;
        self.write(" = ");
        self.emit_expr(value, prec::ASSIGN)?;
        Ok(Shape::Simple)
    }

    pub(super) fn emit_masgn_expr(&mut self, node: &Node) -> Result<u8> {
        self.require(node, "multiple assignment in expression position", EsLevel::ES2015)?;
        let (Some(targets), Some(value)) = (node.node_at(0), node.node_at(1)) else {
            return Err(self.malformed(node, "masgn needs targets and a value"));
        };
        self.write("(");
        self.emit_destructuring(targets)?;
        self.write(" = ");
        self.emit_expr(value, prec::ASSIGN)?;
        self.write(")");
        Ok(prec::PRIMARY)
    }

    /// `[a, this._b, ...rest]` from an `mlhs`.
    fn emit_destructuring(&mut self, targets: &Node) -> Result<()> {
        self.write("[");
        for (index, target) in targets.child_nodes().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            match target.kind() {
                NodeKind::Mlhs => self.emit_destructuring(target)?,
                NodeKind::Splat => {
                    self.write("...");
                    match target.node_at(0) {
                        Some(inner) => self.emit_assignment_target(inner)?,
                        None => self.write("_"),
                    }
                }
                _ => self.emit_assignment_target(target)?,
            }
        }
        self.write("]");
        Ok(())
    }

    /// ES5: `var _a = value; a = _a[0]; b = _a[1]`.
    fn emit_masgn_temporaries(&mut self, targets: &Node, value: &Node) -> Result<Shape> {
        let temp = self.make_unique_name();
        self.write(&format!("var {temp} = "));
        self.emit_expr(value, prec::ASSIGN)?;
        let count = targets.child_nodes().count();
        for (index, target) in targets.child_nodes().enumerate() {
            self.statement_separator(Shape::Simple);
            match target.kind() {
                NodeKind::Mlhs => {
                    return Err(self.unsupported(target, "nested multiple assignment", Some(EsLevel::ES2015)));
                }
                NodeKind::Splat => {
                    let Some(inner) = target.node_at(0) else { continue };
                    self.emit_lowered_target(inner)?;
                    let rest = count - index - 1;
                    if rest == 0 {
                        self.write(&format!("{temp}.slice({index})"));
                    } else {
                        self.write(&format!("{temp}.slice({index}, {temp}.length - {rest})"));
                    }
                }
                _ => {
                    self.emit_lowered_target(target)?;
                    self.write(&format!("{temp}[{index}]"));
                }
            }
        }
        Ok(Shape::Simple)
    }

    fn emit_lowered_target(&mut self, target: &Node) -> Result<()> {
        if target.is(NodeKind::Lvasgn)
            && let Some(name) = target.sym_at(0)
            && !self.is_declared(name)
        {
            self.write("var ");
            self.declare(name);
        }
        self.emit_assignment_target(target)?;
        self.write(" = ");
        Ok(())
    }
}

fn collect_local_targets(targets: &Node, out: &mut Vec<String>) {
    for target in targets.child_nodes() {
        match target.kind() {
            NodeKind::Lvasgn => out.extend(target.sym_at(0).map(str::to_string)),
            NodeKind::Mlhs => collect_local_targets(target, out),
            NodeKind::Splat => {
                if let Some(inner) = target.node_at(0)
                    && inner.is(NodeKind::Lvasgn)
                {
                    out.extend(inner.sym_at(0).map(str::to_string));
                }
            }
            _ => {}
        }
    }
}

fn all_local_targets(targets: &Node) -> bool {
    targets.child_nodes().all(|target| match target.kind() {
        NodeKind::Lvasgn => true,
        NodeKind::Mlhs => all_local_targets(target),
        NodeKind::Splat => target.node_at(0).is_none_or(|inner| inner.is(NodeKind::Lvasgn)),
        _ => false,
    })
}
