use super::operators::prec;
use super::{Printer, Shape, nodes_from, statement_list};
use crate::error::Result;
use r2js_ast::{Child, Literal, Node, NodeKind};
use r2js_common::EsLevel;
use tracing::trace;

/// Binding for the exception inside lowered `rescue` clauses.
const EXCEPTION: &str = "$EXCEPTION";

impl<'a> Printer<'a> {
    // =========================================================================
    // Implicit return
    // =========================================================================

    /// Rewrite the tail positions of `node` so each returns its value.
    ///
    /// Conditionals, `case`, and `begin`/`rescue` bodies recurse into every
    /// branch. Assignments return the assigned variable after the assignment;
    /// statements that transfer control or define something stay as they are.
    pub(super) fn tail_return(&self, node: &Node) -> Node {
        match node.kind() {
            NodeKind::Autoreturn => match node.node_at(0) {
                Some(body) => self.tail_return(body),
                None => Node::new(NodeKind::Nil, Vec::new()),
            },
            NodeKind::Begin | NodeKind::Kwbegin => {
                let children = node.children();
                let Some(last) = children.iter().rposition(|child| child.as_node().is_some()) else {
                    return node.clone();
                };
                let mut rewritten = children.to_vec();
                if let Some(tail) = children[last].as_node() {
                    rewritten[last] = Child::Node(self.tail_return(tail));
                }
                node.updated(None, rewritten)
            }
            NodeKind::If => {
                let mut children = node.children().to_vec();
                for branch in children.iter_mut().skip(1) {
                    if let Child::Node(body) = branch {
                        *branch = Child::Node(self.tail_return(body));
                    }
                }
                node.updated(None, children)
            }
            NodeKind::Case => {
                let count = node.children().len();
                let children = node
                    .children()
                    .iter()
                    .enumerate()
                    .map(|(index, child)| match child {
                        Child::Node(when) if when.is(NodeKind::When) => {
                            Child::Node(self.tail_return_last(when))
                        }
                        Child::Node(other) if index > 0 && index + 1 == count => {
                            Child::Node(self.tail_return(other))
                        }
                        _ => child.clone(),
                    })
                    .collect();
                node.updated(None, children)
            }
            NodeKind::Rescue => {
                let count = node.children().len();
                let children = node
                    .children()
                    .iter()
                    .enumerate()
                    .map(|(index, child)| match child {
                        Child::Node(resbody) if resbody.is(NodeKind::Resbody) => {
                            Child::Node(self.tail_return_last(resbody))
                        }
                        Child::Node(body) if index == 0 || index + 1 == count => {
                            Child::Node(self.tail_return(body))
                        }
                        _ => child.clone(),
                    })
                    .collect();
                node.updated(None, children)
            }
            NodeKind::Ensure => {
                let mut children = node.children().to_vec();
                if let Some(Child::Node(body)) = children.first() {
                    children[0] = Child::Node(self.tail_return(body));
                }
                node.updated(None, children)
            }
            NodeKind::Lvasgn | NodeKind::Ivasgn | NodeKind::Gvasgn | NodeKind::Cvasgn => {
                let read = match node.kind() {
                    NodeKind::Lvasgn => NodeKind::Lvar,
                    NodeKind::Ivasgn => NodeKind::Ivar,
                    NodeKind::Gvasgn => NodeKind::Gvar,
                    _ => NodeKind::Cvar,
                };
                let name = node.children().first().cloned().unwrap_or(Child::NIL);
                let value = Node::new(read, vec![name]);
                Node::with_location(
                    NodeKind::Begin,
                    vec![
                        Child::Node(node.clone()),
                        Child::Node(Node::new(NodeKind::Return, vec![Child::Node(value)])),
                    ],
                    node.location().cloned(),
                )
            }
            NodeKind::Return
            | NodeKind::Throw
            | NodeKind::Break
            | NodeKind::Next
            | NodeKind::While
            | NodeKind::Until
            | NodeKind::WhilePost
            | NodeKind::UntilPost
            | NodeKind::For
            | NodeKind::Def
            | NodeKind::Defs
            | NodeKind::Class
            | NodeKind::Module
            | NodeKind::Sclass
            | NodeKind::Hide
            | NodeKind::Nil
            | NodeKind::Masgn
            | NodeKind::Import
            | NodeKind::Export
            | NodeKind::Alias
            | NodeKind::Undef => node.clone(),
            _ => Node::with_location(
                NodeKind::Return,
                vec![Child::Node(node.clone())],
                node.location().cloned(),
            ),
        }
    }

    /// `when`/`resbody` bodies sit in their last child.
    fn tail_return_last(&self, node: &Node) -> Node {
        let mut children = node.children().to_vec();
        if let Some(Child::Node(body)) = children.last() {
            let body = self.tail_return(body);
            if let Some(last) = children.last_mut() {
                *last = Child::Node(body);
            }
        }
        node.updated(None, children)
    }

    // =========================================================================
    // Conditionals
    // =========================================================================

    pub(super) fn emit_if_statement(&mut self, node: &Node) -> Result<Shape> {
        let then_branch = node.node_at(1).filter(|branch| !branch.is(NodeKind::Nil));
        let else_branch = node.node_at(2).filter(|branch| !branch.is(NodeKind::Nil));

        self.write("if (");
        match (then_branch, else_branch) {
            (None, Some(else_branch)) => {
                self.emit_negated(node.child(0))?;
                self.write(") ");
                self.emit_braced(Some(else_branch))?;
                return Ok(Shape::Compound);
            }
            _ => {
                self.emit_child_expr(node.child(0), prec::LOWEST)?;
                self.write(") ");
            }
        }
        self.emit_braced(then_branch)?;
        if let Some(else_branch) = else_branch {
            self.write(" else ");
            if else_branch.is(NodeKind::If) {
                return self.emit_statement(else_branch);
            }
            self.emit_braced(Some(else_branch))?;
        }
        Ok(Shape::Compound)
    }

    /// `cond ? a : b`; branches that are statements go through an IIFE.
    pub(super) fn emit_if_expression(&mut self, node: &Node) -> Result<u8> {
        let branches_are_expressions = node
            .children()
            .iter()
            .skip(1)
            .filter_map(Child::as_node)
            .all(|branch| !self.is_statement_only(branch));
        if !branches_are_expressions {
            return self.emit_iife(node);
        }
        self.emit_child_expr(node.child(0), prec::OR)?;
        self.write(" ? ");
        self.emit_child_expr(node.child(1), prec::ASSIGN)?;
        self.write(" : ");
        self.emit_child_expr(node.child(2), prec::ASSIGN)?;
        Ok(prec::ASSIGN)
    }

    /// `!cond`, dropping an existing negation instead of doubling it.
    pub(super) fn emit_negated(&mut self, condition: Option<&Child>) -> Result<u8> {
        if let Some(Child::Node(inner)) = condition {
            if inner.is(NodeKind::Not) {
                return self.emit_child_expr(inner.child(0), prec::LOWEST);
            }
            if inner.is(NodeKind::Send)
                && inner.sym_at(1) == Some("!")
                && inner.children().len() == 2
                && let Some(receiver) = inner.node_at(0)
            {
                return self.emit_expr(receiver, prec::LOWEST);
            }
        }
        self.write("!");
        self.emit_child_expr(condition, prec::UNARY)?;
        Ok(prec::UNARY)
    }

    // =========================================================================
    // Case
    // =========================================================================

    /// `case` becomes a `switch` when every `when` compares the subject by
    /// value; ranges, regexps and splats need an `if` chain.
    pub(super) fn emit_case(&mut self, node: &Node) -> Result<Shape> {
        let children = node.children();
        let subject = children.first().and_then(Child::as_node);
        let whens: Vec<&Node> = children
            .iter()
            .skip(1)
            .filter_map(Child::as_node)
            .filter(|child| child.is(NodeKind::When))
            .collect();
        let else_body = children
            .last()
            .filter(|_| children.len() > 1)
            .and_then(Child::as_node)
            .filter(|child| !child.is(NodeKind::When));

        if whens.is_empty() {
            return match else_body {
                Some(body) => self.emit_statement(body),
                None => Ok(Shape::Compound),
            };
        }

        let switchable = subject.is_some()
            && whens.iter().all(|when| {
                when_conditions(when).iter().all(|condition| {
                    !matches!(
                        condition.kind(),
                        NodeKind::Irange | NodeKind::Erange | NodeKind::Regexp | NodeKind::Splat
                    )
                }) && !when_body(when).is_some_and(breaks_enclosing_loop)
            });

        match subject {
            Some(subject) if switchable => self.emit_switch(subject, &whens, else_body),
            _ => self.emit_case_chain(node, subject, &whens, else_body),
        }
    }

    fn emit_switch(&mut self, subject: &Node, whens: &[&Node], else_body: Option<&Node>) -> Result<Shape> {
        self.write("switch (");
        self.emit_expr(subject, prec::LOWEST)?;
        self.write(") {");
        self.line_break();
        self.push_block_scope();
        let result = self.emit_switch_clauses(whens, else_body);
        self.pop_block_scope();
        result?;
        self.line_break();
        self.write("}");
        Ok(Shape::Compound)
    }

    fn emit_switch_clauses(&mut self, whens: &[&Node], else_body: Option<&Node>) -> Result<()> {
        let mut previous: Option<Shape> = None;
        for when in whens {
            if let Some(shape) = previous {
                self.statement_separator(shape);
            }
            for (index, condition) in when_conditions(when).iter().enumerate() {
                if index > 0 {
                    self.label_break();
                }
                self.write("case ");
                self.emit_expr(condition, prec::LOWEST)?;
                self.write(":");
            }
            self.label_break();
            let statements = statement_list(when_body(when));
            let last = self.emit_statement_list(&statements)?;
            let terminated = statements.last().is_some_and(|statement| {
                matches!(
                    statement.kind(),
                    NodeKind::Return | NodeKind::Throw | NodeKind::Break | NodeKind::Next
                )
            });
            previous = if terminated {
                last
            } else {
                if let Some(shape) = last {
                    self.statement_separator(shape);
                }
                self.write("break");
                Some(Shape::Simple)
            };
        }
        if let Some(body) = else_body {
            if let Some(shape) = previous {
                self.statement_separator(shape);
            }
            self.write("default:");
            self.label_break();
            let statements = statement_list(Some(body));
            self.emit_statement_list(&statements)?;
        }
        Ok(())
    }

    /// After a `case` label: a newline, or a space on a single line.
    fn label_break(&mut self) {
        if self.vertical {
            self.line_break();
        } else {
            self.write(" ");
        }
    }

    fn emit_case_chain(
        &mut self,
        node: &Node,
        subject: Option<&Node>,
        whens: &[&Node],
        else_body: Option<&Node>,
    ) -> Result<Shape> {
        let subject = match subject {
            Some(subject) if !is_simple(subject) => {
                let temp = self.make_unique_name();
                trace!(temp = %temp, "case subject temporary");
                let keyword = self.decl_keyword();
                self.write(&format!("{keyword} {temp} = "));
                self.emit_expr(subject, prec::ASSIGN)?;
                self.statement_separator(Shape::Simple);
                Some(Node::new(NodeKind::Lvar, vec![Child::sym(temp)]))
            }
            other => other.cloned(),
        };

        for (index, when) in whens.iter().enumerate() {
            if index > 0 {
                self.write(" else ");
            }
            self.write("if (");
            for (position, condition) in when_conditions(when).iter().enumerate() {
                if position > 0 {
                    self.write(" || ");
                }
                let mark = self.writer.mark();
                let produced = self.emit_when_test(node, subject.as_ref(), condition)?;
                if produced <= prec::OR {
                    self.writer.wrap_parens(mark);
                }
            }
            self.write(") ");
            self.emit_braced(when_body(when))?;
        }
        if let Some(body) = else_body {
            self.write(" else ");
            self.emit_braced(Some(body))?;
        }
        Ok(Shape::Compound)
    }

    fn emit_when_test(&mut self, node: &Node, subject: Option<&Node>, condition: &Node) -> Result<u8> {
        let Some(subject) = subject else {
            return self.emit_expr(condition, prec::OR + 1);
        };
        match condition.kind() {
            NodeKind::Irange | NodeKind::Erange => {
                let upper = if condition.is(NodeKind::Irange) { " <= " } else { " < " };
                self.emit_expr(subject, prec::RELATIONAL)?;
                self.write(" >= ");
                self.emit_child_expr(condition.child(0), prec::RELATIONAL + 1)?;
                self.write(" && ");
                self.emit_expr(subject, prec::RELATIONAL)?;
                self.write(upper);
                self.emit_child_expr(condition.child(1), prec::RELATIONAL + 1)?;
                Ok(prec::AND)
            }
            NodeKind::Regexp => {
                self.emit_receiver(condition)?;
                self.write(".test(");
                self.emit_expr(subject, prec::ASSIGN)?;
                self.write(")");
                Ok(prec::CALL)
            }
            NodeKind::Splat => {
                let Some(list) = condition.node_at(0) else {
                    return Err(self.malformed(condition, "splat without a value"));
                };
                self.emit_receiver(list)?;
                if self.es(EsLevel::ES2016) {
                    self.write(".includes(");
                    self.emit_expr(subject, prec::ASSIGN)?;
                    self.write(")");
                    Ok(prec::CALL)
                } else {
                    self.write(".indexOf(");
                    self.emit_expr(subject, prec::ASSIGN)?;
                    self.write(") != -1");
                    Ok(prec::EQUALITY)
                }
            }
            _ => self.emit_equality(node, subject, condition, false),
        }
    }

    // =========================================================================
    // Loops
    // =========================================================================

    pub(super) fn emit_while(&mut self, node: &Node) -> Result<Shape> {
        self.write("while (");
        if node.is(NodeKind::Until) {
            self.emit_negated(node.child(0))?;
        } else {
            self.emit_child_expr(node.child(0), prec::LOWEST)?;
        }
        self.write(") ");
        self.emit_loop_body(node.node_at(1), None)?;
        Ok(Shape::Compound)
    }

    /// `begin ... end while cond` → `do {...} while (cond)`.
    pub(super) fn emit_do_while(&mut self, node: &Node) -> Result<Shape> {
        self.write("do ");
        self.emit_loop_body(node.node_at(1), None)?;
        self.write(" while (");
        if node.is(NodeKind::UntilPost) {
            self.emit_negated(node.child(0))?;
        } else {
            self.emit_child_expr(node.child(0), prec::LOWEST)?;
        }
        self.write(")");
        Ok(Shape::Simple)
    }

    fn emit_loop_body(
        &mut self,
        body: Option<&Node>,
        prologue: Option<&dyn Fn(&mut Self) -> Result<Shape>>,
    ) -> Result<()> {
        self.enter_loop();
        let result = self.emit_braced_with(body, prologue);
        self.leave_loop();
        result
    }

    /// `for x in iterable`: C-style over ranges, `for...of` from ES2015, an
    /// index loop below.
    pub(super) fn emit_for(&mut self, node: &Node) -> Result<Shape> {
        let (Some(target), Some(iterable)) = (node.node_at(0), node.node_at(1)) else {
            return Err(self.malformed(node, "for needs a target and an iterable"));
        };
        let body = node.node_at(2);

        if matches!(iterable.kind(), NodeKind::Irange | NodeKind::Erange) && target.is(NodeKind::Lvasgn) {
            return self.emit_range_loop(target, iterable, body);
        }

        if self.es(EsLevel::ES2015) {
            self.push_block_scope();
            let result = self.emit_for_of(target, iterable, body);
            self.pop_block_scope();
            return result;
        }

        if target.is(NodeKind::Mlhs) {
            return Err(self.unsupported(target, "destructuring loop variable", Some(EsLevel::ES2015)));
        }
        self.emit_index_loop(target, iterable, body)
    }

    fn emit_range_loop(&mut self, target: &Node, range: &Node, body: Option<&Node>) -> Result<Shape> {
        let Some(name) = target.sym_at(0) else {
            return Err(self.malformed(target, "loop variable without a name"));
        };
        let name = name.to_string();
        self.push_block_scope();
        self.write("for (");
        if !self.is_declared(&name) {
            let keyword = self.decl_keyword();
            self.write(&format!("{keyword} "));
            self.declare(&name);
        }
        self.write_identifier(&name, &name);
        self.write(" = ");
        let result = (|| -> Result<()> {
            self.emit_child_expr(range.child(0), prec::ASSIGN)?;
            self.write("; ");
            self.write_identifier(&name, &name);
            self.write(if range.is(NodeKind::Irange) { " <= " } else { " < " });
            self.emit_child_expr(range.child(1), prec::RELATIONAL + 1)?;
            self.write("; ");
            self.write_identifier(&name, &name);
            self.write("++) ");
            self.emit_loop_body(body, None)
        })();
        self.pop_block_scope();
        result?;
        Ok(Shape::Compound)
    }

    fn emit_for_of(&mut self, target: &Node, iterable: &Node, body: Option<&Node>) -> Result<Shape> {
        self.write("for (");
        let mut names = Vec::new();
        collect_targets(target, &mut names);
        if names.iter().all(|name| !self.is_declared(name)) {
            let keyword = self.decl_keyword();
            self.write(&format!("{keyword} "));
            for name in &names {
                self.declare(name);
            }
        }
        self.emit_loop_target(target)?;
        self.write(" of ");
        self.emit_expr(iterable, prec::ASSIGN)?;
        self.write(") ");
        self.emit_loop_body(body, None)?;
        Ok(Shape::Compound)
    }

    fn emit_loop_target(&mut self, target: &Node) -> Result<()> {
        match target.kind() {
            NodeKind::Mlhs => {
                self.write("[");
                for (index, inner) in target.child_nodes().enumerate() {
                    if index > 0 {
                        self.write(", ");
                    }
                    self.emit_loop_target(inner)?;
                }
                self.write("]");
                Ok(())
            }
            _ => self.emit_assignment_target(target),
        }
    }

    /// ES5: `for (var _a = 0; _a < list.length; _a++) {var x = list[_a]; ...}`.
    fn emit_index_loop(&mut self, target: &Node, iterable: &Node, body: Option<&Node>) -> Result<Shape> {
        let list = if is_simple(iterable) {
            iterable.clone()
        } else {
            let temp = self.make_unique_name();
            self.write(&format!("var {temp} = "));
            self.emit_expr(iterable, prec::ASSIGN)?;
            self.statement_separator(Shape::Simple);
            Node::new(NodeKind::Lvar, vec![Child::sym(temp)])
        };
        let index = self.make_unique_name();
        trace!(index = %index, "index loop");
        self.write(&format!("for (var {index} = 0; {index} < "));
        self.emit_receiver(&list)?;
        self.write(&format!(".length; {index}++) "));

        let element = Node::new(
            NodeKind::Send,
            vec![
                Child::Node(list.clone()),
                Child::sym("[]"),
                Child::Node(Node::new(NodeKind::Lvar, vec![Child::sym(index)])),
            ],
        );
        let prologue = |printer: &mut Self| -> Result<Shape> {
            if target.is(NodeKind::Lvasgn)
                && let Some(name) = target.sym_at(0)
                && !printer.is_declared(name)
            {
                printer.write("var ");
                printer.declare(name);
            }
            printer.emit_assignment_target(target)?;
            printer.write(" = ");
            printer.emit_expr(&element, prec::ASSIGN)?;
            Ok(Shape::Simple)
        };
        self.emit_loop_body(body, Some(&prologue))?;
        Ok(Shape::Compound)
    }

    // =========================================================================
    // Jumps
    // =========================================================================

    pub(super) fn emit_return(&mut self, node: &Node) -> Result<Shape> {
        let values = nodes_from(node, 0);
        match values.as_slice() {
            [] => self.write("return"),
            [value] => {
                self.write("return ");
                self.emit_expr(value, prec::LOWEST)?;
            }
            _ => {
                self.write("return ");
                self.emit_elements(&values)?;
            }
        }
        Ok(Shape::Simple)
    }

    pub(super) fn emit_break(&mut self, node: &Node) -> Result<Shape> {
        if self.loop_depth() == 0 {
            return Err(self.unsupported(node, "`break` outside of a loop", None));
        }
        if node.child_nodes().next().is_some() {
            return Err(self.unsupported(node, "`break` with a value", None));
        }
        self.write("break");
        Ok(Shape::Simple)
    }

    /// `next` continues a loop; inside a block it returns from the function.
    pub(super) fn emit_next(&mut self, node: &Node) -> Result<Shape> {
        if self.loop_depth() > 0 {
            self.write("continue");
            return Ok(Shape::Simple);
        }
        let value = node.updated(Some(NodeKind::Return), node.children().to_vec());
        self.emit_return(&value)
    }

    // =========================================================================
    // Exceptions
    // =========================================================================

    pub(super) fn emit_try(&mut self, node: &Node) -> Result<Shape> {
        self.write("try ");
        if node.is(NodeKind::Ensure) {
            match node.node_at(0) {
                Some(body) if body.is(NodeKind::Rescue) => self.emit_rescue(body)?,
                body => self.emit_braced(body)?,
            }
            self.write(" finally ");
            self.emit_braced(node.node_at(1))?;
        } else {
            self.emit_rescue(node)?;
        }
        Ok(Shape::Compound)
    }

    /// `{body} catch (...) {...}` for a `rescue` node.
    fn emit_rescue(&mut self, node: &Node) -> Result<()> {
        let children = node.children();
        let resbodies: Vec<&Node> = children
            .iter()
            .filter_map(Child::as_node)
            .filter(|child| child.is(NodeKind::Resbody))
            .collect();
        if children.len() > 1
            && let Some(Child::Node(else_body)) = children.last()
            && !else_body.is(NodeKind::Resbody)
            && !else_body.is(NodeKind::Nil)
        {
            return Err(self.unsupported(else_body, "`else` clause of `rescue`", None));
        }

        self.emit_braced(node.node_at(0))?;
        self.write(" catch ");

        if let [resbody] = resbodies.as_slice()
            && is_catch_all(resbody)
        {
            return self.emit_catch_all(resbody);
        }

        self.write(&format!("({EXCEPTION}) {{"));
        self.line_break();
        self.push_block_scope();
        let result = self.emit_rescue_chain(&resbodies);
        self.pop_block_scope();
        result?;
        self.line_break();
        self.write("}");
        Ok(())
    }

    fn emit_catch_all(&mut self, resbody: &Node) -> Result<()> {
        let variable = resbody.node_at(1).and_then(|var| var.sym_at(0)).map(str::to_string);
        let body = resbody.node_at(2);
        let uses_exception = body.is_some_and(references_exception);

        let binding = match (&variable, uses_exception) {
            (Some(name), false) => Some(name.clone()),
            (None, false) if self.es(EsLevel::ES2019) => None,
            _ => Some(EXCEPTION.to_string()),
        };

        self.push_block_scope();
        if let Some(binding) = &binding {
            self.write("(");
            self.write_identifier(binding, binding);
            self.write(") ");
            if let Some(scope) = self.scopes.last_mut() {
                scope.declared.insert(binding.clone());
            }
        }
        let result = match variable.filter(|name| binding.as_deref() != Some(name.as_str())) {
            Some(name) => {
                let prologue = Self::exception_alias(name);
                self.emit_braced_with(body, Some(&prologue))
            }
            None => self.emit_braced(body),
        };
        self.pop_block_scope();
        result
    }

    /// `let e = $EXCEPTION` ahead of a clause body.
    fn exception_alias(name: String) -> impl Fn(&mut Self) -> Result<Shape> {
        move |printer: &mut Self| {
            let keyword = printer.decl_keyword();
            printer.write(&format!("{keyword} "));
            printer.declare(&name);
            printer.write_identifier(&name, &name);
            printer.write(&format!(" = {EXCEPTION}"));
            Ok(Shape::Simple)
        }
    }

    fn emit_rescue_chain(&mut self, resbodies: &[&Node]) -> Result<()> {
        if let Some(scope) = self.scopes.last_mut() {
            scope.declared.insert(EXCEPTION.to_string());
        }
        let mut caught_all = false;
        for (index, resbody) in resbodies.iter().enumerate() {
            let variable = resbody.node_at(1).and_then(|var| var.sym_at(0)).map(str::to_string);
            let body = resbody.node_at(2);
            let prologue = variable.map(Self::exception_alias);
            let prologue = prologue.as_ref().map(|f| f as &dyn Fn(&mut Self) -> Result<Shape>);

            if index > 0 {
                self.write(" else ");
            }
            if is_catch_all(resbody) {
                if index == 0 {
                    self.write("if (true) ");
                }
                self.emit_braced_with(body, prologue)?;
                caught_all = true;
                break;
            }
            self.write("if (");
            let classes = resbody
                .node_at(0)
                .map(|list| nodes_from(list, 0))
                .unwrap_or_default();
            for (position, class) in classes.iter().enumerate() {
                if position > 0 {
                    self.write(" || ");
                }
                self.write(&format!("{EXCEPTION} instanceof "));
                self.emit_expr(class, prec::RELATIONAL + 1)?;
            }
            self.write(") ");
            self.emit_braced_with(body, prologue)?;
        }
        if !caught_all {
            self.write(" else {");
            self.line_break();
            self.write(&format!("throw {EXCEPTION}"));
            self.line_break();
            self.write("}");
        }
        Ok(())
    }

    // =========================================================================
    // Modules
    // =========================================================================

    /// `import "mod"`, `import X from "mod"`, `import { A, B } from "mod"`.
    pub(super) fn emit_import(&mut self, node: &Node) -> Result<Shape> {
        self.require(node, "ES module `import`", EsLevel::ES2015)?;
        let Some(source) = node.node_at(0) else {
            return Err(self.malformed(node, "import without a source"));
        };
        self.write("import ");
        match node.node_at(1) {
            None => {}
            Some(binding) if binding.is(NodeKind::Array) => {
                self.write("{ ");
                for (index, name) in binding.child_nodes().enumerate() {
                    if index > 0 {
                        self.write(", ");
                    }
                    self.emit_expr(name, prec::PRIMARY)?;
                }
                self.write(" } from ");
            }
            Some(binding) => {
                self.emit_expr(binding, prec::PRIMARY)?;
                self.write(" from ");
            }
        }
        self.emit_expr(source, prec::PRIMARY)?;
        Ok(Shape::Simple)
    }

    pub(super) fn emit_export(&mut self, node: &Node) -> Result<Shape> {
        self.require(node, "ES module `export`", EsLevel::ES2015)?;
        let default = matches!(node.child(0), Some(Child::Lit(Literal::Bool(true))));
        let Some(target) = node.node_at(1) else {
            return Err(self.malformed(node, "export without a target"));
        };
        self.write("export ");
        if !default {
            return self.emit_statement(target);
        }
        self.write("default ");
        if matches!(target.kind(), NodeKind::Def | NodeKind::Class) {
            return self.emit_statement(target);
        }
        self.emit_expr(target, prec::ASSIGN)?;
        Ok(Shape::Simple)
    }
}

/// The test expressions of a `when`: all children but the body.
fn when_conditions(when: &Node) -> Vec<Node> {
    let mut conditions = nodes_from(when, 0);
    conditions.pop();
    conditions
}

fn when_body(when: &Node) -> Option<&Node> {
    when.children().last().and_then(Child::as_node)
}

/// Side-effect free and cheap to repeat.
pub(super) fn is_simple(node: &Node) -> bool {
    matches!(
        node.kind(),
        NodeKind::Lvar
            | NodeKind::Ivar
            | NodeKind::Gvar
            | NodeKind::Const
            | NodeKind::SelfRef
            | NodeKind::Int
            | NodeKind::Float
            | NodeKind::Str
            | NodeKind::Sym
            | NodeKind::Nil
            | NodeKind::True
            | NodeKind::False
    )
}

/// A `break` that would exit the loop around a `case` rather than the case.
fn breaks_enclosing_loop(node: &Node) -> bool {
    match node.kind() {
        NodeKind::Break => true,
        NodeKind::While
        | NodeKind::Until
        | NodeKind::WhilePost
        | NodeKind::UntilPost
        | NodeKind::For
        | NodeKind::Block
        | NodeKind::Def
        | NodeKind::Defs
        | NodeKind::Class
        | NodeKind::Module => false,
        _ => node.child_nodes().any(breaks_enclosing_loop),
    }
}

fn collect_targets(target: &Node, out: &mut Vec<String>) {
    match target.kind() {
        NodeKind::Mlhs => target.child_nodes().for_each(|inner| collect_targets(inner, out)),
        NodeKind::Lvasgn => out.extend(target.sym_at(0).map(str::to_string)),
        _ => {}
    }
}

/// A `rescue` clause without classes, or naming the Ruby root classes.
fn is_catch_all(resbody: &Node) -> bool {
    let Some(list) = resbody.node_at(0) else {
        return true;
    };
    let classes: Vec<&Node> = list.child_nodes().collect();
    classes.is_empty()
        || classes.iter().any(|class| {
            class.is(NodeKind::Const)
                && matches!(class.sym_at(1), Some("StandardError" | "Exception"))
        })
}

fn references_exception(node: &Node) -> bool {
    let mut found = false;
    node.walk(&mut |inner| {
        if inner.is(NodeKind::Lvar) && inner.sym_at(0) == Some(EXCEPTION) {
            found = true;
        }
    });
    found
}
