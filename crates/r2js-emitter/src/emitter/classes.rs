//! Classes and modules.
//!
//! From ES2015 a Ruby class becomes a `class` declaration: `initialize` is
//! the constructor, methods without parameters become getters, `name=`
//! methods become setters and `def self.x` becomes `static`. Below ES2015
//! the same members are spread over a constructor function, prototype
//! assignments and `Object.defineProperty` calls. Modules become object
//! literals.
//!
//! Statements in the class body that are not definitions (constants,
//! `include`, `alias_method`, ...) are emitted after the class, qualified
//! with its name.

use super::functions::uses_yield;
use super::literals::quote;
use super::operators::prec;
use super::scope::FrameKind;
use super::{Printer, Shape, js_method_name, nodes_from, statement_list};
use crate::error::Result;
use r2js_ast::{Child, Node, NodeKind};
use r2js_common::EsLevel;
use rustc_hash::FxHashSet;
use tracing::{debug, trace};

/// What the printer knows about the class or module being emitted.
pub(super) struct ClassContext {
    /// JavaScript expression naming the class: `Foo`, `Outer.Inner`.
    pub name: String,
    pub parent: Option<Node>,
    /// Instance methods called with parentheses.
    pub methods: FxHashSet<String>,
    /// Instance properties read without parentheses.
    pub getters: FxHashSet<String>,
    pub module: bool,
    pub method: Option<MethodContext>,
}

pub(super) struct MethodContext {
    pub name: String,
    pub kind: MemberKind,
    pub is_static: bool,
    /// Arguments a bare `super` forwards.
    pub forwarded: Vec<Node>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum MemberKind {
    Constructor,
    Method,
    Getter,
    Setter,
}

struct Member {
    kind: MemberKind,
    is_static: bool,
    /// JavaScript property name.
    name: String,
    args: Option<Node>,
    body: Option<Node>,
}

/// A class body split into members, static fields and trailing statements.
#[derive(Default)]
struct ClassBody {
    members: Vec<Member>,
    fields: Vec<(String, Child)>,
    post: Vec<Node>,
}

impl<'a> Printer<'a> {
    // =========================================================================
    // Classes
    // =========================================================================

    pub(super) fn emit_class(&mut self, node: &Node) -> Result<Shape> {
        let Some(name_node) = node.node_at(0) else {
            return Err(self.malformed(node, "class without a name"));
        };
        let Some(name) = name_node.sym_at(1).map(str::to_string) else {
            return Err(self.malformed(node, "class name is not a constant"));
        };
        let reference = constant_path(name_node);
        let parent = node.node_at(1).cloned();
        let scoped = reference != name;

        let body = self.split_class_body(node, &reference, node.node_at(2))?;
        debug!(class = %reference, members = body.members.len(), post = body.post.len(), "class");

        self.classes.push(ClassContext {
            name: reference.clone(),
            parent: parent.clone(),
            methods: member_names(&body.members, MemberKind::Method),
            getters: member_names(&body.members, MemberKind::Getter),
            module: false,
            method: None,
        });
        let result = if self.es(EsLevel::ES2015) {
            self.emit_class_declaration(&name, &reference, scoped, parent.as_ref(), &body)
        } else {
            self.emit_class_functions(&name, &reference, scoped, parent.as_ref(), &body)
        };
        self.classes.pop();
        let mut shape = result?;

        for statement in &body.post {
            self.statement_separator(shape);
            shape = self.emit_statement(statement)?;
        }
        Ok(shape)
    }

    /// Sort the statements of a class body into members and the statements
    /// that run after the class exists.
    fn split_class_body(&mut self, node: &Node, reference: &str, body: Option<&Node>) -> Result<ClassBody> {
        let mut split = ClassBody::default();
        let class_ref = constant_ref(reference);
        for statement in statement_list(body) {
            match statement.kind() {
                NodeKind::Def => {
                    let Some(name) = statement.sym_at(0) else {
                        return Err(self.malformed(&statement, "def without a name"));
                    };
                    split.members.push(instance_member(
                        name,
                        statement.node_at(1).cloned(),
                        statement.node_at(2).cloned(),
                    ));
                }
                NodeKind::Defs => {
                    let Some(name) = statement.sym_at(1) else {
                        return Err(self.malformed(&statement, "defs without a name"));
                    };
                    if !statement.node_at(0).is_some_and(|receiver| receiver.is(NodeKind::SelfRef)) {
                        split.post.push(statement.clone());
                        continue;
                    }
                    let mut member = instance_member(
                        name,
                        statement.node_at(2).cloned(),
                        statement.node_at(3).cloned(),
                    );
                    if member.kind == MemberKind::Constructor {
                        member.kind = MemberKind::Method;
                    }
                    member.is_static = true;
                    split.members.push(member);
                }
                NodeKind::Casgn if statement.child(0).is_none_or(Child::is_nil) => {
                    let Some(name) = statement.sym_at(1) else {
                        return Err(self.malformed(&statement, "constant assignment without a name"));
                    };
                    if self.es(EsLevel::ES2022) {
                        let value = statement.child(2).cloned().unwrap_or(Child::NIL);
                        split.fields.push((name.to_string(), value));
                    } else {
                        let mut children = statement.children().to_vec();
                        children[0] = Child::Node(class_ref.clone());
                        split.post.push(statement.updated(None, children));
                    }
                }
                NodeKind::Alias => {
                    let (Some(new), Some(old)) = (
                        statement.node_at(0).and_then(|sym| sym.sym_at(0)),
                        statement.node_at(1).and_then(|sym| sym.sym_at(0)),
                    ) else {
                        return Err(self.malformed(&statement, "alias needs two names"));
                    };
                    split.post.push(alias(&class_ref, new, old));
                }
                NodeKind::Block if is_macro(statement.node_at(0), "define_method") => {
                    let Some(name) = statement
                        .node_at(0)
                        .and_then(|call| call.node_at(2))
                        .and_then(|sym| sym.sym_at(0))
                    else {
                        return Err(self.unsupported(&statement, "`define_method` with a computed name", None));
                    };
                    split.members.push(Member {
                        kind: MemberKind::Method,
                        is_static: false,
                        name: js_method_name(name).to_string(),
                        args: statement.node_at(1).cloned(),
                        body: statement.node_at(2).cloned(),
                    });
                }
                NodeKind::Send if statement.child(0).is_some_and(Child::is_nil) => {
                    let method = statement.sym_at(1).unwrap_or_default();
                    let args = nodes_from(&statement, 2);
                    match method {
                        "attr_accessor" | "attr_reader" | "attr_writer" => {
                            for attribute in args.iter().filter_map(|arg| arg.sym_at(0)) {
                                trace!(attribute, method, "synthesizing accessor");
                                if method != "attr_writer" {
                                    split.members.push(attribute_getter(attribute));
                                }
                                if method != "attr_reader" {
                                    split.members.push(attribute_setter(attribute));
                                }
                            }
                        }
                        "alias_method" => {
                            let names: Vec<&str> = args.iter().filter_map(|arg| arg.sym_at(0)).collect();
                            let [new, old] = names.as_slice() else {
                                return Err(self.malformed(&statement, "alias_method needs two names"));
                            };
                            split.post.push(alias(&class_ref, new, old));
                        }
                        "include" | "extend" => {
                            self.require(&statement, "`include` (`Object.assign`)", EsLevel::ES2015)?;
                            let target = if method == "include" {
                                Node::new(
                                    NodeKind::Attr,
                                    vec![Child::Node(class_ref.clone()), Child::sym("prototype")],
                                )
                            } else {
                                class_ref.clone()
                            };
                            for module in args {
                                split.post.push(Node::with_location(
                                    NodeKind::Call,
                                    vec![
                                        Child::Node(constant_ref("Object")),
                                        Child::sym("assign"),
                                        Child::Node(target.clone()),
                                        Child::Node(module),
                                    ],
                                    statement.location().cloned(),
                                ));
                            }
                        }
                        "private" | "protected" | "public" | "module_function" => {}
                        _ => split.post.push(statement.clone()),
                    }
                }
                NodeKind::Class | NodeKind::Module => {
                    return Err(self.unsupported(&statement, format!("`{}` nested in a class body", statement.kind()), None));
                }
                _ => split.post.push(statement.clone()),
            }
        }
        if split.members.is_empty() && split.fields.is_empty() {
            trace!(kind = %node.kind(), "empty class body");
        }
        Ok(split)
    }

    /// `class Name extends Parent {...}`.
    fn emit_class_declaration(
        &mut self,
        name: &str,
        reference: &str,
        scoped: bool,
        parent: Option<&Node>,
        body: &ClassBody,
    ) -> Result<Shape> {
        if scoped {
            self.write(reference);
            self.write(" = ");
        }
        self.write("class ");
        self.write_identifier(name, name);
        if let Some(parent) = parent {
            self.write(" extends ");
            self.emit_expr(parent, prec::CALL)?;
        }
        if body.members.is_empty() && body.fields.is_empty() {
            self.write(" {}");
            return Ok(if scoped { Shape::Simple } else { Shape::Compound });
        }
        self.write(" {");
        self.line_break();

        let mut previous: Option<Shape> = None;
        for (field, value) in &body.fields {
            if let Some(shape) = previous {
                self.statement_separator(shape);
            }
            self.write("static ");
            self.write_identifier(field, field);
            self.write(" = ");
            self.emit_child_expr(Some(value), prec::ASSIGN)?;
            previous = Some(Shape::Simple);
        }
        for member in &body.members {
            if let Some(shape) = previous {
                self.statement_separator(shape);
            }
            if member.is_static {
                self.write("static ");
            }
            match member.kind {
                MemberKind::Constructor => self.write("constructor"),
                MemberKind::Getter => self.write(&format!("get {}", member.name)),
                MemberKind::Setter => self.write(&format!("set {}", member.name)),
                MemberKind::Method => self.write(&member.name),
            }
            self.emit_member_function(member)?;
            previous = Some(Shape::Compound);
        }
        self.line_break();
        self.write("}");
        Ok(if scoped { Shape::Simple } else { Shape::Compound })
    }

    /// ES5: constructor function, prototype chain, prototype members.
    fn emit_class_functions(
        &mut self,
        name: &str,
        reference: &str,
        scoped: bool,
        parent: Option<&Node>,
        body: &ClassBody,
    ) -> Result<Shape> {
        if scoped {
            self.write(reference);
            self.write(" = ");
        }
        self.write("function ");
        self.write_identifier(name, name);
        match body.members.iter().find(|member| member.kind == MemberKind::Constructor) {
            Some(constructor) => self.emit_member_function(constructor)?,
            None => match parent {
                Some(parent) => {
                    self.write("() {");
                    self.emit_expr(parent, prec::CALL)?;
                    self.write(".apply(this, arguments)}");
                }
                None => self.write("() {}"),
            },
        }
        let mut shape = if scoped { Shape::Simple } else { Shape::Compound };

        if let Some(parent) = parent {
            self.statement_separator(shape);
            self.write(&format!("{reference}.prototype = Object.create("));
            self.emit_expr(parent, prec::CALL)?;
            self.write(".prototype)");
            self.statement_separator(Shape::Simple);
            self.write(&format!("{reference}.prototype.constructor = {reference}"));
            shape = Shape::Simple;
        }

        for (field, value) in &body.fields {
            self.statement_separator(shape);
            self.write(&format!("{reference}.{field} = "));
            self.emit_child_expr(Some(value), prec::ASSIGN)?;
            shape = Shape::Simple;
        }

        let mut defined: FxHashSet<(bool, &str)> = FxHashSet::default();
        for member in &body.members {
            let target = if member.is_static {
                reference.to_string()
            } else {
                format!("{reference}.prototype")
            };
            match member.kind {
                MemberKind::Constructor => continue,
                MemberKind::Method => {
                    self.statement_separator(shape);
                    self.write(&format!("{target}.{} = function", member.name));
                    self.emit_member_function(member)?;
                }
                MemberKind::Getter | MemberKind::Setter => {
                    if !defined.insert((member.is_static, member.name.as_str())) {
                        continue;
                    }
                    self.statement_separator(shape);
                    self.emit_define_property(&target, member, &body.members)?;
                }
            }
            shape = Shape::Simple;
        }
        Ok(shape)
    }

    /// `Object.defineProperty(target, "name", {enumerable: true, configurable: true, get: ..., set: ...})`.
    fn emit_define_property(&mut self, target: &str, member: &Member, members: &[Member]) -> Result<()> {
        self.write(&format!(
            "Object.defineProperty({target}, {}, {{enumerable: true, configurable: true",
            quote(&member.name)
        ));
        for kind in [MemberKind::Getter, MemberKind::Setter] {
            let Some(accessor) = members.iter().find(|candidate| {
                candidate.kind == kind
                    && candidate.is_static == member.is_static
                    && candidate.name == member.name
            }) else {
                continue;
            };
            self.write(if kind == MemberKind::Getter { ", get: function" } else { ", set: function" });
            self.emit_member_function(accessor)?;
        }
        self.write("})");
        Ok(())
    }

    /// `(params) {body}` for a member, with the method recorded for `super`.
    fn emit_member_function(&mut self, member: &Member) -> Result<()> {
        let forwarded = member
            .args
            .as_ref()
            .map(forwarded_arguments)
            .unwrap_or_default();
        if let Some(class) = self.classes.last_mut() {
            class.method = Some(MethodContext {
                name: member.name.clone(),
                kind: member.kind,
                is_static: member.is_static,
                forwarded,
            });
        }
        let result = self.emit_callable(member.args.as_ref(), member.body.as_ref(), FrameKind::Method, false);
        if let Some(class) = self.classes.last_mut() {
            class.method = None;
        }
        result
    }

    // =========================================================================
    // Modules
    // =========================================================================

    /// `module M` → `const M = {...}`.
    pub(super) fn emit_module(&mut self, node: &Node) -> Result<Shape> {
        let Some(name_node) = node.node_at(0) else {
            return Err(self.malformed(node, "module without a name"));
        };
        let Some(name) = name_node.sym_at(1).map(str::to_string) else {
            return Err(self.malformed(node, "module name is not a constant"));
        };
        let reference = constant_path(name_node);

        let mut members = Vec::new();
        let mut properties: Vec<(String, Child)> = Vec::new();
        let mut post = Vec::new();
        for statement in statement_list(node.node_at(1)) {
            match statement.kind() {
                NodeKind::Def => {
                    let name = statement.sym_at(0).unwrap_or_default();
                    let mut member = instance_member(name, statement.node_at(1).cloned(), statement.node_at(2).cloned());
                    if member.kind == MemberKind::Constructor {
                        member.kind = MemberKind::Method;
                    }
                    members.push(member);
                }
                NodeKind::Defs => {
                    let name = statement.sym_at(1).unwrap_or_default();
                    let mut member = instance_member(name, statement.node_at(2).cloned(), statement.node_at(3).cloned());
                    if member.kind == MemberKind::Constructor {
                        member.kind = MemberKind::Method;
                    }
                    members.push(member);
                }
                NodeKind::Casgn if statement.child(0).is_none_or(Child::is_nil) => {
                    let constant = statement.sym_at(1).unwrap_or_default().to_string();
                    properties.push((constant, statement.child(2).cloned().unwrap_or(Child::NIL)));
                }
                NodeKind::Send
                    if statement.child(0).is_some_and(Child::is_nil)
                        && matches!(statement.sym_at(1), Some("module_function" | "private" | "public" | "extend")) => {}
                NodeKind::Class | NodeKind::Module => {
                    return Err(self.unsupported(&statement, format!("`{}` nested in a module", statement.kind()), None));
                }
                _ => post.push(statement.clone()),
            }
        }

        self.classes.push(ClassContext {
            name: reference.clone(),
            parent: None,
            methods: member_names(&members, MemberKind::Method),
            getters: member_names(&members, MemberKind::Getter),
            module: true,
            method: None,
        });
        let result = self.emit_module_object(&name, &reference, &members, &properties);
        self.classes.pop();
        result?;

        let mut shape = Shape::Simple;
        for statement in &post {
            self.statement_separator(shape);
            shape = self.emit_statement(statement)?;
        }
        Ok(shape)
    }

    fn emit_module_object(
        &mut self,
        name: &str,
        reference: &str,
        members: &[Member],
        properties: &[(String, Child)],
    ) -> Result<()> {
        if reference == name {
            if !self.is_declared(name) {
                let keyword = self.const_keyword();
                self.write(&format!("{keyword} "));
                self.declare(name);
            }
            self.write_identifier(name, name);
        } else {
            self.write(reference);
        }
        self.write(" = ");
        if members.is_empty() && properties.is_empty() {
            self.write("{}");
            return Ok(());
        }
        self.write("{");
        self.line_break();
        let shorthand = self.es(EsLevel::ES2015);
        let mut first = true;
        for (property, value) in properties {
            self.separate_entry(&mut first);
            self.write_identifier(property, property);
            self.write(": ");
            self.emit_child_expr(Some(value), prec::ASSIGN)?;
        }
        for member in members {
            self.separate_entry(&mut first);
            match member.kind {
                MemberKind::Getter => self.write(&format!("get {}", member.name)),
                MemberKind::Setter => self.write(&format!("set {}", member.name)),
                _ if shorthand => self.write(&member.name),
                _ => self.write(&format!("{}: function", member.name)),
            }
            self.emit_member_function(member)?;
        }
        self.line_break();
        self.write("}");
        Ok(())
    }

    fn separate_entry(&mut self, first: &mut bool) {
        if *first {
            *first = false;
            return;
        }
        self.write(",");
        if self.vertical {
            self.line_break();
        } else {
            self.write(" ");
        }
    }

    // =========================================================================
    // Super
    // =========================================================================

    /// `super(args)` in constructors, `super.name(args)` in methods; below
    /// ES2015 the parent is called explicitly with `this`.
    pub(super) fn emit_super(&mut self, node: &Node, block: Option<&Node>) -> Result<u8> {
        let Some(class) = self.classes.last() else {
            return Err(self.unsupported(node, "`super` outside of a class", None));
        };
        let Some(method) = &class.method else {
            return Err(self.unsupported(node, "`super` outside of a method", None));
        };
        if class.module {
            return Err(self.unsupported(node, "`super` in a module", None));
        }
        let (kind, name, is_static) = (method.kind, method.name.clone(), method.is_static);
        let parent = class.parent.clone();
        let args = if node.is(NodeKind::Zsuper) {
            method.forwarded.clone()
        } else {
            nodes_from(node, 0)
        };

        if self.es(EsLevel::ES2015) {
            match kind {
                MemberKind::Constructor => self.write("super"),
                MemberKind::Getter => {
                    self.write(&format!("super.{name}"));
                    return Ok(prec::CALL);
                }
                MemberKind::Setter | MemberKind::Method => self.write(&format!("super.{name}")),
            }
            self.emit_arguments(&args, block)?;
            return Ok(prec::CALL);
        }

        let Some(parent) = parent else {
            return Err(self.unsupported(node, "`super` in a class without a parent", None));
        };
        self.emit_expr(&parent, prec::CALL)?;
        match (kind, is_static) {
            (MemberKind::Constructor, _) => {}
            (_, true) => self.write(&format!(".{name}")),
            (_, false) => self.write(&format!(".prototype.{name}")),
        }
        let mut call_args = vec![Node::new(NodeKind::SelfRef, Vec::new())];
        call_args.extend(args);
        trace!(method = %name, "explicit parent call");
        self.write(".call");
        self.emit_arguments(&call_args, block)?;
        Ok(prec::CALL)
    }
}

/// A `def` inside a class body, classified by its name and parameters.
fn instance_member(name: &str, args: Option<Node>, body: Option<Node>) -> Member {
    let param_count = args.as_ref().map_or(0, |args| args.child_nodes().count());
    let kind = if name == "initialize" {
        MemberKind::Constructor
    } else if name.ends_with('=') && name.len() > 1 && !matches!(name, "==" | "!=" | "<=" | ">=" | "===") {
        MemberKind::Setter
    } else if param_count == 0 && !name.ends_with('!') && !body.as_ref().is_some_and(uses_yield) {
        MemberKind::Getter
    } else {
        MemberKind::Method
    };
    let name = match kind {
        MemberKind::Setter => js_method_name(name.trim_end_matches('=')).to_string(),
        _ => js_method_name(name).to_string(),
    };
    Member {
        kind,
        is_static: false,
        name,
        args,
        body,
    }
}

/// `attr_reader :name` → `get name() {return this._name}`.
fn attribute_getter(attribute: &str) -> Member {
    let ivar = Node::new(NodeKind::Ivar, vec![Child::sym(format!("@{attribute}"))]);
    Member {
        kind: MemberKind::Getter,
        is_static: false,
        name: attribute.to_string(),
        args: None,
        body: Some(Node::new(NodeKind::Return, vec![Child::Node(ivar)])),
    }
}

/// `attr_writer :name` → `set name(name) {this._name = name}`.
fn attribute_setter(attribute: &str) -> Member {
    let param = Node::new(NodeKind::Arg, vec![Child::sym(attribute)]);
    let value = Node::new(NodeKind::Lvar, vec![Child::sym(attribute)]);
    let assignment = Node::new(
        NodeKind::Ivasgn,
        vec![Child::sym(format!("@{attribute}")), Child::Node(value)],
    );
    Member {
        kind: MemberKind::Setter,
        is_static: false,
        name: attribute.to_string(),
        args: Some(Node::new(NodeKind::Args, vec![Child::Node(param)])),
        body: Some(assignment),
    }
}

fn member_names(members: &[Member], kind: MemberKind) -> FxHashSet<String> {
    members
        .iter()
        .filter(|member| member.kind == kind && !member.is_static)
        .map(|member| member.name.clone())
        .collect()
}

/// `Outer::Inner` → `Outer.Inner`.
fn constant_path(node: &Node) -> String {
    let name = node.sym_at(1).unwrap_or_default();
    match node.node_at(0) {
        Some(scope) if scope.is(NodeKind::Const) => format!("{}.{name}", constant_path(scope)),
        _ => name.to_string(),
    }
}

/// A node that prints `reference` verbatim.
fn constant_ref(reference: &str) -> Node {
    Node::new(NodeKind::Const, vec![Child::NIL, Child::sym(reference)])
}

/// `Class.prototype.new = Class.prototype.old`.
fn alias(class_ref: &Node, new: &str, old: &str) -> Node {
    let prototype = Node::new(
        NodeKind::Attr,
        vec![Child::Node(class_ref.clone()), Child::sym("prototype")],
    );
    let source = Node::new(
        NodeKind::Attr,
        vec![Child::Node(prototype.clone()), Child::sym(js_method_name(old))],
    );
    Node::new(
        NodeKind::Send,
        vec![
            Child::Node(prototype),
            Child::sym(format!("{}=", js_method_name(new))),
            Child::Node(source),
        ],
    )
}

fn is_macro(call: Option<&Node>, name: &str) -> bool {
    call.is_some_and(|call| {
        call.is(NodeKind::Send) && call.child(0).is_some_and(Child::is_nil) && call.sym_at(1) == Some(name)
    })
}

/// The arguments a bare `super` passes on: each positional parameter, the
/// rest parameter spread.
fn forwarded_arguments(args: &Node) -> Vec<Node> {
    args.child_nodes()
        .filter_map(|param| {
            let name = param.sym_at(0)?;
            let lvar = Node::new(NodeKind::Lvar, vec![Child::sym(name)]);
            match param.kind() {
                NodeKind::Arg | NodeKind::Optarg => Some(lvar),
                NodeKind::Restarg => Some(Node::new(NodeKind::Splat, vec![Child::Node(lvar)])),
                _ => None,
            }
        })
        .collect()
}
