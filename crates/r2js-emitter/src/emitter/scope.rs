use super::Printer;
use crate::output::Slot;
use r2js_ast::{Child, Node, NodeKind};
use r2js_common::EsLevel;
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::trace;

/// Name of the alias that carries `this` into ES5 function expressions.
pub(super) const THIS_ALIAS: &str = "_this";

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(super) enum FrameKind {
    Program,
    /// Methods: Ruby scope gates with their own `this`.
    Method,
    /// Blocks, lambdas and wrapper functions; they close over outer locals.
    Closure,
}

/// One emitted JavaScript function (or the program).
pub(super) struct Frame {
    pub kind: FrameKind,
    /// Emitted as an arrow function, so `this` is lexical.
    pub arrow: bool,
    /// Index of this frame's function scope in `Printer::scopes`.
    pub scope: usize,
    /// Placeholders for the `_this` alias and hoisted declarations.
    pub slots: Option<(Slot, Slot)>,
    pub hoisted: Vec<String>,
    pub this_alias: bool,
    pub loop_depth: u32,
    /// Callable that `yield` invokes.
    pub block_param: Option<String>,
}

pub(super) struct Scope {
    pub declared: FxHashSet<String>,
    /// Lookup stops at method and program scopes.
    pub gate: bool,
}

impl<'a> Printer<'a> {
    // =========================================================================
    // Frames and scopes
    // =========================================================================

    pub(super) fn push_frame(&mut self, kind: FrameKind, arrow: bool) {
        self.scopes.push(Scope {
            declared: FxHashSet::default(),
            gate: kind != FrameKind::Closure,
        });
        self.frames.push(Frame {
            kind,
            arrow,
            scope: self.scopes.len() - 1,
            slots: None,
            hoisted: Vec::new(),
            this_alias: false,
            loop_depth: 0,
            block_param: None,
        });
    }

    /// Pop the innermost frame and fill its placeholders.
    pub(super) fn finish_frame(&mut self) {
        let Some(frame) = self.frames.pop() else {
            return;
        };
        self.scopes.truncate(frame.scope);
        let Some((this_slot, decl_slot)) = frame.slots else {
            return;
        };
        let gap = if self.vertical { "" } else { " " };
        if frame.this_alias {
            self.writer
                .fill(this_slot, &format!("var {THIS_ALIAS} = this;{gap}"));
        }
        if !frame.hoisted.is_empty() {
            trace!(names = ?frame.hoisted, "hoisted declarations");
            let keyword = self.decl_keyword();
            self.writer.fill(
                decl_slot,
                &format!("{keyword} {};{gap}", frame.hoisted.join(", ")),
            );
        }
    }

    /// Reserve the declaration placeholders at the start of a body.
    pub(super) fn open_slots(&mut self) {
        let this_slot = self.writer.placeholder();
        self.line_break();
        let decl_slot = self.writer.placeholder();
        self.line_break();
        if let Some(frame) = self.frames.last_mut() {
            frame.slots = Some((this_slot, decl_slot));
        }
    }

    pub(super) fn push_block_scope(&mut self) {
        self.scopes.push(Scope {
            declared: FxHashSet::default(),
            gate: false,
        });
    }

    pub(super) fn pop_block_scope(&mut self) {
        let floor = self.frames.last().map_or(0, |frame| frame.scope + 1);
        if self.scopes.len() > floor {
            self.scopes.pop();
        }
    }

    pub(super) fn is_declared(&self, name: &str) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.declared.contains(name) {
                return true;
            }
            if scope.gate {
                break;
            }
        }
        false
    }

    /// Record a declaration: in the innermost block with `let`, in the
    /// function scope with `var`.
    pub(super) fn declare(&mut self, name: &str) {
        let index = if self.es(EsLevel::ES2015) {
            self.scopes.len().saturating_sub(1)
        } else {
            self.frames.last().map_or(0, |frame| frame.scope)
        };
        if let Some(scope) = self.scopes.get_mut(index) {
            scope.declared.insert(name.to_string());
        }
    }

    /// Declare `name` at the top of the current function, or of the nearest
    /// enclosing one when this function has no body to hold declarations
    /// (concise arrows).
    pub(super) fn hoist(&mut self, name: &str) {
        let Some(frame) = self
            .frames
            .iter_mut()
            .rev()
            .find(|frame| frame.slots.is_some())
        else {
            return;
        };
        if !frame.hoisted.iter().any(|hoisted| hoisted == name) {
            frame.hoisted.push(name.to_string());
        }
        let index = frame.scope;
        if let Some(scope) = self.scopes.get_mut(index) {
            scope.declared.insert(name.to_string());
        }
    }

    pub(super) fn decl_keyword(&self) -> &'static str {
        if self.es(EsLevel::ES2015) { "let" } else { "var" }
    }

    pub(super) fn const_keyword(&self) -> &'static str {
        if self.es(EsLevel::ES2015) { "const" } else { "var" }
    }

    /// Hoist locals of `body` that are first assigned in a nested block and
    /// used outside of it.
    pub(super) fn prepare_hoisting(&mut self, body: &Node) {
        if !self.es(EsLevel::ES2015) {
            return;
        }
        for name in hoist_candidates(body) {
            if !self.is_declared(&name) {
                self.hoist(&name);
            }
        }
    }

    /// The expression for `self`, routing through `_this` when a non-arrow
    /// function sits between here and the method that owns `this`.
    pub(super) fn this_ref(&mut self) -> &'static str {
        let mut crossed = false;
        for frame in self.frames.iter_mut().rev() {
            match frame.kind {
                FrameKind::Closure if frame.arrow => {}
                FrameKind::Closure => crossed = true,
                FrameKind::Method | FrameKind::Program => {
                    if crossed {
                        frame.this_alias = true;
                        return THIS_ALIAS;
                    }
                    return "this";
                }
            }
        }
        "this"
    }

    pub(super) fn loop_depth(&self) -> u32 {
        self.frames.last().map_or(0, |frame| frame.loop_depth)
    }

    pub(super) fn enter_loop(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.loop_depth += 1;
        }
    }

    pub(super) fn leave_loop(&mut self) {
        if let Some(frame) = self.frames.last_mut() {
            frame.loop_depth = frame.loop_depth.saturating_sub(1);
        }
    }

    /// Callable bound to `yield` in the nearest method.
    pub(super) fn block_param(&self) -> Option<&str> {
        self.frames
            .iter()
            .rev()
            .find(|frame| frame.kind != FrameKind::Closure)
            .and_then(|frame| frame.block_param.as_deref())
    }

    // =========================================================================
    // Unique Name Generation
    // =========================================================================

    /// A temp name that collides with no identifier in the file and no
    /// earlier temp: `_a` .. `_z`, then `_0`, `_1`, ...
    pub(super) fn make_unique_name(&mut self) -> String {
        loop {
            let counter = self.temp_var_counter;
            let name = if counter < 26 {
                format!("_{}", (b'a' + counter as u8) as char)
            } else {
                format!("_{}", counter - 26)
            };
            self.temp_var_counter += 1;

            if !self.file_identifiers.contains(&name) && !self.generated_temp_names.contains(&name)
            {
                self.generated_temp_names.insert(name.clone());
                return name;
            }
        }
    }

    /// A fresh temp for `value`: the `_a = value` node that stores it and the
    /// `_a` node that reads it back.
    pub(super) fn bind_temporary(&mut self, value: &Node) -> (Node, Node) {
        let temp = self.make_unique_name();
        trace!(temp = %temp, kind = %value.kind(), "binding to a temporary");
        let store = Node::new(
            NodeKind::Lvasgn,
            vec![Child::sym(temp.clone()), Child::from(value.clone())],
        );
        let load = Node::new(NodeKind::Lvar, vec![Child::sym(temp)]);
        (store, load)
    }
}

/// Locals first assigned inside a nested block (a branch, loop body or
/// closure) and referenced outside of it, in order of first assignment.
pub(super) fn hoist_candidates(body: &Node) -> Vec<String> {
    let mut scan = HoistScan::default();
    scan.visit(body, &mut Vec::new());
    scan.order
        .into_iter()
        .filter(|name| scan.hoist.contains(name))
        .collect()
}

#[derive(Default)]
struct HoistScan {
    /// Block path of each local's first assignment.
    first: FxHashMap<String, Vec<u32>>,
    order: Vec<String>,
    hoist: FxHashSet<String>,
    next_region: u32,
}

impl HoistScan {
    fn visit(&mut self, node: &Node, path: &mut Vec<u32>) {
        match node.kind() {
            NodeKind::Def
            | NodeKind::Defs
            | NodeKind::Class
            | NodeKind::Module
            | NodeKind::Sclass => {}
            NodeKind::Lvasgn => {
                self.children(node, path);
                if let Some(name) = node.sym_at(0) {
                    self.record(name, path, true);
                }
            }
            NodeKind::Lvar => {
                if let Some(name) = node.sym_at(0) {
                    self.record(name, path, false);
                }
            }
            NodeKind::If => {
                if let Some(cond) = node.node_at(0) {
                    self.visit(cond, path);
                }
                for branch in node.children().iter().skip(1).filter_map(|c| c.as_node()) {
                    self.region(path, |scan, path| scan.visit(branch, path));
                }
            }
            NodeKind::While | NodeKind::Until | NodeKind::WhilePost | NodeKind::UntilPost => {
                if let Some(cond) = node.node_at(0) {
                    self.visit(cond, path);
                }
                if let Some(body) = node.node_at(1) {
                    self.region(path, |scan, path| scan.visit(body, path));
                }
            }
            NodeKind::For => {
                if let Some(iterable) = node.node_at(1) {
                    self.visit(iterable, path);
                }
                self.region(path, |scan, path| {
                    for index in [0, 2] {
                        if let Some(child) = node.node_at(index) {
                            scan.visit(child, path);
                        }
                    }
                });
            }
            NodeKind::When => {
                let count = node.children().len();
                for (index, child) in node.children().iter().enumerate() {
                    let Some(child) = child.as_node() else { continue };
                    if index + 1 == count {
                        self.region(path, |scan, path| scan.visit(child, path));
                    } else {
                        self.visit(child, path);
                    }
                }
            }
            NodeKind::Case => {
                let count = node.children().len();
                for (index, child) in node.children().iter().enumerate() {
                    let Some(child) = child.as_node() else { continue };
                    if index > 0 && index + 1 == count && !child.is(NodeKind::When) {
                        self.region(path, |scan, path| scan.visit(child, path));
                    } else {
                        self.visit(child, path);
                    }
                }
            }
            NodeKind::Rescue | NodeKind::Ensure => {
                for child in node.child_nodes() {
                    if child.is(NodeKind::Resbody) {
                        self.region(path, |scan, path| scan.children(child, path));
                    } else if child.is(NodeKind::Rescue) {
                        self.visit(child, path);
                    } else {
                        self.region(path, |scan, path| scan.visit(child, path));
                    }
                }
            }
            NodeKind::Block => {
                if let Some(call) = node.node_at(0) {
                    self.visit(call, path);
                }
                self.region(path, |scan, path| {
                    for child in node.children().iter().skip(1).filter_map(|c| c.as_node()) {
                        scan.visit(child, path);
                    }
                });
            }
            NodeKind::Arg
            | NodeKind::Optarg
            | NodeKind::Restarg
            | NodeKind::Kwarg
            | NodeKind::Kwoptarg
            | NodeKind::Kwrestarg
            | NodeKind::Blockarg => {
                self.children(node, path);
                if let Some(name) = node.sym_at(0) {
                    self.record(name, path, true);
                }
            }
            _ => self.children(node, path),
        }
    }

    fn children(&mut self, node: &Node, path: &mut Vec<u32>) {
        for child in node.child_nodes() {
            self.visit(child, path);
        }
    }

    fn region(&mut self, path: &mut Vec<u32>, visit: impl FnOnce(&mut Self, &mut Vec<u32>)) {
        let id = self.next_region;
        self.next_region += 1;
        path.push(id);
        visit(self, path);
        path.pop();
    }

    fn record(&mut self, name: &str, path: &[u32], assignment: bool) {
        match self.first.get(name) {
            Some(first) => {
                if !path.starts_with(first) {
                    self.hoist.insert(name.to_string());
                }
            }
            None if assignment => {
                self.first.insert(name.to_string(), path.to_vec());
                self.order.push(name.to_string());
            }
            None => {}
        }
    }
}
