use super::literals::quote;
use super::statements::is_simple;
use super::{Printer, js_method_name, nodes_from};
use crate::error::Result;
use r2js_ast::{Child, Node, NodeKind};
use r2js_common::{Comparison, EsLevel, LogicalOperator};
use tracing::trace;

/// JavaScript operator precedence, loosely following the grammar levels.
pub(crate) mod prec {
    pub const LOWEST: u8 = 0;
    pub const COMMA: u8 = 1;
    /// Assignment, `?:`, arrow functions, `yield`.
    pub const ASSIGN: u8 = 3;
    pub const OR: u8 = 4;
    pub const AND: u8 = 5;
    pub const BIT_OR: u8 = 6;
    pub const BIT_XOR: u8 = 7;
    pub const BIT_AND: u8 = 8;
    pub const EQUALITY: u8 = 9;
    pub const RELATIONAL: u8 = 10;
    pub const SHIFT: u8 = 11;
    pub const ADDITIVE: u8 = 12;
    pub const MULTIPLICATIVE: u8 = 13;
    pub const EXPONENT: u8 = 14;
    pub const UNARY: u8 = 15;
    pub const POSTFIX: u8 = 16;
    /// Member access and calls.
    pub const CALL: u8 = 18;
    pub const PRIMARY: u8 = 20;
}

fn binary_operator(method: &str) -> Option<(&'static str, u8)> {
    Some(match method {
        "+" => ("+", prec::ADDITIVE),
        "-" => ("-", prec::ADDITIVE),
        "*" => ("*", prec::MULTIPLICATIVE),
        "/" => ("/", prec::MULTIPLICATIVE),
        "%" => ("%", prec::MULTIPLICATIVE),
        "<" => ("<", prec::RELATIONAL),
        "<=" => ("<=", prec::RELATIONAL),
        ">" => (">", prec::RELATIONAL),
        ">=" => (">=", prec::RELATIONAL),
        "instanceof" => ("instanceof", prec::RELATIONAL),
        "<<" => ("<<", prec::SHIFT),
        ">>" => (">>", prec::SHIFT),
        "&" => ("&", prec::BIT_AND),
        "|" => ("|", prec::BIT_OR),
        "^" => ("^", prec::BIT_XOR),
        _ => return None,
    })
}

/// Setter names end in `=` but are not comparison operators.
pub(super) fn is_setter(method: &str) -> bool {
    method.ends_with('=')
        && method.len() > 1
        && !matches!(method, "==" | "!=" | "<=" | ">=" | "===" | "[]=")
}

impl<'a> Printer<'a> {
    // =========================================================================
    // Sends
    // =========================================================================

    /// `(send receiver :method args...)`, with `block` being the enclosing
    /// `(block ...)` node whose function becomes the last argument.
    pub(super) fn emit_send(&mut self, node: &Node, block: Option<&Node>) -> Result<u8> {
        let receiver = node.node_at(0).cloned();
        let Some(method) = node.sym_at(1) else {
            return Err(self.malformed(node, "send without a method name"));
        };
        let args = nodes_from(node, 2);
        let safe = node.is(NodeKind::Csend);

        let Some(receiver) = receiver else {
            return self.emit_receiverless(node, method, &args, block);
        };

        if safe {
            return self.emit_safe_send(node, &receiver, method, &args, block);
        }

        if block.is_none() {
            match (method, args.as_slice()) {
                ("==", [right]) => return self.emit_equality(node, &receiver, right, false),
                ("!=", [right]) => return self.emit_equality(node, &receiver, right, true),
                ("**", [right]) => return self.emit_power(&receiver, right),
                ("=~", [right]) => return self.emit_match(&receiver, right, false),
                ("!~", [right]) => return self.emit_match(&receiver, right, true),
                ("===", [_]) => return Err(self.unsupported(node, "case equality `===`", None)),
                ("<=>", [_]) => return Err(self.unsupported(node, "`<=>`", None)),
                ("!", []) => {
                    self.write("!");
                    self.emit_expr(&receiver, prec::UNARY)?;
                    return Ok(prec::UNARY);
                }
                ("-@" | "+@" | "~", []) => {
                    self.write(&method[..1]);
                    self.emit_expr(&receiver, prec::UNARY)?;
                    return Ok(prec::UNARY);
                }
                ("[]", _) => return self.emit_index(node, &receiver, &args),
                ("[]=", [index, value]) => {
                    return self.emit_index_assign(&receiver, std::slice::from_ref(index), value);
                }
                ("new", _) => return self.emit_new(&receiver, &args, None),
                _ => {}
            }
            if let Some((operator, level)) = binary_operator(method)
                && let [right] = args.as_slice()
            {
                self.emit_expr(&receiver, level)?;
                self.write(&format!(" {operator} "));
                self.emit_expr(right, level + 1)?;
                return Ok(level);
            }
            if is_setter(method)
                && let [value] = args.as_slice()
            {
                self.emit_receiver(&receiver)?;
                self.write(".");
                self.write(&method[..method.len() - 1]);
                self.write(" = ");
                self.emit_expr(value, prec::ASSIGN)?;
                return Ok(prec::ASSIGN);
            }
        } else if method == "new" {
            return self.emit_new(&receiver, &args, block);
        }

        let callable = receiver.is(NodeKind::SelfRef)
            && self
                .classes
                .last()
                .is_some_and(|class| class.methods.contains(js_method_name(method)));
        self.emit_receiver(&receiver)?;
        self.write(".");
        self.write(js_method_name(method));
        if args.is_empty() && block.is_none() && !callable {
            return Ok(prec::CALL);
        }
        self.emit_arguments_or_apply(node, Some(&receiver), method, &args, block)
    }

    fn emit_receiverless(
        &mut self,
        node: &Node,
        method: &str,
        args: &[Node],
        block: Option<&Node>,
    ) -> Result<u8> {
        match (method, args) {
            ("typeof", [value]) if block.is_none() => {
                self.write("typeof ");
                self.emit_expr(value, prec::UNARY)?;
                return Ok(prec::UNARY);
            }
            ("await", [value]) if block.is_none() => {
                self.require(node, "`await`", EsLevel::ES2017)?;
                self.write("await ");
                self.emit_expr(value, prec::UNARY)?;
                return Ok(prec::UNARY);
            }
            ("async", [target]) if block.is_none() => return self.emit_async(node, target),
            _ => {}
        }

        let name = js_method_name(method);
        let member = self.classes.last().and_then(|class| {
            if class.methods.contains(name) {
                Some(true)
            } else if class.getters.contains(name) {
                Some(false)
            } else {
                None
            }
        });
        match member {
            Some(callable) => {
                let this = self.this_ref();
                self.write(this);
                self.write(".");
                self.write(name);
                if !callable && args.is_empty() && block.is_none() {
                    return Ok(prec::CALL);
                }
            }
            None => self.write_identifier(name, method),
        }
        self.emit_arguments_or_apply(node, None, method, args, block)
    }

    /// `a&.b`: optional chaining, or a guarded access below ES2020. A
    /// receiver with side effects is evaluated once, through a temp.
    fn emit_safe_send(
        &mut self,
        node: &Node,
        receiver: &Node,
        method: &str,
        args: &[Node],
        block: Option<&Node>,
    ) -> Result<u8> {
        let name = js_method_name(method);
        if self.es(EsLevel::ES2020) {
            self.emit_receiver(receiver)?;
            self.write("?.");
            self.write(name);
            if args.is_empty() && block.is_none() {
                return Ok(prec::CALL);
            }
            self.emit_arguments(args, block)?;
            return Ok(prec::CALL);
        }
        trace!(method, "lowering safe navigation");
        let (guard, receiver) = if is_simple(receiver) {
            (receiver.clone(), receiver.clone())
        } else {
            self.bind_temporary(receiver)
        };
        self.emit_expr(&guard, prec::AND)?;
        self.write(" && ");
        self.emit_receiver(&receiver)?;
        self.write(".");
        self.write(name);
        if !args.is_empty() || block.is_some() {
            self.emit_arguments_or_apply(node, Some(&receiver), method, args, block)?;
        }
        Ok(prec::AND)
    }

    /// Receivers bind tighter than anything but primaries; integer literals
    /// need parentheses before a dot.
    pub(super) fn emit_receiver(&mut self, receiver: &Node) -> Result<()> {
        let mark = self.writer.mark();
        self.emit_expr(receiver, prec::CALL)?;
        if receiver.is(NodeKind::Int) && self.writer.first_text_since(mark).is_some_and(|text| !text.starts_with('(')) {
            self.writer.wrap_parens(mark);
        }
        Ok(())
    }

    /// `(args)`, or `.apply(this, args)` when splats must be lowered.
    fn emit_arguments_or_apply(
        &mut self,
        node: &Node,
        receiver: Option<&Node>,
        method: &str,
        args: &[Node],
        block: Option<&Node>,
    ) -> Result<u8> {
        if args.iter().any(|arg| arg.is(NodeKind::Splat)) && !self.es(EsLevel::ES2015) {
            if block.is_some() {
                return Err(self.unsupported(node, "splat together with a block", Some(EsLevel::ES2015)));
            }
            trace!(method, "lowering splat call to apply");
            self.write(".apply(");
            match receiver {
                Some(receiver) => self.emit_expr(receiver, prec::ASSIGN)?,
                None => {
                    self.write("null");
                    prec::PRIMARY
                }
            };
            self.write(", ");
            self.emit_concat(args)?;
            self.write(")");
            return Ok(prec::CALL);
        }
        self.emit_arguments(args, block)?;
        Ok(prec::CALL)
    }

    pub(super) fn emit_arguments(&mut self, args: &[Node], block: Option<&Node>) -> Result<()> {
        self.write("(");
        for (index, arg) in args.iter().enumerate() {
            if index > 0 {
                self.write(", ");
            }
            self.emit_argument(arg)?;
        }
        if let Some(block) = block {
            if !args.is_empty() {
                self.write(", ");
            }
            self.emit_block_function(block)?;
        }
        self.write(")");
        Ok(())
    }

    fn emit_argument(&mut self, arg: &Node) -> Result<()> {
        match arg.kind() {
            NodeKind::Splat => {
                self.require(arg, "splat argument", EsLevel::ES2015)?;
                self.emit_spread(arg)
            }
            NodeKind::BlockPass => match arg.node_at(0) {
                Some(symbol) if symbol.is(NodeKind::Sym) => {
                    let name = symbol.sym_at(0).unwrap_or_default().to_string();
                    self.emit_symbol_function(&name)
                }
                Some(value) => {
                    self.emit_expr(value, prec::ASSIGN)?;
                    Ok(())
                }
                None => Err(self.unsupported(arg, "anonymous block forwarding", None)),
            },
            _ => {
                self.emit_expr(arg, prec::ASSIGN)?;
                Ok(())
            }
        }
    }

    fn emit_new(&mut self, class: &Node, args: &[Node], block: Option<&Node>) -> Result<u8> {
        self.write("new ");
        self.emit_expr(class, prec::CALL)?;
        if args.iter().any(|arg| arg.is(NodeKind::Splat)) {
            self.require(class, "splat in a constructor call", EsLevel::ES2015)?;
        }
        self.emit_arguments(args, block)?;
        Ok(prec::CALL)
    }

    // =========================================================================
    // Synthetic calls
    // =========================================================================

    /// `(attr receiver :name)` → `receiver.name`.
    pub(super) fn emit_attr(&mut self, node: &Node) -> Result<u8> {
        let Some(name) = node.sym_at(1) else {
            return Err(self.malformed(node, "attr without a name"));
        };
        match node.node_at(0) {
            Some(receiver) => {
                self.emit_receiver(receiver)?;
                self.write(".");
                self.write(name);
            }
            None => self.write_identifier(name, name),
        }
        Ok(prec::CALL)
    }

    /// `(call receiver :name args...)` → `receiver.name(args)`; a nil name
    /// calls the receiver itself.
    pub(super) fn emit_call(&mut self, node: &Node, block: Option<&Node>) -> Result<u8> {
        let args = nodes_from(node, 2);
        let receiver = node.node_at(0).cloned();
        let name = node.sym_at(1);
        match (&receiver, name) {
            (Some(receiver), Some(name)) => {
                self.emit_receiver(receiver)?;
                self.write(".");
                self.write(name);
            }
            (Some(receiver), None) => {
                self.emit_expr(receiver, prec::CALL)?;
            }
            (None, Some(name)) => self.write_identifier(name, name),
            (None, None) => return Err(self.malformed(node, "call without a receiver or a name")),
        }
        self.emit_arguments_or_apply(node, receiver.as_ref(), name.unwrap_or("call"), &args, block)
    }

    // =========================================================================
    // Indexing
    // =========================================================================

    pub(super) fn emit_index_node(&mut self, node: &Node) -> Result<u8> {
        let Some(receiver) = node.node_at(0) else {
            return Err(self.malformed(node, "index without a receiver"));
        };
        let args = nodes_from(node, 1);
        self.emit_index(node, receiver, &args)
    }

    pub(super) fn emit_indexasgn_node(&mut self, node: &Node) -> Result<u8> {
        let Some(receiver) = node.node_at(0) else {
            return Err(self.malformed(node, "index assignment without a receiver"));
        };
        let mut args = nodes_from(node, 1);
        let Some(value) = args.pop() else {
            return Err(self.malformed(node, "index assignment without a value"));
        };
        self.emit_index_assign(receiver, &args, &value)
    }

    /// `a[i]`, `a[1..2]` → `a.slice(1, 3)`, `a[-1]` → `a.at(-1)`.
    fn emit_index(&mut self, node: &Node, receiver: &Node, args: &[Node]) -> Result<u8> {
        match args {
            [range] if matches!(range.kind(), NodeKind::Irange | NodeKind::Erange) => {
                self.emit_receiver(receiver)?;
                self.write(".slice(");
                self.emit_child_expr(range.child(0), prec::ASSIGN)?;
                match range.node_at(1) {
                    None => {}
                    Some(end) if range.is(NodeKind::Erange) => {
                        self.write(", ");
                        self.emit_expr(end, prec::ASSIGN)?;
                    }
                    Some(end) => match end.child(0).and_then(Child::as_int).filter(|_| end.is(NodeKind::Int)) {
                        Some(-1) => {}
                        Some(value) => self.write(&format!(", {}", value + 1)),
                        None => {
                            self.write(", ");
                            self.emit_expr(end, prec::ADDITIVE)?;
                            self.write(" + 1");
                        }
                    },
                }
                self.write(")");
                Ok(prec::CALL)
            }
            [index] => {
                let negative = index
                    .child(0)
                    .and_then(Child::as_int)
                    .filter(|value| index.is(NodeKind::Int) && *value < 0);
                match negative {
                    Some(value) if self.es(EsLevel::ES2022) => {
                        self.emit_receiver(receiver)?;
                        self.write(&format!(".at({value})"));
                    }
                    Some(value) => {
                        self.emit_receiver(receiver)?;
                        self.write("[");
                        self.emit_receiver(receiver)?;
                        self.write(&format!(".length - {}]", -value));
                    }
                    None => {
                        self.emit_receiver(receiver)?;
                        self.write("[");
                        self.emit_expr(index, prec::LOWEST)?;
                        self.write("]");
                    }
                }
                Ok(prec::CALL)
            }
            [start, length] => {
                self.emit_receiver(receiver)?;
                self.write(".slice(");
                self.emit_expr(start, prec::ASSIGN)?;
                self.write(", ");
                self.emit_expr(start, prec::ADDITIVE)?;
                self.write(" + ");
                self.emit_expr(length, prec::MULTIPLICATIVE)?;
                self.write(")");
                Ok(prec::CALL)
            }
            _ => Err(self.malformed(node, "index with an unsupported argument count")),
        }
    }

    fn emit_index_assign(&mut self, receiver: &Node, index: &[Node], value: &Node) -> Result<u8> {
        let [index] = index else {
            return Err(self.unsupported(receiver, "multi-argument index assignment", None));
        };
        self.emit_receiver(receiver)?;
        self.write("[");
        self.emit_expr(index, prec::LOWEST)?;
        self.write("] = ");
        self.emit_expr(value, prec::ASSIGN)?;
        Ok(prec::ASSIGN)
    }

    // =========================================================================
    // Operators
    // =========================================================================

    pub(super) fn emit_equality(&mut self, node: &Node, left: &Node, right: &Node, negate: bool) -> Result<u8> {
        let operator = match (self.options.comparison, negate) {
            (Comparison::Loose, false) => "==",
            (Comparison::Loose, true) => "!=",
            (Comparison::Strict, false) => "===",
            (Comparison::Strict, true) => "!==",
            (Comparison::Identity, _) => {
                self.require(node, "identity comparison (`Object.is`)", EsLevel::ES2015)?;
                if negate {
                    self.write("!");
                }
                self.write("Object.is(");
                self.emit_expr(left, prec::ASSIGN)?;
                self.write(", ");
                self.emit_expr(right, prec::ASSIGN)?;
                self.write(")");
                return Ok(if negate { prec::UNARY } else { prec::CALL });
            }
        };
        self.emit_expr(left, prec::EQUALITY)?;
        self.write(&format!(" {operator} "));
        self.emit_expr(right, prec::EQUALITY + 1)?;
        Ok(prec::EQUALITY)
    }

    fn emit_power(&mut self, base: &Node, exponent: &Node) -> Result<u8> {
        if self.es(EsLevel::ES2016) {
            self.emit_expr(base, prec::POSTFIX)?;
            self.write(" ** ");
            self.emit_expr(exponent, prec::EXPONENT)?;
            return Ok(prec::EXPONENT);
        }
        self.write("Math.pow(");
        self.emit_expr(base, prec::ASSIGN)?;
        self.write(", ");
        self.emit_expr(exponent, prec::ASSIGN)?;
        self.write(")");
        Ok(prec::CALL)
    }

    /// `str =~ /re/` → `/re/.test(str)`.
    fn emit_match(&mut self, left: &Node, right: &Node, negate: bool) -> Result<u8> {
        let (pattern, subject) = if left.is(NodeKind::Regexp) { (left, right) } else { (right, left) };
        if negate {
            self.write("!");
        }
        self.emit_receiver(pattern)?;
        self.write(".test(");
        self.emit_expr(subject, prec::ASSIGN)?;
        self.write(")");
        Ok(if negate { prec::UNARY } else { prec::CALL })
    }

    /// `and` → `&&`; `or` → `||` or `??` depending on the options.
    pub(super) fn emit_logical(&mut self, node: &Node) -> Result<u8> {
        let (operator, level, left_min, right_min) = if node.is(NodeKind::And) {
            ("&&", prec::AND, prec::AND, prec::AND + 1)
        } else if self.options.or == LogicalOperator::Nullish {
            self.require(node, "nullish coalescing (`??`)", EsLevel::ES2020)?;
            ("??", prec::OR, prec::BIT_OR, prec::BIT_OR)
        } else {
            ("||", prec::OR, prec::OR, prec::OR + 1)
        };
        self.emit_child_expr(node.child(0), left_min)?;
        self.write(&format!(" {operator} "));
        self.emit_child_expr(node.child(1), right_min)?;
        Ok(level)
    }

    /// `defined?(x)` → `typeof x !== "undefined"`.
    pub(super) fn emit_defined(&mut self, node: &Node) -> Result<u8> {
        self.write("typeof ");
        self.emit_child_expr(node.child(0), prec::UNARY)?;
        self.write(&format!(" !== {}", quote("undefined")));
        Ok(prec::EQUALITY)
    }
}
