//! `functions`: Ruby core methods mapped onto their JavaScript counterparts.
//!
//! Each mapping builds a replacement from the *unprocessed* operands and
//! sends the replacement back through the whole chain, so later filters see
//! the mapped form. Replacements never reproduce the method they matched,
//! which keeps the re-processing finite.
//!
//! Mappings honor `exclude` by Ruby method name. `class` and `call` change
//! meaning too much to apply by default and must be named in `include`.

use super::{Chain, Filter, FilterResult, HandlerTable};
use crate::error::Result;
use once_cell::sync::Lazy;
use r2js_ast::{Child, Literal, Node, NodeKind};
use r2js_common::EsLevel;
use tracing::trace;

static HANDLERS: Lazy<HandlerTable<FunctionsFilter>> = Lazy::new(|| {
    HandlerTable::new()
        .on(NodeKind::Send, FunctionsFilter::on_send)
        .on(NodeKind::Block, FunctionsFilter::on_block)
});

#[derive(Default)]
pub struct FunctionsFilter;

impl FunctionsFilter {
    pub fn new() -> Self {
        FunctionsFilter
    }

    fn on_send(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        let Some(method) = node.sym_at(1) else {
            return Err(chain.malformed(node, "send without a method name"));
        };
        if !chain.options().method_enabled(method) {
            return Ok(None);
        }
        let receiver = node.node_at(0);
        let args: Vec<&Node> = node.children().iter().skip(2).filter_map(Child::as_node).collect();
        if args.len() + 2 != node.children().len() {
            // Literal arguments are not something the parser produces.
            return Ok(None);
        }

        if let Some(expanded) = expand_symbol_block(node, receiver, method, &args) {
            return chain.process(&expanded).map(Some);
        }

        let replacement = match receiver {
            None => map_function(node, method, &args),
            Some(receiver) => map_method(node, receiver, method, &args, chain)?,
        };
        match replacement {
            Some(replacement) => {
                trace!(method, "mapped method");
                chain.process(&replacement).map(Some)
            }
            None => Ok(None),
        }
    }

    fn on_block(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        let (Some(call), Some(params)) = (node.node_at(0), node.node_at(1)) else {
            return Err(chain.malformed(node, "block without a call or parameters"));
        };
        let body = node.child(2).cloned().unwrap_or(Child::NIL);
        if !call.is(NodeKind::Send) {
            return Ok(None);
        }
        let Some(method) = call.sym_at(1) else {
            return Ok(None);
        };
        if !chain.options().method_enabled(method) {
            return Ok(None);
        }
        let receiver = call.node_at(0);
        let call_args: Vec<Node> = call.children().iter().skip(2).filter_map(Child::as_node).cloned().collect();
        let level = chain.eslevel();

        let block = |call: Node, params: &Node, body: Child| {
            node.updated(None, vec![Child::Node(call), Child::Node(params.clone()), body])
        };

        let replacement = match (receiver, method, call_args.len()) {
            (None, "loop", 0) => Some(node.updated(
                Some(NodeKind::While),
                vec![Child::Node(Node::new(NodeKind::True, vec![])), body.clone()],
            )),
            (Some(recv), "each" | "each_with_index", 0) => {
                Some(block(rename_call(call, recv, "forEach", vec![]), params, body.clone()))
            }
            (Some(recv), "select", 0) => {
                Some(block(rename_call(call, recv, "filter", vec![]), params, body.clone()))
            }
            (Some(recv), "any?", 0) => {
                Some(block(rename_call(call, recv, "some", vec![]), params, body.clone()))
            }
            (Some(recv), "all?", 0) => {
                Some(block(rename_call(call, recv, "every", vec![]), params, body.clone()))
            }
            (Some(recv), "find" | "detect", 0) => {
                if level.supports(EsLevel::ES2015) {
                    Some(block(rename_call(call, recv, "find", vec![]), params, body.clone()))
                } else {
                    let filtered = block(rename_call(call, recv, "filter", vec![]), params, body.clone());
                    Some(send(Some(filtered), "[]", vec![int(0)]))
                }
            }
            (Some(recv), "inject" | "reduce", 0) => {
                Some(block(rename_call(call, recv, "reduce", vec![]), params, body.clone()))
            }
            (Some(recv), "inject" | "reduce", 1) => {
                let function = Node::new(
                    NodeKind::Block,
                    vec![
                        Child::Node(Node::new(NodeKind::Lambda, vec![])),
                        Child::Node(params.clone()),
                        body.clone(),
                    ],
                );
                Some(node.updated(
                    Some(NodeKind::Call),
                    vec![
                        Child::Node(recv.clone()),
                        Child::sym("reduce"),
                        Child::Node(function),
                        Child::Node(call_args[0].clone()),
                    ],
                ))
            }
            (Some(recv), "each_pair", 0) => Some(each_pair(node, recv, params, body.clone(), level)),
            _ => None,
        };

        match replacement {
            Some(replacement) => {
                trace!(method, "mapped block method");
                chain.process(&replacement).map(Some)
            }
            None => Ok(None),
        }
    }
}

/// Receiver-less calls.
fn map_function(node: &Node, method: &str, args: &[&Node]) -> Option<Node> {
    match method {
        "puts" | "p" | "print" => {
            let mut children = vec![Child::Node(konst("console")), Child::sym("log")];
            if args.is_empty() {
                children.push(Child::Node(string("")));
            } else {
                children.extend(args.iter().map(|arg| Child::Node((*arg).clone())));
            }
            Some(node.updated(Some(NodeKind::Call), children))
        }
        "raise" => Some(node.updated(Some(NodeKind::Throw), vec![Child::Node(raise_value(args))])),
        _ => None,
    }
}

fn raise_value(args: &[&Node]) -> Node {
    match args {
        [] => Node::new(NodeKind::Lvar, vec![Child::sym("$EXCEPTION")]),
        [message] if message.is(NodeKind::Str) || message.is(NodeKind::Dstr) => {
            send(Some(konst("Error")), "new", vec![(*message).clone()])
        }
        [class] if class.is(NodeKind::Const) => send(Some((*class).clone()), "new", vec![]),
        [class, message] if class.is(NodeKind::Const) => {
            send(Some((*class).clone()), "new", vec![(*message).clone()])
        }
        [value, ..] => (*value).clone(),
    }
}

/// Calls with an explicit receiver.
fn map_method(
    node: &Node,
    receiver: &Node,
    method: &str,
    args: &[&Node],
    chain: &Chain<'_>,
) -> Result<Option<Node>> {
    let level = chain.eslevel();
    let options = chain.options();
    let recv = || receiver.clone();
    let arg = |index: usize| args[index].clone();
    let here = |kind: NodeKind, children: Vec<Child>| Some(node.updated(Some(kind), children));

    let mapped = match (method, args.len()) {
        ("length" | "size" | "count", 0) => here(NodeKind::Attr, vec![Child::Node(recv()), Child::sym("length")]),
        ("to_s", _) => here(NodeKind::Call, call_children(Some(recv()), "toString", args)),
        ("to_i", _) => {
            let mut all = vec![receiver];
            all.extend_from_slice(args);
            here(NodeKind::Call, call_children(None, "parseInt", &all))
        }
        ("to_f", 0) => here(NodeKind::Call, call_children(None, "parseFloat", &[receiver])),
        ("upcase", 0) => here(NodeKind::Call, call_children(Some(recv()), "toUpperCase", &[])),
        ("downcase", 0) => here(NodeKind::Call, call_children(Some(recv()), "toLowerCase", &[])),
        ("strip", 0) => here(NodeKind::Call, call_children(Some(recv()), "trim", &[])),
        ("chars", 0) => here(NodeKind::Call, vec![Child::Node(recv()), Child::sym("split"), Child::Node(string(""))]),
        ("split", 0) => here(NodeKind::Call, vec![Child::Node(recv()), Child::sym("split"), Child::Node(string(" "))]),
        ("reverse" | "sort" | "pop" | "shift", 0) => here(NodeKind::Call, call_children(Some(recv()), method, &[])),
        ("dup", 0) => here(NodeKind::Call, call_children(Some(recv()), "slice", &[])),
        ("inspect", 0) => here(NodeKind::Call, call_children(Some(konst("JSON")), "stringify", &[receiver])),
        ("ord", 0) => here(NodeKind::Call, vec![Child::Node(recv()), Child::sym("charCodeAt"), Child::Node(int(0))]),
        ("chr", 0) => here(NodeKind::Call, call_children(Some(konst("String")), "fromCharCode", &[receiver])),
        ("empty?", 0) => Some(node.updated(
            None,
            vec![Child::Node(attr(recv(), "length")), Child::sym("=="), Child::Node(int(0))],
        )),
        ("nil?", 0) => Some(node.updated(
            None,
            vec![Child::Node(recv()), Child::sym("=="), Child::Node(Node::new(NodeKind::Nil, vec![]))],
        )),
        ("zero?", 0) => Some(node.updated(None, vec![Child::Node(recv()), Child::sym("=="), Child::Node(int(0))])),
        ("positive?", 0) => Some(node.updated(None, vec![Child::Node(recv()), Child::sym(">"), Child::Node(int(0))])),
        ("negative?", 0) => Some(node.updated(None, vec![Child::Node(recv()), Child::sym("<"), Child::Node(int(0))])),
        ("even?" | "odd?", 0) => {
            let remainder = send(Some(recv()), "%", vec![int(2)]);
            let op = if method == "even?" { "==" } else { "!=" };
            Some(node.updated(None, vec![Child::Node(remainder), Child::sym(op), Child::Node(int(0))]))
        }
        ("first", 0) => Some(node.updated(None, vec![Child::Node(recv()), Child::sym("[]"), Child::Node(int(0))])),
        ("first", 1) => here(NodeKind::Call, vec![Child::Node(recv()), Child::sym("slice"), Child::Node(int(0)), Child::Node(arg(0))]),
        ("last", 0) => {
            if level.supports(EsLevel::ES2022) {
                here(NodeKind::Call, vec![Child::Node(recv()), Child::sym("at"), Child::Node(int(-1))])
            } else {
                let index = send(Some(attr(recv(), "length")), "-", vec![int(1)]);
                Some(node.updated(None, vec![Child::Node(recv()), Child::sym("[]"), Child::Node(index)]))
            }
        }
        ("last", 1) => here(
            NodeKind::Call,
            vec![Child::Node(recv()), Child::sym("slice"), Child::Node(send(Some(arg(0)), "-@", vec![]))],
        ),
        ("keys", 0) => here(NodeKind::Call, call_children(Some(konst("Object")), "keys", &[receiver])),
        ("values", 0) => {
            if level.supports(EsLevel::ES2017) {
                here(NodeKind::Call, call_children(Some(konst("Object")), "values", &[receiver]))
            } else {
                let keys = Node::new(NodeKind::Call, call_children(Some(konst("Object")), "keys", &[receiver]));
                let lookup = send(Some(recv()), "[]", vec![lvar("key")]);
                Some(node.updated(
                    Some(NodeKind::Block),
                    vec![
                        Child::Node(send(Some(keys), "map", vec![])),
                        Child::Node(params(&["key"])),
                        Child::Node(lookup),
                    ],
                ))
            }
        }
        ("join", 0) => here(NodeKind::Call, vec![Child::Node(recv()), Child::sym("join"), Child::Node(string(""))]),
        ("join", 1) => here(NodeKind::Call, call_children(Some(recv()), "join", args)),
        ("include?", 1) => {
            if level.supports(EsLevel::ES2016) {
                here(NodeKind::Call, call_children(Some(recv()), "includes", args))
            } else {
                let index = Node::new(NodeKind::Call, call_children(Some(recv()), "indexOf", args));
                Some(node.updated(None, vec![Child::Node(index), Child::sym("!="), Child::Node(int(-1))]))
            }
        }
        ("start_with?", 1) => {
            if level.supports(EsLevel::ES2015) {
                here(NodeKind::Call, call_children(Some(recv()), "startsWith", args))
            } else {
                let index = Node::new(NodeKind::Call, call_children(Some(recv()), "indexOf", args));
                Some(node.updated(None, vec![Child::Node(index), Child::sym("=="), Child::Node(int(0))]))
            }
        }
        ("end_with?", 1) => {
            if level.supports(EsLevel::ES2015) {
                here(NodeKind::Call, call_children(Some(recv()), "endsWith", args))
            } else {
                let start = send(Some(attr(arg(0), "length")), "-@", vec![]);
                let tail = Node::new(NodeKind::Call, vec![Child::Node(recv()), Child::sym("slice"), Child::Node(start)]);
                Some(node.updated(None, vec![Child::Node(tail), Child::sym("=="), Child::Node(arg(0))]))
            }
        }
        ("index", 1) => here(NodeKind::Call, call_children(Some(recv()), "indexOf", args)),
        ("rindex", 1) => here(NodeKind::Call, call_children(Some(recv()), "lastIndexOf", args)),
        ("merge", n) if n > 0 => {
            let mut parts = vec![Child::Node(Node::new(NodeKind::Kwsplat, vec![Child::Node(recv())]))];
            parts.extend(args.iter().map(|hash| Child::Node(Node::new(NodeKind::Kwsplat, vec![Child::Node((*hash).clone())]))));
            here(NodeKind::Hash, parts)
        }
        ("sub", 2) => here(NodeKind::Call, call_children(Some(recv()), "replace", args)),
        ("gsub", 2) => {
            let pattern = global_pattern(args[0]);
            here(NodeKind::Call, vec![Child::Node(recv()), Child::sym("replace"), Child::Node(pattern), Child::Node(arg(1))])
        }
        ("abs" | "round" | "floor" | "ceil", 0) => {
            here(NodeKind::Call, call_children(Some(konst("Math")), method, &[receiver]))
        }
        ("max" | "min", 0) => here(
            NodeKind::Call,
            vec![
                Child::Node(konst("Math")),
                Child::sym(method),
                Child::Node(Node::new(NodeKind::Splat, vec![Child::Node(recv())])),
            ],
        ),
        ("uniq", 0) => {
            if !level.supports(EsLevel::ES2015) {
                return Err(chain.unsupported(node, "Array#uniq (Set spread)", Some(EsLevel::ES2015)));
            }
            let set = send(Some(konst("Set")), "new", vec![recv()]);
            here(NodeKind::Array, vec![Child::Node(Node::new(NodeKind::Splat, vec![Child::Node(set)]))])
        }
        ("freeze", 0) => here(NodeKind::Call, call_children(Some(konst("Object")), "freeze", &[receiver])),
        ("is_a?" | "kind_of?" | "instance_of?", 1) => {
            Some(node.updated(None, vec![Child::Node(recv()), Child::sym("instanceof"), Child::Node(arg(0))]))
        }
        ("class", 0) if options.method_included("class") => {
            here(NodeKind::Attr, vec![Child::Node(recv()), Child::sym("constructor")])
        }
        ("call", _) if options.method_included("call") => {
            let mut children = vec![Child::Node(recv()), Child::NIL];
            children.extend(args.iter().map(|arg| Child::Node((*arg).clone())));
            here(NodeKind::Call, children)
        }
        _ => None,
    };
    Ok(mapped)
}

/// `recv.map(&:name)` → `recv.map(item => item.name)`.
fn expand_symbol_block(node: &Node, receiver: Option<&Node>, method: &str, args: &[&Node]) -> Option<Node> {
    let (last, rest) = args.split_last()?;
    if !last.is(NodeKind::BlockPass) {
        return None;
    }
    let symbol = last.node_at(0).filter(|sym| sym.is(NodeKind::Sym))?;
    let name = symbol.sym_at(0)?;

    let mut call_children = vec![Child::from(receiver.cloned()), Child::sym(method)];
    call_children.extend(rest.iter().map(|arg| Child::Node((*arg).clone())));
    let call = node.updated(None, call_children);
    let body = send(Some(lvar("item")), name, vec![]);
    Some(node.updated(
        Some(NodeKind::Block),
        vec![Child::Node(call), Child::Node(params(&["item"])), Child::Node(body)],
    ))
}

fn each_pair(node: &Node, receiver: &Node, block_params: &Node, body: Child, level: EsLevel) -> Node {
    let names: Vec<String> = block_params
        .child_nodes()
        .filter_map(|param| param.sym_at(0).map(str::to_string))
        .collect();
    let key = names.first().cloned().unwrap_or_else(|| "key".to_string());

    if level.supports(EsLevel::ES2017) {
        let entries = Node::new(NodeKind::Call, call_children(Some(konst("Object")), "entries", &[receiver]));
        let destructured = Node::new(
            NodeKind::Args,
            vec![Child::Node(Node::new(
                NodeKind::Mlhs,
                block_params.children().to_vec(),
            ))],
        );
        return node.updated(
            None,
            vec![Child::Node(send(Some(entries), "forEach", vec![])), Child::Node(destructured), body],
        );
    }

    let keys = Node::new(NodeKind::Call, call_children(Some(konst("Object")), "keys", &[receiver]));
    let mut statements = Vec::new();
    if let Some(value) = names.get(1) {
        statements.push(Child::Node(Node::new(
            NodeKind::Lvasgn,
            vec![Child::sym(value.as_str()), Child::Node(send(Some(receiver.clone()), "[]", vec![lvar(&key)]))],
        )));
    }
    match body {
        Child::Node(body) if body.is(NodeKind::Begin) => statements.extend(body.children().iter().cloned()),
        Child::Node(body) => statements.push(Child::Node(body)),
        Child::Lit(_) => {}
    }
    node.updated(
        None,
        vec![
            Child::Node(send(Some(keys), "forEach", vec![])),
            Child::Node(params(&[key.as_str()])),
            Child::Node(Node::new(NodeKind::Begin, statements)),
        ],
    )
}

/// The pattern of `gsub` with the global flag set.
fn global_pattern(pattern: &Node) -> Node {
    if pattern.is(NodeKind::Regexp) {
        let mut children = Vec::with_capacity(pattern.children().len() + 1);
        let mut flagged = false;
        for child in pattern.children() {
            match child {
                Child::Node(opts) if opts.is(NodeKind::Regopt) => {
                    let mut flags = opts.children().to_vec();
                    if !flags.iter().any(|flag| flag.as_sym() == Some("g")) {
                        flags.push(Child::sym("g"));
                    }
                    children.push(Child::Node(opts.updated(None, flags)));
                    flagged = true;
                }
                Child::Lit(Literal::Regex { pattern, flags }) => {
                    let flags = if flags.contains('g') { flags.clone() } else { format!("{flags}g") };
                    children.push(Child::Lit(Literal::Regex { pattern: pattern.clone(), flags }));
                    flagged = true;
                }
                other => children.push(other.clone()),
            }
        }
        if !flagged {
            children.push(Child::Node(Node::new(NodeKind::Regopt, vec![Child::sym("g")])));
        }
        return pattern.updated(None, children);
    }

    if let Some(text) = pattern.str_at(0).filter(|_| pattern.is(NodeKind::Str)) {
        return pattern.updated(
            Some(NodeKind::Regexp),
            vec![
                Child::Node(string(&escape_regex(text))),
                Child::Node(Node::new(NodeKind::Regopt, vec![Child::sym("g")])),
            ],
        );
    }
    pattern.clone()
}

fn escape_regex(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '^' | '$' | '.' | '|' | '?' | '*' | '+' | '(' | ')' | '[' | ']' | '{' | '}' | '/') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

// =============================================================================
// Node builders
// =============================================================================

fn konst(name: &str) -> Node {
    Node::new(NodeKind::Const, vec![Child::NIL, Child::sym(name)])
}

fn lvar(name: &str) -> Node {
    Node::new(NodeKind::Lvar, vec![Child::sym(name)])
}

fn int(value: i64) -> Node {
    Node::new(NodeKind::Int, vec![Child::from(value)])
}

fn string(value: &str) -> Node {
    Node::new(NodeKind::Str, vec![Child::str(value)])
}

fn attr(receiver: Node, name: &str) -> Node {
    Node::new(NodeKind::Attr, vec![Child::Node(receiver), Child::sym(name)])
}

fn send(receiver: Option<Node>, method: &str, args: Vec<Node>) -> Node {
    let mut children = vec![Child::from(receiver), Child::sym(method)];
    children.extend(args.into_iter().map(Child::Node));
    Node::new(NodeKind::Send, children)
}

fn params(names: &[&str]) -> Node {
    Node::new(
        NodeKind::Args,
        names
            .iter()
            .map(|name| Child::Node(Node::new(NodeKind::Arg, vec![Child::sym(*name)])))
            .collect(),
    )
}

fn call_children(receiver: Option<Node>, method: &str, args: &[&Node]) -> Vec<Child> {
    let mut children = vec![Child::from(receiver), Child::sym(method)];
    children.extend(args.iter().map(|arg| Child::Node((*arg).clone())));
    children
}

/// A copy of `call` (a `send`) with a new method name and arguments.
fn rename_call(call: &Node, receiver: &Node, method: &str, args: Vec<Node>) -> Node {
    let mut children = vec![Child::Node(receiver.clone()), Child::sym(method)];
    children.extend(args.into_iter().map(Child::Node));
    call.updated(None, children)
}

impl Filter for FunctionsFilter {
    fn name(&self) -> &'static str {
        "functions"
    }

    fn handles(&self, kind: NodeKind) -> bool {
        HANDLERS.handles(kind)
    }

    fn rewrite(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        HANDLERS.dispatch(self, node, chain)
    }
}
