//! `camelcase`: rename snake_case identifiers to camelCase.
//!
//! Applies to locals, parameters, instance variables, method names (both
//! definitions and calls) and symbols. Leading underscores and a trailing
//! `?`, `!` or `=` are preserved.

use super::{Chain, Filter, FilterResult, HandlerTable};
use once_cell::sync::Lazy;
use r2js_ast::{Child, Node, NodeKind};
use std::cell::RefCell;
use std::collections::BTreeSet;
use tracing::debug;

static HANDLERS: Lazy<HandlerTable<CamelCaseFilter>> = Lazy::new(|| {
    let mut table = HandlerTable::new();
    for kind in [
        NodeKind::Lvar,
        NodeKind::Lvasgn,
        NodeKind::Ivar,
        NodeKind::Ivasgn,
        NodeKind::Arg,
        NodeKind::Optarg,
        NodeKind::Restarg,
        NodeKind::Kwarg,
        NodeKind::Kwoptarg,
        NodeKind::Blockarg,
        NodeKind::Sym,
        NodeKind::Def,
    ] {
        table = table.on(kind, CamelCaseFilter::rename_slot::<0>);
    }
    table
        .on(NodeKind::Defs, CamelCaseFilter::rename_slot::<1>)
        .on(NodeKind::Send, CamelCaseFilter::rename_slot::<1>)
        .on(NodeKind::Csend, CamelCaseFilter::rename_slot::<1>)
});

/// Receiver-less calls the printer recognizes by their Ruby spelling.
const CLASS_MACROS: &[&str] = &[
    "attr_accessor",
    "attr_reader",
    "attr_writer",
    "alias_method",
    "define_method",
    "module_function",
];

#[derive(Default)]
pub struct CamelCaseFilter {
    renamed: RefCell<BTreeSet<String>>,
}

impl CamelCaseFilter {
    pub fn new() -> Self {
        CamelCaseFilter::default()
    }

    /// Rename the symbol at child `SLOT`, then let the rest of the chain see
    /// the renamed node.
    fn rename_slot<const SLOT: usize>(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        let Some(name) = node.sym_at(SLOT) else {
            return Ok(None);
        };
        if SLOT == 1 && node.child(0).is_some_and(Child::is_nil) && CLASS_MACROS.contains(&name) {
            return Ok(None);
        }
        let Some(renamed) = to_camel_case(name) else {
            return Ok(None);
        };
        self.renamed.borrow_mut().insert(name.to_string());

        let mut children = node.children().to_vec();
        children[SLOT] = Child::sym(renamed);
        let updated = node.updated(None, children);
        chain.next(&updated).map(Some)
    }
}

/// `foo_bar?` → `fooBar?`. Returns `None` when nothing would change.
pub fn to_camel_case(name: &str) -> Option<String> {
    let prefix_len = name.len() - name.trim_start_matches(['@', '$', '_']).len();
    let (prefix, rest) = name.split_at(prefix_len);
    let core = rest.trim_end_matches(['?', '!', '=']);
    let suffix = &rest[core.len()..];
    if !core.contains('_') {
        return None;
    }

    let mut out = String::with_capacity(name.len());
    out.push_str(prefix);
    let mut chars = core.chars().peekable();
    while let Some(ch) = chars.next() {
        if ch == '_'
            && let Some(&next) = chars.peek()
            && next.is_ascii_lowercase()
        {
            out.push(next.to_ascii_uppercase());
            chars.next();
        } else {
            out.push(ch);
        }
    }
    out.push_str(suffix);
    (out != name).then_some(out)
}

impl Filter for CamelCaseFilter {
    fn name(&self) -> &'static str {
        "camelcase"
    }

    fn handles(&self, kind: NodeKind) -> bool {
        HANDLERS.handles(kind)
    }

    fn rewrite(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        HANDLERS.dispatch(self, node, chain)
    }

    fn finish(&self) {
        let renamed = self.renamed.borrow();
        if !renamed.is_empty() {
            debug!(count = renamed.len(), names = ?*renamed, "camelcase renamed identifiers");
        }
    }
}
