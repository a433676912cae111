//! `esm`: ES module syntax.
//!
//! - `import "mod"` / `require "mod"` → `import "mod"`
//! - `import X, from: "mod"` → `import X from "mod"`
//! - `import [A, B], from: "mod"` → `import { A, B } from "mod"`
//! - `export def f` / `export default X`
//! - with `autoexports`, every top-level `def`, `class`, `module` and
//!   constant assignment is exported.

use super::{Chain, Filter, FilterResult, HandlerTable};
use once_cell::sync::Lazy;
use r2js_ast::{Child, Node, NodeKind};
use tracing::trace;

static HANDLERS: Lazy<HandlerTable<EsmFilter>> = Lazy::new(|| {
    HandlerTable::new()
        .on(NodeKind::Send, EsmFilter::on_send)
        .on(NodeKind::Def, EsmFilter::on_definition)
        .on(NodeKind::Class, EsmFilter::on_definition)
        .on(NodeKind::Module, EsmFilter::on_definition)
        .on(NodeKind::Casgn, EsmFilter::on_definition)
});

#[derive(Default)]
pub struct EsmFilter;

impl EsmFilter {
    pub fn new() -> Self {
        EsmFilter
    }

    fn on_send(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        if !node.child(0).is_some_and(Child::is_nil) {
            return Ok(None);
        }
        let args = node.children().get(2..).unwrap_or(&[]);
        match node.sym_at(1) {
            Some("import") => self.import(node, args, chain),
            Some("require") if chain.at_top_level() => {
                let [Child::Node(source)] = args else {
                    return Ok(None);
                };
                if !source.is(NodeKind::Str) {
                    return Ok(None);
                }
                Ok(Some(node.updated(
                    Some(NodeKind::Import),
                    vec![Child::Node(source.clone())],
                )))
            }
            Some("export") => {
                let [Child::Node(target)] = args else {
                    return Ok(None);
                };
                let (default, target) = match default_export(target) {
                    Some(inner) => (true, inner),
                    None => (false, target),
                };
                let target = chain.process(target)?;
                Ok(Some(node.updated(
                    Some(NodeKind::Export),
                    vec![Child::from(default), Child::Node(target)],
                )))
            }
            _ => Ok(None),
        }
    }

    fn import(&self, node: &Node, args: &[Child], chain: &mut Chain<'_>) -> FilterResult {
        match args {
            [Child::Node(source)] if source.is(NodeKind::Str) => Ok(Some(node.updated(
                Some(NodeKind::Import),
                vec![Child::Node(source.clone())],
            ))),
            [Child::Node(binding), Child::Node(options)] if options.is(NodeKind::Hash) => {
                let Some(source) = hash_value(options, "from") else {
                    return Err(chain.malformed(node, "import is missing `from:`"));
                };
                if !binding.is(NodeKind::Const) && !binding.is(NodeKind::Array) {
                    return Err(chain.malformed(node, "import binding must be a constant or an array of constants"));
                }
                Ok(Some(node.updated(
                    Some(NodeKind::Import),
                    vec![Child::Node(source), Child::Node(binding.clone())],
                )))
            }
            _ => Ok(None),
        }
    }

    fn on_definition(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        if !chain.options().autoexports || !chain.at_top_level() {
            return Ok(None);
        }
        let processed = chain.next(node)?;
        trace!(kind = %node.kind(), "autoexport");
        Ok(Some(Node::with_location(
            NodeKind::Export,
            vec![Child::from(false), Child::Node(processed)],
            node.location().cloned(),
        )))
    }
}

/// `default X` parses as `(send nil :default X)`.
fn default_export(node: &Node) -> Option<&Node> {
    if node.is(NodeKind::Send)
        && node.child(0).is_some_and(Child::is_nil)
        && node.sym_at(1) == Some("default")
        && node.children().len() == 3
    {
        node.node_at(2)
    } else {
        None
    }
}

fn hash_value(hash: &Node, key: &str) -> Option<Node> {
    hash.child_nodes()
        .filter(|pair| pair.is(NodeKind::Pair))
        .find(|pair| pair.node_at(0).and_then(|k| k.sym_at(0)) == Some(key))
        .and_then(|pair| pair.node_at(1).cloned())
}

impl Filter for EsmFilter {
    fn name(&self) -> &'static str {
        "esm"
    }

    fn handles(&self, kind: NodeKind) -> bool {
        HANDLERS.handles(kind)
    }

    fn rewrite(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        HANDLERS.dispatch(self, node, chain)
    }
}
