//! `return`: mark method and block bodies as implicitly returning their last
//! statement.

use super::{Chain, Filter, FilterResult, HandlerTable};
use once_cell::sync::Lazy;
use r2js_ast::{Child, Node, NodeKind};

static HANDLERS: Lazy<HandlerTable<ReturnFilter>> = Lazy::new(|| {
    HandlerTable::new()
        .on(NodeKind::Def, ReturnFilter::on_def)
        .on(NodeKind::Defs, ReturnFilter::on_def)
        .on(NodeKind::Block, ReturnFilter::on_block)
});

#[derive(Default)]
pub struct ReturnFilter;

impl ReturnFilter {
    pub fn new() -> Self {
        ReturnFilter
    }

    fn on_def(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        let (name_index, body_index) = if node.is(NodeKind::Defs) { (1, 3) } else { (0, 2) };
        let Some(name) = node.sym_at(name_index) else {
            return Err(chain.malformed(node, "method definition without a name"));
        };
        // Constructors and setters have no useful result.
        if name == "initialize" || (name.ends_with('=') && !is_operator(name)) {
            return Ok(None);
        }
        let processed = chain.next(node)?;
        Ok(Some(wrap_body(&processed, body_index)))
    }

    fn on_block(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        let processed = chain.next(node)?;
        if !processed.is(NodeKind::Block) {
            return Ok(Some(processed));
        }
        Ok(Some(wrap_body(&processed, 2)))
    }
}

fn is_operator(name: &str) -> bool {
    matches!(name, "==" | "!=" | "<=" | ">=" | "===" | "[]=")
}

fn wrap_body(node: &Node, body_index: usize) -> Node {
    let Some(body) = node.node_at(body_index) else {
        return node.clone();
    };
    if body.is(NodeKind::Autoreturn) {
        return node.clone();
    }
    let mut children = node.children().to_vec();
    children[body_index] = Child::Node(body.updated(
        Some(NodeKind::Autoreturn),
        vec![Child::Node(body.clone())],
    ));
    node.updated(None, children)
}

impl Filter for ReturnFilter {
    fn name(&self) -> &'static str {
        "return"
    }

    fn handles(&self, kind: NodeKind) -> bool {
        HANDLERS.handles(kind)
    }

    fn rewrite(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        HANDLERS.dispatch(self, node, chain)
    }
}
