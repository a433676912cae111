//! Pass interface.
//!
//! A [`Filter`] offers rewrites for the node kinds it declares. Filters are
//! composed by a [`Pipeline`] into a chain of responsibility: for each node,
//! filters are consulted in list order (the first-listed filter is the
//! outermost); the first one whose handler returns `Some` wins. When every
//! filter declines, the default traversal rewrites the children through the
//! full chain again and rebuilds the node.
//!
//! Handlers may call [`Chain::next`] to hand the *same* node to the filters
//! after them (and finally to the default traversal), then post-process the
//! result. This is how two filters cooperate on one node.

use crate::error::{ConvertError, Result};
use crate::options::Options;
use r2js_ast::{Child, Node, NodeKind};
use r2js_common::{EsLevel, limits};
use rustc_hash::FxHashMap;
use std::sync::Arc;
use tracing::trace;

pub mod camelcase;
pub mod esm;
pub mod functions;
pub mod pipeline;
pub mod registry;
pub mod returns;

pub use pipeline::{Pipeline, PipelineStats};
pub use registry::Registry;

/// `Ok(None)` declines the node; the chain moves on to the next filter.
pub type FilterResult = Result<Option<Node>>;

/// Creates a fresh filter instance for one conversion.
pub type FilterFactory = Arc<dyn Fn() -> Box<dyn Filter> + Send + Sync>;

/// A tree-rewriting pass.
///
/// Instances live for exactly one conversion, so per-walk scratch state
/// (kept behind `Cell`/`RefCell`) never leaks between calls.
pub trait Filter {
    /// Registry name, also used in error stages (`filter:<name>`).
    fn name(&self) -> &'static str;

    /// Whether this filter has a handler for `kind`.
    fn handles(&self, kind: NodeKind) -> bool;

    /// Rewrite `node`, or return `Ok(None)` to decline.
    fn rewrite(&self, node: &Node, chain: &mut Chain<'_>) -> FilterResult;

    /// Called once after the walk completes.
    fn finish(&self) {}
}

/// Handler signature used by [`HandlerTable`].
pub type Handler<F> = fn(&F, &Node, &mut Chain<'_>) -> FilterResult;

/// Kind-to-handler table, the usual way a filter declares its handlers.
pub struct HandlerTable<F> {
    handlers: FxHashMap<NodeKind, Handler<F>>,
}

impl<F> HandlerTable<F> {
    pub fn new() -> Self {
        HandlerTable {
            handlers: FxHashMap::default(),
        }
    }

    #[must_use]
    pub fn on(mut self, kind: NodeKind, handler: Handler<F>) -> Self {
        self.handlers.insert(kind, handler);
        self
    }

    pub fn handles(&self, kind: NodeKind) -> bool {
        self.handlers.contains_key(&kind)
    }

    pub fn dispatch(&self, filter: &F, node: &Node, chain: &mut Chain<'_>) -> FilterResult {
        match self.handlers.get(&node.kind()) {
            Some(handler) => handler(filter, node, chain),
            None => Ok(None),
        }
    }
}

/// The composed visitor handed to every handler.
pub struct Chain<'p> {
    filters: &'p [Box<dyn Filter>],
    options: &'p Options,
    /// Index of the filter whose handler is currently running.
    stage: usize,
    depth: u32,
    /// Kinds of the nodes being processed, outermost first; the last entry is
    /// the current node.
    ancestors: Vec<NodeKind>,
    stats: PipelineStats,
}

impl<'p> Chain<'p> {
    pub fn new(filters: &'p [Box<dyn Filter>], options: &'p Options) -> Self {
        Chain {
            filters,
            options,
            stage: 0,
            depth: 0,
            ancestors: Vec::new(),
            stats: PipelineStats::default(),
        }
    }

    pub fn options(&self) -> &'p Options {
        self.options
    }

    pub fn eslevel(&self) -> EsLevel {
        self.options.eslevel
    }

    /// Kind of the parent of the node currently being processed.
    pub fn parent(&self) -> Option<NodeKind> {
        self.ancestors.iter().rev().nth(1).copied()
    }

    /// Kinds enclosing the current node, outermost first (the node itself
    /// excluded).
    pub fn ancestors(&self) -> &[NodeKind] {
        let len = self.ancestors.len().saturating_sub(1);
        &self.ancestors[..len]
    }

    /// Whether the current node sits at the top level of the program (only
    /// `begin` sequences between it and the root).
    pub fn at_top_level(&self) -> bool {
        self.ancestors().iter().all(|kind| *kind == NodeKind::Begin)
    }

    pub fn stats(&self) -> PipelineStats {
        self.stats
    }

    /// Process `node` through the whole chain, starting from the first filter.
    pub fn process(&mut self, node: &Node) -> Result<Node> {
        if self.depth >= limits::MAX_AST_DEPTH {
            return Err(ConvertError::Pipeline {
                kind: node.kind(),
                message: format!("tree nesting exceeds {} levels", limits::MAX_AST_DEPTH),
                location: node.location().cloned(),
                stage: self.stage_name(),
            });
        }
        self.depth += 1;
        self.ancestors.push(node.kind());
        self.stats.nodes_visited += 1;

        let saved = self.stage;
        let result = self.dispatch(node, 0);
        self.stage = saved;

        self.ancestors.pop();
        self.depth -= 1;
        result
    }

    /// Process a child slot; literal children pass through unchanged.
    pub fn process_child(&mut self, child: &Child) -> Result<Child> {
        match child {
            Child::Node(node) => Ok(Child::Node(self.process(node)?)),
            Child::Lit(_) => Ok(child.clone()),
        }
    }

    pub fn process_all<'n>(&mut self, nodes: impl IntoIterator<Item = &'n Node>) -> Result<Vec<Node>> {
        nodes.into_iter().map(|node| self.process(node)).collect()
    }

    /// Hand `node` to the filters after the one currently running, falling
    /// back to the default traversal.
    pub fn next(&mut self, node: &Node) -> Result<Node> {
        let saved = self.stage;
        let result = self.dispatch(node, saved + 1);
        self.stage = saved;
        result
    }

    /// Rewrite every child through the full chain and rebuild the node.
    ///
    /// Returns the original node (same allocation) when no child changed,
    /// so locations and sharing are preserved.
    pub fn default_traversal(&mut self, node: &Node) -> Result<Node> {
        let mut changed = false;
        let mut children = Vec::with_capacity(node.children().len());
        for child in node.children() {
            match child {
                Child::Node(inner) => {
                    let rewritten = self.process(inner)?;
                    changed |= !Node::ptr_eq(inner, &rewritten);
                    children.push(Child::Node(rewritten));
                }
                Child::Lit(_) => children.push(child.clone()),
            }
        }
        if changed {
            Ok(node.updated(None, children))
        } else {
            Ok(node.clone())
        }
    }

    fn dispatch(&mut self, node: &Node, from: usize) -> Result<Node> {
        let filters = self.filters;
        for (index, filter) in filters.iter().enumerate().skip(from) {
            if !filter.handles(node.kind()) {
                continue;
            }
            self.stage = index;
            self.stats.handler_calls += 1;
            if let Some(rewritten) = filter.rewrite(node, self)? {
                trace!(filter = filter.name(), kind = %node.kind(), "rewrote node");
                return Ok(rewritten);
            }
        }
        self.default_traversal(node)
    }

    /// `filter:<name>` for the filter currently running.
    pub fn stage_name(&self) -> String {
        match self.filters.get(self.stage) {
            Some(filter) => format!("filter:{}", filter.name()),
            None => "filter".to_string(),
        }
    }

    pub fn unsupported(
        &self,
        node: &Node,
        feature: impl Into<String>,
        required: Option<EsLevel>,
    ) -> ConvertError {
        ConvertError::UnsupportedConstruct {
            kind: node.kind(),
            feature: feature.into(),
            required,
            configured: self.options.eslevel,
            location: node.location().cloned(),
            stage: self.stage_name(),
        }
    }

    pub fn malformed(&self, node: &Node, message: impl Into<String>) -> ConvertError {
        ConvertError::Pipeline {
            kind: node.kind(),
            message: message.into(),
            location: node.location().cloned(),
            stage: self.stage_name(),
        }
    }
}
