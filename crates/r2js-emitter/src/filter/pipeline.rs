//! Pipeline Builder: composes filters into one chain.

use super::{Chain, Filter, Registry};
use crate::error::Result;
use crate::options::{FilterSpec, Options};
use r2js_ast::Node;
use tracing::debug;

/// Counters from one pipeline run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PipelineStats {
    /// Calls to `Chain::process` (each node once per traversal that reaches it).
    pub nodes_visited: usize,
    /// Handler invocations across all filters, declined ones included.
    pub handler_calls: usize,
}

/// An ordered list of filter instances, outermost first.
///
/// A pipeline is built for a single conversion: filters keep scratch state
/// for the duration of one walk.
pub struct Pipeline {
    filters: Vec<Box<dyn Filter>>,
}

impl Pipeline {
    pub fn new(filters: Vec<Box<dyn Filter>>) -> Self {
        Pipeline { filters }
    }

    /// Resolve `specs` against `registry`, instantiating each filter.
    pub fn from_specs(specs: &[FilterSpec], registry: &Registry) -> Result<Self> {
        let filters = specs
            .iter()
            .map(|spec| match spec {
                FilterSpec::Named(name) => registry.create(name),
                FilterSpec::Custom(factory) => Ok(factory()),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Pipeline { filters })
    }

    /// The filters named by `options.filters`, or the registry defaults.
    pub fn from_options(options: &Options, registry: &Registry) -> Result<Self> {
        match &options.filters {
            Some(specs) => Pipeline::from_specs(specs, registry),
            None => registry.create_defaults().map(Pipeline::new),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.filters.is_empty()
    }

    pub fn filter_names(&self) -> Vec<&'static str> {
        self.filters.iter().map(|filter| filter.name()).collect()
    }

    pub fn run(&self, ast: &Node, options: &Options) -> Result<Node> {
        self.run_with_stats(ast, options).map(|(node, _)| node)
    }

    #[tracing::instrument(level = "debug", skip_all, fields(filters = self.filters.len()))]
    pub fn run_with_stats(&self, ast: &Node, options: &Options) -> Result<(Node, PipelineStats)> {
        if self.filters.is_empty() {
            return Ok((ast.clone(), PipelineStats::default()));
        }

        let mut chain = Chain::new(&self.filters, options);
        let rewritten = chain.process(ast)?;
        let stats = chain.stats();
        for filter in &self.filters {
            filter.finish();
        }

        debug!(
            filters = ?self.filter_names(),
            nodes = stats.nodes_visited,
            handler_calls = stats.handler_calls,
            "pipeline complete"
        );
        Ok((rewritten, stats))
    }
}
