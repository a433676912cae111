//! Ruby-to-JavaScript conversion.
//!
//! ```ignore
//! use r2js_core::{EsLevel, Options, convert};
//!
//! let options = Options::default().with_eslevel(EsLevel::ES2015);
//! let out = convert(ast, &options)?;
//! println!("{out}");
//! ```
//!
//! The facade composes the lower crates:
//! - `r2js-ast` - the tree and the parser adapter contract
//! - `r2js-emitter` - filters, printer and whitespace normalizer
//! - `r2js-common` - feature tiers, spans and source maps

mod conversion;
pub use conversion::{Conversion, Input};

mod converter;
pub use converter::{Converter, convert};

mod mapping;

mod template;
pub use template::split_template;

// Re-exports so callers need only this crate
pub use r2js_ast::{Child, JsonAstParser, Literal, Node, NodeKind, ParserAdapter, SyntaxError, s};
pub use r2js_common::{Comparison, EsLevel, LogicalOperator, Mapping, SourceMap, SourceSpan};
pub use r2js_emitter::{
    Chain, ConvertError, Filter, FilterFactory, FilterResult, FilterSpec, HandlerTable, Options, Registry, Result,
};

#[cfg(test)]
#[path = "tests/template_tests.rs"]
mod template_tests;

#[cfg(test)]
#[path = "tests/mapping_tests.rs"]
mod mapping_tests;
