//! Rewriting and printing for the r2js translator.
//!
//! This crate turns a Ruby tree into JavaScript text:
//! - `Options` / `FilterSpec` - per-conversion configuration
//! - `Filter` / `Chain` / `Registry` / `Pipeline` - tree-to-tree passes
//! - `Printer` - the code generator, writing tokens into `output::Line`s
//! - `normalize` - vertical whitespace for multi-line output
//! - `ConvertError` - the typed failure every stage reports

pub mod error;
pub use error::{ConvertError, Result};

pub mod options;
pub use options::{FilterSpec, Options};

// Passes and their composition
pub mod filter;
pub use filter::{Chain, Filter, FilterFactory, FilterResult, HandlerTable, Pipeline, PipelineStats, Registry};

// Output line model and rendering
pub mod output;
pub use output::{GeneratedMapping, Line, Origin, Rendered, render};

pub mod normalizer;
pub use normalizer::normalize;

mod emitter;
pub use emitter::Printer;

use r2js_ast::Node;

/// Whether output should be laid out one statement per line.
///
/// True when the Ruby source has more than one line, or, without source
/// text, when the tree's locations cover more than one line.
pub fn detect_vertical(ast: &Node, source: Option<&str>) -> bool {
    if let Some(source) = source {
        return source.trim().contains('\n');
    }
    let mut first_line = None;
    let mut vertical = false;
    ast.walk(&mut |node| {
        let Some(span) = node.location() else {
            return;
        };
        if span.is_multiline() {
            vertical = true;
        }
        match first_line {
            None => first_line = Some(span.start_line),
            Some(line) if line != span.start_line => vertical = true,
            Some(_) => {}
        }
    });
    vertical
}

#[cfg(test)]
#[path = "tests/normalizer_tests.rs"]
mod normalizer_tests;

#[cfg(test)]
#[path = "tests/output_tests.rs"]
mod output_tests;

#[cfg(test)]
#[path = "tests/camelcase_tests.rs"]
mod camelcase_tests;

#[cfg(test)]
#[path = "tests/vertical_tests.rs"]
mod vertical_tests;
