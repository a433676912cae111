//! Node model for the r2js translator.
//!
//! This crate defines the tree every stage works on:
//! - `NodeKind` - the closed set of node categories
//! - `Node` / `Child` / `Literal` - immutable nodes with structural equality
//! - `ParserAdapter` / `SyntaxError` - the contract with the external parser
//! - `JsonAstParser` - an adapter for trees shipped as JSON

pub mod kind;
pub use kind::NodeKind;

pub mod literal;
pub use literal::Literal;

pub mod node;
pub use node::{Child, Node};

pub mod parser;
pub use parser::{ParserAdapter, SyntaxError};

pub mod json;
pub use json::{JsonAstParser, node_from_json};

#[cfg(test)]
#[path = "tests/node_tests.rs"]
mod node_tests;

#[cfg(test)]
#[path = "tests/kind_tests.rs"]
mod kind_tests;
