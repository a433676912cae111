//! What goes into a conversion and what comes out.

use r2js_ast::Node;
use r2js_common::SourceMap;
use std::fmt;

/// Input to [`crate::Converter::convert`].
#[derive(Clone, Debug)]
pub enum Input {
    /// Text handed to the converter's parser adapter.
    Source(String),
    /// A tree parsed elsewhere. `source` is the Ruby text it came from, if
    /// known; it drives layout detection and is embedded in source maps.
    Ast { ast: Node, source: Option<String> },
}

impl Input {
    pub fn ast(ast: Node) -> Self {
        Input::Ast { ast, source: None }
    }

    pub fn ast_with_source(ast: Node, source: impl Into<String>) -> Self {
        Input::Ast {
            ast,
            source: Some(source.into()),
        }
    }
}

impl From<Node> for Input {
    fn from(ast: Node) -> Self {
        Input::ast(ast)
    }
}

impl From<&Node> for Input {
    fn from(ast: &Node) -> Self {
        Input::ast(ast.clone())
    }
}

impl From<String> for Input {
    fn from(text: String) -> Self {
        Input::Source(text)
    }
}

impl From<&str> for Input {
    fn from(text: &str) -> Self {
        Input::Source(text.to_string())
    }
}

/// Result of one conversion.
#[derive(Clone, Debug)]
pub struct Conversion {
    /// Generated JavaScript, without a trailing newline.
    pub text: String,
    /// The tree after the filter pipeline ran.
    pub ast: Node,
    pub sourcemap: Option<SourceMap>,
    /// Text after the template marker line.
    pub template: Option<String>,
}

impl Conversion {
    pub fn sourcemap_json(&self) -> Option<String> {
        self.sourcemap.as_ref().map(SourceMap::to_json)
    }
}

impl fmt::Display for Conversion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.text)
    }
}
