//! The contract with the external front-end parser.

use crate::node::Node;
use r2js_common::SourceSpan;

/// A parse failure reported by a [`ParserAdapter`].
#[derive(Clone, Debug, PartialEq, Eq, thiserror::Error)]
#[error("{message}{}", format_location(.location))]
pub struct SyntaxError {
    pub message: String,
    pub location: Option<SourceSpan>,
}

fn format_location(location: &Option<SourceSpan>) -> String {
    location
        .as_ref()
        .map(|span| format!(" at {span}"))
        .unwrap_or_default()
}

impl SyntaxError {
    pub fn new(message: impl Into<String>) -> Self {
        SyntaxError {
            message: message.into(),
            location: None,
        }
    }

    #[must_use]
    pub fn at(mut self, location: SourceSpan) -> Self {
        self.location = Some(location);
        self
    }
}

/// Turns raw source text into a [`Node`] tree.
///
/// Implementations must be shareable across threads; the facade holds one
/// behind an `Arc` and may be used from several threads at once.
pub trait ParserAdapter: Send + Sync {
    fn parse(&self, source: &str, file_name: Option<&str>) -> Result<Node, SyntaxError>;

    /// Whether the text handed to [`Self::parse`] is the Ruby source itself.
    /// Adapters reading a serialized tree return `false`, so the text is not
    /// used for layout detection or embedded in source maps.
    fn reads_source_text(&self) -> bool {
        true
    }
}

impl<F> ParserAdapter for F
where
    F: Fn(&str, Option<&str>) -> Result<Node, SyntaxError> + Send + Sync,
{
    fn parse(&self, source: &str, file_name: Option<&str>) -> Result<Node, SyntaxError> {
        self(source, file_name)
    }
}
