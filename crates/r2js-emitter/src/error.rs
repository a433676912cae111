//! Typed conversion errors.
//!
//! Every failure aborts the whole conversion. Errors carry the node kind,
//! the node's location when it had one, and the stage that raised them
//! (`parse`, `filter:<name>`, `emit`).

use r2js_ast::{NodeKind, SyntaxError};
use r2js_common::{EsLevel, SourceSpan};

pub type Result<T, E = ConvertError> = std::result::Result<T, E>;

#[derive(Debug, thiserror::Error)]
pub enum ConvertError {
    #[error("syntax error: {0}")]
    Syntax(#[from] SyntaxError),

    #[error("{stage}: {}{}", describe_unsupported(.feature, .required, .configured), at(.location))]
    UnsupportedConstruct {
        kind: NodeKind,
        feature: String,
        /// Lowest tier that could express the construct, if any.
        required: Option<EsLevel>,
        configured: EsLevel,
        location: Option<SourceSpan>,
        stage: String,
    },

    #[error("{stage}: {message} (node `{kind}`){}", at(.location))]
    Pipeline {
        kind: NodeKind,
        message: String,
        location: Option<SourceSpan>,
        stage: String,
    },

    #[error("unknown filter `{name}`")]
    UnknownFilter { name: String },

    #[error("invalid options: {0}")]
    Config(String),
}

fn describe_unsupported(feature: &str, required: &Option<EsLevel>, configured: &EsLevel) -> String {
    match required {
        Some(required) => format!("{feature} requires {required} (eslevel is {configured})"),
        None => format!("{feature} has no JavaScript equivalent"),
    }
}

fn at(location: &Option<SourceSpan>) -> String {
    location
        .as_ref()
        .map(|span| format!(" at {span}"))
        .unwrap_or_default()
}

impl ConvertError {
    /// The stage that raised the error.
    pub fn stage(&self) -> &str {
        match self {
            ConvertError::Syntax(_) => "parse",
            ConvertError::UnsupportedConstruct { stage, .. }
            | ConvertError::Pipeline { stage, .. } => stage,
            ConvertError::UnknownFilter { .. } | ConvertError::Config(_) => "configure",
        }
    }

    pub fn location(&self) -> Option<&SourceSpan> {
        match self {
            ConvertError::Syntax(err) => err.location.as_ref(),
            ConvertError::UnsupportedConstruct { location, .. }
            | ConvertError::Pipeline { location, .. } => location.as_ref(),
            ConvertError::UnknownFilter { .. } | ConvertError::Config(_) => None,
        }
    }

    pub fn kind(&self) -> Option<NodeKind> {
        match self {
            ConvertError::UnsupportedConstruct { kind, .. } | ConvertError::Pipeline { kind, .. } => {
                Some(*kind)
            }
            _ => None,
        }
    }

    pub fn is_unsupported(&self) -> bool {
        matches!(self, ConvertError::UnsupportedConstruct { .. })
    }

    pub fn is_pipeline(&self) -> bool {
        matches!(self, ConvertError::Pipeline { .. })
    }
}
