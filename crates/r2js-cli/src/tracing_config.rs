//! Tracing configuration for the `r2js` binary.
//!
//! Three output formats, selected by `R2JS_LOG_FORMAT`:
//!
//! - `text` (default): flat `tracing-subscriber` lines
//! - `tree`: hierarchical indented output via `tracing-tree`
//! - `json`: one JSON object per span/event
//!
//! ```bash
//! R2JS_LOG=debug R2JS_LOG_FORMAT=tree r2js tree.json
//! R2JS_LOG="r2js_emitter=trace" r2js tree.json
//! ```
//!
//! Nothing is installed unless `R2JS_LOG` (or `RUST_LOG`) is set.

use tracing_subscriber::prelude::*;
use tracing_subscriber::{EnvFilter, Registry, fmt};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Text,
    Tree,
    Json,
}

impl LogFormat {
    /// Parse a format name; anything unrecognized is `Text`.
    pub fn parse(value: &str) -> Self {
        match value.to_lowercase().as_str() {
            "tree" => Self::Tree,
            "json" => Self::Json,
            _ => Self::Text,
        }
    }

    fn from_env() -> Self {
        Self::parse(&std::env::var("R2JS_LOG_FORMAT").unwrap_or_default())
    }
}

/// `R2JS_LOG` takes precedence over `RUST_LOG`.
fn build_filter() -> EnvFilter {
    if let Ok(val) = std::env::var("R2JS_LOG") {
        EnvFilter::builder().parse_lossy(val)
    } else {
        EnvFilter::from_default_env()
    }
}

/// Install the global subscriber. All output goes to stderr so it never
/// mixes with the JavaScript on stdout.
pub fn init_tracing() {
    let has_r2js_log = std::env::var("R2JS_LOG").is_ok();
    let has_rust_log = std::env::var("RUST_LOG").is_ok();
    if !has_r2js_log && !has_rust_log {
        return;
    }

    let filter = build_filter();
    match LogFormat::from_env() {
        LogFormat::Tree => {
            let tree_layer = tracing_tree::HierarchicalLayer::default()
                .with_indent_amount(2)
                .with_indent_lines(true)
                .with_deferred_spans(true)
                .with_span_retrace(true)
                .with_targets(true);

            Registry::default().with(filter).with(tree_layer).init();
        }
        LogFormat::Json => {
            let json_layer = fmt::layer().json().with_writer(std::io::stderr);

            Registry::default().with(filter).with(json_layer).init();
        }
        LogFormat::Text => {
            tracing_subscriber::fmt()
                .with_env_filter(filter)
                .with_writer(std::io::stderr)
                .init();
        }
    }
}
