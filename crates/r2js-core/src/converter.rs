//! The conversion facade.
//!
//! One call runs the whole translation:
//! 1. parse raw text through the [`ParserAdapter`] (splitting off template
//!    text first when a marker is configured)
//! 2. rewrite the tree with the filter pipeline built from the options
//! 3. print it, one statement per line when the source spans several lines
//! 4. normalize vertical whitespace, prefix `"use strict"` if asked
//! 5. render, and build a source map when one was requested
//!
//! A [`Converter`] holds no per-call state, so one instance can serve many
//! threads at once.

use crate::conversion::{Conversion, Input};
use crate::mapping::build_source_map;
use crate::template::split_template;
use r2js_ast::{JsonAstParser, Node, ParserAdapter};
use r2js_emitter::output::Token;
use r2js_emitter::{Line, Options, Pipeline, Printer, Registry, Result, detect_vertical, normalize, render};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, trace};

const USE_STRICT: &str = "\"use strict\"";

/// Filter registry plus parser adapter.
///
/// The default converter uses the process-wide built-in registry and reads
/// trees serialized as JSON.
#[derive(Clone)]
pub struct Converter {
    registry: Arc<Registry>,
    parser: Arc<dyn ParserAdapter>,
}

impl Default for Converter {
    fn default() -> Self {
        Converter::new()
    }
}

impl fmt::Debug for Converter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Converter")
            .field("filters", &self.registry.names())
            .finish_non_exhaustive()
    }
}

impl Converter {
    pub fn new() -> Self {
        Converter {
            registry: Registry::global(),
            parser: Arc::new(JsonAstParser::new()),
        }
    }

    #[must_use]
    pub fn with_registry(mut self, registry: Arc<Registry>) -> Self {
        self.registry = registry;
        self
    }

    #[must_use]
    pub fn with_parser(mut self, parser: impl ParserAdapter + 'static) -> Self {
        self.parser = Arc::new(parser);
        self
    }

    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    #[tracing::instrument(
        level = "debug",
        skip_all,
        fields(eslevel = %options.eslevel, file = options.file_name.as_deref().unwrap_or(""))
    )]
    pub fn convert(&self, input: impl Into<Input>, options: &Options) -> Result<Conversion> {
        let Resolved { ast, source, template } = self.resolve(input.into(), options)?;

        let pipeline = Pipeline::from_options(options, &self.registry)?;
        let rewritten = pipeline.run(&ast, options)?;

        let vertical = detect_vertical(&ast, source.as_deref());
        let lines = Printer::new(options).vertical(vertical).print(&rewritten)?;
        let mut lines = if vertical { normalize(lines) } else { lines };
        if options.strict {
            prepend_strict(&mut lines, vertical);
        }

        let rendered = render(&lines);
        let sourcemap = options
            .wants_source_map()
            .then(|| build_source_map(&rendered, options, source.as_deref()));

        debug!(
            vertical,
            lines = lines.len(),
            bytes = rendered.text.len(),
            mappings = rendered.mappings.len(),
            "conversion complete"
        );
        Ok(Conversion {
            text: rendered.text,
            ast: rewritten,
            sourcemap,
            template,
        })
    }

    fn resolve(&self, input: Input, options: &Options) -> Result<Resolved> {
        match input {
            Input::Ast { ast, source } => Ok(Resolved {
                ast,
                source,
                template: None,
            }),
            Input::Source(text) => {
                let (code, template) = match options.template_marker.as_deref() {
                    Some(marker) => split_template(&text, marker),
                    None => (text.as_str(), None),
                };
                if template.is_some() {
                    trace!(code_bytes = code.len(), "split template text");
                }
                let ast = self.parser.parse(code, options.file_name.as_deref())?;
                let source = self.parser.reads_source_text().then(|| code.to_string());
                Ok(Resolved {
                    ast,
                    source,
                    template: template.map(str::to_string),
                })
            }
        }
    }
}

struct Resolved {
    ast: Node,
    source: Option<String>,
    template: Option<String>,
}

/// Convert with the default [`Converter`].
pub fn convert(input: impl Into<Input>, options: &Options) -> Result<Conversion> {
    Converter::new().convert(input, options)
}

fn prepend_strict(lines: &mut Vec<Line>, vertical: bool) {
    let has_code = lines.iter().any(|line| !line.is_blank());
    let directive = match (has_code, vertical) {
        (false, _) => USE_STRICT.to_string(),
        (true, true) => format!("{USE_STRICT};"),
        (true, false) => format!("{USE_STRICT}; "),
    };
    match lines.first_mut() {
        Some(first) if !vertical => first.tokens.insert(0, Token::plain(directive)),
        _ => lines.insert(
            0,
            Line {
                indent: 0,
                tokens: vec![Token::plain(directive)],
            },
        ),
    }
}
