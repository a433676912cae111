//! Source map assembly from rendered output.

use r2js_common::{LineMap, SourceMap, SourceMapGenerator};
use r2js_emitter::{Options, Rendered};
use tracing::trace;

/// Build a v3 source map for `rendered`.
///
/// The primary source is `options.file_name` (empty when unset); spans that
/// name another file get a source entry of their own. Original lines are
/// stored zero-based. `source` is embedded as `sourcesContent` for the primary
/// source and turns its byte columns into UTF-16 columns; spans without known
/// text keep their recorded columns.
pub(crate) fn build_source_map(rendered: &Rendered, options: &Options, source: Option<&str>) -> SourceMap {
    let mut generator = SourceMapGenerator::new(options.output_file_name());
    let primary = options.file_name.clone().unwrap_or_default();
    let primary_index = match source {
        Some(text) => generator.add_source_with_content(primary, text.to_string()),
        None => generator.add_source(primary),
    };

    let line_map = source.map(|text| (text, LineMap::new(text)));

    for mapping in &rendered.mappings {
        let span = &mapping.origin.span;
        let source_index = match &span.source_file {
            Some(file) => generator.add_source(file.to_string()),
            None => primary_index,
        };
        let original_line = span.start_line.saturating_sub(1);
        let original_column = match &line_map {
            Some((text, lines)) if source_index == primary_index => {
                lines.utf16_column(text, span.start_line, span.start_col)
            }
            _ => span.start_col,
        };
        match &mapping.origin.name {
            Some(name) => {
                let name_index = generator.add_name(name.clone());
                generator.add_named_mapping(
                    mapping.line,
                    mapping.column,
                    source_index,
                    original_line,
                    original_column,
                    name_index,
                );
            }
            None => generator.add_simple_mapping(
                mapping.line,
                mapping.column,
                source_index,
                original_line,
                original_column,
            ),
        }
    }

    trace!(mappings = generator.mapping_count(), "built source map");
    generator.generate()
}
