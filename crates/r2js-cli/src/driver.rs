//! One run of the `r2js` binary: read, convert, write the map.

use crate::args::CliArgs;
use crate::config::resolve_options;
use anyhow::{Context, Result};
use r2js_core::{ConvertError, Converter, Input, JsonAstParser, ParserAdapter};
use std::io::Read;
use std::path::Path;
use tracing::info;

/// Convert the input named by `args` and return the text to print.
///
/// With `--source-map FILE` the map is written to FILE and the returned
/// JavaScript ends with a `sourceMappingURL` comment pointing at it;
/// `--inline-source-map` embeds the map in that comment instead.
#[tracing::instrument(level = "debug", skip_all, fields(input = %args.input.display()))]
pub fn run(args: &CliArgs) -> Result<String> {
    let options = resolve_options(args)?;
    let text = read_input(args)?;

    let input = match &args.source {
        Some(path) => {
            let source = std::fs::read_to_string(path)
                .with_context(|| format!("failed to read source file {}", path.display()))?;
            let ast = JsonAstParser::new()
                .parse(&text, options.file_name.as_deref())
                .map_err(ConvertError::from)
                .with_context(|| format!("failed to parse {}", args.input.display()))?;
            Input::ast_with_source(ast, source)
        }
        None => Input::Source(text),
    };

    let conversion = Converter::new()
        .convert(input, &options)
        .with_context(|| format!("failed to convert {}", args.input.display()))?;

    if args.emit_ast {
        return serde_json::to_string_pretty(&conversion.ast).context("failed to serialize the rewritten tree");
    }

    let mut javascript = conversion.text;
    if let (Some(path), Some(map)) = (&args.source_map, &conversion.sourcemap) {
        std::fs::write(path, map.to_json())
            .with_context(|| format!("failed to write source map {}", path.display()))?;
        info!(path = %path.display(), "wrote source map");
        javascript.push_str("\n//# sourceMappingURL=");
        javascript.push_str(&map_reference(path));
    }
    if args.inline_source_map
        && let Some(map) = &conversion.sourcemap
    {
        javascript.push('\n');
        javascript.push_str(&map.to_inline_comment());
    }
    Ok(javascript)
}

fn read_input(args: &CliArgs) -> Result<String> {
    if args.reads_stdin() {
        let mut text = String::new();
        std::io::stdin()
            .read_to_string(&mut text)
            .context("failed to read standard input")?;
        return Ok(text);
    }
    std::fs::read_to_string(&args.input)
        .with_context(|| format!("failed to read {}", args.input.display()))
}

/// The map's file name, as referenced from the generated code.
fn map_reference(path: &Path) -> String {
    path.file_name()
        .unwrap_or(path.as_os_str())
        .to_string_lossy()
        .into_owned()
}
