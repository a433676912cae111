//! Options from a config file merged with command-line flags.

use crate::args::CliArgs;
use anyhow::{Context, Result};
use r2js_core::{EsLevel, FilterSpec, Options};
use std::path::Path;

/// Read a JSON options file (camelCase keys, unknown keys ignored).
pub fn load_config(path: &Path) -> Result<Options> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read config file {}", path.display()))?;
    Options::from_json(&text).with_context(|| format!("invalid config file {}", path.display()))
}

/// Build the conversion options: the config file if any, then flags.
///
/// Scalar flags replace config values; `--include`/`--exclude` add to the
/// configured sets; `--filter` replaces the configured filter list.
pub fn resolve_options(args: &CliArgs) -> Result<Options> {
    let mut options = match &args.config {
        Some(path) => load_config(path)?,
        None => Options::default(),
    };

    if let Some(level) = args.eslevel {
        options.eslevel = EsLevel::from_number(level);
    }
    if args.no_filters {
        options.filters = Some(Vec::new());
    } else if !args.filters.is_empty() {
        options.filters = Some(args.filters.iter().map(|name| FilterSpec::named(name.as_str())).collect());
    }
    if let Some(mode) = args.comparison {
        options.comparison = mode.into();
    }
    if let Some(mode) = args.or {
        options.or = mode.into();
    }
    options.include.extend(args.include.iter().cloned());
    options.exclude.extend(args.exclude.iter().cloned());
    options.autoexports |= args.autoexports;
    options.strict |= args.strict;

    if let Some(name) = &args.file_name {
        options.file_name = Some(name.clone());
    }
    options.source_map |= args.source_map.is_some() || args.inline_source_map;

    tracing::debug!(eslevel = %options.eslevel, filters = ?options.filters, "resolved options");
    Ok(options)
}
