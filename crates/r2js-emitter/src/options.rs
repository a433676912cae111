//! Conversion options.
//!
//! Options are resolved once per conversion and never change while the
//! pipeline and printer run. They deserialize from the same camelCase JSON
//! the CLI config file uses; unrecognized keys are ignored.

use crate::error::{ConvertError, Result};
use crate::filter::FilterFactory;
use r2js_common::{Comparison, EsLevel, LogicalOperator};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Deserializer};
use std::fmt;
use std::path::Path;

/// One entry of the filter list: a registry name or a caller-supplied factory.
#[derive(Clone)]
pub enum FilterSpec {
    Named(String),
    Custom(FilterFactory),
}

impl FilterSpec {
    pub fn named(name: impl Into<String>) -> Self {
        FilterSpec::Named(name.into())
    }

    pub fn custom<F>(factory: F) -> Self
    where
        F: Fn() -> Box<dyn crate::filter::Filter> + Send + Sync + 'static,
    {
        FilterSpec::Custom(std::sync::Arc::new(factory))
    }
}

impl fmt::Debug for FilterSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FilterSpec::Named(name) => f.debug_tuple("Named").field(name).finish(),
            FilterSpec::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

impl From<&str> for FilterSpec {
    fn from(name: &str) -> Self {
        FilterSpec::Named(name.to_string())
    }
}

impl<'de> Deserialize<'de> for FilterSpec {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        String::deserialize(deserializer).map(FilterSpec::Named)
    }
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Options {
    /// Output feature tier.
    pub eslevel: EsLevel,
    /// Filters to run, outermost first. `None` selects the registry defaults;
    /// an empty list disables rewriting entirely.
    pub filters: Option<Vec<FilterSpec>>,
    /// Opt-in method mappings (`class`, `call`).
    pub include: FxHashSet<String>,
    /// Method mappings to skip, by Ruby method name.
    pub exclude: FxHashSet<String>,
    pub comparison: Comparison,
    pub or: LogicalOperator,
    pub autoexports: bool,
    pub file_name: Option<String>,
    /// Produce a source map even without a `file_name`.
    pub source_map: bool,
    pub template_marker: Option<String>,
    /// Prefix the output with `"use strict"`.
    pub strict: bool,
}

impl Options {
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|err| ConvertError::Config(err.to_string()))
    }

    #[must_use]
    pub fn with_eslevel(mut self, level: EsLevel) -> Self {
        self.eslevel = level;
        self
    }

    #[must_use]
    pub fn with_filters<I, S>(mut self, filters: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<FilterSpec>,
    {
        self.filters = Some(filters.into_iter().map(Into::into).collect());
        self
    }

    #[must_use]
    pub fn with_comparison(mut self, comparison: Comparison) -> Self {
        self.comparison = comparison;
        self
    }

    #[must_use]
    pub fn with_or(mut self, or: LogicalOperator) -> Self {
        self.or = or;
        self
    }

    #[must_use]
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    /// Whether the caller asked for a source map.
    pub fn wants_source_map(&self) -> bool {
        self.source_map || self.file_name.is_some()
    }

    /// `file` field of the generated source map: the input name with a
    /// `.js` extension.
    pub fn output_file_name(&self) -> String {
        let Some(name) = &self.file_name else {
            return String::new();
        };
        Path::new(name)
            .with_extension("js")
            .to_string_lossy()
            .into_owned()
    }

    /// Whether a method mapping of the `functions` filter applies.
    pub fn method_enabled(&self, method: &str) -> bool {
        !self.exclude.contains(method)
    }

    pub fn method_included(&self, method: &str) -> bool {
        self.include.contains(method) && !self.exclude.contains(method)
    }
}
