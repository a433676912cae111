use clap::{Parser, ValueEnum};
use r2js_core::{Comparison, LogicalOperator};
use std::path::PathBuf;

/// CLI arguments for the r2js binary.
#[derive(Parser, Debug)]
#[command(name = "r2js", version, about = "Translate Ruby syntax trees to JavaScript")]
pub struct CliArgs {
    /// JSON AST file to convert, or `-` to read standard input.
    pub input: PathBuf,

    /// JSON options file. Flags given on the command line override it.
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    // ==================== Output ====================
    /// Output feature tier: a year (2009 for ES5, 2015-2022) or an edition number.
    #[arg(short = 'e', long)]
    pub eslevel: Option<u32>,

    /// Filter to run, outermost first. Repeat for several filters.
    #[arg(short = 'f', long = "filter", value_name = "NAME")]
    pub filters: Vec<String>,

    /// Run no filters at all.
    #[arg(long = "no-filters", conflicts_with = "filters")]
    pub no_filters: bool,

    /// How `==` and `!=` are emitted.
    #[arg(long, value_enum)]
    pub comparison: Option<ComparisonMode>,

    /// How `||` is emitted.
    #[arg(long, value_enum)]
    pub or: Option<OrMode>,

    /// Opt in to a method mapping of the `functions` filter.
    #[arg(long, value_name = "METHOD")]
    pub include: Vec<String>,

    /// Skip a method mapping of the `functions` filter.
    #[arg(long, value_name = "METHOD")]
    pub exclude: Vec<String>,

    /// Export top-level classes, modules, methods and constants.
    #[arg(long)]
    pub autoexports: bool,

    /// Prefix the output with `"use strict"`.
    #[arg(long)]
    pub strict: bool,

    /// Print the rewritten tree as JSON instead of JavaScript.
    #[arg(long = "emit-ast")]
    pub emit_ast: bool,

    // ==================== Source Maps ====================
    /// Name of the Ruby file the tree came from.
    #[arg(long = "file-name", value_name = "NAME")]
    pub file_name: Option<String>,

    /// Ruby source the tree was parsed from; used for layout and embedded in maps.
    #[arg(long, value_name = "FILE")]
    pub source: Option<PathBuf>,

    /// Write a source map to FILE and reference it from the output.
    #[arg(long = "source-map", value_name = "FILE")]
    pub source_map: Option<PathBuf>,

    /// Append the source map to the output as a base64 data URL.
    #[arg(long = "inline-source-map", conflicts_with = "source_map")]
    pub inline_source_map: bool,
}

impl CliArgs {
    /// Whether the input is standard input.
    pub fn reads_stdin(&self) -> bool {
        self.input.as_os_str() == "-"
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum ComparisonMode {
    /// `==`
    Loose,
    /// `===`
    Strict,
    /// `Object.is`
    Identity,
}

impl From<ComparisonMode> for Comparison {
    fn from(mode: ComparisonMode) -> Self {
        match mode {
            ComparisonMode::Loose => Comparison::Loose,
            ComparisonMode::Strict => Comparison::Strict,
            ComparisonMode::Identity => Comparison::Identity,
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, ValueEnum)]
pub enum OrMode {
    /// `||`
    Logical,
    /// `??`
    Nullish,
}

impl From<OrMode> for LogicalOperator {
    fn from(mode: OrMode) -> Self {
        match mode {
            OrMode::Logical => LogicalOperator::Logical,
            OrMode::Nullish => LogicalOperator::Nullish,
        }
    }
}
