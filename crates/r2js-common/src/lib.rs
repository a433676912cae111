//! Common types and utilities for the r2js translator.
//!
//! This crate provides foundational types used across all r2js crates:
//! - Output feature tiers and operator choices (`EsLevel`, `Comparison`, `LogicalOperator`)
//! - Source spans and line maps (`SourceSpan`, `LineMap`)
//! - Recursion limits
//! - Source map generation (`SourceMapGenerator`, `SourceMap`, `vlq`)

// Common types - Shared enums to break circular dependencies
pub mod common;
pub use common::{Comparison, EsLevel, LogicalOperator};

// Span - Source location tracking (line/column)
pub mod span;
pub use span::{LineMap, SourceSpan};

// Centralized limits and thresholds
pub mod limits;

// Source Map generation
pub mod source_map;
pub use source_map::{Mapping, SourceMap, SourceMapGenerator};

#[cfg(test)]
#[path = "tests/common_tests.rs"]
mod common_tests;

#[cfg(test)]
#[path = "tests/span_tests.rs"]
mod span_tests;

#[cfg(test)]
#[path = "tests/source_map_tests.rs"]
mod source_map_tests;
