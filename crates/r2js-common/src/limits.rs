//! Centralized limits and thresholds for the translator.
//!
//! Keeping these in one place stops the pipeline and the printer from drifting
//! apart on how deep a tree they are willing to walk.

// =============================================================================
// Recursion Depth Limits (Filters / Printer)
// =============================================================================

/// Maximum nesting depth the filter chain will descend into.
///
/// Each level of nesting costs a few stack frames in `Chain::process` and
/// the filter handlers it dispatches to. Past this depth the pipeline stops
/// with an error naming the node kind it was visiting.
///
/// # Ruby example
///
/// ```ruby
/// # Deeply nested arithmetic produced by a code generator:
/// x = (((((((((((1 + 2) + 3) + 4) # ... 500 levels ...
/// ```
pub const MAX_AST_DEPTH: u32 = 500;

/// Maximum nesting depth for the printer.
///
/// Slightly larger than [`MAX_AST_DEPTH`] since the printer also recurses
/// through synthetic nodes the filters introduce (`autoreturn`, `attr`, ...).
pub const MAX_EMIT_DEPTH: u32 = 600;

// =============================================================================
// Capacity Hints
// =============================================================================

/// Initial capacity for the output line buffer.
pub const OUTPUT_LINES_CAPACITY: usize = 64;

/// Indentation unit used by the whitespace normalizer (in spaces).
pub const INDENT_WIDTH: usize = 2;
