//! Source location tracking.
//!
//! Spans use 1-based lines and 0-based byte columns, matching what the parser
//! adapter reports. Source maps want 0-based lines and UTF-16 columns;
//! `LineMap::utf16_column` does the column conversion.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;

/// A region of the original source attached to a node.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SourceSpan {
    pub start_line: u32,
    pub start_col: u32,
    pub end_line: u32,
    pub end_col: u32,
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "file")]
    pub source_file: Option<Arc<str>>,
}

impl SourceSpan {
    pub fn new(start_line: u32, start_col: u32, end_line: u32, end_col: u32) -> Self {
        SourceSpan {
            start_line,
            start_col,
            end_line,
            end_col,
            source_file: None,
        }
    }

    #[must_use]
    pub fn with_file(mut self, file: impl Into<Arc<str>>) -> Self {
        self.source_file = Some(file.into());
        self
    }

    pub fn is_multiline(&self) -> bool {
        self.end_line > self.start_line
    }

    /// Smallest span covering both `self` and `other`. The file of `self` wins.
    #[must_use]
    pub fn merge(&self, other: &SourceSpan) -> SourceSpan {
        let (start_line, start_col) =
            (self.start_line, self.start_col).min((other.start_line, other.start_col));
        let (end_line, end_col) = (self.end_line, self.end_col).max((other.end_line, other.end_col));
        SourceSpan {
            start_line,
            start_col,
            end_line,
            end_col,
            source_file: self.source_file.clone().or_else(|| other.source_file.clone()),
        }
    }
}

impl fmt::Display for SourceSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(file) = &self.source_file {
            write!(f, "{file}:")?;
        }
        write!(f, "{}:{}", self.start_line, self.start_col)
    }
}

/// Line start offsets for a source text, used to slice spans back out of it.
#[derive(Clone, Debug, Default)]
pub struct LineMap {
    line_starts: Vec<usize>,
    len: usize,
}

impl LineMap {
    pub fn new(text: &str) -> Self {
        let mut line_starts = vec![0];
        line_starts.extend(memchr::memchr_iter(b'\n', text.as_bytes()).map(|pos| pos + 1));
        LineMap {
            line_starts,
            len: text.len(),
        }
    }

    pub fn line_count(&self) -> usize {
        self.line_starts.len()
    }

    /// Byte offset of a 1-based line and 0-based column.
    pub fn offset(&self, line: u32, col: u32) -> Option<usize> {
        let index = (line as usize).checked_sub(1)?;
        let start = *self.line_starts.get(index)?;
        let end = self
            .line_starts
            .get(index + 1)
            .copied()
            .unwrap_or(self.len + 1);
        let offset = start + col as usize;
        (offset < end).then_some(offset)
    }

    /// Convert a 0-based byte column on a 1-based line to UTF-16 code units.
    ///
    /// A column inside a multi-byte character counts only the characters
    /// before it; one past the end of the line stops at the line end. Lines
    /// outside the text keep their byte column.
    pub fn utf16_column(&self, text: &str, line: u32, col: u32) -> u32 {
        let Some(index) = (line as usize).checked_sub(1) else {
            return col;
        };
        let Some(&start) = self.line_starts.get(index) else {
            return col;
        };
        let line_end = self.line_starts.get(index + 1).copied().unwrap_or(text.len());
        let mut end = (start + col as usize).min(line_end).min(text.len());
        while !text.is_char_boundary(end) {
            end -= 1;
        }
        text.get(start.min(end)..end)
            .unwrap_or_default()
            .chars()
            .map(|ch| ch.len_utf16() as u32)
            .sum()
    }

    /// The text covered by `span`, if the span lies inside `text`.
    pub fn slice<'t>(&self, text: &'t str, span: &SourceSpan) -> Option<&'t str> {
        let start = self.offset(span.start_line, span.start_col)?;
        let end = self.offset(span.end_line, span.end_col)?;
        if start > end {
            return None;
        }
        text.get(start..end)
    }
}
