//! Vertical-whitespace normalization.
//!
//! Runs over the printer's lines when the input spanned multiple lines:
//!
//! 1. Indentation follows brackets: a line starting with `)`, `}` or `]`
//!    closes one level before it is placed; a line ending with `(`, `{` or
//!    `[` opens one level for the lines after it. Depth never goes negative.
//! 2. `case`/`default` labels sit one level left of their statements.
//! 3. Blank lines are removed, then one is inserted before a line that opens
//!    a block and after a line that closes one, when the neighbor is another
//!    statement at the same depth.

use crate::output::Line;
use tracing::trace;

pub fn normalize(lines: Vec<Line>) -> Vec<Line> {
    let mut lines: Vec<Line> = lines.into_iter().filter(|line| !line.is_blank()).collect();
    reindent(&mut lines);
    let lines = respace(lines);
    trace!(lines = lines.len(), "normalized output");
    lines
}

fn reindent(lines: &mut [Line]) {
    let mut depth = 0usize;
    for line in lines.iter_mut() {
        if matches!(line.first_char(), Some(')' | '}' | ']')) {
            depth = depth.saturating_sub(1);
        }
        line.indent = if is_case_label(line) { depth.saturating_sub(1) } else { depth };
        if matches!(line.last_char(), Some('(' | '{' | '[')) {
            depth += 1;
        }
    }
}

fn is_case_label(line: &Line) -> bool {
    line.starts_with("case ") || line.starts_with("default:")
}

fn opens_block(line: &Line) -> bool {
    line.last_char() == Some('{') && !matches!(line.first_char(), Some('}' | ')' | ']'))
}

fn closes_block(line: &Line) -> bool {
    matches!(line.first_char(), Some('}')) && !matches!(line.last_char(), Some('{' | '(' | '['))
}

fn respace(lines: Vec<Line>) -> Vec<Line> {
    let mut out: Vec<Line> = Vec::with_capacity(lines.len() + lines.len() / 4);
    for line in lines {
        if let Some(previous) = out.last()
            && previous.indent == line.indent
            && !is_case_label(&line)
        {
            let after_block =
                closes_block(previous) && !matches!(line.first_char(), Some('}' | ')' | ']'));
            if opens_block(&line) || after_block {
                out.push(Line::default());
            }
        }
        out.push(line);
    }
    out
}
