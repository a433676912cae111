//! Output line model.
//!
//! The printer produces lines of tokens without indentation; each token may
//! remember the source span it came from. The normalizer assigns indentation
//! and blank lines afterwards, and only then are generated columns known, so
//! mappings are computed at render time.

use r2js_common::SourceSpan;
use r2js_common::limits::{INDENT_WIDTH, OUTPUT_LINES_CAPACITY};

/// Where a token came from.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Origin {
    pub span: SourceSpan,
    /// Original identifier, recorded in the map's `names`.
    pub name: Option<String>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Token {
    pub text: String,
    pub origin: Option<Origin>,
    /// Placeholder id for text filled in after the fact (hoisted declarations).
    slot: Option<usize>,
}

impl Token {
    pub fn plain(text: impl Into<String>) -> Self {
        Token {
            text: text.into(),
            origin: None,
            slot: None,
        }
    }

    pub fn mapped(text: impl Into<String>, origin: Origin) -> Self {
        Token {
            text: text.into(),
            origin: Some(origin),
            slot: None,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Line {
    pub indent: usize,
    pub tokens: Vec<Token>,
}

impl Line {
    pub fn text(&self) -> String {
        self.tokens.iter().map(|token| token.text.as_str()).collect()
    }

    pub fn is_blank(&self) -> bool {
        self.tokens.iter().all(|token| token.text.trim().is_empty())
    }

    pub fn first_char(&self) -> Option<char> {
        self.tokens
            .iter()
            .find_map(|token| token.text.trim_start().chars().next())
    }

    pub fn last_char(&self) -> Option<char> {
        self.tokens
            .iter()
            .rev()
            .find_map(|token| token.text.trim_end().chars().next_back())
    }

    pub fn starts_with(&self, prefix: &str) -> bool {
        self.text().trim_start().starts_with(prefix)
    }
}

/// Position of a token, used to wrap an already-written expression.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Mark {
    line: usize,
    token: usize,
}

/// Handle to a placeholder token.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Slot(usize);

/// Accumulates tokens into lines.
#[derive(Debug)]
pub struct LineWriter {
    lines: Vec<Line>,
    next_slot: usize,
}

impl Default for LineWriter {
    fn default() -> Self {
        LineWriter::new()
    }
}

impl LineWriter {
    pub fn new() -> Self {
        let mut lines = Vec::with_capacity(OUTPUT_LINES_CAPACITY);
        lines.push(Line::default());
        LineWriter {
            lines,
            next_slot: 0,
        }
    }

    fn current(&mut self) -> &mut Line {
        let last = self.lines.len() - 1;
        &mut self.lines[last]
    }

    pub fn write(&mut self, text: &str) {
        if text.is_empty() {
            return;
        }
        self.current().tokens.push(Token::plain(text));
    }

    pub fn write_mapped(&mut self, text: &str, origin: Origin) {
        self.current().tokens.push(Token::mapped(text, origin));
    }

    /// Start a new line.
    pub fn newline(&mut self) {
        self.lines.push(Line::default());
    }

    pub fn mark(&self) -> Mark {
        let line = self.lines.len() - 1;
        Mark {
            line,
            token: self.lines[line].tokens.len(),
        }
    }

    /// Whether anything was written since `mark`.
    pub fn written_since(&self, mark: Mark) -> bool {
        self.lines.len() - 1 > mark.line || self.lines[mark.line].tokens.len() > mark.token
    }

    /// First non-empty token written at or after `mark`.
    pub fn first_text_since(&self, mark: Mark) -> Option<&str> {
        let mut skip = mark.token;
        for line in self.lines.get(mark.line..).unwrap_or(&[]) {
            if let Some(token) = line
                .tokens
                .iter()
                .skip(skip)
                .find(|token| !token.text.trim().is_empty())
            {
                return Some(token.text.trim_start());
            }
            skip = 0;
        }
        None
    }

    /// Insert `text` at `mark`, shifting the tokens after it.
    pub fn insert(&mut self, mark: Mark, text: &str) {
        if let Some(line) = self.lines.get_mut(mark.line) {
            let index = mark.token.min(line.tokens.len());
            line.tokens.insert(index, Token::plain(text));
        }
    }

    /// Wrap everything written since `mark` in parentheses.
    pub fn wrap_parens(&mut self, mark: Mark) {
        self.insert(mark, "(");
        self.write(")");
    }

    /// Reserve an empty token whose text can be filled in later.
    pub fn placeholder(&mut self) -> Slot {
        let slot = self.next_slot;
        self.next_slot += 1;
        self.current().tokens.push(Token {
            text: String::new(),
            origin: None,
            slot: Some(slot),
        });
        Slot(slot)
    }

    pub fn fill(&mut self, slot: Slot, text: &str) {
        for line in self.lines.iter_mut().rev() {
            if let Some(token) = line.tokens.iter_mut().find(|token| token.slot == Some(slot.0)) {
                token.text = text.to_string();
                return;
            }
        }
    }

    /// Text of the line currently being written.
    pub fn current_text(&self) -> String {
        self.lines.last().map(Line::text).unwrap_or_default()
    }

    pub fn finish(self) -> Vec<Line> {
        self.lines
    }
}

/// A mapping from a generated position (0-based line and column) back to
/// its origin.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct GeneratedMapping {
    pub line: u32,
    pub column: u32,
    pub origin: Origin,
}

/// Rendered text plus the mappings for every token that had an origin.
#[derive(Clone, Debug, Default)]
pub struct Rendered {
    pub text: String,
    pub mappings: Vec<GeneratedMapping>,
}

/// Join lines into text, applying each line's indentation.
///
/// Blank lines carry no indentation. Lines are joined with `\n` and no
/// trailing newline is added. Mapping columns count UTF-16 code units.
pub fn render(lines: &[Line]) -> Rendered {
    let mut rendered = Rendered::default();
    for (index, line) in lines.iter().enumerate() {
        if index > 0 {
            rendered.text.push('\n');
        }
        if line.is_blank() {
            continue;
        }
        let mut column = line.indent * INDENT_WIDTH;
        rendered.text.extend(std::iter::repeat_n(' ', column));
        for token in &line.tokens {
            if let Some(origin) = &token.origin
                && !token.text.trim().is_empty()
            {
                let leading = utf16_len(&token.text) - utf16_len(token.text.trim_start());
                rendered.mappings.push(GeneratedMapping {
                    line: index as u32,
                    column: (column + leading) as u32,
                    origin: origin.clone(),
                });
            }
            rendered.text.push_str(&token.text);
            column += utf16_len(&token.text);
        }
    }
    rendered
}

fn utf16_len(text: &str) -> usize {
    text.encode_utf16().count()
}
