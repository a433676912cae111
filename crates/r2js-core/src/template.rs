//! Splitting trailing template text off the Ruby source.

use memchr::memchr_iter;

/// Split `text` at the first line that equals `marker` (trailing whitespace
/// ignored).
///
/// Returns the code before the marker line and, when the marker was found,
/// everything after it. An empty marker never matches.
pub fn split_template<'a>(text: &'a str, marker: &str) -> (&'a str, Option<&'a str>) {
    if marker.is_empty() {
        return (text, None);
    }
    let mut start = 0;
    let ends = memchr_iter(b'\n', text.as_bytes())
        .map(|newline| newline + 1)
        .chain(std::iter::once(text.len()));
    for end in ends {
        let line = &text[start..end];
        if line.trim_end() == marker {
            return (&text[..start], Some(&text[end..]));
        }
        start = end;
    }
    (text, None)
}
