use crate::normalizer::normalize;
use crate::output::{Line, Token, render};

fn lines(texts: &[&str]) -> Vec<Line> {
    texts
        .iter()
        .map(|text| Line {
            indent: 0,
            tokens: if text.is_empty() { Vec::new() } else { vec![Token::plain(*text)] },
        })
        .collect()
}

fn normalized(texts: &[&str]) -> String {
    render(&normalize(lines(texts))).text
}

#[test]
fn test_blank_line_before_block_opening_sibling() {
    let text = normalized(&["a = 1;", "if (a) {", "b()", "}"]);
    assert_eq!(text, "a = 1;\n\nif (a) {\n  b()\n}");
}

#[test]
fn test_blank_line_after_block_end() {
    let text = normalized(&["if (a) {", "b()", "}", "c()"]);
    assert_eq!(text, "if (a) {\n  b()\n}\n\nc()");
}

#[test]
fn test_existing_blank_lines_are_removed() {
    assert_eq!(normalized(&["a();", "", "", "b()"]), "a();\nb()");
}

#[test]
fn test_nested_blocks_indent_by_two() {
    let text = normalized(&["function f() {", "if (a) {", "b()", "}", "}"]);
    assert_eq!(text, "function f() {\n  if (a) {\n    b()\n  }\n}");
}

#[test]
fn test_case_labels_sit_left_of_statements() {
    let text = normalized(&["switch (x) {", "case 1:", "a();", "break;", "default:", "b()", "}"]);
    assert_eq!(text, "switch (x) {\ncase 1:\n  a();\n  break;\ndefault:\n  b()\n}");
}

#[test]
fn test_else_line_does_not_get_blank_lines() {
    let text = normalized(&["if (a) {", "b()", "} else {", "c()", "}"]);
    assert_eq!(text, "if (a) {\n  b()\n} else {\n  c()\n}");
}

#[test]
fn test_depth_never_goes_negative() {
    let normalized = normalize(lines(&["}", "a()"]));
    assert!(normalized.iter().all(|line| line.indent == 0));
}
