//! End-to-end conversions through the facade.

use r2js_core::{
    Child, ConvertError, Converter, EsLevel, Input, Node, NodeKind, Options, Registry, SourceSpan, SyntaxError,
    convert, s,
};
use std::sync::Arc;

fn es2015() -> Options {
    Options::default().with_eslevel(EsLevel::ES2015)
}

fn assignments() -> Node {
    s!(
        Begin,
        s!(Lvasgn, "a", s!(Int, 1i64)),
        s!(Lvasgn, "b", s!(Int, 2i64))
    )
}

/// Parser adapter standing in for a Ruby front end: every input becomes
/// `puts "<trimmed text>"`.
fn puts_parser(source: &str, _file: Option<&str>) -> Result<Node, SyntaxError> {
    Ok(s!(Send, Child::NIL, "puts", s!(Str, Child::str(source.trim()))))
}

#[test]
fn test_convert_json_ast_text() {
    let json = r#"{"type": "send", "children": [null, {"sym": "puts"}, {"type": "str", "children": ["hi"]}]}"#;
    let out = convert(json, &Options::default()).expect("conversion");
    assert_eq!(out.text, "console.log(\"hi\")");
    assert_eq!(out.ast.kind(), NodeKind::Call);
    assert!(out.sourcemap.is_none());
    assert!(out.template.is_none());
}

#[test]
fn test_convert_tree() {
    let out = convert(&assignments(), &es2015()).expect("conversion");
    assert_eq!(out.text, "let a = 1; let b = 2");
    assert_eq!(out.to_string(), out.text);
}

#[test]
fn test_source_text_selects_vertical_layout() {
    let input = Input::ast_with_source(assignments(), "a = 1\nb = 2\n");
    let out = convert(input, &es2015()).expect("conversion");
    assert_eq!(out.text, "let a = 1;\nlet b = 2");
}

#[test]
fn test_json_text_does_not_select_layout() {
    let json = "{\n  \"type\": \"lvasgn\",\n  \"children\": [{\"sym\": \"a\"}, {\"type\": \"int\", \"children\": [1]}]\n}";
    let out = convert(json, &es2015()).expect("conversion");
    assert_eq!(out.text, "let a = 1");
}

#[test]
fn test_conversion_is_repeatable() {
    let converter = Converter::new();
    let options = es2015();
    let first = converter.convert(&assignments(), &options).expect("first");
    let second = converter.convert(&assignments(), &options).expect("second");
    assert_eq!(first.text, second.text);
    assert_eq!(first.ast, second.ast);
}

#[test]
fn test_concurrent_conversions_share_a_converter() {
    let converter = Converter::new();
    let options = es2015();
    let expected = converter.convert(&assignments(), &options).expect("conversion").text;
    std::thread::scope(|scope| {
        let handles: Vec<_> = (0..4)
            .map(|_| scope.spawn(|| converter.convert(&assignments(), &options).map(|out| out.text)))
            .collect();
        for handle in handles {
            let text = handle.join().expect("thread").expect("conversion");
            assert_eq!(text, expected);
        }
    });
}

#[test]
fn test_strict_mode_prefix() {
    let options = Options {
        strict: true,
        ..es2015()
    };
    let compact = convert(&assignments(), &options).expect("compact");
    assert_eq!(compact.text, "\"use strict\"; let a = 1; let b = 2");

    let vertical = convert(Input::ast_with_source(assignments(), "a = 1\nb = 2"), &options).expect("vertical");
    assert_eq!(vertical.text, "\"use strict\";\nlet a = 1;\nlet b = 2");
}

#[test]
fn test_template_text_is_split_off() {
    let converter = Converter::new().with_parser(puts_parser);
    let options = Options {
        template_marker: Some("__END__".to_string()),
        ..es2015()
    };
    let out = converter
        .convert("hello\n__END__\n<p>tpl</p>\n", &options)
        .expect("conversion");
    assert_eq!(out.text, "console.log(\"hello\")");
    assert_eq!(out.template.as_deref(), Some("<p>tpl</p>\n"));
}

#[test]
fn test_missing_marker_leaves_no_template() {
    let converter = Converter::new().with_parser(puts_parser);
    let options = Options {
        template_marker: Some("__END__".to_string()),
        ..es2015()
    };
    let out = converter.convert("hello", &options).expect("conversion");
    assert_eq!(out.template, None);
}

#[test]
fn test_custom_registry_without_defaults() {
    let converter = Converter::new().with_registry(Arc::new(Registry::empty()));
    let ast = s!(Send, Child::NIL, "puts", s!(Str, Child::str("hi")));
    let out = converter.convert(&ast, &es2015()).expect("conversion");
    assert_eq!(out.text, "puts(\"hi\")");
}

#[test]
fn test_unknown_filter_is_reported() {
    let options = es2015().with_filters(["nonesuch"]);
    let err = convert(&assignments(), &options).unwrap_err();
    assert!(matches!(err, ConvertError::UnknownFilter { ref name } if name == "nonesuch"));
}

#[test]
fn test_syntax_errors_come_from_the_parse_stage() {
    let err = convert("{not json", &Options::default()).unwrap_err();
    assert!(matches!(err, ConvertError::Syntax(_)));
    assert_eq!(err.stage(), "parse");
}

// =============================================================================
// Source maps
// =============================================================================

/// `def greet; 1; end` with locations on line 1.
fn located_method() -> Node {
    let body = Node::with_location(
        NodeKind::Int,
        vec![Child::from(1i64)],
        Some(SourceSpan::new(1, 10, 1, 11)),
    );
    Node::with_location(
        NodeKind::Def,
        vec![Child::sym("greet"), Child::from(s!(Args)), Child::from(body)],
        Some(SourceSpan::new(1, 0, 1, 15)),
    )
}

#[test]
fn test_no_map_unless_requested() {
    let out = convert(&located_method(), &es2015()).expect("conversion");
    assert!(out.sourcemap.is_none());
    assert!(out.sourcemap_json().is_none());
}

#[test]
fn test_file_name_requests_a_map() {
    let options = es2015().with_file_name("greet.rb");
    let out = convert(&located_method(), &options).expect("conversion");
    assert_eq!(out.text, "function greet() {return 1}");

    let map = out.sourcemap.expect("source map");
    assert_eq!(map.file, "greet.js");
    assert_eq!(map.sources, vec!["greet.rb".to_string()]);
    assert_eq!(map.names, vec!["greet".to_string()]);
    assert_eq!(map.sources_content, None);

    let decoded = map.decoded_mappings();
    let name = decoded
        .iter()
        .find(|mapping| mapping.generated_column == 9)
        .expect("name mapping");
    assert_eq!(name.name_index, Some(0));
    let literal = decoded
        .iter()
        .find(|mapping| mapping.generated_column == 25)
        .expect("literal mapping");
    assert_eq!((literal.original_line, literal.original_column), (0, 10));
}

#[test]
fn test_map_embeds_known_source() {
    let options = es2015().with_file_name("greet.rb");
    let input = Input::ast_with_source(located_method(), "def greet; 1; end");
    let map = convert(input, &options)
        .expect("conversion")
        .sourcemap
        .expect("source map");
    assert_eq!(
        map.sources_content,
        Some(vec![Some("def greet; 1; end".to_string())])
    );
}

#[test]
fn test_tree_without_locations_maps_nothing() {
    let options = Options {
        source_map: true,
        ..es2015()
    };
    let out = convert(&assignments(), &options).expect("conversion");
    let map = out.sourcemap.as_ref().expect("source map");
    assert_eq!(map.mappings, "");
    assert!(map.names.is_empty());

    let json: serde_json::Value =
        serde_json::from_str(&out.sourcemap_json().expect("json")).expect("valid json");
    assert_eq!(json["version"], 3);
    assert_eq!(json["file"], "");
}

fn span(start: u32, end: u32) -> Option<SourceSpan> {
    Some(SourceSpan::new(1, start, 1, end))
}

/// `total = 1 + 2` with parser locations.
fn located_sum() -> Node {
    let one = Node::with_location(NodeKind::Int, vec![Child::from(1i64)], span(8, 9));
    let two = Node::with_location(NodeKind::Int, vec![Child::from(2i64)], span(12, 13));
    let sum = Node::with_location(
        NodeKind::Send,
        vec![Child::from(one), Child::sym("+"), Child::from(two)],
        span(8, 13),
    );
    Node::with_location(
        NodeKind::Lvasgn,
        vec![Child::sym("total"), Child::from(sum)],
        span(0, 13),
    )
}

#[test]
fn test_every_mapping_points_into_the_source() {
    let source = "total = 1 + 2";
    let options = es2015().with_file_name("sum.rb");
    let out = convert(Input::ast_with_source(located_sum(), source), &options).expect("conversion");
    assert_eq!(out.text, "let total = 1 + 2");

    let map = out.sourcemap.expect("source map");
    let decoded = map.decoded_mappings();
    assert!(!decoded.is_empty());
    for mapping in decoded {
        let line = source
            .lines()
            .nth(mapping.original_line as usize)
            .expect("original line exists");
        let rest = line
            .get(mapping.original_column as usize..)
            .expect("original column exists");
        assert!(
            rest.starts_with(|ch: char| !ch.is_whitespace()),
            "mapping {mapping:?} lands on whitespace"
        );
    }
}

#[test]
fn test_rewrite_free_conversion_is_repeatable_with_maps() {
    let options = es2015().with_filters(Vec::<&str>::new()).with_file_name("sum.rb");
    let first = convert(&located_sum(), &options).expect("first");
    let second = convert(&located_sum(), &options).expect("second");
    assert_eq!(first.text, second.text);
    assert_eq!(first.sourcemap, second.sourcemap);
    assert_eq!(first.ast, located_sum());
}

/// `a = "héllo€"; b = 2` with byte-column locations.
fn located_unicode_assignments() -> Node {
    let text = Node::with_location(NodeKind::Str, vec![Child::str("héllo€")], span(4, 15));
    let two = Node::with_location(NodeKind::Int, vec![Child::from(2i64)], span(21, 22));
    s!(
        Begin,
        Node::with_location(NodeKind::Lvasgn, vec![Child::sym("a"), Child::from(text)], span(0, 15)),
        Node::with_location(NodeKind::Lvasgn, vec![Child::sym("b"), Child::from(two)], span(17, 22))
    )
}

#[test]
fn test_map_columns_count_utf16_units() {
    let source = "a = \"héllo€\"; b = 2";
    let options = es2015().with_file_name("unicode.rb");
    let out = convert(Input::ast_with_source(located_unicode_assignments(), source), &options)
        .expect("conversion");
    assert_eq!(out.text, "let a = \"héllo€\"; let b = 2");

    let map = out.sourcemap.expect("source map");
    let b_name = map
        .names
        .iter()
        .position(|name| name == "b")
        .expect("name b") as u32;
    let decoded = map.decoded_mappings();
    let named_b = decoded
        .iter()
        .find(|mapping| mapping.name_index == Some(b_name))
        .expect("mapping for b");
    assert_eq!(named_b.generated_column, 22);
    assert_eq!(named_b.original_column, 14);

    let literal = decoded
        .iter()
        .find(|mapping| mapping.generated_column == 26)
        .expect("mapping for 2");
    assert_eq!(literal.original_column, 18);
}
