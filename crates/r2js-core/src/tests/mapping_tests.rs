use crate::mapping::build_source_map;
use r2js_common::SourceSpan;
use r2js_emitter::{GeneratedMapping, Options, Origin, Rendered};

fn mapping(line: u32, column: u32, span: SourceSpan, name: Option<&str>) -> GeneratedMapping {
    GeneratedMapping {
        line,
        column,
        origin: Origin {
            span,
            name: name.map(str::to_string),
        },
    }
}

#[test]
fn test_file_and_sources_follow_the_file_name() {
    let options = Options::default().with_file_name("lib/app.rb");
    let map = build_source_map(&Rendered::default(), &options, Some("a = 1"));
    assert_eq!(map.version, 3);
    assert_eq!(map.file, "lib/app.js");
    assert_eq!(map.sources, vec!["lib/app.rb".to_string()]);
    assert_eq!(map.sources_content, Some(vec![Some("a = 1".to_string())]));
    assert_eq!(map.mappings, "");
}

#[test]
fn test_without_file_name_the_source_is_unnamed() {
    let options = Options {
        source_map: true,
        ..Options::default()
    };
    let map = build_source_map(&Rendered::default(), &options, None);
    assert_eq!(map.file, "");
    assert_eq!(map.sources, vec![String::new()]);
    assert_eq!(map.sources_content, None);
}

#[test]
fn test_lines_become_zero_based() {
    let rendered = Rendered {
        text: "let a = 1;\nlet b = 2".to_string(),
        mappings: vec![
            mapping(0, 0, SourceSpan::new(1, 0, 1, 5), None),
            mapping(1, 8, SourceSpan::new(2, 4, 2, 5), None),
        ],
    };
    let map = build_source_map(&rendered, &Options::default().with_file_name("a.rb"), None);
    let decoded = map.decoded_mappings();
    assert_eq!(decoded.len(), 2);
    assert_eq!((decoded[0].original_line, decoded[0].original_column), (0, 0));
    assert_eq!(
        (decoded[1].generated_line, decoded[1].generated_column),
        (1, 8)
    );
    assert_eq!((decoded[1].original_line, decoded[1].original_column), (1, 4));
}

#[test]
fn test_identifiers_are_recorded_as_names() {
    let rendered = Rendered {
        text: "let total = 1".to_string(),
        mappings: vec![mapping(0, 4, SourceSpan::new(1, 0, 1, 9), Some("total"))],
    };
    let map = build_source_map(&rendered, &Options::default().with_file_name("a.rb"), None);
    assert_eq!(map.names, vec!["total".to_string()]);
    assert_eq!(map.decoded_mappings()[0].name_index, Some(0));
}

#[test]
fn test_spans_from_other_files_add_sources() {
    let rendered = Rendered {
        text: "a; b".to_string(),
        mappings: vec![
            mapping(0, 0, SourceSpan::new(1, 0, 1, 1).with_file("a.rb"), None),
            mapping(0, 3, SourceSpan::new(4, 2, 4, 3).with_file("b.rb"), None),
        ],
    };
    let map = build_source_map(&rendered, &Options::default().with_file_name("a.rb"), None);
    assert_eq!(map.sources, vec!["a.rb".to_string(), "b.rb".to_string()]);
    let decoded = map.decoded_mappings();
    assert_eq!(decoded[0].source_index, 0);
    assert_eq!(decoded[1].source_index, 1);
    assert_eq!(decoded[1].original_line, 3);
}

#[test]
fn test_original_columns_count_utf16_units_when_source_is_known() {
    let source = "s = \"€\"; t = 1";
    let rendered = Rendered {
        text: "let s = \"€\"; let t = 1".to_string(),
        mappings: vec![mapping(0, 17, SourceSpan::new(1, 11, 1, 16), Some("t"))],
    };
    let options = Options::default().with_file_name("a.rb");

    let with_text = build_source_map(&rendered, &options, Some(source));
    assert_eq!(with_text.decoded_mappings()[0].original_column, 9);

    let without_text = build_source_map(&rendered, &options, None);
    assert_eq!(without_text.decoded_mappings()[0].original_column, 11);
}

#[test]
fn test_foreign_sources_keep_their_columns() {
    let rendered = Rendered {
        text: "x".to_string(),
        mappings: vec![mapping(0, 0, SourceSpan::new(1, 11, 1, 12).with_file("b.rb"), None)],
    };
    let map = build_source_map(
        &rendered,
        &Options::default().with_file_name("a.rb"),
        Some("s = \"€\"; t = 1"),
    );
    assert_eq!(map.decoded_mappings()[0].original_column, 11);
}
