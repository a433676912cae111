//! Driver runs against files on disk.

use clap::Parser;
use r2js_cli::args::CliArgs;
use r2js_cli::driver::run;
use std::path::Path;

const PUTS_TREE: &str =
    r#"{"type": "send", "children": [null, {"sym": "puts"}, {"type": "str", "children": ["hi"]}]}"#;

const LOCATED_ASSIGNMENT: &str = r#"{"type": "lvasgn", "children": [{"sym": "total"},
  {"type": "int", "children": [1], "loc": {"startLine": 1, "startCol": 8, "endLine": 1, "endCol": 9}}],
  "loc": {"startLine": 1, "startCol": 0, "endLine": 1, "endCol": 9}}"#;

fn write(dir: &Path, name: &str, contents: &str) -> String {
    let path = dir.join(name);
    std::fs::write(&path, contents).expect("write fixture");
    path.to_string_lossy().into_owned()
}

fn args(list: &[&str]) -> CliArgs {
    let mut argv = vec!["r2js"];
    argv.extend_from_slice(list);
    CliArgs::try_parse_from(argv).expect("args should parse")
}

#[test]
fn converts_a_json_tree() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write(dir.path(), "tree.json", PUTS_TREE);
    let output = run(&args(&[input.as_str()])).expect("conversion");
    assert_eq!(output, "console.log(\"hi\")");
}

#[test]
fn flags_reach_the_converter() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write(dir.path(), "tree.json", PUTS_TREE);

    let output = run(&args(&["--no-filters", input.as_str()])).expect("conversion");
    assert_eq!(output, "puts(\"hi\")");

    let output = run(&args(&["--strict", input.as_str()])).expect("conversion");
    assert_eq!(output, "\"use strict\"; console.log(\"hi\")");
}

#[test]
fn config_file_sets_the_tier() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write(dir.path(), "tree.json", LOCATED_ASSIGNMENT);
    let config = write(dir.path(), "r2js.json", r#"{"eslevel": 2015}"#);

    let output = run(&args(&["--config", config.as_str(), input.as_str()])).expect("conversion");
    assert_eq!(output, "let total = 1");

    let output = run(&args(&["--config", config.as_str(), "--eslevel", "5", input.as_str()])).expect("conversion");
    assert_eq!(output, "var total = 1");
}

#[test]
fn writes_the_source_map() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write(dir.path(), "tree.json", LOCATED_ASSIGNMENT);
    let source = write(dir.path(), "app.rb", "total = 1\n");
    let map_path = dir.path().join("app.js.map");
    let map_arg = map_path.to_string_lossy().into_owned();

    let output = run(&args(&[
        "--eslevel",
        "2015",
        "--file-name",
        "app.rb",
        "--source",
        source.as_str(),
        "--source-map",
        map_arg.as_str(),
        input.as_str(),
    ]))
    .expect("conversion");
    assert_eq!(output, "let total = 1\n//# sourceMappingURL=app.js.map");

    let map: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&map_path).expect("map written")).expect("map json");
    assert_eq!(map["version"], 3);
    assert_eq!(map["file"], "app.js");
    assert_eq!(map["sources"][0], "app.rb");
    assert_eq!(map["sourcesContent"][0], "total = 1\n");
    assert_eq!(map["names"][0], "total");
}

#[test]
fn inlines_the_source_map() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write(dir.path(), "tree.json", LOCATED_ASSIGNMENT);
    let output = run(&args(&[
        "--eslevel",
        "2015",
        "--file-name",
        "app.rb",
        "--inline-source-map",
        input.as_str(),
    ]))
    .expect("conversion");

    let (code, comment) = output.split_once('\n').expect("comment line");
    assert_eq!(code, "let total = 1");
    let payload = comment
        .strip_prefix("//# sourceMappingURL=data:application/json;base64,")
        .expect("data url");
    assert!(!payload.is_empty());
    assert!(!dir.path().join("app.js.map").exists());
}

#[test]
fn inline_and_file_maps_are_exclusive() {
    let result = CliArgs::try_parse_from(["r2js", "--inline-source-map", "--source-map", "a.map", "in.json"]);
    assert!(result.is_err());
}

#[test]
fn emits_the_rewritten_tree() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write(dir.path(), "tree.json", PUTS_TREE);
    let output = run(&args(&["--emit-ast", input.as_str()])).expect("conversion");
    let tree: serde_json::Value = serde_json::from_str(&output).expect("tree json");
    assert_eq!(tree["type"], "call");
}

#[test]
fn reports_conversion_failures() {
    let dir = tempfile::tempdir().expect("temp dir");
    let input = write(dir.path(), "tree.json", "{broken");
    let err = run(&args(&[input.as_str()])).unwrap_err();
    assert!(err.to_string().starts_with("failed to convert"), "{err}");
    assert!(format!("{err:#}").contains("syntax error"), "{err:#}");
}

#[test]
fn reports_missing_input() {
    let dir = tempfile::tempdir().expect("temp dir");
    let missing = dir.path().join("nope.json").to_string_lossy().into_owned();
    let err = run(&args(&[missing.as_str()])).unwrap_err();
    assert!(err.to_string().starts_with("failed to read"), "{err}");
}
