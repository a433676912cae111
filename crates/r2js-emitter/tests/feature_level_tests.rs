//! Constructs gated on the output tier: each either lowers or fails with the
//! tier it needs.

use r2js_ast::{Child, Node, NodeKind, s};
use r2js_common::{Comparison, EsLevel, LogicalOperator, SourceSpan};
use r2js_emitter::{ConvertError, Options, Pipeline, Printer, Registry, Result, render};

fn try_emit(ast: &Node, options: &Options) -> Result<String> {
    let pipeline = Pipeline::from_options(options, &Registry::builtin())?;
    let rewritten = pipeline.run(ast, options)?;
    let lines = Printer::new(options).print(&rewritten)?;
    Ok(render(&lines).text)
}

fn at(level: EsLevel) -> Options {
    Options::default().with_eslevel(level)
}

/// The tier an unsupported-construct error asks for.
fn required_level(err: &ConvertError) -> Option<EsLevel> {
    match err {
        ConvertError::UnsupportedConstruct { required, .. } => *required,
        _ => None,
    }
}

fn lvar(name: &str) -> Node {
    s!(Lvar, name)
}

#[test]
fn test_import_needs_es2015() {
    let ast = s!(Send, Child::NIL, "import", s!(Str, Child::str("lib")));
    assert_eq!(try_emit(&ast, &at(EsLevel::ES2015)).expect("import"), "import \"lib\"");

    let err = try_emit(&ast, &at(EsLevel::ES5)).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(required_level(&err), Some(EsLevel::ES2015));
    assert_eq!(err.kind(), Some(NodeKind::Import));
}

#[test]
fn test_identity_comparison_needs_es2015() {
    let ast = s!(Send, lvar("a"), "==", lvar("b"));
    let options = at(EsLevel::ES5).with_comparison(Comparison::Identity);
    let err = try_emit(&ast, &options).unwrap_err();
    assert_eq!(required_level(&err), Some(EsLevel::ES2015));
    assert_eq!(
        err.to_string(),
        "emit: identity comparison (`Object.is`) requires ES2015 (eslevel is ES5)"
    );
}

#[test]
fn test_nullish_needs_es2020() {
    let ast = s!(Or, lvar("a"), lvar("b"));
    let options = at(EsLevel::ES2015).with_or(LogicalOperator::Nullish);
    let err = try_emit(&ast, &options).unwrap_err();
    assert_eq!(required_level(&err), Some(EsLevel::ES2020));

    let options = at(EsLevel::ES2020).with_or(LogicalOperator::Nullish);
    assert_eq!(try_emit(&ast, &options).expect("nullish"), "a ?? b");
}

#[test]
fn test_async_needs_es2017() {
    let ast = s!(
        Send,
        Child::NIL,
        "async",
        s!(Def, "f", s!(Args), s!(Int, 1i64))
    );
    assert_eq!(
        try_emit(&ast, &at(EsLevel::ES2017)).expect("async"),
        "async function f() {return 1}"
    );
    let err = try_emit(&ast, &at(EsLevel::ES2015)).unwrap_err();
    assert_eq!(required_level(&err), Some(EsLevel::ES2017));
}

#[test]
fn test_keyword_arguments_need_es2015() {
    let ast = s!(Def, "f", s!(Args, s!(Kwarg, "a")), lvar("a"));
    let err = try_emit(&ast, &at(EsLevel::ES5)).unwrap_err();
    assert_eq!(required_level(&err), Some(EsLevel::ES2015));
    assert_eq!(err.kind(), Some(NodeKind::Kwarg));
}

#[test]
fn test_keyword_rest_needs_es2018() {
    let ast = s!(Def, "f", s!(Args, s!(Kwarg, "a"), s!(Kwrestarg, "rest")), lvar("a"));
    let err = try_emit(&ast, &at(EsLevel::ES2017)).unwrap_err();
    assert_eq!(required_level(&err), Some(EsLevel::ES2018));
    assert_eq!(
        try_emit(&ast, &at(EsLevel::ES2018)).expect("rest"),
        "function f({a, ...rest}) {return a}"
    );
}

#[test]
fn test_dot_all_regexp_needs_es2018() {
    let ast = s!(Regexp, s!(Str, Child::str("a.b")), s!(Regopt, "m"));
    let err = try_emit(&ast, &at(EsLevel::ES2015)).unwrap_err();
    assert_eq!(required_level(&err), Some(EsLevel::ES2018));
    assert_eq!(try_emit(&ast, &at(EsLevel::ES2018)).expect("regexp"), "/a.b/s");
}

#[test]
fn test_extended_regexp_is_never_supported() {
    let ast = s!(Regexp, s!(Str, Child::str("a b")), s!(Regopt, "x"));
    let err = try_emit(&ast, &at(EsLevel::LATEST)).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(required_level(&err), None);
}

#[test]
fn test_standalone_range_is_unsupported() {
    let ast = s!(Lvasgn, "r", s!(Irange, s!(Int, 1i64), s!(Int, 3i64)));
    let err = try_emit(&ast, &at(EsLevel::LATEST)).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.kind(), Some(NodeKind::Irange));
}

#[test]
fn test_shell_command_is_unsupported() {
    let ast = s!(Xstr, s!(Str, Child::str("ls")));
    let err = try_emit(&ast, &at(EsLevel::LATEST)).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.stage(), "emit");
}

#[test]
fn test_filter_errors_carry_the_filter_stage() {
    let ast = s!(Send, lvar("list"), "uniq");
    let err = try_emit(&ast, &at(EsLevel::ES5)).unwrap_err();
    assert_eq!(err.stage(), "filter:functions");
    assert_eq!(required_level(&err), Some(EsLevel::ES2015));
    assert_eq!(try_emit(&ast, &at(EsLevel::ES2015)).expect("uniq"), "[...new Set(list)]");
}

#[test]
fn test_errors_report_the_node_location() {
    let ast = Node::with_location(
        NodeKind::Send,
        vec![Child::NIL, Child::sym("import"), Child::from(s!(Str, Child::str("lib")))],
        Some(SourceSpan::new(3, 2, 3, 14)),
    );
    let err = try_emit(&ast, &at(EsLevel::ES5)).unwrap_err();
    let location = err.location().expect("location");
    assert_eq!((location.start_line, location.start_col), (3, 2));
    assert!(err.to_string().ends_with(" at 3:2"), "{err}");
}

#[test]
fn test_each_tier_keeps_newer_syntax_out() {
    let ast = s!(OrAsgn, s!(Lvasgn, "x"), s!(Int, 1i64));
    let body = s!(Begin, s!(Lvasgn, "x", Child::NIL), ast);
    assert_eq!(try_emit(&body, &at(EsLevel::ES2020)).expect("or"), "let x = null; x = x || 1");
    assert_eq!(try_emit(&body, &at(EsLevel::ES2021)).expect("or"), "let x = null; x ||= 1");
}
