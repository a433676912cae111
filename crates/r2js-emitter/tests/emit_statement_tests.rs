//! Statement emission: declarations, control flow, loops, exceptions and
//! module syntax, in compact and vertical layout.

use r2js_ast::{Child, Node, s};
use r2js_common::EsLevel;
use r2js_emitter::{Options, Pipeline, Printer, Registry, normalize, render};

fn emit(ast: &Node, options: &Options, vertical: bool) -> String {
    let pipeline = Pipeline::from_options(options, &Registry::builtin()).expect("pipeline");
    let rewritten = pipeline.run(ast, options).expect("rewrite");
    let lines = Printer::new(options).vertical(vertical).print(&rewritten).expect("print");
    let lines = if vertical { normalize(lines) } else { lines };
    render(&lines).text
}

fn at(level: EsLevel) -> Options {
    Options::default().with_eslevel(level)
}

fn call(name: &str) -> Node {
    s!(Send, Child::NIL, name)
}

fn str_node(text: &str) -> Node {
    s!(Str, Child::str(text))
}

// =============================================================================
// Declarations
// =============================================================================

#[test]
fn test_first_assignment_declares_with_var_or_let() {
    let ast = s!(Lvasgn, "a", s!(Int, 1i64));
    assert_eq!(emit(&ast, &at(EsLevel::ES5), false), "var a = 1");
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "let a = 1");
}

#[test]
fn test_reassignment_is_not_redeclared() {
    let ast = s!(Begin, s!(Lvasgn, "a", s!(Int, 1i64)), s!(Lvasgn, "a", s!(Int, 2i64)));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "let a = 1; a = 2");
}

#[test]
fn test_constant_declaration() {
    let ast = s!(Casgn, Child::NIL, "LIMIT", s!(Int, 10i64));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "const LIMIT = 10");
    assert_eq!(emit(&ast, &at(EsLevel::ES5), false), "var LIMIT = 10");
}

#[test]
fn test_local_first_assigned_in_branch_is_hoisted() {
    let ast = s!(
        Begin,
        s!(If, s!(Lvar, "c"), s!(Lvasgn, "x", s!(Int, 1i64)), Child::NIL),
        s!(Send, Child::NIL, "puts", s!(Lvar, "x"))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "let x; if (c) {x = 1}; console.log(x)"
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5), false),
        "if (c) {var x = 1}; console.log(x)"
    );
}

#[test]
fn test_multiple_assignment() {
    let ast = s!(
        Masgn,
        s!(Mlhs, s!(Lvasgn, "a"), s!(Lvasgn, "b")),
        s!(Array, s!(Int, 1i64), s!(Int, 2i64))
    );
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "let [a, b] = [1, 2]");
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5), false),
        "var _a = [1, 2]; var a = _a[0]; var b = _a[1]"
    );
}

#[test]
fn test_compound_assignment() {
    let ast = s!(
        Begin,
        s!(Lvasgn, "x", s!(Int, 0i64)),
        s!(OpAsgn, s!(Lvasgn, "x"), "+", s!(Int, 1i64)),
        s!(OpAsgn, s!(Lvasgn, "x"), "*", s!(Int, 3i64))
    );
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "let x = 0; x++; x *= 3");
}

#[test]
fn test_compound_assignment_to_an_index() {
    let increment = s!(OpAsgn, s!(Indexasgn, s!(Lvar, "a"), s!(Int, 0i64)), "+", s!(Int, 1i64));
    assert_eq!(emit(&increment, &at(EsLevel::ES2015), false), "a[0]++");

    let scale = s!(OpAsgn, s!(Indexasgn, s!(Lvar, "a"), s!(Int, 0i64)), "*", s!(Int, 2i64));
    assert_eq!(emit(&scale, &at(EsLevel::ES2015), false), "a[0] *= 2");

    let fill = s!(OrAsgn, s!(Indexasgn, s!(Lvar, "a"), s!(Int, 0i64)), s!(Int, 1i64));
    assert_eq!(emit(&fill, &at(EsLevel::ES2021), false), "a[0] ||= 1");
    assert_eq!(emit(&fill, &at(EsLevel::ES2015), false), "a[0] = a[0] || 1");
}

#[test]
fn test_lowered_compound_assignment_evaluates_the_target_once() {
    let attribute = s!(OrAsgn, s!(Send, call("g"), "x"), s!(Int, 1i64));
    assert_eq!(
        emit(&attribute, &at(EsLevel::ES5), false),
        "var _a; (_a = g()).x = _a.x || 1"
    );
    assert_eq!(emit(&attribute, &at(EsLevel::ES2021), false), "g().x ||= 1");

    let index = s!(AndAsgn, s!(Indexasgn, s!(Lvar, "h"), call("key")), s!(Int, 2i64));
    assert_eq!(
        emit(&index, &at(EsLevel::ES2015), false),
        "let _a; h[_a = key()] = h[_a] && 2"
    );

    let power = s!(OpAsgn, s!(Send, call("g"), "x"), "**", s!(Int, 2i64));
    assert_eq!(
        emit(&power, &at(EsLevel::ES5), false),
        "var _a; (_a = g()).x = Math.pow(_a.x, 2)"
    );
}

#[test]
fn test_or_assignment() {
    let fresh = s!(OrAsgn, s!(Lvasgn, "x"), s!(Int, 1i64));
    assert_eq!(emit(&fresh, &at(EsLevel::ES2015), false), "let x = 1");

    let declared = s!(
        Begin,
        s!(Lvasgn, "x", Child::NIL),
        s!(OrAsgn, s!(Lvasgn, "x"), s!(Int, 1i64))
    );
    assert_eq!(
        emit(&declared, &at(EsLevel::ES2015), false),
        "let x = null; x = x || 1"
    );
    assert_eq!(
        emit(&declared, &at(EsLevel::ES2021), false),
        "let x = null; x ||= 1"
    );
}

// =============================================================================
// Conditionals and implicit returns
// =============================================================================

#[test]
fn test_if_branches_both_return() {
    let ast = s!(
        Def,
        "f",
        s!(Args, s!(Arg, "x")),
        s!(If, s!(Lvar, "x"), s!(Int, 1i64), s!(Int, 2i64))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5), false),
        "function f(x) {if (x) {return 1} else {return 2}}"
    );
}

#[test]
fn test_if_returns_in_vertical_layout() {
    let ast = s!(
        Def,
        "f",
        s!(Args, s!(Arg, "x")),
        s!(If, s!(Lvar, "x"), s!(Int, 1i64), s!(Int, 2i64))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5), true),
        "function f(x) {\n  if (x) {\n    return 1\n  } else {\n    return 2\n  }\n}"
    );
}

#[test]
fn test_unless_negates_the_condition() {
    let ast = s!(If, s!(Lvar, "done"), Child::NIL, call("work"));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "if (!done) {work()}");
}

#[test]
fn test_elsif_chain() {
    let ast = s!(
        If,
        s!(Lvar, "a"),
        call("one"),
        s!(If, s!(Lvar, "b"), call("two"), call("three"))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "if (a) {one()} else if (b) {two()} else {three()}"
    );
}

#[test]
fn test_blank_line_before_block_in_vertical_layout() {
    let ast = s!(
        Begin,
        s!(Lvasgn, "a", s!(Int, 1i64)),
        s!(If, s!(Lvar, "a"), call("foo"), Child::NIL)
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), true),
        "let a = 1;\n\nif (a) {\n  foo()\n}"
    );
}

#[test]
fn test_blank_line_after_function_in_vertical_layout() {
    let ast = s!(Begin, s!(Def, "f", s!(Args), call("a")), call("f"));
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), true),
        "function f() {\n  return a()\n}\n\nf()"
    );
}

// =============================================================================
// Case
// =============================================================================

#[test]
fn test_case_becomes_switch() {
    let ast = s!(
        Case,
        s!(Lvar, "x"),
        s!(When, s!(Int, 1i64), call("a")),
        s!(When, s!(Int, 2i64), s!(Int, 3i64), call("b")),
        call("c")
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "switch (x) {case 1: a(); break; case 2: case 3: b(); break; default: c()}"
    );
}

#[test]
fn test_switch_labels_in_vertical_layout() {
    let ast = s!(
        Case,
        s!(Lvar, "x"),
        s!(When, s!(Int, 1i64), call("a")),
        call("c")
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), true),
        "switch (x) {\ncase 1:\n  a();\n  break;\ndefault:\n  c()\n}"
    );
}

#[test]
fn test_case_with_range_becomes_if_chain() {
    let ast = s!(
        Case,
        s!(Lvar, "x"),
        s!(When, s!(Irange, s!(Int, 1i64), s!(Int, 5i64)), call("a")),
        call("b")
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "if (x >= 1 && x <= 5) {a()} else {b()}"
    );
}

#[test]
fn test_case_breaking_out_of_loop_avoids_switch() {
    let ast = s!(
        While,
        s!(True),
        s!(Case, s!(Lvar, "x"), s!(When, s!(Int, 1i64), s!(Break)))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "while (true) {if (x == 1) {break}}"
    );
}

// =============================================================================
// Loops
// =============================================================================

#[test]
fn test_while_loop() {
    let ast = s!(
        Begin,
        s!(Lvasgn, "x", s!(Int, 0i64)),
        s!(
            While,
            s!(Send, s!(Lvar, "x"), "<", s!(Int, 10i64)),
            s!(OpAsgn, s!(Lvasgn, "x"), "+", s!(Int, 1i64))
        )
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "let x = 0; while (x < 10) {x++}"
    );
}

#[test]
fn test_until_loop_negates() {
    let ast = s!(Until, s!(Lvar, "done"), call("step"));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "while (!done) {step()}");
}

#[test]
fn test_post_condition_loop() {
    let ast = s!(WhilePost, s!(Lvar, "more"), s!(Kwbegin, call("step")));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "do {step()} while (more)");
}

#[test]
fn test_for_over_range() {
    let ast = s!(
        For,
        s!(Lvasgn, "i"),
        s!(Irange, s!(Int, 1i64), s!(Int, 3i64)),
        s!(Send, Child::NIL, "puts", s!(Lvar, "i"))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "for (let i = 1; i <= 3; i++) {console.log(i)}"
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5), false),
        "for (var i = 1; i <= 3; i++) {console.log(i)}"
    );
}

#[test]
fn test_for_over_collection() {
    let ast = s!(
        For,
        s!(Lvasgn, "x"),
        s!(Lvar, "list"),
        s!(Send, Child::NIL, "puts", s!(Lvar, "x"))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "for (let x of list) {console.log(x)}"
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5), false),
        "for (var _a = 0; _a < list.length; _a++) {var x = list[_a]; console.log(x)}"
    );
}

#[test]
fn test_next_in_loop_continues() {
    let ast = s!(While, s!(Lvar, "go"), s!(Next));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "while (go) {continue}");
}

#[test]
fn test_break_outside_loop_is_rejected() {
    let options = at(EsLevel::ES2015);
    let pipeline = Pipeline::from_options(&options, &Registry::builtin()).expect("pipeline");
    let ast = pipeline.run(&s!(Break), &options).expect("rewrite");
    let err = Printer::new(&options).print(&ast).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.stage(), "emit");
}

// =============================================================================
// Exceptions
// =============================================================================

#[test]
fn test_rescue_with_variable() {
    let ast = s!(
        Kwbegin,
        s!(
            Rescue,
            call("risky"),
            s!(Resbody, Child::NIL, s!(Lvasgn, "e"), s!(Send, Child::NIL, "puts", s!(Lvar, "e"))),
            Child::NIL
        )
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "try {risky()} catch (e) {console.log(e)}"
    );
}

#[test]
fn test_rescue_without_variable_omits_binding_from_es2019() {
    let ast = s!(
        Kwbegin,
        s!(Rescue, call("risky"), s!(Resbody, Child::NIL, Child::NIL, call("recover")), Child::NIL)
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2019), false),
        "try {risky()} catch {recover()}"
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "try {risky()} catch ($EXCEPTION) {recover()}"
    );
}

#[test]
fn test_rescue_by_class() {
    let ast = s!(
        Kwbegin,
        s!(
            Rescue,
            call("risky"),
            s!(
                Resbody,
                s!(Array, s!(Const, Child::NIL, "ArgumentError")),
                s!(Lvasgn, "e"),
                s!(Send, Child::NIL, "handle", s!(Lvar, "e"))
            ),
            Child::NIL
        )
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "try {risky()} catch ($EXCEPTION) {if ($EXCEPTION instanceof ArgumentError) \
         {let e = $EXCEPTION; handle(e)} else {throw $EXCEPTION}}"
    );
}

#[test]
fn test_ensure_becomes_finally() {
    let ast = s!(Kwbegin, s!(Ensure, call("a"), call("b")));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015), false), "try {a()} finally {b()}");
}

#[test]
fn test_raise_with_message() {
    let ast = s!(Send, Child::NIL, "raise", str_node("boom"));
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015), false),
        "throw new Error(\"boom\")"
    );
}

// =============================================================================
// Modules
// =============================================================================

#[test]
fn test_import_and_export() {
    let import = s!(Send, Child::NIL, "import", str_node("lib"));
    assert_eq!(emit(&import, &at(EsLevel::ES2015), false), "import \"lib\"");

    let export = s!(
        Send,
        Child::NIL,
        "export",
        s!(Send, Child::NIL, "default", s!(Lvar, "x"))
    );
    assert_eq!(emit(&export, &at(EsLevel::ES2015), false), "export default x");
}

#[test]
fn test_autoexports_marks_top_level_definitions() {
    let options = Options {
        autoexports: true,
        ..at(EsLevel::ES2015)
    };
    let ast = s!(Def, "f", s!(Args), Child::NIL);
    assert_eq!(emit(&ast, &options, false), "export function f() {}");
}
