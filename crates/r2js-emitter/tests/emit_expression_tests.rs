//! Expression emission: operators and precedence, literals, calls, blocks
//! and `this` handling.

use r2js_ast::{Child, Node, s};
use r2js_common::{Comparison, EsLevel, LogicalOperator};
use r2js_emitter::{Options, Pipeline, Printer, Registry, render};

fn emit(ast: &Node, options: &Options) -> String {
    let pipeline = Pipeline::from_options(options, &Registry::builtin()).expect("pipeline");
    let rewritten = pipeline.run(ast, options).expect("rewrite");
    let lines = Printer::new(options).print(&rewritten).expect("print");
    render(&lines).text
}

fn at(level: EsLevel) -> Options {
    Options::default().with_eslevel(level)
}

fn lvar(name: &str) -> Node {
    s!(Lvar, name)
}

fn int(value: i64) -> Node {
    s!(Int, value)
}

fn assign(name: &str, value: Node) -> Node {
    s!(Lvasgn, name, value)
}

// =============================================================================
// Operators
// =============================================================================

#[test]
fn test_lower_precedence_operand_is_parenthesized() {
    let ast = s!(Send, s!(Send, int(1), "+", int(2)), "*", int(3));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "(1 + 2) * 3");

    let ast = s!(Send, int(1), "+", s!(Send, int(2), "*", int(3)));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "1 + 2 * 3");
}

#[test]
fn test_right_operand_of_same_precedence_is_parenthesized() {
    let ast = s!(Send, int(1), "-", s!(Send, int(2), "-", int(3)));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "1 - (2 - 3)");

    let ast = s!(Send, s!(Send, int(1), "-", int(2)), "-", int(3));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "1 - 2 - 3");
}

#[test]
fn test_comparison_modes() {
    let ast = s!(Send, lvar("a"), "==", lvar("b"));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "a == b");
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015).with_comparison(Comparison::Strict)),
        "a === b"
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015).with_comparison(Comparison::Identity)),
        "Object.is(a, b)"
    );

    let negated = s!(Send, lvar("a"), "!=", lvar("b"));
    assert_eq!(
        emit(&negated, &at(EsLevel::ES2015).with_comparison(Comparison::Strict)),
        "a !== b"
    );
    assert_eq!(
        emit(&negated, &at(EsLevel::ES2015).with_comparison(Comparison::Identity)),
        "!Object.is(a, b)"
    );
}

#[test]
fn test_logical_operators() {
    let ast = s!(And, s!(Or, lvar("a"), lvar("b")), lvar("c"));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "(a || b) && c");

    let or = s!(Or, lvar("a"), lvar("b"));
    assert_eq!(
        emit(&or, &at(EsLevel::ES2020).with_or(LogicalOperator::Nullish)),
        "a ?? b"
    );
}

#[test]
fn test_not_and_unary_minus() {
    let ast = s!(Send, lvar("a"), "!");
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "!a");

    let ast = s!(Send, s!(Send, lvar("a"), "+", lvar("b")), "-@");
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "-(a + b)");
}

#[test]
fn test_power_operator() {
    let ast = s!(Send, lvar("a"), "**", int(2));
    assert_eq!(emit(&ast, &at(EsLevel::ES2016)), "a ** 2");
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "Math.pow(a, 2)");
}

#[test]
fn test_regexp_match() {
    let pattern = s!(Regexp, s!(Str, Child::str("^ab")), s!(Regopt, "i"));
    let ast = s!(Send, lvar("s"), "=~", pattern);
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "/^ab/i.test(s)");
}

#[test]
fn test_ternary() {
    let ast = assign("y", s!(If, lvar("c"), int(1), int(2)));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "let y = c ? 1 : 2");
}

// =============================================================================
// Literals
// =============================================================================

#[test]
fn test_symbols_and_strings() {
    assert_eq!(emit(&s!(Sym, "foo"), &at(EsLevel::ES2015)), "\"foo\"");
    assert_eq!(
        emit(&s!(Str, Child::str("say \"hi\"")), &at(EsLevel::ES2015)),
        "\"say \\\"hi\\\"\""
    );
}

#[test]
fn test_line_separators_are_escaped_in_strings() {
    let ast = s!(Str, Child::str("a\u{2028}b\u{2029}c"));
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), r#""a\u2028b\u2029c""#);
    assert_eq!(emit(&ast, &at(EsLevel::ES2022)), r#""a\u2028b\u2029c""#);
}

#[test]
fn test_interpolation() {
    let ast = s!(
        Dstr,
        s!(Str, Child::str("a")),
        s!(Begin, lvar("x")),
        s!(Str, Child::str("b"))
    );
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "`a${x}b`");
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "\"a\" + x + \"b\"");
}

#[test]
fn test_hash_literal() {
    let ast = assign(
        "h",
        s!(
            Hash,
            s!(Pair, s!(Sym, "a"), int(1)),
            s!(Pair, s!(Str, Child::str("b c")), int(2))
        ),
    );
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "let h = {a: 1, \"b c\": 2}");
}

#[test]
fn test_hash_shorthand_from_es2015() {
    let ast = assign("h", s!(Hash, s!(Pair, s!(Sym, "x"), lvar("x"))));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "let h = {x}");
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "var h = {x: x}");
}

#[test]
fn test_hash_splat() {
    let ast = assign(
        "h",
        s!(Hash, s!(Pair, s!(Sym, "a"), int(1)), s!(Kwsplat, lvar("b"))),
    );
    assert_eq!(emit(&ast, &at(EsLevel::ES2018)), "let h = {a: 1, ...b}");
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "let h = Object.assign({}, {a: 1}, b)"
    );
}

#[test]
fn test_array_splat() {
    let ast = assign("list", s!(Array, int(1), s!(Splat, lvar("rest"))));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "let list = [1, ...rest]");
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "var list = [1].concat(rest)");
}

#[test]
fn test_object_literal_statement_is_wrapped() {
    let ast = s!(Hash, s!(Pair, s!(Sym, "a"), int(1)));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "({a: 1})");
}

// =============================================================================
// Calls and indexing
// =============================================================================

#[test]
fn test_call_without_arguments() {
    assert_eq!(emit(&s!(Send, Child::NIL, "foo"), &at(EsLevel::ES2015)), "foo()");
    assert_eq!(emit(&s!(Send, lvar("a"), "size"), &at(EsLevel::ES2015)), "a.length");
    assert_eq!(emit(&s!(Send, lvar("a"), "bar"), &at(EsLevel::ES2015)), "a.bar");
}

#[test]
fn test_puts_becomes_console_log() {
    let ast = s!(Send, Child::NIL, "puts", s!(Str, Child::str("hi")));
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "console.log(\"hi\")");
}

#[test]
fn test_safe_navigation() {
    let ast = s!(Csend, lvar("a"), "b");
    assert_eq!(emit(&ast, &at(EsLevel::ES2020)), "a?.b");
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "a && a.b");
}

#[test]
fn test_safe_navigation_evaluates_a_call_receiver_once() {
    let ast = s!(Csend, s!(Send, Child::NIL, "next_id"), "b");
    assert_eq!(emit(&ast, &at(EsLevel::ES2020)), "next_id()?.b");
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "var _a; (_a = next_id()) && _a.b");

    let with_args = s!(Csend, s!(Send, Child::NIL, "next_id"), "fetch", int(1));
    assert_eq!(
        emit(&with_args, &at(EsLevel::ES2015)),
        "let _a; (_a = next_id()) && _a.fetch(1)"
    );
}

#[test]
fn test_negative_and_range_index() {
    let last = s!(Send, lvar("a"), "[]", int(-1));
    assert_eq!(emit(&last, &at(EsLevel::ES2022)), "a.at(-1)");
    assert_eq!(emit(&last, &at(EsLevel::ES2015)), "a[a.length - 1]");

    let slice = s!(Send, lvar("a"), "[]", s!(Irange, int(1), int(2)));
    assert_eq!(emit(&slice, &at(EsLevel::ES2015)), "a.slice(1, 3)");
}

#[test]
fn test_splat_call_below_es2015_uses_apply() {
    let ast = s!(Send, lvar("a"), "push", s!(Splat, lvar("items")));
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "a.push(...items)");
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "a.push.apply(a, items)");
}

// =============================================================================
// Blocks and functions
// =============================================================================

#[test]
fn test_block_becomes_arrow_or_function() {
    let ast = s!(
        Block,
        s!(Send, lvar("list"), "map"),
        s!(Args, s!(Arg, "x")),
        s!(Send, lvar("x"), "*", int(2))
    );
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "list.map(x => x * 2)");
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5)),
        "list.map(function(x) {return x * 2})"
    );
}

#[test]
fn test_symbol_to_proc() {
    let ast = s!(
        Send,
        lvar("list"),
        "map",
        s!(BlockPass, s!(Sym, "upcase"))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "list.map(item => item.toUpperCase())"
    );
}

#[test]
fn test_each_becomes_for_each() {
    let ast = s!(
        Block,
        s!(Send, lvar("list"), "each"),
        s!(Args, s!(Arg, "x")),
        s!(Send, Child::NIL, "puts", lvar("x"))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "list.forEach(x => console.log(x))"
    );
}

#[test]
fn test_lambda() {
    let ast = assign(
        "f",
        s!(Block, s!(Lambda), s!(Args, s!(Arg, "x")), lvar("x")),
    );
    assert_eq!(emit(&ast, &at(EsLevel::ES2015)), "let f = x => x");
    assert_eq!(emit(&ast, &at(EsLevel::ES5)), "var f = function(x) {return x}");
}

#[test]
fn test_self_inside_block_uses_alias_below_es2015() {
    let ast = s!(
        Def,
        "f",
        s!(Args),
        s!(
            Block,
            s!(Send, lvar("a"), "each"),
            s!(Args, s!(Arg, "x")),
            s!(Send, s!(SelfRef), "g", lvar("x"))
        )
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5)),
        "function f() {var _this = this; return a.forEach(function(x) {return _this.g(x)})}"
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "function f() {return a.forEach(x => this.g(x))}"
    );
}

#[test]
fn test_default_and_rest_parameters() {
    let ast = s!(
        Def,
        "f",
        s!(Args, s!(Optarg, "a", int(1)), s!(Restarg, "rest")),
        lvar("a")
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "function f(a = 1, ...rest) {return a}"
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES5)),
        "function f(a) {if (a == null) a = 1; var rest = Array.prototype.slice.call(arguments, 1); return a}"
    );
}

#[test]
fn test_keyword_parameters() {
    let ast = s!(
        Def,
        "f",
        s!(Args, s!(Kwarg, "a"), s!(Kwoptarg, "b", int(2))),
        s!(Send, lvar("a"), "+", lvar("b"))
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "function f({a, b = 2}) {return a + b}"
    );
}

#[test]
fn test_yield_calls_implicit_block() {
    let ast = s!(Def, "twice", s!(Args), s!(Begin, s!(Yield), s!(Yield)));
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "function twice(_implicitBlockYield) {_implicitBlockYield(); return _implicitBlockYield()}"
    );
}

#[test]
fn test_statement_in_expression_position_becomes_iife() {
    let ast = assign(
        "y",
        s!(
            Kwbegin,
            s!(Ensure, s!(Send, Child::NIL, "compute"), s!(Send, Child::NIL, "cleanup"))
        ),
    );
    assert_eq!(
        emit(&ast, &at(EsLevel::ES2015)),
        "let y = (() => {try {return compute()} finally {cleanup()}})()"
    );
}
