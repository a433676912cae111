//! Classes and modules at both class-syntax and prototype tiers.

use r2js_ast::{Child, Node, s};
use r2js_common::EsLevel;
use r2js_emitter::{Options, Pipeline, Printer, Registry, Result, render};

fn try_emit(ast: &Node, options: &Options) -> Result<String> {
    let pipeline = Pipeline::from_options(options, &Registry::builtin())?;
    let rewritten = pipeline.run(ast, options)?;
    let lines = Printer::new(options).print(&rewritten)?;
    Ok(render(&lines).text)
}

fn emit(ast: &Node, level: EsLevel) -> String {
    try_emit(ast, &Options::default().with_eslevel(level)).expect("conversion")
}

fn konst(name: &str) -> Node {
    s!(Const, Child::NIL, name)
}

fn lvar(name: &str) -> Node {
    s!(Lvar, name)
}

fn args(names: &[&str]) -> Node {
    Node::new(
        r2js_ast::NodeKind::Args,
        names.iter().map(|name| Child::from(s!(Arg, *name))).collect(),
    )
}

/// `class Point; def initialize(x) @x = x end; def x; @x end; end`
fn point() -> Node {
    s!(
        Class,
        konst("Point"),
        Child::NIL,
        s!(
            Begin,
            s!(Def, "initialize", args(&["x"]), s!(Ivasgn, "@x", lvar("x"))),
            s!(Def, "x", args(&[]), s!(Ivar, "@x"))
        )
    )
}

#[test]
fn test_class_declaration() {
    assert_eq!(
        emit(&point(), EsLevel::ES2015),
        "class Point {constructor(x) {this._x = x}; get x() {return this._x}}"
    );
}

#[test]
fn test_class_as_constructor_function() {
    assert_eq!(
        emit(&point(), EsLevel::ES5),
        "function Point(x) {this._x = x}; Object.defineProperty(Point.prototype, \"x\", {enumerable: true, configurable: true, get: function() {return this._x}})"
    );
}

#[test]
fn test_vertical_class_layout() {
    let options = Options::default().with_eslevel(EsLevel::ES2015);
    let pipeline = Pipeline::from_options(&options, &Registry::builtin()).expect("pipeline");
    let rewritten = pipeline.run(&point(), &options).expect("rewrite");
    let lines = Printer::new(&options).vertical(true).print(&rewritten).expect("print");
    let text = render(&r2js_emitter::normalize(lines)).text;
    assert_eq!(
        text,
        "class Point {\n  constructor(x) {\n    this._x = x\n  }\n\n  get x() {\n    return this._x\n  }\n}"
    );
}

fn dog() -> Node {
    s!(
        Class,
        konst("Dog"),
        konst("Animal"),
        s!(
            Begin,
            s!(Def, "initialize", args(&["name"]), s!(Zsuper)),
            s!(Def, "speak", args(&["x"]), s!(Super, lvar("x")))
        )
    )
}

#[test]
fn test_inheritance_and_super() {
    assert_eq!(
        emit(&dog(), EsLevel::ES2015),
        "class Dog extends Animal {constructor(name) {super(name)}; speak(x) {return super.speak(x)}}"
    );
}

#[test]
fn test_inheritance_through_prototypes() {
    assert_eq!(
        emit(&dog(), EsLevel::ES5),
        "function Dog(name) {Animal.call(this, name)}; \
         Dog.prototype = Object.create(Animal.prototype); \
         Dog.prototype.constructor = Dog; \
         Dog.prototype.speak = function(x) {return Animal.prototype.speak.call(this, x)}"
    );
}

#[test]
fn test_attribute_accessors() {
    let ast = s!(
        Class,
        konst("Box"),
        Child::NIL,
        s!(Send, Child::NIL, "attr_accessor", s!(Sym, "size"))
    );
    assert_eq!(
        emit(&ast, EsLevel::ES2015),
        "class Box {get size() {return this._size}; set size(size) {this._size = size}}"
    );
    assert_eq!(
        emit(&ast, EsLevel::ES5),
        "function Box() {}; Object.defineProperty(Box.prototype, \"size\", {enumerable: true, configurable: true, \
         get: function() {return this._size}, set: function(size) {this._size = size}})"
    );
}

#[test]
fn test_getters_are_read_without_parentheses() {
    let ast = s!(
        Class,
        konst("Circle"),
        Child::NIL,
        s!(
            Begin,
            s!(Def, "initialize", args(&["r"]), s!(Ivasgn, "@r", lvar("r"))),
            s!(
                Def,
                "area",
                args(&[]),
                s!(Send, s!(Int, 3i64), "*", s!(Send, Child::NIL, "radius"))
            ),
            s!(Def, "radius", args(&[]), s!(Ivar, "@r"))
        )
    );
    assert_eq!(
        emit(&ast, EsLevel::ES2015),
        "class Circle {constructor(r) {this._r = r}; get area() {return 3 * this.radius}; get radius() {return this._r}}"
    );
}

#[test]
fn test_bang_methods_stay_methods() {
    let ast = s!(
        Class,
        konst("Job"),
        Child::NIL,
        s!(Def, "run!", args(&[]), s!(Send, Child::NIL, "work"))
    );
    assert_eq!(emit(&ast, EsLevel::ES2015), "class Job {run() {return work()}}");
}

#[test]
fn test_static_methods() {
    let ast = s!(
        Class,
        konst("Counter"),
        Child::NIL,
        s!(Defs, s!(SelfRef), "zero", args(&["x"]), lvar("x"))
    );
    assert_eq!(emit(&ast, EsLevel::ES2015), "class Counter {static zero(x) {return x}}");
    assert_eq!(
        emit(&ast, EsLevel::ES5),
        "function Counter() {}; Counter.zero = function(x) {return x}"
    );
}

#[test]
fn test_class_constants() {
    let ast = s!(
        Class,
        konst("Config"),
        Child::NIL,
        s!(Casgn, Child::NIL, "LIMIT", s!(Int, 5i64))
    );
    assert_eq!(emit(&ast, EsLevel::ES2022), "class Config {static LIMIT = 5}");
    assert_eq!(emit(&ast, EsLevel::ES2015), "class Config {}; Config.LIMIT = 5");
}

#[test]
fn test_module_becomes_object() {
    let ast = s!(
        Module,
        konst("Util"),
        s!(
            Defs,
            s!(SelfRef),
            "twice",
            args(&["x"]),
            s!(Send, lvar("x"), "*", s!(Int, 2i64))
        )
    );
    assert_eq!(emit(&ast, EsLevel::ES2015), "const Util = {twice(x) {return x * 2}}");
    assert_eq!(emit(&ast, EsLevel::ES5), "var Util = {twice: function(x) {return x * 2}}");
}

#[test]
fn test_nested_class_is_unsupported() {
    let ast = s!(
        Class,
        konst("Outer"),
        Child::NIL,
        s!(Class, konst("Inner"), Child::NIL, Child::NIL)
    );
    let err = try_emit(&ast, &Options::default().with_eslevel(EsLevel::ES2015)).unwrap_err();
    assert!(err.is_unsupported());
    assert_eq!(err.stage(), "emit");
}

#[test]
fn test_super_outside_class_is_unsupported() {
    let ast = s!(Def, "f", args(&[]), s!(Zsuper));
    let err = try_emit(&ast, &Options::default().with_eslevel(EsLevel::ES2015)).unwrap_err();
    assert!(err.is_unsupported());
}
