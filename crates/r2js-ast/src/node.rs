//! The immutable tree shared by every stage.
//!
//! A [`Node`] is a cheap handle (`Arc`) to a kind, an ordered list of
//! [`Child`]ren and an optional [`SourceSpan`]. Nodes are never mutated;
//! rewrites build new nodes with [`Node::new`] or [`Node::updated`], and
//! unchanged subtrees are shared between the input and output trees.

use crate::kind::NodeKind;
use crate::literal::Literal;
use r2js_common::SourceSpan;
use std::fmt;
use std::sync::Arc;

/// One child slot of a node: either a subtree or a literal value.
#[derive(Clone, Debug, PartialEq)]
pub enum Child {
    Node(Node),
    Lit(Literal),
}

impl Child {
    /// The empty slot (`nil` in the parser's output).
    pub const NIL: Child = Child::Lit(Literal::Nil);

    pub fn sym(name: impl Into<String>) -> Child {
        Child::Lit(Literal::Sym(name.into()))
    }

    pub fn str(value: impl Into<String>) -> Child {
        Child::Lit(Literal::Str(value.into()))
    }

    pub fn is_nil(&self) -> bool {
        matches!(self, Child::Lit(Literal::Nil))
    }

    pub fn as_node(&self) -> Option<&Node> {
        match self {
            Child::Node(node) => Some(node),
            Child::Lit(_) => None,
        }
    }

    pub fn as_literal(&self) -> Option<&Literal> {
        match self {
            Child::Lit(literal) => Some(literal),
            Child::Node(_) => None,
        }
    }

    pub fn as_sym(&self) -> Option<&str> {
        self.as_literal().and_then(Literal::as_sym)
    }

    pub fn as_str(&self) -> Option<&str> {
        self.as_literal().and_then(Literal::as_str)
    }

    pub fn as_int(&self) -> Option<i64> {
        self.as_literal().and_then(Literal::as_int)
    }
}

impl From<Node> for Child {
    fn from(node: Node) -> Self {
        Child::Node(node)
    }
}

impl From<&Node> for Child {
    fn from(node: &Node) -> Self {
        Child::Node(node.clone())
    }
}

impl From<Option<Node>> for Child {
    fn from(node: Option<Node>) -> Self {
        node.map_or(Child::NIL, Child::Node)
    }
}

impl From<Literal> for Child {
    fn from(literal: Literal) -> Self {
        Child::Lit(literal)
    }
}

/// Bare string slices become symbols: method and variable names are by far
/// the most common literal built by hand. Use [`Child::str`] for string values.
impl From<&str> for Child {
    fn from(name: &str) -> Self {
        Child::sym(name)
    }
}

impl From<i64> for Child {
    fn from(value: i64) -> Self {
        Child::Lit(Literal::Int(value))
    }
}

impl From<f64> for Child {
    fn from(value: f64) -> Self {
        Child::Lit(Literal::Float(value))
    }
}

impl From<bool> for Child {
    fn from(value: bool) -> Self {
        Child::Lit(Literal::Bool(value))
    }
}

struct NodeData {
    kind: NodeKind,
    children: Vec<Child>,
    location: Option<SourceSpan>,
}

/// Immutable, reference-counted syntax tree node.
#[derive(Clone)]
pub struct Node(Arc<NodeData>);

impl Node {
    pub fn new(kind: NodeKind, children: Vec<Child>) -> Node {
        Node::with_location(kind, children, None)
    }

    pub fn with_location(
        kind: NodeKind,
        children: Vec<Child>,
        location: Option<SourceSpan>,
    ) -> Node {
        Node(Arc::new(NodeData {
            kind,
            children,
            location,
        }))
    }

    #[inline]
    pub fn kind(&self) -> NodeKind {
        self.0.kind
    }

    #[inline]
    pub fn is(&self, kind: NodeKind) -> bool {
        self.0.kind == kind
    }

    #[inline]
    pub fn children(&self) -> &[Child] {
        &self.0.children
    }

    pub fn location(&self) -> Option<&SourceSpan> {
        self.0.location.as_ref()
    }

    pub fn child(&self, index: usize) -> Option<&Child> {
        self.0.children.get(index)
    }

    /// The child at `index` if it is a node (a `nil` slot yields `None`).
    pub fn node_at(&self, index: usize) -> Option<&Node> {
        self.child(index).and_then(Child::as_node)
    }

    pub fn sym_at(&self, index: usize) -> Option<&str> {
        self.child(index).and_then(Child::as_sym)
    }

    pub fn str_at(&self, index: usize) -> Option<&str> {
        self.child(index).and_then(Child::as_str)
    }

    /// Iterate over the node children, skipping literals.
    pub fn child_nodes(&self) -> impl Iterator<Item = &Node> {
        self.0.children.iter().filter_map(Child::as_node)
    }

    /// A replacement for this node: the kind (if given) and children change,
    /// the location is kept.
    #[must_use]
    pub fn updated(&self, kind: Option<NodeKind>, children: Vec<Child>) -> Node {
        Node::with_location(
            kind.unwrap_or(self.0.kind),
            children,
            self.0.location.clone(),
        )
    }

    /// The same node with a different location.
    #[must_use]
    pub fn relocated(&self, location: Option<SourceSpan>) -> Node {
        Node::with_location(self.0.kind, self.0.children.clone(), location)
    }

    /// Whether both handles point at the same allocation.
    #[inline]
    pub fn ptr_eq(a: &Node, b: &Node) -> bool {
        Arc::ptr_eq(&a.0, &b.0)
    }

    /// Pre-order walk over this node and every descendant node.
    pub fn walk(&self, visit: &mut impl FnMut(&Node)) {
        visit(self);
        for child in self.child_nodes() {
            child.walk(visit);
        }
    }

    /// Number of nodes in the subtree, this one included.
    pub fn subtree_size(&self) -> usize {
        let mut count = 0;
        self.walk(&mut |_| count += 1);
        count
    }

    /// Whether any node in the subtree carries a location.
    pub fn has_any_location(&self) -> bool {
        self.location().is_some() || self.child_nodes().any(Node::has_any_location)
    }
}

/// Structural equality: kind and children, ignoring locations.
impl PartialEq for Node {
    fn eq(&self, other: &Node) -> bool {
        Node::ptr_eq(self, other)
            || (self.0.kind == other.0.kind && self.0.children == other.0.children)
    }
}

/// S-expression rendering, e.g. `s(:send, nil, :puts, s(:str, "hi"))`.
impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "s(:{}", self.0.kind)?;
        for child in &self.0.children {
            f.write_str(", ")?;
            match child {
                Child::Node(node) => write!(f, "{node}")?,
                Child::Lit(literal) => write!(f, "{literal}")?,
            }
        }
        f.write_str(")")
    }
}

impl fmt::Debug for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

/// Build a node from a kind name and children convertible into [`Child`].
///
/// ```
/// use r2js_ast::{s, Child};
/// let call = s!(Send, Child::NIL, "puts", s!(Str, Child::str("hi")));
/// assert_eq!(call.to_string(), "s(:send, nil, :puts, s(:str, \"hi\"))");
/// ```
#[macro_export]
macro_rules! s {
    ($kind:ident $(, $child:expr)* $(,)?) => {
        $crate::Node::new(
            $crate::NodeKind::$kind,
            vec![$($crate::Child::from($child)),*],
        )
    };
}
