//! Node kinds.
//!
//! Names follow the parser's own spelling (`op_asgn`, `while_post`,
//! `defined?`) so that trees can be exchanged as JSON without a mapping table.
//! The last group of kinds never comes out of the parser; filters introduce
//! them and only the printer consumes them.

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

macro_rules! node_kinds {
    ($($(#[$meta:meta])* $variant:ident => $name:literal,)*) => {
        #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
        pub enum NodeKind {
            $($(#[$meta])* $variant,)*
        }

        impl NodeKind {
            /// Every kind, in declaration order.
            pub const ALL: &'static [NodeKind] = &[$(NodeKind::$variant,)*];

            pub const fn as_str(self) -> &'static str {
                match self {
                    $(NodeKind::$variant => $name,)*
                }
            }

            pub fn from_name(name: &str) -> Option<NodeKind> {
                match name {
                    $($name => Some(NodeKind::$variant),)*
                    _ => None,
                }
            }
        }
    };
}

node_kinds! {
    // Literals
    Nil => "nil",
    True => "true",
    False => "false",
    Int => "int",
    Float => "float",
    Str => "str",
    /// Interpolated string: children are `str` nodes and `begin` wrappers.
    Dstr => "dstr",
    Sym => "sym",
    Dsym => "dsym",
    /// `(regexp parts... (regopt flags...))`
    Regexp => "regexp",
    Regopt => "regopt",
    Xstr => "xstr",
    Array => "array",
    Hash => "hash",
    Pair => "pair",
    Kwsplat => "kwsplat",
    Splat => "splat",
    Irange => "irange",
    Erange => "erange",
    SelfRef => "self",

    // Variables and assignment
    Lvar => "lvar",
    Ivar => "ivar",
    Cvar => "cvar",
    Gvar => "gvar",
    Const => "const",
    Cbase => "cbase",
    Lvasgn => "lvasgn",
    Ivasgn => "ivasgn",
    Cvasgn => "cvasgn",
    Gvasgn => "gvasgn",
    Casgn => "casgn",
    Masgn => "masgn",
    Mlhs => "mlhs",
    OpAsgn => "op_asgn",
    OrAsgn => "or_asgn",
    AndAsgn => "and_asgn",

    // Control flow
    Begin => "begin",
    Kwbegin => "kwbegin",
    If => "if",
    Case => "case",
    When => "when",
    While => "while",
    Until => "until",
    WhilePost => "while_post",
    UntilPost => "until_post",
    For => "for",
    Break => "break",
    Next => "next",
    Return => "return",
    Rescue => "rescue",
    Resbody => "resbody",
    Ensure => "ensure",
    Retry => "retry",
    Redo => "redo",
    And => "and",
    Or => "or",
    Not => "not",
    Defined => "defined?",

    // Definitions and calls
    Def => "def",
    Defs => "defs",
    Args => "args",
    Arg => "arg",
    Optarg => "optarg",
    Restarg => "restarg",
    Kwarg => "kwarg",
    Kwoptarg => "kwoptarg",
    Blockarg => "blockarg",
    Kwrestarg => "kwrestarg",
    /// Lone block parameter: `{ |x| }` → `(args (procarg0 (arg :x)))`.
    Procarg0 => "procarg0",
    Block => "block",
    BlockPass => "block_pass",
    Lambda => "lambda",
    Class => "class",
    Module => "module",
    Sclass => "sclass",
    Send => "send",
    Csend => "csend",
    /// `recv[args]`, the modern spelling of `(send recv :[] args)`.
    Index => "index",
    /// `recv[args] = value`
    Indexasgn => "indexasgn",
    Super => "super",
    Zsuper => "zsuper",
    Yield => "yield",
    Alias => "alias",
    Undef => "undef",

    // Synthetic kinds introduced by filters
    /// Wraps a body whose last statement is the implicit result.
    Autoreturn => "autoreturn",
    /// Property read with no call parens: `(attr receiver :name)`.
    Attr => "attr",
    /// Method call that always gets parens: `(call receiver :name args...)`.
    Call => "call",
    /// `(throw value)`
    Throw => "throw",
    /// Statements that are emitted but not surfaced as a tail value.
    Hide => "hide",
    /// `(import (str source) binding?)`
    Import => "import",
    /// `(export default? node)`
    Export => "export",
}

impl NodeKind {
    pub const fn is_assignment(self) -> bool {
        matches!(
            self,
            NodeKind::Lvasgn
                | NodeKind::Ivasgn
                | NodeKind::Cvasgn
                | NodeKind::Gvasgn
                | NodeKind::Casgn
        )
    }

    pub const fn is_loop(self) -> bool {
        matches!(
            self,
            NodeKind::While
                | NodeKind::Until
                | NodeKind::WhilePost
                | NodeKind::UntilPost
                | NodeKind::For
        )
    }

    /// Kinds that only appear inside a specific parent and have no meaning on
    /// their own (`pair` outside a hash, `when` outside a case, ...).
    pub const fn is_structural(self) -> bool {
        matches!(
            self,
            NodeKind::Pair
                | NodeKind::When
                | NodeKind::Resbody
                | NodeKind::Mlhs
                | NodeKind::Args
                | NodeKind::Arg
                | NodeKind::Optarg
                | NodeKind::Restarg
                | NodeKind::Kwarg
                | NodeKind::Kwoptarg
                | NodeKind::Blockarg
                | NodeKind::Kwrestarg
                | NodeKind::Procarg0
                | NodeKind::BlockPass
                | NodeKind::Lambda
                | NodeKind::Regopt
                | NodeKind::Cbase
        )
    }

    /// Kinds that only filters produce.
    pub const fn is_synthetic(self) -> bool {
        matches!(
            self,
            NodeKind::Autoreturn
                | NodeKind::Attr
                | NodeKind::Call
                | NodeKind::Throw
                | NodeKind::Hide
                | NodeKind::Import
                | NodeKind::Export
        )
    }
}

impl fmt::Display for NodeKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for NodeKind {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for NodeKind {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let name = String::deserialize(deserializer)?;
        NodeKind::from_name(&name)
            .ok_or_else(|| serde::de::Error::custom(format!("unknown node type `{name}`")))
    }
}
