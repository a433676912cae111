use std::fmt;

/// A leaf value stored directly in a node's children.
#[derive(Clone, Debug, PartialEq)]
pub enum Literal {
    Nil,
    Bool(bool),
    Int(i64),
    Float(f64),
    Str(String),
    /// An interned name: method names, variable names, symbol values.
    Sym(String),
    Regex { pattern: String, flags: String },
}

impl Literal {
    pub fn is_nil(&self) -> bool {
        matches!(self, Literal::Nil)
    }

    pub fn as_sym(&self) -> Option<&str> {
        match self {
            Literal::Sym(name) => Some(name),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Literal::Str(value) => Some(value),
            _ => None,
        }
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            Literal::Int(value) => Some(*value),
            _ => None,
        }
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Literal::Nil => f.write_str("nil"),
            Literal::Bool(value) => write!(f, "{value}"),
            Literal::Int(value) => write!(f, "{value}"),
            Literal::Float(value) => write!(f, "{value:?}"),
            Literal::Str(value) => write!(f, "{value:?}"),
            Literal::Sym(name) => write!(f, ":{name}"),
            Literal::Regex { pattern, flags } => write!(f, "/{pattern}/{flags}"),
        }
    }
}
