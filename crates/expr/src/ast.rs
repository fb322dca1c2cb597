//! Expression tree produced by the parser.

use indexmap::IndexMap;

/// A literal constant as written in the source.
#[derive(Debug, Clone, PartialEq)]
pub enum Constant {
    None,
    Bool(bool),
    /// Integer digits in the given radix, without sign or separators.
    Int { digits: String, radix: u32 },
    /// Float text as written, without separators.
    Float(String),
    Str(String),
}

/// Which bracket form a comprehension was written in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComprehensionKind {
    Generator,
    List,
    Set,
    Dict,
}

/// A parsed, unevaluated expression.
#[derive(Debug, Clone, PartialEq)]
pub enum Expr {
    Constant(Constant),
    Name(String),
    Attribute {
        value: Box<Expr>,
        attr: String,
    },
    Subscript {
        value: Box<Expr>,
        index: Box<Expr>,
    },
    Call(Call),
    Unary {
        op: &'static str,
        operand: Box<Expr>,
    },
    Binary {
        op: &'static str,
        left: Box<Expr>,
        right: Box<Expr>,
    },
    List(Vec<Expr>),
    Tuple(Vec<Expr>),
    Set(Vec<Expr>),
    Dict(Vec<(Expr, Expr)>),
    /// The element expression of a comprehension; its clauses are not kept.
    Comprehension {
        kind: ComprehensionKind,
        element: Box<Expr>,
    },
}

impl Expr {
    /// Short human-readable name of the node kind, used in error messages.
    pub fn describe(&self) -> &'static str {
        match self {
            Self::Constant(_) => "literal",
            Self::Name(_) => "name",
            Self::Attribute { .. } => "attribute access",
            Self::Subscript { .. } => "subscript",
            Self::Call(_) => "call",
            Self::Unary { .. } => "unary operation",
            Self::Binary { .. } => "binary operation",
            Self::List(_) => "list",
            Self::Tuple(_) => "tuple",
            Self::Set(_) => "set",
            Self::Dict(_) => "dict",
            Self::Comprehension { .. } => "comprehension",
        }
    }
}

/// A call node: callee plus its arguments in source order.
#[derive(Debug, Clone, PartialEq)]
pub struct Call {
    pub func: Box<Expr>,
    pub args: Vec<Argument>,
}

#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Positional(Expr),
    Keyword { name: String, value: Expr },
    /// `*value`
    Starred(Expr),
    /// `**value`
    DoubleStarred(Expr),
}

/// A validated call to a bare name with unevaluated arguments.
///
/// Only [`parse_call`](crate::parse_call) constructs this, so holding one
/// means the call shape has been checked.
#[derive(Debug, Clone, PartialEq)]
pub struct CallExpr {
    name: String,
    args: Vec<Expr>,
    kwargs: IndexMap<String, Expr>,
}

impl CallExpr {
    pub(crate) fn new(name: String, args: Vec<Expr>, kwargs: IndexMap<String, Expr>) -> Self {
        Self { name, args, kwargs }
    }

    /// The bare callee name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Positional argument nodes in source order.
    pub fn args(&self) -> &[Expr] {
        &self.args
    }

    /// Keyword argument nodes in source order; names are unique.
    pub fn kwargs(&self) -> &IndexMap<String, Expr> {
        &self.kwargs
    }
}
