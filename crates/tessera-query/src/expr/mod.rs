//! Expression trees.
//!
//! Expressions are immutable trees. Rewrites such as binding pattern labels to
//! the current vertex or edge produce new trees (see [`Expr::rewrite_labels`]),
//! so one filter can be specialised independently for every traversal hop.

mod eval;
mod rewrite;

use std::fmt;

use serde::{Deserialize, Serialize};
use tessera_core::Value;

pub use eval::{
    Bindings, ConditionBindings, EmptyBindings, EvalError, EvalResult, RowBindings, VertexBindings,
};
pub use rewrite::{LabelTarget, PropRefs};

/// Comparison operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationalOp {
    /// `==`
    Eq,
    /// `!=`
    Ne,
    /// `<`
    Lt,
    /// `<=`
    Le,
    /// `>`
    Gt,
    /// `>=`
    Ge,
    /// `IN` (right side is a list)
    In,
}

impl fmt::Display for RelationalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Eq => "==",
            Self::Ne => "!=",
            Self::Lt => "<",
            Self::Le => "<=",
            Self::Gt => ">",
            Self::Ge => ">=",
            Self::In => "IN",
        };
        f.write_str(s)
    }
}

/// Three-valued boolean connectives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LogicalOp {
    /// `AND`
    And,
    /// `OR`
    Or,
    /// `XOR`
    Xor,
}

impl fmt::Display for LogicalOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::And => "AND",
            Self::Or => "OR",
            Self::Xor => "XOR",
        };
        f.write_str(s)
    }
}

/// Arithmetic operators.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ArithmeticOp {
    /// `+` (also string concatenation)
    Add,
    /// `-`
    Sub,
    /// `*`
    Mul,
    /// `/`
    Div,
    /// `%`
    Mod,
}

impl fmt::Display for ArithmeticOp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Add => "+",
            Self::Sub => "-",
            Self::Mul => "*",
            Self::Div => "/",
            Self::Mod => "%",
        };
        f.write_str(s)
    }
}

/// Built-in functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Function {
    /// First vertex of a path.
    StartNode,
    /// Last vertex of a path.
    EndNode,
    /// Edges of a path, as a list.
    Relationships,
    /// Number of edges in a path, or elements in a list.
    Length,
    /// Number of elements in a list, or characters in a string.
    Size,
    /// Whether a path repeats an edge.
    HasSameEdgeInPath,
    /// Id of a vertex.
    Id,
}

impl Function {
    /// The function name as written in queries.
    #[must_use]
    pub const fn name(self) -> &'static str {
        match self {
            Self::StartNode => "startNode",
            Self::EndNode => "endNode",
            Self::Relationships => "relationships",
            Self::Length => "length",
            Self::Size => "size",
            Self::HasSameEdgeInPath => "hasSameEdgeInPath",
            Self::Id => "id",
        }
    }
}

/// An expression tree node.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Expr {
    /// A literal value.
    Constant(Value),
    /// A column of the input row (`$-.name`).
    InputProperty(String),
    /// All rows of a published variable (`$name`), as a list.
    Variable(String),
    /// The vertex of the current row.
    Vertex,
    /// The edge of the current row.
    Edge,
    /// A property of a tag on the current vertex (`tag.prop`).
    TagProperty {
        /// Tag name.
        tag: String,
        /// Property name.
        prop: String,
    },
    /// An attribute of a pattern alias (`alias.attr`), not yet bound to a row.
    LabelAttribute {
        /// The pattern alias.
        label: String,
        /// Attribute name.
        attr: String,
    },
    /// An attribute of a value (`expr.attr`).
    Attribute {
        /// The value to inspect.
        base: Box<Expr>,
        /// Attribute name.
        attr: String,
    },
    /// A comparison.
    Relational {
        /// Operator.
        op: RelationalOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// A boolean connective.
    Logical {
        /// Operator.
        op: LogicalOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// Boolean negation.
    Not(Box<Expr>),
    /// `expr IS NULL`.
    IsNull(Box<Expr>),
    /// An arithmetic operation.
    Arithmetic {
        /// Operator.
        op: ArithmeticOp,
        /// Left operand.
        left: Box<Expr>,
        /// Right operand.
        right: Box<Expr>,
    },
    /// A built-in function call.
    FunctionCall {
        /// The function.
        func: Function,
        /// Arguments.
        args: Vec<Expr>,
    },
    /// `base[index]`.
    Subscript {
        /// The container.
        base: Box<Expr>,
        /// The index or key.
        index: Box<Expr>,
    },
    /// A list literal.
    List(Vec<Expr>),
    /// Assemble a path from vertices, edges and path fragments.
    PathBuild(Vec<Expr>),
    /// Number of completed iterations of the enclosing loop.
    Iteration,
}

impl Expr {
    /// A literal.
    #[must_use]
    pub fn constant(value: impl Into<Value>) -> Self {
        Self::Constant(value.into())
    }

    /// An input column reference.
    #[must_use]
    pub fn input(name: impl Into<String>) -> Self {
        Self::InputProperty(name.into())
    }

    /// A variable reference.
    #[must_use]
    pub fn variable(name: impl Into<String>) -> Self {
        Self::Variable(name.into())
    }

    /// A tag property of the current vertex.
    #[must_use]
    pub fn tag_prop(tag: impl Into<String>, prop: impl Into<String>) -> Self {
        Self::TagProperty { tag: tag.into(), prop: prop.into() }
    }

    /// An unbound pattern alias attribute.
    #[must_use]
    pub fn label_attr(label: impl Into<String>, attr: impl Into<String>) -> Self {
        Self::LabelAttribute { label: label.into(), attr: attr.into() }
    }

    /// `self.attr`
    #[must_use]
    pub fn attr(self, attr: impl Into<String>) -> Self {
        Self::Attribute { base: Box::new(self), attr: attr.into() }
    }

    /// A function call.
    #[must_use]
    pub fn call(func: Function, args: Vec<Expr>) -> Self {
        Self::FunctionCall { func, args }
    }

    /// `self[index]`
    #[must_use]
    pub fn subscript(self, index: Expr) -> Self {
        Self::Subscript { base: Box::new(self), index: Box::new(index) }
    }

    /// A comparison between two expressions.
    #[must_use]
    pub fn compare(op: RelationalOp, left: Expr, right: Expr) -> Self {
        Self::Relational { op, left: Box::new(left), right: Box::new(right) }
    }

    /// `self == other`
    #[must_use]
    pub fn equals(self, other: Expr) -> Self {
        Self::compare(RelationalOp::Eq, self, other)
    }

    /// `self < other`
    #[must_use]
    pub fn less_than(self, other: Expr) -> Self {
        Self::compare(RelationalOp::Lt, self, other)
    }

    /// `self > other`
    #[must_use]
    pub fn greater_than(self, other: Expr) -> Self {
        Self::compare(RelationalOp::Gt, self, other)
    }

    /// `self >= other`
    #[must_use]
    pub fn greater_eq(self, other: Expr) -> Self {
        Self::compare(RelationalOp::Ge, self, other)
    }

    /// `self AND other`
    #[must_use]
    pub fn and(self, other: Expr) -> Self {
        Self::Logical { op: LogicalOp::And, left: Box::new(self), right: Box::new(other) }
    }

    /// `self OR other`
    #[must_use]
    pub fn or(self, other: Expr) -> Self {
        Self::Logical { op: LogicalOp::Or, left: Box::new(self), right: Box::new(other) }
    }

    /// `NOT self`
    #[must_use]
    pub fn negate(self) -> Self {
        Self::Not(Box::new(self))
    }

    /// `self + other`
    #[must_use]
    pub fn plus(self, other: Expr) -> Self {
        Self::Arithmetic { op: ArithmeticOp::Add, left: Box::new(self), right: Box::new(other) }
    }

    /// Conjoins an optional filter with another one.
    #[must_use]
    pub fn and_opt(left: Option<Expr>, right: Option<Expr>) -> Option<Expr> {
        match (left, right) {
            (Some(l), Some(r)) => Some(l.and(r)),
            (l, None) => l,
            (None, r) => r,
        }
    }
}

fn write_args(f: &mut fmt::Formatter<'_>, args: &[Expr]) -> fmt::Result {
    for (i, arg) in args.iter().enumerate() {
        if i > 0 {
            write!(f, ",")?;
        }
        write!(f, "{arg}")?;
    }
    Ok(())
}

impl fmt::Display for Expr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Constant(v) => write!(f, "{v}"),
            Self::InputProperty(name) => write!(f, "$-.{name}"),
            Self::Variable(name) => write!(f, "${name}"),
            Self::Vertex => write!(f, "VERTEX"),
            Self::Edge => write!(f, "EDGE"),
            Self::TagProperty { tag, prop } => write!(f, "{tag}.{prop}"),
            Self::LabelAttribute { label, attr } => write!(f, "{label}.{attr}"),
            Self::Attribute { base, attr } => write!(f, "{base}.{attr}"),
            Self::Relational { op, left, right } => write!(f, "({left}{op}{right})"),
            Self::Logical { op, left, right } => write!(f, "({left} {op} {right})"),
            Self::Not(inner) => write!(f, "!({inner})"),
            Self::IsNull(inner) => write!(f, "{inner} IS NULL"),
            Self::Arithmetic { op, left, right } => write!(f, "({left}{op}{right})"),
            Self::FunctionCall { func, args } => {
                write!(f, "{}(", func.name())?;
                write_args(f, args)?;
                write!(f, ")")
            }
            Self::Subscript { base, index } => write!(f, "{base}[{index}]"),
            Self::List(items) => {
                write!(f, "[")?;
                write_args(f, items)?;
                write!(f, "]")
            }
            Self::PathBuild(items) => {
                write!(f, "PathBuild[")?;
                write_args(f, items)?;
                write!(f, "]")
            }
            Self::Iteration => write!(f, "$iteration"),
        }
    }
}
