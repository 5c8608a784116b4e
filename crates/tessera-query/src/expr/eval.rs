//! Expression evaluation.

use std::cmp::Ordering;

use tessera_core::{CoreError, Path, Value, Vertex};
use thiserror::Error;

use super::{ArithmeticOp, Expr, Function, LogicalOp, RelationalOp};
use crate::exec::{LogicalRow, QueryContext, Schema};

/// Errors raised while evaluating an expression.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    /// An input column is not part of the row schema.
    #[error("column not found: {0}")]
    ColumnNotFound(String),

    /// A referenced variable has not been published.
    #[error("variable not found: {0}")]
    VariableNotFound(String),

    /// The expression needs context the current bindings do not provide.
    #[error("{0} is not available in this context")]
    Unbound(&'static str),

    /// A pattern alias attribute reached evaluation without being rewritten.
    #[error("unresolved label attribute: {label}.{attr}")]
    UnresolvedLabel {
        /// The pattern alias.
        label: String,
        /// The attribute.
        attr: String,
    },

    /// An operator or function received a value of the wrong kind.
    #[error("{operation} does not accept {actual}")]
    InvalidOperand {
        /// The operation being evaluated.
        operation: String,
        /// Kind of the offending value.
        actual: &'static str,
    },

    /// Wrong number of arguments to a function.
    #[error("{func} expects {expected} argument(s), got {actual}")]
    Arity {
        /// Function name.
        func: &'static str,
        /// Expected count.
        expected: usize,
        /// Actual count.
        actual: usize,
    },

    /// Division or modulo by zero.
    #[error("division by zero")]
    DivisionByZero,

    /// Integer arithmetic overflowed.
    #[error("integer overflow in `{0}`")]
    Overflow(ArithmeticOp),

    /// A core value operation failed.
    #[error(transparent)]
    Core(#[from] CoreError),
}

/// Result type for expression evaluation.
pub type EvalResult<T> = Result<T, EvalError>;

/// The context an expression is evaluated against.
///
/// Every method has a default that reports the binding as unavailable, so an
/// implementation only provides what its context actually has.
pub trait Bindings {
    /// Value of an input column.
    fn input_prop(&self, name: &str) -> EvalResult<Value> {
        Err(EvalError::ColumnNotFound(name.to_owned()))
    }

    /// Rows of a published variable.
    fn variable(&self, name: &str) -> EvalResult<Value> {
        Err(EvalError::VariableNotFound(name.to_owned()))
    }

    /// The current vertex.
    fn vertex(&self) -> EvalResult<Value> {
        Err(EvalError::Unbound("vertex"))
    }

    /// The current edge.
    fn edge(&self) -> EvalResult<Value> {
        Err(EvalError::Unbound("edge"))
    }

    /// A tag property of the current vertex.
    fn tag_prop(&self, _tag: &str, _prop: &str) -> EvalResult<Value> {
        Err(EvalError::Unbound("tag property"))
    }

    /// Completed iterations of the enclosing loop.
    fn iteration(&self) -> EvalResult<Value> {
        Err(EvalError::Unbound("loop iteration"))
    }
}

/// Bindings with nothing bound; only constant expressions evaluate.
#[derive(Debug, Clone, Copy, Default)]
pub struct EmptyBindings;

impl Bindings for EmptyBindings {}

/// Binds a logical row and its column schema.
#[derive(Debug, Clone, Copy)]
pub struct RowBindings<'a> {
    row: LogicalRow<'a>,
    schema: &'a Schema,
}

impl<'a> RowBindings<'a> {
    /// Creates bindings for one row.
    #[must_use]
    pub const fn new(row: LogicalRow<'a>, schema: &'a Schema) -> Self {
        Self { row, schema }
    }
}

impl Bindings for RowBindings<'_> {
    fn input_prop(&self, name: &str) -> EvalResult<Value> {
        let idx =
            self.schema.index_of(name).ok_or_else(|| EvalError::ColumnNotFound(name.to_owned()))?;
        Ok(self.row.get(idx).cloned().unwrap_or(Value::Null))
    }

    fn vertex(&self) -> EvalResult<Value> {
        self.row.vertex().map(|v| Value::from(v.clone())).ok_or(EvalError::Unbound("vertex"))
    }

    fn edge(&self) -> EvalResult<Value> {
        self.row.edge().map(|e| Value::from(e.clone())).ok_or(EvalError::Unbound("edge"))
    }

    fn tag_prop(&self, tag: &str, prop: &str) -> EvalResult<Value> {
        let vertex = self.row.vertex().ok_or(EvalError::Unbound("tag property"))?;
        Ok(vertex.prop(tag, prop).cloned().unwrap_or(Value::Null))
    }
}

/// Binds a single vertex, as storage does when applying index filters.
#[derive(Debug, Clone, Copy)]
pub struct VertexBindings<'a>(pub &'a Vertex);

impl Bindings for VertexBindings<'_> {
    fn vertex(&self) -> EvalResult<Value> {
        Ok(Value::from(self.0.clone()))
    }

    fn tag_prop(&self, tag: &str, prop: &str) -> EvalResult<Value> {
        Ok(self.0.prop(tag, prop).cloned().unwrap_or(Value::Null))
    }
}

/// Binds the variable store and loop counter for Select and Loop conditions.
#[derive(Clone, Copy)]
pub struct ConditionBindings<'a> {
    ctx: &'a QueryContext,
    iteration: u64,
}

impl<'a> ConditionBindings<'a> {
    /// Creates condition bindings.
    #[must_use]
    pub const fn new(ctx: &'a QueryContext, iteration: u64) -> Self {
        Self { ctx, iteration }
    }
}

impl Bindings for ConditionBindings<'_> {
    fn variable(&self, name: &str) -> EvalResult<Value> {
        let result =
            self.ctx.get_result(name).ok_or_else(|| EvalError::VariableNotFound(name.to_owned()))?;
        Ok(Value::List(result.to_values().into_iter().map(Value::List).collect()))
    }

    fn iteration(&self) -> EvalResult<Value> {
        Ok(Value::Int(i64::try_from(self.iteration).unwrap_or(i64::MAX)))
    }
}

fn invalid(operation: impl Into<String>, value: &Value) -> EvalError {
    EvalError::InvalidOperand { operation: operation.into(), actual: value.type_name() }
}

fn len_value(n: usize) -> Value {
    Value::Int(i64::try_from(n).unwrap_or(i64::MAX))
}

impl Expr {
    /// Evaluates the expression.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if a binding is missing or an operand has the
    /// wrong kind.
    pub fn eval<B: Bindings + ?Sized>(&self, b: &B) -> EvalResult<Value> {
        match self {
            Self::Constant(v) => Ok(v.clone()),
            Self::InputProperty(name) => b.input_prop(name),
            Self::Variable(name) => b.variable(name),
            Self::Vertex => b.vertex(),
            Self::Edge => b.edge(),
            Self::TagProperty { tag, prop } => b.tag_prop(tag, prop),
            Self::LabelAttribute { label, attr } => {
                Err(EvalError::UnresolvedLabel { label: label.clone(), attr: attr.clone() })
            }
            Self::Attribute { base, attr } => attribute(base.eval(b)?, attr),
            Self::Relational { op, left, right } => {
                relational(*op, &left.eval(b)?, &right.eval(b)?)
            }
            Self::Logical { op, left, right } => logical(*op, left, right, b),
            Self::Not(inner) => match inner.eval(b)? {
                Value::Null => Ok(Value::Null),
                Value::Bool(v) => Ok(Value::Bool(!v)),
                other => Err(invalid("NOT", &other)),
            },
            Self::IsNull(inner) => Ok(Value::Bool(inner.eval(b)?.is_null())),
            Self::Arithmetic { op, left, right } => arithmetic(*op, left.eval(b)?, right.eval(b)?),
            Self::FunctionCall { func, args } => {
                if args.len() != 1 {
                    return Err(EvalError::Arity {
                        func: func.name(),
                        expected: 1,
                        actual: args.len(),
                    });
                }
                call(*func, args[0].eval(b)?)
            }
            Self::Subscript { base, index } => subscript(base.eval(b)?, &index.eval(b)?),
            Self::List(items) => {
                Ok(Value::List(items.iter().map(|e| e.eval(b)).collect::<EvalResult<_>>()?))
            }
            Self::PathBuild(items) => build_path(items, b),
            Self::Iteration => b.iteration(),
        }
    }

    /// Evaluates the expression as a filter predicate.
    ///
    /// `NULL` counts as false.
    ///
    /// # Errors
    ///
    /// Returns an [`EvalError`] if evaluation fails or yields a non-boolean.
    pub fn eval_predicate<B: Bindings + ?Sized>(&self, b: &B) -> EvalResult<bool> {
        match self.eval(b)? {
            Value::Bool(v) => Ok(v),
            Value::Null => Ok(false),
            other => Err(invalid("predicate", &other)),
        }
    }
}

fn attribute(base: Value, attr: &str) -> EvalResult<Value> {
    match base {
        Value::Null => Ok(Value::Null),
        Value::Vertex(v) => {
            if attr == "_vid" {
                return Ok(Value::from(v.vid));
            }
            Ok(v.tags.iter().find_map(|t| t.get(attr)).cloned().unwrap_or(Value::Null))
        }
        Value::Edge(e) => Ok(match attr {
            "_src" => Value::from(e.src),
            "_dst" => Value::from(e.dst),
            "_type" => Value::from(e.edge_type.as_i32()),
            "_rank" => Value::Int(e.ranking),
            _ => e.prop(attr).cloned().unwrap_or(Value::Null),
        }),
        Value::Map(map) => Ok(map.get(attr).cloned().unwrap_or(Value::Null)),
        other => Err(invalid(format!("attribute `{attr}`"), &other)),
    }
}

#[allow(clippy::cast_precision_loss)]
fn compare_values(l: &Value, r: &Value) -> Ordering {
    match (l, r) {
        (Value::Int(a), Value::Float(b)) => (*a as f64).total_cmp(b),
        (Value::Float(a), Value::Int(b)) => a.total_cmp(&(*b as f64)),
        _ => l.cmp(r),
    }
}

fn relational(op: RelationalOp, l: &Value, r: &Value) -> EvalResult<Value> {
    if op == RelationalOp::In {
        return match r {
            Value::Null => Ok(Value::Null),
            Value::List(_) if l.is_null() => Ok(Value::Null),
            Value::List(items) => {
                Ok(Value::Bool(items.iter().any(|i| compare_values(l, i) == Ordering::Equal)))
            }
            other => Err(invalid("IN", other)),
        };
    }
    if l.is_null() || r.is_null() {
        return Ok(Value::Null);
    }
    let ord = compare_values(l, r);
    let result = match op {
        RelationalOp::Eq => ord == Ordering::Equal,
        RelationalOp::Ne => ord != Ordering::Equal,
        RelationalOp::Lt => ord == Ordering::Less,
        RelationalOp::Le => ord != Ordering::Greater,
        RelationalOp::Gt => ord == Ordering::Greater,
        RelationalOp::Ge => ord != Ordering::Less,
        RelationalOp::In => false,
    };
    Ok(Value::Bool(result))
}

fn tribool(op: LogicalOp, v: &Value) -> EvalResult<Option<bool>> {
    match v {
        Value::Null => Ok(None),
        Value::Bool(b) => Ok(Some(*b)),
        other => Err(invalid(op.to_string(), other)),
    }
}

fn logical<B: Bindings + ?Sized>(
    op: LogicalOp,
    left: &Expr,
    right: &Expr,
    b: &B,
) -> EvalResult<Value> {
    let l = tribool(op, &left.eval(b)?)?;
    match (op, l) {
        (LogicalOp::And, Some(false)) => return Ok(Value::Bool(false)),
        (LogicalOp::Or, Some(true)) => return Ok(Value::Bool(true)),
        _ => {}
    }
    let r = tribool(op, &right.eval(b)?)?;
    let out = match op {
        LogicalOp::And => match (l, r) {
            (_, Some(false)) => Some(false),
            (Some(true), Some(true)) => Some(true),
            _ => None,
        },
        LogicalOp::Or => match (l, r) {
            (_, Some(true)) => Some(true),
            (Some(false), Some(false)) => Some(false),
            _ => None,
        },
        LogicalOp::Xor => match (l, r) {
            (Some(a), Some(c)) => Some(a ^ c),
            _ => None,
        },
    };
    Ok(out.map_or(Value::Null, Value::Bool))
}

fn int_op(op: ArithmeticOp, a: i64, b: i64) -> EvalResult<Value> {
    let out = match op {
        ArithmeticOp::Add => a.checked_add(b),
        ArithmeticOp::Sub => a.checked_sub(b),
        ArithmeticOp::Mul => a.checked_mul(b),
        ArithmeticOp::Div | ArithmeticOp::Mod if b == 0 => return Err(EvalError::DivisionByZero),
        ArithmeticOp::Div => a.checked_div(b),
        ArithmeticOp::Mod => a.checked_rem(b),
    };
    out.map(Value::Int).ok_or(EvalError::Overflow(op))
}

fn float_op(op: ArithmeticOp, a: f64, b: f64) -> EvalResult<Value> {
    if matches!(op, ArithmeticOp::Div | ArithmeticOp::Mod) && b == 0.0 {
        return Err(EvalError::DivisionByZero);
    }
    Ok(Value::Float(match op {
        ArithmeticOp::Add => a + b,
        ArithmeticOp::Sub => a - b,
        ArithmeticOp::Mul => a * b,
        ArithmeticOp::Div => a / b,
        ArithmeticOp::Mod => a % b,
    }))
}

#[allow(clippy::cast_precision_loss)]
fn arithmetic(op: ArithmeticOp, l: Value, r: Value) -> EvalResult<Value> {
    match (l, r) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::Int(a), Value::Int(b)) => int_op(op, a, b),
        (Value::Int(a), Value::Float(b)) => float_op(op, a as f64, b),
        (Value::Float(a), Value::Int(b)) => float_op(op, a, b as f64),
        (Value::Float(a), Value::Float(b)) => float_op(op, a, b),
        (Value::String(mut a), Value::String(b)) if op == ArithmeticOp::Add => {
            a.push_str(&b);
            Ok(Value::String(a))
        }
        (Value::List(mut a), Value::List(b)) if op == ArithmeticOp::Add => {
            a.extend(b);
            Ok(Value::List(a))
        }
        (Value::Int(_) | Value::Float(_), other) | (other, _) => {
            Err(invalid(op.to_string(), &other))
        }
    }
}

fn call(func: Function, arg: Value) -> EvalResult<Value> {
    match (func, arg) {
        (_, Value::Null) => Ok(Value::Null),
        (Function::StartNode, Value::Path(p)) => Ok(Value::from(p.start_vertex().clone())),
        (Function::EndNode, Value::Path(p)) => Ok(Value::from(p.end_vertex().clone())),
        (Function::Relationships, Value::Path(p)) => {
            Ok(Value::List(p.relationships().into_iter().map(Value::from).collect()))
        }
        (Function::Length, Value::Path(p)) => Ok(len_value(p.length())),
        (Function::Length | Function::Size, Value::List(items)) => Ok(len_value(items.len())),
        (Function::Length | Function::Size, Value::String(s)) => Ok(len_value(s.chars().count())),
        (Function::Size, Value::Map(map)) => Ok(len_value(map.len())),
        (Function::HasSameEdgeInPath, Value::Path(p)) => Ok(Value::Bool(p.has_duplicate_edges())),
        (Function::Id, Value::Vertex(v)) => Ok(Value::from(v.vid)),
        (Function::Id, Value::Int(i)) => Ok(Value::Int(i)),
        (func, other) => Err(invalid(func.name(), &other)),
    }
}

fn subscript(base: Value, index: &Value) -> EvalResult<Value> {
    match (base, index) {
        (Value::Null, _) | (_, Value::Null) => Ok(Value::Null),
        (Value::List(items), Value::Int(i)) => {
            let len = i64::try_from(items.len()).unwrap_or(i64::MAX);
            let idx = if *i < 0 { len + i } else { *i };
            Ok(usize::try_from(idx)
                .ok()
                .and_then(|idx| items.into_iter().nth(idx))
                .unwrap_or(Value::Null))
        }
        (Value::Map(map), Value::String(key)) => Ok(map.get(key).cloned().unwrap_or(Value::Null)),
        (base, _) => Err(invalid("subscript", &base)),
    }
}

fn build_path<B: Bindings + ?Sized>(items: &[Expr], b: &B) -> EvalResult<Value> {
    let mut path: Option<Path> = None;
    for item in items {
        match item.eval(b)? {
            Value::Null => return Ok(Value::Null),
            Value::Vertex(v) => match path.as_mut() {
                None => path = Some(Path::new(*v)),
                Some(p) => p.concat(&Path::new(*v))?,
            },
            Value::Edge(e) => match path.as_mut() {
                None => {
                    let mut p = Path::new(Vertex::new(e.src));
                    p.push_edge(&e);
                    path = Some(p);
                }
                Some(p) => p.try_push_edge(&e)?,
            },
            Value::Path(other) => match path.as_mut() {
                None => path = Some(*other),
                Some(p) => p.concat(&other)?,
            },
            other => return Err(invalid("PathBuild", &other)),
        }
    }
    Ok(path.map_or(Value::Null, Value::from))
}

#[cfg(test)]
mod tests {
    use tessera_core::{Edge, EdgeTypeId, Tag, VertexId};

    use super::*;

    fn vertex(id: i64) -> Vertex {
        Vertex::new(VertexId::new(id)).with_tag(Tag::new("person").with_prop("age", 20 + id))
    }

    fn edge(src: i64, dst: i64) -> Edge {
        Edge::new(VertexId::new(src), VertexId::new(dst), EdgeTypeId::new(1), "knows")
    }

    fn c(v: impl Into<Value>) -> Expr {
        Expr::constant(v)
    }

    #[test]
    fn constant_folding() {
        let e = c(2i64).plus(c(3i64));
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::Int(5)));
        let e = c(2i64).plus(c(0.5f64));
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::Float(2.5)));
        let e = c("a").plus(c("b"));
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::from("ab")));
    }

    #[test]
    fn division_by_zero_is_an_error() {
        let e = Expr::Arithmetic {
            op: ArithmeticOp::Div,
            left: Box::new(c(1i64)),
            right: Box::new(c(0i64)),
        };
        assert_eq!(e.eval(&EmptyBindings), Err(EvalError::DivisionByZero));
    }

    #[test]
    fn three_valued_logic() {
        let null = Expr::Constant(Value::Null);
        assert_eq!(null.clone().and(c(false)).eval(&EmptyBindings), Ok(Value::Bool(false)));
        assert_eq!(null.clone().and(c(true)).eval(&EmptyBindings), Ok(Value::Null));
        assert_eq!(null.clone().or(c(true)).eval(&EmptyBindings), Ok(Value::Bool(true)));
        assert_eq!(null.negate().eval(&EmptyBindings), Ok(Value::Null));
        assert!(c(1i64).and(c(true)).eval(&EmptyBindings).is_err());
    }

    #[test]
    fn null_comparisons_are_null() {
        let e = Expr::Constant(Value::Null).equals(c(1i64));
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::Null));
        assert_eq!(e.eval_predicate(&EmptyBindings), Ok(false));
    }

    #[test]
    fn mixed_numeric_equality() {
        assert_eq!(c(1i64).equals(c(1.0f64)).eval(&EmptyBindings), Ok(Value::Bool(true)));
        let e = Expr::compare(
            RelationalOp::In,
            c(2i64),
            Expr::List(vec![c(1i64), c(2.0f64)]),
        );
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::Bool(true)));
    }

    #[test]
    fn vertex_bindings_resolve_attributes() {
        let v = vertex(1);
        let b = VertexBindings(&v);
        assert_eq!(Expr::Vertex.attr("age").eval(&b), Ok(Value::Int(21)));
        assert_eq!(Expr::Vertex.attr("_vid").eval(&b), Ok(Value::Int(1)));
        assert_eq!(Expr::tag_prop("person", "age").eval(&b), Ok(Value::Int(21)));
        assert_eq!(Expr::tag_prop("person", "missing").eval(&b), Ok(Value::Null));
        assert_eq!(Expr::Edge.eval(&b), Err(EvalError::Unbound("edge")));
    }

    #[test]
    fn unresolved_label_fails() {
        let e = Expr::label_attr("v", "name");
        assert!(matches!(e.eval(&EmptyBindings), Err(EvalError::UnresolvedLabel { .. })));
    }

    #[test]
    fn path_build_and_path_functions() {
        let build = Expr::PathBuild(vec![
            c(vertex(1)),
            c(edge(1, 2)),
            c(edge(2, 3)),
        ]);
        let path = build.eval(&EmptyBindings).expect("path");
        let p = path.as_path().expect("is path");
        assert_eq!(p.length(), 2);

        let len = Expr::call(Function::Length, vec![Expr::Constant(path.clone())]);
        assert_eq!(len.eval(&EmptyBindings), Ok(Value::Int(2)));

        let end = Expr::call(Function::EndNode, vec![Expr::Constant(path.clone())]).attr("_vid");
        assert_eq!(end.eval(&EmptyBindings), Ok(Value::Int(3)));

        let rels = Expr::call(Function::Relationships, vec![Expr::Constant(path.clone())])
            .subscript(c(0i64));
        assert_eq!(rels.eval(&EmptyBindings), Ok(Value::from(edge(1, 2))));

        let dup = Expr::call(Function::HasSameEdgeInPath, vec![Expr::Constant(path)]);
        assert_eq!(dup.eval(&EmptyBindings), Ok(Value::Bool(false)));
    }

    #[test]
    fn path_build_concatenates_fragments() {
        let left = Expr::PathBuild(vec![c(vertex(1)), c(edge(1, 2))]);
        let right = Expr::PathBuild(vec![c(vertex(2)), c(edge(2, 3))]);
        let joined = Expr::PathBuild(vec![left, right]).eval(&EmptyBindings).expect("path");
        let p = joined.as_path().expect("is path");
        assert_eq!(p.length(), 2);
        assert!(p.steps[0].dst.has_tag("person"));
    }

    #[test]
    fn path_build_rejects_gaps() {
        let build = Expr::PathBuild(vec![c(vertex(1)), c(edge(2, 3))]);
        assert!(matches!(build.eval(&EmptyBindings), Err(EvalError::Core(_))));
    }

    #[test]
    fn path_functions_on_null_are_null() {
        let e = Expr::call(Function::StartNode, vec![Expr::Constant(Value::Null)]);
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::Null));
    }

    #[test]
    fn negative_subscript() {
        let e = Expr::List(vec![c(1i64), c(2i64), c(3i64)]).subscript(c(-1i64));
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::Int(3)));
        let e = Expr::List(vec![c(1i64)]).subscript(c(5i64));
        assert_eq!(e.eval(&EmptyBindings), Ok(Value::Null));
    }
}
