//! Values that flow through query execution.
//!
//! This module provides the [`Value`] enum. Besides the scalar property types
//! it carries whole graph objects ([`Vertex`], [`Edge`], [`Path`]) so that
//! rows produced by traversal operators can be projected, compared and hashed
//! uniformly.
//!
//! # Example
//!
//! ```
//! use tessera_core::Value;
//!
//! let name: Value = "Alice".into();
//! let age: Value = 30i64.into();
//!
//! assert_eq!(name.as_str(), Some("Alice"));
//! assert_eq!(age.as_int(), Some(30));
//! assert!(Value::Null < Value::Bool(false));
//! assert!(Value::Int(2) < Value::Float(2.5));
//! ```

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;
use std::hash::{Hash, Hasher};

use serde::{Deserialize, Serialize};

use super::{Edge, Path, Vertex, VertexId};

/// A dynamically typed value.
///
/// `Value` has a total order: values of different kinds order by kind
/// (`Null` < `Bool` < numbers < `String` < `List` < `Map` < `Vertex` <
/// `Edge` < `Path`), integers and floats compare numerically with integers
/// first on ties, and floats use IEEE total ordering. Equality and hashing
/// agree with that order, which makes whole rows usable as hash keys.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub enum Value {
    /// Null/missing value
    #[default]
    Null,
    /// Boolean value
    Bool(bool),
    /// 64-bit signed integer
    Int(i64),
    /// 64-bit floating point
    Float(f64),
    /// UTF-8 string
    String(String),
    /// Ordered list of values
    List(Vec<Value>),
    /// String-keyed map
    Map(BTreeMap<String, Value>),
    /// A vertex with its tags
    Vertex(Box<Vertex>),
    /// A directed edge
    Edge(Box<Edge>),
    /// An alternating vertex/edge sequence
    Path(Box<Path>),
}

impl Value {
    /// Returns `true` if this is a null value.
    #[inline]
    #[must_use]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the boolean value if this is a `Bool`.
    #[inline]
    #[must_use]
    pub const fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    /// Returns the integer value if this is an `Int`.
    #[inline]
    #[must_use]
    pub const fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    /// Returns the float value if this is a `Float`.
    #[inline]
    #[must_use]
    pub const fn as_float(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `String`.
    #[inline]
    #[must_use]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    /// Returns the elements if this is a `List`.
    #[must_use]
    pub fn as_list(&self) -> Option<&[Value]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Returns the vertex if this is a `Vertex`.
    #[must_use]
    pub fn as_vertex(&self) -> Option<&Vertex> {
        match self {
            Self::Vertex(v) => Some(v),
            _ => None,
        }
    }

    /// Returns the edge if this is an `Edge`.
    #[must_use]
    pub fn as_edge(&self) -> Option<&Edge> {
        match self {
            Self::Edge(e) => Some(e),
            _ => None,
        }
    }

    /// Returns the path if this is a `Path`.
    #[must_use]
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            Self::Path(p) => Some(p),
            _ => None,
        }
    }

    /// Interprets the value as a vertex id.
    ///
    /// Integers are taken as raw ids and vertices yield their own id.
    #[must_use]
    pub fn as_vertex_id(&self) -> Option<VertexId> {
        match self {
            Self::Int(i) => Some(VertexId::new(*i)),
            Self::Vertex(v) => Some(v.vid),
            _ => None,
        }
    }

    /// Returns the name of this value's kind, used in error messages.
    #[must_use]
    pub const fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Int(_) => "int",
            Self::Float(_) => "float",
            Self::String(_) => "string",
            Self::List(_) => "list",
            Self::Map(_) => "map",
            Self::Vertex(_) => "vertex",
            Self::Edge(_) => "edge",
            Self::Path(_) => "path",
        }
    }

    const fn kind_rank(&self) -> u8 {
        match self {
            Self::Null => 0,
            Self::Bool(_) => 1,
            Self::Int(_) | Self::Float(_) => 2,
            Self::String(_) => 3,
            Self::List(_) => 4,
            Self::Map(_) => 5,
            Self::Vertex(_) => 6,
            Self::Edge(_) => 7,
            Self::Path(_) => 8,
        }
    }
}

fn compare_int_float(i: i64, f: f64) -> Ordering {
    #[allow(clippy::cast_precision_loss)]
    let as_float = i as f64;
    // Integers sort before floats of equal magnitude.
    as_float.total_cmp(&f).then(Ordering::Less)
}

impl Ord for Value {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self, other) {
            (Self::Null, Self::Null) => Ordering::Equal,
            (Self::Bool(a), Self::Bool(b)) => a.cmp(b),
            (Self::Int(a), Self::Int(b)) => a.cmp(b),
            (Self::Float(a), Self::Float(b)) => a.total_cmp(b),
            (Self::Int(a), Self::Float(b)) => compare_int_float(*a, *b),
            (Self::Float(a), Self::Int(b)) => compare_int_float(*b, *a).reverse(),
            (Self::String(a), Self::String(b)) => a.cmp(b),
            (Self::List(a), Self::List(b)) => a.cmp(b),
            (Self::Map(a), Self::Map(b)) => a.cmp(b),
            (Self::Vertex(a), Self::Vertex(b)) => a.cmp(b),
            (Self::Edge(a), Self::Edge(b)) => a.cmp(b),
            (Self::Path(a), Self::Path(b)) => a.cmp(b),
            _ => self.kind_rank().cmp(&other.kind_rank()),
        }
    }
}

impl PartialOrd for Value {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Self::Null => {}
            Self::Bool(b) => b.hash(state),
            Self::Int(i) => i.hash(state),
            Self::Float(f) => f.to_bits().hash(state),
            Self::String(s) => s.hash(state),
            Self::List(items) => items.hash(state),
            Self::Map(map) => map.hash(state),
            Self::Vertex(v) => v.hash(state),
            Self::Edge(e) => e.hash(state),
            Self::Path(p) => p.hash(state),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => write!(f, "NULL"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(x) => write!(f, "{x}"),
            Self::String(s) => write!(f, "\"{s}\""),
            Self::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            Self::Map(map) => {
                write!(f, "{{")?;
                for (i, (k, v)) in map.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{k}: {v}")?;
                }
                write!(f, "}}")
            }
            Self::Vertex(v) => write!(f, "{v}"),
            Self::Edge(e) => write!(f, "{e}"),
            Self::Path(p) => write!(f, "{p}"),
        }
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(i: i32) -> Self {
        Self::Int(i64::from(i))
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<Vec<Value>> for Value {
    #[inline]
    fn from(items: Vec<Value>) -> Self {
        Self::List(items)
    }
}

impl From<VertexId> for Value {
    #[inline]
    fn from(id: VertexId) -> Self {
        Self::Int(id.as_i64())
    }
}

impl From<Vertex> for Value {
    #[inline]
    fn from(v: Vertex) -> Self {
        Self::Vertex(Box::new(v))
    }
}

impl From<Edge> for Value {
    #[inline]
    fn from(e: Edge) -> Self {
        Self::Edge(Box::new(e))
    }
}

impl From<Path> for Value {
    #[inline]
    fn from(p: Path) -> Self {
        Self::Path(Box::new(p))
    }
}

#[cfg(test)]
mod tests {
    use std::collections::hash_map::DefaultHasher;
    use std::collections::HashSet;

    use proptest::prelude::*;

    use super::*;

    fn hash_of(value: &Value) -> u64 {
        let mut hasher = DefaultHasher::new();
        value.hash(&mut hasher);
        hasher.finish()
    }

    fn scalar() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Null),
            any::<bool>().prop_map(Value::Bool),
            (-3i64..3).prop_map(Value::Int),
            (-3i32..3).prop_map(|f| Value::Float(f64::from(f))),
            (-1000.0f64..1000.0).prop_map(Value::Float),
            "[ab]{0,2}".prop_map(Value::String),
        ]
    }

    fn value() -> impl Strategy<Value = Value> {
        scalar().prop_recursive(2, 8, 3, |inner| {
            prop::collection::vec(inner, 0..3).prop_map(Value::List)
        })
    }

    proptest! {
        #[test]
        fn eq_ord_and_hash_agree(a in value(), b in value()) {
            prop_assert_eq!(a == b, a.cmp(&b) == Ordering::Equal);
            prop_assert_eq!(a.cmp(&b), b.cmp(&a).reverse());
            if a == b {
                prop_assert_eq!(hash_of(&a), hash_of(&b));
            }
        }

        #[test]
        fn json_round_trip(v in value()) {
            let json = serde_json::to_string(&v).unwrap();
            prop_assert_eq!(serde_json::from_str::<Value>(&json).unwrap(), v);
        }
    }

    #[test]
    fn value_type_checks() {
        assert!(Value::Null.is_null());
        assert!(!Value::Int(0).is_null());
        assert_eq!(Value::Int(5).type_name(), "int");
        assert_eq!(Value::from("x").type_name(), "string");
    }

    #[test]
    fn value_conversions() {
        assert_eq!(Value::from(true).as_bool(), Some(true));
        assert_eq!(Value::from(42i64).as_int(), Some(42));
        assert_eq!(Value::from(1.5f64).as_float(), Some(1.5));
        assert_eq!(Value::from("hi").as_str(), Some("hi"));
        assert_eq!(Value::from(VertexId::new(9)).as_vertex_id(), Some(VertexId::new(9)));
    }

    #[test]
    fn ordering_across_kinds() {
        let mut values = vec![
            Value::from("a"),
            Value::Int(3),
            Value::Null,
            Value::Float(2.5),
            Value::Bool(true),
        ];
        values.sort();
        assert_eq!(
            values,
            vec![
                Value::Null,
                Value::Bool(true),
                Value::Float(2.5),
                Value::Int(3),
                Value::from("a"),
            ]
        );
    }

    #[test]
    fn int_and_float_are_distinct_but_adjacent() {
        assert_ne!(Value::Int(1), Value::Float(1.0));
        assert!(Value::Int(1) < Value::Float(1.0));
        assert!(Value::Float(1.0) < Value::Int(2));
    }

    #[test]
    fn nan_is_self_equal() {
        let nan = Value::Float(f64::NAN);
        assert_eq!(nan, nan.clone());
        let mut set = HashSet::new();
        set.insert(nan.clone());
        assert!(set.contains(&nan));
    }

    #[test]
    fn equal_values_hash_equal() {
        let mut set = HashSet::new();
        set.insert(Value::List(vec![Value::Int(1), Value::from("a")]));
        assert!(set.contains(&Value::List(vec![Value::Int(1), Value::from("a")])));
        assert!(!set.contains(&Value::List(vec![Value::Int(1)])));
    }

    #[test]
    fn display_list() {
        let v = Value::List(vec![Value::Int(1), Value::Null]);
        assert_eq!(v.to_string(), "[1, NULL]");
    }
}
