//! Row types for query execution.
//!
//! A result holds rows of one concrete shape, chosen by the operator that
//! produced it. [`LogicalRow`] is the uniform borrowed view every operator and
//! expression works with.

use std::collections::HashMap;
use std::sync::Arc;

use tessera_core::{Edge, Value, Vertex};

/// A schema defines the column names and their order in a row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    /// Column names in order (using Arc<str> to avoid cloning).
    columns: Vec<Arc<str>>,
    /// Map from column name to index for fast lookup.
    name_to_index: HashMap<Arc<str>, usize>,
}

impl Schema {
    /// Creates a new schema from column names.
    ///
    /// If a name repeats, lookups resolve to its first position.
    #[must_use]
    pub fn new(columns: Vec<String>) -> Self {
        let columns: Vec<Arc<str>> = columns.into_iter().map(|s| Arc::from(s.as_str())).collect();
        let mut name_to_index = HashMap::with_capacity(columns.len());
        for (i, name) in columns.iter().enumerate() {
            name_to_index.entry(Arc::clone(name)).or_insert(i);
        }
        Self { columns, name_to_index }
    }

    /// Creates an empty schema.
    #[must_use]
    pub fn empty() -> Self {
        Self { columns: Vec::new(), name_to_index: HashMap::new() }
    }

    /// Returns the column names as string slices.
    #[must_use]
    pub fn columns(&self) -> Vec<&str> {
        self.columns.iter().map(AsRef::as_ref).collect()
    }

    /// Returns the number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Gets the index for a column name.
    #[must_use]
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.name_to_index.get(name).copied()
    }

    /// Gets the column name at an index.
    #[must_use]
    pub fn column_at(&self, index: usize) -> Option<&str> {
        self.columns.get(index).map(AsRef::as_ref)
    }
}

impl Default for Schema {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<Vec<String>> for Schema {
    fn from(columns: Vec<String>) -> Self {
        Self::new(columns)
    }
}

impl From<&[String]> for Schema {
    fn from(columns: &[String]) -> Self {
        Self::new(columns.to_vec())
    }
}

impl From<Vec<&str>> for Schema {
    fn from(columns: Vec<&str>) -> Self {
        Self::new(columns.into_iter().map(String::from).collect())
    }
}

/// A row made of the rows of a join's inputs, without copying values.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct JoinRow {
    segments: Vec<Arc<[Value]>>,
}

impl JoinRow {
    /// Wraps a flat row.
    #[must_use]
    pub fn from_values(values: Vec<Value>) -> Self {
        Self { segments: vec![Arc::from(values)] }
    }

    /// The row with `other`'s columns appended.
    #[must_use]
    pub fn concat(&self, other: &Self) -> Self {
        let mut segments = self.segments.clone();
        segments.extend(other.segments.iter().cloned());
        Self { segments }
    }

    /// Value at a column index.
    #[must_use]
    pub fn get(&self, mut idx: usize) -> Option<&Value> {
        for segment in &self.segments {
            if idx < segment.len() {
                return segment.get(idx);
            }
            idx -= segment.len();
        }
        None
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        self.segments.iter().map(|s| s.len()).sum()
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// A fetched vertex: columns `_vid` and `_vertex`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct PropRow {
    vid: Value,
    vertex: Value,
}

impl PropRow {
    /// Creates a row for a fetched vertex.
    #[must_use]
    pub fn new(vertex: Vertex) -> Self {
        Self { vid: Value::from(vertex.vid), vertex: Value::from(vertex) }
    }

    /// Value at a column index.
    #[must_use]
    pub const fn get(&self, idx: usize) -> Option<&Value> {
        match idx {
            0 => Some(&self.vid),
            1 => Some(&self.vertex),
            _ => None,
        }
    }

    /// The vertex.
    #[must_use]
    pub fn vertex(&self) -> Option<&Vertex> {
        self.vertex.as_vertex()
    }
}

/// One edge of a neighbor expansion: columns `_vertex` (the source) and `_edge`.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct NeighborRow {
    vertex: Value,
    edge: Value,
}

impl NeighborRow {
    /// Creates a row for one edge leaving `vertex`.
    #[must_use]
    pub fn new(vertex: Vertex, edge: Edge) -> Self {
        Self { vertex: Value::from(vertex), edge: Value::from(edge) }
    }

    /// Value at a column index.
    #[must_use]
    pub const fn get(&self, idx: usize) -> Option<&Value> {
        match idx {
            0 => Some(&self.vertex),
            1 => Some(&self.edge),
            _ => None,
        }
    }

    /// The source vertex.
    #[must_use]
    pub fn vertex(&self) -> Option<&Vertex> {
        self.vertex.as_vertex()
    }

    /// The edge.
    #[must_use]
    pub fn edge(&self) -> Option<&Edge> {
        self.edge.as_edge()
    }
}

/// A borrowed view of one row, whatever its concrete shape.
#[derive(Debug, Clone, Copy)]
pub enum LogicalRow<'a> {
    /// The single column-less row of a default result.
    Empty,
    /// A flat row.
    Sequential(&'a [Value]),
    /// A joined row.
    Join(&'a JoinRow),
    /// A fetched vertex.
    Prop(&'a PropRow),
    /// An expanded edge.
    Neighbor(&'a NeighborRow),
}

impl<'a> LogicalRow<'a> {
    /// Value at a column index.
    #[must_use]
    pub fn get(&self, idx: usize) -> Option<&'a Value> {
        match *self {
            Self::Empty => None,
            Self::Sequential(values) => values.get(idx),
            Self::Join(row) => row.get(idx),
            Self::Prop(row) => row.get(idx),
            Self::Neighbor(row) => row.get(idx),
        }
    }

    /// Number of columns.
    #[must_use]
    pub fn len(&self) -> usize {
        match *self {
            Self::Empty => 0,
            Self::Sequential(values) => values.len(),
            Self::Join(row) => row.len(),
            Self::Prop(_) | Self::Neighbor(_) => 2,
        }
    }

    /// Returns `true` if the row has no columns.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// All values, cloned.
    #[must_use]
    pub fn values(&self) -> Vec<Value> {
        (0..self.len()).map(|i| self.get(i).cloned().unwrap_or(Value::Null)).collect()
    }

    /// The row's vertex, for rows that carry one.
    #[must_use]
    pub fn vertex(&self) -> Option<&'a Vertex> {
        match *self {
            Self::Prop(row) => row.vertex(),
            Self::Neighbor(row) => row.vertex(),
            _ => None,
        }
    }

    /// The row's edge, for rows that carry one.
    #[must_use]
    pub fn edge(&self) -> Option<&'a Edge> {
        match *self {
            Self::Neighbor(row) => row.edge(),
            _ => None,
        }
    }

    /// The row as a join segment list.
    #[must_use]
    pub fn to_join_row(&self) -> JoinRow {
        match *self {
            Self::Join(row) => row.clone(),
            _ => JoinRow::from_values(self.values()),
        }
    }
}

impl PartialEq for LogicalRow<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && (0..self.len()).all(|i| self.get(i) == other.get(i))
    }
}

/// Row storage types that can be viewed as a [`LogicalRow`].
pub trait RowShape {
    /// Borrows the row.
    fn logical(&self) -> LogicalRow<'_>;
}

impl RowShape for Vec<Value> {
    fn logical(&self) -> LogicalRow<'_> {
        LogicalRow::Sequential(self)
    }
}

impl RowShape for JoinRow {
    fn logical(&self) -> LogicalRow<'_> {
        LogicalRow::Join(self)
    }
}

impl RowShape for PropRow {
    fn logical(&self) -> LogicalRow<'_> {
        LogicalRow::Prop(self)
    }
}

impl RowShape for NeighborRow {
    fn logical(&self) -> LogicalRow<'_> {
        LogicalRow::Neighbor(self)
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::{EdgeTypeId, VertexId};

    use super::*;

    #[test]
    fn schema_lookup() {
        let schema = Schema::from(vec!["a", "b", "a"]);
        assert_eq!(schema.len(), 3);
        assert_eq!(schema.index_of("b"), Some(1));
        assert_eq!(schema.index_of("a"), Some(0));
        assert_eq!(schema.column_at(2), Some("a"));
        assert_eq!(schema.index_of("z"), None);
    }

    #[test]
    fn join_row_spans_segments() {
        let left = JoinRow::from_values(vec![Value::Int(1), Value::Int(2)]);
        let right = JoinRow::from_values(vec![Value::Int(3)]);
        let joined = left.concat(&right).concat(&JoinRow::from_values(vec![Value::Int(4)]));
        assert_eq!(joined.len(), 4);
        assert_eq!(joined.get(2), Some(&Value::Int(3)));
        assert_eq!(joined.get(3), Some(&Value::Int(4)));
        assert_eq!(joined.get(4), None);
    }

    #[test]
    fn logical_rows_compare_by_value() {
        let flat = vec![Value::Int(1), Value::Int(2)];
        let joined = JoinRow::from_values(vec![Value::Int(1)])
            .concat(&JoinRow::from_values(vec![Value::Int(2)]));
        assert_eq!(flat.logical(), joined.logical());
        assert_ne!(flat.logical(), LogicalRow::Empty);
    }

    #[test]
    fn neighbor_row_exposes_vertex_and_edge() {
        let v = Vertex::new(VertexId::new(1));
        let e =
            tessera_core::Edge::new(VertexId::new(1), VertexId::new(2), EdgeTypeId::new(1), "e");
        let row = NeighborRow::new(v.clone(), e.clone());
        let logical = row.logical();
        assert_eq!(logical.vertex(), Some(&v));
        assert_eq!(logical.edge(), Some(&e));
        assert_eq!(logical.values(), vec![Value::from(v), Value::from(e)]);
    }
}
