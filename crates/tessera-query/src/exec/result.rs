//! Query results.

use std::sync::Arc;

use tessera_core::Value;

use super::iter::{Iter, IterKind, LogicalRows};
use super::row::Schema;

/// The output of one plan node: column names plus rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResultSet {
    schema: Arc<Schema>,
    iter: Iter,
}

impl ResultSet {
    /// Creates a result from a schema and rows.
    #[must_use]
    pub const fn new(schema: Arc<Schema>, iter: Iter) -> Self {
        Self { schema, iter }
    }

    /// Creates a result from column names and rows.
    #[must_use]
    pub fn with_columns(columns: Vec<String>, iter: Iter) -> Self {
        Self::new(Arc::new(Schema::new(columns)), iter)
    }

    /// A result with the given columns and no rows.
    #[must_use]
    pub fn empty(columns: Vec<String>) -> Self {
        Self::with_columns(columns, Iter::sequential(Vec::new()))
    }

    /// Returns the schema.
    #[must_use]
    pub fn schema(&self) -> &Schema {
        &self.schema
    }

    /// Returns the shared schema.
    #[must_use]
    pub fn schema_arc(&self) -> &Arc<Schema> {
        &self.schema
    }

    /// Returns the column names.
    #[must_use]
    pub fn col_names(&self) -> Vec<&str> {
        self.schema.columns()
    }

    /// Returns the rows.
    #[must_use]
    pub const fn iter(&self) -> &Iter {
        &self.iter
    }

    /// Splits the result into schema and rows.
    #[must_use]
    pub fn into_parts(self) -> (Arc<Schema>, Iter) {
        (self.schema, self.iter)
    }

    /// Returns the rows mutably.
    pub fn iter_mut(&mut self) -> &mut Iter {
        &mut self.iter
    }

    /// Returns the shape of the rows.
    #[must_use]
    pub const fn kind(&self) -> IterKind {
        self.iter.kind()
    }

    /// Iterates over the rows.
    #[must_use]
    pub fn rows(&self) -> LogicalRows<'_> {
        self.iter.rows()
    }

    /// Returns the number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.iter.size()
    }

    /// Returns true if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter.is_empty()
    }

    /// Copies every row out as a vector of values.
    #[must_use]
    pub fn to_values(&self) -> Vec<Vec<Value>> {
        self.iter.rows().map(|row| row.values()).collect()
    }

    /// Copies one column out.
    #[must_use]
    pub fn column(&self, name: &str) -> Option<Vec<Value>> {
        let idx = self.schema.index_of(name)?;
        Some(self.iter.rows().map(|row| row.get(idx).cloned().unwrap_or(Value::Null)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn result_accessors() {
        let result = ResultSet::with_columns(
            vec!["a".into(), "b".into()],
            Iter::sequential(vec![
                vec![Value::Int(1), Value::from("x")],
                vec![Value::Int(2), Value::from("y")],
            ]),
        );
        assert_eq!(result.col_names(), vec!["a", "b"]);
        assert_eq!(result.size(), 2);
        assert_eq!(result.column("b"), Some(vec![Value::from("x"), Value::from("y")]));
        assert_eq!(result.column("c"), None);
        assert_eq!(result.kind(), IterKind::Sequential);
    }

    #[test]
    fn empty_result_keeps_columns() {
        let result = ResultSet::empty(vec!["path".into()]);
        assert!(result.is_empty());
        assert_eq!(result.col_names(), vec!["path"]);
        assert!(result.to_values().is_empty());
    }
}
