//! Iterators over a result's rows.
//!
//! Every iterator supports positional traversal plus erasure; which row shape
//! it holds is visible through [`IterKind`] so operators can reject shapes
//! they do not handle.

use std::fmt;

use tessera_core::Value;

use super::row::{JoinRow, LogicalRow, NeighborRow, PropRow, RowShape};

/// The concrete shape of an iterator's rows.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IterKind {
    /// A single column-less row.
    Default,
    /// Flat rows.
    Sequential,
    /// Joined rows.
    Join,
    /// Fetched vertices.
    Prop,
    /// Expanded edges.
    GetNeighbors,
}

impl fmt::Display for IterKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Default => "default",
            Self::Sequential => "sequential",
            Self::Join => "join",
            Self::Prop => "prop",
            Self::GetNeighbors => "get-neighbors",
        };
        f.write_str(name)
    }
}

/// A positional cursor over owned rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RowCursor<R> {
    rows: Vec<R>,
    pos: usize,
}

impl<R> RowCursor<R> {
    /// Creates a cursor positioned at the first row.
    #[must_use]
    pub const fn new(rows: Vec<R>) -> Self {
        Self { rows, pos: 0 }
    }

    /// Returns `true` while the cursor points at a row.
    #[must_use]
    pub fn valid(&self) -> bool {
        self.pos < self.rows.len()
    }

    /// Advances to the next row.
    pub fn next(&mut self) {
        if self.valid() {
            self.pos += 1;
        }
    }

    /// Moves back to the first row.
    pub fn reset(&mut self) {
        self.pos = 0;
    }

    /// Number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        self.rows.len()
    }

    /// The row under the cursor.
    #[must_use]
    pub fn current(&self) -> Option<&R> {
        self.rows.get(self.pos)
    }

    /// Removes the current row, keeping the order of the rest.
    ///
    /// The cursor then points at the row that followed.
    pub fn erase(&mut self) {
        if self.valid() {
            self.rows.remove(self.pos);
        }
    }

    /// Removes the current row by moving the last row into its place.
    pub fn unstable_erase(&mut self) {
        if self.valid() {
            self.rows.swap_remove(self.pos);
        }
    }

    /// Removes rows in `[first, last)`, clamped to the row count.
    pub fn erase_range(&mut self, first: usize, last: usize) {
        let last = last.min(self.rows.len());
        if first < last {
            self.rows.drain(first..last);
        }
        self.pos = self.pos.min(self.rows.len());
    }

    /// Keeps only the rows for which `keep` returns `true`, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first error `keep` reports; the cursor is left empty.
    pub fn try_retain<E, F>(&mut self, mut keep: F) -> Result<(), E>
    where
        F: FnMut(&R) -> Result<bool, E>,
    {
        let rows = std::mem::take(&mut self.rows);
        let mut kept = Vec::with_capacity(rows.len());
        for row in rows {
            if keep(&row)? {
                kept.push(row);
            }
        }
        self.rows = kept;
        self.pos = 0;
        Ok(())
    }

    /// The rows.
    #[must_use]
    pub fn rows(&self) -> &[R] {
        &self.rows
    }

    /// Mutable access to the rows; resets the cursor.
    pub fn rows_mut(&mut self) -> &mut Vec<R> {
        self.pos = 0;
        &mut self.rows
    }
}

/// The iterator of a result that holds no real rows, only one empty one.
///
/// Sources evaluate their inputs once against this row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DefaultIter {
    rows: usize,
    pos: usize,
}

impl DefaultIter {
    /// The one-row iterator.
    #[must_use]
    pub const fn new() -> Self {
        Self { rows: 1, pos: 0 }
    }
}

impl Default for DefaultIter {
    fn default() -> Self {
        Self::new()
    }
}

/// A result's rows, in one of the supported shapes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Iter {
    /// A single column-less row.
    Default(DefaultIter),
    /// Flat rows.
    Sequential(RowCursor<Vec<Value>>),
    /// Joined rows.
    Join(RowCursor<JoinRow>),
    /// Fetched vertices.
    Prop(RowCursor<PropRow>),
    /// Expanded edges.
    GetNeighbors(RowCursor<NeighborRow>),
}

macro_rules! each_cursor {
    ($iter:expr, $c:ident => $body:expr, $d:ident => $default:expr) => {
        match $iter {
            Iter::Default($d) => $default,
            Iter::Sequential($c) => $body,
            Iter::Join($c) => $body,
            Iter::Prop($c) => $body,
            Iter::GetNeighbors($c) => $body,
        }
    };
}

impl Iter {
    /// The single-row default iterator.
    #[must_use]
    pub const fn default_row() -> Self {
        Self::Default(DefaultIter::new())
    }

    /// A sequential iterator over `rows`.
    #[must_use]
    pub const fn sequential(rows: Vec<Vec<Value>>) -> Self {
        Self::Sequential(RowCursor::new(rows))
    }

    /// The shape of the rows.
    #[must_use]
    pub const fn kind(&self) -> IterKind {
        match self {
            Self::Default(_) => IterKind::Default,
            Self::Sequential(_) => IterKind::Sequential,
            Self::Join(_) => IterKind::Join,
            Self::Prop(_) => IterKind::Prop,
            Self::GetNeighbors(_) => IterKind::GetNeighbors,
        }
    }

    /// Returns `true` while the cursor points at a row.
    #[must_use]
    pub fn valid(&self) -> bool {
        each_cursor!(self, c => c.valid(), d => d.pos < d.rows)
    }

    /// Advances to the next row.
    pub fn next(&mut self) {
        each_cursor!(self, c => c.next(), d => {
            if d.pos < d.rows {
                d.pos += 1;
            }
        });
    }

    /// Moves back to the first row.
    pub fn reset(&mut self) {
        each_cursor!(self, c => c.reset(), d => d.pos = 0);
    }

    /// Number of rows.
    #[must_use]
    pub fn size(&self) -> usize {
        each_cursor!(self, c => c.size(), d => d.rows)
    }

    /// Returns `true` if there are no rows.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.size() == 0
    }

    /// The row under the cursor.
    #[must_use]
    pub fn row(&self) -> Option<LogicalRow<'_>> {
        each_cursor!(self, c => c.current().map(RowShape::logical), d => {
            (d.pos < d.rows).then_some(LogicalRow::Empty)
        })
    }

    /// Removes the current row, keeping the order of the rest.
    pub fn erase(&mut self) {
        each_cursor!(self, c => c.erase(), d => {
            if d.pos < d.rows {
                d.rows -= 1;
            }
        });
    }

    /// Removes the current row without preserving order.
    pub fn unstable_erase(&mut self) {
        each_cursor!(self, c => c.unstable_erase(), d => {
            if d.pos < d.rows {
                d.rows -= 1;
            }
        });
    }

    /// Removes rows in `[first, last)`, clamped to the row count.
    pub fn erase_range(&mut self, first: usize, last: usize) {
        each_cursor!(self, c => c.erase_range(first, last), d => {
            if first < last.min(d.rows) {
                d.rows = 0;
            }
            d.pos = d.pos.min(d.rows);
        });
    }

    /// Keeps only the rows for which `keep` returns `true`, preserving order.
    ///
    /// # Errors
    ///
    /// Returns the first error `keep` reports.
    pub fn try_retain<E, F>(&mut self, mut keep: F) -> Result<(), E>
    where
        F: FnMut(LogicalRow<'_>) -> Result<bool, E>,
    {
        each_cursor!(self, c => c.try_retain(|r| keep(r.logical())), d => {
            if d.rows > 0 && !keep(LogicalRow::Empty)? {
                d.rows = 0;
            }
            d.pos = 0;
            Ok(())
        })
    }

    /// Iterates over all rows from the first, ignoring the cursor.
    #[must_use]
    pub fn rows(&self) -> LogicalRows<'_> {
        LogicalRows { iter: self, idx: 0 }
    }

    fn row_at(&self, idx: usize) -> Option<LogicalRow<'_>> {
        each_cursor!(self, c => c.rows().get(idx).map(RowShape::logical), d => {
            (idx < d.rows).then_some(LogicalRow::Empty)
        })
    }
}

/// Iterator over the rows of an [`Iter`].
#[derive(Debug, Clone)]
pub struct LogicalRows<'a> {
    iter: &'a Iter,
    idx: usize,
}

impl<'a> Iterator for LogicalRows<'a> {
    type Item = LogicalRow<'a>;

    fn next(&mut self) -> Option<Self::Item> {
        let row = self.iter.row_at(self.idx)?;
        self.idx += 1;
        Some(row)
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        let remaining = self.iter.size().saturating_sub(self.idx);
        (remaining, Some(remaining))
    }
}

impl ExactSizeIterator for LogicalRows<'_> {}

#[cfg(test)]
mod tests {
    use super::*;

    fn ints(values: &[i64]) -> Iter {
        Iter::sequential(values.iter().map(|v| vec![Value::Int(*v)]).collect())
    }

    fn collect(iter: &Iter) -> Vec<i64> {
        iter.rows().filter_map(|r| r.get(0).and_then(Value::as_int)).collect()
    }

    #[test]
    fn traversal() {
        let mut iter = ints(&[1, 2, 3]);
        let mut seen = Vec::new();
        while iter.valid() {
            seen.push(iter.row().and_then(|r| r.get(0).cloned()));
            iter.next();
        }
        assert_eq!(seen.len(), 3);
        assert!(iter.row().is_none());
        iter.reset();
        assert!(iter.valid());
    }

    #[test]
    fn erase_keeps_order() {
        let mut iter = ints(&[1, 2, 3, 4]);
        iter.next();
        iter.erase();
        assert_eq!(collect(&iter), vec![1, 3, 4]);
        assert_eq!(iter.row().and_then(|r| r.get(0).cloned()), Some(Value::Int(3)));
    }

    #[test]
    fn unstable_erase_moves_last() {
        let mut iter = ints(&[1, 2, 3, 4]);
        iter.unstable_erase();
        assert_eq!(collect(&iter), vec![4, 2, 3]);
    }

    #[test]
    fn erase_range_is_clamped() {
        let mut iter = ints(&[1, 2, 3, 4]);
        iter.erase_range(1, 3);
        assert_eq!(collect(&iter), vec![1, 4]);
        iter.erase_range(1, 100);
        assert_eq!(collect(&iter), vec![1]);
        iter.erase_range(5, 10);
        assert_eq!(collect(&iter), vec![1]);
    }

    #[test]
    fn retain_propagates_errors() {
        let mut iter = ints(&[1, 2, 3]);
        let res: Result<(), &str> = iter.try_retain(|r| {
            if r.get(0) == Some(&Value::Int(2)) {
                Err("boom")
            } else {
                Ok(true)
            }
        });
        assert_eq!(res, Err("boom"));
    }

    #[test]
    fn default_iterator_has_one_empty_row() {
        let mut iter = Iter::default_row();
        assert_eq!(iter.kind(), IterKind::Default);
        assert_eq!(iter.size(), 1);
        let rows: Vec<_> = iter.rows().collect();
        assert_eq!(rows.len(), 1);
        assert!(rows[0].is_empty());

        let res: Result<(), ()> = iter.try_retain(|_| Ok(false));
        assert!(res.is_ok());
        assert!(iter.is_empty());
    }
}
