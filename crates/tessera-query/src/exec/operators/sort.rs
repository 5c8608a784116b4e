//! Ordering executors: TopN, Sort and Limit.
//!
//! TopN keeps a bounded max-heap of the best `offset + count` rows, so its
//! memory stays proportional to the requested window rather than the input.

use std::cmp::Ordering;
use std::sync::Arc;

use tracing::error;

use super::OperatorContext;
use crate::exec::error::{ExecError, ExecResult};
use crate::exec::iter::{Iter, IterKind};
use crate::exec::result::ResultSet;
use crate::exec::row::{LogicalRow, RowShape};
use crate::plan::{OrderFactor, SortOrder};

/// Compares two rows by a list of sort keys.
///
/// Keys are compared in order with [`tessera_core::Value`]'s total order; a
/// missing column sorts as null.
#[must_use]
pub fn compare_rows(a: LogicalRow<'_>, b: LogicalRow<'_>, factors: &[OrderFactor]) -> Ordering {
    for factor in factors {
        let ord = match (a.get(factor.column), b.get(factor.column)) {
            (Some(x), Some(y)) => x.cmp(y),
            (None, Some(y)) if !y.is_null() => Ordering::Less,
            (Some(x), None) if !x.is_null() => Ordering::Greater,
            _ => Ordering::Equal,
        };
        let ord = match factor.order {
            SortOrder::Ascending => ord,
            SortOrder::Descending => ord.reverse(),
        };
        if ord != Ordering::Equal {
            return ord;
        }
    }
    Ordering::Equal
}

/// Keeps rows `[offset, offset + count)` of the input in sorted order.
///
/// # Errors
///
/// Returns [`ExecError::UnsupportedIterator`] for default and neighbor
/// iterators.
pub fn top_n(
    op: &OperatorContext<'_>,
    factors: &[OrderFactor],
    offset: usize,
    count: usize,
) -> ExecResult<Arc<ResultSet>> {
    let mut input = op.take_input(0)?;
    match input.iter_mut() {
        Iter::Sequential(c) => top_n_by(c.rows_mut(), factors, offset, count),
        Iter::Join(c) => top_n_by(c.rows_mut(), factors, offset, count),
        Iter::Prop(c) => top_n_by(c.rows_mut(), factors, offset, count),
        other => return Err(unsupported("TopN", other.kind())),
    }
    op.output(input.into_parts().1)
}

/// Sorts the whole input. The sort is stable.
///
/// # Errors
///
/// Returns [`ExecError::UnsupportedIterator`] for default and neighbor
/// iterators.
pub fn sort(op: &OperatorContext<'_>, factors: &[OrderFactor]) -> ExecResult<Arc<ResultSet>> {
    let mut input = op.take_input(0)?;
    match input.iter_mut() {
        Iter::Sequential(c) => sort_rows(c.rows_mut(), factors),
        Iter::Join(c) => sort_rows(c.rows_mut(), factors),
        Iter::Prop(c) => sort_rows(c.rows_mut(), factors),
        other => return Err(unsupported("Sort", other.kind())),
    }
    op.output(input.into_parts().1)
}

/// Keeps rows `[offset, offset + count)` in input order.
///
/// # Errors
///
/// Fails if the input is missing.
pub fn limit(op: &OperatorContext<'_>, offset: usize, count: usize) -> ExecResult<Arc<ResultSet>> {
    let mut input = op.take_input(0)?;
    let iter = input.iter_mut();
    let size = iter.size();
    iter.erase_range(offset.saturating_add(count).min(size), size);
    iter.erase_range(0, offset);
    op.output(input.into_parts().1)
}

fn top_n_by<R: RowShape>(rows: &mut Vec<R>, factors: &[OrderFactor], offset: usize, count: usize) {
    top_n_rows(rows, offset, count, &mut |a: &R, b: &R| {
        compare_rows(a.logical(), b.logical(), factors) == Ordering::Less
    });
}

fn sort_rows<R: RowShape>(rows: &mut [R], factors: &[OrderFactor]) {
    rows.sort_by(|a, b| compare_rows(a.logical(), b.logical(), factors));
}

fn unsupported(operator: &'static str, kind: IterKind) -> ExecError {
    error!(operator, %kind, "unsupported iterator kind");
    ExecError::UnsupportedIterator { operator, kind }
}

/// Reorders `rows` in place so that it holds the sorted window
/// `[offset, offset + count)` of the full sort order under `less`.
///
/// Only `min(len, offset + count)` rows are kept in a max-heap; a later row
/// replaces the heap's root when it sorts before it.
pub fn top_n_rows<R, F>(rows: &mut Vec<R>, offset: usize, count: usize, less: &mut F)
where
    F: FnMut(&R, &R) -> bool,
{
    let size = rows.len();
    let heap_size = size.min(offset.saturating_add(count));
    if size <= offset || heap_size == 0 {
        rows.clear();
        return;
    }

    make_heap(&mut rows[..heap_size], less);
    for i in heap_size..size {
        if less(&rows[i], &rows[0]) {
            rows.swap(0, i);
            sift_down(&mut rows[..heap_size], 0, less);
        }
    }
    rows.truncate(heap_size);
    sort_heap(rows, less);
    rows.drain(..offset);
}

fn make_heap<R, F: FnMut(&R, &R) -> bool>(rows: &mut [R], less: &mut F) {
    for root in (0..rows.len() / 2).rev() {
        sift_down(rows, root, less);
    }
}

fn sort_heap<R, F: FnMut(&R, &R) -> bool>(rows: &mut [R], less: &mut F) {
    for end in (1..rows.len()).rev() {
        rows.swap(0, end);
        sift_down(&mut rows[..end], 0, less);
    }
}

fn sift_down<R, F: FnMut(&R, &R) -> bool>(rows: &mut [R], mut root: usize, less: &mut F) {
    let len = rows.len();
    loop {
        let left = 2 * root + 1;
        if left >= len {
            break;
        }
        let right = left + 1;
        let child = if right < len && less(&rows[left], &rows[right]) { right } else { left };
        if !less(&rows[root], &rows[child]) {
            break;
        }
        rows.swap(root, child);
        root = child;
    }
}

#[cfg(test)]
mod tests {
    use tessera_core::Value;

    use super::*;

    fn window(values: &[i64], offset: usize, count: usize) -> Vec<i64> {
        let mut rows = values.to_vec();
        top_n_rows(&mut rows, offset, count, &mut |a, b| a < b);
        rows
    }

    #[test]
    fn top_n_window() {
        assert_eq!(window(&[5, 3, 8, 1, 9, 2], 0, 3), vec![1, 2, 3]);
        assert_eq!(window(&[5, 3, 8, 1, 9, 2], 2, 2), vec![3, 5]);
        assert_eq!(window(&[5, 3, 8], 1, 10), vec![5, 8]);
    }

    #[test]
    fn top_n_empty_windows() {
        assert!(window(&[1, 2, 3], 3, 5).is_empty());
        assert!(window(&[1, 2, 3], 4, 5).is_empty());
        assert!(window(&[1, 2, 3], 0, 0).is_empty());
        assert!(window(&[], 0, 5).is_empty());
    }

    #[test]
    fn compare_by_several_keys() {
        let a = vec![Value::Int(1), Value::from("b")];
        let b = vec![Value::Int(1), Value::from("a")];
        let factors = [OrderFactor::asc(0), OrderFactor::desc(1)];
        assert_eq!(compare_rows(a.logical(), b.logical(), &factors), Ordering::Less);
        assert_eq!(compare_rows(a.logical(), a.logical(), &factors), Ordering::Equal);
    }

    #[test]
    fn missing_columns_sort_first() {
        let short = vec![Value::Int(1)];
        let long = vec![Value::Int(1), Value::Int(0)];
        let factors = [OrderFactor::asc(1)];
        assert_eq!(compare_rows(short.logical(), long.logical(), &factors), Ordering::Less);
    }
}
