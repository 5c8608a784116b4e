//! Set operations: UNION and MINUS.

use std::collections::HashSet;
use std::sync::Arc;

use super::OperatorContext;
use crate::exec::error::{ExecError, ExecResult};
use crate::exec::iter::Iter;
use crate::exec::result::ResultSet;

/// Concatenates both inputs: all left rows, then all right rows.
///
/// Duplicates are kept.
///
/// # Errors
///
/// Fails if an input is missing or the output is too large.
pub fn union(op: &OperatorContext<'_>) -> ExecResult<Arc<ResultSet>> {
    let left = op.input(0)?;
    let right = op.input(1)?;
    op.ctx.check_rows(left.size() + right.size())?;
    let rows = left.rows().chain(right.rows()).map(|row| row.values()).collect();
    op.output(Iter::sequential(rows))
}

/// Keeps the left rows that do not occur in the right input.
///
/// Rows compare by value across all columns. Left order, duplicates and row
/// shape survive; only rows present on the right are dropped.
///
/// # Errors
///
/// Fails if an input is missing.
pub fn minus(op: &OperatorContext<'_>) -> ExecResult<Arc<ResultSet>> {
    let right = op.input(1)?;
    let exclude: HashSet<_> = right.rows().map(|row| row.values()).collect();
    drop(right);

    let mut left = op.take_input(0)?;
    if !exclude.is_empty() {
        left.iter_mut().try_retain(|row| Ok::<_, ExecError>(!exclude.contains(&row.values())))?;
    }
    op.output(left.into_parts().1)
}
