//! Dedup executor.

use std::collections::HashSet;
use std::sync::Arc;

use super::OperatorContext;
use crate::exec::error::{ExecError, ExecResult};
use crate::exec::result::ResultSet;

/// Removes duplicate rows, keeping the first occurrence of each.
///
/// # Errors
///
/// Fails if the input is not available.
pub fn dedup(op: &OperatorContext<'_>) -> ExecResult<Arc<ResultSet>> {
    let mut input = op.take_input(0)?;
    let mut seen = HashSet::with_capacity(input.size());
    input.iter_mut().try_retain(|row| Ok::<_, ExecError>(seen.insert(row.values())))?;
    op.output(input.into_parts().1)
}
