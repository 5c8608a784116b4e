//! Start and PassThrough.

use std::sync::Arc;

use super::OperatorContext;
use crate::exec::error::ExecResult;
use crate::exec::iter::Iter;
use crate::exec::result::ResultSet;

/// Produces the single empty row sources evaluate against.
///
/// # Errors
///
/// Never fails; the signature matches the other executors.
pub fn start(op: &OperatorContext<'_>) -> ExecResult<Arc<ResultSet>> {
    op.output(Iter::default_row())
}

/// Republishes the input result without copying it.
///
/// # Errors
///
/// Fails if the input is not available.
pub fn pass_through(op: &OperatorContext<'_>) -> ExecResult<Arc<ResultSet>> {
    op.input(0)
}
