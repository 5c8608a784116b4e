//! Filter executor.

use std::sync::Arc;

use super::OperatorContext;
use crate::exec::error::ExecResult;
use crate::exec::result::ResultSet;
use crate::expr::{Expr, RowBindings};

/// Keeps the input rows for which `condition` is true.
///
/// Null counts as false. Row order and row shape are preserved.
///
/// # Errors
///
/// Fails if the condition cannot be evaluated or is not boolean.
pub fn filter(op: &OperatorContext<'_>, condition: &Expr) -> ExecResult<Arc<ResultSet>> {
    let mut input = op.take_input(0)?;
    let schema = Arc::clone(input.schema_arc());
    input.iter_mut().try_retain(|row| condition.eval_predicate(&RowBindings::new(row, &schema)))?;
    op.output(input.into_parts().1)
}
