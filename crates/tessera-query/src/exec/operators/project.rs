//! Project executor.

use std::sync::Arc;

use super::OperatorContext;
use crate::exec::error::ExecResult;
use crate::exec::iter::Iter;
use crate::exec::result::ResultSet;
use crate::expr::RowBindings;
use crate::plan::YieldColumn;

/// Evaluates `columns` against every input row, producing flat rows.
///
/// # Errors
///
/// Fails if any expression cannot be evaluated.
pub fn project(op: &OperatorContext<'_>, columns: &[YieldColumn]) -> ExecResult<Arc<ResultSet>> {
    let input = op.input(0)?;
    let schema = input.schema();
    op.ctx.check_rows(input.size())?;

    let mut rows = Vec::with_capacity(input.size());
    for row in input.rows() {
        let bindings = RowBindings::new(row, schema);
        let values =
            columns.iter().map(|col| col.expr.eval(&bindings)).collect::<Result<Vec<_>, _>>()?;
        rows.push(values);
    }
    op.output(Iter::sequential(rows))
}
