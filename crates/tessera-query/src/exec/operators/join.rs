//! Hash join executor.

use std::collections::HashMap;
use std::sync::Arc;

use tessera_core::Value;
use tracing::trace;

use super::OperatorContext;
use crate::exec::error::ExecResult;
use crate::exec::iter::{Iter, RowCursor};
use crate::exec::result::ResultSet;
use crate::exec::row::JoinRow;
use crate::expr::{Expr, RowBindings};

/// Inner equi-join of the two inputs.
///
/// The left input is the build side. Output rows are left columns followed
/// by right columns, in probe order; for one probe row, matches keep build
/// order. Null keys never match.
///
/// # Errors
///
/// Fails if a key cannot be evaluated or too many rows would be produced.
pub fn hash_join(
    op: &OperatorContext<'_>,
    left_key: &Expr,
    right_key: &Expr,
) -> ExecResult<Arc<ResultSet>> {
    let left = op.input(0)?;
    let right = op.input(1)?;

    let mut build: HashMap<Value, Vec<JoinRow>> = HashMap::with_capacity(left.size());
    let left_schema = left.schema();
    for row in left.rows() {
        let key = left_key.eval(&RowBindings::new(row, left_schema))?;
        if !key.is_null() {
            build.entry(key).or_default().push(row.to_join_row());
        }
    }

    let mut rows = Vec::new();
    let right_schema = right.schema();
    for row in right.rows() {
        let key = right_key.eval(&RowBindings::new(row, right_schema))?;
        if key.is_null() {
            continue;
        }
        if let Some(matches) = build.get(&key) {
            let probe = row.to_join_row();
            rows.extend(matches.iter().map(|m| m.concat(&probe)));
            op.ctx.check_rows(rows.len())?;
        }
    }
    trace!(build = left.size(), probe = right.size(), output = rows.len(), "hash join");
    op.output(Iter::Join(RowCursor::new(rows)))
}
