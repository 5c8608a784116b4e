//! Source executors: index scans, vertex fetches and neighbor expansion.
//!
//! Vertex-id expressions are evaluated once per input row; a Start input
//! contributes a single evaluation. Ids are deduplicated in first-seen order
//! before the storage request is issued.

use std::collections::HashSet;
use std::sync::Arc;

use tessera_core::{Value, VertexId};
use tracing::trace;

use super::OperatorContext;
use crate::exec::error::ExecResult;
use crate::exec::iter::{Iter, RowCursor};
use crate::exec::result::ResultSet;
use crate::exec::row::{NeighborRow, PropRow};
use crate::expr::{EmptyBindings, EvalError, Expr, RowBindings};
use crate::storage::{EdgeDirection, EdgeProp, IndexScanSpec, VertexProp};

/// Looks vertices up through a tag index.
///
/// # Errors
///
/// Fails if the storage request fails.
pub async fn index_scan(
    op: &OperatorContext<'_>,
    spec: &IndexScanSpec,
    return_cols: &[String],
) -> ExecResult<Arc<ResultSet>> {
    let rows = op.ctx.storage().scan_index(op.ctx.space(), spec, return_cols).await?;
    trace!(tag = %spec.tag_name, rows = rows.len(), "index scan");
    op.output(Iter::sequential(rows))
}

/// Fetches the vertices named by `src`.
///
/// # Errors
///
/// Fails if `src` does not evaluate to vertex ids or the storage request fails.
pub async fn get_vertices(
    op: &OperatorContext<'_>,
    src: &Expr,
    props: &[VertexProp],
) -> ExecResult<Arc<ResultSet>> {
    let ids = collect_ids(op, src)?;
    let vertices = op.ctx.storage().fetch_vertices(op.ctx.space(), &ids, props).await?;
    trace!(requested = ids.len(), found = vertices.len(), "fetched vertices");
    let rows = vertices.into_iter().map(PropRow::new).collect();
    op.output(Iter::Prop(RowCursor::new(rows)))
}

/// Expands the vertices named by `src` to their edges, one row per edge.
///
/// # Errors
///
/// Fails if `src` does not evaluate to vertex ids or the storage request fails.
pub async fn get_neighbors(
    op: &OperatorContext<'_>,
    src: &Expr,
    edge_props: &[EdgeProp],
    direction: EdgeDirection,
) -> ExecResult<Arc<ResultSet>> {
    let ids = collect_ids(op, src)?;
    let entries =
        op.ctx.storage().fetch_neighbors(op.ctx.space(), &ids, edge_props, direction).await?;

    let total: usize = entries.iter().map(|e| e.edges.len()).sum();
    op.ctx.check_rows(total)?;
    let mut rows = Vec::with_capacity(total);
    for entry in entries {
        for edge in entry.edges {
            rows.push(NeighborRow::new(entry.vertex.clone(), edge));
        }
    }
    trace!(sources = ids.len(), edges = rows.len(), "expanded neighbors");
    op.output(Iter::GetNeighbors(RowCursor::new(rows)))
}

fn collect_ids(op: &OperatorContext<'_>, src: &Expr) -> ExecResult<Vec<VertexId>> {
    let mut ids = Vec::new();
    let mut seen = HashSet::new();
    if op.node.input_vars().is_empty() {
        push_ids(src.eval(&EmptyBindings)?, &mut ids, &mut seen)?;
        return Ok(ids);
    }
    let input = op.input(0)?;
    let schema = input.schema();
    for row in input.rows() {
        push_ids(src.eval(&RowBindings::new(row, schema))?, &mut ids, &mut seen)?;
    }
    Ok(ids)
}

fn push_ids(
    value: Value,
    ids: &mut Vec<VertexId>,
    seen: &mut HashSet<VertexId>,
) -> Result<(), EvalError> {
    match value {
        Value::Null => Ok(()),
        Value::List(items) => {
            items.into_iter().try_for_each(|item| push_ids(item, ids, seen))
        }
        other => {
            let id = other.as_vertex_id().ok_or_else(|| EvalError::InvalidOperand {
                operation: "vertex id".to_owned(),
                actual: other.type_name(),
            })?;
            if seen.insert(id) {
                ids.push(id);
            }
            Ok(())
        }
    }
}
