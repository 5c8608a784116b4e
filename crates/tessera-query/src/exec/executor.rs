//! Dispatch from plan node kinds to their executors.

use std::sync::Arc;

use super::error::{ExecError, ExecResult};
use super::operators::{dedup, filter, join, logic, project, scan, set_ops, sort, OperatorContext};
use super::result::ResultSet;
use crate::plan::PlanNodeKind;

/// Runs the executor for a data-producing node and returns its result.
///
/// Control-flow nodes are driven by the scheduler and never reach this point.
///
/// # Errors
///
/// Propagates executor failures; returns [`ExecError::Internal`] for a
/// control-flow node.
pub async fn execute_node(op: OperatorContext<'_>) -> ExecResult<Arc<ResultSet>> {
    match op.node.kind() {
        PlanNodeKind::Start => logic::start(&op),
        PlanNodeKind::PassThrough => logic::pass_through(&op),
        PlanNodeKind::IndexScan { spec, return_cols } => {
            scan::index_scan(&op, spec, return_cols).await
        }
        PlanNodeKind::GetVertices { src, props } => scan::get_vertices(&op, src, props).await,
        PlanNodeKind::GetNeighbors { src, edge_props, direction } => {
            scan::get_neighbors(&op, src, edge_props, *direction).await
        }
        PlanNodeKind::Filter { condition } => filter::filter(&op, condition),
        PlanNodeKind::Project { columns } => project::project(&op, columns),
        PlanNodeKind::Dedup => dedup::dedup(&op),
        PlanNodeKind::Union => set_ops::union(&op),
        PlanNodeKind::Minus => set_ops::minus(&op),
        PlanNodeKind::Join { left_key, right_key } => join::hash_join(&op, left_key, right_key),
        PlanNodeKind::TopN { factors, offset, count } => sort::top_n(&op, factors, *offset, *count),
        PlanNodeKind::Sort { factors } => sort::sort(&op, factors),
        PlanNodeKind::Limit { offset, count } => sort::limit(&op, *offset, *count),
        PlanNodeKind::Select { .. } | PlanNodeKind::Loop { .. } => Err(ExecError::Internal(
            format!("{} #{} must be run by the scheduler", op.node.name(), op.node.id()),
        )),
    }
}
