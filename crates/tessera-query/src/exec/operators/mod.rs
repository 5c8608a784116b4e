//! Executors for the data-producing plan node kinds.
//!
//! - **Sources**: [`scan`] - index scans, vertex fetches, neighbor expansion
//! - **Row operators**: [`filter`], [`project`], [`dedup`]
//! - **Binary operators**: [`join`], [`set_ops`]
//! - **Ordering**: [`sort`] - TopN, Sort and Limit
//! - **Pass-through**: [`logic`] - Start and PassThrough
//!
//! Each executor reads its inputs from the query context through an
//! [`OperatorContext`] and returns the result to publish.

pub mod dedup;
pub mod filter;
pub mod join;
pub mod logic;
pub mod project;
pub mod scan;
pub mod set_ops;
pub mod sort;

use std::sync::Arc;

use super::context::QueryContext;
use super::error::{ExecError, ExecResult};
use super::iter::Iter;
use super::result::ResultSet;
use super::row::Schema;
use crate::plan::{ExecutionPlan, PlanNode};

/// Everything an executor needs: the query context, the plan and its node.
#[derive(Debug, Clone, Copy)]
pub struct OperatorContext<'a> {
    /// The query context.
    pub ctx: &'a QueryContext,
    /// The plan being run.
    pub plan: &'a ExecutionPlan,
    /// The node being executed.
    pub node: &'a PlanNode,
}

impl<'a> OperatorContext<'a> {
    /// Bundles the pieces of one node execution.
    #[must_use]
    pub const fn new(ctx: &'a QueryContext, plan: &'a ExecutionPlan, node: &'a PlanNode) -> Self {
        Self { ctx, plan, node }
    }

    fn input_var(&self, idx: usize) -> ExecResult<&'a str> {
        self.node.input_vars().get(idx).map(String::as_str).ok_or_else(|| {
            let node = self.node;
            ExecError::Internal(format!("{} #{} has no input {idx}", node.name(), node.id()))
        })
    }

    /// Borrows the result of input `idx`.
    ///
    /// # Errors
    ///
    /// Fails if the node has no such input or its result is not published.
    pub fn input(&self, idx: usize) -> ExecResult<Arc<ResultSet>> {
        self.ctx.result(self.input_var(idx)?)
    }

    /// Returns an owned copy of input `idx` for in-place modification.
    ///
    /// When this node is the input's only reader the published result is
    /// moved out of the context instead of copied.
    ///
    /// # Errors
    ///
    /// Fails if the node has no such input or its result is not published.
    pub fn take_input(&self, idx: usize) -> ExecResult<ResultSet> {
        let var = self.input_var(idx)?;
        let sole_reader = self.plan.is_sole_reader(var, self.node.id());
        if self.ctx.config().release_consumed_results && sole_reader {
            if let Some(shared) = self.ctx.take_result(var) {
                return Ok(Arc::try_unwrap(shared).unwrap_or_else(|shared| (*shared).clone()));
            }
        }
        Ok((*self.ctx.result(var)?).clone())
    }

    /// The node's output schema.
    #[must_use]
    pub fn schema(&self) -> Arc<Schema> {
        Arc::new(Schema::from(self.node.col_names()))
    }

    /// Wraps rows into this node's output, enforcing the row limit.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ResourceExhausted`] if there are too many rows.
    pub fn output(&self, iter: Iter) -> ExecResult<Arc<ResultSet>> {
        self.ctx.check_rows(iter.size())?;
        Ok(Arc::new(ResultSet::new(self.schema(), iter)))
    }
}
