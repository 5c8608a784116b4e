//! Execution plans.
//!
//! A [`PlanGraph`] is an arena of [`PlanNode`]s addressed by [`NodeId`]. All
//! edges between nodes (dependencies, Select branches, Loop bodies) are ids, so
//! shared subplans and diamond dependencies need no shared ownership.
//! [`PlanGraph::finish`] resolves input variables, runs lifetime analysis and
//! freezes the graph into an [`ExecutionPlan`].

mod error;
mod explain;
mod graph;
mod lifetime;
mod node;
mod variable;

pub use error::{PlanError, PlanResult};
pub use explain::{
    BranchInfo, DisplayTree, Pair, PlanDescription, PlanNodeDescription, ProfilingStats,
};
pub use graph::{ExecutionPlan, PlanGraph, SubPlan};
pub use node::{NodeId, OrderFactor, PlanNode, PlanNodeKind, SortOrder, YieldColumn};
pub use variable::{LastUser, Variable, VariableTable};
