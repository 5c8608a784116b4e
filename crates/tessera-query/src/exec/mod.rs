//! Query execution.
//!
//! A finished [`ExecutionPlan`](crate::plan::ExecutionPlan) is run by the
//! [`Scheduler`], which executes every node once its dependencies have
//! completed and publishes node outputs into the [`QueryContext`] variable
//! store. Operators read their inputs from that store.
//!
//! # Row model
//!
//! A [`ResultSet`] pairs a [`Schema`] with an [`Iter`]. Iterators hold rows of
//! one concrete shape ([`IterKind`]) and expose them as [`LogicalRow`]s:
//!
//! - `Default` - the single empty row produced by `Start`
//! - `Sequential` - flat rows from projections, unions and index scans
//! - `Join` - rows made of join input segments
//! - `Prop` - fetched vertices
//! - `GetNeighbors` - one row per expanded edge

pub mod context;
pub mod error;
pub mod executor;
pub mod iter;
pub mod operators;
pub mod result;
pub mod row;
pub mod scheduler;

pub use context::{
    CancellationToken, ExecutionConfig, ExecutionStats, QueryContext, DEFAULT_MAX_ROWS_IN_MEMORY,
};
pub use error::{ExecError, ExecResult};
pub use iter::{DefaultIter, Iter, IterKind, LogicalRows, RowCursor};
pub use result::ResultSet;
pub use row::{JoinRow, LogicalRow, NeighborRow, PropRow, RowShape, Schema};
pub use scheduler::Scheduler;
