//! Plan construction errors.

use thiserror::Error;

use super::NodeId;
use crate::storage::SchemaError;

/// Errors that can occur while building a plan.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum PlanError {
    /// A node id does not belong to the graph.
    #[error("unknown plan node: {0}")]
    UnknownNode(NodeId),

    /// A variable name is already produced by another node.
    #[error("variable already has a producer: {0}")]
    DuplicateVariable(String),

    /// A condition refers to a variable no node produces.
    #[error("unknown variable: {0}")]
    UnknownVariable(String),

    /// Set operation inputs disagree on width.
    #[error("inconsistent column counts: left has {left}, right has {right}")]
    ColumnCountMismatch {
        /// Left input width.
        left: usize,
        /// Right input width.
        right: usize,
    },

    /// An input column referenced by the planner does not exist.
    #[error("unknown column: {0}")]
    UnknownColumn(String),

    /// Two output columns share a name.
    #[error("duplicate column name: {0}")]
    DuplicateColumn(String),

    /// A sort factor refers to a column the input does not have.
    #[error("sort column {index} out of range for {width} columns")]
    SortColumnOutOfRange {
        /// The requested column index.
        index: usize,
        /// Input width.
        width: usize,
    },

    /// The pattern cannot be lowered.
    #[error("invalid graph pattern: {0}")]
    InvalidPattern(String),

    /// Schema lookup failed.
    #[error(transparent)]
    Schema(#[from] SchemaError),
}

impl PlanError {
    /// Returns `true` for errors that indicate a bug in plan construction
    /// rather than a problem with the query.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(self, Self::UnknownNode(_) | Self::DuplicateVariable(_))
    }
}

/// Result type for plan construction.
pub type PlanResult<T> = Result<T, PlanError>;
