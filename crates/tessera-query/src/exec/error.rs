//! Execution errors.

use thiserror::Error;

use super::IterKind;
use crate::expr::EvalError;
use crate::plan::PlanError;
use crate::storage::StorageError;

/// Errors that can occur while executing a plan.
///
/// Execution errors are `Clone` so that one failure can be observed by every
/// consumer awaiting the failed node.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ExecError {
    /// A storage request failed.
    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    /// Expression evaluation failed.
    #[error("evaluation error: {0}")]
    Eval(#[from] EvalError),

    /// An operator received an iterator kind it cannot process.
    #[error("{operator} does not support {kind} iterators")]
    UnsupportedIterator {
        /// The operator.
        operator: &'static str,
        /// The offending iterator kind.
        kind: IterKind,
    },

    /// A variable was read before it was published or after it was released.
    #[error("result not available for variable: {0}")]
    VariableNotFound(String),

    /// An operator would materialise more rows than allowed.
    #[error("query too large: {rows} rows exceeds limit of {limit}")]
    ResourceExhausted {
        /// Rows the operator needed.
        rows: usize,
        /// The configured limit.
        limit: usize,
    },

    /// The query was cancelled, usually because another node failed.
    #[error("query cancelled")]
    Cancelled,

    /// The plan is inconsistent.
    #[error("plan error: {0}")]
    Plan(#[from] PlanError),

    /// Any other broken invariant.
    #[error("internal error: {0}")]
    Internal(String),
}

impl ExecError {
    /// Returns `true` for errors that indicate a bug rather than a problem
    /// with the data or the environment.
    #[must_use]
    pub const fn is_internal(&self) -> bool {
        matches!(
            self,
            Self::UnsupportedIterator { .. }
                | Self::VariableNotFound(_)
                | Self::Plan(_)
                | Self::Internal(_)
        )
    }
}

/// Result type for execution.
pub type ExecResult<T> = Result<T, ExecError>;
