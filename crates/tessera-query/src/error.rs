//! Crate-level error type.
//!
//! Every failure surfaced to a caller is classified into one of three kinds:
//! plan construction failures, execution failures and internal invariant
//! violations.

use thiserror::Error;

use crate::exec::ExecError;
use crate::plan::PlanError;

/// Classification of a query failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Planning failed (schema lookup, malformed pattern, inconsistent columns).
    PlanConstruction,
    /// Execution failed (storage failure, runtime type error, resource limit).
    Execution,
    /// A component observed a state that should be impossible.
    InternalInvariantViolation,
}

/// Errors returned by the query layer.
#[derive(Debug, Error)]
pub enum QueryError {
    /// Plan construction failed.
    #[error(transparent)]
    Plan(#[from] PlanError),

    /// Execution failed.
    #[error(transparent)]
    Exec(#[from] ExecError),
}

impl QueryError {
    /// Returns the failure classification.
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Plan(e) if e.is_internal() => ErrorKind::InternalInvariantViolation,
            Self::Plan(_) => ErrorKind::PlanConstruction,
            Self::Exec(e) if e.is_internal() => ErrorKind::InternalInvariantViolation,
            Self::Exec(_) => ErrorKind::Execution,
        }
    }
}

/// Result type for query operations.
pub type QueryResult<T> = Result<T, QueryError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exec::IterKind;
    use crate::storage::StorageError;

    #[test]
    fn classifies_errors() {
        let plan: QueryError = PlanError::ColumnCountMismatch { left: 1, right: 2 }.into();
        assert_eq!(plan.kind(), ErrorKind::PlanConstruction);

        let exec: QueryError = ExecError::Storage(StorageError::Unavailable("down".into())).into();
        assert_eq!(exec.kind(), ErrorKind::Execution);

        let internal: QueryError =
            ExecError::UnsupportedIterator { operator: "TopN", kind: IterKind::Default }.into();
        assert_eq!(internal.kind(), ErrorKind::InternalInvariantViolation);
    }
}
