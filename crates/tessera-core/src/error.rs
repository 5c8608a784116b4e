//! Error types for the core crate.

use thiserror::Error;

/// Maximum length for value display in error messages.
const MAX_VALUE_DISPLAY_LEN: usize = 100;

/// Errors that can occur in the core crate.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CoreError {
    /// A value type mismatch occurred.
    #[error(
        "type mismatch: expected {expected}, got {actual}{}",
        value.as_ref().map(|v| format!(" (value: {v})")).unwrap_or_default()
    )]
    TypeMismatch {
        /// The expected type.
        expected: String,
        /// The actual type.
        actual: String,
        /// The value that caused the mismatch (truncated for display).
        value: Option<String>,
    },

    /// Two paths could not be joined because they do not share an endpoint.
    #[error("cannot join path ending at {end} with path starting at {start}")]
    DisconnectedPath {
        /// Vertex id at the end of the left path.
        end: i64,
        /// Vertex id at the start of the right path.
        start: i64,
    },

    /// An edge does not start at the vertex it is attached to.
    #[error("edge {src}->{dst} is not adjacent to vertex {vertex}")]
    NonAdjacentEdge {
        /// The vertex the edge was attached to.
        vertex: i64,
        /// Edge source.
        src: i64,
        /// Edge destination.
        dst: i64,
    },
}

impl CoreError {
    /// Creates a type mismatch error without a value.
    #[must_use]
    pub fn type_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Self {
        Self::TypeMismatch { expected: expected.into(), actual: actual.into(), value: None }
    }

    /// Creates a type mismatch error with a value for debugging.
    ///
    /// The value is truncated to 100 characters for display.
    #[must_use]
    pub fn type_mismatch_with_value(
        expected: impl Into<String>,
        actual: impl Into<String>,
        value: impl std::fmt::Display,
    ) -> Self {
        let value_str = value.to_string();
        let truncated = if value_str.chars().count() > MAX_VALUE_DISPLAY_LEN {
            let cut: String = value_str.chars().take(MAX_VALUE_DISPLAY_LEN).collect();
            format!("{cut}...")
        } else {
            value_str
        };
        Self::TypeMismatch {
            expected: expected.into(),
            actual: actual.into(),
            value: Some(truncated),
        }
    }
}
