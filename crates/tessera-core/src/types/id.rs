//! Typed identifiers for graph spaces, vertices, tags and edge types.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Identifier of a graph space (an isolated graph with its own schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpaceId(u32);

impl SpaceId {
    /// Create a new `SpaceId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

/// Unique identifier for a vertex in a space.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct VertexId(i64);

impl VertexId {
    /// Create a new `VertexId` from a raw value.
    #[must_use]
    pub const fn new(id: i64) -> Self {
        Self(id)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn as_i64(self) -> i64 {
        self.0
    }
}

impl From<i64> for VertexId {
    fn from(id: i64) -> Self {
        Self::new(id)
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier of a tag (vertex schema).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TagId(i32);

impl TagId {
    /// Create a new `TagId` from a raw value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }
}

/// Identifier of an edge type.
///
/// The sign carries the traversal direction: a positive id names the
/// forward (out) edge, the negated id names the same edge type traversed
/// in reverse (in-edge).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct EdgeTypeId(i32);

impl EdgeTypeId {
    /// Create a new `EdgeTypeId` from a raw value.
    #[must_use]
    pub const fn new(id: i32) -> Self {
        Self(id)
    }

    /// Get the raw signed value.
    #[must_use]
    pub const fn as_i32(self) -> i32 {
        self.0
    }

    /// Returns the same edge type traversed in the opposite direction.
    #[must_use]
    pub const fn reversed(self) -> Self {
        Self(-self.0)
    }

    /// Returns `true` if this id names a reverse traversal.
    #[must_use]
    pub const fn is_reverse(self) -> bool {
        self.0 < 0
    }

    /// Returns the direction-free edge type id.
    #[must_use]
    pub const fn unsigned(self) -> Self {
        Self(self.0.abs())
    }
}

impl fmt::Display for EdgeTypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vertex_id_roundtrip() {
        let id = VertexId::new(42);
        assert_eq!(id.as_i64(), 42);
        assert_eq!(VertexId::from(42), id);
    }

    #[test]
    fn edge_type_direction() {
        let forward = EdgeTypeId::new(7);
        let reverse = forward.reversed();
        assert!(!forward.is_reverse());
        assert!(reverse.is_reverse());
        assert_eq!(reverse.unsigned(), forward);
        assert_eq!(reverse.reversed(), forward);
    }

    #[test]
    fn ids_are_ordered() {
        assert!(VertexId::new(1) < VertexId::new(2));
        assert!(TagId::new(1) < TagId::new(2));
    }
}
