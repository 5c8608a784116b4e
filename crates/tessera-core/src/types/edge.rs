//! Directed edges.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{EdgeTypeId, Value, VertexId};

/// A directed edge between two vertices.
///
/// Edges returned by a reverse traversal carry a negative [`EdgeTypeId`]
/// and have `src` set to the vertex the traversal started from. Use
/// [`Edge::key`] to compare edges independently of traversal direction.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Edge {
    /// Source vertex.
    pub src: VertexId,
    /// Destination vertex.
    pub dst: VertexId,
    /// Signed edge type id.
    pub edge_type: EdgeTypeId,
    /// Edge type name.
    pub name: String,
    /// Ranking distinguishing parallel edges of the same type.
    pub ranking: i64,
    /// Property values keyed by field name.
    pub props: BTreeMap<String, Value>,
}

/// Direction-independent identity of an edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EdgeKey {
    /// Source vertex in the stored (forward) direction.
    pub src: VertexId,
    /// Destination vertex in the stored (forward) direction.
    pub dst: VertexId,
    /// Unsigned edge type id.
    pub edge_type: EdgeTypeId,
    /// Edge ranking.
    pub ranking: i64,
}

impl Edge {
    /// Creates an edge with ranking 0 and no properties.
    #[must_use]
    pub fn new(
        src: VertexId,
        dst: VertexId,
        edge_type: EdgeTypeId,
        name: impl Into<String>,
    ) -> Self {
        Self { src, dst, edge_type, name: name.into(), ranking: 0, props: BTreeMap::new() }
    }

    /// Sets the ranking.
    #[must_use]
    pub const fn with_ranking(mut self, ranking: i64) -> Self {
        self.ranking = ranking;
        self
    }

    /// Adds a property.
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Looks up a property value.
    #[must_use]
    pub fn prop(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }

    /// Returns the same edge seen from the other endpoint.
    #[must_use]
    pub fn reversed(&self) -> Self {
        Self {
            src: self.dst,
            dst: self.src,
            edge_type: self.edge_type.reversed(),
            name: self.name.clone(),
            ranking: self.ranking,
            props: self.props.clone(),
        }
    }

    /// Returns the direction-independent identity of this edge.
    ///
    /// A forward edge and its reversed counterpart share the same key.
    #[must_use]
    pub const fn key(&self) -> EdgeKey {
        if self.edge_type.is_reverse() {
            EdgeKey {
                src: self.dst,
                dst: self.src,
                edge_type: self.edge_type.reversed(),
                ranking: self.ranking,
            }
        } else {
            EdgeKey {
                src: self.src,
                dst: self.dst,
                edge_type: self.edge_type,
                ranking: self.ranking,
            }
        }
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.edge_type.is_reverse() {
            write!(f, "({})<-[:{}@{}]-({})", self.src, self.name, self.ranking, self.dst)
        } else {
            write!(f, "({})-[:{}@{}]->({})", self.src, self.name, self.ranking, self.dst)
        }
    }
}
