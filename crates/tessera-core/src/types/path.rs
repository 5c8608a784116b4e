//! Paths: a start vertex followed by a sequence of steps.

use std::collections::{BTreeMap, HashSet};
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Edge, EdgeKey, EdgeTypeId, Value, Vertex};
use crate::CoreError;

/// One hop of a [`Path`]: the edge taken and the vertex reached.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Step {
    /// The vertex reached by this step.
    pub dst: Vertex,
    /// Signed edge type id of the edge taken.
    pub edge_type: EdgeTypeId,
    /// Edge type name.
    pub name: String,
    /// Edge ranking.
    pub ranking: i64,
    /// Edge properties.
    pub props: BTreeMap<String, Value>,
}

/// An alternating sequence of vertices and edges.
///
/// A path of length `n` has `n` steps and `n + 1` vertices. A path with no
/// steps is a single vertex.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Path {
    /// The start vertex.
    pub src: Vertex,
    /// Steps in traversal order.
    pub steps: Vec<Step>,
}

impl Path {
    /// Creates a zero-length path.
    #[must_use]
    pub const fn new(src: Vertex) -> Self {
        Self { src, steps: Vec::new() }
    }

    /// Appends an edge. The reached vertex carries no tags.
    ///
    /// The caller is responsible for adjacency; see [`Path::try_push_edge`]
    /// for a checked version.
    pub fn push_edge(&mut self, edge: &Edge) {
        self.steps.push(Step {
            dst: Vertex::new(edge.dst),
            edge_type: edge.edge_type,
            name: edge.name.clone(),
            ranking: edge.ranking,
            props: edge.props.clone(),
        });
    }

    /// Appends an edge after checking that it starts at the current end vertex.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::NonAdjacentEdge`] if `edge.src` is not the end vertex.
    pub fn try_push_edge(&mut self, edge: &Edge) -> Result<(), CoreError> {
        let end = self.end_vertex().vid;
        if edge.src != end {
            return Err(CoreError::NonAdjacentEdge {
                vertex: end.as_i64(),
                src: edge.src.as_i64(),
                dst: edge.dst.as_i64(),
            });
        }
        self.push_edge(edge);
        Ok(())
    }

    /// Appends `other` to this path.
    ///
    /// `other` must start where this path ends. The start vertex of `other`
    /// replaces this path's end vertex, so tags fetched later win.
    ///
    /// # Errors
    ///
    /// Returns [`CoreError::DisconnectedPath`] if the endpoints differ.
    pub fn concat(&mut self, other: &Self) -> Result<(), CoreError> {
        let end = self.end_vertex().vid;
        if end != other.src.vid {
            return Err(CoreError::DisconnectedPath {
                end: end.as_i64(),
                start: other.src.vid.as_i64(),
            });
        }
        match self.steps.last_mut() {
            Some(last) => last.dst = other.src.clone(),
            None => self.src = other.src.clone(),
        }
        self.steps.extend(other.steps.iter().cloned());
        Ok(())
    }

    /// Number of edges in the path.
    #[must_use]
    pub fn length(&self) -> usize {
        self.steps.len()
    }

    /// The first vertex.
    #[must_use]
    pub const fn start_vertex(&self) -> &Vertex {
        &self.src
    }

    /// The last vertex.
    #[must_use]
    pub fn end_vertex(&self) -> &Vertex {
        self.steps.last().map_or(&self.src, |s| &s.dst)
    }

    /// All vertices in traversal order.
    pub fn vertices(&self) -> impl Iterator<Item = &Vertex> {
        std::iter::once(&self.src).chain(self.steps.iter().map(|s| &s.dst))
    }

    /// Materialises the edges of the path in traversal order.
    #[must_use]
    pub fn relationships(&self) -> Vec<Edge> {
        let mut prev = self.src.vid;
        self.steps
            .iter()
            .map(|step| {
                let edge = Edge {
                    src: prev,
                    dst: step.dst.vid,
                    edge_type: step.edge_type,
                    name: step.name.clone(),
                    ranking: step.ranking,
                    props: step.props.clone(),
                };
                prev = step.dst.vid;
                edge
            })
            .collect()
    }

    /// Returns `true` if any edge occurs more than once, regardless of the
    /// direction in which it was traversed.
    #[must_use]
    pub fn has_duplicate_edges(&self) -> bool {
        let mut seen: HashSet<EdgeKey> = HashSet::with_capacity(self.steps.len());
        self.relationships().iter().any(|e| !seen.insert(e.key()))
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}", self.src)?;
        for step in &self.steps {
            if step.edge_type.is_reverse() {
                write!(f, "<-[:{}@{}]-{}", step.name, step.ranking, step.dst)?;
            } else {
                write!(f, "-[:{}@{}]->{}", step.name, step.ranking, step.dst)?;
            }
        }
        write!(f, ">")
    }
}
