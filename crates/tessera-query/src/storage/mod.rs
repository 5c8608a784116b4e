//! Storage and schema contracts.
//!
//! The query layer reaches storage only through [`StorageClient`] and resolves
//! names only through [`SchemaProvider`]. Both are injected into the
//! [`QueryContext`](crate::exec::QueryContext) for one query's lifetime.
//! [`InMemoryStorage`] and [`InMemorySchema`] implement them for embedding and
//! tests.

mod memory;
mod schema;

use std::fmt;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use tessera_core::{Edge, EdgeTypeId, SpaceId, TagId, Value, Vertex, VertexId};
use thiserror::Error;

use crate::expr::Expr;

pub use memory::InMemoryStorage;
pub use schema::{EdgeSchema, InMemorySchema, SchemaError, SchemaProvider, SchemaResult, TagSchema};

/// Reserved edge property names carried by every edge prop spec.
pub const EDGE_RESERVED_PROPS: [&str; 4] = ["_src", "_type", "_rank", "_dst"];

/// Errors returned by a storage client.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StorageError {
    /// The storage service could not be reached.
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    /// The space does not exist on the storage side.
    #[error("space not found: {0}")]
    SpaceNotFound(u32),

    /// A request was rejected as malformed.
    #[error("invalid request: {0}")]
    InvalidRequest(String),
}

/// Result type for storage operations.
pub type StorageResult<T> = Result<T, StorageError>;

/// Direction of a neighbor expansion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    /// Follow outgoing edges.
    Out,
    /// Follow incoming edges.
    In,
    /// Follow both.
    Both,
}

impl fmt::Display for EdgeDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Out => write!(f, "OUT"),
            Self::In => write!(f, "IN"),
            Self::Both => write!(f, "BOTH"),
        }
    }
}

/// Properties to fetch for one tag.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VertexProp {
    /// The tag.
    pub tag: TagId,
    /// Field names; empty means every field.
    pub props: Vec<String>,
}

/// Properties to fetch for one (signed) edge type.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EdgeProp {
    /// Signed edge type; negative means the reverse direction.
    pub edge_type: EdgeTypeId,
    /// Property names, reserved names first.
    pub props: Vec<String>,
}

/// A tag index lookup.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexScanSpec {
    /// The indexed tag.
    pub tag: TagId,
    /// The tag name.
    pub tag_name: String,
    /// Optional filter evaluated against each candidate vertex.
    pub filter: Option<Expr>,
}

/// One source vertex and the edges found from it.
#[derive(Debug, Clone, PartialEq)]
pub struct NeighborEntry {
    /// The source vertex.
    pub vertex: Vertex,
    /// Edges leaving (or, reversed, entering) the source vertex.
    pub edges: Vec<Edge>,
}

/// Asynchronous access to graph storage.
///
/// All operations are fallible; failures surface as node execution failures.
pub trait StorageClient: Send + Sync {
    /// Fetches vertices by id. Missing ids are skipped.
    fn fetch_vertices<'a>(
        &'a self,
        space: SpaceId,
        ids: &'a [VertexId],
        props: &'a [VertexProp],
    ) -> BoxFuture<'a, StorageResult<Vec<Vertex>>>;

    /// Fetches the edges around each id.
    ///
    /// Each [`EdgeProp`] selects a signed edge type. An empty list selects
    /// every edge type in `direction`.
    fn fetch_neighbors<'a>(
        &'a self,
        space: SpaceId,
        ids: &'a [VertexId],
        edge_props: &'a [EdgeProp],
        direction: EdgeDirection,
    ) -> BoxFuture<'a, StorageResult<Vec<NeighborEntry>>>;

    /// Scans a tag index, returning one row of `return_cols` per match.
    fn scan_index<'a>(
        &'a self,
        space: SpaceId,
        spec: &'a IndexScanSpec,
        return_cols: &'a [String],
    ) -> BoxFuture<'a, StorageResult<Vec<Vec<Value>>>>;
}
