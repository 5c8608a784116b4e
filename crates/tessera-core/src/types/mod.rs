//! Core data types for Tessera.
//!
//! This module defines the identifiers, graph primitives and the polymorphic
//! [`Value`] that flows through query execution.

mod edge;
mod id;
mod path;
mod value;
mod vertex;

pub use edge::{Edge, EdgeKey};
pub use id::{EdgeTypeId, SpaceId, TagId, VertexId};
pub use path::{Path, Step};
pub use value::Value;
pub use vertex::{Tag, Vertex};
