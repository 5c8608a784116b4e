//! Tessera Core
//!
//! This crate provides the value model shared by every layer of the Tessera
//! graph query engine.
//!
//! # Overview
//!
//! - **Identifiers**: [`SpaceId`], [`VertexId`], [`TagId`] and [`EdgeTypeId`]
//! - **Graph primitives**: [`Vertex`] (with its [`Tag`]s), [`Edge`] and [`Path`]
//! - **Values**: the [`Value`] enum, totally ordered and hashable so rows can be
//!   used as join keys, set members and sort keys
//!
//! # Example
//!
//! ```
//! use tessera_core::{Edge, EdgeTypeId, Path, Tag, Value, Vertex, VertexId};
//!
//! let alice =
//!     Vertex::new(VertexId::new(1)).with_tag(Tag::new("person").with_prop("name", "Alice"));
//! let knows = Edge::new(VertexId::new(1), VertexId::new(2), EdgeTypeId::new(3), "knows");
//!
//! let mut path = Path::new(alice);
//! path.push_edge(&knows);
//!
//! assert_eq!(path.length(), 1);
//! assert_eq!(path.end_vertex().vid, VertexId::new(2));
//! assert_eq!(Value::from(path.clone()).as_path(), Some(&path));
//! ```
//!
//! # Modules
//!
//! - [`types`] - Core data types
//! - [`error`] - Error types ([`CoreError`])

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod types;

pub use error::CoreError;
pub use types::{
    Edge, EdgeKey, EdgeTypeId, Path, SpaceId, Step, Tag, TagId, Value, Vertex, VertexId,
};
