//! Schema lookup.

use std::collections::HashMap;

use tessera_core::{EdgeTypeId, SpaceId, TagId};
use thiserror::Error;

/// Errors returned by a schema provider.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    /// The space is unknown.
    #[error("space not found: {0}")]
    SpaceNotFound(u32),

    /// No tag with this name exists.
    #[error("tag not found: {0}")]
    TagNotFound(String),

    /// No tag with this id exists.
    #[error("tag id not found: {0}")]
    TagIdNotFound(i32),

    /// No edge type with this name exists.
    #[error("edge type not found: {0}")]
    EdgeNotFound(String),

    /// No edge type with this id exists.
    #[error("edge type id not found: {0}")]
    EdgeIdNotFound(i32),
}

/// Result type for schema lookups.
pub type SchemaResult<T> = Result<T, SchemaError>;

/// A tag definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TagSchema {
    /// Tag id.
    pub id: TagId,
    /// Tag name.
    pub name: String,
    /// Field names in declaration order.
    pub fields: Vec<String>,
}

/// An edge type definition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdgeSchema {
    /// Edge type id (always positive).
    pub id: EdgeTypeId,
    /// Edge type name.
    pub name: String,
    /// Field names in declaration order.
    pub fields: Vec<String>,
}

/// Resolves tag and edge type names, ids and fields.
///
/// Lookup failures are plan construction errors.
pub trait SchemaProvider: Send + Sync {
    /// Looks up a tag by name.
    fn tag_by_name(&self, space: SpaceId, name: &str) -> SchemaResult<TagSchema>;

    /// Looks up a tag by id.
    fn tag_by_id(&self, space: SpaceId, id: TagId) -> SchemaResult<TagSchema>;

    /// Looks up an edge type by name.
    fn edge_by_name(&self, space: SpaceId, name: &str) -> SchemaResult<EdgeSchema>;

    /// Looks up an edge type by id. The sign of `id` is ignored.
    fn edge_by_id(&self, space: SpaceId, id: EdgeTypeId) -> SchemaResult<EdgeSchema>;

    /// Every tag in the space, ordered by id.
    fn all_tags(&self, space: SpaceId) -> SchemaResult<Vec<TagSchema>>;

    /// Every edge type in the space, ordered by id.
    fn all_edges(&self, space: SpaceId) -> SchemaResult<Vec<EdgeSchema>>;
}

#[derive(Debug, Default)]
struct SpaceSchema {
    tags: Vec<TagSchema>,
    edges: Vec<EdgeSchema>,
}

/// A schema provider backed by in-memory definitions.
///
/// # Example
///
/// ```
/// use tessera_core::{SpaceId, TagId};
/// use tessera_query::storage::{InMemorySchema, SchemaProvider};
///
/// let space = SpaceId::new(1);
/// let mut schema = InMemorySchema::new();
/// schema.add_tag(space, 1, "person", &["name", "age"]);
///
/// let tag = schema.tag_by_name(space, "person").unwrap();
/// assert_eq!(tag.id, TagId::new(1));
/// assert!(schema.tag_by_name(space, "city").is_err());
/// ```
#[derive(Debug, Default)]
pub struct InMemorySchema {
    spaces: HashMap<SpaceId, SpaceSchema>,
}

impl InMemorySchema {
    /// Creates an empty schema.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers a space with no tags or edge types.
    pub fn add_space(&mut self, space: SpaceId) -> &mut Self {
        self.spaces.entry(space).or_default();
        self
    }

    /// Registers a tag, creating the space if needed.
    pub fn add_tag(&mut self, space: SpaceId, id: i32, name: &str, fields: &[&str]) -> &mut Self {
        let tags = &mut self.spaces.entry(space).or_default().tags;
        tags.retain(|t| t.id.as_i32() != id);
        tags.push(TagSchema {
            id: TagId::new(id),
            name: name.to_owned(),
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        });
        tags.sort_by_key(|t| t.id);
        self
    }

    /// Registers an edge type, creating the space if needed.
    pub fn add_edge(&mut self, space: SpaceId, id: i32, name: &str, fields: &[&str]) -> &mut Self {
        let id = EdgeTypeId::new(id).unsigned();
        let edges = &mut self.spaces.entry(space).or_default().edges;
        edges.retain(|e| e.id != id);
        edges.push(EdgeSchema {
            id,
            name: name.to_owned(),
            fields: fields.iter().map(|f| (*f).to_owned()).collect(),
        });
        edges.sort_by_key(|e| e.id);
        self
    }

    fn space(&self, space: SpaceId) -> SchemaResult<&SpaceSchema> {
        self.spaces.get(&space).ok_or(SchemaError::SpaceNotFound(space.as_u32()))
    }
}

impl SchemaProvider for InMemorySchema {
    fn tag_by_name(&self, space: SpaceId, name: &str) -> SchemaResult<TagSchema> {
        self.space(space)?
            .tags
            .iter()
            .find(|t| t.name == name)
            .cloned()
            .ok_or_else(|| SchemaError::TagNotFound(name.to_owned()))
    }

    fn tag_by_id(&self, space: SpaceId, id: TagId) -> SchemaResult<TagSchema> {
        self.space(space)?
            .tags
            .iter()
            .find(|t| t.id == id)
            .cloned()
            .ok_or(SchemaError::TagIdNotFound(id.as_i32()))
    }

    fn edge_by_name(&self, space: SpaceId, name: &str) -> SchemaResult<EdgeSchema> {
        self.space(space)?
            .edges
            .iter()
            .find(|e| e.name == name)
            .cloned()
            .ok_or_else(|| SchemaError::EdgeNotFound(name.to_owned()))
    }

    fn edge_by_id(&self, space: SpaceId, id: EdgeTypeId) -> SchemaResult<EdgeSchema> {
        let id = id.unsigned();
        self.space(space)?
            .edges
            .iter()
            .find(|e| e.id == id)
            .cloned()
            .ok_or(SchemaError::EdgeIdNotFound(id.as_i32()))
    }

    fn all_tags(&self, space: SpaceId) -> SchemaResult<Vec<TagSchema>> {
        Ok(self.space(space)?.tags.clone())
    }

    fn all_edges(&self, space: SpaceId) -> SchemaResult<Vec<EdgeSchema>> {
        Ok(self.space(space)?.edges.clone())
    }
}
