//! Vertices and their tags.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{Value, VertexId};

/// A named set of properties attached to a vertex.
///
/// A vertex carries one [`Tag`] per schema it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Tag {
    /// The tag name (the vertex label).
    pub name: String,
    /// Property values keyed by field name.
    pub props: BTreeMap<String, Value>,
}

impl Tag {
    /// Creates a tag with no properties.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self { name: name.into(), props: BTreeMap::new() }
    }

    /// Adds a property to the tag.
    #[must_use]
    pub fn with_prop(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.props.insert(key.into(), value.into());
        self
    }

    /// Looks up a property value.
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.props.get(key)
    }
}

/// A vertex: an id plus zero or more tags.
///
/// # Example
///
/// ```
/// use tessera_core::{Tag, Value, Vertex, VertexId};
///
/// let v = Vertex::new(VertexId::new(1))
///     .with_tag(Tag::new("person").with_prop("name", "Alice"));
///
/// assert!(v.has_tag("person"));
/// assert_eq!(v.prop("person", "name"), Some(&Value::from("Alice")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct Vertex {
    /// The vertex id.
    pub vid: VertexId,
    /// Tags attached to the vertex.
    pub tags: Vec<Tag>,
}

impl Vertex {
    /// Creates a vertex with no tags.
    #[must_use]
    pub const fn new(vid: VertexId) -> Self {
        Self { vid, tags: Vec::new() }
    }

    /// Attaches a tag to the vertex.
    #[must_use]
    pub fn with_tag(mut self, tag: Tag) -> Self {
        self.tags.push(tag);
        self
    }

    /// Returns `true` if the vertex carries the named tag.
    #[must_use]
    pub fn has_tag(&self, name: &str) -> bool {
        self.tags.iter().any(|t| t.name == name)
    }

    /// Returns the named tag, if present.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&Tag> {
        self.tags.iter().find(|t| t.name == name)
    }

    /// Looks up a property of a specific tag.
    #[must_use]
    pub fn prop(&self, tag: &str, key: &str) -> Option<&Value> {
        self.tag(tag).and_then(|t| t.get(key))
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}", self.vid)?;
        for tag in &self.tags {
            write!(f, " :{}", tag.name)?;
        }
        write!(f, ")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tag_lookup() {
        let v = Vertex::new(VertexId::new(1))
            .with_tag(Tag::new("person").with_prop("age", 30i64))
            .with_tag(Tag::new("employee"));
        assert!(v.has_tag("employee"));
        assert!(!v.has_tag("robot"));
        assert_eq!(v.prop("person", "age"), Some(&Value::Int(30)));
        assert_eq!(v.prop("employee", "age"), None);
    }

    #[test]
    fn display() {
        let v = Vertex::new(VertexId::new(7)).with_tag(Tag::new("city"));
        assert_eq!(v.to_string(), "(7 :city)");
    }
}
