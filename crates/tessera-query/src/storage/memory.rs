//! In-memory storage.

use std::collections::{BTreeMap, HashMap};

use futures::future::{BoxFuture, FutureExt};
use tessera_core::{Edge, EdgeTypeId, SpaceId, Tag, TagId, Value, Vertex, VertexId};

use super::{
    EdgeDirection, EdgeProp, IndexScanSpec, NeighborEntry, StorageClient, StorageError,
    StorageResult, VertexProp, EDGE_RESERVED_PROPS,
};
use crate::expr::VertexBindings;

#[derive(Debug, Default)]
struct SpaceData {
    vertices: BTreeMap<VertexId, Vec<(TagId, Tag)>>,
    edges: Vec<Edge>,
}

impl SpaceData {
    fn vertex(&self, vid: VertexId, props: &[VertexProp]) -> Option<Vertex> {
        let tags = self.vertices.get(&vid)?;
        let mut vertex = Vertex::new(vid);
        for (tag_id, tag) in tags {
            if props.is_empty() {
                vertex.tags.push(tag.clone());
                continue;
            }
            let Some(spec) = props.iter().find(|p| p.tag == *tag_id) else {
                continue;
            };
            let mut picked = Tag::new(tag.name.clone());
            for (key, value) in &tag.props {
                if spec.props.is_empty() || spec.props.contains(key) {
                    picked.props.insert(key.clone(), value.clone());
                }
            }
            vertex.tags.push(picked);
        }
        Some(vertex)
    }

    fn edges_from(&self, vid: VertexId, edge_type: EdgeTypeId) -> impl Iterator<Item = Edge> + '_ {
        let forward = edge_type.unsigned();
        self.edges.iter().filter_map(move |e| {
            if e.edge_type != forward {
                None
            } else if !edge_type.is_reverse() && e.src == vid {
                Some(e.clone())
            } else if edge_type.is_reverse() && e.dst == vid {
                Some(e.reversed())
            } else {
                None
            }
        })
    }

    fn edge_types(&self, direction: EdgeDirection) -> Vec<EdgeTypeId> {
        let mut forward: Vec<EdgeTypeId> = self.edges.iter().map(|e| e.edge_type).collect();
        forward.sort();
        forward.dedup();
        match direction {
            EdgeDirection::Out => forward,
            EdgeDirection::In => forward.into_iter().map(EdgeTypeId::reversed).collect(),
            EdgeDirection::Both => {
                forward.iter().copied().chain(forward.iter().map(|t| t.reversed())).collect()
            }
        }
    }
}

fn project_edge(mut edge: Edge, props: Option<&[String]>) -> Edge {
    if let Some(props) = props {
        edge.props.retain(|k, _| {
            props.iter().any(|p| p == k) && !EDGE_RESERVED_PROPS.contains(&k.as_str())
        });
    }
    edge
}

/// Graph storage held in memory, one map per space.
///
/// Edges are stored in their forward direction; reverse traversals return
/// reversed copies whose source is the queried vertex.
#[derive(Debug, Default)]
pub struct InMemoryStorage {
    spaces: HashMap<SpaceId, SpaceData>,
}

impl InMemoryStorage {
    /// Creates empty storage.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Attaches a tag to a vertex, creating the vertex and space as needed.
    pub fn add_vertex(&mut self, space: SpaceId, vid: i64, tag_id: i32, tag: Tag) -> &mut Self {
        let tags = self
            .spaces
            .entry(space)
            .or_default()
            .vertices
            .entry(VertexId::new(vid))
            .or_default();
        let tag_id = TagId::new(tag_id);
        tags.retain(|(id, _)| *id != tag_id);
        tags.push((tag_id, tag));
        self
    }

    /// Stores an edge. Reverse edges are normalised to the forward direction.
    pub fn add_edge(&mut self, space: SpaceId, edge: Edge) -> &mut Self {
        let edge = if edge.edge_type.is_reverse() { edge.reversed() } else { edge };
        self.spaces.entry(space).or_default().edges.push(edge);
        self
    }

    fn space(&self, space: SpaceId) -> StorageResult<&SpaceData> {
        self.spaces.get(&space).ok_or(StorageError::SpaceNotFound(space.as_u32()))
    }

    fn neighbors(
        &self,
        space: SpaceId,
        ids: &[VertexId],
        edge_props: &[EdgeProp],
        direction: EdgeDirection,
    ) -> StorageResult<Vec<NeighborEntry>> {
        let data = self.space(space)?;
        let requested: Vec<(EdgeTypeId, Option<&[String]>)> = if edge_props.is_empty() {
            data.edge_types(direction).into_iter().map(|t| (t, None)).collect()
        } else {
            edge_props.iter().map(|p| (p.edge_type, Some(p.props.as_slice()))).collect()
        };

        Ok(ids
            .iter()
            .map(|&vid| {
                let vertex = data.vertex(vid, &[]).unwrap_or_else(|| Vertex::new(vid));
                let edges = requested
                    .iter()
                    .flat_map(|(edge_type, props)| {
                        data.edges_from(vid, *edge_type).map(move |e| project_edge(e, *props))
                    })
                    .collect();
                NeighborEntry { vertex, edges }
            })
            .collect())
    }

    fn scan(
        &self,
        space: SpaceId,
        spec: &IndexScanSpec,
        return_cols: &[String],
    ) -> StorageResult<Vec<Vec<Value>>> {
        let data = self.space(space)?;
        let mut rows = Vec::new();
        for (vid, tags) in &data.vertices {
            let Some((_, tag)) = tags.iter().find(|(id, _)| *id == spec.tag) else {
                continue;
            };
            if let Some(filter) = &spec.filter {
                let vertex = data.vertex(*vid, &[]).unwrap_or_else(|| Vertex::new(*vid));
                let keep = filter
                    .eval_predicate(&VertexBindings(&vertex))
                    .map_err(|e| StorageError::InvalidRequest(e.to_string()))?;
                if !keep {
                    continue;
                }
            }
            let row = return_cols
                .iter()
                .map(|col| match col.as_str() {
                    "_vid" => Value::from(*vid),
                    prop => tag.get(prop).cloned().unwrap_or(Value::Null),
                })
                .collect();
            rows.push(row);
        }
        Ok(rows)
    }
}

impl StorageClient for InMemoryStorage {
    fn fetch_vertices<'a>(
        &'a self,
        space: SpaceId,
        ids: &'a [VertexId],
        props: &'a [VertexProp],
    ) -> BoxFuture<'a, StorageResult<Vec<Vertex>>> {
        async move {
            let data = self.space(space)?;
            Ok(ids.iter().filter_map(|vid| data.vertex(*vid, props)).collect())
        }
        .boxed()
    }

    fn fetch_neighbors<'a>(
        &'a self,
        space: SpaceId,
        ids: &'a [VertexId],
        edge_props: &'a [EdgeProp],
        direction: EdgeDirection,
    ) -> BoxFuture<'a, StorageResult<Vec<NeighborEntry>>> {
        async move { self.neighbors(space, ids, edge_props, direction) }.boxed()
    }

    fn scan_index<'a>(
        &'a self,
        space: SpaceId,
        spec: &'a IndexScanSpec,
        return_cols: &'a [String],
    ) -> BoxFuture<'a, StorageResult<Vec<Vec<Value>>>> {
        async move { self.scan(space, spec, return_cols) }.boxed()
    }
}

#[cfg(test)]
mod tests {
    use futures::executor::block_on;

    use super::*;
    use crate::expr::Expr;

    const SPACE: SpaceId = SpaceId::new(1);

    fn knows(src: i64, dst: i64) -> Edge {
        Edge::new(VertexId::new(src), VertexId::new(dst), EdgeTypeId::new(3), "knows")
            .with_prop("since", 2020i64)
    }

    fn storage() -> InMemoryStorage {
        let mut s = InMemoryStorage::new();
        s.add_vertex(SPACE, 1, 1, Tag::new("person").with_prop("name", "a").with_prop("age", 30i64))
            .add_vertex(SPACE, 1, 2, Tag::new("employee").with_prop("level", 3i64))
            .add_vertex(
                SPACE,
                2,
                1,
                Tag::new("person").with_prop("name", "b").with_prop("age", 40i64),
            )
            .add_edge(SPACE, knows(1, 2))
            .add_edge(SPACE, knows(2, 3));
        s
    }

    fn ids(raw: &[i64]) -> Vec<VertexId> {
        raw.iter().copied().map(VertexId::new).collect()
    }

    #[test]
    fn fetch_vertices_skips_missing_and_projects_tags() {
        let s = storage();
        let all = block_on(s.fetch_vertices(SPACE, &ids(&[1, 9, 2]), &[])).expect("fetch");
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].tags.len(), 2);

        let props = [VertexProp { tag: TagId::new(1), props: vec!["name".into()] }];
        let some = block_on(s.fetch_vertices(SPACE, &ids(&[1]), &props)).expect("fetch");
        assert_eq!(some[0].tags.len(), 1);
        assert_eq!(some[0].prop("person", "name"), Some(&Value::from("a")));
        assert_eq!(some[0].prop("person", "age"), None);
    }

    #[test]
    fn forward_and_reverse_neighbors() {
        let s = storage();
        let out = [EdgeProp { edge_type: EdgeTypeId::new(3), props: vec![] }];
        let entries =
            block_on(s.fetch_neighbors(SPACE, &ids(&[2]), &out, EdgeDirection::Out)).expect("out");
        assert_eq!(entries[0].edges.len(), 1);
        assert_eq!(entries[0].edges[0].dst, VertexId::new(3));
        assert!(entries[0].edges[0].props.is_empty());

        let rev = [EdgeProp { edge_type: EdgeTypeId::new(-3), props: vec!["since".into()] }];
        let entries =
            block_on(s.fetch_neighbors(SPACE, &ids(&[2]), &rev, EdgeDirection::In)).expect("in");
        let edge = &entries[0].edges[0];
        assert_eq!(edge.src, VertexId::new(2));
        assert_eq!(edge.dst, VertexId::new(1));
        assert!(edge.edge_type.is_reverse());
        assert_eq!(edge.prop("since"), Some(&Value::Int(2020)));
    }

    #[test]
    fn both_directions_without_prop_specs() {
        let s = storage();
        let entries =
            block_on(s.fetch_neighbors(SPACE, &ids(&[2]), &[], EdgeDirection::Both)).expect("both");
        let dsts: Vec<i64> = entries[0].edges.iter().map(|e| e.dst.as_i64()).collect();
        assert_eq!(dsts, vec![3, 1]);
    }

    #[test]
    fn scan_index_applies_filter() {
        let s = storage();
        let spec = IndexScanSpec {
            tag: TagId::new(1),
            tag_name: "person".into(),
            filter: Some(Expr::tag_prop("person", "age").greater_than(Expr::constant(35i64))),
        };
        let cols = ["_vid".to_owned(), "name".to_owned()];
        let rows = block_on(s.scan_index(SPACE, &spec, &cols)).expect("scan");
        assert_eq!(rows, vec![vec![Value::Int(2), Value::from("b")]]);
    }

    #[test]
    fn unknown_space() {
        let s = storage();
        let err = block_on(s.fetch_vertices(SpaceId::new(7), &ids(&[1]), &[])).unwrap_err();
        assert_eq!(err, StorageError::SpaceNotFound(7));
    }
}
