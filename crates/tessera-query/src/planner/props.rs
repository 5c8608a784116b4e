//! Storage property specifications built from the schema.

use tessera_core::SpaceId;

use crate::expr::PropRefs;
use crate::plan::PlanResult;
use crate::storage::{EdgeDirection, EdgeProp, SchemaProvider, VertexProp, EDGE_RESERVED_PROPS};

/// Edge properties to fetch for a traversal over `edge_types` in `direction`.
///
/// Every type contributes the reserved properties followed by its schema
/// fields. `In` requests the reversed type, `Both` the reversed and then the
/// forward type. No types means every edge type in the space.
///
/// # Errors
///
/// Fails if a type name or the space is unknown.
pub fn edge_props(
    schema: &dyn SchemaProvider,
    space: SpaceId,
    edge_types: &[String],
    direction: EdgeDirection,
) -> PlanResult<Vec<EdgeProp>> {
    let edges = if edge_types.is_empty() {
        schema.all_edges(space)?
    } else {
        edge_types.iter().map(|name| schema.edge_by_name(space, name)).collect::<Result<_, _>>()?
    };

    let mut props = Vec::with_capacity(edges.len() * 2);
    for edge in edges {
        let mut names: Vec<String> = EDGE_RESERVED_PROPS.iter().map(|p| (*p).to_owned()).collect();
        names.extend(edge.fields.iter().cloned());
        match direction {
            EdgeDirection::Out => props.push(EdgeProp { edge_type: edge.id, props: names }),
            EdgeDirection::In => {
                props.push(EdgeProp { edge_type: edge.id.reversed(), props: names });
            }
            EdgeDirection::Both => {
                props.push(EdgeProp { edge_type: edge.id.reversed(), props: names.clone() });
                props.push(EdgeProp { edge_type: edge.id, props: names });
            }
        }
    }
    Ok(props)
}

/// Every field of every tag in the space.
///
/// # Errors
///
/// Fails if the space is unknown.
pub fn all_vertex_props(
    schema: &dyn SchemaProvider,
    space: SpaceId,
) -> PlanResult<Vec<VertexProp>> {
    Ok(schema
        .all_tags(space)?
        .into_iter()
        .map(|tag| VertexProp { tag: tag.id, props: tag.fields })
        .collect())
}

/// Properties of the named tags (or all tags), narrowed to what `refs` uses.
///
/// A tag whose properties are referenced only fetches those; any other tag
/// fetches every field.
///
/// # Errors
///
/// Fails if a tag name or the space is unknown.
pub fn vertex_props(
    schema: &dyn SchemaProvider,
    space: SpaceId,
    tags: Option<&[String]>,
    refs: &PropRefs,
) -> PlanResult<Vec<VertexProp>> {
    let tags = match tags {
        Some(names) => {
            names.iter().map(|name| schema.tag_by_name(space, name)).collect::<Result<Vec<_>, _>>()?
        }
        None => schema.all_tags(space)?,
    };
    Ok(tags
        .into_iter()
        .map(|tag| {
            let props = match refs.tag_props.get(&tag.name) {
                Some(used) => tag.fields.iter().filter(|f| used.contains(*f)).cloned().collect(),
                None => tag.fields.clone(),
            };
            VertexProp { tag: tag.id, props }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use tessera_core::EdgeTypeId;

    use super::*;
    use crate::expr::Expr;
    use crate::plan::PlanError;
    use crate::storage::{InMemorySchema, SchemaError};

    fn schema() -> (InMemorySchema, SpaceId) {
        let space = SpaceId::new(1);
        let mut schema = InMemorySchema::new();
        schema
            .add_space(space)
            .add_tag(space, 1, "person", &["name", "age"])
            .add_tag(space, 2, "city", &["name"])
            .add_edge(space, 10, "knows", &["since"])
            .add_edge(space, 11, "lives", &[]);
        (schema, space)
    }

    #[test]
    fn edge_props_by_direction() {
        let (schema, space) = schema();
        let types = vec!["knows".to_owned()];

        let out = edge_props(&schema, space, &types, EdgeDirection::Out).unwrap();
        assert_eq!(out.len(), 1);
        assert_eq!(out[0].edge_type, EdgeTypeId::new(10));
        assert_eq!(out[0].props, vec!["_src", "_type", "_rank", "_dst", "since"]);

        let inbound = edge_props(&schema, space, &types, EdgeDirection::In).unwrap();
        assert_eq!(inbound[0].edge_type, EdgeTypeId::new(-10));

        let both = edge_props(&schema, space, &types, EdgeDirection::Both).unwrap();
        let signed: Vec<_> = both.iter().map(|p| p.edge_type.as_i32()).collect();
        assert_eq!(signed, vec![-10, 10]);
    }

    #[test]
    fn no_types_means_all_edges() {
        let (schema, space) = schema();
        let all = edge_props(&schema, space, &[], EdgeDirection::Out).unwrap();
        let ids: Vec<_> = all.iter().map(|p| p.edge_type.as_i32()).collect();
        assert_eq!(ids, vec![10, 11]);
    }

    #[test]
    fn unknown_edge_type_is_a_plan_error() {
        let (schema, space) = schema();
        let err =
            edge_props(&schema, space, &["likes".to_owned()], EdgeDirection::Out).unwrap_err();
        assert_eq!(err, PlanError::Schema(SchemaError::EdgeNotFound("likes".to_owned())));
    }

    #[test]
    fn vertex_props_are_narrowed() {
        let (schema, space) = schema();
        let refs = Expr::tag_prop("person", "age").referenced_props();
        let props = vertex_props(&schema, space, None, &refs).unwrap();
        assert_eq!(props.len(), 2);
        assert_eq!(props[0].props, vec!["age"]);
        assert_eq!(props[1].props, vec!["name"]);

        let all = all_vertex_props(&schema, space).unwrap();
        assert_eq!(all[0].props, vec!["name", "age"]);
    }
}
