//! Planning of `FETCH PROP ON` vertex lookups.

use tessera_core::{SpaceId, Value, VertexId};
use tracing::debug;

use super::props::vertex_props;
use crate::expr::{Expr, PropRefs};
use crate::plan::{NodeId, PlanError, PlanGraph, PlanResult, SubPlan, YieldColumn};
use crate::storage::SchemaProvider;

/// Where the vertex ids of a fetch come from.
#[derive(Debug, Clone, PartialEq)]
pub enum VertexSource {
    /// Ids written in the query.
    Ids(Vec<VertexId>),
    /// A column of another node's output, such as a piped input.
    Input {
        /// The producing node.
        node: NodeId,
        /// The column holding the ids.
        column: String,
    },
}

/// A validated vertex fetch.
#[derive(Debug, Clone, PartialEq)]
pub struct FetchVerticesContext {
    /// Graph space.
    pub space: SpaceId,
    /// Vertex ids.
    pub source: VertexSource,
    /// Tags to fetch; `None` fetches every tag.
    pub tags: Option<Vec<String>>,
    /// Output columns; empty yields the id and every fetched property.
    pub yields: Vec<YieldColumn>,
    /// Whether duplicate output rows are removed.
    pub distinct: bool,
}

/// Lowers a vertex fetch to `[Start] -> GetVertices -> Project -> [Dedup]`.
pub struct FetchVerticesPlanner<'a> {
    schema: &'a dyn SchemaProvider,
    ctx: &'a FetchVerticesContext,
}

impl<'a> FetchVerticesPlanner<'a> {
    /// Creates a planner for one fetch.
    #[must_use]
    pub fn new(schema: &'a dyn SchemaProvider, ctx: &'a FetchVerticesContext) -> Self {
        Self { schema, ctx }
    }

    /// Adds the fetch's subplan to `graph`.
    ///
    /// # Errors
    ///
    /// Fails if a tag is unknown or the id column does not exist.
    pub fn transform(self, graph: &mut PlanGraph) -> PlanResult<SubPlan> {
        let (input, src) = match &self.ctx.source {
            VertexSource::Ids(ids) => {
                let ids = ids.iter().map(|id| Value::from(*id)).collect::<Vec<_>>();
                (graph.start(), Expr::constant(ids))
            }
            VertexSource::Input { node, column } => {
                if !graph.node(*node)?.col_names().contains(column) {
                    return Err(PlanError::UnknownColumn(column.clone()));
                }
                (*node, Expr::input(column.as_str()))
            }
        };

        let mut refs = PropRefs::default();
        for column in &self.ctx.yields {
            refs.merge(column.expr.referenced_props());
        }
        let props = vertex_props(self.schema, self.ctx.space, self.ctx.tags.as_deref(), &refs)?;

        let yields = if self.ctx.yields.is_empty() {
            self.default_yields(self.ctx.tags.as_deref())?
        } else {
            self.ctx.yields.clone()
        };

        let get_vertices = graph.get_vertices(input, src, props);
        let mut root = graph.project(get_vertices, yields);
        if self.ctx.distinct {
            root = graph.dedup(root);
        }
        debug!(root = %root, distinct = self.ctx.distinct, "planned vertex fetch");
        Ok(SubPlan { root, tail: input })
    }

    /// The vertex id followed by `tag.field` for every field of the fetched tags.
    fn default_yields(&self, tags: Option<&[String]>) -> PlanResult<Vec<YieldColumn>> {
        let schemas = match tags {
            Some(names) => names
                .iter()
                .map(|name| self.schema.tag_by_name(self.ctx.space, name))
                .collect::<Result<Vec<_>, _>>()?,
            None => self.schema.all_tags(self.ctx.space)?,
        };
        let mut yields = vec![YieldColumn::new(Expr::Vertex.attr("_vid"), "VertexID")];
        for tag in schemas {
            for field in &tag.fields {
                let expr = Expr::tag_prop(tag.name.as_str(), field.as_str());
                yields.push(YieldColumn::new(expr, format!("{}.{field}", tag.name)));
            }
        }
        Ok(yields)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::plan::PlanNodeKind;
    use crate::storage::InMemorySchema;

    const SPACE: SpaceId = SpaceId::new(1);

    fn schema() -> InMemorySchema {
        let mut schema = InMemorySchema::new();
        schema.add_space(SPACE).add_tag(SPACE, 1, "person", &["name", "age"]);
        schema
    }

    fn context(source: VertexSource) -> FetchVerticesContext {
        FetchVerticesContext {
            space: SPACE,
            source,
            tags: Some(vec!["person".to_owned()]),
            yields: Vec::new(),
            distinct: true,
        }
    }

    #[test]
    fn default_yields_and_dedup() {
        let schema = schema();
        let ctx = context(VertexSource::Ids(vec![VertexId::new(1), VertexId::new(2)]));
        let mut graph = PlanGraph::new();
        let plan = FetchVerticesPlanner::new(&schema, &ctx).transform(&mut graph).unwrap();

        let root = graph.node(plan.root).unwrap();
        assert!(matches!(root.kind(), PlanNodeKind::Dedup));
        assert_eq!(root.col_names(), ["VertexID", "person.name", "person.age"]);

        let project = graph.node(root.deps()[0]).unwrap();
        assert!(matches!(project.kind(), PlanNodeKind::Project { .. }));
        let fetch = graph.node(project.deps()[0]).unwrap();
        assert!(matches!(fetch.kind(), PlanNodeKind::GetVertices { .. }));
        assert!(matches!(graph.node(plan.tail).unwrap().kind(), PlanNodeKind::Start));
    }

    #[test]
    fn yields_narrow_fetched_props() {
        let schema = schema();
        let mut ctx = context(VertexSource::Ids(vec![VertexId::new(1)]));
        ctx.distinct = false;
        ctx.yields = vec![YieldColumn::new(Expr::tag_prop("person", "age"), "age")];
        let mut graph = PlanGraph::new();
        let plan = FetchVerticesPlanner::new(&schema, &ctx).transform(&mut graph).unwrap();

        let project = graph.node(plan.root).unwrap();
        assert_eq!(project.col_names(), ["age"]);
        let fetch = graph.node(project.deps()[0]).unwrap();
        match fetch.kind() {
            PlanNodeKind::GetVertices { props, .. } => assert_eq!(props[0].props, ["age"]),
            other => panic!("unexpected node {}", other.name()),
        }
    }

    #[test]
    fn input_column_must_exist() {
        let schema = schema();
        let mut graph = PlanGraph::new();
        let start = graph.start();
        let input = graph.project(start, vec![YieldColumn::new(Expr::constant(1i64), "id")]);

        let ctx = context(VertexSource::Input { node: input, column: "vid".to_owned() });
        let err = FetchVerticesPlanner::new(&schema, &ctx).transform(&mut graph).unwrap_err();
        assert_eq!(err, PlanError::UnknownColumn("vid".to_owned()));

        let ctx = context(VertexSource::Input { node: input, column: "id".to_owned() });
        let plan = FetchVerticesPlanner::new(&schema, &ctx).transform(&mut graph).unwrap();
        assert_eq!(plan.tail, input);
    }
}
