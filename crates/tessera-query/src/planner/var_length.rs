//! Lowering of variable-length match patterns.
//!
//! For a pattern `(a)-[e*min..max]->(b)` the planner produces:
//!
//! ```text
//! IndexScan -> Project(_vid) -> Dedup -> GetNeighbors -> [Filter] -> Project(path)
//!           -> PassThrough
//!                                         |
//!   per extra hop: frontier -> Project(endNode(path)._vid) -> Dedup -> GetNeighbors
//!                  -> Project(path)
//!                  Join(frontier, hop) -> Project(path) -> Filter(no repeated edge)
//!                  -> PassThrough
//!                  Union(new frontier, previous union)
//!                                         |
//! Filter(length(path) >= min) -> Join(fetch of the last node) -> Project(aliases) -> Filter
//! ```
//!
//! Segments of a multi-edge pattern are chained with joins whose columns are
//! named `path_<segment>`.

use tessera_core::SpaceId;
use tracing::debug;

use super::context::{EdgeInfo, MatchContext, NodeInfo};
use super::props::{all_vertex_props, edge_props};
use crate::expr::{Expr, Function, LabelTarget};
use crate::plan::{NodeId, PlanGraph, PlanResult, SubPlan, YieldColumn};
use crate::storage::{IndexScanSpec, SchemaProvider};

/// Column holding vertex ids between a projection and a fetch.
const VID: &str = "_vid";
/// Column holding a path fragment.
const PATH: &str = "path";

fn path_col(idx: usize) -> String {
    format!("{PATH}_{idx}")
}

fn start_vid(col: &str) -> Expr {
    Expr::call(Function::StartNode, vec![Expr::input(col)]).attr(VID)
}

fn end_vid(col: &str) -> Expr {
    Expr::call(Function::EndNode, vec![Expr::input(col)]).attr(VID)
}

fn no_repeated_edges(col: &str) -> Expr {
    Expr::call(Function::HasSameEdgeInPath, vec![Expr::input(col)]).equals(Expr::constant(false))
}

/// Plans a match pattern whose edges may span a range of hops.
///
/// The start nodes come from a tag index scan; every other vertex is reached
/// by neighbor expansion. The resulting subplan yields one row per distinct
/// path whose edges are pairwise distinct.
pub struct VariableLengthPatternPlanner<'a> {
    schema: &'a dyn SchemaProvider,
    ctx: &'a MatchContext,
    /// Vid expression for the next id extraction; set until the scan output
    /// has been consumed once.
    initial_vid: Option<Expr>,
}

impl<'a> VariableLengthPatternPlanner<'a> {
    /// Creates a planner for one pattern.
    #[must_use]
    pub fn new(schema: &'a dyn SchemaProvider, ctx: &'a MatchContext) -> Self {
        Self { schema, ctx, initial_vid: None }
    }

    /// Adds the pattern's subplan to `graph`.
    ///
    /// # Errors
    ///
    /// Fails if the pattern is malformed or a tag or edge type is unknown.
    pub fn transform(mut self, graph: &mut PlanGraph) -> PlanResult<SubPlan> {
        self.ctx.validate()?;
        let mut plan = self.scan_index(graph)?;
        self.combine_plans(graph, &mut plan)?;
        self.project_columns(graph, &mut plan)?;
        debug!(
            edges = self.ctx.edges.len(),
            root = %plan.root,
            tail = %plan.tail,
            nodes = graph.len(),
            "planned variable-length pattern"
        );
        Ok(plan)
    }

    fn space(&self) -> SpaceId {
        self.ctx.space
    }

    fn scan_index(&mut self, graph: &mut PlanGraph) -> PlanResult<SubPlan> {
        let tag = self.schema.tag_by_name(self.space(), &self.ctx.scan.tag)?;
        let spec = IndexScanSpec {
            tag: tag.id,
            tag_name: tag.name,
            filter: self.ctx.scan.filter.as_ref().map(|f| f.rewrite_labels(LabelTarget::Vertex)),
        };
        let scan = graph.index_scan(spec, vec![VID.to_owned()]);
        self.initial_vid = Some(Expr::input(VID));
        Ok(SubPlan::single(scan))
    }

    fn combine_plans(&mut self, graph: &mut PlanGraph, plan: &mut SubPlan) -> PlanResult<()> {
        let ctx = self.ctx;
        let (nodes, edges) = (&ctx.nodes, &ctx.edges);
        let Some(last) = nodes.last() else {
            return Ok(());
        };
        if edges.is_empty() {
            return self.append_fetch_vertex(graph, last, plan);
        }

        let mut segments = self.filter_by_path_length(graph, &nodes[0], &edges[0], plan.root)?;
        let mut cols = vec![path_col(0)];
        for (i, (node, edge)) in nodes.iter().zip(edges).enumerate().skip(1) {
            let curr = self.filter_by_path_length(graph, node, edge, segments.root)?;
            cols.push(path_col(i));
            segments.root = join_segments(graph, segments.root, curr.root, cols.clone())?;
        }

        let left = segments.root;
        self.append_fetch_vertex(graph, last, &mut segments)?;
        cols.push(path_col(edges.len()));
        plan.root = join_segments(graph, left, segments.root, cols)?;
        Ok(())
    }

    fn filter_by_path_length(
        &mut self,
        graph: &mut PlanGraph,
        node: &NodeInfo,
        edge: &EdgeInfo,
        input: NodeId,
    ) -> PlanResult<SubPlan> {
        let curr = self.combine_sub_plan(graph, node, edge, input)?;
        let min_hop = i64::try_from(edge.min_hop()).unwrap_or(i64::MAX);
        let length = Expr::call(Function::Length, vec![Expr::input(PATH)]);
        let filter = graph.filter(curr.root, length.greater_eq(Expr::constant(min_hop)));
        Ok(SubPlan { root: filter, tail: curr.tail })
    }

    fn combine_sub_plan(
        &mut self,
        graph: &mut PlanGraph,
        node: &NodeInfo,
        edge: &EdgeInfo,
        input: NodeId,
    ) -> PlanResult<SubPlan> {
        let first = self.expand_step(graph, edge, input, node.filter.as_ref(), true)?;
        let mut frontier = first.root;
        let mut root = first.root;
        for _ in 1..edge.max_hop() {
            let hop = self.expand_step(graph, edge, frontier, None, false)?;
            let (next, union) = collect_data(graph, frontier, hop.root, root)?;
            frontier = next;
            root = union;
        }
        Ok(SubPlan { root, tail: first.tail })
    }

    /// `Project(_vid) -> Dedup -> GetNeighbors -> [Filter] -> [Filter] -> Project(path)`,
    /// then an optional `PassThrough`.
    fn expand_step(
        &mut self,
        graph: &mut PlanGraph,
        edge: &EdgeInfo,
        input: NodeId,
        node_filter: Option<&Expr>,
        pass_through: bool,
    ) -> PlanResult<SubPlan> {
        let ids = self.extract_and_dedup_vids(graph, input);
        let edge_props = edge_props(self.schema, self.space(), &edge.edge_types, edge.direction)?;
        let mut root = graph.get_neighbors(ids.root, Expr::input(VID), edge_props, edge.direction);

        if let Some(filter) = node_filter {
            root = graph.filter(root, filter.rewrite_labels(LabelTarget::Vertex));
        }
        if let Some(filter) = &edge.filter {
            root = graph.filter(root, filter.rewrite_labels(LabelTarget::Edge));
        }
        let path = Expr::PathBuild(vec![Expr::Vertex, Expr::Edge]);
        root = graph.project(root, vec![YieldColumn::new(path, PATH)]);
        if pass_through {
            root = graph.pass_through(root);
        }
        Ok(SubPlan { root, tail: ids.tail })
    }

    fn append_fetch_vertex(
        &mut self,
        graph: &mut PlanGraph,
        node: &NodeInfo,
        plan: &mut SubPlan,
    ) -> PlanResult<()> {
        let ids = self.extract_and_dedup_vids(graph, plan.root);
        let props = all_vertex_props(self.schema, self.space())?;
        let mut root = graph.get_vertices(ids.root, Expr::input(VID), props);
        if let Some(filter) = &node.filter {
            root = graph.filter(root, filter.rewrite_labels(LabelTarget::Vertex));
        }
        let path = Expr::PathBuild(vec![Expr::Vertex]);
        plan.root = graph.project(root, vec![YieldColumn::new(path, PATH)]);
        Ok(())
    }

    /// `Project(_vid) -> Dedup` over the scan output or the end vertices of
    /// the input's last path column.
    fn extract_and_dedup_vids(&mut self, graph: &mut PlanGraph, input: NodeId) -> SubPlan {
        let vid = self.initial_vid.take().unwrap_or_else(|| {
            let cols = graph.col_names(input);
            end_vid(cols.last().map_or(PATH, String::as_str))
        });
        let project = graph.project(input, vec![YieldColumn::new(vid, VID)]);
        let dedup = graph.dedup(project);
        SubPlan { root: dedup, tail: project }
    }

    fn project_columns(&self, graph: &mut PlanGraph, plan: &mut SubPlan) -> PlanResult<()> {
        let input_cols = graph.col_names(plan.root);
        let col = |i: usize| input_cols.get(i).map_or_else(|| path_col(i), Clone::clone);
        let mut columns = Vec::new();

        let node_column = |i: usize, node: &NodeInfo| {
            node.exposed_alias().map(|alias| {
                YieldColumn::new(Expr::call(Function::StartNode, vec![Expr::input(col(i))]), alias)
            })
        };
        for (i, edge) in self.ctx.edges.iter().enumerate() {
            columns.extend(node_column(i, &self.ctx.nodes[i]));
            if let Some(alias) = edge.exposed_alias() {
                let rels = Expr::call(Function::Relationships, vec![Expr::input(col(i))]);
                let expr = if edge.range.is_some() {
                    rels
                } else {
                    rels.subscript(Expr::constant(0i64))
                };
                columns.push(YieldColumn::new(expr, alias));
            }
        }
        let last = self.ctx.nodes.len() - 1;
        columns.extend(node_column(last, &self.ctx.nodes[last]));

        let path_alias =
            self.ctx.path_alias.clone().unwrap_or_else(|| graph.anon_col_name("path"));
        let path = Expr::PathBuild(input_cols.iter().map(|c| Expr::input(c.as_str())).collect());
        columns.push(YieldColumn::new(path, path_alias.clone()));

        let project = graph.project(plan.root, columns);
        plan.root = graph.filter(project, no_repeated_edges(&path_alias));
        Ok(())
    }
}

/// Joins two path datasets on `endNode(left last column) = startNode(right first column)`.
fn join_segments(
    graph: &mut PlanGraph,
    left: NodeId,
    right: NodeId,
    col_names: Vec<String>,
) -> PlanResult<NodeId> {
    let left_cols = graph.col_names(left);
    let right_cols = graph.col_names(right);
    let left_key = end_vid(left_cols.last().map_or(PATH, String::as_str));
    let right_key = start_vid(right_cols.first().map_or(PATH, String::as_str));
    graph.join_as(left, right, left_key, right_key, col_names)
}

/// Extends every frontier path by one hop and unions the result with the
/// paths collected so far.
///
/// Returns the new frontier and the union.
fn collect_data(
    graph: &mut PlanGraph,
    frontier: NodeId,
    hop: NodeId,
    collected: NodeId,
) -> PlanResult<(NodeId, NodeId)> {
    let (left, right) = (path_col(0), path_col(1));
    let join = join_segments(graph, frontier, hop, vec![left.clone(), right.clone()])?;
    let merged = Expr::PathBuild(vec![Expr::input(left), Expr::input(right)]);
    let project = graph.project(join, vec![YieldColumn::new(merged, PATH)]);
    let filter = graph.filter(project, no_repeated_edges(PATH));
    let next = graph.pass_through(filter);
    let union = graph.union(next, collected)?;
    Ok((next, union))
}
