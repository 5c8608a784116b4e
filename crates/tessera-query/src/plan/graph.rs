//! The plan graph arena and the frozen execution plan.

use std::collections::HashSet;

use tracing::debug;

use super::explain::{self, DisplayTree, PlanDescription};
use super::lifetime;
use super::{
    NodeId, OrderFactor, PlanError, PlanNode, PlanNodeKind, PlanResult, Variable, VariableTable,
    YieldColumn,
};
use crate::expr::Expr;
use crate::storage::{EdgeDirection, EdgeProp, IndexScanSpec, VertexProp};

/// Columns produced by [`PlanGraph::get_neighbors`].
pub const NEIGHBOR_COLUMNS: [&str; 2] = ["_vertex", "_edge"];

/// Columns produced by [`PlanGraph::get_vertices`].
pub const VERTEX_COLUMNS: [&str; 2] = ["_vid", "_vertex"];

/// A partial plan being spliced together during construction.
///
/// `root` is the node whose result the subplan produces; `tail` is the node
/// furthest upstream, where another subplan may be attached.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubPlan {
    /// The output node.
    pub root: NodeId,
    /// The input end.
    pub tail: NodeId,
}

impl SubPlan {
    /// A subplan consisting of one node.
    #[must_use]
    pub const fn single(node: NodeId) -> Self {
        Self { root: node, tail: node }
    }
}

/// Arena of plan nodes under construction.
///
/// Builder methods take the ids of the nodes they read from and return the id
/// of the new node. Each node's input variables are resolved from those ids
/// when the graph is [finished](Self::finish), so output variables may be
/// renamed until then.
///
/// # Example
///
/// ```
/// use tessera_query::expr::Expr;
/// use tessera_query::plan::{LastUser, PlanGraph};
///
/// let mut graph = PlanGraph::new();
/// let start = graph.start();
/// let filter = graph.filter(start, Expr::constant(true));
/// let dedup = graph.dedup(filter);
/// let plan = graph.finish(dedup).unwrap();
///
/// let var = plan.variable(plan.node(filter).unwrap().output_var()).unwrap();
/// assert_eq!(var.last_user(), LastUser::Node(dedup));
/// ```
#[derive(Debug, Clone, Default)]
pub struct PlanGraph {
    nodes: Vec<PlanNode>,
    variables: VariableTable,
    anon_columns: usize,
}

impl PlanGraph {
    /// Creates an empty graph.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a fresh name for a column the query did not name, such as an
    /// unaliased pattern path: `__anon_<what>_<n>`.
    pub fn anon_col_name(&mut self, what: &str) -> String {
        let n = self.anon_columns;
        self.anon_columns += 1;
        format!("__anon_{what}_{n}")
    }

    /// Number of nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Returns `true` if the graph has no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Looks a node up.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnknownNode`] for an id from another graph.
    pub fn node(&self, id: NodeId) -> PlanResult<&PlanNode> {
        self.nodes.get(id.index()).ok_or(PlanError::UnknownNode(id))
    }

    pub(super) fn node_mut(&mut self, id: NodeId) -> PlanResult<&mut PlanNode> {
        self.nodes.get_mut(id.index()).ok_or(PlanError::UnknownNode(id))
    }

    /// The variable table.
    #[must_use]
    pub const fn variables(&self) -> &VariableTable {
        &self.variables
    }

    pub(super) fn variables_mut(&mut self) -> &mut VariableTable {
        &mut self.variables
    }

    /// Output columns of a node, empty for an unknown id.
    #[must_use]
    pub fn col_names(&self, id: NodeId) -> Vec<String> {
        self.nodes.get(id.index()).map(|n| n.col_names.clone()).unwrap_or_default()
    }

    /// Output variable of a node.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnknownNode`] for an id from another graph.
    pub fn output_var(&self, id: NodeId) -> PlanResult<&str> {
        Ok(self.node(id)?.output_var())
    }

    fn add(
        &mut self,
        kind: PlanNodeKind,
        deps: Vec<NodeId>,
        inputs: Vec<NodeId>,
        col_names: Vec<String>,
    ) -> NodeId {
        let id = NodeId::new(self.nodes.len());
        let mut output_var = format!("__{}_{}", kind.name(), id);
        while self.variables.declare(&output_var, id).is_err() {
            output_var.push('_');
        }
        self.nodes.push(PlanNode {
            id,
            kind,
            deps,
            inputs,
            input_vars: Vec::new(),
            output_var,
            col_names,
            in_loop: false,
        });
        id
    }

    fn unary(&mut self, kind: PlanNodeKind, input: NodeId, col_names: Vec<String>) -> NodeId {
        self.add(kind, vec![input], vec![input], col_names)
    }

    /// Renames a node's output variable.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown or the name is taken.
    pub fn set_output_var(&mut self, id: NodeId, name: impl Into<String>) -> PlanResult<()> {
        let name = name.into();
        let old = self.node(id)?.output_var.clone();
        if old == name {
            return Ok(());
        }
        self.variables.declare(&name, id)?;
        self.variables.remove(&old);
        self.node_mut(id)?.output_var = name;
        Ok(())
    }

    /// Replaces a node's output column names.
    ///
    /// # Errors
    ///
    /// Fails if the node is unknown.
    pub fn set_col_names(&mut self, id: NodeId, col_names: Vec<String>) -> PlanResult<()> {
        self.node_mut(id)?.col_names = col_names;
        Ok(())
    }

    /// A leaf producing one empty row.
    pub fn start(&mut self) -> NodeId {
        self.add(PlanNodeKind::Start, Vec::new(), Vec::new(), Vec::new())
    }

    /// A tag index scan.
    pub fn index_scan(&mut self, spec: IndexScanSpec, return_cols: Vec<String>) -> NodeId {
        let cols = return_cols.clone();
        self.add(PlanNodeKind::IndexScan { spec, return_cols }, Vec::new(), Vec::new(), cols)
    }

    /// Neighbor expansion of the ids `src` evaluates to on each input row.
    pub fn get_neighbors(
        &mut self,
        input: NodeId,
        src: Expr,
        edge_props: Vec<EdgeProp>,
        direction: EdgeDirection,
    ) -> NodeId {
        let cols = NEIGHBOR_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
        self.unary(PlanNodeKind::GetNeighbors { src, edge_props, direction }, input, cols)
    }

    /// Vertex fetch of the ids `src` evaluates to on each input row.
    pub fn get_vertices(&mut self, input: NodeId, src: Expr, props: Vec<VertexProp>) -> NodeId {
        let cols = VERTEX_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
        self.unary(PlanNodeKind::GetVertices { src, props }, input, cols)
    }

    /// Keeps rows for which `condition` is true.
    pub fn filter(&mut self, input: NodeId, condition: Expr) -> NodeId {
        let cols = self.col_names(input);
        self.unary(PlanNodeKind::Filter { condition }, input, cols)
    }

    /// Computes `columns` for every input row.
    pub fn project(&mut self, input: NodeId, columns: Vec<YieldColumn>) -> NodeId {
        let cols = columns.iter().map(|c| c.alias.clone()).collect();
        self.unary(PlanNodeKind::Project { columns }, input, cols)
    }

    /// Removes duplicate rows.
    pub fn dedup(&mut self, input: NodeId) -> NodeId {
        let cols = self.col_names(input);
        self.unary(PlanNodeKind::Dedup, input, cols)
    }

    /// Republishes `input` under a new variable.
    pub fn pass_through(&mut self, input: NodeId) -> NodeId {
        let cols = self.col_names(input);
        self.unary(PlanNodeKind::PassThrough, input, cols)
    }

    fn binary(&mut self, kind: PlanNodeKind, left: NodeId, right: NodeId) -> PlanResult<NodeId> {
        let l = self.node(left)?.col_names.len();
        let r = self.node(right)?.col_names.len();
        if l != r {
            return Err(PlanError::ColumnCountMismatch { left: l, right: r });
        }
        let cols = self.col_names(left);
        Ok(self.add(kind, vec![left, right], vec![left, right], cols))
    }

    /// All rows of both inputs.
    ///
    /// # Errors
    ///
    /// Fails if the inputs differ in width.
    pub fn union(&mut self, left: NodeId, right: NodeId) -> PlanResult<NodeId> {
        self.binary(PlanNodeKind::Union, left, right)
    }

    /// Left rows that do not occur in the right input.
    ///
    /// # Errors
    ///
    /// Fails if the inputs differ in width.
    pub fn minus(&mut self, left: NodeId, right: NodeId) -> PlanResult<NodeId> {
        self.binary(PlanNodeKind::Minus, left, right)
    }

    /// Inner hash join; output columns are the left columns then the right.
    ///
    /// # Errors
    ///
    /// Fails if an input is unknown or the combined columns repeat a name.
    pub fn join(
        &mut self,
        left: NodeId,
        right: NodeId,
        left_key: Expr,
        right_key: Expr,
    ) -> PlanResult<NodeId> {
        let mut cols = self.node(left)?.col_names.clone();
        cols.extend(self.node(right)?.col_names.iter().cloned());
        self.join_as(left, right, left_key, right_key, cols)
    }

    /// Inner hash join with explicit output column names.
    ///
    /// The keys are evaluated against the inputs' own columns; `col_names`
    /// only renames the joined output.
    ///
    /// # Errors
    ///
    /// Fails if an input is unknown, `col_names` does not cover both inputs
    /// or repeats a name.
    pub fn join_as(
        &mut self,
        left: NodeId,
        right: NodeId,
        left_key: Expr,
        right_key: Expr,
        col_names: Vec<String>,
    ) -> PlanResult<NodeId> {
        let width = self.node(left)?.col_names.len() + self.node(right)?.col_names.len();
        if col_names.len() != width {
            return Err(PlanError::ColumnCountMismatch { left: width, right: col_names.len() });
        }
        let mut seen = HashSet::new();
        if let Some(dup) = col_names.iter().find(|c| !seen.insert(c.as_str())) {
            return Err(PlanError::DuplicateColumn(dup.clone()));
        }
        let kind = PlanNodeKind::Join { left_key, right_key };
        Ok(self.add(kind, vec![left, right], vec![left, right], col_names))
    }

    fn check_factors(&self, input: NodeId, factors: &[OrderFactor]) -> PlanResult<Vec<String>> {
        let cols = self.node(input)?.col_names.clone();
        if let Some(f) = factors.iter().find(|f| f.column >= cols.len()) {
            return Err(PlanError::SortColumnOutOfRange { index: f.column, width: cols.len() });
        }
        Ok(cols)
    }

    /// Rows `[offset, offset + count)` of the input sorted by `factors`.
    ///
    /// # Errors
    ///
    /// Fails if a factor refers to a missing column.
    pub fn top_n(
        &mut self,
        input: NodeId,
        factors: Vec<OrderFactor>,
        offset: usize,
        count: usize,
    ) -> PlanResult<NodeId> {
        let cols = self.check_factors(input, &factors)?;
        Ok(self.unary(PlanNodeKind::TopN { factors, offset, count }, input, cols))
    }

    /// The input sorted by `factors`.
    ///
    /// # Errors
    ///
    /// Fails if a factor refers to a missing column.
    pub fn sort(&mut self, input: NodeId, factors: Vec<OrderFactor>) -> PlanResult<NodeId> {
        let cols = self.check_factors(input, &factors)?;
        Ok(self.unary(PlanNodeKind::Sort { factors }, input, cols))
    }

    /// Rows `[offset, offset + count)` of the input.
    pub fn limit(&mut self, input: NodeId, offset: usize, count: usize) -> NodeId {
        let cols = self.col_names(input);
        self.unary(PlanNodeKind::Limit { offset, count }, input, cols)
    }

    /// Runs `then_branch` or `else_branch` after `dep`, depending on `condition`.
    pub fn select(
        &mut self,
        dep: Option<NodeId>,
        condition: Expr,
        then_branch: NodeId,
        else_branch: NodeId,
    ) -> NodeId {
        let cols = self.col_names(then_branch);
        let kind = PlanNodeKind::Select { condition, then_branch, else_branch };
        self.add(kind, dep.into_iter().collect(), Vec::new(), cols)
    }

    /// Runs `body` after `dep` while `condition` holds.
    pub fn loop_node(&mut self, dep: Option<NodeId>, condition: Expr, body: NodeId) -> NodeId {
        let cols = self.col_names(body);
        let deps = dep.into_iter().collect();
        self.add(PlanNodeKind::Loop { condition, body }, deps, Vec::new(), cols)
    }

    fn resolve_inputs(&mut self) -> PlanResult<()> {
        for idx in 0..self.nodes.len() {
            let node = &self.nodes[idx];
            let mut referenced: Vec<NodeId> =
                node.deps.iter().chain(&node.inputs).copied().collect();
            match &node.kind {
                PlanNodeKind::Select { then_branch, else_branch, .. } => {
                    referenced.extend([*then_branch, *else_branch]);
                }
                PlanNodeKind::Loop { body, .. } => referenced.push(*body),
                _ => {}
            }
            for id in &referenced {
                self.node(*id)?;
            }
            let input_vars =
                node.inputs.iter().map(|i| self.nodes[i.index()].output_var.clone()).collect();
            self.nodes[idx].input_vars = input_vars;
        }
        Ok(())
    }

    /// Freezes the graph with `root` as its output node.
    ///
    /// Resolves input variables and runs lifetime analysis.
    ///
    /// # Errors
    ///
    /// Fails if any node refers to an unknown node or a condition refers to an
    /// unknown variable.
    pub fn finish(mut self, root: NodeId) -> PlanResult<ExecutionPlan> {
        self.node(root)?;
        self.resolve_inputs()?;
        lifetime::analyze(&mut self, root)?;
        debug!(root = %root, nodes = self.nodes.len(), "finished plan graph");
        Ok(ExecutionPlan { graph: self, root })
    }
}

/// A finished plan: immutable, analysed and ready to schedule.
#[derive(Debug, Clone)]
pub struct ExecutionPlan {
    graph: PlanGraph,
    root: NodeId,
}

impl ExecutionPlan {
    /// The output node.
    #[must_use]
    pub const fn root(&self) -> NodeId {
        self.root
    }

    /// Looks a node up.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnknownNode`] for an id from another graph.
    pub fn node(&self, id: NodeId) -> PlanResult<&PlanNode> {
        self.graph.node(id)
    }

    /// All nodes in id order.
    pub fn nodes(&self) -> impl Iterator<Item = &PlanNode> {
        self.graph.nodes.iter()
    }

    /// Looks a variable up.
    #[must_use]
    pub fn variable(&self, name: &str) -> Option<&Variable> {
        self.graph.variables.get(name)
    }

    /// The variable table.
    #[must_use]
    pub const fn variables(&self) -> &VariableTable {
        &self.graph.variables
    }

    /// How many reads a variable's result must see before it may be released.
    ///
    /// `None` means the result is kept until the query ends: the variable is
    /// pinned, is the plan output, or is produced or read inside a loop.
    #[must_use]
    pub fn release_after(&self, var: &str) -> Option<usize> {
        let var = self.graph.variables.get(var)?;
        if var.is_pinned() || var.readers().is_empty() || var.producer() == self.root {
            return None;
        }
        let in_loop = |id: &NodeId| self.graph.node(*id).map_or(true, PlanNode::is_in_loop);
        if in_loop(&var.producer()) || var.readers().iter().any(in_loop) {
            return None;
        }
        Some(var.readers().len())
    }

    /// Returns `true` if `node` is the only reader of `var` and may take the
    /// result instead of copying it.
    #[must_use]
    pub fn is_sole_reader(&self, var: &str, node: NodeId) -> bool {
        self.release_after(var) == Some(1)
            && self.variable(var).is_some_and(|v| v.readers() == [node])
    }

    /// Builds the plan description used for `EXPLAIN` and `PROFILE`.
    #[must_use]
    pub fn describe(&self) -> PlanDescription {
        explain::describe(self)
    }

    /// Renders the plan as an indented tree.
    #[must_use]
    pub fn display_tree(&self) -> DisplayTree<'_> {
        DisplayTree::new(self)
    }
}
