//! Plan nodes.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::expr::Expr;
use crate::storage::{EdgeDirection, EdgeProp, IndexScanSpec, VertexProp};

/// Stable id of a node inside one [`PlanGraph`](super::PlanGraph).
///
/// Ids are assigned in creation order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct NodeId(usize);

impl NodeId {
    /// Creates an id from its index.
    #[must_use]
    pub const fn new(index: usize) -> Self {
        Self(index)
    }

    /// The arena index.
    #[must_use]
    pub const fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Sort direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SortOrder {
    /// Smallest first.
    Ascending,
    /// Largest first.
    Descending,
}

/// One key of a lexicographic sort.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct OrderFactor {
    /// Column index in the input.
    pub column: usize,
    /// Direction.
    pub order: SortOrder,
}

impl OrderFactor {
    /// Ascending on `column`.
    #[must_use]
    pub const fn asc(column: usize) -> Self {
        Self { column, order: SortOrder::Ascending }
    }

    /// Descending on `column`.
    #[must_use]
    pub const fn desc(column: usize) -> Self {
        Self { column, order: SortOrder::Descending }
    }
}

impl fmt::Display for OrderFactor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.order {
            SortOrder::Ascending => write!(f, "${} ASC", self.column),
            SortOrder::Descending => write!(f, "${} DESC", self.column),
        }
    }
}

/// An output column of a projection.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct YieldColumn {
    /// The value to compute.
    pub expr: Expr,
    /// The column name.
    pub alias: String,
}

impl YieldColumn {
    /// Creates a column.
    #[must_use]
    pub fn new(expr: Expr, alias: impl Into<String>) -> Self {
        Self { expr, alias: alias.into() }
    }
}

/// What a plan node does.
#[derive(Debug, Clone, PartialEq)]
pub enum PlanNodeKind {
    /// Produces a single empty row.
    Start,
    /// Looks vertices up through a tag index.
    IndexScan {
        /// Which index and filter.
        spec: IndexScanSpec,
        /// Columns to return.
        return_cols: Vec<String>,
    },
    /// Expands vertices to their edges.
    GetNeighbors {
        /// Source vertex ids, evaluated per input row.
        src: Expr,
        /// Edge types and properties.
        edge_props: Vec<EdgeProp>,
        /// Direction used when `edge_props` is empty.
        direction: EdgeDirection,
    },
    /// Fetches vertices with their properties.
    GetVertices {
        /// Vertex ids, evaluated per input row.
        src: Expr,
        /// Tags and properties; empty means all.
        props: Vec<VertexProp>,
    },
    /// Keeps rows matching a predicate.
    Filter {
        /// The predicate.
        condition: Expr,
    },
    /// Computes new columns.
    Project {
        /// Output columns.
        columns: Vec<YieldColumn>,
    },
    /// Removes duplicate rows.
    Dedup,
    /// Concatenates two inputs.
    Union,
    /// Left rows absent from the right input.
    Minus,
    /// Inner hash join of two inputs.
    Join {
        /// Key evaluated on left rows (build side).
        left_key: Expr,
        /// Key evaluated on right rows (probe side).
        right_key: Expr,
    },
    /// Bounded sort.
    TopN {
        /// Sort keys.
        factors: Vec<OrderFactor>,
        /// Rows to skip.
        offset: usize,
        /// Rows to keep.
        count: usize,
    },
    /// Full sort.
    Sort {
        /// Sort keys.
        factors: Vec<OrderFactor>,
    },
    /// Offset and count without sorting.
    Limit {
        /// Rows to skip.
        offset: usize,
        /// Rows to keep.
        count: usize,
    },
    /// Republishes its input under its own variable.
    PassThrough,
    /// Runs one of two branches.
    Select {
        /// Branch condition.
        condition: Expr,
        /// Root of the branch taken when the condition holds.
        then_branch: NodeId,
        /// Root of the branch taken otherwise.
        else_branch: NodeId,
    },
    /// Re-runs a body while a condition holds.
    Loop {
        /// Loop condition, checked before every iteration.
        condition: Expr,
        /// Root of the loop body.
        body: NodeId,
    },
}

impl PlanNodeKind {
    /// The node kind's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        match self {
            Self::Start => "Start",
            Self::IndexScan { .. } => "IndexScan",
            Self::GetNeighbors { .. } => "GetNeighbors",
            Self::GetVertices { .. } => "GetVertices",
            Self::Filter { .. } => "Filter",
            Self::Project { .. } => "Project",
            Self::Dedup => "Dedup",
            Self::Union => "Union",
            Self::Minus => "Minus",
            Self::Join { .. } => "Join",
            Self::TopN { .. } => "TopN",
            Self::Sort { .. } => "Sort",
            Self::Limit { .. } => "Limit",
            Self::PassThrough => "PassThrough",
            Self::Select { .. } => "Select",
            Self::Loop { .. } => "Loop",
        }
    }

    /// Returns `true` for Select and Loop.
    #[must_use]
    pub const fn is_control_flow(&self) -> bool {
        matches!(self, Self::Select { .. } | Self::Loop { .. })
    }

    /// Key/value details for plan descriptions.
    #[must_use]
    pub fn details(&self) -> Vec<(String, String)> {
        fn list<T: fmt::Display>(items: &[T]) -> String {
            items.iter().map(ToString::to_string).collect::<Vec<_>>().join(", ")
        }
        let pair = |k: &str, v: String| (k.to_owned(), v);
        match self {
            Self::Start | Self::Dedup | Self::Union | Self::Minus | Self::PassThrough => Vec::new(),
            Self::IndexScan { spec, return_cols } => {
                let mut out = vec![pair("tag", spec.tag_name.clone())];
                if let Some(filter) = &spec.filter {
                    out.push(pair("filter", filter.to_string()));
                }
                out.push(pair("returnCols", return_cols.join(", ")));
                out
            }
            Self::GetNeighbors { src, edge_props, direction } => vec![
                pair("src", src.to_string()),
                pair(
                    "edgeTypes",
                    list(&edge_props.iter().map(|p| p.edge_type).collect::<Vec<_>>()),
                ),
                pair("direction", direction.to_string()),
            ],
            Self::GetVertices { src, props } => vec![
                pair("src", src.to_string()),
                pair(
                    "tags",
                    list(&props.iter().map(|p| p.tag.as_i32()).collect::<Vec<_>>()),
                ),
            ],
            Self::Filter { condition } => vec![pair("condition", condition.to_string())],
            Self::Project { columns } => vec![pair(
                "columns",
                columns
                    .iter()
                    .map(|c| format!("{} AS {}", c.expr, c.alias))
                    .collect::<Vec<_>>()
                    .join(", "),
            )],
            Self::Join { left_key, right_key } => {
                vec![pair("leftKey", left_key.to_string()), pair("rightKey", right_key.to_string())]
            }
            Self::TopN { factors, offset, count } => vec![
                pair("factors", list(factors)),
                pair("offset", offset.to_string()),
                pair("count", count.to_string()),
            ],
            Self::Sort { factors } => vec![pair("factors", list(factors))],
            Self::Limit { offset, count } => {
                vec![pair("offset", offset.to_string()), pair("count", count.to_string())]
            }
            Self::Select { condition, then_branch, else_branch } => vec![
                pair("condition", condition.to_string()),
                pair("then", then_branch.to_string()),
                pair("else", else_branch.to_string()),
            ],
            Self::Loop { condition, body } => {
                vec![pair("condition", condition.to_string()), pair("body", body.to_string())]
            }
        }
    }
}

/// A node of the plan graph.
#[derive(Debug, Clone)]
pub struct PlanNode {
    pub(super) id: NodeId,
    pub(super) kind: PlanNodeKind,
    pub(super) deps: Vec<NodeId>,
    pub(super) inputs: Vec<NodeId>,
    pub(super) input_vars: Vec<String>,
    pub(super) output_var: String,
    pub(super) col_names: Vec<String>,
    pub(super) in_loop: bool,
}

impl PlanNode {
    /// The node id.
    #[must_use]
    pub const fn id(&self) -> NodeId {
        self.id
    }

    /// What the node does.
    #[must_use]
    pub const fn kind(&self) -> &PlanNodeKind {
        &self.kind
    }

    /// The kind's name.
    #[must_use]
    pub const fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Nodes that must finish before this one starts.
    #[must_use]
    pub fn deps(&self) -> &[NodeId] {
        &self.deps
    }

    /// Nodes whose results this node reads, in input order.
    #[must_use]
    pub fn inputs(&self) -> &[NodeId] {
        &self.inputs
    }

    /// Variables this node reads, parallel to [`inputs`](Self::inputs).
    #[must_use]
    pub fn input_vars(&self) -> &[String] {
        &self.input_vars
    }

    /// The variable this node publishes its result under.
    #[must_use]
    pub fn output_var(&self) -> &str {
        &self.output_var
    }

    /// Output column names.
    #[must_use]
    pub fn col_names(&self) -> &[String] {
        &self.col_names
    }

    /// Whether the node is reachable from a Loop body.
    #[must_use]
    pub const fn is_in_loop(&self) -> bool {
        self.in_loop
    }
}
