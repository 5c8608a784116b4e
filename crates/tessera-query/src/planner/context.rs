//! Validated match patterns handed to the planners.
//!
//! A pattern is a chain `node (edge node)*`; the validator has already
//! resolved aliases and attached per-element filters. Filters refer to the
//! pattern's aliases through [`Expr::LabelAttribute`] and are rebound to the
//! traversal's current vertex or edge by the planner.

use tessera_core::SpaceId;

use crate::expr::Expr;
use crate::plan::{PlanError, PlanResult};
use crate::storage::EdgeDirection;

/// One node element of a pattern.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct NodeInfo {
    /// Alias bound by the query, if any.
    pub alias: Option<String>,
    /// `true` when the alias was generated rather than written by the user.
    pub anonymous: bool,
    /// Filter on the node's properties.
    pub filter: Option<Expr>,
}

impl NodeInfo {
    /// A node bound to `alias`.
    #[must_use]
    pub fn named(alias: impl Into<String>) -> Self {
        Self { alias: Some(alias.into()), ..Self::default() }
    }

    /// A node without a user alias.
    #[must_use]
    pub fn anonymous() -> Self {
        Self { anonymous: true, ..Self::default() }
    }

    /// Sets the node filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    pub(crate) fn exposed_alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|_| !self.anonymous)
    }
}

/// Inclusive hop bounds of a variable-length edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HopRange {
    /// Fewest hops.
    pub min: usize,
    /// Most hops.
    pub max: usize,
}

impl HopRange {
    /// Creates a range.
    #[must_use]
    pub const fn new(min: usize, max: usize) -> Self {
        Self { min, max }
    }
}

/// One edge element of a pattern.
#[derive(Debug, Clone, PartialEq)]
pub struct EdgeInfo {
    /// Alias bound by the query, if any.
    pub alias: Option<String>,
    /// `true` when the alias was generated rather than written by the user.
    pub anonymous: bool,
    /// Edge type names; empty means every edge type.
    pub edge_types: Vec<String>,
    /// Traversal direction.
    pub direction: EdgeDirection,
    /// Hop bounds; `None` is exactly one hop.
    pub range: Option<HopRange>,
    /// Filter on the edge's properties.
    pub filter: Option<Expr>,
}

impl EdgeInfo {
    /// A single-hop edge of any type.
    #[must_use]
    pub const fn new(direction: EdgeDirection) -> Self {
        Self {
            alias: None,
            anonymous: true,
            edge_types: Vec::new(),
            direction,
            range: None,
            filter: None,
        }
    }

    /// Binds the edge to `alias`.
    #[must_use]
    pub fn named(mut self, alias: impl Into<String>) -> Self {
        self.alias = Some(alias.into());
        self.anonymous = false;
        self
    }

    /// Restricts the edge to a type.
    #[must_use]
    pub fn with_type(mut self, edge_type: impl Into<String>) -> Self {
        self.edge_types.push(edge_type.into());
        self
    }

    /// Makes the edge variable-length.
    #[must_use]
    pub const fn with_range(mut self, min: usize, max: usize) -> Self {
        self.range = Some(HopRange::new(min, max));
        self
    }

    /// Sets the edge filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }

    /// Fewest hops; 1 without a range.
    #[must_use]
    pub fn min_hop(&self) -> usize {
        self.range.map_or(1, |r| r.min)
    }

    /// Most hops; 1 without a range.
    #[must_use]
    pub fn max_hop(&self) -> usize {
        self.range.map_or(1, |r| r.max)
    }

    pub(crate) fn exposed_alias(&self) -> Option<&str> {
        self.alias.as_deref().filter(|_| !self.anonymous)
    }
}

/// The tag index the pattern's start nodes are looked up through.
#[derive(Debug, Clone, PartialEq)]
pub struct ScanInfo {
    /// Tag name.
    pub tag: String,
    /// Index filter, written against the first node's alias.
    pub filter: Option<Expr>,
}

impl ScanInfo {
    /// Scans every vertex carrying `tag`.
    #[must_use]
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), filter: None }
    }

    /// Sets the index filter.
    #[must_use]
    pub fn with_filter(mut self, filter: Expr) -> Self {
        self.filter = Some(filter);
        self
    }
}

/// A validated match clause.
#[derive(Debug, Clone, PartialEq)]
pub struct MatchContext {
    /// Graph space.
    pub space: SpaceId,
    /// Node elements; always one more than `edges`.
    pub nodes: Vec<NodeInfo>,
    /// Edge elements between consecutive nodes.
    pub edges: Vec<EdgeInfo>,
    /// Start node index lookup.
    pub scan: ScanInfo,
    /// Alias of the whole path, if the query binds one.
    pub path_alias: Option<String>,
}

impl MatchContext {
    /// A pattern starting at `start`, found through `scan`.
    #[must_use]
    pub fn new(space: SpaceId, scan: ScanInfo, start: NodeInfo) -> Self {
        Self { space, nodes: vec![start], edges: Vec::new(), scan, path_alias: None }
    }

    /// Extends the pattern by one edge and its target node.
    #[must_use]
    pub fn step(mut self, edge: EdgeInfo, node: NodeInfo) -> Self {
        self.edges.push(edge);
        self.nodes.push(node);
        self
    }

    /// Binds the whole path to `alias`.
    #[must_use]
    pub fn with_path_alias(mut self, alias: impl Into<String>) -> Self {
        self.path_alias = Some(alias.into());
        self
    }

    /// Checks the pattern's shape.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::InvalidPattern`] for an empty pattern, a node and
    /// edge count mismatch or an empty hop range.
    pub fn validate(&self) -> PlanResult<()> {
        if self.nodes.is_empty() {
            return Err(PlanError::InvalidPattern("pattern has no nodes".to_owned()));
        }
        if self.nodes.len() != self.edges.len() + 1 {
            return Err(PlanError::InvalidPattern(format!(
                "{} nodes cannot be joined by {} edges",
                self.nodes.len(),
                self.edges.len()
            )));
        }
        for edge in &self.edges {
            if let Some(range) = edge.range {
                if range.max == 0 || range.min > range.max {
                    return Err(PlanError::InvalidPattern(format!(
                        "invalid hop range {}..{}",
                        range.min, range.max
                    )));
                }
            }
        }
        Ok(())
    }
}
