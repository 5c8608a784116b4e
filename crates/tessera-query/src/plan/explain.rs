//! Plan descriptions for `EXPLAIN` and `PROFILE`.
//!
//! The core only populates these structures; rendering belongs to the caller.
//! [`DisplayTree`] is a plain-text rendering for debugging.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::{ExecutionPlan, NodeId, PlanNode, PlanNodeKind};

/// A key/value detail of a plan node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Pair {
    /// Detail name.
    pub key: String,
    /// Rendered value.
    pub value: String,
}

/// Marks a node as the root of a Select branch or Loop body.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BranchInfo {
    /// `true` for a Select's then-branch or a Loop body.
    pub is_do_branch: bool,
    /// Id of the Select or Loop node.
    pub condition_node_id: usize,
}

/// Runtime statistics of one node execution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfilingStats {
    /// Rows produced.
    pub rows: u64,
    /// Wall-clock execution time in microseconds.
    pub exec_duration_in_us: u64,
}

/// Description of one plan node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanNodeDescription {
    /// Node id.
    pub id: usize,
    /// Node kind name.
    pub name: String,
    /// Output variable.
    pub output_var: String,
    /// Output columns.
    pub col_names: Vec<String>,
    /// Dependency ids.
    pub dependencies: Vec<usize>,
    /// Kind-specific details.
    pub description: Vec<Pair>,
    /// Set when the node roots a Select branch or Loop body.
    pub branch_info: Option<BranchInfo>,
    /// One entry per execution (several for loop bodies).
    pub profiles: Vec<ProfilingStats>,
}

/// Description of a whole plan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlanDescription {
    /// Root node id.
    pub root: usize,
    /// Nodes in id order.
    pub nodes: Vec<PlanNodeDescription>,
}

impl PlanDescription {
    /// Looks a node description up by id.
    #[must_use]
    pub fn node(&self, id: NodeId) -> Option<&PlanNodeDescription> {
        self.nodes.get(id.index()).filter(|n| n.id == id.index())
    }

    /// Appends profiling stats for a node execution.
    pub fn add_profile(&mut self, id: NodeId, stats: ProfilingStats) {
        if let Some(node) = self.nodes.get_mut(id.index()) {
            node.profiles.push(stats);
        }
    }
}

pub(super) fn describe(plan: &ExecutionPlan) -> PlanDescription {
    let mut nodes: Vec<PlanNodeDescription> = plan
        .nodes()
        .map(|n| PlanNodeDescription {
            id: n.id().index(),
            name: n.name().to_owned(),
            output_var: n.output_var().to_owned(),
            col_names: n.col_names().to_vec(),
            dependencies: n.deps().iter().map(|d| d.index()).collect(),
            description: n
                .kind()
                .details()
                .into_iter()
                .map(|(key, value)| Pair { key, value })
                .collect(),
            branch_info: None,
            profiles: Vec::new(),
        })
        .collect();

    for n in plan.nodes() {
        let cond = n.id().index();
        let branches: Vec<(NodeId, bool)> = match n.kind() {
            PlanNodeKind::Select { then_branch, else_branch, .. } => {
                vec![(*then_branch, true), (*else_branch, false)]
            }
            PlanNodeKind::Loop { body, .. } => vec![(*body, true)],
            _ => Vec::new(),
        };
        for (branch, is_do_branch) in branches {
            if let Some(desc) = nodes.get_mut(branch.index()) {
                desc.branch_info = Some(BranchInfo { is_do_branch, condition_node_id: cond });
            }
        }
    }

    PlanDescription { root: plan.root().index(), nodes }
}

/// Helper for tree-style plan display.
pub struct DisplayTree<'a> {
    plan: &'a ExecutionPlan,
}

impl<'a> DisplayTree<'a> {
    pub(super) const fn new(plan: &'a ExecutionPlan) -> Self {
        Self { plan }
    }

    fn children(node: &PlanNode) -> Vec<(NodeId, Option<&'static str>)> {
        let mut out: Vec<(NodeId, Option<&'static str>)> =
            node.deps().iter().map(|d| (*d, None)).collect();
        match node.kind() {
            PlanNodeKind::Select { then_branch, else_branch, .. } => {
                out.push((*then_branch, Some("then")));
                out.push((*else_branch, Some("else")));
            }
            PlanNodeKind::Loop { body, .. } => out.push((*body, Some("body"))),
            _ => {}
        }
        out
    }

    fn fmt_node(
        &self,
        f: &mut fmt::Formatter<'_>,
        id: NodeId,
        label: Option<&str>,
        prefix: &str,
        is_last: bool,
        printed: &mut HashSet<NodeId>,
    ) -> fmt::Result {
        let connector = if is_last { "└── " } else { "├── " };
        write!(f, "{prefix}{connector}")?;
        if let Some(label) = label {
            write!(f, "[{label}] ")?;
        }
        let Ok(node) = self.plan.node(id) else {
            return writeln!(f, "<unknown #{id}>");
        };
        write!(f, "{} #{} -> {}", node.name(), id, node.output_var())?;
        if !printed.insert(id) {
            return writeln!(f, " (shared)");
        }
        let details = node.kind().details();
        if !details.is_empty() {
            let rendered: Vec<String> = details.iter().map(|(k, v)| format!("{k}: {v}")).collect();
            write!(f, " [{}]", rendered.join("; "))?;
        }
        writeln!(f)?;

        let children = Self::children(node);
        let new_prefix = format!("{prefix}{}", if is_last { "    " } else { "│   " });
        for (i, (child, label)) in children.iter().enumerate() {
            self.fmt_node(f, *child, *label, &new_prefix, i == children.len() - 1, printed)?;
        }
        Ok(())
    }
}

impl fmt::Display for DisplayTree<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut printed = HashSet::new();
        self.fmt_node(f, self.plan.root(), None, "", true, &mut printed)
    }
}

#[cfg(test)]
mod tests {
    use crate::expr::Expr;
    use crate::plan::{NodeId, PlanGraph, ProfilingStats, YieldColumn};

    fn plan() -> (crate::plan::ExecutionPlan, NodeId, NodeId, NodeId) {
        let mut g = PlanGraph::new();
        let start = g.start();
        let then_branch = g.project(start, vec![YieldColumn::new(Expr::constant(1i64), "x")]);
        let else_branch = g.filter(then_branch, Expr::constant(false));
        let select = g.select(Some(start), Expr::constant(true), then_branch, else_branch);
        (g.finish(select).expect("finish"), select, then_branch, else_branch)
    }

    #[test]
    fn describe_records_branches() {
        let (plan, select, then_branch, else_branch) = plan();
        let desc = plan.describe();
        assert_eq!(desc.root, select.index());
        let then_desc = desc.node(then_branch).expect("then");
        assert_eq!(then_desc.name, "Project");
        assert!(then_desc.branch_info.expect("branch").is_do_branch);
        let else_desc = desc.node(else_branch).expect("else");
        assert!(!else_desc.branch_info.expect("branch").is_do_branch);
        assert_eq!(else_desc.description[0].key, "condition");
    }

    #[test]
    fn description_serializes() {
        let (plan, select, ..) = plan();
        let mut desc = plan.describe();
        desc.add_profile(select, ProfilingStats { rows: 1, exec_duration_in_us: 10 });
        let json = serde_json::to_string(&desc).expect("serialize");
        let back: crate::plan::PlanDescription = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(back, desc);
        assert_eq!(back.node(select).expect("select").profiles.len(), 1);
    }

    #[test]
    fn display_tree_marks_shared_nodes() {
        let (plan, ..) = plan();
        let rendered = plan.display_tree().to_string();
        assert!(rendered.starts_with("└── Select #3"));
        assert!(rendered.contains("[then] Project #1"));
        assert!(rendered.contains("(shared)"));
    }
}
