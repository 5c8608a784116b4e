//! Variable lifetime analysis.
//!
//! Walks the graph from the root with an explicit stack, recording for every
//! variable the nodes that read it and marking every node reachable from a
//! Loop body as in-loop. Select and Loop outputs are pinned to the scheduler.

use std::collections::HashSet;

use tracing::trace;

use super::{NodeId, PlanGraph, PlanNodeKind, PlanResult};

pub(super) fn analyze(graph: &mut PlanGraph, root: NodeId) -> PlanResult<()> {
    let mut stack: Vec<(NodeId, bool)> = vec![(root, false)];
    let mut visited: HashSet<(NodeId, bool)> = HashSet::new();

    while let Some((id, in_loop)) = stack.pop() {
        if !visited.insert((id, in_loop)) {
            continue;
        }
        let node = graph.node_mut(id)?;
        node.in_loop |= in_loop;

        let mut reads = node.input_vars.clone();
        let output = node.output_var.clone();
        let deps = node.deps.clone();
        let mut pinned = false;

        match &node.kind {
            PlanNodeKind::Select { condition, then_branch, else_branch } => {
                reads.extend(condition.referenced_props().variables);
                stack.push((*then_branch, in_loop));
                stack.push((*else_branch, in_loop));
                pinned = true;
            }
            PlanNodeKind::Loop { condition, body } => {
                reads.extend(condition.referenced_props().variables);
                stack.push((*body, true));
                pinned = true;
            }
            _ => {}
        }

        let vars = graph.variables_mut();
        for var in &reads {
            vars.get_mut(var)?.record_user(id);
        }
        if pinned {
            vars.get_mut(&output)?.pin();
        }
        trace!(node = %id, in_loop, reads = reads.len(), "lifetime visit");

        stack.extend(deps.into_iter().map(|dep| (dep, in_loop)));
    }
    Ok(())
}
