//! Asynchronous plan scheduling.
//!
//! The scheduler walks the plan from its root with an explicit stack and
//! groups the unfinished nodes by depth. Levels run one after another; the
//! nodes of one level run concurrently as shared futures, so a node with
//! several consumers runs once. A node never awaits its dependencies, which
//! keeps poll depth independent of how long a dependency chain is.
//!
//! Select and Loop are driven here rather than by an executor: a Select
//! evaluates its condition and drives one branch, a Loop drives its body
//! once per iteration in a fresh scope so body nodes run again while nodes
//! outside the body are reused.

use std::collections::HashMap;
use std::sync::{Arc, Weak};
use std::time::Instant;

use futures::future::{try_join_all, BoxFuture, FutureExt, Shared};
use parking_lot::Mutex;
use tracing::{debug, error, trace, warn};

use super::context::QueryContext;
use super::error::{ExecError, ExecResult};
use super::executor::execute_node;
use super::operators::OperatorContext;
use super::result::ResultSet;
use crate::expr::{ConditionBindings, Expr};
use crate::plan::{ExecutionPlan, NodeId, PlanNode, PlanNodeKind, ProfilingStats};

type NodeFuture = Shared<BoxFuture<'static, ExecResult<()>>>;

/// Memoised node futures of one execution pass.
///
/// The root pass has no parent; every loop iteration gets a child scope whose
/// lookups fall back to the enclosing scopes.
#[derive(Default)]
struct Scope {
    memo: Mutex<HashMap<NodeId, NodeFuture>>,
    parent: Option<Arc<Scope>>,
    iteration: u64,
}

impl Scope {
    fn child(parent: &Arc<Self>, iteration: u64) -> Arc<Self> {
        Arc::new(Self { memo: Mutex::default(), parent: Some(Arc::clone(parent)), iteration })
    }

    fn find(&self, id: NodeId) -> Option<NodeFuture> {
        let mut scope = self;
        loop {
            if let Some(running) = scope.memo.lock().get(&id) {
                return Some(running.clone());
            }
            scope = scope.parent.as_deref()?;
        }
    }

    /// Returns `true` once `id` has succeeded in this scope or an enclosing one.
    fn finished(&self, id: NodeId) -> bool {
        self.find(id).is_some_and(|running| matches!(running.peek(), Some(Ok(()))))
    }
}

/// Runs an [`ExecutionPlan`] against a [`QueryContext`].
#[derive(Debug, Clone)]
pub struct Scheduler {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    plan: ExecutionPlan,
    ctx: Arc<QueryContext>,
    /// Variables each node reads, derived from the plan's reader lists.
    reads: HashMap<NodeId, Vec<String>>,
    /// Completed reads per variable.
    consumed: Mutex<HashMap<String, usize>>,
}

impl Scheduler {
    /// Creates a scheduler for one execution of `plan`.
    #[must_use]
    pub fn new(plan: ExecutionPlan, ctx: Arc<QueryContext>) -> Self {
        let mut reads: HashMap<NodeId, Vec<String>> = HashMap::new();
        for var in plan.variables().iter() {
            for reader in var.readers() {
                reads.entry(*reader).or_default().push(var.name().to_owned());
            }
        }
        Self { inner: Arc::new(Inner { plan, ctx, reads, consumed: Mutex::default() }) }
    }

    /// The plan being run.
    #[must_use]
    pub fn plan(&self) -> &ExecutionPlan {
        &self.inner.plan
    }

    /// The query context results are published into.
    #[must_use]
    pub fn context(&self) -> &Arc<QueryContext> {
        &self.inner.ctx
    }

    /// Executes the plan and returns the root node's result.
    ///
    /// # Errors
    ///
    /// The first node failure aborts the query: the context is cancelled,
    /// every published result is dropped and the error is returned.
    pub async fn execute(self) -> ExecResult<ResultSet> {
        let inner = self.inner;
        if inner.ctx.config().collect_stats {
            inner.ctx.set_plan_description(inner.plan.describe());
        }

        let root = inner.plan.root();
        let scope = Arc::new(Scope::default());
        debug!(root = %root, nodes = inner.plan.nodes().count(), "executing plan");

        let outcome = inner.drive(&scope, root).await.and_then(|()| {
            let var = inner.plan.node(root)?.output_var();
            inner.ctx.take_result(var).ok_or_else(|| ExecError::VariableNotFound(var.to_owned()))
        });
        drop(scope);

        match outcome {
            Ok(result) => {
                debug!(
                    rows = result.size(),
                    elapsed_us = elapsed_us(inner.ctx.stats().elapsed()),
                    "plan finished"
                );
                Ok(Arc::try_unwrap(result).unwrap_or_else(|shared| (*shared).clone()))
            }
            Err(e) => {
                warn!(error = %e, "query aborted");
                inner.ctx.cancel();
                inner.ctx.clear_variables();
                Err(e)
            }
        }
    }
}

impl Inner {
    /// Runs every unfinished node `target` depends on, then `target` itself.
    fn drive(
        self: &Arc<Self>,
        scope: &Arc<Scope>,
        target: NodeId,
    ) -> BoxFuture<'static, ExecResult<()>> {
        let this = Arc::clone(self);
        let scope = Arc::clone(scope);
        async move {
            let levels = this.levels(&scope, target)?;
            trace!(target = %target, levels = levels.len(), "driving subplan");
            for level in levels {
                let running: Vec<_> =
                    level.into_iter().map(|id| this.schedule(&scope, id)).collect();
                try_join_all(running).await?;
            }
            Ok(())
        }
        .boxed()
    }

    /// Groups the nodes `target` needs by depth: a node's level is one past
    /// the deepest of its unfinished dependencies.
    fn levels(&self, scope: &Scope, target: NodeId) -> ExecResult<Vec<Vec<NodeId>>> {
        let mut depth: HashMap<NodeId, usize> = HashMap::new();
        let mut stack: Vec<(NodeId, bool)> = vec![(target, false)];

        while let Some((id, expanded)) = stack.pop() {
            if depth.contains_key(&id) {
                continue;
            }
            let node = self.plan.node(id)?;
            let pending = node.deps().iter().copied().filter(|dep| !scope.finished(*dep));
            if expanded {
                let level = pending.filter_map(|dep| depth.get(&dep)).map(|d| d + 1).max();
                depth.insert(id, level.unwrap_or(0));
            } else {
                stack.push((id, true));
                let unseen: Vec<NodeId> = pending.filter(|dep| !depth.contains_key(dep)).collect();
                stack.extend(unseen.into_iter().map(|dep| (dep, false)));
            }
        }

        let mut levels = vec![Vec::new(); depth.values().max().map_or(0, |d| d + 1)];
        let mut ordered: Vec<(NodeId, usize)> = depth.into_iter().collect();
        ordered.sort_unstable();
        for (id, level) in ordered {
            levels[level].push(id);
        }
        Ok(levels)
    }

    fn schedule(self: &Arc<Self>, scope: &Arc<Scope>, id: NodeId) -> NodeFuture {
        if let Some(running) = scope.find(id) {
            return running;
        }
        let this = Arc::clone(self);
        let weak = Arc::downgrade(scope);
        scope
            .memo
            .lock()
            .entry(id)
            .or_insert_with(|| async move { this.run_node(weak, id).await }.boxed().shared())
            .clone()
    }

    async fn run_node(self: Arc<Self>, scope: Weak<Scope>, id: NodeId) -> ExecResult<()> {
        let scope = scope.upgrade().ok_or(ExecError::Cancelled)?;
        let node = self.plan.node(id)?;
        if self.ctx.is_cancelled() {
            return Err(ExecError::Cancelled);
        }

        debug!(node = %id, kind = node.name(), "node started");
        let started = Instant::now();
        let output = match node.kind() {
            PlanNodeKind::Select { condition, then_branch, else_branch } => {
                self.run_select(&scope, node, condition, *then_branch, *else_branch).await
            }
            PlanNodeKind::Loop { condition, body } => {
                self.run_loop(&scope, node, condition, *body).await
            }
            _ => execute_node(OperatorContext::new(&self.ctx, &self.plan, node)).await,
        };
        let output = output.map_err(|e| {
            if e.is_internal() {
                error!(node = %id, kind = node.name(), error = %e, "internal error");
            } else {
                debug!(node = %id, kind = node.name(), error = %e, "node failed");
            }
            e
        })?;

        let rows = output.size();
        self.ctx.publish_shared(node.output_var(), output);
        self.ctx.stats().record_node(rows as u64);
        if self.ctx.config().collect_stats {
            let stats = ProfilingStats {
                rows: rows as u64,
                exec_duration_in_us: elapsed_us(started.elapsed()),
            };
            self.ctx.record_profile(id, stats);
        }
        debug!(node = %id, kind = node.name(), rows, "node finished");

        self.release_inputs(id);
        Ok(())
    }

    async fn run_select(
        self: &Arc<Self>,
        scope: &Arc<Scope>,
        node: &PlanNode,
        condition: &Expr,
        then_branch: NodeId,
        else_branch: NodeId,
    ) -> ExecResult<Arc<ResultSet>> {
        let holds = condition.eval_predicate(&ConditionBindings::new(&self.ctx, scope.iteration))?;
        let branch = if holds { then_branch } else { else_branch };
        trace!(node = %node.id(), branch = if holds { "then" } else { "else" }, "select");

        self.drive(scope, branch).await?;
        self.ctx.result(self.plan.node(branch)?.output_var())
    }

    async fn run_loop(
        self: &Arc<Self>,
        scope: &Arc<Scope>,
        node: &PlanNode,
        condition: &Expr,
        body: NodeId,
    ) -> ExecResult<Arc<ResultSet>> {
        let body_var = self.plan.node(body)?.output_var();
        let mut iterations = 0u64;
        let mut last = None;

        while condition.eval_predicate(&ConditionBindings::new(&self.ctx, iterations))? {
            if self.ctx.is_cancelled() {
                return Err(ExecError::Cancelled);
            }
            trace!(node = %node.id(), iteration = iterations, "loop iteration");
            let body_scope = Scope::child(scope, iterations);
            self.drive(&body_scope, body).await?;
            last = Some(self.ctx.result(body_var)?);
            iterations += 1;
        }

        debug!(node = %node.id(), iterations, "loop finished");
        Ok(last.unwrap_or_else(|| Arc::new(ResultSet::empty(node.col_names().to_vec()))))
    }

    /// Counts the reads `id` just completed and drops results whose every
    /// reader has run.
    fn release_inputs(&self, id: NodeId) {
        if !self.ctx.config().release_consumed_results {
            return;
        }
        let Some(vars) = self.reads.get(&id) else {
            return;
        };
        let mut consumed = self.consumed.lock();
        for var in vars {
            let Some(readers) = self.plan.release_after(var) else {
                continue;
            };
            let done = consumed.entry(var.clone()).or_insert(0);
            *done += 1;
            if *done == readers && self.ctx.release(var) {
                trace!(var = %var, "released result");
            }
        }
    }
}

fn elapsed_us(d: std::time::Duration) -> u64 {
    u64::try_from(d.as_micros()).unwrap_or(u64::MAX)
}
