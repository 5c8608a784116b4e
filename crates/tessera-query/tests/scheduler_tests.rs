//! Scheduler tests: control flow, failure propagation and result release.

use std::sync::Arc;

use futures::future::{BoxFuture, FutureExt};
use tessera_core::{SpaceId, Value, Vertex, VertexId};
use tessera_query::exec::{ExecError, ExecutionConfig, QueryContext, Scheduler};
use tessera_query::expr::{Expr, Function};
use tessera_query::plan::{NodeId, PlanGraph, YieldColumn};
use tessera_query::storage::{
    EdgeDirection, EdgeProp, InMemorySchema, InMemoryStorage, IndexScanSpec, NeighborEntry,
    StorageClient, StorageError, StorageResult, VertexProp,
};

const SPACE: SpaceId = SpaceId::new(1);

/// Routes scheduler logs to the test harness; `RUST_LOG=tessera_query=debug` shows them.
fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_test_writer()
        .try_init();
}

fn context(storage: Arc<dyn StorageClient>) -> Arc<QueryContext> {
    init_tracing();
    Arc::new(QueryContext::new(storage, Arc::new(InMemorySchema::new()), SPACE))
}

fn memory_context() -> Arc<QueryContext> {
    context(Arc::new(InMemoryStorage::new()))
}

fn constant(graph: &mut PlanGraph, input: NodeId, value: &str, alias: &str) -> NodeId {
    graph.project(input, vec![YieldColumn::new(Expr::constant(value), alias)])
}

/// Storage whose every request fails.
struct Unavailable;

impl StorageClient for Unavailable {
    fn fetch_vertices<'a>(
        &'a self,
        _space: SpaceId,
        _ids: &'a [VertexId],
        _props: &'a [VertexProp],
    ) -> BoxFuture<'a, StorageResult<Vec<Vertex>>> {
        async { Err(StorageError::Unavailable("storaged down".into())) }.boxed()
    }

    fn fetch_neighbors<'a>(
        &'a self,
        _space: SpaceId,
        _ids: &'a [VertexId],
        _edge_props: &'a [EdgeProp],
        _direction: EdgeDirection,
    ) -> BoxFuture<'a, StorageResult<Vec<NeighborEntry>>> {
        async { Err(StorageError::Unavailable("storaged down".into())) }.boxed()
    }

    fn scan_index<'a>(
        &'a self,
        _space: SpaceId,
        _spec: &'a IndexScanSpec,
        _return_cols: &'a [String],
    ) -> BoxFuture<'a, StorageResult<Vec<Vec<Value>>>> {
        async { Err(StorageError::Unavailable("storaged down".into())) }.boxed()
    }
}

/// `Select(size($input) > threshold)` over a one-row input.
fn select_plan(threshold: i64) -> (PlanGraph, NodeId) {
    let mut g = PlanGraph::new();
    let start = g.start();
    let input = constant(&mut g, start, "x", "v");
    let var = g.output_var(input).unwrap().to_owned();

    let then_start = g.start();
    let then_branch = constant(&mut g, then_start, "then", "branch");
    let else_start = g.start();
    let else_branch = constant(&mut g, else_start, "else", "branch");

    let size = Expr::call(Function::Size, vec![Expr::variable(var)]);
    let condition = size.greater_than(Expr::constant(threshold));
    let select = g.select(Some(input), condition, then_branch, else_branch);
    let root = g.pass_through(select);
    (g, root)
}

async fn run_select(threshold: i64) -> Vec<Vec<Value>> {
    let (g, root) = select_plan(threshold);
    let plan = g.finish(root).unwrap();
    let result = Scheduler::new(plan, memory_context()).execute().await.unwrap();
    assert_eq!(result.col_names(), vec!["branch"]);
    result.to_values()
}

#[tokio::test]
async fn select_runs_only_the_chosen_branch() {
    assert_eq!(run_select(0).await, vec![vec![Value::from("then")]]);
    assert_eq!(run_select(5).await, vec![vec![Value::from("else")]]);
}

#[tokio::test]
async fn select_skips_the_other_branch() {
    let (g, root) = select_plan(0);
    let plan = g.finish(root).unwrap();
    let ctx = memory_context();
    Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap();
    // start, input, then-start, then-project, select, pass-through
    assert_eq!(ctx.stats().nodes_executed(), 6);
}

#[tokio::test]
async fn loop_without_iterations_is_empty() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let body = constant(&mut g, start, "row", "col");
    let lp = g.loop_node(None, Expr::constant(false), body);
    let plan = g.finish(lp).unwrap();

    let ctx = memory_context();
    let result = Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap();
    assert!(result.is_empty());
    assert_eq!(result.col_names(), vec!["col"]);
    assert_eq!(ctx.stats().nodes_executed(), 1);
}

#[tokio::test]
async fn loop_reruns_its_body() {
    let mut g = PlanGraph::new();
    let outer = g.start();
    let outer_project = constant(&mut g, outer, "outer", "o");
    let body_start = g.start();
    let body = constant(&mut g, body_start, "body", "b");
    let condition = Expr::Iteration.less_than(Expr::constant(3i64));
    let lp = g.loop_node(Some(outer_project), condition, body);
    let plan = g.finish(lp).unwrap();

    let ctx = memory_context();
    let result = Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap();
    assert_eq!(result.to_values(), vec![vec![Value::from("body")]]);
    // outer start and project once, body start and project three times, loop
    assert_eq!(ctx.stats().nodes_executed(), 2 + 3 * 2 + 1);
}

#[tokio::test]
async fn loop_body_reuses_outer_nodes() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let shared = constant(&mut g, start, "shared", "s");
    let body = g.dedup(shared);
    let condition = Expr::Iteration.less_than(Expr::constant(2i64));
    let lp = g.loop_node(Some(shared), condition, body);
    let plan = g.finish(lp).unwrap();

    let ctx = memory_context();
    let result = Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap();
    assert_eq!(result.to_values(), vec![vec![Value::from("shared")]]);
    // start and project once, dedup twice, loop
    assert_eq!(ctx.stats().nodes_executed(), 2 + 2 + 1);
}

#[tokio::test]
async fn storage_failure_in_branch_aborts_query() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let input = constant(&mut g, start, "x", "v");

    let then_start = g.start();
    let fetch = g.get_vertices(then_start, Expr::constant(1i64), Vec::new());
    let then_branch = g.project(fetch, vec![YieldColumn::new(Expr::Vertex, "branch")]);
    let else_start = g.start();
    let else_branch = constant(&mut g, else_start, "else", "branch");

    let select = g.select(Some(input), Expr::constant(true), then_branch, else_branch);
    let select_var = g.output_var(select).unwrap().to_owned();
    let plan = g.finish(select).unwrap();

    let ctx = context(Arc::new(Unavailable));
    let err = Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap_err();
    assert_eq!(err, ExecError::Storage(StorageError::Unavailable("storaged down".into())));
    assert!(!err.is_internal());
    assert!(ctx.get_result(&select_var).is_none());
    assert!(ctx.is_cancelled());
}

#[tokio::test]
async fn unknown_space_surfaces_as_storage_error() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let fetch = g.get_vertices(start, Expr::constant(1i64), Vec::new());
    let plan = g.finish(fetch).unwrap();

    let err = Scheduler::new(plan, memory_context()).execute().await.unwrap_err();
    assert_eq!(err, ExecError::Storage(StorageError::SpaceNotFound(1)));
}

#[tokio::test]
async fn row_limit_aborts_query() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let a = constant(&mut g, start, "a", "v");
    let b = constant(&mut g, start, "b", "v");
    let union = g.union(a, b).unwrap();
    let plan = g.finish(union).unwrap();

    let ctx = Arc::new(
        QueryContext::new(Arc::new(InMemoryStorage::new()), Arc::new(InMemorySchema::new()), SPACE)
            .with_config(ExecutionConfig::new().with_max_rows_in_memory(1)),
    );
    let err = Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap_err();
    assert_eq!(err, ExecError::ResourceExhausted { rows: 2, limit: 1 });
}

#[tokio::test]
async fn results_read_by_several_nodes_are_released_after_the_last() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let shared = constant(&mut g, start, "s", "v");
    let a = g.pass_through(shared);
    let b = g.dedup(shared);
    let union = g.union(a, b).unwrap();
    let plan = g.finish(union).unwrap();
    let shared_var = plan.node(shared).unwrap().output_var().to_owned();
    let a_var = plan.node(a).unwrap().output_var().to_owned();

    let ctx = memory_context();
    let result = Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap();
    assert_eq!(result.size(), 2);
    assert!(ctx.get_result(&shared_var).is_none());
    assert!(ctx.get_result(&a_var).is_none());
    assert_eq!(ctx.version(&shared_var), 1);
    assert!(ctx.stats().results_released() >= 1);
}

#[tokio::test]
async fn long_dependency_chains_run_level_by_level() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let mut tail = constant(&mut g, start, "deep", "v");
    for _ in 0..5_000 {
        tail = g.pass_through(tail);
    }
    let plan = g.finish(tail).unwrap();

    let ctx = memory_context();
    let result = Scheduler::new(plan, Arc::clone(&ctx)).execute().await.unwrap();
    assert_eq!(result.to_values(), vec![vec![Value::from("deep")]]);
    assert_eq!(ctx.stats().nodes_executed(), 5_002);
}

#[tokio::test]
async fn long_chains_inside_a_branch() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let input = constant(&mut g, start, "x", "v");
    let then_start = g.start();
    let mut then_branch = constant(&mut g, then_start, "then", "branch");
    for _ in 0..2_000 {
        then_branch = g.pass_through(then_branch);
    }
    let else_start = g.start();
    let else_branch = constant(&mut g, else_start, "else", "branch");
    let select = g.select(Some(input), Expr::constant(true), then_branch, else_branch);
    let plan = g.finish(select).unwrap();

    let result = Scheduler::new(plan, memory_context()).execute().await.unwrap();
    assert_eq!(result.to_values(), vec![vec![Value::from("then")]]);
}
