//! TopN and Sort reject inputs they cannot reorder.

use std::sync::Arc;

use tessera_core::{SpaceId, Tag};
use tessera_query::exec::{ExecError, IterKind, QueryContext, Scheduler};
use tessera_query::expr::Expr;
use tessera_query::plan::{NodeId, OrderFactor, PlanGraph};
use tessera_query::storage::{EdgeDirection, InMemorySchema, InMemoryStorage};
use tessera_query::{ErrorKind, QueryError};

const SPACE: SpaceId = SpaceId::new(1);

async fn run(graph: PlanGraph, root: NodeId) -> ExecError {
    let mut storage = InMemoryStorage::new();
    storage.add_vertex(SPACE, 1, 1, Tag::new("person"));
    let ctx = QueryContext::new(Arc::new(storage), Arc::new(InMemorySchema::new()), SPACE);
    let plan = graph.finish(root).unwrap();
    Scheduler::new(plan, Arc::new(ctx)).execute().await.unwrap_err()
}

fn assert_internal(err: ExecError, operator: &str, kind: IterKind) {
    match &err {
        ExecError::UnsupportedIterator { operator: op, kind: k } => {
            assert_eq!(*op, operator);
            assert_eq!(*k, kind);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(err.is_internal());
    assert_eq!(QueryError::from(err).kind(), ErrorKind::InternalInvariantViolation);
}

fn neighbors(graph: &mut PlanGraph) -> NodeId {
    let start = graph.start();
    graph.get_neighbors(start, Expr::constant(1i64), Vec::new(), EdgeDirection::Out)
}

#[tokio::test]
async fn top_n_over_start_is_internal() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let top = g.top_n(start, Vec::new(), 0, 1).unwrap();
    assert_internal(run(g, top).await, "TopN", IterKind::Default);
}

#[tokio::test]
async fn top_n_over_neighbors_is_internal() {
    let mut g = PlanGraph::new();
    let input = neighbors(&mut g);
    let top = g.top_n(input, vec![OrderFactor::asc(0)], 0, 1).unwrap();
    assert_internal(run(g, top).await, "TopN", IterKind::GetNeighbors);
}

#[tokio::test]
async fn sort_over_start_is_internal() {
    let mut g = PlanGraph::new();
    let start = g.start();
    let sort = g.sort(start, Vec::new()).unwrap();
    assert_internal(run(g, sort).await, "Sort", IterKind::Default);
}

#[tokio::test]
async fn sort_over_neighbors_is_internal() {
    let mut g = PlanGraph::new();
    let input = neighbors(&mut g);
    let sort = g.sort(input, vec![OrderFactor::desc(0)]).unwrap();
    assert_internal(run(g, sort).await, "Sort", IterKind::GetNeighbors);
}
