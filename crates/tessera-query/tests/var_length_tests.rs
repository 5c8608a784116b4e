//! End-to-end tests for variable-length pattern planning and execution.

use std::sync::Arc;

use tessera_core::{Edge, EdgeTypeId, Path, SpaceId, Tag, Value, VertexId};
use tessera_query::exec::{QueryContext, ResultSet, Scheduler};
use tessera_query::expr::Expr;
use tessera_query::plan::{PlanError, PlanGraph};
use tessera_query::planner::{
    EdgeInfo, MatchContext, NodeInfo, ScanInfo, VariableLengthPatternPlanner,
};
use tessera_query::storage::{EdgeDirection, InMemorySchema, InMemoryStorage};

const SPACE: SpaceId = SpaceId::new(1);
const PERSON: i32 = 1;
const KNOWS: i32 = 10;

fn schema() -> Arc<InMemorySchema> {
    let mut schema = InMemorySchema::new();
    schema.add_space(SPACE).add_tag(SPACE, PERSON, "person", &["name"]).add_edge(
        SPACE,
        KNOWS,
        "knows",
        &["since"],
    );
    Arc::new(schema)
}

fn storage(vertices: &[(i64, &str)], edges: &[(i64, i64)]) -> Arc<InMemoryStorage> {
    let mut storage = InMemoryStorage::new();
    for (vid, name) in vertices {
        storage.add_vertex(SPACE, *vid, PERSON, Tag::new("person").with_prop("name", *name));
    }
    for (src, dst) in edges {
        let (src, dst) = (VertexId::new(*src), VertexId::new(*dst));
        let edge = Edge::new(src, dst, EdgeTypeId::new(KNOWS), "knows")
            .with_prop("since", 2000 + src.as_i64());
        storage.add_edge(SPACE, edge);
    }
    Arc::new(storage)
}

/// 1 -> 2 -> 3 -> 4 and 2 -> 5.
fn chain() -> Arc<InMemoryStorage> {
    storage(&[(1, "a"), (2, "b"), (3, "c"), (4, "d"), (5, "e")], &[(1, 2), (2, 3), (3, 4), (2, 5)])
}

fn starting_at(name: &str) -> ScanInfo {
    ScanInfo::new("person").with_filter(Expr::label_attr("a", "name").equals(Expr::constant(name)))
}

fn knows(min: usize, max: usize) -> EdgeInfo {
    EdgeInfo::new(EdgeDirection::Out).named("e").with_type("knows").with_range(min, max)
}

fn pattern(min: usize, max: usize) -> MatchContext {
    MatchContext::new(SPACE, starting_at("a"), NodeInfo::named("a"))
        .step(knows(min, max), NodeInfo::named("b"))
        .with_path_alias("p")
}

async fn run(ctx: &MatchContext, storage: Arc<InMemoryStorage>) -> ResultSet {
    let schema = schema();
    let mut graph = PlanGraph::new();
    let plan =
        VariableLengthPatternPlanner::new(schema.as_ref(), ctx).transform(&mut graph).unwrap();
    let plan = graph.finish(plan.root).unwrap();
    let qctx = QueryContext::new(storage, schema, SPACE);
    Scheduler::new(plan, Arc::new(qctx)).execute().await.unwrap()
}

fn paths(result: &ResultSet, column: &str) -> Vec<Path> {
    let mut paths: Vec<Path> = result
        .column(column)
        .unwrap()
        .into_iter()
        .map(|v| v.as_path().cloned().unwrap())
        .collect();
    paths.sort_by_key(|p| p.vertices().map(|v| v.vid.as_i64()).collect::<Vec<_>>());
    paths
}

fn vids(path: &Path) -> Vec<i64> {
    path.vertices().map(|v| v.vid.as_i64()).collect()
}

#[tokio::test]
async fn expands_one_to_three_hops() {
    let result = run(&pattern(1, 3), chain()).await;
    assert_eq!(result.col_names(), vec!["a", "e", "b", "p"]);

    let found: Vec<Vec<i64>> = paths(&result, "p").iter().map(vids).collect();
    assert_eq!(found, vec![vec![1, 2], vec![1, 2, 3], vec![1, 2, 3, 4], vec![1, 2, 5]]);
}

#[tokio::test]
async fn min_hop_drops_short_paths() {
    let result = run(&pattern(2, 3), chain()).await;
    let found: Vec<Vec<i64>> = paths(&result, "p").iter().map(vids).collect();
    assert_eq!(found, vec![vec![1, 2, 3], vec![1, 2, 3, 4], vec![1, 2, 5]]);
}

#[tokio::test]
async fn paths_are_continuous_and_edge_distinct() {
    let result = run(&pattern(1, 3), chain()).await;
    for path in paths(&result, "p") {
        assert!(!path.has_duplicate_edges());
        let mut at = path.start_vertex().vid;
        for edge in path.relationships() {
            assert_eq!(edge.src, at);
            at = edge.dst;
        }
        assert_eq!(at, path.end_vertex().vid);
    }
}

#[tokio::test]
async fn aliases_bind_endpoints_and_edges() {
    let result = run(&pattern(1, 3), chain()).await;
    for row in result.to_values() {
        let (a, e, b, p) = (&row[0], &row[1], &row[2], row[3].as_path().unwrap());
        assert_eq!(a.as_vertex().unwrap().vid, VertexId::new(1));
        assert_eq!(b.as_vertex().unwrap().vid, p.end_vertex().vid);
        assert!(b.as_vertex().unwrap().prop("person", "name").is_some());

        let edges = e.as_list().unwrap();
        assert_eq!(edges.len(), p.length());
        assert_eq!(edges[0].as_edge().unwrap().prop("since"), Some(&Value::Int(2001)));
    }
}

#[tokio::test]
async fn cycles_do_not_reuse_edges() {
    let cycle = storage(&[(1, "a"), (2, "b")], &[(1, 2), (2, 1)]);
    let result = run(&pattern(1, 3), cycle).await;
    let found: Vec<Vec<i64>> = paths(&result, "p").iter().map(vids).collect();
    assert_eq!(found, vec![vec![1, 2], vec![1, 2, 1]]);
}

#[tokio::test]
async fn long_hop_ranges_stop_when_edges_run_out() {
    let cycle = storage(&[(1, "a"), (2, "b")], &[(1, 2), (2, 1)]);
    let result = run(&pattern(1, 100), cycle).await;
    let found: Vec<Vec<i64>> = paths(&result, "p").iter().map(vids).collect();
    assert_eq!(found, vec![vec![1, 2], vec![1, 2, 1]]);
}

#[tokio::test]
async fn both_directions_follow_edges_either_way() {
    // 1 -> 2 <- 3
    let graph = storage(&[(1, "a"), (2, "b"), (3, "c")], &[(1, 2), (3, 2)]);
    let ctx = MatchContext::new(SPACE, starting_at("a"), NodeInfo::named("a"))
        .step(
            EdgeInfo::new(EdgeDirection::Both).named("e").with_type("knows").with_range(1, 3),
            NodeInfo::named("b"),
        )
        .with_path_alias("p");
    let result = run(&ctx, graph).await;

    let found = paths(&result, "p");
    let vertices: Vec<Vec<i64>> = found.iter().map(vids).collect();
    assert_eq!(vertices, vec![vec![1, 2], vec![1, 2, 3]]);
    for path in &found {
        assert!(!path.has_duplicate_edges());
    }
}

#[tokio::test]
async fn reverse_traversal() {
    let ctx = MatchContext::new(SPACE, starting_at("d"), NodeInfo::named("a"))
        .step(
            EdgeInfo::new(EdgeDirection::In).with_type("knows").with_range(1, 2),
            NodeInfo::named("b"),
        )
        .with_path_alias("p");
    let result = run(&ctx, chain()).await;
    let found: Vec<Vec<i64>> = paths(&result, "p").iter().map(vids).collect();
    assert_eq!(found, vec![vec![4, 3], vec![4, 3, 2]]);
}

#[tokio::test]
async fn fixed_length_edge_binds_single_relationship() {
    let ctx = MatchContext::new(SPACE, starting_at("a"), NodeInfo::named("a"))
        .step(
            EdgeInfo::new(EdgeDirection::Out).named("e").with_type("knows"),
            NodeInfo::named("b"),
        );
    let result = run(&ctx, chain()).await;
    assert_eq!(result.size(), 1);
    let row = &result.to_values()[0];
    let edge = row[1].as_edge().unwrap();
    assert_eq!((edge.src, edge.dst), (VertexId::new(1), VertexId::new(2)));
    assert!(result.col_names()[3].starts_with("__anon_path_"));
}

#[tokio::test]
async fn chained_segments_join_on_shared_vertex() {
    let ctx = MatchContext::new(SPACE, starting_at("a"), NodeInfo::named("a"))
        .step(EdgeInfo::new(EdgeDirection::Out).with_type("knows"), NodeInfo::named("b"))
        .step(
            EdgeInfo::new(EdgeDirection::Out).with_type("knows").with_range(1, 2),
            NodeInfo::named("c"),
        )
        .with_path_alias("p");
    let result = run(&ctx, chain()).await;
    assert_eq!(result.col_names(), vec!["a", "b", "c", "p"]);

    let found: Vec<Vec<i64>> = paths(&result, "p").iter().map(vids).collect();
    assert_eq!(found, vec![vec![1, 2, 3], vec![1, 2, 3, 4], vec![1, 2, 5]]);
    for row in result.to_values() {
        assert_eq!(row[1].as_vertex().unwrap().vid, VertexId::new(2));
    }
}

#[tokio::test]
async fn node_filter_on_end_vertex() {
    let is_e = Expr::label_attr("b", "name").equals(Expr::constant("e"));
    let end = NodeInfo::named("b").with_filter(is_e);
    let ctx = MatchContext::new(SPACE, starting_at("a"), NodeInfo::named("a"))
        .step(EdgeInfo::new(EdgeDirection::Out).with_type("knows").with_range(1, 3), end)
        .with_path_alias("p");
    let result = run(&ctx, chain()).await;
    let found: Vec<Vec<i64>> = paths(&result, "p").iter().map(vids).collect();
    assert_eq!(found, vec![vec![1, 2, 5]]);
}

#[test]
fn invalid_ranges_are_rejected() {
    let schema = schema();
    let mut graph = PlanGraph::new();
    let ctx = pattern(3, 2);
    let err =
        VariableLengthPatternPlanner::new(schema.as_ref(), &ctx).transform(&mut graph).unwrap_err();
    assert!(matches!(err, PlanError::InvalidPattern(_)));
}

#[test]
fn unknown_edge_type_is_a_plan_error() {
    let schema = schema();
    let mut graph = PlanGraph::new();
    let ctx = MatchContext::new(SPACE, starting_at("a"), NodeInfo::named("a"))
        .step(EdgeInfo::new(EdgeDirection::Out).with_type("likes"), NodeInfo::named("b"));
    let err =
        VariableLengthPatternPlanner::new(schema.as_ref(), &ctx).transform(&mut graph).unwrap_err();
    assert!(matches!(err, PlanError::Schema(_)));
}
