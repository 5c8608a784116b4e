//! Planners that lower validated clauses into plan subgraphs.
//!
//! Planners only build graph structure: they resolve names through a
//! [`SchemaProvider`](crate::storage::SchemaProvider), add nodes to a
//! [`PlanGraph`](crate::plan::PlanGraph) and return the [`SubPlan`](crate::plan::SubPlan)
//! they created. Schema lookup failures surface as plan construction errors.

pub mod context;
pub mod fetch;
pub mod props;
pub mod var_length;

pub use context::{EdgeInfo, HopRange, MatchContext, NodeInfo, ScanInfo};
pub use fetch::{FetchVerticesContext, FetchVerticesPlanner, VertexSource};
pub use props::{all_vertex_props, edge_props, vertex_props};
pub use var_length::VariableLengthPatternPlanner;
