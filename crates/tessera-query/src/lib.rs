//! Tessera Query
//!
//! This crate turns validated graph queries into executable plan graphs and
//! runs them against a storage layer.
//!
//! # Architecture
//!
//! ```text
//! Planner (pattern clauses) -> PlanGraph -> ExecutionPlan -> Scheduler -> ResultSet
//!                                               |                |
//!                                        lifetime analysis   operators over
//!                                                             StorageClient
//! ```
//!
//! # Modules
//!
//! - [`expr`] - Expression trees, evaluation and pure rewrites
//! - [`plan`] - Arena plan graph, variables, lifetime analysis and plan description
//! - [`storage`] - Storage client and schema provider contracts with in-memory implementations
//! - [`exec`] - Row/iterator model, operators, query context and the scheduler
//! - [`planner`] - Lowering of match patterns and fetch sentences into subplans
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//!
//! use tessera_core::{SpaceId, Value};
//! use tessera_query::exec::{QueryContext, Scheduler};
//! use tessera_query::expr::Expr;
//! use tessera_query::plan::{PlanGraph, YieldColumn};
//! use tessera_query::storage::{InMemorySchema, InMemoryStorage};
//!
//! let ctx = QueryContext::new(
//!     Arc::new(InMemoryStorage::new()),
//!     Arc::new(InMemorySchema::new()),
//!     SpaceId::new(1),
//! );
//!
//! let mut graph = PlanGraph::new();
//! let start = graph.start();
//! let project = graph.project(start, vec![YieldColumn::new(Expr::constant(1i64), "one")]);
//! let plan = graph.finish(project).unwrap();
//!
//! let run = Scheduler::new(plan, Arc::new(ctx)).execute();
//! let result = futures::executor::block_on(run).unwrap();
//! assert_eq!(result.col_names(), vec!["one"]);
//! assert_eq!(result.to_values(), vec![vec![Value::Int(1)]]);
//! ```

// Deny unwrap in library code to ensure proper error handling
#![deny(clippy::unwrap_used)]

pub mod error;
pub mod exec;
pub mod expr;
pub mod plan;
pub mod planner;
pub mod storage;

pub use error::{ErrorKind, QueryError, QueryResult};
