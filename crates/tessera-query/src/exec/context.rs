//! Execution context for query execution.
//!
//! The context owns the variable store through which plan nodes exchange
//! results, together with the injected storage and schema collaborators,
//! runtime configuration, statistics and the cancellation flag.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Instant;

use parking_lot::{Mutex, RwLock};
use tessera_core::SpaceId;

use super::error::{ExecError, ExecResult};
use super::result::ResultSet;
use crate::plan::{NodeId, PlanDescription, ProfilingStats};
use crate::storage::{SchemaProvider, StorageClient};

/// Default maximum rows in memory (1 million rows).
pub const DEFAULT_MAX_ROWS_IN_MEMORY: usize = 1_000_000;

/// A published result together with its publication count.
#[derive(Debug, Default)]
struct VarSlot {
    version: u64,
    result: Option<Arc<ResultSet>>,
}

/// Execution context for a query.
///
/// Shared by every node of one query execution; all methods take `&self`.
pub struct QueryContext {
    storage: Arc<dyn StorageClient>,
    schema: Arc<dyn SchemaProvider>,
    space: SpaceId,
    variables: RwLock<HashMap<String, VarSlot>>,
    cancel: CancellationToken,
    stats: ExecutionStats,
    config: ExecutionConfig,
    description: Mutex<Option<PlanDescription>>,
}

impl QueryContext {
    /// Creates a context for queries against `space`.
    #[must_use]
    pub fn new(
        storage: Arc<dyn StorageClient>,
        schema: Arc<dyn SchemaProvider>,
        space: SpaceId,
    ) -> Self {
        Self {
            storage,
            schema,
            space,
            variables: RwLock::new(HashMap::new()),
            cancel: CancellationToken::new(),
            stats: ExecutionStats::new(),
            config: ExecutionConfig::default(),
            description: Mutex::new(None),
        }
    }

    /// Sets the execution configuration.
    #[must_use]
    pub fn with_config(mut self, config: ExecutionConfig) -> Self {
        self.config = config;
        self
    }

    /// Uses a caller-provided cancellation token.
    #[must_use]
    pub fn with_cancellation(mut self, token: CancellationToken) -> Self {
        self.cancel = token;
        self
    }

    /// Returns the storage client.
    #[inline]
    #[must_use]
    pub fn storage(&self) -> &dyn StorageClient {
        self.storage.as_ref()
    }

    /// Returns the schema provider.
    #[inline]
    #[must_use]
    pub fn schema(&self) -> &dyn SchemaProvider {
        self.schema.as_ref()
    }

    /// Returns the graph space queries run against.
    #[inline]
    #[must_use]
    pub const fn space(&self) -> SpaceId {
        self.space
    }

    /// Returns the configuration.
    #[inline]
    #[must_use]
    pub const fn config(&self) -> &ExecutionConfig {
        &self.config
    }

    /// Returns the execution statistics.
    #[inline]
    #[must_use]
    pub const fn stats(&self) -> &ExecutionStats {
        &self.stats
    }

    /// Publishes a result under a variable, replacing any previous one.
    ///
    /// Returns the variable's new version; the first publication is version 1.
    pub fn publish(&self, name: &str, result: ResultSet) -> u64 {
        self.publish_shared(name, Arc::new(result))
    }

    /// Publishes an already shared result under a variable.
    pub fn publish_shared(&self, name: &str, result: Arc<ResultSet>) -> u64 {
        let mut vars = self.variables.write();
        let slot = vars.entry(name.to_owned()).or_default();
        slot.version += 1;
        slot.result = Some(result);
        slot.version
    }

    /// Returns the result currently published under a variable.
    #[must_use]
    pub fn get_result(&self, name: &str) -> Option<Arc<ResultSet>> {
        self.variables.read().get(name).and_then(|slot| slot.result.clone())
    }

    /// Returns the result published under a variable.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::VariableNotFound`] if nothing is published.
    pub fn result(&self, name: &str) -> ExecResult<Arc<ResultSet>> {
        self.get_result(name).ok_or_else(|| ExecError::VariableNotFound(name.to_owned()))
    }

    /// Returns how many times a variable has been published.
    #[must_use]
    pub fn version(&self, name: &str) -> u64 {
        self.variables.read().get(name).map_or(0, |slot| slot.version)
    }

    /// Removes and returns a variable's result, keeping its version.
    pub fn take_result(&self, name: &str) -> Option<Arc<ResultSet>> {
        self.variables.write().get_mut(name).and_then(|slot| slot.result.take())
    }

    /// Drops a variable's result. Returns `true` if there was one.
    pub fn release(&self, name: &str) -> bool {
        let released = self.take_result(name).is_some();
        if released {
            self.stats.results_released.fetch_add(1, Ordering::Relaxed);
        }
        released
    }

    /// Drops every published result.
    pub fn clear_variables(&self) {
        self.variables.write().clear();
    }

    /// Fails if an operator would hold more than the configured number of rows.
    ///
    /// # Errors
    ///
    /// Returns [`ExecError::ResourceExhausted`] when `rows` exceeds the limit.
    pub fn check_rows(&self, rows: usize) -> ExecResult<()> {
        let limit = self.config.max_rows_in_memory;
        if limit > 0 && rows > limit {
            return Err(ExecError::ResourceExhausted { rows, limit });
        }
        Ok(())
    }

    /// Cancels the query execution.
    #[inline]
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Checks if the query has been cancelled.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Returns a handle that can cancel this query from elsewhere.
    #[must_use]
    pub fn cancellation_token(&self) -> CancellationToken {
        self.cancel.clone()
    }

    /// Stores the description profiles are recorded into.
    pub fn set_plan_description(&self, description: PlanDescription) {
        *self.description.lock() = Some(description);
    }

    /// Returns the plan description with any recorded profiles.
    #[must_use]
    pub fn plan_description(&self) -> Option<PlanDescription> {
        self.description.lock().clone()
    }

    /// Appends one execution's statistics to a node's description.
    pub fn record_profile(&self, node: NodeId, stats: ProfilingStats) {
        if let Some(description) = self.description.lock().as_mut() {
            description.add_profile(node, stats);
        }
    }
}

impl std::fmt::Debug for QueryContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("QueryContext")
            .field("space", &self.space)
            .field("variables", &self.variables.read().len())
            .field("cancel", &self.cancel)
            .field("stats", &self.stats)
            .field("config", &self.config)
            .field("storage", &"<StorageClient>")
            .finish_non_exhaustive()
    }
}

/// Execution statistics collected during query execution.
#[derive(Debug)]
pub struct ExecutionStats {
    /// When execution started.
    start_time: Instant,
    /// Number of node executions.
    nodes_executed: AtomicU64,
    /// Number of rows produced across all nodes.
    rows_produced: AtomicU64,
    /// Number of results released before the query ended.
    results_released: AtomicU64,
}

impl ExecutionStats {
    /// Creates new execution statistics.
    #[must_use]
    pub fn new() -> Self {
        Self {
            start_time: Instant::now(),
            nodes_executed: AtomicU64::new(0),
            rows_produced: AtomicU64::new(0),
            results_released: AtomicU64::new(0),
        }
    }

    /// Records one node execution and the rows it produced.
    #[inline]
    pub fn record_node(&self, rows: u64) {
        self.nodes_executed.fetch_add(1, Ordering::Relaxed);
        self.rows_produced.fetch_add(rows, Ordering::Relaxed);
    }

    /// Returns the number of node executions.
    #[inline]
    #[must_use]
    pub fn nodes_executed(&self) -> u64 {
        self.nodes_executed.load(Ordering::Relaxed)
    }

    /// Returns the number of rows produced.
    #[inline]
    #[must_use]
    pub fn rows_produced(&self) -> u64 {
        self.rows_produced.load(Ordering::Relaxed)
    }

    /// Returns the number of results released early.
    #[inline]
    #[must_use]
    pub fn results_released(&self) -> u64 {
        self.results_released.load(Ordering::Relaxed)
    }

    /// Returns the elapsed execution time.
    #[inline]
    #[must_use]
    pub fn elapsed(&self) -> std::time::Duration {
        self.start_time.elapsed()
    }
}

impl Default for ExecutionStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Configuration for query execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExecutionConfig {
    /// Whether to record per-node profiling statistics.
    pub collect_stats: bool,
    /// Maximum rows any operator may materialise. 0 disables the limit.
    pub max_rows_in_memory: usize,
    /// Whether results are dropped once their last reader has run.
    pub release_consumed_results: bool,
}

impl ExecutionConfig {
    /// Creates a new default configuration.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            collect_stats: false,
            max_rows_in_memory: DEFAULT_MAX_ROWS_IN_MEMORY,
            release_consumed_results: true,
        }
    }

    /// Enables statistics collection.
    #[must_use]
    pub const fn with_stats(mut self) -> Self {
        self.collect_stats = true;
        self
    }

    /// Sets the maximum rows in memory. Use 0 to disable the limit.
    #[must_use]
    pub const fn with_max_rows_in_memory(mut self, limit: usize) -> Self {
        self.max_rows_in_memory = limit;
        self
    }

    /// Enables or disables early release of consumed results.
    #[must_use]
    pub const fn with_release_consumed_results(mut self, release: bool) -> Self {
        self.release_consumed_results = release;
        self
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self::new()
    }
}

/// A handle for cancelling query execution.
///
/// Can be shared between threads to allow cancellation from outside
/// the query execution thread.
#[derive(Debug, Clone)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    /// Creates a new cancellation token.
    #[must_use]
    pub fn new() -> Self {
        Self { cancelled: Arc::new(AtomicBool::new(false)) }
    }

    /// Cancels the associated query.
    #[inline]
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    /// Checks if cancellation was requested.
    #[inline]
    #[must_use]
    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

impl Default for CancellationToken {
    fn default() -> Self {
        Self::new()
    }
}
