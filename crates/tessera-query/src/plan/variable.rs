//! The variable table.
//!
//! Every node publishes its result under exactly one variable. The table
//! records who produces each variable and who reads it, which is what
//! lifetime analysis works from.

use std::collections::HashMap;

use super::{NodeId, PlanError, PlanResult};

/// The last reader of a variable.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LastUser {
    /// Nothing reads the variable.
    Unused,
    /// The highest-id node that reads the variable.
    Node(NodeId),
    /// The variable feeds a Select or Loop output; the scheduler decides when
    /// it is consumed.
    Scheduler,
}

/// A named binding between a node and the result it produces.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Variable {
    name: String,
    producer: NodeId,
    readers: Vec<NodeId>,
    last_user: LastUser,
}

impl Variable {
    /// Creates an unread variable.
    #[must_use]
    pub fn new(name: impl Into<String>, producer: NodeId) -> Self {
        Self { name: name.into(), producer, readers: Vec::new(), last_user: LastUser::Unused }
    }

    /// The variable name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The producing node.
    #[must_use]
    pub const fn producer(&self) -> NodeId {
        self.producer
    }

    /// Every node that reads the variable, in discovery order.
    #[must_use]
    pub fn readers(&self) -> &[NodeId] {
        &self.readers
    }

    /// The last reader.
    #[must_use]
    pub const fn last_user(&self) -> LastUser {
        self.last_user
    }

    /// Returns `true` if the scheduler owns this variable's lifetime.
    #[must_use]
    pub const fn is_pinned(&self) -> bool {
        matches!(self.last_user, LastUser::Scheduler)
    }

    /// Records a reader. The highest id wins; a pinned variable stays pinned.
    pub fn record_user(&mut self, node: NodeId) {
        if !self.readers.contains(&node) {
            self.readers.push(node);
        }
        self.last_user = match self.last_user {
            LastUser::Scheduler => LastUser::Scheduler,
            LastUser::Unused => LastUser::Node(node),
            LastUser::Node(prev) => LastUser::Node(prev.max(node)),
        };
    }

    /// Hands the variable's lifetime to the scheduler.
    pub fn pin(&mut self) {
        self.last_user = LastUser::Scheduler;
    }
}

/// All variables of a plan, keyed by name.
#[derive(Debug, Clone, Default)]
pub struct VariableTable {
    vars: HashMap<String, Variable>,
}

impl VariableTable {
    /// Creates an empty table.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Declares a variable.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::DuplicateVariable`] if the name already has a producer.
    pub fn declare(&mut self, name: &str, producer: NodeId) -> PlanResult<()> {
        if self.vars.contains_key(name) {
            return Err(PlanError::DuplicateVariable(name.to_owned()));
        }
        self.vars.insert(name.to_owned(), Variable::new(name, producer));
        Ok(())
    }

    /// Removes a variable.
    pub fn remove(&mut self, name: &str) -> Option<Variable> {
        self.vars.remove(name)
    }

    /// Looks a variable up.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&Variable> {
        self.vars.get(name)
    }

    /// Looks a variable up mutably.
    ///
    /// # Errors
    ///
    /// Returns [`PlanError::UnknownVariable`] if no node produces it.
    pub fn get_mut(&mut self, name: &str) -> PlanResult<&mut Variable> {
        self.vars.get_mut(name).ok_or_else(|| PlanError::UnknownVariable(name.to_owned()))
    }

    /// Iterates over all variables in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Variable> {
        self.vars.values()
    }

    /// Number of variables.
    #[must_use]
    pub fn len(&self) -> usize {
        self.vars.len()
    }

    /// Returns `true` if there are no variables.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.vars.is_empty()
    }
}
