//! Binding graph validation.
//!
//! Walks the dependencies of every type binding without constructing
//! anything:
//! - Detects dependency cycles
//! - Checks that every dependency is bound
//!
//! Building the graph describes every bound type, so reflection errors
//! surface here as well. Factories are opaque and contribute no edges.

use std::collections::{HashMap, HashSet};

use tracing::{debug, instrument, warn};

use crate::error::{CyclicDependencyError, NullBindingError, RabtError};
use crate::key::BindingKey;

/// Validates a binding graph with a depth-first search.
///
/// `edges` maps every bound key to the keys building it requires; a key
/// missing from `edges` is unbound.
pub(crate) struct GraphValidator<'a> {
    edges: HashMap<BindingKey, Vec<BindingKey>>,
    suggest: &'a dyn Fn(&BindingKey) -> Vec<BindingKey>,
    /// Currently being visited (for cycle detection)
    visiting: HashSet<BindingKey>,
    /// Already validated
    validated: HashSet<BindingKey>,
    /// Current DFS path (for error reporting)
    path: Vec<BindingKey>,
}

impl<'a> GraphValidator<'a> {
    pub fn new(
        edges: HashMap<BindingKey, Vec<BindingKey>>,
        suggest: &'a dyn Fn(&BindingKey) -> Vec<BindingKey>,
    ) -> Self {
        Self {
            edges,
            suggest,
            visiting: HashSet::new(),
            validated: HashSet::new(),
            path: Vec::new(),
        }
    }

    /// Validates the whole graph.
    ///
    /// # Errors
    /// - [`RabtError::CyclicDependency`]: cycle detected
    /// - [`RabtError::NullBinding`]: a dependency is unbound
    #[instrument(skip(self), name = "graph_validation")]
    pub fn validate(&mut self) -> Result<(), RabtError> {
        let mut keys: Vec<BindingKey> = self.edges.keys().cloned().collect();
        keys.sort_by_key(|key| key.type_name());

        debug!(bindings = keys.len(), "Starting binding graph validation");

        for key in keys {
            self.validate_key(&key)?;
        }

        debug!("Binding graph validation passed");
        Ok(())
    }

    fn validate_key(&mut self, key: &BindingKey) -> Result<(), RabtError> {
        if self.validated.contains(key) {
            return Ok(());
        }

        if self.visiting.contains(key) {
            let start = self.path.iter().position(|k| k == key).unwrap_or(0);
            let mut chain = self.path[start..].to_vec();
            chain.push(key.clone());

            warn!(cycle = ?chain, "Cyclic dependency detected");
            return Err(RabtError::CyclicDependency(CyclicDependencyError {
                chain,
                depth_exceeded: false,
            }));
        }

        let dependencies = self.edges.get(key).cloned().ok_or_else(|| {
            RabtError::NullBinding(NullBindingError {
                requested: key.clone(),
                required_by: self.path.last().cloned(),
                chain: self.path.clone(),
                suggestions: (self.suggest)(key),
            })
        })?;

        self.visiting.insert(key.clone());
        self.path.push(key.clone());

        for dependency in &dependencies {
            self.validate_key(dependency)?;
        }

        self.path.pop();
        self.visiting.remove(key);
        self.validated.insert(key.clone());

        Ok(())
    }
}
