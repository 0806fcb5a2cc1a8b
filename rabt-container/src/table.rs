//! Binding table: the generic store behind every binder.
//!
//! The table maps a [`BindingKey`] to a [`Binding`] holding one or more
//! values. It knows nothing about construction; the injection binder
//! stores provisions in it, but any clonable value works.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{ConflictingBindingError, RabtError};
use crate::key::BindingKey;
use crate::lifetime::BindingConstraint;

/// Registry entry for one key.
#[derive(Debug, Clone)]
pub struct Binding<V> {
    key: BindingKey,
    constraint: BindingConstraint,
    values: Vec<V>,
}

impl<V> Binding<V> {
    /// The key this binding answers to.
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    /// Whether this binding holds one value or an ordered set.
    pub fn constraint(&self) -> BindingConstraint {
        self.constraint
    }

    /// The first (for `One` bindings, the only) value.
    pub fn value(&self) -> Option<&V> {
        self.values.first()
    }

    /// All values in bind order.
    pub fn values(&self) -> &[V] {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Stores bindings keyed by request type and qualifier.
///
/// Not synchronized; owners wrap it in a lock when sharing.
#[derive(Debug)]
pub struct BindingTable<V> {
    bindings: HashMap<BindingKey, Binding<V>>,
    reject_conflicts: bool,
}

impl<V> Default for BindingTable<V> {
    fn default() -> Self {
        Self::new(false)
    }
}

impl<V> BindingTable<V> {
    /// Creates an empty table.
    ///
    /// With `reject_conflicts`, binding an occupied key fails instead of
    /// replacing the previous value.
    pub fn new(reject_conflicts: bool) -> Self {
        Self {
            bindings: HashMap::new(),
            reject_conflicts,
        }
    }

    /// Binds `value` under `key`.
    ///
    /// A `One` bind replaces whatever the key held. A `Many` bind appends
    /// to an existing `Many` binding and replaces anything else.
    ///
    /// # Errors
    /// Returns [`RabtError::ConflictingBinding`] when the key is occupied,
    /// the bind would replace it, and the table rejects conflicts.
    pub fn bind(
        &mut self,
        key: BindingKey,
        value: V,
        constraint: BindingConstraint,
    ) -> Result<(), RabtError> {
        if let Some(existing) = self.bindings.get_mut(&key) {
            if appends(existing.constraint, constraint) {
                existing.values.push(value);
                debug!(key = %key, count = existing.values.len(), "Appended binding value");
                return Ok(());
            }

            self.check_conflict(&key, constraint)?;
            debug!(key = %key, %constraint, "Replacing binding");
        } else {
            debug!(key = %key, %constraint, "Bound");
        }

        self.bindings.insert(
            key.clone(),
            Binding {
                key,
                constraint,
                values: vec![value],
            },
        );
        Ok(())
    }

    /// Checks whether binding `key` with `constraint` would be rejected.
    ///
    /// Always passes unless the table rejects conflicts.
    pub fn check_conflict(
        &self,
        key: &BindingKey,
        constraint: BindingConstraint,
    ) -> Result<(), RabtError> {
        match self.bindings.get(key) {
            Some(existing)
                if self.reject_conflicts && !appends(existing.constraint, constraint) =>
            {
                warn!(key = %key, "Rejected conflicting binding");
                Err(RabtError::ConflictingBinding(ConflictingBindingError {
                    key: key.clone(),
                }))
            }
            _ => Ok(()),
        }
    }

    /// Exact lookup, no fallback to the unqualified key.
    pub fn get(&self, key: &BindingKey) -> Option<&Binding<V>> {
        self.bindings.get(key)
    }

    /// Removes the binding for `key`, returning it if there was one.
    pub fn unbind(&mut self, key: &BindingKey) -> Option<Binding<V>> {
        let removed = self.bindings.remove(key);
        if removed.is_some() {
            debug!(key = %key, "Unbound");
        }
        removed
    }

    /// Returns true if `key` is bound.
    pub fn contains(&self, key: &BindingKey) -> bool {
        self.bindings.contains_key(key)
    }

    /// Iterates over all bindings, in no particular order.
    pub fn iter(&self) -> impl Iterator<Item = &Binding<V>> {
        self.bindings.values()
    }

    /// All bound keys.
    pub fn keys(&self) -> impl Iterator<Item = &BindingKey> {
        self.bindings.keys()
    }

    /// Returns the number of bound keys.
    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    /// Returns true if nothing is bound.
    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

fn appends(existing: BindingConstraint, incoming: BindingConstraint) -> bool {
    existing == BindingConstraint::Many && incoming == BindingConstraint::Many
}
