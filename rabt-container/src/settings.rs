//! Binder configuration.

use serde::Deserialize;

/// Resolution depth beyond which a chain is reported as cyclic.
pub const DEFAULT_MAX_DEPTH: usize = 64;

/// Settings for an [`InjectionBinder`](crate::binder::InjectionBinder).
///
/// Deserializable, so it can live in an application's config file:
///
/// ```toml
/// [binder]
/// reject_conflicts = true
/// max_depth = 32
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BinderSettings {
    /// Fail with `ConflictingBinding` instead of replacing a `One` binding.
    pub reject_conflicts: bool,
    /// Maximum nesting of resolutions.
    pub max_depth: usize,
}

impl Default for BinderSettings {
    fn default() -> Self {
        Self {
            reject_conflicts: false,
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl BinderSettings {
    pub fn reject_conflicts(mut self, reject: bool) -> Self {
        self.reject_conflicts = reject;
        self
    }

    pub fn max_depth(mut self, depth: usize) -> Self {
        self.max_depth = depth;
        self
    }
}
