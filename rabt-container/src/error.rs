//! Error types for binder operations.
//!
//! Errors fall in two families, see [`ErrorKind`]: injection errors are
//! configuration mistakes in the binding table, reflection errors are
//! problems with how a type describes itself.

use std::fmt;

use rabt_support::rendering::{render_chain, shorten_type_name};

use crate::key::BindingKey;

/// Boxed error returned by user factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync>;

/// Main error type for all binder operations.
#[derive(Debug, thiserror::Error)]
pub enum RabtError {
    /// Nothing is bound to the requested key.
    #[error("{}", .0)]
    NullBinding(NullBindingError),

    /// The target type describes no constructor.
    #[error("{}", .0)]
    CannotReflectInterface(CannotReflectError),

    /// A member tagged for injection is not publicly writable.
    #[error("{}", .0)]
    CannotInjectIntoNonPublicSetter(NonPublicSetterError),

    /// A `One` binding already exists and the binder rejects conflicts.
    #[error("{}", .0)]
    ConflictingBinding(ConflictingBindingError),

    /// Resolution re-entered a key that is still being built.
    #[error("{}", .0)]
    CyclicDependency(CyclicDependencyError),

    /// A resolved value did not have the type its injection point expects.
    #[error("Type mismatch while resolving {key}: expected {expected}")]
    TypeMismatch {
        key: BindingKey,
        expected: &'static str,
    },

    /// A constructor or factory reported its own failure.
    #[error("Failed to construct {type_name}: {source}{}", resolving_context(.chain))]
    ConstructionFailed {
        type_name: &'static str,
        /// Keys being resolved when it failed, outermost first
        chain: Vec<BindingKey>,
        #[source]
        source: BoxError,
    },
}

/// Family an error belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Bad, missing or conflicting bindings.
    Injection,
    /// A type cannot be described or wired.
    Reflection,
}

impl RabtError {
    /// Returns which family this error belongs to.
    pub fn kind(&self) -> ErrorKind {
        match self {
            RabtError::CannotReflectInterface(_)
            | RabtError::CannotInjectIntoNonPublicSetter(_) => ErrorKind::Reflection,
            _ => ErrorKind::Injection,
        }
    }

    /// Wraps a factory error.
    pub fn construction(type_name: &'static str, source: impl Into<BoxError>) -> Self {
        RabtError::ConstructionFailed {
            type_name,
            chain: Vec::new(),
            source: source.into(),
        }
    }

    /// Records the keys being resolved when a type could not be built.
    ///
    /// The innermost chain wins: an error that already carries one is
    /// returned unchanged.
    pub(crate) fn while_resolving(mut self, chain: impl FnOnce() -> Vec<BindingKey>) -> Self {
        match &mut self {
            RabtError::CannotReflectInterface(CannotReflectError { chain: recorded, .. })
            | RabtError::CannotInjectIntoNonPublicSetter(NonPublicSetterError {
                chain: recorded,
                ..
            })
            | RabtError::ConstructionFailed {
                chain: recorded, ..
            } if recorded.is_empty() => *recorded = chain(),
            _ => {}
        }
        self
    }

    /// Returns the key this error is about, when there is one.
    pub fn key(&self) -> Option<&BindingKey> {
        match self {
            RabtError::NullBinding(e) => Some(&e.requested),
            RabtError::ConflictingBinding(e) => Some(&e.key),
            RabtError::CyclicDependency(e) => e.chain.last(),
            RabtError::TypeMismatch { key, .. } => Some(key),
            RabtError::CannotReflectInterface(e) => e.chain.last(),
            RabtError::CannotInjectIntoNonPublicSetter(e) => e.chain.last(),
            RabtError::ConstructionFailed { chain, .. } => chain.last(),
        }
    }
}

/// Error when resolution asks for a key with no active binding.
#[derive(Debug)]
pub struct NullBindingError {
    /// The key that was requested
    pub requested: BindingKey,
    /// What required it, when resolved as a dependency
    pub required_by: Option<BindingKey>,
    /// Keys being resolved when the lookup failed, outermost first
    pub chain: Vec<BindingKey>,
    /// Bound keys that look like what was meant
    pub suggestions: Vec<BindingKey>,
}

impl fmt::Display for NullBindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "No binding for {}", self.requested)?;

        if let Some(ref parent) = self.required_by {
            write!(f, "\n  Required by: {parent}")?;
        }

        if !self.chain.is_empty() {
            let keys: Vec<BindingKey> = self
                .chain
                .iter()
                .chain(std::iter::once(&self.requested))
                .cloned()
                .collect();
            write!(f, "{}", resolving_context(&keys))?;
        }

        if !self.suggestions.is_empty() {
            write!(f, "\n  Did you mean one of:")?;
            for suggestion in &self.suggestions {
                write!(f, "\n    - {suggestion}")?;
            }
        }

        write!(
            f,
            "\n  Hint: Did you forget to call .bind::<{}>()?",
            shorten_type_name(self.requested.type_name())
        )
    }
}

/// Error when a type describes no constructor at all.
#[derive(Debug)]
pub struct CannotReflectError {
    pub type_name: &'static str,
    /// Keys being resolved when it surfaced, outermost first
    pub chain: Vec<BindingKey>,
}

impl fmt::Display for CannotReflectError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cannot reflect {}: it describes no constructor",
            self.type_name
        )?;
        write!(f, "{}", resolving_context(&self.chain))?;
        write!(
            f,
            "\n  Hint: Bind an interface to a concrete type, or add a pub fn returning Self"
        )
    }
}

/// Error when a member tagged for injection is not public.
#[derive(Debug)]
pub struct NonPublicSetterError {
    pub type_name: &'static str,
    pub member: &'static str,
    /// Keys being resolved when it surfaced, outermost first
    pub chain: Vec<BindingKey>,
}

impl fmt::Display for NonPublicSetterError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} has a non-public injection setter {}",
            self.type_name, self.member
        )?;
        write!(f, "{}", resolving_context(&self.chain))?;
        write!(f, "\n  Hint: Make the setter pub to allow injection")
    }
}

/// Error when rebinding a `One` key while conflicts are rejected.
#[derive(Debug)]
pub struct ConflictingBindingError {
    pub key: BindingKey,
}

impl fmt::Display for ConflictingBindingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conflicting binding for {}", self.key)?;
        write!(
            f,
            "\n  Hint: Unbind it first, or disable reject_conflicts in the binder settings"
        )
    }
}

/// Error when a dependency chain loops back on itself.
#[derive(Debug)]
pub struct CyclicDependencyError {
    /// The chain that forms the cycle, e.g. `[A, B, A]`.
    pub chain: Vec<BindingKey>,
    /// Set when the depth guard tripped rather than an exact repeat.
    pub depth_exceeded: bool,
}

impl fmt::Display for CyclicDependencyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth_exceeded {
            write!(
                f,
                "Cyclic dependency suspected: resolution exceeded {} levels",
                self.chain.len()
            )?;
        } else {
            write!(f, "Cyclic dependency detected:")?;
        }
        write!(f, "\n  {}", render_keys(&self.chain))?;
        write!(
            f,
            "\n  Hint: Break the cycle with a setter, a factory, or a stored value"
        )
    }
}

/// Renders keys as `Car → Wheel (name=spare)`.
fn render_keys(keys: &[BindingKey]) -> String {
    let names: Vec<String> = keys
        .iter()
        .map(|key| match key.qualifier() {
            Some(qualifier) => format!("{} (name={qualifier})", shorten_type_name(key.type_name())),
            None => shorten_type_name(key.type_name()),
        })
        .collect();
    render_chain(&names)
}

fn resolving_context(chain: &[BindingKey]) -> String {
    if chain.is_empty() {
        return String::new();
    }
    format!("\n  While resolving: {}", render_keys(chain))
}

/// Convenient Result type for binder operations.
pub type Result<T> = std::result::Result<T, RabtError>;
