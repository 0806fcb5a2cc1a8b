//! Binding lifetimes and value constraints.
//!
//! A provision's [`Lifetime`] determines how long a resolved instance lives:
//! - [`Lifetime::Value`]: a stored instance, handed out unchanged
//! - [`Lifetime::Singleton`]: built on first resolve, then stored
//! - [`Lifetime::Factory`]: a new instance on every resolve
//!
//! A binding's [`BindingConstraint`] determines how many provisions it holds.
use std::fmt;

/// Defines the lifetime of instances handed out by a provision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Lifetime {
    /// A literal instance supplied at bind time.
    ///
    /// Never constructed and never injected; every resolve returns the same
    /// `Arc`.
    Value,

    /// Built once, on first resolve, then kept for as long as the binding
    /// exists. All aliases declared together share the instance.
    Singleton,

    /// Built anew on every resolve.
    Factory,
}

impl Lifetime {
    /// Returns `true` if resolving hands out one shared instance.
    #[inline]
    pub fn is_shared(&self) -> bool {
        matches!(self, Lifetime::Value | Lifetime::Singleton)
    }

    /// Returns `true` if resolving may run a constructor or factory.
    #[inline]
    pub fn constructs(&self) -> bool {
        !matches!(self, Lifetime::Value)
    }
}

impl fmt::Display for Lifetime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Lifetime::Value => write!(f, "Value"),
            Lifetime::Singleton => write!(f, "Singleton"),
            Lifetime::Factory => write!(f, "Factory"),
        }
    }
}

/// How many provisions a binding may hold at once.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub enum BindingConstraint {
    /// Exactly one active provision; rebinding replaces it.
    #[default]
    One,
    /// An ordered set of provisions; rebinding appends.
    Many,
}

impl fmt::Display for BindingConstraint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BindingConstraint::One => write!(f, "One"),
            BindingConstraint::Many => write!(f, "Many"),
        }
    }
}
