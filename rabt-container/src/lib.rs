//! Core binder and injector for Rabt.

pub mod binder;
pub mod binding;
pub mod descriptor;
pub mod error;
mod graph;
pub mod injector;
pub mod key;
pub mod lifetime;
pub mod metadata;
pub mod module;
pub mod settings;
pub mod table;

pub use binder::{InjectionBinder, prelude};
pub use binding::Implements;
pub use descriptor::{Arguments, Dependency, Injectable, TypeDescriptor};
pub use error::{RabtError, Result};
pub use injector::Injector;
pub use key::{BindingKey, Qualifier};
pub use lifetime::{BindingConstraint, Lifetime};
pub use module::BindingModule;
pub use settings::BinderSettings;
