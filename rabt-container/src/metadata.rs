//! Type metadata: the memoized answer to "how is this type built?".
//!
//! [`TypeMetadataCache::describe`] runs a type's [`Injectable::describe`]
//! once, selects the constructor, validates the setters and orders the
//! post-construct hooks. The result is immutable and shared.
//!
//! # Constructor selection
//! 1. A single constructor is used unconditionally.
//! 2. Otherwise the first constructor tagged as designated.
//! 3. Otherwise the one with the fewest parameters, first declared wins ties.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;

use dashmap::DashMap;
use once_cell::sync::OnceCell;
use tracing::{debug, trace};

use crate::descriptor::{
    ConstructorDescriptor, Injectable, PostConstructDescriptor, SetterDescriptor, TypeDescriptor,
};
use crate::error::{CannotReflectError, NonPublicSetterError, RabtError, Result};
use crate::key::BindingKey;

/// How to construct and wire `T`, computed once.
pub struct TypeMetadata<T> {
    type_name: &'static str,
    constructor: ConstructorDescriptor<T>,
    setters: Vec<SetterDescriptor<T>>,
    post_constructs: Vec<PostConstructDescriptor<T>>,
}

impl<T: Injectable> TypeMetadata<T> {
    fn compute() -> Result<Self> {
        let mut descriptor = TypeDescriptor::new();
        T::describe(&mut descriptor);

        let TypeDescriptor {
            constructors,
            setters,
            mut post_constructs,
        } = descriptor;

        let constructor = select_constructor(constructors).ok_or_else(|| {
            RabtError::CannotReflectInterface(CannotReflectError {
                type_name: type_name::<T>(),
                chain: Vec::new(),
            })
        })?;

        // stable: equal priorities keep declaration order
        post_constructs.sort_by_key(|hook| hook.priority_value());

        if let Some(setter) = setters.iter().find(|setter| !setter.is_public()) {
            return Err(RabtError::CannotInjectIntoNonPublicSetter(
                NonPublicSetterError {
                    type_name: type_name::<T>(),
                    member: setter.name(),
                    chain: Vec::new(),
                },
            ));
        }

        Ok(Self {
            type_name: type_name::<T>(),
            constructor,
            setters,
            post_constructs,
        })
    }
}

impl<T> TypeMetadata<T> {
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// The selected constructor.
    pub fn constructor(&self) -> &ConstructorDescriptor<T> {
        &self.constructor
    }

    /// Keys of the selected constructor's parameters.
    pub fn constructor_params(&self) -> &[BindingKey] {
        self.constructor.params()
    }

    /// Injection setters, in declaration order.
    pub fn setters(&self) -> &[SetterDescriptor<T>] {
        &self.setters
    }

    /// Post-construct hooks, in the order they run.
    pub fn post_constructs(&self) -> &[PostConstructDescriptor<T>] {
        &self.post_constructs
    }

    /// Every key resolving `T` needs: constructor params, then setters.
    pub fn dependencies(&self) -> impl Iterator<Item = &BindingKey> {
        self.constructor
            .params()
            .iter()
            .chain(self.setters.iter().map(SetterDescriptor::key))
    }
}

impl<T> fmt::Debug for TypeMetadata<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadata")
            .field("type_name", &self.type_name)
            .field("constructor", &self.constructor)
            .field("setters", &self.setters)
            .field("post_constructs", &self.post_constructs)
            .finish()
    }
}

fn select_constructor<T>(
    mut constructors: Vec<ConstructorDescriptor<T>>,
) -> Option<ConstructorDescriptor<T>> {
    if constructors.len() == 1 {
        return constructors.pop();
    }

    let index = constructors
        .iter()
        .position(ConstructorDescriptor::is_designated)
        .or_else(|| {
            constructors
                .iter()
                .enumerate()
                .min_by_key(|(_, constructor)| constructor.params().len())
                .map(|(index, _)| index)
        })?;

    Some(constructors.swap_remove(index))
}

/// Metadata handed out by the cache.
pub struct CachedMetadata<T> {
    metadata: Arc<TypeMetadata<T>>,
    pregenerated: bool,
}

impl<T> CachedMetadata<T> {
    /// `true` when this lookup was a cache hit rather than a fresh computation.
    pub fn is_pregenerated(&self) -> bool {
        self.pregenerated
    }

    pub fn shared(&self) -> Arc<TypeMetadata<T>> {
        self.metadata.clone()
    }
}

impl<T> Deref for CachedMetadata<T> {
    type Target = TypeMetadata<T>;

    fn deref(&self) -> &TypeMetadata<T> {
        &self.metadata
    }
}

type MetadataCell = Arc<OnceCell<Arc<dyn Any + Send + Sync>>>;

/// Per-type metadata cache.
///
/// Each type gets its own compute-once cell, so concurrent first lookups of
/// the same type compute its metadata once while other types proceed.
/// Failed computations are not cached.
#[derive(Default)]
pub struct TypeMetadataCache {
    entries: DashMap<TypeId, MetadataCell>,
}

impl TypeMetadataCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the metadata for `T`, computing it on first use.
    ///
    /// # Errors
    /// - [`RabtError::CannotReflectInterface`]: `T` describes no constructor
    /// - [`RabtError::CannotInjectIntoNonPublicSetter`]: a setter is not public
    pub fn describe<T: Injectable>(&self) -> Result<CachedMetadata<T>> {
        let cell: MetadataCell = self.entries.entry(TypeId::of::<T>()).or_default().clone();

        let mut computed = false;
        let erased = cell
            .get_or_try_init(|| {
                computed = true;
                let metadata = TypeMetadata::<T>::compute()?;
                debug!(
                    type_name = metadata.type_name(),
                    constructor = metadata.constructor().name(),
                    params = metadata.constructor_params().len(),
                    setters = metadata.setters().len(),
                    post_constructs = metadata.post_constructs().len(),
                    "Reflected type"
                );
                Ok::<_, RabtError>(Arc::new(metadata) as Arc<dyn Any + Send + Sync>)
            })?
            .clone();

        let metadata = erased
            .downcast::<TypeMetadata<T>>()
            .map_err(|_| RabtError::TypeMismatch {
                key: BindingKey::of::<T>(),
                expected: type_name::<TypeMetadata<T>>(),
            })?;

        if !computed {
            trace!(type_name = metadata.type_name(), "Metadata cache hit");
        }

        Ok(CachedMetadata {
            metadata,
            pregenerated: !computed,
        })
    }

    /// Returns true if metadata for `T` has been computed.
    pub fn contains<T: 'static>(&self) -> bool {
        self.entries
            .get(&TypeId::of::<T>())
            .is_some_and(|cell| cell.value().get().is_some())
    }

    /// Number of types with computed metadata.
    pub fn len(&self) -> usize {
        self.entries.iter().filter(|entry| entry.value().get().is_some()).count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for TypeMetadataCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TypeMetadataCache")
            .field("reflected", &self.len())
            .finish()
    }
}
