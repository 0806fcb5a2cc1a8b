//! The injector: resolves keys, constructs types and wires them.
//!
//! One [`Injector`] lives for one top-level resolution. It tracks the chain
//! of keys being resolved so that a dependency cycle is reported as
//! [`RabtError::CyclicDependency`] instead of recursing forever.
//!
//! # Resolution
//! 1. Look up the binding; nothing bound is [`RabtError::NullBinding`].
//! 2. A stored value is returned as is.
//! 3. A type target is described, its constructor parameters resolved
//!    recursively, and the constructor invoked.
//! 4. Setters are resolved and assigned.
//! 5. Post-construct hooks run in priority order.

use std::any::type_name;
use std::sync::Arc;

use tracing::{trace, warn};

use crate::binder::InjectionBinder;
use crate::binding::{InjectionBinding, Provision};
use crate::descriptor::{Arguments, ErasedValue, Injectable};
use crate::error::{CyclicDependencyError, NullBindingError, RabtError, Result};
use crate::key::{BindingKey, Qualifier};
use crate::metadata::TypeMetadata;

struct Frame {
    key: BindingKey,
    source: usize,
    constructs: bool,
}

/// Resolves dependencies against an [`InjectionBinder`].
///
/// Factories receive the injector to resolve what they need:
///
/// ```rust,ignore
/// binder.bind::<Gearbox>().to_factory(|injector| {
///     let ratio: Arc<f64> = injector.get_named::<f64>("ratio")?;
///     Ok(Gearbox::new(*ratio))
/// })?;
/// ```
pub struct Injector<'a> {
    binder: &'a InjectionBinder,
    frames: Vec<Frame>,
}

impl<'a> Injector<'a> {
    pub(crate) fn new(binder: &'a InjectionBinder) -> Self {
        Self {
            binder,
            frames: Vec::new(),
        }
    }

    /// The binder this injector resolves against.
    pub fn binder(&self) -> &'a InjectionBinder {
        self.binder
    }

    /// How many resolutions are currently nested.
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    /// Resolves request type `K`.
    pub fn get<K: ?Sized + Send + Sync + 'static>(&mut self) -> Result<Arc<K>> {
        let key = BindingKey::of::<K>();
        let value = self.resolve_key(&key)?;
        downcast(&key, value)
    }

    /// Resolves request type `K` under `qualifier`.
    pub fn get_named<K: ?Sized + Send + Sync + 'static>(
        &mut self,
        qualifier: impl Into<Qualifier>,
    ) -> Result<Arc<K>> {
        let key = BindingKey::named::<K>(qualifier);
        let value = self.resolve_key(&key)?;
        downcast(&key, value)
    }

    /// Resolves every provision bound to `K`, in bind order.
    pub fn get_all<K: ?Sized + Send + Sync + 'static>(
        &mut self,
        qualifier: Option<&Qualifier>,
    ) -> Result<Vec<Arc<K>>> {
        let key = BindingKey::of::<K>().with_qualifier(qualifier.cloned());
        let binding = self.lookup(&key)?;

        binding
            .values()
            .iter()
            .map(|provision| {
                let value = self.provide(&key, provision)?;
                downcast(&key, value)
            })
            .collect()
    }

    /// Resolves `key` to its erased value, a boxed `Arc<K>`.
    ///
    /// A `Many` binding resolves to its first provision.
    pub fn resolve_key(&mut self, key: &BindingKey) -> Result<ErasedValue> {
        let binding = self.lookup(key)?;
        match binding.value() {
            Some(provision) => self.provide(key, provision),
            None => Err(self.null_binding(key)),
        }
    }

    /// Constructs a `T` through its selected constructor, then wires it.
    ///
    /// `T` itself does not need to be bound.
    pub fn instantiate<T: Injectable>(&mut self) -> Result<T> {
        let metadata = self.binder.reflector().describe::<T>()?;
        let constructor = metadata.constructor();

        let mut values = Vec::with_capacity(constructor.params().len());
        for param in constructor.params() {
            values.push((param.clone(), self.resolve_key(param)?));
        }

        trace!(
            type_name = metadata.type_name(),
            constructor = constructor.name(),
            "Constructing"
        );
        let mut instance = constructor.construct(Arguments::new(metadata.type_name(), values))?;
        self.wire(&metadata, &mut instance)?;
        Ok(instance)
    }

    /// Injects setters and runs post-construct hooks on an existing `T`.
    pub fn inject<T: Injectable>(&mut self, target: &mut T) -> Result<()> {
        let metadata = self.binder.reflector().describe::<T>()?;
        self.wire(&metadata, target)
    }

    fn wire<T>(&mut self, metadata: &TypeMetadata<T>, target: &mut T) -> Result<()> {
        for setter in metadata.setters() {
            let value = self.resolve_key(setter.key())?;
            setter.assign(target, value)?;
            trace!(type_name = metadata.type_name(), setter = setter.name(), "Injected");
        }

        for hook in metadata.post_constructs() {
            trace!(
                type_name = metadata.type_name(),
                hook = hook.name(),
                priority = hook.priority_value(),
                "Running post-construct"
            );
            hook.run(target);
        }

        Ok(())
    }

    fn lookup(&self, key: &BindingKey) -> Result<InjectionBinding> {
        self.binder
            .get_binding_by_key(key)
            .ok_or_else(|| self.null_binding(key))
    }

    fn null_binding(&self, key: &BindingKey) -> RabtError {
        RabtError::NullBinding(NullBindingError {
            requested: key.clone(),
            required_by: self.frames.last().map(|frame| frame.key.clone()),
            chain: self.chain(),
            suggestions: self.binder.suggestions_for(key),
        })
    }

    fn chain(&self) -> Vec<BindingKey> {
        self.frames.iter().map(|frame| frame.key.clone()).collect()
    }

    fn provide(&mut self, key: &BindingKey, provision: &Provision) -> Result<ErasedValue> {
        self.enter(key, provision)?;
        trace!(
            key = %key,
            target = provision.target_name(),
            lifetime = %provision.lifetime(),
            depth = self.frames.len(),
            "Resolving"
        );
        let result = provision
            .provide(self, key)
            .map_err(|error| error.while_resolving(|| self.chain()));
        self.frames.pop();
        result
    }

    fn enter(&mut self, key: &BindingKey, provision: &Provision) -> Result<()> {
        let source = provision.source_id();
        let constructs = provision.lifetime().constructs();

        let repeat = self
            .frames
            .iter()
            .position(|frame| &frame.key == key || (constructs && frame.constructs && frame.source == source));

        if let Some(start) = repeat {
            let mut chain: Vec<BindingKey> = self.frames[start..]
                .iter()
                .map(|frame| frame.key.clone())
                .collect();
            chain.push(key.clone());
            warn!(cycle = ?chain, "Cyclic dependency detected");
            return Err(RabtError::CyclicDependency(CyclicDependencyError {
                chain,
                depth_exceeded: false,
            }));
        }

        if self.frames.len() >= self.binder.settings().max_depth {
            let mut chain = self.chain();
            chain.push(key.clone());
            warn!(depth = self.frames.len(), key = %key, "Resolution depth exceeded");
            return Err(RabtError::CyclicDependency(CyclicDependencyError {
                chain,
                depth_exceeded: true,
            }));
        }

        self.frames.push(Frame {
            key: key.clone(),
            source,
            constructs,
        });
        Ok(())
    }
}

fn downcast<K: ?Sized + Send + Sync + 'static>(key: &BindingKey, value: ErasedValue) -> Result<Arc<K>> {
    value
        .downcast::<Arc<K>>()
        .map(|shared| *shared)
        .map_err(|_| RabtError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<K>(),
        })
}
