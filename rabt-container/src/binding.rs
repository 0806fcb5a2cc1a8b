//! Injection bindings: what a key resolves to, and the fluent surface that
//! declares it.
//!
//! ```rust,ignore
//! binder.bind::<dyn Simple>()
//!     .bind::<dyn Another>()
//!     .to_singleton::<Polymorphic>()?;
//!
//! binder.bind::<i32>().named("power").as_value(42)?;
//! ```
//!
//! Keys declared in one chain share one source, so the aliases above hand
//! out the same `Polymorphic` instance.

use std::any::{Any, type_name};
use std::fmt;
use std::marker::PhantomData;
use std::sync::Arc;

use once_cell::sync::OnceCell;

use crate::binder::InjectionBinder;
use crate::descriptor::{ErasedValue, Injectable};
use crate::error::{RabtError, Result};
use crate::injector::Injector;
use crate::key::{BindingKey, Qualifier};
use crate::lifetime::{BindingConstraint, Lifetime};
use crate::metadata::TypeMetadataCache;
use crate::table::Binding;

/// A concrete instance with its type erased.
pub type SharedInstance = Arc<dyn Any + Send + Sync>;

/// A binding as stored by the injection binder.
pub type InjectionBinding = Binding<Provision>;

/// Declares that `Self` can be handed out as request type `K`.
///
/// Every type implements itself. Trait-object relationships are declared
/// with [`implements!`](crate::implements).
pub trait Implements<K: ?Sized>: Send + Sync + 'static {
    fn upcast(self: Arc<Self>) -> Arc<K>;
}

impl<T: Send + Sync + 'static> Implements<T> for T {
    fn upcast(self: Arc<Self>) -> Arc<T> {
        self
    }
}

/// Implements [`Implements`] for trait objects.
///
/// ```rust,ignore
/// trait Simple: Send + Sync {}
/// trait Another: Send + Sync {}
/// struct Polymorphic;
/// impl Simple for Polymorphic {}
/// impl Another for Polymorphic {}
///
/// implements!(Polymorphic => dyn Simple, dyn Another);
/// ```
#[macro_export]
macro_rules! implements {
    ($target:ty => $($interface:ty),+ $(,)?) => {
        $(
            impl $crate::Implements<$interface> for $target {
                fn upcast(self: ::std::sync::Arc<Self>) -> ::std::sync::Arc<$interface> {
                    self
                }
            }
        )+
    };
}

type CastFn = fn(SharedInstance) -> Option<ErasedValue>;
type BuildFn = Box<dyn Fn(&mut Injector<'_>) -> Result<SharedInstance> + Send + Sync>;
type DependenciesFn = fn(&TypeMetadataCache) -> Result<Vec<BindingKey>>;

fn cast<V, K>(shared: SharedInstance) -> Option<ErasedValue>
where
    V: Implements<K>,
    K: ?Sized + Send + Sync + 'static,
{
    let concrete: Arc<V> = shared.downcast::<V>().ok()?;
    let upcast: Arc<K> = concrete.upcast();
    Some(Box::new(upcast))
}

fn construct<V: Injectable>(injector: &mut Injector<'_>) -> Result<SharedInstance> {
    let instance = injector.instantiate::<V>()?;
    Ok(Arc::new(instance))
}

fn dependencies_of<V: Injectable>(cache: &TypeMetadataCache) -> Result<Vec<BindingKey>> {
    Ok(cache.describe::<V>()?.dependencies().cloned().collect())
}

/// Type-level list of the keys a builder has accumulated.
///
/// `()` is the empty list; [`Keys`] prepends one request type.
pub trait KeyList<V>: 'static {
    #[doc(hidden)]
    fn collect(keys: &mut Vec<(BindingKey, CastFn)>);
}

/// A request type `K` followed by the keys in `Rest`.
pub struct Keys<K: ?Sized, Rest>(PhantomData<(fn() -> Arc<K>, Rest)>);

impl<V> KeyList<V> for () {
    fn collect(_: &mut Vec<(BindingKey, CastFn)>) {}
}

impl<V, K, Rest> KeyList<V> for Keys<K, Rest>
where
    V: Implements<K>,
    K: ?Sized + Send + Sync + 'static,
    Rest: KeyList<V>,
{
    fn collect(keys: &mut Vec<(BindingKey, CastFn)>) {
        Rest::collect(keys);
        let cast: CastFn = cast::<V, K>;
        keys.push((BindingKey::of::<K>(), cast));
    }
}

enum Target {
    Value(SharedInstance),
    Type {
        build: BuildFn,
        dependencies: DependenciesFn,
    },
    Factory(BuildFn),
}

/// What the aliases of one bind chain share.
struct Source {
    target_name: &'static str,
    lifetime: Lifetime,
    target: Target,
    singleton: OnceCell<SharedInstance>,
}

impl Source {
    fn instance(&self, injector: &mut Injector<'_>) -> Result<SharedInstance> {
        match &self.target {
            Target::Value(value) => Ok(value.clone()),
            Target::Type { build, .. } | Target::Factory(build) => {
                if self.lifetime == Lifetime::Singleton {
                    self.singleton.get_or_try_init(|| build(injector)).cloned()
                } else {
                    build(injector)
                }
            }
        }
    }
}

/// One value of an injection binding.
#[derive(Clone)]
pub struct Provision {
    source: Arc<Source>,
    cast: CastFn,
}

impl Provision {
    /// Name of the concrete type this provision hands out.
    pub fn target_name(&self) -> &'static str {
        self.source.target_name
    }

    pub fn lifetime(&self) -> Lifetime {
        self.source.lifetime
    }

    /// True if both provisions were declared in the same bind chain.
    pub fn shares_source_with(&self, other: &Provision) -> bool {
        Arc::ptr_eq(&self.source, &other.source)
    }

    pub(crate) fn source_id(&self) -> usize {
        Arc::as_ptr(&self.source) as usize
    }

    /// Produces an instance and casts it to `key`'s request type.
    pub(crate) fn provide(&self, injector: &mut Injector<'_>, key: &BindingKey) -> Result<ErasedValue> {
        let shared = self.source.instance(injector)?;
        (self.cast)(shared).ok_or_else(|| RabtError::TypeMismatch {
            key: key.clone(),
            expected: key.type_name(),
        })
    }

    /// Keys building this provision depends on. Factories are opaque.
    pub(crate) fn dependencies(&self, cache: &TypeMetadataCache) -> Result<Vec<BindingKey>> {
        match &self.source.target {
            Target::Type { dependencies, .. } => dependencies(cache),
            Target::Value(_) | Target::Factory(_) => Ok(Vec::new()),
        }
    }
}

impl fmt::Debug for Provision {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Provision")
            .field("target", &self.source.target_name)
            .field("lifetime", &self.source.lifetime)
            .finish()
    }
}

/// Fluent binding declaration, started by [`InjectionBinder::bind`].
///
/// Accumulate aliases with [`bind`](Self::bind), set a qualifier with
/// [`named`](Self::named), then finish with a target.
#[must_use = "nothing is bound until to(), to_singleton(), to_factory(), as_value() or as_shared()"]
pub struct BindingBuilder<'a, L> {
    binder: &'a InjectionBinder,
    qualifier: Option<Qualifier>,
    constraint: BindingConstraint,
    keys: PhantomData<L>,
}

impl<'a, L> BindingBuilder<'a, L> {
    pub(crate) fn new(binder: &'a InjectionBinder) -> Self {
        Self {
            binder,
            qualifier: None,
            constraint: BindingConstraint::One,
            keys: PhantomData,
        }
    }

    /// Adds another request type that shares this binding's target.
    pub fn bind<K: ?Sized + Send + Sync + 'static>(self) -> BindingBuilder<'a, Keys<K, L>> {
        BindingBuilder {
            binder: self.binder,
            qualifier: self.qualifier,
            constraint: self.constraint,
            keys: PhantomData,
        }
    }

    /// Qualifies every key of this binding.
    pub fn named(mut self, qualifier: impl Into<Qualifier>) -> Self {
        self.qualifier = Some(qualifier.into());
        self
    }

    /// Appends to the keys' value sets instead of replacing them.
    pub fn many(mut self) -> Self {
        self.constraint = BindingConstraint::Many;
        self
    }

    /// Binds to type `V`, constructed anew on every resolve.
    pub fn to<V: Injectable>(self) -> Result<()>
    where
        L: KeyList<V>,
    {
        self.finish::<V>(Lifetime::Factory, Self::type_target::<V>())
    }

    /// Binds to type `V`, constructed on first resolve and then shared.
    pub fn to_singleton<V: Injectable>(self) -> Result<()>
    where
        L: KeyList<V>,
    {
        self.finish::<V>(Lifetime::Singleton, Self::type_target::<V>())
    }

    /// Binds to a factory closure, called on every resolve.
    pub fn to_factory<V, F>(self, factory: F) -> Result<()>
    where
        V: Send + Sync + 'static,
        L: KeyList<V>,
        F: Fn(&mut Injector<'_>) -> Result<V> + Send + Sync + 'static,
    {
        let build: BuildFn = Box::new(move |injector| {
            let value = factory(injector)?;
            Ok(Arc::new(value) as SharedInstance)
        });
        self.finish::<V>(Lifetime::Factory, Target::Factory(build))
    }

    /// Binds a stored value. Every resolve returns the same instance.
    pub fn as_value<V: Send + Sync + 'static>(self, value: V) -> Result<()>
    where
        L: KeyList<V>,
    {
        self.as_shared(Arc::new(value))
    }

    /// Binds a stored value the caller already shares.
    pub fn as_shared<V: Send + Sync + 'static>(self, value: Arc<V>) -> Result<()>
    where
        L: KeyList<V>,
    {
        self.finish::<V>(Lifetime::Value, Target::Value(value as SharedInstance))
    }

    fn type_target<V: Injectable>() -> Target {
        Target::Type {
            build: Box::new(construct::<V>),
            dependencies: dependencies_of::<V>,
        }
    }

    fn finish<V>(self, lifetime: Lifetime, target: Target) -> Result<()>
    where
        L: KeyList<V>,
    {
        let mut keys = Vec::new();
        L::collect(&mut keys);

        let source = Arc::new(Source {
            target_name: type_name::<V>(),
            lifetime,
            target,
            singleton: OnceCell::new(),
        });

        let provisions = keys
            .into_iter()
            .map(|(key, cast)| {
                let provision = Provision {
                    source: source.clone(),
                    cast,
                };
                (key.with_qualifier(self.qualifier.clone()), provision)
            })
            .collect();

        self.binder.insert(provisions, self.constraint)
    }
}
