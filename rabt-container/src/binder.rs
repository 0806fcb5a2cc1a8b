//! # The Injection Binder
//!
//! The registry that maps request keys to provisions, and the entry point
//! for resolving them.
//!
//! # Architecture
//! ```text
//! bind::<K>()...to::<V>()  ──>  BindingTable<Provision>
//!                                      │
//!                             get_instance::<K>()
//!                                      │
//!                                      ▼
//!                   Injector ──describe::<V>()──> TypeMetadataCache
//! ```
//!
//! # Examples
//! ```rust,ignore
//! let binder = InjectionBinder::new();
//! binder.bind::<i32>().as_value(42)?;
//! binder.bind::<Engine>().to::<Engine>()?;
//!
//! let engine: Arc<Engine> = binder.get_instance()?;
//! ```

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use parking_lot::RwLock;
use rabt_support::rendering::suggest_similar;
use tracing::{debug, info};

use crate::binding::{BindingBuilder, InjectionBinding, Keys, Provision};
use crate::descriptor::Injectable;
use crate::error::Result;
use crate::graph::GraphValidator;
use crate::injector::Injector;
use crate::key::{BindingKey, Qualifier};
use crate::lifetime::BindingConstraint;
use crate::metadata::TypeMetadataCache;
use crate::module::BindingModule;
use crate::settings::BinderSettings;
use crate::table::BindingTable;

const MAX_SUGGESTIONS: usize = 3;

/// Binding registry and resolver.
///
/// Bindings are usually declared up front and resolved many times after.
/// Binding and resolving may interleave from several threads: the table
/// sits behind one reader/writer lock, and resolution does not hold it
/// while constructing.
pub struct InjectionBinder {
    table: RwLock<BindingTable<Provision>>,
    reflector: TypeMetadataCache,
    settings: BinderSettings,
}

impl InjectionBinder {
    /// Creates a binder with default settings.
    pub fn new() -> Self {
        Self::with_settings(BinderSettings::default())
    }

    pub fn with_settings(settings: BinderSettings) -> Self {
        Self {
            table: RwLock::new(BindingTable::new(settings.reject_conflicts)),
            reflector: TypeMetadataCache::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &BinderSettings {
        &self.settings
    }

    /// The per-type metadata cache.
    pub fn reflector(&self) -> &TypeMetadataCache {
        &self.reflector
    }

    // ── Declaration ──

    /// Starts a binding declaration for request type `K`.
    pub fn bind<K: ?Sized + Send + Sync + 'static>(&self) -> BindingBuilder<'_, Keys<K, ()>> {
        BindingBuilder::new(self)
    }

    /// Runs a [`BindingModule`] against this binder.
    pub fn install(&self, module: &dyn BindingModule) -> Result<()> {
        debug!(module = module.name(), "Installing binding module");
        module.configure(self)
    }

    /// Removes the binding for `K` under `qualifier`.
    ///
    /// Returns `true` if something was bound.
    pub fn unbind<K: ?Sized + 'static>(&self, qualifier: Option<&Qualifier>) -> bool {
        self.unbind_key(&BindingKey::of::<K>().with_qualifier(qualifier.cloned()))
    }

    pub fn unbind_key(&self, key: &BindingKey) -> bool {
        self.table.write().unbind(key).is_some()
    }

    /// Inserts all keys of one bind chain, or none of them.
    pub(crate) fn insert(
        &self,
        provisions: Vec<(BindingKey, Provision)>,
        constraint: BindingConstraint,
    ) -> Result<()> {
        let mut table = self.table.write();

        if self.settings.reject_conflicts {
            for (key, _) in &provisions {
                table.check_conflict(key, constraint)?;
            }
        }

        for (key, provision) in provisions {
            table.bind(key, provision, constraint)?;
        }
        Ok(())
    }

    // ── Lookup ──

    /// Exact lookup of the binding for `K` under `qualifier`.
    pub fn get_binding<K: ?Sized + 'static>(
        &self,
        qualifier: Option<&Qualifier>,
    ) -> Option<InjectionBinding> {
        self.get_binding_by_key(&BindingKey::of::<K>().with_qualifier(qualifier.cloned()))
    }

    pub fn get_binding_by_key(&self, key: &BindingKey) -> Option<InjectionBinding> {
        self.table.read().get(key).cloned()
    }

    /// Returns the number of bound keys.
    pub fn len(&self) -> usize {
        self.table.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.read().is_empty()
    }

    /// All bound keys.
    pub fn keys(&self) -> Vec<BindingKey> {
        self.table.read().keys().cloned().collect()
    }

    /// Bound keys that look like what `key` meant: the same type under
    /// another qualifier first, then similarly named types.
    pub(crate) fn suggestions_for(&self, key: &BindingKey) -> Vec<BindingKey> {
        let table = self.table.read();

        let mut suggestions: Vec<BindingKey> = table
            .keys()
            .filter(|k| k.type_id() == key.type_id() && *k != key)
            .cloned()
            .collect();

        let similar = suggest_similar(
            key.type_name(),
            table
                .keys()
                .filter(|k| k.type_id() != key.type_id())
                .map(BindingKey::type_name),
            MAX_SUGGESTIONS,
        );
        suggestions.extend(
            table
                .keys()
                .filter(|k| similar.contains(&k.type_name()))
                .cloned(),
        );

        suggestions.truncate(MAX_SUGGESTIONS);
        suggestions
    }

    // ── Resolution ──

    /// A fresh injector, for resolving several keys in one chain.
    pub fn injector(&self) -> Injector<'_> {
        Injector::new(self)
    }

    /// Resolves request type `K`.
    ///
    /// ```rust,ignore
    /// let engine: Arc<Engine> = binder.get_instance()?;
    /// let vehicle: Arc<dyn Vehicle> = binder.get_instance()?;
    /// ```
    pub fn get_instance<K: ?Sized + Send + Sync + 'static>(&self) -> Result<Arc<K>> {
        self.injector().get::<K>()
    }

    /// Resolves request type `K` under `qualifier`.
    pub fn get_instance_named<K: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: impl Into<Qualifier>,
    ) -> Result<Arc<K>> {
        self.injector().get_named::<K>(qualifier)
    }

    /// Resolves every provision of a `Many` binding, in bind order.
    pub fn get_all<K: ?Sized + Send + Sync + 'static>(
        &self,
        qualifier: Option<&Qualifier>,
    ) -> Result<Vec<Arc<K>>> {
        self.injector().get_all::<K>(qualifier)
    }

    /// Injects setters and runs post-construct hooks on an instance the
    /// caller constructed itself.
    pub fn inject<T: Injectable>(&self, target: &mut T) -> Result<()> {
        self.injector().inject(target)
    }

    /// Computes metadata for `T` ahead of its first resolution.
    pub fn reflect<T: Injectable>(&self) -> Result<()> {
        self.reflector.describe::<T>().map(|_| ())
    }

    /// Checks every binding's dependencies without constructing anything.
    ///
    /// # Errors
    /// The first unbound dependency, cycle, or reflection error found.
    pub fn validate(&self) -> Result<()> {
        let bindings: Vec<InjectionBinding> = self.table.read().iter().cloned().collect();
        info!(bindings = bindings.len(), "Validating binder");

        let mut edges: HashMap<BindingKey, Vec<BindingKey>> = HashMap::with_capacity(bindings.len());
        for binding in &bindings {
            let mut dependencies = Vec::new();
            for provision in binding.values() {
                let keys = provision
                    .dependencies(&self.reflector)
                    .map_err(|error| error.while_resolving(|| vec![binding.key().clone()]))?;
                dependencies.extend(keys);
            }
            edges.insert(binding.key().clone(), dependencies);
        }

        let suggest = |key: &BindingKey| self.suggestions_for(key);
        GraphValidator::new(edges, &suggest).validate()?;

        info!("Binder validated");
        Ok(())
    }
}

impl Default for InjectionBinder {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for InjectionBinder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InjectionBinder")
            .field("bound", &self.len())
            .field("reflected", &self.reflector.len())
            .field("settings", &self.settings)
            .finish()
    }
}

// ═══════════════════════════════════════════
// Prelude
// ═══════════════════════════════════════════

pub mod prelude {
    pub use super::InjectionBinder;
    pub use crate::binding::{Implements, InjectionBinding, Provision};
    pub use crate::descriptor::{Arguments, Dependency, Injectable, TypeDescriptor};
    pub use crate::error::{ErrorKind, RabtError, Result};
    pub use crate::implements;
    pub use crate::injector::Injector;
    pub use crate::key::{BindingKey, Qualifier};
    pub use crate::lifetime::{BindingConstraint, Lifetime};
    pub use crate::module::BindingModule;
    pub use crate::settings::BinderSettings;
}

// ═══════════════════════════════════════════
// Tests
// ═══════════════════════════════════════════

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::TypeDescriptor;
    use crate::error::RabtError;
    use crate::lifetime::Lifetime;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn init_tracing() {
        let _ = tracing_subscriber::fmt()
            .with_env_filter("rabt_container=trace")
            .with_test_writer()
            .try_init();
    }

    // === Types for tests ===

    #[derive(Debug)]
    struct Engine {
        power: i32,
        fuel: Option<Arc<String>>,
        log: Vec<&'static str>,
    }

    impl Injectable for Engine {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new").param::<i32>().invoke(|args| {
                Ok(Engine {
                    power: args.next()?,
                    fuel: None,
                    log: Vec::new(),
                })
            });
            ty.setter("set_fuel", |engine: &mut Engine, fuel: Arc<String>| {
                engine.log.push("fuel");
                engine.fuel = Some(fuel);
            });
            ty.post_construct("ignite", |engine: &mut Engine| engine.log.push("ignite"))
                .priority(5);
            ty.post_construct("check", |engine: &mut Engine| engine.log.push("check"))
                .priority(1);
        }
    }

    static GUARANTEED_UNIQUE: AtomicUsize = AtomicUsize::new(0);

    struct Unique {
        uid: usize,
    }

    impl Injectable for Unique {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new").invoke(|_| {
                Ok(Unique {
                    uid: GUARANTEED_UNIQUE.fetch_add(1, Ordering::SeqCst),
                })
            });
        }
    }

    #[derive(Debug)]
    struct Chicken;
    #[derive(Debug)]
    struct Egg;

    impl Injectable for Chicken {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new").param::<Arc<Egg>>().invoke(|args| {
                let _egg: Arc<Egg> = args.next()?;
                Ok(Chicken)
            });
        }
    }

    impl Injectable for Egg {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new").param::<Arc<Chicken>>().invoke(|args| {
                let _chicken: Arc<Chicken> = args.next()?;
                Ok(Egg)
            });
        }
    }

    struct Hidden;

    impl Injectable for Hidden {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new").invoke(|_| Ok(Hidden));
            ty.setter("set_secret", |_: &mut Hidden, _: i32| {}).non_public();
        }
    }

    #[derive(Debug)]
    struct Pump {
        rate: u16,
    }

    impl Injectable for Pump {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new")
                .named_param::<u16>("rate")
                .invoke(|args| Ok(Pump { rate: args.next()? }));
        }
    }

    struct Sealed;

    impl Injectable for Sealed {
        fn describe(_: &mut TypeDescriptor<Self>) {}
    }

    #[derive(Debug)]
    struct Car;

    impl Injectable for Car {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new")
                .named_param::<Arc<Sealed>>("spare")
                .invoke(|args| {
                    let _spare: Arc<Sealed> = args.next()?;
                    Ok(Car)
                });
        }
    }

    fn engine_binder() -> InjectionBinder {
        let binder = InjectionBinder::new();
        binder.bind::<Engine>().to::<Engine>().unwrap();
        binder.bind::<i32>().as_value(42).unwrap();
        binder.bind::<String>().as_value(String::from("diesel")).unwrap();
        binder
    }

    #[test]
    fn resolve_with_constructor_setter_and_hooks() {
        init_tracing();
        let binder = engine_binder();

        let engine: Arc<Engine> = binder.get_instance().unwrap();
        assert_eq!(engine.power, 42);
        assert_eq!(engine.fuel.as_deref().map(String::as_str), Some("diesel"));
        assert_eq!(engine.log, vec!["fuel", "check", "ignite"]);
    }

    #[test]
    fn unbound_key_is_null_binding() {
        let binder = InjectionBinder::new();

        match binder.get_instance::<i32>() {
            Err(RabtError::NullBinding(e)) => {
                assert_eq!(e.requested, BindingKey::of::<i32>());
                assert!(e.required_by.is_none());
            }
            other => panic!("Expected NullBinding, got: {other:?}"),
        }
    }

    #[test]
    fn missing_dependency_names_consumer() {
        let binder = InjectionBinder::new();
        binder.bind::<Engine>().to::<Engine>().unwrap();

        match binder.get_instance::<Engine>() {
            Err(RabtError::NullBinding(e)) => {
                assert_eq!(e.requested, BindingKey::of::<i32>());
                assert_eq!(e.required_by, Some(BindingKey::of::<Engine>()));
                assert_eq!(e.chain, vec![BindingKey::of::<Engine>()]);
            }
            other => panic!("Expected NullBinding, got: {other:?}"),
        }
    }

    #[test]
    fn unbind_then_resolve_fails() {
        let binder = engine_binder();
        assert!(binder.get_instance::<Engine>().is_ok());

        assert!(binder.unbind::<i32>(None));
        assert!(binder.get_binding::<i32>(None).is_none());
        assert!(matches!(
            binder.get_instance::<Engine>(),
            Err(RabtError::NullBinding(_))
        ));
    }

    #[test]
    fn factory_binding_builds_distinct_instances() {
        let binder = InjectionBinder::new();
        binder.bind::<Unique>().to::<Unique>().unwrap();

        let a: Arc<Unique> = binder.get_instance().unwrap();
        let b: Arc<Unique> = binder.get_instance().unwrap();
        assert!(!Arc::ptr_eq(&a, &b));
        assert_ne!(a.uid, b.uid);
    }

    #[test]
    fn singleton_binding_builds_once() {
        let binder = InjectionBinder::new();
        binder.bind::<Unique>().to_singleton::<Unique>().unwrap();

        let a: Arc<Unique> = binder.get_instance().unwrap();
        let b: Arc<Unique> = binder.get_instance().unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(
            binder.get_binding::<Unique>(None).unwrap().value().unwrap().lifetime(),
            Lifetime::Singleton
        );
    }

    #[test]
    fn stored_value_keeps_identity() {
        let binder = InjectionBinder::new();
        let shared = Arc::new(Unique { uid: usize::MAX });
        binder.bind::<Unique>().as_shared(shared.clone()).unwrap();

        let a: Arc<Unique> = binder.get_instance().unwrap();
        let b: Arc<Unique> = binder.get_instance().unwrap();
        assert!(Arc::ptr_eq(&a, &shared));
        assert!(Arc::ptr_eq(&a, &b));
    }

    #[test]
    fn qualifier_is_part_of_the_key() {
        let binder = InjectionBinder::new();
        binder.bind::<i32>().named("power").as_value(300).unwrap();

        assert_eq!(*binder.get_instance_named::<i32>("power").unwrap(), 300);
        match binder.get_instance::<i32>() {
            Err(RabtError::NullBinding(e)) => {
                assert_eq!(e.suggestions, vec![BindingKey::named::<i32>("power")]);
            }
            other => panic!("Expected NullBinding, got: {other:?}"),
        }

        binder.bind::<u8>().as_value(1u8).unwrap();
        assert!(binder.get_instance_named::<u8>("power").is_err());
    }

    #[test]
    fn owned_name_satisfies_literal_qualifier() {
        let binder = InjectionBinder::new();
        binder.bind::<Pump>().to::<Pump>().unwrap();
        binder
            .bind::<u16>()
            .named(String::from("rate"))
            .as_value(7u16)
            .unwrap();

        let pump: Arc<Pump> = binder.get_instance().unwrap();
        assert_eq!(pump.rate, 7);
        assert_eq!(*binder.get_instance_named::<u16>("rate").unwrap(), 7);
    }

    #[test]
    fn nested_reflection_failure_keeps_key_and_chain() {
        let binder = InjectionBinder::new();
        binder.bind::<Car>().to::<Car>().unwrap();
        binder.bind::<Sealed>().named("spare").to::<Sealed>().unwrap();

        match binder.get_instance::<Car>() {
            Err(err @ RabtError::CannotReflectInterface(_)) => {
                assert_eq!(err.key(), Some(&BindingKey::named::<Sealed>("spare")));
                let msg = err.to_string();
                assert!(msg.contains("Car → Sealed (name=spare)"), "{msg}");
                if let RabtError::CannotReflectInterface(e) = err {
                    assert_eq!(
                        e.chain,
                        vec![BindingKey::of::<Car>(), BindingKey::named::<Sealed>("spare")]
                    );
                }
            }
            other => panic!("Expected CannotReflectInterface, got: {other:?}"),
        }

        match binder.validate() {
            Err(err @ RabtError::CannotReflectInterface(_)) => {
                assert_eq!(err.key(), Some(&BindingKey::named::<Sealed>("spare")));
            }
            other => panic!("Expected CannotReflectInterface, got: {other:?}"),
        }
    }

    #[test]
    fn nested_factory_failure_keeps_chain() {
        let binder = InjectionBinder::new();
        binder.bind::<Pump>().to::<Pump>().unwrap();
        binder
            .bind::<u16>()
            .named("rate")
            .to_factory(|_| Err::<u16, _>(RabtError::construction("u16", "sensor offline")))
            .unwrap();

        match binder.get_instance::<Pump>() {
            Err(RabtError::ConstructionFailed { chain, source, .. }) => {
                assert_eq!(
                    chain,
                    vec![BindingKey::of::<Pump>(), BindingKey::named::<u16>("rate")]
                );
                assert_eq!(source.to_string(), "sensor offline");
            }
            other => panic!("Expected ConstructionFailed, got: {other:?}"),
        }
    }

    #[test]
    fn rebinding_one_replaces() {
        let binder = InjectionBinder::new();
        binder.bind::<i32>().as_value(1).unwrap();
        binder.bind::<i32>().as_value(2).unwrap();

        assert_eq!(*binder.get_instance::<i32>().unwrap(), 2);
        assert_eq!(binder.len(), 1);
    }

    #[test]
    fn strict_binder_rejects_conflicts() {
        let binder = InjectionBinder::with_settings(BinderSettings::default().reject_conflicts(true));
        binder.bind::<i32>().as_value(1).unwrap();

        assert!(matches!(
            binder.bind::<i32>().as_value(2),
            Err(RabtError::ConflictingBinding(_))
        ));
        assert_eq!(*binder.get_instance::<i32>().unwrap(), 1);
    }

    trait Wheel: Send + Sync {}
    trait Tire: Send + Sync {}

    struct Both;
    impl Wheel for Both {}
    impl Tire for Both {}
    crate::implements!(Both => dyn Wheel, dyn Tire);

    impl Injectable for Both {
        fn describe(ty: &mut TypeDescriptor<Self>) {
            ty.constructor("new").invoke(|_| Ok(Both));
        }
    }

    #[test]
    fn strict_alias_chain_is_all_or_nothing() {
        let binder = InjectionBinder::with_settings(BinderSettings::default().reject_conflicts(true));
        binder.bind::<dyn Tire>().as_value(Both).unwrap();

        // dyn Wheel is free, dyn Tire conflicts: neither gets bound
        assert!(binder.bind::<dyn Wheel>().bind::<dyn Tire>().to::<Both>().is_err());
        assert!(binder.get_binding::<dyn Wheel>(None).is_none());
        assert_eq!(binder.len(), 1);
    }

    #[test]
    fn many_binding_resolves_all_in_order() {
        let binder = InjectionBinder::new();
        binder.bind::<String>().many().as_value(String::from("a")).unwrap();
        binder.bind::<String>().many().as_value(String::from("b")).unwrap();
        binder.bind::<String>().many().as_value(String::from("c")).unwrap();

        let all: Vec<String> = binder
            .get_all::<String>(None)
            .unwrap()
            .iter()
            .map(|s| s.to_string())
            .collect();
        assert_eq!(all, vec!["a", "b", "c"]);
        assert_eq!(binder.get_instance::<String>().unwrap().as_str(), "a");
    }

    #[test]
    fn factory_closure_resolves_dependencies() {
        let binder = InjectionBinder::new();
        binder.bind::<i32>().named("base").as_value(40).unwrap();
        binder
            .bind::<i64>()
            .to_factory(|injector| {
                let base = injector.get_named::<i32>("base")?;
                Ok(i64::from(*base) + 2)
            })
            .unwrap();

        assert_eq!(*binder.get_instance::<i64>().unwrap(), 42);
    }

    #[test]
    fn factory_errors_propagate() {
        let binder = InjectionBinder::new();
        binder
            .bind::<i64>()
            .to_factory(|_| Err::<i64, _>(RabtError::construction("i64", "out of range")))
            .unwrap();

        assert!(matches!(
            binder.get_instance::<i64>(),
            Err(RabtError::ConstructionFailed { .. })
        ));
    }

    #[test]
    fn constructor_cycle_is_detected() {
        init_tracing();
        let binder = InjectionBinder::new();
        binder.bind::<Chicken>().to::<Chicken>().unwrap();
        binder.bind::<Egg>().to::<Egg>().unwrap();

        match binder.get_instance::<Chicken>() {
            Err(RabtError::CyclicDependency(e)) => {
                assert_eq!(
                    e.chain,
                    vec![
                        BindingKey::of::<Chicken>(),
                        BindingKey::of::<Egg>(),
                        BindingKey::of::<Chicken>(),
                    ]
                );
                assert!(!e.depth_exceeded);
            }
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn singleton_cycle_does_not_deadlock() {
        let binder = InjectionBinder::new();
        binder.bind::<Chicken>().to_singleton::<Chicken>().unwrap();
        binder.bind::<Egg>().to_singleton::<Egg>().unwrap();

        assert!(matches!(
            binder.get_instance::<Egg>(),
            Err(RabtError::CyclicDependency(_))
        ));
    }

    #[test]
    fn depth_guard_trips() {
        let binder = InjectionBinder::with_settings(BinderSettings::default().max_depth(1));
        binder.bind::<Engine>().to::<Engine>().unwrap();
        binder.bind::<i32>().as_value(1).unwrap();

        match binder.get_instance::<Engine>() {
            Err(RabtError::CyclicDependency(e)) => assert!(e.depth_exceeded),
            other => panic!("Expected CyclicDependency, got: {other:?}"),
        }
    }

    #[test]
    fn inject_wires_existing_instance() {
        let binder = engine_binder();
        let mut engine = Engine {
            power: 7,
            fuel: None,
            log: Vec::new(),
        };

        binder.inject(&mut engine).unwrap();
        assert_eq!(engine.power, 7);
        assert!(engine.fuel.is_some());
        assert_eq!(engine.log, vec!["fuel", "check", "ignite"]);
    }

    #[test]
    fn non_public_setter_fails_before_construction() {
        let binder = InjectionBinder::new();
        binder.bind::<Hidden>().to::<Hidden>().unwrap();
        binder.bind::<i32>().as_value(1).unwrap();

        assert!(matches!(
            binder.get_instance::<Hidden>(),
            Err(RabtError::CannotInjectIntoNonPublicSetter(_))
        ));
        assert!(matches!(
            binder.validate(),
            Err(RabtError::CannotInjectIntoNonPublicSetter(_))
        ));
    }

    #[test]
    fn reflect_warms_the_cache() {
        let binder = InjectionBinder::new();
        binder.reflect::<Engine>().unwrap();

        assert!(binder.reflector().contains::<Engine>());
        assert!(binder.reflector().describe::<Engine>().unwrap().is_pregenerated());
    }

    #[test]
    fn validate_reports_missing_and_cycles() {
        let binder = engine_binder();
        assert!(binder.validate().is_ok());

        binder.unbind::<String>(None);
        match binder.validate() {
            Err(RabtError::NullBinding(e)) => {
                assert_eq!(e.requested, BindingKey::of::<String>());
                assert_eq!(e.required_by, Some(BindingKey::of::<Engine>()));
            }
            other => panic!("Expected NullBinding, got: {other:?}"),
        }

        let binder = InjectionBinder::new();
        binder.bind::<Chicken>().to::<Chicken>().unwrap();
        binder.bind::<Egg>().to::<Egg>().unwrap();
        assert!(matches!(
            binder.validate(),
            Err(RabtError::CyclicDependency(_))
        ));
    }

    #[test]
    fn concurrent_singleton_resolution_builds_once() {
        let binder = Arc::new(InjectionBinder::new());
        binder.bind::<Unique>().to_singleton::<Unique>().unwrap();

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let binder = binder.clone();
                std::thread::spawn(move || binder.get_instance::<Unique>().unwrap())
            })
            .collect();

        let instances: Vec<Arc<Unique>> = handles.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(instances.windows(2).all(|w| Arc::ptr_eq(&w[0], &w[1])));
    }

    #[test]
    fn binder_is_send_and_sync() {
        fn assert_send_sync<T: Send + Sync>() {}
        assert_send_sync::<InjectionBinder>();
    }

    #[test]
    fn debug_display() {
        let binder = engine_binder();
        let debug = format!("{binder:?}");
        assert!(debug.contains("InjectionBinder"));
        assert!(debug.contains("bound: 3"));
    }
}
