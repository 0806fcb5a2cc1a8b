//! Type descriptors: how a type tells the binder to build and wire it.
//!
//! Rust has no runtime reflection, so each injectable type registers its
//! constructors, injection setters and post-construct hooks explicitly in
//! [`Injectable::describe`]. The `#[injectable]` attribute writes that
//! function from an annotated `impl` block; it can also be written by hand:
//!
//! ```rust,ignore
//! impl Injectable for Engine {
//!     fn describe(ty: &mut TypeDescriptor<Self>) {
//!         ty.constructor("new")
//!             .param::<i32>()
//!             .invoke(|args| Ok(Engine::new(args.next()?)));
//!         ty.setter("set_fuel", |engine: &mut Engine, fuel: Arc<Fuel>| engine.set_fuel(fuel))
//!             .named("diesel");
//!         ty.post_construct("warm_up", |engine: &mut Engine| engine.warm_up())
//!             .priority(1);
//!     }
//! }
//! ```

use std::any::{Any, type_name};
use std::fmt;
use std::sync::Arc;

use crate::error::{RabtError, Result};
use crate::key::{BindingKey, Qualifier};

/// A resolved dependency with its type erased: a boxed `Arc<K>`.
pub type ErasedValue = Box<dyn Any + Send + Sync>;

type ConstructFn<T> = Box<dyn Fn(&mut Arguments) -> Result<T> + Send + Sync>;
type AssignFn<T> = Box<dyn Fn(&mut T, &BindingKey, ErasedValue) -> Result<()> + Send + Sync>;
type HookFn<T> = Box<dyn Fn(&mut T) + Send + Sync>;

/// A type the binder can construct and wire.
pub trait Injectable: Sized + Send + Sync + 'static {
    /// Registers constructors, setters and post-construct hooks.
    ///
    /// Called at most once per type and binder; the result is cached.
    fn describe(ty: &mut TypeDescriptor<Self>);
}

/// Something an injection point can receive.
///
/// Every binding hands out `Arc<K>`. Injection points typed `Arc<K>` take it
/// as is; plain value types such as `i32` or `String` are cloned out of it.
pub trait Dependency: Sized + 'static {
    /// Request type this dependency is looked up by.
    type Key: ?Sized + Send + Sync + 'static;

    fn from_shared(shared: Arc<Self::Key>) -> Self;
}

impl<T: ?Sized + Send + Sync + 'static> Dependency for Arc<T> {
    type Key = T;

    fn from_shared(shared: Arc<T>) -> Self {
        shared
    }
}

macro_rules! cloned_dependency {
    ($($ty:ty),* $(,)?) => {
        $(
            impl Dependency for $ty {
                type Key = $ty;

                fn from_shared(shared: Arc<$ty>) -> Self {
                    (*shared).clone()
                }
            }
        )*
    };
}

cloned_dependency!(
    bool, char, i8, i16, i32, i64, i128, isize, u8, u16, u32, u64, u128, usize, f32, f64,
    String, &'static str,
);

/// Downcasts an erased value into the dependency type `D`.
pub(crate) fn downcast_dependency<D: Dependency>(key: &BindingKey, value: ErasedValue) -> Result<D> {
    value
        .downcast::<Arc<D::Key>>()
        .map(|shared| D::from_shared(*shared))
        .map_err(|_| RabtError::TypeMismatch {
            key: key.clone(),
            expected: type_name::<D::Key>(),
        })
}

/// Resolved constructor arguments, handed out in declaration order.
pub struct Arguments {
    type_name: &'static str,
    values: std::vec::IntoIter<(BindingKey, ErasedValue)>,
}

impl Arguments {
    pub(crate) fn new(type_name: &'static str, values: Vec<(BindingKey, ErasedValue)>) -> Self {
        Self {
            type_name,
            values: values.into_iter(),
        }
    }

    /// Takes the next argument.
    ///
    /// # Errors
    /// Fails if the constructor reads more arguments than it declared, or
    /// reads one as a different type than declared.
    #[allow(clippy::should_implement_trait)]
    pub fn next<D: Dependency>(&mut self) -> Result<D> {
        let (key, value) = self.values.next().ok_or_else(|| {
            RabtError::construction(
                self.type_name,
                "constructor read more arguments than it declared",
            )
        })?;
        downcast_dependency(&key, value)
    }

    /// Number of arguments not taken yet.
    pub fn remaining(&self) -> usize {
        self.values.len()
    }
}

/// One way of constructing `T`.
pub struct ConstructorDescriptor<T> {
    name: &'static str,
    params: Vec<BindingKey>,
    designated: bool,
    construct: ConstructFn<T>,
}

impl<T> ConstructorDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Parameter keys, in declaration order.
    pub fn params(&self) -> &[BindingKey] {
        &self.params
    }

    /// Whether this constructor is tagged as the one to use.
    pub fn is_designated(&self) -> bool {
        self.designated
    }

    pub(crate) fn construct(&self, mut args: Arguments) -> Result<T> {
        (self.construct)(&mut args)
    }
}

impl<T> fmt::Debug for ConstructorDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ConstructorDescriptor")
            .field("name", &self.name)
            .field("params", &self.params)
            .field("designated", &self.designated)
            .finish()
    }
}

/// Builder returned by [`TypeDescriptor::constructor`].
///
/// Nothing is registered until [`invoke`](ConstructorBuilder::invoke).
#[must_use = "the constructor is registered by calling .invoke()"]
pub struct ConstructorBuilder<'a, T> {
    descriptor: &'a mut TypeDescriptor<T>,
    name: &'static str,
    params: Vec<BindingKey>,
    designated: bool,
}

impl<T: 'static> ConstructorBuilder<'_, T> {
    /// Declares the next parameter.
    pub fn param<D: Dependency>(mut self) -> Self {
        self.params.push(BindingKey::of::<D::Key>());
        self
    }

    /// Declares the next parameter, resolved under `qualifier`.
    pub fn named_param<D: Dependency>(mut self, qualifier: impl Into<Qualifier>) -> Self {
        self.params.push(BindingKey::named::<D::Key>(qualifier));
        self
    }

    /// Tags this constructor as the one to use when there are several.
    pub fn designated(mut self) -> Self {
        self.designated = true;
        self
    }

    /// Registers the constructor body.
    pub fn invoke<F>(self, construct: F)
    where
        F: Fn(&mut Arguments) -> Result<T> + Send + Sync + 'static,
    {
        self.descriptor.constructors.push(ConstructorDescriptor {
            name: self.name,
            params: self.params,
            designated: self.designated,
            construct: Box::new(construct),
        });
    }
}

/// A member of `T` tagged for injection after construction.
pub struct SetterDescriptor<T> {
    name: &'static str,
    key: BindingKey,
    public: bool,
    assign: AssignFn<T>,
}

impl<T> SetterDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Key the injected value is resolved by.
    pub fn key(&self) -> &BindingKey {
        &self.key
    }

    pub fn is_public(&self) -> bool {
        self.public
    }

    /// Resolves this setter under `qualifier`.
    pub fn named(&mut self, qualifier: impl Into<Qualifier>) -> &mut Self {
        self.key = self.key.clone().with_qualifier(Some(qualifier.into()));
        self
    }

    /// Marks the setter as not publicly writable.
    ///
    /// Such setters cannot be injected; describing the type fails.
    pub fn non_public(&mut self) -> &mut Self {
        self.public = false;
        self
    }

    pub(crate) fn assign(&self, target: &mut T, value: ErasedValue) -> Result<()> {
        (self.assign)(target, &self.key, value)
    }
}

impl<T> fmt::Debug for SetterDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SetterDescriptor")
            .field("name", &self.name)
            .field("key", &self.key)
            .field("public", &self.public)
            .finish()
    }
}

/// A method of `T` run after construction and injection.
pub struct PostConstructDescriptor<T> {
    name: &'static str,
    priority: i32,
    run: HookFn<T>,
}

impl<T> PostConstructDescriptor<T> {
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Lower priorities run first.
    pub fn priority_value(&self) -> i32 {
        self.priority
    }

    /// Sets the priority. Defaults to 0.
    pub fn priority(&mut self, priority: i32) -> &mut Self {
        self.priority = priority;
        self
    }

    pub(crate) fn run(&self, target: &mut T) {
        (self.run)(target)
    }
}

impl<T> fmt::Debug for PostConstructDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PostConstructDescriptor")
            .field("name", &self.name)
            .field("priority", &self.priority)
            .finish()
    }
}

/// Everything a type registers about itself, in declaration order.
pub struct TypeDescriptor<T> {
    pub(crate) constructors: Vec<ConstructorDescriptor<T>>,
    pub(crate) setters: Vec<SetterDescriptor<T>>,
    pub(crate) post_constructs: Vec<PostConstructDescriptor<T>>,
}

impl<T: 'static> TypeDescriptor<T> {
    pub(crate) fn new() -> Self {
        Self {
            constructors: Vec::new(),
            setters: Vec::new(),
            post_constructs: Vec::new(),
        }
    }

    /// Starts declaring a constructor.
    pub fn constructor(&mut self, name: &'static str) -> ConstructorBuilder<'_, T> {
        ConstructorBuilder {
            descriptor: self,
            name,
            params: Vec::new(),
            designated: false,
        }
    }

    /// Declares an injection setter receiving a `D`.
    pub fn setter<D, F>(&mut self, name: &'static str, assign: F) -> &mut SetterDescriptor<T>
    where
        D: Dependency,
        F: Fn(&mut T, D) + Send + Sync + 'static,
    {
        self.setters.push(SetterDescriptor {
            name,
            key: BindingKey::of::<D::Key>(),
            public: true,
            assign: Box::new(move |target, key, value| {
                assign(target, downcast_dependency::<D>(key, value)?);
                Ok(())
            }),
        });
        let last = self.setters.len() - 1;
        &mut self.setters[last]
    }

    /// Declares a post-construct hook.
    pub fn post_construct<F>(&mut self, name: &'static str, run: F) -> &mut PostConstructDescriptor<T>
    where
        F: Fn(&mut T) + Send + Sync + 'static,
    {
        self.post_constructs.push(PostConstructDescriptor {
            name,
            priority: 0,
            run: Box::new(run),
        });
        let last = self.post_constructs.len() - 1;
        &mut self.post_constructs[last]
    }

    pub fn constructors(&self) -> &[ConstructorDescriptor<T>] {
        &self.constructors
    }

    pub fn setters(&self) -> &[SetterDescriptor<T>] {
        &self.setters
    }

    pub fn post_constructs(&self) -> &[PostConstructDescriptor<T>] {
        &self.post_constructs
    }
}
