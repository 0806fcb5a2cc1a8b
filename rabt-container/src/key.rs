//! Binding identification keys.
//!
//! [`BindingKey`] identifies a binding within the binder. It combines the
//! [`TypeId`] of the request type with an optional [`Qualifier`] for
//! cases where the same request type needs several distinct bindings.

use std::any::{Any, TypeId, type_name};
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

/// Object-safe view of a qualifier token.
trait QualifierValue: Any + Send + Sync + fmt::Debug {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn QualifierValue) -> bool;
    fn dyn_hash(&self, state: &mut dyn Hasher);
}

impl<T> QualifierValue for T
where
    T: Any + Eq + Hash + fmt::Debug + Send + Sync,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn QualifierValue) -> bool {
        other
            .as_any()
            .downcast_ref::<T>()
            .is_some_and(|other| other == self)
    }

    fn dyn_hash(&self, mut state: &mut dyn Hasher) {
        TypeId::of::<T>().hash(&mut state);
        self.hash(&mut state);
    }
}

/// Marker-type qualifier, see [`Qualifier::marker`].
#[derive(PartialEq, Eq, Hash)]
struct Marker {
    type_id: TypeId,
    type_name: &'static str,
}

impl fmt::Debug for Marker {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.type_name)
    }
}

/// Opaque discriminator that tells apart bindings of the same request type.
///
/// Any `Eq + Hash + Debug` value can serve as a qualifier. Names compare by
/// their text, whether given as `&'static str` or `String`. Other values of
/// different types never compare equal, so `"One"` and an enum variant
/// named `One` stay distinct.
///
/// # Examples
/// ```
/// use rabt_container::key::Qualifier;
///
/// #[derive(Debug, PartialEq, Eq, Hash)]
/// enum Slot { Primary, Replica }
///
/// assert_eq!(Qualifier::new(Slot::Primary), Qualifier::new(Slot::Primary));
/// assert_ne!(Qualifier::new(Slot::Primary), Qualifier::new(Slot::Replica));
/// assert_eq!(Qualifier::from("primary"), Qualifier::from(String::from("primary")));
/// ```
#[derive(Clone)]
pub struct Qualifier {
    value: Arc<dyn QualifierValue>,
}

impl Qualifier {
    /// Wraps any hashable value as a qualifier.
    ///
    /// String values are stored as names, see [`Qualifier::name`].
    pub fn new<Q>(value: Q) -> Self
    where
        Q: Eq + Hash + fmt::Debug + Send + Sync + 'static,
    {
        let any: &dyn Any = &value;
        if let Some(name) = any.downcast_ref::<&'static str>() {
            return Self::name(*name);
        }
        if let Some(name) = any.downcast_ref::<String>() {
            return Self::name(name.as_str());
        }
        Self { value: Arc::new(value) }
    }

    /// A textual qualifier. Equal text means an equal qualifier.
    pub fn name(name: &str) -> Self {
        Self {
            value: Arc::new(Arc::<str>::from(name)),
        }
    }

    /// Returns the text of a name qualifier.
    pub fn as_str(&self) -> Option<&str> {
        self.downcast_ref::<Arc<str>>().map(|name| &**name)
    }

    /// Uses the type `M` itself as the qualifier.
    ///
    /// Handy when a unit struct is declared only to name a binding.
    pub fn marker<M: ?Sized + 'static>() -> Self {
        Self::new(Marker {
            type_id: TypeId::of::<M>(),
            type_name: type_name::<M>(),
        })
    }

    /// Returns the underlying value if it is of type `Q`.
    pub fn downcast_ref<Q: Any>(&self) -> Option<&Q> {
        self.value.as_any().downcast_ref::<Q>()
    }
}

impl PartialEq for Qualifier {
    fn eq(&self, other: &Self) -> bool {
        self.value.dyn_eq(other.value.as_ref())
    }
}

impl Eq for Qualifier {}

impl Hash for Qualifier {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value.dyn_hash(state);
    }
}

impl fmt::Debug for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.value)
    }
}

impl fmt::Display for Qualifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.as_str() {
            Some(name) => f.write_str(name),
            None => write!(f, "{:?}", self.value),
        }
    }
}

impl From<&'static str> for Qualifier {
    fn from(name: &'static str) -> Self {
        Self::name(name)
    }
}

impl From<String> for Qualifier {
    fn from(name: String) -> Self {
        Self::name(&name)
    }
}

/// Identifies a binding: request type plus optional qualifier.
///
/// # Examples
/// ```
/// use rabt_container::key::BindingKey;
///
/// let key = BindingKey::of::<String>();
/// assert_eq!(key.type_name(), "alloc::string::String");
/// assert!(key.qualifier().is_none());
///
/// let named = BindingKey::named::<String>("database_url");
/// assert_ne!(key, named);
/// ```
#[derive(Clone)]
pub struct BindingKey {
    type_id: TypeId,
    type_name: &'static str,
    qualifier: Option<Qualifier>,
}

impl BindingKey {
    /// Creates an unqualified key for request type `K`.
    #[inline]
    pub fn of<K: ?Sized + 'static>() -> Self {
        Self {
            type_id: TypeId::of::<K>(),
            type_name: type_name::<K>(),
            qualifier: None,
        }
    }

    /// Creates a qualified key for request type `K`.
    #[inline]
    pub fn named<K: ?Sized + 'static>(qualifier: impl Into<Qualifier>) -> Self {
        Self::of::<K>().with_qualifier(Some(qualifier.into()))
    }

    /// Replaces the qualifier of this key.
    #[inline]
    pub fn with_qualifier(mut self, qualifier: Option<Qualifier>) -> Self {
        self.qualifier = qualifier;
        self
    }

    /// Returns the [`TypeId`] of the request type.
    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// Returns the human-readable request type name.
    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// Returns the qualifier, if any.
    #[inline]
    pub fn qualifier(&self) -> Option<&Qualifier> {
        self.qualifier.as_ref()
    }
}

impl PartialEq for BindingKey {
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id && self.qualifier == other.qualifier
    }
}

impl Eq for BindingKey {}

impl Hash for BindingKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.type_id.hash(state);
        self.qualifier.hash(state);
    }
}

impl fmt::Debug for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "BindingKey({}, name={:?})", self.type_name, qualifier),
            None => write!(f, "BindingKey({})", self.type_name),
        }
    }
}

impl fmt::Display for BindingKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.qualifier {
            Some(qualifier) => write!(f, "{} (name={})", self.type_name, qualifier),
            None => write!(f, "{}", self.type_name),
        }
    }
}
