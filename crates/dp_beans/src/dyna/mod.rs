//! Dynamic bags: objects whose properties are described at runtime.
//!
//! ## Menu
//!
//! - [`DynaProperty`]: name, declared type and content type of a bag
//!   property.
//! - [`DynaClass`] / [`MutableDynaClass`]: a bag schema, optionally
//!   extensible and restrictable.
//! - [`DynaBean`]: the property-access contract of a bag.
//! - The bags:
//!     - [`FixedSchemaBag`] over a [`BasicDynaClass`]: unknown names fail.
//!     - [`AutoSchemaBag`] over a [`LazyDynaClass`]: unknown names are
//!       added on use and containers are provisioned on demand.
//!     - [`MapBackedBag`]: an [`AutoSchemaBag`]-like view over a shared
//!       [`MapRef`](crate::value::MapRef) whose key set is the schema.
//!     - [`WrapDynaBean`]: a conventional object seen through the bag
//!       contract.

// -----------------------------------------------------------------------------
// Modules

mod basic;
mod lazy;
mod map_backed;
mod wrap;

// -----------------------------------------------------------------------------
// Exports

pub use basic::{BasicDynaClass, FixedSchemaBag};
pub use lazy::{AutoSchemaBag, LazyDynaClass};
pub use map_backed::MapBackedBag;
pub use wrap::{WrapDynaBean, WrapDynaClass};

use std::sync::Arc;

use crate::construct::InstanceFactory;
use crate::error::PropertyError;
use crate::ty::Type;
use crate::value::Value;

// -----------------------------------------------------------------------------
// DynaProperty

/// A property of a bag schema.
///
/// The content type applies to the elements of indexed and keyed
/// properties; it is [`Type::Any`] unless given.
///
/// # Examples
///
/// ```
/// use dp_beans::Type;
/// use dp_beans::dyna::DynaProperty;
///
/// let tags = DynaProperty::with_content_type("tags", Type::List, Type::Str);
/// assert!(tags.is_indexed());
/// assert_eq!(tags.element_type(), Type::Str);
///
/// let scores = DynaProperty::new("scores", Type::array(Type::I32));
/// assert_eq!(scores.element_type(), Type::I32);
/// ```
#[derive(Debug, Clone, PartialEq)]
pub struct DynaProperty {
    name: String,
    ty: Type,
    content_type: Option<Type>,
}

impl DynaProperty {
    pub fn new(name: impl Into<String>, ty: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            content_type: None,
        }
    }

    /// A free-form property.
    #[inline]
    pub fn untyped(name: impl Into<String>) -> Self {
        Self::new(name, Type::Any)
    }

    pub fn with_content_type(name: impl Into<String>, ty: Type, content_type: Type) -> Self {
        Self {
            name: name.into(),
            ty,
            content_type: Some(content_type),
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    pub fn property_type(&self) -> &Type {
        &self.ty
    }

    #[inline]
    pub fn content_type(&self) -> Option<&Type> {
        self.content_type.as_ref()
    }

    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.ty.is_indexed()
    }

    #[inline]
    pub fn is_mapped(&self) -> bool {
        self.ty.is_mapped()
    }

    /// The type of one element: the content type, the element type of an
    /// array, or [`Type::Any`].
    pub fn element_type(&self) -> Type {
        self.content_type
            .clone()
            .or_else(|| self.ty.element_type().cloned())
            .unwrap_or(Type::Any)
    }
}

// -----------------------------------------------------------------------------
// DynaClass

/// A bag schema.
pub trait DynaClass: Send + Sync {
    fn name(&self) -> &str;

    /// Looks up a declared property.
    fn property(&self, name: &str) -> Option<DynaProperty>;

    /// Every declared property.
    fn properties(&self) -> Vec<DynaProperty>;

    /// Creates an empty bag of this schema.
    fn new_instance(&self) -> Result<Value, PropertyError>;
}

/// A schema that can grow and shrink at runtime.
///
/// A restricted schema rejects additions and removals with
/// [`MissingReason::Restricted`](crate::error::MissingReason::Restricted).
pub trait MutableDynaClass: DynaClass {
    /// Adds a free-form property. Adding a declared name does nothing.
    fn add(&self, name: &str) -> Result<(), PropertyError> {
        self.add_typed(name, Type::Any)
    }

    /// Adds a property of the given type. Adding a declared name does
    /// nothing.
    fn add_typed(&self, name: &str, ty: Type) -> Result<(), PropertyError>;

    fn remove(&self, name: &str) -> Result<(), PropertyError>;

    fn is_restricted(&self) -> bool;

    fn set_restricted(&self, restricted: bool);
}

// -----------------------------------------------------------------------------
// DynaBean

/// The property-access contract of a dynamic bag.
///
/// Reads take `&mut self` because auto-provisioning bags store the
/// containers they create on read.
pub trait DynaBean: Send + Sync {
    /// The schema of this bag.
    fn schema(&self) -> Arc<dyn DynaClass>;

    fn get(&mut self, name: &str) -> Result<Value, PropertyError>;

    fn get_indexed(&mut self, name: &str, index: usize) -> Result<Value, PropertyError>;

    fn get_mapped(&mut self, name: &str, key: &str) -> Result<Value, PropertyError>;

    fn set(&mut self, name: &str, value: Value) -> Result<(), PropertyError>;

    fn set_indexed(&mut self, name: &str, index: usize, value: Value) -> Result<(), PropertyError>;

    fn set_mapped(&mut self, name: &str, key: &str, value: Value) -> Result<(), PropertyError>;

    /// Returns `true` if keyed property `name` holds `key`.
    fn contains(&self, name: &str, key: &str) -> Result<bool, PropertyError>;

    /// Removes `key` from keyed property `name`.
    fn remove(&mut self, name: &str, key: &str) -> Result<(), PropertyError>;

    /// By default, a name is readable if the schema declares it.
    fn is_readable(&self, name: &str) -> bool {
        self.schema().property(name).is_some()
    }

    /// By default, a name is writeable if the schema declares it.
    fn is_writeable(&self, name: &str) -> bool {
        self.schema().property(name).is_some()
    }

    /// Called with the factory of the bag that provisioned this one.
    ///
    /// Bags that provision their own slots adopt it; others ignore it.
    fn inherit_factory(&mut self, _factory: &Arc<dyn InstanceFactory>) {}
}

/// Checks `value` against the declared type of `property`.
#[inline]
pub(crate) fn check_value(property: &DynaProperty, value: &Value) -> Result<(), PropertyError> {
    crate::container::check_element(property.name(), property.property_type(), value)
}

/// Checks an element against the content type of `property`, if any.
#[inline]
pub(crate) fn check_content(property: &DynaProperty, value: &Value) -> Result<(), PropertyError> {
    match property.content_type() {
        Some(content) => crate::container::check_element(property.name(), content, value),
        None => Ok(()),
    }
}

/// The declared type a value implies when it creates a property.
#[inline]
pub(crate) fn inferred_type(value: &Value) -> Type {
    match value {
        Value::Null => Type::Any,
        other => other.runtime_type(),
    }
}
