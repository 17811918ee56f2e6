//! The property access context.
//!
//! [`BeanAccess`] owns everything property access needs: the expression
//! [`Resolver`], the [`DescriptorCache`], the ordered
//! [`PropertyAdapter`] list, and the optional [`Converter`]. There is no
//! global instance; build one with [`BeanAccess::new`] or
//! [`BeanAccess::builder`] and share it.
//!
//! Auto-provisioning is not configured here. Each bag carries its own
//! [`InstanceFactory`](crate::construct::InstanceFactory), set with
//! [`AutoSchemaBag::with_factory`](crate::dyna::AutoSchemaBag::with_factory)
//! or [`MapBackedBag::with_factory`](crate::dyna::MapBackedBag::with_factory),
//! and bags it provisions inherit it.
//!
//! ## Menu
//!
//! - Path operations: [`read`](BeanAccess::read),
//!   [`write`](BeanAccess::write), [`is_readable`](BeanAccess::is_readable),
//!   [`is_writeable`](BeanAccess::is_writeable),
//!   [`property_type`](BeanAccess::property_type).
//! - Single-segment operations: [`get_simple`](BeanAccess::get_simple),
//!   [`get_indexed`](BeanAccess::get_indexed),
//!   [`get_mapped`](BeanAccess::get_mapped) and their setters.
//! - Bean utilities: [`describe_bean`](BeanAccess::describe_bean),
//!   [`copy_properties`](BeanAccess::copy_properties),
//!   [`populate`](BeanAccess::populate).
//! - Descriptors: [`describe`](BeanAccess::describe),
//!   [`clear_descriptors`](BeanAccess::clear_descriptors).

// -----------------------------------------------------------------------------
// Modules

mod bean_utils;
mod walker;

use core::fmt;
use std::sync::Arc;

use log::debug;

use crate::adapter::{PropertyAdapter, default_adapters};
use crate::class::ClassInfo;
use crate::convert::Converter;
use crate::error::{MissingReason, PropertyError};
use crate::expr::{DefaultResolver, PropertyPath, Resolver};
use crate::introspect::{BeanIntrospector, DescriptorCache, MappedDescriptors, TypeDescriptors};
use crate::ty::Type;
use crate::value::Value;

// -----------------------------------------------------------------------------
// BeanAccess

/// Reads and writes properties of objects, bags and maps by expression.
///
/// # Examples
///
/// ```
/// use dp_beans::{BeanAccess, Value};
/// use dp_beans::dyna::AutoSchemaBag;
///
/// let access = BeanAccess::new();
/// let bag = Value::object(AutoSchemaBag::new());
///
/// access.write(&bag, "name", "Ann").unwrap();
/// access.write(&bag, "tags[2]", "new").unwrap();
/// access.write(&bag, "address(home)", "Main St").unwrap();
///
/// assert_eq!(access.read(&bag, "name").unwrap(), Value::from("Ann"));
/// assert_eq!(access.read(&bag, "tags[0]").unwrap(), Value::Null);
/// assert_eq!(access.read(&bag, "address(home)").unwrap(), Value::from("Main St"));
/// ```
pub struct BeanAccess {
    resolver: Arc<dyn Resolver>,
    cache: DescriptorCache,
    adapters: Vec<Arc<dyn PropertyAdapter>>,
    converter: Option<Arc<dyn Converter>>,
}

impl BeanAccess {
    /// Creates a context with the default resolver, introspectors and
    /// adapters, and no converter.
    #[inline]
    pub fn new() -> Self {
        Self::builder().build()
    }

    #[inline]
    pub fn builder() -> BeanAccessBuilder {
        BeanAccessBuilder::new()
    }

    #[inline]
    pub fn resolver(&self) -> &dyn Resolver {
        &*self.resolver
    }

    #[inline]
    pub fn descriptor_cache(&self) -> &DescriptorCache {
        &self.cache
    }

    #[inline]
    pub fn converter(&self) -> Option<&dyn Converter> {
        self.converter.as_deref()
    }

    /// The adapters in selection order.
    #[inline]
    pub fn adapters(&self) -> &[Arc<dyn PropertyAdapter>] {
        &self.adapters
    }

    /// Parses `expression` with the configured resolver.
    #[inline]
    pub fn parse(&self, expression: &str) -> Result<PropertyPath, PropertyError> {
        self.resolver.parse(expression)
    }

    // -------------------------------------------------------------------------
    // Descriptors

    /// The property descriptors of `class`, built on first use.
    #[inline]
    pub fn describe(&self, class: &'static ClassInfo) -> Result<Arc<TypeDescriptors>, PropertyError> {
        self.cache.describe(class)
    }

    /// The keyed property descriptors of `class`.
    #[inline]
    pub fn describe_mapped(&self, class: &'static ClassInfo) -> Arc<MappedDescriptors> {
        self.cache.describe_mapped(class)
    }

    /// Drops every cached descriptor.
    #[inline]
    pub fn clear_descriptors(&self) {
        self.cache.invalidate();
    }

    // -------------------------------------------------------------------------
    // Single segments

    /// Selects the adapter for `target`.
    fn adapter_for(&self, target: &Value, name: &str) -> Result<&dyn PropertyAdapter, PropertyError> {
        if let Some(adapter) = self.adapters.iter().find(|a| a.matches(target)) {
            return Ok(&**adapter);
        }
        let label = match target {
            Value::Null => "null".to_owned(),
            other => other.runtime_type().to_string(),
        };
        Err(PropertyError::unknown(name, label, MissingReason::NotABean))
    }

    /// Reads simple property `name` of `target`.
    pub fn get_simple(&self, target: &Value, name: &str) -> Result<Value, PropertyError> {
        self.adapter_for(target, name)?.get_simple(self, target, name)
    }

    /// Writes simple property `name` of `target`.
    pub fn set_simple(&self, target: &Value, name: &str, value: impl Into<Value>) -> Result<(), PropertyError> {
        self.adapter_for(target, name)?
            .set_simple(self, target, name, value.into())
    }

    /// Reads element `index` of indexed property `name`.
    pub fn get_indexed(&self, target: &Value, name: &str, index: usize) -> Result<Value, PropertyError> {
        self.adapter_for(target, name)?
            .get_indexed(self, target, name, index)
    }

    /// Writes element `index` of indexed property `name`.
    pub fn set_indexed(
        &self,
        target: &Value,
        name: &str,
        index: usize,
        value: impl Into<Value>,
    ) -> Result<(), PropertyError> {
        self.adapter_for(target, name)?
            .set_indexed(self, target, name, index, value.into())
    }

    /// Reads entry `key` of keyed property `name`.
    pub fn get_mapped(&self, target: &Value, name: &str, key: &str) -> Result<Value, PropertyError> {
        self.adapter_for(target, name)?
            .get_keyed(self, target, name, key)
    }

    /// Writes entry `key` of keyed property `name`.
    pub fn set_mapped(
        &self,
        target: &Value,
        name: &str,
        key: &str,
        value: impl Into<Value>,
    ) -> Result<(), PropertyError> {
        self.adapter_for(target, name)?
            .set_keyed(self, target, name, key, value.into())
    }

    // -------------------------------------------------------------------------
    // Conversion

    /// Makes `value` fit a slot of type `declared`.
    ///
    /// Accepted values pass unchanged. `Null` into a primitive slot fails
    /// with [`PropertyError::NullForPrimitive`]. Anything else goes through
    /// the converter; without one, or if it fails, the result is
    /// [`PropertyError::TypeMismatch`].
    pub fn coerce(&self, property: &str, declared: &Type, value: Value) -> Result<Value, PropertyError> {
        if value.is_null() {
            if declared.is_primitive() {
                return Err(PropertyError::NullForPrimitive {
                    property: property.to_owned(),
                    ty: declared.clone(),
                });
            }
            return Ok(value);
        }
        if declared.accepts(&value) {
            return Ok(value);
        }
        self.convert(property, declared, value)
    }

    /// Converts `value` to `declared` only if a converter is configured
    /// and the value does not already fit. Values are otherwise left for
    /// the target to check.
    pub(crate) fn convert_for(
        &self,
        property: &str,
        declared: &Type,
        value: Value,
    ) -> Result<Value, PropertyError> {
        if self.converter.is_none() || value.is_null() || declared.accepts(&value) {
            return Ok(value);
        }
        self.convert(property, declared, value)
    }

    fn convert(&self, property: &str, declared: &Type, value: Value) -> Result<Value, PropertyError> {
        let mismatch = |found: Type| PropertyError::TypeMismatch {
            property: property.to_owned(),
            expected: declared.clone(),
            found,
        };
        let found = value.runtime_type();
        let Some(converter) = &self.converter else {
            return Err(mismatch(found));
        };
        match converter.convert(value, declared) {
            Ok(converted) if declared.accepts(&converted) => Ok(converted),
            Ok(converted) => Err(mismatch(converted.runtime_type())),
            Err(e) => {
                debug!("conversion of `{property}` failed: {e}");
                Err(mismatch(found))
            }
        }
    }
}

impl Default for BeanAccess {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for BeanAccess {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let adapters: Vec<&str> = self.adapters.iter().map(|a| a.name()).collect();
        f.debug_struct("BeanAccess")
            .field("cache", &self.cache)
            .field("adapters", &adapters)
            .field("converter", &self.converter.is_some())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// BeanAccessBuilder

/// Configures a [`BeanAccess`].
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dp_beans::BeanAccess;
/// use dp_beans::introspect::FluentPropertyBeanIntrospector;
///
/// let access = BeanAccess::builder()
///     .introspector(Arc::new(FluentPropertyBeanIntrospector::default()))
///     .build();
/// assert_eq!(access.adapters().len(), 3);
/// ```
pub struct BeanAccessBuilder {
    resolver: Arc<dyn Resolver>,
    converter: Option<Arc<dyn Converter>>,
    introspectors: Option<Vec<Arc<dyn BeanIntrospector>>>,
    extra_introspectors: Vec<Arc<dyn BeanIntrospector>>,
    adapters: Vec<Arc<dyn PropertyAdapter>>,
}

impl BeanAccessBuilder {
    fn new() -> Self {
        Self {
            resolver: Arc::new(DefaultResolver),
            converter: None,
            introspectors: None,
            extra_introspectors: Vec::new(),
            adapters: Vec::new(),
        }
    }

    /// Replaces the expression dialect.
    pub fn resolver(mut self, resolver: Arc<dyn Resolver>) -> Self {
        self.resolver = resolver;
        self
    }

    pub fn converter(mut self, converter: Arc<dyn Converter>) -> Self {
        self.converter = Some(converter);
        self
    }

    /// Adds a discovery strategy.
    ///
    /// Added strategies run after the default discovery and before the
    /// default suppression of `class`, so they cannot bring it back. With
    /// a list from [`introspectors`](Self::introspectors) they run last.
    pub fn introspector(mut self, introspector: Arc<dyn BeanIntrospector>) -> Self {
        self.extra_introspectors.push(introspector);
        self
    }

    /// Replaces the default discovery strategies.
    ///
    /// The defaults suppress `class`; a replacement list has to do so
    /// itself if wanted.
    pub fn introspectors(mut self, introspectors: Vec<Arc<dyn BeanIntrospector>>) -> Self {
        self.introspectors = Some(introspectors);
        self
    }

    /// Registers an adapter ahead of the built-in ones.
    ///
    /// Adapters registered earlier are tried first.
    pub fn adapter(mut self, adapter: Arc<dyn PropertyAdapter>) -> Self {
        self.adapters.push(adapter);
        self
    }

    pub fn build(self) -> BeanAccess {
        let cache = match self.introspectors {
            Some(mut list) => {
                list.extend(self.extra_introspectors);
                DescriptorCache::with_introspectors(list)
            }
            None => {
                let cache = DescriptorCache::new();
                for introspector in self.extra_introspectors {
                    cache.insert_introspector(introspector);
                }
                cache
            }
        };

        let mut adapters = self.adapters;
        adapters.extend(default_adapters());

        BeanAccess {
            resolver: self.resolver,
            cache,
            adapters,
            converter: self.converter,
        }
    }
}
