use core::fmt;
use std::collections::BTreeMap;
use std::sync::{Arc, PoisonError, RwLock};

use dp_utils::hash::HashMap;
use log::trace;

use crate::construct::{DefaultInstanceFactory, InstanceFactory};
use crate::container;
use crate::dyna::{
    DynaBean, DynaClass, DynaProperty, MutableDynaClass, check_content, check_value, inferred_type,
};
use crate::error::{MissingReason, PropertyError};
use crate::impl_object;
use crate::provision;
use crate::ty::Type;
use crate::value::Value;

// -----------------------------------------------------------------------------
// LazyDynaClass

#[derive(Default)]
struct LazyState {
    properties: BTreeMap<String, DynaProperty>,
    restricted: bool,
}

struct LazyInner {
    name: String,
    state: RwLock<LazyState>,
}

/// An extensible schema for [`AutoSchemaBag`]s.
///
/// Cloning shares the schema, so a property added through one bag is
/// declared for every bag of the schema. Restriction and the insertion it
/// guards happen under one lock.
///
/// # Examples
///
/// ```
/// use dp_beans::Type;
/// use dp_beans::dyna::{DynaClass, LazyDynaClass, MutableDynaClass};
///
/// let schema = LazyDynaClass::named("contact");
/// schema.add("email").unwrap();
/// schema.add_typed("age", Type::I32).unwrap();
/// assert_eq!(schema.properties().len(), 2);
///
/// schema.set_restricted(true);
/// assert!(schema.add("phone").is_err());
/// assert!(schema.property("phone").is_none());
/// ```
#[derive(Clone)]
pub struct LazyDynaClass(Arc<LazyInner>);

impl LazyDynaClass {
    pub const DEFAULT_NAME: &'static str = "AutoSchemaBag";

    #[inline]
    pub fn new() -> Self {
        Self::named(Self::DEFAULT_NAME)
    }

    pub fn named(name: impl Into<String>) -> Self {
        Self(Arc::new(LazyInner {
            name: name.into(),
            state: RwLock::new(LazyState::default()),
        }))
    }

    /// Creates an unrestricted schema declaring `properties`.
    pub fn with_properties<I>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = DynaProperty>,
    {
        let schema = Self::named(name);
        {
            let mut state = schema.write();
            for property in properties {
                state.properties.insert(property.name().to_owned(), property);
            }
        }
        schema
    }

    /// Declares `property`. Declaring a known name does nothing.
    pub fn add_property(&self, property: DynaProperty) -> Result<(), PropertyError> {
        let mut state = self.write();
        if state.restricted {
            return Err(self.restricted(property.name()));
        }
        if !state.properties.contains_key(property.name()) {
            trace!("schema `{}` gains `{}`", self.0.name, property.name());
            state.properties.insert(property.name().to_owned(), property);
        }
        Ok(())
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.read().properties.contains_key(name)
    }

    /// Returns the declaration of `name`, adding it with type `ty` if the
    /// schema is not restricted.
    pub(crate) fn ensure(&self, name: &str, ty: impl FnOnce() -> Type) -> Result<DynaProperty, PropertyError> {
        if let Some(found) = self.read().properties.get(name) {
            return Ok(found.clone());
        }
        let mut state = self.write();
        if let Some(found) = state.properties.get(name) {
            return Ok(found.clone());
        }
        if state.restricted {
            return Err(self.restricted(name));
        }
        let property = DynaProperty::new(name, ty());
        trace!(
            "schema `{}` gains `{name}` as {}",
            self.0.name,
            property.property_type()
        );
        state.properties.insert(name.to_owned(), property.clone());
        Ok(property)
    }

    fn restricted(&self, name: &str) -> PropertyError {
        PropertyError::unknown(name, &self.0.name, MissingReason::Restricted)
    }

    #[inline]
    fn read(&self) -> std::sync::RwLockReadGuard<'_, LazyState> {
        self.0.state.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> std::sync::RwLockWriteGuard<'_, LazyState> {
        self.0.state.write().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for LazyDynaClass {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DynaClass for LazyDynaClass {
    #[inline]
    fn name(&self) -> &str {
        &self.0.name
    }

    fn property(&self, name: &str) -> Option<DynaProperty> {
        self.read().properties.get(name).cloned()
    }

    fn properties(&self) -> Vec<DynaProperty> {
        self.read().properties.values().cloned().collect()
    }

    fn new_instance(&self) -> Result<Value, PropertyError> {
        Ok(Value::object(AutoSchemaBag::with_schema(self.clone())))
    }
}

impl MutableDynaClass for LazyDynaClass {
    fn add_typed(&self, name: &str, ty: Type) -> Result<(), PropertyError> {
        self.add_property(DynaProperty::new(name, ty))
    }

    fn remove(&self, name: &str) -> Result<(), PropertyError> {
        let mut state = self.write();
        if state.restricted {
            return Err(self.restricted(name));
        }
        state.properties.remove(name);
        Ok(())
    }

    #[inline]
    fn is_restricted(&self) -> bool {
        self.read().restricted
    }

    fn set_restricted(&self, restricted: bool) {
        self.write().restricted = restricted;
    }
}

impl fmt::Debug for LazyDynaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.read();
        f.debug_struct("LazyDynaClass")
            .field("name", &self.0.name)
            .field("properties", &state.properties.keys().collect::<Vec<_>>())
            .field("restricted", &state.restricted)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// AutoSchemaBag

/// A bag that declares properties as they are used.
///
/// - Setting an unknown name declares it with the type of the value, or
///   free-form for `Null`.
/// - Indexed or keyed access to an unknown name declares it as a list or a
///   map.
/// - Reading an unset container or bag property instantiates it.
/// - Indexed access past the end grows the container.
///
/// Once the schema is restricted, unknown names fail with
/// [`MissingReason::Restricted`] instead.
///
/// # Examples
///
/// ```
/// use dp_beans::Value;
/// use dp_beans::dyna::{AutoSchemaBag, DynaBean};
///
/// let mut bag = AutoSchemaBag::new();
/// bag.set_indexed("tags", 2, Value::from("x")).unwrap();
/// assert_eq!(bag.size("tags"), 3);
/// assert_eq!(bag.get_indexed("tags", 0).unwrap(), Value::Null);
/// assert_eq!(bag.get_mapped("attrs", "a").unwrap(), Value::Null);
/// assert_eq!(bag.size("attrs"), 0);
/// ```
pub struct AutoSchemaBag {
    schema: LazyDynaClass,
    values: HashMap<String, Value>,
    factory: Arc<dyn InstanceFactory>,
}

impl_object!(@dyna AutoSchemaBag, "AutoSchemaBag");

impl AutoSchemaBag {
    /// Creates a bag with a fresh schema.
    #[inline]
    pub fn new() -> Self {
        Self::with_schema(LazyDynaClass::new())
    }

    /// Creates a bag sharing `schema`.
    pub fn with_schema(schema: LazyDynaClass) -> Self {
        Self {
            schema,
            values: HashMap::default(),
            factory: Arc::new(DefaultInstanceFactory),
        }
    }

    /// Replaces the factory that provisions containers and elements.
    pub fn with_factory(mut self, factory: Arc<dyn InstanceFactory>) -> Self {
        self.factory = factory;
        self
    }

    #[inline]
    pub fn lazy_schema(&self) -> &LazyDynaClass {
        &self.schema
    }

    /// The number of properties holding a value.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// The element count of container property `name`, `0` if it is unset
    /// or not a container.
    pub fn size(&self, name: &str) -> usize {
        self.values
            .get(name)
            .and_then(Value::container_len)
            .unwrap_or(0)
    }

    /// Returns the value of `property`, provisioning it if it is an unset
    /// container or bag.
    fn provisioned(&mut self, property: &DynaProperty) -> Result<Value, PropertyError> {
        let name = property.name();
        match self.values.get(name) {
            Some(value) if !value.is_null() => return Ok(value.clone()),
            _ => {}
        }
        let ty = property.property_type();
        if !provision::is_instantiated(ty) {
            return Ok(ty.default_value());
        }
        let value = provision::instantiate(&self.factory, name, ty)?;
        self.values.insert(name.to_owned(), value.clone());
        Ok(value)
    }

    /// Resolves indexed property `name` to a container long enough for
    /// `index`.
    fn indexed(&mut self, name: &str, index: usize) -> Result<(DynaProperty, Value), PropertyError> {
        let property = self.schema.ensure(name, || Type::List)?;
        if !property.is_indexed() {
            return Err(PropertyError::IndexOutOfRange {
                property: name.to_owned(),
                index,
                len: None,
            });
        }
        let container = self.provisioned(&property)?;
        let grown = provision::grow(
            &self.factory,
            name,
            &container,
            &property.element_type(),
            index,
        )?;
        match grown {
            Some(replacement) => {
                self.values.insert(name.to_owned(), replacement.clone());
                Ok((property, replacement))
            }
            None => Ok((property, container)),
        }
    }

    fn mapped(&mut self, name: &str) -> Result<Value, PropertyError> {
        let property = self.schema.ensure(name, || Type::Map)?;
        if !property.is_mapped() {
            return Err(PropertyError::unknown(
                name,
                self.schema.name(),
                MissingReason::NotMapped,
            ));
        }
        self.provisioned(&property)
    }
}

impl Default for AutoSchemaBag {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DynaBean for AutoSchemaBag {
    fn schema(&self) -> Arc<dyn DynaClass> {
        Arc::new(self.schema.clone())
    }

    /// Unknown names read as `Null` and are not declared.
    fn get(&mut self, name: &str) -> Result<Value, PropertyError> {
        match self.schema.property(name) {
            Some(property) => self.provisioned(&property),
            None => Ok(Value::Null),
        }
    }

    fn get_indexed(&mut self, name: &str, index: usize) -> Result<Value, PropertyError> {
        let (_, container) = self.indexed(name, index)?;
        container::get_index(name, &container, index)
    }

    fn get_mapped(&mut self, name: &str, key: &str) -> Result<Value, PropertyError> {
        container::get_key(name, &self.mapped(name)?, key)
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        let property = self.schema.ensure(name, || inferred_type(&value))?;
        check_value(&property, &value)?;
        self.values.insert(name.to_owned(), value);
        Ok(())
    }

    fn set_indexed(&mut self, name: &str, index: usize, value: Value) -> Result<(), PropertyError> {
        let (property, container) = self.indexed(name, index)?;
        check_content(&property, &value)?;
        container::set_index(name, &container, index, value)
    }

    fn set_mapped(&mut self, name: &str, key: &str, value: Value) -> Result<(), PropertyError> {
        container::set_key(name, &self.mapped(name)?, key, value)
    }

    fn contains(&self, name: &str, key: &str) -> Result<bool, PropertyError> {
        match self.values.get(name) {
            Some(Value::Map(map)) => Ok(map.contains_key(key)),
            _ => Ok(false),
        }
    }

    fn remove(&mut self, name: &str, key: &str) -> Result<(), PropertyError> {
        if let Some(Value::Map(map)) = self.values.get(name) {
            map.remove(key);
        }
        Ok(())
    }

    /// Every name is readable; unknown ones read as `Null`.
    fn is_readable(&self, _name: &str) -> bool {
        true
    }

    fn is_writeable(&self, name: &str) -> bool {
        !self.schema.is_restricted() || self.schema.contains(name)
    }

    fn inherit_factory(&mut self, factory: &Arc<dyn InstanceFactory>) {
        self.factory = factory.clone();
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use super::{AutoSchemaBag, LazyDynaClass};
    use crate::access::BeanAccess;
    use crate::class::Class;
    use crate::construct::{ConstructError, DefaultInstanceFactory, InstanceFactory};
    use crate::dyna::{DynaBean, DynaClass, DynaProperty, MutableDynaClass};
    use crate::error::{MissingReason, PropertyError};
    use crate::testing::ReadOnly;
    use crate::ty::{Primitive, Type};
    use crate::value::{ArrayRef, Value};

    fn counting_factory() -> (Arc<AtomicUsize>, Arc<dyn InstanceFactory>) {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory: Arc<dyn InstanceFactory> =
            Arc::new(move |ty: &Type| -> Result<Value, ConstructError> {
                counter.fetch_add(1, Ordering::Relaxed);
                DefaultInstanceFactory.construct(ty)
            });
        (calls, factory)
    }

    #[test]
    fn set_declares_the_value_type() {
        let mut bag = AutoSchemaBag::new();
        bag.set("count", Value::I32(1)).unwrap();
        bag.set("free", Value::Null).unwrap();

        let schema = bag.lazy_schema();
        assert_eq!(
            schema.property("count").unwrap().property_type(),
            &Type::Boxed(Primitive::I32)
        );
        assert_eq!(schema.property("free").unwrap().property_type(), &Type::Any);

        assert!(matches!(
            bag.set("count", Value::from("one")),
            Err(PropertyError::TypeMismatch { .. })
        ));
        bag.set("count", Value::Null).unwrap();
        bag.set("free", Value::from("anything")).unwrap();
    }

    #[test]
    fn unknown_reads_do_not_declare() {
        let mut bag = AutoSchemaBag::new();
        assert_eq!(bag.get("ghost").unwrap(), Value::Null);
        assert!(bag.lazy_schema().property("ghost").is_none());
        assert!(bag.is_readable("ghost"));
    }

    #[test]
    fn indexed_growth() {
        let mut bag = AutoSchemaBag::new();
        bag.set_indexed("tags", 2, Value::from("x")).unwrap();
        assert_eq!(bag.size("tags"), 3);
        assert_eq!(bag.get_indexed("tags", 2).unwrap(), Value::from("x"));

        let tags = bag.lazy_schema().property("tags").unwrap();
        assert_eq!(tags.property_type(), &Type::List);

        // Reads grow too.
        assert_eq!(bag.get_indexed("tags", 5).unwrap(), Value::Null);
        assert_eq!(bag.size("tags"), 6);
    }

    #[test]
    fn arrays_are_replaced_when_grown() {
        let mut bag = AutoSchemaBag::new();
        let array = ArrayRef::new(Type::I32, 1);
        bag.set("nums", Value::Array(array.clone())).unwrap();
        bag.set_indexed("nums", 3, Value::I32(7)).unwrap();
        assert_eq!(array.len(), 1);
        assert_eq!(bag.size("nums"), 4);
        assert_eq!(bag.get_indexed("nums", 1).unwrap(), Value::I32(0));
        assert_eq!(bag.get_indexed("nums", 3).unwrap(), Value::I32(7));
    }

    #[test]
    fn typed_content_is_provisioned() {
        let schema = LazyDynaClass::with_properties("t", [DynaProperty::with_content_type(
            "children",
            Type::List,
            Type::DynaBean,
        )]);
        let mut bag = AutoSchemaBag::with_schema(schema);
        let child = bag.get_indexed("children", 1).unwrap();
        assert!(child.as_object().unwrap().is_dyna_bean());
        assert!(matches!(
            bag.set_indexed("children", 0, Value::I32(1)),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn declared_containers_are_instantiated_on_read() {
        let schema = LazyDynaClass::with_properties("t", [
            DynaProperty::new("attrs", Type::Map),
            DynaProperty::new("nested", Type::DynaBean),
            DynaProperty::new("n", Type::I64),
        ]);
        let mut bag = AutoSchemaBag::with_schema(schema);
        let attrs = bag.get("attrs").unwrap();
        assert!(attrs.as_map().is_some());
        assert_eq!(bag.get("attrs").unwrap(), attrs);
        assert!(bag.get("nested").unwrap().as_object().is_some());
        assert_eq!(bag.get("n").unwrap(), Value::I64(0));
    }

    #[test]
    fn non_indexed_and_non_mapped_names() {
        let mut bag = AutoSchemaBag::new();
        bag.set("name", Value::from("n")).unwrap();
        assert!(matches!(
            bag.get_indexed("name", 0),
            Err(PropertyError::IndexOutOfRange { len: None, .. })
        ));
        let err = bag.get_mapped("name", "k").unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::NotMapped));
    }

    #[test]
    fn keyed_access() {
        let mut bag = AutoSchemaBag::new();
        assert!(!bag.contains("attrs", "a").unwrap());
        bag.set_mapped("attrs", "a", Value::I32(1)).unwrap();
        assert!(bag.contains("attrs", "a").unwrap());
        bag.remove("attrs", "a").unwrap();
        assert!(!bag.contains("attrs", "a").unwrap());
    }

    #[test]
    fn restricted_schema_rejects_new_names() {
        let mut bag = AutoSchemaBag::new();
        bag.set("known", Value::I32(1)).unwrap();
        bag.lazy_schema().set_restricted(true);

        let err = bag.set("fresh", Value::I32(1)).unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::Restricted));
        assert!(bag.set_indexed("list", 0, Value::Null).is_err());
        assert!(bag.get_mapped("map", "k").is_err());
        assert!(bag.lazy_schema().property("fresh").is_none());

        bag.set("known", Value::I32(2)).unwrap();
        assert!(bag.is_writeable("known"));
        assert!(!bag.is_writeable("fresh"));
        assert!(bag.lazy_schema().remove("known").is_err());
    }

    #[test]
    fn shared_schema_grows_once() {
        let schema = LazyDynaClass::named("shared");
        let handles: Vec<_> = (0..4)
            .map(|i| {
                let schema = schema.clone();
                thread::spawn(move || {
                    let mut bag = AutoSchemaBag::with_schema(schema);
                    bag.set("value", Value::I32(i)).unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }
        assert_eq!(schema.properties().len(), 1);
    }

    #[test]
    fn new_instances_share_the_schema() {
        let schema = Arc::new(LazyDynaClass::named("s"));
        let bag = schema.new_instance().unwrap();
        bag.as_object()
            .unwrap()
            .with_dyna(|b| b.set("x", Value::I32(1)))
            .unwrap()
            .unwrap();
        assert!(schema.property("x").is_some());
    }

    #[test]
    fn custom_factory_provisions_nested_bags() {
        let (calls, factory) = counting_factory();
        let schema = LazyDynaClass::with_properties("t", [DynaProperty::with_content_type(
            "children",
            Type::List,
            Type::DynaBean,
        )]);
        let bag = Value::object(AutoSchemaBag::with_schema(schema).with_factory(factory));
        let access = BeanAccess::new();

        // The `children` list, then two child bags.
        access.read(&bag, "children[1]").unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 3);

        // Child bags provision through the same factory.
        access.write(&bag, "children[1].tags[0]", "x").unwrap();
        access.write(&bag, "children[0].attrs(k)", 1_i32).unwrap();
        assert_eq!(calls.load(Ordering::Relaxed), 5);
        assert_eq!(access.read(&bag, "children[1].tags[0]").unwrap(), Value::from("x"));
    }

    #[test]
    fn unconstructible_content_fails_the_access() {
        let schema = LazyDynaClass::with_properties("t", [DynaProperty::with_content_type(
            "places",
            Type::List,
            Type::Class(ReadOnly::class()),
        )]);
        let bag = Value::object(AutoSchemaBag::with_schema(schema));
        let access = BeanAccess::new();

        let err = access.read(&bag, "places[0]").unwrap_err();
        assert!(matches!(err, PropertyError::AccessFailure { .. }));
        assert_eq!(access.read(&bag, "places").unwrap().container_len(), Some(0));
    }

    #[test]
    fn last_index_does_not_overflow() {
        let access = BeanAccess::new();
        let bag = Value::object(AutoSchemaBag::new());
        access.write(&bag, "tags[0]", "a").unwrap();

        let expression = format!("tags[{}]", usize::MAX);
        let err = access.read(&bag, &expression).unwrap_err();
        assert!(matches!(
            err,
            PropertyError::IndexOutOfRange { index: usize::MAX, len: Some(1), .. }
        ));
        assert!(access.write(&bag, &expression, "b").is_err());
        assert_eq!(access.read(&bag, "tags").unwrap().container_len(), Some(1));
    }
}
