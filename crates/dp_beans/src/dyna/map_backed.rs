use core::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard};

use log::trace;

use crate::construct::{DefaultInstanceFactory, InstanceFactory};
use crate::container;
use crate::dyna::{DynaBean, DynaClass, DynaProperty, MutableDynaClass, inferred_type};
use crate::error::{MissingReason, PropertyError};
use crate::impl_object;
use crate::provision;
use crate::ty::Type;
use crate::value::{MapRef, Value};

// -----------------------------------------------------------------------------
// MapSchema

/// The schema of a [`MapBackedBag`]: the live key set of its map.
///
/// `restricted` is always locked before the map, so a restriction check
/// and the insertion it guards cannot interleave with a change of the
/// flag.
struct MapSchema {
    name: String,
    map: MapRef,
    restricted: RwLock<bool>,
}

impl MapSchema {
    fn restricted_guard(&self) -> RwLockReadGuard<'_, bool> {
        self.restricted.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn restricted_error(&self, name: &str) -> PropertyError {
        PropertyError::unknown(name, &self.name, MissingReason::Restricted)
    }

    /// Stores `value` under `name`, failing if `name` is new and the
    /// schema is restricted.
    fn put(&self, name: &str, value: Value) -> Result<(), PropertyError> {
        let restricted = self.restricted_guard();
        self.map.with_mut(|map| {
            if *restricted && !map.contains_key(name) {
                return Err(self.restricted_error(name));
            }
            map.insert(name.to_owned(), value);
            Ok(())
        })
    }

    /// Returns the non-null value under `name`, or stores and returns one
    /// made by `make`.
    fn get_or_put(
        &self,
        name: &str,
        make: impl FnOnce() -> Result<Value, PropertyError>,
    ) -> Result<Value, PropertyError> {
        let restricted = self.restricted_guard();
        self.map.with_mut(|map| {
            match map.get(name) {
                Some(value) if !value.is_null() => return Ok(value.clone()),
                Some(_) => {}
                None if *restricted => return Err(self.restricted_error(name)),
                None => trace!("map-backed bag `{}` gains `{name}`", self.name),
            }
            let value = make()?;
            map.insert(name.to_owned(), value.clone());
            Ok(value)
        })
    }
}

impl DynaClass for MapSchema {
    #[inline]
    fn name(&self) -> &str {
        &self.name
    }

    fn property(&self, name: &str) -> Option<DynaProperty> {
        self.map
            .get(name)
            .map(|value| DynaProperty::new(name, inferred_type(&value)))
    }

    fn properties(&self) -> Vec<DynaProperty> {
        self.map
            .entries()
            .into_iter()
            .map(|(name, value)| DynaProperty::new(name, inferred_type(&value)))
            .collect()
    }

    fn new_instance(&self) -> Result<Value, PropertyError> {
        let bag = MapBackedBag::named(self.name.clone(), MapRef::new());
        bag.set_restricted(self.is_restricted());
        Ok(Value::object(bag))
    }
}

impl MutableDynaClass for MapSchema {
    /// Declares `name` by storing the default value of `ty` under it.
    fn add_typed(&self, name: &str, ty: Type) -> Result<(), PropertyError> {
        let restricted = self.restricted_guard();
        if *restricted {
            return Err(self.restricted_error(name));
        }
        self.map.with_mut(|map| {
            if !map.contains_key(name) {
                map.insert(name.to_owned(), ty.default_value());
            }
        });
        Ok(())
    }

    fn remove(&self, name: &str) -> Result<(), PropertyError> {
        let restricted = self.restricted_guard();
        if *restricted {
            return Err(self.restricted_error(name));
        }
        self.map.remove(name);
        Ok(())
    }

    fn is_restricted(&self) -> bool {
        *self.restricted_guard()
    }

    fn set_restricted(&self, restricted: bool) {
        *self.restricted.write().unwrap_or_else(PoisonError::into_inner) = restricted;
    }
}

// -----------------------------------------------------------------------------
// MapBackedBag

/// A bag over a shared [`MapRef`]; the map's key set is the schema.
///
/// Behaves like an [`AutoSchemaBag`](crate::dyna::AutoSchemaBag) with
/// free-form properties: unknown names read as `Null`, and indexed or
/// keyed access to an unknown or `Null` name stores a new list or map.
/// The bag is its own [`DynaClass`].
///
/// # Examples
///
/// ```
/// use dp_beans::Value;
/// use dp_beans::dyna::{DynaBean, MapBackedBag, MutableDynaClass};
/// use dp_beans::value::MapRef;
///
/// let map = MapRef::new();
/// let mut bag = MapBackedBag::from_map(map.clone());
/// bag.set("a", Value::I32(1)).unwrap();
/// bag.set_indexed("list", 1, Value::from("x")).unwrap();
/// assert_eq!(map.keys(), ["a", "list"]);
///
/// bag.set_restricted(true);
/// assert!(bag.set("b", Value::I32(2)).is_err());
/// assert!(bag.set("a", Value::I32(3)).is_ok());
/// ```
pub struct MapBackedBag {
    schema: Arc<MapSchema>,
    factory: Arc<dyn InstanceFactory>,
}

impl_object!(@dyna MapBackedBag, "MapBackedBag");

impl MapBackedBag {
    pub const DEFAULT_NAME: &'static str = "MapBackedBag";

    /// Creates a bag over a new empty map.
    #[inline]
    pub fn new() -> Self {
        Self::from_map(MapRef::new())
    }

    #[inline]
    pub fn from_map(map: MapRef) -> Self {
        Self::named(Self::DEFAULT_NAME, map)
    }

    pub fn named(name: impl Into<String>, map: MapRef) -> Self {
        Self {
            schema: Arc::new(MapSchema {
                name: name.into(),
                map,
                restricted: RwLock::new(false),
            }),
            factory: Arc::new(DefaultInstanceFactory),
        }
    }

    /// Replaces the factory that provisions grown elements.
    pub fn with_factory(mut self, factory: Arc<dyn InstanceFactory>) -> Self {
        self.factory = factory;
        self
    }

    /// The backing map.
    #[inline]
    pub fn map(&self) -> &MapRef {
        &self.schema.map
    }

    /// The element count of container property `name`, `0` if it is unset
    /// or not a container.
    pub fn size(&self, name: &str) -> usize {
        self.schema
            .map
            .get(name)
            .and_then(|value| value.container_len())
            .unwrap_or(0)
    }

    fn indexed(&self, name: &str, index: usize) -> Result<Value, PropertyError> {
        let container = self
            .schema
            .get_or_put(name, || Ok(Value::List(Default::default())))?;
        match provision::grow(&self.factory, name, &container, &Type::Any, index)? {
            Some(replacement) => {
                self.schema.put(name, replacement.clone())?;
                Ok(replacement)
            }
            None => Ok(container),
        }
    }

    fn mapped(&self, name: &str) -> Result<Value, PropertyError> {
        self.schema
            .get_or_put(name, || Ok(Value::Map(MapRef::new())))
    }
}

impl Default for MapBackedBag {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl DynaBean for MapBackedBag {
    fn schema(&self) -> Arc<dyn DynaClass> {
        self.schema.clone()
    }

    fn get(&mut self, name: &str) -> Result<Value, PropertyError> {
        Ok(self.schema.map.get(name).unwrap_or_default())
    }

    fn get_indexed(&mut self, name: &str, index: usize) -> Result<Value, PropertyError> {
        container::get_index(name, &self.indexed(name, index)?, index)
    }

    fn get_mapped(&mut self, name: &str, key: &str) -> Result<Value, PropertyError> {
        container::get_key(name, &self.mapped(name)?, key)
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        self.schema.put(name, value)
    }

    fn set_indexed(&mut self, name: &str, index: usize, value: Value) -> Result<(), PropertyError> {
        container::set_index(name, &self.indexed(name, index)?, index, value)
    }

    fn set_mapped(&mut self, name: &str, key: &str, value: Value) -> Result<(), PropertyError> {
        container::set_key(name, &self.mapped(name)?, key, value)
    }

    fn contains(&self, name: &str, key: &str) -> Result<bool, PropertyError> {
        match self.schema.map.get(name) {
            Some(value) => container::contains_key(name, &value, key),
            None => Ok(false),
        }
    }

    fn remove(&mut self, name: &str, key: &str) -> Result<(), PropertyError> {
        match self.schema.map.get(name) {
            Some(value) => container::remove_key(name, &value, key),
            None => Ok(()),
        }
    }

    fn is_readable(&self, _name: &str) -> bool {
        true
    }

    fn is_writeable(&self, name: &str) -> bool {
        !self.schema.is_restricted() || self.schema.map.contains_key(name)
    }

    fn inherit_factory(&mut self, factory: &Arc<dyn InstanceFactory>) {
        self.factory = factory.clone();
    }
}

impl DynaClass for MapBackedBag {
    #[inline]
    fn name(&self) -> &str {
        self.schema.name()
    }

    fn property(&self, name: &str) -> Option<DynaProperty> {
        self.schema.property(name)
    }

    fn properties(&self) -> Vec<DynaProperty> {
        self.schema.properties()
    }

    fn new_instance(&self) -> Result<Value, PropertyError> {
        self.schema.new_instance()
    }
}

impl MutableDynaClass for MapBackedBag {
    fn add_typed(&self, name: &str, ty: Type) -> Result<(), PropertyError> {
        self.schema.add_typed(name, ty)
    }

    fn remove(&self, name: &str) -> Result<(), PropertyError> {
        MutableDynaClass::remove(&*self.schema, name)
    }

    fn is_restricted(&self) -> bool {
        self.schema.is_restricted()
    }

    fn set_restricted(&self, restricted: bool) {
        self.schema.set_restricted(restricted);
    }
}

impl fmt::Debug for MapBackedBag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MapBackedBag")
            .field("name", &self.schema.name)
            .field("map", &self.schema.map)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::sync::atomic::{AtomicUsize, Ordering};

    use super::MapBackedBag;
    use crate::access::BeanAccess;
    use crate::construct::{ConstructError, DefaultInstanceFactory, InstanceFactory};
    use crate::dyna::{DynaBean, DynaClass, MutableDynaClass};
    use crate::error::{MissingReason, PropertyError};
    use crate::ty::Type;
    use crate::value::{ArrayRef, MapRef, Value};

    #[test]
    fn schema_is_the_key_set() {
        let map = MapRef::new();
        map.insert("a", 1_i32);
        let mut bag = MapBackedBag::from_map(map.clone());
        assert_eq!(bag.get("a").unwrap(), Value::I32(1));
        assert_eq!(bag.get("b").unwrap(), Value::Null);
        assert!(bag.property("b").is_none());

        map.insert("b", "x");
        assert_eq!(bag.property("b").unwrap().property_type(), &Type::Str);
        let names: Vec<String> = bag.properties().into_iter().map(|p| p.name().to_owned()).collect();
        assert_eq!(names, ["a", "b"]);
        assert_eq!(bag.schema().name(), MapBackedBag::DEFAULT_NAME);
    }

    #[test]
    fn containers_are_provisioned() {
        let mut bag = MapBackedBag::new();
        bag.set_indexed("list", 5, Value::I32(1)).unwrap();
        assert_eq!(bag.size("list"), 6);
        assert_eq!(bag.get_indexed("list", 0).unwrap(), Value::Null);

        bag.set_mapped("attrs", "k", Value::from("v")).unwrap();
        assert!(bag.contains("attrs", "k").unwrap());
        assert_eq!(bag.get_mapped("attrs", "k").unwrap(), Value::from("v"));
        DynaBean::remove(&mut bag, "attrs", "k").unwrap();
        assert!(!bag.contains("attrs", "k").unwrap());
        assert!(!bag.contains("absent", "k").unwrap());

        bag.set("text", Value::from("t")).unwrap();
        assert!(matches!(
            bag.get_indexed("text", 0),
            Err(PropertyError::IndexOutOfRange { len: None, .. })
        ));
        assert_eq!(
            bag.get_mapped("text", "k").unwrap_err().missing_reason(),
            Some(MissingReason::NotMapped)
        );
    }

    #[test]
    fn null_slots_are_reprovisioned() {
        let mut bag = MapBackedBag::new();
        bag.set("list", Value::Null).unwrap();
        bag.set_indexed("list", 0, Value::I32(1)).unwrap();
        assert_eq!(bag.size("list"), 1);
    }

    #[test]
    fn restriction() {
        let mut bag = MapBackedBag::new();
        bag.add("known").unwrap();
        assert_eq!(bag.get("known").unwrap(), Value::Null);
        bag.set_restricted(true);

        for err in [
            bag.set("fresh", Value::I32(1)).unwrap_err(),
            bag.set_indexed("list", 0, Value::Null).unwrap_err(),
            bag.set_mapped("map", "k", Value::Null).unwrap_err(),
            bag.add("other").unwrap_err(),
        ] {
            assert_eq!(err.missing_reason(), Some(MissingReason::Restricted));
        }
        assert!(bag.map().get("fresh").is_none());

        bag.set("known", Value::I32(1)).unwrap();
        assert!(bag.is_writeable("known"));
        assert!(!bag.is_writeable("fresh"));

        bag.set_restricted(false);
        bag.set("fresh", Value::I32(1)).unwrap();
        MutableDynaClass::remove(&bag, "fresh").unwrap();
        assert!(!bag.map().contains_key("fresh"));
    }

    #[test]
    fn new_instance_copies_name_and_restriction() {
        let bag = MapBackedBag::named("config", MapRef::new());
        bag.set_restricted(true);
        let fresh = DynaClass::new_instance(&bag).unwrap();
        let obj = fresh.as_object().unwrap();
        assert_eq!(obj.dyna_schema_name().as_deref(), Some("config"));
        let restricted = obj.with(|b: &MapBackedBag| b.is_restricted()).unwrap();
        assert!(restricted);
    }

    #[test]
    fn grown_elements_use_the_bag_factory() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = calls.clone();
        let factory: Arc<dyn InstanceFactory> =
            Arc::new(move |ty: &Type| -> Result<Value, ConstructError> {
                counter.fetch_add(1, Ordering::Relaxed);
                DefaultInstanceFactory.construct(ty)
            });
        let map = MapRef::new();
        map.insert("children", Value::Array(ArrayRef::new(Type::DynaBean, 0)));
        let bag = Value::object(MapBackedBag::from_map(map.clone()).with_factory(factory));
        let access = BeanAccess::new();

        access.write(&bag, "children[1].tags[0]", "x").unwrap();
        // Two child bags, then the `tags` list of the second one.
        assert_eq!(calls.load(Ordering::Relaxed), 3);
        assert_eq!(map.get("children").unwrap().container_len(), Some(2));
    }

    #[test]
    fn last_index_does_not_overflow() {
        let access = BeanAccess::new();
        let bag = Value::object(MapBackedBag::new());
        let err = access
            .read(&bag, &format!("tags[{}]", usize::MAX))
            .unwrap_err();
        assert!(matches!(
            err,
            PropertyError::IndexOutOfRange { index: usize::MAX, len: Some(0), .. }
        ));
    }
}
