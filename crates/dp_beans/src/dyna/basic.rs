use core::fmt;
use std::sync::Arc;

use dp_utils::hash::HashMap;

use crate::container;
use crate::dyna::{DynaBean, DynaClass, DynaProperty, check_content, check_value};
use crate::error::{MissingReason, PropertyError};
use crate::impl_object;
use crate::value::Value;

// -----------------------------------------------------------------------------
// BasicDynaClass

struct BasicInner {
    name: String,
    properties: Vec<DynaProperty>,
    index: HashMap<String, usize>,
}

/// An immutable schema for [`FixedSchemaBag`]s.
///
/// Cloning shares the schema.
///
/// # Examples
///
/// ```
/// use dp_beans::Type;
/// use dp_beans::dyna::{BasicDynaClass, DynaClass, DynaProperty};
///
/// let schema = BasicDynaClass::new("point", [
///     DynaProperty::new("x", Type::I32),
///     DynaProperty::new("y", Type::I32),
/// ]);
/// assert_eq!(schema.name(), "point");
/// assert!(schema.property("z").is_none());
/// assert_eq!(schema.properties().len(), 2);
/// ```
#[derive(Clone)]
pub struct BasicDynaClass(Arc<BasicInner>);

impl BasicDynaClass {
    /// Creates a schema. A repeated name replaces the earlier declaration.
    pub fn new<I>(name: impl Into<String>, properties: I) -> Self
    where
        I: IntoIterator<Item = DynaProperty>,
    {
        let mut list: Vec<DynaProperty> = Vec::new();
        let mut index: HashMap<String, usize> = HashMap::default();
        for property in properties {
            match index.get(property.name()) {
                Some(&i) => list[i] = property,
                None => {
                    index.insert(property.name().to_owned(), list.len());
                    list.push(property);
                }
            }
        }
        Self(Arc::new(BasicInner {
            name: name.into(),
            properties: list,
            index,
        }))
    }

    /// Creates an empty [`FixedSchemaBag`] of this schema.
    #[inline]
    pub fn instantiate(&self) -> Value {
        Value::object(FixedSchemaBag::new(self.clone()))
    }

    fn declared(&self, name: &str) -> Option<&DynaProperty> {
        self.0.index.get(name).map(|&i| &self.0.properties[i])
    }
}

impl DynaClass for BasicDynaClass {
    #[inline]
    fn name(&self) -> &str {
        &self.0.name
    }

    fn property(&self, name: &str) -> Option<DynaProperty> {
        self.declared(name).cloned()
    }

    fn properties(&self) -> Vec<DynaProperty> {
        self.0.properties.clone()
    }

    fn new_instance(&self) -> Result<Value, PropertyError> {
        Ok(self.instantiate())
    }
}

impl fmt::Debug for BasicDynaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicDynaClass")
            .field("name", &self.0.name)
            .field("properties", &self.0.properties)
            .finish()
    }
}

// -----------------------------------------------------------------------------
// FixedSchemaBag

/// A bag whose properties are exactly those of its [`BasicDynaClass`].
///
/// Unknown names fail with [`MissingReason::NoSuchProperty`]. Unset
/// properties read as the default of their type. Values are checked
/// against declared types; nothing is provisioned, so indexing an unset
/// container fails with [`PropertyError::NestedNull`].
///
/// # Examples
///
/// ```
/// use dp_beans::{Type, Value};
/// use dp_beans::dyna::{BasicDynaClass, DynaBean, DynaProperty, FixedSchemaBag};
///
/// let schema = BasicDynaClass::new("point", [DynaProperty::new("x", Type::I32)]);
/// let mut bag = FixedSchemaBag::new(schema);
///
/// assert_eq!(bag.get("x").unwrap(), Value::I32(0));
/// bag.set("x", Value::I32(3)).unwrap();
/// assert_eq!(bag.get("x").unwrap(), Value::I32(3));
/// assert!(bag.set("x", Value::from("3")).is_err());
/// assert!(bag.get("y").is_err());
/// ```
pub struct FixedSchemaBag {
    schema: BasicDynaClass,
    values: HashMap<String, Value>,
}

impl_object!(@dyna FixedSchemaBag, "FixedSchemaBag");

impl FixedSchemaBag {
    pub fn new(schema: BasicDynaClass) -> Self {
        Self {
            schema,
            values: HashMap::default(),
        }
    }

    #[inline]
    pub fn basic_schema(&self) -> &BasicDynaClass {
        &self.schema
    }

    fn declared(&self, name: &str) -> Result<&DynaProperty, PropertyError> {
        self.schema.declared(name).ok_or_else(|| {
            PropertyError::unknown(name, &self.schema.0.name, MissingReason::NoSuchProperty)
        })
    }

    fn value(&self, name: &str) -> Result<Value, PropertyError> {
        let property = self.declared(name)?;
        Ok(self
            .values
            .get(name)
            .cloned()
            .unwrap_or_else(|| property.property_type().default_value()))
    }
}

impl DynaBean for FixedSchemaBag {
    fn schema(&self) -> Arc<dyn DynaClass> {
        Arc::new(self.schema.clone())
    }

    fn get(&mut self, name: &str) -> Result<Value, PropertyError> {
        self.value(name)
    }

    fn get_indexed(&mut self, name: &str, index: usize) -> Result<Value, PropertyError> {
        container::get_index(name, &self.value(name)?, index)
    }

    fn get_mapped(&mut self, name: &str, key: &str) -> Result<Value, PropertyError> {
        container::get_key(name, &self.value(name)?, key)
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        check_value(self.declared(name)?, &value)?;
        self.values.insert(name.to_owned(), value);
        Ok(())
    }

    fn set_indexed(&mut self, name: &str, index: usize, value: Value) -> Result<(), PropertyError> {
        check_content(self.declared(name)?, &value)?;
        container::set_index(name, &self.value(name)?, index, value)
    }

    fn set_mapped(&mut self, name: &str, key: &str, value: Value) -> Result<(), PropertyError> {
        container::set_key(name, &self.value(name)?, key, value)
    }

    fn contains(&self, name: &str, key: &str) -> Result<bool, PropertyError> {
        match self.value(name)? {
            Value::Null => Err(PropertyError::nested_null(name)),
            map => container::contains_key(name, &map, key),
        }
    }

    fn remove(&mut self, name: &str, key: &str) -> Result<(), PropertyError> {
        match self.value(name)? {
            Value::Null => Err(PropertyError::nested_null(name)),
            map => container::remove_key(name, &map, key),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{BasicDynaClass, FixedSchemaBag};
    use crate::dyna::{DynaBean, DynaClass, DynaProperty};
    use crate::error::{MissingReason, PropertyError};
    use crate::ty::{Primitive, Type};
    use crate::value::{ListRef, MapRef, Value};

    fn schema() -> BasicDynaClass {
        BasicDynaClass::new("order", [
            DynaProperty::new("id", Type::I64),
            DynaProperty::new("note", Type::Str),
            DynaProperty::new("qty", Type::Boxed(Primitive::I32)),
            DynaProperty::with_content_type("lines", Type::List, Type::Str),
            DynaProperty::new("attrs", Type::Map),
        ])
    }

    #[test]
    fn unknown_names_fail() {
        let mut bag = FixedSchemaBag::new(schema());
        let err = bag.get("missing").unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::NoSuchProperty));
        assert!(bag.set("missing", Value::Null).is_err());
        assert!(!bag.is_readable("missing"));
        assert!(bag.is_writeable("note"));
    }

    #[test]
    fn declared_types_are_enforced() {
        let mut bag = FixedSchemaBag::new(schema());
        assert!(matches!(
            bag.set("id", Value::Null),
            Err(PropertyError::NullForPrimitive { .. })
        ));
        assert!(matches!(
            bag.set("id", Value::I32(1)),
            Err(PropertyError::TypeMismatch { .. })
        ));
        bag.set("qty", Value::Null).unwrap();
        bag.set("qty", Value::I32(2)).unwrap();
        assert_eq!(bag.get("qty").unwrap(), Value::I32(2));
        assert_eq!(bag.get("note").unwrap(), Value::Null);
    }

    #[test]
    fn containers_are_not_provisioned() {
        let mut bag = FixedSchemaBag::new(schema());
        assert!(matches!(
            bag.get_indexed("lines", 0),
            Err(PropertyError::NestedNull { .. })
        ));

        let lines = ListRef::from_vec(vec![Value::from("a")]);
        bag.set("lines", Value::List(lines.clone())).unwrap();
        assert_eq!(bag.get_indexed("lines", 0).unwrap(), Value::from("a"));
        assert!(matches!(
            bag.get_indexed("lines", 1),
            Err(PropertyError::IndexOutOfRange { len: Some(1), .. })
        ));
        assert!(matches!(
            bag.set_indexed("lines", 0, Value::I32(1)),
            Err(PropertyError::TypeMismatch { .. })
        ));
        bag.set_indexed("lines", 0, Value::from("b")).unwrap();
        assert_eq!(lines.get(0), Some(Value::from("b")));
    }

    #[test]
    fn keyed_access() {
        let mut bag = FixedSchemaBag::new(schema());
        assert!(bag.contains("attrs", "a").is_err());
        bag.set("attrs", Value::Map(MapRef::new())).unwrap();
        bag.set_mapped("attrs", "a", Value::I32(1)).unwrap();
        assert!(bag.contains("attrs", "a").unwrap());
        assert_eq!(bag.get_mapped("attrs", "b").unwrap(), Value::Null);
        bag.remove("attrs", "a").unwrap();
        assert!(!bag.contains("attrs", "a").unwrap());

        let err = bag.get_mapped("note", "a").unwrap_err();
        assert!(matches!(err, PropertyError::NestedNull { .. }));
        bag.set("note", Value::from("n")).unwrap();
        let err = bag.get_mapped("note", "a").unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::NotMapped));
    }

    #[test]
    fn schema_instances_share_the_schema() {
        let schema = schema();
        let bag = schema.new_instance().unwrap();
        let obj = bag.as_object().unwrap();
        assert_eq!(obj.dyna_schema_name().as_deref(), Some("order"));
        assert_eq!(obj.class_info().name(), "FixedSchemaBag");
    }
}
