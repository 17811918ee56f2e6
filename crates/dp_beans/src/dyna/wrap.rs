use core::fmt;
use std::sync::Arc;

use crate::access::BeanAccess;
use crate::class::ClassInfo;
use crate::construct::ConstructError;
use crate::dyna::{DynaBean, DynaClass, DynaProperty};
use crate::error::{MissingReason, PropertyError};
use crate::impl_object;
use crate::introspect::{MappedDescriptors, TypeDescriptors};
use crate::ty::Type;
use crate::value::Value;

// -----------------------------------------------------------------------------
// WrapDynaClass

/// The schema of a conventional class, derived from its descriptors.
///
/// Simple and indexed properties keep their declared type; an indexed-only
/// property is declared as an array of its element type. Keyed properties
/// are declared as [`Type::Map`] with the value type as content type.
pub struct WrapDynaClass {
    class: &'static ClassInfo,
    descriptors: Arc<TypeDescriptors>,
    mapped: Arc<MappedDescriptors>,
    properties: Vec<DynaProperty>,
    access: Arc<BeanAccess>,
}

impl WrapDynaClass {
    pub fn new(access: Arc<BeanAccess>, class: &'static ClassInfo) -> Result<Self, PropertyError> {
        let descriptors = access.describe(class)?;
        let mapped = access.describe_mapped(class);

        let mut properties: Vec<DynaProperty> = descriptors
            .iter()
            .map(|d| {
                let ty = d
                    .property_type()
                    .cloned()
                    .or_else(|| d.indexed_type().cloned().map(Type::array))
                    .unwrap_or(Type::Any);
                DynaProperty::new(d.name(), ty)
            })
            .collect();
        properties.extend(
            mapped
                .iter()
                .filter(|m| !descriptors.contains(m.name()))
                .map(|m| DynaProperty::with_content_type(m.name(), Type::Map, m.value_type().clone())),
        );
        properties.sort_by(|a, b| a.name().cmp(b.name()));

        Ok(Self {
            class,
            descriptors,
            mapped,
            properties,
            access,
        })
    }

    #[inline]
    pub fn class(&self) -> &'static ClassInfo {
        self.class
    }

    fn is_readable(&self, name: &str) -> bool {
        self.descriptors
            .get(name)
            .is_some_and(|d| d.is_readable() || d.indexed_read_method().is_some())
            || self.mapped.get(name).is_some_and(|m| m.read_method().is_some())
    }

    fn is_writeable(&self, name: &str) -> bool {
        self.descriptors
            .get(name)
            .is_some_and(|d| d.is_writeable() || d.indexed_write_method().is_some())
            || self.mapped.get(name).is_some_and(|m| m.write_method().is_some())
    }
}

impl DynaClass for WrapDynaClass {
    #[inline]
    fn name(&self) -> &str {
        self.class.name()
    }

    fn property(&self, name: &str) -> Option<DynaProperty> {
        self.properties.iter().find(|p| p.name() == name).cloned()
    }

    fn properties(&self) -> Vec<DynaProperty> {
        self.properties.clone()
    }

    /// Constructs the class and wraps the new object.
    fn new_instance(&self) -> Result<Value, PropertyError> {
        let instance = self.class.construct().ok_or_else(|| {
            PropertyError::access_failure(
                format!("cannot instantiate {}", self.class.name()),
                ConstructError::NoConstructor(self.class.name()),
            )
        })?;
        let bag = WrapDynaBean::new(self.access.clone(), instance)?;
        Ok(Value::object(bag))
    }
}

impl fmt::Debug for WrapDynaClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapDynaClass")
            .field("class", &self.class.name())
            .field("properties", &self.properties)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// WrapDynaBean

/// A conventional object seen through the [`DynaBean`] contract.
///
/// Every operation is forwarded to the wrapped object through the
/// [`BeanAccess`] the wrapper was built with, so reads and writes see and
/// change the object itself.
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dp_beans::{BeanAccess, Value, impl_object};
/// use dp_beans::dyna::{DynaBean, DynaClass, WrapDynaBean};
///
/// #[derive(Default)]
/// struct Point { x: i32 }
///
/// impl_object!(Point, "Point", |builder| builder
///     .getter("getX", |p: &Point| p.x)
///     .setter("setX", |p: &mut Point, x: i32| p.x = x)
///     .build());
///
/// let access = Arc::new(BeanAccess::new());
/// let point = Value::object(Point::default());
/// let mut bag = WrapDynaBean::new(access.clone(), point.clone()).unwrap();
///
/// bag.set("x", Value::I32(3)).unwrap();
/// assert_eq!(access.read(&point, "x").unwrap(), Value::I32(3));
/// assert_eq!(bag.schema().name(), "Point");
/// ```
pub struct WrapDynaBean {
    instance: Value,
    schema: Arc<WrapDynaClass>,
    access: Arc<BeanAccess>,
}

impl_object!(@dyna WrapDynaBean, "WrapDynaBean");

impl WrapDynaBean {
    /// Wraps `instance`, which must be a conventional object.
    pub fn new(access: Arc<BeanAccess>, instance: Value) -> Result<Self, PropertyError> {
        let class = match &instance {
            Value::Object(obj) if !obj.is_dyna_bean() => obj.class_info(),
            other => {
                return Err(PropertyError::unknown(
                    "",
                    other.runtime_type(),
                    MissingReason::NotABean,
                ));
            }
        };
        let schema = Arc::new(WrapDynaClass::new(access.clone(), class)?);
        Ok(Self {
            instance,
            schema,
            access,
        })
    }

    /// The wrapped object.
    #[inline]
    pub fn instance(&self) -> &Value {
        &self.instance
    }
}

impl DynaBean for WrapDynaBean {
    fn schema(&self) -> Arc<dyn DynaClass> {
        self.schema.clone()
    }

    fn get(&mut self, name: &str) -> Result<Value, PropertyError> {
        self.access.get_simple(&self.instance, name)
    }

    fn get_indexed(&mut self, name: &str, index: usize) -> Result<Value, PropertyError> {
        self.access.get_indexed(&self.instance, name, index)
    }

    fn get_mapped(&mut self, name: &str, key: &str) -> Result<Value, PropertyError> {
        self.access.get_mapped(&self.instance, name, key)
    }

    fn set(&mut self, name: &str, value: Value) -> Result<(), PropertyError> {
        self.access.set_simple(&self.instance, name, value)
    }

    fn set_indexed(&mut self, name: &str, index: usize, value: Value) -> Result<(), PropertyError> {
        self.access.set_indexed(&self.instance, name, index, value)
    }

    fn set_mapped(&mut self, name: &str, key: &str, value: Value) -> Result<(), PropertyError> {
        self.access.set_mapped(&self.instance, name, key, value)
    }

    /// Conventional objects have no key enumeration.
    fn contains(&self, name: &str, _key: &str) -> Result<bool, PropertyError> {
        Err(PropertyError::unknown(
            name,
            self.schema.name(),
            MissingReason::Unsupported,
        ))
    }

    fn remove(&mut self, name: &str, _key: &str) -> Result<(), PropertyError> {
        Err(PropertyError::unknown(
            name,
            self.schema.name(),
            MissingReason::Unsupported,
        ))
    }

    fn is_readable(&self, name: &str) -> bool {
        self.schema.is_readable(name)
    }

    fn is_writeable(&self, name: &str) -> bool {
        self.schema.is_writeable(name)
    }
}

impl fmt::Debug for WrapDynaBean {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WrapDynaBean")
            .field("class", &self.schema.name())
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use super::{WrapDynaBean, WrapDynaClass};
    use crate::access::BeanAccess;
    use crate::class::Class;
    use crate::dyna::{AutoSchemaBag, DynaBean, DynaClass};
    use crate::error::{MissingReason, PropertyError};
    use crate::testing::{Person, ReadOnly};
    use crate::ty::Type;
    use crate::value::Value;

    #[test]
    fn schema_from_descriptors() {
        let access = Arc::new(BeanAccess::new());
        let schema = WrapDynaClass::new(access, Person::class()).unwrap();
        assert_eq!(schema.name(), "Person");

        let names: Vec<String> = schema.properties().iter().map(|p| p.name().to_owned()).collect();
        assert_eq!(
            names,
            ["active", "address", "addresses", "age", "friend", "name", "nicknames", "scores", "tag"]
        );
        assert_eq!(schema.property("age").unwrap().property_type(), &Type::I32);
        assert_eq!(schema.property("tag").unwrap().property_type(), &Type::array(Type::Str));
        let address = schema.property("address").unwrap();
        assert!(address.is_mapped());
        assert_eq!(address.content_type(), Some(&Type::Any));
    }

    #[test]
    fn operations_reach_the_object() {
        let access = Arc::new(BeanAccess::new());
        let person = Value::object(Person::default());
        let mut bag = WrapDynaBean::new(access.clone(), person.clone()).unwrap();

        bag.set("name", Value::from("Ann")).unwrap();
        bag.set_indexed("tag", 0, Value::from("t")).unwrap();
        bag.set_mapped("address", "home", Value::from("here")).unwrap();
        assert_eq!(access.read(&person, "name").unwrap(), Value::from("Ann"));
        assert_eq!(bag.get_indexed("tag", 0).unwrap(), Value::from("t"));
        assert_eq!(bag.get_mapped("address", "home").unwrap(), Value::from("here"));
        assert!(matches!(
            bag.set("age", Value::Null),
            Err(PropertyError::NullForPrimitive { .. })
        ));
        let err = bag.contains("address", "home").unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::Unsupported));
    }

    #[test]
    fn wrapper_is_a_bag_for_paths() {
        let access = Arc::new(BeanAccess::new());
        let person = Value::object(Person::default());
        let wrapped = Value::object(WrapDynaBean::new(access.clone(), person.clone()).unwrap());

        access.write(&wrapped, "age", 7_i32).unwrap();
        assert_eq!(access.read(&wrapped, "age").unwrap(), Value::I32(7));
        assert_eq!(access.read(&person, "age").unwrap(), Value::I32(7));
        assert!(access.is_readable(&wrapped, "tag"));
        assert!(!access.is_readable(&wrapped, "nothing"));

        let read_only = Value::object(WrapDynaBean::new(access.clone(), Value::object(ReadOnly::new("Oslo"))).unwrap());
        assert!(access.is_readable(&read_only, "city"));
        assert!(!access.is_writeable(&read_only, "city"));
    }

    #[test]
    fn new_instance_and_rejections() {
        let access = Arc::new(BeanAccess::new());
        let schema = WrapDynaClass::new(access.clone(), Person::class()).unwrap();
        let fresh = schema.new_instance().unwrap();
        assert!(fresh.as_object().unwrap().is_dyna_bean());
        assert_eq!(access.read(&fresh, "age").unwrap(), Value::I32(0));

        let no_ctor = WrapDynaClass::new(access.clone(), ReadOnly::class()).unwrap();
        assert!(matches!(
            no_ctor.new_instance(),
            Err(PropertyError::AccessFailure { .. })
        ));

        for target in [Value::I32(1), Value::object(AutoSchemaBag::new())] {
            let err = WrapDynaBean::new(access.clone(), target).unwrap_err();
            assert_eq!(err.missing_reason(), Some(MissingReason::NotABean));
        }
    }
}
