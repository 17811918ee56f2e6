use crate::access::BeanAccess;
use crate::adapter::PropertyAdapter;
use crate::class::MethodInfo;
use crate::container;
use crate::error::{InvokeError, MissingReason, PropertyError};
use crate::expr::Segment;
use crate::introspect::{MappedPropertyDescriptor, PropertyDescriptor};
use crate::ty::Type;
use crate::value::{ObjRef, Value};

/// Objects accessed through accessor methods found by the descriptor
/// cache.
///
/// - Indexed access prefers an indexed accessor and falls back to
///   indexing the array or list returned by the plain getter.
/// - Keyed access prefers a keyed accessor and falls back to keying into
///   the map returned by the plain getter.
///
/// Nothing is provisioned: an absent container reads as `Null` and
/// indexing or keying into it fails with [`PropertyError::NestedNull`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ConventionalAdapter;

fn object<'a>(target: &'a Value, name: &str) -> Result<&'a ObjRef, PropertyError> {
    match target {
        Value::Object(obj) if !obj.is_dyna_bean() => Ok(obj),
        other => Err(PropertyError::unknown(
            name,
            other.runtime_type(),
            MissingReason::NotABean,
        )),
    }
}

/// The failure for a property with no suitable accessor: `reason` if the
/// property exists at all.
fn missing(obj: &ObjRef, name: &str, exists: bool, reason: MissingReason) -> PropertyError {
    let reason = if exists {
        reason
    } else {
        MissingReason::NoSuchProperty
    };
    PropertyError::unknown(name, obj.class_info().name(), reason)
}

fn index_arg(name: &str, index: usize) -> Result<Value, PropertyError> {
    i32::try_from(index).map(Value::I32).map_err(|_| {
        PropertyError::from_invoke(
            name,
            InvokeError::Failed(format!("index {index} exceeds the accessor range")),
        )
    })
}

fn call(method: &MethodInfo, obj: &ObjRef, name: &str, args: &[Value]) -> Result<Value, PropertyError> {
    method
        .invoke(obj, args)
        .map_err(|e| PropertyError::from_invoke(name, e))
}

/// The element type of a container type.
fn element_of(ty: &Type) -> Option<Type> {
    match ty {
        Type::Array(element) => Some(Type::clone(element)),
        Type::List => Some(Type::Any),
        _ => None,
    }
}

impl PropertyAdapter for ConventionalAdapter {
    fn name(&self) -> &'static str {
        "conventional"
    }

    fn matches(&self, target: &Value) -> bool {
        matches!(target, Value::Object(obj) if !obj.is_dyna_bean())
    }

    fn get_simple(&self, cx: &BeanAccess, target: &Value, name: &str) -> Result<Value, PropertyError> {
        let obj = object(target, name)?;
        let descriptors = cx.describe(obj.class_info())?;
        let descriptor = descriptors.get(name);
        match descriptor.and_then(PropertyDescriptor::read_method) {
            Some(read) => call(read, obj, name, &[]),
            None => Err(missing(obj, name, descriptor.is_some(), MissingReason::NoReader)),
        }
    }

    fn set_simple(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        let obj = object(target, name)?;
        let descriptors = cx.describe(obj.class_info())?;
        let descriptor = descriptors.get(name);
        let Some(write) = descriptor.and_then(PropertyDescriptor::write_method) else {
            return Err(missing(obj, name, descriptor.is_some(), MissingReason::NoWriter));
        };
        let declared = write.params().first().cloned().unwrap_or(Type::Any);
        let value = cx.coerce(name, &declared, value)?;
        call(write, obj, name, &[value]).map(drop)
    }

    fn get_indexed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        index: usize,
    ) -> Result<Value, PropertyError> {
        let obj = object(target, name)?;
        let descriptors = cx.describe(obj.class_info())?;
        let descriptor = descriptors.get(name);

        if let Some(read) = descriptor.and_then(PropertyDescriptor::indexed_read_method) {
            return call(read, obj, name, &[index_arg(name, index)?]);
        }
        if let Some(read) = descriptor.and_then(PropertyDescriptor::read_method) {
            let container = call(read, obj, name, &[])?;
            return container::get_index(name, &container, index);
        }
        Err(missing(obj, name, descriptor.is_some(), MissingReason::NoReader))
    }

    fn set_indexed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        index: usize,
        value: Value,
    ) -> Result<(), PropertyError> {
        let obj = object(target, name)?;
        let descriptors = cx.describe(obj.class_info())?;
        let descriptor = descriptors.get(name);

        if let Some(write) = descriptor.and_then(PropertyDescriptor::indexed_write_method) {
            let declared = write.params().get(1).cloned().unwrap_or(Type::Any);
            let value = cx.coerce(name, &declared, value)?;
            return call(write, obj, name, &[index_arg(name, index)?, value]).map(drop);
        }
        if let Some(read) = descriptor.and_then(PropertyDescriptor::read_method) {
            let container = call(read, obj, name, &[])?;
            let value = match container::element_type(&container) {
                Some(element) => cx.coerce(name, &element, value)?,
                None => value,
            };
            return container::set_index(name, &container, index, value);
        }
        Err(missing(obj, name, descriptor.is_some(), MissingReason::NoWriter))
    }

    fn get_keyed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        key: &str,
    ) -> Result<Value, PropertyError> {
        let obj = object(target, name)?;
        let mapped = cx.describe_mapped(obj.class_info());
        let keyed = mapped.get(name);
        if let Some(read) = keyed.and_then(MappedPropertyDescriptor::read_method) {
            return call(read, obj, name, &[Value::from(key)]);
        }

        let descriptors = cx.describe(obj.class_info())?;
        let descriptor = descriptors.get(name);
        if let Some(read) = descriptor.and_then(PropertyDescriptor::read_method) {
            let container = call(read, obj, name, &[])?;
            return container::get_key(name, &container, key);
        }
        let exists = keyed.is_some() || descriptor.is_some();
        Err(missing(obj, name, exists, MissingReason::NoReader))
    }

    fn set_keyed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        key: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        let obj = object(target, name)?;
        let mapped = cx.describe_mapped(obj.class_info());
        let keyed = mapped.get(name);
        if let Some(descriptor) = keyed
            && let Some(write) = descriptor.write_method()
        {
            let value = cx.coerce(name, descriptor.value_type(), value)?;
            return call(write, obj, name, &[Value::from(key), value]).map(drop);
        }

        let descriptors = cx.describe(obj.class_info())?;
        let descriptor = descriptors.get(name);
        if let Some(read) = descriptor.and_then(PropertyDescriptor::read_method) {
            let container = call(read, obj, name, &[])?;
            return container::set_key(name, &container, key, value);
        }
        let exists = keyed.is_some() || descriptor.is_some();
        Err(missing(obj, name, exists, MissingReason::NoWriter))
    }

    fn is_readable(&self, cx: &BeanAccess, target: &Value, name: &str) -> bool {
        let Ok(obj) = object(target, name) else {
            return false;
        };
        let simple = cx.describe(obj.class_info()).is_ok_and(|descriptors| {
            descriptors
                .get(name)
                .is_some_and(|d| d.is_readable() || d.indexed_read_method().is_some())
        });
        simple
            || cx
                .describe_mapped(obj.class_info())
                .get(name)
                .is_some_and(|d| d.read_method().is_some())
    }

    fn is_writeable(&self, cx: &BeanAccess, target: &Value, name: &str) -> bool {
        let Ok(obj) = object(target, name) else {
            return false;
        };
        let simple = cx.describe(obj.class_info()).is_ok_and(|descriptors| {
            descriptors
                .get(name)
                .is_some_and(|d| d.is_writeable() || d.indexed_write_method().is_some())
        });
        simple
            || cx
                .describe_mapped(obj.class_info())
                .get(name)
                .is_some_and(|d| d.write_method().is_some())
    }

    fn property_type(
        &self,
        cx: &BeanAccess,
        target: &Value,
        segment: &Segment,
    ) -> Result<Option<Type>, PropertyError> {
        let name = segment.name();
        let obj = object(target, name)?;
        let descriptors = cx.describe(obj.class_info())?;
        let descriptor = descriptors.get(name);
        let declared = descriptor.and_then(PropertyDescriptor::property_type);

        let found = match segment {
            Segment::Simple(_) => descriptor.map(|_| declared.cloned()),
            Segment::Indexed(..) => descriptor.map(|d| {
                d.indexed_type()
                    .cloned()
                    .or_else(|| declared.and_then(element_of))
            }),
            Segment::Keyed(..) => {
                let mapped = cx.describe_mapped(obj.class_info());
                match mapped.get(name) {
                    Some(keyed) => Some(Some(keyed.value_type().clone())),
                    None => descriptor.map(|_| declared.filter(|t| t.is_mapped()).map(|_| Type::Any)),
                }
            }
        };
        found.ok_or_else(|| missing(obj, name, false, MissingReason::NoSuchProperty))
    }

    fn property_names(&self, cx: &BeanAccess, target: &Value) -> Result<Vec<String>, PropertyError> {
        let obj = object(target, "")?;
        let descriptors = cx.describe(obj.class_info())?;
        Ok(descriptors
            .iter()
            .filter(|d| d.is_readable())
            .map(|d| d.name().to_owned())
            .collect())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::access::BeanAccess;
    use crate::error::{MissingReason, PropertyError};
    use crate::testing::{Person, ReadOnly};
    use crate::ty::Type;
    use crate::value::{ArrayRef, ListRef, Value};

    #[test]
    fn indexed_accessor_is_preferred() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        // `tag` only has indexed accessors backed by a growable vector.
        access.set_indexed(&person, "tag", 0, Value::from("a")).unwrap();
        assert_eq!(access.get_indexed(&person, "tag", 0).unwrap(), Value::from("a"));
        assert!(matches!(
            access.get_indexed(&person, "tag", 4),
            Err(PropertyError::IndexOutOfRange { len: Some(1), .. })
        ));
        let err = access.get_simple(&person, "tag").unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::NoReader));
    }

    #[test]
    fn getter_containers_are_indexed() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        assert!(matches!(
            access.get_indexed(&person, "nicknames", 0),
            Err(PropertyError::NestedNull { .. })
        ));

        access
            .set_simple(&person, "nicknames", Value::List(ListRef::from_vec(vec![Value::from("x")])))
            .unwrap();
        assert_eq!(access.get_indexed(&person, "nicknames", 0).unwrap(), Value::from("x"));
        // No growth on conventional objects.
        assert!(matches!(
            access.set_indexed(&person, "nicknames", 3, Value::from("y")),
            Err(PropertyError::IndexOutOfRange { len: Some(1), .. })
        ));

        access
            .set_simple(&person, "scores", Value::Array(ArrayRef::new(Type::I32, 2)))
            .unwrap();
        access.set_indexed(&person, "scores", 1, Value::I32(9)).unwrap();
        assert_eq!(access.get_indexed(&person, "scores", 1).unwrap(), Value::I32(9));
        assert!(matches!(
            access.set_indexed(&person, "scores", 0, Value::from("nine")),
            Err(PropertyError::TypeMismatch { .. })
        ));

        // `age` is not a container.
        assert!(matches!(
            access.get_indexed(&person, "age", 0),
            Err(PropertyError::IndexOutOfRange { len: None, .. })
        ));
    }

    #[test]
    fn keyed_accessor_is_preferred() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        access.set_mapped(&person, "address", "home", Value::from("here")).unwrap();
        assert_eq!(access.get_mapped(&person, "address", "home").unwrap(), Value::from("here"));
        // The keyed accessors store into the `addresses` map.
        assert_eq!(access.get_mapped(&person, "addresses", "home").unwrap(), Value::from("here"));
        assert_eq!(access.get_mapped(&person, "addresses", "work").unwrap(), Value::Null);

        let err = access.get_mapped(&person, "age", "x").unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::NotMapped));
        let err = access.get_mapped(&person, "nothing", "x").unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::NoSuchProperty));
    }

    #[test]
    fn readability() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        let read_only = Value::object(ReadOnly::new("Oslo"));
        assert!(access.is_readable(&person, "tag"));
        assert!(access.is_readable(&person, "address"));
        assert!(access.is_writeable(&person, "age"));
        assert!(access.is_readable(&read_only, "city"));
        assert!(!access.is_writeable(&read_only, "city"));
        assert!(!access.is_readable(&person, "class"));
    }

    #[test]
    fn declared_types() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        assert_eq!(access.property_type(&person, "age").unwrap(), Some(Type::I32));
        assert_eq!(access.property_type(&person, "tag[0]").unwrap(), Some(Type::Str));
        assert_eq!(access.property_type(&person, "scores[0]").unwrap(), Some(Type::I32));
        assert_eq!(access.property_type(&person, "address(a)").unwrap(), Some(Type::Any));
        assert_eq!(access.property_type(&person, "addresses(a)").unwrap(), Some(Type::Any));
        assert!(access.property_type(&person, "nothing").is_err());
    }
}
