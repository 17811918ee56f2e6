//! Element access on container values, shared by adapters and bags.
//!
//! `property` only labels errors. A `Null` container fails with
//! [`PropertyError::NestedNull`], since the property exists but holds
//! nothing to index into.

use crate::error::{MissingReason, PropertyError};
use crate::ty::Type;
use crate::value::Value;

fn not_indexed(property: &str, index: usize) -> PropertyError {
    PropertyError::IndexOutOfRange {
        property: property.to_owned(),
        index,
        len: None,
    }
}

fn out_of_range(property: &str, index: usize, len: usize) -> PropertyError {
    PropertyError::IndexOutOfRange {
        property: property.to_owned(),
        index,
        len: Some(len),
    }
}

fn not_mapped(property: &str, container: &Value) -> PropertyError {
    PropertyError::unknown(property, container.runtime_type(), MissingReason::NotMapped)
}

/// Checks `value` against the element type of an array slot.
pub(crate) fn check_element(property: &str, element: &Type, value: &Value) -> Result<(), PropertyError> {
    if value.is_null() && element.is_primitive() {
        return Err(PropertyError::NullForPrimitive {
            property: property.to_owned(),
            ty: element.clone(),
        });
    }
    if !element.accepts(value) {
        return Err(PropertyError::TypeMismatch {
            property: property.to_owned(),
            expected: element.clone(),
            found: value.runtime_type(),
        });
    }
    Ok(())
}

/// The declared element type of an indexed container value.
pub(crate) fn element_type(container: &Value) -> Option<Type> {
    match container {
        Value::Array(array) => Some(array.element_type()),
        Value::List(_) => Some(Type::Any),
        _ => None,
    }
}

pub(crate) fn get_index(property: &str, container: &Value, index: usize) -> Result<Value, PropertyError> {
    match container {
        Value::Array(array) => array
            .get(index)
            .ok_or_else(|| out_of_range(property, index, array.len())),
        Value::List(list) => list
            .get(index)
            .ok_or_else(|| out_of_range(property, index, list.len())),
        Value::Null => Err(PropertyError::nested_null(property)),
        _ => Err(not_indexed(property, index)),
    }
}

pub(crate) fn set_index(
    property: &str,
    container: &Value,
    index: usize,
    value: Value,
) -> Result<(), PropertyError> {
    match container {
        Value::Array(array) => {
            let len = array.len();
            if index >= len {
                return Err(out_of_range(property, index, len));
            }
            check_element(property, &array.element_type(), &value)?;
            array
                .set(index, value)
                .map(drop)
                .ok_or_else(|| out_of_range(property, index, array.len()))
        }
        Value::List(list) => list
            .set(index, value)
            .map(drop)
            .ok_or_else(|| out_of_range(property, index, list.len())),
        Value::Null => Err(PropertyError::nested_null(property)),
        _ => Err(not_indexed(property, index)),
    }
}

/// Reads `key`; a missing key reads as `Null`.
pub(crate) fn get_key(property: &str, container: &Value, key: &str) -> Result<Value, PropertyError> {
    match container {
        Value::Map(map) => Ok(map.get(key).unwrap_or_default()),
        Value::Null => Err(PropertyError::nested_null(property)),
        other => Err(not_mapped(property, other)),
    }
}

pub(crate) fn set_key(
    property: &str,
    container: &Value,
    key: &str,
    value: Value,
) -> Result<(), PropertyError> {
    match container {
        Value::Map(map) => {
            map.insert(key, value);
            Ok(())
        }
        Value::Null => Err(PropertyError::nested_null(property)),
        other => Err(not_mapped(property, other)),
    }
}

/// `Null` holds no keys.
pub(crate) fn contains_key(property: &str, container: &Value, key: &str) -> Result<bool, PropertyError> {
    match container {
        Value::Map(map) => Ok(map.contains_key(key)),
        Value::Null => Ok(false),
        other => Err(not_mapped(property, other)),
    }
}

/// Removing from `Null` does nothing.
pub(crate) fn remove_key(property: &str, container: &Value, key: &str) -> Result<(), PropertyError> {
    match container {
        Value::Map(map) => {
            map.remove(key);
            Ok(())
        }
        Value::Null => Ok(()),
        other => Err(not_mapped(property, other)),
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{get_index, get_key, set_index};
    use crate::error::PropertyError;
    use crate::ty::Type;
    use crate::value::{ArrayRef, Value};

    #[test]
    fn index_errors() {
        let list = Value::list([1_i32]);
        assert!(matches!(
            get_index("l", &list, 3),
            Err(PropertyError::IndexOutOfRange { len: Some(1), .. })
        ));
        assert!(matches!(
            get_index("s", &Value::from("x"), 0),
            Err(PropertyError::IndexOutOfRange { len: None, .. })
        ));
        assert!(matches!(
            get_index("n", &Value::Null, 0),
            Err(PropertyError::NestedNull { .. })
        ));
    }

    #[test]
    fn arrays_check_elements() {
        let array = Value::Array(ArrayRef::new(Type::I32, 2));
        assert!(set_index("a", &array, 1, Value::I32(4)).is_ok());
        assert!(matches!(
            set_index("a", &array, 0, Value::Null),
            Err(PropertyError::NullForPrimitive { .. })
        ));
        assert!(matches!(
            set_index("a", &array, 0, Value::from("x")),
            Err(PropertyError::TypeMismatch { .. })
        ));
        assert_eq!(get_index("a", &array, 1).unwrap(), Value::I32(4));
    }

    #[test]
    fn missing_keys_read_as_null() {
        let map = Value::map([("a", 1_i32)]);
        assert_eq!(get_key("m", &map, "b").unwrap(), Value::Null);
        assert!(get_key("m", &Value::I32(1), "a").is_err());
    }
}
