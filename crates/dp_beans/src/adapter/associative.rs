use crate::access::BeanAccess;
use crate::adapter::PropertyAdapter;
use crate::error::{MissingReason, PropertyError};
use crate::expr::Segment;
use crate::ty::Type;
use crate::value::{MapRef, Value};

/// [`Value::Map`] targets, treated as flat key-value stores.
///
/// A simple name is a key. Named indexed or keyed access (`m.list[0]`,
/// `m.attrs(k)` on a map `m`) is not supported and fails with
/// [`MissingReason::Unsupported`]; address the entry itself and index the
/// value from there instead.
#[derive(Debug, Clone, Copy, Default)]
pub struct AssociativeAdapter;

fn map<'a>(target: &'a Value, name: &str) -> Result<&'a MapRef, PropertyError> {
    match target {
        Value::Map(map) => Ok(map),
        other => Err(PropertyError::unknown(
            name,
            other.runtime_type(),
            MissingReason::NotABean,
        )),
    }
}

fn unsupported(name: &str) -> PropertyError {
    PropertyError::unknown(name, Type::Map, MissingReason::Unsupported)
}

impl PropertyAdapter for AssociativeAdapter {
    fn name(&self) -> &'static str {
        "associative"
    }

    fn matches(&self, target: &Value) -> bool {
        matches!(target, Value::Map(_))
    }

    fn get_simple(&self, _cx: &BeanAccess, target: &Value, name: &str) -> Result<Value, PropertyError> {
        Ok(map(target, name)?.get(name).unwrap_or_default())
    }

    fn set_simple(
        &self,
        _cx: &BeanAccess,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        map(target, name)?.insert(name, value);
        Ok(())
    }

    fn get_indexed(
        &self,
        _cx: &BeanAccess,
        _target: &Value,
        name: &str,
        _index: usize,
    ) -> Result<Value, PropertyError> {
        Err(unsupported(name))
    }

    fn set_indexed(
        &self,
        _cx: &BeanAccess,
        _target: &Value,
        name: &str,
        _index: usize,
        _value: Value,
    ) -> Result<(), PropertyError> {
        Err(unsupported(name))
    }

    fn get_keyed(
        &self,
        _cx: &BeanAccess,
        _target: &Value,
        name: &str,
        _key: &str,
    ) -> Result<Value, PropertyError> {
        Err(unsupported(name))
    }

    fn set_keyed(
        &self,
        _cx: &BeanAccess,
        _target: &Value,
        name: &str,
        _key: &str,
        _value: Value,
    ) -> Result<(), PropertyError> {
        Err(unsupported(name))
    }

    fn is_readable(&self, _cx: &BeanAccess, target: &Value, _name: &str) -> bool {
        self.matches(target)
    }

    fn is_writeable(&self, _cx: &BeanAccess, target: &Value, _name: &str) -> bool {
        self.matches(target)
    }

    /// The runtime type of the entry, [`Type::Any`] if it is absent or
    /// `Null`.
    fn property_type(
        &self,
        _cx: &BeanAccess,
        target: &Value,
        segment: &Segment,
    ) -> Result<Option<Type>, PropertyError> {
        let Segment::Simple(name) = segment else {
            return Err(unsupported(segment.name()));
        };
        let ty = match map(target, name)?.get(name) {
            Some(Value::Null) | None => Type::Any,
            Some(value) => value.runtime_type(),
        };
        Ok(Some(ty))
    }

    fn property_names(&self, _cx: &BeanAccess, target: &Value) -> Result<Vec<String>, PropertyError> {
        Ok(map(target, "")?.keys())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::access::BeanAccess;
    use crate::error::MissingReason;
    use crate::ty::Type;
    use crate::value::{MapRef, Value};

    #[test]
    fn keys_are_properties() {
        let access = BeanAccess::new();
        let map = MapRef::new();
        let root = Value::Map(map.clone());
        access.write(&root, "a", 1_i32).unwrap();
        assert_eq!(map.get("a"), Some(Value::I32(1)));
        assert_eq!(access.read(&root, "a").unwrap(), Value::I32(1));
        assert_eq!(access.read(&root, "missing").unwrap(), Value::Null);
        assert!(access.is_readable(&root, "missing"));
        assert_eq!(access.property_type(&root, "a").unwrap(), Some(Type::boxed(crate::ty::Primitive::I32)));
    }

    #[test]
    fn named_sub_access_is_unsupported() {
        let access = BeanAccess::new();
        let root = Value::map([("list", Value::list([1_i32]))]);
        for expression in ["list[0]", "list(k)"] {
            let err = access.read(&root, expression).unwrap_err();
            assert_eq!(err.missing_reason(), Some(MissingReason::Unsupported));
        }
        // The entry itself is reachable, and indexable from there.
        let list = access.read(&root, "list").unwrap();
        assert_eq!(access.read(&list, "[0]").unwrap(), Value::I32(1));
    }
}
