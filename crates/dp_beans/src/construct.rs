//! The instance-construction collaborator.
//!
//! Bags and auto-provisioning ask an [`InstanceFactory`] for default values
//! of declared types. [`DefaultInstanceFactory`] covers the built-in types;
//! a closure can stand in for a custom one.

use thiserror::Error;

use crate::dyna::AutoSchemaBag;
use crate::ty::Type;
use crate::value::{ArrayRef, ListRef, MapRef, Value};

// -----------------------------------------------------------------------------
// ConstructError

/// Failure to build an instance of a declared type.
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum ConstructError {
    #[error("class `{0}` has no default constructor")]
    NoConstructor(&'static str),
    #[error("cannot construct a value of type {0}")]
    Unsupported(Type),
    #[error("construction failed: {0}")]
    Failed(String),
}

// -----------------------------------------------------------------------------
// InstanceFactory

/// Builds fresh instances of declared types.
pub trait InstanceFactory: Send + Sync {
    fn construct(&self, ty: &Type) -> Result<Value, ConstructError>;
}

impl<F> InstanceFactory for F
where
    F: Fn(&Type) -> Result<Value, ConstructError> + Send + Sync,
{
    #[inline]
    fn construct(&self, ty: &Type) -> Result<Value, ConstructError> {
        self(ty)
    }
}

/// The built-in construction rules.
///
/// | type | instance |
/// |------|----------|
/// | primitive, boxed | zero |
/// | string | `""` |
/// | any | `Null` |
/// | array | empty array of the element type |
/// | list, map | empty container |
/// | dyna-bean | new [`AutoSchemaBag`] |
/// | dyna-bean of a schema | [`DynaClass::new_instance`] |
/// | class | its default constructor |
///
/// [`DynaClass::new_instance`]: crate::dyna::DynaClass::new_instance
///
/// # Examples
///
/// ```
/// use dp_beans::construct::{DefaultInstanceFactory, InstanceFactory};
/// use dp_beans::{Type, Value};
///
/// let factory = DefaultInstanceFactory;
/// assert_eq!(factory.construct(&Type::I64).unwrap(), Value::I64(0));
/// assert_eq!(factory.construct(&Type::List).unwrap(), Value::list(Vec::<Value>::new()));
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultInstanceFactory;

impl InstanceFactory for DefaultInstanceFactory {
    fn construct(&self, ty: &Type) -> Result<Value, ConstructError> {
        Ok(match ty {
            Type::Primitive(p) | Type::Boxed(p) => p.zero(),
            Type::Str => Value::Str(String::new()),
            Type::Any => Value::Null,
            Type::Array(element) => Value::Array(ArrayRef::new(Type::clone(element), 0)),
            Type::List => Value::List(ListRef::new()),
            Type::Map => Value::Map(MapRef::new()),
            Type::DynaBean => Value::object(AutoSchemaBag::new()),
            Type::DynaClass(schema) => schema
                .new_instance()
                .map_err(|e| ConstructError::Failed(e.to_string()))?,
            Type::Class(class) => class
                .construct()
                .ok_or(ConstructError::NoConstructor(class.name()))?,
        })
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ConstructError, DefaultInstanceFactory, InstanceFactory};
    use crate::class::Class;
    use crate::testing::{Address, ReadOnly};
    use crate::ty::Type;
    use crate::value::Value;

    #[test]
    fn classes_use_their_default_constructor() {
        let value = DefaultInstanceFactory.construct(&Type::Class(Address::class())).unwrap();
        assert_eq!(value.as_object().unwrap().class_info().name(), "Address");

        let err = DefaultInstanceFactory
            .construct(&Type::Class(ReadOnly::class()))
            .unwrap_err();
        assert_eq!(err, ConstructError::NoConstructor("ReadOnly"));
    }

    #[test]
    fn bags_and_containers() {
        let bag = DefaultInstanceFactory.construct(&Type::DynaBean).unwrap();
        assert!(bag.as_object().unwrap().is_dyna_bean());
        let array = DefaultInstanceFactory.construct(&Type::array(Type::Str)).unwrap();
        assert_eq!(array.as_array().unwrap().element_type(), Type::Str);
        assert_eq!(DefaultInstanceFactory.construct(&Type::Any).unwrap(), Value::Null);
    }

    #[test]
    fn closures_are_factories() {
        let factory = |_: &Type| Ok::<_, ConstructError>(Value::I32(7));
        assert_eq!(factory.construct(&Type::Any).unwrap(), Value::I32(7));
    }
}
