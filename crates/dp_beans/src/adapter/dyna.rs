use crate::access::BeanAccess;
use crate::adapter::PropertyAdapter;
use crate::dyna::{DynaBean, DynaProperty};
use crate::error::{MissingReason, PropertyError};
use crate::expr::Segment;
use crate::ty::Type;
use crate::value::{ObjRef, Value};

/// Dynamic bags, accessed through their own [`DynaBean`] methods.
///
/// With a converter configured, values are converted to the declared type
/// of the property (or of its elements) before the bag sees them. Without
/// one, the bag's own checks apply.
#[derive(Debug, Clone, Copy, Default)]
pub struct DynaBeanAdapter;

fn bag<'a>(target: &'a Value, name: &str) -> Result<&'a ObjRef, PropertyError> {
    match target {
        Value::Object(obj) if obj.is_dyna_bean() => Ok(obj),
        other => Err(PropertyError::unknown(
            name,
            other.runtime_type(),
            MissingReason::NotABean,
        )),
    }
}

/// Runs `f` with the bag write-locked.
fn with_bag<R>(
    obj: &ObjRef,
    name: &str,
    f: impl FnOnce(&mut dyn DynaBean) -> Result<R, PropertyError>,
) -> Result<R, PropertyError> {
    obj.with_dyna(f).unwrap_or_else(|| {
        Err(PropertyError::unknown(
            name,
            obj.class_info().name(),
            MissingReason::NotABean,
        ))
    })
}

fn declared(obj: &ObjRef, name: &str) -> Option<DynaProperty> {
    let guard = obj.read();
    guard.as_dyna_bean()?.schema().property(name)
}

impl PropertyAdapter for DynaBeanAdapter {
    fn name(&self) -> &'static str {
        "dyna-bean"
    }

    fn matches(&self, target: &Value) -> bool {
        matches!(target, Value::Object(obj) if obj.is_dyna_bean())
    }

    fn get_simple(&self, _cx: &BeanAccess, target: &Value, name: &str) -> Result<Value, PropertyError> {
        with_bag(bag(target, name)?, name, |b| b.get(name))
    }

    fn set_simple(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        let obj = bag(target, name)?;
        let value = match declared(obj, name) {
            Some(property) => cx.convert_for(name, property.property_type(), value)?,
            None => value,
        };
        with_bag(obj, name, |b| b.set(name, value))
    }

    fn get_indexed(
        &self,
        _cx: &BeanAccess,
        target: &Value,
        name: &str,
        index: usize,
    ) -> Result<Value, PropertyError> {
        with_bag(bag(target, name)?, name, |b| b.get_indexed(name, index))
    }

    fn set_indexed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        index: usize,
        value: Value,
    ) -> Result<(), PropertyError> {
        let obj = bag(target, name)?;
        let value = match declared(obj, name) {
            Some(property) => cx.convert_for(name, &property.element_type(), value)?,
            None => value,
        };
        with_bag(obj, name, |b| b.set_indexed(name, index, value))
    }

    fn get_keyed(
        &self,
        _cx: &BeanAccess,
        target: &Value,
        name: &str,
        key: &str,
    ) -> Result<Value, PropertyError> {
        with_bag(bag(target, name)?, name, |b| b.get_mapped(name, key))
    }

    fn set_keyed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        key: &str,
        value: Value,
    ) -> Result<(), PropertyError> {
        let obj = bag(target, name)?;
        let value = match declared(obj, name).as_ref().and_then(DynaProperty::content_type) {
            Some(content) => cx.convert_for(name, content, value)?,
            None => value,
        };
        with_bag(obj, name, |b| b.set_mapped(name, key, value))
    }

    fn is_readable(&self, _cx: &BeanAccess, target: &Value, name: &str) -> bool {
        let Ok(obj) = bag(target, name) else {
            return false;
        };
        let guard = obj.read();
        guard.as_dyna_bean().is_some_and(|b| b.is_readable(name))
    }

    fn is_writeable(&self, _cx: &BeanAccess, target: &Value, name: &str) -> bool {
        let Ok(obj) = bag(target, name) else {
            return false;
        };
        let guard = obj.read();
        guard.as_dyna_bean().is_some_and(|b| b.is_writeable(name))
    }

    fn property_type(
        &self,
        _cx: &BeanAccess,
        target: &Value,
        segment: &Segment,
    ) -> Result<Option<Type>, PropertyError> {
        let obj = bag(target, segment.name())?;
        Ok(declared(obj, segment.name()).map(|property| match segment {
            Segment::Simple(_) => property.property_type().clone(),
            Segment::Indexed(..) => property.element_type(),
            Segment::Keyed(..) => property.content_type().cloned().unwrap_or(Type::Any),
        }))
    }

    fn property_names(&self, _cx: &BeanAccess, target: &Value) -> Result<Vec<String>, PropertyError> {
        let obj = bag(target, "")?;
        let guard = obj.read();
        Ok(guard
            .as_dyna_bean()
            .map(|b| {
                b.schema()
                    .properties()
                    .into_iter()
                    .map(|p| p.name().to_owned())
                    .collect()
            })
            .unwrap_or_default())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use crate::access::BeanAccess;
    use crate::convert::ConversionError;
    use crate::dyna::{AutoSchemaBag, BasicDynaClass, DynaProperty, LazyDynaClass, MutableDynaClass};
    use crate::error::{MissingReason, PropertyError};
    use crate::ty::Type;
    use crate::value::Value;

    fn parse_ints(value: Value, target: &Type) -> Result<Value, ConversionError> {
        match (&value, target) {
            (Value::Str(s), t) if *t == Type::I32 => s
                .parse()
                .map(Value::I32)
                .map_err(|e| ConversionError::new(&value, target, format!("{e}"))),
            _ => Err(ConversionError::new(&value, target, "unsupported")),
        }
    }

    #[test]
    fn bags_check_types_without_a_converter() {
        let access = BeanAccess::new();
        let schema = BasicDynaClass::new("p", [DynaProperty::new("age", Type::I32)]);
        let bag = schema.instantiate();
        assert!(matches!(
            access.set_simple(&bag, "age", Value::from("41")),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }

    #[test]
    fn converter_runs_before_the_bag() {
        let access = BeanAccess::builder().converter(Arc::new(parse_ints)).build();
        let schema = BasicDynaClass::new("p", [
            DynaProperty::new("age", Type::I32),
            DynaProperty::with_content_type("scores", Type::List, Type::I32),
        ]);
        let bag = schema.instantiate();
        access.set_simple(&bag, "age", Value::from("41")).unwrap();
        assert_eq!(access.get_simple(&bag, "age").unwrap(), Value::I32(41));
        assert!(matches!(
            access.set_simple(&bag, "age", Value::from("old")),
            Err(PropertyError::TypeMismatch { .. })
        ));

        access.set_simple(&bag, "scores", Value::list([0_i32])).unwrap();
        access.set_indexed(&bag, "scores", 0, Value::from("7")).unwrap();
        assert_eq!(access.get_indexed(&bag, "scores", 0).unwrap(), Value::I32(7));
    }

    #[test]
    fn readability_follows_the_bag() {
        let access = BeanAccess::new();
        let fixed = BasicDynaClass::new("p", [DynaProperty::new("age", Type::I32)]).instantiate();
        assert!(access.is_readable(&fixed, "age"));
        assert!(!access.is_readable(&fixed, "other"));

        let schema = LazyDynaClass::named("lazy");
        let lazy = Value::object(AutoSchemaBag::with_schema(schema.clone()));
        assert!(access.is_writeable(&lazy, "anything"));
        schema.set_restricted(true);
        assert!(!access.is_writeable(&lazy, "anything"));
        let err = access.write(&lazy, "anything", 1_i32).unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::Restricted));
    }

    #[test]
    fn declared_types() {
        let access = BeanAccess::new();
        let bag = BasicDynaClass::new("p", [
            DynaProperty::with_content_type("tags", Type::List, Type::Str),
            DynaProperty::new("attrs", Type::Map),
        ])
        .instantiate();
        assert_eq!(access.property_type(&bag, "tags").unwrap(), Some(Type::List));
        assert_eq!(access.property_type(&bag, "tags[0]").unwrap(), Some(Type::Str));
        assert_eq!(access.property_type(&bag, "attrs(k)").unwrap(), Some(Type::Any));
        assert_eq!(access.property_type(&bag, "other").unwrap(), None);
    }
}
