use log::trace;

use crate::access::BeanAccess;
use crate::error::PropertyError;
use crate::value::{MapRef, Value};

impl BeanAccess {
    /// Collects every readable simple property of `bean` into a new map.
    ///
    /// Properties with only indexed or keyed accessors are not included.
    ///
    /// # Examples
    ///
    /// ```
    /// use dp_beans::{BeanAccess, Value};
    /// use dp_beans::dyna::AutoSchemaBag;
    ///
    /// let access = BeanAccess::new();
    /// let bag = Value::object(AutoSchemaBag::new());
    /// access.write(&bag, "name", "Ann").unwrap();
    ///
    /// let map = access.describe_bean(&bag).unwrap();
    /// assert_eq!(map.get("name"), Some(Value::from("Ann")));
    /// ```
    pub fn describe_bean(&self, bean: &Value) -> Result<MapRef, PropertyError> {
        let adapter = self.adapter_for(bean, "")?;
        let out = MapRef::new();
        for name in adapter.property_names(self, bean)? {
            if adapter.is_readable(self, bean, &name) {
                let value = adapter.get_simple(self, bean, &name)?;
                out.insert(name, value);
            }
        }
        Ok(out)
    }

    /// Copies every simple property readable on `orig` and writeable on
    /// `dest`. Values pass through [`coerce`](Self::coerce) on the way in.
    ///
    /// The first failing write stops the copy; properties copied before it
    /// stay written.
    pub fn copy_properties(&self, dest: &Value, orig: &Value) -> Result<(), PropertyError> {
        let source = self.adapter_for(orig, "")?;
        let sink = self.adapter_for(dest, "")?;
        for name in source.property_names(self, orig)? {
            if !source.is_readable(self, orig, &name) || !sink.is_writeable(self, dest, &name) {
                trace!("copy_properties: skipping `{name}`");
                continue;
            }
            let value = source.get_simple(self, orig, &name)?;
            sink.set_simple(self, dest, &name, value)?;
        }
        Ok(())
    }

    /// Writes each entry of `values` to `bean`, keys read as expressions.
    ///
    /// Any failing entry aborts with its error.
    pub fn populate(&self, bean: &Value, values: &MapRef) -> Result<(), PropertyError> {
        let mut entries = values.entries();
        entries.sort_by(|a, b| a.0.cmp(&b.0));
        for (expression, value) in entries {
            self.write(bean, &expression, value)?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use crate::access::BeanAccess;
    use crate::dyna::{AutoSchemaBag, BasicDynaClass, DynaProperty};
    use crate::error::{MissingReason, PropertyError};
    use crate::testing::{Address, Person};
    use crate::ty::Type;
    use crate::value::{MapRef, Value};

    #[test]
    fn describe_object() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        access.write(&person, "name", "Ann").unwrap();
        access.write(&person, "age", 41_i32).unwrap();

        let map = access.describe_bean(&person).unwrap();
        assert_eq!(map.get("name"), Some(Value::from("Ann")));
        assert_eq!(map.get("age"), Some(Value::I32(41)));
        assert_eq!(map.get("friend"), Some(Value::Null));
        // Indexed-only accessor.
        assert!(!map.contains_key("tag"));
        assert!(!map.contains_key("class"));
    }

    #[test]
    fn copy_between_shapes() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        access.write(&person, "name", "Ann").unwrap();
        access.write(&person, "age", 41_i32).unwrap();

        let bag = Value::object(AutoSchemaBag::new());
        access.copy_properties(&bag, &person).unwrap();
        assert_eq!(access.read(&bag, "name").unwrap(), Value::from("Ann"));
        assert_eq!(access.read(&bag, "age").unwrap(), Value::I32(41));

        let copy = Value::object(Person::default());
        access.write(&bag, "extra", "ignored").unwrap();
        access.copy_properties(&copy, &bag).unwrap();
        assert_eq!(access.read(&copy, "name").unwrap(), Value::from("Ann"));
        assert_eq!(access.read(&copy, "age").unwrap(), Value::I32(41));
    }

    #[test]
    fn copy_skips_unwriteable_names() {
        let access = BeanAccess::new();
        let fixed = BasicDynaClass::new("p", [DynaProperty::new("name", Type::Str)]).instantiate();
        let person = Value::object(Person::default());
        access.write(&person, "name", "Ann").unwrap();
        access.copy_properties(&fixed, &person).unwrap();
        assert_eq!(access.read(&fixed, "name").unwrap(), Value::from("Ann"));
    }

    #[test]
    fn populate_writes_expressions() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        let values = MapRef::new();
        values.insert("name", "Ann");
        values.insert("address(home)", Value::object(Address::default()));
        values.insert("address(home).city", "Oslo");
        access.populate(&person, &values).unwrap();

        assert_eq!(access.read(&person, "name").unwrap(), Value::from("Ann"));
        assert_eq!(
            access.read(&person, "address(home).city").unwrap(),
            Value::from("Oslo")
        );
    }

    #[test]
    fn populate_is_strict() {
        let access = BeanAccess::new();
        let person = Value::object(Person::default());
        let values = MapRef::new();
        values.insert("nope", 1_i32);
        let err = access.populate(&person, &values).unwrap_err();
        assert_eq!(err.missing_reason(), Some(MissingReason::NoSuchProperty));

        let values = MapRef::new();
        values.insert("age", "old");
        assert!(matches!(
            access.populate(&person, &values),
            Err(PropertyError::TypeMismatch { .. })
        ));
    }
}
