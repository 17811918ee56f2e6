//! Declared types of properties, parameters and container contents.

use core::fmt;
use std::sync::Arc;

use crate::class::ClassInfo;
use crate::dyna::DynaClass;
use crate::value::Value;

// -----------------------------------------------------------------------------
// Primitive

/// The scalar kinds that have a non-nullable form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Primitive {
    Bool,
    Char,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
}

impl Primitive {
    /// Returns the lowercase name used in messages, e.g. `i32`.
    pub const fn name(self) -> &'static str {
        match self {
            Self::Bool => "bool",
            Self::Char => "char",
            Self::I8 => "i8",
            Self::I16 => "i16",
            Self::I32 => "i32",
            Self::I64 => "i64",
            Self::F32 => "f32",
            Self::F64 => "f64",
        }
    }

    /// Returns the zero value of this primitive.
    ///
    /// # Examples
    ///
    /// ```
    /// use dp_beans::{Value, ty::Primitive};
    /// assert_eq!(Primitive::I32.zero(), Value::I32(0));
    /// assert_eq!(Primitive::Bool.zero(), Value::Bool(false));
    /// ```
    pub const fn zero(self) -> Value {
        match self {
            Self::Bool => Value::Bool(false),
            Self::Char => Value::Char('\0'),
            Self::I8 => Value::I8(0),
            Self::I16 => Value::I16(0),
            Self::I32 => Value::I32(0),
            Self::I64 => Value::I64(0),
            Self::F32 => Value::F32(0.0),
            Self::F64 => Value::F64(0.0),
        }
    }
}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.pad(self.name())
    }
}

// -----------------------------------------------------------------------------
// Type

/// A declared type.
///
/// Only [`Type::Primitive`] is non-nullable; every other type admits
/// [`Value::Null`].
///
/// # Examples
///
/// ```
/// use dp_beans::{Type, Value};
///
/// assert!(Type::I32.accepts(&Value::I32(7)));
/// assert!(!Type::I32.accepts(&Value::Null));
/// assert!(Type::boxed(dp_beans::ty::Primitive::I32).accepts(&Value::Null));
/// assert!(Type::Any.accepts(&Value::from("text")));
/// assert!(!Type::Str.accepts(&Value::I64(1)));
/// ```
#[derive(Clone)]
pub enum Type {
    /// Free-form: accepts any value, including `Null`.
    Any,
    /// A non-nullable scalar.
    Primitive(Primitive),
    /// A nullable scalar.
    Boxed(Primitive),
    /// A string.
    Str,
    /// A fixed-size array with the given element type.
    Array(Arc<Type>),
    /// A growable ordered sequence.
    List,
    /// A string-keyed associative container.
    Map,
    /// An instance of the class or one of its subtypes.
    Class(&'static ClassInfo),
    /// Any dynamic bag.
    DynaBean,
    /// A dynamic bag of one particular schema.
    DynaClass(Arc<dyn DynaClass>),
}

impl Type {
    pub const BOOL: Type = Type::Primitive(Primitive::Bool);
    pub const CHAR: Type = Type::Primitive(Primitive::Char);
    pub const I8: Type = Type::Primitive(Primitive::I8);
    pub const I16: Type = Type::Primitive(Primitive::I16);
    pub const I32: Type = Type::Primitive(Primitive::I32);
    pub const I64: Type = Type::Primitive(Primitive::I64);
    pub const F32: Type = Type::Primitive(Primitive::F32);
    pub const F64: Type = Type::Primitive(Primitive::F64);

    /// Creates an array type with the given element type.
    #[inline]
    pub fn array(element: Type) -> Self {
        Self::Array(Arc::new(element))
    }

    /// Creates the nullable form of a primitive.
    #[inline]
    pub const fn boxed(primitive: Primitive) -> Self {
        Self::Boxed(primitive)
    }

    /// Returns `true` for non-nullable scalars.
    #[inline]
    pub const fn is_primitive(&self) -> bool {
        matches!(self, Self::Primitive(_))
    }

    /// Returns `true` for types addressed by integer position.
    #[inline]
    pub const fn is_indexed(&self) -> bool {
        matches!(self, Self::Array(_) | Self::List)
    }

    /// Returns `true` for types addressed by string key.
    #[inline]
    pub const fn is_mapped(&self) -> bool {
        matches!(self, Self::Map)
    }

    /// Returns the element type of an array type.
    #[inline]
    pub fn element_type(&self) -> Option<&Type> {
        match self {
            Self::Array(element) => Some(element),
            _ => None,
        }
    }

    /// Returns the nullable form of this type.
    #[inline]
    pub fn nullable(self) -> Self {
        match self {
            Self::Primitive(p) => Self::Boxed(p),
            other => other,
        }
    }

    /// The value an unset slot of this type holds: zero for primitives,
    /// `Null` for everything else.
    #[inline]
    pub fn default_value(&self) -> Value {
        match self {
            Self::Primitive(p) => p.zero(),
            _ => Value::Null,
        }
    }

    /// Instance check: can `value` be stored in a slot of this type as is?
    pub fn accepts(&self, value: &Value) -> bool {
        match (self, value) {
            (Self::Any, _) => true,
            (Self::Primitive(p), v) => v.primitive() == Some(*p),
            (_, Value::Null) => true,
            (Self::Boxed(p), v) => v.primitive() == Some(*p),
            (Self::Str, Value::Str(_)) => true,
            (Self::Array(element), Value::Array(array)) => {
                element.is_assignable_from(&array.element_type())
            }
            (Self::List, Value::List(_)) | (Self::Map, Value::Map(_)) => true,
            (Self::Class(class), Value::Object(obj)) => obj.class_info().is_subclass_of(class),
            (Self::DynaBean, Value::Object(obj)) => obj.is_dyna_bean(),
            (Self::DynaClass(schema), Value::Object(obj)) => {
                obj.dyna_schema_name().as_deref() == Some(schema.name())
            }
            _ => false,
        }
    }

    /// Assignability between declared types: can a slot of this type hold
    /// every value of type `other`?
    ///
    /// # Examples
    ///
    /// ```
    /// use dp_beans::Type;
    ///
    /// assert!(Type::Any.is_assignable_from(&Type::Str));
    /// assert!(!Type::Any.is_assignable_from(&Type::I32));
    /// assert!(Type::array(Type::Any).is_assignable_from(&Type::array(Type::Str)));
    /// assert!(!Type::array(Type::I64).is_assignable_from(&Type::array(Type::I32)));
    /// ```
    pub fn is_assignable_from(&self, other: &Type) -> bool {
        if self == other {
            return true;
        }
        match (self, other) {
            (Self::Any, other) => !other.is_primitive(),
            (Self::Array(a), Self::Array(b)) => {
                !a.is_primitive() && !b.is_primitive() && a.is_assignable_from(b)
            }
            (Self::Class(a), Self::Class(b)) => b.is_subclass_of(a),
            (Self::DynaBean, Self::DynaClass(_)) => true,
            _ => false,
        }
    }
}

impl PartialEq for Type {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Any, Self::Any)
            | (Self::Str, Self::Str)
            | (Self::List, Self::List)
            | (Self::Map, Self::Map)
            | (Self::DynaBean, Self::DynaBean) => true,
            (Self::Primitive(a), Self::Primitive(b)) | (Self::Boxed(a), Self::Boxed(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::Class(a), Self::Class(b)) => a.type_id() == b.type_id(),
            (Self::DynaClass(a), Self::DynaClass(b)) => {
                Arc::ptr_eq(a, b) || a.name() == b.name()
            }
            _ => false,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Any => f.write_str("any"),
            Self::Primitive(p) => f.write_str(p.name()),
            Self::Boxed(p) => write!(f, "{}?", p.name()),
            Self::Str => f.write_str("string"),
            Self::Array(element) => write!(f, "{element}[]"),
            Self::List => f.write_str("list"),
            Self::Map => f.write_str("map"),
            Self::Class(class) => f.write_str(class.name()),
            Self::DynaBean => f.write_str("dyna-bean"),
            Self::DynaClass(schema) => write!(f, "dyna-bean<{}>", schema.name()),
        }
    }
}

impl fmt::Debug for Type {
    #[inline]
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{Primitive, Type};
    use crate::class::Class;
    use crate::dyna::{AutoSchemaBag, BasicDynaClass, DynaProperty};
    use crate::testing::{Address, Person};
    use crate::value::{ArrayRef, Value};
    use std::sync::Arc;

    #[test]
    fn primitive_rejects_null_and_other_widths() {
        assert!(!Type::I32.accepts(&Value::Null));
        assert!(!Type::I32.accepts(&Value::I64(1)));
        assert!(Type::Boxed(Primitive::I32).accepts(&Value::I32(3)));
        assert!(Type::Boxed(Primitive::I32).accepts(&Value::Null));
    }

    #[test]
    fn class_types_follow_the_hierarchy() {
        let person = Value::object(Person::default());
        assert!(Type::Class(Person::class()).accepts(&person));
        assert!(!Type::Class(Address::class()).accepts(&person));
        assert!(Type::Any.accepts(&person));
    }

    #[test]
    fn arrays_check_their_element_type() {
        let strings = Value::Array(ArrayRef::new(Type::Str, 2));
        assert!(Type::array(Type::Any).accepts(&strings));
        assert!(Type::array(Type::Str).accepts(&strings));
        assert!(!Type::array(Type::I32).accepts(&strings));
    }

    #[test]
    fn dyna_types() {
        let schema = BasicDynaClass::new("point", [DynaProperty::new("x", Type::I32)]);
        let bag = schema.instantiate();
        let lazy = Value::object(AutoSchemaBag::new());

        let typed = Type::DynaClass(Arc::new(schema));
        assert!(typed.accepts(&bag));
        assert!(!typed.accepts(&lazy));
        assert!(Type::DynaBean.accepts(&bag));
        assert!(Type::DynaBean.accepts(&lazy));
        assert!(!Type::DynaBean.accepts(&Value::object(Person::default())));
        assert!(Type::DynaBean.is_assignable_from(&typed));
    }

    #[test]
    fn display() {
        assert_eq!(Type::array(Type::I32).to_string(), "i32[]");
        assert_eq!(Type::Boxed(Primitive::F64).to_string(), "f64?");
        assert_eq!(Type::Class(Address::class()).to_string(), "Address");
    }
}
