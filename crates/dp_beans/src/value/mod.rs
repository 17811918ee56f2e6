//! The dynamic value model.
//!
//! [`Value`] is what every read returns and every write takes. Scalars and
//! strings have value semantics; arrays, lists, maps and objects are shared
//! handles ([`ArrayRef`], [`ListRef`], [`MapRef`], [`ObjRef`]) so that
//! walking `a.b.c` and then writing through the result mutates the object
//! graph the caller holds.
//!
//! # Examples
//!
//! ```
//! use dp_beans::value::{ListRef, Value};
//!
//! let list = ListRef::new();
//! let a = Value::List(list.clone());
//! list.push("x");
//!
//! // Both handles see the same sequence.
//! assert_eq!(a.as_list().unwrap().len(), 1);
//! assert_eq!(Value::from(3_i32), Value::I32(3));
//! ```

// -----------------------------------------------------------------------------
// Modules

mod from_value;
mod handle;

// -----------------------------------------------------------------------------
// Exports

pub use from_value::FromValue;
pub use handle::{ArrayRef, ListRef, MapRef, ObjRef};

use core::fmt;

use crate::class::Object;
use crate::ty::{Primitive, Type};

// -----------------------------------------------------------------------------
// Value

/// A dynamically typed value.
#[derive(Clone, Default)]
pub enum Value {
    #[default]
    Null,
    Bool(bool),
    Char(char),
    I8(i8),
    I16(i16),
    I32(i32),
    I64(i64),
    F32(f32),
    F64(f64),
    Str(String),
    Array(ArrayRef),
    List(ListRef),
    Map(MapRef),
    Object(ObjRef),
}

impl Value {
    /// Wraps `value` into a new shared object handle.
    #[inline]
    pub fn object<T: Object>(value: T) -> Self {
        Self::Object(ObjRef::new(value))
    }

    /// Creates a new list holding `items`.
    pub fn list<I, T>(items: I) -> Self
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Self::List(ListRef::from_vec(items.into_iter().map(Into::into).collect()))
    }

    /// Creates a new map holding `entries`.
    pub fn map<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: Into<String>,
        V: Into<Value>,
    {
        let map = MapRef::new();
        for (key, value) in entries {
            map.insert(key, value);
        }
        Self::Map(map)
    }

    #[inline]
    pub const fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    /// Returns the primitive kind of a scalar value.
    pub const fn primitive(&self) -> Option<Primitive> {
        match self {
            Self::Bool(_) => Some(Primitive::Bool),
            Self::Char(_) => Some(Primitive::Char),
            Self::I8(_) => Some(Primitive::I8),
            Self::I16(_) => Some(Primitive::I16),
            Self::I32(_) => Some(Primitive::I32),
            Self::I64(_) => Some(Primitive::I64),
            Self::F32(_) => Some(Primitive::F32),
            Self::F64(_) => Some(Primitive::F64),
            _ => None,
        }
    }

    /// The type this value reports when a schema has to be inferred from it.
    ///
    /// Scalars report their nullable form and `Null` reports [`Type::Any`].
    ///
    /// # Examples
    ///
    /// ```
    /// use dp_beans::{Type, Value, ty::Primitive};
    ///
    /// assert_eq!(Value::I32(1).runtime_type(), Type::Boxed(Primitive::I32));
    /// assert_eq!(Value::Null.runtime_type(), Type::Any);
    /// assert_eq!(Value::list([1_i32]).runtime_type(), Type::List);
    /// ```
    pub fn runtime_type(&self) -> Type {
        if let Some(primitive) = self.primitive() {
            return Type::Boxed(primitive);
        }
        match self {
            Self::Str(_) => Type::Str,
            Self::Array(array) => Type::array(array.element_type()),
            Self::List(_) => Type::List,
            Self::Map(_) => Type::Map,
            Self::Object(obj) if obj.is_dyna_bean() => Type::DynaBean,
            Self::Object(obj) => Type::Class(obj.class_info()),
            _ => Type::Any,
        }
    }

    /// Number of elements of an array, list or map.
    pub fn container_len(&self) -> Option<usize> {
        match self {
            Self::Array(array) => Some(array.len()),
            Self::List(list) => Some(list.len()),
            Self::Map(map) => Some(map.len()),
            _ => None,
        }
    }

    #[inline]
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any integer scalar widened to `i64`.
    #[inline]
    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::I8(v) => Some(*v as i64),
            Self::I16(v) => Some(*v as i64),
            Self::I32(v) => Some(*v as i64),
            Self::I64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_i32(&self) -> Option<i32> {
        match self {
            Self::I32(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns any floating scalar widened to `f64`.
    #[inline]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::F32(v) => Some(*v as f64),
            Self::F64(v) => Some(*v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_array(&self) -> Option<&ArrayRef> {
        match self {
            Self::Array(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_list(&self) -> Option<&ListRef> {
        match self {
            Self::List(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_map(&self) -> Option<&MapRef> {
        match self {
            Self::Map(v) => Some(v),
            _ => None,
        }
    }

    #[inline]
    pub fn as_object(&self) -> Option<&ObjRef> {
        match self {
            Self::Object(v) => Some(v),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// Equality

impl PartialEq for Value {
    /// Scalars and strings compare by value, containers by content and
    /// objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Null, Self::Null) => true,
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::Char(a), Self::Char(b)) => a == b,
            (Self::I8(a), Self::I8(b)) => a == b,
            (Self::I16(a), Self::I16(b)) => a == b,
            (Self::I32(a), Self::I32(b)) => a == b,
            (Self::I64(a), Self::I64(b)) => a == b,
            (Self::F32(a), Self::F32(b)) => a == b,
            (Self::F64(a), Self::F64(b)) => a == b,
            (Self::Str(a), Self::Str(b)) => a == b,
            (Self::Array(a), Self::Array(b)) => a == b,
            (Self::List(a), Self::List(b)) => a == b,
            (Self::Map(a), Self::Map(b)) => a == b,
            (Self::Object(a), Self::Object(b)) => a.ptr_eq(b),
            _ => false,
        }
    }
}

// -----------------------------------------------------------------------------
// Formatting

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(v) => fmt::Debug::fmt(v, f),
            Self::Char(v) => fmt::Debug::fmt(v, f),
            Self::I8(v) => fmt::Debug::fmt(v, f),
            Self::I16(v) => fmt::Debug::fmt(v, f),
            Self::I32(v) => fmt::Debug::fmt(v, f),
            Self::I64(v) => fmt::Debug::fmt(v, f),
            Self::F32(v) => fmt::Debug::fmt(v, f),
            Self::F64(v) => fmt::Debug::fmt(v, f),
            Self::Str(v) => fmt::Debug::fmt(v, f),
            Self::Array(v) => fmt::Debug::fmt(v, f),
            Self::List(v) => fmt::Debug::fmt(v, f),
            Self::Map(v) => fmt::Debug::fmt(v, f),
            Self::Object(v) => fmt::Debug::fmt(v, f),
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Str(v) => f.write_str(v),
            Self::Char(v) => fmt::Display::fmt(v, f),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

// -----------------------------------------------------------------------------
// Conversions into Value

macro_rules! impl_from_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                #[inline]
                fn from(value: $ty) -> Self {
                    Self::$variant(value)
                }
            }
        )*
    };
}

impl_from_scalar! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
    String => Str,
    ArrayRef => Array,
    ListRef => List,
    MapRef => Map,
    ObjRef => Object,
}

impl From<&str> for Value {
    #[inline]
    fn from(value: &str) -> Self {
        Self::Str(value.to_owned())
    }
}

impl From<&String> for Value {
    #[inline]
    fn from(value: &String) -> Self {
        Self::Str(value.clone())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    #[inline]
    fn from(value: Option<T>) -> Self {
        value.map_or(Self::Null, Into::into)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    #[inline]
    fn from(value: Vec<T>) -> Self {
        Self::list(value)
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{MapRef, Value};
    use crate::testing::Person;

    #[test]
    fn containers_compare_by_content() {
        assert_eq!(Value::list([1_i32, 2]), Value::list([1_i32, 2]));
        assert_ne!(Value::list([1_i32, 2]), Value::list([2_i32, 1]));
        assert_eq!(Value::map([("a", 1_i32)]), Value::map([("a", 1_i32)]));
    }

    #[test]
    fn objects_compare_by_identity() {
        let a = Value::object(Person::default());
        let b = Value::object(Person::default());
        assert_eq!(a, a.clone());
        assert_ne!(a, b);
    }

    #[test]
    fn option_and_str_conversions() {
        assert_eq!(Value::from(None::<i32>), Value::Null);
        assert_eq!(Value::from(Some("x")), Value::Str("x".into()));
        let map = MapRef::new();
        map.insert("k", Value::Null);
        assert_eq!(Value::from(map).container_len(), Some(1));
    }
}
