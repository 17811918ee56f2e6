use crate::ty::{Primitive, Type};
use crate::value::{ArrayRef, ListRef, MapRef, ObjRef, Value};

/// Typed extraction out of a [`Value`].
///
/// Used by typed setters registered through
/// [`ClassBuilder`](crate::class::ClassBuilder): the declared parameter type
/// is [`FromValue::value_type`] and the argument is unpacked with
/// [`FromValue::from_value`]. Extraction is exact; no numeric widening or
/// parsing happens here.
///
/// # Examples
///
/// ```
/// use dp_beans::value::{FromValue, Value};
///
/// assert_eq!(i32::from_value(Value::I32(4)), Ok(4));
/// assert_eq!(i32::from_value(Value::I64(4)), Err(Value::I64(4)));
/// assert_eq!(Option::<String>::from_value(Value::Null), Ok(None));
/// ```
pub trait FromValue: Sized {
    /// The declared type of a parameter of this Rust type.
    fn value_type() -> Type;

    /// Unpacks `value`, handing it back unchanged on mismatch.
    fn from_value(value: Value) -> Result<Self, Value>;
}

macro_rules! impl_from_value_scalar {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl FromValue for $ty {
                #[inline]
                fn value_type() -> Type {
                    Type::Primitive(Primitive::$variant)
                }

                #[inline]
                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_from_value_scalar! {
    bool => Bool,
    char => Char,
    i8 => I8,
    i16 => I16,
    i32 => I32,
    i64 => I64,
    f32 => F32,
    f64 => F64,
}

impl FromValue for String {
    #[inline]
    fn value_type() -> Type {
        Type::Str
    }

    #[inline]
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Str(v) => Ok(v),
            other => Err(other),
        }
    }
}

impl FromValue for Value {
    #[inline]
    fn value_type() -> Type {
        Type::Any
    }

    #[inline]
    fn from_value(value: Value) -> Result<Self, Value> {
        Ok(value)
    }
}

/// `Null` maps to `None`; scalars become their nullable type.
impl<T: FromValue> FromValue for Option<T> {
    #[inline]
    fn value_type() -> Type {
        T::value_type().nullable()
    }

    #[inline]
    fn from_value(value: Value) -> Result<Self, Value> {
        match value {
            Value::Null => Ok(None),
            other => T::from_value(other).map(Some),
        }
    }
}

macro_rules! impl_from_value_handle {
    ($($ty:ty => $variant:ident, $declared:expr),* $(,)?) => {
        $(
            impl FromValue for $ty {
                #[inline]
                fn value_type() -> Type {
                    $declared
                }

                #[inline]
                fn from_value(value: Value) -> Result<Self, Value> {
                    match value {
                        Value::$variant(v) => Ok(v),
                        other => Err(other),
                    }
                }
            }
        )*
    };
}

impl_from_value_handle! {
    ListRef => List, Type::List,
    MapRef => Map, Type::Map,
    ArrayRef => Array, Type::array(Type::Any),
    ObjRef => Object, Type::Any,
}
