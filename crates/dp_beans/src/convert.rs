//! The type-conversion collaborator.
//!
//! When a value's runtime type does not fit the declared type of the slot
//! it is written to, property access hands it to the configured
//! [`Converter`]. None is configured by default and mismatches fail.

use thiserror::Error;

use crate::ty::Type;
use crate::value::Value;

/// A value that could not be converted.
#[derive(Debug, Clone, PartialEq, Error)]
#[error("cannot convert {found} to {target}: {message}")]
pub struct ConversionError {
    pub target: Type,
    pub found: Type,
    pub message: String,
}

impl ConversionError {
    pub fn new(value: &Value, target: &Type, message: impl Into<String>) -> Self {
        Self {
            target: target.clone(),
            found: value.runtime_type(),
            message: message.into(),
        }
    }
}

/// Converts values to declared types.
///
/// # Examples
///
/// ```
/// use dp_beans::convert::{ConversionError, Converter};
/// use dp_beans::{Type, Value};
///
/// let parse = |value: Value, target: &Type| match (&value, target) {
///     (Value::Str(s), t) if *t == Type::I32 => s
///         .parse()
///         .map(Value::I32)
///         .map_err(|e| ConversionError::new(&value, target, format!("{e}"))),
///     _ => Err(ConversionError::new(&value, target, "unsupported")),
/// };
///
/// assert_eq!(parse.convert(Value::from("42"), &Type::I32).unwrap(), Value::I32(42));
/// assert!(parse.convert(Value::from("x"), &Type::I32).is_err());
/// ```
pub trait Converter: Send + Sync {
    fn convert(&self, value: Value, target: &Type) -> Result<Value, ConversionError>;
}

impl<F> Converter for F
where
    F: Fn(Value, &Type) -> Result<Value, ConversionError> + Send + Sync,
{
    #[inline]
    fn convert(&self, value: Value, target: &Type) -> Result<Value, ConversionError> {
        self(value, target)
    }
}
