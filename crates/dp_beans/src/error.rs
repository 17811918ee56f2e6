//! Error types of property access.

use core::error::Error;
use core::fmt;
use std::borrow::Cow;
use std::sync::Arc;

use thiserror::Error;

use crate::ty::Type;

// -----------------------------------------------------------------------------
// MissingReason

/// Why a property could not be found or used the requested way.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MissingReason {
    /// The target has no property of that name.
    NoSuchProperty,
    /// The property exists but cannot be read.
    NoReader,
    /// The property exists but cannot be written.
    NoWriter,
    /// Keyed access to a property that has no keyed accessor and whose
    /// value is not a map.
    NotMapped,
    /// The access kind is not supported on this shape, e.g. indexed access
    /// on an associative container.
    Unsupported,
    /// The schema is restricted and does not declare the property.
    Restricted,
    /// The target is not something properties can be read from.
    NotABean,
}

impl MissingReason {
    const fn message(self) -> &'static str {
        match self {
            Self::NoSuchProperty => "no such property",
            Self::NoReader => "property has no read method",
            Self::NoWriter => "property has no write method",
            Self::NotMapped => "property is not mapped",
            Self::Unsupported => "access kind not supported on this target",
            Self::Restricted => "schema is restricted",
            Self::NotABean => "target is not a bean",
        }
    }
}

impl fmt::Display for MissingReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

// -----------------------------------------------------------------------------
// PropertyError

fn len_suffix(len: &Option<usize>) -> String {
    match len {
        Some(len) => format!(" (length {len})"),
        None => " (property is not indexed)".to_owned(),
    }
}

/// An error returned by property reads and writes.
///
/// The variant tells the caller which part of the request was wrong: the
/// expression, the property name, the index, the value or the target graph.
#[derive(Debug, Clone, Error)]
#[non_exhaustive]
pub enum PropertyError {
    /// The expression could not be parsed.
    #[error("invalid property expression `{expression}` at offset {offset}: {reason}")]
    InvalidExpression {
        expression: String,
        offset: usize,
        reason: Cow<'static, str>,
    },
    /// No property of that name, or not usable the requested way.
    #[error("unknown property `{property}` on {target}: {reason}")]
    UnknownProperty {
        property: String,
        target: String,
        reason: MissingReason,
    },
    /// Index outside the container, or `len: None` if the property is not
    /// indexed at all.
    #[error("index {index} out of range for `{property}`{}", len_suffix(.len))]
    IndexOutOfRange {
        property: String,
        index: usize,
        len: Option<usize>,
    },
    /// An intermediate segment of the path evaluated to `Null`.
    #[error("null value at `{path}` while walking a nested path")]
    NestedNull { path: String },
    /// `Null` written to a non-nullable slot.
    #[error("cannot assign null to `{property}` of primitive type {ty}")]
    NullForPrimitive { property: String, ty: Type },
    /// The value does not fit the declared type and could not be converted.
    #[error("`{property}` expects {expected}, found {found}")]
    TypeMismatch {
        property: String,
        expected: Type,
        found: Type,
    },
    /// Accessor discovery failed for a class.
    #[error("cannot introspect {class}: {message}")]
    Introspection { class: String, message: String },
    /// A collaborator (accessor body, converter, factory) failed.
    #[error("{context}: {source}")]
    AccessFailure {
        context: String,
        #[source]
        source: Arc<dyn Error + Send + Sync>,
    },
}

impl PropertyError {
    #[inline]
    pub fn unknown(
        property: impl Into<String>,
        target: impl fmt::Display,
        reason: MissingReason,
    ) -> Self {
        Self::UnknownProperty {
            property: property.into(),
            target: target.to_string(),
            reason,
        }
    }

    #[inline]
    pub fn nested_null(path: impl Into<String>) -> Self {
        Self::NestedNull { path: path.into() }
    }

    #[inline]
    pub fn access_failure(
        context: impl Into<String>,
        source: impl Error + Send + Sync + 'static,
    ) -> Self {
        Self::AccessFailure {
            context: context.into(),
            source: Arc::new(source),
        }
    }

    /// Maps a failed accessor call on `property`.
    ///
    /// Bounds failures reported by indexed accessors become
    /// [`PropertyError::IndexOutOfRange`]; everything else is wrapped.
    pub fn from_invoke(property: &str, error: InvokeError) -> Self {
        match error {
            InvokeError::IndexOutOfBounds { index, len } => Self::IndexOutOfRange {
                property: property.to_owned(),
                index,
                len: Some(len),
            },
            other => Self::access_failure(format!("accessor of `{property}` failed"), other),
        }
    }

    /// Returns the reason of an [`UnknownProperty`](Self::UnknownProperty).
    #[inline]
    pub fn missing_reason(&self) -> Option<MissingReason> {
        match self {
            Self::UnknownProperty { reason, .. } => Some(*reason),
            _ => None,
        }
    }
}

// -----------------------------------------------------------------------------
// InvokeError

/// An error raised by calling a [`MethodInfo`](crate::class::MethodInfo).
#[derive(Debug, Clone, PartialEq, Error)]
#[non_exhaustive]
pub enum InvokeError {
    #[error("method `{method}` invoked on an instance of {class}")]
    WrongReceiver {
        method: &'static str,
        class: &'static str,
    },
    #[error("method `{method}` takes {expected} argument(s), {found} given")]
    Arity {
        method: &'static str,
        expected: usize,
        found: usize,
    },
    #[error("argument {position} of `{method}` expects {expected}, found {found}")]
    Argument {
        method: &'static str,
        position: usize,
        expected: Type,
        found: Type,
    },
    #[error("index {index} out of bounds for length {len}")]
    IndexOutOfBounds { index: usize, len: usize },
    #[error("method `{0}` has no body")]
    Abstract(&'static str),
    #[error("{0}")]
    Failed(String),
}

impl InvokeError {
    /// Shorthand for [`InvokeError::IndexOutOfBounds`].
    #[inline]
    pub const fn out_of_bounds(index: usize, len: usize) -> Self {
        Self::IndexOutOfBounds { index, len }
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{InvokeError, MissingReason, PropertyError};
    use crate::ty::Type;

    #[test]
    fn messages() {
        let err = PropertyError::IndexOutOfRange {
            property: "name".into(),
            index: 2,
            len: None,
        };
        assert_eq!(
            err.to_string(),
            "index 2 out of range for `name` (property is not indexed)"
        );

        let err = PropertyError::unknown("city", "Address", MissingReason::NoWriter);
        assert_eq!(
            err.to_string(),
            "unknown property `city` on Address: property has no write method"
        );
        assert_eq!(err.missing_reason(), Some(MissingReason::NoWriter));

        let err = PropertyError::NullForPrimitive {
            property: "age".into(),
            ty: Type::I32,
        };
        assert_eq!(err.to_string(), "cannot assign null to `age` of primitive type i32");
    }

    #[test]
    fn invoke_bounds_become_index_errors() {
        let err = PropertyError::from_invoke("tag", InvokeError::out_of_bounds(4, 2));
        assert!(matches!(
            err,
            PropertyError::IndexOutOfRange { index: 4, len: Some(2), .. }
        ));

        let err = PropertyError::from_invoke("tag", InvokeError::Failed("boom".into()));
        assert!(matches!(err, PropertyError::AccessFailure { .. }));
        assert_eq!(err.to_string(), "accessor of `tag` failed: boom");
    }
}
