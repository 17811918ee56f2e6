//! Property expressions.
//!
//! A property expression names a property relative to a target object:
//!
//! - simple: `name`
//! - nested: `address.city`
//! - indexed: `tags[2]`
//! - keyed: `addresses(home)`
//!
//! and any combination, e.g. `people[2].address(home).city`.
//!
//! A [`Resolver`] turns the expression into a [`PropertyPath`] of
//! [`Segment`]s. [`DefaultResolver`] implements the syntax above; another
//! dialect can be plugged into [`BeanAccess`](crate::BeanAccess) without
//! touching the walker.

// -----------------------------------------------------------------------------
// Modules

mod default_resolver;
mod path;

// -----------------------------------------------------------------------------
// Exports

pub use default_resolver::DefaultResolver;
pub use path::{PropertyPath, Segment};

pub(crate) use path::render;

use crate::error::PropertyError;

// -----------------------------------------------------------------------------
// Resolver

/// Parses property expressions.
///
/// Implementations must be pure: the same expression always yields the
/// same path or the same error.
pub trait Resolver: Send + Sync {
    /// Parses `expression` into a non-empty path.
    ///
    /// Malformed input fails with [`PropertyError::InvalidExpression`].
    fn parse(&self, expression: &str) -> Result<PropertyPath, PropertyError>;
}
