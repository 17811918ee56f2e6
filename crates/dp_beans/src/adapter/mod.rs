//! Per-shape property access.
//!
//! Every target the walker visits is handed to the first
//! [`PropertyAdapter`] that [`matches`](PropertyAdapter::matches) it. The
//! built-in order is:
//!
//! 1. [`DynaBeanAdapter`]: objects that are dynamic bags;
//! 2. [`AssociativeAdapter`]: [`Value::Map`] targets;
//! 3. [`ConventionalAdapter`]: every other object, through its accessors.
//!
//! Further shapes are supported by registering another adapter on the
//! [`BeanAccessBuilder`](crate::access::BeanAccessBuilder).

// -----------------------------------------------------------------------------
// Modules

mod associative;
mod conventional;
mod dyna;

// -----------------------------------------------------------------------------
// Exports

pub use associative::AssociativeAdapter;
pub use conventional::ConventionalAdapter;
pub use dyna::DynaBeanAdapter;

use std::sync::Arc;

use crate::access::BeanAccess;
use crate::error::PropertyError;
use crate::expr::Segment;
use crate::ty::Type;
use crate::value::Value;

// -----------------------------------------------------------------------------
// PropertyAdapter

/// Property access for one shape of target.
///
/// Methods are only called with targets the adapter
/// [`matches`](Self::matches). `cx` gives access to the descriptor cache
/// and to value conversion.
pub trait PropertyAdapter: Send + Sync {
    /// A short name used in diagnostics.
    fn name(&self) -> &'static str;

    fn matches(&self, target: &Value) -> bool;

    fn get_simple(&self, cx: &BeanAccess, target: &Value, name: &str) -> Result<Value, PropertyError>;

    fn set_simple(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        value: Value,
    ) -> Result<(), PropertyError>;

    fn get_indexed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        index: usize,
    ) -> Result<Value, PropertyError>;

    fn set_indexed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        index: usize,
        value: Value,
    ) -> Result<(), PropertyError>;

    fn get_keyed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        key: &str,
    ) -> Result<Value, PropertyError>;

    fn set_keyed(
        &self,
        cx: &BeanAccess,
        target: &Value,
        name: &str,
        key: &str,
        value: Value,
    ) -> Result<(), PropertyError>;

    fn is_readable(&self, cx: &BeanAccess, target: &Value, name: &str) -> bool;

    fn is_writeable(&self, cx: &BeanAccess, target: &Value, name: &str) -> bool;

    /// The declared type `segment` resolves to on `target`, `None` if it
    /// is not known.
    fn property_type(
        &self,
        cx: &BeanAccess,
        target: &Value,
        segment: &Segment,
    ) -> Result<Option<Type>, PropertyError>;

    /// Names of the simple properties of `target`.
    fn property_names(&self, cx: &BeanAccess, target: &Value) -> Result<Vec<String>, PropertyError>;
}

/// The built-in adapters in selection order.
pub fn default_adapters() -> Vec<Arc<dyn PropertyAdapter>> {
    vec![
        Arc::new(DynaBeanAdapter),
        Arc::new(AssociativeAdapter),
        Arc::new(ConventionalAdapter),
    ]
}
