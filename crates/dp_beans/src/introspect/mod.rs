//! Accessor discovery and the descriptor cache.
//!
//! ## Menu
//!
//! - [`DescriptorCache`]: per-class [`TypeDescriptors`] and
//!   [`MappedDescriptors`], memoized by [`TypeId`](core::any::TypeId).
//! - [`BeanIntrospector`]: a pluggable discovery strategy.
//!     - [`DefaultBeanIntrospector`]: `get`/`is`/`set` naming convention.
//!     - [`FluentPropertyBeanIntrospector`]: setters returning a value.
//!     - [`SuppressPropertiesIntrospector`]: hides properties after discovery.
//! - [`find_accessor`]: the most-derived accessible implementation of a
//!   method.

// -----------------------------------------------------------------------------
// Modules

mod accessor;
mod cache;
mod context;
mod descriptor;
mod strategy;

// -----------------------------------------------------------------------------
// Exports

pub use accessor::{accessible_methods, decapitalize, find_accessor};
pub use cache::DescriptorCache;
pub use context::IntrospectionContext;
pub use descriptor::{
    MappedDescriptors, MappedPropertyDescriptor, PropertyDescriptor, TypeDescriptors,
};
pub use strategy::{
    BeanIntrospector, DefaultBeanIntrospector, FluentPropertyBeanIntrospector,
    SuppressPropertiesIntrospector,
};
