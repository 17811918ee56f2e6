#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod container;

pub mod access;
pub mod adapter;
pub mod class;
pub mod construct;
pub mod convert;
pub mod dyna;
pub mod error;
pub mod expr;
pub mod introspect;
pub mod provision;
pub mod ty;
pub mod value;

#[cfg(test)]
pub(crate) mod testing;

// -----------------------------------------------------------------------------
// Top-level exports

pub use access::{BeanAccess, BeanAccessBuilder};
pub use error::PropertyError;
pub use ty::Type;
pub use value::Value;
