#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

pub use dp_beans as beans;
pub use dp_utils as utils;

/// The types most callers need.
pub mod prelude {
    pub use dp_beans::dyna::{DynaBean, DynaClass, MutableDynaClass};
    pub use dp_beans::error::{MissingReason, PropertyError};
    pub use dp_beans::{BeanAccess, Type, Value};
}
