#![doc = include_str!("../README.md")]
#![cfg_attr(docsrs, feature(doc_cfg))]

// -----------------------------------------------------------------------------
// Modules

mod sync_type_map;

pub mod hash;

// -----------------------------------------------------------------------------
// Top-level exports

pub use sync_type_map::SyncTypeMap;
