//! Class metadata: the reflection tables property access introspects.
//!
//! ## Menu
//!
//! - [`ClassInfo`]: name, [`TypeId`](core::any::TypeId), kind, visibility,
//!   superclass, interfaces, methods and default constructor of a class.
//! - [`MethodInfo`]: name, parameter types, return type, visibility and
//!   body of a method.
//! - [`ClassBuilder`]: builds a `ClassInfo`, with typed helpers for the
//!   usual getter/setter shapes.
//! - [`Object`]: the object-safe trait every value behind an
//!   [`ObjRef`](crate::value::ObjRef) implements.
//! - [`Class`]: static access to a type's `ClassInfo`.
//! - [`impl_object!`](crate::impl_object): implements both for a struct.

// -----------------------------------------------------------------------------
// Modules

mod builder;
mod class_info;
mod method_info;

// -----------------------------------------------------------------------------
// Exports

pub use builder::ClassBuilder;
pub use class_info::{ClassInfo, ClassKind, Constructor};
pub use method_info::{MethodBody, MethodInfo, MutBody, RefBody};

use core::any::Any;

use crate::dyna::DynaBean;

// -----------------------------------------------------------------------------
// Object

/// An object that can live behind an [`ObjRef`](crate::value::ObjRef).
///
/// Usually implemented through [`impl_object!`](crate::impl_object).
pub trait Object: Any + Send + Sync {
    /// The runtime class of this object.
    fn class_info(&self) -> &'static ClassInfo;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;

    /// Returns the object as a dynamic bag, if it is one.
    #[inline]
    fn as_dyna_bean(&self) -> Option<&dyn DynaBean> {
        None
    }

    /// Returns the object as a mutable dynamic bag, if it is one.
    #[inline]
    fn as_dyna_bean_mut(&mut self) -> Option<&mut dyn DynaBean> {
        None
    }
}

// -----------------------------------------------------------------------------
// Class

/// Static access to the [`ClassInfo`] of a type.
pub trait Class: Object + Sized {
    fn class() -> &'static ClassInfo;
}

// -----------------------------------------------------------------------------
// impl_object!

/// Implements [`Object`] and [`Class`] for a type.
///
/// The class is built on first use and stored in a `static`.
///
/// - `impl_object!(Ty, "Name")`: a class with no methods of its own.
/// - `impl_object!(Ty, "Name", |builder| expr)`: `expr` receives a
///   [`ClassBuilder<Ty>`] named `builder` and evaluates to the [`ClassInfo`].
/// - `impl_object!(@dyna Ty, "Name")`: a dynamic bag; `Ty` must implement
///   [`DynaBean`].
///
/// # Examples
///
/// ```
/// use dp_beans::class::Class;
/// use dp_beans::impl_object;
///
/// #[derive(Default)]
/// struct Marker;
///
/// impl_object!(Marker, "Marker");
///
/// assert_eq!(Marker::class().name(), "Marker");
/// assert!(Marker::class().methods().is_empty());
/// ```
#[macro_export]
macro_rules! impl_object {
    (@object $ty:ty, { $($extra:tt)* }) => {
        impl $crate::class::Object for $ty {
            #[inline]
            fn class_info(&self) -> &'static $crate::class::ClassInfo {
                <Self as $crate::class::Class>::class()
            }

            #[inline]
            fn as_any(&self) -> &dyn ::core::any::Any {
                self
            }

            #[inline]
            fn as_any_mut(&mut self) -> &mut dyn ::core::any::Any {
                self
            }

            $($extra)*
        }
    };
    (@class $ty:ty, $name:literal, |$builder:ident| $body:expr) => {
        impl $crate::class::Class for $ty {
            fn class() -> &'static $crate::class::ClassInfo {
                static CLASS: ::std::sync::OnceLock<$crate::class::ClassInfo> =
                    ::std::sync::OnceLock::new();
                CLASS.get_or_init(|| {
                    let $builder = $crate::class::ClassInfo::builder::<$ty>($name);
                    $body
                })
            }
        }
    };
    (@dyna $ty:ty, $name:literal) => {
        $crate::impl_object!(@object $ty, {
            fn as_dyna_bean(&self) -> ::core::option::Option<&dyn $crate::dyna::DynaBean> {
                ::core::option::Option::Some(self)
            }

            fn as_dyna_bean_mut(
                &mut self,
            ) -> ::core::option::Option<&mut dyn $crate::dyna::DynaBean> {
                ::core::option::Option::Some(self)
            }
        });
        $crate::impl_object!(@class $ty, $name, |builder| builder.build());
    };
    ($ty:ty, $name:literal) => {
        $crate::impl_object!($ty, $name, |builder| builder.build());
    };
    ($ty:ty, $name:literal, |$builder:ident| $body:expr) => {
        $crate::impl_object!(@object $ty, {});
        $crate::impl_object!(@class $ty, $name, |$builder| $body);
    };
}
