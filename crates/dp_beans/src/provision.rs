//! Auto-provisioning: default values for absent slots and on-demand
//! growth of indexed containers.
//!
//! Growth is unbounded. An index far past the end allocates every element
//! in between; a warning is logged once the gap reaches
//! [`LARGE_GROWTH_WARNING`].
//!
//! Provisioning uses the factory of the bag that owns the slot. A bag
//! provisioned this way is handed that factory through
//! [`DynaBean::inherit_factory`](crate::dyna::DynaBean::inherit_factory),
//! so nested provisioning keeps using it.

use std::sync::Arc;

use log::{trace, warn};

use crate::construct::InstanceFactory;
use crate::error::PropertyError;
use crate::ty::Type;
use crate::value::Value;

/// Growth gaps at or above this many elements are logged as warnings.
pub const LARGE_GROWTH_WARNING: usize = 1 << 16;

/// Returns `true` for declared types a read of an absent slot
/// instantiates: containers and bags.
#[inline]
pub fn is_instantiated(ty: &Type) -> bool {
    matches!(
        ty,
        Type::Array(_) | Type::List | Type::Map | Type::DynaBean | Type::DynaClass(_)
    )
}

/// The value a newly provisioned slot of type `ty` starts with.
///
/// Primitives start at zero, nullable scalars, strings and free-form
/// slots at `Null`. Everything else is built by `factory`; a bag built
/// this way inherits `factory`.
///
/// # Errors
///
/// [`PropertyError::AccessFailure`] if `factory` cannot build `ty`.
pub fn instantiate(
    factory: &Arc<dyn InstanceFactory>,
    property: &str,
    ty: &Type,
) -> Result<Value, PropertyError> {
    match ty {
        Type::Primitive(p) => return Ok(p.zero()),
        Type::Any | Type::Boxed(_) | Type::Str => return Ok(Value::Null),
        _ => {}
    }
    let value = factory.construct(ty).map_err(|e| {
        PropertyError::access_failure(format!("cannot provision {ty} for `{property}`"), e)
    })?;
    if let Value::Object(obj) = &value {
        obj.with_dyna(|bag| bag.inherit_factory(factory));
    }
    Ok(value)
}

/// Grows `container` until `index` is valid.
///
/// Lists grow in place and `None` is returned. Arrays cannot grow; a larger
/// copy is returned and the caller must store it where the old one was.
/// New list elements are provisioned for `content`, new array elements for
/// the array's element type.
///
/// # Errors
///
/// [`PropertyError::IndexOutOfRange`] without a length if `container` is
/// not indexed, with its length if `index` is `usize::MAX`, or the failure
/// of provisioning an element.
pub fn grow(
    factory: &Arc<dyn InstanceFactory>,
    property: &str,
    container: &Value,
    content: &Type,
    index: usize,
) -> Result<Option<Value>, PropertyError> {
    let (len, element) = match container {
        Value::List(list) => (list.len(), content.clone()),
        Value::Array(array) => (array.len(), array.element_type()),
        _ => {
            return Err(PropertyError::IndexOutOfRange {
                property: property.to_owned(),
                index,
                len: None,
            });
        }
    };
    if index < len {
        return Ok(None);
    }
    // No container can hold `usize::MAX + 1` elements.
    let Some(new_len) = index.checked_add(1) else {
        return Err(PropertyError::IndexOutOfRange {
            property: property.to_owned(),
            index,
            len: Some(len),
        });
    };

    let added = new_len - len;
    if added >= LARGE_GROWTH_WARNING {
        warn!("growing `{property}` by {added} elements to reach index {index}");
    } else {
        trace!("growing `{property}` from {len} to {new_len} elements");
    }

    let mut fill = Vec::with_capacity(added);
    for _ in 0..added {
        fill.push(instantiate(factory, property, &element)?);
    }
    let mut fill = fill.into_iter();

    match container {
        Value::List(list) => {
            list.grow_to(new_len, || fill.next().unwrap_or_default());
            Ok(None)
        }
        Value::Array(array) => {
            let grown = array.resized(new_len, || fill.next().unwrap_or_default());
            Ok(Some(Value::Array(grown)))
        }
        _ => Ok(None),
    }
}

// -----------------------------------------------------------------------------
// Tests
