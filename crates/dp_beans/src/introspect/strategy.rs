use std::collections::BTreeMap;

use log::{debug, trace};

use crate::class::{ClassInfo, MethodInfo};
use crate::error::PropertyError;
use crate::introspect::{
    IntrospectionContext, MappedDescriptors, MappedPropertyDescriptor, accessible_methods,
    decapitalize,
};
use crate::ty::Type;

// -----------------------------------------------------------------------------
// BeanIntrospector

/// A discovery strategy run by the
/// [`DescriptorCache`](crate::introspect::DescriptorCache).
///
/// Strategies run in registration order over one shared
/// [`IntrospectionContext`]; their contributions are unioned.
pub trait BeanIntrospector: Send + Sync {
    fn introspect(&self, cx: &mut IntrospectionContext) -> Result<(), PropertyError>;

    /// Returns `true` for strategies that only remove properties.
    ///
    /// [`DescriptorCache::insert_introspector`] places new strategies
    /// ahead of these.
    ///
    /// [`DescriptorCache::insert_introspector`]: crate::introspect::DescriptorCache::insert_introspector
    fn is_suppression(&self) -> bool {
        false
    }
}

/// Splits `name` into the property name following `prefix`.
fn property_suffix(name: &str, prefix: &str) -> Option<String> {
    let rest = name.strip_prefix(prefix)?;
    (!rest.is_empty()).then(|| decapitalize(rest))
}

enum Role {
    Getter,
    IsGetter,
    Setter,
    IndexedGetter,
    IndexedSetter,
}

#[derive(Default)]
struct Candidates {
    getter: Option<&'static MethodInfo>,
    is_getter: Option<&'static MethodInfo>,
    setters: Vec<&'static MethodInfo>,
    indexed_getter: Option<&'static MethodInfo>,
    indexed_setters: Vec<&'static MethodInfo>,
}

/// Picks the writer whose value parameter can hold `read_type`, preferring
/// an exact match.
fn pick_writer(
    writers: &[&'static MethodInfo],
    position: usize,
    read_type: &Type,
) -> Option<&'static MethodInfo> {
    let param = |m: &&'static MethodInfo| m.params()[position].clone();
    writers
        .iter()
        .find(|m| param(m) == *read_type)
        .or_else(|| writers.iter().find(|m| param(m).is_assignable_from(read_type)))
        .copied()
}

// -----------------------------------------------------------------------------
// DefaultBeanIntrospector

/// The naming-convention strategy.
///
/// - `getX()` and `isX()` (returning `bool`) read `x`;
/// - `setX(T)` returning nothing writes `x`;
/// - `getX(i32)` reads element `i` of `x`;
/// - `setX(i32, T)` returning nothing writes element `i` of `x`.
///
/// A setter that cannot hold the getter's return type is excluded and
/// logged; among overloads, the compatible one wins. Indexed accessors
/// disagreeing on the element type fail the introspection of the class.
#[derive(Debug, Clone, Copy, Default)]
pub struct DefaultBeanIntrospector;

impl DefaultBeanIntrospector {
    fn collect(class: &'static ClassInfo) -> BTreeMap<String, Candidates> {
        let mut found: BTreeMap<String, Candidates> = BTreeMap::new();
        for method in accessible_methods(class) {
            let name = method.name();
            let params = method.params();
            let returns = method.returns();

            let slot = match (params, returns) {
                ([], Some(ty)) => property_suffix(name, "get")
                    .map(|p| (p, Role::Getter))
                    .or_else(|| {
                        (*ty == Type::BOOL)
                            .then(|| property_suffix(name, "is"))
                            .flatten()
                            .map(|p| (p, Role::IsGetter))
                    }),
                ([_], None) => property_suffix(name, "set").map(|p| (p, Role::Setter)),
                ([index], Some(_)) if *index == Type::I32 => {
                    property_suffix(name, "get").map(|p| (p, Role::IndexedGetter))
                }
                ([index, _], None) if *index == Type::I32 => {
                    property_suffix(name, "set").map(|p| (p, Role::IndexedSetter))
                }
                _ => None,
            };

            let Some((prop, role)) = slot else { continue };
            let entry = found.entry(prop).or_default();
            match role {
                Role::Getter => entry.getter = Some(method),
                Role::IsGetter => entry.is_getter = Some(method),
                Role::Setter => entry.setters.push(method),
                Role::IndexedGetter => entry.indexed_getter = Some(method),
                Role::IndexedSetter => entry.indexed_setters.push(method),
            }
        }
        found
    }
}

impl BeanIntrospector for DefaultBeanIntrospector {
    fn introspect(&self, cx: &mut IntrospectionContext) -> Result<(), PropertyError> {
        let class = cx.class();

        for (prop, found) in Self::collect(class) {
            let read = found.is_getter.or(found.getter);
            let read_type = read.and_then(MethodInfo::returns).cloned();

            let write = match &read_type {
                Some(ty) => {
                    let picked = pick_writer(&found.setters, 0, ty);
                    for setter in &found.setters {
                        if picked.is_none_or(|p| !core::ptr::eq(p, *setter)) {
                            debug!(
                                "excluding `{setter}` of `{}`: property `{prop}` is read as {ty}",
                                class.name()
                            );
                        }
                    }
                    picked
                }
                None => found.setters.first().copied(),
            };

            let indexed_read_type = found.indexed_getter.and_then(MethodInfo::returns).cloned();
            let indexed_write = match &indexed_read_type {
                Some(ty) if !found.indexed_setters.is_empty() => {
                    match pick_writer(&found.indexed_setters, 1, ty) {
                        Some(m) => Some(m),
                        None => {
                            return Err(PropertyError::Introspection {
                                class: class.name().to_owned(),
                                message: format!(
                                    "indexed accessors of `{prop}` disagree: read as {ty}, written as {}",
                                    found.indexed_setters[0].params()[1]
                                ),
                            });
                        }
                    }
                }
                _ => found.indexed_setters.first().copied(),
            };

            if read.is_none()
                && write.is_none()
                && found.indexed_getter.is_none()
                && indexed_write.is_none()
            {
                continue;
            }

            let property_type = read_type.or_else(|| write.map(|m| m.params()[0].clone()));
            let indexed_type =
                indexed_read_type.or_else(|| indexed_write.map(|m| m.params()[1].clone()));

            let descriptor = cx.entry(&prop);
            if read.is_some() {
                descriptor.set_read_method(read);
            }
            if write.is_some() {
                descriptor.set_write_method(write);
            }
            if property_type.is_some() {
                descriptor.set_property_type(property_type);
            }
            if found.indexed_getter.is_some() {
                descriptor.set_indexed_read_method(found.indexed_getter);
            }
            if indexed_write.is_some() {
                descriptor.set_indexed_write_method(indexed_write);
            }
            if indexed_type.is_some() {
                descriptor.set_indexed_type(indexed_type);
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// FluentPropertyBeanIntrospector

/// Accepts setters that return a value, e.g. `setName(string) -> Self`.
///
/// Every accessible one-argument method named `<prefix>X` with a return
/// type becomes the write method of `x` unless `x` already has one.
///
/// # Examples
///
/// ```
/// use dp_beans::introspect::FluentPropertyBeanIntrospector;
///
/// let fluent = FluentPropertyBeanIntrospector::new("with");
/// assert_eq!(fluent.prefix(), "with");
/// assert_eq!(FluentPropertyBeanIntrospector::default().prefix(), "set");
/// ```
#[derive(Debug, Clone)]
pub struct FluentPropertyBeanIntrospector {
    prefix: String,
}

impl FluentPropertyBeanIntrospector {
    pub const DEFAULT_PREFIX: &'static str = "set";

    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
        }
    }

    #[inline]
    pub fn prefix(&self) -> &str {
        &self.prefix
    }
}

impl Default for FluentPropertyBeanIntrospector {
    fn default() -> Self {
        Self::new(Self::DEFAULT_PREFIX)
    }
}

impl BeanIntrospector for FluentPropertyBeanIntrospector {
    fn introspect(&self, cx: &mut IntrospectionContext) -> Result<(), PropertyError> {
        for method in accessible_methods(cx.class()) {
            if method.params().len() != 1 || method.returns().is_none() {
                continue;
            }
            let Some(prop) = property_suffix(method.name(), &self.prefix) else {
                continue;
            };
            let descriptor = cx.entry(&prop);
            if descriptor.write_method().is_some() {
                continue;
            }
            trace!("fluent write method `{method}` for property `{prop}`");
            descriptor.set_write_method(Some(method));
            if descriptor.property_type().is_none() {
                descriptor.set_property_type(Some(method.params()[0].clone()));
            }
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// SuppressPropertiesIntrospector

/// Removes named properties after discovery.
///
/// [`SuppressPropertiesIntrospector::class`] hides `class`, which every
/// object exposes through the root `getClass` method.
#[derive(Debug, Clone)]
pub struct SuppressPropertiesIntrospector {
    names: Vec<String>,
}

impl SuppressPropertiesIntrospector {
    pub fn new<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    /// Suppresses the `class` property.
    pub fn class() -> Self {
        Self::new(["class"])
    }

    #[inline]
    pub fn names(&self) -> &[String] {
        &self.names
    }
}

impl BeanIntrospector for SuppressPropertiesIntrospector {
    fn introspect(&self, cx: &mut IntrospectionContext) -> Result<(), PropertyError> {
        for name in &self.names {
            cx.remove(name);
        }
        Ok(())
    }

    #[inline]
    fn is_suppression(&self) -> bool {
        true
    }
}

// -----------------------------------------------------------------------------
// Mapped discovery

/// Finds keyed accessors: `getX(string)` and `setX(string, T)`.
///
/// A keyed writer whose value type cannot hold what the keyed reader
/// returns is excluded and logged.
pub(crate) fn discover_mapped(class: &'static ClassInfo) -> MappedDescriptors {
    let mut readers: BTreeMap<String, &'static MethodInfo> = BTreeMap::new();
    let mut writers: BTreeMap<String, Vec<&'static MethodInfo>> = BTreeMap::new();

    for method in accessible_methods(class) {
        match (method.params(), method.returns()) {
            ([Type::Str], Some(_)) => {
                if let Some(prop) = property_suffix(method.name(), "get") {
                    readers.entry(prop).or_insert(method);
                }
            }
            ([Type::Str, _], None) => {
                if let Some(prop) = property_suffix(method.name(), "set") {
                    writers.entry(prop).or_default().push(method);
                }
            }
            _ => {}
        }
    }

    let mut names: Vec<String> = readers.keys().chain(writers.keys()).cloned().collect();
    names.sort();
    names.dedup();

    let descriptors = names
        .into_iter()
        .map(|name| {
            let read = readers.get(&name).copied();
            let candidates = writers.remove(&name).unwrap_or_default();
            let (value_type, write) = match read.and_then(MethodInfo::returns) {
                Some(ty) => {
                    let write = pick_writer(&candidates, 1, ty);
                    if write.is_none() && !candidates.is_empty() {
                        debug!(
                            "excluding keyed writer `{}` of `{}`: `{name}` is read as {ty}",
                            candidates[0],
                            class.name()
                        );
                    }
                    (ty.clone(), write)
                }
                None => {
                    let write = candidates.first().copied();
                    let ty = write.map_or(Type::Any, |m| m.params()[1].clone());
                    (ty, write)
                }
            };
            MappedPropertyDescriptor::new(name, value_type, read, write)
        })
        .collect();

    trace!("discovered keyed accessors of `{}`", class.name());
    MappedDescriptors::new(class, descriptors)
}
