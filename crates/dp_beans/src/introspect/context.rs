use std::collections::BTreeMap;

use crate::class::ClassInfo;
use crate::introspect::PropertyDescriptor;

/// The working set of descriptors while a class is being introspected.
///
/// [`BeanIntrospector`](crate::introspect::BeanIntrospector)s run in
/// sequence against the same context; each one may add, extend or remove
/// descriptors.
#[derive(Debug)]
pub struct IntrospectionContext {
    class: &'static ClassInfo,
    properties: BTreeMap<String, PropertyDescriptor>,
}

impl IntrospectionContext {
    pub fn new(class: &'static ClassInfo) -> Self {
        Self {
            class,
            properties: BTreeMap::new(),
        }
    }

    /// The class being introspected.
    #[inline]
    pub fn class(&self) -> &'static ClassInfo {
        self.class
    }

    /// Adds a descriptor, replacing one of the same name.
    pub fn add(&mut self, descriptor: PropertyDescriptor) {
        self.properties.insert(descriptor.name().to_owned(), descriptor);
    }

    /// Returns the descriptor for `name`, creating an empty one if needed.
    pub fn entry(&mut self, name: &str) -> &mut PropertyDescriptor {
        self.properties
            .entry(name.to_owned())
            .or_insert_with(|| PropertyDescriptor::new(name))
    }

    #[inline]
    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.properties.get(name)
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.properties.contains_key(name)
    }

    #[inline]
    pub fn remove(&mut self, name: &str) -> Option<PropertyDescriptor> {
        self.properties.remove(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.properties.keys().map(String::as_str)
    }

    pub(crate) fn into_descriptors(self) -> Vec<PropertyDescriptor> {
        self.properties.into_values().collect()
    }
}
