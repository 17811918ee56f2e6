use core::fmt;

use crate::class::{ClassInfo, MethodInfo};
use crate::ty::Type;

fn same_method(a: Option<&'static MethodInfo>, b: Option<&'static MethodInfo>) -> bool {
    match (a, b) {
        (Some(a), Some(b)) => core::ptr::eq(a, b),
        (None, None) => true,
        _ => false,
    }
}

fn method_name(m: Option<&'static MethodInfo>) -> Option<&'static str> {
    m.map(MethodInfo::name)
}

// -----------------------------------------------------------------------------
// PropertyDescriptor

/// Accessors of one property of a class.
///
/// `property_type` is `None` for a property that only has indexed
/// accessors. Equality compares names, types and accessor identity.
#[derive(Clone)]
pub struct PropertyDescriptor {
    name: String,
    property_type: Option<Type>,
    read: Option<&'static MethodInfo>,
    write: Option<&'static MethodInfo>,
    indexed_type: Option<Type>,
    indexed_read: Option<&'static MethodInfo>,
    indexed_write: Option<&'static MethodInfo>,
}

impl PropertyDescriptor {
    /// Creates a descriptor without accessors.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            property_type: None,
            read: None,
            write: None,
            indexed_type: None,
            indexed_read: None,
            indexed_write: None,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type of the whole property.
    #[inline]
    pub fn property_type(&self) -> Option<&Type> {
        self.property_type.as_ref()
    }

    #[inline]
    pub fn read_method(&self) -> Option<&'static MethodInfo> {
        self.read
    }

    #[inline]
    pub fn write_method(&self) -> Option<&'static MethodInfo> {
        self.write
    }

    /// Declared element type of the indexed accessors.
    #[inline]
    pub fn indexed_type(&self) -> Option<&Type> {
        self.indexed_type.as_ref()
    }

    #[inline]
    pub fn indexed_read_method(&self) -> Option<&'static MethodInfo> {
        self.indexed_read
    }

    #[inline]
    pub fn indexed_write_method(&self) -> Option<&'static MethodInfo> {
        self.indexed_write
    }

    /// Returns `true` if the property has an indexed accessor.
    #[inline]
    pub fn is_indexed(&self) -> bool {
        self.indexed_read.is_some() || self.indexed_write.is_some()
    }

    #[inline]
    pub fn is_readable(&self) -> bool {
        self.read.is_some()
    }

    #[inline]
    pub fn is_writeable(&self) -> bool {
        self.write.is_some()
    }

    #[inline]
    pub fn set_property_type(&mut self, ty: Option<Type>) {
        self.property_type = ty;
    }

    #[inline]
    pub fn set_read_method(&mut self, method: Option<&'static MethodInfo>) {
        self.read = method;
    }

    #[inline]
    pub fn set_write_method(&mut self, method: Option<&'static MethodInfo>) {
        self.write = method;
    }

    #[inline]
    pub fn set_indexed_type(&mut self, ty: Option<Type>) {
        self.indexed_type = ty;
    }

    #[inline]
    pub fn set_indexed_read_method(&mut self, method: Option<&'static MethodInfo>) {
        self.indexed_read = method;
    }

    #[inline]
    pub fn set_indexed_write_method(&mut self, method: Option<&'static MethodInfo>) {
        self.indexed_write = method;
    }
}

impl PartialEq for PropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.property_type == other.property_type
            && self.indexed_type == other.indexed_type
            && same_method(self.read, other.read)
            && same_method(self.write, other.write)
            && same_method(self.indexed_read, other.indexed_read)
            && same_method(self.indexed_write, other.indexed_write)
    }
}

impl fmt::Debug for PropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PropertyDescriptor")
            .field("name", &self.name)
            .field("type", &self.property_type)
            .field("read", &method_name(self.read))
            .field("write", &method_name(self.write))
            .field("indexed_type", &self.indexed_type)
            .field("indexed_read", &method_name(self.indexed_read))
            .field("indexed_write", &method_name(self.indexed_write))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// TypeDescriptors

/// All property descriptors of one class, sorted by name.
///
/// Built once by the [`DescriptorCache`](crate::introspect::DescriptorCache)
/// and never modified afterwards.
#[derive(Debug, PartialEq)]
pub struct TypeDescriptors {
    class: &'static ClassInfo,
    descriptors: Box<[PropertyDescriptor]>,
}

impl TypeDescriptors {
    /// Creates the set, sorting `descriptors` by name.
    pub fn new(class: &'static ClassInfo, mut descriptors: Vec<PropertyDescriptor>) -> Self {
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            class,
            descriptors: descriptors.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn class(&self) -> &'static ClassInfo {
        self.class
    }

    pub fn get(&self, name: &str) -> Option<&PropertyDescriptor> {
        self.descriptors
            .binary_search_by(|d| d.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.descriptors[i])
    }

    #[inline]
    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, PropertyDescriptor> {
        self.descriptors.iter()
    }

    /// Property names in ascending order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.descriptors.iter().map(PropertyDescriptor::name)
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}

impl<'a> IntoIterator for &'a TypeDescriptors {
    type Item = &'a PropertyDescriptor;
    type IntoIter = core::slice::Iter<'a, PropertyDescriptor>;

    #[inline]
    fn into_iter(self) -> Self::IntoIter {
        self.descriptors.iter()
    }
}

// -----------------------------------------------------------------------------
// MappedPropertyDescriptor

/// Keyed accessors `getX(string)` / `setX(string, T)` of one property.
#[derive(Clone)]
pub struct MappedPropertyDescriptor {
    name: String,
    value_type: Type,
    read: Option<&'static MethodInfo>,
    write: Option<&'static MethodInfo>,
}

impl MappedPropertyDescriptor {
    pub fn new(
        name: impl Into<String>,
        value_type: Type,
        read: Option<&'static MethodInfo>,
        write: Option<&'static MethodInfo>,
    ) -> Self {
        Self {
            name: name.into(),
            value_type,
            read,
            write,
        }
    }

    #[inline]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Declared type of the values stored under a key.
    #[inline]
    pub fn value_type(&self) -> &Type {
        &self.value_type
    }

    #[inline]
    pub fn read_method(&self) -> Option<&'static MethodInfo> {
        self.read
    }

    #[inline]
    pub fn write_method(&self) -> Option<&'static MethodInfo> {
        self.write
    }
}

impl PartialEq for MappedPropertyDescriptor {
    fn eq(&self, other: &Self) -> bool {
        self.name == other.name
            && self.value_type == other.value_type
            && same_method(self.read, other.read)
            && same_method(self.write, other.write)
    }
}

impl fmt::Debug for MappedPropertyDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MappedPropertyDescriptor")
            .field("name", &self.name)
            .field("value_type", &self.value_type)
            .field("read", &method_name(self.read))
            .field("write", &method_name(self.write))
            .finish()
    }
}

// -----------------------------------------------------------------------------
// MappedDescriptors

/// All keyed property descriptors of one class, sorted by name.
#[derive(Debug, PartialEq)]
pub struct MappedDescriptors {
    class: &'static ClassInfo,
    descriptors: Box<[MappedPropertyDescriptor]>,
}

impl MappedDescriptors {
    pub fn new(class: &'static ClassInfo, mut descriptors: Vec<MappedPropertyDescriptor>) -> Self {
        descriptors.sort_by(|a, b| a.name.cmp(&b.name));
        Self {
            class,
            descriptors: descriptors.into_boxed_slice(),
        }
    }

    #[inline]
    pub fn class(&self) -> &'static ClassInfo {
        self.class
    }

    pub fn get(&self, name: &str) -> Option<&MappedPropertyDescriptor> {
        self.descriptors
            .binary_search_by(|d| d.name.as_str().cmp(name))
            .ok()
            .map(|i| &self.descriptors[i])
    }

    #[inline]
    pub fn iter(&self) -> core::slice::Iter<'_, MappedPropertyDescriptor> {
        self.descriptors.iter()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.descriptors.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.descriptors.is_empty()
    }
}
