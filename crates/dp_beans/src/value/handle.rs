use core::any::Any;
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use dp_utils::hash::HashMap;

use crate::class::{ClassInfo, Object};
use crate::dyna::DynaBean;
use crate::ty::Type;
use crate::value::Value;

#[inline]
fn read<T: ?Sized>(lock: &RwLock<T>) -> RwLockReadGuard<'_, T> {
    lock.read().unwrap_or_else(PoisonError::into_inner)
}

#[inline]
fn write<T: ?Sized>(lock: &RwLock<T>) -> RwLockWriteGuard<'_, T> {
    lock.write().unwrap_or_else(PoisonError::into_inner)
}

// -----------------------------------------------------------------------------
// ArrayRef

struct ArrayData {
    element: Type,
    items: Vec<Value>,
}

/// A shared, fixed-size array with a declared element type.
///
/// The length never changes. Growing an array means building a larger one
/// with [`ArrayRef::resized`] and storing it where the old one was.
#[derive(Clone)]
pub struct ArrayRef(Arc<RwLock<ArrayData>>);

impl ArrayRef {
    /// Creates an array of `len` default elements: zero for primitive
    /// element types, `Null` otherwise.
    pub fn new(element: Type, len: usize) -> Self {
        let items = (0..len).map(|_| element.default_value()).collect();
        Self::from_values(element, items)
    }

    /// Creates an array from existing elements.
    ///
    /// Elements are not checked against `element`.
    pub fn from_values(element: Type, items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(ArrayData { element, items })))
    }

    #[inline]
    pub fn element_type(&self) -> Type {
        read(&self.0).element.clone()
    }

    #[inline]
    pub fn len(&self) -> usize {
        read(&self.0).items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.0).items.get(index).cloned()
    }

    /// Replaces the element at `index`, returning the previous one.
    ///
    /// Returns `None` and drops `value` if `index` is out of bounds.
    pub fn set(&self, index: usize, value: Value) -> Option<Value> {
        let mut data = write(&self.0);
        let slot = data.items.get_mut(index)?;
        Some(core::mem::replace(slot, value))
    }

    /// Builds a new array of `new_len` elements holding a copy of this
    /// one's elements followed by values produced by `fill`.
    ///
    /// If `new_len` is not larger than the current length, the copy is
    /// truncated instead.
    pub fn resized(&self, new_len: usize, fill: impl FnMut() -> Value) -> ArrayRef {
        let data = read(&self.0);
        let mut items = data.items.clone();
        items.resize_with(new_len, fill);
        Self::from_values(data.element.clone(), items)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        read(&self.0).items.clone()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ArrayRef {
    fn eq(&self, other: &Self) -> bool {
        if self.ptr_eq(other) {
            return true;
        }
        let (a, b) = (read(&self.0), read(&other.0));
        a.element == b.element && a.items == b.items
    }
}

impl fmt::Debug for ArrayRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = read(&self.0);
        write!(f, "{}", data.element)?;
        f.debug_list().entries(data.items.iter()).finish()
    }
}

// -----------------------------------------------------------------------------
// ListRef

/// A shared, growable sequence.
#[derive(Clone, Default)]
pub struct ListRef(Arc<RwLock<Vec<Value>>>);

impl ListRef {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn from_vec(items: Vec<Value>) -> Self {
        Self(Arc::new(RwLock::new(items)))
    }

    #[inline]
    pub fn len(&self) -> usize {
        read(&self.0).len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        read(&self.0).is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<Value> {
        read(&self.0).get(index).cloned()
    }

    /// Replaces the element at `index`, returning the previous one.
    ///
    /// Returns `None` and drops `value` if `index` is out of bounds.
    pub fn set(&self, index: usize, value: Value) -> Option<Value> {
        let mut items = write(&self.0);
        let slot = items.get_mut(index)?;
        Some(core::mem::replace(slot, value))
    }

    #[inline]
    pub fn push(&self, value: impl Into<Value>) {
        write(&self.0).push(value.into());
    }

    /// Grows the list to at least `len` elements using `fill`.
    ///
    /// Returns the number of appended elements; never shrinks.
    pub fn grow_to(&self, len: usize, fill: impl FnMut() -> Value) -> usize {
        let mut items = write(&self.0);
        let before = items.len();
        if len > before {
            items.resize_with(len, fill);
        }
        items.len() - before
    }

    pub fn remove(&self, index: usize) -> Option<Value> {
        let mut items = write(&self.0);
        (index < items.len()).then(|| items.remove(index))
    }

    #[inline]
    pub fn clear(&self) {
        write(&self.0).clear();
    }

    pub fn to_vec(&self) -> Vec<Value> {
        read(&self.0).clone()
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for ListRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *read(&self.0) == *read(&other.0)
    }
}

impl fmt::Debug for ListRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(read(&self.0).iter()).finish()
    }
}

// -----------------------------------------------------------------------------
// MapRef

/// A shared string-keyed map.
#[derive(Clone, Default)]
pub struct MapRef(Arc<RwLock<HashMap<String, Value>>>);

impl MapRef {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        read(&self.0).len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        read(&self.0).is_empty()
    }

    #[inline]
    pub fn get(&self, key: &str) -> Option<Value> {
        read(&self.0).get(key).cloned()
    }

    #[inline]
    pub fn contains_key(&self, key: &str) -> bool {
        read(&self.0).contains_key(key)
    }

    #[inline]
    pub fn insert(&self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        write(&self.0).insert(key.into(), value.into())
    }

    #[inline]
    pub fn remove(&self, key: &str) -> Option<Value> {
        write(&self.0).remove(key)
    }

    #[inline]
    pub fn clear(&self) {
        write(&self.0).clear();
    }

    /// Returns the keys in ascending order.
    pub fn keys(&self) -> Vec<String> {
        let mut keys: Vec<String> = read(&self.0).keys().cloned().collect();
        keys.sort_unstable();
        keys
    }

    /// Returns a snapshot of the entries in ascending key order.
    pub fn entries(&self) -> Vec<(String, Value)> {
        let mut entries: Vec<(String, Value)> = read(&self.0)
            .iter()
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect();
        entries.sort_unstable_by(|a, b| a.0.cmp(&b.0));
        entries
    }

    /// Runs `f` with the map write-locked.
    ///
    /// Used where a check and the mutation it guards must not interleave
    /// with other writers.
    pub fn with_mut<R>(&self, f: impl FnOnce(&mut HashMap<String, Value>) -> R) -> R {
        f(&mut write(&self.0))
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl PartialEq for MapRef {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(other) || *read(&self.0) == *read(&other.0)
    }
}

impl fmt::Debug for MapRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.entries()).finish()
    }
}

// -----------------------------------------------------------------------------
// ObjRef

struct ObjCell<T: ?Sized> {
    class: &'static ClassInfo,
    is_dyna: bool,
    value: RwLock<T>,
}

/// A shared handle to an object.
///
/// Cloning the handle shares the object; equality of [`Value::Object`] is
/// identity.
///
/// # Examples
///
/// ```
/// use dp_beans::dyna::AutoSchemaBag;
/// use dp_beans::value::ObjRef;
///
/// let a = ObjRef::new(AutoSchemaBag::new());
/// let b = a.clone();
/// assert!(a.ptr_eq(&b));
/// assert!(a.is_dyna_bean());
/// assert_eq!(a.with(|bag: &AutoSchemaBag| bag.len()), Some(0));
/// ```
#[derive(Clone)]
pub struct ObjRef(Arc<ObjCell<dyn Object>>);

impl ObjRef {
    pub fn new<T: Object>(value: T) -> Self {
        let cell: Arc<ObjCell<dyn Object>> = Arc::new(ObjCell {
            class: value.class_info(),
            is_dyna: value.as_dyna_bean().is_some(),
            value: RwLock::new(value),
        });
        Self(cell)
    }

    /// The runtime class of the object.
    #[inline]
    pub fn class_info(&self) -> &'static ClassInfo {
        self.0.class
    }

    /// Returns `true` if the object is a dynamic bag.
    #[inline]
    pub fn is_dyna_bean(&self) -> bool {
        self.0.is_dyna
    }

    /// Returns the schema name of a dynamic bag.
    pub fn dyna_schema_name(&self) -> Option<String> {
        if !self.0.is_dyna {
            return None;
        }
        let guard = self.read();
        guard.as_dyna_bean().map(|bag| bag.schema().name().to_owned())
    }

    #[inline]
    pub fn read(&self) -> RwLockReadGuard<'_, dyn Object> {
        read(&self.0.value)
    }

    #[inline]
    pub fn write(&self) -> RwLockWriteGuard<'_, dyn Object> {
        write(&self.0.value)
    }

    /// Runs `f` on the object if it is a `T`.
    pub fn with<T: Object, R>(&self, f: impl FnOnce(&T) -> R) -> Option<R> {
        let guard = self.read();
        let any: &dyn Any = guard.as_any();
        any.downcast_ref::<T>().map(f)
    }

    /// Runs `f` on the object mutably if it is a `T`.
    pub fn with_mut<T: Object, R>(&self, f: impl FnOnce(&mut T) -> R) -> Option<R> {
        let mut guard = self.write();
        let any: &mut dyn Any = guard.as_any_mut();
        any.downcast_mut::<T>().map(f)
    }

    /// Runs `f` on the object as a dynamic bag, if it is one.
    ///
    /// The object stays write-locked while `f` runs.
    pub fn with_dyna<R>(&self, f: impl FnOnce(&mut dyn DynaBean) -> R) -> Option<R> {
        if !self.0.is_dyna {
            return None;
        }
        let mut guard = self.write();
        guard.as_dyna_bean_mut().map(f)
    }

    #[inline]
    pub fn ptr_eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }

    #[inline]
    fn addr(&self) -> *const () {
        Arc::as_ptr(&self.0) as *const ()
    }
}

impl fmt::Debug for ObjRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{:p}", self.0.class.name(), self.addr())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{ArrayRef, ListRef, MapRef, ObjRef};
    use crate::testing::Person;
    use crate::ty::Type;
    use crate::value::Value;

    #[test]
    fn array_is_fixed_size() {
        let array = ArrayRef::new(Type::I32, 2);
        assert_eq!(array.get(1), Some(Value::I32(0)));
        assert!(array.set(2, Value::I32(1)).is_none());
        assert_eq!(array.len(), 2);

        let grown = array.resized(4, || Value::I32(9));
        assert!(!grown.ptr_eq(&array));
        assert_eq!(grown.to_vec(), vec![Value::I32(0), Value::I32(0), Value::I32(9), Value::I32(9)]);
        assert_eq!(array.len(), 2);
    }

    #[test]
    fn list_grows_in_place() {
        let list = ListRef::new();
        let alias = list.clone();
        assert_eq!(list.grow_to(3, || Value::Null), 3);
        assert_eq!(list.grow_to(1, || Value::Null), 0);
        assert_eq!(alias.len(), 3);
    }

    #[test]
    fn map_keys_are_sorted() {
        let map = MapRef::new();
        map.insert("b", 1_i32);
        map.insert("a", 2_i32);
        assert_eq!(map.keys(), ["a", "b"]);
        assert_eq!(map.entries()[0], ("a".to_owned(), Value::I32(2)));
    }

    #[test]
    fn object_downcast() {
        let obj = ObjRef::new(Person::default());
        assert!(!obj.is_dyna_bean());
        assert_eq!(obj.class_info().name(), "Person");
        obj.with_mut(|p: &mut Person| p.name = Some("Ann".into()));
        assert_eq!(obj.with(|p: &Person| p.name.clone()), Some(Some("Ann".to_owned())));
        assert!(obj.with(|_: &crate::testing::Address| ()).is_none());
        assert!(obj.with_dyna(|_| ()).is_none());
    }
}
