use core::any::TypeId;
use core::fmt;
use std::sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use crate::hash::{Entry, NoOpHashMap, NoOpHashState};

// -----------------------------------------------------------------------------
// SyncTypeMap

/// A [`TypeId`]-keyed map that can be shared between threads.
///
/// Values are stored behind [`Arc`] and never mutated in place: an entry is
/// either absent or a complete value. Construction happens outside the lock,
/// so a slow builder never blocks readers of other types, and two racing
/// builders for the same type both succeed while only the first insert is
/// kept.
///
/// # Examples
///
/// ```
/// use core::any::TypeId;
/// use std::sync::Arc;
/// use dp_utils::SyncTypeMap;
///
/// let map = SyncTypeMap::<String>::new();
/// let id = TypeId::of::<u32>();
///
/// let a = map.get_or_try_insert_with(id, || Ok::<_, ()>("u32".to_owned())).unwrap();
/// let b = map.get_or_try_insert_with(id, || Ok::<_, ()>("other".to_owned())).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
/// assert_eq!(*b, "u32");
///
/// map.clear();
/// assert!(map.get(&id).is_none());
/// ```
pub struct SyncTypeMap<V> {
    inner: RwLock<NoOpHashMap<TypeId, Arc<V>>>,
}

impl<V> SyncTypeMap<V> {
    /// Creates an empty `SyncTypeMap`.
    #[inline]
    pub const fn new() -> Self {
        Self {
            inner: RwLock::new(NoOpHashMap::with_hasher(NoOpHashState)),
        }
    }

    #[inline]
    fn read(&self) -> RwLockReadGuard<'_, NoOpHashMap<TypeId, Arc<V>>> {
        self.inner.read().unwrap_or_else(PoisonError::into_inner)
    }

    #[inline]
    fn write(&self) -> RwLockWriteGuard<'_, NoOpHashMap<TypeId, Arc<V>>> {
        self.inner.write().unwrap_or_else(PoisonError::into_inner)
    }

    /// Returns the value stored for `type_id`, if any.
    #[inline]
    pub fn get(&self, type_id: &TypeId) -> Option<Arc<V>> {
        self.read().get(type_id).cloned()
    }

    /// Returns the stored value, building and inserting it on a miss.
    ///
    /// `f` runs without holding the lock. If another thread inserted a value
    /// for the same key in the meantime, that value is returned and the
    /// freshly built one is dropped.
    pub fn get_or_try_insert_with<E>(
        &self,
        type_id: TypeId,
        f: impl FnOnce() -> Result<V, E>,
    ) -> Result<Arc<V>, E> {
        if let Some(value) = self.get(&type_id) {
            return Ok(value);
        }

        let built = Arc::new(f()?);

        match self.write().entry(type_id) {
            Entry::Occupied(entry) => Ok(entry.get().clone()),
            Entry::Vacant(entry) => Ok(entry.insert(built).clone()),
        }
    }

    /// Like [`get_or_try_insert_with`](Self::get_or_try_insert_with), but a
    /// freshly built value is stored only if `keep` returns `true` under the
    /// write lock.
    ///
    /// Returns `Ok(None)` when `keep` rejects the value; nothing is stored
    /// and the caller decides whether to rebuild.
    pub fn get_or_try_insert_checked<E>(
        &self,
        type_id: TypeId,
        f: impl FnOnce() -> Result<V, E>,
        keep: impl FnOnce() -> bool,
    ) -> Result<Option<Arc<V>>, E> {
        if let Some(value) = self.get(&type_id) {
            return Ok(Some(value));
        }

        let built = Arc::new(f()?);

        let mut map = self.write();
        if let Some(value) = map.get(&type_id) {
            return Ok(Some(value.clone()));
        }
        if !keep() {
            return Ok(None);
        }
        map.insert(type_id, built.clone());
        Ok(Some(built))
    }

    /// Inserts or replaces the value for `type_id`, returning the stored `Arc`.
    pub fn insert(&self, type_id: TypeId, value: V) -> Arc<V> {
        let value = Arc::new(value);
        self.write().insert(type_id, value.clone());
        value
    }

    /// Removes the value for `type_id`.
    pub fn remove(&self, type_id: &TypeId) -> Option<Arc<V>> {
        self.write().remove(type_id)
    }

    /// Returns `true` if a value is stored for `type_id`.
    #[inline]
    pub fn contains(&self, type_id: &TypeId) -> bool {
        self.read().contains_key(type_id)
    }

    /// Removes every entry.
    ///
    /// `Arc`s already handed out stay valid; later lookups rebuild.
    pub fn clear(&self) {
        self.write().clear();
    }

    /// Returns the number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.read().len()
    }

    /// Returns `true` if the map holds no entries.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }
}

impl<V> Default for SyncTypeMap<V> {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl<V> fmt::Debug for SyncTypeMap<V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SyncTypeMap")
            .field("len", &self.len())
            .finish()
    }
}

// -----------------------------------------------------------------------------
// Tests
