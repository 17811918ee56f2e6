use core::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};

use dp_utils::SyncTypeMap;
use log::trace;

use crate::class::ClassInfo;
use crate::error::PropertyError;
use crate::introspect::strategy::discover_mapped;
use crate::introspect::{
    BeanIntrospector, DefaultBeanIntrospector, IntrospectionContext, MappedDescriptors,
    SuppressPropertiesIntrospector, TypeDescriptors,
};

fn default_introspectors() -> Vec<Arc<dyn BeanIntrospector>> {
    vec![
        Arc::new(DefaultBeanIntrospector),
        Arc::new(SuppressPropertiesIntrospector::class()),
    ]
}

// -----------------------------------------------------------------------------
// DescriptorCache

/// Per-class property descriptors, built once and shared.
///
/// Lookups take a read lock. On a miss the descriptor set is built outside
/// the lock and inserted only if no other thread got there first, so a
/// reader never sees a partially built set and racing builders agree on
/// one `Arc`.
///
/// Keyed descriptors are cached separately. [`invalidate`] clears both;
/// `Arc`s handed out before stay valid and later lookups rebuild.
///
/// Every change to the strategy list invalidates the cache and bumps a
/// generation counter. A set built while the generation moved is not
/// stored; the lookup rebuilds it with the current strategies.
///
/// [`invalidate`]: DescriptorCache::invalidate
///
/// # Examples
///
/// ```
/// use std::sync::Arc;
/// use dp_beans::class::ClassInfo;
/// use dp_beans::introspect::DescriptorCache;
///
/// let cache = DescriptorCache::new();
/// let a = cache.describe(ClassInfo::object()).unwrap();
/// let b = cache.describe(ClassInfo::object()).unwrap();
/// assert!(Arc::ptr_eq(&a, &b));
///
/// // `class` is suppressed by default.
/// assert!(a.is_empty());
///
/// cache.invalidate();
/// let c = cache.describe(ClassInfo::object()).unwrap();
/// assert!(!Arc::ptr_eq(&a, &c));
/// assert_eq!(a, c);
/// ```
pub struct DescriptorCache {
    descriptors: SyncTypeMap<TypeDescriptors>,
    mapped: SyncTypeMap<MappedDescriptors>,
    introspectors: RwLock<Vec<Arc<dyn BeanIntrospector>>>,
    generation: AtomicU64,
}

impl DescriptorCache {
    /// Creates a cache running [`DefaultBeanIntrospector`] followed by
    /// [`SuppressPropertiesIntrospector::class`].
    pub fn new() -> Self {
        Self::with_introspectors(default_introspectors())
    }

    /// Creates a cache running exactly `introspectors`.
    pub fn with_introspectors(introspectors: Vec<Arc<dyn BeanIntrospector>>) -> Self {
        Self {
            descriptors: SyncTypeMap::new(),
            mapped: SyncTypeMap::new(),
            introspectors: RwLock::new(introspectors),
            generation: AtomicU64::new(0),
        }
    }

    /// Returns the property descriptors of `class`, building them on the
    /// first call.
    pub fn describe(&self, class: &'static ClassInfo) -> Result<Arc<TypeDescriptors>, PropertyError> {
        loop {
            // Read before the strategy list is cloned in `build`.
            let generation = self.generation.load(Ordering::SeqCst);
            let stored = self.descriptors.get_or_try_insert_checked(
                class.type_id(),
                || self.build(class),
                || self.generation.load(Ordering::SeqCst) == generation,
            )?;
            match stored {
                Some(descriptors) => return Ok(descriptors),
                None => trace!(
                    "strategies changed while describing `{}`, rebuilding",
                    class.name()
                ),
            }
        }
    }

    /// Returns the keyed property descriptors of `class`.
    pub fn describe_mapped(&self, class: &'static ClassInfo) -> Arc<MappedDescriptors> {
        let built = self
            .mapped
            .get_or_try_insert_with(class.type_id(), || {
                Ok::<_, core::convert::Infallible>(discover_mapped(class))
            });
        match built {
            Ok(descriptors) => descriptors,
        }
    }

    /// Returns `true` if descriptors of `class` are cached.
    #[inline]
    pub fn is_cached(&self, class: &'static ClassInfo) -> bool {
        self.descriptors.contains(&class.type_id())
    }

    /// Drops every cached descriptor set.
    pub fn invalidate(&self) {
        trace!("invalidating descriptor cache");
        self.generation.fetch_add(1, Ordering::SeqCst);
        self.descriptors.clear();
        self.mapped.clear();
    }

    /// Appends a discovery strategy and invalidates the cache.
    ///
    /// It runs after every registered strategy, suppressions included.
    pub fn add_introspector(&self, introspector: Arc<dyn BeanIntrospector>) {
        self.introspectors
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .push(introspector);
        self.invalidate();
    }

    /// Adds a discovery strategy ahead of the first
    /// [suppression](BeanIntrospector::is_suppression) and invalidates the
    /// cache.
    ///
    /// Suppressed names stay hidden whatever the new strategy finds.
    pub fn insert_introspector(&self, introspector: Arc<dyn BeanIntrospector>) {
        {
            let mut list = self
                .introspectors
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let at = list
                .iter()
                .position(|i| i.is_suppression())
                .unwrap_or(list.len());
            list.insert(at, introspector);
        }
        self.invalidate();
    }

    /// Removes a strategy previously added, by identity.
    ///
    /// Returns `false` if it was not registered.
    pub fn remove_introspector(&self, introspector: &Arc<dyn BeanIntrospector>) -> bool {
        let removed = {
            let mut list = self
                .introspectors
                .write()
                .unwrap_or_else(PoisonError::into_inner);
            let before = list.len();
            list.retain(|i| !Arc::ptr_eq(i, introspector));
            list.len() != before
        };
        if removed {
            self.invalidate();
        }
        removed
    }

    /// Restores the default strategies and invalidates the cache.
    pub fn reset_introspectors(&self) {
        *self
            .introspectors
            .write()
            .unwrap_or_else(PoisonError::into_inner) = default_introspectors();
        self.invalidate();
    }

    fn build(&self, class: &'static ClassInfo) -> Result<TypeDescriptors, PropertyError> {
        let introspectors = self
            .introspectors
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone();

        let mut cx = IntrospectionContext::new(class);
        for introspector in &introspectors {
            introspector.introspect(&mut cx)?;
        }

        let descriptors = TypeDescriptors::new(class, cx.into_descriptors());
        trace!(
            "built {} property descriptor(s) for `{}`",
            descriptors.len(),
            class.name()
        );
        Ok(descriptors)
    }
}

impl Default for DescriptorCache {
    #[inline]
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for DescriptorCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("DescriptorCache")
            .field("descriptors", &self.descriptors)
            .field("mapped", &self.mapped)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests
