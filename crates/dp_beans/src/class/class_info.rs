use core::any::TypeId;
use core::fmt;
use std::sync::OnceLock;

use crate::class::{ClassBuilder, MethodInfo};
use crate::ty::Type;
use crate::value::Value;

/// Default constructor stored in a [`ClassInfo`].
pub type Constructor = Box<dyn Fn() -> Value + Send + Sync>;

// -----------------------------------------------------------------------------
// ClassKind

/// Whether a [`ClassInfo`] describes a concrete class or an interface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ClassKind {
    Class,
    Interface,
}

// -----------------------------------------------------------------------------
// ClassInfo

/// Runtime metadata of a class: the table the descriptor cache introspects.
///
/// A `ClassInfo` is built once through [`ClassBuilder`] and kept in a
/// `static`, so `&'static ClassInfo` doubles as the class identity. Two
/// `ClassInfo`s are equal when their [`TypeId`]s are.
///
/// Every class chain ends at [`ClassInfo::object`], the root class.
///
/// # Examples
///
/// ```
/// use dp_beans::class::ClassInfo;
///
/// let root = ClassInfo::object();
/// assert_eq!(root.name(), "Object");
/// assert!(root.superclass().is_none());
/// assert!(root.find_method("getClass", &[]).is_some());
/// ```
pub struct ClassInfo {
    pub(super) name: &'static str,
    pub(super) type_id: TypeId,
    pub(super) kind: ClassKind,
    pub(super) public: bool,
    pub(super) superclass: Option<&'static ClassInfo>,
    pub(super) interfaces: Box<[&'static ClassInfo]>,
    pub(super) methods: Box<[MethodInfo]>,
    pub(super) constructor: Option<Constructor>,
}

struct ObjectRoot;

impl ClassInfo {
    /// Starts building a class for `T`, extending [`ClassInfo::object`].
    #[inline]
    pub fn builder<T: ?Sized + 'static>(name: &'static str) -> ClassBuilder<T> {
        ClassBuilder::new(name, ClassKind::Class)
    }

    /// Starts building an interface keyed by `T`, usually a `dyn Trait`.
    #[inline]
    pub fn interface<T: ?Sized + 'static>(name: &'static str) -> ClassBuilder<T> {
        ClassBuilder::new(name, ClassKind::Interface)
    }

    /// The root class.
    ///
    /// Declares a single public reader, `getClass`, returning the runtime
    /// class name of the receiver.
    pub fn object() -> &'static ClassInfo {
        static ROOT: OnceLock<ClassInfo> = OnceLock::new();
        ROOT.get_or_init(|| ClassInfo {
            name: "Object",
            type_id: TypeId::of::<ObjectRoot>(),
            kind: ClassKind::Class,
            public: true,
            superclass: None,
            interfaces: Box::new([]),
            methods: Box::new([MethodInfo::new("getClass", &[], Some(Type::Str))
                .with_ref_body(|obj, _| Ok(Value::from(obj.class_info().name())))]),
            constructor: None,
        })
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    #[inline]
    pub fn kind(&self) -> ClassKind {
        self.kind
    }

    #[inline]
    pub fn is_interface(&self) -> bool {
        self.kind == ClassKind::Interface
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.public
    }

    #[inline]
    pub fn superclass(&self) -> Option<&'static ClassInfo> {
        self.superclass
    }

    /// Interfaces declared directly on this class.
    #[inline]
    pub fn interfaces(&self) -> &[&'static ClassInfo] {
        &self.interfaces
    }

    /// Methods declared directly on this class.
    #[inline]
    pub fn methods(&self) -> &[MethodInfo] {
        &self.methods
    }

    /// Finds a method declared directly on this class.
    pub fn declared_method(&self, name: &str, params: &[Type]) -> Option<&MethodInfo> {
        self.methods
            .iter()
            .find(|m| m.name() == name && m.has_params(params))
    }

    /// Finds a method by signature: along the superclass chain first, then
    /// through the interfaces, most-derived first.
    pub fn find_method(&'static self, name: &str, params: &[Type]) -> Option<&'static MethodInfo> {
        for class in self.ancestors() {
            if let Some(method) = class.declared_method(name, params) {
                return Some(method);
            }
        }
        self.all_interfaces()
            .into_iter()
            .find_map(|iface| iface.declared_method(name, params))
    }

    /// Iterates this class and its superclasses, most-derived first.
    pub fn ancestors(&'static self) -> impl Iterator<Item = &'static ClassInfo> {
        core::iter::successors(Some(self), |class| class.superclass)
    }

    /// Every interface implemented by this class or its superclasses,
    /// including super-interfaces, without duplicates.
    pub fn all_interfaces(&'static self) -> Vec<&'static ClassInfo> {
        let mut found: Vec<&'static ClassInfo> = Vec::new();
        let mut stack: Vec<&'static ClassInfo> = Vec::new();
        for class in self.ancestors() {
            stack.extend(class.interfaces.iter().rev().copied());
            while let Some(iface) = stack.pop() {
                if found.iter().any(|f| *f == iface) {
                    continue;
                }
                found.push(iface);
                stack.extend(iface.interfaces.iter().rev().copied());
            }
        }
        found
    }

    /// Returns `true` if `self` is `other` or derives from it, through
    /// superclasses or interfaces.
    pub fn is_subclass_of(&self, other: &ClassInfo) -> bool {
        if self == other {
            return true;
        }
        if self.superclass.is_some_and(|s| s.is_subclass_of(other)) {
            return true;
        }
        self.interfaces.iter().any(|i| i.is_subclass_of(other))
    }

    #[inline]
    pub fn has_constructor(&self) -> bool {
        self.constructor.is_some()
    }

    /// Creates a new instance through the default constructor.
    #[inline]
    pub fn construct(&self) -> Option<Value> {
        self.constructor.as_ref().map(|ctor| ctor())
    }
}

impl PartialEq for ClassInfo {
    #[inline]
    fn eq(&self, other: &Self) -> bool {
        self.type_id == other.type_id
    }
}

impl Eq for ClassInfo {}

impl fmt::Debug for ClassInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClassInfo")
            .field("name", &self.name)
            .field("kind", &self.kind)
            .field("public", &self.public)
            .field("superclass", &self.superclass.map(ClassInfo::name))
            .field("methods", &self.methods)
            .finish_non_exhaustive()
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::ClassInfo;
    use crate::class::Class;
    use crate::testing::{Base, Derived, HiddenImpl, Named, Person};

    #[test]
    fn every_chain_ends_at_the_root() {
        let root = ClassInfo::object();
        assert!(Person::class().is_subclass_of(root));
        assert_eq!(Derived::class().ancestors().last(), Some(root));
        assert_eq!(Derived::class().ancestors().count(), 3);
    }

    #[test]
    fn subclassing_through_interfaces() {
        assert!(HiddenImpl::class().is_subclass_of(Named::class()));
        assert!(Derived::class().is_subclass_of(Base::class()));
        assert!(!Base::class().is_subclass_of(Derived::class()));
        assert!(!Person::class().is_subclass_of(Named::class()));
    }

    #[test]
    fn find_method_prefers_the_most_derived() {
        let found = Derived::class().find_method("getLabel", &[]).unwrap();
        let own = Derived::class().declared_method("getLabel", &[]).unwrap();
        assert!(core::ptr::eq(found, own));

        let iface = HiddenImpl::class().all_interfaces();
        assert_eq!(iface.len(), 1);
        assert_eq!(iface[0].name(), "Named");
    }

    #[test]
    fn construct_uses_the_default_constructor() {
        let value = Person::class().construct().unwrap();
        assert_eq!(value.as_object().unwrap().class_info(), Person::class());
        assert!(!Named::class().has_constructor());
    }
}
