use core::any::TypeId;
use core::marker::PhantomData;

use crate::class::{ClassInfo, ClassKind, Constructor, MethodInfo, Object};
use crate::error::InvokeError;
use crate::ty::Type;
use crate::value::{FromValue, Value};

// -----------------------------------------------------------------------------
// Helpers

fn receiver<'a, T: Object>(obj: &'a dyn Object, method: &'static str) -> Result<&'a T, InvokeError> {
    let class = obj.class_info().name();
    obj.as_any()
        .downcast_ref::<T>()
        .ok_or(InvokeError::WrongReceiver { method, class })
}

fn receiver_mut<'a, T: Object>(
    obj: &'a mut dyn Object,
    method: &'static str,
) -> Result<&'a mut T, InvokeError> {
    let class = obj.class_info().name();
    obj.as_any_mut()
        .downcast_mut::<T>()
        .ok_or(InvokeError::WrongReceiver { method, class })
}

fn arg<A: FromValue>(args: &[Value], method: &'static str, position: usize) -> Result<A, InvokeError> {
    let value = args.get(position).cloned().unwrap_or_default();
    A::from_value(value).map_err(|found| InvokeError::Argument {
        method,
        position,
        expected: A::value_type(),
        found: found.runtime_type(),
    })
}

fn index_arg(args: &[Value], method: &'static str) -> Result<usize, InvokeError> {
    let index: i32 = arg(args, method, 0)?;
    usize::try_from(index)
        .map_err(|_| InvokeError::Failed(format!("negative index {index} passed to `{method}`")))
}

fn key_arg(args: &[Value], method: &'static str) -> Result<String, InvokeError> {
    arg(args, method, 0)
}

// -----------------------------------------------------------------------------
// ClassBuilder

/// Builds a [`ClassInfo`].
///
/// The typed helpers (`getter`, `setter`, ...) are available when `T` is an
/// [`Object`]; they generate method bodies that downcast the receiver to `T`.
/// Interfaces are usually keyed by a marker type and only declare methods
/// through [`ClassBuilder::method`].
///
/// A class must not refer to its own [`ClassInfo`] while being built; use
/// [`Type::Any`] for self-typed parameters.
///
/// # Examples
///
/// ```
/// use dp_beans::class::{Class, ClassInfo};
/// use dp_beans::{Type, Value, impl_object};
///
/// #[derive(Default)]
/// struct Point { x: i32 }
///
/// impl_object!(Point, "Point", |builder| builder
///     .default_constructor()
///     .getter("getX", |p: &Point| p.x)
///     .setter("setX", |p: &mut Point, x: i32| p.x = x)
///     .build());
///
/// let class = Point::class();
/// assert_eq!(class.name(), "Point");
/// assert!(class.find_method("setX", &[Type::I32]).is_some());
///
/// let point = class.construct().unwrap();
/// let get_x = class.find_method("getX", &[]).unwrap();
/// assert_eq!(get_x.invoke(point.as_object().unwrap(), &[]), Ok(Value::I32(0)));
/// ```
pub struct ClassBuilder<T: ?Sized> {
    name: &'static str,
    type_id: TypeId,
    kind: ClassKind,
    public: bool,
    superclass: Option<&'static ClassInfo>,
    interfaces: Vec<&'static ClassInfo>,
    methods: Vec<MethodInfo>,
    constructor: Option<Constructor>,
    marker: PhantomData<fn(&T)>,
}

impl<T: ?Sized + 'static> ClassBuilder<T> {
    pub(super) fn new(name: &'static str, kind: ClassKind) -> Self {
        Self {
            name,
            type_id: TypeId::of::<T>(),
            kind,
            public: true,
            superclass: match kind {
                ClassKind::Class => Some(ClassInfo::object()),
                ClassKind::Interface => None,
            },
            interfaces: Vec::new(),
            methods: Vec::new(),
            constructor: None,
            marker: PhantomData,
        }
    }

    /// Sets the superclass.
    #[inline]
    pub fn extends(mut self, superclass: &'static ClassInfo) -> Self {
        self.superclass = Some(superclass);
        self
    }

    /// Adds an implemented interface (or a super-interface, for interfaces).
    #[inline]
    pub fn implements(mut self, interface: &'static ClassInfo) -> Self {
        self.interfaces.push(interface);
        self
    }

    /// Marks the class as not public.
    ///
    /// Methods declared only here are not usable as accessors.
    #[inline]
    pub fn non_public(mut self) -> Self {
        self.public = false;
        self
    }

    /// Declares a method.
    #[inline]
    pub fn method(mut self, method: MethodInfo) -> Self {
        self.methods.push(method);
        self
    }

    pub fn build(self) -> ClassInfo {
        ClassInfo {
            name: self.name,
            type_id: self.type_id,
            kind: self.kind,
            public: self.public,
            superclass: self.superclass,
            interfaces: self.interfaces.into_boxed_slice(),
            methods: self.methods.into_boxed_slice(),
            constructor: self.constructor,
        }
    }
}

impl<T: Object> ClassBuilder<T> {
    /// Sets the default constructor.
    pub fn constructor(mut self, ctor: impl Fn() -> T + Send + Sync + 'static) -> Self {
        self.constructor = Some(Box::new(move || Value::object(ctor())));
        self
    }

    /// Uses [`Default`] as the default constructor.
    #[inline]
    pub fn default_constructor(self) -> Self
    where
        T: Default,
    {
        self.constructor(T::default)
    }

    /// A reader method with shared receiver and raw arguments.
    pub fn reader(
        self,
        name: &'static str,
        params: &[Type],
        returns: Option<Type>,
        f: impl Fn(&T, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        self.method(
            MethodInfo::new(name, params, returns)
                .with_ref_body(move |obj, args| f(receiver(obj, name)?, args)),
        )
    }

    /// A writer method with exclusive receiver and raw arguments.
    pub fn writer(
        self,
        name: &'static str,
        params: &[Type],
        returns: Option<Type>,
        f: impl Fn(&mut T, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        self.method(
            MethodInfo::new(name, params, returns)
                .with_mut_body(move |obj, args| f(receiver_mut(obj, name)?, args)),
        )
    }

    /// `name()` returning `R`, declared as `R::value_type()`.
    pub fn getter<R>(self, name: &'static str, f: impl Fn(&T) -> R + Send + Sync + 'static) -> Self
    where
        R: FromValue + Into<Value>,
    {
        self.getter_as(name, R::value_type(), f)
    }

    /// `name()` with an explicit return type.
    pub fn getter_as<R: Into<Value>>(
        self,
        name: &'static str,
        returns: Type,
        f: impl Fn(&T) -> R + Send + Sync + 'static,
    ) -> Self {
        self.reader(name, &[], Some(returns), move |this, _| Ok(f(this).into()))
    }

    /// `name(A)` returning nothing, declared as `A::value_type()`.
    pub fn setter<A: FromValue>(
        self,
        name: &'static str,
        f: impl Fn(&mut T, A) + Send + Sync + 'static,
    ) -> Self {
        self.setter_as(name, A::value_type(), f)
    }

    /// `name(A)` with an explicit parameter type.
    pub fn setter_as<A: FromValue>(
        self,
        name: &'static str,
        param: Type,
        f: impl Fn(&mut T, A) + Send + Sync + 'static,
    ) -> Self {
        self.writer(name, &[param], None, move |this, args| {
            f(this, arg(args, name, 0)?);
            Ok(Value::Null)
        })
    }

    /// `name(A)` returning nothing that may fail.
    pub fn try_setter<A: FromValue>(
        self,
        name: &'static str,
        f: impl Fn(&mut T, A) -> Result<(), InvokeError> + Send + Sync + 'static,
    ) -> Self {
        self.writer(name, &[A::value_type()], None, move |this, args| {
            f(this, arg(args, name, 0)?)?;
            Ok(Value::Null)
        })
    }

    /// `name(A)` returning a value, e.g. a chained setter.
    ///
    /// The declared return type is [`Type::Any`] and the call returns
    /// `Null`.
    pub fn fluent_setter<A: FromValue>(
        self,
        name: &'static str,
        f: impl Fn(&mut T, A) + Send + Sync + 'static,
    ) -> Self {
        self.writer(name, &[A::value_type()], Some(Type::Any), move |this, args| {
            f(this, arg(args, name, 0)?);
            Ok(Value::Null)
        })
    }

    /// `name(i32)` returning the element at the index.
    ///
    /// `f` reports a bad index with [`InvokeError::IndexOutOfBounds`].
    pub fn indexed_getter<R>(
        self,
        name: &'static str,
        f: impl Fn(&T, usize) -> Result<R, InvokeError> + Send + Sync + 'static,
    ) -> Self
    where
        R: FromValue + Into<Value>,
    {
        self.reader(name, &[Type::I32], Some(R::value_type()), move |this, args| {
            Ok(f(this, index_arg(args, name)?)?.into())
        })
    }

    /// `name(i32, A)` replacing the element at the index.
    pub fn indexed_setter<A: FromValue>(
        self,
        name: &'static str,
        f: impl Fn(&mut T, usize, A) -> Result<(), InvokeError> + Send + Sync + 'static,
    ) -> Self {
        self.writer(name, &[Type::I32, A::value_type()], None, move |this, args| {
            let index = index_arg(args, name)?;
            f(this, index, arg(args, name, 1)?)?;
            Ok(Value::Null)
        })
    }

    /// `name(string)` returning the value stored under the key.
    pub fn mapped_getter<R>(
        self,
        name: &'static str,
        f: impl Fn(&T, &str) -> R + Send + Sync + 'static,
    ) -> Self
    where
        R: FromValue + Into<Value>,
    {
        self.reader(name, &[Type::Str], Some(R::value_type()), move |this, args| {
            Ok(f(this, &key_arg(args, name)?).into())
        })
    }

    /// `name(string, A)` storing the value under the key.
    pub fn mapped_setter<A: FromValue>(
        self,
        name: &'static str,
        f: impl Fn(&mut T, &str, A) + Send + Sync + 'static,
    ) -> Self {
        self.writer(name, &[Type::Str, A::value_type()], None, move |this, args| {
            let key = key_arg(args, name)?;
            f(this, &key, arg(args, name, 1)?);
            Ok(Value::Null)
        })
    }
}
