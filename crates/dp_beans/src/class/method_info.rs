use core::fmt;
use std::sync::Arc;

use crate::class::Object;
use crate::error::InvokeError;
use crate::ty::Type;
use crate::value::{ObjRef, Value};

// -----------------------------------------------------------------------------
// MethodBody

/// Body of a method taking a shared receiver.
pub type RefBody = dyn Fn(&dyn Object, &[Value]) -> Result<Value, InvokeError> + Send + Sync;

/// Body of a method taking an exclusive receiver.
pub type MutBody = dyn Fn(&mut dyn Object, &[Value]) -> Result<Value, InvokeError> + Send + Sync;

/// Executable part of a [`MethodInfo`].
#[derive(Clone)]
pub enum MethodBody {
    /// Runs with the receiver read-locked.
    Ref(Arc<RefBody>),
    /// Runs with the receiver write-locked.
    Mut(Arc<MutBody>),
}

// -----------------------------------------------------------------------------
// MethodInfo

/// A method declared by a class or interface.
///
/// A method without a body is a declaration only (an interface method or an
/// abstract one). Invoking it fails with [`InvokeError::Abstract`].
///
/// # Examples
///
/// ```
/// use dp_beans::{Type, Value, class::MethodInfo};
///
/// let m = MethodInfo::new("getName", &[], Some(Type::Str));
/// assert_eq!(m.name(), "getName");
/// assert!(m.params().is_empty());
/// assert!(m.is_public());
/// assert!(!m.has_body());
/// ```
pub struct MethodInfo {
    name: &'static str,
    params: Box<[Type]>,
    returns: Option<Type>,
    public: bool,
    body: Option<MethodBody>,
}

impl MethodInfo {
    /// Creates a public method declaration without a body.
    ///
    /// `returns` is `None` for methods returning nothing.
    pub fn new(
        name: &'static str,
        params: &[Type],
        returns: Option<Type>,
    ) -> Self {
        Self {
            name,
            params: params.into(),
            returns,
            public: true,
            body: None,
        }
    }

    /// Marks the method as not public.
    #[inline]
    pub fn private(mut self) -> Self {
        self.public = false;
        self
    }

    /// Attaches a body running on a shared receiver.
    pub fn with_ref_body(
        mut self,
        body: impl Fn(&dyn Object, &[Value]) -> Result<Value, InvokeError> + Send + Sync + 'static,
    ) -> Self {
        self.body = Some(MethodBody::Ref(Arc::new(body)));
        self
    }

    /// Attaches a body running on an exclusive receiver.
    pub fn with_mut_body(
        mut self,
        body: impl Fn(&mut dyn Object, &[Value]) -> Result<Value, InvokeError>
        + Send
        + Sync
        + 'static,
    ) -> Self {
        self.body = Some(MethodBody::Mut(Arc::new(body)));
        self
    }

    #[inline]
    pub fn name(&self) -> &'static str {
        self.name
    }

    #[inline]
    pub fn params(&self) -> &[Type] {
        &self.params
    }

    /// Return type, `None` for a method returning nothing.
    #[inline]
    pub fn returns(&self) -> Option<&Type> {
        self.returns.as_ref()
    }

    #[inline]
    pub fn is_public(&self) -> bool {
        self.public
    }

    #[inline]
    pub fn has_body(&self) -> bool {
        self.body.is_some()
    }

    /// Returns `true` if this method has exactly the given parameter types.
    pub fn has_params(&self, params: &[Type]) -> bool {
        self.params.len() == params.len() && self.params.iter().zip(params).all(|(a, b)| a == b)
    }

    /// Returns `true` if `self` and `other` share name and parameter list.
    #[inline]
    pub fn same_signature(&self, other: &MethodInfo) -> bool {
        self.name == other.name && self.has_params(&other.params)
    }

    /// Calls the method on `target`.
    ///
    /// The arguments are checked against the declared parameter types
    /// first. The receiver stays locked while the body runs, so a body must
    /// not access `target` through another handle.
    pub fn invoke(&self, target: &ObjRef, args: &[Value]) -> Result<Value, InvokeError> {
        if args.len() != self.params.len() {
            return Err(InvokeError::Arity {
                method: self.name,
                expected: self.params.len(),
                found: args.len(),
            });
        }
        for (position, (param, arg)) in self.params.iter().zip(args).enumerate() {
            if !param.accepts(arg) {
                return Err(InvokeError::Argument {
                    method: self.name,
                    position,
                    expected: param.clone(),
                    found: arg.runtime_type(),
                });
            }
        }

        match &self.body {
            None => Err(InvokeError::Abstract(self.name)),
            Some(MethodBody::Ref(body)) => {
                let guard = target.read();
                body(&*guard, args)
            }
            Some(MethodBody::Mut(body)) => {
                let mut guard = target.write();
                body(&mut *guard, args)
            }
        }
    }
}

impl fmt::Debug for MethodInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(self, f)
    }
}

impl fmt::Display for MethodInfo {
    /// Renders the signature, e.g. `setAge(i32)` or `getName() -> string`.
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.public {
            f.write_str("private ")?;
        }
        write!(f, "{}(", self.name)?;
        for (i, param) in self.params.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{param}")?;
        }
        f.write_str(")")?;
        if let Some(returns) = &self.returns {
            write!(f, " -> {returns}")?;
        }
        Ok(())
    }
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::MethodInfo;
    use crate::class::Class;
    use crate::error::InvokeError;
    use crate::testing::Person;
    use crate::ty::Type;
    use crate::value::Value;

    #[test]
    fn invoke_checks_arguments() {
        let person = Value::object(Person::default());
        let obj = person.as_object().unwrap();
        let set_age = Person::class().find_method("setAge", &[Type::I32]).unwrap();

        assert!(matches!(
            set_age.invoke(obj, &[]),
            Err(InvokeError::Arity { expected: 1, found: 0, .. })
        ));
        assert!(matches!(
            set_age.invoke(obj, &[Value::from("x")]),
            Err(InvokeError::Argument { position: 0, .. })
        ));
        assert_eq!(set_age.invoke(obj, &[Value::I32(30)]), Ok(Value::Null));

        let get_age = Person::class().find_method("getAge", &[]).unwrap();
        assert_eq!(get_age.invoke(obj, &[]), Ok(Value::I32(30)));
    }

    #[test]
    fn declarations_have_no_body() {
        let m = MethodInfo::new("run", &[], None);
        let obj = Value::object(Person::default());
        assert_eq!(
            m.invoke(obj.as_object().unwrap(), &[]),
            Err(InvokeError::Abstract("run"))
        );
    }

    #[test]
    fn display() {
        let m = MethodInfo::new("setTag", &[Type::I32, Type::Str], None).private();
        assert_eq!(m.to_string(), "private setTag(i32, string)");
    }
}
