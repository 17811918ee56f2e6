use crate::access::BeanAccess;
use crate::container;
use crate::error::PropertyError;
use crate::expr::{PropertyPath, Segment};
use crate::ty::Type;
use crate::value::Value;

#[derive(Clone, Copy)]
enum Intent {
    Read,
    Write,
}

impl BeanAccess {
    /// Reads the property `expression` names, starting at `root`.
    ///
    /// Every segment but the last is read to find the next target; a
    /// `Null` along the way fails with [`PropertyError::NestedNull`]
    /// naming the prefix that resolved to `Null`.
    ///
    /// # Examples
    ///
    /// ```
    /// use dp_beans::{BeanAccess, Value};
    /// use dp_beans::error::PropertyError;
    ///
    /// let access = BeanAccess::new();
    /// let root = Value::map([("inner", Value::Null)]);
    /// let err = access.read(&root, "inner.name").unwrap_err();
    /// assert!(matches!(err, PropertyError::NestedNull { path } if path == "inner"));
    /// ```
    pub fn read(&self, root: &Value, expression: &str) -> Result<Value, PropertyError> {
        self.read_path(root, &self.parse(expression)?)
    }

    /// Writes `value` to the property `expression` names.
    pub fn write(
        &self,
        root: &Value,
        expression: &str,
        value: impl Into<Value>,
    ) -> Result<(), PropertyError> {
        self.write_path(root, &self.parse(expression)?, value.into())
    }

    /// [`read`](Self::read) with a parsed path.
    pub fn read_path(&self, root: &Value, path: &PropertyPath) -> Result<Value, PropertyError> {
        let (last, leading) = path.split_last();
        let target = self.walk(root, path, leading.len())?;
        self.get_segment(&target, last)
    }

    /// [`write`](Self::write) with a parsed path.
    pub fn write_path(&self, root: &Value, path: &PropertyPath, value: Value) -> Result<(), PropertyError> {
        let (last, leading) = path.split_last();
        let target = self.walk(root, path, leading.len())?;
        self.set_segment(&target, last, value)
    }

    /// Returns `true` if the property `expression` names can be read.
    ///
    /// Leading segments are read to find the final target, so reading them
    /// may provision containers on auto-schema bags. Malformed expressions
    /// and failures along the path yield `false`.
    pub fn is_readable(&self, root: &Value, expression: &str) -> bool {
        self.check(root, expression, Intent::Read)
    }

    /// Returns `true` if the property `expression` names can be written.
    pub fn is_writeable(&self, root: &Value, expression: &str) -> bool {
        self.check(root, expression, Intent::Write)
    }

    /// The declared type of the property `expression` names.
    ///
    /// `None` if the target does not declare one, e.g. an undeclared name
    /// on an auto-schema bag.
    pub fn property_type(&self, root: &Value, expression: &str) -> Result<Option<Type>, PropertyError> {
        let path = self.parse(expression)?;
        let (last, leading) = path.split_last();
        let target = self.walk(root, &path, leading.len())?;
        if last.name().is_empty() {
            return Ok(match last {
                Segment::Indexed(..) => container::element_type(&target),
                Segment::Keyed(..) => target.as_map().map(|_| Type::Any),
                Segment::Simple(_) => None,
            });
        }
        self.adapter_for(&target, last.name())?
            .property_type(self, &target, last)
    }

    // -------------------------------------------------------------------------
    // Internals

    /// Reads the first `n` segments of `path`.
    fn walk(&self, root: &Value, path: &PropertyPath, n: usize) -> Result<Value, PropertyError> {
        let mut current = root.clone();
        for (i, segment) in path.segments()[..n].iter().enumerate() {
            current = self.get_segment(&current, segment)?;
            if current.is_null() {
                return Err(PropertyError::nested_null(path.prefix(i + 1)));
            }
        }
        Ok(current)
    }

    fn get_segment(&self, target: &Value, segment: &Segment) -> Result<Value, PropertyError> {
        match segment {
            Segment::Indexed(name, index) if name.is_empty() => {
                container::get_index(&segment.to_string(), target, *index)
            }
            Segment::Keyed(name, key) if name.is_empty() => {
                container::get_key(&segment.to_string(), target, key)
            }
            Segment::Simple(name) => self.get_simple(target, name),
            Segment::Indexed(name, index) => self.get_indexed(target, name, *index),
            Segment::Keyed(name, key) => self.get_mapped(target, name, key),
        }
    }

    fn set_segment(&self, target: &Value, segment: &Segment, value: Value) -> Result<(), PropertyError> {
        match segment {
            Segment::Indexed(name, index) if name.is_empty() => {
                let label = segment.to_string();
                let value = match container::element_type(target) {
                    Some(element) => self.coerce(&label, &element, value)?,
                    None => value,
                };
                container::set_index(&label, target, *index, value)
            }
            Segment::Keyed(name, key) if name.is_empty() => {
                container::set_key(&segment.to_string(), target, key, value)
            }
            Segment::Simple(name) => self.set_simple(target, name, value),
            Segment::Indexed(name, index) => self.set_indexed(target, name, *index, value),
            Segment::Keyed(name, key) => self.set_mapped(target, name, key, value),
        }
    }

    fn check(&self, root: &Value, expression: &str, intent: Intent) -> bool {
        let Ok(path) = self.parse(expression) else {
            return false;
        };
        let (last, leading) = path.split_last();
        let Ok(target) = self.walk(root, &path, leading.len()) else {
            return false;
        };
        if last.name().is_empty() {
            return match last {
                Segment::Indexed(..) => container::element_type(&target).is_some(),
                Segment::Keyed(..) => target.as_map().is_some(),
                Segment::Simple(_) => false,
            };
        }
        let Ok(adapter) = self.adapter_for(&target, last.name()) else {
            return false;
        };
        match intent {
            Intent::Read => adapter.is_readable(self, &target, last.name()),
            Intent::Write => adapter.is_writeable(self, &target, last.name()),
        }
    }
}

// -----------------------------------------------------------------------------
// Tests
