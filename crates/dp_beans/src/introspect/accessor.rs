use log::debug;

use crate::class::{ClassInfo, MethodInfo};
use crate::ty::Type;

/// Converts an accessor suffix to a property name.
///
/// The first character is lowercased unless the first two are both
/// uppercase, so `Name` becomes `name` while `URL` stays `URL`.
///
/// # Examples
///
/// ```
/// use dp_beans::introspect::decapitalize;
///
/// assert_eq!(decapitalize("Name"), "name");
/// assert_eq!(decapitalize("URL"), "URL");
/// assert_eq!(decapitalize("X"), "x");
/// assert_eq!(decapitalize(""), "");
/// ```
pub fn decapitalize(name: &str) -> String {
    let mut chars = name.chars();
    let Some(first) = chars.next() else {
        return String::new();
    };
    if chars.next().is_some_and(char::is_uppercase) && first.is_uppercase() {
        return name.to_owned();
    }
    let mut out = String::with_capacity(name.len());
    out.extend(first.to_lowercase());
    out.push_str(&name[first.len_utf8()..]);
    out
}

/// Returns `true` if a public declaration of the signature exists in a
/// public class or interface of the hierarchy of `class`.
fn publicly_declared(class: &'static ClassInfo, name: &str, params: &[Type]) -> bool {
    let public = |c: &ClassInfo| {
        c.is_public()
            && c.declared_method(name, params)
                .is_some_and(MethodInfo::is_public)
    };
    class.ancestors().any(public) || class.all_interfaces().into_iter().any(public)
}

/// Locates the most-derived accessible implementation of a method.
///
/// The class chain is searched first, then the interfaces. The first
/// declaration found is the candidate. It is accessible if it is public
/// and either its declaring class is public or some public class or
/// interface of the hierarchy publicly declares the same signature.
/// Inaccessible candidates yield `None`.
///
/// # Examples
///
/// ```
/// use dp_beans::class::ClassInfo;
/// use dp_beans::introspect::find_accessor;
///
/// let get_class = find_accessor(ClassInfo::object(), "getClass", &[]).unwrap();
/// assert_eq!(get_class.name(), "getClass");
/// assert!(find_accessor(ClassInfo::object(), "getName", &[]).is_none());
/// ```
pub fn find_accessor(
    class: &'static ClassInfo,
    name: &str,
    params: &[Type],
) -> Option<&'static MethodInfo> {
    let (declaring, method) = class
        .ancestors()
        .find_map(|c| c.declared_method(name, params).map(|m| (c, m)))
        .or_else(|| {
            class
                .all_interfaces()
                .into_iter()
                .find_map(|c| c.declared_method(name, params).map(|m| (c, m)))
        })?;

    if !method.is_public() {
        return None;
    }
    if declaring.is_public() || publicly_declared(class, name, params) {
        Some(method)
    } else {
        None
    }
}

/// Every accessible method of `class`, most-derived override first.
///
/// Each signature appears once. Candidates that exist but are not
/// accessible are skipped and logged at debug level.
pub fn accessible_methods(class: &'static ClassInfo) -> Vec<&'static MethodInfo> {
    let mut seen: Vec<&'static MethodInfo> = Vec::new();
    let declared = class
        .ancestors()
        .chain(class.all_interfaces())
        .flat_map(|c| c.methods().iter());

    let mut out = Vec::new();
    for method in declared {
        if seen.iter().any(|m| m.same_signature(method)) {
            continue;
        }
        seen.push(method);
        match find_accessor(class, method.name(), method.params()) {
            Some(found) => out.push(found),
            None => debug!(
                "skipping inaccessible method `{method}` of class `{}`",
                class.name()
            ),
        }
    }
    out
}

// -----------------------------------------------------------------------------
// Tests

#[cfg(test)]
mod tests {
    use super::{accessible_methods, find_accessor};
    use crate::class::Class;
    use crate::testing::{Derived, HiddenImpl, Named};

    #[test]
    fn most_derived_override_wins() {
        let found = find_accessor(Derived::class(), "getLabel", &[]).unwrap();
        let own = Derived::class().declared_method("getLabel", &[]).unwrap();
        assert!(core::ptr::eq(found, own));
    }

    #[test]
    fn non_public_types_need_a_public_declaration() {
        let class = HiddenImpl::class();
        // Declared publicly by the `Named` interface.
        let name = find_accessor(class, "getName", &[]).unwrap();
        assert!(name.has_body());
        // Only declared by the non-public class.
        assert!(find_accessor(class, "getSecret", &[]).is_none());
        // Not public at all.
        assert!(find_accessor(class, "getInternal", &[]).is_none());
        // The interface alone has only the declaration.
        assert!(!find_accessor(Named::class(), "getName", &[]).unwrap().has_body());
    }

    #[test]
    fn accessible_methods_are_unique() {
        let names: Vec<&str> = accessible_methods(HiddenImpl::class())
            .into_iter()
            .map(|m| m.name())
            .collect();
        assert_eq!(names, ["getName", "getClass"]);
    }
}
