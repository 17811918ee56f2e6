//! Fixture classes shared by the unit tests.

use crate::class::{Class, ClassInfo, MethodInfo};
use crate::error::InvokeError;
use crate::impl_object;
use crate::ty::Type;
use crate::value::{ArrayRef, ListRef, MapRef, Value};

// -----------------------------------------------------------------------------
// Beans

#[derive(Default)]
pub(crate) struct Address {
    pub city: Option<String>,
    pub street: Option<String>,
}

impl_object!(Address, "Address", |builder| builder
    .default_constructor()
    .getter("getCity", |a: &Address| a.city.clone())
    .setter("setCity", |a: &mut Address, v: Option<String>| a.city = v)
    .getter("getStreet", |a: &Address| a.street.clone())
    .setter("setStreet", |a: &mut Address, v: Option<String>| a.street = v)
    .build());

/// Covers every accessor shape: plain, boolean `is`, containers, a typed
/// array, indexed-only (`tag`) and keyed (`address`, stored in
/// `addresses`).
#[derive(Default)]
pub(crate) struct Person {
    pub name: Option<String>,
    pub age: i32,
    pub active: bool,
    pub nicknames: Option<ListRef>,
    pub scores: Option<ArrayRef>,
    pub addresses: Option<MapRef>,
    pub friend: Value,
    pub tags: Vec<String>,
}

impl_object!(Person, "Person", |builder| builder
    .default_constructor()
    .getter("getName", |p: &Person| p.name.clone())
    .setter("setName", |p: &mut Person, v: Option<String>| p.name = v)
    .getter("getAge", |p: &Person| p.age)
    .setter("setAge", |p: &mut Person, v: i32| p.age = v)
    .getter("isActive", |p: &Person| p.active)
    .setter("setActive", |p: &mut Person, v: bool| p.active = v)
    .getter("getNicknames", |p: &Person| p.nicknames.clone())
    .setter("setNicknames", |p: &mut Person, v: Option<ListRef>| p.nicknames = v)
    .getter_as("getScores", Type::array(Type::I32), |p: &Person| p.scores.clone())
    .setter_as("setScores", Type::array(Type::I32), |p: &mut Person, v: Option<ArrayRef>| {
        p.scores = v;
    })
    .getter("getAddresses", |p: &Person| p.addresses.clone())
    .setter("setAddresses", |p: &mut Person, v: Option<MapRef>| p.addresses = v)
    .mapped_getter("getAddress", |p: &Person, key| {
        p.addresses
            .as_ref()
            .and_then(|m| m.get(key))
            .unwrap_or_default()
    })
    .mapped_setter("setAddress", |p: &mut Person, key, v: Value| {
        p.addresses.get_or_insert_with(MapRef::new).insert(key, v);
    })
    .getter("getFriend", |p: &Person| p.friend.clone())
    .setter("setFriend", |p: &mut Person, v: Value| p.friend = v)
    .indexed_getter("getTag", |p: &Person, index| {
        p.tags
            .get(index)
            .cloned()
            .ok_or(InvokeError::out_of_bounds(index, p.tags.len()))
    })
    .indexed_setter("setTag", |p: &mut Person, index, v: String| {
        let len = p.tags.len();
        match index {
            i if i < len => p.tags[i] = v,
            i if i == len => p.tags.push(v),
            i => return Err(InvokeError::out_of_bounds(i, len)),
        }
        Ok(())
    })
    .build());

/// A getter without a setter and without a default constructor.
pub(crate) struct ReadOnly {
    city: String,
}

impl ReadOnly {
    pub fn new(city: &str) -> Self {
        Self { city: city.to_owned() }
    }
}

impl_object!(ReadOnly, "ReadOnly", |builder| builder
    .getter("getCity", |r: &ReadOnly| r.city.clone())
    .build());

#[derive(Default)]
pub(crate) struct Team {
    pub people: Option<ListRef>,
}

impl_object!(Team, "Team", |builder| builder
    .default_constructor()
    .getter("getPeople", |t: &Team| t.people.clone())
    .setter("setPeople", |t: &mut Team, v: Option<ListRef>| t.people = v)
    .build());

// -----------------------------------------------------------------------------
// Visibility

/// An interface declaring `getName`.
pub(crate) struct Named;

impl_object!(Named, "Named", |_builder| ClassInfo::interface::<Named>("Named")
    .method(MethodInfo::new("getName", &[], Some(Type::Str)))
    .build());

/// A non-public class whose only usable accessor is the one `Named`
/// declares.
#[derive(Default)]
pub(crate) struct HiddenImpl {
    name: String,
}

impl_object!(HiddenImpl, "HiddenImpl", |builder| builder
    .non_public()
    .implements(Named::class())
    .default_constructor()
    .getter("getName", |h: &HiddenImpl| h.name.clone())
    .getter("getSecret", |_: &HiddenImpl| String::from("secret"))
    .method(
        MethodInfo::new("getInternal", &[], Some(Type::Str))
            .private()
            .with_ref_body(|_, _| Ok(Value::from("internal"))),
    )
    .build());

// -----------------------------------------------------------------------------
// Discovery edge cases

/// `setValue` does not match the getter; `setCount` is overloaded.
#[derive(Default)]
pub(crate) struct Mismatched {
    value: String,
    count: i32,
}

impl_object!(Mismatched, "Mismatched", |builder| builder
    .getter("getValue", |m: &Mismatched| m.value.clone())
    .setter("setValue", |m: &mut Mismatched, v: i32| m.value = v.to_string())
    .getter("getCount", |m: &Mismatched| m.count)
    .setter("setCount", |m: &mut Mismatched, v: String| m.count = v.parse().unwrap_or_default())
    .setter("setCount", |m: &mut Mismatched, v: i32| m.count = v)
    .build());

/// The indexed reader and writer disagree on the element type.
#[derive(Default)]
pub(crate) struct IndexedMismatch {
    items: Vec<String>,
}

impl_object!(IndexedMismatch, "IndexedMismatch", |builder| builder
    .indexed_getter("getItem", |m: &IndexedMismatch, index| {
        m.items
            .get(index)
            .cloned()
            .ok_or(InvokeError::out_of_bounds(index, m.items.len()))
    })
    .indexed_setter("setItem", |m: &mut IndexedMismatch, index, v: i32| {
        match m.items.get_mut(index) {
            Some(slot) => *slot = v.to_string(),
            None => return Err(InvokeError::out_of_bounds(index, m.items.len())),
        }
        Ok(())
    })
    .build());

/// A chained setter, only found by the fluent introspector.
#[derive(Default)]
pub(crate) struct Fluent {
    label: Option<String>,
}

impl_object!(Fluent, "Fluent", |builder| builder
    .default_constructor()
    .getter("getLabel", |f: &Fluent| f.label.clone())
    .fluent_setter("setLabel", |f: &mut Fluent, v: Option<String>| f.label = v)
    .build());

// -----------------------------------------------------------------------------
// Inheritance

#[derive(Default)]
pub(crate) struct Base {
    label: Option<String>,
}

impl_object!(Base, "Base", |builder| builder
    .default_constructor()
    .getter("getLabel", |b: &Base| b.label.clone())
    .setter("setLabel", |b: &mut Base, v: Option<String>| b.label = v)
    .build());

#[derive(Default)]
pub(crate) struct Derived {
    label: Option<String>,
    extra: i32,
}

impl_object!(Derived, "Derived", |builder| builder
    .extends(Base::class())
    .default_constructor()
    .getter("getLabel", |d: &Derived| d.label.clone())
    .setter("setLabel", |d: &mut Derived, v: Option<String>| d.label = v)
    .getter("getExtra", |d: &Derived| d.extra)
    .build());
