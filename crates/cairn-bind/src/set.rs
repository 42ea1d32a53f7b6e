//! `SetOf<T>`: a set whose members all bind to `T`.

use std::fmt;
use std::marker::PhantomData;

use cairn_ref::Ref;
use cairn_value::{Set, Value, ValueResult};

use crate::binding::Binding;

pub struct SetOf<T> {
    set: Set,
    _marker: PhantomData<fn() -> T>,
}

impl<T> Clone for SetOf<T> {
    fn clone(&self) -> Self {
        Self::wrap(self.set.clone())
    }
}

impl<T> SetOf<T> {
    fn wrap(set: Set) -> Self {
        Self {
            set,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.set.len()
    }

    pub fn is_empty(&self) -> bool {
        self.set.is_empty()
    }

    pub fn as_set(&self) -> &Set {
        &self.set
    }
}

impl<T: Binding> SetOf<T> {
    pub fn new() -> Self {
        Self::wrap(Set::new())
    }

    pub fn from_items<'a>(items: impl IntoIterator<Item = &'a T>) -> Self
    where
        T: 'a,
    {
        Self::wrap(Set::from_values(items.into_iter().map(Binding::to_value)))
    }

    pub fn has(&self, item: &T) -> bool {
        self.set.has(&item.to_value())
    }

    pub fn insert(&self, item: &T) -> Self {
        Self::wrap(self.set.insert(item.to_value()))
    }

    pub fn remove(&self, item: &T) -> Self {
        Self::wrap(self.set.remove(&item.to_value()))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::wrap(self.set.union(&other.set))
    }

    /// Members in ref order.
    pub fn iter(&self) -> impl Iterator<Item = ValueResult<T>> + '_ {
        self.set.iter().map(|v| T::from_value(v.clone()))
    }
}

impl<T: Binding> Default for SetOf<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Binding> Binding for SetOf<T> {
    fn from_value(value: Value) -> ValueResult<Self> {
        let set = value.as_set()?.clone();
        for member in set.iter() {
            T::from_value(member.clone())?;
        }
        Ok(Self::wrap(set))
    }

    fn to_value(&self) -> Value {
        Value::Set(self.set.clone())
    }

    fn value_ref(&self) -> Ref {
        self.set.value_ref()
    }
}

impl<T> PartialEq for SetOf<T> {
    fn eq(&self, other: &Self) -> bool {
        self.set == other.set
    }
}

impl<T> Eq for SetOf<T> {}

impl<T> fmt::Debug for SetOf<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.set, f)
    }
}
