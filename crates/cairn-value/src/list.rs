//! Persistent ordered list of values.

use std::fmt;
use std::sync::{Arc, OnceLock};

use cairn_ref::{Ref, RefHasher};

use crate::config::CollectionConfig;
use crate::encode::{tag, Encoder};
use crate::error::{ValueError, ValueResult};
use crate::sequence::{Iter, Sequence};
use crate::value::Value;

/// An immutable, structurally shared list of [`Value`]s.
///
/// Every update returns a new list; the receiver is never modified. The ref
/// covers the flattened element sequence only, so two lists holding the
/// same elements share a ref no matter how they were built or chunked.
#[derive(Clone)]
pub struct List {
    items: Sequence<Value>,
    cached: Arc<OnceLock<Ref>>,
}

impl List {
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    /// An empty list whose tree uses the given chunk capacities.
    pub fn with_config(config: CollectionConfig) -> Self {
        Self::wrap(Sequence::new(config))
    }

    pub fn from_values(values: impl IntoIterator<Item = Value>) -> Self {
        Self::from_values_with_config(values, CollectionConfig::default())
    }

    pub fn from_values_with_config(
        values: impl IntoIterator<Item = Value>,
        config: CollectionConfig,
    ) -> Self {
        Self::wrap(Sequence::from_vec(values.into_iter().collect(), config))
    }

    fn wrap(items: Sequence<Value>) -> Self {
        Self {
            items,
            cached: Arc::new(OnceLock::new()),
        }
    }

    pub fn config(&self) -> CollectionConfig {
        self.items.config()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn get(&self, index: usize) -> ValueResult<&Value> {
        self.items.get(index).ok_or(ValueError::OutOfBounds {
            index,
            len: self.len(),
        })
    }

    pub fn first(&self) -> Option<&Value> {
        self.items.first()
    }

    pub fn last(&self) -> Option<&Value> {
        self.items.last()
    }

    pub fn set(&self, index: usize, value: impl Into<Value>) -> ValueResult<Self> {
        Ok(Self::wrap(self.items.set(index, value.into())?))
    }

    /// Inserts `values` so the first of them lands at `index`.
    pub fn insert(&self, index: usize, values: impl IntoIterator<Item = Value>) -> ValueResult<Self> {
        Ok(Self::wrap(self.items.insert(index, values.into_iter().collect())?))
    }

    pub fn append(&self, values: impl IntoIterator<Item = Value>) -> Self {
        Self::wrap(self.items.append(values.into_iter().collect()))
    }

    pub fn push(&self, value: impl Into<Value>) -> Self {
        self.append([value.into()])
    }

    /// Removes the elements in `[start, end)`.
    pub fn remove(&self, start: usize, end: usize) -> ValueResult<Self> {
        Ok(Self::wrap(self.items.remove(start, end)?))
    }

    pub fn remove_at(&self, index: usize) -> ValueResult<Self> {
        let len = self.len();
        if index >= len {
            return Err(ValueError::OutOfBounds { index, len });
        }
        self.remove(index, index + 1)
    }

    /// The elements in `[start, end)` as a new list.
    pub fn slice(&self, start: usize, end: usize) -> ValueResult<Self> {
        Ok(Self::wrap(self.items.slice(start, end)?))
    }

    pub fn iter(&self) -> Iter<'_, Value> {
        self.items.iter()
    }

    /// Visits elements in order until `f` returns `true`.
    ///
    /// Returns whether iteration stopped early.
    pub fn iter_until(&self, mut f: impl FnMut(&Value, usize) -> bool) -> bool {
        self.iter().enumerate().any(|(i, v)| f(v, i))
    }

    pub fn iter_all(&self, mut f: impl FnMut(&Value, usize)) {
        for (i, v) in self.iter().enumerate() {
            f(v, i);
        }
    }

    /// A new list holding the elements for which `keep` returns `true`.
    pub fn filter(&self, mut keep: impl FnMut(&Value, usize) -> bool) -> Self {
        let kept: Vec<Value> = self
            .iter()
            .enumerate()
            .filter(|(i, v)| keep(v, *i))
            .map(|(_, v)| v.clone())
            .collect();
        Self::wrap(Sequence::from_vec(kept, self.config()))
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.to_vec()
    }

    pub fn value_ref(&self) -> Ref {
        *self.cached.get_or_init(|| {
            let mut enc = Encoder::new(RefHasher::VALUE);
            enc.tag(tag::LIST).count(self.len());
            for v in self.iter() {
                enc.reference(&v.value_ref());
            }
            enc.finish()
        })
    }
}

impl Default for List {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.value_ref() == other.value_ref()
    }
}

impl Eq for List {}

impl fmt::Debug for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}

impl FromIterator<Value> for List {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

impl<'a> IntoIterator for &'a List {
    type Item = &'a Value;
    type IntoIter = Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn ints(range: std::ops::Range<u64>) -> List {
        range.map(Value::from).collect()
    }

    fn small() -> CollectionConfig {
        CollectionConfig {
            leaf_capacity: 2,
            branch_capacity: 2,
        }
    }

    fn small_ints(range: std::ops::Range<u64>) -> List {
        List::from_values_with_config(range.map(Value::from), small())
    }

    // ----- Positional access -----

    #[test]
    fn get_out_of_bounds() {
        let list = ints(0..3);
        assert_eq!(list.get(2).unwrap(), &Value::from(2u64));
        let err = list.get(3).unwrap_err();
        assert!(matches!(err, ValueError::OutOfBounds { index: 3, len: 3 }));
        assert!(matches!(
            List::new().get(0),
            Err(ValueError::OutOfBounds { index: 0, len: 0 })
        ));
    }

    #[test]
    fn set_leaves_receiver_untouched() {
        let list = ints(0..100);
        let updated = list.set(42, "x").unwrap();
        assert_eq!(updated.get(42).unwrap(), &Value::from("x"));
        assert_eq!(list.get(42).unwrap(), &Value::from(42u64));
        assert_ne!(list, updated);
        assert!(list.set(100, 1u8).is_err());
    }

    #[test]
    fn insert_and_remove_at() {
        let list = ints(0..5);
        let inserted = list
            .insert(2, vec![Value::from("a"), Value::from("b")])
            .unwrap();
        assert_eq!(inserted.len(), 7);
        assert_eq!(inserted.get(2).unwrap(), &Value::from("a"));
        assert_eq!(inserted.get(4).unwrap(), &Value::from(2u64));

        let removed = inserted.remove_at(2).unwrap().remove_at(2).unwrap();
        assert_eq!(removed, list);
        assert!(matches!(
            list.remove_at(5),
            Err(ValueError::OutOfBounds { index: 5, len: 5 })
        ));
        assert!(list.insert(6, vec![Value::from(1u8)]).is_err());
    }

    #[test]
    fn invalid_ranges() {
        let list = ints(0..4);
        assert!(matches!(
            list.remove(3, 2),
            Err(ValueError::InvalidRange { start: 3, end: 2, len: 4 })
        ));
        assert!(matches!(
            list.slice(0, 5),
            Err(ValueError::InvalidRange { .. })
        ));
    }

    // ----- Empty lists -----

    #[test]
    fn empty_list_operations() {
        let empty = List::new();
        assert!(empty.is_empty());
        let sliced = empty.slice(0, 0).unwrap();
        assert!(sliced.is_empty());
        assert_eq!(sliced, empty);
        assert!(empty.remove(0, 0).unwrap().is_empty());
        assert!(empty.first().is_none());
        assert!(empty.last().is_none());
        assert_eq!(empty.iter().count(), 0);
        assert!(empty.filter(|_, _| true).is_empty());
        assert!(!empty.iter_until(|_, _| true));
    }

    // ----- Iteration -----

    #[test]
    fn iter_until_stops_early() {
        let list = ints(0..10);
        let mut seen = Vec::new();
        let stopped = list.iter_until(|v, i| {
            seen.push(i);
            v == &Value::from(3u64)
        });
        assert!(stopped);
        assert_eq!(seen, vec![0, 1, 2, 3]);
    }

    #[test]
    fn iter_all_and_restart() {
        let list = small_ints(0..50);
        let mut count = 0;
        list.iter_all(|_, _| count += 1);
        assert_eq!(count, 50);
        assert_eq!(list.iter().count(), list.iter().count());
        assert_eq!(list.last().unwrap(), &Value::from(49u64));
    }

    #[test]
    fn filter_keeps_order() {
        let list = ints(0..20);
        let even = list.filter(|v, _| matches!(v.as_primitive(), Ok(crate::Primitive::UInt64(n)) if n % 2 == 0));
        assert_eq!(even.len(), 10);
        assert_eq!(even.get(3).unwrap(), &Value::from(6u64));
    }

    // ----- Refs -----

    #[test]
    fn ref_ignores_construction_history() {
        let literal = ints(0..5);
        let mut appended = List::new();
        for i in 0..5u64 {
            appended = appended.push(i);
        }
        assert_eq!(literal.value_ref(), appended.value_ref());

        let chunked = List::from_values_with_config(literal.to_vec(), small());
        assert_eq!(literal.value_ref(), chunked.value_ref());
        assert_eq!(literal, chunked);
    }

    #[test]
    fn ref_changes_with_content() {
        let a = ints(0..5);
        let b = a.set(0, 9u64).unwrap();
        assert_ne!(a.value_ref(), b.value_ref());
        assert_ne!(List::new().value_ref(), ints(0..1).value_ref());
    }

    proptest! {
        #[test]
        fn set_then_get(len in 1usize..200, pick in any::<prop::sample::Index>(), x in any::<i64>()) {
            let list = small_ints(0..len as u64);
            let i = pick.index(len);
            let updated = list.set(i, x).unwrap();
            prop_assert_eq!(updated.get(i).unwrap(), &Value::from(x));
            prop_assert_eq!(list.get(i).unwrap(), &Value::from(i as u64));
            prop_assert_eq!(updated.len(), len);
        }

        #[test]
        fn ref_independent_of_shape(
            values in proptest::collection::vec(any::<u32>(), 0..120),
            leaf in 2usize..8,
            branch in 2usize..8,
        ) {
            let config = CollectionConfig { leaf_capacity: leaf, branch_capacity: branch };
            let bulk = List::from_values(values.iter().copied().map(Value::from));
            let mut pushed = List::with_config(config);
            for v in &values {
                pushed = pushed.push(*v);
            }
            prop_assert_eq!(bulk.value_ref(), pushed.value_ref());
        }
    }
}
