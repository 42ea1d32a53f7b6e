//! Persistent set of values.

use std::fmt;
use std::sync::{Arc, OnceLock};

use cairn_ref::{Ref, RefHasher};

use crate::config::CollectionConfig;
use crate::encode::{tag, Encoder};
use crate::sequence::Sequence;
use crate::value::Value;

#[derive(Clone)]
struct Member {
    member_ref: Ref,
    value: Value,
}

/// An immutable set of values, ordered by member ref.
#[derive(Clone)]
pub struct Set {
    members: Sequence<Member>,
    cached: Arc<OnceLock<Ref>>,
}

impl Set {
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

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
        let mut members: Vec<Member> = values
            .into_iter()
            .map(|value| Member {
                member_ref: value.value_ref(),
                value,
            })
            .collect();
        members.sort_by(|a, b| a.member_ref.cmp(&b.member_ref));
        members.dedup_by(|a, b| a.member_ref == b.member_ref);
        Self::wrap(Sequence::from_vec(members, config))
    }

    fn wrap(members: Sequence<Member>) -> Self {
        Self {
            members,
            cached: Arc::new(OnceLock::new()),
        }
    }

    pub fn config(&self) -> CollectionConfig {
        self.members.config()
    }

    pub fn len(&self) -> usize {
        self.members.len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.is_empty()
    }

    pub fn has(&self, value: &Value) -> bool {
        let target = value.value_ref();
        self.members
            .search_by(|m| m.member_ref.cmp(&target))
            .is_ok()
    }

    pub fn insert(&self, value: impl Into<Value>) -> Self {
        let value = value.into();
        let member_ref = value.value_ref();
        if self.members.search_by(|m| m.member_ref.cmp(&member_ref)).is_ok() {
            return self.clone();
        }
        let member = Member { member_ref, value };
        Self::wrap(
            self.members
                .upsert_by(|m| m.member_ref.cmp(&member_ref), member),
        )
    }

    pub fn remove(&self, value: &Value) -> Self {
        let target = value.value_ref();
        match self.members.remove_by(|m| m.member_ref.cmp(&target)) {
            Some(members) => Self::wrap(members),
            None => self.clone(),
        }
    }

    /// Every member of `self` and `other`.
    pub fn union(&self, other: &Set) -> Self {
        if other.len() > self.len() {
            return other.union(self);
        }
        other
            .iter()
            .fold(self.clone(), |acc, value| acc.insert(value.clone()))
    }

    pub fn first(&self) -> Option<&Value> {
        self.members.first().map(|m| &m.value)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Value> + '_ {
        self.members.iter().map(|m| &m.value)
    }

    pub fn iter_until(&self, mut f: impl FnMut(&Value) -> bool) -> bool {
        self.iter().any(|v| f(v))
    }

    pub fn iter_all(&self, mut f: impl FnMut(&Value)) {
        self.iter().for_each(|v| f(v));
    }

    pub fn filter(&self, mut keep: impl FnMut(&Value) -> bool) -> Self {
        let kept: Vec<Member> = self
            .members
            .iter()
            .filter(|m| keep(&m.value))
            .cloned()
            .collect();
        Self::wrap(Sequence::from_vec(kept, self.config()))
    }

    pub fn value_ref(&self) -> Ref {
        *self.cached.get_or_init(|| {
            let mut enc = Encoder::new(RefHasher::VALUE);
            enc.tag(tag::SET).count(self.len());
            for m in self.members.iter() {
                enc.reference(&m.member_ref);
            }
            enc.finish()
        })
    }
}

impl Default for Set {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.value_ref() == other.value_ref()
    }
}

impl Eq for Set {}

impl fmt::Debug for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_set().entries(self.iter()).finish()
    }
}

impl FromIterator<Value> for Set {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::from_values(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn strings(items: &[&str]) -> Set {
        items.iter().map(|s| Value::from(*s)).collect()
    }

    #[test]
    fn insert_is_idempotent() {
        let set = strings(&["a", "b"]);
        let again = set.insert("a");
        assert_eq!(again.len(), 2);
        assert_eq!(again, set);
        let grown = set.insert("c");
        assert_eq!(grown.len(), 3);
        assert!(!set.has(&Value::from("c")));
    }

    #[test]
    fn remove_and_has() {
        let set = strings(&["a", "b", "c"]);
        let removed = set.remove(&Value::from("b"));
        assert!(!removed.has(&Value::from("b")));
        assert!(set.has(&Value::from("b")));
        assert_eq!(removed.remove(&Value::from("zz")), removed);
        assert!(Set::new().remove(&Value::from("a")).is_empty());
    }

    #[test]
    fn union_merges_members() {
        let left = strings(&["a", "b"]);
        let right = strings(&["b", "c", "d"]);
        let both = left.union(&right);
        assert_eq!(both.len(), 4);
        assert_eq!(both, right.union(&left));
        assert_eq!(left.union(&Set::new()), left);
    }

    #[test]
    fn duplicates_collapse_on_bulk_build() {
        let set = strings(&["x", "x", "y"]);
        assert_eq!(set.len(), 2);
        assert_eq!(set, strings(&["y", "x"]));
    }

    #[test]
    fn iteration_helpers() {
        let set = strings(&["a", "b", "c"]);
        let mut n = 0;
        set.iter_all(|_| n += 1);
        assert_eq!(n, 3);
        assert!(!set.iter_until(|_| false));
        let only_a = set.filter(|v| v == &Value::from("a"));
        assert_eq!(only_a.len(), 1);
        assert_eq!(only_a.first(), Some(&Value::from("a")));
        assert!(Set::new().first().is_none());
    }

    proptest! {
        #[test]
        fn ref_ignores_insertion_order(mut values in proptest::collection::vec(any::<u16>(), 0..60)) {
            let small = CollectionConfig { leaf_capacity: 3, branch_capacity: 2 };
            let mut one = Set::with_config(small);
            for v in &values {
                one = one.insert(*v);
            }
            values.reverse();
            let two = Set::from_values(values.iter().copied().map(Value::from));
            prop_assert_eq!(one.value_ref(), two.value_ref());
            prop_assert_eq!(one.len(), two.len());
        }
    }
}
