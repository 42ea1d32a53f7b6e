//! Persistent map keyed by value.

use std::fmt;
use std::sync::{Arc, OnceLock};

use cairn_ref::{Ref, RefHasher};

use crate::config::CollectionConfig;
use crate::encode::{tag, Encoder};
use crate::sequence::Sequence;
use crate::value::Value;

#[derive(Clone)]
struct Entry {
    key_ref: Ref,
    key: Value,
    value: Value,
}

impl Entry {
    fn new(key: Value, value: Value) -> Self {
        Self {
            key_ref: key.value_ref(),
            key,
            value,
        }
    }
}

/// An immutable map with unique keys, ordered by the ref of each key.
///
/// The order is reproducible but unrelated to insertion order.
#[derive(Clone)]
pub struct Map {
    entries: Sequence<Entry>,
    cached: Arc<OnceLock<Ref>>,
}

impl Map {
    pub fn new() -> Self {
        Self::with_config(CollectionConfig::default())
    }

    pub fn with_config(config: CollectionConfig) -> Self {
        Self::wrap(Sequence::new(config))
    }

    /// Builds a map in one pass. When a key repeats, the last value wins.
    pub fn from_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        Self::from_entries_with_config(entries, CollectionConfig::default())
    }

    pub fn from_entries_with_config<K, V>(
        entries: impl IntoIterator<Item = (K, V)>,
        config: CollectionConfig,
    ) -> Self
    where
        K: Into<Value>,
        V: Into<Value>,
    {
        let mut sorted: Vec<Entry> = entries
            .into_iter()
            .map(|(k, v)| Entry::new(k.into(), v.into()))
            .collect();
        // Stable sort keeps input order among equal keys, so keeping the
        // last of each run is last-write-wins.
        sorted.sort_by(|a, b| a.key_ref.cmp(&b.key_ref));
        let mut deduped: Vec<Entry> = Vec::with_capacity(sorted.len());
        for entry in sorted {
            match deduped.last_mut() {
                Some(prev) if prev.key_ref == entry.key_ref => *prev = entry,
                _ => deduped.push(entry),
            }
        }
        Self::wrap(Sequence::from_vec(deduped, config))
    }

    fn wrap(entries: Sequence<Entry>) -> Self {
        Self {
            entries,
            cached: Arc::new(OnceLock::new()),
        }
    }

    pub fn config(&self) -> CollectionConfig {
        self.entries.config()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    fn find(&self, key: &Value) -> Option<&Entry> {
        let key_ref = key.value_ref();
        let index = self.entries.search_by(|e| e.key_ref.cmp(&key_ref)).ok()?;
        self.entries.get(index)
    }

    /// The value stored under `key`, or `None` if the key is absent.
    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.find(key).map(|e| &e.value)
    }

    pub fn has(&self, key: &Value) -> bool {
        self.find(key).is_some()
    }

    pub fn set(&self, key: impl Into<Value>, value: impl Into<Value>) -> Self {
        let entry = Entry::new(key.into(), value.into());
        let key_ref = entry.key_ref;
        Self::wrap(self.entries.upsert_by(|e| e.key_ref.cmp(&key_ref), entry))
    }

    /// A map without `key`. Removing an absent key returns an equal map.
    pub fn remove(&self, key: &Value) -> Self {
        let key_ref = key.value_ref();
        match self.entries.remove_by(|e| e.key_ref.cmp(&key_ref)) {
            Some(entries) => Self::wrap(entries),
            None => self.clone(),
        }
    }

    pub fn first(&self) -> Option<(&Value, &Value)> {
        self.entries.first().map(|e| (&e.key, &e.value))
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&Value, &Value)> + '_ {
        self.entries.iter().map(|e| (&e.key, &e.value))
    }

    pub fn keys(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.iter().map(|e| &e.key)
    }

    pub fn values(&self) -> impl Iterator<Item = &Value> + '_ {
        self.entries.iter().map(|e| &e.value)
    }

    /// Visits entries until `f` returns `true`; reports whether it stopped.
    pub fn iter_until(&self, mut f: impl FnMut(&Value, &Value) -> bool) -> bool {
        self.iter().any(|(k, v)| f(k, v))
    }

    pub fn iter_all(&self, mut f: impl FnMut(&Value, &Value)) {
        for (k, v) in self.iter() {
            f(k, v);
        }
    }

    pub fn filter(&self, mut keep: impl FnMut(&Value, &Value) -> bool) -> Self {
        let kept: Vec<Entry> = self
            .entries
            .iter()
            .filter(|e| keep(&e.key, &e.value))
            .cloned()
            .collect();
        Self::wrap(Sequence::from_vec(kept, self.config()))
    }

    pub fn value_ref(&self) -> Ref {
        *self.cached.get_or_init(|| {
            let mut enc = Encoder::new(RefHasher::VALUE);
            enc.tag(tag::MAP).count(self.len());
            for e in self.entries.iter() {
                enc.reference(&e.key_ref).reference(&e.value.value_ref());
            }
            enc.finish()
        })
    }
}

impl Default for Map {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.value_ref() == other.value_ref()
    }
}

impl Eq for Map {}

impl fmt::Debug for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_map().entries(self.iter()).finish()
    }
}

impl<K: Into<Value>, V: Into<Value>> FromIterator<(K, V)> for Map {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self::from_entries(iter)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn sample() -> Map {
        Map::from_entries([("a", 1u64), ("b", 2), ("c", 3)])
    }

    #[test]
    fn get_missing_is_none() {
        let map = sample();
        assert_eq!(map.get(&Value::from("b")), Some(&Value::from(2u64)));
        assert_eq!(map.get(&Value::from("z")), None);
        assert_eq!(Map::new().get(&Value::from("a")), None);
        assert!(!Map::new().has(&Value::from("a")));
    }

    #[test]
    fn set_returns_new_map() {
        let map = sample();
        let updated = map.set("b", 20u64).set("d", 4u64);
        assert_eq!(updated.len(), 4);
        assert_eq!(updated.get(&Value::from("b")), Some(&Value::from(20u64)));
        assert_eq!(map.get(&Value::from("b")), Some(&Value::from(2u64)));
        assert_eq!(map.len(), 3);
    }

    #[test]
    fn remove_missing_key_is_noop() {
        let map = sample();
        assert_eq!(map.remove(&Value::from("z")), map);
        let removed = map.remove(&Value::from("a"));
        assert_eq!(removed.len(), 2);
        assert!(!removed.has(&Value::from("a")));
        assert!(map.has(&Value::from("a")));
        assert!(Map::new().remove(&Value::from("a")).is_empty());
    }

    #[test]
    fn from_entries_last_write_wins() {
        let map = Map::from_entries([("k", 1u8), ("j", 0), ("k", 2)]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get(&Value::from("k")), Some(&Value::from(2u8)));
    }

    #[test]
    fn order_is_by_key_ref() {
        let map = sample();
        let refs: Vec<Ref> = map.keys().map(Value::value_ref).collect();
        let mut sorted = refs.clone();
        sorted.sort();
        assert_eq!(refs, sorted);
        assert_eq!(map.first().map(|(k, _)| k.value_ref()), refs.first().copied());
    }

    #[test]
    fn iteration_helpers() {
        let map = sample();
        let mut visited = 0;
        assert!(map.iter_until(|_, _| {
            visited += 1;
            true
        }));
        assert_eq!(visited, 1);

        let mut total = 0u64;
        map.iter_all(|_, v| {
            if let Ok(crate::Primitive::UInt64(n)) = v.as_primitive() {
                total += *n;
            }
        });
        assert_eq!(total, 6);

        let odd = map.filter(|_, v| v != &Value::from(2u64));
        assert_eq!(odd.len(), 2);
        assert!(!odd.has(&Value::from("b")));
    }

    #[test]
    fn ref_ignores_insertion_order() {
        let forward = Map::new().set("x", 1u8).set("y", 2u8);
        let backward = Map::new().set("y", 2u8).set("x", 1u8);
        assert_eq!(forward.value_ref(), backward.value_ref());
        assert_ne!(forward.value_ref(), forward.set("x", 9u8).value_ref());
    }

    proptest! {
        #[test]
        fn behaves_like_btreemap(ops in proptest::collection::vec((any::<u8>(), any::<Option<u16>>()), 0..80)) {
            let small = CollectionConfig { leaf_capacity: 2, branch_capacity: 3 };
            let mut map = Map::with_config(small);
            let mut model = std::collections::BTreeMap::new();
            for (k, v) in ops {
                match v {
                    Some(v) => {
                        map = map.set(k, v);
                        model.insert(k, v);
                    }
                    None => {
                        map = map.remove(&Value::from(k));
                        model.remove(&k);
                    }
                }
            }
            prop_assert_eq!(map.len(), model.len());
            for (k, v) in &model {
                prop_assert_eq!(map.get(&Value::from(*k)), Some(&Value::from(*v)));
            }
            let bulk = Map::from_entries(model.iter().map(|(k, v)| (*k, *v)));
            prop_assert_eq!(bulk.value_ref(), map.value_ref());
        }
    }
}
