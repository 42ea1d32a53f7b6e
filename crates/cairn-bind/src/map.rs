//! `MapOf<K, V>`: a map with typed keys and values.

use std::fmt;
use std::marker::PhantomData;

use cairn_ref::Ref;
use cairn_value::{Map, Value, ValueResult};

use crate::binding::Binding;

/// Typed view over a persistent [`Map`].
pub struct MapOf<K, V> {
    map: Map,
    _marker: PhantomData<fn() -> (K, V)>,
}

impl<K, V> Clone for MapOf<K, V> {
    fn clone(&self) -> Self {
        Self::wrap(self.map.clone())
    }
}

impl<K, V> MapOf<K, V> {
    fn wrap(map: Map) -> Self {
        Self {
            map,
            _marker: PhantomData,
        }
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn as_map(&self) -> &Map {
        &self.map
    }
}

impl<K: Binding, V: Binding> MapOf<K, V> {
    pub fn new() -> Self {
        Self::wrap(Map::new())
    }

    /// Later entries win over earlier ones with the same key.
    pub fn from_entries<'a>(entries: impl IntoIterator<Item = (&'a K, &'a V)>) -> Self
    where
        K: 'a,
        V: 'a,
    {
        Self::wrap(Map::from_entries(
            entries.into_iter().map(|(k, v)| (k.to_value(), v.to_value())),
        ))
    }

    /// `Ok(None)` when the key is absent.
    pub fn get(&self, key: &K) -> ValueResult<Option<V>> {
        self.map
            .get(&key.to_value())
            .map(|v| V::from_value(v.clone()))
            .transpose()
    }

    pub fn has(&self, key: &K) -> bool {
        self.map.has(&key.to_value())
    }

    pub fn set(&self, key: &K, value: &V) -> Self {
        Self::wrap(self.map.set(key.to_value(), value.to_value()))
    }

    pub fn remove(&self, key: &K) -> Self {
        Self::wrap(self.map.remove(&key.to_value()))
    }

    pub fn iter(&self) -> impl Iterator<Item = ValueResult<(K, V)>> + '_ {
        self.map
            .iter()
            .map(|(k, v)| Ok((K::from_value(k.clone())?, V::from_value(v.clone())?)))
    }

    pub fn iter_all(&self, mut f: impl FnMut(K, V)) -> ValueResult<()> {
        for entry in self.iter() {
            let (k, v) = entry?;
            f(k, v);
        }
        Ok(())
    }

    pub fn filter(&self, mut keep: impl FnMut(&K, &V) -> bool) -> ValueResult<Self> {
        let mut kept = Vec::new();
        for (k, v) in self.map.iter() {
            let (key, value) = (K::from_value(k.clone())?, V::from_value(v.clone())?);
            if keep(&key, &value) {
                kept.push((k.clone(), v.clone()));
            }
        }
        Ok(Self::wrap(Map::from_entries_with_config(kept, self.map.config())))
    }
}

impl<K: Binding, V: Binding> Default for MapOf<K, V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<K: Binding, V: Binding> Binding for MapOf<K, V> {
    fn from_value(value: Value) -> ValueResult<Self> {
        let map = value.as_map()?.clone();
        for (k, v) in map.iter() {
            K::from_value(k.clone())?;
            V::from_value(v.clone())?;
        }
        Ok(Self::wrap(map))
    }

    fn to_value(&self) -> Value {
        Value::Map(self.map.clone())
    }

    fn value_ref(&self) -> Ref {
        self.map.value_ref()
    }
}

impl<K, V> PartialEq for MapOf<K, V> {
    fn eq(&self, other: &Self) -> bool {
        self.map == other.map
    }
}

impl<K, V> Eq for MapOf<K, V> {}

impl<K, V> fmt::Debug for MapOf<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.map, f)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scores() -> MapOf<String, u64> {
        let (alice, bob) = ("alice".to_string(), "bob".to_string());
        MapOf::from_entries([(&alice, &3), (&bob, &5)])
    }

    #[test]
    fn typed_get_and_has() {
        let map = scores();
        assert_eq!(map.get(&"alice".to_string()).unwrap(), Some(3));
        assert_eq!(map.get(&"carol".to_string()).unwrap(), None);
        assert!(map.has(&"bob".to_string()));
    }

    #[test]
    fn set_and_remove_are_persistent() {
        let map = scores();
        let carol = "carol".to_string();
        let grown = map.set(&carol, &9);
        assert_eq!(grown.len(), 3);
        assert_eq!(map.len(), 2);
        assert_eq!(grown.remove(&carol), map);
    }

    #[test]
    fn iterate_and_filter() {
        let map = scores();
        let mut total = 0;
        map.iter_all(|_, v| total += v).unwrap();
        assert_eq!(total, 8);

        let high = map.filter(|_, v| *v > 4).unwrap();
        assert_eq!(high.len(), 1);
        assert!(high.has(&"bob".to_string()));

        let pairs: Vec<(String, u64)> = map.iter().collect::<ValueResult<_>>().unwrap();
        assert_eq!(pairs.len(), 2);
    }

    #[test]
    fn from_value_rejects_wrong_value_type() {
        let raw = Map::from_entries([("k", "not a number")]);
        assert!(MapOf::<String, u64>::from_value(Value::from(raw.clone())).is_err());
        assert!(MapOf::<String, String>::from_value(Value::from(raw)).is_ok());
    }
}
