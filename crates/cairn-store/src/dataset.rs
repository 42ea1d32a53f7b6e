//! Named dataset heads over a value store.
//!
//! A dataset is a name bound to one stored value (its head). Heads move by
//! compare-and-set: a commit carries the head the caller last saw, and
//! fails with [`StoreError::HeadMoved`] if another commit got there first.

use std::collections::HashMap;
use std::sync::RwLock;

use cairn_ref::Ref;
use cairn_value::Value;
use tracing::{debug, warn};

use crate::error::{StoreError, StoreResult};
use crate::traits::ValueStore;

/// Check that a dataset id is non-empty and uses only ASCII letters,
/// digits, `-`, `_`, and `/`.
pub fn validate_dataset_id(id: &str) -> StoreResult<()> {
    if id.is_empty() {
        return Err(StoreError::InvalidDatasetId {
            id: id.to_string(),
            reason: "must not be empty".into(),
        });
    }
    if let Some(ch) = id
        .chars()
        .find(|c| !(c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '/')))
    {
        return Err(StoreError::InvalidDatasetId {
            id: id.to_string(),
            reason: format!("contains forbidden character: {ch:?}"),
        });
    }
    Ok(())
}

/// Dataset heads backed by a [`ValueStore`].
///
/// Every head the dataset has held is kept, oldest first, so `history`
/// can list them.
pub struct DatasetStore<S> {
    values: S,
    heads: RwLock<HashMap<String, Vec<Ref>>>,
}

impl<S: ValueStore> DatasetStore<S> {
    pub fn new(values: S) -> Self {
        Self {
            values,
            heads: RwLock::new(HashMap::new()),
        }
    }

    /// The underlying value store.
    pub fn values(&self) -> &S {
        &self.values
    }

    /// Current head of `id`, or `None` for a dataset never committed to.
    pub fn head(&self, id: &str) -> StoreResult<Option<Ref>> {
        validate_dataset_id(id)?;
        let heads = self
            .heads
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(heads.get(id).and_then(|history| history.last().copied()))
    }

    /// The value the head of `id` points at.
    pub fn head_value(&self, id: &str) -> StoreResult<Option<Value>> {
        match self.head(id)? {
            Some(head) => self.values.read_value(&head),
            None => Ok(None),
        }
    }

    /// Move the head of `id` to `value_ref`.
    ///
    /// `expected_parent` must equal the current head (`None` for the first
    /// commit). The value must already be in the store.
    pub fn commit(&self, id: &str, value_ref: Ref, expected_parent: Option<Ref>) -> StoreResult<Ref> {
        validate_dataset_id(id)?;
        if !self.values.has(&value_ref)? {
            return Err(StoreError::ValueNotFound(value_ref));
        }
        let mut heads = self
            .heads
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let actual = heads.get(id).and_then(|history| history.last().copied());
        if actual != expected_parent {
            warn!(
                dataset = id,
                expected = ?expected_parent.map(|r| r.short_hex()),
                actual = ?actual.map(|r| r.short_hex()),
                "commit rejected, head moved"
            );
            return Err(StoreError::HeadMoved {
                dataset: id.to_string(),
                expected: expected_parent,
                actual,
            });
        }
        let history = heads.entry(id.to_string()).or_default();
        if actual != Some(value_ref) {
            history.push(value_ref);
        }
        debug!(dataset = id, head = %value_ref.short_hex(), depth = history.len(), "committed");
        Ok(value_ref)
    }

    /// Write `value` to the store, then commit it as the head of `id`.
    pub fn commit_value(&self, id: &str, value: &Value, expected_parent: Option<Ref>) -> StoreResult<Ref> {
        let value_ref = self.values.write_value(value)?;
        self.commit(id, value_ref, expected_parent)
    }

    /// Every head `id` has held, newest first.
    pub fn history(&self, id: &str) -> StoreResult<Vec<Ref>> {
        validate_dataset_id(id)?;
        let heads = self
            .heads
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        Ok(heads
            .get(id)
            .map(|history| history.iter().rev().copied().collect())
            .unwrap_or_default())
    }

    /// Sorted ids of every dataset with a head.
    pub fn datasets(&self) -> StoreResult<Vec<String>> {
        let heads = self
            .heads
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        let mut ids: Vec<String> = heads.keys().cloned().collect();
        ids.sort();
        Ok(ids)
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::thread;

    use super::*;
    use crate::memory::InMemoryValueStore;
    use cairn_value::List;

    fn datasets() -> DatasetStore<InMemoryValueStore> {
        DatasetStore::new(InMemoryValueStore::new())
    }

    // -----------------------------------------------------------------------
    // Dataset ids
    // -----------------------------------------------------------------------

    #[test]
    fn dataset_id_rules() {
        assert!(validate_dataset_id("photos").is_ok());
        assert!(validate_dataset_id("users/alice-2_b").is_ok());
        assert!(validate_dataset_id("").is_err());
        assert!(validate_dataset_id("has space").is_err());
        assert!(matches!(
            validate_dataset_id("a:b"),
            Err(StoreError::InvalidDatasetId { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Commits
    // -----------------------------------------------------------------------

    #[test]
    fn first_commit_then_chain() {
        let ds = datasets();
        assert_eq!(ds.head("main").unwrap(), None);

        let v1 = ds.commit_value("main", &Value::from("one"), None).unwrap();
        assert_eq!(ds.head("main").unwrap(), Some(v1));
        let v2 = ds.commit_value("main", &Value::from("two"), Some(v1)).unwrap();

        assert_eq!(ds.head_value("main").unwrap(), Some(Value::from("two")));
        assert_eq!(ds.history("main").unwrap(), vec![v2, v1]);
        assert_eq!(ds.datasets().unwrap(), vec!["main".to_string()]);
    }

    #[test]
    fn stale_parent_is_rejected() {
        let ds = datasets();
        let v1 = ds.commit_value("main", &Value::from(1u8), None).unwrap();
        let _v2 = ds.commit_value("main", &Value::from(2u8), Some(v1)).unwrap();

        let err = ds
            .commit_value("main", &Value::from(3u8), Some(v1))
            .unwrap_err();
        assert!(matches!(err, StoreError::HeadMoved { ref dataset, .. } if dataset == "main"));
        let err = ds.commit_value("main", &Value::from(3u8), None).unwrap_err();
        assert!(matches!(err, StoreError::HeadMoved { expected: None, .. }));
        assert_eq!(ds.history("main").unwrap().len(), 2);
    }

    #[test]
    fn rejected_first_commit_leaves_no_dataset() {
        let ds = datasets();
        let stored = ds.values().write_value(&Value::from("x")).unwrap();
        let err = ds.commit("fresh", stored, Some(stored)).unwrap_err();
        assert!(matches!(err, StoreError::HeadMoved { actual: None, .. }));
        assert!(!ds.heads.read().unwrap().contains_key("fresh"));
        assert!(ds.datasets().unwrap().is_empty());
        assert_eq!(ds.history("fresh").unwrap(), Vec::<Ref>::new());
    }

    #[test]
    fn commit_requires_stored_value() {
        let ds = datasets();
        let unstored = Value::from(List::from_values([Value::from(1u8)])).value_ref();
        assert!(matches!(
            ds.commit("main", unstored, None),
            Err(StoreError::ValueNotFound(r)) if r == unstored
        ));
        assert!(ds.datasets().unwrap().is_empty());
    }

    #[test]
    fn recommitting_head_keeps_history_flat() {
        let ds = datasets();
        let v1 = ds.commit_value("main", &Value::from(true), None).unwrap();
        ds.commit("main", v1, Some(v1)).unwrap();
        assert_eq!(ds.history("main").unwrap(), vec![v1]);
    }

    #[test]
    fn invalid_ids_are_rejected_everywhere() {
        let ds = datasets();
        assert!(ds.head("").is_err());
        assert!(ds.history("bad id").is_err());
        assert!(ds.commit_value("bad id", &Value::from(1u8), None).is_err());
    }

    #[test]
    fn racing_commits_from_same_parent() {
        let ds = Arc::new(datasets());
        let base = ds.commit_value("main", &Value::from(0u64), None).unwrap();
        let handles: Vec<_> = (1..=8u64)
            .map(|i| {
                let ds = Arc::clone(&ds);
                thread::spawn(move || ds.commit_value("main", &Value::from(i), Some(base)).is_ok())
            })
            .collect();
        let winners = handles
            .into_iter()
            .map(|h| h.join().unwrap())
            .filter(|ok| *ok)
            .count();
        assert_eq!(winners, 1);
        assert_eq!(ds.history("main").unwrap().len(), 2);
    }
}
