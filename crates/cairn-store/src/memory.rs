use std::collections::HashMap;
use std::fmt;
use std::sync::{RwLock, RwLockReadGuard};

use cairn_ref::Ref;
use cairn_value::Value;
use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::traits::ValueStore;

/// In-memory, HashMap-based value store.
///
/// Intended for tests and embedding. Reads return clones of stored values.
pub struct InMemoryValueStore {
    values: RwLock<HashMap<Ref, Value>>,
}

impl InMemoryValueStore {
    pub fn new() -> Self {
        Self {
            values: RwLock::new(HashMap::new()),
        }
    }

    /// Number of values currently stored.
    pub fn len(&self) -> StoreResult<usize> {
        Ok(self.read_lock()?.len())
    }

    pub fn is_empty(&self) -> StoreResult<bool> {
        Ok(self.read_lock()?.is_empty())
    }

    /// Return a sorted list of every stored ref.
    pub fn all_refs(&self) -> StoreResult<Vec<Ref>> {
        let map = self.read_lock()?;
        let mut refs: Vec<Ref> = map.keys().copied().collect();
        refs.sort();
        Ok(refs)
    }

    fn read_lock(&self) -> StoreResult<RwLockReadGuard<'_, HashMap<Ref, Value>>> {
        self.values
            .read()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

impl Default for InMemoryValueStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ValueStore for InMemoryValueStore {
    fn write_value(&self, value: &Value) -> StoreResult<Ref> {
        let value_ref = value.value_ref();
        let mut map = self
            .values
            .write()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))?;
        map.entry(value_ref).or_insert_with(|| {
            debug!(value = %value_ref.short_hex(), kind = value.kind_name(), "stored value");
            value.clone()
        });
        Ok(value_ref)
    }

    fn read_value(&self, value_ref: &Ref) -> StoreResult<Option<Value>> {
        Ok(self.read_lock()?.get(value_ref).cloned())
    }

    fn has(&self, value_ref: &Ref) -> StoreResult<bool> {
        Ok(self.read_lock()?.contains_key(value_ref))
    }
}

impl fmt::Debug for InMemoryValueStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let count = self.values.read().map(|m| m.len()).unwrap_or_default();
        f.debug_struct("InMemoryValueStore")
            .field("value_count", &count)
            .finish()
    }
}
