use cairn_ref::Ref;
use cairn_value::Value;

use crate::error::StoreResult;

/// Content-addressed value store.
///
/// All implementations must satisfy these invariants:
/// - A value is stored under its own ref, so a ref always reads back the
///   same value.
/// - Writes are idempotent.
/// - Concurrent reads are always safe (values are immutable).
pub trait ValueStore: Send + Sync {
    /// Store `value` and return its ref. Storing a present value is a no-op.
    fn write_value(&self, value: &Value) -> StoreResult<Ref>;

    /// Returns `Ok(None)` if nothing is stored under `value_ref`.
    fn read_value(&self, value_ref: &Ref) -> StoreResult<Option<Value>>;

    fn has(&self, value_ref: &Ref) -> StoreResult<bool>;

    /// Default implementation calls `read_value()` for each ref.
    fn read_batch(&self, refs: &[Ref]) -> StoreResult<Vec<Option<Value>>> {
        refs.iter().map(|r| self.read_value(r)).collect()
    }

    /// Default implementation calls `write_value()` for each value.
    fn write_batch(&self, values: &[Value]) -> StoreResult<Vec<Ref>> {
        values.iter().map(|v| self.write_value(v)).collect()
    }
}
