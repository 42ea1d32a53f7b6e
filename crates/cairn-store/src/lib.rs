//! Value storage for cairn.
//!
//! A value store maps refs to the values they hash. Datasets layer named,
//! movable heads on top of it: each dataset points at one stored value and
//! only moves forward through a compare-and-set commit.
//!
//! # Storage Backends
//!
//! All backends implement the [`ValueStore`] trait:
//!
//! - [`InMemoryValueStore`] -- `HashMap`-based store for tests and embedding
//!
//! # Design Rules
//!
//! 1. Values are immutable once written; writing the same value twice is a no-op.
//! 2. A dataset head only ever names a value already present in the store.
//! 3. Commits name the head they expect to replace. A stale expectation fails.

pub mod dataset;
pub mod error;
pub mod memory;
pub mod traits;

pub use dataset::{validate_dataset_id, DatasetStore};
pub use error::{StoreError, StoreResult};
pub use memory::InMemoryValueStore;
pub use traits::ValueStore;
