//! Content hashes for cairn.
//!
//! Every value, type descriptor, and package in cairn is identified by a
//! [`Ref`]: the BLAKE3 hash of its canonical encoding. Identical content
//! always produces the same `Ref`, which makes refs usable as cache keys,
//! deduplication keys, and storage addresses at the same time.
//!
//! # Key Types
//!
//! - [`Ref`]: 32-byte content hash, hex formatted
//! - [`RefHasher`]: domain-separated hasher (values, types, packages)
//! - [`RefError`]: parse failures

pub mod error;
pub mod hasher;
pub mod reference;

pub use error::RefError;
pub use hasher::RefHasher;
pub use reference::Ref;
