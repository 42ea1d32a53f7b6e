//! Immutable, content-addressed values for cairn.
//!
//! A [`Value`] is never modified in place. Every update returns a new value
//! that shares unchanged structure with the old one, and every value is
//! identified by the [`Ref`](cairn_ref::Ref) of its canonical encoding.
//!
//! # Key Types
//!
//! - [`Value`]: the closed set of value variants
//! - [`List`], [`Map`], [`Set`]: persistent chunked collections
//! - [`StructValue`]: an instance of a named struct type
//! - [`TypeDescriptor`]: structural types, including forward references
//!   to types in the package being defined
//! - [`Package`] / [`PackageBuilder`]: content-addressed groups of named types
//! - [`PackageRegistry`] / [`InMemoryRegistry`]: package lookup by ref
//!
//! # Recursive types
//!
//! A type can refer to itself before its package's ref exists by naming
//! itself with [`TypeDescriptor::named_local`]. Descriptors are hashed in
//! that unbound form, so the package ref is computable; [`Package::resolve`]
//! then binds every placeholder to the finished ref.

pub mod config;
mod encode;
pub mod error;
pub mod list;
pub mod map;
pub mod primitive;
pub mod registry;
mod sequence;
pub mod set;
pub mod structs;
pub mod types;
pub mod validate;
pub mod value;

pub use config::CollectionConfig;
pub use error::{ValueError, ValueResult};
pub use list::List;
pub use map::Map;
pub use primitive::Primitive;
pub use registry::{InMemoryRegistry, PackageRegistry};
pub use sequence::Iter as ListIter;
pub use set::Set;
pub use structs::StructValue;
pub use types::{
    CompoundKind, Field, NamedRef, Package, PackageBuilder, PackageSlot, PrimitiveKind,
    ResolvedPackage, StructDesc, TypeDescriptor,
};
pub use validate::validate;
pub use value::Value;
