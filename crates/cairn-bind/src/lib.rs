//! Typed views over cairn values.
//!
//! [`Binding`] converts between Rust types and [`Value`](cairn_value::Value).
//! The generic containers ([`ListOf`], [`MapOf`], [`SetOf`]) wrap the
//! untyped persistent collections and convert elements at the edges, and
//! [`Record`] gives field-level typed access to a struct value whose shape
//! comes from a [`StructSchema`] resolved out of a package registry.
//!
//! Application types are thin newtypes over these pieces: a recursive
//! `Tree` is a `Record` whose `children` field reads back as
//! `ListOf<Tree>`.

pub mod binding;
pub mod list;
pub mod map;
pub mod record;
pub mod schema;
pub mod set;

pub use binding::Binding;
pub use list::ListOf;
pub use map::MapOf;
pub use record::Record;
pub use schema::StructSchema;
pub use set::SetOf;
