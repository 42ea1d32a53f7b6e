//! Type descriptors and the packages that group them.

pub mod descriptor;
pub mod package;

pub use descriptor::{
    CompoundKind, Field, NamedRef, PackageSlot, PrimitiveKind, StructDesc, TypeDescriptor,
};
pub use package::{Package, PackageBuilder, ResolvedPackage};
