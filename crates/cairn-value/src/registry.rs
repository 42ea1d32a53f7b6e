//! Package registry: maps package refs to their definitions.
//!
//! Registries are explicit values. Nothing is global; construct one per
//! process or per test and pass it where named types need resolving.

use std::collections::HashMap;
use std::sync::{PoisonError, RwLock};

use cairn_ref::Ref;
use tracing::debug;

use crate::error::{ValueError, ValueResult};
use crate::types::{NamedRef, Package, TypeDescriptor};

/// Lookup of packages by content ref.
///
/// Implementations must be append-only: once a ref is registered, lookups
/// for it succeed for the registry's lifetime.
pub trait PackageRegistry: Send + Sync {
    /// Validates and stores `package`, returning its ref.
    ///
    /// Registering content that is already present is a no-op that returns
    /// the same ref.
    fn register(&self, package: &Package) -> ValueResult<Ref>;

    /// Fails with [`ValueError::PackageNotFound`] for unknown refs.
    fn lookup(&self, package_ref: &Ref) -> ValueResult<Package>;

    fn contains(&self, package_ref: &Ref) -> bool;

    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Dereferences a named type to its definition, with every
    /// current-package slot bound to the defining package.
    fn resolve_type(&self, named: &NamedRef) -> ValueResult<TypeDescriptor> {
        let package_ref = named.package_in(None)?;
        let package = self.lookup(&package_ref)?;
        let descriptor = package
            .get(named.name())
            .ok_or_else(|| ValueError::UnknownTypeName {
                name: named.name().to_string(),
                package: Some(package_ref),
            })?;
        Ok(descriptor.bind(package_ref))
    }
}

/// A [`PackageRegistry`] backed by a `HashMap` behind a `RwLock`.
#[derive(Debug, Default)]
pub struct InMemoryRegistry {
    packages: RwLock<HashMap<Ref, Package>>,
}

impl InMemoryRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sorted refs of every registered package.
    pub fn package_refs(&self) -> Vec<Ref> {
        let packages = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        let mut refs: Vec<Ref> = packages.keys().copied().collect();
        refs.sort();
        refs
    }
}

impl PackageRegistry for InMemoryRegistry {
    fn register(&self, package: &Package) -> ValueResult<Ref> {
        let resolved = package.resolve()?;
        let package_ref = resolved.package_ref();
        let mut packages = self.packages.write().unwrap_or_else(PoisonError::into_inner);
        if packages.contains_key(&package_ref) {
            return Ok(package_ref);
        }
        packages.insert(package_ref, package.clone());
        debug!(
            package = %package_ref.short_hex(),
            types = package.len(),
            dependencies = package.dependencies().len(),
            "registered package"
        );
        Ok(package_ref)
    }

    fn lookup(&self, package_ref: &Ref) -> ValueResult<Package> {
        let packages = self.packages.read().unwrap_or_else(PoisonError::into_inner);
        packages
            .get(package_ref)
            .cloned()
            .ok_or(ValueError::PackageNotFound(*package_ref))
    }

    fn contains(&self, package_ref: &Ref) -> bool {
        self.packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(package_ref)
    }

    fn len(&self) -> usize {
        self.packages
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}
