//! Packages: content-addressed collections of named type descriptors.
//!
//! A package is assembled in two phases. First every descriptor is built,
//! with same-package references expressed through the placeholder slot
//! ([`TypeDescriptor::named_local`]); the package's ref is computed over
//! that placeholder form, so it never depends on itself. Then
//! [`Package::resolve`] checks every name and binds the placeholders to the
//! package's ref.
//!
//! # Invariants
//!
//! - Every placeholder reference names a type defined in the same package.
//! - Following placeholder references through unions never returns to the
//!   starting name without passing a struct or collection constructor.
//! - `dependencies` lists every package referenced by a concrete slot.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::fmt;
use std::sync::{Arc, OnceLock};

use cairn_ref::{Ref, RefHasher};
use tracing::{debug, warn};

use crate::encode::Encoder;
use crate::error::{ValueError, ValueResult};
use crate::types::descriptor::{NamedRef, TypeDescriptor};

/// Collects named descriptors and validates them into a [`Package`].
#[derive(Debug, Default)]
pub struct PackageBuilder {
    types: BTreeMap<String, TypeDescriptor>,
    dependencies: BTreeSet<Ref>,
    duplicate: Option<String>,
}

impl PackageBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Define `name` in the package. Defining a name twice fails at `build`.
    pub fn define(mut self, name: impl Into<String>, descriptor: TypeDescriptor) -> Self {
        let name = name.into();
        if self.types.contains_key(&name) {
            self.duplicate.get_or_insert(name);
        } else {
            self.types.insert(name, descriptor);
        }
        self
    }

    /// Declare a dependency explicitly. Dependencies reached through named
    /// references are collected automatically.
    pub fn depends_on(mut self, package: Ref) -> Self {
        self.dependencies.insert(package);
        self
    }

    /// Validate the assembled descriptors and freeze them into a package.
    pub fn build(self) -> ValueResult<Package> {
        if let Some(name) = self.duplicate {
            return Err(ValueError::DuplicateTypeName(name));
        }
        let mut dependencies = self.dependencies;
        for descriptor in self.types.values() {
            descriptor.visit_named(&mut |named: &NamedRef| {
                if let Some(r) = named.package_ref() {
                    dependencies.insert(r);
                }
            });
        }
        let package = Package {
            inner: Arc::new(PackageInner {
                types: self.types,
                dependencies: dependencies.into_iter().collect(),
                cached: OnceLock::new(),
            }),
        };
        package.check()?;
        debug!(
            package = %package.package_ref().short_hex(),
            types = package.len(),
            dependencies = package.dependencies().len(),
            "built package"
        );
        Ok(package)
    }
}

struct PackageInner {
    types: BTreeMap<String, TypeDescriptor>,
    dependencies: Vec<Ref>,
    cached: OnceLock<Ref>,
}

/// Immutable, content-addressed set of named type descriptors.
#[derive(Clone)]
pub struct Package {
    inner: Arc<PackageInner>,
}

impl Package {
    pub fn builder() -> PackageBuilder {
        PackageBuilder::new()
    }

    /// The package's content hash. Computed once, over the unbound form.
    pub fn package_ref(&self) -> Ref {
        *self.inner.cached.get_or_init(|| {
            let mut enc = Encoder::new(RefHasher::PACKAGE);
            enc.count(self.inner.types.len());
            for (name, descriptor) in &self.inner.types {
                enc.str(name).reference(&descriptor.type_ref());
            }
            enc.count(self.inner.dependencies.len());
            for dependency in &self.inner.dependencies {
                enc.reference(dependency);
            }
            enc.finish()
        })
    }

    /// The descriptor defined under `name`, in its unbound form.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.inner.types.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.types.contains_key(name)
    }

    /// Defined names in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.inner.types.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &TypeDescriptor)> {
        self.inner.types.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.inner.types.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.types.is_empty()
    }

    /// Refs of every package this one references, sorted.
    pub fn dependencies(&self) -> &[Ref] {
        &self.inner.dependencies
    }

    /// Second pass: check every same-package name and bind placeholder
    /// slots to this package's ref. Cross-package references are left as
    /// (ref, name) pairs for lazy resolution.
    pub fn resolve(&self) -> ValueResult<ResolvedPackage> {
        self.check()?;
        let package_ref = self.package_ref();
        let types = self
            .inner
            .types
            .iter()
            .map(|(name, descriptor)| (name.clone(), descriptor.bind(package_ref)))
            .collect();
        Ok(ResolvedPackage {
            package: self.clone(),
            package_ref,
            types,
        })
    }

    /// Eagerly expand every same-package reference reachable from `name`.
    ///
    /// Fails with [`ValueError::CycleViaInlineExpansion`] for recursive
    /// types, which can only be expressed through name indirection.
    pub fn inline(&self, name: &str) -> ValueResult<TypeDescriptor> {
        let descriptor = self.get(name).ok_or_else(|| ValueError::UnknownTypeName {
            name: name.to_string(),
            package: None,
        })?;
        let mut stack = vec![name.to_string()];
        self.expand(descriptor, &mut stack)
    }

    fn expand(&self, descriptor: &TypeDescriptor, stack: &mut Vec<String>) -> ValueResult<TypeDescriptor> {
        descriptor.try_map_named(&mut |named: &NamedRef| {
            if !named.is_local() {
                return Ok(TypeDescriptor::Named(named.clone()));
            }
            if stack.iter().any(|seen| seen == named.name()) {
                return Err(ValueError::CycleViaInlineExpansion {
                    name: named.name().to_string(),
                });
            }
            let target = self.get(named.name()).ok_or_else(|| ValueError::UnknownTypeName {
                name: named.name().to_string(),
                package: None,
            })?;
            stack.push(named.name().to_string());
            let expanded = self.expand(target, stack);
            stack.pop();
            expanded
        })
    }

    fn check(&self) -> ValueResult<()> {
        for (name, descriptor) in &self.inner.types {
            if let Some(desc) = descriptor.as_struct() {
                if desc.name() != name.as_str() {
                    warn!(type_name = %name, declared = desc.name(), "struct defined under another name");
                    return Err(ValueError::StructNameMismatch {
                        defined: name.clone(),
                        declared: desc.name().to_string(),
                    });
                }
            }
            let mut missing = None;
            descriptor.visit_named(&mut |named: &NamedRef| {
                if missing.is_none() && named.is_local() && !self.contains(named.name()) {
                    missing = Some(named.name().to_string());
                }
            });
            if let Some(name) = missing {
                warn!(type_name = %name, "package references undefined type");
                return Err(ValueError::UnknownTypeName {
                    name,
                    package: None,
                });
            }
        }

        let mut done = HashSet::new();
        for name in self.inner.types.keys() {
            let mut path = Vec::new();
            if let Some(name) = self.find_alias_cycle(name, &mut path, &mut done) {
                warn!(type_name = %name, "package defines a type only by aliasing itself");
                return Err(ValueError::CycleViaInlineExpansion { name });
            }
        }
        Ok(())
    }

    /// Depth-first walk over references that are not guarded by a struct or
    /// collection constructor.
    fn find_alias_cycle<'a>(
        &'a self,
        name: &'a str,
        path: &mut Vec<&'a str>,
        done: &mut HashSet<&'a str>,
    ) -> Option<String> {
        if done.contains(name) {
            return None;
        }
        if path.contains(&name) {
            return Some(name.to_string());
        }
        path.push(name);
        if let Some(descriptor) = self.inner.types.get(name) {
            let mut next = Vec::new();
            unguarded_names(descriptor, &mut next);
            for target in next {
                if let Some(cycle) = self.find_alias_cycle(target, path, done) {
                    return Some(cycle);
                }
            }
        }
        path.pop();
        done.insert(name);
        None
    }
}

fn unguarded_names<'a>(descriptor: &'a TypeDescriptor, out: &mut Vec<&'a str>) {
    match descriptor {
        TypeDescriptor::Named(named) if named.is_local() => out.push(named.name()),
        TypeDescriptor::Union(alternatives) => {
            for alternative in alternatives.iter() {
                unguarded_names(alternative, out);
            }
        }
        _ => {}
    }
}

impl PartialEq for Package {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.package_ref() == other.package_ref()
    }
}

impl Eq for Package {}

impl fmt::Debug for Package {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Package")
            .field("ref", &self.package_ref())
            .field("types", &self.inner.types.keys().collect::<Vec<_>>())
            .field("dependencies", &self.inner.dependencies)
            .finish()
    }
}

/// A package whose placeholder slots have been bound to its own ref.
#[derive(Clone, Debug)]
pub struct ResolvedPackage {
    package: Package,
    package_ref: Ref,
    types: BTreeMap<String, TypeDescriptor>,
}

impl ResolvedPackage {
    pub fn package(&self) -> &Package {
        &self.package
    }

    pub fn package_ref(&self) -> Ref {
        self.package_ref
    }

    /// The bound descriptor for `name`.
    pub fn get(&self, name: &str) -> Option<&TypeDescriptor> {
        self.types.get(name)
    }

    /// A concrete reference to `name`, if the package defines it.
    pub fn named_ref(&self, name: &str) -> Option<NamedRef> {
        self.types
            .contains_key(name)
            .then(|| NamedRef::new(self.package_ref, name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::descriptor::Field;

    fn node_type() -> TypeDescriptor {
        TypeDescriptor::struct_of(
            "Node",
            vec![Field::required(
                "children",
                TypeDescriptor::list_of(TypeDescriptor::named_local("Node")),
            )],
        )
        .unwrap()
    }

    fn node_package() -> Package {
        Package::builder().define("Node", node_type()).build().unwrap()
    }

    // -----------------------------------------------------------------------
    // Building
    // -----------------------------------------------------------------------

    #[test]
    fn self_referential_struct_builds() {
        let package = node_package();
        assert_eq!(package.len(), 1);
        assert!(package.contains("Node"));
        assert!(package.dependencies().is_empty());
    }

    #[test]
    fn ref_is_stable_across_constructions() {
        assert_eq!(node_package().package_ref(), node_package().package_ref());
        assert_eq!(node_package(), node_package());
    }

    #[test]
    fn definition_order_does_not_matter() {
        let a = Package::builder()
            .define("A", TypeDescriptor::bool())
            .define("B", TypeDescriptor::string())
            .build()
            .unwrap();
        let b = Package::builder()
            .define("B", TypeDescriptor::string())
            .define("A", TypeDescriptor::bool())
            .build()
            .unwrap();
        assert_eq!(a.package_ref(), b.package_ref());
    }

    #[test]
    fn unknown_local_name_fails_at_build() {
        let err = Package::builder()
            .define("Tree", TypeDescriptor::list_of(TypeDescriptor::named_local("Leaf")))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValueError::UnknownTypeName { ref name, package: None } if name == "Leaf"));
    }

    #[test]
    fn duplicate_definition_fails() {
        let err = Package::builder()
            .define("A", TypeDescriptor::bool())
            .define("A", TypeDescriptor::string())
            .build()
            .unwrap_err();
        assert!(matches!(err, ValueError::DuplicateTypeName(ref n) if n == "A"));
    }

    #[test]
    fn struct_must_be_defined_under_its_own_name() {
        let tree = TypeDescriptor::struct_of(
            "Tree",
            vec![Field::required("label", TypeDescriptor::string())],
        )
        .unwrap();
        let err = Package::builder().define("Node", tree).build().unwrap_err();
        assert!(matches!(
            err,
            ValueError::StructNameMismatch { ref defined, ref declared }
                if defined == "Node" && declared == "Tree"
        ));
    }

    #[test]
    fn alias_cycle_is_rejected() {
        let err = Package::builder()
            .define("A", TypeDescriptor::named_local("B"))
            .define("B", TypeDescriptor::named_local("A"))
            .build()
            .unwrap_err();
        assert!(matches!(err, ValueError::CycleViaInlineExpansion { .. }));

        let err = Package::builder()
            .define(
                "A",
                TypeDescriptor::union_of(vec![TypeDescriptor::string(), TypeDescriptor::named_local("A")]),
            )
            .build()
            .unwrap_err();
        assert!(matches!(err, ValueError::CycleViaInlineExpansion { .. }));
    }

    #[test]
    fn mutual_recursion_through_structs_is_fine() {
        let a = TypeDescriptor::struct_of(
            "A",
            vec![Field::optional("b", TypeDescriptor::named_local("B"))],
        )
        .unwrap();
        let b = TypeDescriptor::struct_of(
            "B",
            vec![Field::required("a", TypeDescriptor::list_of(TypeDescriptor::named_local("A")))],
        )
        .unwrap();
        let package = Package::builder().define("A", a).define("B", b).build().unwrap();
        assert!(package.resolve().is_ok());
    }

    #[test]
    fn cross_package_refs_become_dependencies() {
        let base = node_package();
        let other = Package::builder()
            .define(
                "Forest",
                TypeDescriptor::list_of(TypeDescriptor::named(base.package_ref(), "Node")),
            )
            .build()
            .unwrap();
        assert_eq!(other.dependencies(), &[base.package_ref()]);
        assert_ne!(other.package_ref(), base.package_ref());
    }

    // -----------------------------------------------------------------------
    // Resolution
    // -----------------------------------------------------------------------

    #[test]
    fn resolve_binds_placeholders() {
        let package = node_package();
        let resolved = package.resolve().unwrap();
        assert_eq!(resolved.package_ref(), package.package_ref());
        let bound = resolved.get("Node").unwrap();
        assert!(!bound.has_placeholders());
        let field = &bound.as_struct().unwrap().fields()[0];
        assert_eq!(
            field.ty,
            TypeDescriptor::list_of(TypeDescriptor::named(package.package_ref(), "Node"))
        );
        assert_eq!(
            resolved.named_ref("Node"),
            Some(NamedRef::new(package.package_ref(), "Node"))
        );
        assert_eq!(resolved.named_ref("Missing"), None);
        // the package itself keeps the unbound form
        assert!(package.get("Node").unwrap().has_placeholders());
    }

    // -----------------------------------------------------------------------
    // Inline expansion
    // -----------------------------------------------------------------------

    #[test]
    fn inline_expands_non_recursive_types() {
        let package = Package::builder()
            .define("Name", TypeDescriptor::string())
            .define(
                "Person",
                TypeDescriptor::struct_of(
                    "Person",
                    vec![Field::required("name", TypeDescriptor::named_local("Name"))],
                )
                .unwrap(),
            )
            .build()
            .unwrap();
        let inlined = package.inline("Person").unwrap();
        assert_eq!(
            inlined,
            TypeDescriptor::struct_of("Person", vec![Field::required("name", TypeDescriptor::string())])
                .unwrap()
        );
    }

    #[test]
    fn inline_refuses_recursive_types() {
        let err = node_package().inline("Node").unwrap_err();
        assert!(matches!(err, ValueError::CycleViaInlineExpansion { ref name } if name == "Node"));
        assert!(matches!(
            node_package().inline("Nope"),
            Err(ValueError::UnknownTypeName { .. })
        ));
    }
}
