//! Structural type descriptors.
//!
//! A [`TypeDescriptor`] describes the shape of a value. Descriptors compare
//! structurally: two descriptors are equal iff they are built from the same
//! constructors with the same arguments. Recursion is never expressed by
//! nesting a descriptor inside itself; instead a descriptor names another
//! type through a [`NamedRef`], and the name is looked up in a package.

use std::fmt;
use std::sync::Arc;

use cairn_ref::{Ref, RefHasher};

use crate::encode::{tag, Encoder};
use crate::error::{ValueError, ValueResult};
use crate::list::List;
use crate::map::Map;
use crate::primitive::Primitive;
use crate::set::Set;
use crate::value::Value;

/// Scalar and leaf kinds.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PrimitiveKind {
    Bool,
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    Float32,
    Float64,
    String,
    /// Any value at all.
    Value,
    /// A type descriptor used as a value.
    Type,
    /// A package used as a value.
    Package,
}

impl PrimitiveKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::Bool => "Bool",
            Self::UInt8 => "UInt8",
            Self::UInt16 => "UInt16",
            Self::UInt32 => "UInt32",
            Self::UInt64 => "UInt64",
            Self::Int8 => "Int8",
            Self::Int16 => "Int16",
            Self::Int32 => "Int32",
            Self::Int64 => "Int64",
            Self::Float32 => "Float32",
            Self::Float64 => "Float64",
            Self::String => "String",
            Self::Value => "Value",
            Self::Type => "Type",
            Self::Package => "Package",
        }
    }

    fn code(self) -> u8 {
        self as u8
    }
}

/// Collection kinds with their element type arity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CompoundKind {
    List,
    Map,
    Set,
}

impl CompoundKind {
    pub fn name(self) -> &'static str {
        match self {
            Self::List => "List",
            Self::Map => "Map",
            Self::Set => "Set",
        }
    }

    /// Number of element types the kind takes.
    pub fn arity(self) -> usize {
        match self {
            Self::List | Self::Set => 1,
            Self::Map => 2,
        }
    }

    fn code(self) -> u8 {
        self as u8
    }
}

/// Which package a [`NamedRef`] points into.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum PackageSlot {
    /// The package currently being assembled. Only meaningful inside a
    /// descriptor stored in that package.
    Current,
    /// A concrete, content-addressed package.
    Package(Ref),
}

/// A reference to a type by name within a package.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NamedRef {
    package: PackageSlot,
    name: String,
}

impl NamedRef {
    /// Reference `name` in the package being built (the placeholder slot).
    pub fn local(name: impl Into<String>) -> Self {
        Self {
            package: PackageSlot::Current,
            name: name.into(),
        }
    }

    /// Reference `name` in an existing package.
    pub fn new(package: Ref, name: impl Into<String>) -> Self {
        Self {
            package: PackageSlot::Package(package),
            name: name.into(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn slot(&self) -> &PackageSlot {
        &self.package
    }

    /// The concrete package ref, or `None` for the placeholder slot.
    pub fn package_ref(&self) -> Option<Ref> {
        match self.package {
            PackageSlot::Current => None,
            PackageSlot::Package(r) => Some(r),
        }
    }

    pub fn is_local(&self) -> bool {
        self.package == PackageSlot::Current
    }

    /// Replace the placeholder slot with `package`.
    pub fn bind(&self, package: Ref) -> Self {
        match self.package {
            PackageSlot::Current => Self::new(package, self.name.clone()),
            PackageSlot::Package(_) => self.clone(),
        }
    }

    /// Resolve the slot against an optional enclosing package.
    pub fn package_in(&self, context: Option<Ref>) -> ValueResult<Ref> {
        match (&self.package, context) {
            (PackageSlot::Package(r), _) => Ok(*r),
            (PackageSlot::Current, Some(r)) => Ok(r),
            (PackageSlot::Current, None) => Err(ValueError::PlaceholderOutsidePackage {
                name: self.name.clone(),
            }),
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        match &self.package {
            PackageSlot::Current => enc.tag(tag::SLOT_CURRENT),
            PackageSlot::Package(r) => enc.tag(tag::SLOT_PACKAGE).reference(r),
        };
        enc.str(&self.name);
    }
}

impl fmt::Display for NamedRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.package {
            PackageSlot::Current => write!(f, "{}", self.name),
            PackageSlot::Package(r) => write!(f, "{}@{}", self.name, r.short_hex()),
        }
    }
}

/// One field of a struct descriptor.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Field {
    pub name: String,
    pub ty: TypeDescriptor,
    pub optional: bool,
}

impl Field {
    pub fn required(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: false,
        }
    }

    pub fn optional(name: impl Into<String>, ty: TypeDescriptor) -> Self {
        Self {
            name: name.into(),
            ty,
            optional: true,
        }
    }
}

/// A named struct shape with ordered fields.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct StructDesc {
    name: String,
    fields: Vec<Field>,
}

impl StructDesc {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[Field] {
        &self.fields
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// Structural description of a value's shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeDescriptor {
    Primitive(PrimitiveKind),
    Compound(CompoundKind, Arc<[TypeDescriptor]>),
    Struct(Arc<StructDesc>),
    Union(Arc<[TypeDescriptor]>),
    /// Forward reference to a named type, resolved against a package.
    Named(NamedRef),
}

impl TypeDescriptor {
    pub fn primitive(kind: PrimitiveKind) -> Self {
        Self::Primitive(kind)
    }

    pub fn bool() -> Self {
        Self::Primitive(PrimitiveKind::Bool)
    }

    pub fn string() -> Self {
        Self::Primitive(PrimitiveKind::String)
    }

    pub fn uint64() -> Self {
        Self::Primitive(PrimitiveKind::UInt64)
    }

    pub fn int64() -> Self {
        Self::Primitive(PrimitiveKind::Int64)
    }

    pub fn float64() -> Self {
        Self::Primitive(PrimitiveKind::Float64)
    }

    pub fn value() -> Self {
        Self::Primitive(PrimitiveKind::Value)
    }

    pub fn list_of(element: TypeDescriptor) -> Self {
        Self::Compound(CompoundKind::List, Arc::from(vec![element]))
    }

    pub fn set_of(element: TypeDescriptor) -> Self {
        Self::Compound(CompoundKind::Set, Arc::from(vec![element]))
    }

    pub fn map_of(key: TypeDescriptor, value: TypeDescriptor) -> Self {
        Self::Compound(CompoundKind::Map, Arc::from(vec![key, value]))
    }

    /// Build a compound descriptor, checking the element arity.
    pub fn compound(kind: CompoundKind, elements: Vec<TypeDescriptor>) -> ValueResult<Self> {
        if elements.len() != kind.arity() {
            return Err(ValueError::InvalidArity {
                kind: kind.name(),
                expected: kind.arity(),
                actual: elements.len(),
            });
        }
        Ok(Self::Compound(kind, Arc::from(elements)))
    }

    /// Build a struct descriptor. Field names must be unique.
    pub fn struct_of(name: impl Into<String>, fields: Vec<Field>) -> ValueResult<Self> {
        let name = name.into();
        for (i, field) in fields.iter().enumerate() {
            if fields[..i].iter().any(|f| f.name == field.name) {
                return Err(ValueError::DuplicateField {
                    struct_name: name,
                    field: field.name.clone(),
                });
            }
        }
        Ok(Self::Struct(Arc::new(StructDesc { name, fields })))
    }

    pub fn union_of(alternatives: Vec<TypeDescriptor>) -> Self {
        Self::Union(Arc::from(alternatives))
    }

    /// Reference `name` in the package currently being built.
    pub fn named_local(name: impl Into<String>) -> Self {
        Self::Named(NamedRef::local(name))
    }

    /// Reference `name` in the package identified by `package`.
    pub fn named(package: Ref, name: impl Into<String>) -> Self {
        Self::Named(NamedRef::new(package, name))
    }

    pub fn as_struct(&self) -> Option<&StructDesc> {
        match self {
            Self::Struct(desc) => Some(desc),
            _ => None,
        }
    }

    pub fn as_named(&self) -> Option<&NamedRef> {
        match self {
            Self::Named(named) => Some(named),
            _ => None,
        }
    }

    /// Content hash of the descriptor. Placeholder slots are hashed as
    /// placeholders, so the ref of a type inside a package never depends on
    /// the package's own ref.
    pub fn type_ref(&self) -> Ref {
        let mut enc = Encoder::new(RefHasher::TYPE);
        self.encode(&mut enc);
        enc.finish()
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        match self {
            Self::Primitive(kind) => {
                enc.tag(tag::DESC_PRIMITIVE).tag(kind.code());
            }
            Self::Compound(kind, elements) => {
                enc.tag(tag::DESC_COMPOUND).tag(kind.code()).count(elements.len());
                for element in elements.iter() {
                    element.encode(enc);
                }
            }
            Self::Struct(desc) => {
                enc.tag(tag::DESC_STRUCT).str(&desc.name).count(desc.fields.len());
                for field in &desc.fields {
                    enc.str(&field.name).tag(u8::from(field.optional));
                    field.ty.encode(enc);
                }
            }
            Self::Union(alternatives) => {
                enc.tag(tag::DESC_UNION).count(alternatives.len());
                for alternative in alternatives.iter() {
                    alternative.encode(enc);
                }
            }
            Self::Named(named) => {
                enc.tag(tag::DESC_NAMED);
                named.encode(enc);
            }
        }
    }

    /// Call `f` for every named reference reachable without crossing a
    /// package boundary.
    pub fn visit_named<'a>(&'a self, f: &mut impl FnMut(&'a NamedRef)) {
        match self {
            Self::Primitive(_) => {}
            Self::Compound(_, elements) | Self::Union(elements) => {
                for element in elements.iter() {
                    element.visit_named(f);
                }
            }
            Self::Struct(desc) => {
                for field in &desc.fields {
                    field.ty.visit_named(f);
                }
            }
            Self::Named(named) => f(named),
        }
    }

    /// Returns `true` if any placeholder slot remains.
    pub fn has_placeholders(&self) -> bool {
        let mut found = false;
        self.visit_named(&mut |named: &NamedRef| found |= named.is_local());
        found
    }

    /// Rewrite every placeholder slot to point at `package`.
    pub fn bind(&self, package: Ref) -> Self {
        self.map_named(&mut |named: &NamedRef| Self::Named(named.bind(package)))
    }

    /// Rebuild the descriptor, replacing each named reference with `f(named)`.
    pub(crate) fn map_named(&self, f: &mut impl FnMut(&NamedRef) -> Self) -> Self {
        match self {
            Self::Primitive(kind) => Self::Primitive(*kind),
            Self::Compound(kind, elements) => {
                Self::Compound(*kind, elements.iter().map(|e| e.map_named(f)).collect())
            }
            Self::Struct(desc) => Self::Struct(Arc::new(StructDesc {
                name: desc.name.clone(),
                fields: desc
                    .fields
                    .iter()
                    .map(|field| Field {
                        name: field.name.clone(),
                        ty: field.ty.map_named(f),
                        optional: field.optional,
                    })
                    .collect(),
            })),
            Self::Union(alternatives) => {
                Self::Union(alternatives.iter().map(|a| a.map_named(f)).collect())
            }
            Self::Named(named) => f(named),
        }
    }

    /// Fallible form of [`map_named`](Self::map_named); stops at the first error.
    pub(crate) fn try_map_named(
        &self,
        f: &mut impl FnMut(&NamedRef) -> ValueResult<Self>,
    ) -> ValueResult<Self> {
        Ok(match self {
            Self::Primitive(kind) => Self::Primitive(*kind),
            Self::Compound(kind, elements) => Self::Compound(
                *kind,
                elements
                    .iter()
                    .map(|e| e.try_map_named(f))
                    .collect::<ValueResult<Vec<_>>>()?
                    .into(),
            ),
            Self::Struct(desc) => Self::Struct(Arc::new(StructDesc {
                name: desc.name.clone(),
                fields: desc
                    .fields
                    .iter()
                    .map(|field| {
                        Ok(Field {
                            name: field.name.clone(),
                            ty: field.ty.try_map_named(f)?,
                            optional: field.optional,
                        })
                    })
                    .collect::<ValueResult<Vec<_>>>()?,
            })),
            Self::Union(alternatives) => Self::Union(
                alternatives
                    .iter()
                    .map(|a| a.try_map_named(f))
                    .collect::<ValueResult<Vec<_>>>()?
                    .into(),
            ),
            Self::Named(named) => f(named)?,
        })
    }

    /// Default value for the descriptor, if it has an obvious one.
    ///
    /// Structs, unions, named types and `Value` have no zero value.
    pub fn zero_value(&self) -> Option<Value> {
        match self {
            Self::Primitive(kind) => match kind {
                PrimitiveKind::Bool => Some(Value::Primitive(Primitive::Bool(false))),
                PrimitiveKind::UInt8 => Some(Value::Primitive(Primitive::UInt8(0))),
                PrimitiveKind::UInt16 => Some(Value::Primitive(Primitive::UInt16(0))),
                PrimitiveKind::UInt32 => Some(Value::Primitive(Primitive::UInt32(0))),
                PrimitiveKind::UInt64 => Some(Value::Primitive(Primitive::UInt64(0))),
                PrimitiveKind::Int8 => Some(Value::Primitive(Primitive::Int8(0))),
                PrimitiveKind::Int16 => Some(Value::Primitive(Primitive::Int16(0))),
                PrimitiveKind::Int32 => Some(Value::Primitive(Primitive::Int32(0))),
                PrimitiveKind::Int64 => Some(Value::Primitive(Primitive::Int64(0))),
                PrimitiveKind::Float32 => Some(Value::Primitive(Primitive::Float32(0.0))),
                PrimitiveKind::Float64 => Some(Value::Primitive(Primitive::Float64(0.0))),
                PrimitiveKind::String => Some(Value::from("")),
                PrimitiveKind::Value | PrimitiveKind::Type | PrimitiveKind::Package => None,
            },
            Self::Compound(CompoundKind::List, _) => Some(Value::List(List::new())),
            Self::Compound(CompoundKind::Map, _) => Some(Value::Map(Map::new())),
            Self::Compound(CompoundKind::Set, _) => Some(Value::Set(Set::new())),
            Self::Struct(_) | Self::Union(_) | Self::Named(_) => None,
        }
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(kind) => f.write_str(kind.name()),
            Self::Compound(kind, elements) => {
                write!(f, "{}<", kind.name())?;
                for (i, element) in elements.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{element}")?;
                }
                f.write_str(">")
            }
            Self::Struct(desc) => write!(f, "struct {}", desc.name),
            Self::Union(alternatives) => {
                for (i, alternative) in alternatives.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" | ")?;
                    }
                    write!(f, "{alternative}")?;
                }
                Ok(())
            }
            Self::Named(named) => write!(f, "{named}"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tree() -> TypeDescriptor {
        TypeDescriptor::struct_of(
            "Tree",
            vec![Field::required(
                "children",
                TypeDescriptor::list_of(TypeDescriptor::named_local("Tree")),
            )],
        )
        .unwrap()
    }

    #[test]
    fn structural_equality() {
        assert_eq!(tree(), tree());
        assert_eq!(tree().type_ref(), tree().type_ref());
        assert_ne!(
            TypeDescriptor::list_of(TypeDescriptor::string()),
            TypeDescriptor::set_of(TypeDescriptor::string())
        );
    }

    #[test]
    fn field_optionality_changes_ref() {
        let a = TypeDescriptor::struct_of("S", vec![Field::required("x", TypeDescriptor::bool())])
            .unwrap();
        let b = TypeDescriptor::struct_of("S", vec![Field::optional("x", TypeDescriptor::bool())])
            .unwrap();
        assert_ne!(a, b);
        assert_ne!(a.type_ref(), b.type_ref());
    }

    #[test]
    fn field_order_is_significant() {
        let a = TypeDescriptor::struct_of(
            "S",
            vec![
                Field::required("x", TypeDescriptor::bool()),
                Field::required("y", TypeDescriptor::bool()),
            ],
        )
        .unwrap();
        let b = TypeDescriptor::struct_of(
            "S",
            vec![
                Field::required("y", TypeDescriptor::bool()),
                Field::required("x", TypeDescriptor::bool()),
            ],
        )
        .unwrap();
        assert_ne!(a.type_ref(), b.type_ref());
    }

    #[test]
    fn compound_arity_is_checked() {
        let err = TypeDescriptor::compound(CompoundKind::Map, vec![TypeDescriptor::string()])
            .unwrap_err();
        assert!(matches!(
            err,
            ValueError::InvalidArity {
                expected: 2,
                actual: 1,
                ..
            }
        ));
        assert!(TypeDescriptor::compound(CompoundKind::List, vec![TypeDescriptor::bool()]).is_ok());
    }

    #[test]
    fn duplicate_fields_rejected() {
        let err = TypeDescriptor::struct_of(
            "S",
            vec![
                Field::required("x", TypeDescriptor::bool()),
                Field::optional("x", TypeDescriptor::string()),
            ],
        )
        .unwrap_err();
        assert!(matches!(err, ValueError::DuplicateField { .. }));
    }

    #[test]
    fn bind_replaces_only_placeholders() {
        let package = RefHasher::PACKAGE.hash(b"pkg");
        let other = RefHasher::PACKAGE.hash(b"other");
        let desc = TypeDescriptor::union_of(vec![
            TypeDescriptor::named_local("A"),
            TypeDescriptor::named(other, "B"),
        ]);
        assert!(desc.has_placeholders());
        let bound = desc.bind(package);
        assert!(!bound.has_placeholders());
        let mut seen = Vec::new();
        bound.visit_named(&mut |n| seen.push(n.clone()));
        assert_eq!(seen, vec![NamedRef::new(package, "A"), NamedRef::new(other, "B")]);
    }

    #[test]
    fn bind_keeps_struct_shape() {
        let package = RefHasher::PACKAGE.hash(b"pkg");
        let desc = TypeDescriptor::struct_of(
            "Tree",
            vec![
                Field::required("label", TypeDescriptor::string()),
                Field::optional(
                    "index",
                    TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::named_local("Tree")),
                ),
            ],
        )
        .unwrap();
        let bound = desc.bind(package);
        let expected = TypeDescriptor::struct_of(
            "Tree",
            vec![
                Field::required("label", TypeDescriptor::string()),
                Field::optional(
                    "index",
                    TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::named(package, "Tree")),
                ),
            ],
        )
        .unwrap();
        assert_eq!(bound, expected);
        assert_eq!(bound.bind(package), bound);
    }

    #[test]
    fn placeholder_and_bound_refs_differ() {
        let package = RefHasher::PACKAGE.hash(b"pkg");
        assert_ne!(tree().type_ref(), tree().bind(package).type_ref());
    }

    #[test]
    fn display_forms() {
        assert_eq!(
            TypeDescriptor::map_of(TypeDescriptor::string(), TypeDescriptor::named_local("Tree"))
                .to_string(),
            "Map<String, Tree>"
        );
        assert_eq!(tree().to_string(), "struct Tree");
        assert_eq!(
            TypeDescriptor::union_of(vec![TypeDescriptor::bool(), TypeDescriptor::string()])
                .to_string(),
            "Bool | String"
        );
    }

    #[test]
    fn zero_values() {
        assert_eq!(TypeDescriptor::bool().zero_value(), Some(Value::from(false)));
        assert_eq!(TypeDescriptor::string().zero_value(), Some(Value::from("")));
        assert_eq!(
            TypeDescriptor::list_of(TypeDescriptor::bool()).zero_value(),
            Some(Value::List(List::new()))
        );
        assert_eq!(tree().zero_value(), None);
        assert_eq!(TypeDescriptor::named_local("Tree").zero_value(), None);
        assert_eq!(TypeDescriptor::value().zero_value(), None);
    }

    #[test]
    fn package_in_requires_context_for_placeholders() {
        let package = RefHasher::PACKAGE.hash(b"pkg");
        assert_eq!(NamedRef::local("A").package_in(Some(package)).unwrap(), package);
        assert!(matches!(
            NamedRef::local("A").package_in(None),
            Err(ValueError::PlaceholderOutsidePackage { .. })
        ));
        assert_eq!(NamedRef::new(package, "A").package_in(None).unwrap(), package);
    }
}
