//! Structural validation of values against type descriptors.

use cairn_ref::Ref;

use crate::error::{ValueError, ValueResult};
use crate::registry::PackageRegistry;
use crate::types::{CompoundKind, NamedRef, PrimitiveKind, StructDesc, TypeDescriptor};
use crate::value::Value;

/// Checks that `value` conforms to `descriptor`.
///
/// `context` is the package that current-package references in
/// `descriptor` belong to; it may be `None` for fully bound descriptors.
/// Named references are looked up in `registry` as they are reached.
pub fn validate(
    value: &Value,
    descriptor: &TypeDescriptor,
    context: Option<Ref>,
    registry: &dyn PackageRegistry,
) -> ValueResult<()> {
    match descriptor {
        TypeDescriptor::Primitive(kind) => check_primitive(value, *kind),
        TypeDescriptor::Compound(kind, elements) => {
            check_compound(value, *kind, elements, context, registry)
        }
        TypeDescriptor::Struct(desc) => check_struct(value, desc, context, registry),
        TypeDescriptor::Union(alternatives) => {
            for alternative in alternatives.iter() {
                match validate(value, alternative, context, registry) {
                    Ok(()) => return Ok(()),
                    // a shape error only rules out this alternative
                    Err(
                        ValueError::TypeMismatch { .. }
                        | ValueError::MissingField { .. }
                        | ValueError::UnknownField { .. },
                    ) => {}
                    Err(err) => return Err(err),
                }
            }
            Err(ValueError::mismatch(descriptor.to_string(), value.kind_name()))
        }
        TypeDescriptor::Named(named) => check_named(value, named, context, registry),
    }
}

fn check_primitive(value: &Value, kind: PrimitiveKind) -> ValueResult<()> {
    let ok = match (kind, value) {
        (PrimitiveKind::Value, _) => true,
        (PrimitiveKind::String, Value::String(_)) => true,
        (PrimitiveKind::Type, Value::Type(_)) => true,
        (PrimitiveKind::Package, Value::Package(_)) => true,
        (kind, Value::Primitive(p)) => p.kind() == kind,
        _ => false,
    };
    if ok {
        Ok(())
    } else {
        Err(ValueError::mismatch(kind.name(), found_name(value)))
    }
}

fn found_name(value: &Value) -> String {
    match value {
        Value::Primitive(p) => p.kind().name().to_string(),
        Value::Struct(s) => s.name().to_string(),
        other => other.kind_name().to_string(),
    }
}

fn check_compound(
    value: &Value,
    kind: CompoundKind,
    elements: &[TypeDescriptor],
    context: Option<Ref>,
    registry: &dyn PackageRegistry,
) -> ValueResult<()> {
    match (kind, elements) {
        (CompoundKind::List, [element]) => value
            .as_list()?
            .iter()
            .try_for_each(|item| validate(item, element, context, registry)),
        (CompoundKind::Set, [element]) => value
            .as_set()?
            .iter()
            .try_for_each(|item| validate(item, element, context, registry)),
        (CompoundKind::Map, [key, val]) => value.as_map()?.iter().try_for_each(|(k, v)| {
            validate(k, key, context, registry)?;
            validate(v, val, context, registry)
        }),
        _ => Err(ValueError::InvalidArity {
            kind: kind.name(),
            expected: kind.arity(),
            actual: elements.len(),
        }),
    }
}

fn check_struct(
    value: &Value,
    desc: &StructDesc,
    context: Option<Ref>,
    registry: &dyn PackageRegistry,
) -> ValueResult<()> {
    let s = value.as_struct()?;
    if s.name() != desc.name() {
        return Err(ValueError::mismatch(desc.name(), s.name()));
    }
    for field in desc.fields() {
        match s.get(&field.name) {
            Some(v) => validate(v, &field.ty, context, registry)?,
            None if field.optional => {}
            None => {
                return Err(ValueError::MissingField {
                    struct_name: desc.name().to_string(),
                    field: field.name.clone(),
                })
            }
        }
    }
    if let Some((name, _)) = s.fields().find(|(name, _)| desc.field(name).is_none()) {
        return Err(ValueError::UnknownField {
            struct_name: desc.name().to_string(),
            field: name.to_string(),
        });
    }
    Ok(())
}

fn check_named(
    value: &Value,
    named: &NamedRef,
    context: Option<Ref>,
    registry: &dyn PackageRegistry,
) -> ValueResult<()> {
    let package_ref = named.package_in(context)?;
    let package = registry.lookup(&package_ref)?;
    let target = package
        .get(named.name())
        .ok_or_else(|| ValueError::UnknownTypeName {
            name: named.name().to_string(),
            package: Some(package_ref),
        })?;
    if let (Value::Struct(s), TypeDescriptor::Struct(_)) = (value, target) {
        let expected = NamedRef::new(package_ref, named.name());
        if s.type_ref() != &expected {
            return Err(ValueError::mismatch(expected.to_string(), s.type_ref().to_string()));
        }
    }
    validate(value, target, Some(package_ref), registry)
}
