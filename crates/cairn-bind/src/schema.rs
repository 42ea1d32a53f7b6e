//! Struct schemas resolved from a package registry.

use std::fmt;
use std::sync::Arc;

use cairn_value::{
    validate, Field, NamedRef, PackageRegistry, StructDesc, StructValue, TypeDescriptor, Value,
    ValueError, ValueResult,
};
use tracing::debug;

use crate::binding::Binding;
use crate::record::Record;

/// The shape of one named struct type, bound to its package.
#[derive(Clone)]
pub struct StructSchema {
    type_ref: NamedRef,
    desc: StructDesc,
    registry: Arc<dyn PackageRegistry>,
}

impl StructSchema {
    /// Looks up `named` in `registry`. The name must refer to a struct.
    pub fn resolve(registry: Arc<dyn PackageRegistry>, named: &NamedRef) -> ValueResult<Self> {
        let package_ref = named.package_in(None)?;
        let descriptor = registry.resolve_type(named)?;
        let TypeDescriptor::Struct(desc) = &descriptor else {
            return Err(ValueError::TypeMismatch {
                expected: "struct".into(),
                found: descriptor.to_string(),
            });
        };
        debug!(schema = %named, fields = desc.fields().len(), "resolved struct schema");
        Ok(Self {
            type_ref: NamedRef::new(package_ref, named.name()),
            desc: desc.as_ref().clone(),
            registry,
        })
    }

    pub fn name(&self) -> &str {
        self.desc.name()
    }

    pub fn type_ref(&self) -> &NamedRef {
        &self.type_ref
    }

    pub fn fields(&self) -> &[Field] {
        self.desc.fields()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.desc.field(name)
    }

    /// A record with every required field set to its zero value.
    ///
    /// Fails with [`ValueError::MissingField`] if a required field's type
    /// has no zero value (structs, unions, named types).
    pub fn instantiate(&self) -> ValueResult<Record> {
        let mut fields = Vec::with_capacity(self.desc.fields().len());
        for field in self.desc.fields().iter().filter(|f| !f.optional) {
            let zero = field.ty.zero_value().ok_or_else(|| ValueError::MissingField {
                struct_name: self.desc.name().to_string(),
                field: field.name.clone(),
            })?;
            fields.push((field.name.clone(), zero));
        }
        let value = StructValue::new(self.type_ref.clone(), fields)?;
        Ok(Record::from_struct(value))
    }

    /// Builds a record from explicit field values and validates it.
    pub fn build<N: Into<String>>(
        &self,
        fields: impl IntoIterator<Item = (N, Value)>,
    ) -> ValueResult<Record> {
        let value = StructValue::new(self.type_ref.clone(), fields)?;
        let record = Record::from_struct(value);
        self.validate(&record.to_value())?;
        Ok(record)
    }

    /// Checks `value` against this schema, following nested named types
    /// through the registry.
    pub fn validate(&self, value: &Value) -> ValueResult<()> {
        validate(
            value,
            &TypeDescriptor::Named(self.type_ref.clone()),
            None,
            self.registry.as_ref(),
        )
    }
}

impl fmt::Debug for StructSchema {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StructSchema")
            .field("type_ref", &self.type_ref)
            .field("fields", &self.desc.fields())
            .finish()
    }
}
