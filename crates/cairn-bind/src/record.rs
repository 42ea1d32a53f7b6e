//! Typed field access over struct values.

use std::fmt;

use cairn_ref::Ref;
use cairn_value::{NamedRef, StructValue, Value, ValueError, ValueResult};

use crate::binding::Binding;

/// A struct value with typed getters and setters.
///
/// Setters return a new record; the receiver is unchanged.
#[derive(Clone, PartialEq, Eq)]
pub struct Record {
    value: StructValue,
}

impl Record {
    pub fn from_struct(value: StructValue) -> Self {
        Self { value }
    }

    pub fn struct_value(&self) -> &StructValue {
        &self.value
    }

    pub fn type_ref(&self) -> &NamedRef {
        self.value.type_ref()
    }

    pub fn name(&self) -> &str {
        self.value.name()
    }

    /// Reads a required field.
    pub fn get<T: Binding>(&self, field: &str) -> ValueResult<T> {
        let value = self.value.get(field).ok_or_else(|| ValueError::MissingField {
            struct_name: self.value.name().to_string(),
            field: field.to_string(),
        })?;
        T::from_value(value.clone())
    }

    pub fn get_optional<T: Binding>(&self, field: &str) -> ValueResult<Option<T>> {
        self.value
            .get(field)
            .map(|v| T::from_value(v.clone()))
            .transpose()
    }

    pub fn set<T: Binding>(&self, field: &str, value: &T) -> Self {
        Self::from_struct(self.value.set(field, value.to_value()))
    }

    /// Clears an optional field.
    pub fn remove(&self, field: &str) -> Self {
        Self::from_struct(self.value.remove(field))
    }
}

impl Binding for Record {
    fn from_value(value: Value) -> ValueResult<Self> {
        Ok(Self::from_struct(value.as_struct()?.clone()))
    }

    fn to_value(&self) -> Value {
        Value::Struct(self.value.clone())
    }

    fn value_ref(&self) -> Ref {
        self.value.value_ref()
    }
}

impl fmt::Debug for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.value, f)
    }
}
