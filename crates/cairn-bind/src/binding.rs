//! Conversion between Rust types and values.

use cairn_ref::Ref;
use cairn_value::{Primitive, Value, ValueError, ValueResult};

/// A Rust type with a value representation.
///
/// `from_value(x.to_value())` must reproduce `x`.
pub trait Binding: Sized {
    /// Fails with [`ValueError::TypeMismatch`] when `value` has the wrong shape.
    fn from_value(value: Value) -> ValueResult<Self>;

    fn to_value(&self) -> Value;

    fn value_ref(&self) -> Ref {
        self.to_value().value_ref()
    }

    /// Content equality: same value ref.
    fn equals(&self, other: &Self) -> bool {
        self.value_ref() == other.value_ref()
    }
}

macro_rules! primitive_binding {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl Binding for $ty {
                fn from_value(value: Value) -> ValueResult<Self> {
                    match value {
                        Value::Primitive(Primitive::$variant(v)) => Ok(v),
                        other => Err(ValueError::TypeMismatch {
                            expected: stringify!($variant).to_string(),
                            found: other.kind_name().to_string(),
                        }),
                    }
                }

                fn to_value(&self) -> Value {
                    Value::from(*self)
                }
            }
        )*
    };
}

primitive_binding! {
    bool => Bool,
    u8 => UInt8,
    u16 => UInt16,
    u32 => UInt32,
    u64 => UInt64,
    i8 => Int8,
    i16 => Int16,
    i32 => Int32,
    i64 => Int64,
    f32 => Float32,
    f64 => Float64,
}

impl Binding for String {
    fn from_value(value: Value) -> ValueResult<Self> {
        value.as_str().map(str::to_string)
    }

    fn to_value(&self) -> Value {
        Value::from(self.as_str())
    }
}

impl Binding for Value {
    fn from_value(value: Value) -> ValueResult<Self> {
        Ok(value)
    }

    fn to_value(&self) -> Value {
        self.clone()
    }
}
