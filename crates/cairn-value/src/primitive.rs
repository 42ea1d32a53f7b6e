use std::fmt;

use crate::encode::{tag, Encoder};
use crate::types::PrimitiveKind;

/// A scalar value. Floats compare and hash by bit pattern, so `NaN`
/// payloads and `-0.0` are distinct values.
#[derive(Clone, Copy, Debug)]
pub enum Primitive {
    Bool(bool),
    UInt8(u8),
    UInt16(u16),
    UInt32(u32),
    UInt64(u64),
    Int8(i8),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Float32(f32),
    Float64(f64),
}

impl Primitive {
    /// The descriptor kind this primitive conforms to.
    pub fn kind(&self) -> PrimitiveKind {
        match self {
            Self::Bool(_) => PrimitiveKind::Bool,
            Self::UInt8(_) => PrimitiveKind::UInt8,
            Self::UInt16(_) => PrimitiveKind::UInt16,
            Self::UInt32(_) => PrimitiveKind::UInt32,
            Self::UInt64(_) => PrimitiveKind::UInt64,
            Self::Int8(_) => PrimitiveKind::Int8,
            Self::Int16(_) => PrimitiveKind::Int16,
            Self::Int32(_) => PrimitiveKind::Int32,
            Self::Int64(_) => PrimitiveKind::Int64,
            Self::Float32(_) => PrimitiveKind::Float32,
            Self::Float64(_) => PrimitiveKind::Float64,
        }
    }

    pub(crate) fn encode(&self, enc: &mut Encoder) {
        match *self {
            Self::Bool(v) => enc.tag(tag::BOOL).raw(&[u8::from(v)]),
            Self::UInt8(v) => enc.tag(tag::UINT8).raw(&v.to_le_bytes()),
            Self::UInt16(v) => enc.tag(tag::UINT16).raw(&v.to_le_bytes()),
            Self::UInt32(v) => enc.tag(tag::UINT32).raw(&v.to_le_bytes()),
            Self::UInt64(v) => enc.tag(tag::UINT64).raw(&v.to_le_bytes()),
            Self::Int8(v) => enc.tag(tag::INT8).raw(&v.to_le_bytes()),
            Self::Int16(v) => enc.tag(tag::INT16).raw(&v.to_le_bytes()),
            Self::Int32(v) => enc.tag(tag::INT32).raw(&v.to_le_bytes()),
            Self::Int64(v) => enc.tag(tag::INT64).raw(&v.to_le_bytes()),
            Self::Float32(v) => enc.tag(tag::FLOAT32).raw(&v.to_bits().to_le_bytes()),
            Self::Float64(v) => enc.tag(tag::FLOAT64).raw(&v.to_bits().to_le_bytes()),
        };
    }
}

impl PartialEq for Primitive {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Float32(a), Self::Float32(b)) => a.to_bits() == b.to_bits(),
            (Self::Float64(a), Self::Float64(b)) => a.to_bits() == b.to_bits(),
            (Self::Bool(a), Self::Bool(b)) => a == b,
            (Self::UInt8(a), Self::UInt8(b)) => a == b,
            (Self::UInt16(a), Self::UInt16(b)) => a == b,
            (Self::UInt32(a), Self::UInt32(b)) => a == b,
            (Self::UInt64(a), Self::UInt64(b)) => a == b,
            (Self::Int8(a), Self::Int8(b)) => a == b,
            (Self::Int16(a), Self::Int16(b)) => a == b,
            (Self::Int32(a), Self::Int32(b)) => a == b,
            (Self::Int64(a), Self::Int64(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Primitive {}

impl fmt::Display for Primitive {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Bool(v) => write!(f, "{v}"),
            Self::UInt8(v) => write!(f, "{v}u8"),
            Self::UInt16(v) => write!(f, "{v}u16"),
            Self::UInt32(v) => write!(f, "{v}u32"),
            Self::UInt64(v) => write!(f, "{v}u64"),
            Self::Int8(v) => write!(f, "{v}i8"),
            Self::Int16(v) => write!(f, "{v}i16"),
            Self::Int32(v) => write!(f, "{v}i32"),
            Self::Int64(v) => write!(f, "{v}i64"),
            Self::Float32(v) => write!(f, "{v}f32"),
            Self::Float64(v) => write!(f, "{v}f64"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn floats_compare_by_bits() {
        assert_eq!(Primitive::Float64(f64::NAN), Primitive::Float64(f64::NAN));
        assert_ne!(Primitive::Float64(0.0), Primitive::Float64(-0.0));
    }

    #[test]
    fn widths_are_distinct() {
        assert_ne!(Primitive::UInt8(1), Primitive::UInt16(1));
        assert_eq!(Primitive::Int32(7).kind(), PrimitiveKind::Int32);
    }

    #[test]
    fn display_carries_width() {
        assert_eq!(Primitive::UInt64(5).to_string(), "5u64");
        assert_eq!(Primitive::Bool(true).to_string(), "true");
    }
}
