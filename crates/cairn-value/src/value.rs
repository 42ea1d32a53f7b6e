//! The polymorphic [`Value`] root type.

use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use cairn_ref::{Ref, RefHasher};

use crate::encode::{tag, Encoder};
use crate::error::{ValueError, ValueResult};
use crate::list::List;
use crate::map::Map;
use crate::primitive::Primitive;
use crate::set::Set;
use crate::structs::StructValue;
use crate::types::{Package, TypeDescriptor};

/// An immutable unit of data.
///
/// Values are compared by content hash: `a == b` iff
/// `a.value_ref() == b.value_ref()`. No method mutates a value in place;
/// every setter returns a new value that shares structure with the old one.
#[derive(Clone)]
pub enum Value {
    Primitive(Primitive),
    String(Arc<str>),
    List(List),
    Map(Map),
    Set(Set),
    Struct(StructValue),
    Type(TypeDescriptor),
    Package(Package),
}

impl Value {
    /// Content hash of the value's canonical encoding.
    ///
    /// Collections and structs cache their ref after the first call.
    pub fn value_ref(&self) -> Ref {
        match self {
            Self::Primitive(p) => {
                let mut enc = Encoder::new(RefHasher::VALUE);
                p.encode(&mut enc);
                enc.finish()
            }
            Self::String(s) => {
                let mut enc = Encoder::new(RefHasher::VALUE);
                enc.tag(tag::STRING).str(s);
                enc.finish()
            }
            Self::List(list) => list.value_ref(),
            Self::Map(map) => map.value_ref(),
            Self::Set(set) => set.value_ref(),
            Self::Struct(s) => s.value_ref(),
            Self::Type(descriptor) => {
                let mut enc = Encoder::new(RefHasher::VALUE);
                enc.tag(tag::TYPE).reference(&descriptor.type_ref());
                enc.finish()
            }
            Self::Package(package) => {
                let mut enc = Encoder::new(RefHasher::VALUE);
                enc.tag(tag::PACKAGE).reference(&package.package_ref());
                enc.finish()
            }
        }
    }

    /// Short variant name, used in mismatch errors.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Self::Primitive(p) => p.kind().name(),
            Self::String(_) => "String",
            Self::List(_) => "List",
            Self::Map(_) => "Map",
            Self::Set(_) => "Set",
            Self::Struct(_) => "Struct",
            Self::Type(_) => "Type",
            Self::Package(_) => "Package",
        }
    }

    pub fn as_primitive(&self) -> ValueResult<&Primitive> {
        match self {
            Self::Primitive(p) => Ok(p),
            other => Err(ValueError::mismatch("Primitive", other.kind_name())),
        }
    }

    pub fn as_bool(&self) -> ValueResult<bool> {
        match self {
            Self::Primitive(Primitive::Bool(b)) => Ok(*b),
            other => Err(ValueError::mismatch("Bool", other.kind_name())),
        }
    }

    pub fn as_str(&self) -> ValueResult<&str> {
        match self {
            Self::String(s) => Ok(s),
            other => Err(ValueError::mismatch("String", other.kind_name())),
        }
    }

    pub fn as_list(&self) -> ValueResult<&List> {
        match self {
            Self::List(list) => Ok(list),
            other => Err(ValueError::mismatch("List", other.kind_name())),
        }
    }

    pub fn as_map(&self) -> ValueResult<&Map> {
        match self {
            Self::Map(map) => Ok(map),
            other => Err(ValueError::mismatch("Map", other.kind_name())),
        }
    }

    pub fn as_set(&self) -> ValueResult<&Set> {
        match self {
            Self::Set(set) => Ok(set),
            other => Err(ValueError::mismatch("Set", other.kind_name())),
        }
    }

    pub fn as_struct(&self) -> ValueResult<&StructValue> {
        match self {
            Self::Struct(s) => Ok(s),
            other => Err(ValueError::mismatch("Struct", other.kind_name())),
        }
    }

    pub fn as_type(&self) -> ValueResult<&TypeDescriptor> {
        match self {
            Self::Type(descriptor) => Ok(descriptor),
            other => Err(ValueError::mismatch("Type", other.kind_name())),
        }
    }

    pub fn as_package(&self) -> ValueResult<&Package> {
        match self {
            Self::Package(package) => Ok(package),
            other => Err(ValueError::mismatch("Package", other.kind_name())),
        }
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Self::Primitive(a), Self::Primitive(b)) => a == b,
            (Self::String(a), Self::String(b)) => a == b,
            _ => self.value_ref() == other.value_ref(),
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.value_ref().hash(state);
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Primitive(p) => write!(f, "{p}"),
            Self::String(s) => write!(f, "{s:?}"),
            Self::List(list) => fmt::Debug::fmt(list, f),
            Self::Map(map) => fmt::Debug::fmt(map, f),
            Self::Set(set) => fmt::Debug::fmt(set, f),
            Self::Struct(s) => fmt::Debug::fmt(s, f),
            Self::Type(descriptor) => write!(f, "Type({descriptor})"),
            Self::Package(package) => write!(f, "Package({})", package.package_ref().short_hex()),
        }
    }
}

macro_rules! from_primitive {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Self::Primitive(Primitive::$variant(v))
                }
            }
        )*
    };
}

from_primitive! {
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

impl From<Primitive> for Value {
    fn from(p: Primitive) -> Self {
        Self::Primitive(p)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Self::String(Arc::from(s))
    }
}

impl From<List> for Value {
    fn from(list: List) -> Self {
        Self::List(list)
    }
}

impl From<Map> for Value {
    fn from(map: Map) -> Self {
        Self::Map(map)
    }
}

impl From<Set> for Value {
    fn from(set: Set) -> Self {
        Self::Set(set)
    }
}

impl From<StructValue> for Value {
    fn from(s: StructValue) -> Self {
        Self::Struct(s)
    }
}

impl From<TypeDescriptor> for Value {
    fn from(descriptor: TypeDescriptor) -> Self {
        Self::Type(descriptor)
    }
}

impl From<Package> for Value {
    fn from(package: Package) -> Self {
        Self::Package(package)
    }
}
