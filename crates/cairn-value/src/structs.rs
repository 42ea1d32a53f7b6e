//! Struct values: a named type reference plus fields sorted by name.

use std::fmt;
use std::sync::{Arc, OnceLock};

use cairn_ref::{Ref, RefHasher};

use crate::encode::{tag, Encoder};
use crate::error::{ValueError, ValueResult};
use crate::types::NamedRef;
use crate::value::Value;

struct StructInner {
    type_ref: NamedRef,
    fields: Vec<(String, Value)>,
    cached: OnceLock<Ref>,
}

/// An instance of a named struct type.
///
/// The type reference must name a concrete package; the "current package"
/// placeholder only makes sense inside a package definition.
#[derive(Clone)]
pub struct StructValue {
    inner: Arc<StructInner>,
}

impl StructValue {
    pub fn new<N, I>(type_ref: NamedRef, fields: I) -> ValueResult<Self>
    where
        N: Into<String>,
        I: IntoIterator<Item = (N, Value)>,
    {
        if type_ref.is_local() {
            return Err(ValueError::PlaceholderOutsidePackage {
                name: type_ref.name().to_string(),
            });
        }
        let mut fields: Vec<(String, Value)> =
            fields.into_iter().map(|(n, v)| (n.into(), v)).collect();
        fields.sort_by(|a, b| a.0.cmp(&b.0));
        if let Some(pair) = fields.windows(2).find(|w| w[0].0 == w[1].0) {
            return Err(ValueError::DuplicateField {
                struct_name: type_ref.name().to_string(),
                field: pair[0].0.clone(),
            });
        }
        Ok(Self::from_sorted(type_ref, fields))
    }

    fn from_sorted(type_ref: NamedRef, fields: Vec<(String, Value)>) -> Self {
        Self {
            inner: Arc::new(StructInner {
                type_ref,
                fields,
                cached: OnceLock::new(),
            }),
        }
    }

    pub fn name(&self) -> &str {
        self.inner.type_ref.name()
    }

    pub fn type_ref(&self) -> &NamedRef {
        &self.inner.type_ref
    }

    /// The package defining this struct's type.
    pub fn package_ref(&self) -> ValueResult<Ref> {
        self.inner.type_ref.package_in(None)
    }

    fn position(&self, field: &str) -> Result<usize, usize> {
        self.inner
            .fields
            .binary_search_by(|(name, _)| name.as_str().cmp(field))
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.position(field).ok().map(|i| &self.inner.fields[i].1)
    }

    pub fn has(&self, field: &str) -> bool {
        self.position(field).is_ok()
    }

    /// A copy of this struct with `field` set to `value`.
    pub fn set(&self, field: impl Into<String>, value: impl Into<Value>) -> Self {
        let field = field.into();
        let mut fields = self.inner.fields.clone();
        match self.position(&field) {
            Ok(i) => fields[i].1 = value.into(),
            Err(i) => fields.insert(i, (field, value.into())),
        }
        Self::from_sorted(self.inner.type_ref.clone(), fields)
    }

    /// A copy of this struct without `field`.
    pub fn remove(&self, field: &str) -> Self {
        match self.position(field) {
            Ok(i) => {
                let mut fields = self.inner.fields.clone();
                fields.remove(i);
                Self::from_sorted(self.inner.type_ref.clone(), fields)
            }
            Err(_) => self.clone(),
        }
    }

    pub fn fields(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.inner.fields.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.inner.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.fields.is_empty()
    }

    pub fn value_ref(&self) -> Ref {
        *self.inner.cached.get_or_init(|| {
            let mut enc = Encoder::new(RefHasher::VALUE);
            enc.tag(tag::STRUCT);
            self.inner.type_ref.encode(&mut enc);
            enc.count(self.inner.fields.len());
            for (name, value) in &self.inner.fields {
                enc.str(name).reference(&value.value_ref());
            }
            enc.finish()
        })
    }
}

impl PartialEq for StructValue {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner) || self.value_ref() == other.value_ref()
    }
}

impl Eq for StructValue {}

impl fmt::Debug for StructValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut d = f.debug_struct(self.name());
        for (name, value) in self.fields() {
            d.field(name, value);
        }
        d.finish()
    }
}
