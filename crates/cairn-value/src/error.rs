//! Error types for value, type, and package operations.

use cairn_ref::Ref;

/// Errors that can occur when building, reading, or validating values.
#[derive(Debug, thiserror::Error)]
pub enum ValueError {
    /// A positional access fell outside the collection.
    #[error("index {index} out of bounds for length {len}")]
    OutOfBounds { index: usize, len: usize },

    /// A `[start, end)` range was reversed or extended past the end.
    #[error("invalid range {start}..{end} for length {len}")]
    InvalidRange { start: usize, end: usize, len: usize },

    /// A value was unwrapped or validated as the wrong variant or type.
    #[error("type mismatch: expected {expected}, found {found}")]
    TypeMismatch { expected: String, found: String },

    /// A named reference points at a type the package does not define.
    #[error("unknown type name {name:?}{}", package.map(|p| format!(" in package {p}")).unwrap_or_default())]
    UnknownTypeName { name: String, package: Option<Ref> },

    /// Resolving a name would require infinitely inlining its own definition.
    #[error("type {name:?} can only be expanded by inlining itself")]
    CycleViaInlineExpansion { name: String },

    /// A cross-package reference names a package that was never registered.
    #[error("package not found: {0}")]
    PackageNotFound(Ref),

    /// A "current package" placeholder escaped the package being built.
    #[error("placeholder reference to {name:?} used outside of a package")]
    PlaceholderOutsidePackage { name: String },

    /// The same type name was defined twice in one package.
    #[error("type {0:?} defined more than once")]
    DuplicateTypeName(String),

    /// A struct descriptor is defined under a name other than its own.
    #[error("struct {declared:?} defined under name {defined:?}")]
    StructNameMismatch { defined: String, declared: String },

    /// A struct descriptor declares the same field twice.
    #[error("struct {struct_name} declares field {field:?} more than once")]
    DuplicateField { struct_name: String, field: String },

    /// A struct value lacks a required field.
    #[error("struct {struct_name} is missing required field {field:?}")]
    MissingField { struct_name: String, field: String },

    /// A struct value carries a field its type does not declare.
    #[error("struct {struct_name} has no field {field:?}")]
    UnknownField { struct_name: String, field: String },

    /// A compound descriptor was built with the wrong number of element types.
    #[error("{kind} takes {expected} element type(s), got {actual}")]
    InvalidArity {
        kind: &'static str,
        expected: usize,
        actual: usize,
    },

    /// Collection configuration is unusable.
    #[error("invalid config: {0}")]
    InvalidConfig(String),

    /// Collection configuration could not be parsed.
    #[error("config parse error: {0}")]
    Config(#[from] toml::de::Error),
}

/// Result alias for value operations.
pub type ValueResult<T> = Result<T, ValueError>;

impl ValueError {
    pub(crate) fn mismatch(expected: impl Into<String>, found: impl Into<String>) -> Self {
        Self::TypeMismatch {
            expected: expected.into(),
            found: found.into(),
        }
    }
}
