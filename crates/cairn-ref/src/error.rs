use thiserror::Error;

/// Errors produced when decoding a [`Ref`](crate::Ref).
#[derive(Debug, Error, PartialEq, Eq)]
pub enum RefError {
    #[error("invalid hex string: {0}")]
    InvalidHex(String),

    #[error("invalid byte length: expected {expected}, got {actual}")]
    InvalidLength { expected: usize, actual: usize },
}
