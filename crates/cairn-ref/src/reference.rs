use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RefError;

/// Number of bytes in a [`Ref`].
pub const REF_LEN: usize = 32;

/// Content-addressed identifier for any value, type, or package.
///
/// A `Ref` is the BLAKE3 hash of an object's canonical encoding. Two objects
/// with the same structural content always produce the same `Ref`, no matter
/// how they were constructed.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Ref([u8; REF_LEN]);

impl Ref {
    /// Create a `Ref` from a pre-computed digest.
    pub const fn from_digest(digest: [u8; REF_LEN]) -> Self {
        Self(digest)
    }

    /// The empty ref (all zeros). Never produced by hashing; represents
    /// "no object".
    pub const fn empty() -> Self {
        Self([0u8; REF_LEN])
    }

    /// Returns `true` if this is the empty ref.
    pub fn is_empty(&self) -> bool {
        self.0 == [0u8; REF_LEN]
    }

    /// The raw digest bytes.
    pub fn as_bytes(&self) -> &[u8; REF_LEN] {
        &self.0
    }

    /// Hex-encoded string representation.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }

    /// Short hex representation (first 8 characters), for logs.
    pub fn short_hex(&self) -> String {
        hex::encode(&self.0[..4])
    }

    /// Parse from a full-length hex string.
    pub fn from_hex(s: &str) -> Result<Self, RefError> {
        let bytes = hex::decode(s).map_err(|e| RefError::InvalidHex(e.to_string()))?;
        if bytes.len() != REF_LEN {
            return Err(RefError::InvalidLength {
                expected: REF_LEN,
                actual: bytes.len(),
            });
        }
        let mut arr = [0u8; REF_LEN];
        arr.copy_from_slice(&bytes);
        Ok(Self(arr))
    }
}

impl Default for Ref {
    fn default() -> Self {
        Self::empty()
    }
}

impl fmt::Debug for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Ref({})", self.short_hex())
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl FromStr for Ref {
    type Err = RefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl From<[u8; REF_LEN]> for Ref {
    fn from(bytes: [u8; REF_LEN]) -> Self {
        Self(bytes)
    }
}

impl From<Ref> for [u8; REF_LEN] {
    fn from(r: Ref) -> Self {
        r.0
    }
}

impl Serialize for Ref {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> Deserialize<'de> for Ref {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}
