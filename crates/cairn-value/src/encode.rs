//! Canonical encoding fed straight into a domain-separated hasher.
//!
//! Every object is encoded as a one-byte tag followed by a tag-specific
//! payload. Integers are fixed-width little-endian, strings and byte runs
//! are length-prefixed, and children are referenced by their [`Ref`], so a
//! collection's encoding is the same no matter how its tree is shaped.

use cairn_ref::{Ref, RefHasher};

pub(crate) mod tag {
    pub const BOOL: u8 = 0x01;
    pub const UINT8: u8 = 0x02;
    pub const UINT16: u8 = 0x03;
    pub const UINT32: u8 = 0x04;
    pub const UINT64: u8 = 0x05;
    pub const INT8: u8 = 0x06;
    pub const INT16: u8 = 0x07;
    pub const INT32: u8 = 0x08;
    pub const INT64: u8 = 0x09;
    pub const FLOAT32: u8 = 0x0a;
    pub const FLOAT64: u8 = 0x0b;
    pub const STRING: u8 = 0x10;
    pub const LIST: u8 = 0x20;
    pub const MAP: u8 = 0x21;
    pub const SET: u8 = 0x22;
    pub const STRUCT: u8 = 0x30;
    pub const TYPE: u8 = 0x40;
    pub const PACKAGE: u8 = 0x41;

    pub const DESC_PRIMITIVE: u8 = 0x01;
    pub const DESC_COMPOUND: u8 = 0x02;
    pub const DESC_STRUCT: u8 = 0x03;
    pub const DESC_UNION: u8 = 0x04;
    pub const DESC_NAMED: u8 = 0x05;

    pub const SLOT_CURRENT: u8 = 0x00;
    pub const SLOT_PACKAGE: u8 = 0x01;
}

/// Streaming canonical encoder.
pub(crate) struct Encoder {
    hasher: blake3::Hasher,
}

impl Encoder {
    pub(crate) fn new(domain: RefHasher) -> Self {
        Self {
            hasher: domain.begin(),
        }
    }

    pub(crate) fn tag(&mut self, tag: u8) -> &mut Self {
        self.hasher.update(&[tag]);
        self
    }

    pub(crate) fn raw(&mut self, bytes: &[u8]) -> &mut Self {
        self.hasher.update(bytes);
        self
    }

    pub(crate) fn count(&mut self, n: usize) -> &mut Self {
        self.hasher.update(&(n as u64).to_le_bytes());
        self
    }

    pub(crate) fn str(&mut self, s: &str) -> &mut Self {
        self.count(s.len());
        self.hasher.update(s.as_bytes());
        self
    }

    pub(crate) fn reference(&mut self, r: &Ref) -> &mut Self {
        self.hasher.update(r.as_bytes());
        self
    }

    pub(crate) fn finish(&self) -> Ref {
        RefHasher::finish(&self.hasher)
    }
}
