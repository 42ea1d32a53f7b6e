use crate::reference::Ref;

/// Domain-separated BLAKE3 hasher producing [`Ref`]s.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a value and a type descriptor with identical encodings
/// still get different refs.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RefHasher {
    domain: &'static str,
}

impl RefHasher {
    /// Hasher for values (primitives, strings, collections, structs).
    pub const VALUE: Self = Self {
        domain: "cairn-value-v1",
    };
    /// Hasher for type descriptors.
    pub const TYPE: Self = Self {
        domain: "cairn-type-v1",
    };
    /// Hasher for packages of named type descriptors.
    pub const PACKAGE: Self = Self {
        domain: "cairn-package-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> Ref {
        let mut hasher = self.begin();
        hasher.update(data);
        Self::finish(&hasher)
    }

    /// Start a streaming hash already seeded with this domain.
    ///
    /// Feed the canonical encoding with `update` and close it with
    /// [`RefHasher::finish`].
    pub fn begin(&self) -> blake3::Hasher {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher
    }

    /// Finalize a streaming hash started with [`RefHasher::begin`].
    pub fn finish(hasher: &blake3::Hasher) -> Ref {
        Ref::from_digest(*hasher.finalize().as_bytes())
    }

    /// Verify that data hashes to the expected ref.
    pub fn verify(&self, data: &[u8], expected: &Ref) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}
