use crate::object::ObjectId;

/// Domain-separated BLAKE3 content hasher.
///
/// Each hasher carries a domain tag that is prepended to every hash
/// computation, so a chunk and a tree with identical serialized bytes still
/// get distinct object IDs.
pub struct ContentHasher {
    domain: &'static str,
}

impl ContentHasher {
    /// Hasher for chunk (leaf blob) objects.
    pub const CHUNK: Self = Self {
        domain: "strata-chunk-v1",
    };
    /// Hasher for tree node objects.
    pub const TREE: Self = Self {
        domain: "strata-tree-v1",
    };
    /// Hasher for commit objects.
    pub const COMMIT: Self = Self {
        domain: "strata-commit-v1",
    };

    /// Create a hasher with a custom domain tag.
    pub const fn new(domain: &'static str) -> Self {
        Self { domain }
    }

    /// Hash raw bytes with domain separation.
    pub fn hash(&self, data: &[u8]) -> ObjectId {
        let mut hasher = blake3::Hasher::new();
        hasher.update(self.domain.as_bytes());
        hasher.update(b":");
        hasher.update(data);
        ObjectId::from_hash(*hasher.finalize().as_bytes())
    }

    /// Verify that data produces the expected object ID.
    pub fn verify(&self, data: &[u8], expected: &ObjectId) -> bool {
        self.hash(data) == *expected
    }

    /// The domain tag used by this hasher.
    pub fn domain(&self) -> &str {
        self.domain
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let data = b"hello world";
        assert_eq!(ContentHasher::CHUNK.hash(data), ContentHasher::CHUNK.hash(data));
    }

    #[test]
    fn different_domains_produce_different_hashes() {
        let data = b"same content";
        let chunk = ContentHasher::CHUNK.hash(data);
        let tree = ContentHasher::TREE.hash(data);
        let commit = ContentHasher::COMMIT.hash(data);
        assert_ne!(chunk, tree);
        assert_ne!(chunk, commit);
        assert_ne!(tree, commit);
    }

    #[test]
    fn verify_accepts_matching_data() {
        let data = b"test data";
        let id = ContentHasher::CHUNK.hash(data);
        assert!(ContentHasher::CHUNK.verify(data, &id));
        assert!(!ContentHasher::CHUNK.verify(b"other data", &id));
    }
}
