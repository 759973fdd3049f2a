//! Hashing utilities using SHA-256
//!
//! Used to build the file-signature input (C2): ciphertexts are hashed with
//! SHA-256 and rendered as lowercase hex with no prefix before being folded
//! into the canonical signing string.

use sha2::{Digest, Sha256};
use std::fmt;

/// Size of a SHA-256 hash output in bytes.
pub const HASH_BYTE_SIZE: usize = 32;

/// Type alias for hash output bytes.
pub type HashOutput = [u8; HASH_BYTE_SIZE];

/// A SHA-256 hash wrapper with convenience methods.
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct Sha256Hash(HashOutput);

impl Sha256Hash {
    pub fn new(bytes: HashOutput) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &HashOutput {
        &self.0
    }

    /// Lowercase hex with no prefix, exactly the form the signing input uses.
    pub fn to_hex(&self) -> String {
        hex::encode(self.0)
    }
}

impl fmt::Debug for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Sha256Hash({})", self.to_hex())
    }
}

impl fmt::Display for Sha256Hash {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.to_hex())
    }
}

impl AsRef<[u8]> for Sha256Hash {
    fn as_ref(&self) -> &[u8] {
        &self.0
    }
}

/// Hash the given bytes with SHA-256.
pub fn sha256(data: &[u8]) -> Sha256Hash {
    let mut hasher = Sha256::new();
    hasher.update(data);
    Sha256Hash(hasher.finalize().into())
}

/// Convenience: SHA-256 of `data`, rendered as lowercase hex.
pub fn sha256_hex(data: &[u8]) -> String {
    sha256(data).to_hex()
}
