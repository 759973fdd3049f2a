//! # fileshare-crypto
//!
//! Cryptographic primitives for the end-to-end encrypted file sharing
//! service.
//!
//! - **Symmetric envelope**: AES-256-CTR with a 16-byte IV, no AEAD tag.
//!   Integrity for file content comes from the hybrid signatures below, not
//!   from the cipher.
//! - **Hybrid signing**: every file is signed twice, once with Ed25519 and
//!   once with ML-DSA-87 (Dilithium5). Both must verify.
//! - **Share-key wrap**: an ephemeral X25519 exchange whose raw scalar-mult
//!   output is used directly as the AES-256 key that wraps a file's FEK/MEK
//!   for a recipient.
//!
//! This crate has no I/O and no async — it is the pure-function core
//! consumed by `fileshare-core`, `fileshare-server` and `fileshare-client`.

pub mod envelope;
pub mod error;
pub mod hashing;
pub mod keys;
pub mod sharing;
pub mod symmetric;

pub use envelope::{
    build_file_sig_input, decrypt_file, encrypt_file, sign_file, verify_file_signature,
    DecryptedFile, EncryptedFile, Envelope, FileMetadata, FileSignature,
};
pub use error::{CryptoError, Result};
pub use hashing::{sha256, sha256_hex, Sha256Hash};
pub use keys::{
    PrivateKeyBundle, PublicKeyBundle, ED25519_PUBLIC_LEN, ED25519_SECRET_LEN,
    ML_DSA_87_PUBLIC_LEN, ML_DSA_87_SECRET_LEN, ML_DSA_87_SIGNATURE_LEN, X25519_PUBLIC_LEN,
    X25519_SECRET_LEN,
};
pub use sharing::{unwrap_for_recipient, wrap_for_recipient, ShareKeyWrap};
pub use symmetric::{Iv, SymmetricKey, IV_SIZE, KEY_SIZE};
