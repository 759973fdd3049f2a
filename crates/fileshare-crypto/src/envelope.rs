//! Per-file symmetric envelope (C5): FEK/MEK generation, file and metadata
//! encryption, and the hybrid file signature that binds a file's ciphertext
//! to its uploader's identity.

use crate::hashing::sha256_hex;
use crate::keys::{PrivateKeyBundle, PublicKeyBundle};
use crate::symmetric::{self, Iv, SymmetricKey};
use crate::{CryptoError, Result};
use serde::{Deserialize, Serialize};

/// The four secrets that let the owner (or a recipient, once unwrapped)
/// decrypt a single file: independent keys for content and metadata, each
/// with its own IV.
#[derive(Clone)]
pub struct Envelope {
    pub fek: SymmetricKey,
    pub mek: SymmetricKey,
    pub file_nonce: Iv,
    pub metadata_nonce: Iv,
}

impl Envelope {
    pub fn generate() -> Self {
        Self {
            fek: SymmetricKey::generate(),
            mek: SymmetricKey::generate(),
            file_nonce: Iv::generate(),
            metadata_nonce: Iv::generate(),
        }
    }
}

/// Plaintext metadata carried inside the MEK-encrypted blob (§6).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct FileMetadata {
    pub filename: String,
    pub filesize: u64,
}

/// Output of `encrypt_file`: ciphertexts plus the envelope that produced them.
pub struct EncryptedFile {
    pub file_ct: Vec<u8>,
    pub metadata_ct: Vec<u8>,
    pub envelope: Envelope,
}

/// Result of `decrypt_file`.
pub struct DecryptedFile {
    pub plaintext: Vec<u8>,
    pub filename: String,
    pub filesize: u64,
}

/// Encrypt `plaintext` under a freshly generated envelope.
pub fn encrypt_file(plaintext: &[u8], filename: &str) -> Result<EncryptedFile> {
    let envelope = Envelope::generate();
    let file_ct = symmetric::encrypt(&envelope.fek, &envelope.file_nonce, plaintext)?;

    let metadata = FileMetadata {
        filename: filename.to_string(),
        filesize: plaintext.len() as u64,
    };
    let metadata_plain = serde_json::to_vec(&metadata)?;
    let metadata_ct = symmetric::encrypt(&envelope.mek, &envelope.metadata_nonce, &metadata_plain)?;

    Ok(EncryptedFile {
        file_ct,
        metadata_ct,
        envelope,
    })
}

/// Decrypt a file's ciphertexts under the given envelope.
pub fn decrypt_file(file_ct: &[u8], metadata_ct: &[u8], envelope: &Envelope) -> Result<DecryptedFile> {
    let plaintext = symmetric::decrypt(&envelope.fek, &envelope.file_nonce, file_ct)
        .map_err(|_| CryptoError::Decryption("file content decryption failed".into()))?;
    let metadata_plain = symmetric::decrypt(&envelope.mek, &envelope.metadata_nonce, metadata_ct)
        .map_err(|_| CryptoError::Decryption("metadata decryption failed".into()))?;

    let value: serde_json::Value = serde_json::from_slice(&metadata_plain)
        .map_err(|_| CryptoError::InvalidCiphertext("metadata is not valid JSON".into()))?;
    let filename = value
        .get("filename")
        .and_then(|v| v.as_str())
        .ok_or(CryptoError::MetadataMissingField("filename"))?
        .to_string();
    let filesize = value
        .get("filesize")
        .and_then(|v| v.as_u64())
        .ok_or(CryptoError::MetadataMissingField("filesize"))?;

    Ok(DecryptedFile {
        plaintext,
        filename,
        filesize,
    })
}

/// Build the canonical byte sequence signed for every uploaded file (§4.1):
/// `username|lower_hex(sha256(file_ct))|lower_hex(sha256(metadata_ct))`.
pub fn build_file_sig_input(username: &str, file_ct: &[u8], metadata_ct: &[u8]) -> Vec<u8> {
    format!(
        "{username}|{}|{}",
        sha256_hex(file_ct),
        sha256_hex(metadata_ct)
    )
    .into_bytes()
}

/// Dual signature over a file-signature input: Ed25519 then ML-DSA-87.
pub struct FileSignature {
    pub pre_quantum: Vec<u8>,
    pub post_quantum: Vec<u8>,
}

/// Sign the file-signature input for `username` over the given ciphertexts.
pub fn sign_file(identity: &PrivateKeyBundle, username: &str, file_ct: &[u8], metadata_ct: &[u8]) -> Result<FileSignature> {
    let sig_input = build_file_sig_input(username, file_ct, metadata_ct);
    Ok(FileSignature {
        pre_quantum: identity.sign_ed25519(&sig_input)?.to_vec(),
        post_quantum: identity.sign_ml_dsa_87(&sig_input),
    })
}

/// Verify both halves of a file signature. Both must pass.
pub fn verify_file_signature(
    owner_bundle: &PublicKeyBundle,
    username: &str,
    file_ct: &[u8],
    metadata_ct: &[u8],
    pre_quantum_signature: &[u8],
    post_quantum_signature: &[u8],
) -> Result<()> {
    let sig_input = build_file_sig_input(username, file_ct, metadata_ct);
    owner_bundle.verify_ed25519(&sig_input, pre_quantum_signature)?;
    owner_bundle.verify_ml_dsa_87(&sig_input, post_quantum_signature)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trip() {
        let plaintext = b"hello world";
        let encrypted = encrypt_file(plaintext, "h.txt").unwrap();
        let decrypted = decrypt_file(&encrypted.file_ct, &encrypted.metadata_ct, &encrypted.envelope).unwrap();
        assert_eq!(decrypted.plaintext, plaintext);
        assert_eq!(decrypted.filename, "h.txt");
        assert_eq!(decrypted.filesize, plaintext.len() as u64);
    }

    #[test]
    fn envelope_independence() {
        let a = encrypt_file(b"same bytes", "f.txt").unwrap();
        let b = encrypt_file(b"same bytes", "f.txt").unwrap();
        assert_ne!(a.envelope.fek.as_bytes(), b.envelope.fek.as_bytes());
        assert_ne!(a.envelope.mek.as_bytes(), b.envelope.mek.as_bytes());
        assert_ne!(a.file_ct, b.file_ct);
    }

    #[test]
    fn decrypt_fails_with_wrong_envelope() {
        let encrypted = encrypt_file(b"hello", "h.txt").unwrap();
        let wrong = Envelope::generate();
        // Wrong keys don't error on the CTR layer, but the corrupted metadata
        // plaintext fails JSON parsing, which decrypt_file surfaces as an error.
        let result = decrypt_file(&encrypted.file_ct, &encrypted.metadata_ct, &wrong);
        assert!(result.is_err());
    }

    #[test]
    fn sig_input_matches_spec_shape() {
        let input = build_file_sig_input("alice", b"filebytes", b"metabytes");
        let text = String::from_utf8(input).unwrap();
        let parts: Vec<&str> = text.split('|').collect();
        assert_eq!(parts.len(), 3);
        assert_eq!(parts[0], "alice");
        assert_eq!(parts[1].len(), 64);
        assert_eq!(parts[2].len(), 64);
    }

    #[test]
    fn file_signature_verifies_against_owner_key() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let encrypted = encrypt_file(b"payload", "p.bin").unwrap();
        let sig = sign_file(&identity, "alice", &encrypted.file_ct, &encrypted.metadata_ct).unwrap();
        verify_file_signature(
            &bundle,
            "alice",
            &encrypted.file_ct,
            &encrypted.metadata_ct,
            &sig.pre_quantum,
            &sig.post_quantum,
        )
        .unwrap();
    }

    #[test]
    fn file_signature_rejects_wrong_signer() {
        let identity = PrivateKeyBundle::generate();
        let impostor = PrivateKeyBundle::generate();
        let encrypted = encrypt_file(b"payload", "p.bin").unwrap();
        let sig = sign_file(&identity, "alice", &encrypted.file_ct, &encrypted.metadata_ct).unwrap();
        let result = verify_file_signature(
            &impostor.public_bundle(),
            "alice",
            &encrypted.file_ct,
            &encrypted.metadata_ct,
            &sig.pre_quantum,
            &sig.post_quantum,
        );
        assert!(result.is_err());
    }

    #[test]
    fn tamper_detection_on_stored_ciphertext() {
        let identity = PrivateKeyBundle::generate();
        let encrypted = encrypt_file(b"payload", "p.bin").unwrap();
        let sig = sign_file(&identity, "alice", &encrypted.file_ct, &encrypted.metadata_ct).unwrap();

        let mut tampered_file_ct = encrypted.file_ct.clone();
        tampered_file_ct[0] ^= 0xFF;

        let result = verify_file_signature(
            &identity.public_bundle(),
            "alice",
            &tampered_file_ct,
            &encrypted.metadata_ct,
            &sig.pre_quantum,
            &sig.post_quantum,
        );
        assert!(result.is_err());
    }
}
