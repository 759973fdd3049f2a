//! Symmetric encryption using AES-256-CTR
//!
//! CTR mode has no authentication tag: unlike the AEAD schemes used
//! elsewhere in this crate's ancestry, a `StreamCipher` here never fails to
//! decrypt, and never detects tampering on its own. Integrity for file
//! content is provided one layer up, by the hybrid Ed25519 / ML-DSA-87
//! signatures over the ciphertext hashes (see `crate::envelope`).

use crate::{CryptoError, Result};
use aes::Aes256;
use ctr::cipher::{KeyIvInit, StreamCipher as _};
use rand::RngCore;
use rand::rngs::OsRng;

/// Size of an AES-256 key in bytes.
pub const KEY_SIZE: usize = 32;

/// Size of the CTR-mode IV in bytes, per the envelope's 16-byte nonce fields.
pub const IV_SIZE: usize = 16;

type Aes256Ctr = ctr::Ctr128BE<Aes256>;

/// A 16-byte IV used as the CTR-mode counter seed.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Iv([u8; IV_SIZE]);

impl Iv {
    /// Generate a fresh random IV.
    pub fn generate() -> Self {
        let mut bytes = [0u8; IV_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != IV_SIZE {
            return Err(CryptoError::InvalidNonce(format!(
                "IV must be {IV_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; IV_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; IV_SIZE] {
        &self.0
    }
}

/// A 32-byte AES-256 key (FEK, MEK, or a raw ECDH shared-secret reused as a key).
#[derive(Clone)]
pub struct SymmetricKey([u8; KEY_SIZE]);

impl SymmetricKey {
    pub fn generate() -> Self {
        let mut bytes = [0u8; KEY_SIZE];
        OsRng.fill_bytes(&mut bytes);
        Self(bytes)
    }

    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        if bytes.len() != KEY_SIZE {
            return Err(CryptoError::InvalidKey(format!(
                "symmetric key must be {KEY_SIZE} bytes, got {}",
                bytes.len()
            )));
        }
        let mut arr = [0u8; KEY_SIZE];
        arr.copy_from_slice(bytes);
        Ok(Self(arr))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_SIZE] {
        &self.0
    }
}

/// Encrypt or decrypt a buffer under AES-256-CTR. Encryption and decryption
/// are the same operation: applying the keystream twice with the same
/// (key, iv) recovers the original bytes.
pub fn apply_keystream(key: &SymmetricKey, iv: &Iv, data: &[u8]) -> Result<Vec<u8>> {
    let mut buf = data.to_vec();
    let mut cipher = Aes256Ctr::new_from_slices(&key.0, &iv.0)
        .map_err(|e| CryptoError::InvalidKey(e.to_string()))?;
    cipher.apply_keystream(&mut buf);
    Ok(buf)
}

/// `AES-256-CTR(key, iv, plaintext)`.
pub fn encrypt(key: &SymmetricKey, iv: &Iv, plaintext: &[u8]) -> Result<Vec<u8>> {
    apply_keystream(key, iv, plaintext)
}

/// `AES-256-CTR(key, iv, ciphertext)`; CTR mode is its own inverse.
pub fn decrypt(key: &SymmetricKey, iv: &Iv, ciphertext: &[u8]) -> Result<Vec<u8>> {
    apply_keystream(key, iv, ciphertext)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip() {
        let key = SymmetricKey::generate();
        let iv = Iv::generate();
        let plaintext = b"the quick brown fox";

        let ct = encrypt(&key, &iv, plaintext).unwrap();
        let pt = decrypt(&key, &iv, &ct).unwrap();
        assert_eq!(pt, plaintext);
    }

    #[test]
    fn ciphertext_length_equals_plaintext_length() {
        let key = SymmetricKey::generate();
        let iv = Iv::generate();
        let plaintext = vec![7u8; 12345];
        let ct = encrypt(&key, &iv, &plaintext).unwrap();
        assert_eq!(ct.len(), plaintext.len());
    }

    #[test]
    fn wrong_key_does_not_recover_plaintext() {
        let key1 = SymmetricKey::generate();
        let key2 = SymmetricKey::generate();
        let iv = Iv::generate();
        let plaintext = b"secret payload";

        let ct = encrypt(&key1, &iv, plaintext).unwrap();
        let garbage = decrypt(&key2, &iv, &ct).unwrap();
        assert_ne!(garbage, plaintext);
    }

    #[test]
    fn wrong_iv_does_not_recover_plaintext() {
        let key = SymmetricKey::generate();
        let iv1 = Iv::generate();
        let iv2 = Iv::generate();
        let plaintext = b"secret payload";

        let ct = encrypt(&key, &iv1, plaintext).unwrap();
        let garbage = decrypt(&key, &iv2, &ct).unwrap();
        assert_ne!(garbage, plaintext);
    }

    #[test]
    fn bitflip_in_ciphertext_flips_same_bit_in_recovered_plaintext() {
        // CTR mode is malleable: no authentication is applied at this layer.
        let key = SymmetricKey::generate();
        let iv = Iv::generate();
        let plaintext = b"AAAAAAAAAAAAAAAA";

        let mut ct = encrypt(&key, &iv, plaintext).unwrap();
        ct[0] ^= 0x01;
        let pt = decrypt(&key, &iv, &ct).unwrap();
        assert_eq!(pt[0], plaintext[0] ^ 0x01);
        assert_eq!(&pt[1..], &plaintext[1..]);
    }

    #[test]
    fn empty_plaintext_roundtrips() {
        let key = SymmetricKey::generate();
        let iv = Iv::generate();
        let ct = encrypt(&key, &iv, b"").unwrap();
        assert!(ct.is_empty());
        assert_eq!(decrypt(&key, &iv, &ct).unwrap(), b"");
    }

    #[test]
    fn iv_generation_is_not_constant() {
        let a = Iv::generate();
        let b = Iv::generate();
        assert_ne!(a.as_bytes(), b.as_bytes());
    }

    #[test]
    fn rejects_wrong_length_key_and_iv() {
        assert!(SymmetricKey::from_bytes(&[0u8; 31]).is_err());
        assert!(Iv::from_bytes(&[0u8; 15]).is_err());
    }
}
