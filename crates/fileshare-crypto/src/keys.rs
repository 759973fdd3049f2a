//! Identity key material: X25519 (key agreement), Ed25519 (classical
//! signing) and ML-DSA-87 / Dilithium5 (post-quantum signing).
//!
//! A user has exactly one of each. The public halves travel over the wire
//! as a `PublicKeyBundle`; the private halves never leave the client and
//! are held in a `PrivateKeyBundle`.

use crate::{CryptoError, Result};
use base64::Engine;
use ed25519_dalek::{Signer as _, SigningKey, Verifier as _, VerifyingKey, Signature as Ed25519Signature};
use pqcrypto_mldsa::mldsa87;
use pqcrypto_traits::sign::{
    DetachedSignature as _, PublicKey as PqPublicKeyTrait, SecretKey as PqSecretKeyTrait,
};
use rand::rngs::OsRng;
use rand::RngCore;
use serde::{Deserialize, Serialize};
use zeroize::Zeroize;

pub const X25519_PUBLIC_LEN: usize = 32;
pub const X25519_SECRET_LEN: usize = 32;
pub const ED25519_PUBLIC_LEN: usize = 32;
/// "sk form": the 64-byte concatenation of the 32-byte seed and the 32-byte public key.
pub const ED25519_SECRET_LEN: usize = 64;
pub const ML_DSA_87_PUBLIC_LEN: usize = 2592;
pub const ML_DSA_87_SECRET_LEN: usize = 4896;
/// Approximate; ML-DSA-87 detached signatures are variable-length up to this bound.
pub const ML_DSA_87_SIGNATURE_LEN: usize = 4627;

fn b64_encode(bytes: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(bytes)
}

fn b64_decode(s: &str) -> Result<Vec<u8>> {
    Ok(base64::engine::general_purpose::STANDARD.decode(s)?)
}

/// A client's full identity: one keypair per signer plus the X25519
/// key-agreement pair, in their raw (non-DER) byte forms.
pub struct PrivateKeyBundle {
    pub x25519_priv: [u8; X25519_SECRET_LEN],
    pub x25519_pub: [u8; X25519_PUBLIC_LEN],
    pub ed25519_priv: [u8; ED25519_SECRET_LEN],
    pub ed25519_pub: [u8; ED25519_PUBLIC_LEN],
    pub ml_dsa_87_priv: mldsa87::SecretKey,
    pub ml_dsa_87_pub: mldsa87::PublicKey,
}

impl Drop for PrivateKeyBundle {
    fn drop(&mut self) {
        self.x25519_priv.zeroize();
        self.ed25519_priv.zeroize();
    }
}

impl PrivateKeyBundle {
    /// Generate a fresh identity: one X25519, one Ed25519 and one ML-DSA-87 keypair.
    pub fn generate() -> Self {
        let mut x25519_priv = [0u8; X25519_SECRET_LEN];
        OsRng.fill_bytes(&mut x25519_priv);
        let x25519_secret = x25519_dalek::StaticSecret::from(x25519_priv);
        let x25519_pub = *x25519_dalek::PublicKey::from(&x25519_secret).as_bytes();

        let ed25519_signing = SigningKey::generate(&mut OsRng);
        let ed25519_priv = ed25519_signing.to_keypair_bytes();
        let ed25519_pub = ed25519_signing.verifying_key().to_bytes();

        let (ml_dsa_87_pub, ml_dsa_87_priv) = mldsa87::keypair();

        Self {
            x25519_priv,
            x25519_pub,
            ed25519_priv,
            ed25519_pub,
            ml_dsa_87_priv,
            ml_dsa_87_pub,
        }
    }

    /// The public half of this identity, in the wire bundle shape (§6).
    pub fn public_bundle(&self) -> PublicKeyBundle {
        PublicKeyBundle {
            x25519_pub: self.x25519_pub,
            ed25519_pub: self.ed25519_pub,
            ml_dsa_87_pub: self.ml_dsa_87_pub.as_bytes().to_vec(),
        }
    }

    fn x25519_secret(&self) -> x25519_dalek::StaticSecret {
        x25519_dalek::StaticSecret::from(self.x25519_priv)
    }

    /// Raw X25519 scalar-mult output with `peer_pub` — used directly as an
    /// AES-256 key by the share-key wrapper (no KDF, per spec).
    pub fn diffie_hellman(&self, peer_pub: &[u8; X25519_PUBLIC_LEN]) -> [u8; 32] {
        let peer = x25519_dalek::PublicKey::from(*peer_pub);
        *self.x25519_secret().diffie_hellman(&peer).as_bytes()
    }

    fn ed25519_signing_key(&self) -> Result<SigningKey> {
        SigningKey::from_keypair_bytes(&self.ed25519_priv)
            .map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Ed25519 signature over `message`.
    pub fn sign_ed25519(&self, message: &[u8]) -> Result<[u8; 64]> {
        let signing_key = self.ed25519_signing_key()?;
        Ok(signing_key.sign(message).to_bytes())
    }

    /// ML-DSA-87 (Dilithium5) detached signature over `message`.
    pub fn sign_ml_dsa_87(&self, message: &[u8]) -> Vec<u8> {
        mldsa87::detached_sign(message, &self.ml_dsa_87_priv)
            .as_bytes()
            .to_vec()
    }
}

/// The public half of an identity, as transmitted and persisted (§6).
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PublicKeyBundle {
    pub x25519_pub: [u8; X25519_PUBLIC_LEN],
    pub ed25519_pub: [u8; ED25519_PUBLIC_LEN],
    pub ml_dsa_87_pub: Vec<u8>,
}

/// Wire shape of a key bundle: two sections, each field base64(raw public key).
#[derive(Serialize, Deserialize)]
struct PreQuantumSection {
    #[serde(rename = "identityKemPublicKey")]
    identity_kem_public_key: String,
    #[serde(rename = "identitySigningPublicKey")]
    identity_signing_public_key: String,
}

#[derive(Serialize, Deserialize)]
struct PostQuantumSection {
    #[serde(rename = "identitySigningPublicKey")]
    identity_signing_public_key: String,
}

#[derive(Serialize, Deserialize)]
struct KeyBundleWire {
    #[serde(rename = "preQuantum")]
    pre_quantum: PreQuantumSection,
    #[serde(rename = "postQuantum")]
    post_quantum: PostQuantumSection,
}

impl PublicKeyBundle {
    /// Serialize to the canonical JSON wire/persistence form (§6).
    pub fn to_json_bytes(&self) -> Result<Vec<u8>> {
        let wire = KeyBundleWire {
            pre_quantum: PreQuantumSection {
                identity_kem_public_key: b64_encode(&self.x25519_pub),
                identity_signing_public_key: b64_encode(&self.ed25519_pub),
            },
            post_quantum: PostQuantumSection {
                identity_signing_public_key: b64_encode(&self.ml_dsa_87_pub),
            },
        };
        Ok(serde_json::to_vec(&wire)?)
    }

    /// Parse the canonical JSON wire/persistence form (§6).
    pub fn from_json_bytes(bytes: &[u8]) -> Result<Self> {
        let wire: KeyBundleWire = serde_json::from_slice(bytes)?;
        let x25519_raw = b64_decode(&wire.pre_quantum.identity_kem_public_key)?;
        let ed25519_raw = b64_decode(&wire.pre_quantum.identity_signing_public_key)?;
        let ml_dsa_87_pub = b64_decode(&wire.post_quantum.identity_signing_public_key)?;

        if x25519_raw.len() != X25519_PUBLIC_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "x25519 public key must be {X25519_PUBLIC_LEN} bytes, got {}",
                x25519_raw.len()
            )));
        }
        if ed25519_raw.len() != ED25519_PUBLIC_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "ed25519 public key must be {ED25519_PUBLIC_LEN} bytes, got {}",
                ed25519_raw.len()
            )));
        }
        if ml_dsa_87_pub.len() != ML_DSA_87_PUBLIC_LEN {
            return Err(CryptoError::InvalidKey(format!(
                "ml-dsa-87 public key must be {ML_DSA_87_PUBLIC_LEN} bytes, got {}",
                ml_dsa_87_pub.len()
            )));
        }

        let mut x25519_pub = [0u8; X25519_PUBLIC_LEN];
        x25519_pub.copy_from_slice(&x25519_raw);
        let mut ed25519_pub = [0u8; ED25519_PUBLIC_LEN];
        ed25519_pub.copy_from_slice(&ed25519_raw);

        Ok(Self {
            x25519_pub,
            ed25519_pub,
            ml_dsa_87_pub,
        })
    }

    fn ed25519_verifying_key(&self) -> Result<VerifyingKey> {
        VerifyingKey::from_bytes(&self.ed25519_pub).map_err(|e| CryptoError::InvalidKey(e.to_string()))
    }

    /// Verify an Ed25519 signature produced by this identity's private key.
    pub fn verify_ed25519(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let sig_bytes: [u8; 64] = signature
            .try_into()
            .map_err(|_| CryptoError::InvalidCiphertext("ed25519 signature must be 64 bytes".into()))?;
        let verifying_key = self.ed25519_verifying_key()?;
        verifying_key
            .verify(message, &Ed25519Signature::from_bytes(&sig_bytes))
            .map_err(|_| CryptoError::SignatureVerification)
    }

    /// Verify an ML-DSA-87 detached signature produced by this identity's private key.
    pub fn verify_ml_dsa_87(&self, message: &[u8], signature: &[u8]) -> Result<()> {
        let pk = mldsa87::PublicKey::from_bytes(&self.ml_dsa_87_pub)
            .map_err(|_| CryptoError::InvalidKey("malformed ml-dsa-87 public key".into()))?;
        let sig = mldsa87::DetachedSignature::from_bytes(signature)
            .map_err(|_| CryptoError::InvalidCiphertext("malformed ml-dsa-87 signature".into()))?;
        mldsa87::verify_detached_signature(&sig, message, &pk)
            .map_err(|_| CryptoError::SignatureVerification)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn generated_identities_are_distinct() {
        let a = PrivateKeyBundle::generate();
        let b = PrivateKeyBundle::generate();
        assert_ne!(a.x25519_pub, b.x25519_pub);
        assert_ne!(a.ed25519_pub, b.ed25519_pub);
    }

    #[test]
    fn public_bundle_json_roundtrip() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let json = bundle.to_json_bytes().unwrap();
        let parsed = PublicKeyBundle::from_json_bytes(&json).unwrap();
        assert_eq!(bundle, parsed);
    }

    #[test]
    fn public_bundle_json_shape_matches_wire_contract() {
        let identity = PrivateKeyBundle::generate();
        let json = identity.public_bundle().to_json_bytes().unwrap();
        let value: serde_json::Value = serde_json::from_slice(&json).unwrap();
        assert!(value["preQuantum"]["identityKemPublicKey"].is_string());
        assert!(value["preQuantum"]["identitySigningPublicKey"].is_string());
        assert!(value["postQuantum"]["identitySigningPublicKey"].is_string());
    }

    #[test]
    fn ed25519_sign_and_verify_roundtrip() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let sig = identity.sign_ed25519(b"hello").unwrap();
        bundle.verify_ed25519(b"hello", &sig).unwrap();
    }

    #[test]
    fn ed25519_verify_rejects_wrong_key() {
        let identity = PrivateKeyBundle::generate();
        let other = PrivateKeyBundle::generate();
        let sig = identity.sign_ed25519(b"hello").unwrap();
        assert!(other.public_bundle().verify_ed25519(b"hello", &sig).is_err());
    }

    #[test]
    fn ml_dsa_87_sign_and_verify_roundtrip() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let sig = identity.sign_ml_dsa_87(b"hello");
        bundle.verify_ml_dsa_87(b"hello", &sig).unwrap();
    }

    #[test]
    fn ml_dsa_87_verify_rejects_tampered_message() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let sig = identity.sign_ml_dsa_87(b"hello");
        assert!(bundle.verify_ml_dsa_87(b"goodbye", &sig).is_err());
    }

    #[test]
    fn key_lengths_match_spec() {
        let identity = PrivateKeyBundle::generate();
        assert_eq!(identity.x25519_pub.len(), X25519_PUBLIC_LEN);
        assert_eq!(identity.ed25519_priv.len(), ED25519_SECRET_LEN);
        assert_eq!(identity.ml_dsa_87_pub.as_bytes().len(), ML_DSA_87_PUBLIC_LEN);
        assert_eq!(identity.ml_dsa_87_priv.as_bytes().len(), ML_DSA_87_SECRET_LEN);
    }

    #[test]
    fn diffie_hellman_is_symmetric() {
        let alice = PrivateKeyBundle::generate();
        let bob = PrivateKeyBundle::generate();
        let shared_a = alice.diffie_hellman(&bob.public_bundle().x25519_pub);
        let shared_b = bob.diffie_hellman(&alice.public_bundle().x25519_pub);
        assert_eq!(shared_a, shared_b);
    }
}
