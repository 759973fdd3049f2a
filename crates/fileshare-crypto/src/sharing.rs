//! Share-key wrapper (C7): wraps a file's FEK/MEK for a recipient using an
//! ephemeral X25519 key exchange. The raw ECDH output is used directly as
//! the AES-256 key — no HKDF, per spec: trust in the scheme rests on the
//! hybrid signatures checked at download time, not on key separation here.

use crate::envelope::Envelope;
use crate::keys::{PrivateKeyBundle, X25519_PUBLIC_LEN};
use crate::symmetric::{self, Iv, SymmetricKey};
use crate::Result;
use rand::rngs::OsRng;
use rand::RngCore;

/// Everything the server needs to persist (and a recipient needs to unwrap)
/// a single share of a single file, per §4.3 step 6.
pub struct ShareKeyWrap {
    pub encrypted_fek: Vec<u8>,
    pub encrypted_fek_nonce: Iv,
    pub encrypted_mek: Vec<u8>,
    pub encrypted_mek_nonce: Iv,
    pub ephemeral_public_key: [u8; X25519_PUBLIC_LEN],
}

/// Owner side: wrap `envelope`'s FEK/MEK for `recipient_x25519_pub`.
///
/// Generates a fresh ephemeral X25519 keypair per call, so repeated shares
/// of the same file to the same recipient never reuse a wrap key.
pub fn wrap_for_recipient(envelope: &Envelope, recipient_x25519_pub: &[u8; X25519_PUBLIC_LEN]) -> Result<ShareKeyWrap> {
    let mut ephemeral_priv = [0u8; 32];
    OsRng.fill_bytes(&mut ephemeral_priv);
    let ephemeral_secret = x25519_dalek::StaticSecret::from(ephemeral_priv);
    let ephemeral_public_key = *x25519_dalek::PublicKey::from(&ephemeral_secret).as_bytes();

    let recipient_pub = x25519_dalek::PublicKey::from(*recipient_x25519_pub);
    let shared = *ephemeral_secret.diffie_hellman(&recipient_pub).as_bytes();
    let shared_key = SymmetricKey::from_bytes(&shared)?;

    let fek_nonce = Iv::generate();
    let mek_nonce = Iv::generate();
    let encrypted_fek = symmetric::encrypt(&shared_key, &fek_nonce, envelope.fek.as_bytes())?;
    let encrypted_mek = symmetric::encrypt(&shared_key, &mek_nonce, envelope.mek.as_bytes())?;

    Ok(ShareKeyWrap {
        encrypted_fek,
        encrypted_fek_nonce: fek_nonce,
        encrypted_mek,
        encrypted_mek_nonce: mek_nonce,
        ephemeral_public_key,
    })
}

/// Recipient side: recover `(FEK, MEK)` from a persisted shared-access row.
pub fn unwrap_for_recipient(
    identity: &PrivateKeyBundle,
    ephemeral_public_key: &[u8; X25519_PUBLIC_LEN],
    encrypted_fek: &[u8],
    encrypted_fek_nonce: &Iv,
    encrypted_mek: &[u8],
    encrypted_mek_nonce: &Iv,
) -> Result<(SymmetricKey, SymmetricKey)> {
    let shared = identity.diffie_hellman(ephemeral_public_key);
    let shared_key = SymmetricKey::from_bytes(&shared)?;

    let fek_bytes = symmetric::decrypt(&shared_key, encrypted_fek_nonce, encrypted_fek)?;
    let mek_bytes = symmetric::decrypt(&shared_key, encrypted_mek_nonce, encrypted_mek)?;

    Ok((
        SymmetricKey::from_bytes(&fek_bytes)?,
        SymmetricKey::from_bytes(&mek_bytes)?,
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::envelope::{decrypt_file, encrypt_file};

    #[test]
    fn recipient_recovers_original_fek_and_mek() {
        let owner_identity = PrivateKeyBundle::generate();
        let recipient_identity = PrivateKeyBundle::generate();

        let encrypted = encrypt_file(b"secret contents", "s.txt").unwrap();
        let wrap = wrap_for_recipient(&encrypted.envelope, &recipient_identity.public_bundle().x25519_pub).unwrap();

        let (fek, mek) = unwrap_for_recipient(
            &recipient_identity,
            &wrap.ephemeral_public_key,
            &wrap.encrypted_fek,
            &wrap.encrypted_fek_nonce,
            &wrap.encrypted_mek,
            &wrap.encrypted_mek_nonce,
        )
        .unwrap();

        assert_eq!(fek.as_bytes(), encrypted.envelope.fek.as_bytes());
        assert_eq!(mek.as_bytes(), encrypted.envelope.mek.as_bytes());

        let recovered_envelope = Envelope {
            fek,
            mek,
            file_nonce: encrypted.envelope.file_nonce,
            metadata_nonce: encrypted.envelope.metadata_nonce,
        };
        let decrypted = decrypt_file(&encrypted.file_ct, &encrypted.metadata_ct, &recovered_envelope).unwrap();
        assert_eq!(decrypted.plaintext, b"secret contents");
        let _ = owner_identity;
    }

    #[test]
    fn wrong_recipient_cannot_unwrap() {
        let recipient_identity = PrivateKeyBundle::generate();
        let attacker_identity = PrivateKeyBundle::generate();

        let encrypted = encrypt_file(b"secret", "s.txt").unwrap();
        let wrap = wrap_for_recipient(&encrypted.envelope, &recipient_identity.public_bundle().x25519_pub).unwrap();

        let (fek, _mek) = unwrap_for_recipient(
            &attacker_identity,
            &wrap.ephemeral_public_key,
            &wrap.encrypted_fek,
            &wrap.encrypted_fek_nonce,
            &wrap.encrypted_mek,
            &wrap.encrypted_mek_nonce,
        )
        .unwrap();

        assert_ne!(fek.as_bytes(), encrypted.envelope.fek.as_bytes());
    }

    #[test]
    fn repeated_shares_use_distinct_ephemeral_keys() {
        let recipient_identity = PrivateKeyBundle::generate();
        let encrypted = encrypt_file(b"secret", "s.txt").unwrap();

        let wrap1 = wrap_for_recipient(&encrypted.envelope, &recipient_identity.public_bundle().x25519_pub).unwrap();
        let wrap2 = wrap_for_recipient(&encrypted.envelope, &recipient_identity.public_bundle().x25519_pub).unwrap();

        assert_ne!(wrap1.ephemeral_public_key, wrap2.ephemeral_public_key);
        assert_ne!(wrap1.encrypted_fek, wrap2.encrypted_fek);
    }
}
