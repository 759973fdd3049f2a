//! Canonical request string construction and the hybrid dual-signature
//! scheme (C6) used to authenticate every protected API call.

use crate::error::{AuthError, Result};
use base64::Engine;
use chrono::{DateTime, SecondsFormat, Utc};
use fileshare_crypto::{PrivateKeyBundle, PublicKeyBundle};

/// Replay window, in seconds, enforced by `verify_request`.
pub const REPLAY_WINDOW_SECONDS: i64 = 60;

/// `username|timestamp|METHOD|path|body_text`, byte-exact.
///
/// `body` must be the exact bytes transmitted on the wire: the signer
/// serializes its JSON body once and reuses that buffer both to build this
/// string and to send over HTTP, so the server can reconstruct the same
/// string from the verbatim request body without reformatting it.
pub fn canonical_string(username: &str, timestamp: &str, method: &str, path: &str, body: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(username.len() + timestamp.len() + method.len() + path.len() + body.len() + 4);
    out.extend_from_slice(username.as_bytes());
    out.push(b'|');
    out.extend_from_slice(timestamp.as_bytes());
    out.push(b'|');
    out.extend_from_slice(method.as_bytes());
    out.push(b'|');
    out.extend_from_slice(path.as_bytes());
    out.push(b'|');
    out.extend_from_slice(body);
    out
}

/// ISO-8601 UTC, millisecond precision, `Z` suffix — e.g. `2026-07-28T12:34:56.789Z`.
pub fn format_timestamp(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn parse_timestamp(raw: &str) -> Result<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| AuthError::MalformedTimestamp(e.to_string()))
}

/// `base64(ed25519_sig) || base64(ml_dsa87_sig)`.
pub fn pack_signature(pre_quantum: &[u8], post_quantum: &[u8]) -> String {
    let engine = base64::engine::general_purpose::STANDARD;
    format!("{}||{}", engine.encode(pre_quantum), engine.encode(post_quantum))
}

/// Split `header` on the first `||` and base64-decode both halves.
pub fn unpack_signature(header: &str) -> Result<(Vec<u8>, Vec<u8>)> {
    let (pre, post) = header.split_once("||").ok_or(AuthError::MalformedSignature)?;
    if pre.is_empty() || post.is_empty() {
        return Err(AuthError::MalformedSignature);
    }
    let engine = base64::engine::general_purpose::STANDARD;
    let pre_bytes = engine.decode(pre).map_err(|_| AuthError::MalformedSignature)?;
    let post_bytes = engine.decode(post).map_err(|_| AuthError::MalformedSignature)?;
    Ok((pre_bytes, post_bytes))
}

/// The three headers a signed request carries.
pub struct SignedRequestHeaders {
    pub x_username: String,
    pub x_timestamp: String,
    pub x_signature: String,
}

/// Client side: build the three headers for a request signed as `username`
/// at the current instant.
pub fn sign_request(identity: &PrivateKeyBundle, username: &str, method: &str, path: &str, body: &[u8], now: DateTime<Utc>) -> SignedRequestHeaders {
    let timestamp = format_timestamp(now);
    let canonical = canonical_string(username, &timestamp, method, path, body);
    let pre_quantum = identity
        .sign_ed25519(&canonical)
        .expect("ed25519 signing key is always well-formed");
    let post_quantum = identity.sign_ml_dsa_87(&canonical);

    SignedRequestHeaders {
        x_username: username.to_string(),
        x_timestamp: timestamp,
        x_signature: pack_signature(&pre_quantum, &post_quantum),
    }
}

/// Server side (§4.2 steps 2, 4-7). Step 1 (header presence) and step 3
/// (username → user record resolution) are the caller's responsibility —
/// this function receives the already-resolved owner's public bundle.
pub fn verify_request(
    owner_bundle: &PublicKeyBundle,
    username: &str,
    timestamp: &str,
    method: &str,
    path: &str,
    body: &[u8],
    signature_header: &str,
    now: DateTime<Utc>,
) -> Result<()> {
    let sent_at = parse_timestamp(timestamp)?;
    let skew = (now - sent_at).num_milliseconds().abs();
    if skew > REPLAY_WINDOW_SECONDS * 1000 {
        return Err(AuthError::ReplayWindowExceeded);
    }

    let (pre_quantum, post_quantum) = unpack_signature(signature_header)?;
    let canonical = canonical_string(username, timestamp, method, path, body);

    owner_bundle
        .verify_ed25519(&canonical, &pre_quantum)
        .map_err(|_| AuthError::SignatureVerification)?;
    owner_bundle
        .verify_ml_dsa_87(&canonical, &post_quantum)
        .map_err(|_| AuthError::SignatureVerification)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn canonical_string_is_byte_exact_and_deterministic() {
        let a = canonical_string("alice", "2026-07-28T12:00:00.000Z", "POST", "/api/fs/upload", b"{}");
        let b = canonical_string("alice", "2026-07-28T12:00:00.000Z", "POST", "/api/fs/upload", b"{}");
        assert_eq!(a, b);
        assert_eq!(
            String::from_utf8(a).unwrap(),
            "alice|2026-07-28T12:00:00.000Z|POST|/api/fs/upload|{}"
        );
    }

    #[test]
    fn sign_then_verify_round_trips() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let now = Utc::now();
        let body = br#"{"file_id":1}"#;

        let headers = sign_request(&identity, "alice", "POST", "/api/fs/download", body, now);
        verify_request(
            &bundle,
            &headers.x_username,
            &headers.x_timestamp,
            "POST",
            "/api/fs/download",
            body,
            &headers.x_signature,
            now,
        )
        .unwrap();
    }

    #[test]
    fn replay_outside_window_is_rejected() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let signed_at = Utc::now() - Duration::seconds(120);
        let body = b"{}";

        let headers = sign_request(&identity, "alice", "POST", "/api/fs/upload", body, signed_at);
        let result = verify_request(
            &bundle,
            &headers.x_username,
            &headers.x_timestamp,
            "POST",
            "/api/fs/upload",
            body,
            &headers.x_signature,
            Utc::now(),
        );
        assert!(matches!(result, Err(AuthError::ReplayWindowExceeded)));
    }

    #[test]
    fn impersonation_is_rejected() {
        // alice signs, but the claimed username is bob: the canonical string
        // differs from what alice actually signed, so verification against
        // bob's public key fails.
        let alice = PrivateKeyBundle::generate();
        let bob = PrivateKeyBundle::generate();
        let now = Utc::now();
        let body = b"{}";

        let headers = sign_request(&alice, "alice", "POST", "/api/fs/upload", body, now);
        let result = verify_request(
            &bob.public_bundle(),
            "bob",
            &headers.x_timestamp,
            "POST",
            "/api/fs/upload",
            body,
            &headers.x_signature,
            now,
        );
        assert!(matches!(result, Err(AuthError::SignatureVerification)));
    }

    #[test]
    fn tampered_body_breaks_signature() {
        let identity = PrivateKeyBundle::generate();
        let bundle = identity.public_bundle();
        let now = Utc::now();

        let headers = sign_request(&identity, "alice", "POST", "/api/fs/upload", b"{\"a\":1}", now);
        let result = verify_request(
            &bundle,
            &headers.x_username,
            &headers.x_timestamp,
            "POST",
            "/api/fs/upload",
            b"{\"a\":2}",
            &headers.x_signature,
            now,
        );
        assert!(result.is_err());
    }

    #[test]
    fn signature_packing_round_trips() {
        let packed = pack_signature(b"pre", b"post");
        let (pre, post) = unpack_signature(&packed).unwrap();
        assert_eq!(pre, b"pre");
        assert_eq!(post, b"post");
    }

    #[test]
    fn signature_unpacking_rejects_missing_separator() {
        assert!(unpack_signature("not-a-valid-header").is_err());
    }
}
