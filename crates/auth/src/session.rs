//! Signed session tokens.
//!
//! A session is serialized to JSON, base64-encoded, and signed with
//! HMAC-SHA256. The token is tamper-evident: any modification of payload or
//! signature makes `decode` return `None`, which callers treat as "not
//! logged in".

use base64::engine::general_purpose::URL_SAFE_NO_PAD;
use base64::Engine;
use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::AuthError;

/// The authenticated session carried by the cookie.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    /// Authenticated user's ID.
    pub user_id: i64,
    /// Authenticated user's name.
    pub username: String,
}

/// Issues and reads signed session tokens.
pub struct SessionCodec {
    key: [u8; 32],
}

impl SessionCodec {
    /// Creates a codec from an application secret. The secret is stretched
    /// to a fixed-size key with SHA-256.
    pub fn new(secret: &str) -> Self {
        Self {
            key: sha256(secret.as_bytes()),
        }
    }

    /// Encodes a session as `base64(payload).base64(signature)`.
    pub fn encode(&self, session: &Session) -> Result<String, AuthError> {
        let body = serde_json::to_vec(session)?;
        let payload = URL_SAFE_NO_PAD.encode(body);
        let mac = hmac_sha256(&self.key, payload.as_bytes());
        Ok(format!("{payload}.{}", URL_SAFE_NO_PAD.encode(mac)))
    }

    /// Decodes and verifies a token. Returns `None` for malformed or
    /// tampered tokens.
    pub fn decode(&self, token: &str) -> Option<Session> {
        let (payload, signature) = token.split_once('.')?;
        let signature = URL_SAFE_NO_PAD.decode(signature).ok()?;
        let expected = hmac_sha256(&self.key, payload.as_bytes());
        if !constant_time_eq(&signature, &expected) {
            return None;
        }
        let body = URL_SAFE_NO_PAD.decode(payload).ok()?;
        serde_json::from_slice(&body).ok()
    }
}

/// Compute SHA-256 hash.
fn sha256(data: &[u8]) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hasher.finalize().into()
}

/// Compute HMAC-SHA256.
fn hmac_sha256(key: &[u8; 32], data: &[u8]) -> [u8; 32] {
    // HMAC: H((K XOR opad) || H((K XOR ipad) || message))
    let mut o_key_pad = [0x5cu8; 64];
    let mut i_key_pad = [0x36u8; 64];

    for i in 0..32 {
        o_key_pad[i] ^= key[i];
        i_key_pad[i] ^= key[i];
    }

    let mut inner_hash = Sha256::new();
    inner_hash.update(i_key_pad);
    inner_hash.update(data);
    let inner_result = inner_hash.finalize();

    let mut outer_hash = Sha256::new();
    outer_hash.update(o_key_pad);
    outer_hash.update(inner_result);
    outer_hash.finalize().into()
}

/// Constant-time comparison to prevent timing attacks.
fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut result = 0u8;
    for (x, y) in a.iter().zip(b.iter()) {
        result |= x ^ y;
    }
    result == 0
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session() -> Session {
        Session {
            user_id: 42,
            username: "alice".to_string(),
        }
    }

    #[test]
    fn test_encode_decode_roundtrip() {
        let codec = SessionCodec::new("test-secret");
        let token = codec.encode(&session()).unwrap();

        let decoded = codec.decode(&token).unwrap();
        assert_eq!(decoded, session());
    }

    #[test]
    fn test_tampered_payload_rejected() {
        let codec = SessionCodec::new("test-secret");
        let token = codec.encode(&session()).unwrap();

        let (payload, signature) = token.split_once('.').unwrap();
        let other = codec
            .encode(&Session {
                user_id: 1,
                username: "mallory".to_string(),
            })
            .unwrap();
        let (other_payload, _) = other.split_once('.').unwrap();

        // Payload from one token with signature from another
        let forged = format!("{other_payload}.{signature}");
        assert_eq!(codec.decode(&forged), None);

        // Garbage in either half
        assert_eq!(codec.decode(&format!("{payload}.AAAA")), None);
        assert_eq!(codec.decode("not-a-token"), None);
        assert_eq!(codec.decode(""), None);
    }

    #[test]
    fn test_wrong_key_rejected() {
        let codec = SessionCodec::new("test-secret");
        let token = codec.encode(&session()).unwrap();

        let other = SessionCodec::new("other-secret");
        assert_eq!(other.decode(&token), None);
    }

    #[test]
    fn test_constant_time_eq() {
        assert!(constant_time_eq(&[1, 2, 3], &[1, 2, 3]));
        assert!(!constant_time_eq(&[1, 2, 3], &[1, 2, 4]));
        assert!(!constant_time_eq(&[1, 2], &[1, 2, 3]));
    }
}
