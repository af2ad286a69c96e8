//! TURN-Langzeitschluessel
//!
//! `key = MD5(username ":" realm ":" password)` gemaess RFC 5389 §15.4.

/// Abgeleiteter 16-Byte-Schluessel, den der TURN-Server zur Pruefung nutzt
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct AuthKey([u8; 16]);

impl AuthKey {
    pub fn as_bytes(&self) -> &[u8; 16] {
        &self.0
    }
}

impl std::fmt::Debug for AuthKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("AuthKey(..)")
    }
}

/// Leitet den Schluessel aus Benutzername, Realm und Secret ab
pub fn auth_key_ableiten(username: &str, realm: &str, secret: &str) -> AuthKey {
    let digest = md5::compute(format!("{username}:{realm}:{secret}"));
    AuthKey(digest.0)
}
