use std::fmt;

use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

/// 32 random bytes = 256 bits of entropy.
const TOKEN_BYTES: usize = 32;

/// A freshly minted bearer token.
///
/// Has exactly one legitimate holder: it is handed back to the caller of
/// `create-intent` and then dropped. There is deliberately no `Display`, and
/// `Debug` is redacted so it cannot end up in logs.
pub struct PlaintextToken(String);

impl PlaintextToken {
    pub fn generate() -> Self {
        let mut bytes = [0u8; TOKEN_BYTES];
        rand::rngs::OsRng.fill_bytes(&mut bytes);
        Self(URL_SAFE_NO_PAD.encode(bytes))
    }

    pub fn hash(&self) -> String {
        hash_token(&self.0)
    }

    /// Consumes the token for the one response that carries it.
    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Debug for PlaintextToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("PlaintextToken(<redacted>)")
    }
}

/// Lowercase hex SHA-256 of the token.
pub fn hash_token(token: &str) -> String {
    format!("{:x}", Sha256::digest(token.as_bytes()))
}

/// Hashes the presented token and compares it to the stored hash in constant time.
pub fn token_matches(presented: &str, stored_hash: &str) -> bool {
    let computed = hash_token(presented);
    computed.as_bytes().ct_eq(stored_hash.as_bytes()).into()
}
