// src/auth/admin.rs
use astra::Request;
use sha2::{Digest, Sha256};

use crate::errors::ServerError;

const ADMIN_HEADER: &str = "X-Admin-Password";

/// Hash a password using SHA-256. Comparisons go through the digest so
/// the raw strings never meet.
pub fn hash_password(password: &str) -> [u8; 32] {
    let mut hasher = Sha256::new();
    hasher.update(password.as_bytes());
    let out = hasher.finalize();
    let mut arr = [0u8; 32];
    arr.copy_from_slice(&out);
    arr
}

/// Constant-time-ish compare for hashes (simple and sufficient here).
pub fn hashes_equal(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    let mut diff: u8 = 0;
    for (x, y) in a.iter().zip(b.iter()) {
        diff |= x ^ y;
    }
    diff == 0
}

/// Gate for admin routes: the `X-Admin-Password` header must match the
/// `ADMIN_PASSWORD` env var. An unconfigured password rejects everything
/// rather than waving requests through.
pub fn require_admin(req: &Request) -> Result<(), ServerError> {
    let expected = std::env::var("ADMIN_PASSWORD")
        .ok()
        .filter(|p| !p.is_empty())
        .ok_or_else(|| ServerError::Unauthorized("admin password not configured".into()))?;

    let provided = req
        .headers()
        .get(ADMIN_HEADER)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| ServerError::Unauthorized("missing admin password".into()))?;

    if hashes_equal(&hash_password(provided), &hash_password(&expected)) {
        Ok(())
    } else {
        Err(ServerError::Unauthorized("wrong admin password".into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn hash_is_deterministic() {
        let h1 = hash_password("hunter2");
        let h2 = hash_password("hunter2");
        assert_eq!(h1, h2);
    }

    #[test]
    fn different_passwords_hash_differently() {
        assert!(!hashes_equal(
            &hash_password("hunter2"),
            &hash_password("hunter3")
        ));
    }

    #[test]
    fn compare_rejects_length_mismatch() {
        assert!(!hashes_equal(&[1, 2, 3], &[1, 2]));
    }
}
