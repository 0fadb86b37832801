//! Password digests.
//!
//! Accounts store an unsalted SHA-1 hex digest. Existing user records and
//! clients depend on this exact format, so it cannot be upgraded in place.

use sha1::{Digest, Sha1};

/// Hash a password into its stored form (lowercase hex SHA-1).
///
/// # Examples
///
/// ```
/// use files_manager::auth::hash_password;
///
/// assert_eq!(
///     hash_password("password"),
///     "5baa61e4c9b93f3f0682250b6cf8331b7ee68fd8"
/// );
/// ```
pub fn hash_password(password: &str) -> String {
    hex::encode(Sha1::digest(password.as_bytes()))
}

/// Check a plaintext password against a stored digest.
pub fn verify_password(password: &str, digest: &str) -> bool {
    hash_password(password) == digest
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hash_is_hex_sha1() {
        let digest = hash_password("toto1234!");
        assert_eq!(digest.len(), 40);
        assert!(digest.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_ne!(digest, "toto1234!");
    }

    #[test]
    fn test_hash_is_deterministic() {
        assert_eq!(hash_password("secret"), hash_password("secret"));
        assert_ne!(hash_password("secret"), hash_password("Secret"));
    }

    #[test]
    fn test_verify_password() {
        let digest = hash_password("correct horse");
        assert!(verify_password("correct horse", &digest));
        assert!(!verify_password("wrong horse", &digest));
        assert!(!verify_password("", &digest));
    }
}
