//! Key derivation using PBKDF2-HMAC-SHA256.
//!
//! One function derives every key in the system: the session key from the
//! master password, and the config and vault keys from fixed account-scoped
//! identifiers. Output length follows the target algorithm.

use sha2::Sha256;

use crate::algorithm::Algorithm;
use crate::keys::{DerivedKey, Salt};
use credvault_common::Result;

/// PBKDF2 iteration count. Changing it invalidates every stored account.
pub const PBKDF2_ITERATIONS: u32 = 65_536;

/// Derive key material for `algorithm` from `secret` and `salt`.
///
/// # Postconditions
/// - The key is `algorithm.key_length()` bytes long
/// - The derived key is deterministic given the same inputs
///
/// # Security
/// - The secret is not stored or logged
pub fn derive_key(secret: &str, algorithm: Algorithm, salt: &Salt) -> Result<DerivedKey> {
    let mut key_bytes = vec![0u8; algorithm.key_length()];
    pbkdf2::pbkdf2_hmac::<Sha256>(
        secret.as_bytes(),
        salt.as_bytes(),
        PBKDF2_ITERATIONS,
        &mut key_bytes,
    );

    DerivedKey::from_bytes(algorithm, key_bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_salt() -> Salt {
        Salt::from_text("VGVzdFNhbHQxMjM0NTY3ODkw")
    }

    #[test]
    fn test_derive_key_deterministic() {
        let salt = test_salt();

        let key1 = derive_key("test-password-123", Algorithm::Aes, &salt).unwrap();
        let key2 = derive_key("test-password-123", Algorithm::Aes, &salt).unwrap();

        assert_eq!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_sizes() {
        let salt = test_salt();

        for algorithm in Algorithm::ALL {
            let key = derive_key("TestMasterPassword123!", algorithm, &salt).unwrap();
            assert_eq!(key.as_bytes().len(), algorithm.key_length());
            assert_eq!(key.algorithm(), algorithm);
        }
    }

    #[test]
    fn test_derive_key_different_salt() {
        let key1 = derive_key("password", Algorithm::Aes, &Salt::from_text("salt-one")).unwrap();
        let key2 = derive_key("password", Algorithm::Aes, &Salt::from_text("salt-two")).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_derive_key_different_password() {
        let salt = test_salt();

        let key1 = derive_key("password1", Algorithm::Aes, &salt).unwrap();
        let key2 = derive_key("password2", Algorithm::Aes, &salt).unwrap();

        assert_ne!(key1.as_bytes(), key2.as_bytes());
    }

    #[test]
    fn test_short_key_is_prefix_of_long_key() {
        // PBKDF2 output blocks are independent of the requested length.
        let salt = test_salt();

        let des = derive_key("password", Algorithm::Des, &salt).unwrap();
        let aes = derive_key("password", Algorithm::Aes, &salt).unwrap();

        assert_eq!(des.as_bytes(), &aes.as_bytes()[..8]);
    }
}
