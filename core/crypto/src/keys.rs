//! Key material, IV and salt types.
//!
//! Key types zeroize their memory on drop and never print their bytes.

use base64::{engine::general_purpose::STANDARD, Engine as _};
use rand::{rngs::OsRng, RngCore};
use std::fmt;
use zeroize::{Zeroize, ZeroizeOnDrop};

use crate::algorithm::Algorithm;
use credvault_common::{Error, Result};

/// Length of the per-account initialization vector in bytes.
pub const IV_LENGTH: usize = 16;

/// Number of random bytes behind a generated salt.
pub const SALT_LENGTH: usize = 16;

/// Key material derived for one algorithm.
///
/// The length always matches `algorithm.key_length()`.
#[derive(Clone, Zeroize, ZeroizeOnDrop)]
pub struct DerivedKey {
    key: Vec<u8>,
    #[zeroize(skip)]
    algorithm: Algorithm,
}

impl DerivedKey {
    /// Create a key from raw bytes.
    ///
    /// # Errors
    /// - Returns error if the length does not match the algorithm's key size
    pub fn from_bytes(algorithm: Algorithm, key: Vec<u8>) -> Result<Self> {
        if key.len() != algorithm.key_length() {
            return Err(Error::Crypto(format!(
                "Invalid key length for {}: expected {}, got {}",
                algorithm,
                algorithm.key_length(),
                key.len()
            )));
        }
        Ok(Self { key, algorithm })
    }

    /// Get the key bytes.
    ///
    /// # Security
    /// The returned slice should be used immediately and not stored.
    pub fn as_bytes(&self) -> &[u8] {
        &self.key
    }

    /// Algorithm this key was sized for.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }
}

impl fmt::Debug for DerivedKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "DerivedKey({}, [REDACTED])", self.algorithm)
    }
}

/// Initialization vector, generated once per account.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Iv([u8; IV_LENGTH]);

impl Iv {
    /// Generate a random IV from the OS RNG.
    pub fn generate() -> Self {
        let mut iv = [0u8; IV_LENGTH];
        OsRng.fill_bytes(&mut iv);
        Self(iv)
    }

    /// Create from bytes.
    pub fn from_bytes(bytes: [u8; IV_LENGTH]) -> Self {
        Self(bytes)
    }

    /// Create from a slice that must be exactly `IV_LENGTH` bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        let iv: [u8; IV_LENGTH] = bytes.try_into().map_err(|_| {
            Error::InvalidInput(format!(
                "IV must be {} bytes, got {}",
                IV_LENGTH,
                bytes.len()
            ))
        })?;
        Ok(Self(iv))
    }

    /// Decode a Base64 IV as stored in the account artifact.
    pub fn from_base64(encoded: &str) -> Result<Self> {
        let bytes = STANDARD
            .decode(encoded)
            .map_err(|e| Error::Encoding(format!("Invalid IV encoding: {}", e)))?;
        Self::from_slice(&bytes)
    }

    /// Encode as Base64 for the account artifact.
    pub fn to_base64(&self) -> String {
        STANDARD.encode(self.0)
    }

    /// Get the IV bytes.
    pub fn as_bytes(&self) -> &[u8; IV_LENGTH] {
        &self.0
    }
}

/// Key-derivation salt.
///
/// The salt is opaque text; its UTF-8 bytes feed PBKDF2. Generated salts
/// are Base64 of `SALT_LENGTH` random bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Salt(String);

impl Salt {
    /// Generate a random salt.
    pub fn generate() -> Self {
        let mut bytes = [0u8; SALT_LENGTH];
        OsRng.fill_bytes(&mut bytes);
        Self(STANDARD.encode(bytes))
    }

    /// Wrap existing salt text.
    pub fn from_text(text: impl Into<String>) -> Self {
        Self(text.into())
    }

    /// Get the salt text.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Bytes fed to the KDF.
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }
}

impl fmt::Display for Salt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_iv_generate() {
        let iv1 = Iv::generate();
        let iv2 = Iv::generate();

        assert_eq!(iv1.as_bytes().len(), IV_LENGTH);
        assert_ne!(iv1, iv2);
    }

    #[test]
    fn test_iv_base64() {
        let iv = Iv::from_bytes([7u8; IV_LENGTH]);
        let restored = Iv::from_base64(&iv.to_base64()).unwrap();
        assert_eq!(restored, iv);
    }

    #[test]
    fn test_iv_wrong_length() {
        let short = STANDARD.encode([1u8; 8]);
        assert!(matches!(Iv::from_base64(&short), Err(Error::InvalidInput(_))));
        assert!(matches!(Iv::from_base64("%%%"), Err(Error::Encoding(_))));
    }

    #[test]
    fn test_salt_generate() {
        let salt1 = Salt::generate();
        let salt2 = Salt::generate();

        assert_ne!(salt1, salt2);
        assert_eq!(STANDARD.decode(salt1.as_str()).unwrap().len(), SALT_LENGTH);
    }

    #[test]
    fn test_derived_key_length_checked() {
        assert!(DerivedKey::from_bytes(Algorithm::Des, vec![0u8; 8]).is_ok());
        assert!(DerivedKey::from_bytes(Algorithm::Aes, vec![0u8; 16]).is_err());
    }

    #[test]
    fn test_derived_key_debug_redacted() {
        let key = DerivedKey::from_bytes(Algorithm::Aes, vec![0xAB; 32]).unwrap();
        assert_eq!(format!("{:?}", key), "DerivedKey(AES, [REDACTED])");
    }
}
