//! Common error types for credvault.

use thiserror::Error;

/// Top-level error type for credvault operations.
#[derive(Debug, Error)]
pub enum Error {
    /// Algorithm name outside the supported set.
    #[error("Unsupported algorithm: {0}")]
    UnsupportedAlgorithm(String),

    /// Cipher mode outside the supported set.
    #[error("Unsupported mode: {0}")]
    UnsupportedMode(String),

    /// Algorithm and mode cannot be combined (e.g. DES with GCM).
    #[error("Unsupported algorithm/mode combination: {algorithm}/{mode}")]
    UnsupportedCombination { algorithm: String, mode: String },

    /// GCM tag did not verify.
    #[error("Authentication failure: ciphertext, key or IV mismatch")]
    AuthenticationFailure,

    /// Block padding did not verify after decryption.
    #[error("Padding failure: ciphertext, key or IV mismatch")]
    PaddingFailure,

    /// Key setup or other cipher-level failure.
    #[error("Cryptographic error: {0}")]
    Crypto(String),

    /// Master password did not unlock the account.
    #[error("Invalid credential")]
    InvalidCredential,

    /// An account record already exists for the user.
    #[error("Account already exists: {0}")]
    AccountAlreadyExists(String),

    /// No account record exists for the user.
    #[error("Account not found: {0}")]
    AccountNotFound(String),

    /// The account artifact could not be parsed or decrypted.
    #[error("Malformed account record: {0}")]
    MalformedRecord(String),

    /// The vault artifact could not be decrypted.
    #[error("Vault corrupt: {0}")]
    VaultCorrupt(String),

    /// Text-safe encoding could not be decoded.
    #[error("Encoding error: {0}")]
    Encoding(String),

    /// Storage backend failed.
    #[error("Storage error: {0}")]
    Storage(String),

    /// I/O operation failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Invalid input provided.
    #[error("Invalid input: {0}")]
    InvalidInput(String),

    /// The session was closed and holds no keys.
    #[error("Session is closed")]
    SessionClosed,
}

impl Error {
    /// Whether this error came from a cipher integrity check.
    ///
    /// A wrong key and a corrupted ciphertext are indistinguishable at the
    /// cipher layer, so both report through this predicate.
    pub fn is_decryption_failure(&self) -> bool {
        matches!(self, Error::AuthenticationFailure | Error::PaddingFailure)
    }
}

/// Result type alias using the common Error.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decryption_failure_predicate() {
        assert!(Error::AuthenticationFailure.is_decryption_failure());
        assert!(Error::PaddingFailure.is_decryption_failure());
        assert!(!Error::InvalidCredential.is_decryption_failure());
    }

    #[test]
    fn test_combination_message() {
        let err = Error::UnsupportedCombination {
            algorithm: "DES".to_string(),
            mode: "GCM".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Unsupported algorithm/mode combination: DES/GCM"
        );
    }
}
