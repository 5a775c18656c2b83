//! Per-session cipher configuration and on-disk format constants.

use credvault_common::{Result, Username};
use credvault_crypto::{decrypt, derive_key, encrypt, Algorithm, DerivedKey, Iv, Mode, Salt};

/// Plaintext of the verification token.
pub const VERIFICATION_MARKER: &str = "VALID_PASSWORD";

/// Separator between fields of both artifacts.
pub const FIELD_SEPARATOR: &str = "||";

/// Marker between the account header and the metadata ciphertext.
pub const ENCRYPTED_MARKER: &str = "||ENCRYPTED||";

/// Marker between the metadata ciphertext and the verification token.
pub const VERIFY_MARKER: &str = "||VERIFY||";

/// Suffix appended to the username to form the config-key secret.
pub const CONFIG_KEY_SUFFIX: &str = "_config_key";

/// Suffix appended to the username to form the vault-key secret.
pub const VAULT_KEY_SUFFIX: &str = "_file_encryption";

/// Algorithm of the outer envelope (metadata block and vault blob).
pub const ENVELOPE_ALGORITHM: Algorithm = Algorithm::Aes;

/// Mode of the outer envelope.
pub const ENVELOPE_MODE: Mode = Mode::Gcm;

/// Derive an outer-envelope key.
///
/// The secret is `<username><suffix>`, so the key depends only on public
/// data plus the clear-text salt. It is not a secrecy boundary.
pub(crate) fn envelope_key(username: &Username, suffix: &str, salt: &Salt) -> Result<DerivedKey> {
    derive_key(
        &format!("{}{}", username.as_str(), suffix),
        ENVELOPE_ALGORITHM,
        salt,
    )
}

/// Cipher settings of an authenticated session.
///
/// Holds the master-password-derived key; every credential secret is
/// encrypted under it.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    algorithm: Algorithm,
    mode: Mode,
    key: DerivedKey,
    iv: Iv,
}

impl SessionConfig {
    /// Bundle the session cipher settings.
    ///
    /// # Errors
    /// - `UnsupportedCombination` if the algorithm cannot run in `mode`
    pub fn new(algorithm: Algorithm, mode: Mode, key: DerivedKey, iv: Iv) -> Result<Self> {
        algorithm.check_mode(mode)?;
        Ok(Self {
            algorithm,
            mode,
            key,
            iv,
        })
    }

    /// Derive the session key from a master password and build the config.
    pub fn derive(
        master_password: &str,
        algorithm: Algorithm,
        mode: Mode,
        salt: &Salt,
        iv: Iv,
    ) -> Result<Self> {
        algorithm.check_mode(mode)?;
        let key = derive_key(master_password, algorithm, salt)?;
        Self::new(algorithm, mode, key, iv)
    }

    /// User-chosen algorithm.
    pub fn algorithm(&self) -> Algorithm {
        self.algorithm
    }

    /// User-chosen mode.
    pub fn mode(&self) -> Mode {
        self.mode
    }

    /// Session key.
    pub fn key(&self) -> &DerivedKey {
        &self.key
    }

    /// Account IV.
    pub fn iv(&self) -> &Iv {
        &self.iv
    }

    /// Encrypt under the session key; returns Base64.
    pub fn encrypt(&self, plaintext: &str) -> Result<String> {
        encrypt(plaintext, self.algorithm, self.mode, &self.key, &self.iv)
    }

    /// Decrypt Base64 ciphertext produced by [`SessionConfig::encrypt`].
    pub fn decrypt(&self, encoded: &str) -> Result<String> {
        decrypt(encoded, self.algorithm, self.mode, &self.key, &self.iv)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_config_roundtrip() {
        let salt = Salt::from_text("c2FsdA==");
        let config =
            SessionConfig::derive("master", Algorithm::Aes, Mode::Cbc, &salt, Iv::generate())
                .unwrap();

        let encrypted = config.encrypt("secret1").unwrap();
        assert_eq!(config.decrypt(&encrypted).unwrap(), "secret1");
        assert_eq!(config.algorithm(), Algorithm::Aes);
        assert_eq!(config.mode(), Mode::Cbc);
    }

    #[test]
    fn test_session_config_rejects_des_gcm() {
        let salt = Salt::generate();
        let result = SessionConfig::derive("pw", Algorithm::Des, Mode::Gcm, &salt, Iv::generate());
        assert!(result.is_err());
    }

    #[test]
    fn test_envelope_keys_differ_by_suffix() {
        let alice = Username::new("alice").unwrap();
        let salt = Salt::from_text("c2FsdA==");

        let config_key = envelope_key(&alice, CONFIG_KEY_SUFFIX, &salt).unwrap();
        let vault_key = envelope_key(&alice, VAULT_KEY_SUFFIX, &salt).unwrap();

        assert_ne!(config_key.as_bytes(), vault_key.as_bytes());
        assert_eq!(config_key.algorithm(), ENVELOPE_ALGORITHM);
    }
}
