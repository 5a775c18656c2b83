//! Account record persistence and master-password verification.
//!
//! The account artifact is one line of text:
//!
//! ```text
//! <salt>||<iv-base64>||ENCRYPTED||<metadata-base64>||VERIFY||<token-base64>
//! ```
//!
//! The metadata block (`algorithm=..\nmode=..\n`) is sealed with the config
//! key, which derives from the username and salt alone. The token is the
//! verification marker sealed with the session key, so only the right
//! master password opens it.

use std::sync::Arc;
use subtle::ConstantTimeEq;
use tracing::{debug, warn};

use crate::config::{
    envelope_key, SessionConfig, CONFIG_KEY_SUFFIX, ENCRYPTED_MARKER, ENVELOPE_ALGORITHM,
    ENVELOPE_MODE, FIELD_SEPARATOR, VERIFICATION_MARKER, VERIFY_MARKER,
};
use credvault_common::{Error, Result, Username};
use credvault_crypto::{decrypt, derive_key, encrypt, Algorithm, DerivedKey, Iv, Mode, Salt};
use credvault_storage::{ArtifactId, StorageBackend};

/// Decoded account record.
///
/// The verification token stays encrypted; checking it is a separate step.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccountRecord {
    /// Account owner.
    pub username: Username,
    /// Key-derivation salt, fixed at registration.
    pub salt: Salt,
    /// Account IV, reused for every encryption under this account.
    pub iv: Iv,
    /// Session algorithm.
    pub algorithm: Algorithm,
    /// Session mode.
    pub mode: Mode,
    /// Base64 verification token, if the record carries one.
    pub verification_token: Option<String>,
}

/// Reads and writes account records.
#[derive(Clone)]
pub struct AccountStore {
    storage: Arc<dyn StorageBackend>,
}

impl AccountStore {
    /// Create a store over `storage`.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Write a new account record.
    ///
    /// Seals the algorithm/mode metadata under the config key and the
    /// verification marker under `session_key`. Replaces any existing record.
    ///
    /// # Errors
    /// - `UnsupportedCombination` if `algorithm` cannot run in `mode`
    /// - Storage failures
    pub fn create(
        &self,
        username: &Username,
        algorithm: Algorithm,
        mode: Mode,
        session_key: &DerivedKey,
        iv: &Iv,
        salt: &Salt,
    ) -> Result<AccountRecord> {
        algorithm.check_mode(mode)?;

        let metadata = format!("algorithm={}\nmode={}\n", algorithm, mode);
        let config_key = envelope_key(username, CONFIG_KEY_SUFFIX, salt)?;
        let sealed_metadata = encrypt(&metadata, ENVELOPE_ALGORITHM, ENVELOPE_MODE, &config_key, iv)?;

        let token = encrypt(VERIFICATION_MARKER, algorithm, mode, session_key, iv)?;

        let content = format!(
            "{salt}{sep}{iv}{enc}{sealed_metadata}{verify}{token}",
            salt = salt.as_str(),
            sep = FIELD_SEPARATOR,
            iv = iv.to_base64(),
            enc = ENCRYPTED_MARKER,
            verify = VERIFY_MARKER,
        );
        self.storage
            .write(&ArtifactId::account(username), content.as_bytes())?;

        debug!(username = %username, algorithm = %algorithm, mode = %mode, "Account record written");

        Ok(AccountRecord {
            username: username.clone(),
            salt: salt.clone(),
            iv: *iv,
            algorithm,
            mode,
            verification_token: Some(token),
        })
    }

    /// Load and decode an account record.
    ///
    /// # Returns
    /// - `Ok(None)` if the user has no account artifact
    ///
    /// # Errors
    /// - `MalformedRecord` if the delimiter structure, IV or metadata is invalid
    pub fn load(&self, username: &Username) -> Result<Option<AccountRecord>> {
        let Some(bytes) = self.storage.read(&ArtifactId::account(username))? else {
            return Ok(None);
        };

        let content = String::from_utf8(bytes)
            .map_err(|_| Error::MalformedRecord("account record is not UTF-8".to_string()))?;

        let (header, body) = content
            .split_once(ENCRYPTED_MARKER)
            .ok_or_else(|| Error::MalformedRecord("missing ENCRYPTED marker".to_string()))?;

        let mut header_fields = header.split(FIELD_SEPARATOR);
        let salt = header_fields.next().unwrap_or_default();
        let iv_text = header_fields
            .next()
            .ok_or_else(|| Error::MalformedRecord("missing IV field".to_string()))?;
        let iv = Iv::from_base64(iv_text)
            .map_err(|e| Error::MalformedRecord(format!("invalid IV: {}", e)))?;
        let salt = Salt::from_text(salt);

        let (sealed_metadata, verification_token) = match body.split_once(VERIFY_MARKER) {
            Some((metadata, token)) => (metadata, Some(token.trim().to_string())),
            None => (body, None),
        };

        let config_key = envelope_key(username, CONFIG_KEY_SUFFIX, &salt)?;
        let metadata = decrypt(sealed_metadata, ENVELOPE_ALGORITHM, ENVELOPE_MODE, &config_key, &iv)
            .map_err(|e| Error::MalformedRecord(format!("metadata block unreadable: {}", e)))?;
        let (algorithm, mode) = parse_metadata(&metadata)?;

        debug!(username = %username, "Account record loaded");

        Ok(Some(AccountRecord {
            username: username.clone(),
            salt,
            iv,
            algorithm,
            mode,
            verification_token,
        }))
    }

    /// Check a candidate master password against a loaded record.
    ///
    /// # Errors
    /// - `InvalidCredential` if the token does not decrypt to the marker
    /// - `MalformedRecord` if the record has no verification token
    pub fn verify(&self, record: &AccountRecord, candidate_password: &str) -> Result<()> {
        let key = derive_key(candidate_password, record.algorithm, &record.salt)?;
        let session = SessionConfig::new(record.algorithm, record.mode, key, record.iv)?;
        verify_session(record, &session)
    }

    /// Presence check only; nothing is decrypted.
    pub fn exists(&self, username: &Username) -> Result<bool> {
        self.storage.exists(&ArtifactId::account(username))
    }
}

/// Check an already-derived session key against the record's token.
pub(crate) fn verify_session(record: &AccountRecord, session: &SessionConfig) -> Result<()> {
    let token = record
        .verification_token
        .as_deref()
        .filter(|t| !t.is_empty())
        .ok_or_else(|| Error::MalformedRecord("no verification token found".to_string()))?;

    let decrypted = match session.decrypt(token) {
        Ok(text) => text,
        Err(e) if e.is_decryption_failure() => {
            warn!(username = %record.username, "Verification token did not decrypt");
            return Err(Error::InvalidCredential);
        }
        Err(Error::Encoding(msg)) => return Err(Error::MalformedRecord(msg)),
        Err(e) => return Err(e),
    };

    if bool::from(decrypted.as_bytes().ct_eq(VERIFICATION_MARKER.as_bytes())) {
        Ok(())
    } else {
        warn!(username = %record.username, "Verification marker mismatch");
        Err(Error::InvalidCredential)
    }
}

fn parse_metadata(metadata: &str) -> Result<(Algorithm, Mode)> {
    let mut algorithm = None;
    let mut mode = None;

    for line in metadata.lines() {
        match line.split_once('=') {
            Some(("algorithm", value)) => algorithm = Some(value.trim()),
            Some(("mode", value)) => mode = Some(value.trim()),
            _ => {}
        }
    }

    let algorithm = algorithm
        .ok_or_else(|| Error::MalformedRecord("metadata lacks algorithm".to_string()))?
        .parse::<Algorithm>()
        .map_err(|e| Error::MalformedRecord(e.to_string()))?;
    let mode = mode
        .ok_or_else(|| Error::MalformedRecord("metadata lacks mode".to_string()))?
        .parse::<Mode>()
        .map_err(|e| Error::MalformedRecord(e.to_string()))?;

    Ok((algorithm, mode))
}
