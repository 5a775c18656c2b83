//! Credential session management.
//!
//! A session holds the master-password-derived key and the decrypted
//! credential map. Both are dropped when the session is closed; key bytes
//! are zeroized and secrets wiped on drop.

use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{info, warn};

use crate::account::{verify_session, AccountStore};
use crate::config::SessionConfig;
use crate::credentials::CredentialStore;
use crate::entry::{check_field, CredentialEntry, StoredCredential};
use crate::expiry::{self, CredentialStats, ExpiringCredential};
use credvault_common::{Error, Result, SensitiveString, Username};
use credvault_crypto::{Algorithm, Iv, Mode, Salt};
use credvault_storage::StorageBackend;

/// State of a credential session.
///
/// `Unauthenticated` and `Authenticating` exist only inside
/// [`CredentialSession::register`] and [`CredentialSession::login`]; a
/// returned session is always `Active` until closed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    /// No account bound yet.
    Unauthenticated,
    /// Master password is being checked.
    Authenticating,
    /// Keys and credentials are available.
    Active,
    /// Keys and credentials have been discarded. Terminal.
    Closed,
}

/// Authenticated view of one account's vault.
///
/// Owns the only cleartext copy of the credentials. Mutations write
/// through to storage before the in-memory map changes.
pub struct CredentialSession {
    username: Username,
    config: Option<SessionConfig>,
    credentials: BTreeMap<String, CredentialEntry>,
    store: CredentialStore,
    state: SessionState,
}

impl CredentialSession {
    /// Create an account and open a session on its empty vault.
    ///
    /// # Preconditions
    /// - `master_password` is non-empty
    /// - No account exists for `username`
    ///
    /// # Postconditions
    /// - Account artifact written with a fresh salt and IV
    /// - Session is Active with no credentials
    ///
    /// # Errors
    /// - `AccountAlreadyExists`
    /// - `UnsupportedCombination` if `algorithm` cannot run in `mode`
    pub fn register(
        storage: Arc<dyn StorageBackend>,
        username: &Username,
        master_password: &str,
        algorithm: Algorithm,
        mode: Mode,
    ) -> Result<Self> {
        require_non_empty("master password", master_password)?;
        algorithm.check_mode(mode)?;

        let accounts = AccountStore::new(storage.clone());
        if accounts.exists(username)? {
            return Err(Error::AccountAlreadyExists(username.to_string()));
        }

        let salt = Salt::generate();
        let iv = Iv::generate();
        let config = SessionConfig::derive(master_password, algorithm, mode, &salt, iv)?;
        accounts.create(username, algorithm, mode, config.key(), &iv, &salt)?;

        info!(username = %username, algorithm = %algorithm, mode = %mode, "Account registered");

        Ok(Self {
            username: username.clone(),
            config: Some(config),
            credentials: BTreeMap::new(),
            store: CredentialStore::new(storage),
            state: SessionState::Active,
        })
    }

    /// Open a session by checking the master password and decrypting the vault.
    ///
    /// # Errors
    /// - `AccountNotFound`
    /// - `InvalidCredential` on a wrong master password
    /// - `MalformedRecord` if the account artifact is unreadable
    /// - `VaultCorrupt` if the vault or a stored secret does not decrypt
    pub fn login(
        storage: Arc<dyn StorageBackend>,
        username: &Username,
        master_password: &str,
    ) -> Result<Self> {
        require_non_empty("master password", master_password)?;

        let accounts = AccountStore::new(storage.clone());
        let record = accounts
            .load(username)?
            .ok_or_else(|| Error::AccountNotFound(username.to_string()))?;

        let config = SessionConfig::derive(
            master_password,
            record.algorithm,
            record.mode,
            &record.salt,
            record.iv,
        )?;
        if let Err(e) = verify_session(&record, &config) {
            warn!(username = %username, "Login rejected");
            return Err(e);
        }

        let store = CredentialStore::new(storage);
        let credentials = store
            .load_with_record(&record)?
            .into_iter()
            .map(|(label, stored)| -> Result<(String, CredentialEntry)> {
                let entry = open_entry(&config, &label, stored)?;
                Ok((label, entry))
            })
            .collect::<Result<BTreeMap<_, _>>>()?;

        info!(username = %username, entries = credentials.len(), "Login succeeded");

        Ok(Self {
            username: username.clone(),
            config: Some(config),
            credentials,
            store,
            state: SessionState::Active,
        })
    }

    /// Account this session belongs to.
    pub fn username(&self) -> &Username {
        &self.username
    }

    /// Get the current session state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Check if session is active.
    pub fn is_active(&self) -> bool {
        self.state == SessionState::Active
    }

    /// Session algorithm.
    pub fn algorithm(&self) -> Result<Algorithm> {
        Ok(self.config()?.algorithm())
    }

    /// Session mode.
    pub fn mode(&self) -> Result<Mode> {
        Ok(self.config()?.mode())
    }

    /// Store a new credential.
    ///
    /// The secret is encrypted under the session key and appended to the
    /// vault. Reusing a label appends a second line; the in-memory entry is
    /// replaced and the last line wins on the next login.
    ///
    /// # Errors
    /// - `InvalidInput` for an empty label or secret, or a field containing
    ///   `||` or a line break, or ending in `|`
    /// - `SessionClosed`
    pub fn add_credential(
        &mut self,
        label: &str,
        username: &str,
        secret: impl Into<SensitiveString>,
        expiration: Option<NaiveDate>,
    ) -> Result<()> {
        let config = self.config()?;
        let secret = secret.into();

        require_non_empty("label", label)?;
        require_non_empty("secret", secret.expose())?;
        check_field("label", label)?;
        check_field("username", username)?;

        if self.credentials.contains_key(label) {
            warn!(username = %self.username, label = %label, "Label already stored, appending duplicate");
        }

        let stored = StoredCredential {
            username: username.to_string(),
            ciphertext: config.encrypt(secret.expose())?,
            expiration,
        };
        self.store.append(&self.username, label, &stored)?;

        self.credentials.insert(
            label.to_string(),
            CredentialEntry {
                username: stored.username,
                secret,
                expiration,
            },
        );
        Ok(())
    }

    /// Remove a credential.
    ///
    /// # Returns
    /// - `Ok(false)` if the label is absent; storage is not touched
    /// - `Ok(true)` after the vault is rewritten without it
    pub fn delete_credential(&mut self, label: &str) -> Result<bool> {
        self.ensure_active()?;
        let config = self.config.as_ref().ok_or(Error::SessionClosed)?;

        let Some(removed) = self.credentials.remove(label) else {
            return Ok(false);
        };

        if let Err(e) = self.store.overwrite(&self.username, &self.credentials, config) {
            self.credentials.insert(label.to_string(), removed);
            return Err(e);
        }

        info!(username = %self.username, label = %label, "Credential deleted");
        Ok(true)
    }

    /// Look up one credential.
    pub fn get_credential(&self, label: &str) -> Result<Option<&CredentialEntry>> {
        self.ensure_active()?;
        Ok(self.credentials.get(label))
    }

    /// All labels, sorted.
    pub fn list_credentials(&self) -> Result<Vec<String>> {
        self.ensure_active()?;
        Ok(self.credentials.keys().cloned().collect())
    }

    /// Labels matching `query` in label or username, ignoring case.
    pub fn search(&self, query: &str) -> Result<Vec<String>> {
        self.ensure_active()?;
        Ok(expiry::search(&self.credentials, query))
    }

    /// Credentials expiring within `days` of `today`, expired ones included.
    pub fn expiring_within(&self, days: i64, today: NaiveDate) -> Result<Vec<ExpiringCredential>> {
        self.ensure_active()?;
        Ok(expiry::expiring_within(&self.credentials, days, today))
    }

    /// Summary counts.
    pub fn stats(&self, today: NaiveDate) -> Result<CredentialStats> {
        self.ensure_active()?;
        Ok(expiry::stats(&self.credentials, today))
    }

    /// Close the session, discarding keys and credentials.
    ///
    /// # Postconditions
    /// - Session key is zeroized and removed
    /// - Cleartext secrets are wiped
    /// - Every further operation fails with `SessionClosed`
    pub fn close(&mut self) {
        self.config = None;
        self.credentials.clear();
        self.state = SessionState::Closed;
    }

    fn ensure_active(&self) -> Result<()> {
        match self.state {
            SessionState::Active => Ok(()),
            _ => Err(Error::SessionClosed),
        }
    }

    fn config(&self) -> Result<&SessionConfig> {
        self.ensure_active()?;
        self.config.as_ref().ok_or(Error::SessionClosed)
    }
}

impl Drop for CredentialSession {
    fn drop(&mut self) {
        self.close();
    }
}

fn require_non_empty(what: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(Error::InvalidInput(format!("{} cannot be empty", what)));
    }
    Ok(())
}

fn open_entry(config: &SessionConfig, label: &str, stored: StoredCredential) -> Result<CredentialEntry> {
    let secret = config.decrypt(&stored.ciphertext).map_err(|e| {
        Error::VaultCorrupt(format!("secret for '{}' does not decrypt: {}", label, e))
    })?;

    Ok(CredentialEntry {
        username: stored.username,
        secret: SensitiveString::new(secret),
        expiration: stored.expiration,
    })
}
