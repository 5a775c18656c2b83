//! Vault record persistence.
//!
//! The vault artifact holds raw AES/GCM ciphertext of the newline-joined
//! credential lines, sealed with the vault key. Secrets inside each line
//! are a second layer, encrypted under the session key.

use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, warn};

use crate::account::{AccountRecord, AccountStore};
use crate::config::{envelope_key, SessionConfig, ENVELOPE_ALGORITHM, ENVELOPE_MODE, VAULT_KEY_SUFFIX};
use crate::entry::{format_line, parse_line, CredentialEntry, StoredCredential};
use credvault_common::{Error, Result, Username};
use credvault_crypto::{decrypt_raw, encrypt_raw, DerivedKey};
use credvault_storage::{ArtifactId, StorageBackend};

/// Reads and rewrites vault records.
#[derive(Clone)]
pub struct CredentialStore {
    storage: Arc<dyn StorageBackend>,
    accounts: AccountStore,
}

impl CredentialStore {
    /// Create a store over `storage`.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self {
            accounts: AccountStore::new(storage.clone()),
            storage,
        }
    }

    /// Append one line to the vault.
    ///
    /// The whole blob is decrypted, extended and re-encrypted. No check is
    /// made for an existing line with the same label.
    ///
    /// # Errors
    /// - `AccountNotFound` if `owner` has no account record
    /// - `VaultCorrupt` if the existing blob does not decrypt
    pub fn append(&self, owner: &Username, label: &str, stored: &StoredCredential) -> Result<()> {
        let record = self.require_account(owner)?;
        let key = vault_key(&record)?;

        let mut content = self.read_blob(&record, &key)?.unwrap_or_default();
        if !content.is_empty() {
            content.push('\n');
        }
        content.push_str(&format_line(label, stored));

        self.write_blob(&record, &key, &content)?;
        debug!(username = %owner, label = %label, "Appended vault line");
        Ok(())
    }

    /// Load every stored line, keyed by label.
    ///
    /// A missing or zero-length vault is an empty map. When a label repeats,
    /// the last line wins.
    ///
    /// # Errors
    /// - `VaultCorrupt` if the blob does not decrypt
    /// - `AccountNotFound` if a vault exists without an account record
    pub fn load_all(&self, owner: &Username) -> Result<BTreeMap<String, StoredCredential>> {
        if !self.storage.exists(&ArtifactId::vault(owner))? {
            return Ok(BTreeMap::new());
        }
        let record = self.require_account(owner)?;
        self.load_with_record(&record)
    }

    /// Rewrite the vault from a decrypted snapshot.
    ///
    /// Each secret is re-encrypted under the session key; the blob goes
    /// under the vault key. An empty snapshot deletes the artifact.
    ///
    /// # Errors
    /// - `AccountNotFound` if there is something to write and no account record
    pub fn overwrite(
        &self,
        owner: &Username,
        entries: &BTreeMap<String, CredentialEntry>,
        session: &SessionConfig,
    ) -> Result<()> {
        if entries.is_empty() {
            let removed = self.storage.remove(&ArtifactId::vault(owner))?;
            debug!(username = %owner, removed, "Vault emptied");
            return Ok(());
        }

        let record = self.require_account(owner)?;
        let key = vault_key(&record)?;

        let lines = entries
            .iter()
            .map(|(label, entry)| -> Result<String> {
                let stored = StoredCredential {
                    username: entry.username.clone(),
                    ciphertext: session.encrypt(entry.secret.expose())?,
                    expiration: entry.expiration,
                };
                Ok(format_line(label, &stored))
            })
            .collect::<Result<Vec<_>>>()?;

        self.write_blob(&record, &key, &lines.join("\n"))?;
        debug!(username = %owner, entries = entries.len(), "Vault rewritten");
        Ok(())
    }

    pub(crate) fn load_with_record(
        &self,
        record: &AccountRecord,
    ) -> Result<BTreeMap<String, StoredCredential>> {
        let key = vault_key(record)?;
        let Some(content) = self.read_blob(record, &key)? else {
            return Ok(BTreeMap::new());
        };

        let mut credentials = BTreeMap::new();
        for line in content.split('\n') {
            if let Some((label, stored)) = parse_line(line) {
                if credentials.insert(label.clone(), stored).is_some() {
                    warn!(username = %record.username, label = %label, "Duplicate vault label, keeping last");
                }
            }
        }

        debug!(username = %record.username, entries = credentials.len(), "Vault loaded");
        Ok(credentials)
    }

    fn require_account(&self, owner: &Username) -> Result<AccountRecord> {
        self.accounts
            .load(owner)?
            .ok_or_else(|| Error::AccountNotFound(owner.to_string()))
    }

    fn read_blob(&self, record: &AccountRecord, key: &DerivedKey) -> Result<Option<String>> {
        let bytes = match self.storage.read(&ArtifactId::vault(&record.username))? {
            Some(bytes) if !bytes.is_empty() => bytes,
            _ => return Ok(None),
        };

        let plaintext = decrypt_raw(&bytes, ENVELOPE_ALGORITHM, ENVELOPE_MODE, key, &record.iv)
            .map_err(|e| Error::VaultCorrupt(e.to_string()))?;
        let content = String::from_utf8(plaintext)
            .map_err(|_| Error::VaultCorrupt("vault content is not UTF-8".to_string()))?;
        Ok(Some(content))
    }

    fn write_blob(&self, record: &AccountRecord, key: &DerivedKey, content: &str) -> Result<()> {
        let ciphertext =
            encrypt_raw(content.as_bytes(), ENVELOPE_ALGORITHM, ENVELOPE_MODE, key, &record.iv)?;
        self.storage
            .write(&ArtifactId::vault(&record.username), &ciphertext)
    }
}

fn vault_key(record: &AccountRecord) -> Result<DerivedKey> {
    envelope_key(&record.username, VAULT_KEY_SUFFIX, &record.salt)
}
