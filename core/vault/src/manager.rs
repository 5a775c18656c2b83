//! Vault manager: entry point for account registration and login.

use std::path::Path;
use std::sync::Arc;

use crate::account::AccountStore;
use crate::session::CredentialSession;
use credvault_common::{Result, Username};
use credvault_crypto::{Algorithm, Mode};
use credvault_storage::{LocalStorage, StorageBackend};

/// Vault manager for registering accounts and opening sessions.
#[derive(Clone)]
pub struct VaultManager {
    storage: Arc<dyn StorageBackend>,
}

impl VaultManager {
    /// Create a manager over any storage backend.
    pub fn new(storage: Arc<dyn StorageBackend>) -> Self {
        Self { storage }
    }

    /// Create a manager storing artifacts as files under `root`.
    pub fn local(root: impl AsRef<Path>) -> Self {
        Self::new(Arc::new(LocalStorage::new(root)))
    }

    /// Get the storage backend.
    pub fn storage(&self) -> Arc<dyn StorageBackend> {
        self.storage.clone()
    }

    /// Register a new account.
    ///
    /// # Preconditions
    /// - Username and master password are non-empty
    /// - `algorithm` supports `mode`
    ///
    /// # Postconditions
    /// - Account artifact is persisted
    /// - Returns an active session with an empty vault
    ///
    /// # Errors
    /// - `InvalidInput` for an empty or path-like username
    /// - `AccountAlreadyExists`
    /// - `UnsupportedCombination`
    pub fn register(
        &self,
        username: &str,
        master_password: &str,
        algorithm: Algorithm,
        mode: Mode,
    ) -> Result<CredentialSession> {
        let username = Username::new(username)?;
        CredentialSession::register(
            self.storage.clone(),
            &username,
            master_password,
            algorithm,
            mode,
        )
    }

    /// Open an existing account.
    ///
    /// # Errors
    /// - `AccountNotFound`
    /// - `InvalidCredential` on a wrong master password
    /// - `MalformedRecord` / `VaultCorrupt` if artifacts are damaged
    pub fn login(&self, username: &str, master_password: &str) -> Result<CredentialSession> {
        let username = Username::new(username)?;
        CredentialSession::login(self.storage.clone(), &username, master_password)
    }

    /// Check if an account exists.
    pub fn account_exists(&self, username: &str) -> Result<bool> {
        let username = Username::new(username)?;
        AccountStore::new(self.storage.clone()).exists(&username)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use credvault_common::Error;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_register_then_exists() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path().join("user_data"));

        assert!(!manager.account_exists("alice").unwrap());
        manager
            .register("alice", "masterpw123", Algorithm::Aes, Mode::Gcm)
            .unwrap();

        assert!(manager.account_exists("alice").unwrap());
        assert!(temp.path().join("user_data").join("alice_config.txt").is_file());
    }

    #[test]
    fn test_invalid_usernames() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path());

        assert!(matches!(
            manager.register("", "pw", Algorithm::Aes, Mode::Gcm),
            Err(Error::InvalidInput(_))
        ));
        assert!(manager.login("../etc", "pw").is_err());
        assert!(manager.account_exists("a/b").is_err());
    }

    #[test]
    fn test_alice_scenario() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path());
        let gmail_expiry = NaiveDate::from_ymd_opt(2099, 1, 1);

        let mut session = manager
            .register("alice", "masterpw123", Algorithm::Aes, Mode::Gcm)
            .unwrap();
        session
            .add_credential("Gmail", "alice@x.com", "secret1", gmail_expiry)
            .unwrap();
        session
            .add_credential("Work", "alice.w", "secret2", None)
            .unwrap();
        drop(session);

        let mut session = manager.login("alice", "masterpw123").unwrap();
        assert_eq!(session.list_credentials().unwrap(), vec!["Gmail", "Work"]);

        let gmail = session.get_credential("Gmail").unwrap().unwrap();
        assert_eq!(gmail.username, "alice@x.com");
        assert_eq!(gmail.secret.expose(), "secret1");
        assert_eq!(gmail.expiration, gmail_expiry);

        let work = session.get_credential("Work").unwrap().unwrap();
        assert_eq!(work.username, "alice.w");
        assert_eq!(work.secret.expose(), "secret2");
        assert_eq!(work.expiration, None);

        assert!(session.delete_credential("Gmail").unwrap());
        drop(session);

        let session = manager.login("alice", "masterpw123").unwrap();
        assert_eq!(session.list_credentials().unwrap(), vec!["Work"]);
    }

    #[test]
    fn test_bob_wrong_password_leaves_artifacts_unchanged() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path());

        let mut session = manager
            .register("bob", "pw", Algorithm::DesEde, Mode::Cbc)
            .unwrap();
        session.add_credential("Forum", "bob", "hunter2", None).unwrap();
        drop(session);

        let account_before = fs::read(temp.path().join("bob_config.txt")).unwrap();
        let vault_before = fs::read(temp.path().join("bob_passwords.txt")).unwrap();

        assert!(matches!(
            manager.login("bob", "wrong"),
            Err(Error::InvalidCredential)
        ));

        assert_eq!(fs::read(temp.path().join("bob_config.txt")).unwrap(), account_before);
        assert_eq!(fs::read(temp.path().join("bob_passwords.txt")).unwrap(), vault_before);
    }

    #[test]
    fn test_accounts_are_isolated() {
        let temp = TempDir::new().unwrap();
        let manager = VaultManager::local(temp.path());

        let mut alice = manager
            .register("alice", "a-pw", Algorithm::Aes, Mode::Ecb)
            .unwrap();
        alice.add_credential("Gmail", "alice", "s1", None).unwrap();
        manager
            .register("carol", "c-pw", Algorithm::Des, Mode::Cbc)
            .unwrap();

        let carol = manager.login("carol", "c-pw").unwrap();
        assert!(carol.list_credentials().unwrap().is_empty());
        assert!(matches!(
            manager.login("alice", "c-pw"),
            Err(Error::InvalidCredential)
        ));
    }
}
