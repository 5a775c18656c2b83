//! Storage backend trait definition.

use std::fmt;

use credvault_common::{Result, Username};

/// Which of an account's artifacts is addressed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    /// Delimited text record with salt, IV, metadata and verification token.
    Account,
    /// Encrypted credential list.
    Vault,
}

impl ArtifactKind {
    fn suffix(&self) -> &'static str {
        match self {
            ArtifactKind::Account => "_config.txt",
            ArtifactKind::Vault => "_passwords.txt",
        }
    }
}

/// Address of one artifact.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ArtifactId {
    owner: Username,
    kind: ArtifactKind,
}

impl ArtifactId {
    /// The account record of `owner`.
    pub fn account(owner: &Username) -> Self {
        Self {
            owner: owner.clone(),
            kind: ArtifactKind::Account,
        }
    }

    /// The vault record of `owner`.
    pub fn vault(owner: &Username) -> Self {
        Self {
            owner: owner.clone(),
            kind: ArtifactKind::Vault,
        }
    }

    /// Account that owns the artifact.
    pub fn owner(&self) -> &Username {
        &self.owner
    }

    /// Artifact kind.
    pub fn kind(&self) -> ArtifactKind {
        self.kind
    }

    /// File name used by directory-backed storage, e.g. `alice_config.txt`.
    pub fn file_name(&self) -> String {
        format!("{}{}", self.owner.as_str(), self.kind.suffix())
    }
}

impl fmt::Display for ArtifactId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.file_name())
    }
}

/// Storage backend for account and vault artifacts.
///
/// Backends perform no locking across processes: two writers of the same
/// artifact race and the last write wins.
pub trait StorageBackend: Send + Sync {
    /// Get the backend name (e.g., "local", "memory").
    fn name(&self) -> &str;

    /// Read an artifact.
    ///
    /// # Returns
    /// - `Ok(None)` if the artifact does not exist
    /// - `Ok(Some(bytes))` otherwise, possibly empty
    fn read(&self, id: &ArtifactId) -> Result<Option<Vec<u8>>>;

    /// Replace an artifact's contents, creating it if needed.
    ///
    /// # Postconditions
    /// - The backing location (e.g. root directory) exists
    /// - A subsequent `read` returns exactly `data`
    fn write(&self, id: &ArtifactId, data: &[u8]) -> Result<()>;

    /// Delete an artifact.
    ///
    /// # Returns
    /// Whether the artifact existed. Removing an absent artifact is not an error.
    fn remove(&self, id: &ArtifactId) -> Result<bool>;

    /// Check if an artifact exists.
    fn exists(&self, id: &ArtifactId) -> Result<bool>;
}
