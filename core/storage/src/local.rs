//! Local filesystem storage backend.

use std::fs;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::debug;

use crate::backend::{ArtifactId, StorageBackend};
use credvault_common::Result;

/// Local filesystem storage backend.
///
/// Stores every artifact as a flat file in one root directory.
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Create a new local backend rooted at `root`.
    ///
    /// The directory is not touched until the first write, which creates
    /// it (including parents) if absent.
    pub fn new(root: impl AsRef<Path>) -> Self {
        Self {
            root: root.as_ref().to_path_buf(),
        }
    }

    /// Root directory of this backend.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Convert an ArtifactId to a filesystem path.
    pub fn path_of(&self, id: &ArtifactId) -> PathBuf {
        self.root.join(id.file_name())
    }
}

impl StorageBackend for LocalStorage {
    fn name(&self) -> &str {
        "local"
    }

    fn read(&self, id: &ArtifactId) -> Result<Option<Vec<u8>>> {
        let path = self.path_of(id);

        match fs::read(&path) {
            Ok(data) => {
                debug!(artifact = %id, bytes = data.len(), "Read artifact");
                Ok(Some(data))
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, id: &ArtifactId, data: &[u8]) -> Result<()> {
        if !self.root.exists() {
            fs::create_dir_all(&self.root)?;
        }

        // Write beside the target, then rename over it, so a crash leaves
        // either the old or the new contents.
        let path = self.path_of(id);
        let staging = self.root.join(format!("{}.tmp", id.file_name()));
        fs::write(&staging, data)?;
        if let Err(e) = fs::rename(&staging, &path) {
            let _ = fs::remove_file(&staging);
            return Err(e.into());
        }

        debug!(artifact = %id, bytes = data.len(), "Wrote artifact");
        Ok(())
    }

    fn remove(&self, id: &ArtifactId) -> Result<bool> {
        match fs::remove_file(self.path_of(id)) {
            Ok(()) => {
                debug!(artifact = %id, "Removed artifact");
                Ok(true)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, id: &ArtifactId) -> Result<bool> {
        Ok(self.path_of(id).is_file())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use credvault_common::Username;
    use tempfile::TempDir;

    fn alice() -> Username {
        Username::new("alice").unwrap()
    }

    #[test]
    fn test_local_write_read() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());
        let id = ArtifactId::account(&alice());

        storage.write(&id, b"Hello, Local!").unwrap();
        let data = storage.read(&id).unwrap();

        assert_eq!(data.as_deref(), Some(&b"Hello, Local!"[..]));
        assert!(temp.path().join("alice_config.txt").is_file());
    }

    #[test]
    fn test_local_read_missing() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());

        assert!(storage.read(&ArtifactId::vault(&alice())).unwrap().is_none());
        assert!(!storage.exists(&ArtifactId::vault(&alice())).unwrap());
    }

    #[test]
    fn test_local_creates_root_on_write() {
        let temp = TempDir::new().unwrap();
        let root = temp.path().join("nested").join("user_data");
        let storage = LocalStorage::new(&root);
        assert!(!root.exists());

        storage.write(&ArtifactId::vault(&alice()), &[1, 2, 3]).unwrap();

        assert!(root.is_dir());
        assert!(!root.join("alice_passwords.txt.tmp").exists());
    }

    #[test]
    fn test_local_overwrite_replaces() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());
        let id = ArtifactId::vault(&alice());

        storage.write(&id, b"first version").unwrap();
        storage.write(&id, b"second").unwrap();

        assert_eq!(storage.read(&id).unwrap().unwrap(), b"second");
    }

    #[test]
    fn test_local_failed_rename_removes_staging() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());
        let id = ArtifactId::account(&alice());

        // A directory in the target's place makes the rename fail.
        fs::create_dir(temp.path().join("alice_config.txt")).unwrap();
        fs::write(temp.path().join("alice_config.txt").join("keep"), b"x").unwrap();

        assert!(storage.write(&id, b"record").is_err());
        assert!(!temp.path().join("alice_config.txt.tmp").exists());
    }

    #[test]
    fn test_local_remove() {
        let temp = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp.path());
        let id = ArtifactId::vault(&alice());

        storage.write(&id, b"data").unwrap();
        assert!(storage.remove(&id).unwrap());
        assert!(!storage.exists(&id).unwrap());
        assert!(!storage.remove(&id).unwrap());
    }
}
