//! Local filesystem storage backend

use crate::storage::traits::{sanitize_path, Storage, StorageResult};
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

/// Stores files under a root directory on the local filesystem
#[derive(Debug)]
pub struct LocalStorage {
    root: PathBuf,
}

impl LocalStorage {
    /// Creates a local storage backend rooted at `root`, creating the
    /// directory if needed
    pub fn new(root: impl Into<PathBuf>) -> StorageResult<Self> {
        let root = root.into();
        fs::create_dir_all(&root)?;
        tracing::info!("Initialized local storage at {}", root.display());
        Ok(Self { root })
    }

    fn full_path(&self, file_path: &str) -> PathBuf {
        self.root.join(sanitize_path(file_path))
    }

    fn ensure_parent(path: &Path) -> StorageResult<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        Ok(())
    }
}

impl Storage for LocalStorage {
    fn save(&self, path: &str, content: &str) -> StorageResult<()> {
        let full = self.full_path(path);
        Self::ensure_parent(&full)?;
        fs::write(&full, content)?;
        tracing::debug!("Saved {}", full.display());
        Ok(())
    }

    fn append(&self, path: &str, content: &str) -> StorageResult<()> {
        let full = self.full_path(path);
        Self::ensure_parent(&full)?;
        let mut file = OpenOptions::new().create(true).append(true).open(&full)?;
        file.write_all(content.as_bytes())?;
        Ok(())
    }

    fn exists(&self, path: &str) -> StorageResult<bool> {
        Ok(self.full_path(path).exists())
    }

    fn get(&self, path: &str) -> StorageResult<Option<Vec<u8>>> {
        let full = self.full_path(path);
        if !full.exists() {
            return Ok(None);
        }
        Ok(Some(fs::read(&full)?))
    }
}
