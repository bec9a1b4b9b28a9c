//! Storage backends for crawled Markdown output
//!
//! The crawl engine persists through the [`Storage`] trait; backends are
//! selected by [`create_storage`] from a [`StorageConfig`]. Only the local
//! filesystem backend ships with this crate. The cloud and SFTP kinds are
//! recognized in configuration so deployments can slot in their own adapters,
//! but selecting one here returns [`StorageError::UnsupportedBackend`].

mod local;
mod traits;

pub use local::LocalStorage;
pub use traits::{sanitize_path, Storage, StorageError, StorageResult};

use serde::Deserialize;

/// Default output directory for the local backend
pub const DEFAULT_OUTPUT_DIR: &str = "downloaded_docs";

/// Recognized storage backend kinds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StorageKind {
    Local,
    S3,
    Gcs,
    Azure,
    Sftp,
}

impl StorageKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StorageKind::Local => "local",
            StorageKind::S3 => "s3",
            StorageKind::Gcs => "gcs",
            StorageKind::Azure => "azure",
            StorageKind::Sftp => "sftp",
        }
    }
}

/// Storage backend configuration
#[derive(Debug, Clone, Deserialize)]
pub struct StorageConfig {
    /// Backend kind
    #[serde(default = "default_kind")]
    pub kind: StorageKind,

    /// Output directory (local backend)
    #[serde(default = "default_output")]
    pub output: String,

    /// Bucket name (s3, gcs)
    #[serde(default)]
    pub bucket: Option<String>,

    /// Project ID (gcs)
    #[serde(default)]
    pub project: Option<String>,

    /// Path to a credentials file (gcs)
    #[serde(default)]
    pub credentials: Option<String>,

    /// Region (s3)
    #[serde(default)]
    pub region: Option<String>,

    /// Custom endpoint URL (s3-compatible stores)
    #[serde(default)]
    pub endpoint: Option<String>,

    /// Container name (azure)
    #[serde(default)]
    pub container: Option<String>,

    /// Host (sftp)
    #[serde(default)]
    pub host: Option<String>,

    /// Username (sftp)
    #[serde(default)]
    pub username: Option<String>,

    /// Remote base path (sftp)
    #[serde(default, rename = "remote-path")]
    pub remote_path: Option<String>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            kind: StorageKind::Local,
            output: DEFAULT_OUTPUT_DIR.to_string(),
            bucket: None,
            project: None,
            credentials: None,
            region: None,
            endpoint: None,
            container: None,
            host: None,
            username: None,
            remote_path: None,
        }
    }
}

fn default_kind() -> StorageKind {
    StorageKind::Local
}

fn default_output() -> String {
    DEFAULT_OUTPUT_DIR.to_string()
}

/// Creates the storage backend selected by the configuration
pub fn create_storage(config: &StorageConfig) -> StorageResult<Box<dyn Storage>> {
    match config.kind {
        StorageKind::Local => Ok(Box::new(LocalStorage::new(config.output.clone())?)),
        other => Err(StorageError::UnsupportedBackend(other.as_str().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_create_local_storage() {
        let dir = TempDir::new().unwrap();
        let config = StorageConfig {
            output: dir.path().to_string_lossy().into_owned(),
            ..StorageConfig::default()
        };
        let storage = create_storage(&config).unwrap();
        storage.save("a.md", "x").unwrap();
        assert!(storage.exists("a.md").unwrap());
    }

    #[test]
    fn test_cloud_kinds_are_unsupported() {
        for kind in [StorageKind::S3, StorageKind::Gcs, StorageKind::Azure, StorageKind::Sftp] {
            let config = StorageConfig {
                kind,
                ..StorageConfig::default()
            };
            assert!(matches!(
                create_storage(&config),
                Err(StorageError::UnsupportedBackend(_))
            ));
        }
    }

    #[test]
    fn test_kind_deserializes_lowercase() {
        let config: StorageConfig = toml::from_str("kind = \"s3\"\nbucket = \"b\"").unwrap();
        assert_eq!(config.kind, StorageKind::S3);
    }
}
