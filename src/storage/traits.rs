//! Storage trait and error types
//!
//! Defines the small interface the crawl engine persists through. Backends
//! receive backend-relative paths and are responsible for sanitizing them.

use std::path::PathBuf;
use thiserror::Error;

/// Errors that can occur during storage operations
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Write failed for {path}: {message}")]
    WriteFailed { path: String, message: String },

    #[error("Storage backend '{0}' is not compiled into this build")]
    UnsupportedBackend(String),

    #[error("Storage configuration error: {0}")]
    Configuration(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Trait for storage backend implementations
///
/// Paths are backend-relative. `append` must be a true append where the
/// backend supports it; a read-modify-write fallback is acceptable otherwise.
pub trait Storage: Send {
    /// Saves content to a file, replacing any existing content
    fn save(&self, path: &str, content: &str) -> StorageResult<()>;

    /// Appends content to a file, creating it if it does not exist
    fn append(&self, path: &str, content: &str) -> StorageResult<()>;

    /// Checks whether a file exists
    fn exists(&self, path: &str) -> StorageResult<bool>;

    /// Retrieves file content, or None if the file does not exist
    fn get(&self, path: &str) -> StorageResult<Option<Vec<u8>>>;
}

/// Sanitizes a backend-relative path against directory traversal
///
/// Strips leading slashes, resolves `..` segments without escaping the root,
/// and removes reserved characters. An empty result defaults to `index.md`.
pub fn sanitize_path(file_path: &str) -> PathBuf {
    let path = file_path
        .trim_start_matches('/')
        .trim_start_matches('\\')
        .replace('\\', "/");

    let mut parts: Vec<String> = Vec::new();
    for part in path.split('/') {
        if part == ".." {
            parts.pop();
        } else if !part.is_empty() && part != "." {
            let cleaned: String = part
                .chars()
                .filter(|c| !matches!(c, '<' | '>' | ':' | '"' | '|' | '?' | '*'))
                .collect();
            if !cleaned.is_empty() {
                parts.push(cleaned);
            }
        }
    }

    if parts.is_empty() {
        PathBuf::from("index.md")
    } else {
        parts.iter().collect()
    }
}
