// SPDX-License-Identifier: LGPL-3.0-only
//! The filesystem accessor seam.
//!
//! Every filesystem operation the explorer performs goes through a
//! [`FileSystemAccessor`]. The native implementation talks to the host
//! filesystem; the in-memory one backs the preview mode and the tests.

use crate::filesystem::entry::{DirectoryEntry, FileDetails};
use crate::filesystem::error::FsResult;
use crate::filesystem::local::LocalAccessor;
use crate::filesystem::memory::MemoryAccessor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Filesystem operations used by navigation, the bridge and the query forwarder.
///
/// All paths except the listing path must be absolute. Implementations must
/// be safe to call concurrently; calls never share mutable state.
#[async_trait]
pub trait FileSystemAccessor: Send + Sync {
    /// List the entries of a directory.
    ///
    /// `None` (or an empty path) lists the home directory. Entries whose
    /// metadata cannot be read are skipped. The order is whatever the
    /// underlying enumeration yields.
    async fn list(&self, path: Option<&Path>) -> FsResult<Vec<DirectoryEntry>>;

    /// Metadata of a single path, following symlinks.
    async fn details(&self, path: &Path) -> FsResult<FileDetails>;

    /// Create a directory and any missing parents. Succeeds if it already exists.
    async fn create_directory(&self, path: &Path) -> FsResult<()>;

    /// Remove a file, or a directory with everything inside it.
    async fn delete(&self, path: &Path) -> FsResult<()>;

    /// Rename `src` to `dst`. Fails if `dst` already exists.
    async fn move_entry(&self, src: &Path, dst: &Path) -> FsResult<()>;

    /// Duplicate `src` at `dst`, recursively for directories.
    async fn copy_entry(&self, src: &Path, dst: &Path) -> FsResult<()>;

    /// Read a whole file as UTF-8 text.
    async fn read_text(&self, path: &Path) -> FsResult<String>;

    /// Replace the contents of a file with `content`.
    async fn write_text(&self, path: &Path, content: &str) -> FsResult<()>;

    /// Whether anything exists at `path`.
    async fn exists(&self, path: &Path) -> bool;

    /// The directory listed when no path is given.
    fn home_dir(&self) -> PathBuf;
}

/// Which accessor implementation to run with.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessorBackend {
    /// Native when the home directory is readable, in-memory otherwise.
    #[default]
    Auto,
    Native,
    Memory,
}

/// Pick the accessor once at startup.
pub fn select_accessor(backend: AccessorBackend) -> Arc<dyn FileSystemAccessor> {
    match backend {
        AccessorBackend::Native => Arc::new(LocalAccessor::new()),
        AccessorBackend::Memory => Arc::new(MemoryAccessor::with_sample_tree()),
        AccessorBackend::Auto => {
            let local = LocalAccessor::new();
            if std::fs::read_dir(local.home_dir()).is_ok() {
                Arc::new(local)
            } else {
                log::warn!(
                    "home directory {:?} is not readable, using the in-memory filesystem",
                    local.home_dir()
                );
                Arc::new(MemoryAccessor::with_sample_tree())
            }
        },
    }
}

/// Resolve the listing path, substituting the home directory for an empty one.
pub(crate) fn listing_path(accessor_home: PathBuf, path: Option<&Path>) -> PathBuf {
    match path {
        Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
        _ => accessor_home,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_listing_path_means_home() {
        let home = PathBuf::from("/home/me");
        assert_eq!(listing_path(home.clone(), None), home);
        assert_eq!(listing_path(home.clone(), Some(Path::new(""))), home);
        assert_eq!(
            listing_path(home, Some(Path::new("/srv"))),
            PathBuf::from("/srv")
        );
    }

    #[test]
    fn backend_parses_lowercase() {
        let backend: AccessorBackend = serde_json::from_str("\"memory\"").unwrap();
        assert_eq!(backend, AccessorBackend::Memory);
        assert_eq!(AccessorBackend::default(), AccessorBackend::Auto);
    }

    #[tokio::test]
    async fn memory_backend_is_selectable() {
        let accessor = select_accessor(AccessorBackend::Memory);
        let home = accessor.home_dir();
        assert!(accessor.exists(&home).await);
    }
}
