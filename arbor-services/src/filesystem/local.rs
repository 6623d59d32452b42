// SPDX-License-Identifier: LGPL-3.0-only
//! Native filesystem accessor.

use crate::filesystem::accessor::{listing_path, FileSystemAccessor};
use crate::filesystem::entry::{DirectoryEntry, FileDetails};
use crate::filesystem::error::{require_absolute, FsError, FsResult};
use crate::io_helpers::{copy_tree, read_file_to_string, unblock};
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// Accessor backed by the host filesystem.
///
/// Each operation runs on the blocking pool, so a slow directory never
/// stalls other requests.
#[derive(Debug, Clone)]
pub struct LocalAccessor {
    home: PathBuf,
}

impl LocalAccessor {
    /// Create an accessor rooted at the current user's home directory.
    pub fn new() -> Self {
        let home = crate::places::home_dir().unwrap_or_else(fallback_root);
        Self { home }
    }

    /// Create an accessor with an explicit home directory.
    pub fn with_home(home: impl Into<PathBuf>) -> Self {
        Self { home: home.into() }
    }
}

impl Default for LocalAccessor {
    fn default() -> Self {
        Self::new()
    }
}

fn fallback_root() -> PathBuf {
    if cfg!(windows) {
        PathBuf::from("C:\\")
    } else {
        PathBuf::from("/")
    }
}

/// Reject a destination inside the source tree.
///
/// Both sides are resolved first so links and `..` cannot hide the overlap.
fn ensure_outside(src: &Path, dst: &Path) -> FsResult<()> {
    let src = std::fs::canonicalize(src).map_err(|e| FsError::from_io(src, e))?;
    let resolved = match (dst.parent(), dst.file_name()) {
        (Some(parent), Some(name)) => std::fs::canonicalize(parent)
            .map(|p| p.join(name))
            .unwrap_or_else(|_| dst.to_path_buf()),
        _ => dst.to_path_buf(),
    };
    if resolved.starts_with(&src) {
        return Err(FsError::InvalidPath(format!(
            "{} is inside {}",
            dst.display(),
            src.display()
        )));
    }
    Ok(())
}

fn read_directory(dir: &Path) -> FsResult<Vec<DirectoryEntry>> {
    let reader = std::fs::read_dir(dir).map_err(|e| FsError::from_io(dir, e))?;
    let mut entries = Vec::new();

    for item in reader {
        let item = match item {
            Ok(item) => item,
            Err(e) => {
                log::debug!("skipping unreadable entry in {:?}: {}", dir, e);
                continue;
            },
        };
        let name = item.file_name().to_string_lossy().into_owned();
        let is_symlink = item.file_type().map(|t| t.is_symlink()).unwrap_or(false);
        // Follows symlinks; dangling links and unreadable entries are dropped.
        match std::fs::metadata(item.path()) {
            Ok(metadata) => {
                entries.push(DirectoryEntry::from_metadata(dir, name, &metadata, is_symlink))
            },
            Err(e) => log::debug!("skipping {:?}: {}", item.path(), e),
        }
    }

    Ok(entries)
}

fn ensure_free(dst: &Path) -> FsResult<()> {
    if std::fs::symlink_metadata(dst).is_ok() {
        return Err(FsError::AlreadyExists(dst.to_path_buf()));
    }
    Ok(())
}

fn ensure_present(src: &Path) -> FsResult<std::fs::Metadata> {
    std::fs::symlink_metadata(src).map_err(|e| FsError::from_io(src, e))
}

#[async_trait]
impl FileSystemAccessor for LocalAccessor {
    async fn list(&self, path: Option<&Path>) -> FsResult<Vec<DirectoryEntry>> {
        let dir = listing_path(self.home.clone(), path);
        require_absolute(&dir)?;
        log::debug!("listing {:?}", dir);
        unblock(move || read_directory(&dir)).await
    }

    async fn details(&self, path: &Path) -> FsResult<FileDetails> {
        require_absolute(path)?;
        let path = path.to_path_buf();
        unblock(move || {
            std::fs::metadata(&path)
                .map(|m| FileDetails::from_metadata(&m))
                .map_err(|e| FsError::from_io(&path, e))
        })
        .await
    }

    async fn create_directory(&self, path: &Path) -> FsResult<()> {
        require_absolute(path)?;
        let path = path.to_path_buf();
        unblock(move || {
            if let Ok(metadata) = std::fs::metadata(&path) {
                if metadata.is_dir() {
                    return Ok(());
                }
                return Err(FsError::AlreadyExistsAsFile(path));
            }
            std::fs::create_dir_all(&path).map_err(|e| match e.kind() {
                std::io::ErrorKind::AlreadyExists => FsError::AlreadyExistsAsFile(path.clone()),
                _ => FsError::from_io(&path, e),
            })
        })
        .await
    }

    async fn delete(&self, path: &Path) -> FsResult<()> {
        require_absolute(path)?;
        let target = path.to_path_buf();
        unblock(move || {
            let metadata = ensure_present(&target)?;
            let result = if metadata.is_dir() {
                std::fs::remove_dir_all(&target)
            } else {
                std::fs::remove_file(&target)
            };
            result.map_err(|e| FsError::from_io(&target, e))
        })
        .await?;
        log::info!("deleted {:?}", path);
        Ok(())
    }

    async fn move_entry(&self, src: &Path, dst: &Path) -> FsResult<()> {
        require_absolute(src)?;
        require_absolute(dst)?;
        let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
        unblock(move || {
            let metadata = ensure_present(&src)?;
            ensure_free(&dst)?;
            if metadata.is_dir() {
                ensure_outside(&src, &dst)?;
            }
            std::fs::rename(&src, &dst).map_err(|e| FsError::from_io(&src, e))
        })
        .await
    }

    async fn copy_entry(&self, src: &Path, dst: &Path) -> FsResult<()> {
        require_absolute(src)?;
        require_absolute(dst)?;
        let (src, dst) = (src.to_path_buf(), dst.to_path_buf());
        unblock(move || {
            let metadata = std::fs::metadata(&src).map_err(|e| FsError::from_io(&src, e))?;
            ensure_free(&dst)?;
            if metadata.is_dir() {
                ensure_outside(&src, &dst)?;
            }
            copy_tree(&src, &dst).map_err(|e| FsError::from_io(&dst, e))
        })
        .await
    }

    async fn read_text(&self, path: &Path) -> FsResult<String> {
        require_absolute(path)?;
        read_file_to_string(path)
            .await
            .map_err(|e| FsError::from_io(path, e))
    }

    async fn write_text(&self, path: &Path, content: &str) -> FsResult<()> {
        require_absolute(path)?;
        let path = path.to_path_buf();
        let content = content.to_owned();
        unblock(move || std::fs::write(&path, content).map_err(|e| FsError::from_io(&path, e)))
            .await
    }

    async fn exists(&self, path: &Path) -> bool {
        if !path.is_absolute() {
            return false;
        }
        let path = path.to_path_buf();
        unblock(move || path.exists()).await
    }

    fn home_dir(&self) -> PathBuf {
        self.home.clone()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn list_skips_dangling_symlinks() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("a.txt"), "abc").unwrap();
        #[cfg(unix)]
        std::os::unix::fs::symlink(dir.path().join("missing"), dir.path().join("broken")).unwrap();

        let accessor = LocalAccessor::with_home(dir.path());
        let entries = accessor.list(None).await.unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].name, "a.txt");
        assert_eq!(entries[0].size, 3);
        assert_eq!(entries[0].path, dir.path().join("a.txt"));
    }

    #[tokio::test]
    async fn create_directory_over_file_fails() {
        let dir = tempfile::tempdir().unwrap();
        let file = dir.path().join("taken");
        std::fs::write(&file, "").unwrap();

        let accessor = LocalAccessor::with_home(dir.path());
        let err = accessor.create_directory(&file).await.unwrap_err();
        assert!(matches!(err, FsError::AlreadyExistsAsFile(_)));
    }

    #[tokio::test]
    async fn relative_list_path_is_invalid() {
        let accessor = LocalAccessor::with_home("/");
        let err = accessor.list(Some(Path::new("relative"))).await.unwrap_err();
        assert!(matches!(err, FsError::InvalidPath(_)));
    }
}
