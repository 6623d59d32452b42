// SPDX-License-Identifier: LGPL-3.0-only
//! Error types for the filesystem accessor.

use std::io;
use std::path::{Path, PathBuf};

/// Errors returned by a [`FileSystemAccessor`](super::FileSystemAccessor).
#[derive(Debug, thiserror::Error)]
pub enum FsError {
    #[error("no such file or directory: {0}")]
    NotFound(PathBuf),
    #[error("permission denied: {0}")]
    PermissionDenied(PathBuf),
    #[error("destination already exists: {0}")]
    AlreadyExists(PathBuf),
    #[error("a file already exists at {0}")]
    AlreadyExistsAsFile(PathBuf),
    #[error("invalid path: {0}")]
    InvalidPath(String),
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

impl FsError {
    /// Map an I/O error raised while touching `path`.
    pub fn from_io(path: &Path, err: io::Error) -> Self {
        match err.kind() {
            io::ErrorKind::NotFound => FsError::NotFound(path.to_path_buf()),
            io::ErrorKind::PermissionDenied => FsError::PermissionDenied(path.to_path_buf()),
            io::ErrorKind::AlreadyExists => FsError::AlreadyExists(path.to_path_buf()),
            _ => FsError::Io {
                path: path.to_path_buf(),
                source: err,
            },
        }
    }

    /// Stable tag used on the IPC surface.
    pub fn kind(&self) -> &'static str {
        match self {
            FsError::NotFound(_) => "NotFound",
            FsError::PermissionDenied(_) => "PermissionDenied",
            FsError::AlreadyExists(_) | FsError::AlreadyExistsAsFile(_) => "AlreadyExists",
            FsError::InvalidPath(_) => "InvalidPath",
            FsError::Io { .. } => "Io",
        }
    }
}

/// Result alias for accessor operations.
pub type FsResult<T> = Result<T, FsError>;

/// Reject relative paths.
pub fn require_absolute(path: &Path) -> FsResult<()> {
    if path.as_os_str().is_empty() {
        return Err(FsError::InvalidPath("empty path".to_string()));
    }
    if !path.is_absolute() {
        return Err(FsError::InvalidPath(path.display().to_string()));
    }
    Ok(())
}
