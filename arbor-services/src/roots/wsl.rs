use super::{RootEnumerator, RootError};
use crate::filesystem::FileSystemAccessor;
use async_trait::async_trait;
use std::path::PathBuf;
use std::sync::Arc;

/// WSL roots: `/` followed by the Windows drives mounted under `/mnt`.
pub struct WslRoots {
    accessor: Arc<dyn FileSystemAccessor>,
    mount_dir: PathBuf,
}

impl WslRoots {
    pub fn new(accessor: Arc<dyn FileSystemAccessor>) -> Self {
        Self::with_mount_dir(accessor, "/mnt")
    }

    pub fn with_mount_dir(accessor: Arc<dyn FileSystemAccessor>, mount_dir: impl Into<PathBuf>) -> Self {
        Self {
            accessor,
            mount_dir: mount_dir.into(),
        }
    }
}

fn is_drive_letter(name: &str) -> bool {
    let mut chars = name.chars();
    matches!((chars.next(), chars.next()), (Some(c), None) if c.is_ascii_alphabetic())
}

#[async_trait]
impl RootEnumerator for WslRoots {
    async fn roots(&self) -> Result<Vec<PathBuf>, RootError> {
        let entries = self.accessor.list(Some(&self.mount_dir)).await?;
        let mut drives: Vec<PathBuf> = entries
            .into_iter()
            .filter(|e| e.is_directory && is_drive_letter(&e.name))
            .map(|e| e.path)
            .collect();
        drives.sort();

        let mut roots = vec![PathBuf::from("/")];
        roots.extend(drives);
        Ok(roots)
    }

    fn name(&self) -> &'static str {
        "wsl"
    }
}
