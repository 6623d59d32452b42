use super::{RootEnumerator, RootError};
use async_trait::async_trait;
use std::path::PathBuf;

/// Unix-like hosts have a single root.
#[derive(Debug, Clone, Copy, Default)]
pub struct UnixRoots;

#[async_trait]
impl RootEnumerator for UnixRoots {
    async fn roots(&self) -> Result<Vec<PathBuf>, RootError> {
        Ok(vec![PathBuf::from("/")])
    }

    fn name(&self) -> &'static str {
        "unix"
    }
}
