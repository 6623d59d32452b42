// SPDX-License-Identifier: LGPL-3.0-only
//! Root location enumeration.
//!
//! The roots seed the navigation tree: `/` on Unix-like hosts, fixed-disk
//! drive letters on Windows, and `/` plus the drive mounts on WSL. The
//! strategy is chosen once from a [`HostProbe`].

mod unix;
mod windows;
mod wsl;

pub use unix::UnixRoots;
pub use windows::{DriveSource, NativeDriveSource, WindowsRoots};
pub use wsl::WslRoots;

use crate::filesystem::FileSystemAccessor;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::sync::Arc;

/// Errors raised by a root strategy.
#[derive(Debug, thiserror::Error)]
pub enum RootError {
    #[error("drive enumeration failed: {0}")]
    Drives(String),
    #[error("cannot read mount directory: {0}")]
    Mounts(#[from] crate::filesystem::FsError),
}

/// A strategy producing the root locations of the host.
#[async_trait]
pub trait RootEnumerator: Send + Sync {
    /// Absolute root paths, in display order.
    async fn roots(&self) -> Result<Vec<PathBuf>, RootError>;

    /// Short strategy name for logs.
    fn name(&self) -> &'static str;
}

/// Operating system family reported by the probe.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HostOs {
    Windows,
    MacOs,
    Linux,
    Other,
}

/// What the root strategy selection depends on.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostProbe {
    pub os: HostOs,
    /// Kernel release string, e.g. `5.15.90.1-microsoft-standard-WSL2`.
    pub kernel_release: Option<String>,
}

impl HostProbe {
    /// Probe the running host.
    pub fn detect() -> Self {
        let os = match std::env::consts::OS {
            "windows" => HostOs::Windows,
            "macos" => HostOs::MacOs,
            "linux" => HostOs::Linux,
            _ => HostOs::Other,
        };
        let kernel_release = if os == HostOs::Linux {
            std::fs::read_to_string("/proc/sys/kernel/osrelease")
                .ok()
                .map(|s| s.trim().to_string())
        } else {
            None
        };
        Self { os, kernel_release }
    }

    /// Whether this is a Linux kernel running under Windows.
    pub fn is_wsl(&self) -> bool {
        self.kernel_release.as_deref().is_some_and(|release| {
            let release = release.to_lowercase();
            release.contains("microsoft") || release.contains("wsl")
        })
    }
}

/// Pick the root strategy for `probe`.
pub fn select_root_enumerator(
    probe: &HostProbe,
    accessor: Arc<dyn FileSystemAccessor>,
) -> Box<dyn RootEnumerator> {
    let enumerator: Box<dyn RootEnumerator> = if probe.is_wsl() {
        Box::new(WslRoots::new(accessor))
    } else if probe.os == HostOs::Windows {
        Box::new(WindowsRoots::new(NativeDriveSource))
    } else {
        Box::new(UnixRoots)
    };
    log::debug!("using {} root enumeration", enumerator.name());
    enumerator
}

/// Result of a root enumeration, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RootListing {
    pub success: bool,
    pub directories: Vec<PathBuf>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl RootListing {
    pub fn ok(directories: Vec<PathBuf>) -> Self {
        Self {
            success: true,
            directories,
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            directories: Vec::new(),
            error: Some(error.into()),
        }
    }
}

/// Run `enumerator`, turning any failure into a listing with an error message.
pub async fn enumerate_roots(enumerator: &dyn RootEnumerator) -> RootListing {
    match enumerator.roots().await {
        Ok(roots) => RootListing::ok(roots),
        Err(e) => {
            log::error!("root enumeration ({}) failed: {}", enumerator.name(), e);
            RootListing::failed(e.to_string())
        },
    }
}
