// SPDX-License-Identifier: LGPL-3.0-only
//! Breadcrumb segments of an absolute path.

use std::path::PathBuf;

/// Path flavor used to split and rebuild breadcrumbs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Windows,
    Unix,
}

impl Platform {
    pub fn current() -> Self {
        if cfg!(windows) {
            Platform::Windows
        } else {
            Platform::Unix
        }
    }
}

/// The clickable components of a path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegments {
    platform: Platform,
    segments: Vec<String>,
}

fn drive_prefix(path: &str) -> Option<&str> {
    let bytes = path.as_bytes();
    if bytes.len() >= 2 && bytes[0].is_ascii_alphabetic() && bytes[1] == b':' {
        Some(&path[..2])
    } else {
        None
    }
}

impl PathSegments {
    /// Split `path` into segments.
    ///
    /// On Windows a leading `C:` drive is a single segment and both slash
    /// kinds separate components. Empty components are dropped.
    pub fn parse(path: &str, platform: Platform) -> Self {
        let segments = match platform {
            Platform::Windows => {
                let (drive, rest) = match drive_prefix(path) {
                    Some(drive) => (Some(drive.to_ascii_uppercase()), &path[2..]),
                    None => (None, path),
                };
                drive
                    .into_iter()
                    .chain(
                        rest.split(['\\', '/'])
                            .filter(|s| !s.is_empty())
                            .map(str::to_string),
                    )
                    .collect()
            },
            Platform::Unix => path
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        };
        Self { platform, segments }
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    pub fn len(&self) -> usize {
        self.segments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.segments.is_empty()
    }

    /// Absolute path of the segment at `index` (inclusive).
    pub fn path_for(&self, index: usize) -> Option<PathBuf> {
        let parts = self.segments.get(..=index)?;
        let path = match self.platform {
            Platform::Windows => {
                let mut joined = parts.join("\\");
                if drive_prefix(&joined).is_some() && parts.len() == 1 {
                    joined.push('\\');
                }
                joined
            },
            Platform::Unix => format!("/{}", parts.join("/")),
        };
        Some(PathBuf::from(path))
    }

    /// The root the segments hang off: `/` on Unix, the drive on Windows.
    pub fn root(&self) -> PathBuf {
        match self.platform {
            Platform::Unix => PathBuf::from("/"),
            Platform::Windows => self.path_for(0).unwrap_or_else(|| PathBuf::from("C:\\")),
        }
    }
}
