// SPDX-License-Identifier: LGPL-3.0-only
//! Well-known user locations.
//!
//! Home, the XDG user directories (read from `user-dirs.dirs` the way GLib
//! does, falling back to the platform's notion of each directory) and the
//! platform trash folder.

use crate::filesystem::FileSystemAccessor;
use crate::roots::HostOs;
use directories::UserDirs;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use smol::fs;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::{Mutex, PoisonError};

/// User directory types, matching GLib's `GUserDirectory` enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UserDirectory {
    Desktop,
    Documents,
    Download,
    Music,
    Pictures,
    PublicShare,
    Templates,
    Videos,
}

impl UserDirectory {
    const KEYS: [(&'static str, UserDirectory); 8] = [
        ("XDG_DESKTOP_DIR", UserDirectory::Desktop),
        ("XDG_DOCUMENTS_DIR", UserDirectory::Documents),
        ("XDG_DOWNLOAD_DIR", UserDirectory::Download),
        ("XDG_MUSIC_DIR", UserDirectory::Music),
        ("XDG_PICTURES_DIR", UserDirectory::Pictures),
        ("XDG_PUBLICSHARE_DIR", UserDirectory::PublicShare),
        ("XDG_TEMPLATES_DIR", UserDirectory::Templates),
        ("XDG_VIDEOS_DIR", UserDirectory::Videos),
    ];

    fn from_key(key: &str) -> Option<Self> {
        Self::KEYS.iter().find(|(k, _)| *k == key).map(|(_, d)| *d)
    }

    fn platform_default(self, user_dirs: &UserDirs) -> Option<PathBuf> {
        let dir = match self {
            UserDirectory::Desktop => user_dirs.desktop_dir(),
            UserDirectory::Documents => user_dirs.document_dir(),
            UserDirectory::Download => user_dirs.download_dir(),
            UserDirectory::Music => user_dirs.audio_dir(),
            UserDirectory::Pictures => user_dirs.picture_dir(),
            UserDirectory::PublicShare => user_dirs.public_dir(),
            UserDirectory::Templates => user_dirs.template_dir(),
            UserDirectory::Videos => user_dirs.video_dir(),
        };
        dir.map(Path::to_path_buf)
    }
}

/// Parse the contents of a `user-dirs.dirs` file.
///
/// Lines look like `XDG_DESKTOP_DIR="$HOME/Desktop"`. Values must be quoted
/// and either absolute or start with `$HOME`. Trailing slashes are removed
/// and a later line for the same key wins.
pub fn parse_user_dirs_file(content: &str, home_dir: &Path) -> HashMap<UserDirectory, PathBuf> {
    let mut dirs = HashMap::new();

    for line in content.lines().map(str::trim) {
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, value)) = line.split_once('=') else {
            continue;
        };
        let Some(directory) = UserDirectory::from_key(key.trim()) else {
            continue;
        };
        let Some(value) = value.trim().strip_prefix('"') else {
            continue;
        };
        let value = &value[..value.find('"').unwrap_or(value.len())];

        let path = if let Some(relative) = value.strip_prefix("$HOME") {
            if !relative.is_empty() && !relative.starts_with('/') {
                continue;
            }
            let relative = relative.trim_matches('/');
            if relative.is_empty() {
                home_dir.to_path_buf()
            } else {
                home_dir.join(relative)
            }
        } else if value.starts_with('/') {
            match value.trim_end_matches('/') {
                "" => PathBuf::from("/"),
                trimmed => PathBuf::from(trimmed),
            }
        } else {
            continue;
        };

        dirs.insert(directory, path);
    }

    dirs
}

/// The current user's home directory.
pub fn home_dir() -> Option<PathBuf> {
    dirs::home_dir()
}

fn user_dirs_file() -> Option<PathBuf> {
    if let Some(config_home) = std::env::var_os("XDG_CONFIG_HOME").map(PathBuf::from) {
        if config_home.is_absolute() {
            return Some(config_home.join("user-dirs.dirs"));
        }
    }
    home_dir().map(|home| home.join(".config").join("user-dirs.dirs"))
}

static USER_SPECIAL_DIRS: Lazy<Mutex<Option<HashMap<UserDirectory, PathBuf>>>> =
    Lazy::new(|| Mutex::new(None));

async fn load_user_special_dirs() -> HashMap<UserDirectory, PathBuf> {
    let cached = USER_SPECIAL_DIRS
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .clone();
    if let Some(dirs) = cached {
        return dirs;
    }

    let Some(home) = home_dir() else {
        return HashMap::new();
    };

    let mut dirs = match user_dirs_file() {
        Some(file) => match fs::read_to_string(&file).await {
            Ok(content) => parse_user_dirs_file(&content, &home),
            Err(e) => {
                log::debug!("no user-dirs file at {:?}: {}", file, e);
                HashMap::new()
            },
        },
        None => HashMap::new(),
    };

    dirs.entry(UserDirectory::Desktop)
        .or_insert_with(|| home.join("Desktop"));
    if let Some(user_dirs) = UserDirs::new() {
        for (_, directory) in UserDirectory::KEYS {
            if let Some(path) = directory.platform_default(&user_dirs) {
                dirs.entry(directory).or_insert(path);
            }
        }
    }

    *USER_SPECIAL_DIRS
        .lock()
        .unwrap_or_else(PoisonError::into_inner) = Some(dirs.clone());
    dirs
}

/// Path of a special user directory, if one is configured.
///
/// Results are cached for the life of the process.
pub async fn user_special_dir(directory: UserDirectory) -> Option<PathBuf> {
    load_user_special_dirs().await.get(&directory).cloned()
}

/// The downloads folder, defaulting to `~/Downloads`.
pub async fn downloads_dir() -> Option<PathBuf> {
    match user_special_dir(UserDirectory::Download).await {
        Some(path) => Some(path),
        None => home_dir().map(|home| home.join("Downloads")),
    }
}

/// Where deleted files live on `os`.
pub fn trash_dir_for(os: HostOs, home: &Path, data_dir: Option<&Path>) -> PathBuf {
    match os {
        HostOs::Windows => PathBuf::from("C:\\$Recycle.Bin"),
        HostOs::MacOs => home.join(".Trash"),
        HostOs::Linux | HostOs::Other => match data_dir {
            Some(data) => data.join("Trash").join("files"),
            None => home.join(".Trash"),
        },
    }
}

/// The trash folder of the running host.
pub fn trash_dir() -> Option<PathBuf> {
    let home = home_dir()?;
    let os = crate::roots::HostProbe::detect().os;
    Some(trash_dir_for(os, &home, dirs::data_dir().as_deref()))
}

/// One item in the trash folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrashItem {
    pub name: String,
    pub path: PathBuf,
    pub is_directory: bool,
}

/// Contents of the trash folder, as handed to the UI.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TrashListing {
    pub success: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Vec<TrashItem>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// List `trash` through `accessor`. Never fails; errors are reported in the listing.
pub async fn trash_listing(accessor: &dyn FileSystemAccessor, trash: Option<&Path>) -> TrashListing {
    let Some(trash) = trash else {
        return TrashListing {
            success: false,
            files: None,
            error: Some("no trash folder on this system".to_string()),
        };
    };
    match accessor.list(Some(trash)).await {
        Ok(entries) => TrashListing {
            success: true,
            files: Some(
                entries
                    .into_iter()
                    .map(|e| TrashItem {
                        name: e.name,
                        path: e.path,
                        is_directory: e.is_directory,
                    })
                    .collect(),
            ),
            error: None,
        },
        Err(e) => {
            log::warn!("cannot list trash {:?}: {}", trash, e);
            TrashListing {
                success: false,
                files: None,
                error: Some(e.to_string()),
            }
        },
    }
}
