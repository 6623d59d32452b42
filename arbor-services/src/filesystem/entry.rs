// SPDX-License-Identifier: LGPL-3.0-only
//! Directory entry and metadata types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fs::Metadata;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// Kind string used for every directory entry.
pub const DIRECTORY_KIND: &str = "directory";
/// Kind string for files without an extension.
pub const PLAIN_FILE_KIND: &str = "file";

/// A single entry of a directory listing.
///
/// Entries are produced once per listing call and never mutated afterwards;
/// refreshing a directory replaces the whole list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirectoryEntry {
    /// File or directory name (last path component).
    pub name: String,
    /// Absolute path: the parent directory joined with `name`.
    pub path: PathBuf,
    /// Whether the entry (after following symlinks) is a directory.
    pub is_directory: bool,
    /// Size in bytes, always 0 for directories.
    pub size: u64,
    /// Last modification time.
    pub modified_at: DateTime<Utc>,
    /// Creation time, or the modification time where the platform has none.
    pub created_at: DateTime<Utc>,
    /// `"directory"`, the lower-cased extension, or `"file"`.
    pub kind: String,
    /// Whether the entry itself is a symbolic link.
    #[serde(default)]
    pub is_symlink: bool,
    /// Whether the name starts with a dot.
    #[serde(default)]
    pub is_hidden: bool,
}

impl DirectoryEntry {
    /// Build an entry for `name` inside `parent` from already-resolved metadata.
    pub fn from_metadata(parent: &Path, name: String, metadata: &Metadata, is_symlink: bool) -> Self {
        let details = FileDetails::from_metadata(metadata);
        Self::from_details(parent, name, details, is_symlink)
    }

    /// Build an entry from [`FileDetails`], enforcing the directory invariants.
    pub fn from_details(parent: &Path, name: String, details: FileDetails, is_symlink: bool) -> Self {
        let path = parent.join(&name);
        let kind = kind_for(&name, details.is_directory);
        Self {
            is_hidden: name.starts_with('.'),
            name,
            path,
            is_directory: details.is_directory,
            size: if details.is_directory { 0 } else { details.size },
            modified_at: details.modified_at,
            created_at: details.created_at,
            kind,
            is_symlink,
        }
    }

    /// Get the file extension (if any).
    pub fn extension(&self) -> Option<&str> {
        self.path.extension()?.to_str()
    }

    /// Category derived from the extension.
    pub fn category(&self) -> FileCategory {
        if self.is_directory {
            FileCategory::Other
        } else {
            FileCategory::from_name(&self.name)
        }
    }

    /// Human readable size, e.g. `1.50 KiB`.
    pub fn display_size(&self) -> String {
        humansize::format_size(self.size, humansize::BINARY)
    }
}

/// Metadata returned by a details (stat) call.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileDetails {
    pub size: u64,
    pub modified_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub is_directory: bool,
}

impl FileDetails {
    /// Convert std metadata. Missing timestamps fall back to the epoch
    /// (modified) and to the modification time (created).
    pub fn from_metadata(metadata: &Metadata) -> Self {
        let modified = metadata.modified().unwrap_or(SystemTime::UNIX_EPOCH);
        let created = metadata.created().unwrap_or(modified);
        Self {
            size: if metadata.is_dir() { 0 } else { metadata.len() },
            modified_at: DateTime::<Utc>::from(modified),
            created_at: DateTime::<Utc>::from(created),
            is_directory: metadata.is_dir(),
        }
    }
}

/// Derive the kind string of an entry.
pub fn kind_for(name: &str, is_directory: bool) -> String {
    if is_directory {
        return DIRECTORY_KIND.to_string();
    }
    match Path::new(name).extension().and_then(|e| e.to_str()) {
        Some(ext) if !ext.is_empty() => ext.to_lowercase(),
        _ => PLAIN_FILE_KIND.to_string(),
    }
}

/// Broad file category, used for icons and type filters.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileCategory {
    Document,
    Spreadsheet,
    Presentation,
    Pdf,
    Image,
    Video,
    Audio,
    Archive,
    Code,
    Other,
}

impl FileCategory {
    const DOCUMENT: &'static [&'static str] = &["doc", "docx", "txt", "rtf"];
    const SPREADSHEET: &'static [&'static str] = &["xls", "xlsx", "csv"];
    const PRESENTATION: &'static [&'static str] = &["ppt", "pptx"];
    const IMAGE: &'static [&'static str] = &["jpg", "jpeg", "png", "gif", "bmp", "svg", "webp"];
    const VIDEO: &'static [&'static str] = &["mp4", "mov", "avi", "mkv", "webm"];
    const AUDIO: &'static [&'static str] = &["mp3", "wav", "ogg", "flac", "aac"];
    const ARCHIVE: &'static [&'static str] = &["zip", "rar", "7z", "tar", "gz"];
    const CODE: &'static [&'static str] =
        &["js", "ts", "jsx", "tsx", "html", "css", "py", "java", "c", "cpp", "rs"];

    /// Categorize a file name by its extension.
    pub fn from_name(name: &str) -> Self {
        let Some(ext) = Path::new(name).extension().and_then(|e| e.to_str()) else {
            return FileCategory::Other;
        };
        let ext = ext.to_lowercase();
        let ext = ext.as_str();
        if Self::DOCUMENT.contains(&ext) {
            FileCategory::Document
        } else if Self::SPREADSHEET.contains(&ext) {
            FileCategory::Spreadsheet
        } else if Self::PRESENTATION.contains(&ext) {
            FileCategory::Presentation
        } else if ext == "pdf" {
            FileCategory::Pdf
        } else if Self::IMAGE.contains(&ext) {
            FileCategory::Image
        } else if Self::VIDEO.contains(&ext) {
            FileCategory::Video
        } else if Self::AUDIO.contains(&ext) {
            FileCategory::Audio
        } else if Self::ARCHIVE.contains(&ext) {
            FileCategory::Archive
        } else if Self::CODE.contains(&ext) {
            FileCategory::Code
        } else {
            FileCategory::Other
        }
    }
}

/// Type filters offered by the listing view.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TypeFilter {
    Documents,
    Images,
    Videos,
    Audio,
}

impl TypeFilter {
    /// Whether an entry passes this filter. Directories never do.
    pub fn matches(&self, entry: &DirectoryEntry) -> bool {
        if entry.is_directory {
            return false;
        }
        match self {
            TypeFilter::Documents => matches!(
                entry.category(),
                FileCategory::Document | FileCategory::Pdf
            ),
            TypeFilter::Images => entry.category() == FileCategory::Image,
            TypeFilter::Videos => entry.category() == FileCategory::Video,
            TypeFilter::Audio => entry.category() == FileCategory::Audio,
        }
    }
}

/// A type filter name that is not one of `documents`, `images`, `videos`, `audio`.
#[derive(Debug, thiserror::Error)]
#[error("unknown type filter {0:?}")]
pub struct UnknownTypeFilter(pub String);

impl std::str::FromStr for TypeFilter {
    type Err = UnknownTypeFilter;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "documents" => Ok(TypeFilter::Documents),
            "images" => Ok(TypeFilter::Images),
            "videos" => Ok(TypeFilter::Videos),
            "audio" => Ok(TypeFilter::Audio),
            _ => Err(UnknownTypeFilter(s.to_string())),
        }
    }
}

/// Sort entries: directories first, then by case-insensitive name.
pub fn sort_entries(entries: &mut [DirectoryEntry]) {
    entries.sort_by(|a, b| match (a.is_directory, b.is_directory) {
        (true, false) => Ordering::Less,
        (false, true) => Ordering::Greater,
        _ => a
            .name
            .to_lowercase()
            .cmp(&b.name.to_lowercase())
            .then_with(|| a.name.cmp(&b.name)),
    });
}

/// Keep only entries whose name contains `query` (case-insensitive).
pub fn filter_by_name<'a>(entries: &'a [DirectoryEntry], query: &str) -> Vec<&'a DirectoryEntry> {
    let needle = query.trim().to_lowercase();
    entries
        .iter()
        .filter(|e| needle.is_empty() || e.name.to_lowercase().contains(&needle))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn details(is_directory: bool, size: u64) -> FileDetails {
        let now = Utc::now();
        FileDetails {
            size,
            modified_at: now,
            created_at: now,
            is_directory,
        }
    }

    #[test]
    fn directory_entries_have_zero_size_and_directory_kind() {
        let entry = DirectoryEntry::from_details(Path::new("/tmp"), "b.d".into(), details(true, 4096), false);
        assert_eq!(entry.size, 0);
        assert_eq!(entry.kind, DIRECTORY_KIND);
        assert_eq!(entry.path, PathBuf::from("/tmp/b.d"));
    }

    #[test]
    fn kind_is_lowercase_extension_or_file() {
        assert_eq!(kind_for("Report.PDF", false), "pdf");
        assert_eq!(kind_for("Makefile", false), PLAIN_FILE_KIND);
        assert_eq!(kind_for(".bashrc", false), PLAIN_FILE_KIND);
    }

    #[test]
    fn sort_puts_directories_first() {
        let parent = Path::new("/x");
        let mut entries = vec![
            DirectoryEntry::from_details(parent, "b.txt".into(), details(false, 1), false),
            DirectoryEntry::from_details(parent, "Zed".into(), details(true, 0), false),
            DirectoryEntry::from_details(parent, "a.txt".into(), details(false, 1), false),
            DirectoryEntry::from_details(parent, "alpha".into(), details(true, 0), false),
        ];
        sort_entries(&mut entries);
        let names: Vec<_> = entries.iter().map(|e| e.name.as_str()).collect();
        assert_eq!(names, ["alpha", "Zed", "a.txt", "b.txt"]);
    }

    #[test]
    fn type_filters_use_extension_tables() {
        let parent = Path::new("/x");
        let pdf = DirectoryEntry::from_details(parent, "a.pdf".into(), details(false, 1), false);
        let song = DirectoryEntry::from_details(parent, "a.FLAC".into(), details(false, 1), false);
        assert!(TypeFilter::Documents.matches(&pdf));
        assert!(!TypeFilter::Images.matches(&pdf));
        assert!(TypeFilter::Audio.matches(&song));
    }

    #[test]
    fn serializes_with_camel_case_fields() {
        let entry = DirectoryEntry::from_details(Path::new("/x"), "a.txt".into(), details(false, 100), false);
        let value = serde_json::to_value(&entry).unwrap();
        assert_eq!(value["isDirectory"], false);
        assert_eq!(value["size"], 100);
        assert_eq!(value["kind"], "txt");
        assert!(value["modifiedAt"].is_string());
    }

    #[test]
    fn type_filter_parses_listing_names() {
        assert_eq!("Images".parse::<TypeFilter>().unwrap(), TypeFilter::Images);
        assert_eq!("audio".parse::<TypeFilter>().unwrap(), TypeFilter::Audio);
        assert!("spreadsheets".parse::<TypeFilter>().is_err());
    }
}
