// SPDX-License-Identifier: LGPL-3.0-only
//! In-memory filesystem accessor.
//!
//! Used when the native filesystem is unavailable (preview mode) and by tests
//! that need deterministic trees, unreadable directories or broken entries.

use crate::filesystem::accessor::{listing_path, FileSystemAccessor};
use crate::filesystem::entry::{DirectoryEntry, FileDetails};
use crate::filesystem::error::{require_absolute, FsError, FsResult};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use std::collections::{BTreeMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Mutex, MutexGuard, PoisonError};

#[derive(Debug, Clone)]
enum Node {
    Directory { modified: DateTime<Utc> },
    File { content: String, modified: DateTime<Utc> },
}

impl Node {
    fn details(&self) -> FileDetails {
        match self {
            Node::Directory { modified } => FileDetails {
                size: 0,
                modified_at: *modified,
                created_at: *modified,
                is_directory: true,
            },
            Node::File { content, modified } => FileDetails {
                size: content.len() as u64,
                modified_at: *modified,
                created_at: *modified,
                is_directory: false,
            },
        }
    }
}

#[derive(Debug, Default)]
struct Tree {
    nodes: BTreeMap<PathBuf, Node>,
    unreadable: HashSet<PathBuf>,
    unstatable: HashSet<PathBuf>,
}

impl Tree {
    fn children_of<'a>(&'a self, dir: &'a Path) -> impl Iterator<Item = (&'a PathBuf, &'a Node)> + 'a {
        self.nodes
            .iter()
            .filter(move |(path, _)| path.parent() == Some(dir))
    }

    fn descendants(&self, dir: &Path) -> Vec<PathBuf> {
        self.nodes
            .keys()
            .filter(|p| p.starts_with(dir) && p.as_path() != dir)
            .cloned()
            .collect()
    }

    fn insert_ancestors(&mut self, path: &Path, now: DateTime<Utc>) -> FsResult<()> {
        let mut missing = Vec::new();
        let mut cursor = path.parent();
        while let Some(dir) = cursor {
            match self.nodes.get(dir) {
                Some(Node::Directory { .. }) => break,
                Some(Node::File { .. }) => return Err(FsError::AlreadyExistsAsFile(dir.to_path_buf())),
                None => missing.push(dir.to_path_buf()),
            }
            cursor = dir.parent();
        }
        for dir in missing {
            self.nodes.insert(dir, Node::Directory { modified: now });
        }
        Ok(())
    }

    /// `dst` must sit in an existing directory outside the `src` tree.
    fn check_destination(&self, src: &Path, dst: &Path) -> FsResult<()> {
        if dst.starts_with(src) {
            return Err(FsError::InvalidPath(format!(
                "{} is inside {}",
                dst.display(),
                src.display()
            )));
        }
        match dst.parent().and_then(|p| self.nodes.get(p)) {
            Some(Node::Directory { .. }) => Ok(()),
            _ => Err(FsError::NotFound(dst.to_path_buf())),
        }
    }

    fn check_readable(&self, path: &Path) -> FsResult<()> {
        if self.unreadable.contains(path) {
            return Err(FsError::PermissionDenied(path.to_path_buf()));
        }
        Ok(())
    }
}

/// Accessor keeping the whole tree in memory.
#[derive(Debug)]
pub struct MemoryAccessor {
    home: PathBuf,
    tree: Mutex<Tree>,
}

impl MemoryAccessor {
    /// Create an empty filesystem containing only `home` and its ancestors.
    pub fn new(home: impl Into<PathBuf>) -> Self {
        let home = home.into();
        let accessor = Self {
            home: home.clone(),
            tree: Mutex::new(Tree::default()),
        };
        accessor.add_directory(&home);
        accessor
    }

    /// The tree shown in preview mode: a home directory with a few folders.
    pub fn with_sample_tree() -> Self {
        let home = if cfg!(windows) {
            PathBuf::from("C:\\Users\\user")
        } else {
            PathBuf::from("/home/user")
        };
        let accessor = Self::new(&home);
        accessor.add_file(home.join("Documents").join("report.pdf"), "%PDF-1.7");
        accessor.add_file(home.join("Documents").join("notes.txt"), "meeting notes");
        accessor.add_directory(home.join("Documents").join("Projects"));
        accessor.add_file(home.join("Downloads").join("setup.zip"), "PK");
        accessor.add_file(home.join("Pictures").join("holiday.jpg"), "jpeg");
        accessor.add_directory(home.join("Music"));
        accessor.add_file(home.join(".profile"), "export EDITOR=vi");
        accessor
    }

    fn lock(&self) -> MutexGuard<'_, Tree> {
        self.tree.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Add a directory (and missing parents).
    pub fn add_directory(&self, path: impl AsRef<Path>) {
        let path = path.as_ref();
        let now = Utc::now();
        let mut tree = self.lock();
        if tree.insert_ancestors(path, now).is_ok() {
            tree.nodes
                .entry(path.to_path_buf())
                .or_insert(Node::Directory { modified: now });
        }
    }

    /// Add or replace a file (creating missing parents).
    pub fn add_file(&self, path: impl AsRef<Path>, content: impl Into<String>) {
        let path = path.as_ref();
        let now = Utc::now();
        let mut tree = self.lock();
        if tree.insert_ancestors(path, now).is_ok() {
            tree.nodes.insert(
                path.to_path_buf(),
                Node::File {
                    content: content.into(),
                    modified: now,
                },
            );
        }
    }

    /// Make listing (or reading) `path` fail with `PermissionDenied`.
    pub fn deny(&self, path: impl AsRef<Path>) {
        self.lock().unreadable.insert(path.as_ref().to_path_buf());
    }

    /// Lift a previous [`deny`](Self::deny).
    pub fn allow(&self, path: impl AsRef<Path>) {
        self.lock().unreadable.remove(path.as_ref());
    }

    /// Make stat-ing `path` fail, so listings of its parent drop it.
    pub fn break_metadata(&self, path: impl AsRef<Path>) {
        self.lock().unstatable.insert(path.as_ref().to_path_buf());
    }
}

#[async_trait]
impl FileSystemAccessor for MemoryAccessor {
    async fn list(&self, path: Option<&Path>) -> FsResult<Vec<DirectoryEntry>> {
        let dir = listing_path(self.home.clone(), path);
        require_absolute(&dir)?;
        let tree = self.lock();
        tree.check_readable(&dir)?;
        match tree.nodes.get(&dir) {
            Some(Node::Directory { .. }) => {},
            Some(Node::File { .. }) => {
                return Err(FsError::Io {
                    path: dir.clone(),
                    source: std::io::Error::new(std::io::ErrorKind::Other, "not a directory"),
                })
            },
            None => return Err(FsError::NotFound(dir)),
        }

        let entries = tree
            .children_of(&dir)
            .filter(|(path, _)| !tree.unstatable.contains(path.as_path()))
            .filter_map(|(path, node)| {
                let name = path.file_name()?.to_string_lossy().into_owned();
                Some(DirectoryEntry::from_details(&dir, name, node.details(), false))
            })
            .collect();
        Ok(entries)
    }

    async fn details(&self, path: &Path) -> FsResult<FileDetails> {
        require_absolute(path)?;
        let tree = self.lock();
        if tree.unstatable.contains(path) {
            return Err(FsError::PermissionDenied(path.to_path_buf()));
        }
        tree.nodes
            .get(path)
            .map(Node::details)
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))
    }

    async fn create_directory(&self, path: &Path) -> FsResult<()> {
        require_absolute(path)?;
        let now = Utc::now();
        let mut tree = self.lock();
        match tree.nodes.get(path) {
            Some(Node::Directory { .. }) => return Ok(()),
            Some(Node::File { .. }) => return Err(FsError::AlreadyExistsAsFile(path.to_path_buf())),
            None => {},
        }
        if let Some(parent) = path.parent() {
            if tree.unreadable.contains(parent) {
                return Err(FsError::PermissionDenied(parent.to_path_buf()));
            }
        }
        tree.insert_ancestors(path, now)?;
        tree.nodes
            .insert(path.to_path_buf(), Node::Directory { modified: now });
        Ok(())
    }

    async fn delete(&self, path: &Path) -> FsResult<()> {
        require_absolute(path)?;
        let mut tree = self.lock();
        let node = tree
            .nodes
            .remove(path)
            .ok_or_else(|| FsError::NotFound(path.to_path_buf()))?;
        if matches!(node, Node::Directory { .. }) {
            for child in tree.descendants(path) {
                tree.nodes.remove(&child);
            }
        }
        Ok(())
    }

    async fn move_entry(&self, src: &Path, dst: &Path) -> FsResult<()> {
        require_absolute(src)?;
        require_absolute(dst)?;
        let mut tree = self.lock();
        if !tree.nodes.contains_key(src) {
            return Err(FsError::NotFound(src.to_path_buf()));
        }
        if tree.nodes.contains_key(dst) {
            return Err(FsError::AlreadyExists(dst.to_path_buf()));
        }
        tree.check_destination(src, dst)?;

        let mut moved = vec![src.to_path_buf()];
        moved.extend(tree.descendants(src));
        for old in moved {
            if let Some(node) = tree.nodes.remove(&old) {
                let relative = old.strip_prefix(src).unwrap_or(Path::new(""));
                let new = if relative.as_os_str().is_empty() {
                    dst.to_path_buf()
                } else {
                    dst.join(relative)
                };
                tree.nodes.insert(new, node);
            }
        }
        Ok(())
    }

    async fn copy_entry(&self, src: &Path, dst: &Path) -> FsResult<()> {
        require_absolute(src)?;
        require_absolute(dst)?;
        let mut tree = self.lock();
        let root = tree
            .nodes
            .get(src)
            .cloned()
            .ok_or_else(|| FsError::NotFound(src.to_path_buf()))?;
        if tree.nodes.contains_key(dst) {
            return Err(FsError::AlreadyExists(dst.to_path_buf()));
        }
        tree.check_destination(src, dst)?;

        let copies: Vec<(PathBuf, Node)> = tree
            .descendants(src)
            .into_iter()
            .filter_map(|old| {
                let node = tree.nodes.get(&old)?.clone();
                let relative = old.strip_prefix(src).ok()?;
                Some((dst.join(relative), node))
            })
            .collect();
        tree.nodes.insert(dst.to_path_buf(), root);
        tree.nodes.extend(copies);
        Ok(())
    }

    async fn read_text(&self, path: &Path) -> FsResult<String> {
        require_absolute(path)?;
        let tree = self.lock();
        tree.check_readable(path)?;
        match tree.nodes.get(path) {
            Some(Node::File { content, .. }) => Ok(content.clone()),
            Some(Node::Directory { .. }) => Err(FsError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(std::io::ErrorKind::Other, "is a directory"),
            }),
            None => Err(FsError::NotFound(path.to_path_buf())),
        }
    }

    async fn write_text(&self, path: &Path, content: &str) -> FsResult<()> {
        require_absolute(path)?;
        let mut tree = self.lock();
        if !matches!(
            path.parent().and_then(|p| tree.nodes.get(p)),
            Some(Node::Directory { .. })
        ) {
            return Err(FsError::NotFound(path.to_path_buf()));
        }
        if matches!(tree.nodes.get(path), Some(Node::Directory { .. })) {
            return Err(FsError::AlreadyExists(path.to_path_buf()));
        }
        tree.nodes.insert(
            path.to_path_buf(),
            Node::File {
                content: content.to_owned(),
                modified: Utc::now(),
            },
        );
        Ok(())
    }

    async fn exists(&self, path: &Path) -> bool {
        self.lock().nodes.contains_key(path)
    }

    fn home_dir(&self) -> PathBuf {
        self.home.clone()
    }
}
