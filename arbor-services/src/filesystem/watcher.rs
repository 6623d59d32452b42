// SPDX-License-Identifier: LGPL-3.0-only
//! Directory change watcher.

use indexmap::IndexSet;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::mpsc;

/// Errors raised while setting up or changing watches.
#[derive(Debug, thiserror::Error)]
pub enum WatchError {
    #[error("file watcher error: {0}")]
    Notify(#[from] notify::Error),
}

/// A change detected in a watched directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileSystemChange {
    Created(PathBuf),
    Modified(PathBuf),
    Removed(PathBuf),
    Renamed {
        old: PathBuf,
        new: PathBuf,
    },
}

/// Watches loaded directories (non-recursively) for changes.
pub struct DirectoryWatcher {
    watcher: RecommendedWatcher,
    event_rx: mpsc::Receiver<notify::Result<Event>>,
    watched: HashSet<PathBuf>,
}

impl DirectoryWatcher {
    /// Create a watcher with no watches.
    pub fn new() -> Result<Self, WatchError> {
        let (tx, rx) = mpsc::channel();
        let watcher = notify::recommended_watcher(tx)?;

        Ok(Self {
            watcher,
            event_rx: rx,
            watched: HashSet::new(),
        })
    }

    /// Start watching a directory. Watching it twice is a no-op.
    pub fn watch(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.watched.contains(path) {
            return Ok(());
        }
        self.watcher.watch(path, RecursiveMode::NonRecursive)?;
        self.watched.insert(path.to_path_buf());
        log::debug!("watching {:?}", path);
        Ok(())
    }

    /// Stop watching a directory.
    pub fn unwatch(&mut self, path: &Path) -> Result<(), WatchError> {
        if self.watched.remove(path) {
            self.watcher.unwatch(path)?;
        }
        Ok(())
    }

    pub fn is_watching(&self, path: &Path) -> bool {
        self.watched.contains(path)
    }

    /// Drain all pending events without blocking.
    pub fn poll_changes(&self) -> Vec<FileSystemChange> {
        let mut changes = Vec::new();

        loop {
            match self.event_rx.try_recv() {
                Ok(Ok(event)) => changes.extend(convert_event(event)),
                Ok(Err(e)) => log::warn!("watcher reported an error: {}", e),
                Err(_) => break,
            }
        }

        changes
    }
}

fn convert_event(event: Event) -> Vec<FileSystemChange> {
    use notify::event::ModifyKind;

    match event.kind {
        EventKind::Create(_) => event.paths.into_iter().map(FileSystemChange::Created).collect(),
        EventKind::Remove(_) => event.paths.into_iter().map(FileSystemChange::Removed).collect(),
        EventKind::Modify(ModifyKind::Name(_)) if event.paths.len() >= 2 => {
            vec![FileSystemChange::Renamed {
                old: event.paths[0].clone(),
                new: event.paths[1].clone(),
            }]
        },
        // Reading a file does not change any listing.
        EventKind::Access(_) => Vec::new(),
        _ => event.paths.into_iter().map(FileSystemChange::Modified).collect(),
    }
}

/// Directories whose listings are stale after `changes`, in first-seen order.
pub fn affected_directories(changes: &[FileSystemChange]) -> Vec<PathBuf> {
    let mut dirs = IndexSet::new();
    let mut push_parent = |path: &Path| {
        if let Some(parent) = path.parent() {
            dirs.insert(parent.to_path_buf());
        }
    };

    for change in changes {
        match change {
            FileSystemChange::Created(p) | FileSystemChange::Modified(p) | FileSystemChange::Removed(p) => {
                push_parent(p)
            },
            FileSystemChange::Renamed { old, new } => {
                push_parent(old);
                push_parent(new);
            },
        }
    }

    dirs.into_iter().collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, ModifyKind, RenameMode};

    #[test]
    fn rename_events_become_renamed() {
        let event = Event::new(EventKind::Modify(ModifyKind::Name(RenameMode::Both)))
            .add_path(PathBuf::from("/a/old"))
            .add_path(PathBuf::from("/b/new"));
        assert_eq!(
            convert_event(event),
            vec![FileSystemChange::Renamed {
                old: PathBuf::from("/a/old"),
                new: PathBuf::from("/b/new"),
            }]
        );
    }

    #[test]
    fn affected_directories_are_deduplicated_parents() {
        let changes = vec![
            FileSystemChange::Created(PathBuf::from("/a/x")),
            FileSystemChange::Removed(PathBuf::from("/a/y")),
            FileSystemChange::Renamed {
                old: PathBuf::from("/a/z"),
                new: PathBuf::from("/b/z"),
            },
        ];
        assert_eq!(
            affected_directories(&changes),
            vec![PathBuf::from("/a"), PathBuf::from("/b")]
        );
    }

    #[test]
    fn create_event_maps_every_path() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/a/1"))
            .add_path(PathBuf::from("/a/2"));
        assert_eq!(convert_event(event).len(), 2);
    }
}
