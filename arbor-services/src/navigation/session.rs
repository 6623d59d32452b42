// SPDX-License-Identifier: LGPL-3.0-only
//! Async navigation session.
//!
//! Wraps [`NavigationState`] behind a mutex and drives the filesystem
//! accessor for it. The lock is only held between awaits, never across one,
//! so sibling expansions and listings proceed concurrently. Every completed
//! load is checked against its ticket before it touches the state.

use crate::filesystem::entry::DIRECTORY_KIND;
use crate::filesystem::{
    affected_directories, DirectoryEntry, DirectoryWatcher, FileSystemAccessor, FileSystemChange,
    FsError,
};
use crate::navigation::node::{LoadTicket, NavigationNode};
use crate::navigation::state::{Listing, ListingTicket, NavigationState, RefreshTarget};
use crate::navigation::tree::{normalize, ExpandOutcome, LoadOutcome, NavigationTree};
use crate::roots::{enumerate_roots, RootEnumerator, RootListing};
use crate::settings::ExplorerSettings;
use chrono::{DateTime, Utc};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, UNIX_EPOCH};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

/// Notice shown when a folder cannot be opened in the tree.
pub const INACCESSIBLE_NOTICE: &str = "folder inaccessible";

/// How often [`NavigationSession::spawn_watcher`] drains watcher events.
pub const WATCH_INTERVAL: Duration = Duration::from_millis(500);

/// Errors from session operations.
#[derive(Debug, thiserror::Error)]
pub enum NavigationError {
    #[error("{0:?} is not part of the navigation tree")]
    UnknownNode(PathBuf),
    #[error(transparent)]
    Fs(#[from] FsError),
}

/// Events emitted by the session for UI updates.
#[derive(Debug, Clone, PartialEq)]
pub enum NavigationEvent {
    /// A tree node's children were (re)loaded.
    DirectoryLoaded {
        path: PathBuf,
        children: Vec<PathBuf>,
    },
    /// A tree node could not be listed. Non-fatal.
    LoadFailed {
        path: PathBuf,
        notice: String,
    },
    /// The flat listing of the current path was replaced.
    ListingReplaced {
        path: PathBuf,
        count: usize,
    },
}

/// Session construction options.
#[derive(Debug, Clone, Default)]
pub struct SessionOptions {
    pub excluded_directories: Vec<PathBuf>,
    pub show_hidden: bool,
    /// Watch loaded directories and reload them when they change.
    pub watch: bool,
}

impl SessionOptions {
    /// Options taken from the `[explorer]` settings. Watching is on unless disabled.
    pub fn from_settings(settings: &ExplorerSettings) -> Self {
        Self {
            excluded_directories: settings.excluded_directories.clone().unwrap_or_default(),
            show_hidden: settings.show_hidden.unwrap_or(false),
            watch: settings.watch.unwrap_or(true),
        }
    }
}

/// A navigation session bound to one accessor.
pub struct NavigationSession {
    accessor: Arc<dyn FileSystemAccessor>,
    state: Mutex<NavigationState>,
    watcher: Option<Mutex<DirectoryWatcher>>,
    event_tx: broadcast::Sender<NavigationEvent>,
}

impl NavigationSession {
    pub fn new(accessor: Arc<dyn FileSystemAccessor>, options: SessionOptions) -> Self {
        let tree = NavigationTree::new(options.excluded_directories, options.show_hidden);
        let watcher = if options.watch {
            match DirectoryWatcher::new() {
                Ok(w) => Some(Mutex::new(w)),
                Err(e) => {
                    log::warn!("directory watching disabled: {}", e);
                    None
                },
            }
        } else {
            None
        };
        let (event_tx, _) = broadcast::channel(100);

        Self {
            accessor,
            state: Mutex::new(NavigationState::new(tree, options.show_hidden)),
            watcher,
            event_tx,
        }
    }

    fn state(&self) -> MutexGuard<'_, NavigationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn emit(&self, event: NavigationEvent) {
        // No subscribers is fine.
        let _ = self.event_tx.send(event);
    }

    /// Subscribe to navigation events.
    pub fn subscribe(&self) -> broadcast::Receiver<NavigationEvent> {
        self.event_tx.subscribe()
    }

    pub fn accessor(&self) -> &Arc<dyn FileSystemAccessor> {
        &self.accessor
    }

    /// Seed the tree with the host's roots.
    pub async fn initialize(&self, enumerator: &dyn RootEnumerator) -> RootListing {
        let listing = enumerate_roots(enumerator).await;
        let mut entries = Vec::with_capacity(listing.directories.len());
        for root in &listing.directories {
            entries.push(self.root_entry(root).await);
        }
        self.state().tree_mut().set_roots(entries);
        listing
    }

    async fn root_entry(&self, root: &Path) -> DirectoryEntry {
        let (modified_at, created_at) = match self.accessor.details(root).await {
            Ok(details) => (details.modified_at, details.created_at),
            Err(e) => {
                log::debug!("cannot stat root {:?}: {}", root, e);
                let epoch = DateTime::<Utc>::from(UNIX_EPOCH);
                (epoch, epoch)
            },
        };
        // `/` and `C:\` have no file name.
        let name = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        DirectoryEntry {
            name,
            path: root.to_path_buf(),
            is_directory: true,
            size: 0,
            modified_at,
            created_at,
            kind: DIRECTORY_KIND.to_string(),
            is_symlink: false,
            is_hidden: false,
        }
    }

    /// Expand a tree node, listing it if its children are not cached.
    ///
    /// A second expand while the first is still loading returns at once.
    pub async fn expand(&self, path: &Path) -> Result<(), NavigationError> {
        let outcome = self
            .state()
            .tree_mut()
            .begin_expand(path)
            .ok_or_else(|| NavigationError::UnknownNode(path.to_path_buf()))?;
        if let ExpandOutcome::Load(ticket) = outcome {
            self.load_node(ticket).await;
        }
        Ok(())
    }

    pub fn collapse(&self, path: &Path) -> Result<(), NavigationError> {
        if self.state().tree_mut().collapse(path) {
            Ok(())
        } else {
            Err(NavigationError::UnknownNode(path.to_path_buf()))
        }
    }

    pub async fn toggle(&self, path: &Path) -> Result<(), NavigationError> {
        let expanded = self
            .node(path)
            .map(|n| n.expanded)
            .ok_or_else(|| NavigationError::UnknownNode(path.to_path_buf()))?;
        if expanded {
            self.collapse(path)
        } else {
            self.expand(path).await
        }
    }

    async fn load_node(&self, ticket: LoadTicket) {
        let result = self
            .accessor
            .list(Some(&ticket.path))
            .await
            .map_err(|e| e.to_string());
        let outcome = self.state().tree_mut().complete_load(&ticket, result);

        match outcome {
            LoadOutcome::Applied { children, removed } => {
                self.unwatch_all(&removed);
                self.watch(&ticket.path);
                self.emit(NavigationEvent::DirectoryLoaded {
                    path: ticket.path,
                    children,
                });
            },
            LoadOutcome::Failed { removed } => {
                self.unwatch_all(&removed);
                self.emit(NavigationEvent::LoadFailed {
                    path: ticket.path,
                    notice: INACCESSIBLE_NOTICE.to_string(),
                });
            },
            LoadOutcome::Stale => log::debug!("discarding superseded load of {:?}", ticket.path),
        }
    }

    /// Make `path` current. Lists nothing; see [`open`](Self::open).
    pub fn navigate_to(&self, path: &Path) {
        self.state().navigate_to(path);
    }

    /// Navigate to `path` (home when `None`) and replace the flat listing.
    pub async fn open(&self, path: Option<&Path>) -> Result<Vec<DirectoryEntry>, NavigationError> {
        let target = match path {
            Some(p) if !p.as_os_str().is_empty() => p.to_path_buf(),
            _ => self.accessor.home_dir(),
        };
        let ticket = {
            let mut state = self.state();
            state.navigate_to(&target);
            state.begin_listing()
        };
        match ticket {
            Some(ticket) => self.load_listing(ticket).await,
            None => Ok(Vec::new()),
        }
    }

    async fn load_listing(&self, ticket: ListingTicket) -> Result<Vec<DirectoryEntry>, NavigationError> {
        let entries = self.accessor.list(Some(&ticket.path)).await?;
        let applied = self.state().complete_listing(&ticket, entries.clone());
        if applied {
            let listing = self.listing();
            let count = listing.as_ref().map_or(0, |l| l.entries.len());
            self.watch(&ticket.path);
            self.emit(NavigationEvent::ListingReplaced {
                path: ticket.path,
                count,
            });
            return Ok(listing.map(|l| l.entries).unwrap_or_default());
        }
        Ok(entries)
    }

    /// Re-list whatever shows `path`. Both loads run concurrently.
    pub async fn refresh(&self, path: &Path) -> Result<(), NavigationError> {
        let RefreshTarget { listing, node } = self.state().refresh(path);
        let listing = async move {
            match listing {
                Some(ticket) => self.load_listing(ticket).await.map(|_| ()),
                None => Ok(()),
            }
        };
        let node = async move {
            if let Some(ticket) = node {
                self.load_node(ticket).await;
            }
        };
        let (listing, ()) = futures::join!(listing, node);
        listing
    }

    /// Expand every tree node on the way to the current path, top-down.
    pub async fn reveal(&self) -> Result<(), NavigationError> {
        let Some(current) = self.current_path() else {
            return Ok(());
        };
        let mut expanded = Vec::new();
        loop {
            let next = {
                let state = self.state();
                state
                    .tree()
                    .ancestors_of(&current)
                    .into_iter()
                    .find(|p| !expanded.contains(p))
            };
            let Some(next) = next else {
                return Ok(());
            };
            // Subscribe first so a load finishing right after `expand` is not missed.
            let mut events = self.subscribe();
            self.expand(&next).await?;
            self.wait_for_load(&next, &mut events).await;
            expanded.push(next);
        }
    }

    /// Wait until a load of `path` started by another task has finished.
    async fn wait_for_load(&self, path: &Path, events: &mut broadcast::Receiver<NavigationEvent>) {
        while self.node(path).is_some_and(|n| n.is_loading()) {
            match events.recv().await {
                Ok(_) | Err(broadcast::error::RecvError::Lagged(_)) => {},
                Err(broadcast::error::RecvError::Closed) => return,
            }
        }
    }

    pub fn toggle_selection(&self, path: &Path, selected: bool) {
        self.state().toggle_selection(path, selected);
    }

    pub fn select_all(&self) {
        self.state().select_all();
    }

    pub fn clear_selection(&self) {
        self.state().clear_selection();
    }

    pub fn selected(&self) -> Vec<PathBuf> {
        self.state().selected()
    }

    pub fn current_path(&self) -> Option<PathBuf> {
        self.state().current_path().map(Path::to_path_buf)
    }

    /// The flat listing of the current path, if loaded.
    pub fn listing(&self) -> Option<Listing> {
        self.state().current_listing().cloned()
    }

    /// A snapshot of one tree node.
    pub fn node(&self, path: &Path) -> Option<NavigationNode> {
        self.state().tree().node(path).cloned()
    }

    pub fn roots(&self) -> Vec<PathBuf> {
        self.state().tree().roots().to_vec()
    }

    /// Visible tree rows as (depth, node) snapshots.
    pub fn visible_rows(&self) -> Vec<(usize, NavigationNode)> {
        self.state()
            .tree()
            .visible()
            .into_iter()
            .map(|(depth, node)| (depth, node.clone()))
            .collect()
    }

    fn watch(&self, path: &Path) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        let mut watcher = watcher.lock().unwrap_or_else(PoisonError::into_inner);
        if let Err(e) = watcher.watch(path) {
            log::debug!("cannot watch {:?}: {}", path, e);
        }
    }

    fn unwatch_all(&self, paths: &[PathBuf]) {
        let Some(watcher) = &self.watcher else {
            return;
        };
        let mut watcher = watcher.lock().unwrap_or_else(PoisonError::into_inner);
        for path in paths {
            if let Err(e) = watcher.unwatch(path) {
                log::debug!("cannot unwatch {:?}: {}", path, e);
            }
        }
    }

    /// Reload the directories touched by `changes`.
    ///
    /// Only directories the session shows (loaded tree nodes or the current
    /// listing) are reloaded.
    pub async fn apply_changes(&self, changes: &[FileSystemChange]) -> Result<(), NavigationError> {
        let dirs = affected_directories(changes);
        let shown: Vec<PathBuf> = {
            let state = self.state();
            let current = state.current_path().map(Path::to_path_buf);
            dirs.into_iter()
                .map(|d| normalize(&d))
                .filter(|d| {
                    current.as_deref() == Some(d.as_path())
                        || state.tree().node(d).is_some_and(|n| n.loaded() || n.is_loading())
                })
                .collect()
        };
        for dir in shown {
            log::debug!("{:?} changed on disk, reloading", dir);
            self.refresh(&dir).await?;
        }
        Ok(())
    }

    /// Drain pending watcher events and apply them.
    pub async fn process_watch_events(&self) -> Result<(), NavigationError> {
        let changes = match &self.watcher {
            Some(watcher) => watcher
                .lock()
                .unwrap_or_else(PoisonError::into_inner)
                .poll_changes(),
            None => return Ok(()),
        };
        if changes.is_empty() {
            return Ok(());
        }
        self.apply_changes(&changes).await
    }

    pub fn is_watching(&self) -> bool {
        self.watcher.is_some()
    }

    /// Start [`watch_loop`](Self::watch_loop) on the runtime.
    ///
    /// Returns `None` when the session was built without a watcher.
    pub fn spawn_watcher(self: &Arc<Self>) -> Option<JoinHandle<()>> {
        if self.watcher.is_none() {
            return None;
        }
        Some(tokio::spawn(self.clone().watch_loop(WATCH_INTERVAL)))
    }

    /// Poll the watcher every `interval` until the session is dropped.
    pub async fn watch_loop(self: Arc<Self>, interval: Duration) {
        let weak = Arc::downgrade(&self);
        drop(self);
        let mut ticker = tokio::time::interval(interval);
        loop {
            ticker.tick().await;
            let Some(session) = weak.upgrade() else {
                log::debug!("navigation session dropped, watch loop exiting");
                return;
            };
            if let Err(e) = session.process_watch_events().await {
                log::warn!("failed to apply directory changes: {}", e);
            }
        }
    }
}
