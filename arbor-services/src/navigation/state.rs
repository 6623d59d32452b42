// SPDX-License-Identifier: LGPL-3.0-only
//! Session navigation state: current path, selection, flat listing and tree.

use crate::filesystem::{sort_entries, DirectoryEntry};
use crate::navigation::node::LoadTicket;
use crate::navigation::tree::{normalize, NavigationTree};
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

/// The flat listing of the current directory.
#[derive(Debug, Clone)]
pub struct Listing {
    pub path: PathBuf,
    pub entries: Vec<DirectoryEntry>,
}

/// Identifies one in-flight listing of the current directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListingTicket {
    pub path: PathBuf,
    pub generation: u64,
}

/// Loads a refresh must run.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RefreshTarget {
    pub listing: Option<ListingTicket>,
    pub node: Option<LoadTicket>,
}

/// Session-lifetime navigation state. Nothing here is persisted.
#[derive(Debug, Default)]
pub struct NavigationState {
    current_path: Option<PathBuf>,
    selected: BTreeSet<PathBuf>,
    listing: Option<Listing>,
    listing_generation: u64,
    show_hidden: bool,
    tree: NavigationTree,
}

impl NavigationState {
    pub fn new(tree: NavigationTree, show_hidden: bool) -> Self {
        Self {
            tree,
            show_hidden,
            ..Self::default()
        }
    }

    pub fn current_path(&self) -> Option<&Path> {
        self.current_path.as_deref()
    }

    /// Make `path` current and clear the selection. Does not list anything.
    pub fn navigate_to(&mut self, path: &Path) {
        self.current_path = Some(normalize(path));
        self.selected.clear();
    }

    /// Add or remove `path` from the selection.
    pub fn toggle_selection(&mut self, path: &Path, selected: bool) {
        if selected {
            self.selected.insert(path.to_path_buf());
        } else {
            self.selected.remove(path);
        }
    }

    /// Select every entry of the current listing.
    pub fn select_all(&mut self) {
        if let Some(listing) = self.current_listing() {
            let paths: Vec<PathBuf> = listing.entries.iter().map(|e| e.path.clone()).collect();
            self.selected.extend(paths);
        }
    }

    pub fn clear_selection(&mut self) {
        self.selected.clear();
    }

    pub fn is_selected(&self, path: &Path) -> bool {
        self.selected.contains(path)
    }

    /// Selected paths in display order.
    pub fn selected(&self) -> Vec<PathBuf> {
        self.selected.iter().cloned().collect()
    }

    /// The listing, but only when it belongs to the current path.
    pub fn current_listing(&self) -> Option<&Listing> {
        let listing = self.listing.as_ref()?;
        (Some(listing.path.as_path()) == self.current_path()).then_some(listing)
    }

    /// Start listing the current path, superseding any listing in flight.
    pub fn begin_listing(&mut self) -> Option<ListingTicket> {
        let path = self.current_path.clone()?;
        self.listing_generation += 1;
        Some(ListingTicket {
            path,
            generation: self.listing_generation,
        })
    }

    /// Replace the flat listing. Results for a superseded ticket or a path
    /// that is no longer current are dropped and `false` is returned.
    pub fn complete_listing(&mut self, ticket: &ListingTicket, mut entries: Vec<DirectoryEntry>) -> bool {
        if ticket.generation != self.listing_generation
            || self.current_path.as_ref() != Some(&ticket.path)
        {
            log::debug!("dropping stale listing of {:?}", ticket.path);
            return false;
        }
        if !self.show_hidden {
            entries.retain(|e| !e.is_hidden);
        }
        sort_entries(&mut entries);
        let present: BTreeSet<&PathBuf> = entries.iter().map(|e| &e.path).collect();
        self.selected.retain(|p| present.contains(p));
        self.listing = Some(Listing {
            path: ticket.path.clone(),
            entries,
        });
        true
    }

    /// Invalidate whatever shows `path`: the flat listing and/or a tree node.
    pub fn refresh(&mut self, path: &Path) -> RefreshTarget {
        let path = normalize(path);
        let listing = if self.current_path.as_ref() == Some(&path) {
            self.begin_listing()
        } else {
            None
        };
        RefreshTarget {
            listing,
            node: self.tree.invalidate(&path),
        }
    }

    pub fn tree(&self) -> &NavigationTree {
        &self.tree
    }

    pub fn tree_mut(&mut self) -> &mut NavigationTree {
        &mut self.tree
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::filesystem::FileDetails;
    use chrono::Utc;

    fn file(parent: &str, name: &str) -> DirectoryEntry {
        let now = Utc::now();
        DirectoryEntry::from_details(
            Path::new(parent),
            name.to_string(),
            FileDetails {
                size: 1,
                modified_at: now,
                created_at: now,
                is_directory: false,
            },
            false,
        )
    }

    #[test]
    fn navigate_clears_selection() {
        let mut state = NavigationState::default();
        state.navigate_to(Path::new("/tmp"));
        state.toggle_selection(Path::new("/tmp/a"), true);
        state.toggle_selection(Path::new("/tmp/a"), true);
        assert_eq!(state.selected().len(), 1);
        state.navigate_to(Path::new("/var"));
        assert!(state.selected().is_empty());
        assert_eq!(state.current_path(), Some(Path::new("/var")));
    }

    #[test]
    fn listing_for_previous_path_is_dropped() {
        let mut state = NavigationState::default();
        state.navigate_to(Path::new("/a"));
        let ticket = state.begin_listing().unwrap();
        state.navigate_to(Path::new("/b"));
        assert!(!state.complete_listing(&ticket, vec![file("/a", "x")]));
        assert!(state.current_listing().is_none());
    }

    #[test]
    fn select_all_uses_current_listing() {
        let mut state = NavigationState::new(NavigationTree::default(), true);
        state.navigate_to(Path::new("/a"));
        let ticket = state.begin_listing().unwrap();
        assert!(state.complete_listing(&ticket, vec![file("/a", "y"), file("/a", ".x")]));
        state.select_all();
        assert_eq!(state.selected(), vec![PathBuf::from("/a/.x"), PathBuf::from("/a/y")]);
    }

    #[test]
    fn refresh_of_current_path_relists() {
        let mut state = NavigationState::default();
        state.navigate_to(Path::new("/a"));
        let first = state.begin_listing().unwrap();
        let target = state.refresh(Path::new("/a/"));
        assert!(target.node.is_none());
        let second = target.listing.unwrap();
        assert!(second.generation > first.generation);
        assert!(!state.complete_listing(&first, vec![]));
        assert!(state.complete_listing(&second, vec![]));
    }
}
