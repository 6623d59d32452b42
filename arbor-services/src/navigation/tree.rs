// SPDX-License-Identifier: LGPL-3.0-only
//! Flat node arena for the lazily loaded directory tree.
//!
//! Nodes are keyed by normalized absolute path. A node refers to its
//! children by key, so invalidating or pruning any directory is a map lookup.

use crate::filesystem::{sort_entries, DirectoryEntry};
use crate::navigation::node::{LoadState, LoadTicket, NavigationNode};
use indexmap::IndexMap;
use std::path::{Component, Path, PathBuf};

/// Lexically normalize a path: drop `.` components and trailing separators,
/// resolve `..` against the preceding component.
pub fn normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {},
            Component::ParentDir => {
                if !out.pop() {
                    out.push(component.as_os_str());
                }
            },
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// What an expand request turned into.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExpandOutcome {
    /// Children must be listed; complete with this ticket.
    Load(LoadTicket),
    /// Children were cached; the node is now expanded.
    Expanded,
    /// A load is already running; nothing to do.
    InFlight,
}

/// What a load completion did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    /// Children replaced. `removed` lists pruned descendant keys.
    Applied { children: Vec<PathBuf>, removed: Vec<PathBuf> },
    /// The listing failed; the node is loaded with no children.
    Failed { removed: Vec<PathBuf> },
    /// The ticket was superseded or the node is gone; nothing changed.
    Stale,
}

/// The directory tree shown in the sidebar.
#[derive(Debug, Default)]
pub struct NavigationTree {
    nodes: IndexMap<PathBuf, NavigationNode>,
    roots: Vec<PathBuf>,
    excluded: Vec<PathBuf>,
    show_hidden: bool,
    next_generation: u64,
}

impl NavigationTree {
    pub fn new(excluded: Vec<PathBuf>, show_hidden: bool) -> Self {
        Self {
            excluded: excluded.iter().map(|p| normalize(p)).collect(),
            show_hidden,
            ..Self::default()
        }
    }

    /// Replace the forest with one node per root entry.
    pub fn set_roots(&mut self, roots: Vec<DirectoryEntry>) {
        self.nodes.clear();
        self.roots.clear();
        for entry in roots {
            let key = normalize(&entry.path);
            if self.nodes.contains_key(&key) {
                continue;
            }
            self.roots.push(key.clone());
            self.nodes.insert(key, NavigationNode::new(entry));
        }
    }

    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    pub fn node(&self, path: &Path) -> Option<&NavigationNode> {
        self.nodes.get(&normalize(path))
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.nodes.contains_key(&normalize(path))
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Whether `path` is, or lies inside, an excluded directory.
    pub fn is_excluded(&self, path: &Path) -> bool {
        let path = normalize(path);
        self.excluded.iter().any(|ex| path.starts_with(ex))
    }

    fn issue(&mut self, key: PathBuf) -> Option<LoadTicket> {
        self.next_generation += 1;
        let generation = self.next_generation;
        let node = self.nodes.get_mut(&key)?;
        node.load = LoadState::Loading { generation };
        Some(LoadTicket { path: key, generation })
    }

    /// Request expansion of `path`. Returns `None` for unknown paths.
    pub fn begin_expand(&mut self, path: &Path) -> Option<ExpandOutcome> {
        let key = normalize(path);
        let node = self.nodes.get_mut(&key)?;
        node.expanded = true;
        let load = node.load;
        match load {
            LoadState::Loaded => Some(ExpandOutcome::Expanded),
            LoadState::Loading { .. } => Some(ExpandOutcome::InFlight),
            LoadState::Unloaded => self.issue(key).map(ExpandOutcome::Load),
        }
    }

    /// Collapse `path`, keeping its cached children. Returns false for unknown paths.
    pub fn collapse(&mut self, path: &Path) -> bool {
        match self.nodes.get_mut(&normalize(path)) {
            Some(node) => {
                node.expanded = false;
                true
            },
            None => false,
        }
    }

    /// Force a reload of a node that has been (or is being) loaded.
    ///
    /// Any in-flight load for the node becomes stale.
    pub fn invalidate(&mut self, path: &Path) -> Option<LoadTicket> {
        let key = normalize(path);
        let node = self.nodes.get(&key)?;
        if node.load == LoadState::Unloaded {
            return None;
        }
        self.issue(key)
    }

    /// Apply the result of the listing identified by `ticket`.
    pub fn complete_load(
        &mut self,
        ticket: &LoadTicket,
        result: Result<Vec<DirectoryEntry>, String>,
    ) -> LoadOutcome {
        match self.nodes.get(&ticket.path) {
            Some(node) if node.load == (LoadState::Loading { generation: ticket.generation }) => {},
            _ => return LoadOutcome::Stale,
        }

        match result {
            Ok(entries) => {
                let mut dirs: Vec<DirectoryEntry> = entries
                    .into_iter()
                    .filter(|e| e.is_directory)
                    .filter(|e| self.show_hidden || !e.is_hidden)
                    .filter(|e| !self.is_excluded(&e.path))
                    .collect();
                sort_entries(&mut dirs);

                let children: Vec<PathBuf> = dirs.iter().map(|e| normalize(&e.path)).collect();
                let removed = self.replace_children(&ticket.path, &children);
                for (key, entry) in children.iter().zip(dirs) {
                    match self.nodes.get_mut(key) {
                        Some(existing) => existing.entry = entry,
                        None => {
                            self.nodes.insert(key.clone(), NavigationNode::new(entry));
                        },
                    }
                }
                if let Some(node) = self.nodes.get_mut(&ticket.path) {
                    node.children = children.clone();
                    node.load = LoadState::Loaded;
                }
                LoadOutcome::Applied { children, removed }
            },
            Err(message) => {
                log::warn!("cannot load {:?}: {}", ticket.path, message);
                let removed = self.replace_children(&ticket.path, &[]);
                if let Some(node) = self.nodes.get_mut(&ticket.path) {
                    node.children.clear();
                    node.expanded = false;
                    node.load = LoadState::Loaded;
                }
                LoadOutcome::Failed { removed }
            },
        }
    }

    /// Drop the subtrees of children of `parent` that are not in `keep`.
    fn replace_children(&mut self, parent: &Path, keep: &[PathBuf]) -> Vec<PathBuf> {
        let old = self
            .nodes
            .get(parent)
            .map(|n| n.children.clone())
            .unwrap_or_default();
        let mut removed = Vec::new();
        for child in old.into_iter().filter(|c| !keep.contains(c)) {
            self.remove_subtree(&child, &mut removed);
        }
        removed
    }

    /// Root nodes survive pruning: a WSL drive is both a root and a child of `/mnt`.
    fn remove_subtree(&mut self, key: &Path, removed: &mut Vec<PathBuf>) {
        if self.roots.iter().any(|r| r == key) {
            return;
        }
        if let Some(node) = self.nodes.shift_remove(key) {
            for child in node.children {
                self.remove_subtree(&child, removed);
            }
            removed.push(key.to_path_buf());
        }
    }

    /// Tree nodes that contain `target` (including `target` itself), top-down.
    pub fn ancestors_of(&self, target: &Path) -> Vec<PathBuf> {
        let target = normalize(target);
        let mut chain: Vec<PathBuf> = target
            .ancestors()
            .map(Path::to_path_buf)
            .filter(|p| self.nodes.contains_key(p))
            .collect();
        chain.reverse();
        chain
    }

    /// Keys of every node whose children are cached.
    pub fn loaded_paths(&self) -> Vec<PathBuf> {
        self.nodes
            .iter()
            .filter(|(_, n)| n.loaded())
            .map(|(k, _)| k.clone())
            .collect()
    }

    /// Depth-first walk over the rows a sidebar would show.
    pub fn visible(&self) -> Vec<(usize, &NavigationNode)> {
        let mut rows = Vec::new();
        let mut stack: Vec<(usize, &PathBuf)> = self.roots.iter().rev().map(|r| (0, r)).collect();
        while let Some((depth, key)) = stack.pop() {
            let Some(node) = self.nodes.get(key) else {
                continue;
            };
            rows.push((depth, node));
            if node.expanded {
                stack.extend(node.children.iter().rev().map(|c| (depth + 1, c)));
            }
        }
        rows
    }
}

#[cfg(all(test, unix))]
mod tests {
    use super::*;
    use crate::filesystem::FileDetails;
    use chrono::Utc;

    fn dir(parent: &str, name: &str) -> DirectoryEntry {
        let now = Utc::now();
        DirectoryEntry::from_details(
            Path::new(parent),
            name.to_string(),
            FileDetails {
                size: 0,
                modified_at: now,
                created_at: now,
                is_directory: true,
            },
            false,
        )
    }

    fn tree_with_root() -> NavigationTree {
        let mut tree = NavigationTree::new(vec![PathBuf::from("/skip")], false);
        tree.set_roots(vec![dir("/", "")]);
        tree
    }

    #[test]
    fn normalize_drops_dots_and_trailing_slash() {
        assert_eq!(normalize(Path::new("/a/./b/../c/")), PathBuf::from("/a/c"));
        assert_eq!(normalize(Path::new("/")), PathBuf::from("/"));
    }

    #[test]
    fn second_expand_while_loading_is_a_noop() {
        let mut tree = tree_with_root();
        let first = tree.begin_expand(Path::new("/")).unwrap();
        assert!(matches!(first, ExpandOutcome::Load(_)));
        assert_eq!(tree.begin_expand(Path::new("/")), Some(ExpandOutcome::InFlight));
    }

    #[test]
    fn completion_filters_files_hidden_and_excluded() {
        let mut tree = tree_with_root();
        let ExpandOutcome::Load(ticket) = tree.begin_expand(Path::new("/")).unwrap() else {
            panic!("expected a load");
        };
        let mut file = dir("/", "notes.txt");
        file.is_directory = false;
        let outcome = tree.complete_load(
            &ticket,
            Ok(vec![dir("/", "usr"), dir("/", ".cache"), dir("/", "skip"), file, dir("/", "etc")]),
        );
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                children: vec![PathBuf::from("/etc"), PathBuf::from("/usr")],
                removed: vec![],
            }
        );
        let root = tree.node(Path::new("/")).unwrap();
        assert!(root.loaded() && root.expanded);
    }

    #[test]
    fn invalidated_ticket_is_stale() {
        let mut tree = tree_with_root();
        let ExpandOutcome::Load(first) = tree.begin_expand(Path::new("/")).unwrap() else {
            panic!("expected a load");
        };
        let second = tree.invalidate(Path::new("/")).unwrap();
        assert_eq!(tree.complete_load(&first, Ok(vec![dir("/", "old")])), LoadOutcome::Stale);
        assert!(matches!(
            tree.complete_load(&second, Ok(vec![dir("/", "new")])),
            LoadOutcome::Applied { .. }
        ));
        assert!(tree.contains(Path::new("/new")));
        assert!(!tree.contains(Path::new("/old")));
    }

    #[test]
    fn failure_leaves_node_loaded_and_collapsed() {
        let mut tree = tree_with_root();
        let ExpandOutcome::Load(ticket) = tree.begin_expand(Path::new("/")).unwrap() else {
            panic!("expected a load");
        };
        let outcome = tree.complete_load(&ticket, Err("permission denied".into()));
        assert_eq!(outcome, LoadOutcome::Failed { removed: vec![] });
        let root = tree.node(Path::new("/")).unwrap();
        assert!(root.loaded());
        assert!(!root.expanded);
        assert!(root.children.is_empty());
    }

    #[test]
    fn reload_prunes_vanished_subtrees() {
        let mut tree = tree_with_root();
        let ExpandOutcome::Load(t) = tree.begin_expand(Path::new("/")).unwrap() else {
            panic!("expected a load");
        };
        tree.complete_load(&t, Ok(vec![dir("/", "a"), dir("/", "b")]));
        let ExpandOutcome::Load(t) = tree.begin_expand(Path::new("/a")).unwrap() else {
            panic!("expected a load");
        };
        tree.complete_load(&t, Ok(vec![dir("/a", "inner")]));

        let t = tree.invalidate(Path::new("/")).unwrap();
        let outcome = tree.complete_load(&t, Ok(vec![dir("/", "b")]));
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                children: vec![PathBuf::from("/b")],
                removed: vec![PathBuf::from("/a/inner"), PathBuf::from("/a")],
            }
        );
    }

    #[test]
    fn ancestors_are_top_down() {
        let mut tree = tree_with_root();
        let ExpandOutcome::Load(t) = tree.begin_expand(Path::new("/")).unwrap() else {
            panic!("expected a load");
        };
        tree.complete_load(&t, Ok(vec![dir("/", "home")]));
        assert_eq!(
            tree.ancestors_of(Path::new("/home/user/docs")),
            vec![PathBuf::from("/"), PathBuf::from("/home")]
        );
    }

    #[test]
    fn pruning_a_parent_keeps_roots_listed_below_it() {
        let mut tree = NavigationTree::new(vec![], false);
        tree.set_roots(vec![dir("/", ""), dir("/mnt", "c")]);
        let ExpandOutcome::Load(t) = tree.begin_expand(Path::new("/")).unwrap() else {
            panic!("expected a load");
        };
        tree.complete_load(&t, Ok(vec![dir("/", "mnt")]));
        let ExpandOutcome::Load(t) = tree.begin_expand(Path::new("/mnt")).unwrap() else {
            panic!("expected a load");
        };
        tree.complete_load(&t, Ok(vec![dir("/mnt", "c")]));

        let t = tree.invalidate(Path::new("/mnt")).unwrap();
        assert_eq!(
            tree.complete_load(&t, Err("input/output error".into())),
            LoadOutcome::Failed { removed: vec![] }
        );
        assert!(tree.contains(Path::new("/mnt/c")));

        let t = tree.invalidate(Path::new("/")).unwrap();
        let outcome = tree.complete_load(&t, Ok(vec![]));
        assert_eq!(
            outcome,
            LoadOutcome::Applied {
                children: vec![],
                removed: vec![PathBuf::from("/mnt")],
            }
        );
        let top: Vec<PathBuf> = tree
            .visible()
            .into_iter()
            .filter(|(depth, _)| *depth == 0)
            .map(|(_, node)| node.entry.path.clone())
            .collect();
        assert_eq!(top, vec![PathBuf::from("/"), PathBuf::from("/mnt/c")]);
    }
}
