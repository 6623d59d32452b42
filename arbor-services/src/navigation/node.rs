// SPDX-License-Identifier: LGPL-3.0-only
//! Tree node types.

use crate::filesystem::DirectoryEntry;
use serde::Serialize;
use std::path::PathBuf;

/// Load progress of a node's children.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase", tag = "state")]
pub enum LoadState {
    /// Children have never been fetched.
    Unloaded,
    /// A listing is in flight; only a completion carrying `generation` applies.
    Loading { generation: u64 },
    /// Children are cached. Failed loads end here too, with no children.
    Loaded,
}

/// One directory of the navigation tree.
#[derive(Debug, Clone, Serialize)]
pub struct NavigationNode {
    pub entry: DirectoryEntry,
    pub expanded: bool,
    pub load: LoadState,
    /// Keys of the child directory nodes, in display order.
    pub children: Vec<PathBuf>,
}

impl NavigationNode {
    pub fn new(entry: DirectoryEntry) -> Self {
        Self {
            entry,
            expanded: false,
            load: LoadState::Unloaded,
            children: Vec::new(),
        }
    }

    pub fn loaded(&self) -> bool {
        self.load == LoadState::Loaded
    }

    pub fn is_loading(&self) -> bool {
        matches!(self.load, LoadState::Loading { .. })
    }
}

/// Identifies one in-flight directory load.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTicket {
    pub path: PathBuf,
    pub generation: u64,
}
