// SPDX-License-Identifier: LGPL-3.0-only
//! Services behind the arbor file explorer: filesystem access, root
//! enumeration, navigation state, query forwarding, places and settings.

pub mod filesystem;
pub mod io_helpers;
pub mod navigation;
pub mod places;
pub mod query;
pub mod roots;
pub mod settings;

// Re-export commonly used types
pub use filesystem::{
    select_accessor, AccessorBackend, DirectoryEntry, FileDetails, FileSystemAccessor, FsError,
    LocalAccessor, MemoryAccessor,
};
pub use navigation::{NavigationEvent, NavigationSession, PathSegments, Platform, SessionOptions};
pub use places::{downloads_dir, home_dir, trash_dir, trash_listing, user_special_dir, UserDirectory};
pub use query::{AssistantMessage, QueryError, QueryForwarder, QueryRequest};
pub use roots::{enumerate_roots, select_root_enumerator, HostProbe, RootEnumerator, RootListing};
pub use settings::{Config, SettingsRegistry};
