//! Filesystem access for arbor.
//!
//! A single [`FileSystemAccessor`] trait fronts every filesystem operation,
//! with a native implementation and an in-memory one selected at startup.
//! The directory watcher feeds change notifications back into navigation.

pub mod accessor;
pub mod entry;
pub mod error;
pub mod local;
pub mod memory;
pub mod watcher;

// Re-export public API
pub use accessor::{select_accessor, AccessorBackend, FileSystemAccessor};
pub use entry::{
    filter_by_name, kind_for, sort_entries, DirectoryEntry, FileCategory, FileDetails, TypeFilter,
    UnknownTypeFilter,
};
pub use error::{FsError, FsResult};
pub use local::LocalAccessor;
pub use memory::MemoryAccessor;
pub use watcher::{affected_directories, DirectoryWatcher, FileSystemChange, WatchError};
