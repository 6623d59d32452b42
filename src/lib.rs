#![warn(missing_docs)]

//! Cross-platform filesystem navigation for desktop file explorers.
//!
//! `arbor` re-exports the explorer services (filesystem access, root
//! enumeration, navigation state and query forwarding) and, with the
//! `bridge` feature, the JSON-lines IPC bridge a desktop shell talks to.

pub use arbor_services as services;

#[cfg(feature = "bridge")]
pub use arbor_bridge as bridge;

/// A "prelude" for users of arbor.
///
/// Importing this module brings into scope the types needed to open a
/// navigation session against the host filesystem.
///
/// ```rust
/// use arbor::prelude::*;
/// ```
pub mod prelude {
    // Filesystem
    pub use crate::services::filesystem::{
        select_accessor, AccessorBackend, DirectoryEntry, FileDetails, FileSystemAccessor, FsError,
        LocalAccessor, MemoryAccessor,
    };

    // Roots
    pub use crate::services::roots::{
        enumerate_roots, select_root_enumerator, HostProbe, RootEnumerator, RootListing,
    };

    // Navigation
    pub use crate::services::navigation::{
        NavigationError, NavigationEvent, NavigationSession, PathSegments, Platform, SessionOptions,
    };

    // Assistant
    pub use crate::services::query::{AssistantMessage, QueryError, QueryForwarder, QueryRequest};

    // Settings
    pub use crate::services::settings::{Config, SettingsRegistry};

    // Bridge
    #[cfg(feature = "bridge")]
    pub use crate::bridge::{Bridge, BridgeError, IpcRequest, IpcResponse};
}
