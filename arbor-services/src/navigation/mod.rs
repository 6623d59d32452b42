//! Navigation state for the explorer.
//!
//! Tracks the current path, the selection, the flat listing of the current
//! directory and a lazily loaded directory tree. [`NavigationSession`] drives
//! the filesystem accessor on behalf of the state.

pub mod node;
pub mod segments;
pub mod session;
pub mod state;
pub mod tree;

pub use node::{LoadState, LoadTicket, NavigationNode};
pub use segments::{PathSegments, Platform};
pub use session::{
    NavigationError, NavigationEvent, NavigationSession, SessionOptions, INACCESSIBLE_NOTICE,
    WATCH_INTERVAL,
};
pub use state::{Listing, ListingTicket, NavigationState, RefreshTarget};
pub use tree::{normalize, ExpandOutcome, LoadOutcome, NavigationTree};
