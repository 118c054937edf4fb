//! Directory snapshots: the people an audience can be resolved against.
//!
//! - `snapshot`: wire shapes and the indexed `Directory`
//! - `search`: filtered, read-only views and server search results for
//!   the picker
//! - `sequencer`: latest-wins guard for search requests
//! - `loader`: fetching, caching and multi-branch assembly

pub mod loader;
pub mod search;
pub mod sequencer;
pub mod snapshot;

pub use loader::{DirectoryLoader, LoadedDirectory, SnapshotSource};
pub use search::{DirectoryView, SearchResults};
pub use sequencer::{SearchSequencer, SearchTicket};
pub use snapshot::{
    BranchInfo, BranchLists, BranchNode, Directory, DirectoryPayload, DirectoryTree, RawPerson, Scope,
};
