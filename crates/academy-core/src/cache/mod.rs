//! Local caching module for offline audience previews.
//!
//! This module provides the `SnapshotCache` for storing the last directory
//! snapshot fetched per scope. Snapshots are considered stale after 60
//! minutes; a stale snapshot is still good enough to preview a summary
//! when the backend is unreachable, never to dispatch from.

pub mod manager;

pub use manager::{CachedData, SnapshotCache};
