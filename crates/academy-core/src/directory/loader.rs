use std::sync::Arc;

use anyhow::{bail, Result};
use futures::stream::{self, StreamExt};
use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::cache::SnapshotCache;

use super::{BranchInfo, Directory, Scope, SearchResults, SearchSequencer, SearchTicket};

/// Maximum concurrent requests when fanning out per-branch fetches
const MAX_CONCURRENT_REQUESTS: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SnapshotSource {
    Live,
    /// Served from disk; carries the human-readable age.
    Cached(String),
}

#[derive(Debug)]
pub struct LoadedDirectory {
    pub directory: Directory,
    pub source: SnapshotSource,
}

/// Fetches directory snapshots for one editing session, keeping the disk
/// cache warm and sequencing search requests.
pub struct DirectoryLoader {
    client: ApiClient,
    scope: Scope,
    sequencer: Arc<SearchSequencer>,
    cache: Option<SnapshotCache>,
}

impl DirectoryLoader {
    pub fn new(client: ApiClient, scope: Scope) -> Self {
        Self {
            client,
            scope,
            sequencer: Arc::new(SearchSequencer::new()),
            cache: None,
        }
    }

    pub fn with_cache(mut self, cache: SnapshotCache) -> Self {
        self.cache = Some(cache);
        self
    }

    pub fn scope(&self) -> &Scope {
        &self.scope
    }

    /// Shared handle for callers that issue searches from several tasks.
    pub fn sequencer(&self) -> Arc<SearchSequencer> {
        Arc::clone(&self.sequencer)
    }

    /// Fetch the full snapshot. A fresh response is written to the cache;
    /// when the fetch fails the cached snapshot is used instead, if any.
    pub async fn load(&self) -> Result<LoadedDirectory> {
        match self.client.fetch_directory(&self.scope, None).await {
            Ok(payload) => {
                if let Some(cache) = &self.cache {
                    if let Err(e) = cache.save_directory(&self.scope, &payload) {
                        warn!(error = %e, "Failed to cache directory snapshot");
                    }
                }
                let directory = Directory::from_payload(&payload);
                info!(scope = ?self.scope, people = directory.len(), "Directory loaded");
                Ok(LoadedDirectory {
                    directory,
                    source: SnapshotSource::Live,
                })
            }
            Err(e) => {
                warn!(scope = ?self.scope, error = %e, "Directory fetch failed, trying cache");
                match self.load_cached() {
                    Ok(Some(loaded)) => Ok(loaded),
                    Ok(None) => Err(e.context("Directory fetch failed and no cached snapshot exists")),
                    Err(cache_err) => {
                        warn!(scope = ?self.scope, error = %cache_err, "Cached directory snapshot unreadable");
                        Err(e.context("Directory fetch failed and the cached snapshot is unreadable"))
                    }
                }
            }
        }
    }

    /// Snapshot from disk only, without touching the network.
    pub fn load_cached(&self) -> Result<Option<LoadedDirectory>> {
        let Some(cache) = &self.cache else {
            return Ok(None);
        };
        let Some(cached) = cache.load_directory(&self.scope)? else {
            return Ok(None);
        };
        if cached.is_stale() {
            warn!(scope = ?self.scope, age = %cached.age_display(), "Using stale directory snapshot");
        }
        Ok(Some(LoadedDirectory {
            directory: Directory::from_payload(&cached.data),
            source: SnapshotSource::Cached(cached.age_display()),
        }))
    }

    /// Server-side search. Returns `Ok(None)` when a newer search was
    /// issued while this one was in flight; that result must not be shown.
    pub async fn search(&self, query: &str) -> Result<Option<SearchResults>> {
        let ticket = self.sequencer.issue();
        self.search_with_ticket(ticket, query).await
    }

    /// Run a search under a ticket issued earlier from [`Self::sequencer`].
    /// A superseded ticket yields `Ok(None)` whatever the response was,
    /// errors included.
    pub async fn search_with_ticket(&self, ticket: SearchTicket, query: &str) -> Result<Option<SearchResults>> {
        debug!(ticket = ticket.id(), query = %query, "Directory search issued");
        let response = self.client.fetch_directory(&self.scope, Some(query)).await;
        match self.sequencer.accept(ticket, response) {
            Some(payload) => Ok(Some(SearchResults::from_payload(query, &payload?))),
            None => Ok(None),
        }
    }

    /// Build a global view from single-branch endpoints, for deployments
    /// without the tree endpoint. Branches that fail are skipped with a
    /// warning; if every branch fails the last error is returned.
    pub async fn load_branches(&self, branches: Vec<BranchInfo>) -> Result<Directory> {
        if branches.is_empty() {
            return Ok(Directory::assemble(Vec::new()));
        }
        debug!(
            branches = branches.len(),
            "Fetching branch directories with max {} concurrent requests...",
            MAX_CONCURRENT_REQUESTS
        );

        let total = branches.len();
        let mut results: Vec<(usize, BranchInfo, Result<Directory>)> = stream::iter(branches.into_iter().enumerate())
            .map(|(index, info)| {
                let client = self.client.clone();
                async move {
                    let scope = Scope::Branch(info.id.clone());
                    let result = client
                        .fetch_directory(&scope, None)
                        .await
                        .map(|payload| Directory::from_payload(&payload));
                    (index, info, result)
                }
            })
            .buffer_unordered(MAX_CONCURRENT_REQUESTS)
            .collect()
            .await;
        results.sort_by_key(|(index, _, _)| *index);

        let mut parts = Vec::with_capacity(total);
        let mut last_error = None;
        for (_, info, result) in results {
            match result {
                Ok(directory) => parts.push((info, directory)),
                Err(e) => {
                    warn!(branch = %info.id, error = %e, "Branch directory fetch failed");
                    last_error = Some(e);
                }
            }
        }

        if parts.is_empty() {
            match last_error {
                Some(e) => return Err(e.context("Every branch directory fetch failed")),
                None => bail!("No branch directories fetched"),
            }
        }

        let fetched = parts.len();
        let directory = Directory::assemble(parts);
        info!(fetched, total, people = directory.len(), "Assembled multi-branch directory");
        Ok(directory)
    }
}
