use crate::error::SourceError;
use async_trait::async_trait;
use watch_sync_models::{WatchEvent, WatchKind};

/// The remote history boundary the orchestrator works against. `TraktClient`
/// is the production implementation; tests substitute a scripted fake.
#[async_trait]
pub trait HistorySource: Send {
    /// Retrieve the complete history for one kind, in the order the remote
    /// API returned it. Any page failure aborts the whole fetch; no partial
    /// result is surfaced.
    async fn fetch_history(&mut self, kind: WatchKind) -> Result<Vec<WatchEvent>, SourceError>;

    /// Bulk-delete plays by id. An empty id list succeeds trivially and
    /// must not perform a network call.
    async fn remove_events(&mut self, ids: &[u64]) -> Result<(), SourceError>;
}
