use crate::cache::HistoryCache;
use crate::dedup::{find_duplicates, DedupPolicy};
use crate::prompt::Prompt;
use anyhow::Result;
use chrono::NaiveDate;
use tracing::{info, warn};
use watch_sync_models::{WatchEvent, WatchKind};
use watch_sync_trakt::HistorySource;

/// Per-kind outcome of a sync run. A failed kind never stops the others.
#[derive(Debug, Default)]
pub struct SyncReport {
    pub synced: Vec<(WatchKind, usize)>,
    pub errors: Vec<(WatchKind, String)>,
}

impl SyncReport {
    pub fn all_failed(&self) -> bool {
        self.synced.is_empty() && !self.errors.is_empty()
    }
}

/// Result of a duplicate scan over one kind's history.
#[derive(Debug)]
pub struct DuplicateScan {
    pub kind: WatchKind,
    pub policy: DedupPolicy,
    /// Events considered, malformed ones included.
    pub scanned: usize,
    /// Events without a content id, skipped by the detector.
    pub skipped_malformed: usize,
    /// Whether the cache served the read (false means a sync ran first).
    pub from_cache: bool,
    pub flagged: Vec<WatchEvent>,
}

#[derive(Debug, PartialEq, Eq)]
pub enum RemovalOutcome {
    /// Nothing to remove; no prompt shown, no network call made.
    Nothing,
    /// User declined the confirmation. Normal outcome, no mutation.
    Cancelled,
    /// Remote delete succeeded. `resynced` is false when the follow-up
    /// cache refresh failed; the deletion itself still happened.
    Removed { removed: usize, resynced: bool },
}

/// Composes the remote source, the local cache, and the duplicate detector
/// into the command flows. One invocation at a time; kinds are processed
/// sequentially and every step runs in documented order (fetch/read,
/// detect, confirm, delete, re-sync).
pub struct HistoryOrchestrator<S: HistorySource> {
    source: S,
    cache: HistoryCache,
}

impl<S: HistorySource> HistoryOrchestrator<S> {
    pub fn new(source: S, cache: HistoryCache) -> Self {
        Self { source, cache }
    }

    /// Fetch each requested kind and replace its cache partition. A
    /// transport or auth failure aborts that kind only and is reported.
    pub async fn sync(&mut self, kinds: &[WatchKind]) -> SyncReport {
        let mut report = SyncReport::default();

        for &kind in kinds {
            match self.source.fetch_history(kind).await {
                Ok(events) => match self.cache.replace_all(kind, &events) {
                    Ok(()) => {
                        info!("Synced {} {} plays", events.len(), kind.api_path());
                        report.synced.push((kind, events.len()));
                    }
                    Err(e) => report.errors.push((kind, e.to_string())),
                },
                Err(e) => {
                    warn!("Failed to sync {}: {}", kind.api_path(), e);
                    report.errors.push((kind, e.to_string()));
                }
            }
        }

        report
    }

    /// Cached snapshot for `kind`, syncing first when the cache is empty.
    /// Returns the events and whether the cache served them.
    async fn load_or_sync(&mut self, kind: WatchKind) -> Result<(Vec<WatchEvent>, bool)> {
        let cached = self.cache.load(kind)?;
        if !cached.is_empty() {
            return Ok((cached, true));
        }

        info!("No local {} history, syncing first", kind.api_path());
        let events = self.source.fetch_history(kind).await?;
        self.cache.replace_all(kind, &events)?;
        Ok((events, false))
    }

    pub async fn scan_duplicates(
        &mut self,
        kind: WatchKind,
        policy: DedupPolicy,
    ) -> Result<DuplicateScan> {
        let (events, from_cache) = self.load_or_sync(kind).await?;
        let skipped_malformed = events.iter().filter(|e| e.content_id.is_none()).count();
        let flagged = find_duplicates(&events, policy);

        Ok(DuplicateScan {
            kind,
            policy,
            scanned: events.len(),
            skipped_malformed,
            from_cache,
            flagged,
        })
    }

    /// Plays whose calendar date (in the timestamp's own offset) equals
    /// `date`, ascending by watched time.
    pub async fn events_on_date(
        &mut self,
        kind: WatchKind,
        date: NaiveDate,
    ) -> Result<Vec<WatchEvent>> {
        let (events, _) = self.load_or_sync(kind).await?;
        let mut matching: Vec<WatchEvent> = events
            .into_iter()
            .filter(|e| e.watched_at.date_naive() == date)
            .collect();
        matching.sort_by_key(|e| e.watched_at);
        Ok(matching)
    }

    /// Confirm, bulk-delete, then refresh the cache from the remote state.
    /// A failed delete propagates and leaves the cache as the last
    /// known-good pre-delete snapshot.
    pub async fn remove_with_confirmation(
        &mut self,
        kind: WatchKind,
        events: &[WatchEvent],
        prompt: &dyn Prompt,
    ) -> Result<RemovalOutcome> {
        if events.is_empty() {
            return Ok(RemovalOutcome::Nothing);
        }

        let question = format!(
            "Delete {} plays from your Trakt {} history?",
            events.len(),
            kind.api_path()
        );
        if !prompt.confirm(&question)? {
            info!("Removal cancelled, nothing deleted");
            return Ok(RemovalOutcome::Cancelled);
        }

        let ids: Vec<u64> = events.iter().map(|e| e.id).collect();
        self.source.remove_events(&ids).await?;
        info!("Removed {} {} plays", ids.len(), kind.api_path());

        // Cache refresh only after the delete was acknowledged
        let resynced = match self.source.fetch_history(kind).await {
            Ok(fresh) => match self.cache.replace_all(kind, &fresh) {
                Ok(()) => true,
                Err(e) => {
                    warn!("Cache refresh after removal failed: {}", e);
                    false
                }
            },
            Err(e) => {
                warn!(
                    "Re-fetch after removal failed ({}); run 'rewind sync' to refresh the cache",
                    e
                );
                false
            }
        };

        Ok(RemovalOutcome::Removed {
            removed: ids.len(),
            resynced,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::prompt::ScriptedPrompt;
    use async_trait::async_trait;
    use chrono::DateTime;
    use std::collections::{HashMap, HashSet};
    use std::sync::{Arc, Mutex};
    use tempfile::TempDir;
    use watch_sync_config::PathManager;
    use watch_sync_trakt::SourceError;

    fn play(id: u64, content_id: u64, watched_at: &str) -> WatchEvent {
        WatchEvent {
            id,
            kind: WatchKind::Movie,
            content_id: Some(content_id),
            title: format!("Title {}", content_id),
            year: None,
            show_title: None,
            season: None,
            episode: None,
            watched_at: DateTime::parse_from_rfc3339(watched_at).unwrap(),
            raw: serde_json::Value::Null,
        }
    }

    #[derive(Default)]
    struct FakeState {
        history: HashMap<WatchKind, Vec<WatchEvent>>,
        fail_fetch: HashSet<WatchKind>,
        fail_remove: bool,
        // Ordered log of remote calls, for sequencing assertions
        ops: Vec<String>,
    }

    #[derive(Clone)]
    struct FakeSource(Arc<Mutex<FakeState>>);

    impl FakeSource {
        fn new(state: FakeState) -> Self {
            Self(Arc::new(Mutex::new(state)))
        }

        fn ops(&self) -> Vec<String> {
            self.0.lock().unwrap().ops.clone()
        }
    }

    #[async_trait]
    impl HistorySource for FakeSource {
        async fn fetch_history(
            &mut self,
            kind: WatchKind,
        ) -> Result<Vec<WatchEvent>, SourceError> {
            let mut state = self.0.lock().unwrap();
            state.ops.push(format!("fetch:{}", kind.api_path()));
            if state.fail_fetch.contains(&kind) {
                return Err(SourceError::Auth("simulated fetch failure".to_string()));
            }
            Ok(state.history.get(&kind).cloned().unwrap_or_default())
        }

        async fn remove_events(&mut self, ids: &[u64]) -> Result<(), SourceError> {
            let mut state = self.0.lock().unwrap();
            state.ops.push(format!("remove:{}", ids.len()));
            if state.fail_remove {
                return Err(SourceError::Auth("simulated remove failure".to_string()));
            }
            let removed: HashSet<u64> = ids.iter().copied().collect();
            for events in state.history.values_mut() {
                events.retain(|e| !removed.contains(&e.id));
            }
            Ok(())
        }
    }

    fn orchestrator_in(
        dir: &TempDir,
        state: FakeState,
    ) -> (HistoryOrchestrator<FakeSource>, FakeSource, HistoryCache) {
        let pm = PathManager::with_base(dir.path());
        let cache = HistoryCache::new(&pm).unwrap();
        let source = FakeSource::new(state);
        (
            HistoryOrchestrator::new(source.clone(), cache.clone()),
            source,
            cache,
        )
    }

    #[tokio::test]
    async fn test_sync_replaces_cache_per_kind() {
        let dir = TempDir::new().unwrap();
        let mut state = FakeState::default();
        state.history.insert(
            WatchKind::Movie,
            vec![play(1, 100, "2024-01-01T10:00:00Z"), play(2, 200, "2024-01-02T10:00:00Z")],
        );
        let (mut orch, _source, cache) = orchestrator_in(&dir, state);

        let report = orch.sync(&[WatchKind::Movie]).await;
        assert_eq!(report.synced, vec![(WatchKind::Movie, 2)]);
        assert!(report.errors.is_empty());
        assert_eq!(cache.load(WatchKind::Movie).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_sync_failure_aborts_kind_but_not_others() {
        let dir = TempDir::new().unwrap();
        let mut state = FakeState::default();
        state
            .history
            .insert(WatchKind::Episode, vec![play(5, 500, "2024-01-01T10:00:00Z")]);
        state.fail_fetch.insert(WatchKind::Movie);
        let (mut orch, _source, cache) = orchestrator_in(&dir, state);

        let report = orch.sync(&[WatchKind::Movie, WatchKind::Episode]).await;
        assert_eq!(report.synced, vec![(WatchKind::Episode, 1)]);
        assert_eq!(report.errors.len(), 1);
        assert_eq!(report.errors[0].0, WatchKind::Movie);
        assert!(!report.all_failed());
        assert_eq!(cache.load(WatchKind::Episode).unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_scan_prefers_cache_over_remote() {
        let dir = TempDir::new().unwrap();
        let mut state = FakeState::default();
        // Remote would fail; the cache must answer without a fetch
        state.fail_fetch.insert(WatchKind::Movie);
        let (mut orch, source, cache) = orchestrator_in(&dir, state);

        cache
            .replace_all(
                WatchKind::Movie,
                &[
                    play(1, 100, "2024-01-01T10:00:00Z"),
                    play(2, 100, "2024-01-01T12:00:00Z"),
                ],
            )
            .unwrap();

        let scan = orch
            .scan_duplicates(WatchKind::Movie, DedupPolicy::Global)
            .await
            .unwrap();
        assert!(scan.from_cache);
        assert_eq!(scan.scanned, 2);
        assert_eq!(scan.flagged.len(), 1);
        assert_eq!(scan.flagged[0].id, 2);
        assert!(source.ops().is_empty());
    }

    #[tokio::test]
    async fn test_scan_syncs_when_cache_empty_and_flags_nothing_on_empty_history() {
        let dir = TempDir::new().unwrap();
        let (mut orch, source, _cache) = orchestrator_in(&dir, FakeState::default());

        let scan = orch
            .scan_duplicates(WatchKind::Movie, DedupPolicy::Global)
            .await
            .unwrap();
        assert!(!scan.from_cache);
        assert!(scan.flagged.is_empty());
        // One fetch to populate the cache, no removal traffic
        assert_eq!(source.ops(), vec!["fetch:movies"]);
    }

    #[tokio::test]
    async fn test_scan_counts_malformed_events() {
        let dir = TempDir::new().unwrap();
        let (mut orch, _source, cache) = orchestrator_in(&dir, FakeState::default());

        let mut malformed = play(9, 0, "2024-01-01T11:00:00Z");
        malformed.content_id = None;
        cache
            .replace_all(
                WatchKind::Movie,
                &[
                    play(1, 100, "2024-01-01T10:00:00Z"),
                    malformed,
                    play(3, 100, "2024-01-01T12:00:00Z"),
                ],
            )
            .unwrap();

        let scan = orch
            .scan_duplicates(WatchKind::Movie, DedupPolicy::PerDay)
            .await
            .unwrap();
        assert_eq!(scan.scanned, 3);
        assert_eq!(scan.skipped_malformed, 1);
        assert_eq!(scan.flagged.len(), 1);
        assert_eq!(scan.flagged[0].id, 3);
    }

    #[tokio::test]
    async fn test_events_on_date_matches_calendar_date_only() {
        let dir = TempDir::new().unwrap();
        let (mut orch, _source, cache) = orchestrator_in(&dir, FakeState::default());

        cache
            .replace_all(
                WatchKind::Movie,
                &[
                    play(1, 100, "2024-01-01T23:59:00Z"),
                    play(2, 200, "2024-01-02T00:01:00Z"),
                    play(3, 300, "2024-01-01T08:00:00Z"),
                ],
            )
            .unwrap();

        let date = NaiveDate::from_ymd_opt(2024, 1, 1).unwrap();
        let matching = orch.events_on_date(WatchKind::Movie, date).await.unwrap();
        assert_eq!(matching.iter().map(|e| e.id).collect::<Vec<_>>(), vec![3, 1]);
    }

    #[tokio::test]
    async fn test_removal_empty_set_is_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut orch, source, _cache) = orchestrator_in(&dir, FakeState::default());
        let prompt = ScriptedPrompt::new([true]);

        let outcome = orch
            .remove_with_confirmation(WatchKind::Movie, &[], &prompt)
            .await
            .unwrap();
        assert_eq!(outcome, RemovalOutcome::Nothing);
        assert!(prompt.questions().is_empty());
        assert!(source.ops().is_empty());
    }

    #[tokio::test]
    async fn test_removal_declined_leaves_everything_untouched() {
        let dir = TempDir::new().unwrap();
        let mut state = FakeState::default();
        let events = vec![play(1, 100, "2024-01-01T10:00:00Z"), play(2, 100, "2024-01-01T12:00:00Z")];
        state.history.insert(WatchKind::Movie, events.clone());
        let (mut orch, source, cache) = orchestrator_in(&dir, state);
        cache.replace_all(WatchKind::Movie, &events).unwrap();

        let prompt = ScriptedPrompt::new([false]);
        let outcome = orch
            .remove_with_confirmation(WatchKind::Movie, &events[1..], &prompt)
            .await
            .unwrap();

        assert_eq!(outcome, RemovalOutcome::Cancelled);
        assert!(source.ops().is_empty());
        assert_eq!(cache.load(WatchKind::Movie).unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_removal_confirmed_deletes_then_resyncs() {
        let dir = TempDir::new().unwrap();
        let mut state = FakeState::default();
        let events = vec![
            play(1, 100, "2024-01-01T10:00:00Z"),
            play(2, 100, "2024-01-01T12:00:00Z"),
            play(3, 100, "2024-01-01T14:00:00Z"),
        ];
        state.history.insert(WatchKind::Movie, events.clone());
        let (mut orch, source, cache) = orchestrator_in(&dir, state);
        cache.replace_all(WatchKind::Movie, &events).unwrap();

        let prompt = ScriptedPrompt::new([true]);
        let outcome = orch
            .remove_with_confirmation(WatchKind::Movie, &events[1..], &prompt)
            .await
            .unwrap();

        assert_eq!(
            outcome,
            RemovalOutcome::Removed {
                removed: 2,
                resynced: true
            }
        );
        // Delete strictly precedes the cache-refreshing fetch
        assert_eq!(source.ops(), vec!["remove:2", "fetch:movies"]);
        let remaining = cache.load(WatchKind::Movie).unwrap();
        assert_eq!(remaining.iter().map(|e| e.id).collect::<Vec<_>>(), vec![1]);
    }

    #[tokio::test]
    async fn test_failed_delete_keeps_pre_delete_cache() {
        let dir = TempDir::new().unwrap();
        let mut state = FakeState::default();
        state.fail_remove = true;
        let events = vec![play(1, 100, "2024-01-01T10:00:00Z"), play(2, 100, "2024-01-01T12:00:00Z")];
        state.history.insert(WatchKind::Movie, events.clone());
        let (mut orch, source, cache) = orchestrator_in(&dir, state);
        cache.replace_all(WatchKind::Movie, &events).unwrap();

        let prompt = ScriptedPrompt::new([true]);
        let result = orch
            .remove_with_confirmation(WatchKind::Movie, &events[1..], &prompt)
            .await;

        assert!(result.is_err());
        // No re-fetch after the failed delete; cache is the last known-good
        assert_eq!(source.ops(), vec!["remove:1"]);
        assert_eq!(cache.load(WatchKind::Movie).unwrap().len(), 2);
    }
}
