use chrono::NaiveDate;
use std::collections::HashSet;
use tracing::warn;
use watch_sync_models::WatchEvent;

/// Which plays of the same content count as duplicates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DedupPolicy {
    /// Keep only the earliest play ever, per content id.
    Global,
    /// Keep the earliest play per content id per calendar date; plays of
    /// the same content on different days are never duplicates.
    PerDay,
}

impl DedupPolicy {
    pub fn describe(&self) -> &'static str {
        match self {
            DedupPolicy::Global => "one play per title",
            DedupPolicy::PerDay => "one play per title per day",
        }
    }
}

/// Return the plays that are duplicates under `policy`: every event whose
/// dedup key was already claimed by an earlier play.
///
/// The input is stable-sorted by `watched_at` ascending before scanning, so
/// the earliest play of each content is always the one retained no matter
/// what order the pages arrived in; identical timestamps keep their
/// original (fetch) order. Events without a content id are skipped and
/// never counted. The result is in ascending `watched_at` order.
pub fn find_duplicates(events: &[WatchEvent], policy: DedupPolicy) -> Vec<WatchEvent> {
    let mut sorted: Vec<&WatchEvent> = events.iter().collect();
    sorted.sort_by_key(|e| e.watched_at);

    let mut seen: HashSet<(u64, Option<NaiveDate>)> = HashSet::new();
    let mut duplicates = Vec::new();

    for event in sorted {
        let Some(content_id) = event.content_id else {
            warn!(
                "Skipping history item {} without a content id during duplicate scan",
                event.id
            );
            continue;
        };

        let key = match policy {
            DedupPolicy::Global => (content_id, None),
            // Calendar date in the timestamp's own offset, i.e. the raw
            // date prefix of watched_at
            DedupPolicy::PerDay => (content_id, Some(event.watched_at.date_naive())),
        };

        if !seen.insert(key) {
            duplicates.push(event.clone());
        }
    }

    duplicates
}
