use anyhow::{anyhow, Result};
use std::path::PathBuf;
use tracing::{debug, info, warn};
use watch_sync_config::PathManager;
use watch_sync_models::{WatchEvent, WatchKind};

/// Durable store of the last fetched history snapshot, one JSON file per
/// kind. Always a full-kind replace on sync, never a delta store. Trakt
/// stays the source of truth, so a crash mid-write only costs a re-sync.
#[derive(Clone)]
pub struct HistoryCache {
    history_dir: PathBuf,
}

impl HistoryCache {
    pub fn new(path_manager: &PathManager) -> Result<Self> {
        let history_dir = path_manager.cache_history_dir();
        std::fs::create_dir_all(&history_dir)?;
        Ok(Self { history_dir })
    }

    fn kind_path(&self, kind: WatchKind) -> PathBuf {
        self.history_dir.join(format!("{}.json", kind.api_path()))
    }

    pub fn has_snapshot(&self, kind: WatchKind) -> bool {
        self.kind_path(kind).exists()
    }

    /// Discard the stored snapshot for `kind` and store the new one.
    pub fn replace_all(&self, kind: WatchKind, events: &[WatchEvent]) -> Result<()> {
        let path = self.kind_path(kind);
        match serde_json::to_string_pretty(events) {
            Ok(json) => match std::fs::write(&path, json) {
                Ok(_) => {
                    debug!("Cache saved: {} ({} events)", kind.api_path(), events.len());
                    Ok(())
                }
                Err(e) => {
                    warn!("Failed to write cache file for {}: {}", kind.api_path(), e);
                    Err(anyhow!("Failed to write cache: {}", e))
                }
            },
            Err(e) => {
                warn!("Failed to serialize cache for {}: {}", kind.api_path(), e);
                Err(anyhow!("Failed to serialize cache: {}", e))
            }
        }
    }

    /// Last stored snapshot for `kind`, or empty if none. A corrupt file is
    /// deleted and treated as empty; the next sync rebuilds it.
    pub fn load(&self, kind: WatchKind) -> Result<Vec<WatchEvent>> {
        let path = self.kind_path(kind);

        if !path.exists() {
            debug!("Cache miss: {} (file does not exist)", kind.api_path());
            return Ok(Vec::new());
        }

        match std::fs::read_to_string(&path) {
            Ok(content) => match serde_json::from_str::<Vec<WatchEvent>>(&content) {
                Ok(events) => {
                    info!("Cache hit: {} ({} events)", kind.api_path(), events.len());
                    Ok(events)
                }
                Err(e) => {
                    warn!(
                        "Cache corruption detected for {}: {}. Deleting corrupted file.",
                        kind.api_path(),
                        e
                    );
                    if let Err(rm_err) = std::fs::remove_file(&path) {
                        warn!("Failed to delete corrupted cache file: {}", rm_err);
                    }
                    Ok(Vec::new())
                }
            },
            Err(e) => {
                warn!("Failed to read cache file for {}: {}", kind.api_path(), e);
                Ok(Vec::new())
            }
        }
    }

    pub fn clear(&self) -> Result<()> {
        if self.history_dir.exists() {
            std::fs::remove_dir_all(&self.history_dir)?;
            std::fs::create_dir_all(&self.history_dir)?;
            info!("Cleared history cache directory: {:?}", self.history_dir);
        }
        Ok(())
    }
}
