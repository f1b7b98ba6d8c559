use crate::output::Output;
use color_eyre::Result;
use watch_sync_config::PathManager;
use watch_sync_core::HistoryCache;

/// Delete local state: the history cache, the stored credentials, or both.
pub fn run(cache: bool, credentials: bool, output: &Output) -> Result<()> {
    let path_manager = PathManager::default();

    if cache {
        let history_cache = HistoryCache::new(&path_manager)
            .map_err(|e| color_eyre::eyre::eyre!("Failed to open history cache: {}", e))?;
        history_cache
            .clear()
            .map_err(|e| color_eyre::eyre::eyre!("Failed to clear history cache: {}", e))?;
        output.success("History cache cleared");
    }

    if credentials {
        let credentials_file = path_manager.credentials_file();
        if credentials_file.exists() {
            std::fs::remove_file(&credentials_file).map_err(|e| {
                color_eyre::eyre::eyre!(
                    "Failed to remove {}: {}",
                    credentials_file.display(),
                    e
                )
            })?;
            output.success("Stored credentials removed");
        } else {
            output.info("No stored credentials to remove");
        }
    }

    Ok(())
}
