use super::setup;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use serde_json::json;
use watch_sync_models::WatchKind;

/// Fetch the requested kinds from Trakt and replace the local snapshots.
pub async fn run(kinds: &[WatchKind], output: &Output) -> Result<()> {
    let mut orchestrator = setup::build_orchestrator(output)?;
    let report = orchestrator.sync(kinds).await;

    match output.format() {
        OutputFormat::Human => {
            for (kind, count) in &report.synced {
                output.success(format!("Synced {} {} plays", count, kind.api_path()));
            }
            for (kind, error) in &report.errors {
                output.error(format!("Failed to sync {}: {}", kind.api_path(), error));
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "synced": report
                    .synced
                    .iter()
                    .map(|(kind, count)| json!({"kind": kind.as_str(), "events": count}))
                    .collect::<Vec<_>>(),
                "errors": report
                    .errors
                    .iter()
                    .map(|(kind, error)| json!({"kind": kind.as_str(), "error": error}))
                    .collect::<Vec<_>>(),
            }));
        }
    }

    if report.all_failed() {
        return Err(color_eyre::eyre::eyre!("All kinds failed to sync"));
    }
    Ok(())
}
