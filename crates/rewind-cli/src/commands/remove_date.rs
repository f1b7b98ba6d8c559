use super::prompts::InteractivePrompt;
use super::setup;
use crate::output::{Output, OutputFormat};
use chrono::NaiveDate;
use color_eyre::Result;
use serde_json::json;
use watch_sync_models::WatchKind;

/// Remove every play of one kind whose calendar date matches `date`,
/// after listing them and asking for confirmation.
pub async fn run(kind: WatchKind, date: NaiveDate, output: &Output) -> Result<()> {
    let mut orchestrator = setup::build_orchestrator(output)?;
    let matching = orchestrator
        .events_on_date(kind, date)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Failed to load history: {}", e))?;

    match output.format() {
        OutputFormat::Human => {
            if matching.is_empty() {
                output.info(format!("No {} plays on {}", kind.api_path(), date));
            } else {
                output.info(format!(
                    "{} {} plays on {}:",
                    matching.len(),
                    kind.api_path(),
                    date
                ));
                super::duplicates::print_events_table(&matching);
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "kind": kind.as_str(),
                "date": date.to_string(),
                "matches": matching
                    .iter()
                    .map(|e| json!({
                        "id": e.id,
                        "title": e.display_title(),
                        "watched_at": e.watched_at.to_rfc3339(),
                    }))
                    .collect::<Vec<_>>(),
            }));
        }
    }

    let outcome = orchestrator
        .remove_with_confirmation(kind, &matching, &InteractivePrompt)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Removal failed: {}", e))?;
    super::report_removal(&outcome, output);
    Ok(())
}
