use super::prompts::InteractivePrompt;
use super::setup;
use crate::output::{Output, OutputFormat};
use color_eyre::Result;
use comfy_table::modifiers::UTF8_ROUND_CORNERS;
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use serde_json::json;
use watch_sync_core::DedupPolicy;
use watch_sync_models::{WatchEvent, WatchKind};

/// Scan one kind's history for duplicate plays, list them, and optionally
/// remove them after confirmation.
pub async fn run(kind: WatchKind, policy: DedupPolicy, fix: bool, output: &Output) -> Result<()> {
    let mut orchestrator = setup::build_orchestrator(output)?;
    let scan = orchestrator
        .scan_duplicates(kind, policy)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Duplicate scan failed: {}", e))?;

    if scan.skipped_malformed > 0 {
        output.warn(format!(
            "Skipped {} events without a content id",
            scan.skipped_malformed
        ));
    }

    match output.format() {
        OutputFormat::Human => {
            if scan.flagged.is_empty() {
                output.success(format!(
                    "No duplicate {} plays found ({} scanned)",
                    kind.api_path(),
                    scan.scanned
                ));
            } else {
                output.info(format!(
                    "Found {} duplicate {} plays keeping {} ({} scanned, {}):",
                    scan.flagged.len(),
                    kind.api_path(),
                    policy.describe(),
                    scan.scanned,
                    if scan.from_cache { "from cache" } else { "freshly synced" }
                ));
                print_events_table(&scan.flagged);
            }
        }
        OutputFormat::Json | OutputFormat::JsonPretty => {
            output.json(&json!({
                "kind": kind.as_str(),
                "policy": policy_name(policy),
                "scanned": scan.scanned,
                "skipped_malformed": scan.skipped_malformed,
                "from_cache": scan.from_cache,
                "duplicates": scan.flagged.iter().map(event_json).collect::<Vec<_>>(),
            }));
        }
    }

    if scan.flagged.is_empty() {
        return Ok(());
    }

    if !fix {
        output.info("Run again with --fix to remove these plays");
        return Ok(());
    }

    let outcome = orchestrator
        .remove_with_confirmation(kind, &scan.flagged, &InteractivePrompt)
        .await
        .map_err(|e| color_eyre::eyre::eyre!("Removal failed: {}", e))?;
    super::report_removal(&outcome, output);
    Ok(())
}

fn policy_name(policy: DedupPolicy) -> &'static str {
    match policy {
        DedupPolicy::Global => "global",
        DedupPolicy::PerDay => "per-day",
    }
}

fn event_json(event: &WatchEvent) -> serde_json::Value {
    json!({
        "id": event.id,
        "title": event.display_title(),
        "watched_at": event.watched_at.to_rfc3339(),
    })
}

pub(crate) fn print_events_table(events: &[WatchEvent]) {
    let mut table = Table::new();
    table
        .load_preset(UTF8_FULL)
        .apply_modifier(UTF8_ROUND_CORNERS)
        .set_content_arrangement(ContentArrangement::Dynamic)
        .set_header(vec!["Watched at", "Title", "Play ID"]);

    for event in events {
        table.add_row(vec![
            event.watched_at.to_rfc3339(),
            event.display_title(),
            event.id.to_string(),
        ]);
    }

    println!("{table}");
}
