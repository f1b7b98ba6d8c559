pub mod auth;
pub mod clear;
pub mod duplicates;
pub mod prompts;
pub mod remove_date;
pub mod setup;
pub mod sync;

use crate::output::Output;
use watch_sync_core::RemovalOutcome;

/// Shared reporting for the two mutating commands.
pub(crate) fn report_removal(outcome: &RemovalOutcome, output: &Output) {
    match outcome {
        RemovalOutcome::Nothing => output.info("Nothing to remove"),
        RemovalOutcome::Cancelled => output.info("Aborted, nothing was deleted"),
        RemovalOutcome::Removed {
            removed,
            resynced: true,
        } => output.success(format!(
            "Removed {} plays and refreshed the local cache",
            removed
        )),
        RemovalOutcome::Removed {
            removed,
            resynced: false,
        } => {
            output.success(format!("Removed {} plays", removed));
            output.warn("Cache refresh failed; run 'rewind sync' to update the local snapshot");
        }
    }
}
