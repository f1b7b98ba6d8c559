pub mod cache;
pub mod dedup;
pub mod orchestrator;
pub mod prompt;

pub use cache::HistoryCache;
pub use dedup::{find_duplicates, DedupPolicy};
pub use orchestrator::{DuplicateScan, HistoryOrchestrator, RemovalOutcome, SyncReport};
pub use prompt::{Prompt, ScriptedPrompt};
