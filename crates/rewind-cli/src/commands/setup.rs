use super::prompts;
use crate::output::Output;
use chrono::Utc;
use color_eyre::Result;
use indicatif::{ProgressBar, ProgressStyle};
use std::io::IsTerminal;
use watch_sync_config::{CredentialStore, PathManager, TraktCredentials};
use watch_sync_core::{HistoryCache, HistoryOrchestrator};
use watch_sync_trakt::{PageProgress, TokenState, TraktClient};

/// Build the authenticated-on-demand Trakt client from persisted state,
/// prompting for API credentials on first run.
pub(crate) fn build_client(output: &Output) -> Result<TraktClient> {
    let path_manager = PathManager::default();
    path_manager
        .ensure_directories()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to create configuration directories: {}", e))?;

    let credentials_file = path_manager.credentials_file();
    let mut store = CredentialStore::new(credentials_file.clone());
    store.load().map_err(|e| {
        color_eyre::eyre::eyre!(
            "Failed to load credentials from {}: {}",
            credentials_file.display(),
            e
        )
    })?;

    let credentials = load_or_prompt_credentials(&mut store, output)?;
    let tokens = stored_tokens(&store);

    Ok(TraktClient::new(credentials, tokens, credentials_file).with_page_progress(page_progress()))
}

pub(crate) fn build_orchestrator(output: &Output) -> Result<HistoryOrchestrator<TraktClient>> {
    let client = build_client(output)?;
    let path_manager = PathManager::default();
    let cache = HistoryCache::new(&path_manager)
        .map_err(|e| color_eyre::eyre::eyre!("Failed to open history cache: {}", e))?;
    Ok(HistoryOrchestrator::new(client, cache))
}

fn load_or_prompt_credentials(
    store: &mut CredentialStore,
    output: &Output,
) -> Result<TraktCredentials> {
    if let Some(credentials) = store.get_trakt_credentials() {
        return Ok(credentials);
    }

    output.info("First time setup - enter your Trakt API credentials");
    output.info("Create an application at https://trakt.tv/oauth/applications and use 'urn:ietf:wg:oauth:2.0:oob' as the redirect URI");

    let client_id = prompts::prompt_string("Trakt Client ID", None)?;
    let client_secret = prompts::prompt_password("Trakt Client Secret")?;
    let username = prompts::prompt_string("Trakt Username", None)?;

    let credentials = TraktCredentials {
        client_id,
        client_secret,
        username,
    };
    store.set_trakt_credentials(&credentials);
    store
        .save()
        .map_err(|e| color_eyre::eyre::eyre!("Failed to save credentials: {}", e))?;

    Ok(credentials)
}

fn stored_tokens(store: &CredentialStore) -> Option<TokenState> {
    let access_token = store.get_trakt_access_token()?.clone();
    let refresh_token = store.get_trakt_refresh_token()?.clone();
    // Missing expiry information forces a refresh on first use
    let expires_at = store.get_trakt_token_expires().unwrap_or_else(Utc::now);
    Some(TokenState {
        access_token,
        refresh_token,
        expires_at,
    })
}

/// Per-page fetch progress on stderr when attached to a terminal; silent
/// otherwise (pages are logged at debug level either way).
fn page_progress() -> PageProgress {
    if !std::io::stdout().is_terminal() {
        return Box::new(|_page, _page_count| {});
    }

    let bar = ProgressBar::new(0);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} Fetching history [{wide_bar:.cyan/blue}] page {pos}/{len}")
            .unwrap()
            .progress_chars("█▉▊▋▌▍▎▏  "),
    );

    Box::new(move |page, page_count| {
        if page_count <= 1 {
            return;
        }
        bar.set_length(page_count as u64);
        bar.set_position(page as u64);
        if page >= page_count {
            bar.finish_and_clear();
        }
    })
}
