use crate::error::SourceError;
use chrono::DateTime;
use reqwest::{Client, RequestBuilder};
use serde::Deserialize;
use tracing::{debug, warn};
use watch_sync_models::{WatchEvent, WatchKind};

const API_BASE: &str = "https://api.trakt.tv";
const PAGE_COUNT_HEADER: &str = "x-pagination-page-count";
/// Trakt caps history pages at 100 items.
const PAGE_LIMIT: u32 = 100;

#[derive(Debug, Deserialize)]
struct TraktIds {
    trakt: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct TraktMovie {
    title: String,
    year: Option<u32>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct TraktShow {
    title: String,
    year: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct TraktEpisode {
    title: Option<String>,
    season: Option<u32>,
    number: Option<u32>,
    ids: TraktIds,
}

#[derive(Debug, Deserialize)]
struct TraktHistoryItem {
    id: u64,
    #[serde(rename = "watched_at")]
    watched_at: String,
    movie: Option<TraktMovie>,
    show: Option<TraktShow>,
    episode: Option<TraktEpisode>,
}

fn apply_headers(builder: RequestBuilder, access_token: &str, client_id: &str) -> RequestBuilder {
    builder
        .header("Authorization", format!("Bearer {}", access_token))
        .header("trakt-api-version", "2")
        .header("trakt-api-key", client_id)
        .header("Accept", "application/json")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Content-Type", "application/json")
        .header("Origin", "https://trakt.tv")
        .header("Referer", "https://trakt.tv/")
}

/// Fetch the complete watch history for one kind, following
/// `x-pagination-page-count` until exhausted. Results are concatenated in
/// receive order; sorting is the duplicate detector's job, not this layer's.
pub async fn get_history(
    client: &Client,
    access_token: &str,
    client_id: &str,
    encoded_username: &str,
    kind: WatchKind,
    mut on_page: impl FnMut(u32, u32),
) -> Result<Vec<WatchEvent>, SourceError> {
    let mut events = Vec::new();
    let mut page = 1u32;

    loop {
        let url = format!(
            "{}/users/{}/history/{}?page={}&limit={}",
            API_BASE,
            encoded_username,
            kind.api_path(),
            page,
            PAGE_LIMIT
        );

        let response = apply_headers(client.get(&url), access_token, client_id)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(SourceError::Transport { status, body });
        }

        let page_count = response
            .headers()
            .get(PAGE_COUNT_HEADER)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.parse::<u32>().ok())
            .unwrap_or(1);

        let items: Vec<serde_json::Value> = response.json().await?;
        for value in items {
            if let Some(event) = convert_history_item(kind, value) {
                events.push(event);
            }
        }

        debug!(
            "Fetched {} history page {}/{} ({} items so far)",
            kind.api_path(),
            page,
            page_count,
            events.len()
        );
        on_page(page, page_count);

        if page >= page_count {
            break;
        }
        page += 1;
    }

    Ok(events)
}

/// Bulk-delete plays by id. The remote endpoint gives no per-id result, so
/// callers must treat the outcome as all-or-nothing.
pub async fn remove_history(
    client: &Client,
    access_token: &str,
    client_id: &str,
    ids: &[u64],
) -> Result<(), SourceError> {
    let url = format!("{}/sync/history/remove", API_BASE);
    let payload = serde_json::json!({ "ids": ids });

    let response = apply_headers(client.post(&url), access_token, client_id)
        .json(&payload)
        .send()
        .await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Transport { status, body });
    }

    debug!("Removed {} history items", ids.len());
    Ok(())
}

/// Convert one raw history item into a `WatchEvent`, keeping the original
/// payload alongside. Items without a parseable id or timestamp are dropped
/// with a warning; a missing content id is preserved as `None` so the
/// detector can skip (and count) it.
fn convert_history_item(kind: WatchKind, value: serde_json::Value) -> Option<WatchEvent> {
    let item: TraktHistoryItem = match serde_json::from_value(value.clone()) {
        Ok(item) => item,
        Err(e) => {
            warn!("Skipping unparseable history item: {}", e);
            return None;
        }
    };

    let watched_at = match DateTime::parse_from_rfc3339(&item.watched_at) {
        Ok(ts) => ts,
        Err(e) => {
            warn!(
                "Skipping history item {}: bad watched_at {:?}: {}",
                item.id, item.watched_at, e
            );
            return None;
        }
    };

    let event = match kind {
        WatchKind::Movie => {
            let movie = item.movie.as_ref();
            WatchEvent {
                id: item.id,
                kind,
                content_id: movie.and_then(|m| m.ids.trakt),
                title: movie.map(|m| m.title.clone()).unwrap_or_default(),
                year: movie.and_then(|m| m.year),
                show_title: None,
                season: None,
                episode: None,
                watched_at,
                raw: value,
            }
        }
        WatchKind::Episode => {
            let episode = item.episode.as_ref();
            let show = item.show.as_ref();
            WatchEvent {
                id: item.id,
                kind,
                content_id: episode.and_then(|e| e.ids.trakt),
                title: episode.and_then(|e| e.title.clone()).unwrap_or_default(),
                year: show.and_then(|s| s.year),
                show_title: show.map(|s| s.title.clone()),
                season: episode.and_then(|e| e.season),
                episode: episode.and_then(|e| e.number),
                watched_at,
                raw: value,
            }
        }
    };

    if event.content_id.is_none() {
        warn!("History item {} has no resolvable {} id", event.id, kind);
    }

    Some(event)
}
