use crate::api;
use crate::auth::{self, TokenState};
use crate::error::SourceError;
use crate::traits::HistorySource;
use async_trait::async_trait;
use chrono::Utc;
use reqwest::Client;
use std::path::PathBuf;
use tracing::info;
use watch_sync_config::{CredentialStore, TraktCredentials};
use watch_sync_models::{WatchEvent, WatchKind};

pub type PageProgress = Box<dyn Fn(u32, u32) + Send + Sync>;

/// Authenticated Trakt history client. Credentials and token state are
/// explicit constructor inputs rather than ambient globals; refreshed
/// tokens are written back to the credential store as they change.
pub struct TraktClient {
    client: Client,
    credentials: TraktCredentials,
    tokens: Option<TokenState>,
    credentials_file: PathBuf,
    encoded_username: String,
    page_progress: Option<PageProgress>,
}

impl TraktClient {
    pub fn new(
        credentials: TraktCredentials,
        tokens: Option<TokenState>,
        credentials_file: PathBuf,
    ) -> Self {
        let encoded_username = urlencoding::encode(&credentials.username).into_owned();
        Self {
            client: auth::create_http_client(),
            credentials,
            tokens,
            credentials_file,
            encoded_username,
            page_progress: None,
        }
    }

    /// Install a callback invoked after each fetched history page with
    /// `(page, page_count)`.
    pub fn with_page_progress(mut self, progress: PageProgress) -> Self {
        self.page_progress = Some(progress);
        self
    }

    /// Force the interactive PIN flow regardless of current token state.
    pub async fn authenticate_interactive(&mut self) -> Result<(), SourceError> {
        let tokens = auth::authorize_interactive(
            &self.client,
            &self.credentials.client_id,
            &self.credentials.client_secret,
        )
        .await?;
        self.store_tokens(tokens)
    }

    /// Make sure a usable access token exists before a request: none stored
    /// triggers the interactive flow, an expiring one a silent refresh with
    /// interactive re-authentication as the fallback.
    async fn ensure_auth(&mut self) -> Result<(), SourceError> {
        match &self.tokens {
            None => {
                info!("No Trakt tokens stored, starting interactive authentication");
                self.authenticate_interactive().await
            }
            Some(tokens) if tokens.is_expired(Utc::now()) => {
                info!("Trakt access token expired or expiring soon, refreshing");
                let refreshed = match auth::refresh_access_token(
                    &self.client,
                    &self.credentials.client_id,
                    &self.credentials.client_secret,
                    &tokens.refresh_token,
                )
                .await
                {
                    Ok(tokens) => tokens,
                    Err(e) => {
                        info!("Token refresh failed ({}), re-authenticating", e);
                        auth::authorize_interactive(
                            &self.client,
                            &self.credentials.client_id,
                            &self.credentials.client_secret,
                        )
                        .await?
                    }
                };
                self.store_tokens(refreshed)
            }
            Some(_) => Ok(()),
        }
    }

    fn store_tokens(&mut self, tokens: TokenState) -> Result<(), SourceError> {
        let mut store = CredentialStore::new(self.credentials_file.clone());
        store
            .load()
            .map_err(|e| SourceError::TokenStore(e.to_string()))?;
        store.set_trakt_access_token(tokens.access_token.clone());
        store.set_trakt_refresh_token(tokens.refresh_token.clone());
        store.set_trakt_token_expires(tokens.expires_at);
        store
            .save()
            .map_err(|e| SourceError::TokenStore(e.to_string()))?;
        self.tokens = Some(tokens);
        Ok(())
    }

    fn access_token(&self) -> Result<String, SourceError> {
        self.tokens
            .as_ref()
            .map(|t| t.access_token.clone())
            .ok_or_else(|| SourceError::Auth("Not authenticated".to_string()))
    }
}

#[async_trait]
impl HistorySource for TraktClient {
    async fn fetch_history(&mut self, kind: WatchKind) -> Result<Vec<WatchEvent>, SourceError> {
        self.ensure_auth().await?;
        let access_token = self.access_token()?;
        let page_progress = &self.page_progress;

        api::get_history(
            &self.client,
            &access_token,
            &self.credentials.client_id,
            &self.encoded_username,
            kind,
            |page, page_count| {
                if let Some(progress) = page_progress {
                    progress(page, page_count);
                }
            },
        )
        .await
    }

    async fn remove_events(&mut self, ids: &[u64]) -> Result<(), SourceError> {
        if ids.is_empty() {
            // Trivial success, no network call (not even auth)
            return Ok(());
        }
        self.ensure_auth().await?;
        let access_token = self.access_token()?;
        api::remove_history(&self.client, &access_token, &self.credentials.client_id, ids).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_client() -> TraktClient {
        TraktClient::new(
            TraktCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                username: "viewer".to_string(),
            },
            None,
            PathBuf::from("/nonexistent/credentials.toml"),
        )
    }

    #[tokio::test]
    async fn test_remove_events_empty_is_a_no_op() {
        // No tokens and an unreachable store path: any auth or network
        // attempt would fail, so success proves neither happened.
        let mut client = test_client();
        client.remove_events(&[]).await.unwrap();
    }

    #[test]
    fn test_username_is_url_encoded() {
        let client = TraktClient::new(
            TraktCredentials {
                client_id: "id".to_string(),
                client_secret: "secret".to_string(),
                username: "some user".to_string(),
            },
            None,
            PathBuf::from("/nonexistent"),
        );
        assert_eq!(client.encoded_username, "some%20user");
    }
}
