use crate::error::SourceError;
use chrono::{DateTime, Duration, TimeZone, Utc};
use reqwest::Client;
use serde::Deserialize;
use tracing::info;

const REDIRECT_URI: &str = "urn:ietf:wg:oauth:2.0:oob";
const TOKEN_URL: &str = "https://api.trakt.tv/oauth/token";
const AUTHORIZE_URL: &str = "https://trakt.tv/oauth/authorize";

/// A token is treated as expired this long before the server would reject
/// it, so a request never races the actual expiry.
const EXPIRY_MARGIN_SECS: i64 = 300;

/// Create a reqwest Client with browser-like headers to bypass Cloudflare
pub fn create_http_client() -> Client {
    Client::builder()
        .user_agent("Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36")
        .build()
        .unwrap_or_else(|_| Client::new())
}

/// OAuth token state, refreshed in place and persisted back to the
/// credential store after every change.
#[derive(Debug, Clone)]
pub struct TokenState {
    pub access_token: String,
    pub refresh_token: String,
    pub expires_at: DateTime<Utc>,
}

impl TokenState {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        now >= self.expires_at - Duration::seconds(EXPIRY_MARGIN_SECS)
    }
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: String,
    expires_in: u64,
    created_at: Option<i64>,
}

impl TokenResponse {
    fn into_state(self) -> TokenState {
        let created_at = self
            .created_at
            .and_then(|secs| Utc.timestamp_opt(secs, 0).single())
            .unwrap_or_else(Utc::now);
        TokenState {
            access_token: self.access_token,
            refresh_token: self.refresh_token,
            expires_at: created_at + Duration::seconds(self.expires_in as i64),
        }
    }
}

fn token_request(client: &Client, payload: &serde_json::Value) -> reqwest::RequestBuilder {
    client
        .post(TOKEN_URL)
        .json(payload)
        .header("Accept", "application/json")
        .header("Accept-Language", "en-US,en;q=0.9")
        .header("Content-Type", "application/json")
        .header("Origin", "https://trakt.tv")
        .header("Referer", "https://trakt.tv/")
}

pub async fn refresh_access_token(
    client: &Client,
    client_id: &str,
    client_secret: &str,
    refresh_token: &str,
) -> Result<TokenState, SourceError> {
    let payload = serde_json::json!({
        "refresh_token": refresh_token,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": REDIRECT_URI,
        "grant_type": "refresh_token"
    });

    let response = token_request(client, &payload).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Auth(format!(
            "token refresh rejected: {} {}",
            status, body
        )));
    }

    let token_response: TokenResponse = response.json().await?;
    info!("Refreshed Trakt access token");
    Ok(token_response.into_state())
}

/// PIN-based authorization-code flow: print the authorize URL, read the PIN
/// from stdin, exchange it for tokens.
pub async fn authorize_interactive(
    client: &Client,
    client_id: &str,
    client_secret: &str,
) -> Result<TokenState, SourceError> {
    let auth_url = format!(
        "{}?response_type=code&client_id={}&redirect_uri={}",
        AUTHORIZE_URL, client_id, REDIRECT_URI
    );

    println!("\nPlease visit the following URL to authorize this application:");
    println!("{}\n", auth_url);

    use std::io::{self, Write};
    print!("Enter the PIN shown after authorizing: ");
    io::stdout()
        .flush()
        .map_err(|e| SourceError::Auth(format!("failed to prompt for PIN: {}", e)))?;

    let mut pin = String::new();
    io::stdin()
        .read_line(&mut pin)
        .map_err(|e| SourceError::Auth(format!("failed to read PIN: {}", e)))?;
    let pin = pin.trim();

    if pin.is_empty() {
        return Err(SourceError::Auth("PIN cannot be empty".to_string()));
    }

    let payload = serde_json::json!({
        "code": pin,
        "client_id": client_id,
        "client_secret": client_secret,
        "redirect_uri": REDIRECT_URI,
        "grant_type": "authorization_code"
    });

    let response = token_request(client, &payload).send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let body = response.text().await.unwrap_or_default();
        return Err(SourceError::Auth(format!(
            "PIN exchange rejected: {} {}",
            status, body
        )));
    }

    let token_response: TokenResponse = response.json().await?;
    info!("Authenticated to Trakt");
    Ok(token_response.into_state())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_token_expiry_margin() {
        let tokens = TokenState {
            access_token: "a".to_string(),
            refresh_token: "r".to_string(),
            expires_at: Utc::now() + Duration::seconds(600),
        };
        // 600s left is outside the 300s margin
        assert!(!tokens.is_expired(Utc::now()));
        // 200s left is inside the margin
        assert!(tokens.is_expired(Utc::now() + Duration::seconds(400)));
        // Long past expiry
        assert!(tokens.is_expired(Utc::now() + Duration::seconds(3600)));
    }

    #[test]
    fn test_token_response_uses_created_at_when_present() {
        let response: TokenResponse = serde_json::from_str(
            r#"{"access_token":"a","refresh_token":"r","expires_in":7200,"created_at":1700000000}"#,
        )
        .unwrap();
        let state = response.into_state();
        let expected = Utc.timestamp_opt(1700000000 + 7200, 0).single().unwrap();
        assert_eq!(state.expires_at, expected);
    }
}
