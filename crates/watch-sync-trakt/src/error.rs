use thiserror::Error;

#[derive(Debug, Error)]
pub enum SourceError {
    /// PIN or refresh-token exchange failed. Not retried beyond the single
    /// refresh-then-reauthenticate fallback.
    #[error("Trakt authentication failed: {0}")]
    Auth(String),

    /// Non-success HTTP response during fetch or delete.
    #[error("Trakt request failed: {status} {body}")]
    Transport {
        status: reqwest::StatusCode,
        body: String,
    },

    /// Network-level failure before a response was received.
    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error("Failed to persist tokens: {0}")]
    TokenStore(String),
}
