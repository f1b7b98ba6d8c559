pub mod api;
pub mod auth;
pub mod client;
pub mod error;
pub mod traits;

pub use auth::TokenState;
pub use client::{PageProgress, TraktClient};
pub use error::SourceError;
pub use traits::HistorySource;
