pub mod credentials;
pub mod paths;

pub use credentials::{CredentialStore, TraktCredentials};
pub use paths::PathManager;
