use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::PathBuf;
use toml;

/// Trakt API application credentials entered by the user once during setup.
#[derive(Debug, Clone)]
pub struct TraktCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub username: String,
}

#[derive(Debug, Serialize, Deserialize, Default)]
struct CredentialsData {
    #[serde(flatten)]
    data: HashMap<String, String>,
}

/// Flat key-value store persisted as TOML. Holds the Trakt application
/// credentials and the OAuth token state between invocations.
pub struct CredentialStore {
    path: PathBuf,
    credentials: HashMap<String, String>,
}

impl CredentialStore {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            credentials: HashMap::new(),
        }
    }

    pub fn load(&mut self) -> Result<()> {
        if self.path.exists() {
            let content = std::fs::read_to_string(&self.path)?;
            let creds_data: CredentialsData = toml::from_str(&content)?;
            self.credentials = creds_data.data;
        }
        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let creds_data = CredentialsData {
            data: self.credentials.clone(),
        };
        let content = toml::to_string_pretty(&creds_data)?;
        std::fs::write(&self.path, content)?;
        Ok(())
    }

    pub fn get(&self, key: &str) -> Option<&String> {
        self.credentials.get(key)
    }

    pub fn set(&mut self, key: String, value: String) {
        self.credentials.insert(key, value);
    }

    pub fn remove(&mut self, key: &str) {
        self.credentials.remove(key);
    }

    // Convenience accessors for the Trakt credential set

    pub fn get_trakt_credentials(&self) -> Option<TraktCredentials> {
        Some(TraktCredentials {
            client_id: self.get("trakt_client_id")?.clone(),
            client_secret: self.get("trakt_client_secret")?.clone(),
            username: self.get("trakt_username")?.clone(),
        })
    }

    pub fn set_trakt_credentials(&mut self, creds: &TraktCredentials) {
        self.set("trakt_client_id".to_string(), creds.client_id.clone());
        self.set("trakt_client_secret".to_string(), creds.client_secret.clone());
        self.set("trakt_username".to_string(), creds.username.clone());
    }

    pub fn get_trakt_access_token(&self) -> Option<&String> {
        self.get("trakt_access_token")
    }

    pub fn set_trakt_access_token(&mut self, token: String) {
        self.set("trakt_access_token".to_string(), token);
    }

    pub fn get_trakt_refresh_token(&self) -> Option<&String> {
        self.get("trakt_refresh_token")
    }

    pub fn set_trakt_refresh_token(&mut self, token: String) {
        self.set("trakt_refresh_token".to_string(), token);
    }

    pub fn get_trakt_token_expires(&self) -> Option<DateTime<Utc>> {
        self.get("trakt_token_expires")
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map(|dt| dt.with_timezone(&Utc))
    }

    pub fn set_trakt_token_expires(&mut self, expires: DateTime<Utc>) {
        self.set("trakt_token_expires".to_string(), expires.to_rfc3339());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::NamedTempFile;

    #[test]
    fn test_credential_store_load_and_save() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        store.set_trakt_credentials(&TraktCredentials {
            client_id: "abc".to_string(),
            client_secret: "shh".to_string(),
            username: "viewer".to_string(),
        });
        store.set_trakt_access_token("test_token".to_string());
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        let creds = loaded_store.get_trakt_credentials().unwrap();
        assert_eq!(creds.client_id, "abc");
        assert_eq!(creds.username, "viewer");
        assert_eq!(loaded_store.get_trakt_access_token(), Some(&"test_token".to_string()));
    }

    #[test]
    fn test_credentials_absent_when_incomplete() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/rewind-creds-test"));
        store.set("trakt_client_id".to_string(), "abc".to_string());
        // No secret or username yet
        assert!(store.get_trakt_credentials().is_none());
    }

    #[test]
    fn test_credential_store_token_expires_round_trip() {
        let file = NamedTempFile::new().unwrap();
        let path = file.path().to_path_buf();

        let mut store = CredentialStore::new(path.clone());
        let expires = Utc::now() + chrono::Duration::hours(1);
        store.set_trakt_token_expires(expires);
        store.save().unwrap();

        let mut loaded_store = CredentialStore::new(path);
        loaded_store.load().unwrap();
        let loaded_expires = loaded_store.get_trakt_token_expires().unwrap();
        assert!((loaded_expires - expires).num_seconds().abs() < 2);
    }

    #[test]
    fn test_credential_store_remove() {
        let mut store = CredentialStore::new(PathBuf::from("/tmp/rewind-creds-test"));
        store.set("key1".to_string(), "value1".to_string());
        store.set("key2".to_string(), "value2".to_string());

        assert_eq!(store.get("key1"), Some(&"value1".to_string()));
        store.remove("key1");
        assert_eq!(store.get("key1"), None);
        assert_eq!(store.get("key2"), Some(&"value2".to_string()));
    }
}
