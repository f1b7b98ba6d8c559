use anyhow::Result;
use std::path::{Path, PathBuf};

pub struct PathManager {
    config_dir: PathBuf,
    data_dir: PathBuf,
}

impl PathManager {
    pub fn new() -> Result<Self> {
        let base_dir = dirs::config_dir()
            .ok_or_else(|| anyhow::anyhow!("Could not determine config directory"))?
            .join("rewind");

        Ok(Self {
            config_dir: base_dir.clone(),
            data_dir: base_dir.join("data"),
        })
    }

    /// Build a PathManager rooted at an explicit directory. Used by tests
    /// and by the `REWIND_BASE_PATH` override.
    pub fn with_base(base: impl Into<PathBuf>) -> Self {
        let base = base.into();
        Self {
            config_dir: base.clone(),
            data_dir: base.join("data"),
        }
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn data_dir(&self) -> &Path {
        &self.data_dir
    }

    pub fn cache_dir(&self) -> PathBuf {
        self.data_dir.join("cache")
    }

    pub fn cache_history_dir(&self) -> PathBuf {
        self.cache_dir().join("history")
    }

    pub fn credentials_file(&self) -> PathBuf {
        self.config_dir.join("credentials.toml")
    }

    pub fn ensure_directories(&self) -> Result<()> {
        std::fs::create_dir_all(&self.config_dir)?;
        std::fs::create_dir_all(&self.data_dir)?;
        std::fs::create_dir_all(self.cache_history_dir())?;
        Ok(())
    }
}

impl Default for PathManager {
    fn default() -> Self {
        if let Ok(base) = std::env::var("REWIND_BASE_PATH") {
            return Self::with_base(base);
        }
        Self::new().unwrap_or_else(|_| Self::with_base("."))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paths_hang_off_base() {
        let pm = PathManager::with_base("/tmp/rewind-test");
        assert_eq!(pm.credentials_file(), PathBuf::from("/tmp/rewind-test/credentials.toml"));
        assert_eq!(
            pm.cache_history_dir(),
            PathBuf::from("/tmp/rewind-test/data/cache/history")
        );
    }
}
