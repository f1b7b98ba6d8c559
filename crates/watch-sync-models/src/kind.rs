use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Content category of a watch event. Movies and episodes live in separate
/// history partitions on Trakt and in the local cache.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum WatchKind {
    Movie,
    Episode,
}

impl WatchKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            WatchKind::Movie => "movie",
            WatchKind::Episode => "episode",
        }
    }

    /// Plural form used in Trakt API paths (`/users/{u}/history/movies`).
    pub fn api_path(&self) -> &'static str {
        match self {
            WatchKind::Movie => "movies",
            WatchKind::Episode => "episodes",
        }
    }
}

impl fmt::Display for WatchKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for WatchKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "movie" | "movies" => Ok(WatchKind::Movie),
            "episode" | "episodes" => Ok(WatchKind::Episode),
            _ => Err(format!("Unknown watch kind: {}. Use 'movies' or 'episodes'", s)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_from_str_accepts_plural_and_singular() {
        assert_eq!("movies".parse::<WatchKind>().unwrap(), WatchKind::Movie);
        assert_eq!("movie".parse::<WatchKind>().unwrap(), WatchKind::Movie);
        assert_eq!("Episodes".parse::<WatchKind>().unwrap(), WatchKind::Episode);
        assert!("shows".parse::<WatchKind>().is_err());
    }

    #[test]
    fn test_kind_serde_round_trip() {
        let json = serde_json::to_string(&WatchKind::Episode).unwrap();
        assert_eq!(json, "\"episode\"");
        let kind: WatchKind = serde_json::from_str(&json).unwrap();
        assert_eq!(kind, WatchKind::Episode);
    }
}
