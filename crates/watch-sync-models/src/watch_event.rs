use crate::kind::WatchKind;
use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

/// One historical "play": a movie or episode the user marked watched at a
/// specific time. Created only by Trakt; this tool reads them and deletes
/// them by id, never creates them.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct WatchEvent {
    /// Trakt play id. Unique within one kind's history and never reused.
    pub id: u64,
    pub kind: WatchKind,
    /// Trakt id of the underlying title, stable across repeated plays.
    /// `None` marks a malformed record; the duplicate detector skips these.
    pub content_id: Option<u64>,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub year: Option<u32>,
    /// Episode kind only: parent show title, kept for display.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub show_title: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub season: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub episode: Option<u32>,
    /// The event's only temporal attribute and sole ordering key.
    pub watched_at: DateTime<FixedOffset>,
    /// Original API payload, retained for lossless cache round-trips.
    pub raw: serde_json::Value,
}

impl WatchEvent {
    /// Human-readable label, e.g. `Heat (1995)` or
    /// `The Wire S01E03 - The Buys`.
    pub fn display_title(&self) -> String {
        match self.kind {
            WatchKind::Movie => match self.year {
                Some(year) => format!("{} ({})", self.title, year),
                None => self.title.clone(),
            },
            WatchKind::Episode => {
                let prefix = match (&self.show_title, self.season, self.episode) {
                    (Some(show), Some(s), Some(e)) => format!("{} S{:02}E{:02}", show, s, e),
                    (Some(show), _, _) => show.clone(),
                    (None, Some(s), Some(e)) => format!("S{:02}E{:02}", s, e),
                    _ => String::new(),
                };
                if prefix.is_empty() {
                    self.title.clone()
                } else if self.title.is_empty() {
                    prefix
                } else {
                    format!("{} - {}", prefix, self.title)
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn movie_event() -> WatchEvent {
        WatchEvent {
            id: 1,
            kind: WatchKind::Movie,
            content_id: Some(100),
            title: "Heat".to_string(),
            year: Some(1995),
            show_title: None,
            season: None,
            episode: None,
            watched_at: DateTime::parse_from_rfc3339("2024-01-01T20:00:00Z").unwrap(),
            raw: serde_json::json!({"id": 1}),
        }
    }

    #[test]
    fn test_display_title_movie() {
        assert_eq!(movie_event().display_title(), "Heat (1995)");
    }

    #[test]
    fn test_display_title_episode() {
        let event = WatchEvent {
            kind: WatchKind::Episode,
            title: "The Buys".to_string(),
            year: None,
            show_title: Some("The Wire".to_string()),
            season: Some(1),
            episode: Some(3),
            ..movie_event()
        };
        assert_eq!(event.display_title(), "The Wire S01E03 - The Buys");
    }

    #[test]
    fn test_serde_round_trip_preserves_raw() {
        let event = movie_event();
        let json = serde_json::to_string(&event).unwrap();
        let back: WatchEvent = serde_json::from_str(&json).unwrap();
        assert_eq!(back, event);
        assert_eq!(back.raw, serde_json::json!({"id": 1}));
    }
}
