//! User preferences persisted between sessions as a small JSON file.

use chrono::{DateTime, Utc};
use clap::ValueEnum;
use jdn_core::error::{GardenError, Result};
use log::{info, warn};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Light,
    Dark,
}

impl Theme {
    pub fn toggled(self) -> Theme {
        match self {
            Theme::Light => Theme::Dark,
            Theme::Dark => Theme::Light,
        }
    }
}

impl fmt::Display for Theme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Theme::Light => write!(f, "light"),
            Theme::Dark => write!(f, "dark"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Preferences {
    pub theme: Theme,
    pub sidebar_open: bool,
    pub tutorial_shown: bool,
    pub last_visit: Option<DateTime<Utc>>,
}

impl Default for Preferences {
    fn default() -> Self {
        Self {
            theme: Theme::Light,
            sidebar_open: true,
            tutorial_shown: false,
            last_visit: None,
        }
    }
}

impl Preferences {
    /// Read preferences from `path`. A missing or unreadable file gives
    /// the defaults.
    pub fn load(path: &Path) -> Preferences {
        let body = match std::fs::read_to_string(path) {
            Ok(body) => body,
            Err(e) => {
                warn!("preferences: {} not read ({}), using defaults", path.display(), e);
                return Preferences::default();
            }
        };
        match serde_json::from_str(&body) {
            Ok(preferences) => preferences,
            Err(e) => {
                warn!("preferences: {} is malformed ({}), using defaults", path.display(), e);
                Preferences::default()
            }
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let origin = path.display().to_string();
        let body =
            serde_json::to_string_pretty(self).map_err(|e| GardenError::write(origin.as_str(), e))?;
        std::fs::write(path, body).map_err(|e| GardenError::write(origin.as_str(), e))?;
        info!("preferences: saved {}", origin);
        Ok(())
    }

    /// Record a visit; true when it is the first one.
    pub fn touch(&mut self, now: DateTime<Utc>) -> bool {
        self.last_visit.replace(now).is_none()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let preferences = Preferences::load(&dir.path().join("absent.json"));
        assert_eq!(preferences, Preferences::default());
        assert!(preferences.sidebar_open);
    }

    #[test]
    fn test_malformed_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, "{ not json").unwrap();
        assert_eq!(Preferences::load(&path), Preferences::default());
    }

    #[test]
    fn test_save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        let mut preferences = Preferences {
            theme: Theme::Dark,
            tutorial_shown: true,
            ..Preferences::default()
        };
        assert!(preferences.touch(Utc.with_ymd_and_hms(2026, 10, 18, 8, 0, 0).unwrap()));
        assert!(!preferences.touch(Utc.with_ymd_and_hms(2026, 10, 18, 9, 0, 0).unwrap()));
        preferences.save(&path).unwrap();

        let loaded = Preferences::load(&path);
        assert_eq!(loaded, preferences);
        assert!(std::fs::read_to_string(&path).unwrap().contains(r#""theme": "dark""#));
    }

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("preferences.json");
        std::fs::write(&path, r#"{ "theme": "dark" }"#).unwrap();
        let loaded = Preferences::load(&path);
        assert_eq!(loaded.theme, Theme::Dark);
        assert!(loaded.sidebar_open);
        assert_eq!(loaded.last_visit, None);
    }

    #[test]
    fn test_theme_toggle() {
        assert_eq!(Theme::Light.toggled(), Theme::Dark);
        assert_eq!(Theme::Dark.toggled().to_string(), "light");
    }
}
