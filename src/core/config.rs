use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::risk::RiskThresholds;

/// Monitor settings, persisted as settings.json.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MonitorSettings {
    /// Seconds between simulated vitals ticks
    pub tick_interval_secs: u64,
    /// How long an alert banner stays up
    pub alert_duration_ms: u64,
    pub sound_enabled: bool,
    /// Raise an alert when a risk category rises to High
    pub alert_on_escalation: bool,
    /// Risk classification table
    pub thresholds: RiskThresholds,
}

impl Default for MonitorSettings {
    fn default() -> Self {
        Self {
            tick_interval_secs: 5,
            alert_duration_ms: 5000,
            sound_enabled: true,
            alert_on_escalation: true,
            thresholds: RiskThresholds::default(),
        }
    }
}

impl MonitorSettings {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(self.tick_interval_secs)
    }
}

pub struct ConfigManager {
    config_path: PathBuf,
}

impl ConfigManager {
    pub fn new(config_dir: impl AsRef<Path>) -> Self {
        Self {
            config_path: config_dir.as_ref().join("settings.json"),
        }
    }

    pub fn path(&self) -> &Path {
        &self.config_path
    }

    /// Load settings, falling back to defaults if the file is missing or unreadable.
    pub fn load(&self) -> MonitorSettings {
        if !self.config_path.exists() {
            return MonitorSettings::default();
        }
        match fs::read_to_string(&self.config_path) {
            Ok(content) => match serde_json::from_str(&content) {
                Ok(settings) => settings,
                Err(e) => {
                    log::warn!("Ignoring invalid {:?}: {}", self.config_path, e);
                    MonitorSettings::default()
                }
            },
            Err(e) => {
                log::warn!("Could not read {:?}: {}", self.config_path, e);
                MonitorSettings::default()
            }
        }
    }

    pub fn save(&self, settings: &MonitorSettings) -> io::Result<()> {
        // Ensure directory exists
        if let Some(parent) = self.config_path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(settings)?;
        fs::write(&self.config_path, content)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_save_and_load() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path().join("nested"));

        let default = manager.load();
        assert_eq!(default.tick_interval_secs, 5);
        assert_eq!(default.alert_duration_ms, 5000);
        assert!(default.sound_enabled);

        let mut new_settings = MonitorSettings {
            tick_interval_secs: 2,
            alert_duration_ms: 8000,
            sound_enabled: false,
            alert_on_escalation: false,
            thresholds: RiskThresholds::default(),
        };
        new_settings.thresholds.spo2.medium_below = 96.0;

        manager.save(&new_settings).unwrap();
        let loaded = manager.load();

        assert_eq!(loaded, new_settings);
        assert_eq!(loaded.tick_interval(), Duration::from_secs(2));
    }

    #[test]
    fn test_partial_file_fills_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path());
        fs::write(manager.path(), r#"{"sound_enabled": false}"#).unwrap();

        let loaded = manager.load();
        assert!(!loaded.sound_enabled);
        assert_eq!(loaded.tick_interval_secs, 5);
        assert_eq!(loaded.thresholds, RiskThresholds::default());
    }

    #[test]
    fn test_corrupt_file_loads_defaults() {
        let dir = tempdir().unwrap();
        let manager = ConfigManager::new(dir.path());
        fs::write(manager.path(), "{ not json").unwrap();

        assert_eq!(manager.load(), MonitorSettings::default());
    }
}
