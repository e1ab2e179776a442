/// Session configuration.
///
/// Every field has a default, so a config file only needs the keys it
/// changes. Durations are plain milliseconds to keep the JSON readable.
use crate::error::CoreError;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

/// Quiet period before a burst of changes is reported.
pub const DEFAULT_DEBOUNCE_MS: u64 = 1_000;

/// Longest a continuous stream of changes can delay an update.
pub const DEFAULT_MAX_WAIT_MS: u64 = 5_000;

/// Largest files reported initially, and the step for each "show more".
pub const DEFAULT_TOP_FILES_PAGE: usize = 100;

/// Capacity of the event and message channels.
///
/// A full channel blocks the producer (walker or watcher) rather than
/// growing without bound while the session catches up.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 4_096;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    pub debounce_ms: u64,
    pub max_wait_ms: u64,
    pub top_files_page: usize,
    pub channel_capacity: usize,
    /// Keep following changes after the initial walk.
    pub watch: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            debounce_ms: DEFAULT_DEBOUNCE_MS,
            max_wait_ms: DEFAULT_MAX_WAIT_MS,
            top_files_page: DEFAULT_TOP_FILES_PAGE,
            channel_capacity: DEFAULT_CHANNEL_CAPACITY,
            watch: true,
        }
    }
}

impl SessionConfig {
    /// Read a JSON config file. Missing keys take their defaults.
    pub fn load(path: &Path) -> Result<Self, CoreError> {
        let text = fs::read_to_string(path).map_err(|source| CoreError::ConfigRead {
            path: path.to_path_buf(),
            source,
        })?;
        serde_json::from_str(&text).map_err(|source| CoreError::ConfigParse {
            path: path.to_path_buf(),
            source,
        })
    }

    pub fn debounce(&self) -> Duration {
        Duration::from_millis(self.debounce_ms)
    }

    pub fn max_wait(&self) -> Duration {
        Duration::from_millis(self.max_wait_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("diskwatch.json");
        fs::write(&path, r#"{ "debounce_ms": 250, "watch": false }"#).unwrap();

        let config = SessionConfig::load(&path).unwrap();
        assert_eq!(config.debounce(), Duration::from_millis(250));
        assert!(!config.watch);
        assert_eq!(config.top_files_page, DEFAULT_TOP_FILES_PAGE);
        assert_eq!(config.channel_capacity, DEFAULT_CHANNEL_CAPACITY);
    }

    #[test]
    fn missing_file_is_a_read_error() {
        let tmp = TempDir::new().unwrap();
        let err = SessionConfig::load(&tmp.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, CoreError::ConfigRead { .. }));
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("bad.json");
        fs::write(&path, "{ debounce_ms: ").unwrap();
        assert!(matches!(
            SessionConfig::load(&path).unwrap_err(),
            CoreError::ConfigParse { .. }
        ));
    }
}
