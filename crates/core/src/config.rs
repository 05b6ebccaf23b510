//! Runtime configuration for the clamd client.

use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

/// Default clamd TCP port.
pub const DEFAULT_PORT: u16 = 3310;
/// Default per-read timeout in milliseconds.
pub const DEFAULT_READ_TIMEOUT_MS: u64 = 1000;
/// Default upload chunk size in bytes.
pub const DEFAULT_CHUNK_SIZE: usize = 4096;
/// Default response read buffer size. Replies are a couple dozen bytes, so
/// a small buffer is plenty.
pub const DEFAULT_READ_BUFFER_SIZE: usize = 128;

/// Connection settings for a clamd client.
///
/// Every field except `host` has a default; see [`Config::new`].
#[derive(Debug, Clone)]
pub struct Config {
    /// Host name or address of the clamd instance.
    pub host: String,
    /// TCP port clamd listens on.
    pub port: u16,
    /// How long any single blocking read may wait before failing.
    pub read_timeout: Duration,
    /// Upload chunk size. Must not exceed the maximum chunk size configured
    /// on the daemon side.
    pub chunk_size: usize,
    /// Buffer size used when reading responses.
    pub read_buffer_size: usize,
}

impl Config {
    /// Build a config for `host` with default port, timeout and buffer sizes.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            port: DEFAULT_PORT,
            read_timeout: Duration::from_millis(DEFAULT_READ_TIMEOUT_MS),
            chunk_size: DEFAULT_CHUNK_SIZE,
            read_buffer_size: DEFAULT_READ_BUFFER_SIZE,
        }
    }
}

/// Optional settings read from a TOML config file. All fields may be
/// omitted; present fields fill in whatever the CLI flags left unset.
#[derive(Debug, Default, Deserialize)]
pub struct FileConfig {
    pub host: Option<String>,
    pub port: Option<u16>,
    pub read_timeout_ms: Option<u64>,
    pub chunk_size: Option<usize>,
    pub read_buffer_size: Option<usize>,
}

impl FileConfig {
    /// Load settings from an explicit path.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load(path: &Path) -> crate::Result<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| eyre::eyre!("failed to read {}: {e}", path.display()))?;
        toml::from_str(&content).map_err(|e| eyre::eyre!("failed to parse {}: {e}", path.display()))
    }

    /// Load settings from the default path (`~/.config/clamber/config.toml`).
    /// A missing file is not an error; `Ok(None)` is returned instead.
    ///
    /// # Errors
    ///
    /// Returns an error if the file exists but cannot be read or parsed.
    pub fn load_default() -> crate::Result<Option<Self>> {
        let Some(path) = default_path() else {
            return Ok(None);
        };
        if !path.exists() {
            return Ok(None);
        }
        Self::load(&path).map(Some)
    }
}

fn default_path() -> Option<PathBuf> {
    dirs::home_dir().map(|p| p.join(".config").join("clamber").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_applies_defaults() {
        let config = Config::new("localhost");
        assert_eq!(config.host, "localhost");
        assert_eq!(config.port, DEFAULT_PORT);
        assert_eq!(config.read_timeout, Duration::from_millis(1000));
        assert_eq!(config.chunk_size, 4096);
        assert_eq!(config.read_buffer_size, 128);
    }

    #[test]
    fn file_config_loads_partial_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = \"scanner.internal\"\nport = 3311\n").unwrap();

        let file = FileConfig::load(&path).unwrap();
        assert_eq!(file.host.as_deref(), Some("scanner.internal"));
        assert_eq!(file.port, Some(3311));
        assert!(file.read_timeout_ms.is_none());
        assert!(file.chunk_size.is_none());
    }

    #[test]
    fn file_config_rejects_malformed_toml() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = [not toml").unwrap();

        assert!(FileConfig::load(&path).is_err());
    }

    #[test]
    fn file_config_missing_path_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        assert!(FileConfig::load(&dir.path().join("absent.toml")).is_err());
    }
}
