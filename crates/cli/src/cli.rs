//! CLI argument parsing.

use std::path::PathBuf;
use std::time::Duration;

use clap::{Parser, Subcommand};
use clamber_core::{Config, FileConfig};

fn chunk_size_in_range(s: &str) -> Result<usize, String> {
    let val: usize = s.parse().map_err(|e| format!("{e}"))?;
    if val == 0 {
        return Err("chunk size must be at least 1 byte".to_string());
    }
    if u32::try_from(val).is_err() {
        return Err(format!("chunk size must fit a 4-byte length prefix, got {val}"));
    }
    Ok(val)
}

#[derive(Parser)]
#[command(name = "clamber", about = "Client for the clamd scanning daemon")]
pub struct Cli {
    /// Daemon host name or address
    #[arg(long, env = "CLAMBER_HOST")]
    pub host: Option<String>,

    /// Daemon TCP port
    #[arg(long, env = "CLAMBER_PORT")]
    pub port: Option<u16>,

    /// Per-read timeout in milliseconds
    #[arg(long, env = "CLAMBER_TIMEOUT_MS")]
    pub timeout_ms: Option<u64>,

    /// Upload chunk size in bytes (must not exceed the daemon's chunk limit)
    #[arg(long, env = "CLAMBER_CHUNK_SIZE", value_parser = chunk_size_in_range)]
    pub chunk_size: Option<usize>,

    /// Response read buffer size in bytes
    #[arg(long, env = "CLAMBER_READ_BUFFER")]
    pub read_buffer: Option<usize>,

    /// Config file path (default: ~/.config/clamber/config.toml)
    #[arg(long, env = "CLAMBER_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Check daemon liveness; exit 0 on PONG
    Ping,
    /// Scan files, or stdin when none are given; exit 1 if anything was found
    Scan {
        /// Files to scan
        files: Vec<PathBuf>,
    },
    /// Send a raw command (e.g. VERSION) and print the daemon's reply
    Command {
        /// Command name, without framing
        name: String,
    },
}

impl Cli {
    /// Resolve the effective connection config: flags (and their env vars)
    /// first, then the config file, then built-in defaults.
    ///
    /// # Errors
    ///
    /// Returns an error if the config file is unreadable or no host is
    /// configured anywhere.
    pub fn resolve_config(&self) -> clamber_core::Result<Config> {
        let file = match &self.config {
            Some(path) => FileConfig::load(path)?,
            None => FileConfig::load_default()?.unwrap_or_default(),
        };

        let host = self
            .host
            .clone()
            .or(file.host)
            .ok_or_else(|| eyre::eyre!("no host configured (use --host, CLAMBER_HOST, or the config file)"))?;

        let mut config = Config::new(host);
        if let Some(port) = self.port.or(file.port) {
            config.port = port;
        }
        if let Some(ms) = self.timeout_ms.or(file.read_timeout_ms) {
            config.read_timeout = Duration::from_millis(ms);
        }
        if let Some(size) = self.chunk_size.or(file.chunk_size) {
            config.chunk_size = size;
        }
        if let Some(size) = self.read_buffer.or(file.read_buffer_size) {
            config.read_buffer_size = size;
        }
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Cli {
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn flags_override_defaults() {
        // Explicit empty config file keeps the test hermetic; no fallback to
        // whatever lives under the real home directory.
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "").unwrap();

        let cli = parse(&[
            "clamber",
            "--config",
            path.to_str().unwrap(),
            "--host",
            "scanner",
            "--port",
            "3311",
            "--timeout-ms",
            "250",
            "ping",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.host, "scanner");
        assert_eq!(config.port, 3311);
        assert_eq!(config.read_timeout, Duration::from_millis(250));
        assert_eq!(config.chunk_size, clamber_core::config::DEFAULT_CHUNK_SIZE);
    }

    #[test]
    fn config_file_fills_missing_fields() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = \"from-file\"\nchunk_size = 8192\n").unwrap();

        let cli = parse(&[
            "clamber",
            "--config",
            path.to_str().unwrap(),
            "--port",
            "3400",
            "ping",
        ]);
        let config = cli.resolve_config().unwrap();
        assert_eq!(config.host, "from-file");
        assert_eq!(config.port, 3400);
        assert_eq!(config.chunk_size, 8192);
    }

    #[test]
    fn flag_beats_config_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "host = \"from-file\"\n").unwrap();

        let cli = parse(&[
            "clamber",
            "--config",
            path.to_str().unwrap(),
            "--host",
            "from-flag",
            "ping",
        ]);
        assert_eq!(cli.resolve_config().unwrap().host, "from-flag");
    }

    #[test]
    fn rejects_zero_chunk_size() {
        assert!(Cli::try_parse_from(["clamber", "--chunk-size", "0", "ping"]).is_err());
    }
}
