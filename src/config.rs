//! Service configuration
//!
//! Loaded from environment variables (optionally via a `.env` file).

use anyhow::Context;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::path::PathBuf;
use std::time::Duration;

/// Service configuration
#[derive(Debug, Clone, PartialEq)]
pub struct Config {
    /// Address to bind (default: 0.0.0.0)
    pub host: IpAddr,
    /// Port to listen on (default: 3000)
    pub port: u16,
    /// Directory submissions are written to (default: OS temp dir)
    pub temp_dir: PathBuf,
    /// Prefix of every artifact file name (default: "main")
    pub file_prefix: String,
    /// Deadline for a single run; None disables it (default: 10s)
    pub run_timeout: Option<Duration>,
    /// Alternate language table (default: the embedded one)
    pub languages_path: Option<PathBuf>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: IpAddr::V4(Ipv4Addr::UNSPECIFIED),
            port: 3000,
            temp_dir: std::env::temp_dir(),
            file_prefix: "main".to_string(),
            run_timeout: Some(Duration::from_millis(10_000)),
            languages_path: None,
        }
    }
}

impl Config {
    /// Load configuration from the process environment
    pub fn from_env() -> anyhow::Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration from any key lookup; unset or empty keys keep defaults
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> anyhow::Result<Self> {
        let get = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());
        let mut config = Self::default();

        if let Some(host) = get("CODEX_HOST") {
            config.host = host
                .trim()
                .parse()
                .with_context(|| format!("Invalid CODEX_HOST: {}", host))?;
        }
        if let Some(port) = get("CODEX_PORT") {
            config.port = port
                .trim()
                .parse()
                .with_context(|| format!("Invalid CODEX_PORT: {}", port))?;
        }
        if let Some(dir) = get("CODEX_TEMP_DIR") {
            config.temp_dir = PathBuf::from(dir);
        }
        if let Some(prefix) = get("CODEX_FILE_PREFIX") {
            if prefix.contains(std::path::is_separator) {
                anyhow::bail!("Invalid CODEX_FILE_PREFIX: {}", prefix);
            }
            config.file_prefix = prefix;
        }
        if let Some(timeout) = get("CODEX_RUN_TIMEOUT_MS") {
            let ms: u64 = timeout
                .trim()
                .parse()
                .with_context(|| format!("Invalid CODEX_RUN_TIMEOUT_MS: {}", timeout))?;
            config.run_timeout = (ms > 0).then(|| Duration::from_millis(ms));
        }
        if let Some(path) = get("CODEX_LANGUAGES") {
            config.languages_path = Some(PathBuf::from(path));
        }

        Ok(config)
    }

    pub fn bind_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}
