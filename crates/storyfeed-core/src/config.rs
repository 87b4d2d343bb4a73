//! Runtime configuration, loaded from TOML.
//!
//! Every section is optional. A missing file section or field falls back to
//! the default shown below.
//!
//! ```toml
//! [server]
//! bind_addr = "127.0.0.1:3500"
//!
//! [stories]
//! default_limit = 50
//! max_limit = 500
//!
//! [sweep]
//! max_attempts = 3
//! backoff_ms = 50
//!
//! [password]
//! memory_kib = 19456
//! iterations = 2
//! parallelism = 1
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Errors raised while loading configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("failed to render config: {0}")]
    Render(#[from] toml::ser::Error),
}

/// Top-level configuration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FeedConfig {
    pub server: ServerSection,
    pub stories: StoryLimits,
    pub sweep: SweepConfig,
    pub password: PasswordConfig,
}

impl FeedConfig {
    /// Read and parse a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Render the effective configuration back to TOML.
    pub fn to_toml_string(&self) -> Result<String, ConfigError> {
        Ok(toml::to_string_pretty(self)?)
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerSection {
    pub bind_addr: SocketAddr,
}

impl Default for ServerSection {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 3500)),
        }
    }
}

/// Page sizes for story listings.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoryLimits {
    pub default_limit: usize,
    pub max_limit: usize,
}

impl StoryLimits {
    /// Page size for a requested `amount`. Zero or absent means the default;
    /// anything above the cap is clamped.
    pub fn resolve(&self, amount: Option<usize>) -> usize {
        match amount {
            Some(n) if n > 0 => n.min(self.max_limit),
            _ => self.default_limit.min(self.max_limit),
        }
    }
}

impl Default for StoryLimits {
    fn default() -> Self {
        Self {
            default_limit: 50,
            max_limit: 500,
        }
    }
}

/// Retry policy for sweep passes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SweepConfig {
    pub max_attempts: u32,
    pub backoff_ms: u64,
}

impl SweepConfig {
    /// Delay before retry number `attempt` (1-based).
    pub fn backoff(&self, attempt: u32) -> Duration {
        Duration::from_millis(self.backoff_ms.saturating_mul(u64::from(attempt)))
    }
}

impl Default for SweepConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            backoff_ms: 50,
        }
    }
}

/// Argon2id cost parameters.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PasswordConfig {
    pub memory_kib: u32,
    pub iterations: u32,
    pub parallelism: u32,
}

impl Default for PasswordConfig {
    fn default() -> Self {
        Self {
            memory_kib: 19456,
            iterations: 2,
            parallelism: 1,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn empty_text_gives_defaults() {
        let config = FeedConfig::from_toml_str("").unwrap();
        assert_eq!(config, FeedConfig::default());
        assert_eq!(config.server.bind_addr.port(), 3500);
        assert_eq!(config.stories.default_limit, 50);
        assert_eq!(config.sweep.max_attempts, 3);
        assert_eq!(config.password.memory_kib, 19456);
    }

    #[test]
    fn partial_sections_keep_other_defaults() {
        let config = FeedConfig::from_toml_str(
            r#"
            [stories]
            max_limit = 20

            [sweep]
            backoff_ms = 5
            "#,
        )
        .unwrap();
        assert_eq!(config.stories.max_limit, 20);
        assert_eq!(config.stories.default_limit, 50);
        assert_eq!(config.sweep.backoff_ms, 5);
        assert_eq!(config.sweep.max_attempts, 3);
    }

    #[test]
    fn rejects_bad_bind_addr() {
        let err = FeedConfig::from_toml_str("[server]\nbind_addr = \"nowhere\"").unwrap_err();
        assert!(matches!(err, ConfigError::Parse(_)));
    }

    #[test]
    fn load_reads_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[server]\nbind_addr = \"0.0.0.0:8080\"").unwrap();

        let config = FeedConfig::load(file.path()).unwrap();
        assert_eq!(config.server.bind_addr.to_string(), "0.0.0.0:8080");
    }

    #[test]
    fn load_missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = FeedConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn rendered_config_parses_back() {
        let mut config = FeedConfig::default();
        config.sweep.max_attempts = 7;
        let text = config.to_toml_string().unwrap();
        assert_eq!(FeedConfig::from_toml_str(&text).unwrap(), config);
    }

    #[test]
    fn story_limits_resolve() {
        let limits = StoryLimits {
            default_limit: 10,
            max_limit: 25,
        };
        assert_eq!(limits.resolve(None), 10);
        assert_eq!(limits.resolve(Some(0)), 10);
        assert_eq!(limits.resolve(Some(3)), 3);
        assert_eq!(limits.resolve(Some(100)), 25);
    }

    #[test]
    fn sweep_backoff_is_linear() {
        let sweep = SweepConfig {
            max_attempts: 3,
            backoff_ms: 40,
        };
        assert_eq!(sweep.backoff(1), Duration::from_millis(40));
        assert_eq!(sweep.backoff(3), Duration::from_millis(120));
    }
}
