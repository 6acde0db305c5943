//! twmap Configuration Management
//!
//! Provides configuration loading with support for:
//! - Global config: `~/.twmap/config.toml`
//! - Local config: `.twmap/config.toml` (in the working directory)
//! - CLI overrides via `ConfigOverrides`
//!
//! Configuration is merged in order: global → local → CLI overrides.

mod error;
mod loader;

pub use error::ConfigError;
pub use loader::ConfigLoader;

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Default database file, shared with the other TW2002 helper tools.
pub const DEFAULT_DATABASE: &str = "tw2002.db";

/// Root configuration for twmap.
///
/// Represents the fully merged configuration from all sources.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct TwmapConfig {
    /// Storage configuration
    pub storage: StorageConfig,

    /// Live session behaviour
    pub session: SessionConfig,

    /// Write queue tuning
    pub writer: WriterConfig,

    /// Route planning defaults
    pub routing: RoutingConfig,

    /// Logging configuration
    pub logging: LoggingConfig,
}

impl TwmapConfig {
    /// Apply CLI overrides to this configuration.
    pub fn apply_overrides(&mut self, overrides: &ConfigOverrides) {
        if let Some(ref database) = overrides.database {
            self.storage.database = database.clone();
        }
        if let Some(auto_haggle) = overrides.auto_haggle {
            self.session.auto_haggle = auto_haggle;
        }
        if let Some(ref level) = overrides.log_level {
            self.logging.level = level.clone();
        }
    }

    /// Check values that serde cannot reject on its own.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.storage.database.as_os_str().is_empty() {
            return Err(ConfigError::EmptyDatabasePath);
        }
        if self.session.debounce_ms == 0 {
            return Err(ConfigError::ZeroDebounce);
        }
        if self.routing.probe_max_hops == 0 {
            return Err(ConfigError::ZeroProbeHops);
        }
        if !matches!(
            self.logging.level.to_lowercase().as_str(),
            "error" | "warn" | "info" | "debug" | "trace"
        ) {
            return Err(ConfigError::UnknownLogLevel(self.logging.level.clone()));
        }
        Ok(())
    }
}

/// Storage configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct StorageConfig {
    /// SQLite database file holding the accumulated map
    pub database: PathBuf,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            database: PathBuf::from(DEFAULT_DATABASE),
        }
    }
}

/// Live session configuration.
///
/// # Example TOML
///
/// ```toml
/// [session]
/// auto_haggle = true
/// debounce_ms = 300
///
/// [session.login]
/// name = "trader"
/// game = "A"
/// password = "hunter2"
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SessionConfig {
    /// Send negotiation counter-offers automatically
    pub auto_haggle: bool,

    /// Quiet period before an unterminated prompt line is classified
    pub debounce_ms: u64,

    /// Credentials injected once at the matching login prompt
    pub login: LoginConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            auto_haggle: false,
            debounce_ms: 300,
            login: LoginConfig::default(),
        }
    }
}

/// Optional login credentials.
#[derive(Debug, Clone, Serialize, Deserialize, Default, PartialEq)]
#[serde(default)]
pub struct LoginConfig {
    /// Game server user name
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,

    /// Game selection letter
    #[serde(skip_serializing_if = "Option::is_none")]
    pub game: Option<String>,

    /// Game password
    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,
}

/// Write queue configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct WriterConfig {
    /// How long the writer idles when the queue is empty
    pub idle_wait_ms: u64,

    /// Interval between queue depth reports
    pub monitor_interval_secs: u64,

    /// Flash the terminal when a burst of writes has settled
    pub flash_on_settle: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            idle_wait_ms: 1000,
            monitor_interval_secs: 10,
            flash_on_settle: true,
        }
    }
}

/// Route planning configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct RoutingConfig {
    /// Federation space sectors (safe for commissioned players)
    pub fedspace: Vec<u32>,

    /// Hop cap for the exhaustive probe search
    pub probe_max_hops: usize,

    /// Explored sector cap for the exhaustive probe search
    pub probe_max_explored: usize,

    /// Keep probe routes scoring within this many sectors of the best
    pub probe_score_window: usize,

    /// Longest probe route (in sectors) kept unless trimming is disabled
    pub max_route_len: usize,
}

impl Default for RoutingConfig {
    fn default() -> Self {
        Self {
            fedspace: (1..=10).collect(),
            probe_max_hops: 20,
            probe_max_explored: 11,
            probe_score_window: 2,
            max_route_len: 21,
        }
    }
}

/// Logging configuration.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct LoggingConfig {
    /// Default level when no verbosity flag is given
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "warn".to_string(),
        }
    }
}

/// Overrides supplied on the command line.
#[derive(Debug, Clone, Default)]
pub struct ConfigOverrides {
    pub database: Option<PathBuf>,
    pub auto_haggle: Option<bool>,
    pub log_level: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_defaults() {
        let config = TwmapConfig::default();
        assert_eq!(config.storage.database, PathBuf::from("tw2002.db"));
        assert_eq!(config.routing.fedspace, (1..=10).collect::<Vec<_>>());
        assert_eq!(config.routing.probe_max_hops, 20);
        assert_eq!(config.routing.probe_max_explored, 11);
        assert!(!config.session.auto_haggle);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config: TwmapConfig = toml::from_str(
            r#"
            [session]
            auto_haggle = true

            [session.login]
            name = "trader"
            "#,
        )
        .unwrap();

        assert!(config.session.auto_haggle);
        assert_eq!(config.session.debounce_ms, 300);
        assert_eq!(config.session.login.name.as_deref(), Some("trader"));
        assert_eq!(config.session.login.password, None);
        assert_eq!(config.writer, WriterConfig::default());
    }

    #[test]
    fn test_apply_overrides() {
        let mut config = TwmapConfig::default();
        config.apply_overrides(&ConfigOverrides {
            database: Some(PathBuf::from("other.db")),
            auto_haggle: Some(true),
            log_level: Some("debug".to_string()),
        });

        assert_eq!(config.storage.database, PathBuf::from("other.db"));
        assert!(config.session.auto_haggle);
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = TwmapConfig::default();
        config.session.debounce_ms = 0;
        assert!(matches!(config.validate(), Err(ConfigError::ZeroDebounce)));

        let mut config = TwmapConfig::default();
        config.storage.database = PathBuf::new();
        assert!(matches!(config.validate(), Err(ConfigError::EmptyDatabasePath)));

        let mut config = TwmapConfig::default();
        config.logging.level = "loud".to_string();
        assert!(matches!(
            config.validate(),
            Err(ConfigError::UnknownLogLevel(level)) if level == "loud"
        ));
    }
}
