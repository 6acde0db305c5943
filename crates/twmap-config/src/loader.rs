//! Configuration loader with inheritance support.
//!
//! Loads configuration from multiple sources and merges them:
//! 1. Global config: `~/.twmap/config.toml`
//! 2. Local config: `.twmap/config.toml` (in the working directory)
//! 3. CLI overrides
//!
//! Later sources override earlier ones.

use crate::error::ConfigError;
use crate::{
    ConfigOverrides, LoggingConfig, LoginConfig, RoutingConfig, SessionConfig, StorageConfig,
    TwmapConfig, WriterConfig,
};
use std::path::{Path, PathBuf};
use tracing::{debug, trace};

/// Configuration file name.
const CONFIG_FILE_NAME: &str = "config.toml";

/// Configuration directory name, both under the home directory and locally.
const CONFIG_DIR: &str = ".twmap";

/// Configuration loader with caching and inheritance support.
#[derive(Debug, Clone)]
pub struct ConfigLoader {
    /// Global config directory (e.g., `~/.twmap`)
    global_config_dir: Option<PathBuf>,

    /// Cached global config
    global_config: Option<TwmapConfig>,
}

impl Default for ConfigLoader {
    fn default() -> Self {
        Self::new()
    }
}

impl ConfigLoader {
    /// Create a new configuration loader.
    ///
    /// Automatically detects the global config directory (`~/.twmap`).
    pub fn new() -> Self {
        let global_config_dir = dirs::home_dir().map(|h| h.join(CONFIG_DIR));

        Self {
            global_config_dir,
            global_config: None,
        }
    }

    /// Create a loader with a custom global config directory.
    ///
    /// Useful for testing.
    pub fn with_global_dir(global_dir: impl Into<PathBuf>) -> Self {
        Self {
            global_config_dir: Some(global_dir.into()),
            global_config: None,
        }
    }

    /// Get the global config file path.
    pub fn global_config_path(&self) -> Option<PathBuf> {
        self.global_config_dir
            .as_ref()
            .map(|d| d.join(CONFIG_FILE_NAME))
    }

    /// Get the local config file path for a directory.
    pub fn local_config_path(&self, root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE_NAME)
    }

    /// Load configuration with optional CLI overrides.
    ///
    /// Merges config in order: global → local → overrides.
    pub fn load(
        &mut self,
        root: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<TwmapConfig, ConfigError> {
        let mut config = TwmapConfig::default();

        if let Some(global_config) = self.load_global()? {
            config = merge_configs(config, global_config);
        }

        if let Some(local_config) = self.load_local(root)? {
            config = merge_configs(config, local_config);
        }

        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load a single named file over the defaults, skipping global and local
    /// lookup.
    pub fn load_file(
        &self,
        path: &Path,
        overrides: Option<&ConfigOverrides>,
    ) -> Result<TwmapConfig, ConfigError> {
        debug!("Loading config from {:?}", path);
        let mut config = merge_configs(TwmapConfig::default(), load_config_file(path)?);
        if let Some(ovr) = overrides {
            config.apply_overrides(ovr);
        }
        config.validate()?;
        Ok(config)
    }

    /// Load only the global configuration.
    pub fn load_global(&mut self) -> Result<Option<TwmapConfig>, ConfigError> {
        if let Some(ref config) = self.global_config {
            return Ok(Some(config.clone()));
        }

        let Some(global_path) = self.global_config_path() else {
            debug!("No home directory found, skipping global config");
            return Ok(None);
        };

        if !global_path.exists() {
            trace!("Global config not found at {:?}", global_path);
            return Ok(None);
        }

        debug!("Loading global config from {:?}", global_path);
        let config = load_config_file(&global_path)?;
        self.global_config = Some(config.clone());

        Ok(Some(config))
    }

    /// Load only the local configuration.
    pub fn load_local(&self, root: &Path) -> Result<Option<TwmapConfig>, ConfigError> {
        let local_path = self.local_config_path(root);

        if !local_path.exists() {
            trace!("Local config not found at {:?}", local_path);
            return Ok(None);
        }

        debug!("Loading local config from {:?}", local_path);
        load_config_file(&local_path).map(Some)
    }

    /// Write a default local configuration unless one already exists.
    pub fn init_local(&self, root: &Path) -> Result<PathBuf, ConfigError> {
        let config_path = self.local_config_path(root);
        if !config_path.exists() {
            save_config_file(&config_path, &TwmapConfig::default())?;
        }
        Ok(config_path)
    }

    /// Write a default global configuration unless one already exists.
    pub fn init_global(&self) -> Result<PathBuf, ConfigError> {
        let Some(config_path) = self.global_config_path() else {
            return Err(ConfigError::NoHomeDir);
        };
        if !config_path.exists() {
            save_config_file(&config_path, &TwmapConfig::default())?;
        }
        Ok(config_path)
    }
}

/// Load a configuration file from disk.
fn load_config_file(path: &Path) -> Result<TwmapConfig, ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Unreadable {
        path: path.to_path_buf(),
        source,
    })?;

    toml::from_str(&content).map_err(|source| ConfigError::Malformed {
        path: path.to_path_buf(),
        source,
    })
}

/// Save a configuration file to disk.
fn save_config_file(path: &Path, config: &TwmapConfig) -> Result<(), ConfigError> {
    if let Some(parent) = path.parent() {
        if !parent.exists() {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Unwritable {
                path: parent.to_path_buf(),
                source,
            })?;
        }
    }

    let content = toml::to_string_pretty(config)?;
    std::fs::write(path, content).map_err(|source| ConfigError::Unwritable {
        path: path.to_path_buf(),
        source,
    })
}

/// Merge two configurations, with `overlay` taking precedence.
///
/// A field of `overlay` wins only when it differs from the default, so a
/// partial local file does not reset values set globally.
fn merge_configs(base: TwmapConfig, overlay: TwmapConfig) -> TwmapConfig {
    TwmapConfig {
        storage: merge_storage(base.storage, overlay.storage),
        session: merge_session(base.session, overlay.session),
        writer: merge_writer(base.writer, overlay.writer),
        routing: merge_routing(base.routing, overlay.routing),
        logging: merge_logging(base.logging, overlay.logging),
    }
}

fn pick<T: PartialEq>(base: T, overlay: T, default: T) -> T {
    if overlay != default {
        overlay
    } else {
        base
    }
}

fn merge_storage(base: StorageConfig, overlay: StorageConfig) -> StorageConfig {
    let default = StorageConfig::default();
    StorageConfig {
        database: pick(base.database, overlay.database, default.database),
    }
}

fn merge_session(base: SessionConfig, overlay: SessionConfig) -> SessionConfig {
    let default = SessionConfig::default();
    SessionConfig {
        auto_haggle: pick(base.auto_haggle, overlay.auto_haggle, default.auto_haggle),
        debounce_ms: pick(base.debounce_ms, overlay.debounce_ms, default.debounce_ms),
        login: LoginConfig {
            name: overlay.login.name.or(base.login.name),
            game: overlay.login.game.or(base.login.game),
            password: overlay.login.password.or(base.login.password),
        },
    }
}

fn merge_writer(base: WriterConfig, overlay: WriterConfig) -> WriterConfig {
    let default = WriterConfig::default();
    WriterConfig {
        idle_wait_ms: pick(base.idle_wait_ms, overlay.idle_wait_ms, default.idle_wait_ms),
        monitor_interval_secs: pick(
            base.monitor_interval_secs,
            overlay.monitor_interval_secs,
            default.monitor_interval_secs,
        ),
        flash_on_settle: pick(
            base.flash_on_settle,
            overlay.flash_on_settle,
            default.flash_on_settle,
        ),
    }
}

fn merge_routing(base: RoutingConfig, overlay: RoutingConfig) -> RoutingConfig {
    let default = RoutingConfig::default();
    RoutingConfig {
        fedspace: pick(base.fedspace, overlay.fedspace, default.fedspace),
        probe_max_hops: pick(
            base.probe_max_hops,
            overlay.probe_max_hops,
            default.probe_max_hops,
        ),
        probe_max_explored: pick(
            base.probe_max_explored,
            overlay.probe_max_explored,
            default.probe_max_explored,
        ),
        probe_score_window: pick(
            base.probe_score_window,
            overlay.probe_score_window,
            default.probe_score_window,
        ),
        max_route_len: pick(
            base.max_route_len,
            overlay.max_route_len,
            default.max_route_len,
        ),
    }
}

fn merge_logging(base: LoggingConfig, overlay: LoggingConfig) -> LoggingConfig {
    let default = LoggingConfig::default();
    LoggingConfig {
        level: pick(base.level, overlay.level, default.level),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use tempfile::TempDir;

    fn write_config(dir: &Path, content: &str) -> PathBuf {
        let config_dir = dir.join(CONFIG_DIR);
        std::fs::create_dir_all(&config_dir).unwrap();
        let path = config_dir.join(CONFIG_FILE_NAME);
        std::fs::write(&path, content).unwrap();
        path
    }

    #[test]
    fn test_load_default_config() {
        let global = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        let mut loader = ConfigLoader::with_global_dir(global.path().join(CONFIG_DIR));

        let config = loader.load(local.path(), None).unwrap();
        assert_eq!(config, TwmapConfig::default());
    }

    #[test]
    fn test_local_overrides_global() {
        let home = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        write_config(
            home.path(),
            r#"
            [storage]
            database = "global.db"

            [session]
            auto_haggle = true
            "#,
        );
        write_config(
            local.path(),
            r#"
            [storage]
            database = "local.db"
            "#,
        );

        let mut loader = ConfigLoader::with_global_dir(home.path().join(CONFIG_DIR));
        let config = loader.load(local.path(), None).unwrap();

        assert_eq!(config.storage.database, PathBuf::from("local.db"));
        // untouched by the local file, so the global value survives
        assert!(config.session.auto_haggle);
    }

    #[test]
    fn test_overrides_win() {
        let home = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        write_config(local.path(), "[logging]\nlevel = \"info\"\n");

        let mut loader = ConfigLoader::with_global_dir(home.path().join(CONFIG_DIR));
        let overrides = ConfigOverrides {
            log_level: Some("trace".to_string()),
            ..Default::default()
        };
        let config = loader.load(local.path(), Some(&overrides)).unwrap();
        assert_eq!(config.logging.level, "trace");
    }

    #[test]
    fn test_invalid_toml_reports_path() {
        let home = TempDir::new().unwrap();
        let local = TempDir::new().unwrap();
        let path = write_config(local.path(), "[session\nauto_haggle = ");

        let mut loader = ConfigLoader::with_global_dir(home.path().join(CONFIG_DIR));
        let err = loader.load(local.path(), None).unwrap_err();
        assert!(matches!(err, ConfigError::Malformed { .. }));
        assert!(err.to_string().contains(&path.display().to_string()));
    }

    #[test]
    fn test_load_named_file_skips_lookup() {
        let home = TempDir::new().unwrap();
        write_config(home.path(), "[storage]\ndatabase = \"global.db\"\n");
        let elsewhere = TempDir::new().unwrap();
        let path = elsewhere.path().join("session.toml");
        std::fs::write(&path, "[writer]\nidle_wait_ms = 50\n").unwrap();

        let loader = ConfigLoader::with_global_dir(home.path().join(CONFIG_DIR));
        let config = loader.load_file(&path, None).unwrap();
        assert_eq!(config.writer.idle_wait_ms, 50);
        assert_eq!(config.storage, StorageConfig::default());
    }

    #[test]
    fn test_init_local_writes_defaults() {
        let local = TempDir::new().unwrap();
        let loader = ConfigLoader::with_global_dir(local.path().join("home"));

        let path = loader.init_local(local.path()).unwrap();
        assert!(path.exists());

        let reloaded = loader.load_local(local.path()).unwrap().unwrap();
        assert_eq!(reloaded, TwmapConfig::default());
    }
}
