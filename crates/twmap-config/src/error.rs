//! Errors from reading, checking and writing twmap configuration.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    /// A config file exists but could not be read
    #[error("cannot read twmap config {}: {source}", .path.display())]
    Unreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Not TOML, or a key holds the wrong kind of value
    #[error("{} is not a valid twmap config: {source}", .path.display())]
    Malformed {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// `config init` could not create `.twmap/` or write the file into it
    #[error("cannot write twmap config {}: {source}", .path.display())]
    Unwritable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("cannot render configuration as TOML: {0}")]
    Render(#[from] toml::ser::Error),

    #[error("no home directory for the global config (~/.twmap/config.toml)")]
    NoHomeDir,

    #[error("storage.database is empty; name the map database file")]
    EmptyDatabasePath,

    #[error("session.debounce_ms must be greater than zero")]
    ZeroDebounce,

    #[error("routing.probe_max_hops must be greater than zero")]
    ZeroProbeHops,

    #[error("logging.level '{0}' is not one of error, warn, info, debug, trace")]
    UnknownLogLevel(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_key() {
        assert!(ConfigError::ZeroDebounce
            .to_string()
            .starts_with("session.debounce_ms"));
        assert_eq!(
            ConfigError::UnknownLogLevel("loud".into()).to_string(),
            "logging.level 'loud' is not one of error, warn, info, debug, trace"
        );
    }

    #[test]
    fn test_unreadable_names_path() {
        let io = std::io::Error::new(std::io::ErrorKind::PermissionDenied, "denied");
        let err = ConfigError::Unreadable {
            path: "/tmp/twmap.toml".into(),
            source: io,
        };
        assert_eq!(err.to_string(), "cannot read twmap config /tmp/twmap.toml: denied");
    }
}
