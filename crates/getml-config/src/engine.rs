//! Engine connection configuration.

use std::path::PathBuf;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::ConfigError;

/// Port the engine listens on unless told otherwise.
pub const DEFAULT_PORT: u16 = 1708;

fn default_host() -> String {
    "localhost".to_string()
}

const fn default_port() -> u16 {
    DEFAULT_PORT
}

const fn default_connect_timeout_secs() -> u64 {
    5
}

const fn default_startup_timeout_secs() -> u64 {
    60
}

const fn default_read_timeout_secs() -> u64 {
    300
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct EngineConfig {
    /// Host name or address of the engine.
    #[serde(default = "default_host")]
    pub host: String,

    /// TCP port of the engine.
    #[serde(default = "default_port")]
    pub port: u16,

    /// Timeout for opening a connection, in seconds.
    #[serde(default = "default_connect_timeout_secs")]
    pub connect_timeout_secs: u64,

    /// How long `run` waits for a freshly started engine to answer, in seconds.
    #[serde(default = "default_startup_timeout_secs")]
    pub startup_timeout_secs: u64,

    /// How long to wait for any single reply, in seconds.
    #[serde(default = "default_read_timeout_secs")]
    pub read_timeout_secs: u64,

    /// How long to wait for training and hyperparameter searches to report
    /// back, in seconds. Unset waits until they finish.
    #[serde(default)]
    pub training_timeout_secs: Option<u64>,

    /// Directory containing the engine's `run` script.
    #[serde(default)]
    pub install_path: Option<PathBuf>,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            connect_timeout_secs: default_connect_timeout_secs(),
            startup_timeout_secs: default_startup_timeout_secs(),
            read_timeout_secs: default_read_timeout_secs(),
            training_timeout_secs: None,
            install_path: None,
        }
    }
}

impl EngineConfig {
    /// `host:port`, as accepted by `TcpStream::connect`.
    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    #[must_use]
    pub const fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }

    #[must_use]
    pub const fn startup_timeout(&self) -> Duration {
        Duration::from_secs(self.startup_timeout_secs)
    }

    #[must_use]
    pub const fn read_timeout(&self) -> Duration {
        Duration::from_secs(self.read_timeout_secs)
    }

    #[must_use]
    pub fn training_timeout(&self) -> Option<Duration> {
        self.training_timeout_secs.map(Duration::from_secs)
    }

    /// Whether the engine install directory is known.
    #[must_use]
    pub const fn is_configured(&self) -> bool {
        self.install_path.is_some()
    }

    /// The install directory, or an error naming the missing key.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::NotConfigured`] when no install path is set.
    pub fn require_install_path(&self) -> Result<&PathBuf, ConfigError> {
        self.install_path
            .as_ref()
            .ok_or_else(|| ConfigError::NotConfigured {
                section: "engine.install_path".to_string(),
            })
    }

    /// Check values figment cannot reject on type alone.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] for an empty host, port 0 or a
    /// zero timeout.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let invalid = |field: &str, reason: &str| ConfigError::InvalidValue {
            field: format!("engine.{field}"),
            reason: reason.to_string(),
        };
        if self.host.trim().is_empty() {
            return Err(invalid("host", "must not be empty"));
        }
        if self.port == 0 {
            return Err(invalid("port", "must be between 1 and 65535"));
        }
        if self.connect_timeout_secs == 0 {
            return Err(invalid("connect_timeout_secs", "must be positive"));
        }
        if self.startup_timeout_secs == 0 {
            return Err(invalid("startup_timeout_secs", "must be positive"));
        }
        if self.read_timeout_secs == 0 {
            return Err(invalid("read_timeout_secs", "must be positive"));
        }
        if self.training_timeout_secs == Some(0) {
            return Err(invalid("training_timeout_secs", "must be positive"));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_point_at_local_engine() {
        let config = EngineConfig::default();
        assert_eq!(config.address(), "localhost:1708");
        assert_eq!(config.connect_timeout(), Duration::from_secs(5));
        assert_eq!(config.startup_timeout(), Duration::from_secs(60));
        assert_eq!(config.read_timeout(), Duration::from_secs(300));
        assert_eq!(config.training_timeout(), None);
        assert!(!config.is_configured());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn missing_install_path_is_reported() {
        let err = EngineConfig::default().require_install_path().unwrap_err();
        assert!(err.to_string().contains("engine.install_path"));
    }

    #[test]
    fn zero_port_is_invalid() {
        let config = EngineConfig {
            port: 0,
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "engine.port"));
    }

    #[test]
    fn zero_training_timeout_is_invalid() {
        let config = EngineConfig {
            training_timeout_secs: Some(0),
            ..EngineConfig::default()
        };
        let err = config.validate().unwrap_err();
        assert!(
            matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "engine.training_timeout_secs")
        );
    }
}
