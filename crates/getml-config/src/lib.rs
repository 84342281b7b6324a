//! # getml-config
//!
//! Layered configuration loading for the getML client using figment.
//!
//! Configuration sources (in priority order, highest wins):
//! 1. Environment variables (`GETML_*` prefix, `__` as separator)
//! 2. Project-level `.getml/config.toml`
//! 3. User-level `~/.config/getml/config.toml`
//! 4. Built-in defaults
//!
//! # Environment Variable Mapping
//!
//! Figment maps `GETML_ENGINE__PORT` -> `engine.port` and
//! `GETML_GENERAL__DEFAULT_PROJECT` -> `general.default_project`.
//!
//! # Usage
//!
//! ```no_run
//! use getml_config::GetmlConfig;
//!
//! let config = GetmlConfig::load_with_dotenv().expect("config");
//! println!("engine at {}", config.engine.address());
//! ```

mod engine;
mod error;
mod general;

pub use engine::{DEFAULT_PORT, EngineConfig};
pub use error::ConfigError;
pub use general::GeneralConfig;

use std::path::PathBuf;

use figment::{
    Figment,
    providers::{Env, Format, Serialized, Toml},
};
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Deserialize, Serialize)]
pub struct GetmlConfig {
    #[serde(default)]
    pub engine: EngineConfig,
    #[serde(default)]
    pub general: GeneralConfig,
}

impl GetmlConfig {
    /// Load configuration from TOML files and environment variables.
    ///
    /// Does not read `.env`; see [`Self::load_with_dotenv`].
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Figment`] when a source cannot be parsed, or
    /// [`ConfigError::InvalidValue`] when the engine section is unusable.
    pub fn load() -> Result<Self, ConfigError> {
        Self::from_figment(Self::figment())
    }

    /// Load configuration after reading `.env` from the workspace root.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn load_with_dotenv() -> Result<Self, ConfigError> {
        Self::load_dotenv_from_workspace();
        Self::load()
    }

    /// Extract and validate a config from any figment.
    ///
    /// # Errors
    ///
    /// Same as [`Self::load`].
    pub fn from_figment(figment: Figment) -> Result<Self, ConfigError> {
        let config: Self = figment.extract()?;
        config.engine.validate()?;
        Ok(config)
    }

    /// Build the figment provider chain.
    ///
    /// Public so callers can merge further providers (CLI flags) on top.
    #[must_use]
    pub fn figment() -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));

        if let Some(global_path) = Self::global_config_path() {
            if global_path.exists() {
                figment = figment.merge(Toml::file(global_path));
            }
        }

        let local_path = PathBuf::from(".getml/config.toml");
        if local_path.exists() {
            figment = figment.merge(Toml::file(local_path));
        }

        figment.merge(Env::prefixed("GETML_").split("__"))
    }

    fn global_config_path() -> Option<PathBuf> {
        dirs::config_dir().map(|p| p.join("getml").join("config.toml"))
    }

    /// Load `.env`, walking up from `CARGO_MANIFEST_DIR` when set.
    fn load_dotenv_from_workspace() {
        if let Ok(manifest_dir) = std::env::var("CARGO_MANIFEST_DIR") {
            let mut dir = PathBuf::from(manifest_dir);
            // crate -> crates/ -> workspace root
            for _ in 0..3 {
                let env_path = dir.join(".env");
                if env_path.exists() {
                    let _ = dotenvy::from_path(&env_path);
                    return;
                }
                if !dir.pop() {
                    break;
                }
            }
        }

        let _ = dotenvy::dotenv();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_loads() {
        let config = GetmlConfig::default();
        assert_eq!(config.engine.port, 1708);
        assert!(!config.engine.is_configured());
        assert_eq!(config.general.output_format, "json");
    }

    #[test]
    fn figment_builds_without_files() {
        figment::Jail::expect_with(|_jail| {
            let config = GetmlConfig::from_figment(GetmlConfig::figment()).map_err(|e| e.to_string())?;
            assert_eq!(config.engine.host, "localhost");
            assert_eq!(config.engine.startup_timeout_secs, 60);
            Ok(())
        });
    }
}
