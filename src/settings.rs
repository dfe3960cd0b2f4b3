//! Layered settings loading using figment.
//!
//! Sources, highest priority first:
//! 1. Environment variables (`TAGSCRAPE_` prefix, `__` as separator)
//! 2. `tagscrape.toml` in the working directory
//! 3. Built-in defaults
//!
//! `TAGSCRAPE_FETCH__TIMEOUT_SECS=5` maps to `fetch.timeout_secs`.

use std::path::{Path, PathBuf};
use std::time::Duration;

use figment::{
    providers::{Env, Format, Serialized, Toml},
    Figment,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

pub const SETTINGS_FILE: &str = "tagscrape.toml";
pub const ENV_PREFIX: &str = "TAGSCRAPE_";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Configuration error: {0}")]
    Figment(#[from] figment::Error),

    #[error("Invalid configuration value for '{field}': {reason}")]
    InvalidValue { field: String, reason: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct FetchSettings {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_user_agent() -> String {
    format!("tagscrape/{}", env!("CARGO_PKG_VERSION"))
}

const fn default_timeout_secs() -> u64 {
    30
}

impl FetchSettings {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

impl Default for FetchSettings {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct StoreSettings {
    /// JSON snapshot of scrapers and configs
    #[serde(default = "default_store_path")]
    pub path: PathBuf,
}

fn default_store_path() -> PathBuf {
    PathBuf::from("tagscrape-store.json")
}

impl Default for StoreSettings {
    fn default() -> Self {
        Self {
            path: default_store_path(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Settings {
    #[serde(default)]
    pub fetch: FetchSettings,
    #[serde(default)]
    pub store: StoreSettings,
}

impl Settings {
    /// Load from defaults, `tagscrape.toml` and the environment.
    pub fn load() -> Result<Self, ConfigError> {
        Self::load_from(Path::new(SETTINGS_FILE))
    }

    /// Same as [`Settings::load`] with an explicit TOML path.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        let settings: Self = Self::figment(path).extract()?;
        settings.validate()?;
        Ok(settings)
    }

    /// Provider chain; public so tests can layer on top.
    pub fn figment(path: &Path) -> Figment {
        let mut figment = Figment::from(Serialized::defaults(Self::default()));
        if path.exists() {
            figment = figment.merge(Toml::file(path));
        }
        figment.merge(Env::prefixed(ENV_PREFIX).split("__"))
    }

    fn validate(&self) -> Result<(), ConfigError> {
        if self.fetch.timeout_secs == 0 {
            return Err(ConfigError::InvalidValue {
                field: "fetch.timeout_secs".to_string(),
                reason: "must be greater than zero".to_string(),
            });
        }
        if self.fetch.user_agent.trim().is_empty() {
            return Err(ConfigError::InvalidValue {
                field: "fetch.user_agent".to_string(),
                reason: "must not be empty".to_string(),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use figment::Jail;

    #[test]
    fn defaults_are_correct() {
        let settings = Settings::default();
        assert_eq!(settings.fetch.timeout_secs, 30);
        assert!(settings.fetch.user_agent.starts_with("tagscrape/"));
        assert_eq!(settings.store.path, PathBuf::from("tagscrape-store.json"));
    }

    #[test]
    fn loads_toml_file() {
        Jail::expect_with(|jail| {
            jail.create_file(
                "tagscrape.toml",
                r#"
[fetch]
user_agent = "probe/1.0"
timeout_secs = 5

[store]
path = "data/store.json"
"#,
            )?;
            let settings = Settings::load().expect("settings should load");
            assert_eq!(settings.fetch.user_agent, "probe/1.0");
            assert_eq!(settings.fetch.timeout(), Duration::from_secs(5));
            assert_eq!(settings.store.path, PathBuf::from("data/store.json"));
            Ok(())
        });
    }

    #[test]
    fn env_overrides_toml() {
        Jail::expect_with(|jail| {
            jail.create_file("tagscrape.toml", "[fetch]\ntimeout_secs = 5\n")?;
            jail.set_env("TAGSCRAPE_FETCH__TIMEOUT_SECS", "9");
            let settings = Settings::load().expect("settings should load");
            assert_eq!(settings.fetch.timeout_secs, 9);
            Ok(())
        });
    }

    #[test]
    fn zero_timeout_is_rejected() {
        Jail::expect_with(|jail| {
            jail.set_env("TAGSCRAPE_FETCH__TIMEOUT_SECS", "0");
            let err = Settings::load().unwrap_err();
            assert!(matches!(err, ConfigError::InvalidValue { ref field, .. } if field == "fetch.timeout_secs"));
            Ok(())
        });
    }
}
