//! Runtime settings.
//!
//! Defaults are compiled in. With the `config` feature the settings can also be
//! read from a TOML file:
//!
//! | Platform | Path |
//! |----------|------|
//! | Linux | `~/.config/ghd/config.toml` |
//! | macOS | `~/Library/Application Support/ghd/config.toml` |
//! | Windows | `%APPDATA%\ghd\config.toml` |
//!
//! Command-line flags override whatever was loaded.

use crate::render::ThemeName;
use std::time::Duration;

#[cfg(feature = "config")]
use crate::error::{GhdError, Result};
#[cfg(feature = "config")]
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "config", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct Config {
    /// Seconds between status refreshes while watching
    pub watch_interval_secs: u64,
    /// How long the input thread blocks per poll
    pub input_poll_ms: u64,
    pub theme: ThemeName,
    /// Deployment environments in promotion order
    pub environments: Vec<String>,
    /// Environments whose deployments are flagged as production
    pub production_environments: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            watch_interval_secs: 5,
            input_poll_ms: 50,
            theme: ThemeName::Default,
            environments: vec!["dev".to_string(), "test".to_string(), "live".to_string()],
            production_environments: vec!["live".to_string()],
        }
    }
}

impl Config {
    pub fn watch_interval(&self) -> Duration {
        Duration::from_secs(self.watch_interval_secs.max(1))
    }

    pub fn input_poll(&self) -> Duration {
        Duration::from_millis(self.input_poll_ms.max(1))
    }

    pub fn is_production(&self, environment: &str) -> bool {
        self.production_environments
            .iter()
            .any(|env| env == environment)
    }
}

#[cfg(feature = "config")]
impl Config {
    /// Path of the per-user config file, if the platform has a config directory.
    pub fn default_path() -> Option<PathBuf> {
        dirs::config_dir().map(|dir| dir.join("ghd").join("config.toml"))
    }

    /// Load the per-user config file, falling back to defaults when it is absent.
    pub fn load() -> Result<Self> {
        match Self::default_path() {
            Some(path) if path.exists() => Self::load_from(&path),
            _ => Ok(Self::default()),
        }
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path).map_err(|err| {
            GhdError::config(format!("cannot read {}: {err}", path.display()))
        })?;
        toml::from_str(&contents)
            .map_err(|err| GhdError::config(format!("invalid {}: {err}", path.display())))
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        let contents =
            toml::to_string_pretty(self).map_err(|err| GhdError::config(err.to_string()))?;
        std::fs::write(path, contents)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = Config::default();
        assert_eq!(config.watch_interval(), Duration::from_secs(5));
        assert_eq!(config.input_poll(), Duration::from_millis(50));
        assert_eq!(config.environments, vec!["dev", "test", "live"]);
        assert_eq!(config.theme, ThemeName::Default);
        assert!(config.is_production("live"));
        assert!(!config.is_production("dev"));
    }

    #[test]
    fn production_follows_the_configured_environments() {
        let config = Config {
            environments: vec!["staging".to_string(), "prod".to_string()],
            production_environments: vec!["prod".to_string()],
            ..Config::default()
        };
        assert!(config.is_production("prod"));
        assert!(!config.is_production("live"));
    }

    #[test]
    fn zero_intervals_are_bumped() {
        let config = Config {
            watch_interval_secs: 0,
            input_poll_ms: 0,
            ..Config::default()
        };
        assert_eq!(config.watch_interval(), Duration::from_secs(1));
        assert_eq!(config.input_poll(), Duration::from_millis(1));
    }

    #[cfg(feature = "config")]
    mod file {
        use super::*;
        use std::io::Write;

        #[test]
        fn partial_file_keeps_defaults() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "watch_interval_secs = 30\ntheme = \"high-contrast\"").unwrap();

            let config = Config::load_from(file.path()).unwrap();
            assert_eq!(config.watch_interval_secs, 30);
            assert_eq!(config.theme, ThemeName::HighContrast);
            assert_eq!(config.input_poll_ms, 50);
        }

        #[test]
        fn round_trip_through_disk() {
            let dir = tempfile::tempdir().unwrap();
            let path = dir.path().join("config.toml");
            let config = Config {
                environments: vec!["staging".to_string(), "prod".to_string()],
                ..Config::default()
            };

            config.save_to(&path).unwrap();
            assert_eq!(Config::load_from(&path).unwrap(), config);
        }

        #[test]
        fn invalid_file_is_a_config_error() {
            let mut file = tempfile::NamedTempFile::new().unwrap();
            writeln!(file, "watch_interval_secs = \"soon\"").unwrap();

            let err = Config::load_from(file.path()).unwrap_err();
            assert!(matches!(err, GhdError::Config { .. }));
        }
    }
}
