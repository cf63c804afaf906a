use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Overrides the platform data directory, mainly for tests and portable setups.
pub const HOME_ENV: &str = "HUSTLEHUB_HOME";

const CONFIG_FILE: &str = "config.yml";
const DEFAULT_DATA_FILE: &str = "jobs.json";
const DEFAULT_LOG_FILE: &str = "hustlehub.log";
const DEFAULT_LOG_LEVEL: &str = "info";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("could not locate a data directory; set {} to choose one", HOME_ENV)]
    NoHome,
    #[error("could not read {}: {source}", .path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("invalid config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        source: serde_yaml::Error,
    },
}

/// Where HustleHub keeps its files.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppPaths {
    root: PathBuf,
}

impl AppPaths {
    pub fn discover() -> Result<Self, ConfigError> {
        if let Some(home) = env::var_os(HOME_ENV).filter(|value| !value.is_empty()) {
            return Ok(AppPaths::at(home));
        }
        let dirs = ProjectDirs::from("", "", "hustlehub").ok_or(ConfigError::NoHome)?;
        Ok(AppPaths::at(dirs.data_dir()))
    }

    pub fn at(root: impl Into<PathBuf>) -> Self {
        AppPaths { root: root.into() }
    }

    pub fn config_file(&self) -> PathBuf {
        self.root.join(CONFIG_FILE)
    }

    /// Relative paths are taken relative to the root.
    pub fn resolve(&self, path: &Path) -> PathBuf {
        if path.is_absolute() {
            path.to_path_buf()
        } else {
            self.root.join(path)
        }
    }
}

/// Contents of `config.yml`. Every key is optional.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_file: Option<PathBuf>,
    pub log_level: Option<String>,
    pub log_file: Option<PathBuf>,
}

impl Settings {
    /// Reads the config file; a missing file means defaults.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = match fs::read_to_string(path) {
            Ok(text) => text,
            Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(Settings::default()),
            Err(source) => {
                return Err(ConfigError::Read {
                    path: path.to_path_buf(),
                    source,
                })
            }
        };
        if text.trim().is_empty() {
            return Ok(Settings::default());
        }
        serde_yaml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// Fully resolved runtime configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    pub data_file: PathBuf,
    pub log_file: PathBuf,
    pub log_level: String,
}

impl Config {
    pub fn load(data_override: Option<PathBuf>) -> Result<Self, ConfigError> {
        let paths = AppPaths::discover()?;
        let settings = Settings::load(&paths.config_file())?;
        Ok(Config::from_parts(paths, settings, data_override))
    }

    pub fn from_parts(paths: AppPaths, settings: Settings, data_override: Option<PathBuf>) -> Self {
        let data_file = match data_override {
            Some(path) => path,
            None => paths.resolve(
                settings
                    .data_file
                    .as_deref()
                    .unwrap_or(Path::new(DEFAULT_DATA_FILE)),
            ),
        };
        let log_file = paths.resolve(
            settings
                .log_file
                .as_deref()
                .unwrap_or(Path::new(DEFAULT_LOG_FILE)),
        );
        let log_level = settings
            .log_level
            .filter(|level| !level.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_LOG_LEVEL.to_string());
        Config {
            data_file,
            log_file,
            log_level,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn defaults_live_under_the_root() {
        let paths = AppPaths::at("/srv/hustle");
        let config = Config::from_parts(paths, Settings::default(), None);
        assert_eq!(config.data_file, PathBuf::from("/srv/hustle/jobs.json"));
        assert_eq!(config.log_file, PathBuf::from("/srv/hustle/hustlehub.log"));
        assert_eq!(config.log_level, "info");
    }

    #[test]
    fn settings_and_override_take_precedence() {
        let settings = Settings {
            data_file: Some(PathBuf::from("data/applications.json")),
            log_level: Some("debug".into()),
            log_file: Some(PathBuf::from("/var/log/hustle.log")),
        };
        let config = Config::from_parts(AppPaths::at("/srv/hustle"), settings.clone(), None);
        assert_eq!(
            config.data_file,
            PathBuf::from("/srv/hustle/data/applications.json")
        );
        assert_eq!(config.log_file, PathBuf::from("/var/log/hustle.log"));
        assert_eq!(config.log_level, "debug");

        let overridden = Config::from_parts(
            AppPaths::at("/srv/hustle"),
            settings,
            Some(PathBuf::from("elsewhere.json")),
        );
        assert_eq!(overridden.data_file, PathBuf::from("elsewhere.json"));
    }

    #[test]
    fn reads_yaml_settings() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::at(dir.path());
        fs::write(
            paths.config_file(),
            "data_file: mine.json\nlog_level: warn\n",
        )
        .unwrap();
        let settings = Settings::load(&paths.config_file()).unwrap();
        assert_eq!(settings.data_file, Some(PathBuf::from("mine.json")));
        assert_eq!(settings.log_level.as_deref(), Some("warn"));
        assert_eq!(settings.log_file, None);
    }

    #[test]
    fn missing_or_empty_config_means_defaults() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::at(dir.path());
        assert_eq!(
            Settings::load(&paths.config_file()).unwrap(),
            Settings::default()
        );
        fs::write(paths.config_file(), "  \n").unwrap();
        assert_eq!(
            Settings::load(&paths.config_file()).unwrap(),
            Settings::default()
        );
    }

    #[test]
    fn invalid_yaml_is_reported() {
        let dir = TempDir::new().unwrap();
        let paths = AppPaths::at(dir.path());
        fs::write(paths.config_file(), "log_level: [unclosed").unwrap();
        assert!(matches!(
            Settings::load(&paths.config_file()),
            Err(ConfigError::Parse { .. })
        ));
    }
}
