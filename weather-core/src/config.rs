use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};
use thiserror::Error;

/// Environment variable consulted when no config file provides the key.
pub const API_KEY_ENV: &str = "WEATHER_API_KEY";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Could not determine platform config directory")]
    NoConfigDir,

    #[error("Config file not found: {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to read config file: {}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Failed to parse config file: {}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("Failed to serialize configuration to TOML")]
    Serialize(#[from] toml::ser::Error),

    #[error("Failed to write config file: {}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error(
        "No WeatherAPI key configured.\n\
         Hint: set WEATHER_API_KEY or run `weather-resolver configure` and enter your API key."
    )]
    MissingApiKey,
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// weather_api_key = "..."
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub weather_api_key: Option<String>,
}

impl Config {
    /// Load the file layer.
    ///
    /// An explicit `path` must exist. Without one, the default platform file is
    /// used if present and an empty config is returned otherwise.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) if !path.exists() => Err(ConfigError::NotFound(path.to_path_buf())),
            Some(path) => Self::load_file(path),
            None => {
                // No home directory means no default file to look for.
                let Ok(path) = Self::config_file_path() else {
                    return Ok(Self::default());
                };
                if !path.exists() {
                    return Ok(Self::default());
                }
                Self::load_file(&path)
            }
        }
    }

    fn load_file(path: &Path) -> Result<Self, ConfigError> {
        let contents = fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;

        toml::from_str(&contents)
            .map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Save config to `path` (or the default location), creating parent
    /// directories as needed. Returns the path written.
    pub fn save(&self, path: Option<&Path>) -> Result<PathBuf, ConfigError> {
        let path = match path {
            Some(path) => path.to_path_buf(),
            None => Self::config_file_path()?,
        };

        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent)
                .map_err(|source| ConfigError::Write { path: parent.to_path_buf(), source })?;
        }

        let toml = toml::to_string_pretty(self)?;

        fs::write(&path, toml).map_err(|source| ConfigError::Write { path: path.clone(), source })?;

        Ok(path)
    }

    /// Path to the default config file.
    pub fn config_file_path() -> Result<PathBuf, ConfigError> {
        let dirs = ProjectDirs::from("dev", "zipcode-weather", "weather-resolver")
            .ok_or(ConfigError::NoConfigDir)?;

        Ok(dirs.config_dir().join("config.toml"))
    }

    pub fn set_weather_api_key(&mut self, api_key: String) {
        self.weather_api_key = Some(api_key);
    }

    /// Resolve the WeatherAPI key: file layer first, then the process
    /// environment, else [`ConfigError::MissingApiKey`].
    pub fn resolve_api_key(&self) -> Result<String, ConfigError> {
        self.resolve_api_key_with(|name| std::env::var(name).ok())
    }

    fn resolve_api_key_with(
        &self,
        env: impl Fn(&str) -> Option<String>,
    ) -> Result<String, ConfigError> {
        non_blank(self.weather_api_key.clone())
            .or_else(|| non_blank(env(API_KEY_ENV)))
            .ok_or(ConfigError::MissingApiKey)
    }
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_owned()).filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn no_env(_: &str) -> Option<String> {
        None
    }

    #[test]
    fn file_key_wins_over_environment() {
        let cfg = Config { weather_api_key: Some("FILE_KEY".into()) };
        let key = cfg.resolve_api_key_with(|_| Some("ENV_KEY".into())).unwrap();
        assert_eq!(key, "FILE_KEY");
    }

    #[test]
    fn environment_used_when_file_has_no_key() {
        let cfg = Config::default();
        let key = cfg
            .resolve_api_key_with(|name| (name == API_KEY_ENV).then(|| "ENV_KEY".to_string()))
            .unwrap();
        assert_eq!(key, "ENV_KEY");
    }

    #[test]
    fn blank_values_do_not_count() {
        let cfg = Config { weather_api_key: Some("   ".into()) };
        let key = cfg.resolve_api_key_with(|_| Some(" ENV_KEY ".into())).unwrap();
        assert_eq!(key, "ENV_KEY");
    }

    #[test]
    fn missing_key_is_an_explicit_error() {
        let err = Config::default().resolve_api_key_with(no_env).unwrap_err();
        assert!(matches!(err, ConfigError::MissingApiKey));
        assert!(err.to_string().contains(API_KEY_ENV));
    }

    #[test]
    fn save_then_load_explicit_path() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut cfg = Config::default();
        cfg.set_weather_api_key("SAVED".into());
        let written = cfg.save(Some(&path)).unwrap();
        assert_eq!(written, path);

        let loaded = Config::load(Some(&path)).unwrap();
        assert_eq!(loaded.resolve_api_key_with(no_env).unwrap(), "SAVED");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("absent.toml");

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::NotFound(_)));
    }

    #[test]
    fn malformed_file_is_an_error_not_a_fallback() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "weather_api_key = [unterminated").unwrap();

        let err = Config::load(Some(&path)).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));
        assert!(err.to_string().contains("Failed to parse config file"));
    }

    #[test]
    fn empty_file_yields_no_key() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();

        let cfg = Config::load(Some(&path)).unwrap();
        assert!(cfg.weather_api_key.is_none());
    }
}
