//! Configuration loader utilities

use crate::{Config, ConfigBuilder, ConfigError, ConfigResult};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

/// Environment variable prefix, e.g. `FERROSYNC__SYNC__VERIFY=true`
pub const ENV_PREFIX: &str = "FERROSYNC";

/// Configuration loader with common loading patterns
pub struct ConfigLoader;

impl ConfigLoader {
    /// Load configuration from default locations
    pub fn load_default() -> ConfigResult<Config> {
        let mut builder = ConfigBuilder::new().add_defaults();

        if let Some(path) = Self::config_exists() {
            builder = builder.add_source_file(&path);
        }

        builder.add_env_prefix(ENV_PREFIX).build()
    }

    /// Load configuration from a specific file
    pub fn load_from_file<P: AsRef<Path>>(path: P) -> ConfigResult<Config> {
        let path = path.as_ref();

        if !path.exists() {
            return Err(ConfigError::Io {
                path: path.to_path_buf(),
                source: std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    "Configuration file not found",
                ),
            });
        }

        ConfigBuilder::new()
            .add_defaults()
            .add_source_file(path)
            .add_env_prefix(ENV_PREFIX)
            .build()
    }

    /// Save configuration to a file, choosing the format from its extension
    pub fn save_to_file<P: AsRef<Path>>(config: &Config, path: P) -> ConfigResult<()> {
        let path = path.as_ref();
        let content = Self::render(config, path)?;

        std::fs::write(path, content).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })
    }

    /// Generate a default configuration file
    pub fn generate_default_config<P: AsRef<Path>>(path: P) -> ConfigResult<()> {
        Self::save_to_file(&Config::default(), path)
    }

    /// Serialize `config` in the format implied by `path`
    pub fn render(config: &Config, path: &Path) -> ConfigResult<String> {
        match path.extension().and_then(|ext| ext.to_str()) {
            Some("toml") => {
                toml::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to TOML: {}", e),
                })
            }
            Some("json") => {
                serde_json::to_string_pretty(config).map_err(|e| ConfigError::Serialization {
                    message: format!("Failed to serialize to JSON: {}", e),
                })
            }
            _ => serde_yaml::to_string(config).map_err(|e| ConfigError::Serialization {
                message: format!("Failed to serialize to YAML: {}", e),
            }),
        }
    }

    /// Find the first configuration file in the default locations
    pub fn config_exists() -> Option<PathBuf> {
        search_paths(user_config_dir(|key| std::env::var_os(key)))
            .into_iter()
            .find(|path| path.exists())
    }
}

static EXTENSIONS: [&str; 4] = ["yaml", "yml", "toml", "json"];

/// Candidate files in preference order: `./ferrosync.*`, `./.ferrosync.*`,
/// then `<user config dir>/ferrosync/config.*`
fn search_paths(user_dir: Option<PathBuf>) -> Vec<PathBuf> {
    let local = ["ferrosync", ".ferrosync"].into_iter().flat_map(|stem| {
        EXTENSIONS
            .iter()
            .map(move |ext| PathBuf::from(format!("{}.{}", stem, ext)))
    });
    let user = user_dir.into_iter().flat_map(|dir| {
        let dir = dir.join("ferrosync");
        EXTENSIONS
            .iter()
            .map(move |ext| dir.join(format!("config.{}", ext)))
    });
    local.chain(user).collect()
}

/// `%APPDATA%` on Windows; elsewhere an absolute `$XDG_CONFIG_HOME`, else
/// `$HOME/.config`
fn user_config_dir(var: impl Fn(&str) -> Option<OsString>) -> Option<PathBuf> {
    if cfg!(windows) {
        return var("APPDATA").map(PathBuf::from);
    }
    var("XDG_CONFIG_HOME")
        .map(PathBuf::from)
        .filter(|dir| dir.is_absolute())
        .or_else(|| var("HOME").map(|home| PathBuf::from(home).join(".config")))
}
