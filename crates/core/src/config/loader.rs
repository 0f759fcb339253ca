use figment::{
    providers::{Env, Format, Toml},
    Figment,
};
use std::ffi::OsString;
use std::path::{Path, PathBuf};

use super::{types::Config, ConfigError};

/// Environment variable naming the configuration file.
pub const CONFIG_PATH_ENV: &str = "DDLSHELF_CONFIG";

const DEFAULT_CONFIG_PATH: &str = "config.toml";

/// Configuration file path from `DDLSHELF_CONFIG`, or `config.toml`.
pub fn config_path() -> PathBuf {
    config_path_from(std::env::var_os(CONFIG_PATH_ENV))
}

fn config_path_from(value: Option<OsString>) -> PathBuf {
    match value {
        Some(v) if !v.is_empty() => PathBuf::from(v),
        _ => PathBuf::from(DEFAULT_CONFIG_PATH),
    }
}

/// Load configuration from file with environment variable overrides.
///
/// Nested keys use a double underscore: `DDLSHELF_SERVER__PORT=9000`.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    if !path.exists() {
        return Err(ConfigError::FileNotFound(path.display().to_string()));
    }

    let config: Config = Figment::new()
        .merge(Toml::file(path))
        .merge(Env::prefixed("DDLSHELF_").split("__"))
        .extract()
        .map_err(|e| ConfigError::ParseError(e.to_string()))?;

    Ok(config)
}

/// Load configuration from TOML string (useful for testing)
pub fn load_config_from_str(toml_str: &str) -> Result<Config, ConfigError> {
    toml::from_str(toml_str).map_err(|e| ConfigError::ParseError(e.to_string()))
}
