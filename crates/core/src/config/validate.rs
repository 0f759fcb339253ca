use super::{types::Config, AuthMethod, ConfigError};
use crate::media::MAX_PAGE_SIZE;

/// Validate configuration
/// Currently validates:
/// - Server port is not 0
/// - An API key is present when `auth.method = "api_key"`
/// - Catalog page size fits a store page, id prefix is non-empty
/// - Probe timeout is between 1 and 60 seconds
pub fn validate_config(config: &Config) -> Result<(), ConfigError> {
    if config.server.port == 0 {
        return Err(ConfigError::ValidationError(
            "server.port cannot be 0".to_string(),
        ));
    }

    if config.auth.method == AuthMethod::ApiKey
        && config.auth.api_key.as_deref().map_or(true, str::is_empty)
    {
        return Err(ConfigError::ValidationError(
            "auth.api_key must be set when auth.method = \"api_key\"".to_string(),
        ));
    }

    if config.addon.catalog_page_size == 0 || config.addon.catalog_page_size > MAX_PAGE_SIZE {
        return Err(ConfigError::ValidationError(format!(
            "addon.catalog_page_size must be between 1 and {}",
            MAX_PAGE_SIZE
        )));
    }

    if config.addon.id_prefix.is_empty() {
        return Err(ConfigError::ValidationError(
            "addon.id_prefix cannot be empty".to_string(),
        ));
    }

    if !(1..=60).contains(&config.probe.timeout_secs) {
        return Err(ConfigError::ValidationError(format!(
            "probe.timeout_secs must be between 1 and 60, got {}",
            config.probe.timeout_secs
        )));
    }

    Ok(())
}
