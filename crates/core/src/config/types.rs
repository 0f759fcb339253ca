use serde::{Deserialize, Serialize};
use std::net::{IpAddr, Ipv4Addr};
use std::path::PathBuf;

use crate::media::DedupKey;

/// Root configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct Config {
    pub auth: AuthConfig,
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub database: DatabaseConfig,
    #[serde(default)]
    pub addon: AddonConfig,
    #[serde(default)]
    pub registration: RegistrationConfig,
    #[serde(default)]
    pub probe: ProbeConfig,
    /// Metadata source. Without it every submitted link fails to resolve.
    #[serde(default)]
    pub tmdb: Option<TmdbConfig>,
}

/// Server configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ServerConfig {
    #[serde(default = "default_host")]
    pub host: IpAddr,
    #[serde(default = "default_port")]
    pub port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
        }
    }
}

fn default_host() -> IpAddr {
    IpAddr::V4(Ipv4Addr::UNSPECIFIED)
}

fn default_port() -> u16 {
    8000
}

/// Authentication configuration for the admin API
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AuthConfig {
    pub method: AuthMethod,
    /// Required when `method = "api_key"`.
    #[serde(default)]
    pub api_key: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthMethod {
    None,
    ApiKey,
}

impl AuthMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            AuthMethod::None => "none",
            AuthMethod::ApiKey => "api_key",
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct DatabaseConfig {
    #[serde(default = "default_db_path")]
    pub path: PathBuf,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

fn default_db_path() -> PathBuf {
    PathBuf::from("ddlshelf.db")
}

/// How the catalog presents itself to streaming clients.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct AddonConfig {
    #[serde(default = "default_addon_id")]
    pub id: String,
    #[serde(default = "default_addon_name")]
    pub name: String,
    #[serde(default = "default_addon_version")]
    pub version: String,
    #[serde(default = "default_addon_description")]
    pub description: String,
    #[serde(default = "default_addon_logo")]
    pub logo: String,
    /// Namespace for protocol ids, e.g. "ddl-" in "ddl-603".
    #[serde(default = "default_id_prefix")]
    pub id_prefix: String,
    /// Documents per catalog response.
    #[serde(default = "default_catalog_page_size")]
    pub catalog_page_size: u32,
}

impl Default for AddonConfig {
    fn default() -> Self {
        Self {
            id: default_addon_id(),
            name: default_addon_name(),
            version: default_addon_version(),
            description: default_addon_description(),
            logo: default_addon_logo(),
            id_prefix: default_id_prefix(),
            catalog_page_size: default_catalog_page_size(),
        }
    }
}

fn default_addon_id() -> String {
    "community.ddl.stremio".to_string()
}

fn default_addon_name() -> String {
    "DDL Streamer".to_string()
}

fn default_addon_version() -> String {
    "1.0.0".to_string()
}

fn default_addon_description() -> String {
    "Stream from your Direct Download Links.".to_string()
}

fn default_addon_logo() -> String {
    "https://i.imgur.com/f33tN3G.png".to_string()
}

fn default_id_prefix() -> String {
    "ddl-".to_string()
}

fn default_catalog_page_size() -> u32 {
    100
}

/// Link registration behavior
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct RegistrationConfig {
    #[serde(default)]
    pub dedup_key: DedupKey,
    /// Extra attempts when another registration wins the race for a title.
    #[serde(default = "default_max_conflict_retries")]
    pub max_conflict_retries: u32,
}

impl Default for RegistrationConfig {
    fn default() -> Self {
        Self {
            dedup_key: DedupKey::default(),
            max_conflict_retries: default_max_conflict_retries(),
        }
    }
}

fn default_max_conflict_retries() -> u32 {
    3
}

/// Size probe configuration
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ProbeConfig {
    #[serde(default = "default_probe_timeout")]
    pub timeout_secs: u64,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            timeout_secs: default_probe_timeout(),
        }
    }
}

fn default_probe_timeout() -> u64 {
    10
}

/// TMDB API client configuration.
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct TmdbConfig {
    pub api_key: String,
    /// Base URL (default: https://api.themoviedb.org/3).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    /// Image base URL for posters/backdrops (default: https://image.tmdb.org/t/p).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
}

/// Sanitized config for API responses (secrets redacted)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedConfig {
    pub auth: SanitizedAuthConfig,
    pub server: ServerConfig,
    pub database: DatabaseConfig,
    pub addon: AddonConfig,
    pub registration: RegistrationConfig,
    pub probe: ProbeConfig,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tmdb: Option<SanitizedTmdbConfig>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SanitizedAuthConfig {
    pub method: String,
    pub api_key_configured: bool,
}

/// Sanitized TMDB config (API key hidden)
#[derive(Debug, Clone, Serialize)]
pub struct SanitizedTmdbConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_base_url: Option<String>,
    pub api_key_configured: bool,
}

impl From<&Config> for SanitizedConfig {
    fn from(config: &Config) -> Self {
        Self {
            auth: SanitizedAuthConfig {
                method: config.auth.method.as_str().to_string(),
                api_key_configured: config
                    .auth
                    .api_key
                    .as_ref()
                    .is_some_and(|k| !k.is_empty()),
            },
            server: config.server.clone(),
            database: config.database.clone(),
            addon: config.addon.clone(),
            registration: config.registration.clone(),
            probe: config.probe.clone(),
            tmdb: config.tmdb.as_ref().map(|t| SanitizedTmdbConfig {
                base_url: t.base_url.clone(),
                image_base_url: t.image_base_url.clone(),
                api_key_configured: !t.api_key.is_empty(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_deserialize_minimal_config_uses_defaults() {
        let toml = r#"
[auth]
method = "none"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::None);
        assert_eq!(config.server.port, 8000);
        assert_eq!(config.server.host.to_string(), "0.0.0.0");
        assert_eq!(config.database.path.to_str().unwrap(), "ddlshelf.db");
        assert_eq!(config.addon.id, "community.ddl.stremio");
        assert_eq!(config.addon.id_prefix, "ddl-");
        assert_eq!(config.addon.catalog_page_size, 100);
        assert_eq!(config.registration.dedup_key, DedupKey::Url);
        assert_eq!(config.registration.max_conflict_retries, 3);
        assert_eq!(config.probe.timeout_secs, 10);
        assert!(config.tmdb.is_none());
    }

    #[test]
    fn test_deserialize_full_config() {
        let toml = r#"
[auth]
method = "api_key"
api_key = "admin-secret"

[server]
host = "127.0.0.1"
port = 9000

[database]
path = "/data/media.db"

[addon]
name = "My Shelf"
catalog_page_size = 50

[registration]
dedup_key = "quality"
max_conflict_retries = 5

[probe]
timeout_secs = 4

[tmdb]
api_key = "tmdb-secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        assert_eq!(config.auth.method, AuthMethod::ApiKey);
        assert_eq!(config.auth.api_key.as_deref(), Some("admin-secret"));
        assert_eq!(config.server.port, 9000);
        assert_eq!(config.addon.name, "My Shelf");
        assert_eq!(config.addon.version, "1.0.0");
        assert_eq!(config.addon.catalog_page_size, 50);
        assert_eq!(config.registration.dedup_key, DedupKey::Quality);
        assert_eq!(config.registration.max_conflict_retries, 5);
        assert_eq!(config.probe.timeout_secs, 4);
        assert_eq!(config.tmdb.unwrap().api_key, "tmdb-secret");
    }

    #[test]
    fn test_deserialize_missing_auth_fails() {
        let toml = r#"
[server]
port = 8080
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_deserialize_unknown_dedup_key_fails() {
        let toml = r#"
[auth]
method = "none"

[registration]
dedup_key = "title"
"#;
        let result: Result<Config, _> = toml::from_str(toml);
        assert!(result.is_err());
    }

    #[test]
    fn test_sanitized_config_hides_secrets() {
        let toml = r#"
[auth]
method = "api_key"
api_key = "admin-secret"

[tmdb]
api_key = "tmdb-secret"
"#;
        let config: Config = toml::from_str(toml).unwrap();
        let sanitized = SanitizedConfig::from(&config);
        assert_eq!(sanitized.auth.method, "api_key");
        assert!(sanitized.auth.api_key_configured);
        assert!(sanitized.tmdb.as_ref().unwrap().api_key_configured);

        let json = serde_json::to_string(&sanitized).unwrap();
        assert!(!json.contains("admin-secret"));
        assert!(!json.contains("tmdb-secret"));
    }
}
