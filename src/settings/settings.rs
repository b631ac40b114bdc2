use crate::domain_model::Platform;
use anyhow::{Result, anyhow};
use config::{Config, Environment, File};
use serde::Deserialize;
use std::collections::HashMap;
use std::fmt;

#[derive(Debug, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub platform: Platform,
    pub auth: Auth,
    pub store: Store,
    pub http: Http,
    pub log: Log,
}

#[derive(Deserialize)]
pub struct Auth {
    #[serde(default = "default_issuer")]
    pub issuer: String,
    pub jwt_secret: String,
    #[serde(default = "default_access_ttl_secs")]
    pub access_ttl_secs: u64,
    #[serde(default = "default_refresh_ttl_days")]
    pub refresh_ttl_days: i64,
    #[serde(default)]
    pub webhook_api_key: String,
}

impl fmt::Debug for Auth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Auth")
            .field("issuer", &self.issuer)
            .field("jwt_secret", &"<redacted>")
            .field("access_ttl_secs", &self.access_ttl_secs)
            .field("refresh_ttl_days", &self.refresh_ttl_days)
            .field("webhook_api_key", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Deserialize)]
pub struct Store {
    pub backend: String, // "memory" or "mysql"
    #[serde(default)]
    pub dsn: Option<String>,
    #[serde(default = "default_max_connections")]
    pub max_connections: u32,
    #[serde(default = "default_acquire_timeout_secs")]
    pub acquire_timeout_secs: u64,
}

#[derive(Debug, Deserialize)]
pub struct Http {
    pub address: String,
    #[serde(default)]
    pub cert_path: Option<String>,
    #[serde(default)]
    pub key_path: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct Log {
    pub filter: String,
}

const MAX_ACCESS_TTL_SECS: u64 = 24 * 60 * 60;
const MAX_REFRESH_TTL_DAYS: i64 = 10 * 365;

impl Auth {
    /// Access token lifetime, between one second and one day.
    pub fn access_ttl(&self) -> Result<std::time::Duration> {
        if self.access_ttl_secs == 0 || self.access_ttl_secs > MAX_ACCESS_TTL_SECS {
            return Err(anyhow!(
                "auth.access_ttl_secs must be in 1..={}, got {}",
                MAX_ACCESS_TTL_SECS,
                self.access_ttl_secs
            ));
        }
        Ok(std::time::Duration::from_secs(self.access_ttl_secs))
    }

    /// Refresh token lifetime, between one day and ten years.
    pub fn refresh_ttl(&self) -> Result<chrono::Duration> {
        if self.refresh_ttl_days <= 0 || self.refresh_ttl_days > MAX_REFRESH_TTL_DAYS {
            return Err(anyhow!(
                "auth.refresh_ttl_days must be in 1..={}, got {}",
                MAX_REFRESH_TTL_DAYS,
                self.refresh_ttl_days
            ));
        }
        chrono::Duration::try_days(self.refresh_ttl_days)
            .ok_or_else(|| anyhow!("auth.refresh_ttl_days out of range"))
    }
}

fn default_issuer() -> String {
    "chirpy".to_string()
}

fn default_access_ttl_secs() -> u64 {
    60 * 60
}

fn default_refresh_ttl_days() -> i64 {
    60
}

fn default_max_connections() -> u32 {
    10
}

fn default_acquire_timeout_secs() -> u64 {
    5
}

#[cfg(debug_assertions)]
const SETTINGS_PATH: &str = "settings/dev.toml";
#[cfg(not(debug_assertions))]
const SETTINGS_PATH: &str = "settings/release.toml";

const ENV_PREFIX: &str = "CHIRPY";
const ENV_SEPARATOR: &str = "__";

/// Load settings from `path` (or the profile default), then overlay
/// `CHIRPY__SECTION__KEY` environment variables. Secrets belong in the
/// environment, not in the TOML files.
pub fn parse_settings(path: Option<&str>) -> Result<Settings> {
    parse_settings_with_env(path, None)
}

/// Same as [`parse_settings`], reading the overlay from `env` instead of the
/// process environment when it is given.
pub fn parse_settings_with_env(
    path: Option<&str>,
    env: Option<HashMap<String, String>>,
) -> Result<Settings> {
    let path = path.unwrap_or(SETTINGS_PATH);

    let settings: Settings = Config::builder()
        .add_source(File::with_name(path))
        .add_source(
            Environment::with_prefix(ENV_PREFIX)
                .separator(ENV_SEPARATOR)
                .try_parsing(true)
                .source(env),
        )
        .build()
        .map_err(|e| anyhow!(e))?
        .try_deserialize()
        .map_err(|e| anyhow!(e))?;

    Ok(settings)
}
