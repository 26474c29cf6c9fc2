use log::warn;
use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::ConfigError;

pub const DEFAULT_ANALYSIS_API_BASE: &str = "https://game-theory-backend.onrender.com";

/// Base minutes per side used when nothing (or nothing valid) is configured.
pub const DEFAULT_BASE_MINUTES: u32 = 5;

/// Time settings offered by the selector.
pub const TIME_SETTINGS: [u32; 3] = [5, 10, 20];

#[derive(Clone, Debug)]
pub struct Config {
    pub host: String,
    pub port: u16,
    pub analysis_api_base: String,
    pub analysis_timeout: Duration,
    pub default_base_minutes: u32,
    pub static_dir: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            analysis_api_base: DEFAULT_ANALYSIS_API_BASE.to_string(),
            analysis_timeout: Duration::from_secs(30),
            default_base_minutes: DEFAULT_BASE_MINUTES,
            static_dir: "./static".to_string(),
        }
    }
}

impl Config {
    /// Read the configuration from the environment, falling back to the
    /// defaults for anything missing or malformed.
    pub fn from_env() -> Self {
        Self::from_lookup(|name| env::var(name).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = Self::default();

        Self {
            host: lookup("HOST").unwrap_or(defaults.host),
            port: positive_or(&lookup, "PORT", defaults.port),
            analysis_api_base: lookup("ANALYSIS_API_BASE")
                .map(|base| base.trim_end_matches('/').to_string())
                .unwrap_or(defaults.analysis_api_base),
            analysis_timeout: Duration::from_secs(positive_or(
                &lookup,
                "ANALYSIS_TIMEOUT_SECS",
                defaults.analysis_timeout.as_secs(),
            )),
            default_base_minutes: positive_or(
                &lookup,
                "DEFAULT_BASE_MINUTES",
                defaults.default_base_minutes,
            ),
            static_dir: lookup("STATIC_DIR").unwrap_or(defaults.static_dir),
        }
    }

    pub fn bind_address(&self) -> (String, u16) {
        (self.host.clone(), self.port)
    }
}

fn parse_positive<T>(name: &'static str, value: &str) -> Result<T, ConfigError>
where
    T: FromStr + Default + PartialEq,
{
    match value.trim().parse::<T>() {
        Ok(parsed) if parsed != T::default() => Ok(parsed),
        _ => Err(ConfigError::InvalidNumber {
            name,
            value: value.to_string(),
        }),
    }
}

fn positive_or<T>(lookup: &impl Fn(&str) -> Option<String>, name: &'static str, default: T) -> T
where
    T: FromStr + Default + PartialEq,
{
    match lookup(name) {
        Some(raw) => parse_positive(name, &raw).unwrap_or_else(|e| {
            warn!("{}; using default", e);
            default
        }),
        None => default,
    }
}
