//! Connection configuration module.
//!
//! All connection settings come from environment variables — the tool runs
//! against production databases from operator shells and CI jobs, and env
//! vars keep credentials out of argv and config files. Every required
//! variable that is missing fails fast with a descriptive error before any
//! item is processed.
//!
//! ## Variables
//!
//! ```text
//! DB_HOST            database host          (default 127.0.0.1)
//! DB_PORT            database port          (default 3306)
//! DB_USER            database user          (required)
//! DB_PASSWORD        database password      (required)
//! DB_NAME            database name          (required)
//!
//! STORE_ENDPOINT     object store endpoint  (required, e.g. https://objstore.example.com)
//! STORE_REGION       object store region    (default us-east-1)
//! STORE_BUCKET       bucket name            (required)
//! STORE_PUBLIC_BASE  public URL prefix for migrated assets
//!                    (default {STORE_ENDPOINT}/{STORE_BUCKET})
//!
//! STORE_ACCESS_KEY   access key             (required only when uploading)
//! STORE_SECRET_KEY   secret key             (required only when uploading)
//! ```
//!
//! Loading goes through an injected lookup function so tests exercise the
//! full parsing/validation path without mutating process environment.

use std::env;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("missing required environment variable: {0}")]
    MissingVar(&'static str),
    #[error("invalid value for {name}: {value:?} ({reason})")]
    InvalidVar {
        name: &'static str,
        value: String,
        reason: String,
    },
}

/// Database connection settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DbConfig {
    pub host: String,
    pub port: u16,
    pub user: String,
    pub password: String,
    pub database: String,
}

impl DbConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let port_raw = lookup("DB_PORT").unwrap_or_else(|| "3306".to_string());
        let port = port_raw.parse::<u16>().map_err(|e| ConfigError::InvalidVar {
            name: "DB_PORT",
            value: port_raw,
            reason: e.to_string(),
        })?;

        Ok(Self {
            host: lookup("DB_HOST").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            user: required(&lookup, "DB_USER")?,
            password: required(&lookup, "DB_PASSWORD")?,
            database: required(&lookup, "DB_NAME")?,
        })
    }
}

/// Object store location settings. Credentials live separately
/// ([`StoreCredentials`]) because local-sink runs never need them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreConfig {
    pub endpoint: String,
    pub region: String,
    pub bucket: String,
    pub public_base: String,
}

impl StoreConfig {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let endpoint = required(&lookup, "STORE_ENDPOINT")?;
        let bucket = required(&lookup, "STORE_BUCKET")?;
        let public_base = lookup("STORE_PUBLIC_BASE")
            .unwrap_or_else(|| format!("{}/{}", endpoint.trim_end_matches('/'), bucket));

        Ok(Self {
            endpoint,
            region: lookup("STORE_REGION").unwrap_or_else(|| "us-east-1".to_string()),
            bucket,
            public_base,
        })
    }
}

/// Object store credentials, loaded only when a run actually uploads.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoreCredentials {
    pub access_key: String,
    pub secret_key: String,
}

impl StoreCredentials {
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(env_lookup)
    }

    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        Ok(Self {
            access_key: required(&lookup, "STORE_ACCESS_KEY")?,
            secret_key: required(&lookup, "STORE_SECRET_KEY")?,
        })
    }
}

fn env_lookup(name: &str) -> Option<String> {
    env::var(name).ok().filter(|v| !v.is_empty())
}

fn required(
    lookup: &impl Fn(&str) -> Option<String>,
    name: &'static str,
) -> Result<String, ConfigError> {
    lookup(name).ok_or(ConfigError::MissingVar(name))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |name: &str| map.get(name).cloned()
    }

    #[test]
    fn db_config_with_all_vars() {
        let cfg = DbConfig::from_lookup(lookup_from(&[
            ("DB_HOST", "db.internal"),
            ("DB_PORT", "13306"),
            ("DB_USER", "migrator"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_NAME", "booking"),
        ]))
        .unwrap();

        assert_eq!(cfg.host, "db.internal");
        assert_eq!(cfg.port, 13306);
        assert_eq!(cfg.database, "booking");
    }

    #[test]
    fn db_config_defaults_host_and_port() {
        let cfg = DbConfig::from_lookup(lookup_from(&[
            ("DB_USER", "migrator"),
            ("DB_PASSWORD", "hunter2"),
            ("DB_NAME", "booking"),
        ]))
        .unwrap();

        assert_eq!(cfg.host, "127.0.0.1");
        assert_eq!(cfg.port, 3306);
    }

    #[test]
    fn db_config_missing_user_names_the_variable() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("DB_PASSWORD", "hunter2"),
            ("DB_NAME", "booking"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::MissingVar("DB_USER")));
        assert!(err.to_string().contains("DB_USER"));
    }

    #[test]
    fn db_config_rejects_unparseable_port() {
        let err = DbConfig::from_lookup(lookup_from(&[
            ("DB_PORT", "not-a-port"),
            ("DB_USER", "u"),
            ("DB_PASSWORD", "p"),
            ("DB_NAME", "d"),
        ]))
        .unwrap_err();

        assert!(matches!(err, ConfigError::InvalidVar { name: "DB_PORT", .. }));
    }

    #[test]
    fn store_config_derives_public_base() {
        let cfg = StoreConfig::from_lookup(lookup_from(&[
            ("STORE_ENDPOINT", "https://objstore.example.com/"),
            ("STORE_BUCKET", "assets"),
        ]))
        .unwrap();

        assert_eq!(cfg.public_base, "https://objstore.example.com/assets");
        assert_eq!(cfg.region, "us-east-1");
    }

    #[test]
    fn store_config_explicit_public_base_wins() {
        let cfg = StoreConfig::from_lookup(lookup_from(&[
            ("STORE_ENDPOINT", "https://objstore.example.com"),
            ("STORE_BUCKET", "assets"),
            ("STORE_PUBLIC_BASE", "https://cdn.example.com/assets"),
        ]))
        .unwrap();

        assert_eq!(cfg.public_base, "https://cdn.example.com/assets");
    }

    #[test]
    fn credentials_require_both_keys() {
        let err = StoreCredentials::from_lookup(lookup_from(&[("STORE_ACCESS_KEY", "AK")]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("STORE_SECRET_KEY")));
    }

    #[test]
    fn empty_values_count_as_missing() {
        // env_lookup filters empty strings; emulate that behavior here
        let lookup = |name: &str| match name {
            "STORE_ACCESS_KEY" => Some(String::new()),
            _ => None,
        };
        let filtered = |name: &str| lookup(name).filter(|v: &String| !v.is_empty());
        let err = StoreCredentials::from_lookup(filtered).unwrap_err();
        assert!(matches!(err, ConfigError::MissingVar("STORE_ACCESS_KEY")));
    }
}
