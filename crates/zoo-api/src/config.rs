//! Application configuration
//!
//! Resolved from the environment (`ZOO_ADMIN_*` plus the per-entity
//! `<ENTITY>_DYNAMO_*` table variables); CLI flags override on top.

use serde::{Deserialize, Serialize};
use std::str::FromStr;
use zoo_core::TableConfigs;

/// Environment value that could not be parsed
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{variable}: {message}")]
pub struct ConfigError {
    /// Offending variable
    pub variable: &'static str,
    /// Parse failure
    pub message: String,
}

impl ConfigError {
    fn new(variable: &'static str, message: impl ToString) -> Self {
        Self {
            variable,
            message: message.to_string(),
        }
    }
}

/// Storage backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    /// In-process tables, lost on exit
    #[default]
    Memory,
    /// AWS DynamoDB (requires the `dynamodb` feature)
    Dynamodb,
}

impl FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "memory" => Ok(Self::Memory),
            "dynamodb" | "dynamo" => Ok(Self::Dynamodb),
            other => Err(format!("unknown backend '{other}' (expected memory or dynamodb)")),
        }
    }
}

/// Log output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    /// Single-line human-readable
    #[default]
    Compact,
    /// One JSON object per line
    Json,
}

impl FromStr for LogFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "compact" => Ok(Self::Compact),
            "json" => Ok(Self::Json),
            other => Err(format!("unknown log format '{other}' (expected compact or json)")),
        }
    }
}

/// Server configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppConfig {
    /// Bind host
    pub host: String,
    /// Bind port
    pub port: u16,
    /// Storage backend
    pub backend: BackendKind,
    /// Log output format
    pub log_format: LogFormat,
    /// Table names and keys per entity
    pub tables: TableConfigs,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            host: "0.0.0.0".to_string(),
            port: 8080,
            backend: BackendKind::Memory,
            log_format: LogFormat::Compact,
            tables: TableConfigs::defaults(),
        }
    }
}

impl AppConfig {
    /// Resolve from process environment
    ///
    /// # Errors
    /// `ConfigError` naming the variable when a value cannot be parsed.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Resolve using an arbitrary variable lookup
    ///
    /// # Errors
    /// `ConfigError` naming the variable when a value cannot be parsed.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let get = |name: &str| lookup(name).filter(|v| !v.trim().is_empty());

        let port = match get("ZOO_ADMIN_PORT") {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|e| ConfigError::new("ZOO_ADMIN_PORT", e))?,
            None => defaults.port,
        };
        let backend = match get("ZOO_ADMIN_BACKEND") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::new("ZOO_ADMIN_BACKEND", e))?,
            None => defaults.backend,
        };
        let log_format = match get("ZOO_ADMIN_LOG_FORMAT") {
            Some(raw) => raw.parse().map_err(|e| ConfigError::new("ZOO_ADMIN_LOG_FORMAT", e))?,
            None => defaults.log_format,
        };

        Ok(Self {
            host: get("ZOO_ADMIN_HOST").unwrap_or(defaults.host),
            port,
            backend,
            log_format,
            tables: TableConfigs::from_lookup(&lookup),
        })
    }

    /// With bind host
    #[inline]
    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// With bind port
    #[inline]
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// With storage backend
    #[inline]
    #[must_use]
    pub fn with_backend(mut self, backend: BackendKind) -> Self {
        self.backend = backend;
        self
    }

    /// With log format
    #[inline]
    #[must_use]
    pub fn with_log_format(mut self, format: LogFormat) -> Self {
        self.log_format = format;
        self
    }

    /// `host:port`
    #[must_use]
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use zoo_core::EntityKind;

    #[test]
    fn defaults_without_environment() {
        let config = AppConfig::from_lookup(|_| None).unwrap();
        assert_eq!(config, AppConfig::default());
        assert_eq!(config.bind_address(), "0.0.0.0:8080");
    }

    #[test]
    fn environment_overrides() {
        let config = AppConfig::from_lookup(|name| {
            match name {
                "ZOO_ADMIN_HOST" => Some("127.0.0.1"),
                "ZOO_ADMIN_PORT" => Some("9000"),
                "ZOO_ADMIN_BACKEND" => Some("DynamoDB"),
                "ZOO_ADMIN_LOG_FORMAT" => Some("json"),
                "SANDBOX_DYNAMO_TABLE_NAME" => Some("prod-sandboxes"),
                _ => None,
            }
            .map(ToString::to_string)
        })
        .unwrap();

        assert_eq!(config.bind_address(), "127.0.0.1:9000");
        assert_eq!(config.backend, BackendKind::Dynamodb);
        assert_eq!(config.log_format, LogFormat::Json);
        assert_eq!(config.tables.get(EntityKind::Sandbox).table_name, "prod-sandboxes");
    }

    #[test]
    fn bad_values_name_the_variable() {
        let err = AppConfig::from_lookup(|name| (name == "ZOO_ADMIN_PORT").then(|| "http".to_string()))
            .unwrap_err();
        assert_eq!(err.variable, "ZOO_ADMIN_PORT");
        assert!(err.to_string().starts_with("ZOO_ADMIN_PORT: "));

        let err = AppConfig::from_lookup(|name| (name == "ZOO_ADMIN_BACKEND").then(|| "redis".to_string()))
            .unwrap_err();
        assert_eq!(err.variable, "ZOO_ADMIN_BACKEND");
        assert!(err.message.contains("redis"));
    }
}
