// SPDX-License-Identifier: AGPL-3.0-or-later
//
// Copyright (C) 2026 Relational Network

//! # Runtime Configuration
//!
//! This module defines environment variable names and default values used
//! throughout the application. Configuration is loaded from the environment
//! once at startup.
//!
//! ## Environment Variables
//!
//! | Variable | Description | Default |
//! |----------|-------------|---------|
//! | `HOST` | Server bind address | `0.0.0.0` |
//! | `PORT` | Server bind port | `8080` |
//! | `API_CLIENTS` | JSON array of API clients | unset |
//! | `API_CLIENTS_FILE` | Path to a JSON file holding the same array | unset |
//! | `API_KEY_DECODING` | `plain` or `base64` | `plain` |
//! | `API_KEY_HEADER` | API key header template | `X-{ClientId}-ApiKey` |
//! | `ADMIN_CLIENTS` | Comma-separated client ids allowed on `/v1/clients` | empty |
//! | `LOG_FORMAT` | Logging format (`json` or `pretty`) | `pretty` |
//! | `RUST_LOG` | Log level filter | `info,tower_http=debug` |
//!
//! A client entry looks like:
//!
//! ```json
//! {"client_id": "billing", "api_key": "s3cret", "claims": [{"type": "scope", "value": "read"}]}
//! ```

use std::path::PathBuf;
use std::str::FromStr;

use thiserror::Error;

use crate::auth::{ApiClient, ApiKeyHeaderPattern, KeyDecoding, PatternError};

pub const HOST_ENV: &str = "HOST";
pub const PORT_ENV: &str = "PORT";
/// Inline JSON client list. Takes precedence over [`API_CLIENTS_FILE_ENV`].
pub const API_CLIENTS_ENV: &str = "API_CLIENTS";
pub const API_CLIENTS_FILE_ENV: &str = "API_CLIENTS_FILE";
pub const API_KEY_DECODING_ENV: &str = "API_KEY_DECODING";
pub const API_KEY_HEADER_ENV: &str = "API_KEY_HEADER";
pub const ADMIN_CLIENTS_ENV: &str = "ADMIN_CLIENTS";
pub const LOG_FORMAT_ENV: &str = "LOG_FORMAT";

pub const DEFAULT_HOST: &str = "0.0.0.0";
pub const DEFAULT_PORT: u16 = 8080;
/// Filter used when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,tower_http=debug";

/// Configuration errors. All of them abort startup.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("PORT must be a port number, got {0:?}")]
    InvalidPort(String),
    #[error("API_CLIENTS is not a valid client list: {0}")]
    InvalidClients(#[source] serde_json::Error),
    #[error("Cannot read {path}: {source}")]
    ClientsFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("{path} is not a valid client list: {source}")]
    InvalidClientsFile {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
    #[error("API_KEY_DECODING: {0}")]
    InvalidKeyDecoding(String),
    #[error("API_KEY_HEADER: {0}")]
    InvalidHeader(#[from] PatternError),
    #[error("LOG_FORMAT must be json or pretty, got {0:?}")]
    InvalidLogFormat(String),
}

/// Log output format.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LogFormat {
    #[default]
    Pretty,
    Json,
}

impl FromStr for LogFormat {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "pretty" => Ok(LogFormat::Pretty),
            "json" => Ok(LogFormat::Json),
            _ => Err(ConfigError::InvalidLogFormat(s.to_string())),
        }
    }
}

/// Server configuration assembled from the environment.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub clients: Vec<ApiClient>,
    pub key_decoding: KeyDecoding,
    pub header_pattern: ApiKeyHeaderPattern,
    pub admin_clients: Vec<String>,
    pub log_format: LogFormat,
}

impl ServerConfig {
    /// Read the configuration from process environment variables.
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Read the configuration through an arbitrary variable lookup.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let host = lookup(HOST_ENV).unwrap_or_else(|| DEFAULT_HOST.to_string());

        let port = match lookup(PORT_ENV) {
            Some(raw) => raw
                .trim()
                .parse()
                .map_err(|_| ConfigError::InvalidPort(raw))?,
            None => DEFAULT_PORT,
        };

        let clients = match (lookup(API_CLIENTS_ENV), lookup(API_CLIENTS_FILE_ENV)) {
            (Some(inline), _) => {
                serde_json::from_str(&inline).map_err(ConfigError::InvalidClients)?
            }
            (None, Some(path)) => load_clients_file(PathBuf::from(path))?,
            (None, None) => Vec::new(),
        };

        let key_decoding = match lookup(API_KEY_DECODING_ENV) {
            Some(raw) => raw.parse().map_err(ConfigError::InvalidKeyDecoding)?,
            None => KeyDecoding::default(),
        };

        let header_pattern = match lookup(API_KEY_HEADER_ENV) {
            Some(template) => ApiKeyHeaderPattern::new(template)?,
            None => ApiKeyHeaderPattern::default(),
        };

        let admin_clients = lookup(ADMIN_CLIENTS_ENV)
            .map(|raw| {
                raw.split(',')
                    .map(str::trim)
                    .filter(|id| !id.is_empty())
                    .map(String::from)
                    .collect()
            })
            .unwrap_or_default();

        let log_format = match lookup(LOG_FORMAT_ENV) {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            host,
            port,
            clients,
            key_decoding,
            header_pattern,
            admin_clients,
            log_format,
        })
    }

    /// `host:port` bind address.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn load_clients_file(path: PathBuf) -> Result<Vec<ApiClient>, ConfigError> {
    let raw = match std::fs::read_to_string(&path) {
        Ok(raw) => raw,
        Err(source) => return Err(ConfigError::ClientsFile { path, source }),
    };
    serde_json::from_str(&raw).map_err(|source| ConfigError::InvalidClientsFile { path, source })
}
