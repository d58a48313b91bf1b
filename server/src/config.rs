//! Server configuration.
//!
//! Configuration is read from environment variables at startup, with
//! defaults suitable for local development. Sections mirror the moving
//! parts of the service: HTTP listener, database, sessions, and blob
//! storage.

use chrono::Duration;
use std::net::SocketAddr;
use std::path::PathBuf;
use thiserror::Error;

/// Configuration errors.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required environment variable is missing.
    #[error("missing environment variable: {0}")]
    Missing(&'static str),

    /// An environment variable could not be parsed.
    #[error("invalid value for {var}: {message}")]
    Invalid {
        /// The variable that failed to parse.
        var: &'static str,
        /// Why it failed.
        message: String,
    },
}

/// HTTP listener configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Address the server binds to.
    ///
    /// Default: `0.0.0.0:8080`
    pub bind_addr: SocketAddr,
}

/// Database configuration.
#[derive(Debug, Clone)]
pub struct PostgresConfig {
    /// Connection URL.
    pub url: String,

    /// Connection pool size.
    ///
    /// Default: 5
    pub max_connections: u32,
}

/// Session configuration.
#[derive(Debug, Clone)]
pub struct AuthConfig {
    /// How long a bearer session stays valid.
    ///
    /// Default: 8 hours
    pub session_ttl: Duration,
}

/// Blob storage configuration.
#[derive(Debug, Clone)]
pub struct StorageConfig {
    /// Directory uploads are written under.
    ///
    /// Default: `./uploads`
    pub root: PathBuf,

    /// Public URL prefix returned for uploaded blobs.
    ///
    /// Default: `http://localhost:8080/uploads`
    pub public_base: String,
}

/// Complete server configuration.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP listener section.
    pub server: ServerConfig,
    /// Database section.
    pub postgres: PostgresConfig,
    /// Session section.
    pub auth: AuthConfig,
    /// Blob storage section.
    pub storage: StorageConfig,
}

fn parsed<T: std::str::FromStr>(var: &'static str, default: T) -> Result<T, ConfigError>
where
    T::Err: std::fmt::Display,
{
    match std::env::var(var) {
        Ok(raw) => raw.parse().map_err(|e: T::Err| ConfigError::Invalid {
            var,
            message: e.to_string(),
        }),
        Err(_) => Ok(default),
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// `DATABASE_URL` is required; everything else has a default.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Missing`] for an absent `DATABASE_URL`,
    /// [`ConfigError::Invalid`] for unparseable values.
    pub fn from_env() -> Result<Self, ConfigError> {
        let url =
            std::env::var("DATABASE_URL").map_err(|_| ConfigError::Missing("DATABASE_URL"))?;

        let bind_addr = parsed(
            "OBWIRA_BIND_ADDR",
            SocketAddr::from(([0, 0, 0, 0], 8080)),
        )?;
        let max_connections = parsed("OBWIRA_DB_MAX_CONNECTIONS", 5)?;
        let session_ttl_secs: i64 = parsed("OBWIRA_SESSION_TTL_SECS", 8 * 60 * 60)?;
        let root = std::env::var("OBWIRA_UPLOAD_ROOT")
            .map_or_else(|_| PathBuf::from("./uploads"), PathBuf::from);
        let public_base = std::env::var("OBWIRA_PUBLIC_BASE_URL")
            .unwrap_or_else(|_| "http://localhost:8080/uploads".to_string());

        Ok(Self {
            server: ServerConfig { bind_addr },
            postgres: PostgresConfig {
                url,
                max_connections,
            },
            auth: AuthConfig {
                session_ttl: Duration::seconds(session_ttl_secs),
            },
            storage: StorageConfig { root, public_base },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parsed_falls_back_to_default() {
        let value: u32 = parsed("OBWIRA_TEST_UNSET_VARIABLE", 7).unwrap_or(0);
        assert_eq!(value, 7);
    }
}
