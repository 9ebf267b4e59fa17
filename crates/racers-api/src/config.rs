//! Server configuration read from the environment.

use std::net::SocketAddr;
use std::time::Duration;

use crate::error::AppError;

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 3000;
const DEFAULT_MAX_CONNECTIONS: u32 = 10;
const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

/// Settings for one server process.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Config {
    /// Interface to bind.
    pub host: String,
    /// Port to bind.
    pub port: u16,
    /// PostgreSQL URL. In-memory collaborators are used when absent.
    pub database_url: Option<String>,
    /// Upper bound on pooled connections.
    pub max_connections: u32,
    /// Requests running longer are cancelled.
    pub request_timeout: Duration,
    /// Apply migrations at start-up.
    pub run_migrations: bool,
    /// OTLP collector endpoint; tracing export is off when absent.
    pub otlp_endpoint: Option<String>,
}

impl Config {
    /// Reads the configuration from process environment variables.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_env() -> Result<Self, AppError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of
    /// a variable or `None` when unset.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if a variable is set to an invalid value.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, AppError> {
        let non_empty = |key: &str| lookup(key).filter(|value| !value.trim().is_empty());

        let host = non_empty("HOST").unwrap_or_else(|| DEFAULT_HOST.to_owned());
        let port = parse_or(non_empty("PORT"), "PORT", DEFAULT_PORT)?;
        let max_connections = parse_or(
            non_empty("DATABASE_MAX_CONNECTIONS"),
            "DATABASE_MAX_CONNECTIONS",
            DEFAULT_MAX_CONNECTIONS,
        )?;
        if max_connections == 0 {
            return Err(AppError::Config(
                "DATABASE_MAX_CONNECTIONS must be at least 1".into(),
            ));
        }
        let timeout_secs = parse_or(
            non_empty("REQUEST_TIMEOUT_SECS"),
            "REQUEST_TIMEOUT_SECS",
            DEFAULT_REQUEST_TIMEOUT_SECS,
        )?;
        let run_migrations = parse_or(non_empty("RUN_MIGRATIONS"), "RUN_MIGRATIONS", true)?;

        Ok(Self {
            host,
            port,
            database_url: non_empty("DATABASE_URL"),
            max_connections,
            request_timeout: Duration::from_secs(timeout_secs),
            run_migrations,
            otlp_endpoint: non_empty("OTEL_EXPORTER_OTLP_ENDPOINT"),
        })
    }

    /// The address to listen on.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Config` if host and port do not form an address.
    pub fn socket_addr(&self) -> Result<SocketAddr, AppError> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .map_err(|e| AppError::Config(format!("invalid HOST:PORT combination: {e}")))
    }
}

fn parse_or<T>(value: Option<String>, key: &str, default: T) -> Result<T, AppError>
where
    T: std::str::FromStr,
    T::Err: std::fmt::Display,
{
    match value {
        Some(raw) => raw
            .trim()
            .parse()
            .map_err(|e| AppError::Config(format!("{key} must be valid: {e}"))),
        None => Ok(default),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn config_from(vars: &[(&str, &str)]) -> Result<Config, AppError> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn test_defaults_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();

        assert_eq!(config.host, "0.0.0.0");
        assert_eq!(config.port, 3000);
        assert_eq!(config.database_url, None);
        assert_eq!(config.max_connections, 10);
        assert_eq!(config.request_timeout, Duration::from_secs(30));
        assert!(config.run_migrations);
        assert_eq!(config.otlp_endpoint, None);
    }

    #[test]
    fn test_reads_every_variable() {
        let config = config_from(&[
            ("HOST", "127.0.0.1"),
            ("PORT", "8080"),
            ("DATABASE_URL", "postgres://localhost/racers"),
            ("DATABASE_MAX_CONNECTIONS", "4"),
            ("REQUEST_TIMEOUT_SECS", "5"),
            ("RUN_MIGRATIONS", "false"),
            ("OTEL_EXPORTER_OTLP_ENDPOINT", "http://collector:4317"),
        ])
        .unwrap();

        assert_eq!(config.socket_addr().unwrap().to_string(), "127.0.0.1:8080");
        assert_eq!(
            config.database_url.as_deref(),
            Some("postgres://localhost/racers")
        );
        assert_eq!(config.max_connections, 4);
        assert_eq!(config.request_timeout, Duration::from_secs(5));
        assert!(!config.run_migrations);
        assert_eq!(
            config.otlp_endpoint.as_deref(),
            Some("http://collector:4317")
        );
    }

    #[test]
    fn test_blank_database_url_means_in_memory() {
        let config = config_from(&[("DATABASE_URL", "  ")]).unwrap();

        assert_eq!(config.database_url, None);
    }

    #[test]
    fn test_invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "http")]).unwrap_err();

        assert!(matches!(err, AppError::Config(msg) if msg.starts_with("PORT")));
    }

    #[test]
    fn test_zero_connections_is_rejected() {
        let err = config_from(&[("DATABASE_MAX_CONNECTIONS", "0")]).unwrap_err();

        assert!(matches!(err, AppError::Config(_)));
    }

    #[test]
    fn test_invalid_host_fails_socket_addr() {
        let config = config_from(&[("HOST", "not a host")]).unwrap();

        assert!(config.socket_addr().is_err());
    }
}
