//! Environment configuration.

use std::str::FromStr;

use crate::error::HostError;

/// Output format of the tracing subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogFormat {
    /// One JSON object per line.
    #[default]
    Json,
    /// Human-readable, multi-line output.
    Pretty,
}

impl FromStr for LogFormat {
    type Err = HostError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "json" => Ok(Self::Json),
            "pretty" => Ok(Self::Pretty),
            other => Err(HostError::Config(format!(
                "CHRONICLE_LOG_FORMAT must be json or pretty, got {other:?}"
            ))),
        }
    }
}

/// Host configuration.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChronicleConfig {
    /// `PostgreSQL` connection string.
    pub database_url: String,
    /// Upper bound of the connection pool.
    pub max_connections: u32,
    /// Whether [`crate::Services::connect`] applies the schema migrations.
    pub run_migrations: bool,
    /// Tracing output format.
    pub log_format: LogFormat,
}

impl ChronicleConfig {
    /// Default pool size.
    pub const DEFAULT_MAX_CONNECTIONS: u32 = 10;

    /// Reads the configuration from the process environment.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Config` if `DATABASE_URL` is unset or a variable
    /// holds an invalid value.
    pub fn from_env() -> Result<Self, HostError> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Reads the configuration through `lookup`, which returns the value of a
    /// variable or `None` when it is unset.
    ///
    /// # Errors
    ///
    /// See [`ChronicleConfig::from_env`].
    pub fn from_lookup<F>(lookup: F) -> Result<Self, HostError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let database_url = lookup("DATABASE_URL")
            .filter(|url| !url.trim().is_empty())
            .ok_or_else(|| {
                HostError::Config("DATABASE_URL environment variable must be set".into())
            })?;

        let max_connections = match lookup("CHRONICLE_MAX_CONNECTIONS") {
            Some(raw) => raw
                .trim()
                .parse::<u32>()
                .ok()
                .filter(|n| *n > 0)
                .ok_or_else(|| {
                    HostError::Config(format!(
                        "CHRONICLE_MAX_CONNECTIONS must be a positive integer, got {raw:?}"
                    ))
                })?,
            None => Self::DEFAULT_MAX_CONNECTIONS,
        };

        let run_migrations = match lookup("CHRONICLE_RUN_MIGRATIONS") {
            Some(raw) => parse_bool(&raw).ok_or_else(|| {
                HostError::Config(format!(
                    "CHRONICLE_RUN_MIGRATIONS must be true or false, got {raw:?}"
                ))
            })?,
            None => true,
        };

        let log_format = match lookup("CHRONICLE_LOG_FORMAT") {
            Some(raw) => raw.parse()?,
            None => LogFormat::default(),
        };

        Ok(Self {
            database_url,
            max_connections,
            run_migrations,
            log_format,
        })
    }
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" => Some(true),
        "false" | "0" | "no" => Some(false),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashMap;

    use super::*;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> + use<> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_apply_when_only_database_url_is_set() {
        // Arrange
        let env = lookup(&[("DATABASE_URL", "postgres://localhost/chronicle")]);

        // Act
        let config = ChronicleConfig::from_lookup(env).unwrap();

        // Assert
        assert_eq!(config.database_url, "postgres://localhost/chronicle");
        assert_eq!(config.max_connections, 10);
        assert!(config.run_migrations);
        assert_eq!(config.log_format, LogFormat::Json);
    }

    #[test]
    fn test_every_variable_is_read() {
        let env = lookup(&[
            ("DATABASE_URL", "postgres://db/chronicle"),
            ("CHRONICLE_MAX_CONNECTIONS", "4"),
            ("CHRONICLE_RUN_MIGRATIONS", "false"),
            ("CHRONICLE_LOG_FORMAT", "Pretty"),
        ]);

        let config = ChronicleConfig::from_lookup(env).unwrap();

        assert_eq!(config.max_connections, 4);
        assert!(!config.run_migrations);
        assert_eq!(config.log_format, LogFormat::Pretty);
    }

    #[test]
    fn test_missing_database_url_is_a_config_error() {
        let result = ChronicleConfig::from_lookup(lookup(&[]));

        assert!(matches!(result, Err(HostError::Config(_))));
    }

    #[test]
    fn test_invalid_values_are_config_errors() {
        let cases = [
            ("CHRONICLE_MAX_CONNECTIONS", "0"),
            ("CHRONICLE_MAX_CONNECTIONS", "many"),
            ("CHRONICLE_RUN_MIGRATIONS", "sometimes"),
            ("CHRONICLE_LOG_FORMAT", "xml"),
        ];

        for (key, value) in cases {
            let env = lookup(&[("DATABASE_URL", "postgres://db/chronicle"), (key, value)]);

            let result = ChronicleConfig::from_lookup(env);

            assert!(
                matches!(result, Err(HostError::Config(_))),
                "{key}={value} should be rejected"
            );
        }
    }
}
