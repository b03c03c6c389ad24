//! Chronicle host error types.

use chronicle_core::DomainError;
use thiserror::Error;

/// Startup errors of the host.
#[derive(Debug, Error)]
pub enum HostError {
    /// A required environment variable is missing or invalid.
    #[error("configuration error: {0}")]
    Config(String),

    /// Database connection or pool error.
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    /// Applying the schema failed.
    #[error("migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    /// Wiring the domain services failed.
    #[error(transparent)]
    Domain(#[from] DomainError),
}
