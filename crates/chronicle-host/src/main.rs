//! Applies the Chronicle schema to the configured database.

use std::error::Error;

use chronicle_host::ChronicleConfig;
use chronicle_host::services::migrate;
use chronicle_host::telemetry::init_tracing;
use sqlx::postgres::PgPoolOptions;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error>> {
    let config = ChronicleConfig::from_env()?;
    init_tracing(config.log_format)?;

    tracing::info!("Applying Chronicle schema migrations");

    let pool = PgPoolOptions::new()
        .max_connections(1)
        .connect(&config.database_url)
        .await?;
    migrate(&pool).await?;
    pool.close().await;

    Ok(())
}
