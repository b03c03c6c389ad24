//! Service wiring.
//!
//! The event store publishes through the message bus, and the handlers on
//! the bus use the event store. [`Services`] builds the store against a
//! deferred bus; the handler registry is installed afterwards with
//! [`Services::install_handlers`]. The store publishes through a
//! [`WeakMessageBus`](chronicle_bus::WeakMessageBus), so handlers holding
//! the store do not keep the bus alive once `Services` is dropped.

use std::sync::Arc;

use chronicle_bus::{HandlerRegistry, MessageBus};
use chronicle_core::{EventPublisher, EventRegistry, EventStore, ReadmodelRepository};
use chronicle_event_store::{PgEventStore, PgReadmodelRepository};
use sqlx::PgPool;
use sqlx::postgres::PgPoolOptions;
use tracing::info;

use crate::config::ChronicleConfig;
use crate::error::HostError;

/// Applies the schema migrations in `migrations/`.
///
/// # Errors
///
/// Returns `HostError::Migration` if a migration fails.
pub async fn migrate(pool: &PgPool) -> Result<(), HostError> {
    sqlx::migrate!("../../migrations").run(pool).await?;
    info!("schema migrations applied");
    Ok(())
}

/// The wired event store, readmodel repository and message bus.
#[derive(Debug, Clone)]
pub struct Services {
    pool: PgPool,
    event_store: Arc<PgEventStore>,
    readmodels: Arc<PgReadmodelRepository>,
    bus: MessageBus,
}

impl Services {
    /// Connects to the database, applies migrations when configured to, and
    /// wires the services.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Database` if the pool cannot connect, or
    /// `HostError::Migration` if the schema cannot be applied.
    pub async fn connect(
        config: &ChronicleConfig,
        event_registry: EventRegistry,
    ) -> Result<Self, HostError> {
        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .connect(&config.database_url)
            .await?;
        info!(max_connections = config.max_connections, "database pool ready");

        if config.run_migrations {
            migrate(&pool).await?;
        }

        Ok(Self::from_pool(pool, event_registry))
    }

    /// Wires the services over an existing pool.
    #[must_use]
    pub fn from_pool(pool: PgPool, event_registry: EventRegistry) -> Self {
        let bus = MessageBus::deferred();
        let publisher: Arc<dyn EventPublisher> = Arc::new(bus.downgrade());
        let event_store = Arc::new(PgEventStore::new(pool.clone(), event_registry, publisher));
        let readmodels = Arc::new(PgReadmodelRepository::new(pool.clone()));
        Self {
            pool,
            event_store,
            readmodels,
            bus,
        }
    }

    /// Installs the handlers of the bus.
    ///
    /// # Errors
    ///
    /// Returns `HostError::Domain` if handlers were already installed.
    pub fn install_handlers(&self, handlers: HandlerRegistry) -> Result<(), HostError> {
        self.bus.install(handlers)?;
        info!("message bus handlers installed");
        Ok(())
    }

    /// Returns the connection pool.
    #[must_use]
    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Returns the event store.
    #[must_use]
    pub fn event_store(&self) -> Arc<dyn EventStore> {
        self.event_store.clone()
    }

    /// Returns the readmodel repository.
    #[must_use]
    pub fn readmodels(&self) -> Arc<dyn ReadmodelRepository> {
        self.readmodels.clone()
    }

    /// Returns the message bus.
    #[must_use]
    pub fn bus(&self) -> &MessageBus {
        &self.bus
    }
}
