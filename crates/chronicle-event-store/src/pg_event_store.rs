//! `PostgreSQL` implementation of the `EventStore` trait.

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use chronicle_core::clock::{Clock, SystemClock};
use chronicle_core::{DomainError, EventPublisher, EventRegistry, EventStore, EventStream};
use sqlx::PgPool;
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::error::{abort, map_sqlx_error};
use crate::schema;

/// PostgreSQL-backed event store.
///
/// Events of one save share a single `occurred_on` timestamp; the serial
/// primary key keeps their relative order on load. Committed events are
/// handed to the configured [`EventPublisher`] one at a time, in order, and
/// publication stops at the first failure. Events already committed stay
/// committed in that case.
#[derive(Clone)]
pub struct PgEventStore {
    pool: PgPool,
    registry: Arc<EventRegistry>,
    publisher: Arc<dyn EventPublisher>,
    clock: Arc<dyn Clock>,
}

impl PgEventStore {
    /// Creates a new `PgEventStore` stamping events with the system clock.
    #[must_use]
    pub fn new(pool: PgPool, registry: EventRegistry, publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            pool,
            registry: Arc::new(registry),
            publisher,
            clock: Arc::new(SystemClock),
        }
    }

    /// Replaces the clock used for `occurred_on`.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }
}

impl fmt::Debug for PgEventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PgEventStore")
            .field("pool", &self.pool)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

#[async_trait]
impl EventStore for PgEventStore {
    #[instrument(
        skip(self, stream),
        fields(aggregate_id = %stream.aggregate_id(), event_count = stream.len()),
        err
    )]
    async fn save_stream(&self, stream: &EventStream) -> Result<(), DomainError> {
        if stream.is_empty() {
            return Ok(());
        }

        let records = stream
            .events()
            .iter()
            .map(|event| Ok((event.event_type(), event.to_payload()?)))
            .collect::<Result<Vec<_>, DomainError>>()?;
        let occurred_on = self.clock.now();

        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        for (event_type, payload) in &records {
            let inserted = sqlx::query(schema::INSERT_EVENT)
                .bind(stream.aggregate_id())
                .bind(*event_type)
                .bind(payload)
                .bind(occurred_on)
                .execute(&mut *tx)
                .await;
            if let Err(e) = inserted {
                return Err(abort(tx, "insert_event", e).await);
            }
        }

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;
        debug!("events committed");

        for event in stream.events() {
            if let Err(err) = self.publisher.publish_event(Arc::clone(event)).await {
                warn!(
                    event_type = event.event_type(),
                    error = %err,
                    "committed event could not be published"
                );
                return Err(err);
            }
        }
        Ok(())
    }

    #[instrument(skip(self), fields(aggregate_id = %aggregate_id), err)]
    async fn load_stream(&self, aggregate_id: Uuid) -> Result<EventStream, DomainError> {
        let rows: Vec<(String, serde_json::Value)> = sqlx::query_as(schema::SELECT_STREAM)
            .bind(aggregate_id)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| map_sqlx_error("load_stream", e))?;

        let mut events = Vec::with_capacity(rows.len());
        for (event_type, payload) in rows {
            match self.registry.decode(&event_type, &payload) {
                Some(decoded) => events.push(decoded?),
                None => warn!(event_type = %event_type, "skipping event with unregistered type"),
            }
        }
        debug!(event_count = events.len(), "stream loaded");
        Ok(EventStream::new(aggregate_id, events))
    }
}
