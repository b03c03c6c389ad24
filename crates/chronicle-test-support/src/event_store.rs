//! In-memory `EventStore` implementations for tests.

use std::collections::HashMap;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use chronicle_core::{DomainError, EventPublisher, EventStore, EventStream, SharedEvent};
use uuid::Uuid;

/// An event store that keeps streams in memory and publishes saved events to
/// an optional publisher, after they were stored.
#[derive(Default)]
pub struct InMemoryEventStore {
    streams: Mutex<HashMap<Uuid, Vec<SharedEvent>>>,
    publisher: Option<Arc<dyn EventPublisher>>,
}

impl InMemoryEventStore {
    /// Creates an empty store that publishes nothing.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates an empty store that publishes saved events to `publisher`.
    #[must_use]
    pub fn with_publisher(publisher: Arc<dyn EventPublisher>) -> Self {
        Self {
            streams: Mutex::default(),
            publisher: Some(publisher),
        }
    }

    /// Returns the tags of every event stored for `aggregate_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn event_types(&self, aggregate_id: Uuid) -> Vec<&'static str> {
        self.streams
            .lock()
            .unwrap()
            .get(&aggregate_id)
            .map(|events| events.iter().map(|e| e.event_type()).collect())
            .unwrap_or_default()
    }
}

impl fmt::Debug for InMemoryEventStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("InMemoryEventStore")
            .field("streams", &self.streams)
            .field("publishes", &self.publisher.is_some())
            .finish()
    }
}

#[async_trait]
impl EventStore for InMemoryEventStore {
    async fn save_stream(&self, stream: &EventStream) -> Result<(), DomainError> {
        self.streams
            .lock()
            .unwrap()
            .entry(stream.aggregate_id())
            .or_default()
            .extend(stream.events().iter().cloned());

        if let Some(publisher) = &self.publisher {
            for event in stream.events() {
                publisher.publish_event(Arc::clone(event)).await?;
            }
        }
        Ok(())
    }

    async fn load_stream(&self, aggregate_id: Uuid) -> Result<EventStream, DomainError> {
        let events = self
            .streams
            .lock()
            .unwrap()
            .get(&aggregate_id)
            .cloned()
            .unwrap_or_default();
        Ok(EventStream::new(aggregate_id, events))
    }
}

/// An event store that always loads an empty stream and silently accepts
/// saves. Useful for creation commands.
#[derive(Debug)]
pub struct EmptyEventStore;

#[async_trait]
impl EventStore for EmptyEventStore {
    async fn save_stream(&self, _stream: &EventStream) -> Result<(), DomainError> {
        Ok(())
    }

    async fn load_stream(&self, aggregate_id: Uuid) -> Result<EventStream, DomainError> {
        Ok(EventStream::create(aggregate_id))
    }
}

/// An event store that always returns a storage error. Useful for testing
/// error-handling paths.
#[derive(Debug)]
pub struct FailingEventStore;

#[async_trait]
impl EventStore for FailingEventStore {
    async fn save_stream(&self, _stream: &EventStream) -> Result<(), DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }

    async fn load_stream(&self, _aggregate_id: Uuid) -> Result<EventStream, DomainError> {
        Err(DomainError::Storage("connection refused".into()))
    }
}
