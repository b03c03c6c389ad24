//! Event store and publisher seams.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::DomainError;
use crate::event::SharedEvent;
use crate::stream::EventStream;

/// Append-only storage of event streams.
///
/// Dropping a pending call cancels it at its next I/O boundary; an
/// uncommitted save leaves nothing behind.
#[async_trait]
pub trait EventStore: Send + Sync {
    /// Persists every event of `stream` in one transaction, in order, then
    /// publishes them in the same order.
    ///
    /// Nothing is published unless the transaction committed. A publication
    /// failure is returned to the caller, but the events stay committed.
    async fn save_stream(&self, stream: &EventStream) -> Result<(), DomainError>;

    /// Loads the stream of `aggregate_id`, ordered by occurrence.
    ///
    /// An unknown aggregate yields an empty stream. Records whose type tag
    /// has no decoder are skipped.
    async fn load_stream(&self, aggregate_id: Uuid) -> Result<EventStream, DomainError>;
}

/// Receives events after they were committed.
#[async_trait]
pub trait EventPublisher: Send + Sync {
    /// Delivers one committed event to its subscribers.
    async fn publish_event(&self, event: SharedEvent) -> Result<(), DomainError>;
}
