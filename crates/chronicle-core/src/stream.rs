//! Event stream value type.

use uuid::Uuid;

use crate::aggregate::AggregateRoot;
use crate::event::{DomainEvent, SharedEvent};

/// The ordered event history of one aggregate.
///
/// A stream is a value: [`EventStream::append`] returns a new stream and
/// leaves the receiver as it was.
#[derive(Debug, Clone)]
pub struct EventStream {
    aggregate_id: Uuid,
    events: Vec<SharedEvent>,
}

impl EventStream {
    /// Creates a stream from an existing history.
    #[must_use]
    pub fn new(aggregate_id: Uuid, events: Vec<SharedEvent>) -> Self {
        Self {
            aggregate_id,
            events,
        }
    }

    /// Creates an empty stream for `aggregate_id`.
    #[must_use]
    pub fn create(aggregate_id: Uuid) -> Self {
        Self::new(aggregate_id, Vec::new())
    }

    /// Returns the owning aggregate identifier.
    #[must_use]
    pub fn aggregate_id(&self) -> Uuid {
        self.aggregate_id
    }

    /// Returns the events in order of occurrence.
    #[must_use]
    pub fn events(&self) -> &[SharedEvent] {
        &self.events
    }

    /// Returns the number of events in the stream.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Returns `true` if the stream holds no events.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Returns a new stream with `new_events` after the existing ones.
    #[must_use]
    pub fn append<'a, I>(&self, new_events: I) -> Self
    where
        I: IntoIterator<Item = &'a SharedEvent>,
    {
        let mut events = self.events.clone();
        events.extend(new_events.into_iter().cloned());
        Self::new(self.aggregate_id, events)
    }

    /// Folds every event into `initial` with `apply`, left to right.
    pub fn replay_with<T, F>(&self, initial: T, mut apply: F) -> T
    where
        F: FnMut(T, &dyn DomainEvent) -> T,
    {
        self.events
            .iter()
            .fold(initial, |acc, event| apply(acc, event.as_ref()))
    }

    /// Replays the stream into `A`, starting from [`AggregateRoot::empty`].
    #[must_use]
    pub fn replay<A: AggregateRoot>(&self) -> A {
        A::load_from_history(&self.events)
    }
}
