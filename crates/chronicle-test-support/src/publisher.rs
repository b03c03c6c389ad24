//! Test publisher.

use std::sync::Mutex;

use async_trait::async_trait;
use chronicle_core::{DomainError, EventPublisher, SharedEvent};

/// An event publisher that records every event it receives.
///
/// A failing publisher still records the event before returning its error.
#[derive(Debug, Default)]
pub struct RecordingPublisher {
    published: Mutex<Vec<SharedEvent>>,
    fail: bool,
}

impl RecordingPublisher {
    /// Creates a publisher that accepts every event.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a publisher that rejects every event.
    #[must_use]
    pub fn failing() -> Self {
        Self {
            published: Mutex::default(),
            fail: true,
        }
    }

    /// Returns a snapshot of all published events.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn published(&self) -> Vec<SharedEvent> {
        self.published.lock().unwrap().clone()
    }

    /// Returns the tags of all published events, in publication order.
    #[must_use]
    pub fn published_types(&self) -> Vec<&'static str> {
        self.published().iter().map(|e| e.event_type()).collect()
    }
}

#[async_trait]
impl EventPublisher for RecordingPublisher {
    async fn publish_event(&self, event: SharedEvent) -> Result<(), DomainError> {
        let event_type = event.event_type();
        self.published.lock().unwrap().push(event);
        if self.fail {
            return Err(DomainError::Validation(format!(
                "subscriber rejected {event_type}"
            )));
        }
        Ok(())
    }
}
