//! Domain error types.

use std::fmt;

use thiserror::Error;

/// The shape of a message routed through the bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MessageKind {
    /// A state-changing request handled by exactly one handler.
    Command,
    /// A read-only request handled by exactly one handler.
    Query,
    /// A fact broadcast to every subscribed handler.
    Event,
}

impl fmt::Display for MessageKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Command => f.write_str("command"),
            Self::Query => f.write_str("query"),
            Self::Event => f.write_str("event"),
        }
    }
}

/// Top-level domain error type.
#[derive(Debug, Error)]
pub enum DomainError {
    /// No handler is registered for the concrete message type.
    #[error("no {kind} handler registered for {message_type}")]
    HandlerNotRegistered {
        /// The kind of message that was dispatched.
        kind: MessageKind,
        /// The concrete message type name.
        message_type: &'static str,
    },

    /// One or more event handlers failed after the whole fan-out settled.
    #[error("{} handler(s) failed for event {event_type}", failures.len())]
    EventHandlersFailed {
        /// The event type tag that was published.
        event_type: &'static str,
        /// Every failure reported by the handlers, in registration order.
        failures: Vec<DomainError>,
    },

    /// A storage or transaction failure.
    #[error("storage error: {0}")]
    Storage(String),

    /// A payload could not be encoded or decoded.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// A validation error in domain logic.
    #[error("validation error: {0}")]
    Validation(String),

    /// Handlers or event types were registered inconsistently.
    #[error("configuration error: {0}")]
    Configuration(String),

    /// A type-erased message did not have the expected concrete type.
    #[error("dispatch error: {0}")]
    Dispatch(String),
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_handler_not_registered_names_kind_and_type() {
        let err = DomainError::HandlerNotRegistered {
            kind: MessageKind::Query,
            message_type: "GetExample",
        };

        assert_eq!(err.to_string(), "no query handler registered for GetExample");
    }

    #[test]
    fn test_event_handlers_failed_reports_failure_count() {
        let err = DomainError::EventHandlersFailed {
            event_type: "example.created",
            failures: vec![
                DomainError::Validation("first".into()),
                DomainError::Storage("second".into()),
            ],
        };

        assert_eq!(
            err.to_string(),
            "2 handler(s) failed for event example.created"
        );
    }
}
