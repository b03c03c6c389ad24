//! Handler traits.
//!
//! A type implements one handler trait per message type it handles.

use async_trait::async_trait;
use chronicle_core::{Command, DomainError, Event, Query};

/// Handles one command type.
#[async_trait]
pub trait CommandHandler<C: Command>: Send + Sync {
    /// Executes the command.
    async fn handle(&self, command: C) -> Result<C::Response, DomainError>;
}

/// Handles one query type.
#[async_trait]
pub trait QueryHandler<Q: Query>: Send + Sync {
    /// Answers the query.
    async fn handle(&self, query: Q) -> Result<Q::Response, DomainError>;
}

/// Subscribes to one event type.
#[async_trait]
pub trait EventHandler<E: Event>: Send + Sync {
    /// Reacts to a published event.
    async fn handle(&self, event: &E) -> Result<(), DomainError>;
}
