//! Message bus.

use std::any::{TypeId, type_name};
use std::sync::{Arc, OnceLock, Weak};

use async_trait::async_trait;
use chronicle_core::event::shared;
use chronicle_core::{
    Command, DomainError, Event, EventPublisher, MessageKind, Query, SharedEvent,
};
use futures::future::join_all;
use tracing::{debug, instrument, warn};

use crate::registry::{AnyMessage, HandlerRegistry, RequestHandlerFn};

/// Single dispatch point for commands, queries and events.
///
/// Cloning is cheap and every clone sees the same registry. A bus created
/// with [`MessageBus::deferred`] rejects dispatch until a registry is
/// installed, which lets components that publish through the bus be built
/// before the handlers that depend on them.
#[derive(Debug, Clone, Default)]
pub struct MessageBus {
    registry: Arc<OnceLock<HandlerRegistry>>,
}

impl MessageBus {
    /// Creates a bus dispatching to `registry`.
    #[must_use]
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(OnceLock::from(registry)),
        }
    }

    /// Creates a bus without handlers; see [`MessageBus::install`].
    #[must_use]
    pub fn deferred() -> Self {
        Self::default()
    }

    /// Installs the handler registry.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if a registry is already installed.
    pub fn install(&self, registry: HandlerRegistry) -> Result<(), DomainError> {
        self.registry.set(registry).map_err(|_| {
            DomainError::Configuration("message bus handlers are already installed".to_owned())
        })
    }

    /// Returns a handle that publishes through this bus without keeping it
    /// alive.
    #[must_use]
    pub fn downgrade(&self) -> WeakMessageBus {
        WeakMessageBus {
            registry: Arc::downgrade(&self.registry),
        }
    }

    /// Returns `true` once a registry is installed.
    #[must_use]
    pub fn is_installed(&self) -> bool {
        self.registry.get().is_some()
    }

    fn registry(&self) -> Result<&HandlerRegistry, DomainError> {
        self.registry.get().ok_or_else(|| {
            DomainError::Configuration("message bus handlers are not installed".to_owned())
        })
    }

    /// Sends a command to its handler and returns the handler's response.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotRegistered` if no handler is registered
    /// for `C`, or whatever error the handler returns.
    #[instrument(skip_all, fields(message_type = type_name::<C>()), err)]
    pub async fn send<C: Command>(&self, command: C) -> Result<C::Response, DomainError> {
        let handler = self
            .registry()?
            .command_handler(TypeId::of::<C>())
            .cloned()
            .ok_or(DomainError::HandlerNotRegistered {
                kind: MessageKind::Command,
                message_type: type_name::<C>(),
            })?;
        debug!("dispatching command");
        dispatch::<C::Response>(&handler, Box::new(command)).await
    }

    /// Sends a query to its handler and returns the answer.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotRegistered` if no handler is registered
    /// for `Q`, or whatever error the handler returns.
    #[instrument(skip_all, fields(message_type = type_name::<Q>()), err)]
    pub async fn query<Q: Query>(&self, query: Q) -> Result<Q::Response, DomainError> {
        let handler = self
            .registry()?
            .query_handler(TypeId::of::<Q>())
            .cloned()
            .ok_or(DomainError::HandlerNotRegistered {
                kind: MessageKind::Query,
                message_type: type_name::<Q>(),
            })?;
        debug!("dispatching query");
        dispatch::<Q::Response>(&handler, Box::new(query)).await
    }

    /// Publishes an event to every handler subscribed to `E`.
    ///
    /// # Errors
    ///
    /// See [`MessageBus::publish_shared`].
    pub async fn publish<E: Event>(&self, event: E) -> Result<(), DomainError> {
        self.publish_shared(shared(event)).await
    }

    /// Publishes a type-erased event to every handler subscribed to its
    /// concrete type.
    ///
    /// All handlers run concurrently and the call returns once every one of
    /// them has finished, whether or not some failed.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::HandlerNotRegistered` if the event has no
    /// subscribers, or `DomainError::EventHandlersFailed` carrying every
    /// handler failure.
    #[instrument(skip_all, fields(event_type = event.event_type()), err)]
    pub async fn publish_shared(&self, event: SharedEvent) -> Result<(), DomainError> {
        let handlers = self.registry()?.event_handlers(event.event_type_id());
        if handlers.is_empty() {
            return Err(DomainError::HandlerNotRegistered {
                kind: MessageKind::Event,
                message_type: event.event_type(),
            });
        }
        debug!(handler_count = handlers.len(), "publishing event");

        let outcomes = join_all(handlers.iter().map(|handler| handler(Arc::clone(&event)))).await;
        let failures: Vec<DomainError> = outcomes.into_iter().filter_map(Result::err).collect();
        if failures.is_empty() {
            return Ok(());
        }
        warn!(
            failed = failures.len(),
            handler_count = handlers.len(),
            "event handlers failed"
        );
        Err(DomainError::EventHandlersFailed {
            event_type: event.event_type(),
            failures,
        })
    }
}

async fn dispatch<R: Send + 'static>(
    handler: &RequestHandlerFn,
    message: AnyMessage,
) -> Result<R, DomainError> {
    let response = handler(message).await?;
    response.downcast::<R>().map(|response| *response).map_err(|_| {
        DomainError::Dispatch(format!("handler did not return a {}", type_name::<R>()))
    })
}

/// Delivery of committed events from an event store.
///
/// Unlike [`MessageBus::publish_shared`], an event nobody subscribes to is
/// not an error here.
#[async_trait]
impl EventPublisher for MessageBus {
    async fn publish_event(&self, event: SharedEvent) -> Result<(), DomainError> {
        match self.publish_shared(event).await {
            Err(DomainError::HandlerNotRegistered { message_type, .. }) => {
                debug!(event_type = message_type, "no subscribers for committed event");
                Ok(())
            }
            outcome => outcome,
        }
    }
}

/// A [`MessageBus`] handle that does not own the handlers.
///
/// Components that the handlers themselves hold, such as an event store,
/// publish through this handle so the two do not keep each other alive.
#[derive(Debug, Clone)]
pub struct WeakMessageBus {
    registry: Weak<OnceLock<HandlerRegistry>>,
}

impl WeakMessageBus {
    /// Returns the bus if it is still alive.
    #[must_use]
    pub fn upgrade(&self) -> Option<MessageBus> {
        self.registry
            .upgrade()
            .map(|registry| MessageBus { registry })
    }
}

#[async_trait]
impl EventPublisher for WeakMessageBus {
    async fn publish_event(&self, event: SharedEvent) -> Result<(), DomainError> {
        let bus = self.upgrade().ok_or_else(|| {
            DomainError::Configuration("message bus has been dropped".to_owned())
        })?;
        bus.publish_event(event).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_install_is_accepted_once() {
        // Arrange
        let bus = MessageBus::deferred();

        // Act
        let first = bus.install(HandlerRegistry::new());
        let second = bus.install(HandlerRegistry::new());

        // Assert
        assert!(first.is_ok());
        assert!(matches!(second, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_clones_share_the_installed_registry() {
        let bus = MessageBus::deferred();
        let clone = bus.clone();

        bus.install(HandlerRegistry::new()).unwrap();

        assert!(clone.is_installed());
    }

    #[tokio::test]
    async fn test_dispatch_before_install_is_a_configuration_error() {
        struct Noop;
        impl Command for Noop {
            type Response = ();
        }

        let result = MessageBus::deferred().send(Noop).await;

        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_new_installs_the_registry() {
        let bus = MessageBus::new(HandlerRegistry::new());

        assert!(bus.is_installed());
        assert!(matches!(
            bus.install(HandlerRegistry::new()),
            Err(DomainError::Configuration(_))
        ));
    }

    #[tokio::test]
    async fn test_weak_handle_stops_publishing_once_the_bus_is_dropped() {
        // Arrange
        #[derive(Debug, serde::Serialize, serde::Deserialize)]
        struct Pinged;
        impl Event for Pinged {
            const EVENT_TYPE: &'static str = "test.pinged";
        }

        let bus = MessageBus::new(HandlerRegistry::new());
        let weak = bus.downgrade();

        // Act
        let while_alive = weak.publish_event(shared(Pinged)).await;
        drop(bus);
        let after_drop = weak.publish_event(shared(Pinged)).await;

        // Assert
        assert!(while_alive.is_ok());
        assert!(weak.upgrade().is_none());
        assert!(matches!(after_drop, Err(DomainError::Configuration(_))));
    }
}
