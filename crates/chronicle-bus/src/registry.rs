//! Handler registry.
//!
//! Built once at startup by explicit registration, then handed to a
//! [`crate::MessageBus`]. Lookups are keyed by the `TypeId` of the concrete
//! message type.

use std::any::{Any, TypeId, type_name};
use std::collections::HashMap;
use std::collections::hash_map::Entry;
use std::fmt;
use std::sync::Arc;

use chronicle_core::{Command, DomainError, Event, MessageKind, Query, SharedEvent};
use futures::FutureExt;
use futures::future::BoxFuture;

use crate::handler::{CommandHandler, EventHandler, QueryHandler};

pub(crate) type AnyMessage = Box<dyn Any + Send>;

pub(crate) type RequestHandlerFn =
    Arc<dyn Fn(AnyMessage) -> BoxFuture<'static, Result<AnyMessage, DomainError>> + Send + Sync>;

pub(crate) type EventHandlerFn =
    Arc<dyn Fn(SharedEvent) -> BoxFuture<'static, Result<(), DomainError>> + Send + Sync>;

struct RequestEntry {
    message_type: &'static str,
    handler: RequestHandlerFn,
}

struct EventEntry {
    handler_type: &'static str,
    handler: EventHandlerFn,
}

fn unexpected_message<M>() -> DomainError {
    DomainError::Dispatch(format!("handler expected a {}", type_name::<M>()))
}

/// Mapping from `(message kind, concrete type)` to handlers.
///
/// Commands and queries have exactly one handler; registering a second one
/// for the same type is rejected. Events take any number of handlers.
#[derive(Default)]
pub struct HandlerRegistry {
    commands: HashMap<TypeId, RequestEntry>,
    queries: HashMap<TypeId, RequestEntry>,
    events: HashMap<TypeId, Vec<EventEntry>>,
}

impl HandlerRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers the handler of command `C`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if `C` already has a handler.
    pub fn register_command<C, H>(&mut self, handler: H) -> Result<&mut Self, DomainError>
    where
        C: Command,
        H: CommandHandler<C> + 'static,
    {
        let handler = Arc::new(handler);
        let erased: RequestHandlerFn = Arc::new(move |message: AnyMessage| {
            let handler = Arc::clone(&handler);
            async move {
                let command = message
                    .downcast::<C>()
                    .map_err(|_| unexpected_message::<C>())?;
                let response = handler.handle(*command).await?;
                Ok::<_, DomainError>(Box::new(response) as AnyMessage)
            }
            .boxed()
        });
        insert_unique::<C>(&mut self.commands, MessageKind::Command, erased)?;
        Ok(self)
    }

    /// Registers the handler of query `Q`.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if `Q` already has a handler.
    pub fn register_query<Q, H>(&mut self, handler: H) -> Result<&mut Self, DomainError>
    where
        Q: Query,
        H: QueryHandler<Q> + 'static,
    {
        let handler = Arc::new(handler);
        let erased: RequestHandlerFn = Arc::new(move |message: AnyMessage| {
            let handler = Arc::clone(&handler);
            async move {
                let query = message
                    .downcast::<Q>()
                    .map_err(|_| unexpected_message::<Q>())?;
                let response = handler.handle(*query).await?;
                Ok::<_, DomainError>(Box::new(response) as AnyMessage)
            }
            .boxed()
        });
        insert_unique::<Q>(&mut self.queries, MessageKind::Query, erased)?;
        Ok(self)
    }

    /// Subscribes `handler` to event `E`.
    pub fn subscribe<E, H>(&mut self, handler: H) -> &mut Self
    where
        E: Event,
        H: EventHandler<E> + 'static,
    {
        let handler = Arc::new(handler);
        let erased: EventHandlerFn = Arc::new(move |event: SharedEvent| {
            let handler = Arc::clone(&handler);
            async move {
                let event = event
                    .into_any()
                    .downcast::<E>()
                    .map_err(|_| unexpected_message::<E>())?;
                handler.handle(&event).await
            }
            .boxed()
        });
        self.events
            .entry(TypeId::of::<E>())
            .or_default()
            .push(EventEntry {
                handler_type: type_name::<H>(),
                handler: erased,
            });
        self
    }

    pub(crate) fn command_handler(&self, message_type: TypeId) -> Option<&RequestHandlerFn> {
        self.commands.get(&message_type).map(|entry| &entry.handler)
    }

    pub(crate) fn query_handler(&self, message_type: TypeId) -> Option<&RequestHandlerFn> {
        self.queries.get(&message_type).map(|entry| &entry.handler)
    }

    pub(crate) fn event_handlers(&self, event_type: TypeId) -> Vec<EventHandlerFn> {
        self.events
            .get(&event_type)
            .map(|entries| entries.iter().map(|e| Arc::clone(&e.handler)).collect())
            .unwrap_or_default()
    }

    /// Returns the number of handlers subscribed to event `E`.
    #[must_use]
    pub fn subscriber_count<E: Event>(&self) -> usize {
        self.events.get(&TypeId::of::<E>()).map_or(0, Vec::len)
    }
}

fn insert_unique<M: 'static>(
    map: &mut HashMap<TypeId, RequestEntry>,
    kind: MessageKind,
    handler: RequestHandlerFn,
) -> Result<(), DomainError> {
    match map.entry(TypeId::of::<M>()) {
        Entry::Occupied(existing) => Err(DomainError::Configuration(format!(
            "duplicate {kind} handler for {}",
            existing.get().message_type
        ))),
        Entry::Vacant(slot) => {
            slot.insert(RequestEntry {
                message_type: type_name::<M>(),
                handler,
            });
            Ok(())
        }
    }
}

fn sorted_names(map: &HashMap<TypeId, RequestEntry>) -> Vec<&'static str> {
    let mut names: Vec<&'static str> = map.values().map(|e| e.message_type).collect();
    names.sort_unstable();
    names
}

impl fmt::Debug for HandlerRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut subscribers: Vec<&'static str> = self
            .events
            .values()
            .flatten()
            .map(|e| e.handler_type)
            .collect();
        subscribers.sort_unstable();
        f.debug_struct("HandlerRegistry")
            .field("commands", &sorted_names(&self.commands))
            .field("queries", &sorted_names(&self.queries))
            .field("event_handlers", &subscribers)
            .finish()
    }
}
