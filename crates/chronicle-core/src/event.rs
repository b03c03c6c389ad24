//! Domain event abstractions.

use std::any::{Any, TypeId};
use std::fmt;
use std::sync::Arc;

use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::codec;
use crate::error::DomainError;

/// Trait implemented by every concrete event type.
///
/// Events are immutable facts about one aggregate. They carry no identity of
/// their own; a stored event is identified by its aggregate and its position
/// in the stream.
pub trait Event: Serialize + DeserializeOwned + fmt::Debug + Send + Sync + 'static {
    /// Globally unique, stable type tag (e.g. `"example.created"`), used to
    /// resolve a decoder when the event is loaded back from storage.
    const EVENT_TYPE: &'static str;
}

/// Object-safe view over any [`Event`].
///
/// Streams and aggregates hold events as [`SharedEvent`] so that one stream
/// can mix event types. Implemented for every `Event`; not meant to be
/// implemented by hand.
pub trait DomainEvent: fmt::Debug + Send + Sync + 'static {
    /// Returns the type tag of the concrete event.
    fn event_type(&self) -> &'static str;

    /// Returns the `TypeId` of the concrete event.
    fn event_type_id(&self) -> TypeId;

    /// Encodes the event into its persisted payload.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Serialization` if the event cannot be encoded.
    fn to_payload(&self) -> Result<serde_json::Value, DomainError>;

    /// Borrows the event as `Any` for downcasting.
    fn as_any(&self) -> &dyn Any;

    /// Converts a shared event into a shared `Any`.
    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync>;
}

/// A reference-counted, type-erased domain event.
pub type SharedEvent = Arc<dyn DomainEvent>;

impl<E: Event> DomainEvent for E {
    fn event_type(&self) -> &'static str {
        E::EVENT_TYPE
    }

    fn event_type_id(&self) -> TypeId {
        TypeId::of::<E>()
    }

    fn to_payload(&self) -> Result<serde_json::Value, DomainError> {
        codec::encode(self)
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn into_any(self: Arc<Self>) -> Arc<dyn Any + Send + Sync> {
        self
    }
}

impl dyn DomainEvent {
    /// Returns the event as `E` if that is its concrete type.
    #[must_use]
    pub fn downcast_ref<E: Event>(&self) -> Option<&E> {
        self.as_any().downcast_ref::<E>()
    }

    /// Returns `true` if the concrete type of the event is `E`.
    #[must_use]
    pub fn is<E: Event>(&self) -> bool {
        self.event_type_id() == TypeId::of::<E>()
    }
}

/// Wraps a concrete event into a [`SharedEvent`].
#[must_use]
pub fn shared<E: Event>(event: E) -> SharedEvent {
    Arc::new(event)
}
