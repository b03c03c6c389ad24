//! Event type registry.
//!
//! Maps the stable type tag stored next to every event payload to the
//! decoder of its concrete type.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use serde_json::Value;

use crate::codec;
use crate::error::DomainError;
use crate::event::{Event, SharedEvent};

type Decoder = fn(&Value) -> Result<SharedEvent, DomainError>;

fn decode_as<E: Event>(payload: &Value) -> Result<SharedEvent, DomainError> {
    let event: E = codec::decode(payload)?;
    Ok(Arc::new(event))
}

/// Registry of event types that can be decoded from storage.
#[derive(Clone, Default)]
pub struct EventRegistry {
    decoders: HashMap<&'static str, (&'static str, Decoder)>,
}

impl EventRegistry {
    /// Creates an empty registry.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `E` under its [`Event::EVENT_TYPE`] tag.
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Configuration` if another type already claimed
    /// the same tag. Registering the same type twice is accepted.
    pub fn register<E: Event>(mut self) -> Result<Self, DomainError> {
        let rust_type = std::any::type_name::<E>();
        if let Some((existing, _)) = self.decoders.get(E::EVENT_TYPE) {
            if *existing != rust_type {
                return Err(DomainError::Configuration(format!(
                    "event type tag {} is registered for both {existing} and {rust_type}",
                    E::EVENT_TYPE
                )));
            }
        }
        self.decoders
            .insert(E::EVENT_TYPE, (rust_type, decode_as::<E> as Decoder));
        Ok(self)
    }

    /// Returns `true` if `event_type` can be decoded.
    #[must_use]
    pub fn contains(&self, event_type: &str) -> bool {
        self.decoders.contains_key(event_type)
    }

    /// Decodes a stored payload.
    ///
    /// Returns `None` when no decoder is registered for `event_type`.
    #[must_use]
    pub fn decode(
        &self,
        event_type: &str,
        payload: &Value,
    ) -> Option<Result<SharedEvent, DomainError>> {
        self.decoders
            .get(event_type)
            .map(|(_, decoder)| decoder(payload))
    }
}

impl fmt::Debug for EventRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut tags: Vec<&str> = self.decoders.keys().copied().collect();
        tags.sort_unstable();
        f.debug_struct("EventRegistry").field("tags", &tags).finish()
    }
}

#[cfg(test)]
mod tests {
    use serde::{Deserialize, Serialize};
    use serde_json::json;

    use super::*;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Shipped {
        parcel_id: u32,
    }

    impl Event for Shipped {
        const EVENT_TYPE: &'static str = "parcel.shipped";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Impostor;

    impl Event for Impostor {
        const EVENT_TYPE: &'static str = "parcel.shipped";
    }

    #[test]
    fn test_decode_resolves_registered_tag() {
        // Arrange
        let registry = EventRegistry::new().register::<Shipped>().unwrap();

        // Act
        let event = registry
            .decode("parcel.shipped", &json!({ "parcelId": 3 }))
            .unwrap()
            .unwrap();

        // Assert
        assert_eq!(event.downcast_ref::<Shipped>(), Some(&Shipped { parcel_id: 3 }));
    }

    #[test]
    fn test_decode_returns_none_for_unknown_tag() {
        let registry = EventRegistry::new();

        assert!(registry.decode("parcel.lost", &json!({})).is_none());
        assert!(!registry.contains("parcel.lost"));
    }

    #[test]
    fn test_decode_reports_bad_payload_for_known_tag() {
        let registry = EventRegistry::new().register::<Shipped>().unwrap();

        let result = registry.decode("parcel.shipped", &json!({ "parcelId": "x" }));

        assert!(matches!(result, Some(Err(DomainError::Serialization(_)))));
    }

    #[test]
    fn test_register_rejects_conflicting_tag() {
        let result = EventRegistry::new()
            .register::<Shipped>()
            .unwrap()
            .register::<Impostor>();

        assert!(matches!(result, Err(DomainError::Configuration(_))));
    }

    #[test]
    fn test_register_same_type_twice_is_accepted() {
        let registry = EventRegistry::new()
            .register::<Shipped>()
            .unwrap()
            .register::<Shipped>()
            .unwrap();

        assert!(registry.contains("parcel.shipped"));
    }
}
