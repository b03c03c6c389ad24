//! Example domain: an aggregate with a name that can be changed.

use chronicle_core::{
    AggregateRoot, DomainError, DomainEvent, Event, EventRegistry, Projection, Readmodel,
    SharedEvent,
};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// An example aggregate was created.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleCreated {
    pub aggregate_id: Uuid,
    pub name: String,
}

impl Event for ExampleCreated {
    const EVENT_TYPE: &'static str = "example.created";
}

/// An example aggregate was renamed.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleNameChanged {
    pub aggregate_id: Uuid,
    pub new_name: String,
}

impl Event for ExampleNameChanged {
    const EVENT_TYPE: &'static str = "example.name_changed";
}

/// Returns a registry that decodes both example events.
///
/// # Errors
///
/// Never fails in practice; the tags are distinct.
pub fn example_event_registry() -> Result<EventRegistry, DomainError> {
    EventRegistry::new()
        .register::<ExampleCreated>()?
        .register::<ExampleNameChanged>()
}

/// The example aggregate.
#[derive(Debug, Clone)]
pub struct ExampleAggregate {
    id: Uuid,
    name: String,
    uncommitted: Vec<SharedEvent>,
}

impl ExampleAggregate {
    /// Creates an aggregate and stages [`ExampleCreated`].
    #[must_use]
    pub fn create(id: Uuid, name: impl Into<String>) -> Self {
        Self::empty().add_domain_event(ExampleCreated {
            aggregate_id: id,
            name: name.into(),
        })
    }

    /// Renames the aggregate and stages [`ExampleNameChanged`].
    ///
    /// # Errors
    ///
    /// Returns `DomainError::Validation` if `new_name` is blank.
    pub fn change_name(&self, new_name: impl Into<String>) -> Result<Self, DomainError> {
        let new_name = new_name.into();
        if new_name.trim().is_empty() {
            return Err(DomainError::Validation("name must not be blank".into()));
        }
        Ok(self.add_domain_event(ExampleNameChanged {
            aggregate_id: self.id,
            new_name,
        }))
    }

    /// Returns the current name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }
}

impl AggregateRoot for ExampleAggregate {
    fn empty() -> Self {
        Self {
            id: Uuid::nil(),
            name: String::new(),
            uncommitted: Vec::new(),
        }
    }

    fn aggregate_id(&self) -> Uuid {
        self.id
    }

    fn apply(&self, event: &dyn DomainEvent) -> Self {
        if let Some(e) = event.downcast_ref::<ExampleCreated>() {
            Self {
                id: e.aggregate_id,
                name: e.name.clone(),
                ..self.clone()
            }
        } else if let Some(e) = event.downcast_ref::<ExampleNameChanged>() {
            Self {
                name: e.new_name.clone(),
                ..self.clone()
            }
        } else {
            self.clone()
        }
    }

    fn uncommitted_events(&self) -> &[SharedEvent] {
        &self.uncommitted
    }

    fn push_uncommitted_event(&mut self, event: SharedEvent) {
        self.uncommitted.push(event);
    }

    fn clear_uncommitted_events(&mut self) {
        self.uncommitted.clear();
    }
}

/// Readmodel of an example aggregate.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExampleReadmodel {
    pub id: Uuid,
    pub name: String,
}

impl Readmodel for ExampleReadmodel {
    const READMODEL_TYPE: &'static str = "example";

    fn id(&self) -> Uuid {
        self.id
    }
}

/// Projects example events into an [`ExampleReadmodel`].
#[derive(Debug, Clone, Copy, Default)]
pub struct ExampleProjection;

impl Projection for ExampleProjection {
    type Readmodel = ExampleReadmodel;

    fn apply(
        &self,
        readmodel: Option<ExampleReadmodel>,
        event: &dyn DomainEvent,
    ) -> Option<ExampleReadmodel> {
        if let Some(e) = event.downcast_ref::<ExampleCreated>() {
            return Some(ExampleReadmodel {
                id: e.aggregate_id,
                name: e.name.clone(),
            });
        }
        if let Some(e) = event.downcast_ref::<ExampleNameChanged>() {
            return readmodel.map(|readmodel| ExampleReadmodel {
                name: e.new_name.clone(),
                ..readmodel
            });
        }
        readmodel
    }
}

#[cfg(test)]
mod tests {
    use chronicle_core::EventStream;
    use chronicle_core::event::shared;

    use super::*;

    #[test]
    fn test_create_stages_the_creation_event() {
        let id = Uuid::new_v4();

        let aggregate = ExampleAggregate::create(id, "Initial Name");

        assert_eq!(aggregate.aggregate_id(), id);
        assert_eq!(aggregate.name(), "Initial Name");
        assert_eq!(aggregate.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_change_name_rejects_blank_names() {
        let aggregate = ExampleAggregate::create(Uuid::new_v4(), "Initial Name");

        let result = aggregate.change_name("  ");

        assert!(matches!(result, Err(DomainError::Validation(_))));
    }

    #[test]
    fn test_projection_follows_renames() {
        // Arrange
        let id = Uuid::new_v4();
        let stream = EventStream::new(
            id,
            vec![
                shared(ExampleCreated {
                    aggregate_id: id,
                    name: "Initial Name".to_owned(),
                }),
                shared(ExampleNameChanged {
                    aggregate_id: id,
                    new_name: "Updated Name".to_owned(),
                }),
            ],
        );

        // Act
        let readmodel = ExampleProjection.project(&stream);

        // Assert
        assert_eq!(
            readmodel,
            Some(ExampleReadmodel {
                id,
                name: "Updated Name".to_owned()
            })
        );
    }

    #[test]
    fn test_registry_knows_both_example_events() {
        let registry = example_event_registry().unwrap();

        assert!(registry.contains(ExampleCreated::EVENT_TYPE));
        assert!(registry.contains(ExampleNameChanged::EVENT_TYPE));
    }
}
