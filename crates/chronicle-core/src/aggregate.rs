//! Aggregate root abstraction.

use uuid::Uuid;

use crate::event::{DomainEvent, Event, SharedEvent, shared};

/// Trait for aggregate roots whose state is a left fold of their events.
///
/// Applying an event never mutates the receiver: it returns the next value
/// and the previous one stays valid. Events the aggregate does not recognize
/// must be applied as the identity so that histories written by newer
/// producers still replay.
pub trait AggregateRoot: Clone + Send + Sync + 'static {
    /// Returns the zero-value instance every replay starts from.
    fn empty() -> Self;

    /// Returns the aggregate identifier.
    fn aggregate_id(&self) -> Uuid;

    /// Returns the state after `event`, leaving `self` untouched.
    ///
    /// Must be deterministic and must carry the uncommitted events over
    /// unchanged.
    #[must_use]
    fn apply(&self, event: &dyn DomainEvent) -> Self;

    /// Returns events applied since the aggregate was last loaded.
    fn uncommitted_events(&self) -> &[SharedEvent];

    /// Stages an already applied event for persistence.
    fn push_uncommitted_event(&mut self, event: SharedEvent);

    /// Clears uncommitted events.
    fn clear_uncommitted_events(&mut self);

    /// Applies `event` and stages it in one step.
    #[must_use]
    fn add_domain_event<E: Event>(&self, event: E) -> Self {
        self.add_shared_event(shared(event))
    }

    /// Applies an already shared event and stages it in one step.
    #[must_use]
    fn add_shared_event(&self, event: SharedEvent) -> Self {
        let mut next = self.apply(event.as_ref());
        next.push_uncommitted_event(event);
        next
    }

    /// Rebuilds an aggregate by folding `history` over [`AggregateRoot::empty`].
    ///
    /// The result has no uncommitted events.
    #[must_use]
    fn load_from_history<'a, I>(history: I) -> Self
    where
        I: IntoIterator<Item = &'a SharedEvent>,
    {
        let mut aggregate = history
            .into_iter()
            .fold(Self::empty(), |aggregate, event| aggregate.apply(event.as_ref()));
        aggregate.clear_uncommitted_events();
        aggregate
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;
    use serde::{Deserialize, Serialize};

    use super::*;

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Opened {
        id: Uuid,
    }

    impl Event for Opened {
        const EVENT_TYPE: &'static str = "tally.opened";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Added {
        amount: i64,
    }

    impl Event for Added {
        const EVENT_TYPE: &'static str = "tally.added";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Relabelled {
        label: String,
    }

    impl Event for Relabelled {
        const EVENT_TYPE: &'static str = "tally.relabelled";
    }

    #[derive(Debug, Clone, Serialize, Deserialize)]
    struct Audited;

    impl Event for Audited {
        const EVENT_TYPE: &'static str = "tally.audited";
    }

    #[derive(Debug, Clone)]
    struct Tally {
        id: Uuid,
        total: i64,
        label: String,
        uncommitted: Vec<SharedEvent>,
    }

    impl AggregateRoot for Tally {
        fn empty() -> Self {
            Self {
                id: Uuid::nil(),
                total: 0,
                label: String::new(),
                uncommitted: Vec::new(),
            }
        }

        fn aggregate_id(&self) -> Uuid {
            self.id
        }

        fn apply(&self, event: &dyn DomainEvent) -> Self {
            if let Some(e) = event.downcast_ref::<Opened>() {
                Self { id: e.id, ..self.clone() }
            } else if let Some(e) = event.downcast_ref::<Added>() {
                Self {
                    total: self.total + e.amount,
                    ..self.clone()
                }
            } else if let Some(e) = event.downcast_ref::<Relabelled>() {
                Self {
                    label: e.label.clone(),
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

    fn state(tally: &Tally) -> (Uuid, i64, String) {
        (tally.id, tally.total, tally.label.clone())
    }

    #[test]
    fn test_add_domain_event_applies_and_stages_the_event() {
        // Arrange
        let id = Uuid::new_v4();
        let tally = Tally::empty();

        // Act
        let opened = tally.add_domain_event(Opened { id });
        let added = opened.add_domain_event(Added { amount: 5 });

        // Assert
        assert_eq!(added.aggregate_id(), id);
        assert_eq!(added.total, 5);
        assert_eq!(added.uncommitted_events().len(), 2);
        assert_eq!(added.uncommitted_events()[0].event_type(), "tally.opened");
        assert_eq!(added.uncommitted_events()[1].event_type(), "tally.added");
    }

    #[test]
    fn test_apply_leaves_the_previous_value_unchanged() {
        let before = Tally::empty().add_domain_event(Added { amount: 1 });

        let after = before.add_domain_event(Added { amount: 2 });

        assert_eq!(before.total, 1);
        assert_eq!(before.uncommitted_events().len(), 1);
        assert_eq!(after.total, 3);
        assert_eq!(after.uncommitted_events().len(), 2);
    }

    #[test]
    fn test_unrecognized_event_is_identity() {
        let tally = Tally::empty().add_domain_event(Added { amount: 4 });

        let next = tally.apply(&Audited);

        assert_eq!(state(&next), state(&tally));
        assert_eq!(next.uncommitted_events().len(), 1);
    }

    #[test]
    fn test_load_from_history_clears_uncommitted_events() {
        let id = Uuid::new_v4();
        let history = vec![
            shared(Opened { id }),
            shared(Added { amount: 10 }),
            shared(Relabelled {
                label: "groceries".to_owned(),
            }),
        ];

        let tally = Tally::load_from_history(&history);

        assert_eq!(state(&tally), (id, 10, "groceries".to_owned()));
        assert!(tally.uncommitted_events().is_empty());
    }

    #[test]
    fn test_load_from_empty_history_is_the_zero_value() {
        let tally = Tally::load_from_history(&Vec::new());

        assert_eq!(state(&tally), state(&Tally::empty()));
    }

    fn arbitrary_event() -> impl Strategy<Value = SharedEvent> {
        prop_oneof![
            any::<u128>().prop_map(|n| shared(Opened {
                id: Uuid::from_u128(n)
            })),
            (-1_000i64..1_000).prop_map(|amount| shared(Added { amount })),
            "[a-z]{0,8}".prop_map(|label| shared(Relabelled { label })),
            Just(shared(Audited)),
        ]
    }

    proptest! {
        #[test]
        fn prop_load_from_history_equals_left_fold(
            history in proptest::collection::vec(arbitrary_event(), 0..32)
        ) {
            let folded = history
                .iter()
                .fold(Tally::empty(), |tally, event| tally.apply(event.as_ref()));

            let loaded = Tally::load_from_history(&history);

            prop_assert_eq!(state(&loaded), state(&folded));
            prop_assert!(loaded.uncommitted_events().is_empty());
        }
    }
}
