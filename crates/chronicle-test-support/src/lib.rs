//! Shared test doubles and an example domain for Chronicle.

mod clock;
mod event_store;
mod example;
mod handlers;
mod publisher;
mod readmodel;

pub use clock::FixedClock;
pub use event_store::{EmptyEventStore, FailingEventStore, InMemoryEventStore};
pub use example::{
    ExampleAggregate, ExampleCreated, ExampleNameChanged, ExampleProjection, ExampleReadmodel,
    example_event_registry,
};
pub use handlers::{
    CreateExample, CreateExampleHandler, EchoCommand, EchoHandler, ExampleReadmodelUpdater,
    GetExample, GetExampleHandler, RenameExample, RenameExampleHandler, example_handlers,
};
pub use publisher::RecordingPublisher;
pub use readmodel::{FailingReadmodelRepository, InMemoryReadmodelRepository};
