//! Event sourcing and CQRS abstractions.
//!
//! Aggregates, event streams, projections and the storage and dispatch seams
//! the other crates implement. This crate performs no I/O.

pub mod aggregate;
pub mod clock;
pub mod codec;
pub mod error;
pub mod event;
pub mod message;
pub mod projection;
pub mod readmodel;
pub mod registry;
pub mod store;
pub mod stream;

pub use aggregate::AggregateRoot;
pub use error::{DomainError, MessageKind};
pub use event::{DomainEvent, Event, SharedEvent};
pub use message::{Command, Query};
pub use projection::{Projection, refresh_readmodel};
pub use readmodel::{Readmodel, ReadmodelRecord, ReadmodelRepository, ReadmodelRepositoryExt};
pub use registry::EventRegistry;
pub use store::{EventPublisher, EventStore};
pub use stream::EventStream;
