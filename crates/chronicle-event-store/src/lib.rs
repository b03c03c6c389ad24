//! `PostgreSQL` persistence for event streams and
//! readmodels.

mod error;
pub mod pg_event_store;
pub mod pg_readmodel_repository;
pub mod schema;

pub use pg_event_store::PgEventStore;
pub use pg_readmodel_repository::PgReadmodelRepository;
