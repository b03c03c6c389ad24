//! Wiring of the event store, readmodel repository and message
//! bus from environment configuration.

pub mod config;
pub mod error;
pub mod services;
pub mod telemetry;

pub use config::{ChronicleConfig, LogFormat};
pub use error::HostError;
pub use services::Services;
