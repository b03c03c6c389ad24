//! Dispatch of commands, queries and events to handlers
//! resolved by the exact type of the message.

pub mod bus;
pub mod handler;
pub mod registry;

pub use bus::{MessageBus, WeakMessageBus};
pub use handler::{CommandHandler, EventHandler, QueryHandler};
pub use registry::HandlerRegistry;
