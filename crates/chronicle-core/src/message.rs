//! Command and query abstractions.
//!
//! Events are dispatched through the same bus; see [`crate::event::Event`].

/// A request to change state, handled by exactly one handler.
///
/// Commands that return nothing use `()` as their response.
pub trait Command: Send + Sync + 'static {
    /// The value returned by the handler.
    type Response: Send + 'static;
}

/// A request to read state, handled by exactly one handler.
///
/// Query handlers must not mutate anything.
pub trait Query: Send + Sync + 'static {
    /// The value returned by the handler.
    type Response: Send + 'static;
}
