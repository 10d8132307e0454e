//! Synchronous signals.
//!
//! A [`Signal`] is an ordered list of handlers. Emission calls every handler
//! on the emitting thread, in registration order, before returning. Handlers
//! receive the event by reference and have no access to the emitter, so a
//! handler can never re-enter the object that emitted it.

use std::fmt;
use uuid::Uuid;

/// Handle for a registered handler, used to disconnect it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(Uuid);

impl ConnectionId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Conn({})", &self.0.to_string()[..8])
    }
}

type Handler<A> = Box<dyn FnMut(&A)>;

pub struct Signal<A> {
    handlers: Vec<(ConnectionId, Handler<A>)>,
}

impl<A> Signal<A> {
    pub fn new() -> Self {
        Self {
            handlers: Vec::new(),
        }
    }

    /// Registers `handler`; it runs after every handler registered before it.
    pub fn connect<F>(&mut self, handler: F) -> ConnectionId
    where
        F: FnMut(&A) + 'static,
    {
        let id = ConnectionId::new();
        self.handlers.push((id, Box::new(handler)));
        tracing::debug!("Connection {} added", id);
        id
    }

    /// Returns true if the connection was found and removed.
    pub fn disconnect(&mut self, id: ConnectionId) -> bool {
        let before = self.handlers.len();
        self.handlers.retain(|(handler_id, _)| *handler_id != id);
        let removed = self.handlers.len() != before;
        if removed {
            tracing::debug!("Connection {} removed", id);
        }
        removed
    }

    pub fn emit(&mut self, args: &A) {
        for (_, handler) in self.handlers.iter_mut() {
            handler(args);
        }
    }

    pub fn connection_count(&self) -> usize {
        self.handlers.len()
    }
}

impl<A> Default for Signal<A> {
    fn default() -> Self {
        Self::new()
    }
}

impl<A> fmt::Debug for Signal<A> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Signal")
            .field("connections", &self.connection_count())
            .finish()
    }
}
