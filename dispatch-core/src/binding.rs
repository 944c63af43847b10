//! HandlerBinding: one handler paired with the listener that owns it.
//!
//! The binding only holds a [`Weak`] reference to its listener; the listener
//! is owned by whoever created it. Bindings are immutable once built and are
//! shared (`Arc`) between the registry map and dispatch snapshots.

use std::any::Any;
use std::fmt;
use std::sync::{Arc, Weak};

use crate::error::HandlerFailure;
use crate::event::{Event, EventType};
use crate::listener::ErasedHandler;

/// Type-erased listener reference held by a binding.
pub(crate) type ListenerRef = Weak<dyn Any + Send + Sync>;

/// Outcome of invoking a single binding.
#[derive(Debug)]
pub(crate) enum Invocation {
    Delivered,
    Failed(HandlerFailure),
    /// The listener was dropped before the event arrived.
    ListenerGone,
}

pub struct HandlerBinding {
    handler: ErasedHandler,
    handler_name: &'static str,
    listener: ListenerRef,
    listener_type: &'static str,
    event_type: EventType,
}

impl HandlerBinding {
    pub(crate) fn new(
        handler: ErasedHandler,
        handler_name: &'static str,
        listener: ListenerRef,
        listener_type: &'static str,
        event_type: EventType,
    ) -> Self {
        Self {
            handler,
            handler_name,
            listener,
            listener_type,
            event_type,
        }
    }

    pub fn event_type(&self) -> EventType {
        self.event_type
    }

    pub fn handler_name(&self) -> &'static str {
        self.handler_name
    }

    pub fn listener_type(&self) -> &'static str {
        self.listener_type
    }

    /// Whether the owning listener still exists.
    pub fn is_alive(&self) -> bool {
        self.listener.strong_count() > 0
    }

    /// Identity check against a listener instance. Value equality is never used.
    pub fn is_bound_to<L: Send + Sync + 'static>(&self, listener: &Arc<L>) -> bool {
        self.listener_addr() == Arc::as_ptr(listener).cast::<()>()
    }

    /// Whether both bindings belong to the same listener instance.
    pub fn same_listener(&self, other: &HandlerBinding) -> bool {
        self.listener_addr() == other.listener_addr()
    }

    fn listener_addr(&self) -> *const () {
        Weak::as_ptr(&self.listener).cast::<()>()
    }

    /// Call the handler with its listener as receiver.
    ///
    /// Panics inside the handler are not caught here.
    pub(crate) fn invoke(&self, event: &dyn Event) -> Invocation {
        let Some(listener) = self.listener.upgrade() else {
            return Invocation::ListenerGone;
        };

        match (self.handler)(listener.as_ref(), event) {
            Ok(()) => Invocation::Delivered,
            Err(failure) => Invocation::Failed(failure),
        }
    }
}

impl fmt::Debug for HandlerBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("HandlerBinding")
            .field("listener", &self.listener_type)
            .field("handler", &self.handler_name)
            .field("event", &self.event_type)
            .field("alive", &self.is_alive())
            .finish()
    }
}
